//! Typed records persisted in the site content document and the message log.
//!
//! Field names on disk follow the deployed `data.json` (French keys); the
//! English names are accepted as aliases on read. Every container carries
//! `#[serde(default)]`, so a key missing from the stored file is filled from
//! the container's `Default` instead of failing the parse.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::seed;

// ---------------------------------------------------------------------------
// SiteDocument
// ---------------------------------------------------------------------------

/// All editable site content. One instance, stored as one JSON file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteDocument {
    pub company_name: String,
    pub tagline: String,
    /// Stored reference to the logo image.
    pub logo: String,
    pub services: Vec<Service>,
    /// Display order is rank order.
    pub destinations: Vec<Destination>,
    pub contact_info: ContactInfo,
    pub why_us: Vec<WhyUsItem>,
    #[serde(rename = "assurance_individuel", alias = "insurance_individual")]
    pub insurance_individual: Vec<IndividualInsuranceRow>,
    #[serde(rename = "assurance_famille", alias = "insurance_family")]
    pub insurance_family: Vec<FamilyInsuranceRow>,
    pub visa_rows: Vec<VisaRow>,
    /// Legacy hand-written insurance tables, kept alongside the structured rows.
    #[serde(rename = "assurance_tables_html", alias = "insurance_tables_html")]
    pub insurance_tables_html: String,
    /// Legacy hand-written visa tables.
    pub visa_tables_html: String,
    /// Keys this version does not know about, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for SiteDocument {
    /// The value every missing key is backfilled from.
    fn default() -> Self {
        Self {
            company_name: seed::COMPANY_NAME.to_string(),
            tagline: seed::TAGLINE.to_string(),
            logo: seed::LOGO.to_string(),
            services: seed::services(),
            destinations: seed::destinations(),
            contact_info: ContactInfo::default(),
            why_us: seed::why_us(),
            insurance_individual: seed::insurance_individual(),
            insurance_family: seed::insurance_family(),
            visa_rows: Vec::new(),
            insurance_tables_html: String::new(),
            visa_tables_html: String::new(),
            extra: Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalogue entries
// ---------------------------------------------------------------------------

/// A service card. Names are not unique; lookups take the first match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Service {
    #[serde(rename = "nom", alias = "name")]
    pub name: String,
    pub description: String,
    /// Font Awesome icon class, e.g. `fa-plane-departure`.
    pub icon: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Destination {
    #[serde(rename = "nom", alias = "name")]
    pub name: String,
    pub description: String,
    /// Free text, e.g. `€599`. Never parsed.
    #[serde(rename = "prix", alias = "price")]
    pub price: String,
    /// Stored reference: relative upload path or absolute URL.
    pub image: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WhyUsItem {
    pub title: String,
    pub description: String,
    pub icon: String,
}

// ---------------------------------------------------------------------------
// Contact info
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContactInfo {
    #[serde(rename = "telephone", alias = "phone")]
    pub phone: String,
    pub email: String,
    #[serde(rename = "adresse", alias = "address")]
    pub address: String,
    #[serde(rename = "horaires", alias = "hours")]
    pub hours: String,
    pub social_links: SocialLinks,
}

impl Default for ContactInfo {
    fn default() -> Self {
        Self {
            phone: seed::PHONE.to_string(),
            email: seed::EMAIL.to_string(),
            address: seed::ADDRESS.to_string(),
            hours: seed::HOURS.to_string(),
            social_links: SocialLinks::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SocialLinks {
    pub facebook: String,
    pub instagram: String,
    pub tiktok: String,
}

impl Default for SocialLinks {
    fn default() -> Self {
        Self {
            facebook: seed::FACEBOOK.to_string(),
            instagram: seed::INSTAGRAM.to_string(),
            tiktok: seed::TIKTOK.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pricing tables
// ---------------------------------------------------------------------------

/// Individual travel insurance: one row per cover duration, one column per
/// age bracket. All cells are display strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IndividualInsuranceRow {
    #[serde(rename = "duree", alias = "duration")]
    pub duration: String,
    #[serde(rename = "enfant", alias = "child")]
    pub child: String,
    #[serde(rename = "adulte", alias = "adult")]
    pub adult: String,
    #[serde(rename = "60_64")]
    pub age_60_64: String,
    #[serde(rename = "65_69")]
    pub age_65_69: String,
    #[serde(rename = "70_74")]
    pub age_70_74: String,
    #[serde(rename = "75_79")]
    pub age_75_79: String,
    #[serde(rename = "80_85")]
    pub age_80_85: String,
}

/// Family travel insurance: one column per household size (2 to 6).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FamilyInsuranceRow {
    #[serde(rename = "duree", alias = "duration")]
    pub duration: String,
    #[serde(rename = "p2")]
    pub persons_2: String,
    #[serde(rename = "p3")]
    pub persons_3: String,
    #[serde(rename = "p4")]
    pub persons_4: String,
    #[serde(rename = "p5")]
    pub persons_5: String,
    #[serde(rename = "p6")]
    pub persons_6: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisaRow {
    pub category: String,
    pub destination: String,
    pub visa_type: String,
    #[serde(rename = "duree", alias = "duration")]
    pub duration: String,
    #[serde(rename = "delai", alias = "delay")]
    pub delay: String,
    #[serde(rename = "tarif", alias = "price")]
    pub price: String,
    #[serde(rename = "tarif_total", alias = "total_price")]
    pub total_price: String,
    #[serde(rename = "docs", alias = "required_docs")]
    pub required_docs: String,
    /// Visa rows are free-form; unknown columns survive a round trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Contact messages
// ---------------------------------------------------------------------------

/// One contact-form submission, one row of the message log.
///
/// Identity is positional: the record's index in the log.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageRecord {
    #[serde(rename = "Date", default)]
    pub date: String,
    #[serde(rename = "Nom", default)]
    pub name: String,
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "Telephone", default)]
    pub phone: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

impl MessageRecord {
    /// Build a record stamped with the current local time.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            date: chrono::Local::now()
                .format(trache_shared::constants::MESSAGE_DATE_FORMAT)
                .to_string(),
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            message: message.into(),
        }
    }
}
