//! Request bodies of the admin API.
//!
//! Edits are partial: an absent field keeps the stored value, a present one
//! replaces it after trimming. Field names match the stored document, with
//! the English names accepted too.

use serde::Deserialize;

use trache_store::{
    ContactInfo, FamilyInsuranceRow, IndividualInsuranceRow, Service, SiteDocument, VisaRow,
    WhyUsItem,
};

fn apply(target: &mut String, update: &Option<String>) {
    if let Some(value) = update {
        *target = value.trim().to_string();
    }
}

fn trimmed(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

#[derive(Debug, Default, Deserialize)]
pub struct SiteInfoForm {
    pub company_name: Option<String>,
    pub tagline: Option<String>,
    #[serde(alias = "telephone")]
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "adresse")]
    pub address: Option<String>,
    #[serde(alias = "horaires")]
    pub hours: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub tiktok: Option<String>,
}

impl SiteInfoForm {
    /// Company name and tagline ignore blank values; the contact fields
    /// accept them.
    pub fn apply_to(&self, document: &mut SiteDocument) {
        for (target, update) in [
            (&mut document.company_name, &self.company_name),
            (&mut document.tagline, &self.tagline),
        ] {
            if let Some(value) = update.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                *target = value.to_string();
            }
        }

        let ContactInfo {
            phone,
            email,
            address,
            hours,
            social_links,
        } = &mut document.contact_info;
        apply(phone, &self.phone);
        apply(email, &self.email);
        apply(address, &self.address);
        apply(hours, &self.hours);
        apply(&mut social_links.facebook, &self.facebook);
        apply(&mut social_links.instagram, &self.instagram);
        apply(&mut social_links.tiktok, &self.tiktok);
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceForm {
    #[serde(alias = "nom")]
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl ServiceForm {
    pub fn apply_to(&self, service: &mut Service) {
        apply(&mut service.name, &self.name);
        apply(&mut service.description, &self.description);
        apply(&mut service.icon, &self.icon);
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WhyUsForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl WhyUsForm {
    pub fn apply_to(&self, item: &mut WhyUsItem) {
        apply(&mut item.title, &self.title);
        apply(&mut item.description, &self.description);
        apply(&mut item.icon, &self.icon);
    }
}

/// Replacement for one of the hand-written HTML blobs. Absent means empty.
#[derive(Debug, Default, Deserialize)]
pub struct HtmlForm {
    #[serde(alias = "assurance_tables_html", alias = "visa_tables_html")]
    pub html: Option<String>,
}

impl HtmlForm {
    pub fn value(&self) -> String {
        trimmed(&self.html)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IndividualRowForm {
    #[serde(alias = "duree")]
    pub duration: Option<String>,
    #[serde(alias = "enfant")]
    pub child: Option<String>,
    #[serde(alias = "adulte")]
    pub adult: Option<String>,
    #[serde(rename = "60_64", alias = "age_60_64")]
    pub age_60_64: Option<String>,
    #[serde(rename = "65_69", alias = "age_65_69")]
    pub age_65_69: Option<String>,
    #[serde(rename = "70_74", alias = "age_70_74")]
    pub age_70_74: Option<String>,
    #[serde(rename = "75_79", alias = "age_75_79")]
    pub age_75_79: Option<String>,
    #[serde(rename = "80_85", alias = "age_80_85")]
    pub age_80_85: Option<String>,
}

impl IndividualRowForm {
    fn fields<'a>(&'a self, row: &'a mut IndividualInsuranceRow) -> [(&'a mut String, &'a Option<String>); 8] {
        [
            (&mut row.duration, &self.duration),
            (&mut row.child, &self.child),
            (&mut row.adult, &self.adult),
            (&mut row.age_60_64, &self.age_60_64),
            (&mut row.age_65_69, &self.age_65_69),
            (&mut row.age_70_74, &self.age_70_74),
            (&mut row.age_75_79, &self.age_75_79),
            (&mut row.age_80_85, &self.age_80_85),
        ]
    }

    pub fn apply_to(&self, row: &mut IndividualInsuranceRow) {
        for (target, update) in self.fields(row) {
            apply(target, update);
        }
    }

    pub fn to_row(&self) -> IndividualInsuranceRow {
        let mut row = IndividualInsuranceRow::default();
        for (target, update) in self.fields(&mut row) {
            *target = trimmed(update);
        }
        row
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FamilyRowForm {
    #[serde(alias = "duree")]
    pub duration: Option<String>,
    #[serde(alias = "p2")]
    pub persons_2: Option<String>,
    #[serde(alias = "p3")]
    pub persons_3: Option<String>,
    #[serde(alias = "p4")]
    pub persons_4: Option<String>,
    #[serde(alias = "p5")]
    pub persons_5: Option<String>,
    #[serde(alias = "p6")]
    pub persons_6: Option<String>,
}

impl FamilyRowForm {
    fn fields<'a>(&'a self, row: &'a mut FamilyInsuranceRow) -> [(&'a mut String, &'a Option<String>); 6] {
        [
            (&mut row.duration, &self.duration),
            (&mut row.persons_2, &self.persons_2),
            (&mut row.persons_3, &self.persons_3),
            (&mut row.persons_4, &self.persons_4),
            (&mut row.persons_5, &self.persons_5),
            (&mut row.persons_6, &self.persons_6),
        ]
    }

    pub fn apply_to(&self, row: &mut FamilyInsuranceRow) {
        for (target, update) in self.fields(row) {
            apply(target, update);
        }
    }

    pub fn to_row(&self) -> FamilyInsuranceRow {
        let mut row = FamilyInsuranceRow::default();
        for (target, update) in self.fields(&mut row) {
            *target = trimmed(update);
        }
        row
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VisaRowForm {
    pub category: Option<String>,
    pub destination: Option<String>,
    pub visa_type: Option<String>,
    #[serde(alias = "duree")]
    pub duration: Option<String>,
    #[serde(alias = "delai")]
    pub delay: Option<String>,
    #[serde(alias = "tarif")]
    pub price: Option<String>,
    #[serde(alias = "tarif_total")]
    pub total_price: Option<String>,
    #[serde(alias = "docs")]
    pub required_docs: Option<String>,
}

impl VisaRowForm {
    fn fields<'a>(&'a self, row: &'a mut VisaRow) -> [(&'a mut String, &'a Option<String>); 8] {
        [
            (&mut row.category, &self.category),
            (&mut row.destination, &self.destination),
            (&mut row.visa_type, &self.visa_type),
            (&mut row.duration, &self.duration),
            (&mut row.delay, &self.delay),
            (&mut row.price, &self.price),
            (&mut row.total_price, &self.total_price),
            (&mut row.required_docs, &self.required_docs),
        ]
    }

    /// Unknown keys already on the row are left alone.
    pub fn apply_to(&self, row: &mut VisaRow) {
        for (target, update) in self.fields(row) {
            apply(target, update);
        }
    }

    pub fn to_row(&self) -> VisaRow {
        let mut row = VisaRow::default();
        for (target, update) in self.fields(&mut row) {
            *target = trimmed(update);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_site_info_blank_name_kept() {
        let mut document = SiteDocument::seed();
        let form: SiteInfoForm = serde_json::from_value(json!({
            "company_name": "   ",
            "tagline": "  Partez loin  ",
            "email": "",
            "telephone": " 0770 00 00 00 "
        }))
        .unwrap();
        form.apply_to(&mut document);

        assert_eq!(document.company_name, SiteDocument::seed().company_name);
        assert_eq!(document.tagline, "Partez loin");
        assert_eq!(document.contact_info.email, "");
        assert_eq!(document.contact_info.phone, "0770 00 00 00");
        // Absent fields untouched.
        assert_eq!(
            document.contact_info.address,
            SiteDocument::seed().contact_info.address
        );
        assert_eq!(
            document.contact_info.social_links,
            SiteDocument::seed().contact_info.social_links
        );
    }

    #[test]
    fn test_service_partial_update() {
        let mut service = Service {
            name: "Vols".into(),
            description: "Billets".into(),
            icon: "fa-plane".into(),
        };
        let form: ServiceForm =
            serde_json::from_value(json!({ "description": " Billets d'avion " })).unwrap();
        form.apply_to(&mut service);

        assert_eq!(service.name, "Vols");
        assert_eq!(service.description, "Billets d'avion");
        assert_eq!(service.icon, "fa-plane");
    }

    #[test]
    fn test_individual_row_keys() {
        let form: IndividualRowForm = serde_json::from_value(json!({
            "duree": " 7 jours ",
            "adulte": "1500 DZD",
            "60_64": "2500 DZD"
        }))
        .unwrap();
        let row = form.to_row();
        assert_eq!(row.duration, "7 jours");
        assert_eq!(row.adult, "1500 DZD");
        assert_eq!(row.age_60_64, "2500 DZD");
        assert_eq!(row.child, "");

        let mut existing = row.clone();
        let edit: IndividualRowForm =
            serde_json::from_value(json!({ "enfant": "900 DZD" })).unwrap();
        edit.apply_to(&mut existing);
        assert_eq!(existing.child, "900 DZD");
        assert_eq!(existing.adult, "1500 DZD");
    }

    #[test]
    fn test_family_row() {
        let form: FamilyRowForm =
            serde_json::from_value(json!({ "duration": "1 an", "p4": " 9000 DZD " })).unwrap();
        let row = form.to_row();
        assert_eq!(row.duration, "1 an");
        assert_eq!(row.persons_4, "9000 DZD");
        assert_eq!(row.persons_6, "");
    }

    #[test]
    fn test_visa_row_keeps_unknown_keys() {
        let mut row: VisaRow =
            serde_json::from_value(json!({ "category": "Tourisme", "notes": "sur RDV" })).unwrap();
        let form: VisaRowForm =
            serde_json::from_value(json!({ "tarif": "12000 DZD", "docs": "Passeport" })).unwrap();
        form.apply_to(&mut row);

        assert_eq!(row.category, "Tourisme");
        assert_eq!(row.price, "12000 DZD");
        assert_eq!(row.required_docs, "Passeport");
        assert_eq!(row.extra["notes"], "sur RDV");
    }

    #[test]
    fn test_html_form_aliases() {
        let form: HtmlForm =
            serde_json::from_value(json!({ "assurance_tables_html": " <table></table> " })).unwrap();
        assert_eq!(form.value(), "<table></table>");
        assert_eq!(HtmlForm::default().value(), "");
    }
}
