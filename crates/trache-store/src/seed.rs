//! Seed content for a fresh install and the defaults used to backfill
//! keys missing from an older document.

use crate::models::{
    Destination, FamilyInsuranceRow, IndividualInsuranceRow, Service, WhyUsItem,
};

pub const COMPANY_NAME: &str = "TRACHE TRAVEL & SERVICES";
pub const TAGLINE: &str = "Votre partenaire pour des voyages inoubliables.";
pub const LOGO: &str = "uploads/logo.jpg";

pub const PHONE: &str = "+213 662 90 10 49 / +213 540 62 24 64";
pub const EMAIL: &str = "trachetravelservice@gmail.com";
pub const ADDRESS: &str = "n°8 Rue Adda Ouled Derrer, Lot n°3 Hai Makkari, Oran, Algeria";
pub const HOURS: &str = "Dim-Jeu: 9h-18h, Sam: 9h-13h";

pub const FACEBOOK: &str = "https://www.facebook.com/trachetravel/";
pub const INSTAGRAM: &str = "https://www.instagram.com/trache_travel_services/";
pub const TIKTOK: &str = "https://www.tiktok.com/@trachetravel.services";

fn service(name: &str, description: &str, icon: &str) -> Service {
    Service {
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
    }
}

fn destination(name: &str, description: &str, price: &str, image: &str) -> Destination {
    Destination {
        name: name.to_string(),
        description: description.to_string(),
        price: price.to_string(),
        image: image.to_string(),
    }
}

fn why(title: &str, description: &str, icon: &str) -> WhyUsItem {
    WhyUsItem {
        title: title.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
    }
}

pub fn services() -> Vec<Service> {
    vec![
        service(
            "Réservation de Vols",
            "Billets d'avion au meilleur prix pour toutes les destinations mondiales.",
            "fa-plane-departure",
        ),
        service(
            "Hôtels de Prestige",
            "Sélection d'hôtels de luxe et économiques dans le monde entier.",
            "fa-hotel",
        ),
        service(
            "Circuits Sur Mesure",
            "Voyages organisés et circuits personnalisés selon vos envies.",
            "fa-map-signs",
        ),
        service(
            "Location de Voitures",
            "Véhicules de location modernes pour tous vos déplacements.",
            "fa-car",
        ),
        service(
            "Visa & Documentation",
            "Assistance complète pour vos formalités administratives de voyage.",
            "fa-file-alt",
        ),
        service(
            "Assurance Voyage",
            "Protection complète pour voyager en toute sérénité et sécurité.",
            "fa-shield-alt",
        ),
    ]
}

const UNSPLASH: &str = "https://images.unsplash.com";

pub fn destinations() -> Vec<Destination> {
    let remote = |photo: &str| format!("{UNSPLASH}/{photo}?auto=format&fit=crop&w=800&q=60");
    vec![
        destination(
            "Paris, France",
            "La ville lumière et ses monuments emblématiques.",
            "€599",
            "uploads/destinations/paris.png",
        ),
        destination(
            "Dubaï, EAU",
            "Luxe et modernité au cœur du désert.",
            "€899",
            "uploads/destinations/dubai.png",
        ),
        destination(
            "Tokyo, Japon",
            "Tradition et technologie dans la capitale nippone.",
            "€1299",
            &remote("photo-1542051841857-5f90071e7989"),
        ),
        destination(
            "New York, USA",
            "La ville qui ne dort jamais et ses gratte-ciels.",
            "€799",
            &remote("photo-1496442226666-8d4d0e62e6e9"),
        ),
        destination(
            "Santorin, Grèce",
            "Couchers de soleil magiques et villages blancs.",
            "€750",
            "uploads/destinations/santorini.jpg",
        ),
        destination(
            "Bali, Indonésie",
            "L'île des dieux, entre plages et rizières verdoyantes.",
            "€1100",
            &remote("photo-1537996194471-e657df975ab4"),
        ),
        destination(
            "Rome, Italie",
            "Un voyage à travers l'histoire antique et la dolce vita.",
            "€450",
            &remote("photo-1552832230-c0197dd311b5"),
        ),
        destination(
            "Kyoto, Japon",
            "L'ancienne capitale impériale, ses temples et ses jardins zen.",
            "€1350",
            &remote("photo-1524413840807-0c3cb6fa808d"),
        ),
        destination(
            "Rio de Janeiro, Brésil",
            "Entre plages iconiques, samba et paysages à couper le souffle.",
            "€950",
            &remote("photo-1483729558449-99ef09a8c325"),
        ),
        destination(
            "Le Caire, Égypte",
            "Aux portes des pyramides, un plongeon dans l'histoire des pharaons.",
            "€680",
            "uploads/destinations/caire.jpg",
        ),
        destination(
            "Istanbul, Turquie",
            "Un pont entre l'Europe et l'Asie, riche d'histoire et de saveurs.",
            "€480",
            &remote("photo-1527838832700-5059252407fa"),
        ),
        destination(
            "Sharm El Sheikh, Égypte",
            "Plongée de classe mondiale dans les eaux cristallines de la mer Rouge.",
            "€550",
            "uploads/destinations/SharmElSheikh.jpg",
        ),
        destination(
            "Guangzhou, Chine",
            "Mégapole moderne et dynamique, cœur du commerce et de la gastronomie cantonaise.",
            "€850",
            "uploads/destinations/guangzhou.jpg",
        ),
        destination(
            "Toronto, Canada",
            "La métropole cosmopolite du Canada, avec sa skyline iconique et sa scène culturelle vibrante.",
            "€720",
            "uploads/destinations/toronto.jpg",
        ),
    ]
}

pub fn why_us() -> Vec<WhyUsItem> {
    vec![
        why(
            "Meilleurs Prix Garantis",
            "Nous négocions les meilleurs tarifs pour vous.",
            "fa-tags",
        ),
        why(
            "Support Client 24/7",
            "Notre équipe est disponible à tout moment.",
            "fa-headset",
        ),
        why(
            "Destinations Mondiales",
            "Explorez le monde avec nos offres exclusives.",
            "fa-globe-americas",
        ),
    ]
}

/// Published individual insurance grid, in DZD.
pub fn insurance_individual() -> Vec<IndividualInsuranceRow> {
    const GRID: [[&str; 8]; 8] = [
        ["8 jours", "1700", "2300", "2300", "2500", "2700", "3200", "4000"],
        ["10 jours", "1700", "2400", "2500", "2700", "3000", "3500", "4500"],
        ["15 jours", "1900", "2700", "2800", "3100", "3500", "4100", "5500"],
        ["30 jours", "2200", "3300", "3400", "3800", "4300", "5200", "7000"],
        ["60 jours", "2900", "4700", "4700", "5500", "6300", "7900", "11100"],
        ["90 jours", "3100", "5200", "5300", "6200", "7200", "9000", "12700"],
        ["6 mois", "5200", "9600", "9800", "11700", "13600", "17400", "25000"],
        ["1 an", "5800", "10600", "10900", "12800", "14800", "18800", "26800"],
    ];
    GRID.iter()
        .map(|[duration, child, adult, a60, a65, a70, a75, a80]| IndividualInsuranceRow {
            duration: duration.to_string(),
            child: dzd(child),
            adult: dzd(adult),
            age_60_64: dzd(a60),
            age_65_69: dzd(a65),
            age_70_74: dzd(a70),
            age_75_79: dzd(a75),
            age_80_85: dzd(a80),
        })
        .collect()
}

/// Published family insurance grid, in DZD.
pub fn insurance_family() -> Vec<FamilyInsuranceRow> {
    const GRID: [[&str; 6]; 5] = [
        ["15 jours", "4500", "6100", "8300", "10000", "11900"],
        ["30 jours", "5400", "6800", "9200", "11200", "13200"],
        ["3 mois", "9200", "15200", "19900", "24500", "29300"],
        ["6 mois", "14600", "15500", "28000", "34700", "41600"],
        ["1 an", "16000", "20700", "31600", "39300", "47200"],
    ];
    GRID.iter()
        .map(|[duration, p2, p3, p4, p5, p6]| FamilyInsuranceRow {
            duration: duration.to_string(),
            persons_2: dzd(p2),
            persons_3: dzd(p3),
            persons_4: dzd(p4),
            persons_5: dzd(p5),
            persons_6: dzd(p6),
        })
        .collect()
}

fn dzd(amount: &str) -> String {
    format!("{amount} DZD")
}
