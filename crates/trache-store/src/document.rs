//! Operations on an owned [`SiteDocument`] snapshot.
//!
//! Index-based edits follow the admin panel's permissive contract: an index
//! outside the sequence leaves the document untouched and reports `false` /
//! `None` instead of failing.

use serde::Serialize;
use tracing::debug;

use crate::models::{Destination, Service, SiteDocument};

/// Legacy image folder prefixes and their canonical replacement. The first
/// entry is a misspelling that shipped in older documents.
const LEGACY_IMAGE_PREFIXES: [(&str, &str); 2] = [
    ("static/uploads/destinantions/", "uploads/destinations/"),
    ("static/uploads/destinations/", "uploads/destinations/"),
];

/// Rewrite legacy destination image prefixes to `uploads/destinations/`.
/// Prefixes are replaced wherever they occur, bucket URLs included.
/// Idempotent.
pub fn normalize_image_reference(reference: &str) -> String {
    LEGACY_IMAGE_PREFIXES
        .iter()
        .fold(reference.to_string(), |acc, (legacy, canonical)| {
            acc.replace(legacy, canonical)
        })
}

/// Remove `items[index]` if it exists.
pub fn remove_at<T>(items: &mut Vec<T>, index: usize) -> Option<T> {
    (index < items.len()).then(|| items.remove(index))
}

/// Matches returned by [`SiteDocument::search`].
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SearchResults {
    pub destinations: Vec<Destination>,
    pub services: Vec<Service>,
}

impl SiteDocument {
    /// Document written on first start: the default content with empty
    /// pricing tables, which the admin fills in.
    pub fn seed() -> Self {
        Self {
            insurance_individual: Vec::new(),
            insurance_family: Vec::new(),
            ..Self::default()
        }
    }

    /// Apply [`normalize_image_reference`] to every destination image.
    /// Returns `true` if anything changed.
    pub fn normalize_image_paths(&mut self) -> bool {
        let mut dirty = false;
        for destination in &mut self.destinations {
            let normalized = normalize_image_reference(&destination.image);
            if normalized != destination.image {
                debug!(
                    from = %destination.image,
                    to = %normalized,
                    "Rewrote legacy destination image path"
                );
                destination.image = normalized;
                dirty = true;
            }
        }
        dirty
    }

    /// First service whose name matches exactly.
    pub fn find_service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Case-insensitive substring search over name, description and price.
    ///
    /// An empty (or blank) query returns every destination and no services,
    /// which is what the destinations page shows by default.
    pub fn search(&self, query: &str) -> SearchResults {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return SearchResults {
                destinations: self.destinations.clone(),
                services: Vec::new(),
            };
        }

        let hit = |fields: [&str; 3]| fields.iter().any(|f| f.to_lowercase().contains(&query));

        SearchResults {
            destinations: self
                .destinations
                .iter()
                .filter(|d| hit([d.name.as_str(), d.description.as_str(), d.price.as_str()]))
                .cloned()
                .collect(),
            // Services have no price column.
            services: self
                .services
                .iter()
                .filter(|s| hit([s.name.as_str(), s.description.as_str(), ""]))
                .cloned()
                .collect(),
        }
    }

    /// Swap the destination at `index` with the one before it.
    pub fn move_destination_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.destinations.len() {
            return false;
        }
        self.destinations.swap(index, index - 1);
        true
    }

    /// Swap the destination at `index` with the one after it.
    pub fn move_destination_down(&mut self, index: usize) -> bool {
        if index >= self.destinations.len().saturating_sub(1) {
            return false;
        }
        self.destinations.swap(index, index + 1);
        true
    }

    pub fn remove_destination(&mut self, index: usize) -> Option<Destination> {
        remove_at(&mut self.destinations, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(names: &[&str]) -> SiteDocument {
        SiteDocument {
            destinations: names
                .iter()
                .map(|n| Destination {
                    name: n.to_string(),
                    ..Destination::default()
                })
                .collect(),
            ..SiteDocument::seed()
        }
    }

    fn names(doc: &SiteDocument) -> Vec<&str> {
        doc.destinations.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_normalize_misspelled_folder() {
        assert_eq!(
            normalize_image_reference("static/uploads/destinantions/paris.png"),
            "uploads/destinations/paris.png"
        );
        assert_eq!(
            normalize_image_reference("static/uploads/destinations/rome.jpg"),
            "uploads/destinations/rome.jpg"
        );
    }

    #[test]
    fn test_normalize_rewrites_inside_urls() {
        assert_eq!(
            normalize_image_reference("https://cdn.example.com/static/uploads/destinantions/x.png"),
            "https://cdn.example.com/uploads/destinations/x.png"
        );
        let clean = "https://trache.s3.amazonaws.com/uploads/destinations/x.png";
        assert_eq!(normalize_image_reference(clean), clean);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in [
            "static/uploads/destinantions/a.png",
            "static/uploads/destinations/b.png",
            "uploads/destinations/c.png",
            "https://images.unsplash.com/photo-1?w=800",
            "",
        ] {
            let once = normalize_image_reference(input);
            assert_eq!(normalize_image_reference(&once), once);
        }
    }

    #[test]
    fn test_normalize_image_paths_reports_dirty() {
        let mut doc = named(&["a", "b"]);
        doc.destinations[1].image = "static/uploads/destinantions/b.png".into();
        assert!(doc.normalize_image_paths());
        assert_eq!(doc.destinations[1].image, "uploads/destinations/b.png");
        assert!(!doc.normalize_image_paths());
    }

    #[test]
    fn test_move_up_swaps_with_previous() {
        let mut doc = named(&["first", "second"]);
        assert!(doc.move_destination_up(1));
        assert_eq!(names(&doc), ["second", "first"]);
    }

    #[test]
    fn test_move_out_of_range_is_noop() {
        let mut doc = named(&["a", "b", "c"]);
        assert!(!doc.move_destination_up(0));
        assert!(!doc.move_destination_up(3));
        assert!(!doc.move_destination_down(2));
        assert!(!doc.move_destination_down(usize::MAX));
        assert_eq!(names(&doc), ["a", "b", "c"]);
    }

    #[test]
    fn test_move_down() {
        let mut doc = named(&["a", "b", "c"]);
        assert!(doc.move_destination_down(0));
        assert_eq!(names(&doc), ["b", "a", "c"]);
    }

    #[test]
    fn test_remove_at() {
        let mut items = vec![1, 2, 3];
        assert_eq!(remove_at(&mut items, 1), Some(2));
        assert_eq!(items, [1, 3]);
        assert_eq!(remove_at(&mut items, 2), None);
        assert_eq!(items, [1, 3]);
    }

    #[test]
    fn test_search_without_query() {
        let doc = SiteDocument::seed();
        let results = doc.search("   ");
        assert_eq!(results.destinations.len(), 14);
        assert!(results.services.is_empty());
    }

    #[test]
    fn test_search_matches_fields() {
        let doc = SiteDocument::seed();

        let by_name = doc.search("japon");
        assert_eq!(by_name.destinations.len(), 2);

        let by_price = doc.search("€599");
        assert_eq!(by_price.destinations.len(), 1);
        assert_eq!(by_price.destinations[0].name, "Paris, France");

        let services = doc.search("VISA");
        assert!(services.destinations.is_empty());
        assert_eq!(services.services.len(), 1);
    }

    #[test]
    fn test_find_service_takes_first_match() {
        let mut doc = SiteDocument::seed();
        let mut dup = doc.services[0].clone();
        dup.description = "duplicate".into();
        doc.services.push(dup);

        let found = doc.find_service("Réservation de Vols").unwrap();
        assert_ne!(found.description, "duplicate");
        assert!(doc.find_service("Croisières").is_none());
    }
}
