use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lower-case `s` and strip diacritics, so `Hôtels` and `hotels` compare equal.
pub fn fold(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold() {
        assert_eq!(fold("Hôtels de Prestige"), "hotels de prestige");
        assert_eq!(fold("Réservation"), "reservation");
        assert_eq!(fold("plain"), "plain");
    }
}
