//! Foreign-birth classification from the free-text birthplace (shusshin).

/// Romanized prefecture names, lowercase, matched against whole words
const PREFECTURES: &[&str] = &[
    "hokkaido", "aomori", "iwate", "miyagi", "akita", "yamagata", "fukushima",
    "ibaraki", "tochigi", "gunma", "saitama", "chiba", "tokyo", "kanagawa",
    "niigata", "toyama", "ishikawa", "fukui", "yamanashi", "nagano", "gifu",
    "shizuoka", "aichi", "mie", "shiga", "kyoto", "osaka", "hyogo", "nara",
    "wakayama", "tottori", "shimane", "okayama", "hiroshima", "yamaguchi",
    "tokushima", "kagawa", "ehime", "kochi", "fukuoka", "saga", "nagasaki",
    "kumamoto", "oita", "miyazaki", "kagoshima", "okinawa",
    // Macron spellings
    "hokkaidō", "tōkyō", "ōsaka", "kyōto", "hyōgo", "kōchi", "ōita",
    "prefecture",
];

/// Administrative suffixes: prefecture, metropolis, urban prefecture, circuit
const ADMIN_SUFFIXES: &[char] = &['県', '都', '府', '道'];

/// A birthplace is domestic when it names a prefecture or carries a Japanese
/// administrative suffix. Empty text is treated as domestic.
pub fn is_foreign_born(shusshin: &str) -> bool {
    let shusshin = shusshin.trim();
    if shusshin.is_empty() {
        return false;
    }

    if shusshin.contains(ADMIN_SUFFIXES) {
        return false;
    }

    let domestic = shusshin
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_lowercase())
        .any(|word| PREFECTURES.contains(&word.as_str()));

    !domestic
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domestic_birthplaces() {
        assert!(!is_foreign_born("Tokyo"));
        assert!(!is_foreign_born("Osaka"));
        assert!(!is_foreign_born("Kagoshima-ken, Amami"));
        assert!(!is_foreign_born("Aomori Prefecture"));
        assert!(!is_foreign_born("北海道"));
        assert!(!is_foreign_born("鹿児島県"));
        assert!(!is_foreign_born("HYOGO"));
    }

    #[test]
    fn test_empty_is_not_foreign() {
        assert!(!is_foreign_born(""));
        assert!(!is_foreign_born("  "));
    }

    #[test]
    fn test_foreign_birthplaces() {
        assert!(is_foreign_born("Ulaanbaatar, Mongolia"));
        assert!(is_foreign_born("Hawaii, USA"));
        assert!(is_foreign_born("Tbilisi, Georgia"));
    }

    #[test]
    fn test_prefecture_names_match_whole_words_only() {
        // "Nara" inside a Mongolian given name is not the prefecture
        assert!(is_foreign_born("Narantuya, Mongolia"));
        assert!(is_foreign_born("Miercurea, Romania"));
    }
}
