//! Plural forms for backend model names
//!
//! Model names are PascalCase (`LeadStatus`, `CoinHistory`); only the last word
//! is inflected, the rest of the name is kept as is.

/// Utility for deriving the plural form of a model name
pub struct Pluralizer;

impl Pluralizer {
    /// Convert a singular model name to its plural form
    ///
    /// # Examples
    ///
    /// ```
    /// use academy::core::pluralize::Pluralizer;
    ///
    /// assert_eq!(Pluralizer::pluralize("Course"), "Courses");
    /// assert_eq!(Pluralizer::pluralize("CourseCategory"), "CourseCategories");
    /// assert_eq!(Pluralizer::pluralize("LeadStatus"), "LeadStatuses");
    /// assert_eq!(Pluralizer::pluralize("Address"), "Addresses");
    /// ```
    pub fn pluralize(singular: &str) -> String {
        if singular.is_empty() {
            return String::new();
        }

        let lower = singular.to_ascii_lowercase();
        let stem_len = singular.len();

        match lower.as_str() {
            // consonant + y -> ies
            s if s.ends_with('y')
                && !s.ends_with("ay")
                && !s.ends_with("ey")
                && !s.ends_with("iy")
                && !s.ends_with("oy")
                && !s.ends_with("uy")
                && s.len() > 1 =>
            {
                format!("{}ies", &singular[..stem_len - 1])
            }

            // sibilants -> es
            s if s.ends_with('s')
                || s.ends_with("sh")
                || s.ends_with("ch")
                || s.ends_with('x')
                || s.ends_with('z') =>
            {
                format!("{singular}es")
            }

            s if s.ends_with("fe") && s.len() > 2 => {
                format!("{}ves", &singular[..stem_len - 2])
            }

            s if s.ends_with('f') && !s.ends_with("ff") && s.len() > 1 => {
                format!("{}ves", &singular[..stem_len - 1])
            }

            // consonant + o -> es, with the usual exceptions
            s if s.ends_with('o') && s.len() > 1 => {
                let before_o = s.as_bytes()[s.len() - 2];
                let is_exception = ["photo", "piano", "halo", "video", "promo", "logo"]
                    .iter()
                    .any(|word| s.ends_with(word));
                if matches!(before_o, b'a' | b'e' | b'i' | b'o' | b'u') || is_exception {
                    format!("{singular}s")
                } else {
                    format!("{singular}es")
                }
            }

            _ => format!("{singular}s"),
        }
    }
}
