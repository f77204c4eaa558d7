use serde::{Deserialize, Serialize};
use std::fmt;

/// Product families the engine knows about. Only cosmetics and detergents are scored here;
/// `Food` exists so the shared confidence calculator can serve the NOVA classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Food,
    Cosmetic,
    Detergent,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Food => "food",
            ProductCategory::Cosmetic => "cosmetic",
            ProductCategory::Detergent => "detergent",
        }
    }

    /// Lenient parse of the `category` field collaborators send (English or French, singular or plural).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "food" | "foods" | "alimentaire" | "alimentation" => Some(ProductCategory::Food),
            "cosmetic" | "cosmetics" | "cosmetique" | "cosmétique" | "cosmetiques"
            | "cosmétiques" => Some(ProductCategory::Cosmetic),
            "detergent" | "detergents" | "détergent" | "détergents" | "detergence"
            | "détergence" => Some(ProductCategory::Detergent),
            _ => None,
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_french_and_english_labels() {
        assert_eq!(
            ProductCategory::from_label(" Cosmétique "),
            Some(ProductCategory::Cosmetic)
        );
        assert_eq!(
            ProductCategory::from_label("detergents"),
            Some(ProductCategory::Detergent)
        );
        assert_eq!(ProductCategory::from_label("FOOD"), Some(ProductCategory::Food));
        assert_eq!(ProductCategory::from_label("furniture"), None);
    }
}
