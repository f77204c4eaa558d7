// src/config/profiles.rs
//! Per-category profiles: aggregation weights and the confidence signals that only make
//! sense for one product family. One parameterized calculator consumes these instead of
//! a near-duplicate calculator per category.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analyze::scoring::Dimension;
use crate::category::ProductCategory;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryProfile {
    /// Weight of every breakdown dimension in the overall score.
    pub weights: BTreeMap<Dimension, f32>,
    /// Name keywords that indicate the product really belongs to this category.
    pub keywords: Vec<String>,
    pub keyword_increment: f32,
    pub keyword_cap: f32,
    /// Weight of the recognized-ingredient fraction.
    pub recognition_weight: f32,
    /// Bonus for a complete ingredient list (at least `full_list_min` tokens).
    pub full_list_increment: f32,
    pub full_list_min: usize,
    /// Bonus for a recognized sub-kind (cosmetic kind, detergent type).
    pub kind_increment: f32,
    pub brand_increment: f32,
    pub certification_increment: f32,
    pub certification_cap: f32,
}

impl Default for CategoryProfile {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
            keywords: Vec::new(),
            keyword_increment: 0.05,
            keyword_cap: 0.10,
            recognition_weight: 0.0,
            full_list_increment: 0.0,
            full_list_min: 0,
            kind_increment: 0.0,
            brand_increment: 0.0,
            certification_increment: 0.0,
            certification_cap: 0.0,
        }
    }
}

impl CategoryProfile {
    pub fn cosmetic() -> Self {
        Self {
            weights: BTreeMap::from([
                (Dimension::Safety, 0.4),
                (Dimension::Efficacy, 0.3),
                (Dimension::Allergens, 0.2),
                (Dimension::Formulation, 0.1),
            ]),
            keywords: words(&[
                "CREME", "CREAM", "SERUM", "LAIT", "LOTION", "SHAMPOING", "SHAMPOO", "GEL", "BAUME",
                "MASQUE", "HUILE", "SAVON", "DEODORANT", "SOIN", "VISAGE", "CORPS", "DENTIFRICE",
                "MAQUILLAGE", "SOLAIRE",
            ]),
            recognition_weight: 0.20,
            full_list_increment: 0.05,
            full_list_min: 10,
            kind_increment: 0.05,
            brand_increment: 0.05,
            certification_increment: 0.05,
            certification_cap: 0.10,
            ..Self::default()
        }
    }

    pub fn detergent() -> Self {
        Self {
            weights: BTreeMap::from([
                (Dimension::Ecotoxicity, 0.30),
                (Dimension::Biodegradability, 0.25),
                (Dimension::Irritation, 0.25),
                (Dimension::Environmental, 0.20),
            ]),
            keywords: words(&[
                "LESSIVE", "DETERGENT", "VAISSELLE", "NETTOYANT", "ADOUCISSANT", "LAUNDRY", "DISH",
                "CLEANER", "DETACHANT", "JAVEL", "MULTI-USAGES", "SOL", "VITRES", "WC",
            ]),
            recognition_weight: 0.20,
            kind_increment: 0.10,
            certification_increment: 0.05,
            certification_cap: 0.10,
            ..Self::default()
        }
    }

    /// Food only uses the shared increments; NOVA scoring lives outside this crate.
    pub fn food() -> Self {
        Self {
            keywords: words(&[
                "BIO", "YAOURT", "PAIN", "FROMAGE", "JUS", "BISCUIT", "CHOCOLAT", "CEREALES", "LAIT",
                "SOUPE", "PLAT", "BOISSON",
            ]),
            ..Self::default()
        }
    }
}

fn words(ws: &[&str]) -> Vec<String> {
    ws.iter().map(|w| w.to_string()).collect()
}

/// A `[profiles.<category>]` table overlays only the keys it names onto that
/// category's built-in profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ProfilesOverlay")]
pub struct Profiles {
    pub food: CategoryProfile,
    pub cosmetic: CategoryProfile,
    pub detergent: CategoryProfile,
}

impl Default for Profiles {
    fn default() -> Self {
        Self {
            food: CategoryProfile::food(),
            cosmetic: CategoryProfile::cosmetic(),
            detergent: CategoryProfile::detergent(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileOverlay {
    weights: Option<BTreeMap<Dimension, f32>>,
    keywords: Option<Vec<String>>,
    keyword_increment: Option<f32>,
    keyword_cap: Option<f32>,
    recognition_weight: Option<f32>,
    full_list_increment: Option<f32>,
    full_list_min: Option<usize>,
    kind_increment: Option<f32>,
    brand_increment: Option<f32>,
    certification_increment: Option<f32>,
    certification_cap: Option<f32>,
}

macro_rules! overlay_fields {
    ($base:ident, $over:ident, $($field:ident),* $(,)?) => {
        $(
            if let Some(v) = $over.$field {
                $base.$field = v;
            }
        )*
    };
}

impl ProfileOverlay {
    fn apply(self, mut base: CategoryProfile) -> CategoryProfile {
        let over = self;
        overlay_fields!(
            base,
            over,
            weights,
            keywords,
            keyword_increment,
            keyword_cap,
            recognition_weight,
            full_list_increment,
            full_list_min,
            kind_increment,
            brand_increment,
            certification_increment,
            certification_cap,
        );
        base
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfilesOverlay {
    food: ProfileOverlay,
    cosmetic: ProfileOverlay,
    detergent: ProfileOverlay,
}

impl From<ProfilesOverlay> for Profiles {
    fn from(o: ProfilesOverlay) -> Self {
        Self {
            food: o.food.apply(CategoryProfile::food()),
            cosmetic: o.cosmetic.apply(CategoryProfile::cosmetic()),
            detergent: o.detergent.apply(CategoryProfile::detergent()),
        }
    }
}

impl Profiles {
    pub fn get(&self, category: ProductCategory) -> &CategoryProfile {
        match category {
            ProductCategory::Food => &self.food,
            ProductCategory::Cosmetic => &self.cosmetic,
            ProductCategory::Detergent => &self.detergent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        for p in [CategoryProfile::cosmetic(), CategoryProfile::detergent()] {
            let sum: f32 = p.weights.values().sum();
            assert!((sum - 1.0).abs() < 1e-6, "weights sum {}", sum);
        }
    }

    #[test]
    fn partial_profile_keeps_category_values() {
        let p: Profiles = toml::from_str(
            r#"
            [cosmetic]
            keywords = ["CREME"]

            [detergent]
            kind_increment = 0.2
            "#,
        )
        .unwrap();

        let builtin = CategoryProfile::cosmetic();
        assert_eq!(p.cosmetic.keywords, vec!["CREME".to_string()]);
        assert_eq!(p.cosmetic.recognition_weight, builtin.recognition_weight);
        assert_eq!(p.cosmetic.full_list_increment, builtin.full_list_increment);
        assert_eq!(p.cosmetic.full_list_min, builtin.full_list_min);
        assert_eq!(p.cosmetic.kind_increment, builtin.kind_increment);
        assert_eq!(p.cosmetic.brand_increment, builtin.brand_increment);
        assert_eq!(p.cosmetic.weights, builtin.weights);

        assert_eq!(p.detergent.kind_increment, 0.2);
        assert_eq!(p.detergent.keywords, CategoryProfile::detergent().keywords);
        assert_eq!(p.food.keywords, CategoryProfile::food().keywords);
    }
}
