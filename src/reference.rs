//! # Reference tables
//!
//! Static knowledge bases the analyzers scan ingredient tokens against: endocrine
//! disruptors, toxic/sensitizing ingredients, allergens, beneficial actives, detergent
//! ecotoxicity and irritation hazards, biodegradability ratings, eco-certifications,
//! natural/synthetic origin markers and product vocabulary (kinds, detergent types, brands).
//!
//! The data lives in `data/*.json`, is embedded at compile time and parsed once on first
//! access. Lookups are by normalized token and are alias-aware. Nothing here is ever
//! mutated after initialization.

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::category::ProductCategory;
use crate::normalize::{contains_phrase, fold_label};

/// Three-step tier used for hazard risk, allergen prevalence and evidence strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HazardEntry {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub risk_level: Level,
    pub effect: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AllergenEntry {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub prevalence: Level,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BenefitEntry {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub benefit: String,
    pub evidence_level: Level,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Biodegradability {
    /// Passes OECD 301 ready-biodegradability tests.
    Readily,
    /// Degrades, but slowly or incompletely.
    Inherent,
    /// Persists in the environment.
    Persistent,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BiodegradabilityEntry {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub rating: Biodegradability,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CertificationEntry {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub scope: Vec<ProductCategory>,
    /// Points added to the environmental sub-score (before the stacking cap).
    pub bonus: u8,
    pub source: String,
}

impl CertificationEntry {
    fn labels(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Entries that can be found by their INCI name or one of its aliases.
pub trait Named {
    fn name(&self) -> &str;
    fn aliases(&self) -> &[String];
}

macro_rules! impl_named {
    ($($t:ty),*) => {$(
        impl Named for $t {
            fn name(&self) -> &str {
                &self.name
            }
            fn aliases(&self) -> &[String] {
                &self.aliases
            }
        }
    )*};
}

impl_named!(
    HazardEntry,
    AllergenEntry,
    BenefitEntry,
    BiodegradabilityEntry,
    CertificationEntry
);

/// An immutable table with an alias-aware index keyed by uppercase name.
#[derive(Debug, Clone)]
pub struct Table<T> {
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Named> Table<T> {
    pub fn new(entries: Vec<T>) -> Self {
        let mut index = HashMap::new();
        for (i, e) in entries.iter().enumerate() {
            for key in std::iter::once(e.name()).chain(e.aliases().iter().map(String::as_str)) {
                // First entry wins on duplicate keys.
                index.entry(table_key(key)).or_insert(i);
            }
        }
        Self { entries, index }
    }

    /// Look up a normalized ingredient token (name or alias).
    pub fn get(&self, token: &str) -> Option<&T> {
        self.index.get(&table_key(token)).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(&table_key(token))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Named + DeserializeOwned> Table<T> {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let entries: Vec<T> = serde_json::from_str(raw)?;
        Ok(Self::new(entries))
    }
}

fn table_key(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Origin markers are substrings; synthetic markers are checked first so that
/// e.g. `SODIUM COCO SULFATE` counts as synthetic despite `COCO`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OriginMarkers {
    pub natural: Vec<String>,
    pub synthetic: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Natural,
    Synthetic,
}

impl OriginMarkers {
    pub fn classify(&self, token: &str) -> Option<Origin> {
        let padded = format!(" {} ", token.to_uppercase());
        if self.synthetic.iter().any(|m| padded.contains(m.as_str())) {
            Some(Origin::Synthetic)
        } else if self.natural.iter().any(|m| padded.contains(m.as_str())) {
            Some(Origin::Natural)
        } else {
            None
        }
    }
}

/// Words and names recognized in product names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductVocabulary {
    #[serde(default)]
    pub cosmetic_kinds: BTreeMap<String, String>,
    #[serde(default)]
    pub detergent_types: BTreeMap<String, String>,
    #[serde(default)]
    pub cosmetic_brands: Vec<String>,
}

impl ProductVocabulary {
    /// Cosmetic kind (`soin`, `capillaire`, ...) from the longest keyword found in the name.
    pub fn cosmetic_kind(&self, product_name: &str) -> Option<&str> {
        longest_phrase_match(&self.cosmetic_kinds, product_name)
    }

    /// Detergent type (`lessive`, `vaisselle`, ...) from the longest keyword found in the name.
    pub fn detergent_type(&self, product_name: &str) -> Option<&str> {
        longest_phrase_match(&self.detergent_types, product_name)
    }

    pub fn brand(&self, product_name: &str) -> Option<&str> {
        let hay = fold_label(product_name);
        self.cosmetic_brands
            .iter()
            .find(|b| contains_phrase(&hay, &fold_label(b)))
            .map(String::as_str)
    }
}

fn longest_phrase_match<'a>(map: &'a BTreeMap<String, String>, text: &str) -> Option<&'a str> {
    let hay = fold_label(text);
    map.iter()
        .filter(|(k, _)| contains_phrase(&hay, &fold_label(k)))
        .max_by_key(|(k, _)| k.len())
        .map(|(_, v)| v.as_str())
}

/// All reference data, loaded once.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub endocrine_disruptors: Table<HazardEntry>,
    pub toxic_ingredients: Table<HazardEntry>,
    pub allergens: Table<AllergenEntry>,
    pub actives: Table<BenefitEntry>,
    pub ecotoxicity: Table<HazardEntry>,
    pub detergent_irritants: Table<HazardEntry>,
    pub biodegradability: Table<BiodegradabilityEntry>,
    pub certifications: Table<CertificationEntry>,
    pub origin: OriginMarkers,
    pub vocabulary: ProductVocabulary,
}

static TABLES: Lazy<ReferenceTables> = Lazy::new(|| ReferenceTables {
    endocrine_disruptors: Table::from_json(include_str!("../data/endocrine_disruptors.json"))
        .expect("valid endocrine disruptor table"),
    toxic_ingredients: Table::from_json(include_str!("../data/toxic_ingredients.json"))
        .expect("valid toxic ingredient table"),
    allergens: Table::from_json(include_str!("../data/allergens.json"))
        .expect("valid allergen table"),
    actives: Table::from_json(include_str!("../data/actives.json"))
        .expect("valid actives table"),
    ecotoxicity: Table::from_json(include_str!("../data/ecotoxicity.json"))
        .expect("valid ecotoxicity table"),
    detergent_irritants: Table::from_json(include_str!("../data/detergent_irritants.json"))
        .expect("valid detergent irritant table"),
    biodegradability: Table::from_json(include_str!("../data/biodegradability.json"))
        .expect("valid biodegradability table"),
    certifications: Table::from_json(include_str!("../data/certifications.json"))
        .expect("valid certification table"),
    origin: serde_json::from_str(include_str!("../data/ingredient_origin.json"))
        .expect("valid ingredient origin markers"),
    vocabulary: serde_json::from_str(include_str!("../data/product_vocabulary.json"))
        .expect("valid product vocabulary"),
});

/// Shared read-only reference data.
pub fn tables() -> &'static ReferenceTables {
    &TABLES
}

impl ReferenceTables {
    /// `true` if the token appears in any table relevant to `category`.
    pub fn recognizes(&self, token: &str, category: ProductCategory) -> bool {
        let common = self.endocrine_disruptors.contains(token)
            || self.toxic_ingredients.contains(token)
            || self.allergens.contains(token)
            || self.actives.contains(token);
        match category {
            ProductCategory::Detergent => {
                common
                    || self.ecotoxicity.contains(token)
                    || self.detergent_irritants.contains(token)
                    || self.biodegradability.contains(token)
            }
            _ => common,
        }
    }

    /// Certifications of the given scope found in the supplied labels or in the product name.
    /// Each certification is reported once, in table order.
    pub fn detect_certifications(
        &self,
        category: ProductCategory,
        product_name: Option<&str>,
        supplied: &[String],
    ) -> Vec<&CertificationEntry> {
        let mut haystacks: Vec<String> = supplied.iter().map(|s| fold_certification(s)).collect();
        if let Some(name) = product_name {
            haystacks.push(fold_certification(name));
        }

        self.certifications
            .iter()
            .filter(|c| c.scope.contains(&category))
            .filter(|c| {
                c.labels().any(|label| {
                    let needle = fold_certification(label);
                    haystacks.iter().any(|h| contains_phrase(h, &needle))
                })
            })
            .collect()
    }
}

/// Labels are written `EU-Ecolabel`, `ECOCERT-Greenlife` as often as with spaces.
fn fold_certification(s: &str) -> String {
    fold_label(s)
        .split(|c: char| c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
