//! # Ingredient normalizer
//!
//! Turns whatever the collaborator sent (composition text or an already split list,
//! under one of several field names) into the single ordered, deduplicated token list
//! every analyzer receives.
//!
//! Text rules, in order (list items get 5 to 7):
//! 1. strip a leading `ingredients:` / `ingrédients:` / `composition:` / `inci:` label
//! 2. drop parenthetical and bracketed notes, `(10%)`, `[+/- CI 77491]`
//! 3. drop standalone percentages, `2%`, `0,5 %`, `<1%`
//! 4. split on `,` and `;`
//! 5. cut from any remaining `(` / `[` to the end of the piece, drop stray `)` / `]`
//! 6. trim, strip organic markers (`*`) and trailing periods, collapse spaces, uppercase
//! 7. drop empty pieces, deduplicate keeping first-seen order

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::error::AnalysisError;

static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:ingr[ée]dients?|composition|inci)\s*:\s*").expect("label regex")
});
static NOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^()]*\)|\[[^\[\]]*\]").expect("note regex"));
static PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[<>≤≥]?\s*\d+(?:[.,]\d+)?\s*%").expect("percent regex"));

/// Pure water synonyms. They carry no hazard or benefit and are dropped for formulation analysis.
const WATER_SYNONYMS: [&str; 3] = ["WATER", "AQUA", "EAU"];

/// One normalized ingredient: trimmed, uppercase, single-spaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IngredientToken(String);

impl IngredientToken {
    /// Normalize a single raw piece. Returns `None` if nothing is left.
    ///
    /// Anything from an opening bracket on is a note, closed or not; stray closers are dropped.
    pub fn parse(raw: &str) -> Option<Self> {
        let head = raw.split(['(', '[']).next().unwrap_or_default();
        let unbracketed: String = head.chars().filter(|c| !matches!(c, ')' | ']')).collect();
        let cleaned = unbracketed
            .trim()
            .trim_matches(|c: char| c == '*' || c == '.' || c.is_whitespace());
        let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            None
        } else {
            Some(Self(collapsed.to_uppercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `AQUA`, `WATER`, `EAU`, and slash combinations such as `AQUA/WATER/EAU`.
    pub fn is_water(&self) -> bool {
        self.0
            .split('/')
            .all(|part| WATER_SYNONYMS.contains(&part.trim()))
    }
}

impl fmt::Display for IngredientToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IngredientToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered, duplicate-free token sequence shared by all analyzers of one call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct IngredientList {
    tokens: Vec<IngredientToken>,
}

impl IngredientList {
    pub fn from_tokens(tokens: impl IntoIterator<Item = IngredientToken>) -> Self {
        let mut seen = HashSet::new();
        let tokens = tokens
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();
        Self { tokens }
    }

    pub fn iter(&self) -> impl Iterator<Item = &IngredientToken> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The water-stripped variant used by formulation analysis.
    pub fn without_water(&self) -> IngredientList {
        Self {
            tokens: self.tokens.iter().filter(|t| !t.is_water()).cloned().collect(),
        }
    }

    pub fn as_strs(&self) -> Vec<&str> {
        self.tokens.iter().map(IngredientToken::as_str).collect()
    }
}

/// Ingredients as supplied by a collaborator: free composition text or an explicit list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IngredientsInput {
    List(Vec<String>),
    Text(String),
}

impl From<&str> for IngredientsInput {
    fn from(s: &str) -> Self {
        IngredientsInput::Text(s.to_string())
    }
}

impl From<String> for IngredientsInput {
    fn from(s: String) -> Self {
        IngredientsInput::Text(s)
    }
}

impl From<Vec<String>> for IngredientsInput {
    fn from(v: Vec<String>) -> Self {
        IngredientsInput::List(v)
    }
}

impl From<&[&str]> for IngredientsInput {
    fn from(v: &[&str]) -> Self {
        IngredientsInput::List(v.iter().map(|s| s.to_string()).collect())
    }
}

/// Normalize collaborator input into the shared token list.
///
/// An empty result is a validation failure (`MISSING_INGREDIENTS`); callers must not score it.
pub fn normalize(input: &IngredientsInput) -> Result<IngredientList, AnalysisError> {
    let list = match input {
        IngredientsInput::List(items) => {
            IngredientList::from_tokens(items.iter().filter_map(|s| IngredientToken::parse(s)))
        }
        IngredientsInput::Text(text) => IngredientList::from_tokens(split_composition(text)),
    };
    if list.is_empty() {
        return Err(AnalysisError::MissingIngredients);
    }
    Ok(list)
}

fn split_composition(text: &str) -> Vec<IngredientToken> {
    let mut s = LABEL_RE.replace(text, "").into_owned();

    // Innermost notes first, until nested ones are gone too.
    loop {
        let next = NOTE_RE.replace_all(&s, " ").into_owned();
        if next == s {
            break;
        }
        s = next;
    }
    let s = PERCENT_RE.replace_all(&s, " ");

    s.split([',', ';'])
        .filter_map(IngredientToken::parse)
        .collect()
}

/// Fold a free-text label (product name, certification) for phrase matching:
/// uppercase, common French accents removed, punctuation other than `'`, `-`, `&` turned into spaces.
pub fn fold_label(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars().flat_map(char::to_uppercase) {
        let mapped = match ch {
            'À' | 'Â' | 'Ä' | 'Á' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'Î' | 'Ï' | 'Í' => 'I',
            'Ô' | 'Ö' | 'Ó' => 'O',
            'Ù' | 'Û' | 'Ü' | 'Ú' => 'U',
            'Ç' => 'C',
            '’' | '`' => '\'',
            c if c.is_alphanumeric() || c == '\'' || c == '-' || c == '&' => c,
            _ => ' ',
        };
        out.push(mapped);
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whole-word phrase containment over two already folded strings.
pub fn contains_phrase(folded_haystack: &str, folded_needle: &str) -> bool {
    if folded_needle.is_empty() {
        return false;
    }
    format!(" {} ", folded_haystack).contains(&format!(" {} ", folded_needle))
}

/// Ingredient fields in fallback order for explicit lists.
const INGREDIENT_FIELDS: [&str; 4] = ["inciList", "inci", "ingredients", "composition"];
/// Ingredient fields in fallback order for free text.
const TEXT_FIELDS: [&str; 4] = ["composition", "ingredients", "inci", "inciList"];

/// A collaborator payload after shape validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPayload {
    pub ingredients: IngredientsInput,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub certifications: Vec<String>,
}

impl ProductPayload {
    /// Resolve a raw JSON payload.
    ///
    /// Priority: explicit list (first array among `inciList`, `inci`, `ingredients`,
    /// `composition`) > `composition` text > `ingredients` text > `inci`/`inciList` text.
    /// A candidate field that is present with any other type (including `null`) is rejected.
    pub fn from_value(value: &Value) -> Result<Self, AnalysisError> {
        let obj = value
            .as_object()
            .ok_or_else(|| AnalysisError::InvalidInput("payload must be a JSON object".into()))?;

        for field in INGREDIENT_FIELDS {
            match obj.get(field) {
                None | Some(Value::String(_)) => {}
                Some(Value::Array(items)) => {
                    if items.iter().any(|v| !v.is_string()) {
                        return Err(AnalysisError::InvalidInput(format!(
                            "`{}` must only contain strings",
                            field
                        )));
                    }
                }
                Some(other) => {
                    return Err(AnalysisError::InvalidInput(format!(
                        "`{}` must be a string or an array of strings, got {}",
                        field,
                        json_type(other)
                    )));
                }
            }
        }

        let list = INGREDIENT_FIELDS
            .iter()
            .find_map(|f| obj.get(*f).and_then(Value::as_array))
            .map(|items| {
                IngredientsInput::List(
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                )
            });
        let text = || {
            TEXT_FIELDS
                .iter()
                .find_map(|f| obj.get(*f).and_then(Value::as_str))
                .map(|s| IngredientsInput::Text(s.to_string()))
        };
        let ingredients = list
            .or_else(text)
            .ok_or(AnalysisError::MissingIngredients)?;

        Ok(Self {
            ingredients,
            product_name: optional_string(obj, "productName")?
                .or(optional_string(obj, "name")?),
            category: optional_string(obj, "category")?,
            certifications: string_list(obj, "certifications")?,
        })
    }
}

fn optional_string(obj: &Map<String, Value>, field: &str) -> Result<Option<String>, AnalysisError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => Err(AnalysisError::InvalidInput(format!(
            "`{}` must be a string, got {}",
            field,
            json_type(other)
        ))),
    }
}

fn string_list(obj: &Map<String, Value>, field: &str) -> Result<Vec<String>, AnalysisError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    AnalysisError::InvalidInput(format!("`{}` must only contain strings", field))
                })
            })
            .collect(),
        Some(other) => Err(AnalysisError::InvalidInput(format!(
            "`{}` must be an array of strings, got {}",
            field,
            json_type(other)
        ))),
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn norm(s: &str) -> Vec<String> {
        normalize(&IngredientsInput::from(s))
            .unwrap()
            .iter()
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn strips_percentages_and_parens_and_folds_case() {
        assert_eq!(
            norm("AQUA, GLYCERIN (10%), Cetyl Alcohol"),
            vec!["AQUA", "GLYCERIN", "CETYL ALCOHOL"]
        );
    }

    #[test]
    fn strips_label_notes_markers_and_duplicates() {
        assert_eq!(
            norm("Ingrédients : aqua; Glycerin 2%;  shea   butter*, glycerin, [+/- CI 77491], Tocopherol."),
            vec!["AQUA", "GLYCERIN", "SHEA BUTTER", "TOCOPHEROL"]
        );
        assert_eq!(norm("INCI: Aqua (Water (eau)), Parfum"), vec!["AQUA", "PARFUM"]);
    }

    #[test]
    fn unbalanced_brackets_do_not_leak_into_tokens() {
        assert_eq!(
            norm("GLYCERIN (10%, AQUA, TOCOPHEROL [vit E"),
            vec!["GLYCERIN", "AQUA", "TOCOPHEROL"]
        );
        assert_eq!(norm("Glycerin), Aqua]"), vec!["GLYCERIN", "AQUA"]);

        let input = IngredientsInput::List(vec!["Glycerin (".into(), "Parfum (Fragrance)".into()]);
        assert_eq!(normalize(&input).unwrap().as_strs(), vec!["GLYCERIN", "PARFUM"]);
    }

    #[test]
    fn decimal_comma_percentages_do_not_split_tokens() {
        assert_eq!(norm("Niacinamide 0,5 %, Urea"), vec!["NIACINAMIDE", "UREA"]);
    }

    #[test]
    fn list_input_is_trimmed_uppercased_and_deduplicated() {
        let input = IngredientsInput::List(vec![
            " aqua ".into(),
            "Glycerin".into(),
            "".into(),
            "GLYCERIN".into(),
        ]);
        let list = normalize(&input).unwrap();
        assert_eq!(list.as_strs(), vec!["AQUA", "GLYCERIN"]);
    }

    #[test]
    fn empty_input_is_missing_ingredients() {
        assert_eq!(
            normalize(&IngredientsInput::from("  Ingredients:  (none) ; , ")),
            Err(AnalysisError::MissingIngredients)
        );
        assert_eq!(
            normalize(&IngredientsInput::List(vec![])),
            Err(AnalysisError::MissingIngredients)
        );
    }

    #[test]
    fn water_variant_drops_synonyms_only() {
        let list = normalize(&IngredientsInput::from("Aqua/Water/Eau, Eau Florale, Glycerin")).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.without_water().as_strs(), vec!["EAU FLORALE", "GLYCERIN"]);
    }

    #[test]
    fn payload_prefers_explicit_list_then_composition() {
        let p = ProductPayload::from_value(&json!({
            "ingredients": "aqua, parfum",
            "composition": "aqua, glycerin",
            "inci": ["Aqua", "Niacinamide"],
            "productName": "  Sérum  ",
        }))
        .unwrap();
        assert_eq!(
            p.ingredients,
            IngredientsInput::List(vec!["Aqua".into(), "Niacinamide".into()])
        );
        assert_eq!(p.product_name.as_deref(), Some("Sérum"));

        let p = ProductPayload::from_value(&json!({
            "ingredients": "aqua, parfum",
            "composition": "aqua, glycerin",
            "name": "Lessive",
            "certifications": ["EU Ecolabel"],
        }))
        .unwrap();
        assert_eq!(p.ingredients, IngredientsInput::Text("aqua, glycerin".into()));
        assert_eq!(p.product_name.as_deref(), Some("Lessive"));
        assert_eq!(p.certifications, vec!["EU Ecolabel".to_string()]);
    }

    #[test]
    fn payload_rejects_structurally_invalid_fields() {
        assert!(matches!(
            ProductPayload::from_value(&json!({ "ingredients": null })),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            ProductPayload::from_value(&json!({ "ingredients": 42 })),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            ProductPayload::from_value(&json!({ "inciList": ["AQUA", 3] })),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            ProductPayload::from_value(&json!(["AQUA"])),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert_eq!(
            ProductPayload::from_value(&json!({ "productName": "Crème" })),
            Err(AnalysisError::MissingIngredients)
        );
    }

    #[test]
    fn fold_label_and_phrase_matching() {
        assert_eq!(fold_label("Crème  L’Oréal (50ml)"), "CREME L'OREAL 50ML");
        assert!(contains_phrase("LESSIVE EU ECOLABEL", "EU ECOLABEL"));
        assert!(!contains_phrase("BIODERMA", "BIO"));
        assert!(!contains_phrase("ANYTHING", ""));
    }
}
