//! Allergen analyzer.
//!
//! Score: 100 minus a prevalence-weighted penalty per allergen. Tier: from the number of
//! *distinct* allergens, not from formulation size.

use serde::Serialize;
use std::collections::HashSet;

use crate::config::AllergenPolicy;
use crate::normalize::IngredientList;
use crate::reference::{Level, ReferenceTables};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllergenHit {
    pub ingredient: String,
    pub prevalence: Level,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllergenAnalysis {
    pub detected: Vec<AllergenHit>,
    pub risk: Level,
    pub score: u8,
}

pub fn analyze(tokens: &IngredientList, tables: &ReferenceTables, policy: &AllergenPolicy) -> AllergenAnalysis {
    let mut seen = HashSet::new();
    let detected: Vec<AllergenHit> = tokens
        .iter()
        .filter_map(|t| tables.allergens.get(t.as_str()).map(|e| (t, e)))
        .filter(|(_, e)| seen.insert(e.name.as_str()))
        .map(|(t, e)| AllergenHit {
            ingredient: t.to_string(),
            prevalence: e.prevalence,
            source: e.source.clone(),
        })
        .collect();

    let points: u32 = detected
        .iter()
        .map(|a| policy.penalties.for_level(a.prevalence))
        .sum();

    let risk = if detected.len() >= policy.high_count {
        Level::High
    } else if detected.len() >= policy.medium_count {
        Level::Medium
    } else {
        Level::Low
    };

    AllergenAnalysis {
        detected,
        risk,
        score: 100u32.saturating_sub(points) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, IngredientsInput};
    use crate::reference::tables;

    fn run(s: &str) -> AllergenAnalysis {
        let list = normalize(&IngredientsInput::from(s)).unwrap();
        analyze(&list, tables(), &AllergenPolicy::default())
    }

    #[test]
    fn tier_follows_distinct_count() {
        assert_eq!(run("AQUA, GLYCERIN").risk, Level::Low);
        assert_eq!(run("AQUA, LINALOOL").risk, Level::Low);
        assert_eq!(run("AQUA, LINALOOL, BENZYL ALCOHOL").risk, Level::Medium);
        assert_eq!(run("LINALOOL, BENZYL ALCOHOL, FARNESOL").risk, Level::High);
    }

    #[test]
    fn penalty_weighted_by_prevalence() {
        // LINALOOL high 15, CITRONELLOL medium 10, FARNESOL low 5
        let a = run("LINALOOL, CITRONELLOL, FARNESOL");
        assert_eq!(a.score, 70);
        assert_eq!(a.detected.len(), 3);
    }

    #[test]
    fn aliases_count_as_one_allergen() {
        let a = run("LIMONENE, D-LIMONENE");
        assert_eq!(a.detected.len(), 1);
        assert_eq!(a.score, 85);
    }
}
