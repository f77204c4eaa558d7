//! Benefit analyzer: beneficial actives, weighted by evidence level, capped at 100.

use serde::Serialize;
use std::collections::HashSet;

use crate::config::BenefitPolicy;
use crate::normalize::IngredientList;
use crate::reference::{Level, ReferenceTables};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenefitHit {
    pub ingredient: String,
    pub benefit: String,
    pub evidence_level: Level,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenefitAnalysis {
    pub actives: Vec<BenefitHit>,
    pub score: u8,
}

pub fn analyze(tokens: &IngredientList, tables: &ReferenceTables, policy: &BenefitPolicy) -> BenefitAnalysis {
    let mut seen = HashSet::new();
    let actives: Vec<BenefitHit> = tokens
        .iter()
        .filter_map(|t| tables.actives.get(t.as_str()).map(|e| (t, e)))
        .filter(|(_, e)| seen.insert(e.name.as_str()))
        .map(|(t, e)| BenefitHit {
            ingredient: t.to_string(),
            benefit: e.benefit.clone(),
            evidence_level: e.evidence_level,
            source: e.source.clone(),
        })
        .collect();

    let total = actives
        .iter()
        .map(|a| policy.bonuses.for_level(a.evidence_level))
        .fold(policy.baseline, u32::saturating_add);

    BenefitAnalysis {
        actives,
        score: total.min(100) as u8,
    }
}
