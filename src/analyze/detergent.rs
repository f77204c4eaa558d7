//! Detergent hazard dimensions: ecotoxicity, irritation and biodegradability.
//!
//! All three start at 100 and lose points per matched ingredient; water is excluded.

use serde::Serialize;
use std::collections::HashSet;

use super::risk::{penalty_for, scan_hazards, score_from_penalty, HazardHit};
use crate::config::DetergentPolicy;
use crate::normalize::IngredientList;
use crate::reference::{Biodegradability, ReferenceTables};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardScan {
    pub hits: Vec<HazardHit>,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiodegradabilityHit {
    pub ingredient: String,
    pub rating: Biodegradability,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiodegradabilityAnalysis {
    pub ratings: Vec<BiodegradabilityHit>,
    pub readily_count: usize,
    pub inherent_count: usize,
    pub persistent_count: usize,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetergentAnalysis {
    pub ecotoxicity: HazardScan,
    pub irritation: HazardScan,
    pub biodegradability: BiodegradabilityAnalysis,
}

pub fn analyze(tokens: &IngredientList, tables: &ReferenceTables, policy: &DetergentPolicy) -> DetergentAnalysis {
    let stripped = tokens.without_water();

    let eco_hits = scan_hazards(&stripped, &tables.ecotoxicity);
    let eco_score = score_from_penalty(penalty_for(&eco_hits, &policy.ecotoxicity_penalties));

    let irr_hits = scan_hazards(&stripped, &tables.detergent_irritants);
    let irr_score = score_from_penalty(penalty_for(&irr_hits, &policy.irritation_penalties));

    DetergentAnalysis {
        ecotoxicity: HazardScan {
            hits: eco_hits,
            score: eco_score,
        },
        irritation: HazardScan {
            hits: irr_hits,
            score: irr_score,
        },
        biodegradability: biodegradability(&stripped, tables, policy),
    }
}

fn biodegradability(
    tokens: &IngredientList,
    tables: &ReferenceTables,
    policy: &DetergentPolicy,
) -> BiodegradabilityAnalysis {
    let mut seen = HashSet::new();
    let ratings: Vec<BiodegradabilityHit> = tokens
        .iter()
        .filter_map(|t| tables.biodegradability.get(t.as_str()).map(|e| (t, e)))
        .filter(|(_, e)| seen.insert(e.name.as_str()))
        .map(|(t, e)| BiodegradabilityHit {
            ingredient: t.to_string(),
            rating: e.rating,
            source: e.source.clone(),
        })
        .collect();

    let count = |r: Biodegradability| ratings.iter().filter(|h| h.rating == r).count();
    let readily_count = count(Biodegradability::Readily);
    let inherent_count = count(Biodegradability::Inherent);
    let persistent_count = count(Biodegradability::Persistent);

    let points = inherent_count as u32 * policy.inherent_penalty
        + persistent_count as u32 * policy.persistent_penalty;

    BiodegradabilityAnalysis {
        readily_count,
        inherent_count,
        persistent_count,
        score: score_from_penalty(points),
        ratings,
    }
}
