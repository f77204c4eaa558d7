// src/analyze/mod.rs
//! Analysis pipeline entry: normalizes the input once, runs every analyzer over the same
//! token list, aggregates the breakdown and attaches confidence.
//!
//! Order per call:
//! 1) Normalization (validation failures are returned before any scoring)
//! 2) Risk, benefit, allergen and formulation analyzers (+ detergent hazard dimensions)
//! 3) Weighted aggregation with the category profile
//! 4) Confidence from input completeness
//!
//! `ScoringEngine::analyze_*` is the single recovery boundary: a panicking analyzer is
//! logged and surfaced as `AnalysisError::Internal`.

pub mod allergen;
pub mod benefit;
pub mod confidence;
pub mod debug;
pub mod detergent;
pub mod formulation;
pub mod risk;
pub mod scoring;

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::category::ProductCategory;
use crate::config::ScoringPolicy;
use crate::error::AnalysisError;
use crate::normalize::{normalize, IngredientList, IngredientsInput, ProductPayload};
use crate::reference::{self, Biodegradability, Level, ReferenceTables};

// Re-export convenient types.
pub use crate::analyze::allergen::AllergenAnalysis;
pub use crate::analyze::benefit::BenefitAnalysis;
pub use crate::analyze::confidence::{ConfidenceInputs, ConfidenceLevel};
pub use crate::analyze::detergent::DetergentAnalysis;
pub use crate::analyze::formulation::FormulationAnalysis;
pub use crate::analyze::risk::RiskAnalysis;
pub use crate::analyze::scoring::{Breakdown, Dimension, SubScore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    EndocrineDisruptor,
    Toxic,
    Allergen,
    Ecotoxicity,
    Irritation,
    Biodegradability,
}

/// One finding worth showing to the user, flattened across analyzers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub ingredient: String,
    pub kind: IssueKind,
    pub severity: Level,
    pub description: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisMeta {
    pub ingredients_analyzed: usize,
    pub ingredients_recognized: usize,
    pub processing_time_ms: u64,
    pub sources: Vec<String>,
}

/// Final value returned for one product. Built once, never mutated by the engine afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub category: ProductCategory,
    pub score: u8,
    pub confidence: f32,
    pub confidence_label: &'static str,
    pub is_publishable: bool,
    pub breakdown: Breakdown,
    pub risk_analysis: RiskAnalysis,
    pub benefit_analysis: BenefitAnalysis,
    pub allergen_analysis: AllergenAnalysis,
    pub formulation: FormulationAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detergent_analysis: Option<DetergentAnalysis>,
    pub issues: Vec<Issue>,
    pub meta: AnalysisMeta,
}

/// Stateless scorer: a policy plus the shared reference tables.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    policy: Arc<ScoringPolicy>,
    tables: &'static ReferenceTables,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringPolicy::default())
    }
}

impl ScoringEngine {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self::from_shared(Arc::new(policy))
    }

    pub fn from_shared(policy: Arc<ScoringPolicy>) -> Self {
        Self {
            policy,
            tables: reference::tables(),
        }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn tables(&self) -> &ReferenceTables {
        self.tables
    }

    pub fn analyze_cosmetic(
        &self,
        input: &IngredientsInput,
        product_name: Option<&str>,
    ) -> Result<ScoreResult, AnalysisError> {
        let name = clean_name(product_name);
        self.run(ProductCategory::Cosmetic, input, |tokens| {
            self.score_cosmetic(tokens, name)
        })
    }

    pub fn analyze_detergent(
        &self,
        input: &IngredientsInput,
        product_name: Option<&str>,
        certifications: &[String],
    ) -> Result<ScoreResult, AnalysisError> {
        let name = clean_name(product_name);
        self.run(ProductCategory::Detergent, input, |tokens| {
            self.score_detergent(tokens, name, certifications)
        })
    }

    /// Dispatch a resolved payload. `category` (from the route) wins over the payload's own
    /// `category` field.
    pub fn analyze_payload(
        &self,
        category: Option<ProductCategory>,
        payload: &ProductPayload,
    ) -> Result<ScoreResult, AnalysisError> {
        let category = match category {
            Some(c) => c,
            None => {
                let label = payload.category.as_deref().ok_or_else(|| {
                    AnalysisError::InvalidInput("`category` is required".into())
                })?;
                ProductCategory::from_label(label)
                    .ok_or_else(|| AnalysisError::UnsupportedCategory(label.to_string()))?
            }
        };

        let name = payload.product_name.as_deref();
        match category {
            ProductCategory::Cosmetic => self.analyze_cosmetic(&payload.ingredients, name),
            ProductCategory::Detergent => {
                self.analyze_detergent(&payload.ingredients, name, &payload.certifications)
            }
            ProductCategory::Food => Err(AnalysisError::UnsupportedCategory(
                ProductCategory::Food.to_string(),
            )),
        }
    }

    fn run<F>(
        &self,
        category: ProductCategory,
        input: &IngredientsInput,
        score: F,
    ) -> Result<ScoreResult, AnalysisError>
    where
        F: FnOnce(&IngredientList) -> Result<ScoreResult, AnalysisError>,
    {
        let started = Instant::now();

        let tokens = normalize(input).map_err(|e| {
            debug!(target: "scoring", %category, code = e.code(), "input rejected");
            e
        })?;

        let mut result = match panic::catch_unwind(AssertUnwindSafe(|| score(&tokens))) {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => {
                error!(target: "scoring", %category, error = %e, "analysis failed");
                return Err(e);
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                error!(target: "scoring", %category, error = %msg, "analyzer panicked");
                return Err(AnalysisError::Internal(msg));
            }
        };

        result.meta.processing_time_ms = started.elapsed().as_millis() as u64;

        // Never log raw ingredient text; only an anonymized id.
        info!(
            target: "scoring",
            %category,
            id = %anon_hash(&tokens),
            score = result.score,
            confidence = result.confidence,
            recognized = result.meta.ingredients_recognized,
            analyzed = result.meta.ingredients_analyzed,
            elapsed_ms = result.meta.processing_time_ms,
            "product scored"
        );
        Ok(result)
    }

    fn score_cosmetic(
        &self,
        tokens: &IngredientList,
        name: Option<&str>,
    ) -> Result<ScoreResult, AnalysisError> {
        let (p, t) = (&*self.policy, self.tables);
        let category = ProductCategory::Cosmetic;
        let profile = p.profile(category);

        let risk = risk::analyze(tokens, t, &p.risk);
        let benefit = benefit::analyze(tokens, t, &p.benefit);
        let allergens = allergen::analyze(tokens, t, &p.allergen);
        let formulation = formulation::analyze_cosmetic(tokens, name, t, &p.formulation);

        let scores = BTreeMap::from([
            (Dimension::Safety, (risk.score, safety_details(&risk))),
            (
                Dimension::Efficacy,
                (
                    benefit.score,
                    format!("{} beneficial active(s)", benefit.actives.len()),
                ),
            ),
            (Dimension::Allergens, (allergens.score, allergen_details(&allergens))),
            (
                Dimension::Formulation,
                (formulation.score, formulation_details(&formulation)),
            ),
        ]);
        let breakdown = scoring::build_breakdown(&profile.weights, scores)?;
        let score = scoring::aggregate(&breakdown)?;

        let recognized = count_recognized(t, tokens, category);
        let confidence = confidence::calculate(
            &ConfidenceInputs {
                has_composition: true,
                ingredient_count: tokens.len(),
                recognized_count: recognized,
                product_name: name,
                recognized_kind: formulation.product_kind.is_some(),
                known_brand: name.and_then(|n| t.vocabulary.brand(n)).is_some(),
                certification_count: formulation.certifications_detected.len(),
            },
            profile,
            &p.confidence,
        );

        let issues = collect_issues(&risk, &allergens, None);
        let sources = collect_sources(&risk, &benefit, &allergens, &formulation, None);

        Ok(ScoreResult {
            category,
            score,
            confidence,
            confidence_label: confidence::label_for(confidence),
            is_publishable: confidence::is_publishable(confidence, &p.confidence),
            breakdown,
            risk_analysis: risk,
            benefit_analysis: benefit,
            allergen_analysis: allergens,
            formulation,
            detergent_analysis: None,
            issues,
            meta: AnalysisMeta {
                ingredients_analyzed: tokens.len(),
                ingredients_recognized: recognized,
                processing_time_ms: 0,
                sources,
            },
        })
    }

    fn score_detergent(
        &self,
        tokens: &IngredientList,
        name: Option<&str>,
        certifications: &[String],
    ) -> Result<ScoreResult, AnalysisError> {
        let (p, t) = (&*self.policy, self.tables);
        let category = ProductCategory::Detergent;
        let profile = p.profile(category);

        let risk = risk::analyze(tokens, t, &p.risk);
        let benefit = benefit::analyze(tokens, t, &p.benefit);
        let allergens = allergen::analyze(tokens, t, &p.allergen);
        let hazards = detergent::analyze(tokens, t, &p.detergent);
        let formulation =
            formulation::analyze_detergent(tokens, name, certifications, t, &p.formulation);

        let scores = BTreeMap::from([
            (
                Dimension::Ecotoxicity,
                (
                    hazards.ecotoxicity.score,
                    format!("{} ecotoxic ingredient(s)", hazards.ecotoxicity.hits.len()),
                ),
            ),
            (
                Dimension::Biodegradability,
                (
                    hazards.biodegradability.score,
                    format!(
                        "{} readily, {} inherently biodegradable, {} persistent",
                        hazards.biodegradability.readily_count,
                        hazards.biodegradability.inherent_count,
                        hazards.biodegradability.persistent_count
                    ),
                ),
            ),
            (
                Dimension::Irritation,
                (
                    hazards.irritation.score,
                    format!("{} irritant(s)", hazards.irritation.hits.len()),
                ),
            ),
            (
                Dimension::Environmental,
                (formulation.score, formulation_details(&formulation)),
            ),
        ]);
        let breakdown = scoring::build_breakdown(&profile.weights, scores)?;
        let score = scoring::aggregate(&breakdown)?;

        let recognized = count_recognized(t, tokens, category);
        let confidence = confidence::calculate(
            &ConfidenceInputs {
                has_composition: true,
                ingredient_count: tokens.len(),
                recognized_count: recognized,
                product_name: name,
                recognized_kind: formulation.product_kind.is_some(),
                known_brand: false,
                certification_count: formulation.certifications_detected.len(),
            },
            profile,
            &p.confidence,
        );

        let issues = collect_issues(&risk, &allergens, Some(&hazards));
        let sources = collect_sources(&risk, &benefit, &allergens, &formulation, Some(&hazards));

        Ok(ScoreResult {
            category,
            score,
            confidence,
            confidence_label: confidence::label_for(confidence),
            is_publishable: confidence::is_publishable(confidence, &p.confidence),
            breakdown,
            risk_analysis: risk,
            benefit_analysis: benefit,
            allergen_analysis: allergens,
            formulation,
            detergent_analysis: Some(hazards),
            issues,
            meta: AnalysisMeta {
                ingredients_analyzed: tokens.len(),
                ingredients_recognized: recognized,
                processing_time_ms: 0,
                sources,
            },
        })
    }
}

fn clean_name(name: Option<&str>) -> Option<&str> {
    name.map(str::trim).filter(|n| !n.is_empty())
}

fn count_recognized(t: &ReferenceTables, tokens: &IngredientList, category: ProductCategory) -> usize {
    tokens
        .iter()
        .filter(|tok| t.recognizes(tok.as_str(), category))
        .count()
}

fn safety_details(r: &RiskAnalysis) -> String {
    format!(
        "{} endocrine disruptor(s), {} toxic ingredient(s), overall risk {}",
        r.endocrine_disruptors.len(),
        r.toxic_ingredients.len(),
        r.overall_risk.as_str()
    )
}

fn allergen_details(a: &AllergenAnalysis) -> String {
    format!("{} allergen(s), risk {}", a.detected.len(), a.risk.as_str())
}

fn formulation_details(f: &FormulationAnalysis) -> String {
    let mut s = format!(
        "{} ingredient(s), {:?} formulation",
        f.ingredient_count, f.complexity
    )
    .to_lowercase();
    if let Some(ratio) = f.natural_ratio {
        s.push_str(&format!(", {:.0}% natural", ratio * 100.0));
    }
    if !f.certifications_detected.is_empty() {
        s.push_str(&format!(
            ", {} certification(s)",
            f.certifications_detected.len()
        ));
    }
    s
}

fn collect_issues(
    risk: &RiskAnalysis,
    allergens: &AllergenAnalysis,
    hazards: Option<&DetergentAnalysis>,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut push_hits = |hits: &[risk::HazardHit], kind: IssueKind| {
        for h in hits {
            issues.push(Issue {
                ingredient: h.ingredient.clone(),
                kind,
                severity: h.risk_level,
                description: h.effect.clone(),
                source: h.source.clone(),
            });
        }
    };
    push_hits(&risk.endocrine_disruptors[..], IssueKind::EndocrineDisruptor);
    push_hits(&risk.toxic_ingredients[..], IssueKind::Toxic);
    if let Some(d) = hazards {
        push_hits(&d.ecotoxicity.hits[..], IssueKind::Ecotoxicity);
        push_hits(&d.irritation.hits[..], IssueKind::Irritation);
    }

    for a in &allergens.detected {
        issues.push(Issue {
            ingredient: a.ingredient.clone(),
            kind: IssueKind::Allergen,
            severity: a.prevalence,
            description: "Regulated contact allergen".to_string(),
            source: a.source.clone(),
        });
    }

    if let Some(d) = hazards {
        for b in &d.biodegradability.ratings {
            let severity = match b.rating {
                Biodegradability::Readily => continue,
                Biodegradability::Inherent => Level::Low,
                Biodegradability::Persistent => Level::Medium,
            };
            issues.push(Issue {
                ingredient: b.ingredient.clone(),
                kind: IssueKind::Biodegradability,
                severity,
                description: match b.rating {
                    Biodegradability::Persistent => "Persists in the environment".to_string(),
                    _ => "Only inherently biodegradable".to_string(),
                },
                source: b.source.clone(),
            });
        }
    }

    // Stable: keeps analyzer order within a severity.
    issues.sort_by(|a, b| b.severity.cmp(&a.severity));
    issues
}

fn collect_sources(
    risk: &RiskAnalysis,
    benefit: &BenefitAnalysis,
    allergens: &AllergenAnalysis,
    formulation: &FormulationAnalysis,
    hazards: Option<&DetergentAnalysis>,
) -> Vec<String> {
    let mut set: BTreeSet<&str> = BTreeSet::new();
    set.extend(risk.endocrine_disruptors.iter().map(|h| h.source.as_str()));
    set.extend(risk.toxic_ingredients.iter().map(|h| h.source.as_str()));
    set.extend(benefit.actives.iter().map(|b| b.source.as_str()));
    set.extend(allergens.detected.iter().map(|a| a.source.as_str()));
    set.extend(formulation.certifications_detected.iter().map(|c| c.source.as_str()));
    if let Some(d) = hazards {
        set.extend(d.ecotoxicity.hits.iter().map(|h| h.source.as_str()));
        set.extend(d.irritation.hits.iter().map(|h| h.source.as_str()));
        set.extend(d.biodegradability.ratings.iter().map(|b| b.source.as_str()));
    }
    set.into_iter().map(str::to_string).collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "analyzer panicked".to_string()
    }
}

/// Short anonymized id of a token list (first 6 bytes of SHA-256, hex).
fn anon_hash(tokens: &IngredientList) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    for t in tokens.iter() {
        hasher.update(t.as_str().as_bytes());
        hasher.update(b",");
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
