// src/config/mod.rs
//! Scoring policy: every penalty, threshold, weight and confidence increment the
//! analyzers use, in one value.
//!
//! Loading order:
//! 1) `$SCORING_CONFIG_PATH` (must exist when set)
//! 2) `config/scoring.toml`
//! 3) built-in defaults
//!
//! Every section is `#[serde(default)]`, so a TOML file only needs the keys it changes.
//! A `[profiles.*]` table overlays that category's built-in profile key by key; an empty
//! weight table falls back to the built-in one.
//! The loaded policy is sanitized once and then shared read-only.

pub mod profiles;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub use profiles::{CategoryProfile, Profiles};

use crate::category::ProductCategory;
use crate::reference::Level;

pub const DEFAULT_SCORING_CONFIG_PATH: &str = "config/scoring.toml";
pub const ENV_SCORING_CONFIG_PATH: &str = "SCORING_CONFIG_PATH";

/// Points per tier; used for hazard penalties, allergen penalties and benefit bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelPoints {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
}

impl LevelPoints {
    pub const fn new(low: u32, medium: u32, high: u32) -> Self {
        Self { low, medium, high }
    }

    pub fn for_level(&self, level: Level) -> u32 {
        match level {
            Level::Low => self.low,
            Level::Medium => self.medium,
            Level::High => self.high,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPolicy {
    /// Endocrine-disruptor penalties by risk level.
    pub endocrine_penalties: LevelPoints,
    /// Flat penalty per toxic/sensitizing hit.
    pub toxic_penalty: u32,
    /// Penalty ratio (points / (ingredients x high penalty)) above which risk is high.
    pub high_ratio: f32,
    pub medium_ratio: f32,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            endocrine_penalties: LevelPoints::new(3, 8, 15),
            toxic_penalty: 5,
            high_ratio: 0.20,
            medium_ratio: 0.10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenefitPolicy {
    pub baseline: u32,
    pub bonuses: LevelPoints,
}

impl Default for BenefitPolicy {
    fn default() -> Self {
        Self {
            baseline: 0,
            bonuses: LevelPoints::new(6, 12, 20),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllergenPolicy {
    pub penalties: LevelPoints,
    /// Distinct allergens from which the tier is high / medium.
    pub high_count: usize,
    pub medium_count: usize,
}

impl Default for AllergenPolicy {
    fn default() -> Self {
        Self {
            penalties: LevelPoints::new(5, 10, 15),
            high_count: 3,
            medium_count: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulationPolicy {
    /// More than this many ingredients: heavy penalty.
    pub long_list: usize,
    pub long_penalty: u32,
    /// More than this many (up to `long_list`): lighter penalty.
    pub medium_list: usize,
    pub medium_penalty: u32,
    /// At most this many: simplicity bonus.
    pub simple_list: usize,
    pub simple_bonus: u32,
    /// Share of complexity vs natural ratio in the detergent environmental score.
    pub complexity_weight: f32,
    /// Natural ratio assumed when no ingredient could be classified.
    pub neutral_natural_ratio: f32,
    /// Stacked certification bonuses never exceed this.
    pub certification_cap: u32,
    /// Sustainability label thresholds: excellent / good / moderate.
    pub excellent_threshold: u8,
    pub good_threshold: u8,
    pub moderate_threshold: u8,
}

impl Default for FormulationPolicy {
    fn default() -> Self {
        Self {
            long_list: 25,
            long_penalty: 20,
            medium_list: 15,
            medium_penalty: 10,
            simple_list: 10,
            simple_bonus: 5,
            complexity_weight: 0.5,
            neutral_natural_ratio: 0.5,
            certification_cap: 30,
            excellent_threshold: 80,
            good_threshold: 60,
            moderate_threshold: 40,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetergentPolicy {
    pub ecotoxicity_penalties: LevelPoints,
    pub irritation_penalties: LevelPoints,
    pub inherent_penalty: u32,
    pub persistent_penalty: u32,
}

impl Default for DetergentPolicy {
    fn default() -> Self {
        Self {
            ecotoxicity_penalties: LevelPoints::new(5, 12, 25),
            irritation_penalties: LevelPoints::new(5, 10, 20),
            inherent_penalty: 8,
            persistent_penalty: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountTier {
    pub min: usize,
    pub increment: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidencePolicy {
    pub base: f32,
    pub composition_increment: f32,
    /// Highest matching tier wins.
    pub count_tiers: Vec<CountTier>,
    /// Names longer than this count as informative.
    pub name_min_len: usize,
    pub name_increment: f32,
    /// Scores below this confidence must not be published.
    pub publishable_threshold: f32,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            base: 0.20,
            composition_increment: 0.10,
            count_tiers: vec![
                CountTier { min: 5, increment: 0.10 },
                CountTier { min: 3, increment: 0.07 },
                CountTier { min: 1, increment: 0.04 },
            ],
            name_min_len: 3,
            name_increment: 0.05,
            publishable_threshold: 0.40,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub risk: RiskPolicy,
    pub benefit: BenefitPolicy,
    pub allergen: AllergenPolicy,
    pub formulation: FormulationPolicy,
    pub detergent: DetergentPolicy,
    pub confidence: ConfidencePolicy,
    pub profiles: Profiles,
}

impl ScoringPolicy {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let policy: ScoringPolicy = toml::from_str(s).context("parsing scoring policy TOML")?;
        Ok(policy.sanitized())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading scoring policy from {}", path.display()))?;
        let policy = Self::from_toml_str(&content)?;
        info!(target: "scoring", path = %path.display(), "scoring policy loaded");
        Ok(policy)
    }

    /// Env path, then the default path, then built-in defaults.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_SCORING_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!(
                    "{} points to non-existent path {}",
                    ENV_SCORING_CONFIG_PATH,
                    pb.display()
                ));
            }
            return Self::load_from(&pb);
        }
        let default_path = PathBuf::from(DEFAULT_SCORING_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from(&default_path);
        }
        info!(target: "scoring", "no scoring policy file, using built-in defaults");
        Ok(Self::default())
    }

    pub fn profile(&self, category: ProductCategory) -> &CategoryProfile {
        self.profiles.get(category)
    }

    /// Clamp everything into legal ranges.
    fn sanitized(mut self) -> Self {
        let r = &mut self.risk;
        r.high_ratio = r.high_ratio.clamp(0.0, 1.0);
        r.medium_ratio = r.medium_ratio.clamp(0.0, 1.0);
        if r.medium_ratio > r.high_ratio {
            std::mem::swap(&mut r.medium_ratio, &mut r.high_ratio);
        }

        let a = &mut self.allergen;
        if a.medium_count > a.high_count {
            std::mem::swap(&mut a.medium_count, &mut a.high_count);
        }

        let f = &mut self.formulation;
        if f.medium_list > f.long_list {
            std::mem::swap(&mut f.medium_list, &mut f.long_list);
        }
        f.complexity_weight = f.complexity_weight.clamp(0.0, 1.0);
        f.neutral_natural_ratio = f.neutral_natural_ratio.clamp(0.0, 1.0);
        f.certification_cap = f.certification_cap.min(100);

        let c = &mut self.confidence;
        c.base = c.base.clamp(0.0, 1.0);
        c.publishable_threshold = c.publishable_threshold.clamp(0.0, 1.0);
        c.count_tiers.sort_by(|x, y| y.min.cmp(&x.min));

        for (profile, builtin) in [
            (&mut self.profiles.cosmetic, CategoryProfile::cosmetic()),
            (&mut self.profiles.detergent, CategoryProfile::detergent()),
        ] {
            profile.weights.retain(|_, w| w.is_finite() && *w >= 0.0);
            if profile.weights.is_empty() {
                profile.weights = builtin.weights;
            }
        }
        self
    }
}
