// tests/config_loading.rs
//
// Policy loading order: $SCORING_CONFIG_PATH > config/scoring.toml > defaults.
// These tests mutate process env, so they run serially.

use std::fs;
use std::path::PathBuf;

use serial_test::serial;

use ecolojia_scoring::analyze::Dimension;
use ecolojia_scoring::config::{ScoringPolicy, ENV_SCORING_CONFIG_PATH};
use ecolojia_scoring::{IngredientsInput, ScoringEngine};

fn temp_toml(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("ecolojia_{}_{}.toml", name, std::process::id()));
    fs::write(&path, content).expect("write temp config");
    path
}

#[test]
#[serial]
fn shipped_config_matches_builtin_defaults() {
    std::env::remove_var(ENV_SCORING_CONFIG_PATH);
    let loaded = ScoringPolicy::load_default().expect("load config/scoring.toml");
    let builtin = ScoringPolicy::default();

    assert_eq!(loaded.risk.endocrine_penalties, builtin.risk.endocrine_penalties);
    assert_eq!(loaded.detergent.persistent_penalty, builtin.detergent.persistent_penalty);
    assert_eq!(loaded.confidence.count_tiers, builtin.confidence.count_tiers);
    assert_eq!(loaded.profiles.cosmetic.weights, builtin.profiles.cosmetic.weights);
    assert_eq!(loaded.profiles.detergent.weights, builtin.profiles.detergent.weights);
    assert_eq!(loaded.profiles.cosmetic.keywords, builtin.profiles.cosmetic.keywords);

    let input = IngredientsInput::from("AQUA, BUTYLPARABEN, TRICLOSAN, BHA, BENZOPHENONE-3");
    let a = ScoringEngine::new(loaded).analyze_cosmetic(&input, Some("Crème")).unwrap();
    let b = ScoringEngine::new(builtin).analyze_cosmetic(&input, Some("Crème")).unwrap();
    assert_eq!(a.score, b.score);
    assert_eq!(a.confidence, b.confidence);
}

#[test]
#[serial]
fn env_path_overrides_default_file() {
    let path = temp_toml(
        "override",
        r#"
        [risk]
        toxic_penalty = 40

        [profiles.cosmetic.weights]
        safety = 1.0
        "#,
    );
    std::env::set_var(ENV_SCORING_CONFIG_PATH, &path);
    let policy = ScoringPolicy::load_default();
    std::env::remove_var(ENV_SCORING_CONFIG_PATH);
    let _ = fs::remove_file(&path);

    let policy = policy.expect("load override");
    assert_eq!(policy.risk.toxic_penalty, 40);
    assert_eq!(policy.profiles.cosmetic.weights.len(), 1);
    assert!((policy.profiles.cosmetic.recognition_weight - 0.2).abs() < 1e-6);

    // TRICLOSAN: 15 endocrine + 40 toxic; safety is the only dimension left
    let r = ScoringEngine::new(policy)
        .analyze_cosmetic(&IngredientsInput::from("AQUA, TRICLOSAN"), None)
        .unwrap();
    assert_eq!(r.breakdown.len(), 1);
    assert_eq!(r.breakdown[&Dimension::Safety].score, 45);
    assert_eq!(r.score, 45);
}

#[test]
fn partial_profile_keeps_confidence_signals() {
    let policy = ScoringPolicy::from_toml_str(
        r#"
        [profiles.cosmetic]
        keywords = ["CREME"]
        "#,
    )
    .expect("parse partial profile");
    let input = IngredientsInput::from("AQUA, GLYCERIN, HYALURONIC ACID, TOCOPHEROL, ALOE EXTRACT");

    let tuned = ScoringEngine::new(policy).analyze_cosmetic(&input, None).unwrap();
    let builtin = ScoringEngine::default().analyze_cosmetic(&input, None).unwrap();
    assert_eq!(tuned.confidence, builtin.confidence);
    assert!(tuned.confidence > 0.5, "confidence {}", tuned.confidence);
    assert!(tuned.is_publishable);
}

#[test]
#[serial]
fn missing_env_path_is_an_error() {
    std::env::set_var(ENV_SCORING_CONFIG_PATH, "/definitely/not/here/scoring.toml");
    let res = ScoringPolicy::load_default();
    std::env::remove_var(ENV_SCORING_CONFIG_PATH);
    assert!(res.is_err());
}

#[test]
#[serial]
fn malformed_file_is_an_error() {
    let path = temp_toml("broken", "[risk\ntoxic_penalty = ");
    let res = ScoringPolicy::load_from(&path);
    let _ = fs::remove_file(&path);
    let err = res.unwrap_err();
    assert!(format!("{:#}", err).contains("scoring policy"));
}
