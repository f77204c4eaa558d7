//! Demo that scores one product from the command line and prints the JSON result.
//!
//! Usage: score_demo <cosmetic|detergent> "<ingredients>" ["product name"] [certification ...]

use anyhow::{bail, Context};
use ecolojia_scoring::{IngredientsInput, ProductCategory, ScoringEngine, ScoringPolicy};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let mut args = std::env::args().skip(1);
    let (Some(category), Some(ingredients)) = (args.next(), args.next()) else {
        bail!("usage: score_demo <cosmetic|detergent> \"<ingredients>\" [\"product name\"] [certification ...]");
    };
    let name = args.next();
    let certifications: Vec<String> = args.collect();

    let engine = ScoringEngine::new(ScoringPolicy::load_default()?);
    let input = IngredientsInput::from(ingredients);

    let result = match ProductCategory::from_label(&category) {
        Some(ProductCategory::Cosmetic) => engine.analyze_cosmetic(&input, name.as_deref()),
        Some(ProductCategory::Detergent) => {
            engine.analyze_detergent(&input, name.as_deref(), &certifications)
        }
        _ => bail!("unsupported category `{}`", category),
    }?;

    let json = serde_json::to_string_pretty(&result).context("serializing result")?;
    println!("{}", json);
    Ok(())
}
