use anyhow::{anyhow, Result};

use crate::language::supported_languages;
use crate::plugins;
use crate::queries::list_queries;
use crate::LangsArgs;

/// The main entry point for the `langs` command.
pub fn run_langs(args: LangsArgs) -> Result<()> {
    match args.language {
        Some(language) => describe_language(&language),
        None => {
            list_languages();
            Ok(())
        }
    }
}

fn list_languages() {
    println!("Supported languages:");
    for tag in supported_languages() {
        let extensions = plugins::get_plugin(tag)
            .map(|p| p.supported_extensions().join(", "))
            .unwrap_or_default();
        println!("  {tag:<12} ({extensions})");
    }
}

fn describe_language(language: &str) -> Result<()> {
    let queries = list_queries(language)
        .map_err(|_| anyhow!("unknown language: {language}"))?;
    println!("Queries for {language}:");
    for (key, description) in queries {
        println!("  {key:<14} {description}");
    }
    Ok(())
}
