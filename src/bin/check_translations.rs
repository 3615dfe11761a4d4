//! Translation checker - compares every locale against the default locale
//! and reports how much the optimizer would shrink each file
//!
//! Usage:
//!   cargo run --bin check-translations                 # Check ./locales (or LOCALES_DIR)
//!   cargo run --bin check-translations -- path/to/dir  # Check another directory
//!   cargo run --bin check-translations -- --quiet      # Only print problems
//!
//! Exits with status 1 when any locale is missing keys or has extra ones.

use anyhow::{Context, Result};
use portfolio_server::config::Environment;
use portfolio_server::i18n::{
    optimize, validate_namespace, DirectorySource, LocaleRegistry, OptimizeOptions,
    TranslationSource,
};
use portfolio_server::logging;
use std::process::ExitCode;
use tracing::info;

struct Args {
    locales_dir: String,
    quiet: bool,
}

impl Args {
    fn parse() -> Self {
        let mut quiet = false;
        let mut locales_dir = None;
        for arg in std::env::args().skip(1) {
            match arg.as_str() {
                "--quiet" | "-q" => quiet = true,
                _ => locales_dir = Some(arg),
            }
        }

        Self {
            locales_dir: locales_dir
                .or_else(|| std::env::var("LOCALES_DIR").ok())
                .unwrap_or_else(|| "locales".to_string()),
            quiet,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let _ = dotenvy::dotenv();

    logging::init(Environment::Production)?;

    let args = Args::parse();
    let registry = LocaleRegistry::get();
    let reference = registry.default_locale().code;
    let source = DirectorySource::new(&args.locales_dir);

    info!("Checking translations in {}", args.locales_dir);
    let namespaces = source
        .namespaces(reference)
        .await
        .with_context(|| format!("No {} translations under {}", reference, args.locales_dir))?;

    let mut all_valid = true;
    for namespace in &namespaces {
        println!("\n=== {} ===", namespace);

        let results = validate_namespace(&source, registry, namespace)
            .await
            .with_context(|| format!("Failed to load reference file {}/{}", reference, namespace))?;

        for (locale, result) in &results {
            if result.is_valid {
                if !args.quiet {
                    println!("  {}: complete", locale);
                }
                continue;
            }

            all_valid = false;
            println!(
                "  {}: {} missing, {} extra",
                locale,
                result.missing_keys.len(),
                result.extra_keys.len()
            );
            for key in &result.missing_keys {
                println!("    - missing: {}", key);
            }
            for key in &result.extra_keys {
                println!("    + extra:   {}", key);
            }
        }

        if args.quiet {
            continue;
        }
        for locale in registry.list_enabled() {
            let Ok(dictionary) = source.load(locale.code, namespace).await else {
                continue;
            };
            let stats = optimize(&dictionary, &OptimizeOptions::default()).stats;
            println!(
                "  {} optimized: {} -> {} bytes ({:.1}% saved, {} duplicates, {} empty)",
                locale.code,
                stats.original_size,
                stats.optimized_size,
                stats.percent_saved,
                stats.duplicates_removed,
                stats.empty_removed
            );
        }
    }

    println!();
    if all_valid {
        println!("All translations complete ({} namespaces)", namespaces.len());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Translations are incomplete");
        Ok(ExitCode::FAILURE)
    }
}
