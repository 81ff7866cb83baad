//! Wrangle CLI - apply directive recipes to CSV files
//!
//! # Main Commands
//!
//! ```bash
//! wrangle run input.csv --recipe clean.recipe    # Transform CSV rows to JSON
//! wrangle check clean.recipe                     # Parse a recipe without running it
//! wrangle directives                             # List available directives
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! wrangle parse input.csv                        # Just parse CSV to JSON
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wrangle::{
    default_registry, parse_file_auto, parse_recipe, transform_file, DirectiveRegistry,
    EngineConfig, TransformOptions,
};

#[derive(Parser)]
#[command(name = "wrangle")]
#[command(about = "Apply directive recipes to CSV rows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recipe over a CSV file and output the resulting rows as JSON
    Run {
        /// Input CSV file
        input: PathBuf,

        /// Recipe file, one directive per line
        #[arg(short, long)]
        recipe: PathBuf,

        /// Output file for rows (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file for error records (default: summary on stderr)
        #[arg(short, long)]
        errors: Option<PathBuf>,

        /// Engine configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Parse a recipe and print the bound directives
    Check {
        /// Recipe file
        recipe: PathBuf,

        /// Engine configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List available directives
    Directives,

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            recipe,
            output,
            errors,
            config,
        } => cmd_run(
            &input,
            &recipe,
            output.as_deref(),
            errors.as_deref(),
            config.as_deref(),
        ),

        Commands::Check { recipe, config } => cmd_check(&recipe, config.as_deref()),

        Commands::Directives => cmd_directives(),

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(EngineConfig::from_file(p)?),
        None => Ok(EngineConfig::default()),
    }
}

fn cmd_run(
    input: &Path,
    recipe_path: &Path,
    output: Option<&Path>,
    errors_output: Option<&Path>,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let options = TransformOptions {
        config: load_config(config)?,
        run_name: Some(input.display().to_string()),
    };
    let recipe = fs::read_to_string(recipe_path)?;
    let result = transform_file(input, &recipe, &options)?;

    eprintln!("   Encoding: {}", result.csv_info.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(result.csv_info.delimiter));
    eprintln!("   Rows in: {}", result.csv_info.row_count);
    eprintln!("   Rows out: {}", result.rows.len());

    if result.errors.is_empty() {
        eprintln!("✅ No rows sent to error");
    } else {
        eprintln!("⚠️  {} rows sent to error", result.errors.len());
        if errors_output.is_none() {
            for record in result.errors.iter().take(5) {
                eprintln!(
                    "   line {} ({}): {}",
                    record.line, record.directive, record.message
                );
            }
        }
    }

    if !result.variables.is_empty() {
        eprintln!("   Variables:");
        for (name, value) in result.variables.iter() {
            eprintln!("     {} = {}", name, value);
        }
    }

    if let Some(path) = errors_output {
        fs::write(path, serde_json::to_string_pretty(&result.errors)?)?;
        eprintln!("💾 Error records written to: {}", path.display());
    }

    let json = serde_json::to_string_pretty(&result.rows)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_check(recipe_path: &Path, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let recipe = fs::read_to_string(recipe_path)?;
    let registry = default_registry();
    let pipeline = parse_recipe(&recipe, &registry, &config)?;

    for bound in pipeline.directives() {
        println!("{:>4}  {}", bound.line, bound.text);
    }
    eprintln!("✅ {} directives OK", pipeline.len());
    Ok(())
}

fn cmd_directives() -> Result<(), Box<dyn std::error::Error>> {
    let registry = default_registry();
    for info in registry.list() {
        println!("{}", info.usage());
        println!("    {}", info.description());
    }
    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_file_auto(input)?;
    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}' (auto-detected)", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} records", result.rows.len());

    let json = serde_json::to_string_pretty(&result.rows)?;
    write_output(&json, output)?;

    Ok(())
}

/// Printable form of a detected delimiter.
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_delimiter_escapes_tab() {
        assert_eq!(format_delimiter('\t'), "\\t");
        assert_eq!(format_delimiter(';'), ";");
    }
}
