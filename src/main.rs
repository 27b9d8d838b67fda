//! tinyargs - parse GNU-style arguments against a JSON option schema.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tinyargs::{generate_output_string, AppConfig, CommandLineParser, Locale, TypeRegistry};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// GNU-style argument parsing driven by a JSON schema.
#[derive(Parser, Debug)]
#[command(name = "tinyargs", version, about, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse arguments and print the collected values as JSON
    Parse {
        /// JSON option schema
        #[arg(long)]
        config: String,

        /// Locale for numbers and dates (overrides the schema)
        #[arg(long)]
        locale: Option<Locale>,

        /// Arguments to parse
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print the usage text of a schema
    Usage {
        /// JSON option schema
        #[arg(long)]
        config: String,
    },
}

/// Load the schema and build its parser. The locale argument wins over the schema's.
fn load(config: &str, locale: Option<Locale>) -> Result<(AppConfig, Locale, CommandLineParser)> {
    let cfg = AppConfig::from_json(config).context("failed to parse config JSON")?;
    let locale = locale
        .or_else(|| cfg.locale.clone())
        .unwrap_or_default();
    let executable = std::env::current_exe().ok();
    let parser = cfg
        .build_parser(&locale, &TypeRegistry::new(), executable.as_deref())
        .context("invalid config")?;
    Ok((cfg, locale, parser))
}

/// Parse `args` and render the results. With usage-on-error, a failed parse
/// writes the error and usage first; a failure to write them is only logged.
fn parse_to_json(
    cfg: &AppConfig,
    locale: &Locale,
    parser: &mut CommandLineParser,
    args: &[String],
) -> Result<String> {
    if let Err(err) = parser.parse(args, locale) {
        if cfg.usage_on_error {
            if let Err(io_err) = parser.print_error_usage(&err) {
                warn!(error = %io_err, "failed to write usage");
            }
        }
        return Err(err).context("failed to parse arguments");
    }

    generate_output_string(parser).context("failed to generate output")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            config,
            locale,
            args,
        } => {
            let (cfg, locale, mut parser) = load(&config, locale)?;
            let output = parse_to_json(&cfg, &locale, &mut parser, &args)?;
            println!("{}", output);
        }
        Commands::Usage { config } => {
            let (_, _, parser) = load(&config, None)?;
            print!("{}", parser.render_usage());
        }
    }

    Ok(())
}
