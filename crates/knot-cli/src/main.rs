//! Knot CLI entry point.

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rhizome_knot_codec::{Schema, TypeExpr};
use rhizome_knot_sexp::{ParseOptions, Sexp, parse_with, to_text};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Log directives used when `RUST_LOG` is unset.
const DEFAULT_LOG: &str = "knot=info,rhizome_knot=info";

/// Nesting limit for JSON conversion; JSON (de)serialization recurses per level.
const JSON_MAX_DEPTH: usize = 128;

#[derive(Parser)]
#[command(name = "knot")]
#[command(about = "Format, check and convert S-expression text")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and print in canonical form
    Fmt {
        /// Input file (or - for stdin)
        #[arg(default_value = "-")]
        file: String,

        /// Reject anything after the first value
        #[arg(long)]
        strict: bool,

        /// Maximum list nesting depth
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Decode against a schema type and verify the round trip
    Check {
        /// Input file (or - for stdin)
        #[arg(default_value = "-")]
        file: String,

        /// Schema file (TOML)
        #[arg(short, long)]
        schema: PathBuf,

        /// Type expression to decode as, e.g. Tree or list<Point>
        #[arg(short = 't', long = "type")]
        ty: String,

        /// Reject anything after the first value
        #[arg(long)]
        strict: bool,

        /// Maximum list nesting depth
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Convert S-expression text to JSON
    Json {
        /// Input file (or - for stdin)
        #[arg(default_value = "-")]
        file: String,

        /// Convert JSON back to S-expression text instead
        #[arg(short, long)]
        reverse: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Report the message itself rather than the error's debug form.
    if let Err(err) = run(cli.command) {
        error!("{err}");
        return Err(err.to_string().into());
    }
    Ok(())
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Fmt {
            file,
            strict,
            max_depth,
        } => {
            let options = ParseOptions {
                max_depth,
                strict,
            };
            let sexp = read_sexp(&file, &options)?;
            println!("{}", to_text(&sexp));
        }

        Commands::Check {
            file,
            schema,
            ty,
            strict,
            max_depth,
        } => {
            let schema = Schema::from_file(&schema)?;
            let ty: TypeExpr = ty.parse()?;
            schema.check_references("command line", &ty)?;

            let options = ParseOptions { max_depth, strict };
            let sexp = read_sexp(&file, &options)?;
            let value = schema.decode(&ty, &sexp)?;
            let encoded = schema.encode(&ty, &value)?;
            // Compare encodings: a decoded NaN never equals itself.
            if schema.encode(&ty, &schema.decode(&ty, &encoded)?)? != encoded {
                return Err(format!("{file}: value does not survive a round trip as {ty}").into());
            }

            info!(%ty, "{} decodes", file);
            println!("{}", to_text(&encoded));
        }

        Commands::Json {
            file,
            reverse,
            pretty,
        } => {
            if reverse {
                let sexp: Sexp = serde_json::from_str(&read_input(&file)?)?;
                println!("{}", to_text(&sexp));
            } else {
                let options = ParseOptions::default().with_max_depth(JSON_MAX_DEPTH);
                let sexp = read_sexp(&file, &options)?;
                let json = if pretty {
                    serde_json::to_string_pretty(&sexp)?
                } else {
                    serde_json::to_string(&sexp)?
                };
                println!("{}", json);
            }
        }
    }

    Ok(())
}

fn read_input(file: &str) -> std::io::Result<String> {
    if file == "-" {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        std::fs::read_to_string(file)
    }
}

fn read_sexp(file: &str, options: &ParseOptions) -> Result<Sexp, Box<dyn std::error::Error>> {
    let source = read_input(file)?;
    debug!(file, bytes = source.len(), "parsing");
    parse_with(&source, options).map_err(|err| format!("{file}:{err}").into())
}
