//! duality - compile a Markdown library to HTML and LaTeX

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use markdown_duality::library::{self, write_atomic};
use markdown_duality::{compile_html, compile_latex, Error, LibraryConfig, Result};

const DEFAULT_CONFIG: &str = "duality.toml";

#[derive(Parser)]
#[command(name = "duality")]
#[command(version, about = "Compile a Markdown library to an HTML site and LaTeX", long_about = None)]
#[command(after_help = "EXAMPLES:
    duality html 'library/Books/01 - On Truth.md'    Print one page
    duality tex essay.md -o essay.tex                  Write one paper
    duality build --tex                                Build the whole library")]
struct Cli {
    /// Configuration file (defaults to ./duality.toml when present)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile one document to a full HTML page
    Html {
        input: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compile one document to LaTeX
    Tex {
        input: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compile every document in the source tree
    Build {
        /// Also write a .tex file next to every page
        #[arg(long)]
        tex: bool,
    },
    /// Compare the public tree with the source tree
    Verify,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "duality failed");
            ExitCode::from(exit_status(&e))
        }
    }
}

fn exit_status(error: &Error) -> u8 {
    u8::try_from(error.exit_code()).unwrap_or(1)
}

fn load_config(path: Option<&Path>) -> Result<LibraryConfig> {
    match path {
        Some(path) => LibraryConfig::load(path),
        None if Path::new(DEFAULT_CONFIG).is_file() => LibraryConfig::load(Path::new(DEFAULT_CONFIG)),
        None => Ok(LibraryConfig::default()),
    }
}

fn emit(output: Option<&Path>, contents: &str) -> Result<()> {
    match output {
        Some(path) => write_atomic(path, contents),
        None => {
            print!("{contents}");
            Ok(())
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Html { input, output } => {
            let markdown = std::fs::read_to_string(input)?;
            let page = compile_html(&markdown, Some(input.as_path()), &config).to_page(&config);
            emit(output.as_deref(), &page)?;
        }
        Commands::Tex { input, output } => {
            let markdown = std::fs::read_to_string(input)?;
            emit(output.as_deref(), &compile_latex(&markdown, &config)?)?;
        }
        Commands::Build { tex } => {
            let mut report = library::build_html(&config)?;
            if *tex {
                let latex = library::build_latex(&config)?;
                report.written.extend(latex.written);
                report.failed.extend(latex.failed);
            }
            for (source, reason) in &report.failed {
                eprintln!("failed: {}: {reason}", source.display());
            }
            println!("wrote {} files", report.written.len());
            if !report.failed.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Verify => {
            let report = library::verify(&config)?;
            for source in &report.missing_html {
                println!("missing page: {}", source.display());
            }
            for page in &report.orphan_html {
                println!("orphan page: {}", page.display());
            }
            if !report.is_clean() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
