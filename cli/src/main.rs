use std::path::PathBuf;
use std::process::exit;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dotenvy::dotenv;

use dpd_backend::citations::{find_source_sutta_examples, ExtractorOptions, BOOK_RULES};
use dpd_backend::config::CitationConfig;
use dpd_backend::cst_texts::list_book_files;
use dpd_backend::document_cache::DocumentCache;
use dpd_backend::logger;
use dpd_backend::types::{Citation, OutputFormat};

#[derive(Parser, Debug)]
#[command(author, version, about = "DPD source citation extractor", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the CST romn XML directory.
    /// If not provided, the DPD_CST_XML_DIR environment variable will be used.
    #[arg(long, global = true, value_name = "DIRECTORY_PATH", env = "DPD_CST_XML_DIR")]
    cst_dir: Option<PathBuf>,

    /// Log level for this run: silent, error, warn, info or debug
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find source, sutta and example for each occurrence of a pattern in a book
    #[command(arg_required_else_help = true)]
    Find {
        /// Book key, e.g. dn1, mn2, kn14
        #[arg(value_name = "BOOK")]
        book: String,

        /// Regular expression, matched against the normalized lowercase text
        #[arg(value_name = "PATTERN")]
        pattern: String,

        /// Output format: text, tsv or json
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// List the book keys and whether their XML file is present
    Books,
}

fn print_citations(citations: &[Citation], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for (n, c) in citations.iter().enumerate() {
                println!("{} {} {}", format!("{}.", n + 1).dimmed(), c.source.bold(), c.sutta.green());
                println!("{}\n", c.example);
            }
            println!("{}", citations.len());
        }
        OutputFormat::Tsv => {
            for c in citations {
                // Stanza examples keep their line breaks as <br> in a single cell.
                println!("{}\t{}\t{}", c.source, c.sutta, c.example.replace('\n', "<br>"));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(citations)
                .context("Failed to serialize citations")?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn find(config: &CitationConfig, book: &str, pattern: &str, format: OutputFormat) -> Result<()> {
    if !config.cst_xml_dir.is_dir() {
        bail!(
            "CST XML directory does not exist or is not a directory: {:?}\nUse the --cst-dir option or set the DPD_CST_XML_DIR environment variable.",
            config.cst_xml_dir
        );
    }

    let cache = DocumentCache::from_config(config);
    let options = ExtractorOptions::from(config);

    let citations = find_source_sutta_examples(&cache, book, pattern, &options)
        .with_context(|| format!("Searching '{}' in {}", pattern, book))?;

    print_citations(&citations, format)
}

fn books(config: &CitationConfig) -> Result<()> {
    for book_file in list_book_files(&config.cst_xml_dir) {
        let text = book_file.text;
        let label = BOOK_RULES
            .iter()
            .find(|r| r.book == text.book)
            .map(|r| r.label)
            .unwrap_or("-");
        let status = if book_file.present { "ok".green() } else { "missing".red() };
        println!("{:<5} {:<6} {:<17} {}", text.book, label, text.xml_filename, status);
    }
    Ok(())
}

fn main() {
    if dotenv().is_err() {
        eprintln!("Info: No .env file found or failed to load.");
    }

    let cli = Cli::parse();

    if let Some(level) = &cli.log_level
        && !logger::set_log_level_str(level) {
            eprintln!("Error: Unknown log level: {}", level);
            exit(1);
        }

    // Precedence:
    // - given with --cst-dir or DPD_CST_XML_DIR
    // - the default in CitationConfig
    let mut config = CitationConfig::from_env();
    if let Some(dir) = cli.cst_dir {
        config = config.with_cst_xml_dir(dir);
    }

    let command_result = match cli.command {
        Commands::Find { book, pattern, format } => find(&config, &book, &pattern, format),
        Commands::Books => books(&config),
    };

    if let Err(e) = command_result {
        eprintln!("Error executing command: {:#}", e);
        exit(1);
    }
}
