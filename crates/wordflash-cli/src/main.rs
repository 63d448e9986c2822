//! WordFlash CLI
//!
//! Command-line interface for WordFlash - vocabulary and quiz flashcards.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use wordflash_core::{Config, DocId, Gender, SearchField, WordRepository};

mod commands;
mod output;
mod prompt;

use commands::deck::DeckOptions;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "wordflash")]
#[command(about = "WordFlash - Vocabulary and quiz flashcards without duplicates")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the word store (defaults to {data_dir}/wordflash.db)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a vocabulary file into the store
    Load {
        /// YAML vocabulary file
        file: PathBuf,
    },
    /// Load a quiz file into the store
    Quiz {
        /// YAML quiz file
        file: PathBuf,
    },
    /// Analyze the stored vocabulary, optionally loading a file first
    Analyze {
        /// YAML vocabulary file to load before analyzing
        file: Option<PathBuf>,
    },
    /// Search words by substring
    Search {
        /// Text to look for
        query: String,
        /// Which side of the pair to search (source, target, both)
        #[arg(short = 't', long = "type", default_value = "both")]
        field: SearchField,
    },
    /// List words in a category
    Category {
        /// Category name
        name: String,
    },
    /// List words with a grammatical gender
    Gender {
        /// masculine, feminine or neuter
        gender: Gender,
    },
    /// Show store statistics
    Stats,
    /// List pairs stored more than once
    #[command(alias = "dups")]
    Duplicates,
    /// Export all words as YAML
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Relate two words
    Relate {
        /// Word ID
        word_id: DocId,
        /// Related word ID
        related_id: DocId,
        /// Relation type
        #[arg(short = 't', long = "type", default_value = "related")]
        relation_type: String,
    },
    /// Show words related to a word
    Relations {
        /// Word ID
        word_id: DocId,
    },
    /// Manage the category registry
    Categories {
        #[command(subcommand)]
        command: Option<CategoryCommands>,
    },
    /// Build a deck manifest from a vocabulary or quiz file
    Deck {
        /// YAML vocabulary or quiz file
        file: PathBuf,
        /// Treat the file as a quiz
        #[arg(long)]
        quiz: bool,
        /// Deck name (defaults to deck_name from config)
        #[arg(short, long)]
        name: Option<String>,
        /// Output directory (defaults to output_dir from config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Show store location and table sizes
    Info,
    /// Remove everything from the store
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List registered categories
    #[command(alias = "ls")]
    List,
    /// Register a category
    Add {
        /// Category name
        name: String,
        /// Category description
        #[arg(short, long, default_value = "")]
        description: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, source_lang, target_lang, deck_name,
        /// output_dir, media_timeout_secs, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), &output);
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    init_logging(&config, cli.verbose);

    let db_path = cli.db.clone().unwrap_or_else(|| config.database_path());
    debug!("opening word store at {:?}", db_path);
    let mut repo = match WordRepository::open(&db_path) {
        Ok(repo) => repo,
        Err(e) => {
            if e.is_recoverable() {
                if let Some(hint) = e.recovery_suggestion() {
                    eprintln!("Hint: {}", hint);
                }
            }
            return Err(e).context(format!("Failed to open {}", db_path.display()));
        }
    };

    let result = run_command(cli.command, &mut repo, &config, &output);
    repo.close()?;
    result
}

fn run_command(
    command: Commands,
    repo: &mut WordRepository,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        Commands::Load { file } => commands::words::load(repo, &file, output),
        Commands::Quiz { file } => commands::quiz::load(repo, &file, output),
        Commands::Analyze { file } => commands::analyze::run(repo, file.as_deref(), output),
        Commands::Search { query, field } => commands::words::search(repo, query, field, output),
        Commands::Category { name } => commands::words::category(repo, name, output),
        Commands::Gender { gender } => commands::words::gender(repo, gender, output),
        Commands::Stats => commands::words::stats(repo, output),
        Commands::Duplicates => commands::words::duplicates(repo, output),
        Commands::Export { output: file } => commands::words::export(repo, file, output),
        Commands::Relate {
            word_id,
            related_id,
            relation_type,
        } => commands::words::relate(repo, word_id, related_id, relation_type, output),
        Commands::Relations { word_id } => commands::words::relations(repo, word_id, output),
        Commands::Categories { command } => match command {
            Some(CategoryCommands::List) | None => commands::words::list_categories(repo, output),
            Some(CategoryCommands::Add { name, description }) => {
                commands::words::add_category(repo, name, description, output)
            }
        },
        Commands::Deck {
            file,
            quiz,
            name,
            output_dir,
        } => commands::deck::build(
            repo,
            config,
            &file,
            DeckOptions {
                quiz,
                name,
                output_dir,
            },
            output,
        ),
        Commands::Info => commands::words::info(repo, output),
        Commands::Clear { yes } => commands::words::clear(repo, yes, output),
        Commands::Config { .. } => unreachable!(), // Handled in main
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Set up tracing to stderr, or to `log_file` when configured
fn init_logging(config: &Config, verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "wordflash_core={},wordflash_cli={}",
            log_level, log_level
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    // Ignore error if already initialized
    match &config.log_file {
        Some(path) => match File::create(path) {
            Ok(file) => {
                let _ = builder.with_ansi(false).with_writer(file).try_init();
            }
            Err(e) => {
                eprintln!("Warning: Could not create log file {:?}: {}", path, e);
                let _ = builder.with_writer(std::io::stderr).try_init();
            }
        },
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}
