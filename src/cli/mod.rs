//! Command-line interface for libseed.
//!
//! Provides commands for generating a synthetic library, purging a library,
//! inspecting what a library left behind, and registering users.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{LibraryApi, SqliteStore};
use crate::config::{self, GenerateConfig};
use crate::core::{delete_library, rng_for, Generator};

/// libseed - Generate and purge large synthetic content libraries
#[derive(Parser, Debug)]
#[command(name = "libseed")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite database (defaults to the configured one)
    #[arg(long, global = true, env = "LIBSEED_DB")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a synthetic library
    Generate {
        /// Plan file (YAML); defaults to the `generate` section of the config
        #[arg(short, long)]
        plan: Option<PathBuf>,

        /// Seed for the random source
        #[arg(long)]
        seed: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete every record of a library
    Purge {
        /// Library key (e.g. lib:SampleLibraryOrg:sample_large_library_1)
        library_key: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show row counts for a library
    Stats {
        /// Library key
        library_key: String,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Register a user authoring calls can act as
    Add {
        /// Email address
        email: String,

        /// Username (defaults to the part of the email before '@')
        #[arg(short, long)]
        username: Option<String>,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let database = self.database;
        match self.command {
            Commands::Generate { plan, seed, json } => generate(database, plan, seed, json).await,
            Commands::Purge { library_key, json } => purge(database, &library_key, json).await,
            Commands::Stats { library_key } => show_stats(database, &library_key).await,
            Commands::User { command } => match command {
                UserCommands::Add { email, username } => add_user(database, &email, username).await,
            },
            Commands::Config => show_config(database).await,
        }
    }
}

/// Open the store at the given or configured path
fn open_store(database: Option<PathBuf>) -> Result<SqliteStore> {
    let path = match database {
        Some(path) => path,
        None => config::config()?.database.clone(),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    SqliteStore::open(&path)
        .with_context(|| format!("Failed to open database: {}", path.display()))
}

/// Generate a library from the configured or given plan
async fn generate(
    database: Option<PathBuf>,
    plan: Option<PathBuf>,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let mut plan = match plan {
        Some(path) => GenerateConfig::from_file(&path)?,
        None => config::config()?.generate.clone(),
    };
    if seed.is_some() {
        plan.seed = seed;
    }
    plan.validate().context("Invalid generation plan")?;

    let store = open_store(database)?;
    let mut rng = rng_for(plan.seed);
    let generator = Generator::new(&store as &dyn LibraryApi, plan);
    let report = generator.run(&mut rng).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Library:       {}", report.library_key);
        println!(
            "Organization:  {} ({})",
            report.organization,
            if report.organization_created { "created" } else { "existing" }
        );
        println!("{:<14} {:>8} {:>8}", "TIER", "CREATED", "LINKS");
        println!("{}", "-".repeat(32));
        println!("{:<14} {:>8} {:>8}", "sections", report.sections, "-");
        println!(
            "{:<14} {:>8} {:>8}",
            "subsections", report.subsections, report.subsection_links
        );
        println!("{:<14} {:>8} {:>8}", "units", report.units, report.unit_links);
        println!(
            "{:<14} {:>8} {:>8}",
            "components", report.components, report.component_links
        );
    }

    Ok(())
}

/// Delete a library and everything depending on it
async fn purge(database: Option<PathBuf>, library_key: &str, json: bool) -> Result<()> {
    let store = open_store(database)?;
    let report = delete_library(&store, library_key).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{:<24} {:>8}", "RECORD SET", "DELETED");
        println!("{}", "-".repeat(33));
        for (set, rows) in &report.deleted {
            println!("{:<24} {:>8}", set.to_string(), rows);
        }
        println!("\nTotal: {} rows", report.total());
    }

    Ok(())
}

/// Print row counts for a library
async fn show_stats(database: Option<PathBuf>, library_key: &str) -> Result<()> {
    let store = open_store(database)?;
    let stats = store.library_stats(library_key)?;
    let orphaned = store.orphaned_entity_lists()?;

    if stats.is_empty() {
        println!("No records found for {}", library_key);
    }

    let rows = [
        ("learning_packages", stats.learning_packages),
        ("content_libraries", stats.content_libraries),
        ("entities", stats.entities),
        ("containers", stats.containers),
        ("components", stats.components),
        ("container_versions", stats.container_versions),
        ("entity_list_rows", stats.entity_list_rows),
        ("change_logs", stats.change_logs),
        ("change_log_records", stats.change_log_records),
        ("side_effects", stats.side_effects),
    ];
    println!("{:<24} {:>8}", "TABLE", "ROWS");
    println!("{}", "-".repeat(33));
    for (table, count) in rows {
        println!("{:<24} {:>8}", table, count);
    }
    println!("\nOrphaned entity lists (all libraries): {}", orphaned);

    Ok(())
}

/// Register a user
async fn add_user(database: Option<PathBuf>, email: &str, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(name) => name,
        None => email
            .split('@')
            .next()
            .filter(|s| !s.is_empty())
            .context("Cannot derive a username from the email; pass --username")?
            .to_string(),
    };

    let store = open_store(database)?;
    let user = store.add_user(email, &username)?;
    println!("Added user {} <{}> (id {})", user.username, user.email, user.id);

    Ok(())
}

/// Show resolved configuration
async fn show_config(database: Option<PathBuf>) -> Result<()> {
    let config = config::config()?;

    println!("libseed configuration:");
    println!("  home:        {}", config.home.display());
    println!(
        "  database:    {}",
        database.as_ref().unwrap_or(&config.database).display()
    );
    match &config.config_file {
        Some(path) => println!("  config file: {}", path.display()),
        None => println!("  config file: (none)"),
    }
    println!("\ngenerate:");
    print!("{}", serde_yaml::to_string(&config.generate)?);

    Ok(())
}
