// ==========================================
// 实验室试剂库 - 命令行参数定义
// ==========================================

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "reagent-db",
    version,
    about = "Lab reagent database - spreadsheet import, export and templates"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to app_config.json (default: user config dir).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Override the database path from the config file.
    #[arg(long = "db", value_name = "PATH", global = true)]
    pub db_path: Option<String>,

    /// Log output format (overrides the config file).
    #[arg(long = "log-format", value_enum, global = true)]
    pub log_format: Option<LogFormatArg>,

    /// Message language.
    #[arg(long = "locale", default_value = "en", global = true)]
    pub locale: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the database schema (idempotent).
    Init,

    /// Import a CSV/XLSX file.
    Import(ImportArgs),

    /// Export every table to CSV plus one XLSX workbook.
    Export {
        /// Output directory (default: export_folder from the config).
        #[arg(long = "output-dir", value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Write the CSV/XLSX import template for an import type.
    Template {
        #[arg(value_name = "IMPORT_TYPE")]
        import_type: String,
    },

    /// Read or change import settings stored in the database.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Parser)]
pub struct ImportArgs {
    /// One of: organism, plasmid, freezer, orf_sequence, orf_position,
    /// yeast_orf_position, orf_sources, unified_position.
    #[arg(value_name = "IMPORT_TYPE")]
    pub import_type: String,

    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Run the whole batch and roll back.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Require referenced ORFs to exist (overrides the stored setting).
    #[arg(long = "validate-orf")]
    pub validate_orf: bool,

    /// Print the full response as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// List effective import settings.
    List,
    /// Set an import setting, e.g. import.unique_positions true.
    Set { key: String, value: String },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}
