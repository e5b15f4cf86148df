// ==========================================
// 实验室试剂库 - 命令行入口
// ==========================================

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use reagent_db::config::{config_keys, AppConfig, ConfigManager, LogFormat};
use reagent_db::{i18n, logging, ImportApi, ImportOptions};

mod cli;

use crate::cli::{Cli, Command, ConfigAction, ImportArgs, LogFormatArg};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("无法读取配置文件")?;
    if let Some(db_path) = &cli.db_path {
        config.db_path = db_path.clone();
    }

    let log_format = match cli.log_format {
        Some(LogFormatArg::Json) => LogFormat::Json,
        Some(LogFormatArg::Pretty) => LogFormat::Pretty,
        None => config.log_format,
    };
    logging::init_with_format(log_format);
    i18n::set_locale(&cli.locale);

    tracing::info!(version = reagent_db::VERSION, db_path = %config.db_path, "启动 {}", reagent_db::APP_NAME);

    let api = ImportApi::new(&config).context("无法初始化数据库")?;

    match cli.command {
        Command::Init => {
            println!("Database ready: {}", config.db_path);
            Ok(())
        }
        Command::Import(args) => run_import(&api, args).await,
        Command::Export { output_dir } => {
            let response = match output_dir {
                Some(dir) => {
                    let config = AppConfig {
                        export_folder: dir,
                        ..config.clone()
                    };
                    ImportApi::new(&config)?.export_data()?
                }
                None => api.export_data()?,
            };
            println!("{}", response.message);
            Ok(())
        }
        Command::Template { import_type } => {
            let response = api.generate_template(&import_type)?;
            println!("{}", response.message);
            println!("{}", response.xlsx_path);
            Ok(())
        }
        Command::Config { action } => run_config(&api, action),
    }
}

async fn run_import(api: &ImportApi, args: ImportArgs) -> Result<()> {
    let options = ImportOptions {
        dry_run: args.dry_run,
        validate_orf_references: args.validate_orf.then_some(true),
    };

    let response = api.import_file(&args.file, &args.import_type, options).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.message);
    }

    if response.success {
        Ok(())
    } else {
        Err(anyhow!("import failed"))
    }
}

fn run_config(api: &ImportApi, action: ConfigAction) -> Result<()> {
    let manager = ConfigManager::from_connection(api.repository().shared_connection())?;

    match action {
        ConfigAction::List => {
            let settings = manager.import_settings()?;
            println!(
                "{} = {}",
                config_keys::VALIDATE_ORF_REFERENCES,
                settings.validate_orf_references
            );
            println!(
                "{} = {}",
                config_keys::ERROR_DISPLAY_LIMIT,
                settings.error_display_limit
            );
            println!("{} = {}", config_keys::UNIQUE_POSITIONS, settings.unique_positions);
        }
        ConfigAction::Set { key, value } => {
            // import.unique_positions 建索引失败时（已有重复位置）配置不会被保存
            manager
                .set_global_config_value(&key, &value)
                .with_context(|| format!("无法写入配置 {}", key))?;
            println!("{} = {}", key, value.trim());
        }
    }
    Ok(())
}
