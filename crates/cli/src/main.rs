mod cli;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs::{self, OpenOptions};

use armyforge_core::{
    config::{self, AppConfig},
    get_errors, list_as_text, CatalogueClient, GameSystem, LoadedList, SaveManager,
    SessionLoader,
};
use cli::{Cli, Commands};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => {
            config::ensure_default_config()?;
            AppConfig::load()?
        }
    };
    let saves = SaveManager::new(config.save_root.clone());
    let loader = SessionLoader::new(CatalogueClient::from_config(&config)?);

    match cli.command {
        Commands::Saves => {
            for entry in saves.entries()? {
                let star = if entry.favourite { "*" } else { " " };
                println!(
                    "{star} {}  {} [{}] {}pts {}",
                    entry.creation_time,
                    entry.name,
                    entry.game_system,
                    entry.points,
                    entry.army_name.unwrap_or_default()
                );
            }
        }
        Commands::Show { key } => {
            let loaded = load_save(&saves, &loader, &key).await?;
            println!("{}", list_as_text(&loaded.list));
        }
        Commands::Validate { key } => {
            let loaded = load_save(&saves, &loader, &key).await?;
            let errors = get_errors(&loaded.catalogue, &loaded.list);
            if errors.is_empty() {
                println!("{} is valid", loaded.list.name);
            }
            for error in errors {
                println!("- {error}");
            }
        }
        Commands::Import { file } => {
            let json = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let entry = saves.import(&json)?;
            println!("imported {} as {}", entry.name, entry.creation_time);
        }
        Commands::Copy { key } => {
            let entry = saves.copy_list(&key)?;
            println!("copied to {}", entry.creation_time);
        }
        Commands::Delete { key } => {
            if !saves.delete(&key)? {
                return Err(anyhow!("no save {key}"));
            }
        }
        Commands::Favourite { key, off } => {
            saves.toggle_favourite(&key, !off)?;
        }
        Commands::Shared { id } => {
            let shared = loader.client().shared_list(&id).await?;
            let loaded = loader.load_shared(shared).await?;
            println!("{}", list_as_text(&loaded.list));
        }
        Commands::Books { system } => {
            let system = system
                .or(config.game_system)
                .unwrap_or(GameSystem::Gf);
            for book in loader.client().army_books(system).await? {
                println!(
                    "{:<24} {} {}",
                    book.uid,
                    book.name,
                    book.version_string.unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}

async fn load_save(saves: &SaveManager, loader: &SessionLoader, key: &str) -> Result<LoadedList> {
    let record = saves.load(key)?;
    let loaded = loader.load(&record).await?;
    if loaded.repaired {
        saves.update_save(&loaded.list)?;
    }
    Ok(loaded)
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("armyforge.log");

    let env_filter = EnvFilter::from_default_env();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stdout);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}
