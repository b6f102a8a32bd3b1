use clap::{Parser, Subcommand};
use std::path::PathBuf;

use armyforge_core::GameSystem;

/// Command line front end for saved army lists
#[derive(Parser)]
#[command(name = "armyforge")]
#[command(version)]
pub struct Cli {
    /// Config file to use instead of the one in the user config directory
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List saved army lists, newest first
    Saves,
    /// Print a saved list as text
    Show {
        /// Creation time of the save
        key: String,
    },
    /// Report composition errors for a saved list
    Validate {
        /// Creation time of the save
        key: String,
    },
    /// Copy a save file produced elsewhere into the save directory
    Import {
        /// Path to the save file
        file: PathBuf,
    },
    /// Duplicate a save under a new key
    Copy {
        /// Creation time of the save
        key: String,
    },
    /// Delete a save
    Delete {
        /// Creation time of the save
        key: String,
    },
    /// Mark or unmark a save as favourite
    Favourite {
        /// Creation time of the save
        key: String,
        /// Clear the mark instead of setting it
        #[arg(long)]
        off: bool,
    },
    /// Print a list shared through the catalogue service
    Shared {
        /// Share id
        id: String,
    },
    /// List the army books published for a game system
    Books {
        /// Game system code or slug; defaults to the configured one
        #[arg(short, long)]
        system: Option<GameSystem>,
    },
}
