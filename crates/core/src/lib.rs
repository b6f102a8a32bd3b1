#![warn(clippy::all, missing_docs)]

//! Core engine for building army lists.
//!
//! This crate resolves unit upgrades into loadouts and costs, validates
//! lists against the game-system rules, persists them as replayable saves,
//! and fetches army books from the catalogue service.

pub mod campaign;
pub mod catalogue;
pub mod config;
pub mod export;
pub mod list;
pub mod models;
pub mod resource;
pub mod rules;
pub mod save;
pub mod session;
pub mod unit;
pub mod upgrade;
pub mod validation;

#[cfg(test)]
mod fixtures;

pub use catalogue::Catalogue;
pub use config::AppConfig;
pub use export::list_as_text;
pub use list::ListError;
pub use models::{GameSystem, ListState, SelectedUnit};
pub use resource::CatalogueClient;
pub use rules::RulesCache;
pub use save::{SaveEntry, SaveError, SaveManager, SaveRecord};
pub use session::{LoadedList, SessionLoader};
pub use upgrade::{Removal, UpgradeError};
pub use validation::get_errors;
