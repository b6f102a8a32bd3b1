//! Loading saved and shared lists against freshly fetched army books.

use std::{collections::HashSet, sync::Arc};

use anyhow::{anyhow, Result};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::{
    catalogue::Catalogue,
    models::{new_id, ArmyBook, GameSystem, ListState, RuleDefinition},
    resource::CatalogueClient,
    rules::RulesCache,
    save::{build_list_from_save, build_list_from_saved_state, SaveRecord, SavedList},
};

/// A list rebuilt against the books it draws from.
#[derive(Debug, Clone)]
pub struct LoadedList {
    /// Books the list was replayed against.
    pub catalogue: Catalogue,
    /// The rebuilt list.
    pub list: ListState,
    /// `true` when a missing key or game system was filled in and the save
    /// should be written back.
    pub repaired: bool,
}

/// Fetches the army books of a list, replays it and keeps the rules cache
/// current for its game system.
pub struct SessionLoader {
    client: CatalogueClient,
    rules: RulesCache,
}

impl SessionLoader {
    /// Loader with an empty rules cache.
    pub fn new(client: CatalogueClient) -> Self {
        Self {
            client,
            rules: RulesCache::new(),
        }
    }

    /// Underlying catalogue client.
    pub fn client(&self) -> &CatalogueClient {
        &self.client
    }

    /// Game-system rules fetched so far.
    pub fn rules(&self) -> &RulesCache {
        &self.rules
    }

    /// Fetch the books concurrently. Results keep the order of `army_ids`;
    /// books that cannot be fetched are skipped.
    pub async fn load_books(&self, army_ids: &[String], system: GameSystem) -> Vec<ArmyBook> {
        let mut tasks = JoinSet::new();
        for (index, army_id) in army_ids.iter().cloned().enumerate() {
            let client = self.client.clone();
            tasks.spawn(async move {
                let book = client.army_book(&army_id, system).await;
                (index, army_id, book)
            });
        }

        let mut books = Vec::with_capacity(army_ids.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, _, Ok(book))) => books.push((index, book)),
                Ok((_, army_id, Err(err))) => warn!("skipping army book {army_id}: {err:#}"),
                Err(err) => warn!("army book task failed: {err}"),
            }
        }
        books.sort_by_key(|(index, _)| *index);
        books.into_iter().map(|(_, book)| book).collect()
    }

    /// Rebuild a saved list.
    pub async fn load(&self, record: &SaveRecord) -> Result<LoadedList> {
        let system = record.list.game_system.unwrap_or(record.game_system);
        let army_ids = record.army_ids();
        info!(
            "loading list {} ({system}, books {army_ids:?})",
            record.list.creation_time
        );

        let books = self.load_books(&army_ids, system).await;
        let catalogue = Catalogue::new(Some(system), books);
        let mut list = build_list_from_save(record, &catalogue)?;

        let mut repaired = false;
        if list.key.is_none() {
            list.key = Some(new_id());
            repaired = true;
        }
        if list.game_system.is_none() {
            list.game_system = Some(system);
            repaired = true;
        }
        if repaired {
            debug!("filled in missing list metadata for {}", list.creation_time);
        }

        self.refresh_rules(system).await?;
        Ok(LoadedList {
            catalogue,
            list,
            repaired,
        })
    }

    /// Rebuild a list received through sharing. Its books are the distinct
    /// army ids of its units.
    pub async fn load_shared(&self, saved: SavedList) -> Result<LoadedList> {
        let system = saved
            .game_system
            .ok_or_else(|| anyhow!("shared list {} has no game system", saved.creation_time))?;
        let mut seen = HashSet::new();
        let army_ids: Vec<String> = saved
            .units
            .iter()
            .filter_map(|unit| unit.army_id.clone())
            .filter(|army_id| seen.insert(army_id.clone()))
            .collect();

        let books = self.load_books(&army_ids, system).await;
        let catalogue = Catalogue::new(Some(system), books);
        let list = build_list_from_saved_state(&saved, &catalogue);
        self.refresh_rules(system).await?;
        Ok(LoadedList {
            catalogue,
            list,
            repaired: false,
        })
    }

    /// Drop and refetch the rules of `system`.
    pub async fn refresh_rules(&self, system: GameSystem) -> Result<Arc<Vec<RuleDefinition>>> {
        self.rules.invalidate(system);
        let rules = self.client.game_rules(system).await?;
        debug!("{} rules for {system}", rules.len());
        Ok(self.rules.insert(system, rules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fixtures,
        resource::ResponseCache,
        save::{data_for_save, new_record, refresh_record},
    };
    use serde_json::json;
    use tempfile::tempdir;

    fn offline_loader(dir: &std::path::Path) -> Result<SessionLoader> {
        let cache = ResponseCache::new(dir);
        cache.persist("army-elvesgf", &serde_json::to_value(fixtures::book())?)?;
        cache.persist(
            "game-rules-grimdark-future",
            &json!([{ "name": "Fear", "description": "Scary" }]),
        )?;
        Ok(SessionLoader::new(CatalogueClient::new(
            "http://127.0.0.1:9",
            cache,
        )?))
    }

    fn sample_record() -> Result<SaveRecord> {
        let catalogue = fixtures::catalogue();
        let mut list = ListState::new("Patrol", Some(GameSystem::Gf), 500);
        let warriors = list.add_unit(fixtures::selected(&catalogue, "warriors").definition);
        let (section, axe) = fixtures::option(&catalogue, "axe");
        list.apply_upgrade(&warriors, &section, &axe)?;
        let mut record = new_record(&catalogue, "Patrol", Some(&list))?;
        list.creation_time = record.list.creation_time.clone();
        refresh_record(&mut record, &list);
        Ok(record)
    }

    #[tokio::test]
    async fn loads_saves_from_cached_books() -> Result<()> {
        let dir = tempdir()?;
        let loader = offline_loader(dir.path())?;
        let mut record = sample_record()?;
        record.list.key = None;

        let loaded = loader.load(&record).await?;
        assert!(loaded.repaired);
        assert!(loaded.list.key.is_some());
        assert_eq!(loaded.list.points, 105);
        assert_eq!(loaded.catalogue.books().len(), 1);

        let rules = loader
            .rules()
            .get(GameSystem::Gf)
            .ok_or_else(|| anyhow!("rules were not cached"))?;
        assert_eq!(rules[0].name, "Fear");
        Ok(())
    }

    #[tokio::test]
    async fn skips_books_that_cannot_be_fetched() -> Result<()> {
        let dir = tempdir()?;
        let loader = offline_loader(dir.path())?;
        let ids = vec!["missing".to_string(), fixtures::ARMY_ID.to_string()];
        let books = loader.load_books(&ids, GameSystem::Gf).await;
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].uid, fixtures::ARMY_ID);
        Ok(())
    }

    #[tokio::test]
    async fn shared_lists_need_a_game_system() -> Result<()> {
        let dir = tempdir()?;
        let loader = offline_loader(dir.path())?;
        let mut shared = data_for_save(&ListState::new("Shared", None, 0));
        assert!(loader.load_shared(shared.clone()).await.is_err());

        shared.game_system = Some(GameSystem::Gf);
        let loaded = loader.load_shared(shared).await?;
        assert!(loaded.list.units.is_empty());
        Ok(())
    }
}
