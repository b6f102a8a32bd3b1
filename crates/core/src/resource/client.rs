use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    catalogue::normalize_army_book,
    config::AppConfig,
    models::{ArmyBook, ArmyBookSummary, GameSystem, RuleDefinition},
    save::SavedList,
};

use super::cache::ResponseCache;

/// Catalogue service base URL.
pub const DEFAULT_API_URL: &str = "https://projape.net/checker/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for army books, game rules and shared lists.
///
/// Successful responses are snapshotted to disk; when the service cannot be
/// reached the latest snapshot is served instead.
#[derive(Debug, Clone)]
pub struct CatalogueClient {
    client: Client,
    base_url: String,
    cache: ResponseCache,
}

impl CatalogueClient {
    /// Client for `base_url` caching under `cache`.
    pub fn new(base_url: impl Into<String>, cache: ResponseCache) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache,
        })
    }

    /// Client configured from the application config.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.api_url.clone(),
            ResponseCache::new(config.cache_root.join("responses")),
        )
    }

    /// Response snapshots.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Army books published for a game system. Empty when neither the
    /// service nor the cache can answer.
    pub async fn army_books(&self, system: GameSystem) -> Result<Vec<ArmyBookSummary>> {
        let slug = system.slug();
        let url = format!("{}/index.php?gamebooks={slug}-army-books", self.base_url);
        match self.cached_fetch(&army_books_key(system), &url).await {
            Ok(value) => parse_or_empty(value, "army book list"),
            Err(err) => {
                warn!("army books for {system} unavailable: {err:#}");
                Ok(Vec::new())
            }
        }
    }

    /// Game-system rule definitions. Empty when unavailable.
    pub async fn game_rules(&self, system: GameSystem) -> Result<Vec<RuleDefinition>> {
        let url = format!("{}/index.php?specialid={}", self.base_url, system.slug());
        match self.cached_fetch(&game_rules_key(system), &url).await {
            Ok(value) => parse_or_empty(rules_payload(value), "game rules"),
            Err(err) => {
                warn!("game rules for {system} unavailable: {err:#}");
                Ok(Vec::new())
            }
        }
    }

    /// One army book, normalized for `army_id`.
    pub async fn army_book(&self, army_id: &str, system: GameSystem) -> Result<ArmyBook> {
        let url = format!(
            "{}/index.php?id={army_id}~{}",
            self.base_url,
            system.service_id()
        );
        let raw = self
            .cached_fetch(&army_book_key(army_id, system), &url)
            .await
            .with_context(|| format!("army book {army_id} is unavailable"))?;
        normalize_army_book(raw, army_id)
    }

    /// Upload a list for sharing and return the service's reply.
    pub async fn share_list(&self, list: &SavedList) -> Result<Value> {
        let url = format!("{}/af/share", self.base_url);
        info!("sharing list {}", list.creation_time);
        let response = self
            .client
            .post(&url)
            .json(list)
            .send()
            .await
            .with_context(|| format!("failed to POST {url}"))?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetch a shared list by id.
    pub async fn shared_list(&self, id: &str) -> Result<SavedList> {
        let url = format!("{}/af/share/{id}", self.base_url);
        let value = self.fetch(&url).await?;
        serde_json::from_value(value).with_context(|| format!("malformed shared list {id}"))
    }

    async fn fetch(&self, url: &str) -> Result<Value> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to GET {url}"))?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn cached_fetch(&self, key: &str, url: &str) -> Result<Value> {
        match self.fetch(url).await {
            Ok(value) => {
                if let Err(err) = self.cache.persist(key, &value) {
                    warn!("could not cache {key}: {err:#}");
                }
                Ok(value)
            }
            Err(err) => {
                warn!("falling back to cached {key}: {err:#}");
                self.cache
                    .load(key)?
                    .map(|cached| cached.res)
                    .ok_or_else(|| anyhow!("no cached copy of {key}: {err:#}"))
            }
        }
    }
}

pub(crate) fn army_books_key(system: GameSystem) -> String {
    format!("army-books-{}", system.slug())
}

pub(crate) fn game_rules_key(system: GameSystem) -> String {
    format!("game-rules-{}", system.slug())
}

pub(crate) fn army_book_key(army_id: &str, system: GameSystem) -> String {
    format!("army-{army_id}{}", system.code())
}

/// The rules endpoint answers with either a bare list or an object wrapping it.
fn rules_payload(value: Value) -> Value {
    match value {
        Value::Object(mut object) => object
            .remove("rules")
            .or_else(|| object.remove("specialRules"))
            .unwrap_or(Value::Array(Vec::new())),
        other => other,
    }
}

fn parse_or_empty<T: DeserializeOwned>(value: Value, what: &str) -> Result<Vec<T>> {
    match serde_json::from_value(value) {
        Ok(items) => Ok(items),
        Err(err) => {
            warn!("ignoring malformed {what}: {err}");
            Ok(Vec::new())
        }
    }
}
