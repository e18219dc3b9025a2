//! Channel documentation search tools.
//!
//! Each tool embeds the query text, runs a filtered nearest-neighbour search
//! over one logical table and renders the hits as text. Calls are blocking;
//! async callers should run them on a blocking thread.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::embedding::Embedder;
use super::filter::Predicate;
use super::format;
use super::store::{Hit, VectorDb};
use crate::error::SearchError;

/// Channel descriptions table.
pub const DESCRIPTIONS: &str = "descriptions";
/// Channel dependency graph table.
pub const DEPENDENCIES: &str = "dependencies";
/// Sensor coordinates table.
pub const COORDINATES: &str = "coordinates";
/// O&M manual chunks table.
pub const OANDM_MANUALS: &str = "oandm_manuals";

/// Tables inspected by [`ChannelSearch::list_platforms`], in report order.
pub const PLATFORM_TABLES: [&str; 4] = [DESCRIPTIONS, DEPENDENCIES, COORDINATES, OANDM_MANUALS];

/// Default number of results per search tool.
pub const DEFAULT_RESULTS: usize = 5;

/// Candidates considered when resolving a channel for lineage.
pub const LINEAGE_CANDIDATES: usize = 10;

fn given(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Search tools over one index file.
///
/// The index is opened per call so a rebuilt file is picked up without a
/// restart; the embedder is shared.
#[derive(Clone)]
pub struct ChannelSearch {
    db_path: PathBuf,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for ChannelSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSearch")
            .field("db_path", &self.db_path)
            .field("embedder", &self.embedder.name())
            .finish()
    }
}

impl ChannelSearch {
    /// Creates the tool set.
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            db_path: db_path.into(),
            embedder,
        }
    }

    /// Index file in use.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn search(
        &self,
        table: &str,
        text: &str,
        filter: Option<Predicate>,
        limit: usize,
    ) -> Result<Vec<Hit>, SearchError> {
        let db = VectorDb::open(&self.db_path)?;
        let table = db.open_table(table)?;
        let vector = self.embedder.embed(text)?;

        let mut query = table.search(vector).limit(limit);
        if let Some(filter) = filter {
            query = query.filter(filter);
        }
        query.to_list()
    }

    /// Semantic search over channel descriptions.
    ///
    /// `platform` matches the platform name or alias; `device` matches
    /// exactly. Blank filters are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the index or embedder fails.
    pub fn search_descriptions(
        &self,
        query: &str,
        platform: Option<&str>,
        device: Option<&str>,
        limit: usize,
    ) -> Result<String, SearchError> {
        let filter = Predicate::all_of([
            given(platform).map(Predicate::platform),
            given(device).map(|d| Predicate::eq("device", d)),
        ]);
        let hits = self.search(DESCRIPTIONS, query, filter, limit)?;
        Ok(format::fields(&hits, &format::DESCRIPTION_FIELDS))
    }

    /// Semantic search over channel dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the index or embedder fails.
    pub fn search_dependencies(
        &self,
        query: &str,
        platform: Option<&str>,
        limit: usize,
    ) -> Result<String, SearchError> {
        let filter = given(platform).map(Predicate::platform);
        let hits = self.search(DEPENDENCIES, query, filter, limit)?;
        Ok(format::dependencies(&hits))
    }

    /// Semantic search over sensor coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the index or embedder fails.
    pub fn search_coordinates(
        &self,
        query: &str,
        platform: Option<&str>,
        limit: usize,
    ) -> Result<String, SearchError> {
        let filter = given(platform).map(Predicate::platform);
        let hits = self.search(COORDINATES, query, filter, limit)?;
        Ok(format::coordinates(&hits))
    }

    /// Semantic search over O&M manual chunks.
    ///
    /// Manuals carry no alias, so `platform` matches the full name only.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the index or embedder fails.
    pub fn search_oandm(
        &self,
        query: &str,
        platform: Option<&str>,
        limit: usize,
    ) -> Result<String, SearchError> {
        let filter = given(platform).map(|p| Predicate::eq("platform_name", p));
        let hits = self.search(OANDM_MANUALS, query, filter, limit)?;
        Ok(format::oandm(&hits))
    }

    /// Upstream and downstream lineage of one channel on one platform.
    ///
    /// Among the closest candidates, the first whose name contains `channel`
    /// (case-insensitive) wins; otherwise the closest candidate is used.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the index or embedder fails.
    pub fn channel_lineage(&self, channel: &str, platform: &str) -> Result<String, SearchError> {
        let hits = self.search(
            DEPENDENCIES,
            &format!("{channel} {platform}"),
            Some(Predicate::platform(platform)),
            LINEAGE_CANDIDATES,
        )?;

        let needle = channel.to_lowercase();
        let best = hits
            .iter()
            .find(|h| h.record.text("name").to_lowercase().contains(&needle))
            .or_else(|| hits.first());

        Ok(match best {
            Some(hit) => {
                debug!(channel, matched = hit.record.text("name"), "lineage match");
                format::lineage(&hit.record)
            }
            None => format!("No channel matching '{channel}' found for platform '{platform}'."),
        })
    }

    /// Platforms present in the index and which tables mention them.
    ///
    /// Missing or unreadable tables are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Open`] if the index file cannot be opened.
    pub fn list_platforms(&self) -> Result<String, SearchError> {
        Self::platforms_in(&self.db_path)
    }

    /// Lists platforms in the index at `db_path` without loading an embedder.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Open`] if the index file cannot be opened.
    pub fn platforms_in(db_path: &Path) -> Result<String, SearchError> {
        let db = VectorDb::open(db_path)?;
        let mut inventory: BTreeMap<String, Vec<&str>> = BTreeMap::new();

        for table_name in PLATFORM_TABLES {
            let rows = match db.open_table(table_name).and_then(|t| t.rows()) {
                Ok(rows) => rows,
                Err(e) => {
                    debug!(table = table_name, error = %e, "skipping table");
                    continue;
                }
            };

            let abbreviation = &table_name[..4];
            for record in rows {
                if !record.has_value("platform_name") {
                    continue;
                }
                let tables = inventory.entry(record.text("platform_name")).or_default();
                if tables.last() != Some(&abbreviation) {
                    tables.push(abbreviation);
                }
            }
        }

        Ok(format::platforms(&inventory))
    }
}
