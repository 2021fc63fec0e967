//! Similarity-based string-pair store.
//!
//! Each entry is a pair of strings: an input string and an output string.
//! The input string is embedded and used as the retrieval key; the output
//! string is opaque payload. The vector collection holds the embeddings and
//! a side table maps each id to its text pair; the side table is persisted
//! explicitly via [`StringSimilarityMap::save`].

use crate::collection::VectorCollection;
use crate::error::{MemoryError, Result};
use mnemo_abstraction::Embedder;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// File name of the persisted side table inside the store directory.
const SIDE_TABLE_FILE: &str = "uid_text_dict.json";

/// Settings for the string similarity map.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimilarityMapSettings {
    /// Log the full table after each mutation.
    #[serde(default)]
    pub verbose: bool,
}

/// A retrieved string pair with its similarity distance.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedPair {
    /// The stored input text.
    pub input_text: String,
    /// The stored output text.
    pub output_text: String,
    /// Cosine distance between the query and the stored input.
    pub distance: f32,
}

/// Storage and similarity-based retrieval of string pairs.
///
/// Append-only: entries are added one at a time and the whole store is
/// destroyed and recreated by [`StringSimilarityMap::reset`]. Ids are
/// 1-based and strictly increasing; the counter is seeded from the number
/// of entries loaded from disk.
pub struct StringSimilarityMap {
    settings: SimilarityMapSettings,
    collection: VectorCollection,
    embedder: Arc<dyn Embedder>,
    side_table: BTreeMap<u64, (String, String)>,
    last_pair_id: u64,
    side_table_path: PathBuf,
}

impl StringSimilarityMap {
    /// Opens (or creates) a store at the given directory.
    ///
    /// When a persisted side table exists and `reset` is false it is loaded
    /// and the id counter resumes from its length. When `reset` is true the
    /// store is cleared regardless of prior state.
    ///
    /// # Errors
    /// Returns `StorageUnavailable` if the directory is unusable or the
    /// vector backend cannot be opened.
    pub async fn open(
        settings: SimilarityMapSettings,
        reset: bool,
        dir: &Path,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            MemoryError::StorageUnavailable(format!(
                "cannot create store directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let collection = VectorCollection::open(dir)?;
        let side_table_path = dir.join(SIDE_TABLE_FILE);

        let mut map = Self {
            settings,
            collection,
            embedder,
            side_table: BTreeMap::new(),
            last_pair_id: 0,
            side_table_path,
        };

        if !reset && map.side_table_path.exists() {
            let content = fs::read_to_string(&map.side_table_path)?;
            map.side_table = serde_json::from_str(&content)?;
            map.last_pair_id = map.side_table.len() as u64;
            debug!(
                path = %map.side_table_path.display(),
                pairs = map.side_table.len(),
                "Loaded string similarity map from disk"
            );
            if map.settings.verbose && !map.side_table.is_empty() {
                map.log_string_pairs();
            }
        }

        if reset {
            map.reset()?;
        }

        Ok(map)
    }

    /// Adds one input-output string pair to the store.
    ///
    /// The side table is not persisted automatically; call
    /// [`StringSimilarityMap::save`] explicitly.
    pub async fn add_pair(&mut self, input_text: &str, output_text: &str) -> Result<()> {
        self.last_pair_id += 1;
        let id = self.last_pair_id;

        let embedding = self.embedder.embed(input_text).await?;
        self.collection.insert(id, input_text, &embedding)?;
        self.side_table.insert(id, (input_text.to_string(), output_text.to_string()));

        debug!(id, input_len = input_text.len(), "Added input-output pair");
        if self.settings.verbose {
            self.log_string_pairs();
        }
        Ok(())
    }

    /// Retrieves up to `max_results` string pairs related to the query text
    /// whose distance is strictly below `threshold`, ordered by ascending
    /// distance.
    ///
    /// With `max_results == 0` or an empty store, returns an empty sequence
    /// without touching the backend.
    ///
    /// # Errors
    /// Returns `InconsistentIndex` if a vector hit has no side-table entry.
    pub async fn get_related(
        &self,
        query_text: &str,
        max_results: usize,
        threshold: f32,
    ) -> Result<Vec<RelatedPair>> {
        let n = max_results.min(self.side_table.len());
        if n == 0 {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(query_text).await?;
        let hits = self.collection.nearest(&query, n)?;

        let mut pairs = Vec::new();
        for (id, _input_text, distance) in hits {
            let (input_text, output_text) =
                self.side_table.get(&id).ok_or(MemoryError::InconsistentIndex(id))?;
            if distance < threshold {
                debug!(id, distance, "Retrieved input-output pair");
                pairs.push(RelatedPair {
                    input_text: input_text.clone(),
                    output_text: output_text.clone(),
                    distance,
                });
            }
        }
        Ok(pairs)
    }

    /// Forces immediate deletion of the store's contents, in memory and on
    /// disk. Destructive and irreversible; the now-empty side table is
    /// persisted before returning.
    pub fn reset(&mut self) -> Result<()> {
        if self.settings.verbose {
            info!("Clearing string-pair map");
        }
        self.collection.clear()?;
        self.side_table.clear();
        self.save()
    }

    /// Serializes the side table to disk, overwriting any prior content.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string(&self.side_table)?;
        fs::write(&self.side_table_path, json)?;
        Ok(())
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.side_table.len()
    }

    /// Whether the store holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.side_table.is_empty()
    }

    /// The id assigned to the most recently added pair (0 when empty).
    pub fn last_pair_id(&self) -> u64 {
        self.last_pair_id
    }

    fn log_string_pairs(&self) {
        info!("List of string pairs:");
        for (id, (input_text, output_text)) in &self.side_table {
            info!(id, input_text = %input_text, output_text = %output_text, "  pair");
        }
    }
}
