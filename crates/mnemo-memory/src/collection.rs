//! Persistent vector collection backed by SQLite.
//!
//! Stores one embedding per string-pair id and answers nearest-neighbor
//! queries by ascending cosine distance. Search is exact and deterministic:
//! ties are broken by id.

use crate::error::{MemoryError, Result};
use rusqlite::{Connection, params};
use std::path::Path;
use tracing::debug;

/// File name of the collection database inside the store directory.
const COLLECTION_FILE: &str = "string_pairs.sqlite";

/// A persistent collection of id-keyed embeddings.
pub struct VectorCollection {
    conn: Connection,
}

impl VectorCollection {
    /// Opens (or creates) the collection at the given store directory.
    ///
    /// # Errors
    /// Returns `StorageUnavailable` if the backend cannot be opened.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(COLLECTION_FILE);
        let conn = Connection::open(&path).map_err(|e| {
            MemoryError::StorageUnavailable(format!(
                "cannot open vector collection at {}: {}",
                path.display(),
                e
            ))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS pairs (
                id INTEGER PRIMARY KEY,
                input_text TEXT NOT NULL,
                embedding BLOB NOT NULL
            )",
            [],
        )
        .map_err(|e| MemoryError::StorageUnavailable(format!("cannot create schema: {}", e)))?;

        debug!(path = %path.display(), "Opened vector collection");
        Ok(Self { conn })
    }

    /// Inserts an embedding keyed by the given id.
    pub fn insert(&self, id: u64, input_text: &str, embedding: &[f32]) -> Result<()> {
        self.conn.execute(
            "INSERT INTO pairs (id, input_text, embedding) VALUES (?1, ?2, ?3)",
            params![id, input_text, encode_embedding(embedding)],
        )?;
        Ok(())
    }

    /// Returns up to `n` entries nearest to the query embedding, ordered by
    /// ascending cosine distance (ties broken by id).
    pub fn nearest(&self, query: &[f32], n: usize) -> Result<Vec<(u64, String, f32)>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare("SELECT id, input_text, embedding FROM pairs")?;
        let rows = stmt.query_map([], |row| {
            let id: u64 = row.get(0)?;
            let input_text: String = row.get(1)?;
            let blob: Vec<u8> = row.get(2)?;
            Ok((id, input_text, blob))
        })?;

        let mut scored = Vec::new();
        for row in rows {
            let (id, input_text, blob) = row?;
            let embedding = decode_embedding(&blob);
            scored.push((id, input_text, cosine_distance(query, &embedding)));
        }

        scored.sort_by(|a, b| {
            a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0))
        });
        scored.truncate(n);
        Ok(scored)
    }

    /// Number of entries in the collection.
    pub fn len(&self) -> Result<u64> {
        let count: u64 =
            self.conn.query_row("SELECT COUNT(*) FROM pairs", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Deletes every entry, leaving an empty collection behind.
    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM pairs", [])?;
        Ok(())
    }
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine distance in [0, 2]; degenerate (zero-norm) vectors are treated as
/// maximally distant from everything.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 2.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_collection(dir: &TempDir) -> VectorCollection {
        VectorCollection::open(dir.path()).unwrap()
    }

    #[test]
    fn test_open_creates_collection_file() {
        let dir = TempDir::new().unwrap();
        let collection = open_collection(&dir);
        assert!(collection.is_empty().unwrap());
        assert!(dir.path().join(COLLECTION_FILE).exists());
    }

    #[test]
    fn test_insert_and_count() {
        let dir = TempDir::new().unwrap();
        let collection = open_collection(&dir);
        collection.insert(1, "a", &[1.0, 0.0]).unwrap();
        collection.insert(2, "b", &[0.0, 1.0]).unwrap();
        assert_eq!(collection.len().unwrap(), 2);
    }

    #[test]
    fn test_nearest_orders_by_distance() {
        let dir = TempDir::new().unwrap();
        let collection = open_collection(&dir);
        collection.insert(1, "x axis", &[1.0, 0.0]).unwrap();
        collection.insert(2, "y axis", &[0.0, 1.0]).unwrap();
        collection.insert(3, "diagonal", &[1.0, 1.0]).unwrap();

        let hits = collection.nearest(&[1.0, 0.0], 3).unwrap();
        assert_eq!(hits[0].0, 1);
        assert!(hits[0].2.abs() < 1e-6);
        assert_eq!(hits[1].0, 3);
        assert_eq!(hits[2].0, 2);
    }

    #[test]
    fn test_nearest_truncates_to_n() {
        let dir = TempDir::new().unwrap();
        let collection = open_collection(&dir);
        for id in 1..=5u64 {
            collection.insert(id, "t", &[id as f32, 1.0]).unwrap();
        }
        assert_eq!(collection.nearest(&[1.0, 1.0], 2).unwrap().len(), 2);
        assert!(collection.nearest(&[1.0, 1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_clear_empties_collection() {
        let dir = TempDir::new().unwrap();
        let collection = open_collection(&dir);
        collection.insert(1, "a", &[1.0]).unwrap();
        collection.clear().unwrap();
        assert!(collection.is_empty().unwrap());
        assert!(collection.nearest(&[1.0], 1).unwrap().is_empty());
    }

    #[test]
    fn test_embedding_round_trip() {
        let original = vec![0.25f32, -1.5, 3.75];
        assert_eq!(decode_embedding(&encode_embedding(&original)), original);
    }

    #[test]
    fn test_cosine_distance_zero_norm_is_maximal() {
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 2.0);
    }
}
