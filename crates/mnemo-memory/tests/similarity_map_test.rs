//! Integration tests for the string similarity map, run against the real
//! on-disk collection with the deterministic hash embedder.

use mnemo_memory::{SimilarityMapSettings, StringSimilarityMap};
use mnemo_models::HashEmbedder;
use std::sync::Arc;
use tempfile::TempDir;

async fn open_map(dir: &TempDir, reset: bool) -> StringSimilarityMap {
    StringSimilarityMap::open(
        SimilarityMapSettings::default(),
        reset,
        dir.path(),
        Arc::new(HashEmbedder::new()),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn save_and_reopen_round_trip_resumes_counter() {
    let dir = TempDir::new().unwrap();

    {
        let mut map = open_map(&dir, false).await;
        map.add_pair("how many liars", "100").await.unwrap();
        map.add_pair("how many towers", "2").await.unwrap();
        map.save().unwrap();
    }

    let mut map = open_map(&dir, false).await;
    assert_eq!(map.len(), 2);
    assert_eq!(map.last_pair_id(), 2);

    // Id allocation resumes where it left off.
    map.add_pair("what is 4^4", "256").await.unwrap();
    assert_eq!(map.last_pair_id(), 3);

    // Previously stored pairs are still retrievable by their input text.
    let related = map.get_related("how many liars", 1, 0.5).await.unwrap();
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].output_text, "100");
}

#[tokio::test]
async fn related_pairs_respect_threshold_and_include_exact_match() {
    let dir = TempDir::new().unwrap();
    let mut map = open_map(&dir, false).await;
    map.add_pair("a", "1").await.unwrap();
    map.add_pair("b", "2").await.unwrap();
    map.add_pair("c", "3").await.unwrap();

    let related = map.get_related("a", 2, 1.0).await.unwrap();

    // The exact match comes back at (near) zero distance.
    assert!(related.iter().any(|p| p.input_text == "a" && p.distance < 1e-5));
    // Nothing at or beyond the threshold is included.
    assert!(related.iter().all(|p| p.distance < 1.0));
    // Results only ever come from pairs that were added.
    let known = ["a", "b", "c"];
    assert!(related.iter().all(|p| known.contains(&p.input_text.as_str())));
}

#[tokio::test]
async fn results_are_ordered_by_ascending_distance() {
    let dir = TempDir::new().unwrap();
    let mut map = open_map(&dir, false).await;
    map.add_pair("build cell phone towers on a road", "towers").await.unwrap();
    map.add_pair("vampires in a remote village", "vampires").await.unwrap();
    map.add_pair("build cell towers on a stretch of road", "towers2").await.unwrap();

    let related = map.get_related("build cell phone towers on a road", 3, 2.0).await.unwrap();
    assert!(!related.is_empty());
    for window in related.windows(2) {
        assert!(window[0].distance <= window[1].distance);
    }
    assert_eq!(related[0].output_text, "towers");
}

#[tokio::test]
async fn reset_then_query_is_empty() {
    let dir = TempDir::new().unwrap();
    let mut map = open_map(&dir, false).await;
    map.add_pair("a", "1").await.unwrap();
    map.add_pair("b", "2").await.unwrap();
    map.reset().unwrap();

    assert!(map.get_related("a", 5, 2.0).await.unwrap().is_empty());

    // Within the session ids are never reused after a reset.
    map.add_pair("c", "3").await.unwrap();
    assert_eq!(map.last_pair_id(), 3);

    // A reopened store seeds its counter from the persisted table length.
    drop(map);
    let map = open_map(&dir, true).await;
    assert_eq!(map.len(), 0);
    assert_eq!(map.last_pair_id(), 0);
}

#[tokio::test]
async fn open_on_unusable_directory_is_storage_unavailable() {
    let dir = TempDir::new().unwrap();
    // A file where the store directory should be.
    let blocked = dir.path().join("occupied");
    std::fs::write(&blocked, "not a directory").unwrap();

    let result = StringSimilarityMap::open(
        SimilarityMapSettings::default(),
        false,
        &blocked,
        Arc::new(HashEmbedder::new()),
    )
    .await;

    assert!(matches!(result, Err(mnemo_memory::MemoryError::StorageUnavailable(_))));
}
