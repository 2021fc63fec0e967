//! Similarity-based string-pair storage for Mnemo.
//!
//! Wraps a persistent vector collection plus a side table mapping ids to
//! `(input_text, output_text)` pairs. Input strings are embedded and used
//! as the retrieval key; output strings are opaque payload.

pub mod collection;
pub mod error;
pub mod store;

pub use collection::VectorCollection;
pub use error::{MemoryError, Result};
pub use store::{RelatedPair, SimilarityMapSettings, StringSimilarityMap};
