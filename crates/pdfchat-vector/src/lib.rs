//! Vector indexing for the loaded document.
//!
//! Embedding services turn text into vectors, [`IndexBuilder`] embeds every
//! chunk of an upload into a [`DocumentIndex`], [`DocumentSlot`] publishes the
//! finished index, and [`DocumentRetriever`] answers nearest-chunk queries.

pub mod builder;
pub mod embedding;
pub mod index;
pub mod retriever;
pub mod slot;

pub use builder::IndexBuilder;
pub use embedding::{DynEmbeddingService, EmbeddingService, HashEmbedding, OnnxEmbeddingService};
pub use index::{DocumentIndex, IndexedDocument, ScoredChunk};
pub use retriever::DocumentRetriever;
pub use slot::DocumentSlot;
