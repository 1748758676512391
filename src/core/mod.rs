//! Core engine modules.
//!
//! Indexing flows chunker → heading annotation → embedding → store;
//! retrieval flows embedding → vector pre-filter → lexical re-rank.
//! `services` wires everything together from a `config::Config`.

pub mod chunker;
pub mod config;
pub mod embedding;
pub mod error;
pub mod heading;
pub mod indexer;
pub mod retriever;
pub mod services;
pub mod store;
pub mod types;
