//! # rag-context
//!
//! Retrieval-augmented context for a documentation chat assistant.
//!
//! An offline batch turns a tree of Markdown docs and examples into a flat
//! vector store. At query time a question is classified into intent, the
//! store is ranked by cosine similarity under intent-derived metadata
//! filters, and the top passages are rendered into one citation-annotated
//! block for a language model prompt.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Doc trees  │──▶│ Chunk + meta │──▶│ Embed (batch)│──▶ vectors.json
//! └────────────┘   └──────┬───────┘   └──────────────┘         │
//!                         │ taxonomy                           │
//!                         ▼                                    ▼
//!                  ┌─────────────┐   ┌────────┐   ┌──────────────────┐
//!                  │ URL mapper  │──▶│Context │◀──│ Retriever        │◀── query
//!                  └─────────────┘   └────────┘   │ intent + ranking │
//!                                                 └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ragctx ingest                                  # build the vector store
//! ragctx context "Show me a TypeScript client example"
//! ragctx serve                                   # POST /context for the chat service
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`taxonomy`] | Content catalog and path index |
//! | [`url_mapper`] | Source path → citation URL |
//! | [`connector_fs`] | Source tree scanning |
//! | [`chunk`] | Paragraph-first text chunking |
//! | [`metadata`] | Taxonomy and path-heuristic metadata |
//! | [`ingest`] | Offline ingestion pipeline |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`embed_cmd`] | Batch chunk embedding |
//! | [`store`] | Persisted vector store |
//! | [`intent`] | Query intent analysis |
//! | [`search`] | Ranking and intent-driven retrieval |
//! | [`context`] | Prompt context assembly |
//! | [`server`] | JSON HTTP server |
//! | [`error`] | Library error type |

pub mod chunk;
pub mod config;
pub mod connector_fs;
pub mod context;
pub mod embed_cmd;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod intent;
pub mod metadata;
pub mod models;
pub mod search;
pub mod server;
pub mod store;
pub mod taxonomy;
pub mod url_mapper;
