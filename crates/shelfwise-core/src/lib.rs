//! # Shelfwise Core
//!
//! Pure recommendation logic for shelfwise: book records, the sparse
//! filter spec, the validation ledger, and the filter → narrow → rerank
//! pipeline.
//!
//! This crate does no filesystem or network I/O and depends on no async
//! runtime. The one external collaborator, the semantic index, is reached
//! through the [`index::SemanticIndex`] trait.

pub mod filter;
pub mod index;
pub mod ledger;
pub mod models;
pub mod narrow;
pub mod pipeline;
pub mod prefilter;
pub mod rerank;
pub mod validate;

#[cfg(test)]
pub(crate) mod fixtures;
