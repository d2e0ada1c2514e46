//! # Shelfwise
//!
//! A filter-aware book recommender.
//!
//! A request is a free-text query plus an optional structured filter spec
//! (author, genre, children, page bounds, publication year, keywords,
//! tone). Hard constraints are applied before and after a semantic
//! narrowing step, and every applied constraint is re-checked and recorded
//! in a validation ledger returned with the results.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────────┐   ┌──────────┐
//! │ Catalog  │──▶│ Pre-filter │──▶│    Narrow    │──▶│  Rerank  │──▶ records + ledger
//! │ JSON(L)  │   │  + ledger  │   │ memory/HTTP  │   │ + ledger │
//! └──────────┘   └────────────┘   └──────────────┘   └──────────┘
//! ```
//!
//! The pipeline itself lives in `shelfwise-core`; this crate adds the
//! configuration, catalog loading, the HTTP index client, and the CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! shelfwise catalog
//! shelfwise recommend "a haunted hotel" --filters '{"author": "Stephen King", "tone": "fear"}'
//! shelfwise recommend "wizards" --filters-file filters.json --limit 5 --json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`catalog`] | Catalog loading and per-category summary |
//! | [`index_http`] | Remote semantic index client |
//! | [`recommend`] | The `recommend` command |

pub mod catalog;
pub mod config;
pub mod index_http;
pub mod recommend;
