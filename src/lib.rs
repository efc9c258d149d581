//! # todokv
//!
//! A to-do list record store served over HTTP, with:
//! - Two wire encodings per endpoint (JSON and Protocol Buffers),
//!   selected per request
//! - An append-only item log for durability
//! - Crash recovery with partial write handling
//! - Single-writer/multi-reader concurrency model
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP Server                            │
//! │                  (axum, many clients)                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Request Router                            │
//! │        (verb + path + ?use_protobuf → operation)            │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌─────────────────┐
//!   │   Codec Layer   │                │   Item Store    │
//!   │ JSON | Protobuf │                │ (Single Writer) │
//!   └─────────────────┘                └────────┬────────┘
//!                                               │
//!                                  ┌────────────┴────────────┐
//!                                  ▼                         ▼
//!                           ┌─────────────┐          ┌─────────────┐
//!                           │  Item Log   │          │  ItemTable  │
//!                           │  (Append)   │          │  (RwLock)   │
//!                           └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod item;

pub mod wal;
pub mod store;
pub mod codec;
pub mod http;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{TodoError, Result};
pub use config::Config;
pub use item::{Item, ItemPatch};
pub use codec::Encoding;
pub use store::{ItemStore, LogStore, MemoryStore};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of todokv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
