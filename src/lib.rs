//! # gitpix
//!
//! A command-line image bed backed by a GitHub repository.
//!
//! ## Overview
//!
//! GitHub has no "list files with history" call, so gitpix rebuilds the set
//! of images in a repository from its most recent commits. Per-commit detail
//! lookups are memoized in a bounded LRU cache that is persisted between runs,
//! which keeps repeated refreshes down to a single commit listing request.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Gallery                             │
//! │   Ties config, remote source and commit cache together      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │  IndexBuilder   │ │ CommitResolver  │ │      API        │
//! │                 │ │                 │ │                 │
//! │ • Recency walk  │ │ • Cache first   │ │ • GitHub REST   │
//! │ • Filter/dedup  │ │ • Persist hook  │ │ • Uploads       │
//! │ • Sort/truncate │ │                 │ │                 │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │ RecencyCache    │ │    Database     │ │      Auth       │
//! │                 │ │                 │ │                 │
//! │ • LRU eviction  │ │ • Snapshots     │ │ • Encrypted     │
//! │ • Snapshots     │ │   per repo      │ │   token vault   │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] — Remote repository access (GitHub)
//! - [`auth`] — Encrypted token storage
//! - [`cache`] — Bounded recency cache and its snapshots
//! - [`config`] — Configuration management
//! - [`db`] — `SQLite` snapshot store
//! - [`gallery`] — Gallery session
//! - [`index`] — Commit-derived image index
//! - [`resolver`] — Cached commit detail lookups
//! - [`sync`] — Periodic refresh
//!
//! ## Example
//!
//! ```no_run
//! use gitpix::api::github::GitHubClient;
//! use gitpix::{Config, Database, Gallery};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let client = GitHubClient::new(&config.repository, "ghp_token")?;
//! let mut gallery = Gallery::open(config, client, Database::open()?)?;
//!
//! for image in gallery.list_images().await? {
//!     println!("{}", image.markdown());
//! }
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/gitpix/0.2.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::future_not_send)]

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod gallery;
pub mod index;
pub mod links;
pub mod models;
pub mod paths;
pub mod resolver;
pub mod sync;

// Re-export main types for convenience
pub use cache::RecencyCache;
pub use config::Config;
pub use db::Database;
pub use error::Error;
pub use gallery::Gallery;
pub use index::{ImageFilter, IndexBuilder, UpsertPolicy};
pub use models::{CommitDetail, CommitRef, FileChange, FileStatus, ImageEntry};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Repository URL
pub const REPO_URL: &str = "https://github.com/ricardodantas/gitpix";
