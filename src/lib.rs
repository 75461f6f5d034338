//! # gsadmin - command dispatch, background joins and paged menus for game servers
//!
//! gsadmin is the admin core of a game server: it turns typed admin commands into
//! privilege-checked actions, runs their slow parts (record keeping, directory
//! listings) off the thread that owns the game, and joins the results back onto that
//! thread once per tick. Lists of players, bans and maps are shown to players through
//! numbered-key paged menus.
//!
//! ## Features
//!
//! - **Command protocol**: quoted-argument tokenizer, descriptor registry with arity,
//!   scope and privilege checks, and `execute` / `on_success` / `on_failure` hooks.
//! - **Owning-thread joins**: background work carries only the issuer's identity token;
//!   each join re-resolves it and hands the hook `None` when the player has left.
//! - **Paged menus**: up to eight items per page on keys 1-8, 9 for back, 0 for next.
//! - **Records**: bans, kicks and map changes in a sled database.
//! - **Console server**: a tokio tick loop reading admin commands from stdin.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gsadmin::config::Config;
//! use gsadmin::server::AdminServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let mut server = AdminServer::new(config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`command`] - tokenizer, privileges, descriptors, registry and target lookup
//! - [`tasks`] - background scheduling and the join queue
//! - [`menu`] - paged menus and per-viewer menu state
//! - [`host`] - owning-thread context and collaborator traits
//! - [`admin`] - built-in commands
//! - [`storage`] - ban, kick and map-change records
//! - [`roster`] - admin privilege file and the session directory
//! - [`server`] - console server tick loop
//! - [`config`] - configuration loading and validation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  AdminServer    │ ← tick loop, console input
//! └─────────────────┘
//!          │
//! ┌─────────────────┐      ┌─────────────────┐
//! │  Host           │ ───► │  TaskScheduler  │ ← blocking pool
//! │  (owning thread)│ ◄─── │  JoinQueue      │
//! └─────────────────┘      └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  RecordStore    │ ← sled
//! └─────────────────┘
//! ```

pub mod admin;
pub mod catalog;
pub mod command;
pub mod config;
pub mod console;
pub mod host;
pub mod logutil;
pub mod menu;
pub mod metrics;
pub mod roster;
pub mod server;
pub mod storage;
pub mod table;
pub mod tasks;
pub mod validation;
