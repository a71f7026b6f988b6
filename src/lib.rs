//! Dump an etcd keyspace to a JSON snapshot and restore it.
//!
//! A backup walks the key tree selected by a [`BackupStrategy`] and flattens
//! it into an ordered list of [`Record`]s ([`backup`]), which is written as
//! a JSON document ([`snapshot`]). A restore reads that document back and
//! replays every record against a live store with bounded concurrency
//! ([`restore`]).
//!
//! Stores are reached through the [`store::QueryClient`] and
//! [`store::MutationClient`] traits. [`store::EtcdClient`] speaks the etcd v2
//! keys API; [`store::MemoryStore`] keeps everything in memory.

pub mod backup;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod progress;
pub mod record;
pub mod reliability;
pub mod restore;
pub mod snapshot;
pub mod store;
pub mod strategy;
pub mod ui;
pub mod utils;

pub use error::{Error, Result};
pub use record::{Record, RecordKind};
pub use restore::{RestoreOptions, RestoreStatistics, StatisticsSnapshot};
pub use strategy::BackupStrategy;
