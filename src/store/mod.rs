//! Key-value store collaborators.
//!
//! The backup side only needs to read a node tree ([`QueryClient`]) and the
//! restore side only needs to write keys and directories ([`MutationClient`]).
//! Two implementations are provided:
//!
//! - **EtcdClient**: talks to an etcd cluster through the v2 keys HTTP API
//! - **MemoryStore**: hierarchical in-memory store (testing/embedding)
//!
//! # Example
//!
//! ```ignore
//! use etcd_backup::store::{MemoryStore, MutationClient, QueryClient};
//!
//! let store = MemoryStore::new();
//! store.set("/app/name", "demo", 0).await?;
//! let root = store.get("/", true, true).await?;
//! ```

mod backend;
mod error;
mod etcd;
mod memory;
mod node;

pub use backend::{MutationClient, QueryClient};
pub use error::StoreError;
pub use etcd::{EtcdClient, EtcdConfig};
pub use memory::MemoryStore;
pub use node::{Node, Response};
