//! Remote store clients for Phrixus.
//!
//! - [`HttpRemoteStore`] talks to a Usergrid-style entity-graph service over
//!   HTTP, addressing `{base_url}/{org}/{app}/{endpoint}`
//! - [`MemoryStore`] answers the same REST subset in process, for tests and
//!   local development
//!
//! Both implement [`phrixus_model::RemoteStore`].

pub mod config;
pub mod http;
pub mod memory;

pub use config::StoreConfig;
pub use http::HttpRemoteStore;
pub use memory::MemoryStore;
