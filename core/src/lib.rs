//! Client-side synchronization of task records with a hosted record store.
//!
//! # Overview
//! `TaskSynchronizer` keeps an ordered local list of tasks that mirrors a
//! remote `tasks` table. Each command makes one remote round-trip and only
//! touches local state once the store confirms, using the row the store
//! returned.
//!
//! # Design
//! - `RecordStore` is the seam to persistence. `HttpStore` implements it over
//!   the store's REST surface; `MemoryStore` implements it in-process.
//! - `TaskApi` is stateless: `build_*` produces plain-data requests and
//!   `parse_*` consumes plain-data responses. A `Transport` does the I/O.
//! - DTOs are defined independently from the mock-store crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod notice;
pub mod store;
pub mod sync;
pub mod transport;
pub mod types;

pub use client::TaskApi;
pub use config::StoreConfig;
pub use error::{ConfigError, StoreError, SyncError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use memory::{MemoryStore, StoreOp};
pub use notice::{Action, Notice, NoticeLevel};
pub use store::{HttpStore, RecordStore, Transport};
pub use sync::{TaskStats, TaskSynchronizer};
pub use transport::ReqwestTransport;
pub use types::{Direction, NewTask, SortColumn, SortOrder, Task, TaskPatch};
