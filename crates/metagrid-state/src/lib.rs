//! metagrid-state — revision store for metagrid.
//!
//! Backed by [redb](https://docs.rs/redb), keeps every accepted service
//! revision and the deployments that registered them.
//!
//! # Architecture
//!
//! All domain types are JSON-serialized into redb's `&[u8]` value columns.
//! Revisions are keyed `{service}:{revision:010}` so a prefix scan yields
//! the history of one service in revision order.
//!
//! Registration runs the checks of `meta-check` inside a single write
//! transaction. redb admits one writer at a time, so two deployments can
//! never both be checked against the same history, and a rejected
//! deployment leaves the store untouched.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`).

pub mod error;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use store::{RegistrationPlan, StateStore};
