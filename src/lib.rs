//! Directory Mock
//!
//! A local stand-in for a hosted directory service's DNS record API, for testing ACME [DNS-01]
//! challenge solvers end to end without touching real infrastructure.
//!
//! The mock keeps a seeded, multi-tenant record store (organizations owning domains owning DNS
//! records) and serves it two ways:
//!
//! * an [HTTP API][api] to list, create and delete records, guarded by a shared `OAuth` token.
//! * a [DNS responder][dns] answering `TXT` queries from the store, so a solver can check its
//!   challenge propagated.
//!
//! [`DirectoryClient`] talks to the HTTP API the way a solver would, and [`DirectoryMock`]
//! starts and stops both listeners.
//!
//! [DNS-01]: https://www.rfc-editor.org/rfc/rfc8555#section-8.4
//!
#![warn(clippy::pedantic)]

pub mod api;
pub mod client;
pub mod config;
pub mod dns;
pub mod error;
pub mod service;
pub mod store;

pub use client::DirectoryClient;
pub use config::{Config, Shared};
pub use service::DirectoryMock;
pub use store::{Record, RecordStore, RecordType};
