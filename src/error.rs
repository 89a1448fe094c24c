//! Error types.

use crate::store::{OrganizationId, RecordId};
use std::net::IpAddr;
use trust_dns_proto::error::ProtoError;
use trust_dns_proto::rr::RecordType;

/// Error enumerates the possible directory mock error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when a request's `Authorization` header doesn't carry the configured
    /// `OAuth <token>` value, or carries none at all.
    #[error("unauthorized")]
    Unauthorized,

    /// Returned when an organization id from a request path isn't numeric.
    #[error("invalid organization id \"{0}\"")]
    InvalidOrganizationId(String),

    /// Returned when an organization isn't part of the seeded configuration.
    #[error("organization {0} not found")]
    OrganizationNotFound(OrganizationId),

    /// Returned when a domain isn't configured for the organization it was requested under.
    #[error("domain \"{1}\" not found for organization {0}")]
    DomainNotFound(OrganizationId, String),

    /// Returned when the record id in a `DELETE` path isn't numeric.
    #[error("invalid record id \"{0}\"")]
    InvalidRecordId(String),

    /// Returned when deleting a record id that doesn't exist in the domain.
    #[error("record {0} not found")]
    RecordNotFound(RecordId),

    /// Returned when a record found during a delete lookup is gone once the exclusive lock is
    /// held.
    #[error("record {0} changed while it was being deleted")]
    Conflict(RecordId),

    /// Returned by the DNS responder for query types it doesn't synthesize answers for.
    #[error("unimplemented record type {0}")]
    UnsupportedRecordType(RecordType),

    /// Returned when starting a listener that is already running.
    #[error("{0} server is already running")]
    AlreadyRunning(&'static str),

    /// Returned when a listener doesn't finish shutting down within
    /// [`Config::shutdown_timeout`][`crate::config::Config::shutdown_timeout`].
    #[error("{0} server did not shut down in time")]
    ShutdownTimeout(&'static str),

    /// Returned when seed data configures the same domain more than once. Domains must be
    /// unique across all organizations so DNS lookups resolve to a single owner.
    #[error("domain \"{0}\" is configured more than once")]
    DuplicateDomain(String),

    /// Returned when a seeded domain repeats a record id.
    #[error("record id {id} is repeated in domain \"{domain}\"")]
    DuplicateRecordId { domain: String, id: RecordId },

    /// Returned when a domain has no record id left to assign, e.g. because it was seeded with
    /// the largest possible id.
    #[error("no record ids left in domain \"{0}\"")]
    RecordIdsExhausted(String),

    /// Returned when the [`Config::api_bind_addr`][`crate::config::Config::api_bind_addr`] is
    /// not a loopback address, or an address within a private network space. The mock holds a
    /// shared secret and is only meant to be reachable by local test harnesses.
    #[error("API bind address ({0}) must be a loopback or private IP")]
    InsecureAPIBind(IpAddr),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when processing JSON (e.g. when
    /// [trying to load a `Config`][crate::config::Config::try_from_file]) fails.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),

    /// Returned when the DNS server encounters a generic DNS protocol error.
    #[error("DNS error")]
    DNSError(#[from] ProtoError),

    /// Returned when the HTTP server fails to bind or serve.
    #[error("HTTP server error")]
    Http(#[from] hyper::Error),

    /// Returned when the [directory client][crate::client::DirectoryClient] can't complete a
    /// request.
    #[error("HTTP client error")]
    Client(#[from] reqwest::Error),

    /// Returned when the directory API answers a client request with a non-200 status.
    #[error("response failed with status code {status} and body: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Returned when deleting a TXT record by name and no TXT record carries that name.
    #[error("no TXT record named \"{0}\"")]
    TxtRecordNotFound(String),

    /// Returned when deleting a TXT record by name and several TXT records carry that name.
    #[error("{1} TXT records named \"{0}\"")]
    AmbiguousTxtRecord(String, usize),
}
