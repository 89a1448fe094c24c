//! DNS responder backed by the directory's record store.
//!
//! The responder listens on UDP and answers standard queries only; other opcodes get
//! `NOTIMP`. Answers are synthesized per record type, all with a TTL of 5 seconds:
//!
//! ## TXT
//!
//! The query name is matched against every configured domain of every organization. A domain
//! matches when `.<domain>` is a suffix of the query name; the longest match wins. The label in
//! front of the domain is then looked up among that domain's TXT records.
//!
//! E.g. after creating a record through the [HTTP API][crate::api]:
//!
//! ```bash
//! ❯ curl -H 'Authorization: OAuth mockTestKey=' --json \
//!   '{"name":"_acme-challenge","type":"TXT","ttl":300,"text":"LPsIwTo7o8BoG0-vjCyGQGBWSVIPxI-i_X336eUOQZo"}' \
//!   http://localhost:8489/directory/v1/org/1001/domains/example1.com/dns
//! ```
//!
//! a `TXT` query for `_acme-challenge.example1.com` returns:
//!
//! ```bash
//! ❯ dig @127.0.0.1 -p 59351 +short _acme-challenge.example1.com TXT
//! "LPsIwTo7o8BoG0-vjCyGQGBWSVIPxI-i_X336eUOQZo"
//! ```
//!
//! An unconfigured domain, or a label without a TXT record, returns `NXDOMAIN`.
//!
//! ## A
//!
//! Every `A` query is answered with `127.0.0.1`, whatever the name.
//!
//! ## NS / SOA
//!
//! Answered with placeholders pointing at `ns.example-acme-webook.invalid.` so resolvers
//! probing for the zone's authority get a reply. They are never meant to be followed.
//!
//! ## Everything else
//!
//! Any other query type fails the whole reply with `SERVFAIL`.

mod answer;
mod handlers;
mod server;

pub use handlers::Handler;
pub(crate) use server::new;
