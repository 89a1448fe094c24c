//! Mock of the directory API's DNS record endpoints.
//!
//! All endpoints below `/directory/v1/org/{organizationId}/domains/{tlDomain}` require the
//! header `Authorization: OAuth <auth_key>`. A wrong or missing token, an unknown organization
//! and an unknown domain all return HTTP 401 (Unauthorized) with the body:
//!
//! ```json
//! {"code":16,"message":"Unauthorized","details":[{"@type":"type.googleapis.com/google.rpc.RequestInfo","requestId":"00000000-0000-0000-0000-000000000000","servingData":""}]}
//! ```
//!
//! # API Endpoints
//!
//! ## `/healthcheck` (GET)
//!
//!   Returns HTTP 200 (OK) and the JSON body `{"ok":"healthy"}` when the service is operational.
//!
//! ## `/directory/v1/org/{organizationId}/domains/{tlDomain}/dns` (GET)
//!
//!   Lists the domain's records in insertion order. The optional `page` (default 1) and
//!   `perPage` (default 10) query parameters select a window; values that aren't positive
//!   integers fall back to the defaults. Pages past the end return an empty `records` list.
//!
//!   ```json
//!   {"page":2,"pages":2,"perPage":2,"records":[{"recordId":3,"name":"sometxt1","type":"TXT","ttl":21600,"text":"randomtext1"}],"total":3}
//!   ```
//!
//! ## `/directory/v1/org/{organizationId}/domains/{tlDomain}/dns` (POST)
//!
//!   Creates a record from a JSON body, e.g.:
//!
//!   ```json
//!   {"name":"_acme-challenge","type":"TXT","ttl":300,"text":"LPsIwTo7o8BoG0-vjCyGQGBWSVIPxI-i_X336eUOQZo"}
//!   ```
//!
//!   `name`, `type` and `ttl` are required. Returns HTTP 200 (OK) with the stored record,
//!   including its assigned `recordId`, or HTTP 400 (Bad Request) for a malformed body.
//!
//! ## `/directory/v1/org/{organizationId}/domains/{tlDomain}/dns/{recordId}` (DELETE)
//!
//!   Deletes a record. Returns HTTP 200 (OK) and `{}`, HTTP 400 (Bad Request) for a
//!   non-numeric `recordId`, HTTP 404 (Not Found) for an unknown one and HTTP 405 (Method Not
//!   Allowed) for other methods.

mod api_error;
pub mod model;
mod routes;
mod server;
mod tenant;

pub(crate) use server::new;
