//! Tenant resolution for directory requests.
//!
//! Every `/directory/v1/org/{organizationId}/domains/{tlDomain}/...` request passes three gates
//! in order before a handler runs:
//!
//! 1. [`authenticate`] checks the shared-secret `Authorization` header.
//! 2. [`Authenticated::resolve_organization`] parses and looks up the organization id.
//! 3. [`OrganizationScope::resolve_domain`] looks up the domain under that organization.
//!
//! Each gate consumes the previous stage by value and returns the next, so a handler that takes
//! a [`Tenant`] can only run once all three have passed. The first failing gate ends the
//! request with a 401.

use crate::api::api_error::APIError;
use crate::api::server::AppState;
use crate::config::Config;
use crate::error::Error;
use crate::store::{OrganizationId, RecordStore};
use axum::extract::{FromRequestParts, Path};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::collections::HashMap;

pub(super) const ORGANIZATION_PARAM: &str = "organization_id";
pub(super) const DOMAIN_PARAM: &str = "tl_domain";

/// The request carried the right token.
#[derive(Debug)]
pub(crate) struct Authenticated(());

/// The request is scoped to a known organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OrganizationScope {
    pub organization_id: OrganizationId,
}

/// The request is scoped to a known domain of a known organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tenant {
    pub organization_id: OrganizationId,
    pub domain: String,
}

pub(crate) fn authenticate(config: &Config, headers: &HeaderMap) -> Result<Authenticated, Error> {
    let provided = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    match provided {
        Some(value) if value == config.authorization() => Ok(Authenticated(())),
        Some(_) => {
            tracing::debug!("rejected request with wrong token");
            Err(Error::Unauthorized)
        }
        None => {
            tracing::debug!("rejected request without Authorization header");
            Err(Error::Unauthorized)
        }
    }
}

impl Authenticated {
    pub(crate) async fn resolve_organization(
        self,
        store: &RecordStore,
        raw: Option<&str>,
    ) -> Result<OrganizationScope, Error> {
        let raw = raw.unwrap_or_default();
        let organization_id: OrganizationId = raw
            .parse()
            .map_err(|_| Error::InvalidOrganizationId(raw.to_string()))?;
        if !store.has_organization(organization_id).await {
            tracing::debug!("rejected request for unknown organization {organization_id}");
            return Err(Error::OrganizationNotFound(organization_id));
        }
        Ok(OrganizationScope { organization_id })
    }
}

impl OrganizationScope {
    pub(crate) async fn resolve_domain(
        self,
        store: &RecordStore,
        raw: Option<&str>,
    ) -> Result<Tenant, Error> {
        let domain = raw.unwrap_or_default();
        if domain.is_empty() {
            return Err(Error::DomainNotFound(self.organization_id, String::new()));
        }
        if let Err(err) = store.check_domain(self.organization_id, domain).await {
            tracing::debug!("rejected request: {err}");
            return Err(err);
        }
        Ok(Tenant {
            organization_id: self.organization_id,
            domain: domain.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for Tenant {
    type Rejection = APIError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, APIError> {
        let authenticated = authenticate(&state.config, &parts.headers)?;
        let params = match Path::<HashMap<String, String>>::from_request_parts(parts, state).await
        {
            Ok(Path(params)) => params,
            Err(rejection) => {
                tracing::debug!("undecodable request path: {rejection}");
                raw_params(parts.uri.path())
            }
        };
        let scope = authenticated
            .resolve_organization(&state.store, params.get(ORGANIZATION_PARAM).map(String::as_str))
            .await?;
        let tenant = scope
            .resolve_domain(&state.store, params.get(DOMAIN_PARAM).map(String::as_str))
            .await?;
        Ok(tenant)
    }
}

// The tenant segments as they appear in `/directory/v1/org/{org}/domains/{domain}/...`,
// without percent-decoding. An undecodable segment can't name a configured organization or
// domain, so it fails its gate like any other unknown value.
fn raw_params(path: &str) -> HashMap<String, String> {
    let segments: Vec<&str> = path.split('/').collect();
    let after = |label: &str| {
        segments
            .iter()
            .position(|s| *s == label)
            .and_then(|i| segments.get(i + 1))
            .map(|s| (*s).to_string())
    };
    [(ORGANIZATION_PARAM, after("org")), (DOMAIN_PARAM, after("domains"))]
        .into_iter()
        .filter_map(|(key, value)| Some((key.to_string(), value?)))
        .collect()
}
