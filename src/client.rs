//! Client for the directory API's DNS record endpoints.
//!
//! This is the side of the API an ACME DNS-01 solver uses: present a challenge with
//! [`DirectoryClient::upsert_txt_record`] and clean it up with
//! [`DirectoryClient::delete_txt_record_by_name`]. It works against the real directory API as
//! well as against [`DirectoryMock`][crate::service::DirectoryMock].

use crate::api::model::ListRecordsResponse;
use crate::error::Error;
use crate::store::{OrganizationId, Record, RecordId};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::de::DeserializeOwned;

/// Page size used when walking all records of a domain.
const LIST_PER_PAGE: usize = 50;

/// A client bound to one domain of one organization.
#[derive(Clone, Debug)]
pub struct DirectoryClient {
    http: HttpClient,
    base_url: String,
    token: String,
    organization_id: OrganizationId,
    domain: String,
}

impl DirectoryClient {
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        organization_id: OrganizationId,
        domain: impl Into<String>,
    ) -> Self {
        DirectoryClient {
            http: HttpClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            organization_id,
            domain: domain.into(),
        }
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    fn records_url(&self) -> String {
        format!(
            "{}/directory/v1/org/{}/domains/{}/dns",
            self.base_url, self.organization_id, self.domain
        )
    }

    fn authorization(&self) -> String {
        format!("OAuth {}", self.token)
    }

    /// Fetch one page of the domain's records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Client`] if the request fails and [`Error::UnexpectedStatus`] for any
    /// non-200 response.
    pub async fn list_records(
        &self,
        page: usize,
        per_page: usize,
    ) -> Result<ListRecordsResponse, Error> {
        tracing::debug!(url = %self.records_url(), page, per_page, "GET request");
        let rsp = self
            .http
            .get(self.records_url())
            .header(AUTHORIZATION, self.authorization())
            .query(&[("page", page), ("perPage", per_page)])
            .send()
            .await?;
        decode(rsp).await
    }

    /// Fetch every record of the domain, walking all pages.
    ///
    /// # Errors
    ///
    /// See [`DirectoryClient::list_records`].
    pub async fn records(&self) -> Result<Vec<Record>, Error> {
        let mut records = vec![];
        let mut page = 1;
        loop {
            let rsp = self.list_records(page, LIST_PER_PAGE).await?;
            let done = rsp.records.is_empty() || page >= rsp.pages;
            records.extend(rsp.records);
            if done {
                return Ok(records);
            }
            page += 1;
        }
    }

    /// Create a record. Returns it as stored, with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Client`] if the request fails and [`Error::UnexpectedStatus`] for any
    /// non-200 response.
    pub async fn add_record(&self, record: &Record) -> Result<Record, Error> {
        tracing::debug!(url = %self.records_url(), "POST request");
        let rsp = self
            .http
            .post(self.records_url())
            .header(AUTHORIZATION, self.authorization())
            .json(record)
            .send()
            .await?;
        decode(rsp).await
    }

    /// Make sure a TXT record `name` with value `text` exists. An identical record is reused;
    /// otherwise a new one is created.
    ///
    /// # Errors
    ///
    /// See [`DirectoryClient::records`] and [`DirectoryClient::add_record`].
    pub async fn upsert_txt_record(&self, name: &str, text: &str, ttl: u32) -> Result<Record, Error> {
        let existing = self
            .records()
            .await?
            .into_iter()
            .find(|r| r.is_txt_named(name) && r.text.as_deref() == Some(text));
        if let Some(record) = existing {
            tracing::debug!("TXT record \"{name}\" already present as {}", record.record_id);
            return Ok(record);
        }
        let record = self.add_record(&Record::txt(name, text, ttl)).await?;
        tracing::info!("added TXT record \"{name}\" to {} as {}", self.domain, record.record_id);
        Ok(record)
    }

    /// Delete a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Client`] if the request fails and [`Error::UnexpectedStatus`] for any
    /// non-200 response (404 for an unknown id).
    pub async fn delete_record(&self, record_id: RecordId) -> Result<(), Error> {
        let url = format!("{}/{record_id}", self.records_url());
        tracing::debug!(url = %url, "DELETE request");
        let rsp = self
            .http
            .delete(url)
            .header(AUTHORIZATION, self.authorization())
            .send()
            .await?;
        check(rsp).await.map(|_| ())
    }

    /// Delete the TXT record called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TxtRecordNotFound`] if no TXT record has that name and
    /// [`Error::AmbiguousTxtRecord`] if more than one does. Otherwise see
    /// [`DirectoryClient::delete_record`].
    pub async fn delete_txt_record_by_name(&self, name: &str) -> Result<(), Error> {
        let matches: Vec<RecordId> = self
            .records()
            .await?
            .iter()
            .filter(|r| r.is_txt_named(name))
            .map(|r| r.record_id)
            .collect();
        match matches.as_slice() {
            [] => Err(Error::TxtRecordNotFound(name.to_string())),
            [record_id] => {
                self.delete_record(*record_id).await?;
                tracing::info!("deleted TXT record \"{name}\" ({record_id}) from {}", self.domain);
                Ok(())
            }
            _ => Err(Error::AmbiguousTxtRecord(name.to_string(), matches.len())),
        }
    }
}

async fn check(rsp: Response) -> Result<Response, Error> {
    let status = rsp.status();
    if status == StatusCode::OK {
        return Ok(rsp);
    }
    let body = rsp.text().await.unwrap_or_default();
    Err(Error::UnexpectedStatus {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(rsp: Response) -> Result<T, Error> {
    Ok(check(rsp).await?.json().await?)
}

/// The name of `fqdn` relative to `domain`, e.g. `_acme-challenge` for
/// `_acme-challenge.example.com.` in `example.com`. Names outside the domain are returned
/// unchanged, without a trailing dot.
#[must_use]
pub fn relative_name<'a>(fqdn: &'a str, domain: &str) -> &'a str {
    let fqdn = fqdn.trim_end_matches('.');
    let domain = domain.trim_end_matches('.');
    fqdn.strip_suffix(domain)
        .and_then(|prefix| prefix.strip_suffix('.'))
        .unwrap_or(fqdn)
}

/// The registrable domain of a zone, taken as its last two labels: `example.com` for
/// `sub.example.com.`. Returns `None` for zones with fewer than two labels.
#[must_use]
pub fn domain_from_zone(zone: &str) -> Option<String> {
    let labels: Vec<&str> = zone
        .trim_end_matches('.')
        .split('.')
        .filter(|l| !l.is_empty())
        .collect();
    match labels.as_slice() {
        [.., second_level, top_level] => Some(format!("{second_level}.{top_level}")),
        _ => None,
    }
}
