//! Multi-tenant DNS record storage.
//!
//! Records are kept per organization, then per domain, in insertion order. The set of
//! organizations and domains is fixed when the store is seeded; only the record lists inside
//! each domain change at runtime.
//!
//! Every structural access goes through the same two-level lookup (organization, then domain).
//! A miss at either level is reported as [`Error::OrganizationNotFound`] or
//! [`Error::DomainNotFound`], which is distinct from a domain that exists but holds no records.
//!
//! All reads take the shared side of a single [`RwLock`], all mutations take the exclusive
//! side. No I/O happens while the lock is held.

use crate::error::Error;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod record;

pub use record::{OrganizationId, Record, RecordId, RecordType};

/// Seed data: organization id → domain → records.
pub type Organizations = BTreeMap<OrganizationId, BTreeMap<String, Vec<Record>>>;

/// `SharedStore` is the handle both the HTTP API and the DNS responder hold.
pub type SharedStore = Arc<RecordStore>;

#[derive(Debug, Default)]
struct DomainRecords {
    next_id: RecordId,
    records: Vec<Record>,
}

impl DomainRecords {
    fn seeded(domain: &str, records: &[Record]) -> Result<Self, Error> {
        let mut seen = std::collections::HashSet::new();
        for record in records {
            if !seen.insert(record.record_id) {
                return Err(Error::DuplicateRecordId {
                    domain: domain.to_string(),
                    id: record.record_id,
                });
            }
        }
        let max_id = records.iter().map(|r| r.record_id).max().unwrap_or(0);
        let next_id = max_id
            .checked_add(1)
            .ok_or_else(|| Error::RecordIdsExhausted(domain.to_string()))?;
        Ok(DomainRecords {
            next_id,
            records: records.to_vec(),
        })
    }
}

type Domains = BTreeMap<String, DomainRecords>;

/// Outcome of resolving a fully qualified query name to a stored TXT record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxtLookup {
    /// No configured domain is a suffix of the query name.
    UnknownDomain,
    /// A domain matched but holds no TXT record for the remaining label.
    UnknownName { domain: String, label: String },
    Found(Record),
}

#[derive(Debug, Default)]
pub struct RecordStore {
    organizations: RwLock<BTreeMap<OrganizationId, Domains>>,
}

impl RecordStore {
    /// Build a store from seed data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateDomain`] if the same domain (compared case-insensitively) is
    /// configured for more than one organization, or twice within one organization.
    ///
    /// Returns [`Error::DuplicateRecordId`] if a seeded domain repeats a record id, and
    /// [`Error::RecordIdsExhausted`] if it holds the largest possible id.
    pub fn try_new(seed: &Organizations) -> Result<Self, Error> {
        let mut owners: BTreeMap<String, OrganizationId> = BTreeMap::new();
        let mut organizations = BTreeMap::new();
        for (org_id, domains) in seed {
            let mut org_domains = Domains::new();
            for (domain, records) in domains {
                let key = normalize_domain(domain);
                if let Some(owner) = owners.insert(key.clone(), *org_id) {
                    tracing::debug!("domain \"{key}\" configured for {owner} and {org_id}");
                    return Err(Error::DuplicateDomain(key));
                }
                org_domains.insert(key.clone(), DomainRecords::seeded(&key, records)?);
            }
            organizations.insert(*org_id, org_domains);
        }
        Ok(RecordStore {
            organizations: RwLock::new(organizations),
        })
    }

    pub async fn has_organization(&self, org_id: OrganizationId) -> bool {
        self.organizations.read().await.contains_key(&org_id)
    }

    /// Check that `domain` is configured under `org_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrganizationNotFound`] or [`Error::DomainNotFound`] on a miss.
    pub async fn check_domain(&self, org_id: OrganizationId, domain: &str) -> Result<(), Error> {
        let orgs = self.organizations.read().await;
        lookup(&orgs, org_id, domain).map(|_| ())
    }

    /// The records of a domain, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrganizationNotFound`] or [`Error::DomainNotFound`] on a miss.
    pub async fn list(&self, org_id: OrganizationId, domain: &str) -> Result<Vec<Record>, Error> {
        let orgs = self.organizations.read().await;
        Ok(lookup(&orgs, org_id, domain)?.records.clone())
    }

    /// Append a record to a domain, assigning it the domain's next record id. Ids are never
    /// reused, even after deletes. Returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrganizationNotFound`] or [`Error::DomainNotFound`] on a miss, and
    /// [`Error::RecordIdsExhausted`] once the domain has used up its ids.
    pub async fn append(
        &self,
        org_id: OrganizationId,
        domain: &str,
        mut record: Record,
    ) -> Result<Record, Error> {
        let mut orgs = self.organizations.write().await;
        let entries = lookup_mut(&mut orgs, org_id, domain)?;
        record.record_id = entries.next_id;
        entries.next_id = entries
            .next_id
            .checked_add(1)
            .ok_or_else(|| Error::RecordIdsExhausted(normalize_domain(domain)))?;
        entries.records.push(record.clone());
        Ok(record)
    }

    /// Index of the record with the given id, if present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrganizationNotFound`] or [`Error::DomainNotFound`] on a miss.
    pub async fn position(
        &self,
        org_id: OrganizationId,
        domain: &str,
        record_id: RecordId,
    ) -> Result<Option<usize>, Error> {
        let orgs = self.organizations.read().await;
        Ok(lookup(&orgs, org_id, domain)?
            .records
            .iter()
            .position(|r| r.record_id == record_id))
    }

    /// Remove the record found at `index` by [`RecordStore::position`], preserving the order of
    /// the remaining records.
    ///
    /// The id is checked again under the exclusive lock. If concurrent deletes shifted the
    /// record it is located again by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if the record disappeared between lookup and removal.
    ///
    /// Returns [`Error::OrganizationNotFound`] or [`Error::DomainNotFound`] on a miss.
    pub async fn remove_at(
        &self,
        org_id: OrganizationId,
        domain: &str,
        index: usize,
        record_id: RecordId,
    ) -> Result<Record, Error> {
        let mut orgs = self.organizations.write().await;
        let records = &mut lookup_mut(&mut orgs, org_id, domain)?.records;
        let index = match records.get(index) {
            Some(r) if r.record_id == record_id => index,
            _ => {
                tracing::debug!("record {record_id} moved from index {index}, rescanning");
                records
                    .iter()
                    .position(|r| r.record_id == record_id)
                    .ok_or(Error::Conflict(record_id))?
            }
        };
        Ok(records.remove(index))
    }

    /// Resolve a query name such as `_acme-challenge.example.com.` to a TXT record.
    ///
    /// Every domain of every organization is checked for being a dot-qualified suffix of the
    /// query name. The longest matching domain wins; the label in front of it is then matched
    /// against that domain's TXT record names.
    pub async fn find_txt(&self, query_name: &str) -> TxtLookup {
        let query_name = normalize_domain(query_name);
        let orgs = self.organizations.read().await;

        let matched = orgs
            .values()
            .flat_map(|domains| domains.iter())
            .filter_map(|(domain, entries)| {
                query_name
                    .strip_suffix(domain.as_str())
                    .and_then(|prefix| prefix.strip_suffix('.'))
                    .filter(|label| !label.is_empty())
                    .map(|label| (domain, label, entries))
            })
            .max_by_key(|(domain, _, _)| domain.len());

        let Some((domain, label, entries)) = matched else {
            return TxtLookup::UnknownDomain;
        };

        match entries.records.iter().find(|r| r.is_txt_named(label)) {
            Some(record) => TxtLookup::Found(record.clone()),
            None => TxtLookup::UnknownName {
                domain: domain.clone(),
                label: label.to_string(),
            },
        }
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim_end_matches('.').to_ascii_lowercase()
}

fn lookup<'a>(
    orgs: &'a BTreeMap<OrganizationId, Domains>,
    org_id: OrganizationId,
    domain: &str,
) -> Result<&'a DomainRecords, Error> {
    orgs.get(&org_id)
        .ok_or(Error::OrganizationNotFound(org_id))?
        .get(&normalize_domain(domain))
        .ok_or_else(|| Error::DomainNotFound(org_id, domain.to_string()))
}

fn lookup_mut<'a>(
    orgs: &'a mut BTreeMap<OrganizationId, Domains>,
    org_id: OrganizationId,
    domain: &str,
) -> Result<&'a mut DomainRecords, Error> {
    orgs.get_mut(&org_id)
        .ok_or(Error::OrganizationNotFound(org_id))?
        .get_mut(&normalize_domain(domain))
        .ok_or_else(|| Error::DomainNotFound(org_id, domain.to_string()))
}
