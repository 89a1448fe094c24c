use serde::{Deserialize, Serialize};
use std::fmt;

/// Organization (tenant) identifier.
pub type OrganizationId = u64;

/// Record identifier, unique within the owning domain.
pub type RecordId = u64;

/// The record types the directory accepts. Only the type decides which of the optional
/// [`Record`] payload fields are meaningful.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Txt,
    Ns,
    Soa,
    Mx,
    Srv,
    Caa,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Ns => "NS",
            RecordType::Soa => "SOA",
            RecordType::Mx => "MX",
            RecordType::Srv => "SRV",
            RecordType::Caa => "CAA",
        };
        f.write_str(s)
    }
}

/// A DNS resource record as exchanged with the directory API.
///
/// `name` is relative to the owning domain (e.g. `_acme-challenge`, or `@` for the apex).
/// `record_id` is assigned by the store on creation; any value sent by a client is ignored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default)]
    pub record_id: RecordId,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub ttl: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preference: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Record {
    /// A record of the given type with no payload fields set.
    #[must_use]
    pub fn new(name: impl Into<String>, record_type: RecordType, ttl: u32) -> Self {
        Record {
            record_id: 0,
            name: name.into(),
            record_type,
            ttl,
            address: None,
            target: None,
            text: None,
            exchange: None,
            preference: None,
            priority: None,
            weight: None,
            port: None,
            flag: None,
            tag: None,
            value: None,
        }
    }

    #[must_use]
    pub fn txt(name: impl Into<String>, text: impl Into<String>, ttl: u32) -> Self {
        Record {
            text: Some(text.into()),
            ..Record::new(name, RecordType::Txt, ttl)
        }
    }

    #[must_use]
    pub fn a(name: impl Into<String>, address: impl Into<String>, ttl: u32) -> Self {
        Record {
            address: Some(address.into()),
            ..Record::new(name, RecordType::A, ttl)
        }
    }

    #[must_use]
    pub fn cname(name: impl Into<String>, target: impl Into<String>, ttl: u32) -> Self {
        Record {
            target: Some(target.into()),
            ..Record::new(name, RecordType::Cname, ttl)
        }
    }

    #[must_use]
    pub fn with_id(mut self, record_id: RecordId) -> Self {
        self.record_id = record_id;
        self
    }

    /// True if this is a TXT record whose relative name equals `label` (ASCII case-insensitive).
    pub fn is_txt_named(&self, label: &str) -> bool {
        self.record_type == RecordType::Txt && self.name.eq_ignore_ascii_case(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_requires_name_type_ttl() {
        let missing_ttl = json!({"name": "www", "type": "A"});
        assert!(serde_json::from_value::<Record>(missing_ttl).is_err());

        let unknown_type = json!({"name": "www", "type": "BOGUS", "ttl": 300});
        assert!(serde_json::from_value::<Record>(unknown_type).is_err());

        let ok = json!({"name": "www", "type": "A", "ttl": 300, "address": "1.2.3.4"});
        let record: Record = serde_json::from_value(ok).unwrap();
        assert_eq!(record.record_id, 0);
        assert_eq!(record.address.as_deref(), Some("1.2.3.4"));
    }

    #[test]
    fn test_serialize_omits_empty_payload() {
        let record = Record::txt("_acme-challenge", "token", 300).with_id(7);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "recordId": 7,
                "name": "_acme-challenge",
                "type": "TXT",
                "ttl": 300,
                "text": "token",
            })
        );
    }

    #[test]
    fn test_is_txt_named() {
        let record = Record::txt("_ACME-challenge", "token", 300);
        assert!(record.is_txt_named("_acme-challenge"));
        assert!(!record.is_txt_named("other"));
        assert!(!Record::cname("_acme-challenge", "x.example", 300).is_txt_named("_acme-challenge"));
    }
}
