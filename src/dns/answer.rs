//! Answer synthesis for DNS questions.

use crate::error::Error;
use crate::store::{RecordStore, TxtLookup};
use std::net::Ipv4Addr;
use std::str::FromStr;
use trust_dns_proto::op::ResponseCode;
use trust_dns_proto::rr::rdata::{SOA, TXT};
use trust_dns_proto::rr::{Name, RData, Record, RecordType};

/// TTL of every synthesized answer.
pub(crate) const ANSWER_TTL: u32 = 5;

/// NS/SOA answers point here. The `.invalid` TLD guarantees nothing resolves it.
pub(crate) const PLACEHOLDER_NS: &str = "ns.example-acme-webook.invalid.";

// DNS character-strings carry at most 255 bytes.
const TXT_CHUNK_LEN: usize = 255;

/// The answers and response code for a whole query message.
#[derive(Debug, Clone)]
pub(crate) struct Reply {
    pub response_code: ResponseCode,
    pub answers: Vec<Record>,
}

enum Answer {
    Records(Vec<Record>),
    NameError,
}

/// Answer each question independently.
///
/// A name error on any question sets `NXDomain` while the other questions are still answered.
/// Any failure sets `ServFail` and discards every answer.
pub(crate) async fn answer_questions<'q, I>(store: &RecordStore, questions: I) -> Reply
where
    I: IntoIterator<Item = (&'q Name, RecordType)>,
{
    let mut reply = Reply {
        response_code: ResponseCode::NoError,
        answers: vec![],
    };
    for (name, record_type) in questions {
        match answer_question(store, name, record_type).await {
            Ok(Answer::Records(mut records)) => reply.answers.append(&mut records),
            Ok(Answer::NameError) => reply.response_code = ResponseCode::NXDomain,
            Err(err) => {
                tracing::warn!("failed to answer {record_type} query for \"{name}\": {err}");
                return Reply {
                    response_code: ResponseCode::ServFail,
                    answers: vec![],
                };
            }
        }
    }
    reply
}

async fn answer_question(
    store: &RecordStore,
    name: &Name,
    record_type: RecordType,
) -> Result<Answer, Error> {
    let rdata = match record_type {
        // Every name resolves to loopback.
        RecordType::A => RData::A(Ipv4Addr::LOCALHOST),
        RecordType::TXT => match store.find_txt(&name.to_ascii()).await {
            TxtLookup::Found(record) => txt_rdata(record.text.as_deref().unwrap_or_default()),
            TxtLookup::UnknownDomain => {
                tracing::debug!("no configured domain for \"{name}\"");
                return Ok(Answer::NameError);
            }
            TxtLookup::UnknownName { domain, label } => {
                tracing::debug!("no TXT record \"{label}\" in {domain}");
                return Ok(Answer::NameError);
            }
        },
        RecordType::NS => RData::NS(Name::from_str(PLACEHOLDER_NS)?),
        RecordType::SOA => {
            let placeholder = Name::from_str(PLACEHOLDER_NS)?;
            RData::SOA(SOA::new(placeholder.clone(), placeholder, 20, 5, 5, 5, 5))
        }
        other => return Err(Error::UnsupportedRecordType(other)),
    };
    Ok(Answer::Records(vec![Record::from_rdata(
        name.clone(),
        ANSWER_TTL,
        rdata,
    )]))
}

fn txt_rdata(text: &str) -> RData {
    let chunks: Vec<&[u8]> = if text.is_empty() {
        vec![&b""[..]]
    } else {
        text.as_bytes().chunks(TXT_CHUNK_LEN).collect()
    };
    RData::TXT(TXT::from_bytes(chunks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Organizations, Record as StoredRecord};

    fn store() -> RecordStore {
        let mut orgs = Organizations::new();
        orgs.entry(1001).or_default().insert(
            "example1.com".into(),
            vec![
                StoredRecord::cname("cname1", "someother1.site", 21600).with_id(1),
                StoredRecord::txt("_acme-challenge", "challenge-token", 300).with_id(2),
                StoredRecord::txt("long", "x".repeat(300), 300).with_id(3),
            ],
        );
        orgs.entry(1002)
            .or_default()
            .insert("example3.com".into(), vec![StoredRecord::txt("t", "three", 60).with_id(1)]);
        RecordStore::try_new(&orgs).unwrap()
    }

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    fn txt_strings(record: &Record) -> Vec<Vec<u8>> {
        match record.data() {
            Some(RData::TXT(txt)) => txt.txt_data().iter().map(|s| s.to_vec()).collect(),
            other => panic!("expected TXT rdata, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_a_is_loopback_for_any_name() {
        let store = store();
        let q = name("anything.not-configured.test.");
        let reply = answer_questions(&store, [(&q, RecordType::A)]).await;
        assert_eq!(reply.response_code, ResponseCode::NoError);
        assert_eq!(reply.answers.len(), 1);
        assert_eq!(reply.answers[0].data(), Some(&RData::A(Ipv4Addr::LOCALHOST)));
        assert_eq!(reply.answers[0].ttl(), ANSWER_TTL);
        assert_eq!(reply.answers[0].name(), &q);
    }

    #[tokio::test]
    async fn test_txt_lookup() {
        let store = store();
        let q = name("_acme-challenge.example1.com.");
        let reply = answer_questions(&store, [(&q, RecordType::TXT)]).await;
        assert_eq!(reply.response_code, ResponseCode::NoError);
        assert_eq!(txt_strings(&reply.answers[0]), vec![b"challenge-token".to_vec()]);

        let q = name("t.example3.com.");
        let reply = answer_questions(&store, [(&q, RecordType::TXT)]).await;
        assert_eq!(txt_strings(&reply.answers[0]), vec![b"three".to_vec()]);
    }

    #[tokio::test]
    async fn test_txt_long_text_is_chunked() {
        let store = store();
        let q = name("long.example1.com.");
        let reply = answer_questions(&store, [(&q, RecordType::TXT)]).await;
        let strings = txt_strings(&reply.answers[0]);
        assert_eq!(strings.iter().map(Vec::len).collect::<Vec<_>>(), vec![255, 45]);
    }

    #[tokio::test]
    async fn test_txt_name_errors() {
        let store = store();
        for q in ["_acme-challenge.unknown.org.", "cname1.example1.com.", "missing.example1.com."] {
            let q = name(q);
            let reply = answer_questions(&store, [(&q, RecordType::TXT)]).await;
            assert_eq!(reply.response_code, ResponseCode::NXDomain, "{q}");
            assert!(reply.answers.is_empty());
        }
    }

    #[tokio::test]
    async fn test_ns_and_soa_placeholders() {
        let store = store();
        let q = name("example1.com.");
        let reply = answer_questions(&store, [(&q, RecordType::NS), (&q, RecordType::SOA)]).await;
        assert_eq!(reply.response_code, ResponseCode::NoError);
        assert_eq!(reply.answers.len(), 2);
        assert_eq!(
            reply.answers[0].data(),
            Some(&RData::NS(name(PLACEHOLDER_NS)))
        );
        match reply.answers[1].data() {
            Some(RData::SOA(soa)) => {
                assert_eq!(soa.mname(), &name(PLACEHOLDER_NS));
                assert_eq!(soa.serial(), 20);
            }
            other => panic!("expected SOA rdata, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsupported_type_fails_whole_reply() {
        let store = store();
        let q = name("_acme-challenge.example1.com.");
        let reply = answer_questions(&store, [(&q, RecordType::TXT), (&q, RecordType::MX)]).await;
        assert_eq!(reply.response_code, ResponseCode::ServFail);
        assert!(reply.answers.is_empty());
    }

    #[tokio::test]
    async fn test_name_error_does_not_drop_other_answers() {
        let store = store();
        let missing = name("missing.example1.com.");
        let present = name("_acme-challenge.example1.com.");
        let reply = answer_questions(
            &store,
            [(&missing, RecordType::TXT), (&present, RecordType::TXT)],
        )
        .await;
        assert_eq!(reply.response_code, ResponseCode::NXDomain);
        assert_eq!(reply.answers.len(), 1);
    }
}
