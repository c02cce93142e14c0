//! DNS Message Builder
//!
//! Constructs DNS query messages using `hickory-proto`.

use ferrous_stub_domain::QueryError;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::str::FromStr;

/// Builds DNS query messages
pub struct MessageBuilder;

impl MessageBuilder {
    /// Build a standard recursive query with a random id and a single question.
    pub fn build_query(domain: &str, record_type: RecordType) -> Result<Message, QueryError> {
        Self::build_query_with_id(fastrand::u16(..), domain, record_type)
    }

    /// Build one query per domain for a single client. Ids run sequentially
    /// from a random base so no two queries in the batch share one.
    pub fn build_batch<S: AsRef<str>>(
        domains: &[S],
        record_type: RecordType,
    ) -> Result<Vec<Message>, QueryError> {
        if domains.len() > usize::from(u16::MAX) + 1 {
            return Err(QueryError::Encode(format!(
                "Cannot assign distinct ids to {} queries",
                domains.len()
            )));
        }

        let base = fastrand::u16(..);
        domains
            .iter()
            .enumerate()
            .map(|(offset, domain)| {
                let id = base.wrapping_add(offset as u16);
                Self::build_query_with_id(id, domain.as_ref(), record_type)
            })
            .collect()
    }

    pub fn build_query_with_id(
        id: u16,
        domain: &str,
        record_type: RecordType,
    ) -> Result<Message, QueryError> {
        let name = Name::from_str(domain)
            .map_err(|e| QueryError::Encode(format!("Invalid domain '{}': {}", domain, e)))?;

        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(record_type);
        query.set_query_class(DNSClass::IN);

        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(query);
        Ok(message)
    }

    /// Serialize a Message to wire format bytes
    pub fn to_wire(message: &Message) -> Result<Vec<u8>, QueryError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);

        message.emit(&mut encoder).map_err(|e| {
            QueryError::Encode(format!("Failed to serialize DNS message: {}", e))
        })?;

        Ok(buf)
    }
}
