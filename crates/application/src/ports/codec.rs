use ferrous_stub_domain::{QueryError, TransactionId};

/// Wire-format encoder/decoder for DNS messages.
///
/// The correlation engine never looks inside a message beyond its leading
/// transaction id; everything else is delegated here.
pub trait DnsCodec {
    type Query;
    type Response;

    fn transaction_id(&self, query: &Self::Query) -> TransactionId;

    fn encode(&self, query: &Self::Query) -> Result<Vec<u8>, QueryError>;

    /// Decodes `wire` in the context of the query it is supposed to answer
    /// (signing keys, request MAC). Malformed input is reported as
    /// [`QueryError::Decode`].
    fn decode(&self, wire: &[u8], query: &Self::Query) -> Result<Self::Response, QueryError>;

    fn is_response_to(&self, query: &Self::Query, response: &Self::Response) -> bool;
}
