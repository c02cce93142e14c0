use super::MessageBuilder;
use ferrous_stub_application::ports::DnsCodec;
use ferrous_stub_domain::{QueryError, TransactionId};
use hickory_proto::op::{Message, MessageType};

/// [`DnsCodec`] over hickory-proto messages.
///
/// A message answers a query when it is a response carrying the same id,
/// opcode and question section.
#[derive(Debug, Clone, Copy, Default)]
pub struct HickoryCodec;

impl HickoryCodec {
    pub fn new() -> Self {
        Self
    }
}

impl DnsCodec for HickoryCodec {
    type Query = Message;
    type Response = Message;

    fn transaction_id(&self, query: &Message) -> TransactionId {
        TransactionId::new(query.id())
    }

    fn encode(&self, query: &Message) -> Result<Vec<u8>, QueryError> {
        MessageBuilder::to_wire(query)
    }

    fn decode(&self, wire: &[u8], _query: &Message) -> Result<Message, QueryError> {
        Message::from_vec(wire).map_err(|e| QueryError::Decode(e.to_string()))
    }

    fn is_response_to(&self, query: &Message, response: &Message) -> bool {
        response.message_type() == MessageType::Response
            && response.id() == query.id()
            && response.op_code() == query.op_code()
            && response.queries() == query.queries()
    }
}
