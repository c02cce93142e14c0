use bytes::Bytes;
use ferrous_stub_domain::{QueryError, UpstreamEndpoint};

/// Outbound half of a connection.
///
/// `write` must not block: implementations hand the bytes to the socket or to
/// a writer task and return.
pub trait DnsTransport {
    fn write(&mut self, wire: Bytes) -> Result<(), QueryError>;

    fn close(&mut self);
}

/// Starts a stream connection.
///
/// Completion is reported back to the owning client as a separate event
/// (`connection_made` or `connection_lost`), never through the return value.
pub trait StreamConnector {
    fn connect(&mut self, endpoint: &UpstreamEndpoint);
}
