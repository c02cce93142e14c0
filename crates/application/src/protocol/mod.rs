mod connect_queue;
mod datagram;
mod stream;

pub use connect_queue::{ConnectQueue, FlushedRequest};
pub use datagram::DatagramClient;
pub use stream::StreamClient;

use crate::correlation::{CorrelationTable, Outcome};
use crate::ports::{DnsCodec, DnsTransport, Scheduler};
use bytes::Bytes;
use ferrous_stub_domain::QueryError;
use std::time::Duration;
use tracing::{debug, warn};

type Table<C, S> = CorrelationTable<
    <C as DnsCodec>::Query,
    <C as DnsCodec>::Response,
    <S as Scheduler>::Handle,
>;

/// Encodes, registers and writes one query.
///
/// `frame` turns the encoded message into what goes on the wire. A write
/// failure removes the entry again and fails only this query.
#[allow(clippy::too_many_arguments)]
fn issue<C, T, S, F>(
    codec: &C,
    scheduler: &S,
    table: &mut Table<C, S>,
    transport: &mut T,
    query: C::Query,
    mut outcome: Outcome<C::Response>,
    timeout: Option<Duration>,
    frame: F,
) where
    C: DnsCodec,
    T: DnsTransport,
    S: Scheduler,
    F: FnOnce(Vec<u8>) -> Result<Bytes, QueryError>,
{
    let id = codec.transaction_id(&query);
    let wire = match codec.encode(&query).and_then(frame) {
        Ok(wire) => wire,
        Err(e) => {
            warn!(transaction_id = %id, error = %e, "Failed to encode query");
            outcome.fail(e);
            return;
        }
    };

    if !table
        .register(scheduler, id, query, outcome, timeout)
        .is_registered()
    {
        return;
    }

    let len = wire.len();
    match transport.write(wire) {
        Ok(()) => debug!(transaction_id = %id, bytes = len, "Query sent"),
        Err(e) => {
            warn!(transaction_id = %id, error = %e, "Failed to write query");
            table.abort(id, e);
        }
    }
}
