//! Ferrous Stub Application Layer
//!
//! The correlation engine and the protocol state machines built on it. All
//! I/O, encoding and timing is reached through the traits in [`ports`], so the
//! types here are driven by whatever event loop owns them.
pub mod correlation;
pub mod framing;
pub mod ports;
pub mod protocol;

pub use correlation::{
    CorrelationTable, Outcome, PendingRequest, QueryResult, Registration, ResponseHandle,
};
pub use framing::{encode_frame, ExtractState, FrameExtractor};
pub use protocol::{ConnectQueue, DatagramClient, FlushedRequest, StreamClient};

#[cfg(test)]
mod test_support;
