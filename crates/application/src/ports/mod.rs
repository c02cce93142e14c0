mod codec;
mod scheduler;
mod transport;

pub use codec::DnsCodec;
pub use scheduler::{Scheduler, TimerHandle, TimerTag};
pub use transport::{DnsTransport, StreamConnector};

// Re-export for convenience
pub use ferrous_stub_domain::{QueryError, TransactionId};
