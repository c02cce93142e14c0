pub mod codec;
pub mod scheduler;
pub mod transport;

pub use codec::{HickoryCodec, MessageBuilder};
pub use scheduler::{TokioScheduler, TokioTimer};
pub use transport::{create_client, DnsClient, TcpDnsClient, UdpDnsClient};
