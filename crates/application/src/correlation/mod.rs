mod outcome;
mod pending;
mod table;

pub use outcome::{Outcome, QueryResult, ResponseHandle};
pub use pending::PendingRequest;
pub use table::{CorrelationTable, Registration};
