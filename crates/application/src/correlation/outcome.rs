use ferrous_stub_domain::QueryError;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

pub type QueryResult<R> = Result<R, QueryError>;

/// Producer side of a query's result.
///
/// Resolves at most once; later attempts are ignored and reported as `false`.
#[derive(Debug)]
pub struct Outcome<R> {
    slot: Option<oneshot::Sender<QueryResult<R>>>,
}

impl<R> Outcome<R> {
    pub fn channel() -> (Self, ResponseHandle<R>) {
        let (tx, rx) = oneshot::channel();
        (Self { slot: Some(tx) }, ResponseHandle { rx })
    }

    pub fn resolve(&mut self, result: QueryResult<R>) -> bool {
        match self.slot.take() {
            Some(tx) => {
                // The caller may have dropped its handle; the query still counts as resolved.
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }

    pub fn succeed(&mut self, response: R) -> bool {
        self.resolve(Ok(response))
    }

    pub fn fail(&mut self, error: QueryError) -> bool {
        self.resolve(Err(error))
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.is_none()
    }
}

/// Caller side of a query's result. Await it, or poll it with [`try_result`].
///
/// [`try_result`]: ResponseHandle::try_result
#[derive(Debug)]
pub struct ResponseHandle<R> {
    rx: oneshot::Receiver<QueryResult<R>>,
}

impl<R> ResponseHandle<R> {
    /// `None` while the query is still in flight.
    ///
    /// The result is handed out once; asking again afterwards reports the
    /// query as abandoned.
    pub fn try_result(&mut self) -> Option<QueryResult<R>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(abandoned())),
        }
    }
}

impl<R> Future for ResponseHandle<R> {
    type Output = QueryResult<R>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(abandoned())))
    }
}

fn abandoned() -> QueryError {
    QueryError::ConnectionLost("client dropped before the query completed".to_string())
}
