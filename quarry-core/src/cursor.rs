use crate::{
    Result,
    stream::{Stream, StreamExt},
};
use std::{
    fmt::{self, Debug},
    pin::Pin,
    task::{Context, Poll},
};

/// Lazy, forward-only sequence of results pulled from an executor.
///
/// The underlying request is released when the cursor is dropped or closed, a cursor cannot be
/// restarted.
pub struct Cursor<'e, T> {
    stream: Option<Pin<Box<dyn Stream<Item = Result<T>> + Send + 'e>>>,
}

impl<'e, T> Cursor<'e, T> {
    pub fn new(stream: impl Stream<Item = Result<T>> + Send + 'e) -> Self {
        Self {
            stream: Some(Box::pin(stream)),
        }
    }

    /// Stop pulling and release the subscription.
    pub fn close(&mut self) {
        self.stream = None;
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Pull the next element, `None` once the sequence ended or the cursor was closed.
    pub async fn next_item(&mut self) -> Option<Result<T>> {
        self.next().await
    }

    /// Pull every remaining element, stops at the first error.
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut result = Vec::new();
        while let Some(v) = self.next().await {
            result.push(v?);
        }
        Ok(result)
    }
}

impl<T> Stream for Cursor<'_, T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(stream) = self.stream.as_mut() else {
            return Poll::Ready(None);
        };
        let polled = stream.as_mut().poll_next(cx);
        if let Poll::Ready(None) = polled {
            self.stream = None;
        }
        polled
    }
}

impl<T> Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("closed", &self.is_closed())
            .finish()
    }
}
