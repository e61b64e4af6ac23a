use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Lifetime of a view that issues requests.
///
/// Closing the scope does not abort requests already in flight; their
/// responses are dropped when they arrive so that a closed view is never
/// updated.
#[derive(Debug, Clone, Default)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A nested scope closed together with this one.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drive `request` to completion. Returns `None` if the scope was
    /// closed by the time it settled.
    pub async fn settle<F>(&self, request: F) -> Option<F::Output>
    where
        F: Future,
    {
        let output = request.await;
        if self.is_closed() {
            tracing::debug!("Discarding response for a closed view");
            return None;
        }
        Some(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_scope_delivers() {
        let scope = ViewScope::new();
        assert_eq!(scope.settle(async { 7 }).await, Some(7));
    }

    #[tokio::test]
    async fn test_closed_mid_flight_discards_but_completes() {
        let scope = ViewScope::new();
        let closer = scope.clone();
        let (tx, rx) = tokio::sync::oneshot::channel();

        let result = scope
            .settle(async move {
                closer.close();
                tx.send("sent").ok();
                42
            })
            .await;

        assert_eq!(result, None);
        assert_eq!(rx.await.ok(), Some("sent"));
    }

    #[tokio::test]
    async fn test_child_closes_with_parent() {
        let parent = ViewScope::new();
        let child = parent.child();
        parent.close();
        assert!(child.is_closed());
        assert_eq!(child.settle(async { 1 }).await, None);
    }
}
