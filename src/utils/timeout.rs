use std::future::Future;
use std::time::Duration;

/// Outcome of racing an operation against a timer.
#[derive(Debug)]
pub enum Raced<T> {
    Completed(T),
    TimedOut,
}

/// Race `fut` against `limit`. The losing future is dropped, so nothing it
/// would have done after its last await point happens.
pub async fn race<F, T>(limit: Duration, fut: F) -> Raced<T>
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(value) => Raced::Completed(value),
        Err(_) => Raced::TimedOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fast_operation_completes() {
        let raced = race(Duration::from_millis(200), async { 7 }).await;
        assert!(matches!(raced, Raced::Completed(7)));
    }

    #[tokio::test]
    async fn slow_operation_times_out() {
        let raced = race(Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            7
        })
        .await;
        assert!(matches!(raced, Raced::TimedOut));
    }
}
