use std::future::Future;

/// An in-memory value updated optimistically: a change is applied first,
/// then persisted, and rolled back to the prior snapshot if either step fails.
#[derive(Debug, Clone, Default)]
pub struct Transactional<T: Clone> {
    value: T,
}

impl<T: Clone> Transactional<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Replace without persisting, e.g. after loading from storage.
    pub fn replace(&mut self, value: T) {
        self.value = value;
    }

    pub async fn commit<R, E, A, P, Fut>(&mut self, apply: A, persist: P) -> Result<R, E>
    where
        A: FnOnce(&mut T) -> Result<R, E>,
        P: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let snapshot = self.value.clone();

        let output = match apply(&mut self.value) {
            Ok(output) => output,
            Err(err) => {
                self.value = snapshot;
                return Err(err);
            }
        };

        if let Err(err) = persist(self.value.clone()).await {
            self.value = snapshot;
            return Err(err);
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn successful_commit_keeps_change() {
        let mut value = Transactional::new(vec![1]);
        let pushed = value
            .commit(
                |v| {
                    v.push(2);
                    Ok::<_, String>(v.len())
                },
                |_| async { Ok(()) },
            )
            .await
            .unwrap();
        assert_eq!(pushed, 2);
        assert_eq!(value.get(), &vec![1, 2]);
    }

    #[tokio::test]
    async fn persist_failure_restores_snapshot() {
        let mut value = Transactional::new(vec![1]);
        let result = value
            .commit(
                |v| {
                    v.clear();
                    Ok(())
                },
                |_| async { Err("disk full".to_string()) },
            )
            .await;
        assert_eq!(result, Err("disk full".to_string()));
        assert_eq!(value.get(), &vec![1]);
    }

    #[tokio::test]
    async fn apply_failure_restores_partial_change() {
        let mut value = Transactional::new(vec![1]);
        let result: Result<(), String> = value
            .commit(
                |v| {
                    v.push(99);
                    Err("rejected".into())
                },
                |_| async { panic!("persist must not run") },
            )
            .await;
        assert!(result.is_err());
        assert_eq!(value.get(), &vec![1]);
    }
}
