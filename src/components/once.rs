//! Init-once holder for lazily created shared resources.

use std::future::Future;

use tokio::sync::OnceCell;

/// A resource created on first use and shared afterwards.
///
/// Concurrent first callers race to one initialization; the others wait
/// for it. A failed initialization leaves the holder empty so a later call
/// can try again.
#[derive(Debug)]
pub struct OnceResource<T> {
    name: &'static str,
    cell: OnceCell<T>,
}

impl<T> OnceResource<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceCell::new(),
        }
    }

    pub async fn get_or_try_init<F, Fut, E>(&self, init: F) -> Result<&T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.cell
            .get_or_try_init(move || async move {
                tracing::debug!(resource = self.name, "Initializing shared resource");
                init().await
            })
            .await
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
