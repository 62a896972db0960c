//! Typed observable state containers.
//!
//! A [`Signal`] is a small publish-subscribe cell over
//! `tokio::sync::watch`: `get()`, `set()`, `update()`, `subscribe()`.
//! Auth state, the cached user, cart lines, and navigation events are all
//! published through signals so the host UI can react without the SDK
//! depending on any framework reactivity.

use std::sync::Arc;

use tokio::sync::watch;

/// A shared observable value.
///
/// Clones observe the same underlying cell. Setting a value wakes every
/// subscriber; subscribers only see the latest value (watch semantics),
/// which is the intended last-write-wins behavior for UI state.
#[derive(Debug)]
pub struct Signal<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T> Signal<T> {
    /// Create a signal holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot the current value.
    #[must_use]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.tx.borrow().clone()
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Mutate the value in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// Subscribe to changes. The receiver starts at the current value.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Default> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Apply an optimistic local mutation, dispatch a request, and roll the
/// mutation back if the request fails.
///
/// Compensating-action helper shared by features that update the UI before
/// the server confirms (e.g. wishlist toggles): snapshot the signal, apply
/// the intended change, await the request, and restore the snapshot on
/// error.
///
/// # Errors
///
/// Propagates the request's error after restoring the snapshot.
pub async fn optimistic<T, R, E, Fut>(
    signal: &Signal<T>,
    apply: impl FnOnce(&mut T),
    request: Fut,
) -> std::result::Result<R, E>
where
    T: Clone,
    Fut: Future<Output = std::result::Result<R, E>>,
{
    let snapshot = signal.get();
    signal.update(apply);

    match request.await {
        Ok(value) => Ok(value),
        Err(error) => {
            signal.set(snapshot);
            Err(error)
        }
    }
}
