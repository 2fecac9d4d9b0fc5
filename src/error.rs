//! Error types for menu operations

use std::sync::{Mutex, MutexGuard};

/// Errors that can occur while coordinating menus
#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    /// A shared lock was poisoned by a panicking holder
    #[error("Lock error: {0} is poisoned")]
    LockPoisoned(&'static str),

    /// The component is already subscribed to the bus
    #[error("Component already mounted: {0}")]
    AlreadyMounted(String),

    /// The component was never mounted, or was already unmounted
    #[error("Component not mounted: {0}")]
    NotMounted(String),

    /// Props or payloads could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Lock a mutex, turning poisoning into a [`MenuError`]
pub(crate) fn lock<'a, T>(
    mutex: &'a Mutex<T>,
    what: &'static str,
) -> Result<MutexGuard<'a, T>, MenuError> {
    mutex.lock().map_err(|_| MenuError::LockPoisoned(what))
}

/// Log an error raised inside a callback that has nowhere to propagate it
pub(crate) fn report(origin: &str, result: Result<(), MenuError>) {
    if let Err(e) = result {
        log::error!("{origin}: {e}");
    }
}
