//! Shared context store
//!
//! Holds the auxiliary `data`/`target` of the most recent bus dispatch so that
//! item click handlers can merge it into their own data. Last write wins; the
//! contents are only meaningful synchronously after the dispatch that set them.

use std::sync::{Arc, Mutex};

use super::{BusEvent, ElementId, MenuData};
use crate::error::{lock, MenuError};

/// Copy of the store's contents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub data: MenuData,
    pub target: Option<ElementId>,
}

#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    inner: Arc<Mutex<StoreSnapshot>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Result<StoreSnapshot, MenuError> {
        Ok(lock(&self.inner, "context store")?.clone())
    }

    /// Assign the fields the event carries; absent fields keep their value
    pub(crate) fn record(&self, event: &BusEvent) -> Result<(), MenuError> {
        let mut store = lock(&self.inner, "context store")?;
        match event {
            BusEvent::Show(show) => {
                store.data = show.data.clone();
                store.target = show.target;
            }
            BusEvent::Hide(hide) => {
                if let Some(data) = &hide.data {
                    store.data = data.clone();
                }
                if let Some(target) = hide.target {
                    store.target = Some(target);
                }
            }
        }
        Ok(())
    }
}
