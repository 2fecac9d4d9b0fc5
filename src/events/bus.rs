//! Event bus connecting triggers to menus
//!
//! Every mounted menu, submenu and adapter registers a show and a hide
//! callback. A dispatch fans out to all of them synchronously; each listener
//! filters by menu id itself. Listeners may (un)register and dispatch again
//! from inside a callback: the bus never holds its lock while calling out.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::{BusEvent, ContextStore, HideEvent, ShowEvent};
use crate::error::{lock, MenuError};

/// Handle returned by [`EventBus::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

type ShowCallback = Arc<dyn Fn(&ShowEvent) + Send + Sync>;
type HideCallback = Arc<dyn Fn(&HideEvent) + Send + Sync>;

#[derive(Clone)]
struct Registration {
    show: ShowCallback,
    hide: HideCallback,
}

/// Publish/subscribe hub for show and hide notifications
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<Mutex<HashMap<RegistrationId, Registration>>>,
    next_id: Arc<AtomicU64>,
    store: ContextStore,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count().unwrap_or(0))
            .field("store", &self.store)
            .finish()
    }
}

impl EventBus {
    /// Create a new, empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// The context store written on every dispatch
    pub fn store(&self) -> &ContextStore {
        &self.store
    }

    /// Register a pair of callbacks and return their registration id
    pub fn register(
        &self,
        on_show: impl Fn(&ShowEvent) + Send + Sync + 'static,
        on_hide: impl Fn(&HideEvent) + Send + Sync + 'static,
    ) -> Result<RegistrationId, MenuError> {
        let id = RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let registration = Registration {
            show: Arc::new(on_show),
            hide: Arc::new(on_hide),
        };

        lock(&self.listeners, "bus listeners")?.insert(id, registration);
        log::trace!("registered {id}");
        Ok(id)
    }

    /// Remove a registration; unknown ids are ignored
    pub fn unregister(&self, id: RegistrationId) -> Result<(), MenuError> {
        if lock(&self.listeners, "bus listeners")?.remove(&id).is_some() {
            log::trace!("unregistered {id}");
        }
        Ok(())
    }

    pub fn listener_count(&self) -> Result<usize, MenuError> {
        Ok(lock(&self.listeners, "bus listeners")?.len())
    }

    /// Notify every registered callback of the matching kind
    ///
    /// Callbacks registered during the dispatch are not called; callbacks
    /// removed during the dispatch are skipped if not yet reached.
    pub fn dispatch(&self, event: &BusEvent) -> Result<(), MenuError> {
        self.store.record(event)?;

        let ids: Vec<RegistrationId> = lock(&self.listeners, "bus listeners")?
            .keys()
            .copied()
            .collect();
        log::trace!("dispatching {:?} to {} listeners", event, ids.len());

        for id in ids {
            let registration = lock(&self.listeners, "bus listeners")?.get(&id).cloned();
            let Some(registration) = registration else {
                continue;
            };
            match event {
                BusEvent::Show(show) => (registration.show)(show),
                BusEvent::Hide(hide) => (registration.hide)(hide),
            }
        }
        Ok(())
    }

    /// Publish a show event
    pub fn show_menu(&self, event: ShowEvent) -> Result<(), MenuError> {
        self.dispatch(&BusEvent::Show(event))
    }

    /// Publish a hide event
    pub fn hide_menu(&self, event: HideEvent) -> Result<(), MenuError> {
        self.dispatch(&BusEvent::Hide(event))
    }

    /// Publish an unscoped hide, closing every menu
    pub fn hide_all(&self) -> Result<(), MenuError> {
        self.hide_menu(HideEvent::all())
    }
}
