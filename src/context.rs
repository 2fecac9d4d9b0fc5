//! Context shared by every menu component
//!
//! Replaces a process-wide listener singleton: each tree of triggers and
//! menus is built from one `MenuContext`, and independent contexts never see
//! each other's events.

use std::fmt;
use std::sync::Arc;

use crate::events::{Document, EventBus};
use crate::layout::Size;
use crate::scheduler::{ManualScheduler, Scheduler};

/// Bus, document and scheduler handed to components at construction
#[derive(Clone)]
pub struct MenuContext {
    bus: EventBus,
    document: Document,
    scheduler: Arc<dyn Scheduler>,
}

impl fmt::Debug for MenuContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuContext")
            .field("bus", &self.bus)
            .field("document", &self.document)
            .field("scheduler", &"[Scheduler]")
            .finish()
    }
}

impl MenuContext {
    pub fn new(bus: EventBus, document: Document, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            bus,
            document,
            scheduler,
        }
    }

    /// Fresh bus and document driven by a [`ManualScheduler`]
    pub fn manual(viewport: Size) -> (Self, ManualScheduler) {
        let scheduler = ManualScheduler::new();
        let context = Self::new(
            EventBus::new(),
            Document::new(viewport),
            Arc::new(scheduler.clone()),
        );
        (context, scheduler)
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn scheduler(&self) -> &dyn Scheduler {
        self.scheduler.as_ref()
    }
}
