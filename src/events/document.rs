//! Global listener hub standing in for the host's document and window
//!
//! Menus attach dismissal listeners (outside click, scroll, resize, a second
//! context menu) and keyboard navigation here while they are visible. The host
//! forwards its global events through [`Document::dispatch`] after the
//! element-level handlers (triggers, menus) have seen them, so a handler that
//! stopped propagation keeps the event from reaching document listeners.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use super::{KeyboardEvent, PointerEvent, TouchEvent};
use crate::error::{lock, MenuError};
use crate::layout::Size;

/// Kinds of global events a menu can listen to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentEventKind {
    MouseDown,
    TouchStart,
    Scroll,
    ContextMenu,
    KeyDown,
    Resize,
}

/// A global event as delivered to document listeners
#[derive(Debug, Clone)]
pub enum DocumentEvent {
    MouseDown(PointerEvent),
    TouchStart(TouchEvent),
    Scroll,
    ContextMenu(PointerEvent),
    KeyDown(KeyboardEvent),
    Resize(Size),
}

impl DocumentEvent {
    pub fn kind(&self) -> DocumentEventKind {
        match self {
            DocumentEvent::MouseDown(_) => DocumentEventKind::MouseDown,
            DocumentEvent::TouchStart(_) => DocumentEventKind::TouchStart,
            DocumentEvent::Scroll => DocumentEventKind::Scroll,
            DocumentEvent::ContextMenu(_) => DocumentEventKind::ContextMenu,
            DocumentEvent::KeyDown(_) => DocumentEventKind::KeyDown,
            DocumentEvent::Resize(_) => DocumentEventKind::Resize,
        }
    }

    fn is_propagation_stopped(&self) -> bool {
        match self {
            DocumentEvent::MouseDown(e) | DocumentEvent::ContextMenu(e) => {
                e.is_propagation_stopped()
            }
            DocumentEvent::TouchStart(e) => e.is_propagation_stopped(),
            DocumentEvent::Scroll | DocumentEvent::KeyDown(_) | DocumentEvent::Resize(_) => false,
        }
    }
}

/// Document listener; identity is the allocation, so keep the `Arc` around
/// to remove it again
pub type Listener = Arc<dyn Fn(&mut DocumentEvent) + Send + Sync>;

/// Wrap a closure as a [`Listener`]
pub fn listener(f: impl Fn(&mut DocumentEvent) + Send + Sync + 'static) -> Listener {
    Arc::new(f)
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// The host's document/window: global listeners plus the viewport size
#[derive(Clone)]
pub struct Document {
    listeners: Arc<Mutex<HashMap<DocumentEventKind, Vec<Listener>>>>,
    viewport: Arc<Mutex<Size>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("listeners", &"[DocumentListeners]")
            .field("viewport", &self.viewport)
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Size::zero())
    }
}

impl Document {
    /// Create a document with the given viewport size
    pub fn new(viewport: Size) -> Self {
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
            viewport: Arc::new(Mutex::new(viewport)),
        }
    }

    /// Inner width and height of the window
    pub fn viewport(&self) -> Result<Size, MenuError> {
        Ok(*lock(&self.viewport, "viewport")?)
    }

    /// Add a listener; adding the same listener twice for a kind is a no-op
    pub fn add_listener(
        &self,
        kind: DocumentEventKind,
        listener: &Listener,
    ) -> Result<(), MenuError> {
        let mut listeners = lock(&self.listeners, "document listeners")?;
        let entry = listeners.entry(kind).or_default();
        if !entry.iter().any(|l| same_listener(l, listener)) {
            entry.push(listener.clone());
        }
        Ok(())
    }

    /// Remove a listener; unknown listeners are ignored
    pub fn remove_listener(
        &self,
        kind: DocumentEventKind,
        listener: &Listener,
    ) -> Result<(), MenuError> {
        let mut listeners = lock(&self.listeners, "document listeners")?;
        if let Some(entry) = listeners.get_mut(&kind) {
            entry.retain(|l| !same_listener(l, listener));
        }
        Ok(())
    }

    pub fn has_listener(
        &self,
        kind: DocumentEventKind,
        listener: &Listener,
    ) -> Result<bool, MenuError> {
        let listeners = lock(&self.listeners, "document listeners")?;
        Ok(listeners
            .get(&kind)
            .is_some_and(|entry| entry.iter().any(|l| same_listener(l, listener))))
    }

    pub fn listener_count(&self, kind: DocumentEventKind) -> Result<usize, MenuError> {
        let listeners = lock(&self.listeners, "document listeners")?;
        Ok(listeners.get(&kind).map_or(0, Vec::len))
    }

    /// Deliver a global event to the listeners of its kind
    ///
    /// Listeners removed by an earlier listener of the same dispatch are not
    /// called; listeners added during the dispatch wait for the next event.
    pub fn dispatch(&self, event: &mut DocumentEvent) -> Result<(), MenuError> {
        if event.is_propagation_stopped() {
            return Ok(());
        }

        let kind = event.kind();
        let snapshot: Vec<Listener> = lock(&self.listeners, "document listeners")?
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        for listener in snapshot {
            if self.has_listener(kind, &listener)? {
                listener(&mut *event);
            }
        }
        Ok(())
    }

    /// Update the viewport size and notify resize listeners
    pub fn resize(&self, viewport: Size) -> Result<(), MenuError> {
        *lock(&self.viewport, "viewport")? = viewport;
        self.dispatch(&mut DocumentEvent::Resize(viewport))
    }
}
