//! Event system for Orbit context menus
//!
//! The event system provides:
//! - Host input events (pointer, touch, keyboard) forwarded by the rendering layer
//! - Show/hide payloads exchanged between triggers and menus
//! - The event bus fanning those payloads out to every mounted menu
//! - The document hub through which menus attach global dismissal listeners

pub mod bus;
pub mod document;
pub mod payload;
pub mod store;

pub use bus::{EventBus, RegistrationId};
pub use document::{Document, DocumentEvent, DocumentEventKind, Listener};
pub use payload::{BusEvent, HideDetail, HideEvent, MenuData, MenuId, ShowEvent};
pub use store::{ContextStore, StoreSnapshot};

use serde::{Deserialize, Serialize};

use crate::layout::Point;

/// Opaque reference to an element owned by the rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

/// Mouse button types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Middle mouse button (scroll wheel)
    Middle,
    /// Right mouse button
    #[default]
    Right,
    /// Any other button, by its numeric index
    Other(u16),
}

impl MouseButton {
    /// Numeric button index as reported by pointer events (0 = left, 2 = right)
    pub fn index(self) -> u16 {
        match self {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
            MouseButton::Other(n) => n,
        }
    }
}

impl From<u16> for MouseButton {
    fn from(index: u16) -> Self {
        match index {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            n => MouseButton::Other(n),
        }
    }
}

impl From<MouseButton> for u16 {
    fn from(button: MouseButton) -> Self {
        button.index()
    }
}

/// Modifier keys held during an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Mouse event containing position and button information
#[derive(Debug, Clone, Default)]
pub struct PointerEvent {
    /// Position in client coordinates
    pub position: Point,
    /// Which mouse button was involved
    pub button: MouseButton,
    /// Modifier keys
    pub modifiers: Modifiers,
    /// Element the event was dispatched on
    pub target: Option<ElementId>,
    /// Native `detail` field (click count for mouse events)
    pub detail: i64,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl PointerEvent {
    pub fn new(position: Point, button: MouseButton) -> Self {
        Self {
            position,
            button,
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: ElementId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Touch point in page coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub id: u64,
    pub x: f32,
    pub y: f32,
}

/// Touch event
#[derive(Debug, Clone, Default)]
pub struct TouchEvent {
    pub touches: Vec<Touch>,
    pub modifiers: Modifiers,
    pub target: Option<ElementId>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl TouchEvent {
    pub fn new(touches: Vec<Touch>) -> Self {
        Self {
            touches,
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: ElementId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Keys the menus react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowUp,
    ArrowRight,
    ArrowDown,
    Escape,
    Enter,
    Other(String),
}

impl Key {
    /// Map a legacy `keyCode`
    pub fn from_key_code(code: u32) -> Self {
        match code {
            37 => Key::ArrowLeft,
            38 => Key::ArrowUp,
            39 => Key::ArrowRight,
            40 => Key::ArrowDown,
            27 => Key::Escape,
            13 => Key::Enter,
            other => Key::Other(other.to_string()),
        }
    }
}

/// Key down event
#[derive(Debug, Clone)]
pub struct KeyboardEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    default_prevented: bool,
}

impl KeyboardEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}
