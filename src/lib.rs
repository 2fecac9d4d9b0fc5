// Headless nested context menus for the Orbit UI Framework
pub mod callback;
pub mod connect;
pub mod context;
pub mod error;
pub mod events;
pub mod layout;
pub mod menu;
pub mod scheduler;
pub mod trigger;

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors that can occur while coordinating menus
pub type Error = error::MenuError;

/// Re-export of common types for convenience
pub mod prelude {
    pub use crate::callback::{callback, Callback};
    pub use crate::connect::MenuConnection;
    pub use crate::context::MenuContext;
    pub use crate::error::MenuError;
    pub use crate::events::{
        Document, DocumentEvent, DocumentEventKind, ElementId, EventBus, HideDetail, HideEvent,
        Key, KeyboardEvent, MenuData, MenuId, Modifiers, MouseButton, PointerEvent, ShowEvent,
        Touch, TouchEvent,
    };
    pub use crate::layout::{Point, Rect, Size};
    pub use crate::menu::{
        ActivationHandle, ContextMenu, ContextMenuProps, MenuItem, MenuNode, MenuStyle,
        MenuSurface, RenderChild, SubMenu, SubMenuAnchor, SubMenuProps, SubMenuSurface,
    };
    pub use crate::scheduler::{ManualScheduler, Scheduler, TaskHandle};
    pub use crate::trigger::{Collected, ContextMenuTrigger, TriggerProps};
}
