//! Menu tree description and its rendered, annotated form
//!
//! A menu's children are described as an immutable [`MenuNode`] tree. The
//! navigator turns that tree plus its own state into [`RenderChild`]ren, the
//! same tree annotated with selection flags and the callbacks the rendering
//! layer must wire to each element.

use std::fmt;
use std::sync::Arc;

use crate::callback::Callback;
use crate::error::{report, MenuError};
use crate::events::{document::Listener, ElementId, EventBus, MenuData, PointerEvent, TouchEvent};
use crate::menu::submenu::SubMenu;

/// Identity of one child within its menu
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey(String);

impl ItemKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle on the element behind the selected child, used by Enter
///
/// The rendering layer registers one for the selected child through
/// [`RenderItem::register_activation`].
pub trait ActivationHandle: Send + Sync {
    /// Whether the element can be activated at all
    fn is_activatable(&self) -> bool {
        true
    }

    /// Simulate a click on the element
    fn activate(&self);
}

/// What caused an item click
#[derive(Debug, Clone)]
pub enum ClickSource {
    Pointer(PointerEvent),
    Touch(TouchEvent),
    /// Enter pressed on the selected item
    Keyboard,
}

/// Arguments of an item's `on_click`
#[derive(Debug, Clone)]
pub struct ItemClick {
    pub source: ClickSource,
    /// Item data merged with the data of the last bus dispatch
    pub data: MenuData,
    /// Trigger element of the last bus dispatch
    pub target: Option<ElementId>,
}

/// A leaf menu entry
#[derive(Debug, Clone)]
pub struct MenuItem {
    pub key: ItemKey,
    pub disabled: bool,
    pub divider: bool,
    /// Keep the menu open after a click
    pub prevent_close: bool,
    pub data: MenuData,
    pub on_click: Option<Callback<ItemClick>>,
}

impl MenuItem {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: ItemKey::new(key),
            disabled: false,
            divider: false,
            prevent_close: false,
            data: MenuData::default(),
            on_click: None,
        }
    }

    /// A separator line; never selectable or clickable
    pub fn divider(key: impl Into<String>) -> Self {
        Self {
            divider: true,
            ..Self::new(key)
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn prevent_close(mut self, prevent_close: bool) -> Self {
        self.prevent_close = prevent_close;
        self
    }

    pub fn with_data(mut self, data: MenuData) -> Self {
        self.data = data;
        self
    }

    pub fn on_click(mut self, handler: impl Fn(ItemClick) + Send + Sync + 'static) -> Self {
        self.on_click = Some(Callback::new(handler));
        self
    }

    /// Mouse click on the item element
    pub fn handle_click(&self, bus: &EventBus, event: &mut PointerEvent) -> Result<(), MenuError> {
        if event.button.index() > 1 {
            event.prevent_default();
        }
        self.fire(bus, ClickSource::Pointer(event.clone()))
    }

    /// Touch end on the item element
    pub fn handle_touch_end(&self, bus: &EventBus, event: &TouchEvent) -> Result<(), MenuError> {
        self.fire(bus, ClickSource::Touch(event.clone()))
    }

    fn fire(&self, bus: &EventBus, source: ClickSource) -> Result<(), MenuError> {
        if self.disabled || self.divider {
            return Ok(());
        }

        if let Some(on_click) = &self.on_click {
            let store = bus.store().snapshot()?;
            on_click.call(ItemClick {
                source,
                data: self.data.merge(&store.data),
                target: store.target,
            });
        }

        if self.prevent_close {
            return Ok(());
        }
        bus.hide_all()
    }

    /// Activation handle performing this item's click
    pub fn activation(&self, bus: &EventBus) -> Arc<dyn ActivationHandle> {
        Arc::new(ItemActivation {
            item: self.clone(),
            bus: bus.clone(),
        })
    }
}

struct ItemActivation {
    item: MenuItem,
    bus: EventBus,
}

impl ActivationHandle for ItemActivation {
    fn is_activatable(&self) -> bool {
        !self.item.divider
    }

    fn activate(&self) {
        report(
            "menu item activation",
            self.item.fire(&self.bus, ClickSource::Keyboard),
        );
    }
}

/// A child of a menu
#[derive(Debug, Clone)]
pub enum MenuNode {
    Item(MenuItem),
    SubMenu(SubMenu),
    /// Non-item container; its children belong to the enclosing menu
    Wrapper(Vec<MenuNode>),
    /// Conditionally absent child
    Empty,
}

impl MenuNode {
    /// Key of an item or submenu
    pub fn key(&self) -> Option<&ItemKey> {
        match self {
            MenuNode::Item(item) => Some(&item.key),
            MenuNode::SubMenu(submenu) => Some(submenu.key()),
            MenuNode::Wrapper(_) | MenuNode::Empty => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        match self {
            MenuNode::Item(item) => item.disabled,
            MenuNode::SubMenu(submenu) => submenu.is_disabled(),
            MenuNode::Wrapper(_) | MenuNode::Empty => false,
        }
    }

    pub fn is_divider(&self) -> bool {
        matches!(self, MenuNode::Item(item) if item.divider)
    }
}

impl From<MenuItem> for MenuNode {
    fn from(item: MenuItem) -> Self {
        MenuNode::Item(item)
    }
}

impl From<SubMenu> for MenuNode {
    fn from(submenu: SubMenu) -> Self {
        MenuNode::SubMenu(submenu)
    }
}

/// Callback through which the rendering layer hands over the selected
/// element's activation handle (or `None` when the element goes away)
pub type ActivationRegistrar = Callback<Option<Arc<dyn ActivationHandle>>>;

/// What a submenu receives from its parent menu on every render
#[derive(Clone)]
pub struct SubMenuBinding {
    pub selected: bool,
    /// Open regardless of hover timers
    pub force_open: bool,
    /// Ask the parent to drop `force_open`
    pub force_close: Callback<()>,
    /// The parent's keyboard handler, handed back when the submenu closes
    pub parent_key_handler: Listener,
    /// Whether the parent may take keyboard focus back right now
    pub may_restore_parent: Callback<(), bool>,
}

impl fmt::Debug for SubMenuBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubMenuBinding")
            .field("selected", &self.selected)
            .field("force_open", &self.force_open)
            .finish_non_exhaustive()
    }
}

/// A rendered item
#[derive(Debug, Clone)]
pub struct RenderItem {
    pub item: MenuItem,
    pub selected: bool,
    pub on_mouse_leave: Callback<()>,
    /// Only set on selectable children that are not selected yet
    pub on_mouse_move: Option<Callback<()>>,
    /// Only set on the selected child
    pub register_activation: Option<ActivationRegistrar>,
}

/// A rendered submenu
#[derive(Debug, Clone)]
pub struct RenderSubMenu {
    pub submenu: SubMenu,
    pub binding: SubMenuBinding,
    pub on_mouse_leave: Callback<()>,
    pub on_mouse_move: Option<Callback<()>>,
    pub register_activation: Option<ActivationRegistrar>,
}

/// A menu child annotated for rendering
#[derive(Debug, Clone)]
pub enum RenderChild {
    Item(RenderItem),
    SubMenu(RenderSubMenu),
    Wrapper(Vec<RenderChild>),
    Empty,
}

impl RenderChild {
    /// Depth-first list of the rendered items and submenus
    pub fn flatten(children: &[RenderChild]) -> Vec<&RenderChild> {
        let mut out = Vec::new();
        for child in children {
            match child {
                RenderChild::Wrapper(inner) => out.extend(Self::flatten(inner)),
                RenderChild::Empty => {}
                other => out.push(other),
            }
        }
        out
    }

    pub fn key(&self) -> Option<&ItemKey> {
        match self {
            RenderChild::Item(item) => Some(&item.item.key),
            RenderChild::SubMenu(submenu) => Some(submenu.submenu.key()),
            RenderChild::Wrapper(_) | RenderChild::Empty => None,
        }
    }

    pub fn is_selected(&self) -> bool {
        match self {
            RenderChild::Item(item) => item.selected,
            RenderChild::SubMenu(submenu) => submenu.binding.selected,
            RenderChild::Wrapper(_) | RenderChild::Empty => false,
        }
    }
}
