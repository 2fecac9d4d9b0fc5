//! Selection and keyboard state machine shared by menus and submenus
//!
//! A [`Navigator`] owns a menu's children and a selection cursor over the
//! selectable ones (items and submenus that are not dividers, found through
//! any number of wrappers). Keyboard and pointer input move the cursor;
//! after every change the navigator re-renders its children and pushes the
//! resulting [`SubMenuBinding`]s down to its submenus.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use crate::callback::Callback;
use crate::error::{lock, report, MenuError};
use crate::events::document::{listener, DocumentEvent, Listener};
use crate::events::{Key, KeyboardEvent};
use crate::menu::node::{
    ActivationHandle, ItemKey, MenuNode, RenderChild, RenderItem, RenderSubMenu, SubMenuBinding,
};
use crate::menu::submenu::SubMenu;

/// The component a navigator belongs to
pub(crate) trait MenuOwner: Send + Sync {
    /// Whether the owning menu is currently shown
    fn is_active(&self) -> bool;

    /// Whether key events must be ignored while the owner is inactive
    fn guards_keys(&self) -> bool;

    /// Left/Escape, or Enter without anything to activate
    fn request_hide(&self, event: &mut KeyboardEvent);
}

/// Selection cursor of one menu
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub selected: Option<ItemKey>,
    /// Open the selected submenu without hovering it
    pub force_submenu_open: bool,
}

/// A child the cursor can land on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectable {
    pub key: ItemKey,
    pub disabled: bool,
    pub submenu: bool,
}

/// Selectable children in document order, descending into wrappers and
/// skipping empty children and dividers
pub fn collect_selectable(children: &[MenuNode]) -> Vec<Selectable> {
    let mut out = Vec::new();
    collect_into(children, &mut out);
    out
}

fn collect_into(children: &[MenuNode], out: &mut Vec<Selectable>) {
    for child in children {
        match child {
            MenuNode::Empty => {}
            MenuNode::Wrapper(inner) => collect_into(inner, out),
            MenuNode::Item(item) if item.divider => {}
            MenuNode::Item(item) => out.push(Selectable {
                key: item.key.clone(),
                disabled: item.disabled,
                submenu: false,
            }),
            MenuNode::SubMenu(submenu) => out.push(Selectable {
                key: submenu.key().clone(),
                disabled: submenu.is_disabled(),
                submenu: true,
            }),
        }
    }
}

/// Next enabled index stepping up or down from `current` with wrap-around
///
/// Returns `None` when every entry is disabled or the scan comes back to
/// `current` without finding another enabled entry.
pub fn next_enabled_index(
    current: Option<usize>,
    disabled: &[bool],
    upward: bool,
) -> Option<usize> {
    let len = disabled.len() as isize;
    if disabled.iter().all(|d| *d) {
        return None;
    }

    let start = current.map_or(-1, |c| c as isize);
    let mut i = start;
    for _ in 0..len {
        i += if upward { -1 } else { 1 };
        if i < 0 {
            i = len - 1;
        } else if i >= len {
            i = 0;
        }
        if i == start {
            return None;
        }
        if !disabled[i as usize] {
            return Some(i as usize);
        }
    }
    None
}

fn find_node<'a>(children: &'a [MenuNode], key: &ItemKey) -> Option<&'a MenuNode> {
    children.iter().find_map(|child| match child {
        MenuNode::Wrapper(inner) => find_node(inner, key),
        node if node.key() == Some(key) && !node.is_divider() => Some(node),
        _ => None,
    })
}

fn collect_submenus(children: &[MenuNode], out: &mut Vec<SubMenu>) {
    for child in children {
        match child {
            MenuNode::SubMenu(submenu) => out.push(submenu.clone()),
            MenuNode::Wrapper(inner) => collect_submenus(inner, out),
            MenuNode::Item(_) | MenuNode::Empty => {}
        }
    }
}

/// Callbacks the render transform attaches to children
#[derive(Clone)]
pub struct RenderHooks {
    pub on_mouse_leave: Callback<()>,
    pub on_mouse_move: Callback<ItemKey>,
    pub register_activation: Callback<(ItemKey, Option<Arc<dyn ActivationHandle>>)>,
    pub force_close: Callback<()>,
    pub parent_key_handler: Listener,
    pub may_restore_parent: Callback<ItemKey, bool>,
}

/// Annotate `children` for rendering
///
/// Every item and submenu gets the mouse-leave hook; the ones that are not
/// selected get a mouse-move hook selecting them, the selected one gets the
/// activation registrar instead. Submenus also get their binding.
pub fn render_children(
    children: &[MenuNode],
    state: &NavigationState,
    hooks: &RenderHooks,
) -> Vec<RenderChild> {
    children
        .iter()
        .map(|child| match child {
            MenuNode::Empty => RenderChild::Empty,
            MenuNode::Wrapper(inner) => RenderChild::Wrapper(render_children(inner, state, hooks)),
            MenuNode::Item(item) => {
                let selected = !item.divider && state.selected.as_ref() == Some(&item.key);
                let (on_mouse_move, register_activation) = if item.divider {
                    (None, None)
                } else {
                    pointer_hooks(&item.key, selected, hooks)
                };
                RenderChild::Item(RenderItem {
                    item: item.clone(),
                    selected,
                    on_mouse_leave: hooks.on_mouse_leave.clone(),
                    on_mouse_move,
                    register_activation,
                })
            }
            MenuNode::SubMenu(submenu) => {
                let key = submenu.key();
                let selected = state.selected.as_ref() == Some(key);
                let (on_mouse_move, register_activation) = pointer_hooks(key, selected, hooks);
                let may_restore = hooks.may_restore_parent.clone();
                let own_key = key.clone();
                RenderChild::SubMenu(RenderSubMenu {
                    submenu: submenu.clone(),
                    binding: SubMenuBinding {
                        selected,
                        force_open: selected && state.force_submenu_open,
                        force_close: hooks.force_close.clone(),
                        parent_key_handler: hooks.parent_key_handler.clone(),
                        may_restore_parent: Callback::new(move |()| {
                            may_restore.call(own_key.clone())
                        }),
                    },
                    on_mouse_leave: hooks.on_mouse_leave.clone(),
                    on_mouse_move,
                    register_activation,
                })
            }
        })
        .collect()
}

type PointerHooks = (
    Option<Callback<()>>,
    Option<Callback<Option<Arc<dyn ActivationHandle>>>>,
);

fn pointer_hooks(key: &ItemKey, selected: bool, hooks: &RenderHooks) -> PointerHooks {
    let key = key.clone();
    if selected {
        let register = hooks.register_activation.clone();
        (None, Some(Callback::new(move |handle| register.call((key.clone(), handle)))))
    } else {
        let on_move = hooks.on_mouse_move.clone();
        (Some(Callback::new(move |()| on_move.call(key.clone()))), None)
    }
}

#[derive(Default)]
struct NavigatorState {
    nav: NavigationState,
    activation: Option<(ItemKey, Arc<dyn ActivationHandle>)>,
}

impl NavigatorState {
    fn select(&mut self, key: Option<ItemKey>) -> bool {
        let changed = self.nav.selected != key || self.nav.force_submenu_open;
        if self.nav.selected != key {
            self.activation = None;
        }
        self.nav.selected = key;
        self.nav.force_submenu_open = false;
        changed
    }
}

/// Selection cursor and keyboard handler of one menu
pub struct Navigator {
    owner: Weak<dyn MenuOwner>,
    children: Mutex<Vec<MenuNode>>,
    state: Mutex<NavigatorState>,
    key_listener: Listener,
    self_ref: Weak<Navigator>,
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("state", &self.state().ok())
            .finish_non_exhaustive()
    }
}

impl Navigator {
    pub(crate) fn new(owner: Weak<dyn MenuOwner>, children: Vec<MenuNode>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Navigator>| {
            let nav = weak.clone();
            let key_listener = listener(move |event| {
                if let DocumentEvent::KeyDown(key_event) = event {
                    if let Some(nav) = nav.upgrade() {
                        report("keyboard navigation", nav.handle_key(key_event));
                    }
                }
            });
            Self {
                owner,
                children: Mutex::new(children),
                state: Mutex::new(NavigatorState::default()),
                key_listener,
                self_ref: weak.clone(),
            }
        })
    }

    /// Document keydown listener driving this navigator
    pub fn key_listener(&self) -> Listener {
        self.key_listener.clone()
    }

    pub fn state(&self) -> Result<NavigationState, MenuError> {
        Ok(lock(&self.state, "navigation state")?.nav.clone())
    }

    pub fn selected(&self) -> Result<Option<ItemKey>, MenuError> {
        Ok(self.state()?.selected)
    }

    pub fn children(&self) -> Result<Vec<MenuNode>, MenuError> {
        Ok(lock(&self.children, "menu children")?.clone())
    }

    /// Replace the children, as a re-render with new content would
    pub fn set_children(&self, children: Vec<MenuNode>) -> Result<(), MenuError> {
        *lock(&self.children, "menu children")? = children;
        self.sync_submenus()
    }

    /// Submenus among the children, in document order
    pub fn submenus(&self) -> Result<Vec<SubMenu>, MenuError> {
        let mut out = Vec::new();
        collect_submenus(&lock(&self.children, "menu children")?, &mut out);
        Ok(out)
    }

    /// Handle a key press while this navigator owns the keyboard
    pub fn handle_key(&self, event: &mut KeyboardEvent) -> Result<(), MenuError> {
        let Some(owner) = self.owner.upgrade() else {
            return Ok(());
        };
        if owner.guards_keys() && !owner.is_active() {
            return Ok(());
        }

        let key = event.key.clone();
        match key {
            Key::ArrowLeft | Key::Escape => {
                event.prevent_default();
                owner.request_hide(event);
            }
            Key::ArrowUp => {
                event.prevent_default();
                self.select_adjacent(true)?;
            }
            Key::ArrowDown => {
                event.prevent_default();
                self.select_adjacent(false)?;
            }
            Key::ArrowRight => {
                self.try_open_submenu(event)?;
            }
            Key::Enter => {
                event.prevent_default();
                self.try_open_submenu(event)?;

                let children = self.children()?;
                let (disabled, handle) = {
                    let state = lock(&self.state, "navigation state")?;
                    let disabled = state
                        .nav
                        .selected
                        .as_ref()
                        .and_then(|key| find_node(&children, key))
                        .is_some_and(MenuNode::is_disabled);
                    let handle = state.activation.as_ref().map(|(_, h)| h.clone());
                    (disabled, handle)
                };

                match handle {
                    Some(handle) if !disabled && handle.is_activatable() => handle.activate(),
                    _ => owner.request_hide(event),
                }
            }
            Key::Other(_) => {}
        }
        Ok(())
    }

    /// Open the selected child if it is a submenu; returns whether it was
    fn try_open_submenu(&self, event: &mut KeyboardEvent) -> Result<bool, MenuError> {
        let children = self.children()?;
        {
            let mut state = lock(&self.state, "navigation state")?;
            let is_submenu = state
                .nav
                .selected
                .as_ref()
                .and_then(|key| find_node(&children, key))
                .is_some_and(|node| matches!(node, MenuNode::SubMenu(_)));
            if !is_submenu {
                return Ok(false);
            }
            event.prevent_default();
            state.nav.force_submenu_open = true;
        }
        self.sync_submenus()?;
        Ok(true)
    }

    /// Move the cursor to the previous (`upward`) or next enabled child
    ///
    /// Returns whether the selection moved.
    pub fn select_adjacent(&self, upward: bool) -> Result<bool, MenuError> {
        let selectable = collect_selectable(&self.children()?);
        let disabled: Vec<bool> = selectable.iter().map(|s| s.disabled).collect();

        {
            let mut state = lock(&self.state, "navigation state")?;
            let current = state
                .nav
                .selected
                .as_ref()
                .and_then(|key| selectable.iter().position(|s| &s.key == key));
            let Some(next) = next_enabled_index(current, &disabled, upward) else {
                return Ok(false);
            };
            state.select(Some(selectable[next].key.clone()));
        }
        self.sync_submenus()?;
        Ok(true)
    }

    /// Pointer moved over a child
    pub fn hover(&self, key: &ItemKey) -> Result<(), MenuError> {
        let changed = {
            let mut state = lock(&self.state, "navigation state")?;
            state.nav.selected.as_ref() != Some(key) && state.select(Some(key.clone()))
        };
        if changed {
            self.sync_submenus()?;
        }
        Ok(())
    }

    /// Pointer left a child
    pub fn leave(&self) -> Result<(), MenuError> {
        self.reset()
    }

    /// Clear the selection and the forced submenu
    pub fn reset(&self) -> Result<(), MenuError> {
        let changed = lock(&self.state, "navigation state")?.select(None);
        if changed {
            self.sync_submenus()?;
        }
        Ok(())
    }

    /// A forced-open submenu closed itself
    pub fn force_close(&self) -> Result<(), MenuError> {
        let changed = {
            let mut state = lock(&self.state, "navigation state")?;
            std::mem::replace(&mut state.nav.force_submenu_open, false)
        };
        if changed {
            self.sync_submenus()?;
        }
        Ok(())
    }

    /// Record the activation handle of the selected child; stale keys are ignored
    pub fn register_activation(
        &self,
        key: &ItemKey,
        handle: Option<Arc<dyn ActivationHandle>>,
    ) -> Result<(), MenuError> {
        let mut state = lock(&self.state, "navigation state")?;
        if state.nav.selected.as_ref() == Some(key) {
            state.activation = handle.map(|h| (key.clone(), h));
        }
        Ok(())
    }

    /// Current children annotated for rendering
    pub fn render(&self) -> Result<Vec<RenderChild>, MenuError> {
        let state = self.state()?;
        let children = self.children()?;
        Ok(render_children(&children, &state, &self.hooks()))
    }

    /// Push fresh bindings to every submenu child
    pub(crate) fn sync_submenus(&self) -> Result<(), MenuError> {
        let rendered = self.render()?;
        for child in RenderChild::flatten(&rendered) {
            if let RenderChild::SubMenu(rendered) = child {
                rendered.submenu.bind(rendered.binding.clone())?;
            }
        }
        Ok(())
    }

    fn owner_active(&self) -> bool {
        self.owner.upgrade().is_some_and(|owner| owner.is_active())
    }

    /// Whether a submenu other than `except` currently holds the keyboard
    fn child_holds_keyboard(&self, except: &ItemKey) -> Result<bool, MenuError> {
        for submenu in self.submenus()? {
            if submenu.key() != except && submenu.holds_keyboard()? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn hook<A: 'static>(
        &self,
        origin: &'static str,
        f: impl Fn(&Navigator, A) -> Result<(), MenuError> + Send + Sync + 'static,
    ) -> Callback<A> {
        let nav = self.self_ref.clone();
        Callback::new(move |args| {
            if let Some(nav) = nav.upgrade() {
                report(origin, f(&*nav, args));
            }
        })
    }

    fn hooks(&self) -> RenderHooks {
        let nav = self.self_ref.clone();
        RenderHooks {
            on_mouse_leave: self.hook("menu item mouse leave", |nav, ()| nav.leave()),
            on_mouse_move: self.hook("menu item mouse move", |nav, key: ItemKey| nav.hover(&key)),
            register_activation: self.hook(
                "activation registration",
                |nav, (key, handle): (ItemKey, Option<Arc<dyn ActivationHandle>>)| {
                    nav.register_activation(&key, handle)
                },
            ),
            force_close: self.hook("submenu force close", |nav, ()| nav.force_close()),
            parent_key_handler: self.key_listener.clone(),
            may_restore_parent: Callback::new(move |key: ItemKey| {
                nav.upgrade().is_some_and(|nav| {
                    nav.owner_active() && !nav.child_holds_keyboard(&key).unwrap_or(false)
                })
            }),
        }
    }
}
