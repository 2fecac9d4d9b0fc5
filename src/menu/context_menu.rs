//! The top-level context menu
//!
//! A [`ContextMenu`] listens on the bus for shows addressed to its id and for
//! hides. While visible it keeps dismissal listeners and its keyboard
//! navigation attached to the [`Document`](crate::events::Document), and it
//! lays itself out over two frames so the host can measure it before it
//! becomes visible.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use serde::{Deserialize, Serialize};

use crate::callback::Callback;
use crate::context::MenuContext;
use crate::error::{lock, report, MenuError};
use crate::events::document::{listener, DocumentEvent, DocumentEventKind, Listener};
use crate::events::{
    ElementId, HideDetail, Key, KeyboardEvent, MenuData, MenuId, PointerEvent, RegistrationId,
    ShowEvent,
};
use crate::layout::{Point, Rect};
use crate::menu::navigation::{MenuOwner, Navigator};
use crate::menu::node::{MenuNode, RenderChild};
use crate::menu::position::{menu_position, rtl_menu_position};
use crate::menu::submenu::SubMenu;
use crate::scheduler::{cancel_slot, TaskHandle};

/// Host element behind a top-level menu
pub trait MenuSurface: Send + Sync {
    /// Current bounding box, if the element is laid out
    fn bounding_rect(&self) -> Option<Rect>;

    /// Whether `element` is the menu element or one of its descendants
    fn contains(&self, element: ElementId) -> bool;

    fn apply_style(&self, style: MenuStyle);
}

/// Inline style the menu element should carry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuStyle {
    /// Top-left corner; `None` leaves the previous position in place
    pub position: Option<Point>,
    pub opacity: f32,
    /// Whether the element receives pointer events
    pub interactive: bool,
}

impl MenuStyle {
    pub const HIDDEN: MenuStyle = MenuStyle {
        position: None,
        opacity: 0.0,
        interactive: false,
    };

    pub fn shown(position: Point) -> Self {
        Self {
            position: Some(position),
            opacity: 1.0,
            interactive: true,
        }
    }
}

/// Arguments of `on_mouse_leave`
#[derive(Debug, Clone)]
pub struct MouseLeave {
    pub event: PointerEvent,
    /// Menu data merged with the data of the last bus dispatch
    pub data: MenuData,
    pub target: Option<ElementId>,
}

/// Top-level menu configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextMenuProps {
    pub id: MenuId,
    pub data: MenuData,
    /// Publish a hide-all when the pointer leaves the menu
    pub hide_on_leave: bool,
    pub rtl: bool,
    pub prevent_hide_on_context_menu: bool,
    pub prevent_hide_on_resize: bool,
    pub prevent_hide_on_scroll: bool,
    #[serde(skip)]
    pub on_show: Option<Callback<ShowEvent>>,
    #[serde(skip)]
    pub on_hide: Option<Callback<HideDetail>>,
    #[serde(skip)]
    pub on_mouse_leave: Option<Callback<MouseLeave>>,
}

impl ContextMenuProps {
    pub fn new(id: impl Into<MenuId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn on_show(mut self, handler: impl Fn(ShowEvent) + Send + Sync + 'static) -> Self {
        self.on_show = Some(Callback::new(handler));
        self
    }

    pub fn on_hide(mut self, handler: impl Fn(HideDetail) + Send + Sync + 'static) -> Self {
        self.on_hide = Some(Callback::new(handler));
        self
    }

    pub fn on_mouse_leave(mut self, handler: impl Fn(MouseLeave) + Send + Sync + 'static) -> Self {
        self.on_mouse_leave = Some(Callback::new(handler));
        self
    }
}

#[derive(Default)]
struct ContextMenuState {
    visible: bool,
    position: Point,
    registration: Option<RegistrationId>,
    frame: Option<TaskHandle>,
}

struct ContextMenuInner {
    props: ContextMenuProps,
    context: MenuContext,
    surface: Arc<dyn MenuSurface>,
    navigator: Arc<Navigator>,
    state: Mutex<ContextMenuState>,
    outside_click: Listener,
    native_hide: Listener,
    self_ref: Weak<ContextMenuInner>,
}

/// A menu opened by a [`ContextMenuTrigger`](crate::trigger::ContextMenuTrigger)
#[derive(Clone)]
pub struct ContextMenu {
    inner: Arc<ContextMenuInner>,
}

impl fmt::Debug for ContextMenu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextMenu")
            .field("id", &self.inner.props.id)
            .field("visible", &self.is_visible().ok())
            .finish_non_exhaustive()
    }
}

impl ContextMenu {
    pub fn new(
        context: &MenuContext,
        props: ContextMenuProps,
        surface: Arc<dyn MenuSurface>,
        children: Vec<MenuNode>,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<ContextMenuInner>| {
            let owner: Weak<dyn MenuOwner> = weak.clone();

            let menu = weak.clone();
            let outside_click = listener(move |event| {
                let target = match event {
                    DocumentEvent::MouseDown(e) => e.target,
                    DocumentEvent::TouchStart(e) => e.target,
                    _ => return,
                };
                if let Some(menu) = menu.upgrade() {
                    report("outside click", menu.handle_outside_click(target));
                }
            });

            let menu = weak.clone();
            let native_hide = listener(move |event| {
                let detail = match event {
                    DocumentEvent::ContextMenu(e) => HideDetail::Native(e.detail),
                    DocumentEvent::Scroll | DocumentEvent::Resize(_) => HideDetail::Absent,
                    _ => return,
                };
                if let Some(menu) = menu.upgrade() {
                    report("native hide", menu.handle_hide(&detail));
                }
            });

            ContextMenuInner {
                props,
                context: context.clone(),
                surface,
                navigator: Navigator::new(owner, children),
                state: Mutex::new(ContextMenuState::default()),
                outside_click,
                native_hide,
                self_ref: weak.clone(),
            }
        });
        Self { inner }
    }

    pub fn id(&self) -> &MenuId {
        &self.inner.props.id
    }

    pub fn props(&self) -> &ContextMenuProps {
        &self.inner.props
    }

    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.inner.navigator
    }

    pub fn is_visible(&self) -> Result<bool, MenuError> {
        Ok(lock(&self.inner.state, "menu state")?.visible)
    }

    /// Position requested by the last show
    pub fn requested_position(&self) -> Result<Point, MenuError> {
        Ok(lock(&self.inner.state, "menu state")?.position)
    }

    /// Subscribe to the bus, bind the submenus and apply the hidden style
    pub fn mount(&self) -> Result<(), MenuError> {
        let inner = &self.inner;
        if lock(&inner.state, "menu state")?.registration.is_some() {
            return Err(MenuError::AlreadyMounted(inner.props.id.to_string()));
        }

        let on_show = inner.self_ref.clone();
        let on_hide = inner.self_ref.clone();
        let id = inner.context.bus().register(
            move |show| {
                if let Some(menu) = on_show.upgrade() {
                    report("menu show", menu.handle_show(show));
                }
            },
            move |hide| {
                if let Some(menu) = on_hide.upgrade() {
                    report("menu hide", menu.handle_hide(&HideDetail::Payload(hide.clone())));
                }
            },
        )?;
        lock(&inner.state, "menu state")?.registration = Some(id);

        inner.navigator.sync_submenus()?;
        inner.surface.apply_style(MenuStyle::HIDDEN);
        log::debug!("mounted menu {}", inner.props.id);
        Ok(())
    }

    /// Unsubscribe and detach every document listener
    pub fn unmount(&self) -> Result<(), MenuError> {
        let inner = &self.inner;
        let registration = {
            let mut state = lock(&inner.state, "menu state")?;
            cancel_slot(inner.context.scheduler(), &mut state.frame)?;
            state.registration.take()
        };
        let Some(registration) = registration else {
            return Err(MenuError::NotMounted(inner.props.id.to_string()));
        };

        inner.context.bus().unregister(registration)?;
        inner.detach_listeners()?;
        log::debug!("unmounted menu {}", inner.props.id);
        Ok(())
    }

    /// Show the menu as a bus show would
    pub fn show(&self, event: &ShowEvent) -> Result<(), MenuError> {
        self.inner.handle_show(event)
    }

    /// Hide the menu as a bus hide would
    pub fn hide(&self, detail: &HideDetail) -> Result<(), MenuError> {
        self.inner.handle_hide(detail)
    }

    /// Pointer left the menu element
    pub fn handle_mouse_leave(&self, event: &mut PointerEvent) -> Result<(), MenuError> {
        let inner = &self.inner;
        event.prevent_default();

        if let Some(on_mouse_leave) = &inner.props.on_mouse_leave {
            let store = inner.context.bus().store().snapshot()?;
            on_mouse_leave.call(MouseLeave {
                event: event.clone(),
                data: inner.props.data.merge(&store.data),
                target: store.target,
            });
        }

        if inner.props.hide_on_leave {
            inner.context.bus().hide_all()?;
        }
        Ok(())
    }

    /// Context menu opened on the menu element itself
    pub fn handle_context_menu(&self, event: &mut PointerEvent) -> Result<(), MenuError> {
        event.prevent_default();
        self.inner.handle_hide(&HideDetail::Native(event.detail))
    }

    /// Children annotated for rendering
    pub fn render(&self) -> Result<Vec<RenderChild>, MenuError> {
        self.inner.navigator.render()
    }

    pub fn set_children(&self, children: Vec<MenuNode>) -> Result<(), MenuError> {
        self.inner.navigator.set_children(children)
    }
}

fn descendant_submenus(navigator: &Navigator, out: &mut Vec<SubMenu>) -> Result<(), MenuError> {
    for submenu in navigator.submenus()? {
        descendant_submenus(submenu.navigator(), out)?;
        out.push(submenu);
    }
    Ok(())
}

impl ContextMenuInner {
    fn handle_show(&self, event: &ShowEvent) -> Result<(), MenuError> {
        {
            let mut state = lock(&self.state, "menu state")?;
            if event.id != self.props.id || state.visible {
                return Ok(());
            }
            state.visible = true;
            state.position = event.position;
        }

        self.attach_listeners()?;
        if let Some(on_show) = &self.props.on_show {
            on_show.call(event.clone());
        }
        log::debug!(
            "showing menu {} at ({}, {})",
            self.props.id,
            event.position.x,
            event.position.y
        );
        self.schedule_layout()
    }

    fn handle_hide(&self, detail: &HideDetail) -> Result<(), MenuError> {
        {
            let mut state = lock(&self.state, "menu state")?;
            if !state.visible || !detail.applies_to(&self.props.id) {
                return Ok(());
            }
            state.visible = false;
        }

        self.detach_listeners()?;
        self.navigator.reset()?;

        let mut submenus = Vec::new();
        descendant_submenus(&self.navigator, &mut submenus)?;
        for submenu in submenus {
            submenu.hide(&HideDetail::Absent)?;
        }

        if let Some(on_hide) = &self.props.on_hide {
            on_hide.call(detail.clone());
        }
        log::debug!("hiding menu {}", self.props.id);
        self.schedule_layout()
    }

    fn handle_outside_click(&self, target: Option<ElementId>) -> Result<(), MenuError> {
        if target.is_some_and(|element| self.surface.contains(element)) {
            return Ok(());
        }
        self.context.bus().hide_all()
    }

    fn attach_listeners(&self) -> Result<(), MenuError> {
        let document = self.context.document();
        document.add_listener(DocumentEventKind::MouseDown, &self.outside_click)?;
        document.add_listener(DocumentEventKind::TouchStart, &self.outside_click)?;
        if !self.props.prevent_hide_on_scroll {
            document.add_listener(DocumentEventKind::Scroll, &self.native_hide)?;
        }
        if !self.props.prevent_hide_on_context_menu {
            document.add_listener(DocumentEventKind::ContextMenu, &self.native_hide)?;
        }
        document.add_listener(DocumentEventKind::KeyDown, &self.navigator.key_listener())?;
        if !self.props.prevent_hide_on_resize {
            document.add_listener(DocumentEventKind::Resize, &self.native_hide)?;
        }
        Ok(())
    }

    fn detach_listeners(&self) -> Result<(), MenuError> {
        let document = self.context.document();
        document.remove_listener(DocumentEventKind::MouseDown, &self.outside_click)?;
        document.remove_listener(DocumentEventKind::TouchStart, &self.outside_click)?;
        document.remove_listener(DocumentEventKind::Scroll, &self.native_hide)?;
        document.remove_listener(DocumentEventKind::ContextMenu, &self.native_hide)?;
        document.remove_listener(DocumentEventKind::KeyDown, &self.navigator.key_listener())?;
        document.remove_listener(DocumentEventKind::Resize, &self.native_hide)
    }

    /// Queue the style update for the current visibility, replacing any
    /// pending one
    fn schedule_layout(&self) -> Result<(), MenuError> {
        let scheduler = self.context.scheduler();
        let mut state = lock(&self.state, "menu state")?;
        cancel_slot(scheduler, &mut state.frame)?;

        let menu = self.self_ref.clone();
        let task: Box<dyn FnOnce() + Send> = if state.visible {
            let desired = state.position;
            Box::new(move || {
                if let Some(menu) = menu.upgrade() {
                    report("menu layout", menu.measure(desired));
                }
            })
        } else {
            Box::new(move || {
                if let Some(menu) = menu.upgrade() {
                    report("menu layout", menu.apply_style(MenuStyle::HIDDEN));
                }
            })
        };
        state.frame = Some(scheduler.request_frame(task)?);
        Ok(())
    }

    /// First frame: compute the on-screen position
    fn measure(&self, desired: Point) -> Result<(), MenuError> {
        let position = match self.surface.bounding_rect() {
            Some(rect) => {
                let viewport = self.context.document().viewport()?;
                if self.props.rtl {
                    rtl_menu_position(desired, rect.size, viewport)
                } else {
                    menu_position(desired, rect.size, viewport)
                }
            }
            None => desired,
        };

        let menu = self.self_ref.clone();
        let scheduler = self.context.scheduler();
        let mut state = lock(&self.state, "menu state")?;
        state.frame = Some(scheduler.request_frame(Box::new(move || {
            if let Some(menu) = menu.upgrade() {
                report("menu layout", menu.apply_style(MenuStyle::shown(position)));
            }
        }))?);
        Ok(())
    }

    fn apply_style(&self, style: MenuStyle) -> Result<(), MenuError> {
        lock(&self.state, "menu state")?.frame = None;
        self.surface.apply_style(style);
        Ok(())
    }
}

impl MenuOwner for ContextMenuInner {
    fn is_active(&self) -> bool {
        match self.state.lock() {
            Ok(state) => state.visible,
            Err(_) => {
                log::warn!("menu {} state is poisoned", self.props.id);
                false
            }
        }
    }

    fn guards_keys(&self) -> bool {
        true
    }

    fn request_hide(&self, event: &mut KeyboardEvent) {
        if matches!(event.key, Key::Escape | Key::Enter) {
            report("menu key hide", self.context.bus().hide_all());
        }
    }
}
