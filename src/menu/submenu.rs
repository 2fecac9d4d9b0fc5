//! Nested menus opened by hovering or by keyboard
//!
//! A [`SubMenu`] is both a child of its parent menu (a title the parent can
//! select) and a menu of its own with a [`Navigator`]. It opens after the
//! pointer rests on it for `hover_delay`, or immediately when the parent
//! forces it open from the keyboard. While open it owns the document's
//! keydown listener and hands it back to the parent when it closes.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::callback::Callback;
use crate::context::MenuContext;
use crate::error::{lock, report, MenuError};
use crate::events::document::DocumentEventKind;
use crate::events::{HideDetail, KeyboardEvent, MenuData, MenuId, PointerEvent, RegistrationId};
use crate::layout::Rect;
use crate::menu::navigation::{MenuOwner, Navigator};
use crate::menu::node::{
    ActivationHandle, ClickSource, ItemClick, ItemKey, MenuNode, RenderChild, SubMenuBinding,
};
use crate::menu::position::{submenu_anchor, SubMenuAnchor};
use crate::scheduler::{cancel_slot, TaskHandle};

/// Length of the close transition; cleanup runs once it has elapsed
pub const CLOSE_TRANSITION: Duration = Duration::from_millis(1);

/// Host element behind a submenu's list
pub trait SubMenuSurface: Send + Sync {
    /// Current bounding box of the list, if it is laid out
    fn bounding_rect(&self) -> Option<Rect>;

    /// Pin the list to one side of the title
    fn set_anchor(&self, anchor: SubMenuAnchor);

    /// Toggle the visible state of the list
    fn set_open(&self, open: bool);
}

/// Submenu configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubMenuProps {
    pub title: String,
    /// Milliseconds the pointer has to rest before opening or closing
    pub hover_delay: u64,
    pub rtl: bool,
    pub disabled: bool,
    pub prevent_close_on_click: bool,
    pub data: MenuData,
    #[serde(skip)]
    pub on_click: Option<Callback<ItemClick>>,
}

impl Default for SubMenuProps {
    fn default() -> Self {
        Self {
            title: String::new(),
            hover_delay: 500,
            rtl: false,
            disabled: false,
            prevent_close_on_click: false,
            data: MenuData::default(),
            on_click: None,
        }
    }
}

impl SubMenuProps {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn hover_delay(&self) -> Duration {
        Duration::from_millis(self.hover_delay)
    }

    pub fn on_click(mut self, handler: impl Fn(ItemClick) + Send + Sync + 'static) -> Self {
        self.on_click = Some(Callback::new(handler));
        self
    }
}

#[derive(Default)]
struct SubMenuState {
    visible: bool,
    binding: Option<SubMenuBinding>,
    prev_visible: bool,
    prev_force_open: bool,
    open_timer: Option<TaskHandle>,
    close_timer: Option<TaskHandle>,
    open_frame: Option<TaskHandle>,
    cleanup_timer: Option<TaskHandle>,
    registration: Option<RegistrationId>,
    keyboard_installed: bool,
}

impl SubMenuState {
    fn force_open(&self) -> bool {
        self.binding.as_ref().is_some_and(|b| b.force_open)
    }
}

struct SubMenuInner {
    key: ItemKey,
    menu_id: MenuId,
    props: SubMenuProps,
    context: MenuContext,
    surface: Arc<dyn SubMenuSurface>,
    navigator: Arc<Navigator>,
    state: Mutex<SubMenuState>,
    self_ref: Weak<SubMenuInner>,
}

/// A nested menu inside a [`ContextMenu`](crate::menu::ContextMenu) tree
#[derive(Clone)]
pub struct SubMenu {
    inner: Arc<SubMenuInner>,
}

impl fmt::Debug for SubMenu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubMenu")
            .field("key", &self.inner.key)
            .field("menu_id", &self.inner.menu_id)
            .field("visible", &self.is_visible().ok())
            .finish_non_exhaustive()
    }
}

impl SubMenu {
    /// Create a submenu of the top-level menu `menu_id`
    pub fn new(
        context: &MenuContext,
        menu_id: impl Into<MenuId>,
        key: impl Into<String>,
        props: SubMenuProps,
        surface: Arc<dyn SubMenuSurface>,
        children: Vec<MenuNode>,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<SubMenuInner>| {
            let owner: Weak<dyn MenuOwner> = weak.clone();
            SubMenuInner {
                key: ItemKey::new(key),
                menu_id: menu_id.into(),
                props,
                context: context.clone(),
                surface,
                navigator: Navigator::new(owner, children),
                state: Mutex::new(SubMenuState::default()),
                self_ref: weak.clone(),
            }
        });
        Self { inner }
    }

    pub fn key(&self) -> &ItemKey {
        &self.inner.key
    }

    pub fn is_disabled(&self) -> bool {
        self.inner.props.disabled
    }

    pub fn props(&self) -> &SubMenuProps {
        &self.inner.props
    }

    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.inner.navigator
    }

    /// Opened by hover (forced opening is tracked by the parent)
    pub fn is_visible(&self) -> Result<bool, MenuError> {
        Ok(lock(&self.inner.state, "submenu state")?.visible)
    }

    /// Opened by hover or forced open by the parent
    pub fn is_open(&self) -> Result<bool, MenuError> {
        let state = lock(&self.inner.state, "submenu state")?;
        Ok(state.visible || state.force_open())
    }

    /// Whether this submenu's keydown listener is installed on the document
    pub fn holds_keyboard(&self) -> Result<bool, MenuError> {
        Ok(lock(&self.inner.state, "submenu state")?.keyboard_installed)
    }

    /// Subscribe to bus hides and bind nested submenus
    pub fn mount(&self) -> Result<(), MenuError> {
        if lock(&self.inner.state, "submenu state")?.registration.is_some() {
            return Err(MenuError::AlreadyMounted(self.inner.key.to_string()));
        }

        let weak = self.inner.self_ref.clone();
        let id = self.inner.context.bus().register(
            |_| {},
            move |hide| {
                if let Some(inner) = weak.upgrade() {
                    report(
                        "submenu hide",
                        inner.hide_submenu(&HideDetail::Payload(hide.clone())),
                    );
                }
            },
        )?;
        lock(&self.inner.state, "submenu state")?.registration = Some(id);
        self.inner.navigator.sync_submenus()
    }

    /// Unsubscribe, cancel pending timers and drop the keyboard without
    /// handing it back
    pub fn unmount(&self) -> Result<(), MenuError> {
        let inner = &self.inner;
        let scheduler = inner.context.scheduler();
        let registration = {
            let mut state = lock(&inner.state, "submenu state")?;
            cancel_slot(scheduler, &mut state.open_timer)?;
            cancel_slot(scheduler, &mut state.close_timer)?;
            cancel_slot(scheduler, &mut state.open_frame)?;
            cancel_slot(scheduler, &mut state.cleanup_timer)?;
            state.registration.take()
        };
        let Some(registration) = registration else {
            return Err(MenuError::NotMounted(inner.key.to_string()));
        };

        inner.context.bus().unregister(registration)?;
        inner.release_keyboard(false)
    }

    /// Pointer entered the submenu
    pub fn handle_mouse_enter(&self) -> Result<(), MenuError> {
        let inner = &self.inner;
        let scheduler = inner.context.scheduler();
        let mut state = lock(&inner.state, "submenu state")?;
        cancel_slot(scheduler, &mut state.close_timer)?;

        if inner.props.disabled || state.visible {
            return Ok(());
        }

        cancel_slot(scheduler, &mut state.open_timer)?;
        let weak = inner.self_ref.clone();
        state.open_timer = Some(scheduler.set_timeout(
            inner.props.hover_delay(),
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    report("submenu hover open", inner.set_visible_by_hover(true));
                }
            }),
        )?);
        Ok(())
    }

    /// Pointer left the submenu
    pub fn handle_mouse_leave(&self) -> Result<(), MenuError> {
        let inner = &self.inner;
        let scheduler = inner.context.scheduler();
        let mut state = lock(&inner.state, "submenu state")?;
        cancel_slot(scheduler, &mut state.open_timer)?;

        if !state.visible {
            return Ok(());
        }

        cancel_slot(scheduler, &mut state.close_timer)?;
        let weak = inner.self_ref.clone();
        state.close_timer = Some(scheduler.set_timeout(
            inner.props.hover_delay(),
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    report("submenu hover close", inner.set_visible_by_hover(false));
                }
            }),
        )?);
        Ok(())
    }

    /// Click on the submenu's title
    pub fn handle_click(&self, event: &mut PointerEvent) -> Result<(), MenuError> {
        event.prevent_default();
        self.inner.click(ClickSource::Pointer(event.clone()))
    }

    /// Activation handle performing a title click
    pub fn activation(&self) -> Arc<dyn ActivationHandle> {
        Arc::new(self.clone())
    }

    /// Accept the parent's latest render of this child
    pub fn bind(&self, binding: SubMenuBinding) -> Result<(), MenuError> {
        lock(&self.inner.state, "submenu state")?.binding = Some(binding);
        self.inner.reconcile()
    }

    /// Close the submenu unless `detail` is scoped to another menu tree
    pub fn hide(&self, detail: &HideDetail) -> Result<(), MenuError> {
        self.inner.hide_submenu(detail)
    }

    /// Children annotated for rendering
    pub fn render(&self) -> Result<Vec<RenderChild>, MenuError> {
        self.inner.navigator.render()
    }

    pub fn set_children(&self, children: Vec<MenuNode>) -> Result<(), MenuError> {
        self.inner.navigator.set_children(children)
    }
}

impl ActivationHandle for SubMenu {
    fn is_activatable(&self) -> bool {
        !self.inner.props.disabled
    }

    fn activate(&self) {
        report("submenu activation", self.inner.click(ClickSource::Keyboard));
    }
}

impl SubMenuInner {
    fn click(&self, source: ClickSource) -> Result<(), MenuError> {
        if self.props.disabled {
            return Ok(());
        }

        let Some(on_click) = &self.props.on_click else {
            return Ok(());
        };
        let store = self.context.bus().store().snapshot()?;
        on_click.call(ItemClick {
            source,
            data: self.props.data.merge(&store.data),
            target: store.target,
        });

        if self.props.prevent_close_on_click {
            return Ok(());
        }
        self.context.bus().hide_all()
    }

    fn set_visible_by_hover(&self, visible: bool) -> Result<(), MenuError> {
        {
            let mut state = lock(&self.state, "submenu state")?;
            if visible {
                state.open_timer = None;
            } else {
                state.close_timer = None;
            }
            state.visible = visible;
        }
        self.navigator.reset()?;
        self.reconcile()
    }

    fn hide_submenu(&self, detail: &HideDetail) -> Result<(), MenuError> {
        if detail.scope().is_some_and(|scope| *scope != self.menu_id) {
            return Ok(());
        }

        let force_close = {
            let state = lock(&self.state, "submenu state")?;
            state
                .binding
                .as_ref()
                .filter(|b| b.force_open)
                .map(|b| b.force_close.clone())
        };
        if let Some(force_close) = force_close {
            force_close.call(());
        }

        {
            let scheduler = self.context.scheduler();
            let mut state = lock(&self.state, "submenu state")?;
            cancel_slot(scheduler, &mut state.open_timer)?;
            cancel_slot(scheduler, &mut state.close_timer)?;
            state.visible = false;
        }
        self.navigator.reset()?;
        self.release_keyboard(true)?;
        self.reconcile()
    }

    /// Act on a genuine open/closed transition
    ///
    /// Swapping between hover-open and forced-open is not a transition.
    fn reconcile(&self) -> Result<(), MenuError> {
        let scheduler = self.context.scheduler();
        let mut state = lock(&self.state, "submenu state")?;

        let visible = state.visible;
        let force_open = state.force_open();
        let changed = (state.prev_visible != visible || state.prev_force_open != force_open)
            && !(state.prev_visible && force_open)
            && !(state.prev_force_open && visible);
        state.prev_visible = visible;
        state.prev_force_open = force_open;
        if !changed {
            return Ok(());
        }

        let weak = self.self_ref.clone();
        if visible || force_open {
            cancel_slot(scheduler, &mut state.cleanup_timer)?;
            cancel_slot(scheduler, &mut state.open_frame)?;
            state.open_frame = Some(scheduler.request_frame(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    report("submenu open", inner.finish_open());
                }
            }))?);
        } else {
            cancel_slot(scheduler, &mut state.open_frame)?;
            cancel_slot(scheduler, &mut state.cleanup_timer)?;
            state.cleanup_timer = Some(scheduler.set_timeout(
                CLOSE_TRANSITION,
                Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        report("submenu close", inner.finish_close());
                    }
                }),
            )?);
            drop(state);
            self.surface.set_open(false);
            log::debug!("submenu {} closing", self.key);
        }
        Ok(())
    }

    fn finish_open(&self) -> Result<(), MenuError> {
        lock(&self.state, "submenu state")?.open_frame = None;

        let viewport = self.context.document().viewport()?;
        let anchor = submenu_anchor(self.surface.bounding_rect(), viewport, self.props.rtl);
        self.surface.set_anchor(anchor);
        self.surface.set_open(true);

        self.take_keyboard()?;
        self.navigator.reset()?;
        log::debug!("submenu {} opened ({:?})", self.key, anchor);
        Ok(())
    }

    fn finish_close(&self) -> Result<(), MenuError> {
        lock(&self.state, "submenu state")?.cleanup_timer = None;
        self.surface.set_anchor(SubMenuAnchor::default());
        self.release_keyboard(true)
    }

    fn take_keyboard(&self) -> Result<(), MenuError> {
        let parent = {
            let mut state = lock(&self.state, "submenu state")?;
            state.keyboard_installed = true;
            state.binding.as_ref().map(|b| b.parent_key_handler.clone())
        };

        let document = self.context.document();
        if let Some(parent) = parent {
            document.remove_listener(DocumentEventKind::KeyDown, &parent)?;
        }
        document.add_listener(DocumentEventKind::KeyDown, &self.navigator.key_listener())
    }

    /// Remove this submenu's keydown listener; with `restore`, hand the
    /// keyboard back to the parent if it is still showing
    fn release_keyboard(&self, restore: bool) -> Result<(), MenuError> {
        let binding = {
            let mut state = lock(&self.state, "submenu state")?;
            state.keyboard_installed = false;
            state.binding.clone()
        };

        let document = self.context.document();
        document.remove_listener(DocumentEventKind::KeyDown, &self.navigator.key_listener())?;

        if let Some(binding) = binding.filter(|_| restore) {
            if binding.may_restore_parent.call(()) {
                document.add_listener(DocumentEventKind::KeyDown, &binding.parent_key_handler)?;
            }
        }
        Ok(())
    }
}

impl MenuOwner for SubMenuInner {
    fn is_active(&self) -> bool {
        match self.state.lock() {
            Ok(state) => state.visible || state.force_open(),
            Err(_) => {
                log::warn!("submenu {} state is poisoned", self.key);
                false
            }
        }
    }

    fn guards_keys(&self) -> bool {
        false
    }

    fn request_hide(&self, event: &mut KeyboardEvent) {
        event.prevent_default();
        report("submenu key hide", self.hide_submenu(&HideDetail::Absent));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::document::DocumentEvent;
    use crate::events::{HideEvent, Key, MouseButton};
    use crate::layout::{Point, Size};
    use crate::menu::node::MenuItem;
    use crate::scheduler::ManualScheduler;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingSurface {
        rect: Mutex<Option<Rect>>,
        anchors: Mutex<Vec<SubMenuAnchor>>,
        open: Mutex<Vec<bool>>,
    }

    impl SubMenuSurface for RecordingSurface {
        fn bounding_rect(&self) -> Option<Rect> {
            *self.rect.lock().unwrap()
        }

        fn set_anchor(&self, anchor: SubMenuAnchor) {
            self.anchors.lock().unwrap().push(anchor);
        }

        fn set_open(&self, open: bool) {
            self.open.lock().unwrap().push(open);
        }
    }

    fn submenu(
        props: SubMenuProps,
    ) -> (MenuContext, ManualScheduler, Arc<RecordingSurface>, SubMenu) {
        let (context, scheduler) = MenuContext::manual(Size::new(800.0, 600.0));
        let surface = Arc::new(RecordingSurface::default());
        let submenu = SubMenu::new(
            &context,
            "ctx1",
            "more",
            props,
            surface.clone(),
            vec![MenuItem::new("a").into(), MenuItem::new("b").into()],
        );
        submenu.mount().unwrap();
        (context, scheduler, surface, submenu)
    }

    #[test]
    fn test_props_from_json() {
        let props: SubMenuProps =
            serde_json::from_str(r#"{"title": "More", "hoverDelay": 250, "rtl": true}"#).unwrap();
        assert_eq!(props.title, "More");
        assert_eq!(props.hover_delay(), Duration::from_millis(250));
        assert!(props.rtl);
        assert!(!props.prevent_close_on_click);
        assert_eq!(SubMenuProps::default().hover_delay, 500);
    }

    #[test]
    fn test_hover_opens_after_delay() {
        let (_context, scheduler, surface, submenu) = submenu(SubMenuProps::new("More"));

        submenu.handle_mouse_enter().unwrap();
        scheduler.advance(Duration::from_millis(499)).unwrap();
        assert!(!submenu.is_visible().unwrap());

        scheduler.advance(Duration::from_millis(1)).unwrap();
        assert!(submenu.is_visible().unwrap());
        assert!(surface.open.lock().unwrap().is_empty());

        scheduler.run_frame().unwrap();
        assert_eq!(*surface.open.lock().unwrap(), vec![true]);
        assert_eq!(*surface.anchors.lock().unwrap(), vec![SubMenuAnchor::default()]);
    }

    #[test]
    fn test_quick_enter_leave_never_opens() {
        let (_context, scheduler, surface, submenu) = submenu(SubMenuProps::new("More"));

        submenu.handle_mouse_enter().unwrap();
        scheduler.advance(Duration::from_millis(300)).unwrap();
        submenu.handle_mouse_leave().unwrap();
        scheduler.advance(Duration::from_secs(2)).unwrap();
        scheduler.flush().unwrap();

        assert!(!submenu.is_visible().unwrap());
        assert!(surface.open.lock().unwrap().is_empty());
        assert_eq!(scheduler.pending_timers().unwrap(), 0);
    }

    #[test]
    fn test_repeated_enter_keeps_one_open_timer() {
        let (_context, scheduler, _surface, submenu) = submenu(SubMenuProps::new("More"));
        submenu.handle_mouse_enter().unwrap();
        submenu.handle_mouse_enter().unwrap();
        assert_eq!(scheduler.pending_timers().unwrap(), 1);
    }

    #[test]
    fn test_disabled_never_opens() {
        let props = SubMenuProps {
            disabled: true,
            ..SubMenuProps::new("More")
        };
        let (_context, scheduler, _surface, submenu) = submenu(props);
        submenu.handle_mouse_enter().unwrap();
        assert_eq!(scheduler.pending_timers().unwrap(), 0);
    }

    #[test]
    fn test_leave_closes_after_delay_and_resets_anchor() {
        let (_context, scheduler, surface, submenu) = submenu(SubMenuProps::new("More"));
        *surface.rect.lock().unwrap() = Some(Rect::new(700.0, 550.0, 150.0, 100.0));

        submenu.handle_mouse_enter().unwrap();
        scheduler.advance(Duration::from_millis(500)).unwrap();
        scheduler.run_frame().unwrap();

        submenu.handle_mouse_leave().unwrap();
        scheduler.advance(Duration::from_millis(500)).unwrap();
        assert!(!submenu.is_visible().unwrap());
        assert_eq!(*surface.open.lock().unwrap(), vec![true, false]);

        scheduler.advance(CLOSE_TRANSITION).unwrap();
        let anchors = surface.anchors.lock().unwrap();
        assert_ne!(anchors[0], SubMenuAnchor::default());
        assert_eq!(anchors[1], SubMenuAnchor::default());
    }

    #[test]
    fn test_scoped_hide_for_other_menu_is_ignored() {
        let (context, scheduler, _surface, submenu) = submenu(SubMenuProps::new("More"));
        submenu.handle_mouse_enter().unwrap();
        scheduler.advance(Duration::from_millis(500)).unwrap();

        context.bus().hide_menu(HideEvent::for_menu("ctx2")).unwrap();
        assert!(submenu.is_visible().unwrap());

        context.bus().hide_menu(HideEvent::for_menu("ctx1")).unwrap();
        assert!(!submenu.is_visible().unwrap());
    }

    #[test]
    fn test_keyboard_handoff() {
        let (context, scheduler, _surface, submenu) = submenu(SubMenuProps::new("More"));
        let document = context.document().clone();

        let parent_keys = Arc::new(AtomicUsize::new(0));
        let counter = parent_keys.clone();
        let parent_handler = crate::events::document::listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        document
            .add_listener(DocumentEventKind::KeyDown, &parent_handler)
            .unwrap();

        submenu
            .bind(SubMenuBinding {
                selected: true,
                force_open: true,
                force_close: Callback::new(|()| {}),
                parent_key_handler: parent_handler.clone(),
                may_restore_parent: Callback::new(|()| true),
            })
            .unwrap();
        scheduler.run_frame().unwrap();
        assert!(submenu.holds_keyboard().unwrap());
        assert!(!document
            .has_listener(DocumentEventKind::KeyDown, &parent_handler)
            .unwrap());

        let mut down = DocumentEvent::KeyDown(KeyboardEvent::new(Key::ArrowDown));
        document.dispatch(&mut down).unwrap();
        assert_eq!(submenu.navigator().selected().unwrap(), Some(ItemKey::new("a")));
        assert_eq!(parent_keys.load(Ordering::SeqCst), 0);

        let mut left = DocumentEvent::KeyDown(KeyboardEvent::new(Key::ArrowLeft));
        document.dispatch(&mut left).unwrap();
        assert!(!submenu.holds_keyboard().unwrap());
        assert!(document
            .has_listener(DocumentEventKind::KeyDown, &parent_handler)
            .unwrap());
        assert_eq!(submenu.navigator().selected().unwrap(), None);
    }

    #[test]
    fn test_title_click() {
        let clicks = Arc::new(AtomicUsize::new(0));
        let c = clicks.clone();
        let props = SubMenuProps::new("More").on_click(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let (context, _scheduler, _surface, submenu) = submenu(props);

        let hides = Arc::new(AtomicUsize::new(0));
        let h = hides.clone();
        context
            .bus()
            .register(|_| {}, move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        let mut event = PointerEvent::new(Point::zero(), MouseButton::Left);
        submenu.handle_click(&mut event).unwrap();
        assert!(event.is_default_prevented());
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
        assert_eq!(hides.load(Ordering::SeqCst), 1);
    }

    fn hide_counter(context: &MenuContext) -> Arc<AtomicUsize> {
        let hides = Arc::new(AtomicUsize::new(0));
        let h = hides.clone();
        context
            .bus()
            .register(|_| {}, move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        hides
    }

    #[test]
    fn test_title_click_with_prevent_close_keeps_menus_open() {
        let clicks = Arc::new(AtomicUsize::new(0));
        let c = clicks.clone();
        let props = SubMenuProps {
            prevent_close_on_click: true,
            ..SubMenuProps::new("More")
        }
        .on_click(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let (context, _scheduler, _surface, submenu) = submenu(props);
        let hides = hide_counter(&context);

        let mut event = PointerEvent::new(Point::zero(), MouseButton::Left);
        submenu.handle_click(&mut event).unwrap();
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
        assert_eq!(hides.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_disabled_title_click_is_ignored() {
        let clicks = Arc::new(AtomicUsize::new(0));
        let c = clicks.clone();
        let props = SubMenuProps {
            disabled: true,
            ..SubMenuProps::new("More")
        }
        .on_click(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let (context, _scheduler, _surface, submenu) = submenu(props);
        let hides = hide_counter(&context);

        let mut event = PointerEvent::new(Point::zero(), MouseButton::Left);
        submenu.handle_click(&mut event).unwrap();
        assert!(event.is_default_prevented());
        assert_eq!(clicks.load(Ordering::SeqCst), 0);
        assert_eq!(hides.load(Ordering::SeqCst), 0);
        assert!(!submenu.activation().is_activatable());
    }

    #[test]
    fn test_unmount_cancels_timers() {
        let (context, scheduler, _surface, submenu) = submenu(SubMenuProps::new("More"));
        submenu.handle_mouse_enter().unwrap();
        submenu.unmount().unwrap();

        assert_eq!(scheduler.pending_timers().unwrap(), 0);
        assert_eq!(context.bus().listener_count().unwrap(), 0);
        assert!(matches!(submenu.unmount(), Err(MenuError::NotMounted(_))));
    }
}
