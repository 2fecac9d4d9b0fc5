//! Element that opens a context menu
//!
//! The host forwards the trigger element's pointer and touch events to a
//! [`ContextMenuTrigger`]. A click with the configured button, a native
//! context-menu event, or holding the primary button or a finger down for
//! `hold_to_display` milliseconds publishes a hide-all followed by a show for
//! the trigger's menu id.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::callback::Callback;
use crate::context::MenuContext;
use crate::error::{lock, report, MenuError};
use crate::events::{ElementId, MenuData, MenuId, MouseButton, PointerEvent, ShowEvent, TouchEvent};
use crate::layout::Point;
use crate::scheduler::{cancel_slot, TaskHandle};

/// Result of a trigger's `collect` hook
pub enum Collected {
    Ready(MenuData),
    /// Published once the future resolves
    Pending(BoxFuture<'static, MenuData>),
}

impl fmt::Debug for Collected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collected::Ready(data) => f.debug_tuple("Ready").field(data).finish(),
            Collected::Pending(_) => f.write_str("Pending"),
        }
    }
}

impl From<MenuData> for Collected {
    fn from(data: MenuData) -> Self {
        Collected::Ready(data)
    }
}

/// Trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TriggerProps {
    /// Menu to open
    pub id: MenuId,
    /// The trigger's own element, published as the show's target
    #[serde(skip)]
    pub element: Option<ElementId>,
    /// Milliseconds to hold before opening; negative disables holding
    pub hold_to_display: i64,
    pub mouse_button: MouseButton,
    pub disable: bool,
    pub disable_if_shift_is_pressed: bool,
    /// Subtracted from the event's x coordinate
    pub pos_x: f32,
    /// Subtracted from the event's y coordinate
    pub pos_y: f32,
    /// Gathers the data published with the show
    #[serde(skip)]
    pub collect: Option<Callback<TriggerProps, Collected>>,
    /// Any other attributes, handed to `collect` along with the rest
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Default for TriggerProps {
    fn default() -> Self {
        Self {
            id: MenuId::default(),
            element: None,
            hold_to_display: 1000,
            mouse_button: MouseButton::Right,
            disable: false,
            disable_if_shift_is_pressed: false,
            pos_x: 0.0,
            pos_y: 0.0,
            collect: None,
            attributes: Map::new(),
        }
    }
}

impl TriggerProps {
    pub fn new(id: impl Into<MenuId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_element(mut self, element: ElementId) -> Self {
        self.element = Some(element);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn collect(
        mut self,
        collect: impl Fn(TriggerProps) -> Collected + Send + Sync + 'static,
    ) -> Self {
        self.collect = Some(Callback::new(collect));
        self
    }

    /// Hold delay, or `None` when holding is disabled
    pub fn hold_delay(&self) -> Option<Duration> {
        u64::try_from(self.hold_to_display)
            .ok()
            .map(Duration::from_millis)
    }

    /// The props as menu data, attributes included
    pub fn to_data(&self) -> Result<MenuData, MenuError> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(MenuData::from(fields)),
            _ => Ok(MenuData::default()),
        }
    }
}

enum Input<'a> {
    Pointer(&'a mut PointerEvent),
    Touch(&'a mut TouchEvent),
}

impl Input<'_> {
    fn shift(&self) -> bool {
        match self {
            Input::Pointer(e) => e.modifiers.shift,
            Input::Touch(e) => e.modifiers.shift,
        }
    }

    fn consume(&mut self) {
        match self {
            Input::Pointer(e) => {
                e.prevent_default();
                e.stop_propagation();
            }
            Input::Touch(e) => {
                e.prevent_default();
                e.stop_propagation();
            }
        }
    }

    /// Client coordinates of a mouse event, or the first touch point
    fn position(&self) -> Point {
        match self {
            Input::Pointer(e) => e.position,
            Input::Touch(e) => e
                .touches
                .first()
                .map_or(Point::zero(), |touch| Point::new(touch.x, touch.y)),
        }
    }

    fn target(&self) -> Option<ElementId> {
        match self {
            Input::Pointer(e) => e.target,
            Input::Touch(e) => e.target,
        }
    }
}

#[derive(Default)]
struct TriggerState {
    mouse_hold: Option<TaskHandle>,
    touch_hold: Option<TaskHandle>,
    touch_handled: bool,
}

struct TriggerInner {
    props: TriggerProps,
    context: MenuContext,
    state: Mutex<TriggerState>,
    self_ref: Weak<TriggerInner>,
}

/// Opens the menu `props.id` from pointer and touch input
#[derive(Clone)]
pub struct ContextMenuTrigger {
    inner: Arc<TriggerInner>,
}

impl fmt::Debug for ContextMenuTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextMenuTrigger")
            .field("id", &self.inner.props.id)
            .finish_non_exhaustive()
    }
}

impl ContextMenuTrigger {
    pub fn new(context: &MenuContext, props: TriggerProps) -> Self {
        let inner = Arc::new_cyclic(|weak| TriggerInner {
            props,
            context: context.clone(),
            state: Mutex::new(TriggerState::default()),
            self_ref: weak.clone(),
        });
        Self { inner }
    }

    pub fn props(&self) -> &TriggerProps {
        &self.inner.props
    }

    /// Primary-button press starts the hold timer
    pub fn handle_mouse_down(&self, event: &mut PointerEvent) -> Result<(), MenuError> {
        let inner = &self.inner;
        let Some(delay) = inner.props.hold_delay() else {
            return Ok(());
        };
        if event.button != MouseButton::Left {
            return Ok(());
        }
        event.stop_propagation();

        let scheduler = inner.context.scheduler();
        let mut state = lock(&inner.state, "trigger state")?;
        cancel_slot(scheduler, &mut state.mouse_hold)?;

        let weak = inner.self_ref.clone();
        let mut held = event.clone();
        state.mouse_hold = Some(scheduler.set_timeout(
            delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    report("trigger hold", inner.mouse_hold_elapsed(&mut held));
                }
            }),
        )?);
        Ok(())
    }

    pub fn handle_mouse_up(&self, event: &PointerEvent) -> Result<(), MenuError> {
        self.cancel_mouse_hold(event)
    }

    pub fn handle_mouse_out(&self, event: &PointerEvent) -> Result<(), MenuError> {
        self.cancel_mouse_hold(event)
    }

    fn cancel_mouse_hold(&self, event: &PointerEvent) -> Result<(), MenuError> {
        if event.button != MouseButton::Left {
            return Ok(());
        }
        let mut state = lock(&self.inner.state, "trigger state")?;
        cancel_slot(self.inner.context.scheduler(), &mut state.mouse_hold)
    }

    /// Touch start begins the same hold timer as the primary button
    pub fn handle_touch_start(&self, event: &mut TouchEvent) -> Result<(), MenuError> {
        let inner = &self.inner;
        let scheduler = inner.context.scheduler();
        let mut state = lock(&inner.state, "trigger state")?;
        state.touch_handled = false;

        let Some(delay) = inner.props.hold_delay() else {
            return Ok(());
        };
        event.stop_propagation();
        cancel_slot(scheduler, &mut state.touch_hold)?;

        let weak = inner.self_ref.clone();
        let mut held = event.clone();
        state.touch_hold = Some(scheduler.set_timeout(
            delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    report("trigger touch hold", inner.touch_hold_elapsed(&mut held));
                }
            }),
        )?);
        Ok(())
    }

    /// Touch end cancels the hold; after a completed hold it also suppresses
    /// the emulated click
    pub fn handle_touch_end(&self, event: &mut TouchEvent) -> Result<(), MenuError> {
        let mut state = lock(&self.inner.state, "trigger state")?;
        if state.touch_handled {
            event.prevent_default();
        }
        cancel_slot(self.inner.context.scheduler(), &mut state.touch_hold)
    }

    /// Native context-menu event on the trigger element
    pub fn handle_context_menu(&self, event: &mut PointerEvent) -> Result<(), MenuError> {
        self.fire_on_configured_button(event)
    }

    pub fn handle_click(&self, event: &mut PointerEvent) -> Result<(), MenuError> {
        self.fire_on_configured_button(event)
    }

    fn fire_on_configured_button(&self, event: &mut PointerEvent) -> Result<(), MenuError> {
        if event.button == self.inner.props.mouse_button {
            self.inner.fire(Input::Pointer(event))?;
        }
        Ok(())
    }

    /// Cancel pending hold timers
    pub fn unmount(&self) -> Result<(), MenuError> {
        let scheduler = self.inner.context.scheduler();
        let mut state = lock(&self.inner.state, "trigger state")?;
        cancel_slot(scheduler, &mut state.mouse_hold)?;
        cancel_slot(scheduler, &mut state.touch_hold)
    }
}

impl TriggerInner {
    fn mouse_hold_elapsed(&self, event: &mut PointerEvent) -> Result<(), MenuError> {
        lock(&self.state, "trigger state")?.mouse_hold = None;
        self.fire(Input::Pointer(event))
    }

    fn touch_hold_elapsed(&self, event: &mut TouchEvent) -> Result<(), MenuError> {
        lock(&self.state, "trigger state")?.touch_hold = None;
        self.fire(Input::Touch(event))?;
        lock(&self.state, "trigger state")?.touch_handled = true;
        Ok(())
    }

    /// Publish hide-all, then show this trigger's menu
    fn fire(&self, mut input: Input<'_>) -> Result<(), MenuError> {
        let props = &self.props;
        if props.disable {
            return Ok(());
        }
        if props.disable_if_shift_is_pressed && input.shift() {
            return Ok(());
        }
        input.consume();

        let position = input.position();
        let position = Point::new(position.x - props.pos_x, position.y - props.pos_y);
        let clicked = input.target();

        let bus = self.context.bus();
        bus.hide_all()?;

        let collected = match &props.collect {
            Some(collect) => collect.call(props.clone()),
            None => Collected::Ready(MenuData::default()),
        };

        match collected {
            Collected::Ready(data) => {
                log::debug!("trigger opening menu {}", props.id);
                bus.show_menu(self.show_event(position, data, clicked))
            }
            Collected::Pending(future) => {
                log::debug!("trigger collecting data for menu {}", props.id);
                let bus = bus.clone();
                let event = self.show_event(position, MenuData::default(), clicked);
                self.context.scheduler().spawn(
                    async move {
                        let data = future.await;
                        report(
                            "collected show",
                            bus.show_menu(ShowEvent {
                                data: MenuData { target: clicked, ..data },
                                ..event
                            }),
                        );
                    }
                    .boxed(),
                )
            }
        }
    }

    fn show_event(&self, position: Point, data: MenuData, clicked: Option<ElementId>) -> ShowEvent {
        ShowEvent {
            id: self.props.id.clone(),
            position,
            target: self.props.element,
            data: MenuData {
                target: clicked,
                ..data
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{BusEvent, HideEvent, Modifiers, Touch};
    use crate::layout::Size;
    use crate::scheduler::ManualScheduler;
    use futures::channel::oneshot;

    fn recorder(context: &MenuContext) -> Arc<Mutex<Vec<BusEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let shows = events.clone();
        let hides = events.clone();
        context
            .bus()
            .register(
                move |show: &ShowEvent| shows.lock().unwrap().push(BusEvent::Show(show.clone())),
                move |hide: &HideEvent| hides.lock().unwrap().push(BusEvent::Hide(hide.clone())),
            )
            .unwrap();
        events
    }

    fn setup(
        props: TriggerProps,
    ) -> (
        MenuContext,
        ManualScheduler,
        ContextMenuTrigger,
        Arc<Mutex<Vec<BusEvent>>>,
    ) {
        let (context, scheduler) = MenuContext::manual(Size::new(800.0, 600.0));
        let events = recorder(&context);
        let trigger = ContextMenuTrigger::new(&context, props);
        (context, scheduler, trigger, events)
    }

    fn right_click(x: f32, y: f32) -> PointerEvent {
        PointerEvent::new(Point::new(x, y), MouseButton::Right).with_target(ElementId(42))
    }

    #[test]
    fn test_props_from_json() {
        let props: TriggerProps = serde_json::from_str(
            r#"{"id": "ctx1", "holdToDisplay": -1, "mouseButton": 0, "posX": 4, "row": 3}"#,
        )
        .unwrap();
        assert_eq!(props.id, MenuId::new("ctx1"));
        assert_eq!(props.hold_delay(), None);
        assert_eq!(props.mouse_button, MouseButton::Left);
        assert_eq!(props.pos_x, 4.0);
        assert_eq!(props.attributes.get("row"), Some(&serde_json::json!(3)));
        assert_eq!(
            TriggerProps::default().hold_delay(),
            Some(Duration::from_millis(1000))
        );
    }

    #[test]
    fn test_right_click_publishes_hide_then_show() {
        let (_context, _scheduler, trigger, events) =
            setup(TriggerProps::new("ctx1").with_element(ElementId(1)));

        let mut event = right_click(120.0, 80.0);
        trigger.handle_context_menu(&mut event).unwrap();
        assert!(event.is_default_prevented());
        assert!(event.is_propagation_stopped());

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], BusEvent::Hide(HideEvent::all()));
        let BusEvent::Show(show) = &events[1] else {
            panic!("expected a show");
        };
        assert_eq!(show.id, MenuId::new("ctx1"));
        assert_eq!(show.position, Point::new(120.0, 80.0));
        assert_eq!(show.target, Some(ElementId(1)));
        assert_eq!(show.data.target, Some(ElementId(42)));
    }

    #[test]
    fn test_other_buttons_are_ignored() {
        let (_context, _scheduler, trigger, events) = setup(TriggerProps::new("ctx1"));
        let mut event = PointerEvent::new(Point::zero(), MouseButton::Left);
        trigger.handle_click(&mut event).unwrap();
        assert!(events.lock().unwrap().is_empty());
        assert!(!event.is_default_prevented());
    }

    #[test]
    fn test_offsets_are_subtracted() {
        let props = TriggerProps {
            pos_x: 20.0,
            pos_y: 30.0,
            ..TriggerProps::new("ctx1")
        };
        let (_context, _scheduler, trigger, events) = setup(props);
        trigger.handle_click(&mut right_click(120.0, 80.0)).unwrap();

        let events = events.lock().unwrap();
        let BusEvent::Show(show) = &events[1] else {
            panic!("expected a show");
        };
        assert_eq!(show.position, Point::new(100.0, 50.0));
    }

    #[test]
    fn test_disable_guards() {
        let props = TriggerProps {
            disable: true,
            ..TriggerProps::new("ctx1")
        };
        let (_context, _scheduler, trigger, events) = setup(props);
        let mut event = right_click(0.0, 0.0);
        trigger.handle_context_menu(&mut event).unwrap();
        assert!(events.lock().unwrap().is_empty());
        assert!(!event.is_default_prevented());

        let props = TriggerProps {
            disable_if_shift_is_pressed: true,
            ..TriggerProps::new("ctx1")
        };
        let (_context, _scheduler, trigger, events) = setup(props);
        let mut shifted = right_click(0.0, 0.0).with_modifiers(Modifiers {
            shift: true,
            ..Modifiers::default()
        });
        trigger.handle_context_menu(&mut shifted).unwrap();
        assert!(events.lock().unwrap().is_empty());

        trigger.handle_context_menu(&mut right_click(0.0, 0.0)).unwrap();
        assert_eq!(events.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_hold_fires_after_delay_and_mouse_up_cancels() {
        let (_context, scheduler, trigger, events) = setup(TriggerProps::new("ctx1"));

        let mut down = PointerEvent::new(Point::new(5.0, 6.0), MouseButton::Left);
        trigger.handle_mouse_down(&mut down).unwrap();
        assert!(down.is_propagation_stopped());
        scheduler.advance(Duration::from_millis(500)).unwrap();
        trigger
            .handle_mouse_up(&PointerEvent::new(Point::zero(), MouseButton::Left))
            .unwrap();
        scheduler.advance(Duration::from_secs(1)).unwrap();
        assert!(events.lock().unwrap().is_empty());

        trigger.handle_mouse_down(&mut down).unwrap();
        scheduler.advance(Duration::from_millis(1000)).unwrap();
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        let BusEvent::Show(show) = &events[1] else {
            panic!("expected a show");
        };
        assert_eq!(show.position, Point::new(5.0, 6.0));
    }

    #[test]
    fn test_mouse_out_cancels_hold() {
        let (_context, scheduler, trigger, events) = setup(TriggerProps::new("ctx1"));
        trigger
            .handle_mouse_down(&mut PointerEvent::new(Point::zero(), MouseButton::Left))
            .unwrap();
        trigger
            .handle_mouse_out(&PointerEvent::new(Point::zero(), MouseButton::Right))
            .unwrap();
        assert_eq!(scheduler.pending_timers().unwrap(), 1);

        trigger
            .handle_mouse_out(&PointerEvent::new(Point::zero(), MouseButton::Left))
            .unwrap();
        assert_eq!(scheduler.pending_timers().unwrap(), 0);
        scheduler.advance(Duration::from_secs(2)).unwrap();
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_negative_hold_disables_holding() {
        let props = TriggerProps {
            hold_to_display: -1,
            ..TriggerProps::new("ctx1")
        };
        let (_context, scheduler, trigger, _events) = setup(props);
        let mut down = PointerEvent::new(Point::zero(), MouseButton::Left);
        trigger.handle_mouse_down(&mut down).unwrap();
        assert!(!down.is_propagation_stopped());
        assert_eq!(scheduler.pending_timers().unwrap(), 0);
    }

    #[test]
    fn test_touch_hold_uses_first_touch_and_marks_handled() {
        let (_context, scheduler, trigger, events) = setup(TriggerProps::new("ctx1"));

        let mut start = TouchEvent::new(vec![
            Touch { id: 1, x: 30.0, y: 40.0 },
            Touch { id: 2, x: 90.0, y: 90.0 },
        ]);
        trigger.handle_touch_start(&mut start).unwrap();
        scheduler.advance(Duration::from_millis(1000)).unwrap();

        let mut end = TouchEvent::new(Vec::new());
        trigger.handle_touch_end(&mut end).unwrap();
        assert!(end.is_default_prevented());

        let events = events.lock().unwrap();
        let BusEvent::Show(show) = &events[1] else {
            panic!("expected a show");
        };
        assert_eq!(show.position, Point::new(30.0, 40.0));
    }

    #[test]
    fn test_quick_tap_is_not_handled() {
        let (_context, scheduler, trigger, events) = setup(TriggerProps::new("ctx1"));
        trigger.handle_touch_start(&mut TouchEvent::new(Vec::new())).unwrap();
        let mut end = TouchEvent::new(Vec::new());
        trigger.handle_touch_end(&mut end).unwrap();
        scheduler.advance(Duration::from_secs(2)).unwrap();

        assert!(!end.is_default_prevented());
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_ready_collect_data_keeps_clicked_target() {
        let props = TriggerProps::new("ctx1")
            .with_attribute("row", 7)
            .collect(|props| Collected::Ready(props.to_data().unwrap().with_target(ElementId(1))));
        let (_context, _scheduler, trigger, events) = setup(props);
        trigger.handle_click(&mut right_click(0.0, 0.0)).unwrap();

        let events = events.lock().unwrap();
        let BusEvent::Show(show) = &events[1] else {
            panic!("expected a show");
        };
        assert_eq!(show.data.get("row"), Some(&serde_json::json!(7)));
        assert_eq!(show.data.get("holdToDisplay"), Some(&serde_json::json!(1000)));
        assert_eq!(show.data.target, Some(ElementId(42)));
    }

    #[test]
    fn test_pending_collect_defers_show() {
        let (tx, rx) = oneshot::channel::<MenuData>();
        let rx = Mutex::new(Some(rx));
        let props = TriggerProps::new("ctx1").collect(move |_| {
            let rx = rx.lock().unwrap().take().unwrap();
            Collected::Pending(async move { rx.await.unwrap_or_default() }.boxed())
        });
        let (_context, scheduler, trigger, events) = setup(props);

        trigger.handle_click(&mut right_click(1.0, 2.0)).unwrap();
        scheduler.poll_futures().unwrap();
        assert_eq!(events.lock().unwrap().len(), 1);

        tx.send(MenuData::new().with("row", 9)).unwrap();
        scheduler.poll_futures().unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        let BusEvent::Show(show) = &events[1] else {
            panic!("expected a show");
        };
        assert_eq!(show.data.get("row"), Some(&serde_json::json!(9)));
        assert_eq!(show.data.target, Some(ElementId(42)));
        assert_eq!(show.position, Point::new(1.0, 2.0));
    }

    #[test]
    fn test_unmount_cancels_hold() {
        let (_context, scheduler, trigger, events) = setup(TriggerProps::new("ctx1"));
        trigger
            .handle_mouse_down(&mut PointerEvent::new(Point::zero(), MouseButton::Left))
            .unwrap();
        trigger.unmount().unwrap();
        scheduler.advance(Duration::from_secs(2)).unwrap();
        assert!(events.lock().unwrap().is_empty());
    }
}
