//! Binding between a menu renderer and the trigger that opened it
//!
//! A [`MenuConnection`] follows the bus for one menu id and exposes the data
//! of the last show addressed to it, minus the keys a trigger uses for its own
//! configuration. Any hide clears it.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::callback::Callback;
use crate::error::{lock, MenuError};
use crate::events::{EventBus, MenuData, MenuId, RegistrationId};

/// Trigger configuration keys never forwarded to the menu
pub const RESERVED_TRIGGER_KEYS: [&str; 11] = [
    "id",
    "children",
    "attributes",
    "collect",
    "disable",
    "holdToDisplay",
    "posX",
    "posY",
    "renderTag",
    "mouseButton",
    "disableIfShiftIsPressed",
];

/// `data` without the reserved trigger keys
pub fn filter_trigger_data(data: &MenuData) -> MenuData {
    MenuData {
        target: data.target,
        fields: data
            .fields
            .iter()
            .filter(|(key, _)| !RESERVED_TRIGGER_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    }
}

/// Live view of the trigger data for one menu
pub struct MenuConnection {
    menu_id: MenuId,
    bus: EventBus,
    registration: RegistrationId,
    trigger: Arc<Mutex<Option<MenuData>>>,
}

impl fmt::Debug for MenuConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuConnection")
            .field("menu_id", &self.menu_id)
            .field("registration", &self.registration)
            .finish_non_exhaustive()
    }
}

impl MenuConnection {
    /// Start following `menu_id`; `on_change` sees every update
    pub fn connect(
        bus: &EventBus,
        menu_id: impl Into<MenuId>,
        on_change: Option<Callback<Option<MenuData>>>,
    ) -> Result<Self, MenuError> {
        let menu_id = menu_id.into();
        let trigger = Arc::new(Mutex::new(None));

        let show_id = menu_id.clone();
        let show_slot = trigger.clone();
        let show_change = on_change.clone();
        let hide_slot = trigger.clone();
        let registration = bus.register(
            move |show| {
                if show.id != show_id {
                    return;
                }
                let data = filter_trigger_data(&show.data);
                update(&show_slot, Some(data), show_change.as_ref());
            },
            move |_| update(&hide_slot, None, on_change.as_ref()),
        )?;

        log::trace!("connected {registration} to menu {menu_id}");
        Ok(Self {
            menu_id,
            bus: bus.clone(),
            registration,
            trigger,
        })
    }

    pub fn menu_id(&self) -> &MenuId {
        &self.menu_id
    }

    /// Data of the trigger that opened the menu, if it is open
    pub fn trigger(&self) -> Result<Option<MenuData>, MenuError> {
        Ok(lock(&self.trigger, "menu connection")?.clone())
    }

    /// Stop following the bus
    pub fn disconnect(&self) -> Result<(), MenuError> {
        self.bus.unregister(self.registration)
    }
}

fn update(
    slot: &Mutex<Option<MenuData>>,
    value: Option<MenuData>,
    on_change: Option<&Callback<Option<MenuData>>>,
) {
    match slot.lock() {
        Ok(mut slot) => *slot = value.clone(),
        Err(_) => {
            log::warn!("menu connection state is poisoned");
            return;
        }
    }
    if let Some(on_change) = on_change {
        on_change.call(value);
    }
}
