//! Show/hide payloads carried over the event bus
//!
//! The serialized shapes are the external contract: any trigger living outside
//! this crate publishes `{id, position: {x, y}, target, data}` to open a menu
//! and `{id?}` to close one.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ElementId;
use crate::layout::Point;

/// Identifies one logical menu
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuId(String);

impl MenuId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for MenuId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MenuId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for MenuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Arbitrary contextual data attached to a menu opening, plus the element
/// the user interacted with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ElementId>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl MenuData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_target(mut self, target: ElementId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_none() && self.fields.is_empty()
    }

    /// Shallow merge where `other` wins on conflicting keys
    pub fn merge(&self, other: &MenuData) -> MenuData {
        let mut fields = self.fields.clone();
        for (key, value) in &other.fields {
            fields.insert(key.clone(), value.clone());
        }
        MenuData {
            target: other.target.or(self.target),
            fields,
        }
    }
}

impl From<Map<String, Value>> for MenuData {
    fn from(fields: Map<String, Value>) -> Self {
        Self {
            target: None,
            fields,
        }
    }
}

/// Request to open the menu `id` at `position`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowEvent {
    pub id: MenuId,
    /// Client coordinates, already adjusted for trigger offsets
    pub position: Point,
    /// The trigger's own element
    pub target: Option<ElementId>,
    #[serde(default)]
    pub data: MenuData,
}

impl ShowEvent {
    pub fn new(id: impl Into<MenuId>, position: Point) -> Self {
        Self {
            id: id.into(),
            position,
            target: None,
            data: MenuData::default(),
        }
    }

    pub fn with_target(mut self, target: ElementId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_data(mut self, data: MenuData) -> Self {
        self.data = data;
        self
    }
}

/// Request to close menus; without an id every menu closes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HideEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MenuId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<MenuData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ElementId>,
}

impl HideEvent {
    /// Close every menu
    pub fn all() -> Self {
        Self::default()
    }

    /// Close only the menus registered under `id`
    pub fn for_menu(id: impl Into<MenuId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// The menu this hide is restricted to, if any; an empty id counts as none
    pub fn scope(&self) -> Option<&MenuId> {
        self.id.as_ref().filter(|id| !id.is_empty())
    }
}

/// The `detail` a hide handler receives
///
/// Bus hides carry a [`HideEvent`]; hides caused by native document events
/// (scroll, resize, a second context menu) carry either nothing or the
/// native event's numeric detail, and always mean "hide all".
#[derive(Debug, Clone, PartialEq)]
pub enum HideDetail {
    Absent,
    Native(i64),
    Payload(HideEvent),
}

impl HideDetail {
    pub fn scope(&self) -> Option<&MenuId> {
        match self {
            HideDetail::Payload(event) => event.scope(),
            HideDetail::Absent | HideDetail::Native(_) => None,
        }
    }

    /// Whether a menu registered under `id` should react to this hide
    pub fn applies_to(&self, id: &MenuId) -> bool {
        self.scope().map_or(true, |scope| scope == id)
    }
}

impl From<HideEvent> for HideDetail {
    fn from(event: HideEvent) -> Self {
        HideDetail::Payload(event)
    }
}

/// Everything the bus can carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BusEvent {
    Show(ShowEvent),
    Hide(HideEvent),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_show_event_wire_shape() {
        let event = ShowEvent::new("ctx1", Point::new(120.0, 80.0))
            .with_target(ElementId(7))
            .with_data(MenuData::new().with("row", 3).with_target(ElementId(9)));

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "ctx1",
                "position": {"x": 120.0, "y": 80.0},
                "target": 7,
                "data": {"target": 9, "row": 3},
            })
        );
    }

    #[test]
    fn test_hide_event_from_external_json() {
        let event: BusEvent =
            serde_json::from_value(json!({"kind": "hide", "id": "ctx2"})).unwrap();
        assert_eq!(event, BusEvent::Hide(HideEvent::for_menu("ctx2")));

        let all: HideEvent = serde_json::from_value(json!({})).unwrap();
        assert_eq!(all.scope(), None);
    }

    #[test]
    fn test_hide_scope() {
        let ctx1 = MenuId::new("ctx1");

        assert!(HideDetail::Absent.applies_to(&ctx1));
        assert!(HideDetail::Native(1).applies_to(&ctx1));
        assert!(HideDetail::from(HideEvent::all()).applies_to(&ctx1));
        assert!(HideDetail::from(HideEvent::for_menu("")).applies_to(&ctx1));
        assert!(HideDetail::from(HideEvent::for_menu("ctx1")).applies_to(&ctx1));
        assert!(!HideDetail::from(HideEvent::for_menu("ctx2")).applies_to(&ctx1));
    }

    #[test]
    fn test_merge_prefers_right_hand_side() {
        let base = MenuData::new().with("a", 1).with("b", 1).with_target(ElementId(1));
        let over = MenuData::new().with("b", 2);

        let merged = base.merge(&over);
        assert_eq!(merged.get("a"), Some(&json!(1)));
        assert_eq!(merged.get("b"), Some(&json!(2)));
        assert_eq!(merged.target, Some(ElementId(1)));
    }
}
