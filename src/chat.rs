//! Item hover tooltips in chat text components.

use crate::registry::SubstitutionRegistry;
use serde_json::Value;

fn shows_custom_item(registry: &SubstitutionRegistry, hover: &Value) -> bool {
    hover.get("action").and_then(Value::as_str) == Some("show_item")
        && hover
            .get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| registry.custom_item_by_id(id).is_some())
}

/// Removes every `show_item` hover event naming a custom item.
/// Returns whether anything was removed.
fn strip_hovers(registry: &SubstitutionRegistry, component: &mut Value) -> bool {
    match component {
        Value::Object(object) => {
            let mut changed = false;
            if object
                .get("hover_event")
                .is_some_and(|hover| shows_custom_item(registry, hover))
            {
                object.remove("hover_event");
                changed = true;
            }
            for child in object.values_mut() {
                changed |= strip_hovers(registry, child);
            }
            changed
        }
        Value::Array(children) => children
            .iter_mut()
            .fold(false, |changed, child| strip_hovers(registry, child) | changed),
        _ => false,
    }
}

/// Rewrites a JSON text component whose tree shows a custom item on
/// hover. `None` when the component is left as is, including when it
/// is not valid JSON.
pub fn strip_custom_item_hovers(registry: &SubstitutionRegistry, json: &str) -> Option<String> {
    let mut component: Value = match serde_json::from_str(json) {
        Ok(component) => component,
        Err(e) => {
            tracing::warn!("Chat component is not valid JSON: {e}");
            return None;
        }
    };
    if !strip_hovers(registry, &mut component) {
        return None;
    }
    Some(component.to_string())
}
