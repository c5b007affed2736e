//! Layering of YAML configuration values.
//!
//! `nbenv.local.yml` is applied on top of `nbenv.yml`:
//!
//! - mappings merge key by key, recursively
//! - sequences and scalars in the overlay replace the base value
//! - a `null` in the overlay removes the key

use serde_yaml::{Mapping, Value};

/// Apply `overlay` on top of `base` in place.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                if value.is_null() {
                    base_map.remove(&key);
                    continue;
                }
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Merge config layers in order; later layers win.
pub fn merge_configs<I>(layers: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    let mut merged = Value::Mapping(Mapping::new());
    for layer in layers {
        deep_merge(&mut merged, layer);
    }
    merged
}
