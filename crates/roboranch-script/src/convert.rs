//! Conversions between Rhai values and engine data.

use rhai::{Array, Dynamic, Map};
use roboranch_types::{Crop, MemoryValue, Position, Tile};

/// Deepest value tree a script may store.
const MAX_DEPTH: usize = 16;

/// Convert a script value into a storable memory value.
///
/// Only unit, booleans, numbers, strings, arrays, and object maps are
/// storable. Function pointers and engine handles are rejected.
pub fn to_memory(value: Dynamic) -> Result<MemoryValue, String> {
    to_memory_at(value, 0)
}

fn to_memory_at(value: Dynamic, depth: usize) -> Result<MemoryValue, String> {
    if depth > MAX_DEPTH {
        return Err(format!("value nests deeper than {MAX_DEPTH} levels"));
    }
    let next = depth.saturating_add(1);
    if value.is_unit() {
        return Ok(MemoryValue::Null);
    }
    if let Ok(b) = value.as_bool() {
        return Ok(MemoryValue::Bool(b));
    }
    if let Ok(i) = value.as_int() {
        return Ok(MemoryValue::Int(i));
    }
    if let Ok(f) = value.as_float() {
        return Ok(MemoryValue::Float(f));
    }
    if value.is_string() {
        return value
            .into_string()
            .map(MemoryValue::Text)
            .map_err(|ty| format!("cannot store {ty}"));
    }
    if value.is_array() {
        let items = value.into_array().map_err(|ty| format!("cannot store {ty}"))?;
        return items
            .into_iter()
            .map(|v| to_memory_at(v, next))
            .collect::<Result<Vec<_>, _>>()
            .map(MemoryValue::List);
    }
    if value.is_map() {
        let type_name = value.type_name();
        let map = value
            .try_cast::<Map>()
            .ok_or_else(|| format!("cannot store {type_name}"))?;
        return map
            .into_iter()
            .map(|(k, v)| to_memory_at(v, next).map(|m| (k.to_string(), m)))
            .collect::<Result<_, _>>()
            .map(MemoryValue::Map);
    }
    Err(format!("cannot store {}", value.type_name()))
}

/// Convert a stored memory value back into a script value.
pub fn from_memory(value: &MemoryValue) -> Dynamic {
    match value {
        MemoryValue::Null => Dynamic::UNIT,
        MemoryValue::Bool(b) => Dynamic::from_bool(*b),
        MemoryValue::Int(i) => Dynamic::from_int(*i),
        MemoryValue::Float(f) => Dynamic::from_float(*f),
        MemoryValue::Text(s) => Dynamic::from(s.clone()),
        MemoryValue::List(items) => {
            let array: Array = items.iter().map(from_memory).collect();
            Dynamic::from_array(array)
        }
        MemoryValue::Map(entries) => {
            let map: Map = entries
                .iter()
                .map(|(k, v)| (k.as_str().into(), from_memory(v)))
                .collect();
            Dynamic::from_map(map)
        }
    }
}

// ---------------------------------------------------------------------------
// Script-facing views
// ---------------------------------------------------------------------------

/// `#{ x, y }` for a position.
pub fn position_map(pos: Position) -> Map {
    let mut map = Map::new();
    map.insert("x".into(), Dynamic::from_int(i64::from(pos.x)));
    map.insert("y".into(), Dynamic::from_int(i64::from(pos.y)));
    map
}

/// Crop description returned by `find_crop` and `nearby`.
pub fn crop_map(crop: &Crop) -> Map {
    let mut map = Map::new();
    map.insert("species".into(), Dynamic::from(crop.species.clone()));
    map.insert("stage".into(), Dynamic::from_int(i64::from(crop.stage)));
    map.insert("stages".into(), Dynamic::from_int(i64::from(crop.stages)));
    map.insert("watered".into(), Dynamic::from_bool(crop.is_watered));
    map.insert("ready".into(), Dynamic::from_bool(crop.is_ready()));
    map
}

/// Tile description returned by `find_tile` and `nearby`.
pub fn tile_map(pos: Position, tile: &Tile) -> Map {
    let mut map = position_map(pos);
    map.insert("kind".into(), Dynamic::from(tile.kind.name().to_owned()));
    let crop = tile
        .crop
        .as_ref()
        .map_or(Dynamic::UNIT, |c| Dynamic::from_map(crop_map(c)));
    map.insert("crop".into(), crop);
    map
}

/// String-keyed counts as a script map.
pub fn count_map<'a>(counts: impl Iterator<Item = (&'a String, &'a u32)>) -> Map {
    counts
        .map(|(k, v)| (k.as_str().into(), Dynamic::from_int(i64::from(*v))))
        .collect()
}

// ---------------------------------------------------------------------------
// Filter field readers
// ---------------------------------------------------------------------------

/// Read a boolean field, treating absence as `false`.
pub fn flag(map: &Map, key: &str) -> Result<bool, String> {
    map.get(key).map_or(Ok(false), |v| {
        v.as_bool().map_err(|ty| format!("filter field `{key}` must be bool, got {ty}"))
    })
}

/// Read an optional integer field.
pub fn int(map: &Map, key: &str) -> Result<Option<i64>, String> {
    map.get(key).map_or(Ok(None), |v| {
        v.as_int()
            .map(Some)
            .map_err(|ty| format!("filter field `{key}` must be int, got {ty}"))
    })
}

/// Read an optional string field.
pub fn text(map: &Map, key: &str) -> Result<Option<String>, String> {
    map.get(key).map_or(Ok(None), |v| {
        v.clone()
            .into_string()
            .map(Some)
            .map_err(|ty| format!("filter field `{key}` must be string, got {ty}"))
    })
}
