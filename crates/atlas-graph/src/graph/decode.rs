//! Layout blob decoding
//!
//! Two trust levels, two policies:
//!
//! - `decode_layout` (load path, data we wrote ourselves): accepts the
//!   `{positions, labelAnchors, layoutName}` envelope or the legacy flat
//!   `{id: {x, y}}` map, and silently drops entries that are not finite
//!   numbers. Only a wholly unusable document is an error, which the caller
//!   treats as "absent".
//! - `validate_import` (user-supplied file): requires the envelope, a
//!   non-empty `positions` object, and finite numeric `x`/`y` on every entry.
//!   Anything else is rejected with a reason.

use atlas_types::{LabelAnchor, LayoutBlob, Position};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a layout document was not accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidLayout {
    #[error("not valid JSON: {0}")]
    NotJson(String),

    #[error("layout must be a JSON object")]
    NotAnObject,

    #[error("\"positions\" must be an object")]
    PositionsNotAnObject,

    #[error("no \"positions\" mapping found")]
    MissingPositions,

    #[error("\"positions\" is empty")]
    Empty,

    #[error("position for {id:?} does not have numeric x/y")]
    NonNumericEntry { id: String },
}

/// A blob read on the load path, with repair accounting
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedLayout {
    pub blob: LayoutBlob,
    /// Entries dropped because x/y were missing or not finite
    pub dropped: usize,
    /// Read from the legacy flat shape
    pub legacy: bool,
}

/// Decode a persisted blob (lenient)
pub fn decode_layout(text: &str) -> Result<DecodedLayout, InvalidLayout> {
    let root = parse_object(text)?;

    let (entries, legacy) = match root.get("positions") {
        Some(Value::Object(positions)) => (positions, false),
        Some(_) => return Err(InvalidLayout::PositionsNotAnObject),
        None => (&root, true),
    };

    let mut positions = BTreeMap::new();
    let mut dropped = 0;
    for (id, value) in entries {
        match position_from_value(value) {
            Some(pos) => {
                positions.insert(id.clone(), pos);
            }
            None => dropped += 1,
        }
    }

    // A flat object where nothing looks like a position is not a layout
    if legacy && positions.is_empty() && !entries.is_empty() {
        return Err(InvalidLayout::MissingPositions);
    }

    let blob = if legacy {
        LayoutBlob {
            positions,
            ..Default::default()
        }
    } else {
        LayoutBlob {
            positions,
            label_anchors: anchors_from_root(&root),
            layout_name: layout_name_from_root(&root),
        }
    };

    Ok(DecodedLayout {
        blob,
        dropped,
        legacy,
    })
}

/// Validate a user-supplied import (strict)
pub fn validate_import(text: &str) -> Result<LayoutBlob, InvalidLayout> {
    let root = parse_object(text)?;

    let entries = match root.get("positions") {
        Some(Value::Object(positions)) => positions,
        Some(_) => return Err(InvalidLayout::PositionsNotAnObject),
        None => return Err(InvalidLayout::MissingPositions),
    };
    if entries.is_empty() {
        return Err(InvalidLayout::Empty);
    }

    let mut positions = BTreeMap::new();
    for (id, value) in entries {
        let pos =
            position_from_value(value).ok_or_else(|| InvalidLayout::NonNumericEntry { id: id.clone() })?;
        positions.insert(id.clone(), pos);
    }

    Ok(LayoutBlob {
        positions,
        label_anchors: anchors_from_root(&root),
        layout_name: layout_name_from_root(&root),
    })
}

/// Serialize a blob in the envelope shape
pub fn encode_layout(blob: &LayoutBlob) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(blob)
}

// =============================================================================
// HELPERS
// =============================================================================

fn parse_object(text: &str) -> Result<Map<String, Value>, InvalidLayout> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| InvalidLayout::NotJson(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(InvalidLayout::NotAnObject),
    }
}

fn position_from_value(value: &Value) -> Option<Position> {
    let obj = value.as_object()?;
    let x = obj.get("x")?.as_f64()? as f32;
    let y = obj.get("y")?.as_f64()? as f32;
    let pos = Position::new(x, y);
    pos.is_finite().then_some(pos)
}

/// Unknown anchor strings are skipped
fn anchors_from_root(root: &Map<String, Value>) -> BTreeMap<String, LabelAnchor> {
    root.get("labelAnchors")
        .and_then(Value::as_object)
        .map(|anchors| {
            anchors
                .iter()
                .filter_map(|(id, v)| Some((id.clone(), LabelAnchor::parse(v.as_str()?)?)))
                .collect()
        })
        .unwrap_or_default()
}

fn layout_name_from_root(root: &Map<String, Value>) -> Option<String> {
    root.get("layoutName")
        .and_then(Value::as_str)
        .map(str::to_string)
}
