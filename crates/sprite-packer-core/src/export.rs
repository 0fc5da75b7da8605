use crate::model::Manifest;
use crate::pipeline::SpriteLayout;
use serde_json::{Map, Value, json};

/// Serialize a manifest in its JSON interchange form.
/// Shape: `{ id: { width, height, x, y, pixelRatio, sdf?, content?, placeholder?, stretchX?, stretchY? } }`,
/// ids in ascending order. Aliased ids each get their own (identical) entry.
pub fn to_json_manifest(manifest: &Manifest) -> Value {
    let mut entries = Map::new();
    for (id, rec) in manifest.iter() {
        let mut entry = json!({
            "width": rec.width,
            "height": rec.height,
            "x": rec.x,
            "y": rec.y,
            "pixelRatio": rec.pixel_ratio,
        });
        if let Value::Object(fields) = &mut entry {
            if rec.sdf {
                fields.insert("sdf".into(), json!(true));
            }
            if let Some(content) = rec.metadata.content {
                fields.insert("content".into(), json!(content));
            }
            if let Some(placeholder) = rec.metadata.placeholder {
                fields.insert("placeholder".into(), json!(placeholder));
            }
            if !rec.metadata.stretch_x.is_empty() {
                fields.insert("stretchX".into(), json!(rec.metadata.stretch_x));
            }
            if !rec.metadata.stretch_y.is_empty() {
                fields.insert("stretchY".into(), json!(rec.metadata.stretch_y));
            }
        }
        entries.insert(id.to_string(), entry);
    }
    Value::Object(entries)
}

/// Serialize the image layout without pixel data.
/// Shape: `{ width, height, items: [ { id, x, y, width, height } ] }`, items in packing order.
pub fn to_json_layout(layout: &SpriteLayout) -> Value {
    let items: Vec<Value> = layout
        .placements()
        .map(|p| {
            json!({
                "id": p.id,
                "x": p.x,
                "y": p.y,
                "width": p.width,
                "height": p.height,
            })
        })
        .collect();
    json!({
        "width": layout.bin.width,
        "height": layout.bin.height,
        "items": items,
    })
}
