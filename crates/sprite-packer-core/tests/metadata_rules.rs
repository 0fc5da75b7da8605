use serde_json::{Value, json};
use sprite_packer_core::prelude::*;

#[test]
fn accepts_valid_metadata() {
    let img = json!({ "width": 24, "height": 18 });
    for meta in [
        json!({}),
        json!({ "content": [2, 2, 22, 16] }),
        json!({ "content": [0, 0, 24, 18] }),
        json!({ "stretchX": [] }),
        json!({ "stretchX": [[10, 14]] }),
        json!({ "stretchY": [[8, 10]] }),
        json!({ "stretchX": [[0, 2], [2, 4]] }),
        json!({ "stretchX": [[0, 2.5], [10, 24]], "stretchY": [[0, 18]] }),
    ] {
        assert_eq!(validate_metadata(&img, &meta), Ok(()), "rejected {meta}");
    }
}

#[test]
fn rejects_invalid_metadata_with_first_violation() {
    let valid = json!({ "width": 24, "height": 18 });
    let cases: Vec<(Value, Value, &str)> = vec![
        (Value::Null, Value::Null, "image is invalid"),
        (json!({}), Value::Null, "image has invalid metadata"),
        (json!({}), json!({}), "image has invalid width"),
        (json!({ "width": 0 }), json!({}), "image has invalid width"),
        (json!({ "width": -3 }), json!({}), "image has invalid width"),
        (json!({ "width": 32 }), json!({}), "image has invalid height"),
        (json!({ "width": 32, "height": {} }), json!({}), "image has invalid height"),
        (json!({ "width": 32, "height": -32 }), json!({}), "image has invalid height"),
        (valid.clone(), json!({ "content": {} }), "image content area must be an array of 4 numbers"),
        (valid.clone(), json!({ "content": [] }), "image content area must be an array of 4 numbers"),
        (valid.clone(), json!({ "content": [1, 2, 3] }), "image content area must be an array of 4 numbers"),
        (valid.clone(), json!({ "content": [1, 2, 3, 4, 5] }), "image content area must be an array of 4 numbers"),
        (valid.clone(), json!({ "content": [1, 2, 3, true] }), "image content area must be an array of 4 numbers"),
        (valid.clone(), json!({ "content": [4, 4, 4, 4] }), "image content area must be positive"),
        (valid.clone(), json!({ "content": [4, 4, 2, 2] }), "image content area must be positive"),
        (valid.clone(), json!({ "content": [0, 0, 25, 18] }), "image content area must be within image bounds"),
        (valid.clone(), json!({ "content": [0, 0, 24, 19] }), "image content area must be within image bounds"),
        (valid.clone(), json!({ "content": [-1, 0, 24, 18] }), "image content area must be within image bounds"),
        (valid.clone(), json!({ "content": [0, -1, 24, 18] }), "image content area must be within image bounds"),
        (valid.clone(), json!({ "stretchX": {} }), "image stretchX zones must be an array"),
        (valid.clone(), json!({ "stretchX": ["yes"] }), "image stretchX zone must consist of two numbers"),
        (valid.clone(), json!({ "stretchX": [[]] }), "image stretchX zone must consist of two numbers"),
        (valid.clone(), json!({ "stretchX": [[4, 4, 4]] }), "image stretchX zone must consist of two numbers"),
        (valid.clone(), json!({ "stretchX": [[4, 5], [6, null]] }), "image stretchX zone must consist of two numbers"),
        (valid.clone(), json!({ "stretchX": [[4, 4]] }), "image stretchX zone may not be zero-size"),
        (valid.clone(), json!({ "stretchX": [[8, 4]] }), "image stretchX zone may not be zero-size"),
        (valid.clone(), json!({ "stretchX": [[-2, 2]] }), "image stretchX zone must be within image bounds"),
        (valid.clone(), json!({ "stretchX": [[0, 25]] }), "image stretchX zone must be within image bounds"),
        (valid.clone(), json!({ "stretchX": [[0, 24.999]] }), "image stretchX zone must be within image bounds"),
        (valid.clone(), json!({ "stretchX": [[0, 2], [1, 3]] }), "image stretchX zones may not overlap"),
        (valid.clone(), json!({ "stretchX": [[0, 24], [8, 16]] }), "image stretchX zones may not overlap"),
        (valid.clone(), json!({ "stretchX": [[18, 24], [0, 6]] }), "image stretchX zones may not overlap"),
        (valid.clone(), json!({ "stretchY": "no" }), "image stretchY zones must be an array"),
        (valid.clone(), json!({ "stretchY": [[0, 20]] }), "image stretchY zone must be within image bounds"),
    ];
    for (img, meta, message) in cases {
        let err = validate_metadata(&img, &meta).expect_err("should be rejected");
        assert_eq!(err.to_string(), message, "icon {img}, metadata {meta}");
    }
}

#[test]
fn content_is_checked_before_zones() {
    let img = json!({ "width": 24, "height": 18 });
    let meta = json!({ "content": [0, 0, 30, 18], "stretchX": [[4, 4]] });
    assert_eq!(
        validate_metadata(&img, &meta),
        Err(MetadataError::ContentOutOfBounds)
    );
}

#[test]
fn typed_metadata_uses_icon_size() {
    let meta = IconMetadata {
        content: Some([2.0, 5.0, 18.0, 18.0]),
        placeholder: None,
        stretch_x: vec![[4.0, 16.0]],
        stretch_y: vec![[5.0, 16.0]],
    };
    assert_eq!(meta.validate(20, 23), Ok(()));
    assert_eq!(meta.validate(0, 23), Err(MetadataError::InvalidWidth));
    assert_eq!(meta.validate(20, 0), Err(MetadataError::InvalidHeight));
    assert_eq!(
        meta.validate(20, 15),
        Err(MetadataError::ContentOutOfBounds)
    );
    // stretchY is bounded by the height, not the width.
    let tall = IconMetadata {
        stretch_y: vec![[0.0, 30.0]],
        ..Default::default()
    };
    assert_eq!(
        tall.validate(40, 24),
        Err(MetadataError::ZoneOutOfBounds(Axis::Y))
    );
    assert_eq!(tall.validate(10, 30), Ok(()));
}

#[test]
fn axis_names_match_json_keys() {
    assert_eq!(Axis::X.to_string(), "stretchX");
    assert_eq!(Axis::Y.key(), "stretchY");
    assert_eq!(
        MetadataError::ZonesOverlap(Axis::Y).to_string(),
        "image stretchY zones may not overlap"
    );
}
