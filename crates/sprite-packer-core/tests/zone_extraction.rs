use sprite_packer_core::geometry::{canonicalize_path_data, collapse_to_fixpoint, parse, prepare};
use sprite_packer_core::prelude::*;

/// 20x23 icon whose markers sit inside a translated group.
const STRETCHABLE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="23" viewBox="0 0 20 23">
  <path d="M0 0h20v23H0z" fill="#fff"/>
  <g transform="translate(1 2)">
    <rect id="mapbox-stretch-x" x="3" y="0" width="12" height="1" fill="none"/>
    <rect id="mapbox-stretch-y" x="0" y="3" width="1" height="11"/>
    <rect id="mapbox-content" x="1" y="3" width="16" height="13"/>
  </g>
</svg>"##;

#[test]
fn zones_from_translated_group() {
    let meta = extract_metadata(STRETCHABLE.as_bytes(), 1.0).expect("extract");
    assert_eq!(meta.stretch_x, vec![[4.0, 16.0]]);
    assert_eq!(meta.stretch_y, vec![[5.0, 16.0]]);
    assert_eq!(meta.content, Some([2.0, 5.0, 18.0, 18.0]));
    assert_eq!(meta.placeholder, None);
    meta.validate(20, 23).expect("zones fit the icon");
}

#[test]
fn zones_scale_with_pixel_ratio() {
    let meta = extract_metadata(STRETCHABLE.as_bytes(), 2.0).expect("extract");
    assert_eq!(meta.content, Some([4.0, 10.0, 36.0, 36.0]));
    assert_eq!(meta.stretch_x, vec![[8.0, 32.0]]);
    assert_eq!(meta.stretch_y, vec![[10.0, 32.0]]);
}

#[test]
fn content_rect_scaled() {
    let svg = svg(r#"<rect id="mapbox-content" x="2" y="5" width="16" height="13"/>"#);
    let meta = extract_metadata(svg.as_bytes(), 2.0).expect("extract");
    assert_eq!(meta.content, Some([4.0, 10.0, 36.0, 36.0]));
    assert!(meta.stretch_x.is_empty() && meta.stretch_y.is_empty());
}

#[test]
fn plain_stretch_marker_fills_both_axes() {
    let svg = svg(r#"<rect id="mapbox-stretch" x="3" y="4" width="10" height="6"/>"#);
    let meta = extract_metadata(svg.as_bytes(), 1.0).expect("extract");
    assert_eq!(meta.stretch_x, vec![[3.0, 13.0]]);
    assert_eq!(meta.stretch_y, vec![[4.0, 10.0]]);
}

#[test]
fn stretch_zones_come_back_sorted() {
    let svg = svg(concat!(
        r#"<rect id="mapbox-stretch-x-2" x="10" y="0" width="4" height="1"/>"#,
        r#"<rect id="mapbox-stretch-x-1" x="2" y="0" width="3" height="1"/>"#,
        r#"<rect id="mapbox-stretch-y-b" x="0" y="12" width="1" height="2"/>"#,
        r#"<rect id="mapbox-stretch-y-a" x="0" y="1" width="1" height="5"/>"#,
    ));
    let meta = extract_metadata(svg.as_bytes(), 1.0).expect("extract");
    assert_eq!(meta.stretch_x, vec![[2.0, 5.0], [10.0, 14.0]]);
    assert_eq!(meta.stretch_y, vec![[1.0, 6.0], [12.0, 14.0]]);
}

#[test]
fn text_placeholder_marker() {
    let svg = svg(r#"<rect id="mapbox-text-placeholder" x="1" y="1" width="8" height="4"/>"#);
    let meta = extract_metadata(svg.as_bytes(), 1.0).expect("extract");
    assert_eq!(meta.placeholder, Some([1.0, 1.0, 9.0, 5.0]));
    assert_eq!(meta.content, None);
}

#[test]
fn nested_group_transforms_compose() {
    let svg = svg(concat!(
        r#"<g transform="scale(2)"><g transform="translate(1 1)">"#,
        r#"<rect id="mapbox-stretch" x="0" y="0" width="4" height="3"/>"#,
        r#"</g></g>"#,
    ));
    let meta = extract_metadata(svg.as_bytes(), 1.0).expect("extract");
    assert_eq!(meta.stretch_x, vec![[2.0, 10.0]]);
    assert_eq!(meta.stretch_y, vec![[2.0, 8.0]]);
}

#[test]
fn rotation_noise_is_rounded_away() {
    let svg = svg(concat!(
        r#"<g transform="rotate(90 10 10)">"#,
        r#"<rect id="mapbox-content" x="0" y="0" width="10" height="5"/>"#,
        r#"</g>"#,
    ));
    let meta = extract_metadata(svg.as_bytes(), 1.0).expect("extract");
    assert_eq!(meta.content, Some([15.0, 0.0, 20.0, 10.0]));
}

#[test]
fn circle_marker_bounds() {
    let svg = svg(r#"<circle id="mapbox-content" cx="10" cy="10" r="5"/>"#);
    let meta = extract_metadata(svg.as_bytes(), 1.0).expect("extract");
    assert_eq!(meta.content, Some([5.0, 5.0, 15.0, 15.0]));
}

#[test]
fn clipped_group_keeps_its_transform() {
    let svg = svg(concat!(
        r#"<clipPath id="clip"><rect width="20" height="20"/></clipPath>"#,
        r#"<g clip-path="url(#clip)" transform="translate(5 0)">"#,
        r#"<rect id="mapbox-content" x="0" y="0" width="4" height="4"/>"#,
        r#"</g>"#,
    ));
    let meta = extract_metadata(svg.as_bytes(), 1.0).expect("extract");
    assert_eq!(meta.content, Some([5.0, 0.0, 9.0, 4.0]));
}

#[test]
fn stroked_marker_under_scale_uses_geometry_only() {
    let svg = svg(concat!(
        r#"<g transform="scale(2)">"#,
        r##"<rect id="mapbox-content" x="1" y="1" width="2" height="2" stroke="#000" stroke-width="4"/>"##,
        r#"</g>"#,
    ));
    let meta = extract_metadata(svg.as_bytes(), 1.0).expect("extract");
    assert_eq!(meta.content, Some([2.0, 2.0, 6.0, 6.0]));
}

#[test]
fn unusable_markers_are_ignored() {
    let cases = [
        r#"<rect id="mapbox-content" x="0" y="0" width="10"/>"#,
        r#"<rect id="mapbox-icon-none" x="0" y="0" width="10" height="10"/>"#,
        r#"<path id="mapbox-content"/>"#,
        r#"<path id="mapbox-content" d="hello"/>"#,
        r#"<rect x="0" y="0" width="10" height="10"/>"#,
    ];
    for body in cases {
        let meta = extract_metadata(svg(body).as_bytes(), 1.0).expect("extract");
        assert!(meta.is_empty(), "expected no zones for {body}");
    }
}

#[test]
fn unclosed_root_is_malformed() {
    match extract_metadata(b"<svg>", 1.0) {
        Err(SpriteError::MalformedSvg(_)) => {}
        other => panic!("expected MalformedSvg, got {other:?}"),
    }
}

#[test]
fn doctype_entities_resolve_in_attributes() {
    let svg = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd" [
  <!ENTITY ns_svg "http://www.w3.org/2000/svg">
  <!ENTITY ns_xlink 'http://www.w3.org/1999/xlink'>
  <!ENTITY % local SYSTEM "local.ent">
]>
<svg xmlns="&ns_svg;" xmlns:xlink="&ns_xlink;" width="20" height="20"><rect id="mapbox-content" x="2" y="2" width="10" height="10"/></svg>"#;
    let root = parse(svg.as_bytes()).expect("parse");
    assert_eq!(root.attr("xmlns"), Some("http://www.w3.org/2000/svg"));
    assert_eq!(root.attr("xmlns:xlink"), Some("http://www.w3.org/1999/xlink"));

    let plain = parse(br#"<svg data-name="a &amp; b"/>"#).expect("parse");
    assert_eq!(plain.attr("data-name"), Some("a & b"));

    let meta = extract_metadata(svg.as_bytes(), 1.0).expect("extract");
    assert_eq!(meta.content, Some([2.0, 2.0, 12.0, 12.0]));
}

#[test]
fn undeclared_entity_is_malformed() {
    let svg = r#"<svg xmlns="&ns_svg;" width="20" height="20"><rect id="mapbox-content" width="2" height="2"/></svg>"#;
    assert!(matches!(
        extract_metadata(svg.as_bytes(), 1.0),
        Err(SpriteError::MalformedSvg(_))
    ));
}

#[test]
fn prepare_keeps_referenced_ids_and_moves_marker_ids() {
    let mut root = parse(
        svg(concat!(
            r#"<defs><linearGradient id="grad"/></defs>"#,
            r#"<rect id="junk" fill="url(#grad)" width="2" height="2"/>"#,
            r#"<rect id="mapbox-content" width="2" height="2"/>"#,
        ))
        .as_bytes(),
    )
    .expect("parse");
    prepare(&mut root);
    let out = root.serialize();
    assert!(out.contains(r#"id="grad""#));
    assert!(!out.contains(r#"id="junk""#));
    assert!(out.contains(r#"sprite:marker="content""#));
    assert!(out.contains(r#"d="M0 0H2V2H0z""#));
    assert!(!out.contains("<rect"));

    let passes = collapse_to_fixpoint(&mut root).expect("fixpoint");
    assert!(passes >= 1);
    assert_eq!(collapse_to_fixpoint(&mut root).expect("stable"), 1);
}

#[test]
fn marker_names_classify() {
    assert_eq!(Marker::classify("content"), Some(Marker::Content));
    assert_eq!(Marker::classify("text-placeholder"), Some(Marker::Placeholder));
    assert_eq!(Marker::classify("stretch"), Some(Marker::Stretch));
    assert_eq!(Marker::classify("stretch-x"), Some(Marker::StretchX));
    assert_eq!(Marker::classify("stretch-x-second"), Some(Marker::StretchX));
    assert_eq!(Marker::classify("stretch-y2"), Some(Marker::StretchY));
    assert_eq!(Marker::classify("icon-content"), None);
    assert_eq!(Marker::classify("stretchy"), None);
}

#[test]
fn strong_round_prefers_shorter_forms() {
    assert_eq!(strong_round(2.3491, 3), 2.35);
    assert_eq!(strong_round(2.3449, 3), 2.345);
    assert_eq!(strong_round(1.0, 3), 1.0);
    assert_eq!(strong_round(0.1 + 0.2, 3), 0.3);
    assert_eq!(strong_round(15.000000000000002, 3), 15.0);
}

#[test]
fn path_data_canonical_numbers() {
    assert_eq!(canonicalize_path_data(".5.5").as_deref(), Some("0.5 0.5"));
    assert_eq!(canonicalize_path_data("M1.5.5").as_deref(), Some("M 1.5 0.5"));
    assert_eq!(canonicalize_path_data("M-.5-.5").as_deref(), Some("M -0.5 -0.5"));
    assert_eq!(
        canonicalize_path_data("a1 1 0 0110 10").as_deref(),
        Some("a 1 1 0 0 1 10 10")
    );
    assert_eq!(canonicalize_path_data("M0,0 L1e1,2").as_deref(), Some("M 0 0 L 10 2"));
    assert_eq!(canonicalize_path_data("M0 0 #"), None);
}

fn svg(body: &str) -> String {
    format!(r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20">{body}</svg>"#)
}
