use sprite_packer_core::prelude::*;

const SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10"/></svg>"#;
const CIRCLE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><circle cx="5" cy="5" r="5"/></svg>"#;

#[test]
fn identical_sources_share_a_group() {
    let icons = vec![
        IconSource::new("first", SQUARE),
        IconSource::new("round", CIRCLE),
        IconSource::new("second", SQUARE),
    ];
    let table = deduplicate(&icons).expect("dedup");

    assert_eq!(table.groups().len(), 2);
    let square = table.group_of("second").expect("group");
    assert_eq!(square.representative, "first");
    assert_eq!(square.members, vec!["first", "second"]);
    assert_eq!(square.signature, Signature::of(SQUARE.as_bytes()));

    assert!(table.is_representative("first"));
    assert!(!table.is_representative("second"));
    assert_eq!(
        table.representatives().collect::<Vec<_>>(),
        vec!["first", "round"]
    );
    assert_eq!(table.members_of("round"), vec!["round"]);
    assert_eq!(table.members_of("unknown"), vec!["unknown"]);
}

#[test]
fn dedup_of_representatives_is_a_no_op() {
    let icons = vec![
        IconSource::new("a", SQUARE),
        IconSource::new("b", SQUARE),
        IconSource::new("c", CIRCLE),
    ];
    let table = deduplicate(&icons).expect("dedup");
    let reps = sprite_packer_core::dedup::representatives(icons, &table);
    let ids: Vec<&str> = reps.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);

    let again = deduplicate(&reps).expect("dedup reps");
    assert_eq!(
        again.representatives().collect::<Vec<_>>(),
        table.representatives().collect::<Vec<_>>()
    );
    assert!(again.groups().iter().all(|g| g.members.len() == 1));
    let reps_again = sprite_packer_core::dedup::representatives(reps.clone(), &again);
    assert_eq!(reps_again.len(), reps.len());
}

#[test]
fn duplicate_ids_are_rejected() {
    let icons = vec![IconSource::new("a", SQUARE), IconSource::new("a", CIRCLE)];
    match deduplicate(&icons) {
        Err(SpriteError::DuplicateId(id)) => assert_eq!(id, "a"),
        other => panic!("expected DuplicateId, got {other:?}"),
    }
}

#[test]
fn signature_hex_is_stable() {
    let sig = Signature::of(b"");
    assert_eq!(
        sig.to_hex(),
        "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
    );
    assert_eq!(sig.to_string(), "af1349b9f5f9a1a6");
}
