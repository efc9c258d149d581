//! Codec Tests
//!
//! Tests for the JSON and protobuf encodings of items, item lists and
//! write payloads, and for their agreement.

use todokv::codec::{json, protobuf};
use todokv::{Encoding, Item, ItemPatch, TodoError};

fn sample_items() -> Vec<Item> {
    vec![
        Item::new(1, "Task 1"),
        Item { id: 2, done: true, text: "Zażółć gęślą jaźń".into() },
        Item { id: 300, done: false, text: "x".repeat(1024) },
    ]
}

// =============================================================================
// JSON
// =============================================================================

#[test]
fn test_json_item_layout() {
    let bytes = json::encode_item(&Item::new(1, "Task 1")).unwrap();
    assert_eq!(bytes, br#"{"id":1,"done":false,"text":"Task 1"}"#);
}

#[test]
fn test_json_list_layout() {
    let items = vec![Item::new(1, "a"), Item { id: 2, done: true, text: "b".into() }];
    let bytes = json::encode_list(&items).unwrap();
    assert_eq!(
        bytes,
        br#"[{"id":1,"done":false,"text":"a"},{"id":2,"done":true,"text":"b"}]"#
    );
    assert_eq!(json::encode_list(&[]).unwrap(), b"[]");
}

#[test]
fn test_json_patch_fields() {
    let patch = json::decode_patch(br#"{"text":"Test task"}"#).unwrap();
    assert_eq!(patch, ItemPatch::text("Test task"));

    let patch = json::decode_patch(br#"{"text":"t","done":true,"id":77}"#).unwrap();
    assert_eq!(patch, ItemPatch { text: Some("t".into()), done: Some(true) });

    let patch = json::decode_patch(br#"{"done":true}"#).unwrap();
    assert_eq!(patch, ItemPatch::done(true));

    // Empty text is treated as missing, as in protobuf
    assert_eq!(json::decode_patch(br#"{"text":""}"#).unwrap().text, None);
}

#[test]
fn test_json_patch_rejects_malformed() {
    let bodies: [&[u8]; 5] = [
        b"",
        b"{",
        b"[1,2]",
        br#"{"text":5}"#,
        br#"{"text":"a","done":"yes"}"#,
    ];
    for body in bodies {
        assert!(
            matches!(json::decode_patch(body), Err(TodoError::Decode(_))),
            "accepted {:?}",
            String::from_utf8_lossy(body)
        );
    }
}

// =============================================================================
// Protobuf
// =============================================================================

#[test]
fn test_protobuf_item_layout() {
    let item = Item { id: 1, done: true, text: "hi".into() };
    assert_eq!(
        protobuf::encode_item(&item),
        vec![0x08, 0x01, 0x10, 0x01, 0x1a, 0x02, b'h', b'i']
    );
}

#[test]
fn test_protobuf_omits_defaults() {
    assert!(protobuf::encode_item(&Item { id: 0, done: false, text: String::new() }).is_empty());
    assert_eq!(
        protobuf::encode_item(&Item::new(5, "")),
        vec![0x08, 0x05]
    );
}

#[test]
fn test_protobuf_list_layout() {
    let items = vec![Item::new(1, "a"), Item::new(2, "b")];
    assert_eq!(
        protobuf::encode_list(&items),
        vec![
            0x0a, 0x05, 0x08, 0x01, 0x1a, 0x01, b'a', //
            0x0a, 0x05, 0x08, 0x02, 0x1a, 0x01, b'b',
        ]
    );
    assert!(protobuf::encode_list(&[]).is_empty());
    assert!(protobuf::decode_list(&[]).unwrap().is_empty());
}

#[test]
fn test_protobuf_decodes_any_field_order_and_skips_unknown() {
    let bytes = [
        0x1a, 0x03, b'a', b'b', b'c', // text = "abc"
        0x20, 0x96, 0x01, // field 4 varint (unknown)
        0x2a, 0x01, 0xff, // field 5 bytes (unknown)
        0x31, 0, 0, 0, 0, 0, 0, 0, 0, // field 6 fixed64 (unknown)
        0x3d, 0, 0, 0, 0, // field 7 fixed32 (unknown)
        0x10, 0x01, // done = true
        0x08, 0x07, // id = 7
    ];

    let item = protobuf::decode_item(&bytes).unwrap();
    assert_eq!(item, Item { id: 7, done: true, text: "abc".into() });
}

#[test]
fn test_protobuf_rejects_malformed() {
    let cases: [&[u8]; 7] = [
        &[0x08],                   // id key without value
        &[0x1a, 0x05, b'a'],       // text shorter than its length
        &[0x1a, 0x02, 0xff, 0xfe], // text not UTF-8
        &[0x0a, 0x01, b'x'],       // id as length-delimited
        &[0x0b],                   // group wire type
        &[0x00, 0x01],             // field number 0
        &[0x31, 0x00],             // truncated fixed64
    ];

    for bytes in cases {
        assert!(
            matches!(protobuf::decode_item(bytes), Err(TodoError::Decode(_))),
            "accepted {:02x?}",
            bytes
        );
    }
}

#[test]
fn test_protobuf_patch_presence() {
    // Only text: done falls back to false
    let bytes = protobuf::encode_patch(&ItemPatch::text("Test task"));
    assert_eq!(
        protobuf::decode_patch(&bytes).unwrap(),
        ItemPatch { text: Some("Test task".into()), done: Some(false) }
    );

    // Empty message: no text
    assert_eq!(protobuf::decode_patch(&[]).unwrap().text, None);

    // Explicit empty string is the same as absent
    assert_eq!(protobuf::decode_patch(&[0x1a, 0x00]).unwrap().text, None);

    // An id in the payload is ignored
    let patch = protobuf::decode_patch(&[0x08, 0x09, 0x1a, 0x01, b'z']).unwrap();
    assert_eq!(patch.text.as_deref(), Some("z"));
}

// =============================================================================
// Cross-encoding agreement
// =============================================================================

#[test]
fn test_round_trip_both_encodings_agree() {
    for item in sample_items() {
        let from_json = Encoding::Json
            .decode_item(&Encoding::Json.encode_item(&item).unwrap())
            .unwrap();
        let from_protobuf = Encoding::Protobuf
            .decode_item(&Encoding::Protobuf.encode_item(&item).unwrap())
            .unwrap();

        assert_eq!(from_json, item);
        assert_eq!(from_protobuf, item);
    }
}

#[test]
fn test_list_round_trip_both_encodings_agree() {
    let items = sample_items();
    for encoding in [Encoding::Json, Encoding::Protobuf] {
        let bytes = encoding.encode_list(&items).unwrap();
        assert_eq!(encoding.decode_list(&bytes).unwrap(), items, "{:?}", encoding);
    }
}

#[test]
fn test_patch_round_trip_both_encodings() {
    let patch = ItemPatch { text: Some("rename".into()), done: Some(true) };
    for encoding in [Encoding::Json, Encoding::Protobuf] {
        let bytes = encoding.encode_patch(&patch).unwrap();
        assert_eq!(encoding.decode_patch(&bytes).unwrap(), patch, "{:?}", encoding);
    }
}

#[test]
fn test_content_types() {
    assert_eq!(Encoding::default(), Encoding::Json);
    assert_eq!(Encoding::Json.content_type(), "application/json");
    assert_eq!(Encoding::Protobuf.content_type(), "application/x-protobuf");
    assert_eq!(Encoding::from_flag(Some(Encoding::Protobuf.flag())).unwrap(), Encoding::Protobuf);
}
