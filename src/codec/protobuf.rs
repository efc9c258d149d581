//! Protocol Buffers codec
//!
//! Hand-written proto3 wire format for the `Item` and `ItemList` messages.
//!
//! ## Wire Format
//! Each field is a key followed by a value:
//! ```text
//! ┌────────────────────────────┬──────────────────────────────┐
//! │ key = field << 3 | type    │ value                        │
//! │ (varint)                   │ varint | len + bytes | fixed │
//! └────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! Encoding is canonical proto3: fields holding their default value
//! (`0`, `false`, `""`) are omitted. Decoding accepts fields in any order,
//! keeps the last occurrence of a repeated scalar, and skips unknown fields.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, TodoError};
use crate::item::{Item, ItemPatch};

// Item
const ITEM_ID: u32 = 1;
const ITEM_DONE: u32 = 2;
const ITEM_TEXT: u32 = 3;

// ItemList
const LIST_ITEMS: u32 = 1;

/// Longest valid varint (10 bytes carry 64 bits)
const MAX_VARINT_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    Fixed32,
}

impl WireType {
    fn from_bits(bits: u64) -> Result<Self> {
        match bits {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            other => Err(TodoError::Decode(format!("unsupported wire type {}", other))),
        }
    }

    fn bits(self) -> u64 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::Fixed32 => 5,
        }
    }
}

// =============================================================================
// Encoding
// =============================================================================

pub fn encode_item(item: &Item) -> Vec<u8> {
    let mut buf = BytesMut::new();
    put_item_fields(&mut buf, Some(item.id), Some(item.done), Some(&item.text));
    buf.to_vec()
}

pub fn encode_list(items: &[Item]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    let mut scratch = BytesMut::new();

    for item in items {
        scratch.clear();
        put_item_fields(&mut scratch, Some(item.id), Some(item.done), Some(&item.text));
        put_key(&mut buf, LIST_ITEMS, WireType::LengthDelimited);
        put_bytes(&mut buf, &scratch);
    }

    buf.to_vec()
}

/// Encode a write request as an `Item` message without an id
pub fn encode_patch(patch: &ItemPatch) -> Vec<u8> {
    let mut buf = BytesMut::new();
    put_item_fields(&mut buf, None, patch.done, patch.text.as_deref());
    buf.to_vec()
}

fn put_item_fields(buf: &mut BytesMut, id: Option<u64>, done: Option<bool>, text: Option<&str>) {
    if let Some(id) = id.filter(|&id| id != 0) {
        put_key(buf, ITEM_ID, WireType::Varint);
        put_varint(buf, id);
    }
    if let Some(true) = done {
        put_key(buf, ITEM_DONE, WireType::Varint);
        put_varint(buf, 1);
    }
    if let Some(text) = text.filter(|t| !t.is_empty()) {
        put_key(buf, ITEM_TEXT, WireType::LengthDelimited);
        put_bytes(buf, text.as_bytes());
    }
}

fn put_key(buf: &mut BytesMut, field: u32, wire_type: WireType) {
    put_varint(buf, (u64::from(field) << 3) | wire_type.bits());
}

fn put_bytes(buf: &mut BytesMut, bytes: &[u8]) {
    put_varint(buf, bytes.len() as u64);
    buf.put_slice(bytes);
}

fn put_varint(buf: &mut BytesMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

// =============================================================================
// Decoding
// =============================================================================

/// Item fields as found on the wire; `None` when the field was absent
#[derive(Debug, Default)]
struct RawItem {
    id: Option<u64>,
    done: Option<bool>,
    text: Option<String>,
}

impl RawItem {
    fn into_item(self) -> Item {
        Item {
            id: self.id.unwrap_or(0),
            done: self.done.unwrap_or(false),
            text: self.text.unwrap_or_default(),
        }
    }
}

pub fn decode_item(bytes: &[u8]) -> Result<Item> {
    decode_raw_item(bytes).map(RawItem::into_item)
}

pub fn decode_list(mut bytes: &[u8]) -> Result<Vec<Item>> {
    let mut items = Vec::new();

    while bytes.has_remaining() {
        let (field, wire_type) = get_key(&mut bytes)?;
        if field == LIST_ITEMS {
            expect_wire_type(field, wire_type, WireType::LengthDelimited)?;
            let nested = get_length_delimited(&mut bytes)?;
            items.push(decode_raw_item(nested)?.into_item());
        } else {
            skip_field(&mut bytes, wire_type)?;
        }
    }

    Ok(items)
}

/// Decode a write request
///
/// proto3 scalars have no presence: an empty `text` counts as missing and
/// an absent `done` means `false`. Any `id` in the payload is ignored.
pub fn decode_patch(bytes: &[u8]) -> Result<ItemPatch> {
    let raw = decode_raw_item(bytes)?;

    Ok(ItemPatch {
        text: raw.text.filter(|t| !t.is_empty()),
        done: Some(raw.done.unwrap_or(false)),
    })
}

fn decode_raw_item(mut bytes: &[u8]) -> Result<RawItem> {
    let mut raw = RawItem::default();

    while bytes.has_remaining() {
        let (field, wire_type) = get_key(&mut bytes)?;
        match field {
            ITEM_ID => {
                expect_wire_type(field, wire_type, WireType::Varint)?;
                raw.id = Some(get_varint(&mut bytes)?);
            }
            ITEM_DONE => {
                expect_wire_type(field, wire_type, WireType::Varint)?;
                raw.done = Some(get_varint(&mut bytes)? != 0);
            }
            ITEM_TEXT => {
                expect_wire_type(field, wire_type, WireType::LengthDelimited)?;
                let text = get_length_delimited(&mut bytes)?;
                let text = std::str::from_utf8(text)
                    .map_err(|e| TodoError::Decode(format!("text is not valid UTF-8: {}", e)))?;
                raw.text = Some(text.to_string());
            }
            _ => skip_field(&mut bytes, wire_type)?,
        }
    }

    Ok(raw)
}

fn get_key(buf: &mut &[u8]) -> Result<(u32, WireType)> {
    let key = get_varint(buf)?;
    let field = key >> 3;
    if field == 0 || field > u64::from(u32::MAX >> 3) {
        return Err(TodoError::Decode(format!("invalid field number {}", field)));
    }
    Ok((field as u32, WireType::from_bits(key & 0x7)?))
}

fn get_varint(buf: &mut &[u8]) -> Result<u64> {
    let mut value = 0u64;

    for i in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(TodoError::Decode("truncated varint".to_string()));
        }
        let byte = buf.get_u8();
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }

    Err(TodoError::Decode("varint longer than 10 bytes".to_string()))
}

fn get_length_delimited<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8]> {
    let len = get_varint(buf)?;
    let available = buf.remaining();
    if len > available as u64 {
        return Err(TodoError::Decode(format!(
            "length-delimited field of {} bytes, only {} remaining",
            len, available
        )));
    }

    let slice: &'a [u8] = *buf;
    let (head, tail) = slice.split_at(len as usize);
    *buf = tail;
    Ok(head)
}

fn skip_field(buf: &mut &[u8], wire_type: WireType) -> Result<()> {
    let width = match wire_type {
        WireType::Varint => {
            get_varint(buf)?;
            return Ok(());
        }
        WireType::LengthDelimited => {
            get_length_delimited(buf)?;
            return Ok(());
        }
        WireType::Fixed64 => 8,
        WireType::Fixed32 => 4,
    };

    if buf.remaining() < width {
        return Err(TodoError::Decode(format!(
            "truncated fixed-width field: need {} bytes, {} remaining",
            width,
            buf.remaining()
        )));
    }
    buf.advance(width);
    Ok(())
}

fn expect_wire_type(field: u32, actual: WireType, expected: WireType) -> Result<()> {
    if actual != expected {
        return Err(TodoError::Decode(format!(
            "field {} has wire type {:?}, expected {:?}",
            field, actual, expected
        )));
    }
    Ok(())
}
