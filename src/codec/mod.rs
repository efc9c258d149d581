//! Codec Module
//!
//! Two wire representations of the same items, chosen per request.
//!
//! ## Encodings
//! - JSON (default): `{"id":1,"done":false,"text":"..."}`, lists as arrays
//! - Protocol Buffers wire format:
//!
//! ```text
//! message Item {
//!   uint64 id   = 1;
//!   bool   done = 2;
//!   string text = 3;
//! }
//!
//! message ItemList {
//!   repeated Item items = 1;
//! }
//! ```
//!
//! Both encodings carry exactly `id`, `done` and `text`, so decoding either
//! encoding of the same item yields the same [`Item`].

pub mod json;
pub mod protobuf;

use crate::error::{Result, TodoError};
use crate::item::{Item, ItemPatch};

/// Query parameter that selects the encoding
pub const ENCODING_PARAM: &str = "use_protobuf";

/// Wire encoding for request and response bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Json,
    Protobuf,
}

impl Encoding {
    /// Interpret the `use_protobuf` query flag
    ///
    /// Missing or empty selects JSON. `1`, `true`, `yes`, `on` select
    /// protobuf and `0`, `false`, `no`, `off` select JSON (case-insensitive).
    /// Anything else is rejected.
    pub fn from_flag(flag: Option<&str>) -> Result<Self> {
        let Some(raw) = flag.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(Encoding::Json);
        };

        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Encoding::Protobuf),
            "0" | "false" | "no" | "off" => Ok(Encoding::Json),
            _ => Err(TodoError::Validation(format!(
                "Invalid {} value {:?}: expected 0, 1, true or false",
                ENCODING_PARAM, raw
            ))),
        }
    }

    /// Query flag value that selects this encoding
    pub fn flag(self) -> &'static str {
        match self {
            Encoding::Json => "0",
            Encoding::Protobuf => "1",
        }
    }

    /// MIME type of bodies in this encoding
    pub fn content_type(self) -> &'static str {
        match self {
            Encoding::Json => "application/json",
            Encoding::Protobuf => "application/x-protobuf",
        }
    }

    pub fn encode_item(self, item: &Item) -> Result<Vec<u8>> {
        match self {
            Encoding::Json => json::encode_item(item),
            Encoding::Protobuf => Ok(protobuf::encode_item(item)),
        }
    }

    pub fn encode_list(self, items: &[Item]) -> Result<Vec<u8>> {
        match self {
            Encoding::Json => json::encode_list(items),
            Encoding::Protobuf => Ok(protobuf::encode_list(items)),
        }
    }

    /// Encode a create/update request body
    pub fn encode_patch(self, patch: &ItemPatch) -> Result<Vec<u8>> {
        match self {
            Encoding::Json => json::encode_patch(patch),
            Encoding::Protobuf => Ok(protobuf::encode_patch(patch)),
        }
    }

    pub fn decode_item(self, bytes: &[u8]) -> Result<Item> {
        match self {
            Encoding::Json => json::decode_item(bytes),
            Encoding::Protobuf => protobuf::decode_item(bytes),
        }
    }

    pub fn decode_list(self, bytes: &[u8]) -> Result<Vec<Item>> {
        match self {
            Encoding::Json => json::decode_list(bytes),
            Encoding::Protobuf => protobuf::decode_list(bytes),
        }
    }

    /// Decode a create/update request body
    ///
    /// A payload without usable `text` decodes to `text: None`; whether that
    /// is acceptable is the caller's decision.
    pub fn decode_patch(self, bytes: &[u8]) -> Result<ItemPatch> {
        match self {
            Encoding::Json => json::decode_patch(bytes),
            Encoding::Protobuf => protobuf::decode_patch(bytes),
        }
    }
}
