//! JSON codec

use serde::{Deserialize, Serialize};

use crate::error::{Result, TodoError};
use crate::item::{Item, ItemPatch};

/// Write request body. Unknown keys (such as `id`) are ignored.
#[derive(Debug, Serialize, Deserialize)]
struct WriteBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    done: Option<bool>,
}

pub fn encode_item(item: &Item) -> Result<Vec<u8>> {
    serde_json::to_vec(item).map_err(|e| TodoError::Serialization(e.to_string()))
}

pub fn encode_list(items: &[Item]) -> Result<Vec<u8>> {
    serde_json::to_vec(items).map_err(|e| TodoError::Serialization(e.to_string()))
}

pub fn encode_patch(patch: &ItemPatch) -> Result<Vec<u8>> {
    let body = WriteBody {
        text: patch.text.clone(),
        done: patch.done,
    };
    serde_json::to_vec(&body).map_err(|e| TodoError::Serialization(e.to_string()))
}

pub fn decode_item(bytes: &[u8]) -> Result<Item> {
    serde_json::from_slice(bytes).map_err(|e| TodoError::Decode(e.to_string()))
}

pub fn decode_list(bytes: &[u8]) -> Result<Vec<Item>> {
    serde_json::from_slice(bytes).map_err(|e| TodoError::Decode(e.to_string()))
}

pub fn decode_patch(bytes: &[u8]) -> Result<ItemPatch> {
    let body: WriteBody =
        serde_json::from_slice(bytes).map_err(|e| TodoError::Decode(e.to_string()))?;

    // Same as protobuf, where an empty string cannot be told from an absent one
    Ok(ItemPatch {
        text: body.text.filter(|text| !text.is_empty()),
        done: body.done,
    })
}
