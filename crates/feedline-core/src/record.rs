//! Catalog record extracted from one feed item

use std::io;

use serde::{Deserialize, Serialize};

/// One catalog item.
///
/// Fields are only present when their tag was seen inside the item.
/// Unset fields are omitted from the encoded form, so the encoded size
/// depends only on what the feed actually carried.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Record field addressed by a field tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Title,
    Description,
}

impl Record {
    /// Overwrite `field` with `text`, trimmed of surrounding whitespace
    pub fn set(&mut self, field: Field, text: &str) {
        let value = Some(text.trim().to_string());
        match field {
            Field::Id => self.id = value,
            Field::Title => self.title = value,
            Field::Description => self.description = value,
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Id => self.id.as_deref(),
            Field::Title => self.title.as_deref(),
            Field::Description => self.description.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.title.is_none() && self.description.is_none()
    }

    /// Compact JSON encoding. This is the only size metric used for batching.
    pub fn encode(&self) -> io::Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(io::Error::other)
    }

    /// Byte length of [`encode`](Record::encode)
    pub fn encoded_len(&self) -> io::Result<usize> {
        self.encode().map(|bytes| bytes.len())
    }
}

/// Decode a batch payload back into records
pub fn decode_batch(payload: &[u8]) -> io::Result<Vec<Record>> {
    serde_json::from_slice(payload).map_err(io::Error::other)
}
