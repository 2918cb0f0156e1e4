use crate::page::Document;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthMode {
    /// Unicode code points of the visible text.
    Raw,
    /// Bytes of the zlib-compressed UTF-8 text.
    #[default]
    Compressed,
}

impl LengthMode {
    pub fn from_compressed(compressed: bool) -> Self {
        if compressed {
            LengthMode::Compressed
        } else {
            LengthMode::Raw
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LengthMode::Raw => "raw",
            LengthMode::Compressed => "compressed",
        }
    }
}

/// Content length of an article body.
pub fn measure(document: &Document, mode: LengthMode) -> u64 {
    measure_text(document.visible_text(), mode)
}

pub fn measure_text(text: &str, mode: LengthMode) -> u64 {
    match mode {
        LengthMode::Raw => text.chars().count() as u64,
        LengthMode::Compressed => compressed_len(text.as_bytes()),
    }
}

fn compressed_len(bytes: &[u8]) -> u64 {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    // writes into a Vec cannot fail
    let compressed = encoder
        .write_all(bytes)
        .and_then(|_| encoder.finish())
        .unwrap_or_default();
    compressed.len() as u64
}
