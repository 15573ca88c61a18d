//! Text encoding detection for save JSON files.
//!
//! The game writes its JSON documents as UTF-8, usually prefixed with a
//! byte-order mark. serde_json rejects the BOM, so it is stripped before
//! parsing and written back when a rewritten document had one.

use std::string::FromUtf8Error;

/// UTF-8 BOM bytes
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Detected encoding of a JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8Bom,
    Utf8,
}

/// Detect the encoding of a document by checking for the BOM.
pub fn detect_encoding(bytes: &[u8]) -> TextEncoding {
    if bytes.starts_with(&UTF8_BOM) {
        TextEncoding::Utf8Bom
    } else {
        TextEncoding::Utf8
    }
}

/// Decode document bytes to a string without the BOM.
pub fn decode(bytes: &[u8]) -> Result<(String, TextEncoding), FromUtf8Error> {
    let encoding = detect_encoding(bytes);
    let body = match encoding {
        TextEncoding::Utf8Bom => &bytes[UTF8_BOM.len()..],
        TextEncoding::Utf8 => bytes,
    };
    Ok((String::from_utf8(body.to_vec())?, encoding))
}

/// Encode UTF-8 document bytes, re-adding the BOM if the encoding calls for it.
pub fn encode(body: &[u8], encoding: TextEncoding) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + UTF8_BOM.len());
    if encoding == TextEncoding::Utf8Bom {
        out.extend_from_slice(&UTF8_BOM);
    }
    out.extend_from_slice(body);
    out
}
