//! normalize.rs - Input decoding and canonical Unicode composition.
//!
//! Every offset in the pipeline refers to NFC text. Callers holding raw bytes
//! go through [`decode`] first so that invalid input fails before anything
//! else runs.
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;

use unicode_normalization::{is_nfc_quick, IsNormalized, UnicodeNormalization};

use crate::errors::AegisError;

/// Decodes raw input as UTF-8.
pub fn decode(input: &[u8]) -> Result<&str, AegisError> {
    std::str::from_utf8(input).map_err(|e| AegisError::InputEncoding {
        valid_up_to: e.valid_up_to(),
    })
}

/// Returns `text` in NFC, borrowing when it is already composed.
pub fn to_nfc(text: &str) -> Cow<'_, str> {
    match is_nfc_quick(text.chars()) {
        IsNormalized::Yes => Cow::Borrowed(text),
        _ => {
            let composed: String = text.nfc().collect();
            if composed == text {
                Cow::Borrowed(text)
            } else {
                Cow::Owned(composed)
            }
        }
    }
}
