// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Output character encodings.

use crate::UnknownEncodingError;
use encoding_rs::Encoding;
use std::{borrow::Cow, fmt, str::FromStr};

/// The character encoding a report is written in.
///
/// Any encoding in the [WHATWG Encoding Standard](https://encoding.spec.whatwg.org/) that can be
/// written is accepted: UTF-8, the single-byte encodings, GBK, gb18030, Big5, EUC-JP,
/// ISO-2022-JP, Shift_JIS and EUC-KR. The encoding is named in the XML declaration. Characters
/// it can't represent are written as numeric character references, so the document stays
/// lossless.
///
/// Labels resolve the way browsers resolve them, so `ISO-8859-1`, `latin1` and `US-ASCII` all
/// mean windows-1252. UTF-16 can't be written and is rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct XmlEncoding {
    encoding: &'static Encoding,
}

impl XmlEncoding {
    /// Wraps an `encoding_rs` encoding.
    ///
    /// Returns an error for the encodings that can only be decoded: UTF-16LE, UTF-16BE and
    /// replacement.
    pub fn new(encoding: &'static Encoding) -> Result<Self, UnknownEncodingError> {
        if encoding.output_encoding() != encoding {
            return Err(UnknownEncodingError::new(encoding.name()));
        }
        Ok(Self { encoding })
    }

    /// Looks up an encoding by label, ignoring case and surrounding whitespace.
    pub fn for_label(label: &str) -> Result<Self, UnknownEncodingError> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| UnknownEncodingError::new(label))?;
        Self::new(encoding).map_err(|_| UnknownEncodingError::new(label))
    }

    /// Returns the underlying `encoding_rs` encoding.
    pub fn encoding(self) -> &'static Encoding {
        self.encoding
    }

    /// Returns the canonical name, as written in the XML declaration.
    pub fn label(self) -> &'static str {
        self.encoding.name()
    }

    /// Encodes a document that has already been escaped.
    ///
    /// Characters outside the encoding become numeric character references. Markup is all
    /// ASCII, so references only ever land in text and attribute values.
    pub(crate) fn encode(self, text: &str) -> Cow<'_, [u8]> {
        let (bytes, _, _) = self.encoding.encode(text);
        bytes
    }
}

impl Default for XmlEncoding {
    fn default() -> Self {
        Self {
            encoding: encoding_rs::UTF_8,
        }
    }
}

impl fmt::Display for XmlEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for XmlEncoding {
    type Err = UnknownEncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::for_label(s)
    }
}

/// Escapes `raw` for use as XML text or an attribute value.
///
/// Markup characters become entities, and characters that XML 1.0 forbids are dropped.
pub(crate) fn escape(raw: &str) -> Cow<'_, str> {
    let escaped = quick_xml::escape::escape(raw);
    if !escaped.chars().any(is_forbidden_char) {
        return escaped;
    }
    Cow::Owned(escaped.chars().filter(|&c| !is_forbidden_char(c)).collect())
}

fn is_forbidden_char(c: char) -> bool {
    matches!(
        c,
        '\x00'..='\x08' | '\x0b' | '\x0c' | '\x0e'..='\x1f' | '\u{fffe}' | '\u{ffff}'
    )
}
