//! Share links.
//!
//! A token is the version tag followed by unpadded URL-safe base64 of a
//! frame. The first frame byte holds flags (bit 0: body is raw deflate); the
//! body stores the wheel as a structure of arrays with LEB128 counts and
//! length prefixes, so labels may contain any character:
//!
//! ```text
//! entry count
//! labels                      (len, utf-8) per entry
//! colors                      0 + r g b   for lowercase #rrggbb
//!                             1 + (len, utf-8) otherwise
//! weight count, (index, weight)...   only weights other than 1
//! name                        0 | 1 + (len, utf-8)
//! history count, (len, utf-8)...
//! ```

use std::fmt;
use std::io::Write;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use flate2::write::DeflateEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{DecodeError, EncodeError};
use crate::validation::{validate_color, validate_label, validate_name, validate_weight};

const FLAG_DEFLATE: u8 = 0b0000_0001;
const COLOR_RGB: u8 = 0;
const COLOR_TEXT: u8 = 1;

/// An entry as it travels through a share link. Ids stay behind.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SharedEntry {
    pub label: String,
    pub color: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    DEFAULT_WEIGHT
}

impl SharedEntry {
    pub fn new(label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: color.into(),
            weight: DEFAULT_WEIGHT,
        }
    }
}

/// Everything a recipient needs to rebuild a wheel.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct WheelSnapshot {
    pub entries: Vec<SharedEntry>,
    pub name: Option<String>,
    pub history: Vec<String>,
}

/// URL-safe encoded snapshot, ready to drop into a query parameter.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ShareToken(String);

impl ShareToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShareToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// === Encoding ===

#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn byte(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn varint(&mut self, mut value: u64) {
        loop {
            let low = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(low);
                return;
            }
            self.buf.push(low | 0x80);
        }
    }

    fn text(&mut self, value: &str) {
        self.varint(value.len() as u64);
        self.buf.extend_from_slice(value.as_bytes());
    }
}

fn check_len(what: &'static str, value: &str) -> Result<(), EncodeError> {
    if value.len() > MAX_STRING_BYTES {
        return Err(EncodeError::StringTooLong {
            what,
            len: value.len(),
            max: MAX_STRING_BYTES,
        });
    }
    Ok(())
}

fn check_snapshot(snapshot: &WheelSnapshot) -> Result<(), EncodeError> {
    if snapshot.entries.len() > MAX_ENTRIES {
        return Err(EncodeError::TooManyEntries {
            count: snapshot.entries.len(),
            max: MAX_ENTRIES,
        });
    }
    if snapshot.history.len() > MAX_HISTORY {
        return Err(EncodeError::TooManyHistoryItems {
            count: snapshot.history.len(),
            max: MAX_HISTORY,
        });
    }
    // a shared wheel must open as a `Wheel`, so entries follow the same rules
    for (index, entry) in snapshot.entries.iter().enumerate() {
        if let Err(e) = validate_label(&entry.label) {
            return Err(if e.code == "empty_label" {
                EncodeError::EmptyLabel { index }
            } else {
                EncodeError::LabelTooLong {
                    index,
                    max: MAX_LABEL_CHARS,
                }
            });
        }
        if validate_color(&entry.color).is_err() {
            return Err(EncodeError::InvalidColor { index });
        }
        if validate_weight(entry.weight).is_err() {
            return Err(EncodeError::InvalidWeight {
                index,
                max: MAX_WEIGHT,
            });
        }
    }
    if let Some(name) = &snapshot.name {
        if validate_name(name).is_err() {
            return Err(EncodeError::NameTooLong { max: MAX_NAME_CHARS });
        }
    }
    for item in &snapshot.history {
        check_len("history item", item)?;
    }
    Ok(())
}

/// Lowercase `#rrggbb` packs into three bytes; anything else travels as text
/// so it comes back byte-for-byte.
fn packed_rgb(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

fn write_body(snapshot: &WheelSnapshot) -> Vec<u8> {
    let mut out = Writer::default();

    out.varint(snapshot.entries.len() as u64);
    for entry in &snapshot.entries {
        out.text(&entry.label);
    }
    for entry in &snapshot.entries {
        match packed_rgb(&entry.color) {
            Some(rgb) => {
                out.byte(COLOR_RGB);
                out.buf.extend_from_slice(&rgb);
            }
            None => {
                out.byte(COLOR_TEXT);
                out.text(&entry.color);
            }
        }
    }

    let weighted: Vec<(usize, u32)> = snapshot
        .entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.weight != DEFAULT_WEIGHT)
        .map(|(index, entry)| (index, entry.weight))
        .collect();
    out.varint(weighted.len() as u64);
    for (index, weight) in weighted {
        out.varint(index as u64);
        out.varint(u64::from(weight));
    }

    match &snapshot.name {
        Some(name) => {
            out.byte(1);
            out.text(name);
        }
        None => out.byte(0),
    }

    out.varint(snapshot.history.len() as u64);
    for item in &snapshot.history {
        out.text(item);
    }
    out.buf
}

fn deflate(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(body)?;
    encoder.finish()
}

/// Encodes a snapshot into a share token.
///
/// Fails instead of producing a token that [`decode`] would refuse, so every
/// token handed out reconstructs its snapshot exactly.
pub fn encode(snapshot: &WheelSnapshot) -> Result<ShareToken, EncodeError> {
    check_snapshot(snapshot)?;
    let body = write_body(snapshot);

    let mut frame = vec![0u8];
    let compressed = if body.len() >= COMPRESS_MIN_BYTES {
        match deflate(&body) {
            Ok(packed) if packed.len() < body.len() => Some(packed),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Share link compression failed, sending raw: {}", e);
                None
            }
        }
    } else {
        None
    };
    match compressed {
        Some(packed) => {
            frame[0] |= FLAG_DEFLATE;
            frame.extend_from_slice(&packed);
        }
        None => frame.extend_from_slice(&body),
    }

    let token = format!("{}{}", VERSION_TAG, URL_SAFE_NO_PAD.encode(&frame));
    log::debug!(
        "Encoded share link: {} entries, {} body bytes, {} characters",
        snapshot.entries.len(),
        body.len(),
        token.len()
    );
    if token.len() > MAX_TOKEN_LEN {
        return Err(EncodeError::SizeExceeded {
            len: token.len(),
            max: MAX_TOKEN_LEN,
        });
    }
    Ok(ShareToken(token))
}

// === Decoding ===

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        let value = *self.bytes.get(self.pos).ok_or(DecodeError::Truncated)?;
        self.pos += 1;
        Ok(value)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.checked_add(len).ok_or(DecodeError::Truncated)?;
        let slice = self.bytes.get(self.pos..end).ok_or(DecodeError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    fn varint(&mut self) -> Result<u64, DecodeError> {
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = self.byte()?;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::Malformed("number is too long"))
    }

    fn count(&mut self, what: &'static str, max: usize) -> Result<usize, DecodeError> {
        let value = self.varint()?;
        let len = usize::try_from(value).unwrap_or(usize::MAX);
        if len > max {
            return Err(DecodeError::SizeExceeded { what, len, max });
        }
        Ok(len)
    }

    fn text(&mut self, what: &'static str) -> Result<String, DecodeError> {
        let len = self.count(what, MAX_STRING_BYTES)?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::Malformed("text is not valid UTF-8"))
    }

    fn finish(&self) -> Result<(), DecodeError> {
        if self.pos != self.bytes.len() {
            return Err(DecodeError::Malformed("unexpected trailing data"));
        }
        Ok(())
    }
}

fn read_body(body: &[u8]) -> Result<WheelSnapshot, DecodeError> {
    let mut input = Reader::new(body);

    let count = input.count("entry count", MAX_ENTRIES)?;
    let mut labels = Vec::with_capacity(count);
    for _ in 0..count {
        let label = input.text("label")?;
        if validate_label(&label).is_err() {
            return Err(DecodeError::Malformed("invalid label"));
        }
        labels.push(label);
    }

    let mut entries = Vec::with_capacity(count);
    for label in labels {
        let color = match input.byte()? {
            COLOR_RGB => {
                let rgb = input.take(3)?;
                format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
            }
            COLOR_TEXT => {
                let color = input.text("color")?;
                if validate_color(&color).is_err() {
                    return Err(DecodeError::Malformed("invalid color"));
                }
                color
            }
            _ => return Err(DecodeError::Malformed("unknown color tag")),
        };
        entries.push(SharedEntry {
            label,
            color,
            weight: DEFAULT_WEIGHT,
        });
    }

    let weighted = input.count("weight table", count)?;
    let mut previous: Option<usize> = None;
    for _ in 0..weighted {
        let index = usize::try_from(input.varint()?).unwrap_or(usize::MAX);
        if index >= count || previous.is_some_and(|p| index <= p) {
            return Err(DecodeError::Malformed("weight index out of order"));
        }
        let weight = u32::try_from(input.varint()?).map_err(|_| DecodeError::Malformed("weight out of range"))?;
        if validate_weight(weight).is_err() {
            return Err(DecodeError::Malformed("weight out of range"));
        }
        entries[index].weight = weight;
        previous = Some(index);
    }

    let name = match input.byte()? {
        0 => None,
        1 => {
            let name = input.text("name")?;
            if validate_name(&name).is_err() {
                return Err(DecodeError::Malformed("name too long"));
            }
            Some(name)
        }
        _ => return Err(DecodeError::Malformed("unknown name marker")),
    };

    let history_len = input.count("history", MAX_HISTORY)?;
    let mut history = Vec::with_capacity(history_len);
    for _ in 0..history_len {
        history.push(input.text("history item")?);
    }

    input.finish()?;
    Ok(WheelSnapshot {
        entries,
        name,
        history,
    })
}

fn inflate(packed: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut inflater = Decompress::new(false);
    let mut out = Vec::with_capacity(MAX_PAYLOAD_BYTES);
    let status = inflater
        .decompress_vec(packed, &mut out, FlushDecompress::Finish)
        .map_err(|_| DecodeError::Malformed("corrupt compressed data"))?;
    match status {
        Status::StreamEnd if inflater.total_in() == packed.len() as u64 => Ok(out),
        Status::StreamEnd => Err(DecodeError::Malformed("unexpected trailing data")),
        Status::Ok | Status::BufError if out.len() >= MAX_PAYLOAD_BYTES => Err(DecodeError::SizeExceeded {
            what: "payload",
            len: out.len(),
            max: MAX_PAYLOAD_BYTES,
        }),
        Status::Ok | Status::BufError => Err(DecodeError::Truncated),
    }
}

fn is_token_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

/// Rebuilds a snapshot from a share token.
///
/// Never panics on untrusted input; every structural problem is reported as a
/// [`DecodeError`].
pub fn decode(token: &str) -> Result<WheelSnapshot, DecodeError> {
    let token = token.trim();
    if token.len() > MAX_TOKEN_LEN {
        return Err(DecodeError::SizeExceeded {
            what: "token",
            len: token.len(),
            max: MAX_TOKEN_LEN,
        });
    }
    if let Some((position, ch)) = token.chars().enumerate().find(|(_, ch)| !is_token_char(*ch)) {
        return Err(DecodeError::InvalidCharacter { ch, position });
    }

    let mut chars = token.chars();
    match chars.next() {
        None => return Err(DecodeError::Truncated),
        Some(VERSION_TAG) => {}
        Some(other) => return Err(DecodeError::UnsupportedVersion(other)),
    }

    let frame = URL_SAFE_NO_PAD.decode(chars.as_str()).map_err(|e| match e {
        base64::DecodeError::InvalidLength => DecodeError::Truncated,
        base64::DecodeError::InvalidByte(offset, byte) => DecodeError::InvalidCharacter {
            ch: char::from(byte),
            position: offset + 1,
        },
        _ => DecodeError::Malformed("stray bits at the end of the link"),
    })?;

    let (&flags, payload) = frame.split_first().ok_or(DecodeError::Truncated)?;
    if flags & !FLAG_DEFLATE != 0 {
        return Err(DecodeError::Malformed("unknown flags"));
    }
    if flags & FLAG_DEFLATE != 0 {
        read_body(&inflate(payload)?)
    } else {
        read_body(payload)
    }
}

/// Like [`decode`], but falls back to an empty wheel for links that cannot be read.
pub fn decode_or_default(token: &str) -> WheelSnapshot {
    match decode(token) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            log::warn!("Ignoring unreadable share link: {}", e);
            WheelSnapshot::default()
        }
    }
}
