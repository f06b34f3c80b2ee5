//! Encoding of string maps into a single kapt option token.
//!
//! kapt receives `apoptions` and `javacArguments` as one base64 argument each.
//! The plugin decodes them with `java.io.ObjectInputStream`, reading an `int`
//! count followed by `readUTF()` key/value pairs, so the bytes here follow the
//! Java object-serialization stream format exactly:
//!
//! ```text
//! AC ED 00 05                      stream magic + version
//! 77 <len:u8>  <payload>           block data, len <= 255
//! 7A <len:u32> <payload>           block data, len  > 255
//! ```
//!
//! The logical payload (`i32` count, then `u16`-length-prefixed modified UTF-8
//! strings) is split into blocks of at most 1024 bytes, matching
//! `ObjectOutputStream`'s internal buffer.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

const STREAM_MAGIC: [u8; 2] = [0xAC, 0xED];
const STREAM_VERSION: [u8; 2] = [0x00, 0x05];
const TC_BLOCKDATA: u8 = 0x77;
const TC_BLOCKDATALONG: u8 = 0x7A;
const MAX_BLOCK_SIZE: usize = 1024;
const MAX_UTF_LEN: usize = u16::MAX as usize;

/// Errors raised while encoding or decoding an option token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
  #[error("string of {len} encoded bytes exceeds the 65535 byte limit: {preview}")]
  StringTooLong { len: usize, preview: String },

  #[error("too many options to encode: {0}")]
  TooManyEntries(usize),

  #[error("invalid base64 in option token: {0}")]
  InvalidBase64(String),

  #[error("malformed option stream: {0}")]
  Malformed(String),
}

/// Encode `options` into a base64 token, iterating in key order.
pub fn encode_options(options: &BTreeMap<String, String>) -> Result<String, EncodeError> {
  let count = i32::try_from(options.len()).map_err(|_| EncodeError::TooManyEntries(options.len()))?;

  let mut payload = Vec::new();
  payload.extend_from_slice(&count.to_be_bytes());
  for (key, value) in options {
    write_utf(&mut payload, key)?;
    write_utf(&mut payload, value)?;
  }

  Ok(STANDARD.encode(frame(&payload)))
}

/// Decode a token produced by [`encode_options`].
pub fn decode_options(token: &str) -> Result<BTreeMap<String, String>, EncodeError> {
  let bytes = STANDARD
    .decode(token.trim())
    .map_err(|e| EncodeError::InvalidBase64(e.to_string()))?;
  let payload = unframe(&bytes)?;

  let mut reader = Reader { bytes: &payload, pos: 0 };
  let count = i32::from_be_bytes(reader.take_array::<4>()?);
  if count < 0 {
    return Err(EncodeError::Malformed(format!("negative entry count {count}")));
  }

  let mut options = BTreeMap::new();
  for _ in 0..count {
    let key = reader.read_utf()?;
    let value = reader.read_utf()?;
    options.insert(key, value);
  }
  if reader.pos != payload.len() {
    return Err(EncodeError::Malformed(format!(
      "{} trailing bytes after {count} entries",
      payload.len() - reader.pos
    )));
  }
  Ok(options)
}

/// Append `s` as `writeUTF` does: big-endian `u16` length, then modified UTF-8.
fn write_utf(out: &mut Vec<u8>, s: &str) -> Result<(), EncodeError> {
  let encoded = modified_utf8(s);
  if encoded.len() > MAX_UTF_LEN {
    return Err(EncodeError::StringTooLong {
      len: encoded.len(),
      preview: s.chars().take(32).collect(),
    });
  }
  out.extend_from_slice(&(encoded.len() as u16).to_be_bytes());
  out.extend_from_slice(&encoded);
  Ok(())
}

/// Java's modified UTF-8: NUL is two bytes, supplementary characters are
/// encoded as surrogate pairs of three bytes each.
fn modified_utf8(s: &str) -> Vec<u8> {
  let mut out = Vec::with_capacity(s.len());
  for unit in s.encode_utf16() {
    match unit {
      0x0001..=0x007F => out.push(unit as u8),
      0x0000 | 0x0080..=0x07FF => {
        out.push(0xC0 | ((unit >> 6) & 0x1F) as u8);
        out.push(0x80 | (unit & 0x3F) as u8);
      }
      _ => {
        out.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
        out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
        out.push(0x80 | (unit & 0x3F) as u8);
      }
    }
  }
  out
}

fn frame(payload: &[u8]) -> Vec<u8> {
  let mut out = Vec::with_capacity(payload.len() + 8);
  out.extend_from_slice(&STREAM_MAGIC);
  out.extend_from_slice(&STREAM_VERSION);
  for block in payload.chunks(MAX_BLOCK_SIZE) {
    if block.len() <= 0xFF {
      out.push(TC_BLOCKDATA);
      out.push(block.len() as u8);
    } else {
      out.push(TC_BLOCKDATALONG);
      out.extend_from_slice(&(block.len() as u32).to_be_bytes());
    }
    out.extend_from_slice(block);
  }
  out
}

fn unframe(bytes: &[u8]) -> Result<Vec<u8>, EncodeError> {
  let mut reader = Reader { bytes, pos: 0 };
  if reader.take_array::<2>()? != STREAM_MAGIC || reader.take_array::<2>()? != STREAM_VERSION {
    return Err(EncodeError::Malformed("missing stream header".to_string()));
  }

  let mut payload = Vec::new();
  while reader.pos < bytes.len() {
    let len = match reader.take_array::<1>()?[0] {
      TC_BLOCKDATA => reader.take_array::<1>()?[0] as usize,
      TC_BLOCKDATALONG => u32::from_be_bytes(reader.take_array::<4>()?) as usize,
      other => return Err(EncodeError::Malformed(format!("unexpected record type 0x{other:02X}"))),
    };
    payload.extend_from_slice(reader.take(len)?);
  }
  Ok(payload)
}

struct Reader<'a> {
  bytes: &'a [u8],
  pos: usize,
}

impl<'a> Reader<'a> {
  fn take(&mut self, len: usize) -> Result<&'a [u8], EncodeError> {
    let end = self
      .pos
      .checked_add(len)
      .filter(|end| *end <= self.bytes.len())
      .ok_or_else(|| EncodeError::Malformed(format!("unexpected end of stream at byte {}", self.pos)))?;
    let slice = &self.bytes[self.pos..end];
    self.pos = end;
    Ok(slice)
  }

  fn take_array<const N: usize>(&mut self) -> Result<[u8; N], EncodeError> {
    let mut array = [0u8; N];
    array.copy_from_slice(self.take(N)?);
    Ok(array)
  }

  fn read_utf(&mut self) -> Result<String, EncodeError> {
    let len = u16::from_be_bytes(self.take_array::<2>()?) as usize;
    let bytes = self.take(len)?;

    let mut units = Vec::with_capacity(len);
    let mut i = 0;
    while i < bytes.len() {
      let b = bytes[i];
      let (unit, width) = match b >> 4 {
        0x0..=0x7 => (b as u16, 1),
        0xC | 0xD => {
          let b2 = continuation(bytes, i + 1)?;
          ((((b & 0x1F) as u16) << 6) | b2, 2)
        }
        0xE => {
          let b2 = continuation(bytes, i + 1)?;
          let b3 = continuation(bytes, i + 2)?;
          ((((b & 0x0F) as u16) << 12) | (b2 << 6) | b3, 3)
        }
        _ => return Err(EncodeError::Malformed(format!("invalid modified UTF-8 lead byte 0x{b:02X}"))),
      };
      units.push(unit);
      i += width;
    }
    String::from_utf16(&units).map_err(|e| EncodeError::Malformed(e.to_string()))
  }
}

fn continuation(bytes: &[u8], index: usize) -> Result<u16, EncodeError> {
  match bytes.get(index) {
    Some(b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
    _ => Err(EncodeError::Malformed("truncated modified UTF-8 sequence".to_string())),
  }
}
