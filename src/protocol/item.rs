//! SECS-II items and the data-message wrapper.
//!
//! An item is a tagged tree node: either a list of child items or a leaf
//! carrying a typed payload. On the wire every item starts with a format
//! byte (six format bits plus two bits giving the number of big-endian
//! length bytes that follow), and the payload length is expressed in bytes
//! (for lists: in child items).
//!
//! # Example
//!
//! ```
//! use secswire::{Item, ItemFormat};
//!
//! let item = Item::List(vec![
//!     Item::ascii("MDLN"),
//!     Item::U4(vec![1, 2, 3]),
//! ]);
//!
//! assert_eq!(item.format(), ItemFormat::List);
//! ```

use bytes::Bytes;

use crate::error::{Result, SecsWireError};

use super::wire_format::MessageHeader;

/// SECS-II item format codes.
///
/// The discriminant is the canonical format byte with zero length bits,
/// i.e. the six-bit SEMI E5 format code shifted into the top of the byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ItemFormat {
    /// Ordered sequence of child items.
    List = 0x00,
    /// Raw binary octets.
    Binary = 0x20,
    /// Booleans (one byte each, nonzero = true).
    Boolean = 0x24,
    /// ASCII characters.
    Ascii = 0x40,
    /// JIS-8 encoded characters.
    Jis8 = 0x44,
    /// 8-byte signed integers.
    I8 = 0x60,
    /// 1-byte signed integers.
    I1 = 0x64,
    /// 2-byte signed integers.
    I2 = 0x68,
    /// 4-byte signed integers.
    I4 = 0x70,
    /// 8-byte floats.
    F8 = 0x80,
    /// 4-byte floats.
    F4 = 0x90,
    /// 8-byte unsigned integers.
    U8 = 0xA0,
    /// 1-byte unsigned integers.
    U1 = 0xA4,
    /// 2-byte unsigned integers.
    U2 = 0xA8,
    /// 4-byte unsigned integers.
    U4 = 0xB0,
}

impl ItemFormat {
    /// Extract the format from a wire format byte.
    ///
    /// The low two bits (the length-byte count) are ignored. Returns `None`
    /// for format codes outside the SEMI E5 set.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte & 0xFC {
            0x00 => Some(Self::List),
            0x20 => Some(Self::Binary),
            0x24 => Some(Self::Boolean),
            0x40 => Some(Self::Ascii),
            0x44 => Some(Self::Jis8),
            0x60 => Some(Self::I8),
            0x64 => Some(Self::I1),
            0x68 => Some(Self::I2),
            0x70 => Some(Self::I4),
            0x80 => Some(Self::F8),
            0x90 => Some(Self::F4),
            0xA0 => Some(Self::U8),
            0xA4 => Some(Self::U1),
            0xA8 => Some(Self::U2),
            0xB0 => Some(Self::U4),
            _ => None,
        }
    }

    /// Size in bytes of one payload element (1 for lists, whose length
    /// counts child items rather than bytes).
    pub fn element_size(self) -> usize {
        match self {
            Self::List | Self::Binary | Self::Boolean | Self::Ascii | Self::Jis8 => 1,
            Self::I1 | Self::U1 => 1,
            Self::I2 | Self::U2 => 2,
            Self::I4 | Self::U4 | Self::F4 => 4,
            Self::I8 | Self::U8 | Self::F8 => 8,
        }
    }
}

/// A decoded SECS-II item: a list node or a typed leaf.
///
/// Numeric leaf payloads are decoded from big-endian wire order into host
/// values; `Binary` and `Jis8` keep the raw octets.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// Ordered sequence of child items.
    List(Vec<Item>),
    /// Raw binary octets.
    Binary(Bytes),
    /// Booleans, one wire byte each.
    Boolean(Vec<bool>),
    /// ASCII text.
    Ascii(String),
    /// JIS-8 text, kept as the raw encoded octets.
    Jis8(Bytes),
    /// 1-byte signed integers.
    I1(Vec<i8>),
    /// 2-byte signed integers.
    I2(Vec<i16>),
    /// 4-byte signed integers.
    I4(Vec<i32>),
    /// 8-byte signed integers.
    I8(Vec<i64>),
    /// 1-byte unsigned integers.
    U1(Vec<u8>),
    /// 2-byte unsigned integers.
    U2(Vec<u16>),
    /// 4-byte unsigned integers.
    U4(Vec<u32>),
    /// 8-byte unsigned integers.
    U8(Vec<u64>),
    /// 4-byte floats.
    F4(Vec<f32>),
    /// 8-byte floats.
    F8(Vec<f64>),
}

impl Item {
    /// Create an ASCII item from a string.
    pub fn ascii(text: impl Into<String>) -> Self {
        Self::Ascii(text.into())
    }

    /// Create a binary item from raw bytes (copies the data).
    pub fn binary(data: &[u8]) -> Self {
        Self::Binary(Bytes::copy_from_slice(data))
    }

    /// The wire format of this item.
    pub fn format(&self) -> ItemFormat {
        match self {
            Self::List(_) => ItemFormat::List,
            Self::Binary(_) => ItemFormat::Binary,
            Self::Boolean(_) => ItemFormat::Boolean,
            Self::Ascii(_) => ItemFormat::Ascii,
            Self::Jis8(_) => ItemFormat::Jis8,
            Self::I1(_) => ItemFormat::I1,
            Self::I2(_) => ItemFormat::I2,
            Self::I4(_) => ItemFormat::I4,
            Self::I8(_) => ItemFormat::I8,
            Self::U1(_) => ItemFormat::U1,
            Self::U2(_) => ItemFormat::U2,
            Self::U4(_) => ItemFormat::U4,
            Self::U8(_) => ItemFormat::U8,
            Self::F4(_) => ItemFormat::F4,
            Self::F8(_) => ItemFormat::F8,
        }
    }

    /// Decode a leaf payload according to its format.
    ///
    /// The payload length must be a multiple of the element size. `format`
    /// must not be [`ItemFormat::List`]; list bodies are sequences of child
    /// items, not bytes.
    pub(crate) fn decode_leaf(format: ItemFormat, payload: &[u8]) -> Result<Item> {
        let elem = format.element_size();
        if payload.len() % elem != 0 {
            return Err(SecsWireError::Protocol(format!(
                "{:?} payload of {} bytes is not a multiple of the element size {}",
                format,
                payload.len(),
                elem
            )));
        }
        let item = match format {
            ItemFormat::List => {
                return Err(SecsWireError::Protocol(
                    "list is not a leaf format".to_string(),
                ))
            }
            ItemFormat::Binary => Item::Binary(Bytes::copy_from_slice(payload)),
            ItemFormat::Boolean => Item::Boolean(payload.iter().map(|&b| b != 0).collect()),
            ItemFormat::Ascii => Item::Ascii(String::from_utf8_lossy(payload).into_owned()),
            ItemFormat::Jis8 => Item::Jis8(Bytes::copy_from_slice(payload)),
            ItemFormat::I1 => Item::I1(payload.iter().map(|&b| b as i8).collect()),
            ItemFormat::I2 => Item::I2(
                payload
                    .chunks_exact(2)
                    .map(|c| i16::from_be_bytes([c[0], c[1]]))
                    .collect(),
            ),
            ItemFormat::I4 => Item::I4(
                payload
                    .chunks_exact(4)
                    .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            ItemFormat::I8 => Item::I8(
                payload
                    .chunks_exact(8)
                    .map(|c| i64::from_be_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                    .collect(),
            ),
            ItemFormat::U1 => Item::U1(payload.to_vec()),
            ItemFormat::U2 => Item::U2(
                payload
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect(),
            ),
            ItemFormat::U4 => Item::U4(
                payload
                    .chunks_exact(4)
                    .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            ItemFormat::U8 => Item::U8(
                payload
                    .chunks_exact(8)
                    .map(|c| u64::from_be_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                    .collect(),
            ),
            ItemFormat::F4 => Item::F4(
                payload
                    .chunks_exact(4)
                    .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            ItemFormat::F8 => Item::F8(
                payload
                    .chunks_exact(8)
                    .map(|c| f64::from_be_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                    .collect(),
            ),
        };
        Ok(item)
    }
}

/// A complete SECS-II data message.
///
/// A message whose declared length covers only the header carries no body.
#[derive(Debug, Clone, PartialEq)]
pub struct SecsMessage {
    /// Stream code.
    pub stream: u8,
    /// Function code.
    pub function: u8,
    /// W-bit: the sender expects a reply.
    pub reply_expected: bool,
    /// Root of the item tree, if the message has a body.
    pub body: Option<Item>,
}

impl SecsMessage {
    /// Build a message from a decoded header and an optional root item.
    pub fn new(header: &MessageHeader, body: Option<Item>) -> Self {
        Self {
            stream: header.stream,
            function: header.function,
            reply_expected: header.reply_expected,
            body,
        }
    }
}
