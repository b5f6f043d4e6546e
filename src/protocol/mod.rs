//! Protocol module - wire format, items, and the streaming decoder.
//!
//! This module implements the HSMS framing layer and the SECS-II payload
//! language:
//! - 10-byte header encoding/decoding behind a 4-byte length prefix
//! - Typed item trees (lists plus the SEMI E5 leaf formats)
//! - A resumable decoder that reassembles messages from fragmented reads

mod buffer;
mod decoder;
mod item;
mod wire_format;

pub use decoder::{
    ControlMessageHandler, DataMessageHandler, SecsDecoder, DEFAULT_BUFFER_SIZE,
};
pub use item::{Item, ItemFormat, SecsMessage};
pub use wire_format::{message_type, MessageHeader, HEADER_SIZE, LENGTH_PREFIX_SIZE};
