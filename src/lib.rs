//! # secswire
//!
//! Streaming decoder for the HSMS / SECS-II wire protocol used to connect
//! semiconductor manufacturing equipment.
//!
//! The decoder ingests a byte stream in arbitrary-sized chunks (as it
//! arrives from a transport socket) and emits fully-reconstructed messages
//! (a 10-byte header plus an optional, recursively-structured item tree)
//! to two upcall handlers. It performs no I/O itself: the transport writes
//! into [`SecsDecoder::writable_tail`] and notifies the decoder with the
//! byte count.
//!
//! ## Architecture
//!
//! - **Receive buffer**: a contiguous region with an append cursor and a
//!   decode cursor, grown and compacted as messages demand.
//! - **Framing state machine**: a five-step resumable pull-parser over the
//!   length prefix, header and item fields.
//! - **Item construction stack**: list reassembly without recursing over
//!   the input stream, so fragmentation never touches the call stack.
//!
//! ## Example
//!
//! ```
//! use secswire::SecsDecoder;
//!
//! let mut decoder = SecsDecoder::new(
//!     4096,
//!     Box::new(|header| println!("control: {:?}", header)),
//!     Box::new(|_header, message| println!("data: S{}F{}", message.stream, message.function)),
//! );
//!
//! // A select request, as it would arrive from the socket.
//! let wire = [0x00, 0x00, 0x00, 0x0A, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02];
//! decoder.writable_tail()[..wire.len()].copy_from_slice(&wire);
//! let in_message = decoder.decode(wire.len()).unwrap();
//! assert!(!in_message);
//! ```

pub mod error;
pub mod protocol;
pub mod reader;

pub use error::{Result, SecsWireError};
pub use protocol::{
    message_type, ControlMessageHandler, DataMessageHandler, Item, ItemFormat, MessageHeader,
    SecsDecoder, SecsMessage, HEADER_SIZE, LENGTH_PREFIX_SIZE,
};
