//! Streaming message decoder.
//!
//! Implements a resumable state machine over the receive buffer for
//! handling arbitrarily fragmented input:
//! - `Length`: need the 4-byte total-length prefix
//! - `Header`: need the 10-byte message header
//! - `ItemHeader`: need an item format byte
//! - `ItemLength`: need the item's 1-3 length bytes
//! - `ItemBody`: need the item payload (or push a list frame)
//!
//! A step that cannot proceed records its shortfall in `need` and the
//! machine halts until the transport delivers more bytes; a step that
//! consumes its bytes chains straight into the next step in the same call.
//! Nested lists are reassembled iteratively through a stack of
//! `(target_arity, children)` frames so the call stack never depends on how
//! the network happened to fragment the message.
//!
//! # Example
//!
//! ```
//! use secswire::SecsDecoder;
//!
//! let mut decoder = SecsDecoder::new(
//!     4096,
//!     Box::new(|_header| {}),
//!     Box::new(|_header, message| {
//!         println!("S{}F{}: {:?}", message.stream, message.function, message.body);
//!     }),
//! );
//!
//! // S1F13 W carrying ASCII "Hello", as read from the socket.
//! let wire = [
//!     0x00, 0x00, 0x00, 0x11, // length 17
//!     0x00, 0x01, 0x81, 0x0D, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, // header
//!     0x41, 0x05, b'H', b'e', b'l', b'l', b'o', // ASCII item
//! ];
//! decoder.writable_tail()[..wire.len()].copy_from_slice(&wire);
//! assert!(!decoder.decode(wire.len()).unwrap());
//! ```

use crate::error::{Result, SecsWireError};

use super::buffer::RecvBuffer;
use super::item::{Item, ItemFormat, SecsMessage};
use super::wire_format::{MessageHeader, HEADER_SIZE, LENGTH_PREFIX_SIZE};

/// Default receive buffer capacity (64KB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Upcall invoked once per complete control message.
pub type ControlMessageHandler = Box<dyn FnMut(MessageHeader) + Send>;

/// Upcall invoked once per complete data message.
pub type DataMessageHandler = Box<dyn FnMut(MessageHeader, SecsMessage) + Send>;

/// State machine steps, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Reading the 4-byte total message length.
    Length,
    /// Reading the 10-byte message header.
    Header,
    /// Reading an item format byte.
    ItemHeader,
    /// Reading an item's length bytes.
    ItemLength,
    /// Reading an item payload, or opening a list.
    ItemBody,
}

/// A partially-filled list awaiting `target_arity` children.
struct ListFrame {
    target_arity: usize,
    children: Vec<Item>,
}

/// Streaming decoder for HSMS-framed SECS-II messages.
///
/// The decoder owns its receive buffer. The transport copies freshly read
/// bytes into [`writable_tail`](Self::writable_tail) and calls
/// [`decode`](Self::decode) with the byte count; the decoder dispatches
/// every message completed by those bytes and buffers any residue for the
/// next call. Upcalls run synchronously inside `decode` and must not
/// re-enter the decoder.
///
/// All mutation happens through `&mut self`, so exclusive access is
/// enforced at compile time; wrap the decoder in a mutex if it must be
/// shared across tasks.
pub struct SecsDecoder {
    buffer: RecvBuffer,
    step: Step,
    /// Shortfall reported by the currently stalled step.
    need: usize,
    /// Total declared length of the message in progress (header + body).
    message_length: usize,
    /// Wire bytes of the current message not yet consumed.
    message_remaining: usize,
    current_format: ItemFormat,
    current_length_bits: usize,
    current_item_length: usize,
    current_header: MessageHeader,
    /// Unclosed list ancestors of the item currently being parsed.
    stack: Vec<ListFrame>,
    /// Set on a fatal framing error; only `reset` clears it.
    poisoned: bool,
    on_control_message: ControlMessageHandler,
    on_data_message: DataMessageHandler,
}

impl SecsDecoder {
    /// Create a decoder with the given initial buffer capacity and upcalls.
    ///
    /// The buffer grows on demand and is never returned to a smaller size;
    /// see [`DEFAULT_BUFFER_SIZE`] for a reasonable starting point.
    pub fn new(
        initial_buffer_size: usize,
        on_control_message: ControlMessageHandler,
        on_data_message: DataMessageHandler,
    ) -> Self {
        Self {
            buffer: RecvBuffer::new(initial_buffer_size),
            step: Step::Length,
            need: 0,
            message_length: 0,
            message_remaining: 0,
            current_format: ItemFormat::List,
            current_length_bits: 0,
            current_item_length: 0,
            current_header: MessageHeader::default(),
            stack: Vec::new(),
            poisoned: false,
            on_control_message,
            on_data_message,
        }
    }

    /// Writable tail of the receive buffer.
    ///
    /// The transport fills a prefix of this slice with freshly read bytes,
    /// then reports the count via [`decode`](Self::decode). The slice is
    /// never empty between calls.
    #[inline]
    pub fn writable_tail(&mut self) -> &mut [u8] {
        self.buffer.writable_tail()
    }

    /// Remaining tail capacity.
    #[inline]
    pub fn writable_tail_len(&self) -> usize {
        self.buffer.writable_len()
    }

    /// Current receive buffer capacity (diagnostic).
    #[inline]
    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// True iff a length prefix has been consumed and the message behind it
    /// is still incomplete.
    #[inline]
    pub fn in_message(&self) -> bool {
        self.step != Step::Length
    }

    /// Consume `n` freshly appended bytes.
    ///
    /// Advances the state machine as far as the buffered bytes allow,
    /// dispatching every message completed on the way, and returns
    /// [`in_message`](Self::in_message).
    ///
    /// # Errors
    ///
    /// [`SecsWireError::InvalidArgument`] if `n` is zero or exceeds the
    /// writable tail (decoder state untouched).
    /// [`SecsWireError::Protocol`] on a framing anomaly; the decoder is
    /// then poisoned and rejects further input until [`reset`](Self::reset).
    pub fn decode(&mut self, n: usize) -> Result<bool> {
        if n == 0 {
            return Err(SecsWireError::InvalidArgument(
                "decode requires at least one new byte".to_string(),
            ));
        }
        if n > self.buffer.writable_len() {
            return Err(SecsWireError::InvalidArgument(format!(
                "{} bytes reported but the writable tail holds only {}",
                n,
                self.buffer.writable_len()
            )));
        }
        if self.poisoned {
            return Err(SecsWireError::Protocol(
                "decoder poisoned by an earlier framing error; reset required".to_string(),
            ));
        }

        self.buffer.commit(n);
        self.need = 0;
        if let Err(e) = self.run() {
            self.poisoned = true;
            return Err(e);
        }
        self.buffer.reclaim(self.need, self.message_length);
        Ok(self.in_message())
    }

    /// Abandon any partially-parsed message and return to a fresh state.
    ///
    /// Buffer capacity is retained, so a decoder survives reconnections
    /// without reallocating.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.stack.clear();
        self.step = Step::Length;
        self.need = 0;
        self.message_length = 0;
        self.message_remaining = 0;
        self.current_length_bits = 0;
        self.current_item_length = 0;
        self.poisoned = false;
    }

    /// Drive steps until one stalls. A step returns its own index to stall
    /// (after recording `need`) and the next index to chain.
    fn run(&mut self) -> Result<()> {
        loop {
            let current = self.step;
            let next = match current {
                Step::Length => self.step_length()?,
                Step::Header => self.step_header()?,
                Step::ItemHeader => self.step_item_header()?,
                Step::ItemLength => self.step_item_length()?,
                Step::ItemBody => self.step_item_body()?,
            };
            self.step = next;
            if next == current && self.need > 0 {
                return Ok(());
            }
        }
    }

    fn step_length(&mut self) -> Result<Step> {
        let available = self.buffer.available();
        if available < LENGTH_PREFIX_SIZE {
            self.need = LENGTH_PREFIX_SIZE - available;
            return Ok(Step::Length);
        }

        let bytes = self.buffer.filled();
        let total = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        self.buffer.consume(LENGTH_PREFIX_SIZE);

        if total < HEADER_SIZE {
            return Err(SecsWireError::Protocol(format!(
                "declared message length {total} is shorter than the {HEADER_SIZE}-byte header"
            )));
        }
        self.message_length = total;
        self.message_remaining = total;
        Ok(Step::Header)
    }

    fn step_header(&mut self) -> Result<Step> {
        let available = self.buffer.available();
        if available < HEADER_SIZE {
            self.need = HEADER_SIZE - available;
            return Ok(Step::Header);
        }

        let header =
            MessageHeader::decode(self.buffer.filled()).expect("buffer holds a full header");
        self.buffer.consume(HEADER_SIZE);
        self.message_remaining -= HEADER_SIZE;
        self.current_header = header;

        if self.message_remaining == 0 {
            if header.is_control() {
                tracing::trace!(
                    message_type = header.message_type,
                    system_bytes = header.system_bytes,
                    "dispatching control message"
                );
                (self.on_control_message)(header);
            } else {
                self.dispatch_data(None);
            }
            return Ok(Step::Length);
        }

        if header.is_control() {
            return Err(SecsWireError::Protocol(format!(
                "control message (type {}) declares a {}-byte body; control messages are header-only",
                header.message_type, self.message_remaining
            )));
        }

        // Whole body already buffered: skip the stack machine and decode
        // the tree in one recursive pass.
        if self.buffer.available() >= self.message_remaining {
            let root = self.decode_buffered_body()?;
            self.dispatch_data(Some(root));
            return Ok(Step::Length);
        }

        Ok(Step::ItemHeader)
    }

    fn step_item_header(&mut self) -> Result<Step> {
        if self.message_remaining == 0 {
            return Err(SecsWireError::Protocol(
                "item data overruns the declared message length".to_string(),
            ));
        }
        if self.buffer.available() < 1 {
            self.need = 1;
            return Ok(Step::ItemHeader);
        }

        let byte = self.buffer.filled()[0];
        self.buffer.consume(1);
        self.message_remaining -= 1;

        let format = ItemFormat::from_byte(byte).ok_or_else(|| {
            SecsWireError::Protocol(format!("unknown item format code {byte:#04x}"))
        })?;
        let length_bits = (byte & 0x03) as usize;
        if length_bits == 0 {
            return Err(SecsWireError::Protocol(format!(
                "item format byte {byte:#04x} declares zero length bytes"
            )));
        }

        self.current_format = format;
        self.current_length_bits = length_bits;
        Ok(Step::ItemLength)
    }

    fn step_item_length(&mut self) -> Result<Step> {
        let length_bits = self.current_length_bits;
        let available = self.buffer.available();
        if available < length_bits {
            self.need = length_bits - available;
            return Ok(Step::ItemLength);
        }
        if self.message_remaining < length_bits {
            return Err(SecsWireError::Protocol(
                "item length field overruns the declared message length".to_string(),
            ));
        }

        let mut length = 0usize;
        for &b in &self.buffer.filled()[..length_bits] {
            length = (length << 8) | b as usize;
        }
        self.buffer.consume(length_bits);
        self.message_remaining -= length_bits;
        self.current_item_length = length;
        Ok(Step::ItemBody)
    }

    fn step_item_body(&mut self) -> Result<Step> {
        if self.current_format == ItemFormat::List {
            if self.current_item_length > 0 {
                // A list header is immediately followed by its first
                // child's header.
                self.stack.push(ListFrame {
                    target_arity: self.current_item_length,
                    children: Vec::new(),
                });
                return Ok(Step::ItemHeader);
            }
            return self.complete_item(Item::List(Vec::new()));
        }

        let length = self.current_item_length;
        if length > self.message_remaining {
            return Err(SecsWireError::Protocol(format!(
                "item payload of {} bytes overruns the {} bytes left in the message",
                length, self.message_remaining
            )));
        }
        let available = self.buffer.available();
        if available < length {
            self.need = length - available;
            return Ok(Step::ItemBody);
        }

        let item = Item::decode_leaf(self.current_format, &self.buffer.filled()[..length])?;
        self.buffer.consume(length);
        self.message_remaining -= length;
        self.complete_item(item)
    }

    /// Fold a finished item into its enclosing lists, dispatching the
    /// message once the root completes.
    fn complete_item(&mut self, item: Item) -> Result<Step> {
        let mut item = item;
        loop {
            match self.stack.pop() {
                None => {
                    if self.message_remaining != 0 {
                        return Err(SecsWireError::Protocol(format!(
                            "message declares {} bytes beyond the complete item tree",
                            self.message_remaining
                        )));
                    }
                    self.dispatch_data(Some(item));
                    return Ok(Step::Length);
                }
                Some(mut frame) => {
                    frame.children.push(item);
                    if frame.children.len() < frame.target_arity {
                        self.stack.push(frame);
                        return Ok(Step::ItemHeader);
                    }
                    item = Item::List(frame.children);
                }
            }
        }
    }

    /// Fast path: the entire body is buffered, so parse it recursively
    /// without the resumable machinery. Produces the same trees as the
    /// step-by-step path.
    fn decode_buffered_body(&mut self) -> Result<Item> {
        let body_length = self.message_remaining;
        let root = {
            let body = &self.buffer.filled()[..body_length];
            let mut cursor = 0usize;
            let root = parse_buffered_item(body, &mut cursor)?;
            if cursor != body_length {
                return Err(SecsWireError::Protocol(format!(
                    "message declares {} bytes beyond the complete item tree",
                    body_length - cursor
                )));
            }
            root
        };
        self.buffer.consume(body_length);
        self.message_remaining = 0;
        Ok(root)
    }

    fn dispatch_data(&mut self, body: Option<Item>) {
        let header = self.current_header;
        tracing::trace!(
            s = header.stream,
            f = header.function,
            system_bytes = header.system_bytes,
            "dispatching data message"
        );
        let message = SecsMessage::new(&header, body);
        (self.on_data_message)(header, message);
    }
}

/// Parse one item (and, for lists, its descendants) from a fully-buffered
/// message body.
fn parse_buffered_item(body: &[u8], cursor: &mut usize) -> Result<Item> {
    let byte = match body.get(*cursor) {
        Some(&b) => b,
        None => {
            return Err(SecsWireError::Protocol(
                "item data overruns the declared message length".to_string(),
            ))
        }
    };
    *cursor += 1;

    let format = ItemFormat::from_byte(byte)
        .ok_or_else(|| SecsWireError::Protocol(format!("unknown item format code {byte:#04x}")))?;
    let length_bits = (byte & 0x03) as usize;
    if length_bits == 0 {
        return Err(SecsWireError::Protocol(format!(
            "item format byte {byte:#04x} declares zero length bytes"
        )));
    }
    if *cursor + length_bits > body.len() {
        return Err(SecsWireError::Protocol(
            "item length field overruns the declared message length".to_string(),
        ));
    }

    let mut length = 0usize;
    for &b in &body[*cursor..*cursor + length_bits] {
        length = (length << 8) | b as usize;
    }
    *cursor += length_bits;

    if format == ItemFormat::List {
        let mut children = Vec::new();
        for _ in 0..length {
            children.push(parse_buffered_item(body, cursor)?);
        }
        return Ok(Item::List(children));
    }

    if *cursor + length > body.len() {
        return Err(SecsWireError::Protocol(format!(
            "item payload of {} bytes overruns the {} bytes left in the message",
            length,
            body.len() - *cursor
        )));
    }
    let item = Item::decode_leaf(format, &body[*cursor..*cursor + length])?;
    *cursor += length;
    Ok(item)
}
