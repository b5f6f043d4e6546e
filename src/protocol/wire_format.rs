//! Wire format encoding and decoding.
//!
//! Implements the 10-byte HSMS message header:
//! ```text
//! ┌───────────┬─────────────┬───────┬──────────┬───────────┬──────────────┐
//! │ Device ID │ W-bit + S   │ F     │ Reserved │ Msg type  │ System bytes │
//! │ 2 bytes   │ 1 byte      │ 1 byte│ 1 byte   │ 1 byte    │ 4 bytes      │
//! │ uint16 BE │ bit7 + 7bit │       │ (0)      │           │ int32 BE     │
//! └───────────┴─────────────┴───────┴──────────┴───────────┴──────────────┘
//! ```
//!
//! On the wire the header is preceded by a 4-byte big-endian total message
//! length covering the header and the item body. All multi-byte integers
//! are Big Endian.

/// Message header size in bytes (fixed, exactly 10).
pub const HEADER_SIZE: usize = 10;

/// Size of the big-endian total-length prefix that precedes each header.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Message type constants (HSMS SType values).
///
/// Everything other than [`DATA`](message_type::DATA) is a control message:
/// header-only traffic used for session management.
pub mod message_type {
    /// Data message carrying a SECS-II item body (possibly empty).
    pub const DATA: u8 = 0;
    /// Select request.
    pub const SELECT_REQ: u8 = 1;
    /// Select response.
    pub const SELECT_RSP: u8 = 2;
    /// Deselect request.
    pub const DESELECT_REQ: u8 = 3;
    /// Deselect response.
    pub const DESELECT_RSP: u8 = 4;
    /// Linktest request.
    pub const LINKTEST_REQ: u8 = 5;
    /// Linktest response.
    pub const LINKTEST_RSP: u8 = 6;
    /// Reject request.
    pub const REJECT_REQ: u8 = 7;
    /// Separate request.
    pub const SEPARATE_REQ: u8 = 9;

    /// Check whether a message type denotes a control message.
    #[inline]
    pub fn is_control(message_type: u8) -> bool {
        message_type != DATA
    }
}

/// Decoded HSMS message header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageHeader {
    /// Device (session) identifier.
    pub device_id: u16,
    /// W-bit: the sender expects a reply.
    pub reply_expected: bool,
    /// Stream code (7 bits).
    pub stream: u8,
    /// Function code.
    pub function: u8,
    /// Message type (see [`message_type`]).
    pub message_type: u8,
    /// Correlation identifier matching requests to replies.
    pub system_bytes: i32,
}

impl MessageHeader {
    /// Create a new data-message header.
    pub fn data(device_id: u16, stream: u8, function: u8, reply_expected: bool, system_bytes: i32) -> Self {
        Self {
            device_id,
            reply_expected,
            stream,
            function,
            message_type: message_type::DATA,
            system_bytes,
        }
    }

    /// Create a new control-message header.
    pub fn control(device_id: u16, message_type: u8, system_bytes: i32) -> Self {
        Self {
            device_id,
            reply_expected: false,
            stream: 0,
            function: 0,
            message_type,
            system_bytes,
        }
    }

    /// Check whether this header denotes a control message.
    #[inline]
    pub fn is_control(&self) -> bool {
        message_type::is_control(self.message_type)
    }

    /// Encode the header to bytes (Big Endian).
    ///
    /// # Example
    ///
    /// ```
    /// use secswire::MessageHeader;
    ///
    /// let header = MessageHeader::data(1, 1, 13, true, 4);
    /// let bytes = header.encode();
    /// assert_eq!(bytes.len(), 10);
    /// assert_eq!(bytes[2], 0x81); // W-bit | stream 1
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode the header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is smaller than `HEADER_SIZE` (10 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_SIZE);
        buf[0..2].copy_from_slice(&self.device_id.to_be_bytes());
        buf[2] = (self.stream & 0x7F) | if self.reply_expected { 0x80 } else { 0 };
        buf[3] = self.function;
        buf[4] = 0;
        buf[5] = self.message_type;
        buf[6..10].copy_from_slice(&self.system_bytes.to_be_bytes());
    }

    /// Decode a header from bytes (Big Endian).
    ///
    /// Returns `None` if the buffer is too short.
    ///
    /// # Example
    ///
    /// ```
    /// use secswire::MessageHeader;
    ///
    /// let bytes = [0x00, 0x01, 0x81, 0x0D, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04];
    /// let header = MessageHeader::decode(&bytes).unwrap();
    /// assert_eq!(header.stream, 1);
    /// assert_eq!(header.function, 13);
    /// assert!(header.reply_expected);
    /// ```
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            device_id: u16::from_be_bytes([buf[0], buf[1]]),
            reply_expected: buf[2] & 0x80 != 0,
            stream: buf[2] & 0x7F,
            function: buf[3],
            message_type: buf[5],
            system_bytes: i32::from_be_bytes([buf[6], buf[7], buf[8], buf[9]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_encode_decode_roundtrip() {
        let original = MessageHeader::data(17, 6, 11, true, 0x0102_0304);
        let encoded = original.encode();
        let decoded = MessageHeader::decode(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_header_big_endian_byte_order() {
        let header = MessageHeader::data(0x0102, 5, 0x07, false, 0x0809_0A0B);
        let bytes = header.encode();

        // Device ID: 0x0102 in BE
        assert_eq!(bytes[0], 0x01);
        assert_eq!(bytes[1], 0x02);

        // No W-bit, stream 5
        assert_eq!(bytes[2], 0x05);

        // Function
        assert_eq!(bytes[3], 0x07);

        // Reserved byte, message type
        assert_eq!(bytes[4], 0x00);
        assert_eq!(bytes[5], 0x00);

        // System bytes: 0x08090A0B in BE
        assert_eq!(&bytes[6..10], &[0x08, 0x09, 0x0A, 0x0B]);
    }

    #[test]
    fn test_header_size_is_exactly_10() {
        assert_eq!(HEADER_SIZE, 10);
        let header = MessageHeader::data(1, 1, 1, false, 1);
        assert_eq!(header.encode().len(), 10);
    }

    #[test]
    fn test_w_bit_packing() {
        let with_reply = MessageHeader::data(0, 0x7F, 0, true, 0);
        assert_eq!(with_reply.encode()[2], 0xFF);

        let without_reply = MessageHeader::data(0, 0x7F, 0, false, 0);
        assert_eq!(without_reply.encode()[2], 0x7F);
    }

    #[test]
    fn test_stream_is_masked_to_seven_bits() {
        let header = MessageHeader::data(0, 0xFF, 0, false, 0);
        let decoded = MessageHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded.stream, 0x7F);
        assert!(!decoded.reply_expected);
    }

    #[test]
    fn test_negative_system_bytes() {
        let header = MessageHeader::data(1, 1, 2, false, -1);
        let encoded = header.encode();
        assert_eq!(&encoded[6..10], &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(MessageHeader::decode(&encoded).unwrap().system_bytes, -1);
    }

    #[test]
    fn test_decode_too_short_buffer() {
        let buf = [0u8; 9]; // One byte short
        assert!(MessageHeader::decode(&buf).is_none());
    }

    #[test]
    fn test_control_header() {
        let header = MessageHeader::control(1, message_type::SELECT_REQ, 2);
        assert!(header.is_control());
        assert_eq!(header.stream, 0);
        assert_eq!(header.function, 0);
        assert!(!header.reply_expected);

        let encoded = header.encode();
        assert_eq!(
            encoded,
            [0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02]
        );
    }

    #[test]
    fn test_message_type_is_control() {
        assert!(!message_type::is_control(message_type::DATA));
        assert!(message_type::is_control(message_type::SELECT_REQ));
        assert!(message_type::is_control(message_type::LINKTEST_RSP));
        assert!(message_type::is_control(message_type::SEPARATE_REQ));
    }

    #[test]
    fn test_reserved_byte_zero_on_encode() {
        let mut buf = [0xAAu8; HEADER_SIZE];
        MessageHeader::data(1, 1, 1, true, 1).encode_into(&mut buf);
        assert_eq!(buf[4], 0);
    }
}
