//! Feeding the decoder from an async byte stream.
//!
//! The decoder itself performs no I/O; this module supplies the glue loop
//! that a transport typically writes by hand: read into the decoder's
//! writable tail, report the count, repeat. It works with any
//! [`AsyncRead`]: a TCP stream, a duplex test pipe, a TLS wrapper.
//!
//! # Example
//!
//! ```no_run
//! use secswire::{reader, SecsDecoder};
//! use tokio::net::TcpStream;
//!
//! # async fn run() -> secswire::Result<()> {
//! let mut stream = TcpStream::connect("10.0.0.5:5000").await?;
//! let mut decoder = SecsDecoder::new(
//!     secswire::protocol::DEFAULT_BUFFER_SIZE,
//!     Box::new(|header| { /* session logic */ let _ = header; }),
//!     Box::new(|_header, message| println!("S{}F{}", message.stream, message.function)),
//! );
//! reader::drive(&mut stream, &mut decoder).await?;
//! # Ok(())
//! # }
//! ```

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Result, SecsWireError};
use crate::protocol::SecsDecoder;

/// Read from `reader` into the decoder until the stream ends.
///
/// Every message completed along the way is dispatched through the
/// decoder's upcalls. Returns `Ok(())` when the stream ends cleanly on a
/// message boundary and [`SecsWireError::ConnectionClosed`] when it ends
/// mid-message; decode errors and I/O errors propagate as-is.
pub async fn drive<R>(reader: &mut R, decoder: &mut SecsDecoder) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    loop {
        let n = reader.read(decoder.writable_tail()).await?;
        if n == 0 {
            if decoder.in_message() {
                tracing::warn!("stream ended mid-message");
                return Err(SecsWireError::ConnectionClosed);
            }
            return Ok(());
        }
        decoder.decode(n)?;
    }
}
