//! Length-prefixed frames and the stream codec that moves them.
//!
//! On the wire a frame is one length byte `L` (1..=255) followed by `L`
//! payload bytes. The first payload byte is the message-type tag:
//!
//! ```text
//! +-----+-----+---------------------+
//! |  L  | tag | body (L - 1 bytes)  |
//! +-----+-----+---------------------+
//! ```
//!
//! Reads and writes loop over short transfers until the full frame has
//! moved. A read that returns zero bytes, at any point, means the peer
//! closed the stream.

use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{MessageType, ProtocolError};

/// Largest payload a one-byte length prefix can describe.
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// One protocol message as it travels on the wire.
///
/// A `Frame` always holds between 1 and [`MAX_PAYLOAD_LEN`] payload bytes;
/// the constructors refuse anything else, so the length prefix is derived
/// rather than stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Vec<u8>,
}

impl Frame {
    /// Wraps a raw payload, checking the length bounds.
    pub fn new(payload: Vec<u8>) -> Result<Self, ProtocolError> {
        match payload.len() {
            0 => Err(ProtocolError::EmptyPayload),
            n if n > MAX_PAYLOAD_LEN => Err(ProtocolError::PayloadTooLarge(n)),
            _ => Ok(Self { payload }),
        }
    }

    /// Builds `[tag] ++ body`.
    ///
    /// # Errors
    /// [`ProtocolError::PayloadTooLarge`] if the result exceeds 255 bytes.
    pub fn encode(kind: MessageType, body: &[u8]) -> Result<Self, ProtocolError> {
        let mut payload = Vec::with_capacity(1 + body.len());
        payload.push(kind.tag());
        payload.extend_from_slice(body);
        Self::new(payload)
    }

    /// The length prefix this frame is sent with.
    pub fn len(&self) -> u8 {
        // Bounded to 1..=255 by construction.
        self.payload.len() as u8
    }

    /// Frames are never empty; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The raw type tag (`payload[0]`).
    pub fn tag(&self) -> u8 {
        self.payload[0]
    }

    /// The type-specific bytes after the tag.
    pub fn body(&self) -> &[u8] {
        &self.payload[1..]
    }

    /// The whole payload, tag included.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Serializes the frame as it appears on the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.payload.len());
        out.push(self.len());
        out.extend_from_slice(&self.payload);
        out
    }
}

// ---------------------------------------------------------------------------
// Stream codec
// ---------------------------------------------------------------------------

/// Reads one complete frame.
///
/// Returns `Ok(None)` when the peer closes the stream, whether that happens
/// between frames or partway through one.
///
/// # Errors
/// - [`ProtocolError::ZeroLengthFrame`] if the header byte is zero. The
///   stream cannot be resynchronized after this, so callers should treat
///   it as fatal for the connection.
/// - [`ProtocolError::Io`] if the underlying read fails.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Frame>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 1];
    if !fill(reader, &mut header).await? {
        return Ok(None);
    }

    let len = header[0] as usize;
    if len == 0 {
        return Err(ProtocolError::ZeroLengthFrame);
    }

    let mut payload = vec![0u8; len];
    if !fill(reader, &mut payload).await? {
        return Ok(None);
    }

    Ok(Some(Frame { payload }))
}

/// Writes one frame and flushes it.
///
/// # Errors
/// - [`ProtocolError::WriteZero`] if the stream stops accepting bytes.
/// - [`ProtocolError::Io`] if the underlying write fails.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = frame.to_bytes();
    let mut written = 0;
    while written < bytes.len() {
        match writer.write(&bytes[written..]).await {
            Ok(0) => return Err(ProtocolError::WriteZero),
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    writer.flush().await?;
    Ok(())
}

/// Fills `buf` completely, looping over short reads.
///
/// Returns `Ok(false)` if the stream hit end-of-file first.
async fn fill<R>(reader: &mut R, buf: &mut [u8]) -> Result<bool, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => return Ok(false),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}
