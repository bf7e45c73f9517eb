//! Frame codec: exact-read decoding and full-write encoding over a stream.
//!
//! TCP has no message boundaries, so a single read may return half a header
//! or half a payload. The codec hides that: [`read_frame`] returns either a
//! complete frame or an error, never a partial message, and keeps no
//! resumable state between calls. [`write_frame`] symmetrically writes the
//! whole frame or fails.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::frame::{Frame, HEADER_LEN};

/// Errors from reading or writing frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The peer closed the connection, cleanly or mid-frame. A short read
    /// is never surfaced as a partial message.
    #[error("connection closed")]
    ConnectionClosed,
    /// Header carried a kind byte the protocol does not define.
    #[error("unknown message kind 0x{0:02x}")]
    UnknownKind(u8),
    /// Header length disagrees with the fixed size for that kind.
    #[error("size mismatch for kind 0x{kind:02x}: expected {expected} bytes, got {got}")]
    SizeMismatch {
        kind: u8,
        expected: usize,
        got: usize,
    },
    /// Underlying transport failure other than a clean close.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

async fn read_exact_or_closed<R>(reader: &mut R, buf: &mut [u8]) -> Result<(), FrameError>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(FrameError::ConnectionClosed)
        }
        Err(e) => Err(FrameError::Io(e)),
    }
}

/// Reads exactly one frame from the stream.
///
/// The header is validated before the payload is read: an unknown kind or a
/// length that disagrees with the kind's fixed payload size fails without
/// allocating anything, so a malicious length field cannot force a huge
/// buffer.
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    read_exact_or_closed(reader, &mut header).await?;

    let kind = header[0];
    let length = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;

    let expected = Frame::payload_len(kind).ok_or(FrameError::UnknownKind(kind))?;
    if length != expected {
        return Err(FrameError::SizeMismatch {
            kind,
            expected,
            got: length,
        });
    }

    let mut payload = vec![0u8; length];
    read_exact_or_closed(reader, &mut payload).await?;

    Frame::from_payload(kind, &payload)
}

/// Writes one complete frame to the stream.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&frame.to_bytes()).await?;
    Ok(())
}
