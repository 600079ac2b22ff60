//! Length-prefixed framing
//!
//! ```text
//! Frame := LENGTH(2 bytes, u16 big-endian) PAYLOAD(LENGTH bytes)
//! ```
//!
//! Two shapes over the same wire format: the free functions [`write_frame`] /
//! [`read_frame`] for code holding a raw stream (the handshake), and
//! [`FrameCodec`] for driving a stream as a `Framed` sink/stream (the
//! session). Neither inspects payload contents.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::FrameError;

/// Largest payload a u16 length prefix can describe
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// Size of the length prefix
pub const LENGTH_PREFIX_LEN: usize = 2;

fn length_prefix(len: usize) -> Result<[u8; LENGTH_PREFIX_LEN], FrameError> {
    let len = u16::try_from(len).map_err(|_| FrameError::FrameTooLarge { len })?;
    Ok(len.to_be_bytes())
}

/// Write one frame and flush.
///
/// Oversized payloads are rejected before anything touches the stream. The
/// prefix and payload go out in a single `write_all`, but callers must still
/// ensure only one writer uses `stream` at a time.
pub async fn write_frame<W>(stream: &mut W, payload: &[u8]) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let prefix = length_prefix(payload.len())?;

    let mut buf = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    buf.extend_from_slice(&prefix);
    buf.extend_from_slice(payload);

    stream.write_all(&buf).await?;
    stream.flush().await?;
    Ok(())
}

/// Read exactly one frame.
///
/// Waits for the two prefix bytes, then for the full payload. A stream that
/// ends anywhere before that yields [`FrameError::StreamClosed`].
pub async fn read_frame<R>(stream: &mut R) -> Result<Vec<u8>, FrameError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    stream.read_exact(&mut prefix).await?;
    let len = u16::from_be_bytes(prefix) as usize;

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;
    Ok(payload)
}

/// `tokio_util` codec for the same wire format.
///
/// The prefix is only consumed once the whole frame is buffered, so a stream
/// that ends with any bytes left in the buffer is always a truncated frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameCodec;

impl FrameCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LENGTH_PREFIX_LEN {
            src.reserve(LENGTH_PREFIX_LEN - src.len());
            return Ok(None);
        }

        let len = u16::from_be_bytes([src[0], src[1]]) as usize;
        let total = LENGTH_PREFIX_LEN + len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_PREFIX_LEN);
        Ok(Some(src.split_to(len)))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(frame) => Ok(Some(frame)),
            None if buf.is_empty() => Ok(None),
            None => Err(FrameError::StreamClosed),
        }
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let prefix = length_prefix(item.len())?;
        dst.reserve(LENGTH_PREFIX_LEN + item.len());
        dst.put_slice(&prefix);
        dst.put_slice(&item);
        Ok(())
    }
}
