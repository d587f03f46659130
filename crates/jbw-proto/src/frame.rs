//! Length-prefixed framing over any `tokio` byte stream.
//!
//! Wire layout: `u32 total_len | u64 seq | u8 tag | body`, where
//! `total_len` counts everything after itself. `seq` is the sequence
//! number the client API keys its per-request future on; the
//! server echoes the request's `seq` back on its response. A STEP frame
//! (server -> client, unsolicited) carries `seq = 0` — it never consumes
//! a pending-request slot, so no caller ever keys on it.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtoError, ProtoResult};

/// Frames larger than this are rejected rather than causing an unbounded
/// allocation from a malformed or hostile length prefix.
pub const MAX_FRAME_BYTES: u32 = 64 * 1024 * 1024;

pub struct Frame {
    pub seq: u64,
    pub tag: u8,
    pub body: Vec<u8>,
}

/// Encode a complete frame (length prefix, header, body) into one byte
/// buffer. Used both by `write_frame` below and by callers that need a
/// frame's bytes ahead of time to queue onto an outbound channel (e.g.
/// the server's per-session broadcaster, which pushes `Vec<u8>` onto an
/// `mpsc` rather than writing to the socket directly).
pub fn encode_frame(seq: u64, tag: u8, body: &[u8]) -> ProtoResult<Vec<u8>> {
    let total_len = 8 + 1 + body.len();
    let total_len_u32: u32 =
        total_len.try_into().map_err(|_| ProtoError::FrameTooLarge { max: MAX_FRAME_BYTES, actual: u32::MAX })?;
    if total_len_u32 > MAX_FRAME_BYTES {
        return Err(ProtoError::FrameTooLarge { max: MAX_FRAME_BYTES, actual: total_len_u32 });
    }
    let mut out = Vec::with_capacity(4 + total_len);
    out.extend_from_slice(&total_len_u32.to_le_bytes());
    out.extend_from_slice(&seq.to_le_bytes());
    out.push(tag);
    out.extend_from_slice(body);
    Ok(out)
}

pub async fn write_frame<W: AsyncWrite + Unpin>(w: &mut W, seq: u64, tag: u8, body: &[u8]) -> ProtoResult<()> {
    let frame = encode_frame(seq, tag, body)?;
    w.write_all(&frame).await?;
    w.flush().await?;
    Ok(())
}

/// Read one frame, or `Ok(None)` on a clean EOF before any bytes of the
/// next frame arrive (the caller's connection is simply done).
pub async fn read_frame<R: AsyncRead + Unpin>(r: &mut R) -> ProtoResult<Option<Frame>> {
    let mut len_buf = [0u8; 4];
    match r.read_exact(&mut len_buf).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let total_len = u32::from_le_bytes(len_buf);
    if total_len > MAX_FRAME_BYTES {
        return Err(ProtoError::FrameTooLarge { max: MAX_FRAME_BYTES, actual: total_len });
    }
    if (total_len as usize) < 9 {
        return Err(ProtoError::Truncated { wanted: 9, had: total_len as usize });
    }
    let mut rest = vec![0u8; total_len as usize];
    r.read_exact(&mut rest).await?;
    let seq = u64::from_le_bytes(rest[0..8].try_into().unwrap());
    let tag = rest[8];
    let body = rest[9..].to_vec();
    Ok(Some(Frame { seq, tag, body }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frame_round_trips() {
        let mut buf: Vec<u8> = Vec::new();
        write_frame(&mut buf, 42, 0x05, b"hello").await.unwrap();
        let mut cursor = std::io::Cursor::new(buf);
        let frame = read_frame(&mut cursor).await.unwrap().expect("one frame");
        assert_eq!(frame.seq, 42);
        assert_eq!(frame.tag, 0x05);
        assert_eq!(frame.body, b"hello");
    }

    #[tokio::test]
    async fn clean_eof_before_any_bytes_is_none() {
        let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
        assert!(read_frame(&mut cursor).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(MAX_FRAME_BYTES + 1).to_le_bytes());
        let mut cursor = std::io::Cursor::new(buf);
        assert!(matches!(read_frame(&mut cursor).await, Err(ProtoError::FrameTooLarge { .. })));
    }
}
