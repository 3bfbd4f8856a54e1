//! Length-prefixed message framing: `length(u64, big-endian) || payload`.

use crate::error::P2pError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const MAX_FRAME_LEN: u64 = 128 * 1024 * 1024;

pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, P2pError> {
    let mut len_buf = [0u8; 8];
    reader.read_exact(&mut len_buf).await?;
    let len = u64::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(P2pError::FrameTooLarge { len });
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<(), P2pError> {
    let len = payload.len() as u64;
    if len > MAX_FRAME_LEN {
        return Err(P2pError::FrameTooLarge { len });
    }
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn roundtrips_a_frame() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello").await.unwrap();
        let mut cursor = Cursor::new(buf);
        let payload = read_frame(&mut cursor).await.unwrap();
        assert_eq!(payload, b"hello");
    }

    #[tokio::test]
    async fn rejects_oversized_frame() {
        let mut len_buf = Vec::new();
        len_buf.extend_from_slice(&(MAX_FRAME_LEN + 1).to_be_bytes());
        let mut cursor = Cursor::new(len_buf);
        assert!(matches!(
            read_frame(&mut cursor).await,
            Err(P2pError::FrameTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn read_fails_on_truncated_stream() {
        let mut cursor = Cursor::new(vec![0u8, 0, 0, 0, 0, 0, 0, 5, 1, 2]);
        assert!(read_frame(&mut cursor).await.is_err());
    }
}
