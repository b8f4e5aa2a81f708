//! Newline-delimited framing
//!
//! Each record is one UTF-8 line. Lines longer than `MAX_LINE_BYTES` are a
//! framing error; blank lines are skipped.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::game::constants::net::MAX_LINE_BYTES;

/// Errors that can occur while reading or writing lines
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Line too long: {0} bytes (max {1})")]
    LineTooLong(usize, usize),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Read the next non-blank line, without its terminator.
///
/// Invalid UTF-8 is replaced rather than rejected. EOF, including EOF in the
/// middle of a line, is reported as `ConnectionClosed`.
pub async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String, FramingError> {
    let mut buf = Vec::with_capacity(256);
    loop {
        buf.clear();
        let limit = (MAX_LINE_BYTES + 1) as u64;
        let n = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;
        if n == 0 {
            return Err(FramingError::ConnectionClosed);
        }
        if buf.last() != Some(&b'\n') {
            if buf.len() > MAX_LINE_BYTES {
                return Err(FramingError::LineTooLong(buf.len(), MAX_LINE_BYTES));
            }
            return Err(FramingError::ConnectionClosed);
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if !line.is_empty() {
            return Ok(line.to_string());
        }
    }
}

/// Write one line, adding the terminator if missing
pub async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> Result<(), FramingError> {
    let body = line.strip_suffix('\n').unwrap_or(line);
    if body.len() > MAX_LINE_BYTES {
        return Err(FramingError::LineTooLong(body.len(), MAX_LINE_BYTES));
    }
    writer.write_all(body.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_write_then_read_lines() {
        let mut buffer = Vec::new();
        write_line(&mut buffer, "{\"type\":\"hello\"}").await.unwrap();
        write_line(&mut buffer, "second\n").await.unwrap();
        assert_eq!(buffer, b"{\"type\":\"hello\"}\nsecond\n");

        let mut reader = BufReader::new(&buffer[..]);
        assert_eq!(read_line(&mut reader).await.unwrap(), "{\"type\":\"hello\"}");
        assert_eq!(read_line(&mut reader).await.unwrap(), "second");
        assert!(matches!(read_line(&mut reader).await, Err(FramingError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_lines_split_across_reads() {
        let mock = tokio_test::io::Builder::new()
            .read(b"{\"a\":")
            .read(b"1}\n\n  \r\n{\"b\"")
            .read(b":2}\n")
            .build();
        let mut reader = BufReader::new(mock);
        assert_eq!(read_line(&mut reader).await.unwrap(), "{\"a\":1}");
        assert_eq!(read_line(&mut reader).await.unwrap(), "{\"b\":2}");
    }

    #[tokio::test]
    async fn test_eof_mid_line_is_closed() {
        let mut reader = BufReader::new(&b"partial"[..]);
        assert!(matches!(read_line(&mut reader).await, Err(FramingError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let mut reader = BufReader::new(&b"ok\xff\n"[..]);
        assert_eq!(read_line(&mut reader).await.unwrap(), "ok\u{fffd}");
    }

    #[tokio::test]
    async fn test_oversized_line_rejected() {
        let long = vec![b'x'; MAX_LINE_BYTES + 10];
        let mut reader = BufReader::new(&long[..]);
        assert!(matches!(read_line(&mut reader).await, Err(FramingError::LineTooLong(_, _))));

        let mut sink = Vec::new();
        let text = "x".repeat(MAX_LINE_BYTES + 1);
        assert!(matches!(write_line(&mut sink, &text).await, Err(FramingError::LineTooLong(_, _))));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_io_error_propagates() {
        let mock = tokio_test::io::Builder::new()
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let mut reader = BufReader::new(mock);
        assert!(matches!(read_line(&mut reader).await, Err(FramingError::Io(_))));
    }
}
