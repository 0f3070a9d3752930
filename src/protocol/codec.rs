//! NDJSON line framing over an async byte stream (spec §4.1).
//!
//! One JSON value per line, `\n`-terminated; an optional trailing `\r` is
//! tolerated. No length prefix — a single line may be several megabytes
//! since screenshots are transported as inline base64.

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Read one line from `reader`, stripping a trailing `\r\n` or `\n`.
/// Returns `Ok(None)` on clean EOF (no bytes read).
pub async fn read_line<R>(reader: &mut BufReader<R>) -> std::io::Result<Option<String>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = String::new();
    let n = reader.read_line(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    while buf.ends_with('\n') || buf.ends_with('\r') {
        buf.pop();
    }
    Ok(Some(buf))
}

/// Parse a raw line into a JSON value. The caller maps a parse failure to
/// `-32700` (spec §4.1) rather than this function returning a domain error,
/// since the failure must carry `id: null` regardless of envelope shape.
pub fn parse_line(line: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(line)
}

/// Serialize `value` and write it as one `\n`-terminated line.
pub async fn write_line<W>(writer: &mut W, value: &Value) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn read_line_strips_trailing_crlf() {
        let data = b"{\"a\":1}\r\n{\"b\":2}\n".to_vec();
        let mut reader = BufReader::new(Cursor::new(data));
        assert_eq!(read_line(&mut reader).await.unwrap(), Some(r#"{"a":1}"#.to_string()));
        assert_eq!(read_line(&mut reader).await.unwrap(), Some(r#"{"b":2}"#.to_string()));
        assert_eq!(read_line(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_line_handles_large_lines() {
        let payload = "x".repeat(5_000_000);
        let mut data = format!("{{\"data\":\"{}\"}}\n", payload).into_bytes();
        let expected_len = data.len();
        let mut reader = BufReader::new(Cursor::new(std::mem::take(&mut data)));
        let line = read_line(&mut reader).await.unwrap().unwrap();
        assert_eq!(line.len() + 1, expected_len);
    }

    #[test]
    fn parse_line_reports_invalid_json() {
        assert!(parse_line("not json").is_err());
    }

    #[tokio::test]
    async fn write_line_appends_newline() {
        let mut buf: Vec<u8> = Vec::new();
        write_line(&mut buf, &serde_json::json!({"a":1})).await.unwrap();
        assert_eq!(buf, b"{\"a\":1}\n");
    }
}
