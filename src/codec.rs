//! Wire codec
//!
//! Two layers:
//! - the payload transform (`encode` / `decode`): character reversal,
//!   kept only for compatibility with existing clients. It hides nothing.
//! - line framing (`RelayLineCodec`): one message per CRLF-terminated line.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

/// Default upper bound for a single inbound line, in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8192;

/// Encode outbound message text for the wire.
pub fn encode(text: &str) -> String {
    text.chars().rev().collect()
}

/// Decode inbound wire text. Self-inverse with [`encode`].
pub fn decode(wire: &str) -> String {
    wire.chars().rev().collect()
}

/// Replace CR and LF with spaces so the text fits in a single frame.
pub fn flatten_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// CRLF line codec
///
/// Decoding accepts both `\n` and `\r\n` terminators (delegates to
/// [`LinesCodec`]). Encoding always terminates with `\r\n` and refuses
/// payloads that contain a terminator, so a frame is never split.
#[derive(Debug, Clone)]
pub struct RelayLineCodec {
    inner: LinesCodec,
}

impl RelayLineCodec {
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_LINE_LENGTH)
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_length),
        }
    }
}

impl Default for RelayLineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for RelayLineCodec {
    type Item = String;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, LinesCodecError> {
        self.inner.decode(buf)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, LinesCodecError> {
        self.inner.decode_eof(buf)
    }
}

impl<T> Encoder<T> for RelayLineCodec
where
    T: AsRef<str>,
{
    type Error = LinesCodecError;

    fn encode(&mut self, line: T, buf: &mut BytesMut) -> Result<(), LinesCodecError> {
        let line = line.as_ref();
        if line.contains(|c| c == '\r' || c == '\n') {
            return Err(LinesCodecError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "line contains an embedded terminator",
            )));
        }
        buf.reserve(line.len() + 2);
        buf.put(line.as_bytes());
        buf.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_reverses() {
        assert_eq!(encode("hi"), "ih");
        assert_eq!(encode("hello world"), "dlrow olleh");
        assert_eq!(encode(""), "");
    }

    #[test]
    fn test_transform_is_involution() {
        for text in ["", "a", "hi", "  spaced\tout  ", "héllo wörld", "emoji 🦀 ok"] {
            assert_eq!(decode(&encode(text)), text);
            assert_eq!(encode(&encode(text)), text);
        }
    }

    #[test]
    fn test_flatten_line() {
        assert_eq!(flatten_line("a\r\nb\nc"), "a  b c");
        assert_eq!(flatten_line("plain"), "plain");
    }

    #[test]
    fn test_encoder_appends_crlf() {
        let mut codec = RelayLineCodec::new();
        let mut buf = BytesMut::new();
        codec.encode("USERLIST:alice", &mut buf).unwrap();
        assert_eq!(&buf[..], b"USERLIST:alice\r\n");
    }

    #[test]
    fn test_encoder_rejects_embedded_newline() {
        let mut codec = RelayLineCodec::new();
        let mut buf = BytesMut::new();
        assert!(codec.encode("two\nlines", &mut buf).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decoder_strips_crlf_and_lf() {
        let mut codec = RelayLineCodec::new();
        let mut buf = BytesMut::from(&b"alice\r\nih\npartial"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("alice".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("ih".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), Some("partial".to_string()));
    }

    #[test]
    fn test_decoder_enforces_max_length() {
        let mut codec = RelayLineCodec::with_max_length(4);
        let mut buf = BytesMut::from(&b"toolong\r\n"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(LinesCodecError::MaxLineLengthExceeded)
        ));
    }
}
