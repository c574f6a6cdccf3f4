//! CRLF line framing (spec.md §4.1's wire codec), shared by the TCP and
//! WebSocket transports.
//!
//! Grounded in the teacher's use of `tokio_util::codec` to frame a byte
//! stream into IRC lines (`network/connection.rs`'s `FramedWrite`),
//! narrowed to a plain `Decoder`/`Encoder` pair instead of the teacher's
//! zero-copy `Transport` abstraction — this server has no latency budget
//! that justifies the extra complexity (spec.md §9).

use bytes::{Buf, BytesMut};
use ircd_proto::Message;
use tokio_util::codec::{Decoder, Encoder};

/// The longest line this server will accept before treating the
/// connection as misbehaving (spec.md §4.1).
const MAX_LINE_LENGTH: usize = 8192;

/// Splits a byte stream on `\n`, tolerating a bare LF where CRLF is
/// expected (spec.md §4.1), and serializes outgoing [`Message`]s back
/// to CRLF-terminated lines.
#[derive(Debug, Default)]
pub struct LineCodec;

impl Decoder for LineCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        let Some(newline) = buf.iter().position(|&b| b == b'\n') else {
            if buf.len() > MAX_LINE_LENGTH {
                buf.clear();
                return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "line too long"));
            }
            return Ok(None);
        };

        if newline > MAX_LINE_LENGTH {
            buf.advance(newline + 1);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "line too long"));
        }

        let mut line = buf.split_to(newline + 1);
        line.truncate(line.len() - 1); // drop the '\n'
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }
}

impl Encoder<Message> for LineCodec {
    type Error = std::io::Error;

    fn encode(&mut self, msg: Message, buf: &mut BytesMut) -> Result<(), Self::Error> {
        buf.extend_from_slice(msg.to_line().as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_crlf_and_bare_lf() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from("NICK foo\r\nPING bar\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("NICK foo".to_owned()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING bar".to_owned()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn partial_line_waits_for_more_data() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from("NICK fo");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"o\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("NICK foo".to_owned()));
    }

    #[test]
    fn oversized_line_is_rejected() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from(vec![b'a'; MAX_LINE_LENGTH + 100].as_slice());
        buf.extend_from_slice(b"\n");
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn encodes_with_crlf_terminator() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::new();
        codec.encode(Message::new("PING", vec!["x".to_owned()]), &mut buf).unwrap();
        assert_eq!(&buf[..], b"PING x\r\n");
    }
}
