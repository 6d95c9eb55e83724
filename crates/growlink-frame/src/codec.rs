use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::error::FrameError;

/// Frame delimiter.
pub const DELIMITER: u8 = b'\n';

/// Default maximum line length: 1 MiB.
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024 * 1024;

/// One complete line of protocol text, without its delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    text: String,
}

impl Frame {
    /// Create a new frame.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// Configuration for the line codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum line length in bytes, excluding the delimiter. Default: 1 MiB.
    pub max_frame_len: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// Result of decoding one line.
#[derive(Debug)]
pub enum Decoded {
    /// A complete, well-formed line.
    Frame(Frame),
    /// A line that was consumed and dropped. The stream continues.
    Discarded(FrameError),
}

/// Newline-delimited text codec.
///
/// Used with `FramedRead`, whose read buffer is the carry-over between socket
/// reads: a chunk that ends mid-line leaves the remainder buffered until a
/// later chunk supplies the `\n`. Blank lines are skipped and a trailing `\r`
/// is stripped.
///
/// Malformed lines come out as [`Decoded::Discarded`] rather than `Err`, since
/// a `FramedRead` stops yielding items after its decoder first errors.
#[derive(Debug, Clone, Default)]
pub struct LineCodec {
    config: FrameConfig,
    /// Offset already scanned for a delimiter.
    next_index: usize,
    /// Dropping the rest of an oversized line.
    discarding: bool,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            config,
            next_index: 0,
            discarding: false,
        }
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn too_large(&self, size: usize) -> Decoded {
        Decoded::Discarded(FrameError::FrameTooLarge {
            size,
            max: self.config.max_frame_len,
        })
    }
}

impl Decoder for LineCodec {
    type Item = Decoded;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Decoded>, FrameError> {
        loop {
            let start = self.next_index.min(src.len());
            let Some(offset) = src[start..].iter().position(|b| *b == DELIMITER) else {
                if self.discarding {
                    src.clear();
                    self.next_index = 0;
                    return Ok(None);
                }
                if src.len() > self.config.max_frame_len {
                    let size = src.len();
                    src.clear();
                    self.next_index = 0;
                    self.discarding = true;
                    return Ok(Some(self.too_large(size)));
                }
                self.next_index = src.len();
                return Ok(None);
            };

            let end = start + offset;
            let line = src.split_to(end + 1);
            self.next_index = 0;

            if self.discarding {
                self.discarding = false;
                continue;
            }

            let body = match &line[..end] {
                [body @ .., b'\r'] => body,
                body => body,
            };
            if body.trim_ascii().is_empty() {
                continue;
            }
            if body.len() > self.config.max_frame_len {
                return Ok(Some(self.too_large(body.len())));
            }

            return Ok(Some(match std::str::from_utf8(body) {
                Ok(text) => Decoded::Frame(Frame::new(text)),
                Err(err) => Decoded::Discarded(FrameError::InvalidUtf8(err)),
            }));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Decoded>, FrameError> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }
        if !src.is_empty() {
            debug!(remaining = src.len(), "dropping partial frame at end of stream");
        }
        src.clear();
        self.next_index = 0;
        self.discarding = false;
        Ok(None)
    }
}

impl Encoder<Frame> for LineCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        let text = frame.as_str().as_bytes();
        if text.contains(&DELIMITER) {
            return Err(FrameError::EmbeddedDelimiter);
        }
        if text.len() > self.config.max_frame_len {
            return Err(FrameError::FrameTooLarge {
                size: text.len(),
                max: self.config.max_frame_len,
            });
        }
        dst.reserve(text.len() + 1);
        dst.put_slice(text);
        dst.put_u8(DELIMITER);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio::io::AsyncWriteExt;
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;

    const STATUS: &str = r#"{"event":"status_update","data":{"status":"fail","error":"timeout"}}"#;
    const SENSOR: &str = r#"{"event":"sensor_update","data":{"id":"t1","value":21.5}}"#;
    const WARNING: &str = r#"{"event":"warning_issued","data":{"id":"w1","message":"hot"}}"#;

    /// Feed `chunks` through one codec and collect every decoded line.
    fn decode_chunks(codec: &mut LineCodec, chunks: &[&[u8]]) -> Vec<Decoded> {
        let mut buf = BytesMut::new();
        let mut out = Vec::new();
        for chunk in chunks {
            buf.extend_from_slice(chunk);
            while let Some(item) = codec.decode(&mut buf).unwrap() {
                out.push(item);
            }
        }
        out
    }

    fn texts(items: Vec<Decoded>) -> Vec<String> {
        items
            .into_iter()
            .map(|item| match item {
                Decoded::Frame(frame) => frame.into_string(),
                Decoded::Discarded(err) => panic!("unexpected discard: {err}"),
            })
            .collect()
    }

    fn wire(lines: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        for line in lines {
            out.extend_from_slice(line.as_bytes());
            out.push(DELIMITER);
        }
        out
    }

    #[test]
    fn decodes_multiple_frames_from_one_chunk() {
        let bytes = wire(&[STATUS, SENSOR]);
        let frames = texts(decode_chunks(&mut LineCodec::new(), &[bytes.as_slice()]));
        assert_eq!(frames, vec![STATUS, SENSOR]);
    }

    #[test]
    fn partial_frame_waits_for_delimiter() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&STATUS.as_bytes()[..20]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 20, "partial line must stay buffered");

        buf.extend_from_slice(&STATUS.as_bytes()[20..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.put_u8(DELIMITER);
        match codec.decode(&mut buf).unwrap() {
            Some(Decoded::Frame(frame)) => assert_eq!(frame.as_str(), STATUS),
            other => panic!("expected frame, got {other:?}"),
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn any_two_way_split_reproduces_frames() {
        let bytes = wire(&[STATUS, SENSOR, WARNING]);
        for split in 0..=bytes.len() {
            let (left, right) = bytes.split_at(split);
            let frames = texts(decode_chunks(&mut LineCodec::new(), &[left, right]));
            assert_eq!(frames, vec![STATUS, SENSOR, WARNING], "split at {split}");
        }
    }

    #[test]
    fn byte_by_byte_reproduces_frames() {
        let bytes = wire(&[SENSOR, WARNING, STATUS]);
        let chunks: Vec<&[u8]> = bytes.chunks(1).collect();
        let frames = texts(decode_chunks(&mut LineCodec::new(), &chunks));
        assert_eq!(frames, vec![SENSOR, WARNING, STATUS]);
    }

    #[test]
    fn blank_lines_are_skipped_and_crlf_stripped() {
        let bytes: &[u8] = b"\n\r\n   \n{\"a\":1}\r\n\n{\"b\":2}\n";
        let frames = texts(decode_chunks(&mut LineCodec::new(), &[bytes]));
        assert_eq!(frames, vec![r#"{"a":1}"#, r#"{"b":2}"#]);
    }

    #[test]
    fn invalid_utf8_line_is_discarded_and_stream_continues() {
        let mut bytes = vec![0xff, 0xfe, DELIMITER];
        bytes.extend_from_slice(&wire(&[SENSOR]));

        let items = decode_chunks(&mut LineCodec::new(), &[bytes.as_slice()]);
        assert_eq!(items.len(), 2);
        assert!(matches!(
            &items[0],
            Decoded::Discarded(FrameError::InvalidUtf8(_))
        ));
        assert!(matches!(&items[1], Decoded::Frame(f) if f.as_str() == SENSOR));
    }

    #[test]
    fn oversized_line_is_discarded_once_then_recovers() {
        let mut codec = LineCodec::with_config(FrameConfig { max_frame_len: 16 });
        let long = "x".repeat(40);

        let items = decode_chunks(
            &mut codec,
            &[
                &long.as_bytes()[..20],
                &long.as_bytes()[20..],
                &b"\n{\"ok\":true}\n"[..],
            ],
        );
        assert_eq!(items.len(), 2, "one discard, one frame: {items:?}");
        assert!(matches!(
            &items[0],
            Decoded::Discarded(FrameError::FrameTooLarge { max: 16, .. })
        ));
        assert!(matches!(&items[1], Decoded::Frame(f) if f.as_str() == r#"{"ok":true}"#));
    }

    #[test]
    fn complete_oversized_line_is_discarded() {
        let mut codec = LineCodec::with_config(FrameConfig { max_frame_len: 4 });
        let items = decode_chunks(&mut codec, &[&b"abcdefgh\nabc\n"[..]]);
        assert!(matches!(
            &items[0],
            Decoded::Discarded(FrameError::FrameTooLarge { size: 8, max: 4 })
        ));
        assert!(matches!(&items[1], Decoded::Frame(f) if f.as_str() == "abc"));
    }

    #[test]
    fn eof_drops_trailing_partial_frame() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"{\"a\":1}\n{\"trunc"[..]);

        match codec.decode_eof(&mut buf).unwrap() {
            Some(Decoded::Frame(frame)) => assert_eq!(frame.as_str(), r#"{"a":1}"#),
            other => panic!("expected frame, got {other:?}"),
        }
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn encode_appends_delimiter() {
        let mut buf = BytesMut::new();
        let mut codec = LineCodec::new();
        codec
            .encode(Frame::new(r#"{"cmd":"enable_auto"}"#), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"{\"cmd\":\"enable_auto\"}\n");
    }

    #[test]
    fn encode_rejects_embedded_newline() {
        let mut buf = BytesMut::new();
        let err = LineCodec::new()
            .encode(Frame::new("one\ntwo"), &mut buf)
            .unwrap_err();
        assert!(matches!(err, FrameError::EmbeddedDelimiter));
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn framed_read_over_split_writes() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let bytes = wire(&[STATUS, SENSOR]);

        let writer = tokio::spawn(async move {
            for chunk in bytes.chunks(7) {
                tx.write_all(chunk).await.unwrap();
                tokio::task::yield_now().await;
            }
        });

        let mut frames = FramedRead::new(rx, LineCodec::new());
        let mut got = Vec::new();
        while let Some(item) = frames.next().await {
            match item.unwrap() {
                Decoded::Frame(frame) => got.push(frame.into_string()),
                Decoded::Discarded(err) => panic!("unexpected discard: {err}"),
            }
        }
        writer.await.unwrap();
        assert_eq!(got, vec![STATUS, SENSOR]);
    }

    #[tokio::test]
    async fn framed_write_then_read() {
        let (tx, rx) = tokio::io::duplex(256);
        let mut sink = FramedWrite::new(tx, LineCodec::new());
        sink.send(Frame::new(r#"{"cmd":"set_stage","stage":2}"#))
            .await
            .unwrap();
        sink.send(Frame::new(r#"{"cmd":"enable_auto"}"#))
            .await
            .unwrap();
        drop(sink);

        let mut frames = FramedRead::new(rx, LineCodec::new());
        let mut got = Vec::new();
        while let Some(Ok(Decoded::Frame(frame))) = frames.next().await {
            got.push(frame.into_string());
        }
        assert_eq!(
            got,
            vec![r#"{"cmd":"set_stage","stage":2}"#, r#"{"cmd":"enable_auto"}"#]
        );
    }
}
