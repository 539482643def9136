//! Byte stream to chat event decoding.
//!
//! The body of a `/chat` response is newline-delimited text. Network reads do
//! not respect line boundaries, so partial lines (including partial UTF-8
//! sequences) are buffered by [`FrameCodec`] until their terminator arrives.
//!
//! Consumption is pull-based: the caller reduces one event before polling the
//! next one, and no frame is decoded ahead of that request.

use std::io;

use bytes::{Buf, BytesMut};
use futures_util::stream::{BoxStream, Stream, StreamExt};
use tokio_util::codec::{Decoder, FramedRead};
use tokio_util::io::StreamReader;

use super::event::{ChatEvent, parse_frame};
use crate::client::{ClientError, ClientResult};

/// Stream of decoded chat events. Items are only `Err` for transport failures.
pub type ChatEventStream = BoxStream<'static, ClientResult<ChatEvent>>;

/// Splits a byte buffer into text lines.
///
/// A trailing `\r` is stripped so CRLF bodies decode the same as LF bodies.
/// Lines are decoded lossily: a corrupt byte spoils only its own frame, which
/// then fails JSON parsing and is dropped.
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Offset up to which the buffer is known to contain no `\n`.
    scanned: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for FrameCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        let Some(offset) = src[self.scanned..].iter().position(|b| *b == b'\n') else {
            self.scanned = src.len();
            return Ok(None);
        };

        let newline = self.scanned + offset;
        self.scanned = 0;
        let line = src.split_to(newline + 1);
        Ok(Some(line_to_string(&line[..newline])))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        self.scanned = 0;
        if src.is_empty() {
            return Ok(None);
        }
        let rest = src.split_to(src.len());
        Ok(Some(line_to_string(&rest)))
    }
}

fn line_to_string(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decodes a raw byte stream into chat events.
///
/// Lines without the `data: ` prefix and malformed JSON are dropped (and
/// logged). The returned stream ends when the byte stream ends.
pub fn decode_events<S, B, E>(bytes: S) -> ChatEventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: Buf + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let reader = StreamReader::new(Box::pin(bytes.map(|chunk| chunk.map_err(io::Error::other))));

    FramedRead::new(reader, FrameCodec::new())
        .filter_map(|line| async move {
            match line {
                Ok(line) => parse_frame(&line).map(Ok),
                Err(err) => Some(Err(ClientError::transport(format!(
                    "Stream read failed: {err}"
                )))),
            }
        })
        .boxed()
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    const CHAT_STREAM: &str = concat!(
        "data: {\"type\": \"thought\", \"content\": \"Thinking: check live context\"}\n\n",
        "data: {\"type\": \"action\", \"content\": \"Accessing tool: fetch_live_match_context\", \"details\": \"\"}\n\n",
        "data: {\"type\": \"observation\", \"content\": \"{\\\"matches\\\": []}\"}\n\n",
        "data: {\"type\": \"answer\", \"content\": \"[HIGHLIGHT: Kohli] Kohli is set.\"}\n\n",
    );

    fn mock_byte_stream(
        data: &str,
        chunk_size: usize,
    ) -> impl Stream<Item = std::result::Result<Bytes, std::io::Error>> + Send + 'static {
        let chunks: Vec<_> = data
            .as_bytes()
            .chunks(chunk_size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        futures_util::stream::iter(chunks)
    }

    async fn collect(stream: ChatEventStream) -> Vec<ChatEvent> {
        stream
            .map(|item| item.expect("Expected valid event"))
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_decode_chat_stream() {
        let events = collect(decode_events(mock_byte_stream(CHAT_STREAM, 50))).await;

        assert_eq!(
            events,
            vec![
                ChatEvent::Thought("Thinking: check live context".to_string()),
                ChatEvent::Action("Accessing tool: fetch_live_match_context".to_string()),
                ChatEvent::Observation("{\"matches\": []}".to_string()),
                ChatEvent::Answer("[HIGHLIGHT: Kohli] Kohli is set.".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_split_at_every_offset_matches_unsplit() {
        let unsplit = collect(decode_events(mock_byte_stream(CHAT_STREAM, CHAT_STREAM.len()))).await;

        for split in 1..CHAT_STREAM.len() {
            let bytes = CHAT_STREAM.as_bytes();
            let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
                Ok(Bytes::copy_from_slice(&bytes[..split])),
                Ok(Bytes::copy_from_slice(&bytes[split..])),
            ];
            let events = collect(decode_events(futures_util::stream::iter(chunks))).await;
            assert_eq!(events, unsplit, "split at byte {split}");
        }
    }

    #[tokio::test]
    async fn test_handles_tiny_chunks() {
        let events = collect(decode_events(mock_byte_stream(CHAT_STREAM, 3))).await;
        assert_eq!(events.len(), 4);
    }

    #[tokio::test]
    async fn test_handles_utf8_split_across_chunks() {
        // 🏏 = F0 9F 8F 8F (4 bytes)
        let data = "data: {\"type\":\"answer\",\"content\":\"Six! 🏏 over the rope\"}\n";
        let bytes = data.as_bytes();
        let emoji_start = bytes
            .windows(4)
            .position(|w| w == [0xF0, 0x9F, 0x8F, 0x8F])
            .expect("emoji not found");
        let split_point = emoji_start + 2;

        let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::copy_from_slice(&bytes[..split_point])),
            Ok(Bytes::copy_from_slice(&bytes[split_point..])),
        ];
        let events = collect(decode_events(futures_util::stream::iter(chunks))).await;

        assert_eq!(
            events,
            vec![ChatEvent::Answer("Six! 🏏 over the rope".to_string())]
        );
    }

    #[tokio::test]
    async fn test_handles_crlf_line_endings() {
        let data = "data: {\"type\":\"answer\",\"content\":\"a\"}\r\n\r\ndata: {\"type\":\"answer\",\"content\":\"b\"}\r\n\r\n";
        let events = collect(decode_events(mock_byte_stream(data, 7))).await;

        assert_eq!(
            events,
            vec![
                ChatEvent::Answer("a".to_string()),
                ChatEvent::Answer("b".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_corrupt_frame_does_not_abort_stream() {
        let data = concat!(
            "data: {\"type\":\"answer\",\"content\":\"before\"}\n",
            "data: {\"type\":\"answer\",\"content\":\n",
            ": keep-alive\n",
            "data: {\"type\":\"answer\",\"content\":\"after\"}\n",
        );
        let events = collect(decode_events(mock_byte_stream(data, 11))).await;

        assert_eq!(
            events,
            vec![
                ChatEvent::Answer("before".to_string()),
                ChatEvent::Answer("after".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_decodes_unterminated_last_line() {
        let data = "data: {\"type\":\"answer\",\"content\":\"tail\"}";
        let events = collect(decode_events(mock_byte_stream(data, 8))).await;
        assert_eq!(events, vec![ChatEvent::Answer("tail".to_string())]);
    }

    #[tokio::test]
    async fn test_transport_error_surfaces_as_item() {
        let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(
                b"data: {\"type\":\"answer\",\"content\":\"partial\"}\n",
            )),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )),
        ];
        let mut stream = decode_events(futures_util::stream::iter(chunks));

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, ChatEvent::Answer("partial".to_string()));

        let second = stream.next().await.unwrap().unwrap_err();
        assert_eq!(second.kind, crate::client::ClientErrorKind::Transport);
    }

    #[test]
    fn test_frame_codec_keeps_partial_line_buffered() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"data: {\"type\""[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b"data: {\"type\"");

        buf.extend_from_slice(b":\"answer\"}\nnext");
        assert_eq!(
            codec.decode(&mut buf).unwrap().as_deref(),
            Some("data: {\"type\":\"answer\"}")
        );
        assert_eq!(&buf[..], b"next");
    }
}
