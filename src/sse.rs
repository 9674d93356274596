//! Server-sent events (SSE) processing for streaming chat responses.
//!
//! This module reassembles the backend's chat stream from raw byte chunks into
//! typed [`StreamFrame`] values. Chunk boundaries are arbitrary: a frame may be
//! split anywhere, including in the middle of a multi-byte UTF-8 character, so
//! buffering happens at the byte level and text decoding happens per frame.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::observability::STREAM_CHUNKS;
use crate::types::ChatEvent;
use crate::{Error, Result};

/// Frame delimiter: events are separated by a blank line.
const FRAME_DELIMITER: &[u8] = b"\n\n";

/// Sentinel payload marking the end of the stream.
const DONE_SENTINEL: &str = "[DONE]";

/// A parsed frame from the chat event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    /// A decoded JSON event.
    Event(ChatEvent),

    /// The literal `data: [DONE]` sentinel. Distinct from the JSON `done`
    /// event, with the same effect on consumer state.
    EndOfStream,
}

/// Process a stream of bytes into a stream of chat frames.
///
/// Bytes are accumulated until a complete `\n\n`-delimited frame is available;
/// the trailing incomplete segment is retained for the next chunk. Frames
/// without a `data: ` payload line (comments, keep-alives) are skipped.
/// A frame that fails UTF-8 or JSON decoding yields an `Err` item and the
/// stream continues past it.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<StreamFrame>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    // Convert reqwest errors to our error type
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    let buffer: Vec<u8> = Vec::new();

    stream::unfold(
        (stream, buffer),
        move |(mut stream, mut buffer)| async move {
            loop {
                // First drain any complete frame already in the buffer.
                while let Some((frame, remaining)) = extract_frame(&buffer) {
                    buffer = remaining;
                    match frame {
                        Some(item) => return Some((item, (stream, buffer))),
                        // Frame without a data line: skip it.
                        None => continue,
                    }
                }

                // Read more data
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_CHUNKS.click();
                        buffer.extend_from_slice(&bytes);
                    }
                    Some(Err(e)) => {
                        return Some((Err(e), (stream, buffer)));
                    }
                    None => {
                        // End of stream. A trailing segment without its
                        // delimiter is dropped, matching the framing contract
                        // that every event ends in a blank line.
                        return None;
                    }
                }
            }
        },
    )
}

/// Extract one complete frame from the front of the buffer.
///
/// Returns `None` if no full frame is buffered yet. Otherwise returns the
/// parsed frame (or `None` for a frame with no `data:` line, which the caller
/// skips) together with the bytes remaining after the delimiter.
#[allow(clippy::type_complexity)]
fn extract_frame(buffer: &[u8]) -> Option<(Option<Result<StreamFrame>>, Vec<u8>)> {
    let pos = buffer
        .windows(FRAME_DELIMITER.len())
        .position(|window| window == FRAME_DELIMITER)?;
    let frame_bytes = &buffer[..pos];
    let rest = buffer[pos + FRAME_DELIMITER.len()..].to_vec();

    let text = match std::str::from_utf8(frame_bytes) {
        Ok(text) => text,
        Err(e) => {
            return Some((
                Some(Err(Error::encoding(
                    format!("Invalid UTF-8 in frame: {e}"),
                    Some(Box::new(e)),
                ))),
                rest,
            ));
        }
    };

    // A frame may carry multiple lines; only `data:` lines matter, and the
    // last one wins.
    let mut data = None;
    for line in text.lines() {
        if let Some(payload) = line.trim().strip_prefix("data:") {
            data = Some(payload.trim());
        }
    }

    match data {
        None => Some((None, rest)),
        Some(DONE_SENTINEL) => Some((Some(Ok(StreamFrame::EndOfStream)), rest)),
        Some(json_str) => match serde_json::from_str::<ChatEvent>(json_str) {
            Ok(event) => Some((Some(Ok(StreamFrame::Event(event))), rest)),
            Err(e) => Some((
                Some(Err(Error::serialization(
                    format!("Failed to parse event JSON: {e}"),
                    Some(Box::new(e)),
                ))),
                rest,
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    async fn collect_frames(chunks: Vec<&'static [u8]>) -> Vec<Result<StreamFrame>> {
        let stream = Box::pin(stream::iter(
            chunks.into_iter().map(|c| Ok(Bytes::from_static(c))),
        ));
        process_sse(stream).collect().await
    }

    fn token(content: &str) -> StreamFrame {
        StreamFrame::Event(ChatEvent::Token {
            content: content.to_string(),
        })
    }

    #[tokio::test]
    async fn parse_single_token_frame() {
        let frames = collect_frames(vec![b"data: {\"type\": \"token\", \"content\": \"Hi\"}\n\n"])
            .await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap(), &token("Hi"));
    }

    #[tokio::test]
    async fn parse_multiple_frames_in_one_chunk() {
        let data: &[u8] = b"data: {\"type\": \"token\", \"content\": \"Hi\"}\n\n\
                            data: {\"type\": \"token\", \"content\": \" there\"}\n\n\
                            data: {\"type\": \"done\"}\n\n";
        let frames = collect_frames(vec![data]).await;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].as_ref().unwrap(), &token("Hi"));
        assert_eq!(frames[1].as_ref().unwrap(), &token(" there"));
        assert_eq!(
            frames[2].as_ref().unwrap(),
            &StreamFrame::Event(ChatEvent::Done)
        );
    }

    #[tokio::test]
    async fn frame_split_across_chunks() {
        let frames = collect_frames(vec![
            b"data: {\"type\": \"tok",
            b"en\", \"content\": \"split\"}",
            b"\n\n",
        ])
        .await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap(), &token("split"));
    }

    #[tokio::test]
    async fn chunk_boundary_inside_multibyte_character() {
        // "é" is 0xC3 0xA9; split the stream between the two bytes.
        let body = "data: {\"type\": \"token\", \"content\": \"caf\u{e9}\"}\n\n".as_bytes();
        let split = body.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let (left, right) = body.split_at(split);
        let stream = Box::pin(stream::iter(vec![
            Ok(Bytes::copy_from_slice(left)),
            Ok(Bytes::copy_from_slice(right)),
        ]));
        let frames: Vec<_> = process_sse(stream).collect().await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap(), &token("caf\u{e9}"));
    }

    #[tokio::test]
    async fn every_chunk_split_yields_identical_frames() {
        let body: &[u8] = b"data: {\"type\": \"token\", \"content\": \"Hi\"}\n\n\
                            data: {\"type\": \"chart\", \"src\": \"data:image/png;base64,AA==\"}\n\n\
                            data: [DONE]\n\n";
        let mut expected = None;
        for split in 0..=body.len() {
            let (left, right) = body.split_at(split);
            let stream = Box::pin(stream::iter(vec![
                Ok(Bytes::copy_from_slice(left)),
                Ok(Bytes::copy_from_slice(right)),
            ]));
            let frames: Vec<_> = process_sse(stream)
                .map(|frame| frame.unwrap())
                .collect()
                .await;
            match &expected {
                None => expected = Some(frames),
                Some(expected) => assert_eq!(expected, &frames, "split at {split}"),
            }
        }
    }

    #[tokio::test]
    async fn done_sentinel_is_distinct_frame() {
        let frames = collect_frames(vec![b"data: [DONE]\n\n"]).await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap(), &StreamFrame::EndOfStream);
    }

    #[tokio::test]
    async fn malformed_json_yields_error_then_continues() {
        let data: &[u8] = b"data: {\"type\": \"token\", \"content\": \"a\"}\n\n\
                            data: {not json}\n\n\
                            data: {\"type\": \"token\", \"content\": \"b\"}\n\n";
        let frames = collect_frames(vec![data]).await;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].as_ref().unwrap(), &token("a"));
        assert!(frames[1].as_ref().is_err_and(Error::is_frame_local));
        assert_eq!(frames[2].as_ref().unwrap(), &token("b"));
    }

    #[tokio::test]
    async fn frames_without_data_lines_are_skipped() {
        let data: &[u8] = b": keep-alive\n\n\
                            data: {\"type\": \"token\", \"content\": \"x\"}\n\n";
        let frames = collect_frames(vec![data]).await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap(), &token("x"));
    }

    #[tokio::test]
    async fn trailing_partial_frame_is_dropped() {
        let data: &[u8] = b"data: {\"type\": \"done\"}\n\ndata: {\"type\": \"token\"";
        let frames = collect_frames(vec![data]).await;
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].as_ref().unwrap(),
            &StreamFrame::Event(ChatEvent::Done)
        );
    }
}
