//! Newline-delimited JSON processing for streaming responses.
//!
//! The endpoint streams one JSON object per line. This module converts the raw
//! byte stream from an HTTP response into a stream of parsed [`ChatChunk`]
//! frames, handling line buffering, blank lines, and per-frame decode errors.

use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};

use crate::error::{Error, Result};
use crate::types::ChatChunk;

/// Process a stream of bytes into a stream of chat frames.
///
/// Frames are lines; blank lines are skipped. Buffering happens at the byte
/// level and lines are split on `b'\n'` before UTF-8 decoding, so a
/// multi-byte character straddling two transport chunks reassembles cleanly.
/// A line that fails to decode yields an error item and processing continues
/// with the next line; a single malformed frame never aborts assembly. The
/// stream ends when the transport closes it; a trailing unterminated line is
/// decoded as a final frame.
pub fn process_ndjson<S>(byte_stream: S) -> impl Stream<Item = Result<ChatChunk>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    // Convert reqwest errors to our error type
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    let buffer = BytesMut::new();

    stream::unfold(
        (stream, buffer, false),
        move |(mut stream, mut buffer, mut eof)| async move {
            loop {
                // First drain any complete line already buffered
                if let Some(frame) = extract_frame(&mut buffer) {
                    return Some((frame, (stream, buffer, eof)));
                }

                if eof {
                    // The transport closed; decode a trailing unterminated line
                    let line = buffer.split_to(buffer.len());
                    if let Some(frame) = decode_line(&line) {
                        return Some((frame, (stream, buffer, eof)));
                    }
                    return None;
                }

                // Read more data
                match stream.next().await {
                    Some(Ok(bytes)) => buffer.extend_from_slice(&bytes),
                    Some(Err(e)) => {
                        return Some((Err(e), (stream, buffer, eof)));
                    }
                    None => {
                        eof = true;
                    }
                }
            }
        },
    )
}

/// Extract the first complete non-blank line from the buffer.
fn extract_frame(buffer: &mut BytesMut) -> Option<Result<ChatChunk>> {
    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let line = buffer.split_to(pos + 1);
        if let Some(frame) = decode_line(&line[..pos]) {
            return Some(frame);
        }
    }
    None
}

/// Decode one line's bytes, or None if the line is blank.
fn decode_line(line: &[u8]) -> Option<Result<ChatChunk>> {
    let line = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(e) => {
            return Some(Err(Error::encoding(
                format!("Invalid UTF-8 in frame: {e}"),
                Some(Box::new(e)),
            )));
        }
    };
    if line.is_empty() {
        return None;
    }
    Some(decode_frame(line))
}

fn decode_frame(line: &str) -> Result<ChatChunk> {
    serde_json::from_str::<ChatChunk>(line).map_err(|e| {
        Error::serialization(format!("malformed frame {line:?}: {e}"), Some(Box::new(e)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn byte_stream(chunks: Vec<&'static [u8]>) -> impl Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin {
        Box::pin(stream::iter(
            chunks.into_iter().map(|c| Ok(Bytes::from(c))),
        ))
    }

    async fn collect_fragments<S>(frames: S) -> (Vec<String>, usize)
    where
        S: Stream<Item = Result<ChatChunk>>,
    {
        let mut fragments = Vec::new();
        let mut errors = 0;
        let mut frames = Box::pin(frames);
        while let Some(frame) = frames.next().await {
            match frame {
                Ok(chunk) => {
                    if let Some(fragment) = chunk.fragment() {
                        fragments.push(fragment.to_string());
                    }
                }
                Err(_) => errors += 1,
            }
        }
        (fragments, errors)
    }

    #[tokio::test]
    async fn fragments_arrive_in_order() {
        let data = b"{\"message\":{\"content\":\"Hel\"}}\n{\"message\":{\"content\":\"lo\"}}\n";
        let frames = process_ndjson(byte_stream(vec![&data[..]]));

        let (fragments, errors) = collect_fragments(frames).await;
        assert_eq!(fragments, vec!["Hel".to_string(), "lo".to_string()]);
        assert_eq!(errors, 0);
        assert_eq!(fragments.concat(), "Hello");
    }

    #[tokio::test]
    async fn malformed_line_does_not_abort() {
        let data =
            b"{\"message\":{\"content\":\"a\"}}\nnot json at all\n{\"message\":{\"content\":\"b\"}}\n";
        let frames = process_ndjson(byte_stream(vec![&data[..]]));

        let (fragments, errors) = collect_fragments(frames).await;
        assert_eq!(fragments, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(errors, 1);
    }

    #[tokio::test]
    async fn blank_lines_skipped() {
        let data = b"\n\n{\"message\":{\"content\":\"x\"}}\n\n{\"done\":true}\n";
        let frames = process_ndjson(byte_stream(vec![&data[..]]));

        let (fragments, errors) = collect_fragments(frames).await;
        assert_eq!(fragments, vec!["x".to_string()]);
        assert_eq!(errors, 0);
    }

    #[tokio::test]
    async fn frame_split_across_chunks() {
        let chunk1 = b"{\"message\":{\"cont";
        let chunk2 = b"ent\":\"whole\"}}\n";
        let frames = process_ndjson(byte_stream(vec![&chunk1[..], &chunk2[..]]));

        let (fragments, errors) = collect_fragments(frames).await;
        assert_eq!(fragments, vec!["whole".to_string()]);
        assert_eq!(errors, 0);
    }

    #[tokio::test]
    async fn multibyte_character_split_across_chunks() {
        // "é" is 0xC3 0xA9; split the transport chunks between its bytes so
        // neither chunk is valid UTF-8 on its own.
        const FRAME: &[u8] = b"{\"message\":{\"content\":\"\xc3\xa9\"}}\n";
        let split = FRAME.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let frames = process_ndjson(byte_stream(vec![&FRAME[..split], &FRAME[split..]]));

        let (fragments, errors) = collect_fragments(frames).await;
        assert_eq!(fragments, vec!["é".to_string()]);
        assert_eq!(errors, 0);
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_abort() {
        let data = b"{\"done\":false}\n\xff\xfe\n{\"message\":{\"content\":\"ok\"}}\n";
        let frames = process_ndjson(byte_stream(vec![&data[..]]));

        let (fragments, errors) = collect_fragments(frames).await;
        assert_eq!(fragments, vec!["ok".to_string()]);
        assert_eq!(errors, 1);
    }

    #[tokio::test]
    async fn trailing_line_without_newline() {
        let data = b"{\"message\":{\"content\":\"first\"}}\n{\"message\":{\"content\":\"last\"}}";
        let frames = process_ndjson(byte_stream(vec![&data[..]]));

        let (fragments, errors) = collect_fragments(frames).await;
        assert_eq!(fragments, vec!["first".to_string(), "last".to_string()]);
        assert_eq!(errors, 0);
    }

    #[tokio::test]
    async fn frames_without_content_skipped() {
        let data = b"{\"message\":{\"role\":\"assistant\"}}\n{\"done\":true}\n";
        let frames = process_ndjson(byte_stream(vec![&data[..]]));

        let (fragments, errors) = collect_fragments(frames).await;
        assert!(fragments.is_empty());
        assert_eq!(errors, 0);
    }
}
