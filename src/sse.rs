//! Server-Sent Events (SSE) processing for streamed chat replies.
//!
//! `POST /chat/stream` answers with blocks of the form
//! `data: {"token": "..."}` separated by blank lines, and ends the reply by
//! closing the connection. This module turns the raw byte stream into a
//! stream of answer fragments.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::observability::{STREAM_BYTES, STREAM_ERRORS, STREAM_TOKENS};
use crate::{Error, Result, StreamToken};

/// End-of-stream marker some servers send before closing.
const DONE_MARKER: &str = "[DONE]";

/// Outcome of parsing one event block.
#[derive(Debug, PartialEq)]
enum SseEvent {
    Token(String),
    Done,
    Skip,
}

/// Process a stream of bytes into a stream of answer tokens.
///
/// Blocks without a `data:` line (comments, keep-alives) are skipped. The
/// stream ends at `data: [DONE]` or when the connection closes.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + Send + 'static,
{
    // Convert reqwest errors to our error type
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    stream::unfold(
        (stream, String::new(), Vec::new(), false),
        move |(mut stream, mut buffer, mut pending, done)| async move {
            if done {
                return None;
            }
            loop {
                // First check if we have a complete event in the buffer
                if let Some((event, remaining)) = extract_event(&buffer) {
                    buffer = remaining;
                    match event {
                        Ok(SseEvent::Token(token)) => {
                            STREAM_TOKENS.click();
                            return Some((Ok(token), (stream, buffer, pending, false)));
                        }
                        Ok(SseEvent::Done) => return None,
                        Ok(SseEvent::Skip) => continue,
                        Err(e) => {
                            STREAM_ERRORS.click();
                            return Some((Err(e), (stream, buffer, pending, true)));
                        }
                    }
                }

                // Read more data
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        pending.extend_from_slice(&bytes);
                        if let Err(e) = decode_pending(&mut pending, &mut buffer) {
                            STREAM_ERRORS.click();
                            return Some((Err(e), (stream, buffer, pending, true)));
                        }
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (stream, buffer, pending, true)));
                    }
                    None => {
                        if !pending.is_empty() {
                            STREAM_ERRORS.click();
                            return Some((
                                Err(Error::encoding("Stream ended inside a UTF-8 sequence", None)),
                                (stream, buffer, pending, true),
                            ));
                        }
                        // End of stream; a final block may lack its blank line.
                        if buffer.trim().is_empty() {
                            return None;
                        }
                        let tail = format!("{buffer}\n\n");
                        return match extract_event(&tail) {
                            Some((Ok(SseEvent::Token(token)), _)) => {
                                STREAM_TOKENS.click();
                                Some((Ok(token), (stream, String::new(), pending, true)))
                            }
                            Some((Err(e), _)) => {
                                STREAM_ERRORS.click();
                                Some((Err(e), (stream, String::new(), pending, true)))
                            }
                            _ => None,
                        };
                    }
                }
            }
        },
    )
}

/// Moves the decodable prefix of `pending` into `buffer`.
///
/// A multi-byte character split across chunks stays in `pending` until the
/// rest of it arrives. Line endings are normalised on the joined buffer, so
/// a `\r\n` split across chunks is still recognised.
fn decode_pending(pending: &mut Vec<u8>, buffer: &mut String) -> Result<()> {
    let valid = match std::str::from_utf8(pending) {
        Ok(text) => {
            buffer.push_str(text);
            pending.len()
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            buffer.push_str(std::str::from_utf8(&pending[..valid])?);
            valid
        }
        Err(e) => {
            return Err(Error::encoding(
                format!("Invalid UTF-8 in stream: {e}"),
                Some(Box::new(e)),
            ));
        }
    };
    pending.drain(..valid);
    if buffer.contains("\r\n") {
        *buffer = buffer.replace("\r\n", "\n");
    }
    Ok(())
}

/// Extract a complete SSE event from a buffer string.
///
/// Events are delimited by a blank line. Multiple `data:` lines in one block
/// are joined with newlines before decoding.
fn extract_event(buffer: &str) -> Option<(Result<SseEvent>, String)> {
    let (event_text, rest) = buffer.split_once("\n\n")?;
    let rest = rest.to_string();

    let data: Vec<&str> = event_text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();
    if data.is_empty() {
        return Some((Ok(SseEvent::Skip), rest));
    }
    let data = data.join("\n");
    if data.trim() == DONE_MARKER {
        return Some((Ok(SseEvent::Done), rest));
    }

    match serde_json::from_str::<StreamToken>(&data) {
        Ok(StreamToken { token }) => Some((Ok(SseEvent::Token(token)), rest)),
        Err(e) => Some((
            Err(Error::serialization(
                format!("Failed to parse stream token '{data}': {e}"),
                Some(Box::new(e)),
            )),
            rest,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    async fn collect(chunks: &[&'static [u8]]) -> Vec<Result<String>> {
        let chunks: Vec<_> = chunks
            .iter()
            .map(|chunk| Ok(Bytes::from_static(*chunk)))
            .collect();
        let stream = Box::pin(stream::iter(chunks));
        process_sse(stream).collect().await
    }

    #[tokio::test]
    async fn parse_single_token() {
        let events = collect(&[b"data: {\"token\": \"Hel\"}\n\n"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap(), "Hel");
    }

    #[tokio::test]
    async fn parse_multiple_tokens() {
        let events =
            collect(&[b"data: {\"token\": \"Hel\"}\n\ndata: {\"token\": \"lo\"}\n\n"]).await;
        let tokens: Vec<_> = events.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(tokens, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn handle_split_event() {
        // Simulate an event split across multiple chunks
        let events = collect(&[b"data: {\"tok", b"en\": \"Hi\"}\n", b"\n"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap(), "Hi");
    }

    #[tokio::test]
    async fn handle_crlf_delimiters() {
        let events = collect(&[
            b"data: {\"token\": \"a\"}\r\n\r\ndata: {\"token\": \"b\"}\r\n\r\n",
        ])
        .await;
        let tokens: Vec<_> = events.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(tokens, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn handle_crlf_split_across_chunks() {
        let events = collect(&[
            b"data: {\"token\": \"Hel\"}\r\n\r",
            b"\ndata: {\"token\": \"lo\"}\r\n\r\n",
        ])
        .await;
        let tokens: Vec<_> = events.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(tokens, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn handle_crlf_split_inside_line_ending() {
        let events = collect(&[
            b"data: {\"token\": \"a\"}\r",
            b"\n\r",
            b"\n",
        ])
        .await;
        let tokens: Vec<_> = events.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(tokens, vec!["a"]);
    }

    #[tokio::test]
    async fn skips_comments_and_stops_at_done() {
        let events = collect(&[
            b": keep-alive\n\ndata: {\"token\": \"x\"}\n\n",
            b"data: [DONE]\n\ndata: {\"token\": \"y\"}\n\n",
        ])
        .await;
        let tokens: Vec<_> = events.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(tokens, vec!["x"]);
    }

    #[tokio::test]
    async fn trailing_block_without_blank_line() {
        let events = collect(&[b"data: {\"token\": \"end\"}"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap(), "end");
    }

    #[tokio::test]
    async fn handle_split_multibyte_character() {
        let events = collect(&[b"data: {\"token\": \"\xc3", b"\xa9\"}\n\n"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap(), "\u{e9}");
    }

    #[tokio::test]
    async fn handle_malformed_event() {
        let events = collect(&[b"data: not json\n\ndata: {\"token\": \"late\"}\n\n"]).await;
        assert_eq!(events.len(), 1);
        assert!(events[0].is_err());
    }

    #[tokio::test]
    async fn handle_invalid_utf8() {
        let events = collect(&[b"data: \xff\xfe\n\n"]).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(Error::Encoding { .. })));
    }
}
