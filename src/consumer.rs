//! The stream consumer: one turn of chat, folded into message state.
//!
//! A [`StreamConsumer`] owns the ordered message list for whichever session is
//! currently bound, plus the per-request stream state (`is_loading`,
//! `active_tool`). One turn at a time: a send while a turn is in flight is a
//! no-op. Decoded frames are applied strictly in arrival order, each mutating
//! the assistant message captured at turn start or the stream state.

use futures::{Stream, StreamExt};

use crate::client::BackendClient;
use crate::observability::{
    CONSUMER_TOOL_SPANS, CONSUMER_TURN_ERRORS, CONSUMER_TURNS, STREAM_FRAME_ERRORS, STREAM_FRAMES,
};
use crate::render::Renderer;
use crate::sse::StreamFrame;
use crate::types::{ChatEvent, ChatMessage};

/// Whether the read loop keeps going after a frame is applied.
enum FrameOutcome {
    Continue,
    Terminate,
}

/// Per-session message state and the stream machinery that mutates it.
pub struct StreamConsumer {
    messages: Vec<ChatMessage>,
    is_loading: bool,
    active_tool: Option<String>,
}

impl StreamConsumer {
    /// Creates a consumer with no messages and no turn in flight.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            is_loading: false,
            active_tool: None,
        }
    }

    /// The ordered message list for the bound session.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// True while a turn is in flight.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// The tool the backend is currently running, if any.
    pub fn active_tool(&self) -> Option<&str> {
        self.active_tool.as_deref()
    }

    /// Resets the message list and stream state. Used when the active
    /// session changes.
    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.is_loading = false;
        self.active_tool = None;
    }

    /// Takes the message list out of the consumer, resetting stream state.
    ///
    /// The controller uses this to snapshot the outgoing session on switch.
    pub fn take_messages(&mut self) -> Vec<ChatMessage> {
        self.is_loading = false;
        self.active_tool = None;
        std::mem::take(&mut self.messages)
    }

    /// Replaces the message list with a previously snapshotted one.
    pub fn restore_messages(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
        self.is_loading = false;
        self.active_tool = None;
    }

    /// Sends one user message and folds the streamed response into state.
    ///
    /// Returns false without side effects when `text` trims to empty or a
    /// turn is already in flight. Otherwise appends the user message and an
    /// assistant placeholder, opens the stream, and applies every decoded
    /// frame until the stream ends or a terminal condition is hit. All
    /// failures are surfaced into the placeholder message; there are no
    /// retries and the loading flag is always cleared by the time this
    /// returns.
    pub async fn send_message(
        &mut self,
        client: &BackendClient,
        session_id: &str,
        text: &str,
        renderer: &mut dyn Renderer,
    ) -> bool {
        let text = text.trim();
        if text.is_empty() || self.is_loading {
            return false;
        }

        CONSUMER_TURNS.click();
        let turn = self.begin_turn(text);

        match client.chat(session_id, text).await {
            Ok(frames) => self.consume_frames(frames, turn, renderer).await,
            Err(err) => {
                CONSUMER_TURN_ERRORS.click();
                self.fail_turn(turn, format!("Connection failed: {err}"), renderer);
            }
        }

        renderer.finish_turn();
        true
    }

    /// Appends the user message and the assistant placeholder, flips the
    /// loading flag, and returns the placeholder's index.
    ///
    /// The index, not "the last message", is the streaming target for the
    /// rest of the turn.
    fn begin_turn(&mut self, text: &str) -> usize {
        self.messages.push(ChatMessage::user(text));
        self.messages.push(ChatMessage::assistant_placeholder());
        self.is_loading = true;
        self.active_tool = None;
        self.messages.len() - 1
    }

    /// Applies frames in arrival order until the stream ends or terminates.
    async fn consume_frames<S>(&mut self, mut frames: S, turn: usize, renderer: &mut dyn Renderer)
    where
        S: Stream<Item = crate::Result<StreamFrame>> + Unpin,
    {
        while let Some(item) = frames.next().await {
            match item {
                Ok(frame) => {
                    STREAM_FRAMES.click();
                    if let FrameOutcome::Terminate = self.apply_frame(frame, turn, renderer) {
                        return;
                    }
                }
                Err(err) if err.is_frame_local() => {
                    // Malformed payloads are logged and skipped; the stream
                    // stays usable past them.
                    STREAM_FRAME_ERRORS.click();
                    renderer.print_info(&format!("Skipping malformed event: {err}"));
                }
                Err(err) => {
                    CONSUMER_TURN_ERRORS.click();
                    self.fail_turn(turn, format!("Connection failed: {err}"), renderer);
                    return;
                }
            }
        }

        // Normal stream end: clear unconditionally. Covers backends that
        // close the connection without an explicit terminal event.
        self.is_loading = false;
        self.active_tool = None;
    }

    /// Dispatches one frame against the streaming message or stream state.
    fn apply_frame(
        &mut self,
        frame: StreamFrame,
        turn: usize,
        renderer: &mut dyn Renderer,
    ) -> FrameOutcome {
        match frame {
            StreamFrame::Event(ChatEvent::Token { content }) => {
                if let Some(message) = self.messages.get_mut(turn) {
                    message.content.push_str(&content);
                }
                renderer.print_token(&content);
            }
            StreamFrame::Event(ChatEvent::Chart { src }) => {
                if let Some(message) = self.messages.get_mut(turn) {
                    message.charts.push(src.clone());
                }
                renderer.print_chart(&src);
            }
            StreamFrame::Event(ChatEvent::ToolStart { tool }) => {
                CONSUMER_TOOL_SPANS.click();
                self.active_tool = Some(tool.clone());
                renderer.start_tool(&tool);
            }
            StreamFrame::Event(ChatEvent::ToolEnd) => {
                self.active_tool = None;
                renderer.finish_tool();
            }
            StreamFrame::Event(ChatEvent::Status { content }) => {
                // Informational only; no state change.
                if let Some(status) = content {
                    renderer.print_status(&status);
                }
            }
            StreamFrame::Event(ChatEvent::Done) | StreamFrame::EndOfStream => {
                self.is_loading = false;
                self.active_tool = None;
            }
            StreamFrame::Event(ChatEvent::Error { content }) => {
                CONSUMER_TURN_ERRORS.click();
                self.fail_turn(turn, format!("Error: {content}"), renderer);
                // The stream may still be open; the turn is over.
                return FrameOutcome::Terminate;
            }
            StreamFrame::Event(ChatEvent::Unknown) => {}
        }
        FrameOutcome::Continue
    }

    /// Overwrites the streaming message with an error string and returns the
    /// consumer to idle.
    fn fail_turn(&mut self, turn: usize, message: String, renderer: &mut dyn Renderer) {
        renderer.print_error(&message);
        if let Some(slot) = self.messages.get_mut(turn) {
            slot.content = message;
        }
        self.is_loading = false;
        self.active_tool = None;
    }
}

impl Default for StreamConsumer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::types::MessageRole;
    use bytes::Bytes;
    use futures::stream;

    struct SilentRenderer;

    impl Renderer for SilentRenderer {
        fn print_token(&mut self, _text: &str) {}
        fn print_error(&mut self, _error: &str) {}
    }

    fn token(content: &str) -> crate::Result<StreamFrame> {
        Ok(StreamFrame::Event(ChatEvent::Token {
            content: content.to_string(),
        }))
    }

    async fn run_turn(consumer: &mut StreamConsumer, frames: Vec<crate::Result<StreamFrame>>) {
        let turn = consumer.begin_turn("question");
        let frames = Box::pin(stream::iter(frames));
        consumer
            .consume_frames(frames, turn, &mut SilentRenderer)
            .await;
    }

    #[tokio::test]
    async fn tokens_concatenate_and_done_clears_loading() {
        let mut consumer = StreamConsumer::new();
        run_turn(
            &mut consumer,
            vec![
                token("Hi"),
                token(" there"),
                Ok(StreamFrame::Event(ChatEvent::Done)),
            ],
        )
        .await;

        assert_eq!(consumer.messages().len(), 2);
        assert_eq!(consumer.messages()[0].role, MessageRole::User);
        assert_eq!(consumer.messages()[1].content, "Hi there");
        assert!(!consumer.is_loading());
        assert!(consumer.active_tool().is_none());
    }

    #[tokio::test]
    async fn charts_accumulate_alongside_tokens() {
        let src = "data:image/png;base64,AA==";
        let mut consumer = StreamConsumer::new();
        run_turn(
            &mut consumer,
            vec![
                token("Here"),
                token(" it is:"),
                Ok(StreamFrame::Event(ChatEvent::Chart {
                    src: src.to_string(),
                })),
            ],
        )
        .await;

        let assistant = &consumer.messages()[1];
        assert_eq!(assistant.content, "Here it is:");
        assert_eq!(assistant.charts, vec![src.to_string()]);
    }

    #[tokio::test]
    async fn sentinel_clears_state_and_later_frames_still_apply() {
        let mut consumer = StreamConsumer::new();
        run_turn(
            &mut consumer,
            vec![token("a"), Ok(StreamFrame::EndOfStream), token("b")],
        )
        .await;

        assert_eq!(consumer.messages()[1].content, "ab");
        assert!(!consumer.is_loading());
    }

    #[tokio::test]
    async fn tool_markers_track_one_active_tool() {
        let mut consumer = StreamConsumer::new();
        let turn = consumer.begin_turn("question");

        consumer.apply_frame(
            StreamFrame::Event(ChatEvent::ToolStart {
                tool: "get_stock_price".to_string(),
            }),
            turn,
            &mut SilentRenderer,
        );
        assert_eq!(consumer.active_tool(), Some("get_stock_price"));

        consumer.apply_frame(
            StreamFrame::Event(ChatEvent::ToolEnd),
            turn,
            &mut SilentRenderer,
        );
        assert!(consumer.active_tool().is_none());
        assert!(consumer.is_loading());
    }

    #[tokio::test]
    async fn error_event_overwrites_message_and_terminates_turn() {
        let mut consumer = StreamConsumer::new();
        run_turn(
            &mut consumer,
            vec![
                token("partial"),
                Ok(StreamFrame::Event(ChatEvent::Error {
                    content: "ticker not found".to_string(),
                })),
                token("ignored"),
            ],
        )
        .await;

        assert_eq!(consumer.messages()[1].content, "Error: ticker not found");
        assert!(!consumer.is_loading());
    }

    #[tokio::test]
    async fn malformed_frame_between_tokens_is_skipped() {
        let mut consumer = StreamConsumer::new();
        run_turn(
            &mut consumer,
            vec![
                token("a"),
                Err(Error::serialization("bad json", None)),
                token("b"),
            ],
        )
        .await;

        assert_eq!(consumer.messages()[1].content, "ab");
        assert!(!consumer.is_loading());
    }

    #[tokio::test]
    async fn transport_error_mid_stream_fails_the_turn() {
        let mut consumer = StreamConsumer::new();
        run_turn(
            &mut consumer,
            vec![token("a"), Err(Error::streaming("connection reset", None))],
        )
        .await;

        assert!(consumer.messages()[1].content.starts_with("Connection failed:"));
        assert!(!consumer.is_loading());
    }

    #[tokio::test]
    async fn stream_end_without_terminal_event_clears_loading() {
        let mut consumer = StreamConsumer::new();
        run_turn(&mut consumer, vec![token("only")]).await;
        assert_eq!(consumer.messages()[1].content, "only");
        assert!(!consumer.is_loading());
        assert!(consumer.active_tool().is_none());
    }

    #[tokio::test]
    async fn send_is_noop_while_loading_or_for_blank_text() {
        let client = BackendClient::new(Some("http://127.0.0.1:1".to_string())).unwrap();
        let mut consumer = StreamConsumer::new();

        assert!(!consumer.send_message(&client, "s", "   ", &mut SilentRenderer).await);
        assert!(consumer.messages().is_empty());

        consumer.is_loading = true;
        assert!(!consumer.send_message(&client, "s", "hello", &mut SilentRenderer).await);
        assert!(consumer.messages().is_empty());
    }

    #[tokio::test]
    async fn connection_failure_surfaces_in_placeholder() {
        // Nothing listens on port 1; connect fails fast.
        let client = BackendClient::new(Some("http://127.0.0.1:1".to_string())).unwrap();
        let mut consumer = StreamConsumer::new();

        let ran = consumer
            .send_message(&client, "s", "hello", &mut SilentRenderer)
            .await;
        assert!(ran);
        assert_eq!(consumer.messages().len(), 2);
        assert!(consumer.messages()[1].content.starts_with("Connection failed:"));
        assert!(!consumer.is_loading());
    }

    #[tokio::test]
    async fn clear_messages_resets_everything() {
        let mut consumer = StreamConsumer::new();
        run_turn(&mut consumer, vec![token("x")]).await;
        consumer.active_tool = Some("calc".to_string());

        consumer.clear_messages();
        assert!(consumer.messages().is_empty());
        assert!(!consumer.is_loading());
        assert!(consumer.active_tool().is_none());
    }

    #[tokio::test]
    async fn final_state_is_chunk_split_invariant() {
        let body: &[u8] = b"data: {\"type\": \"tool_start\", \"tool\": \"calc\"}\n\n\
                            data: {\"type\": \"token\", \"content\": \"2+2\"}\n\n\
                            data: {\"type\": \"tool_end\"}\n\n\
                            data: {\"type\": \"token\", \"content\": \" = 4\"}\n\n\
                            data: {\"type\": \"chart\", \"src\": \"https://example.com/c.png\"}\n\n\
                            data: {\"type\": \"done\"}\n\n";

        let mut expected: Option<Vec<ChatMessage>> = None;
        for split in 0..=body.len() {
            let (left, right) = body.split_at(split);
            let chunks = Box::pin(stream::iter(vec![
                Ok(Bytes::copy_from_slice(left)),
                Ok(Bytes::copy_from_slice(right)),
            ]));
            let frames = Box::pin(crate::sse::process_sse(chunks));

            let mut consumer = StreamConsumer::new();
            let turn = consumer.begin_turn("question");
            consumer
                .consume_frames(frames, turn, &mut SilentRenderer)
                .await;

            assert!(!consumer.is_loading());
            assert!(consumer.active_tool().is_none());
            match &expected {
                None => expected = Some(consumer.messages().to_vec()),
                Some(expected) => {
                    assert_eq!(expected.as_slice(), consumer.messages(), "split at {split}")
                }
            }
        }

        let expected = expected.unwrap();
        assert_eq!(expected[1].content, "2+2 = 4");
        assert_eq!(expected[1].charts, vec!["https://example.com/c.png"]);
    }
}
