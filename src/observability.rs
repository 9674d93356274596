use biometrics::{Collector, Counter};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("finchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("finchat.client.request_errors");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("finchat.stream.chunks");
pub(crate) static STREAM_FRAMES: Counter = Counter::new("finchat.stream.frames");
pub(crate) static STREAM_FRAME_ERRORS: Counter = Counter::new("finchat.stream.frame_errors");

pub(crate) static CONSUMER_TURNS: Counter = Counter::new("finchat.consumer.turns");
pub(crate) static CONSUMER_TURN_ERRORS: Counter = Counter::new("finchat.consumer.turn_errors");
pub(crate) static CONSUMER_TOOL_SPANS: Counter = Counter::new("finchat.consumer.tool_spans");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_FRAMES);
    collector.register_counter(&STREAM_FRAME_ERRORS);

    collector.register_counter(&CONSUMER_TURNS);
    collector.register_counter(&CONSUMER_TURN_ERRORS);
    collector.register_counter(&CONSUMER_TOOL_SPANS);
}
