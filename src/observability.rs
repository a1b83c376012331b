use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("vera.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("vera.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("vera.client.request_duration_seconds");

pub(crate) static STREAM_TOKENS: Counter = Counter::new("vera.stream.tokens");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("vera.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("vera.stream.bytes");

pub(crate) static SESSION_SENDS: Counter = Counter::new("vera.session.sends");
pub(crate) static SESSION_SENDS_REJECTED: Counter = Counter::new("vera.session.sends_rejected");
pub(crate) static SESSION_SEND_FAILURES: Counter = Counter::new("vera.session.send_failures");
pub(crate) static SESSION_UPLOADS: Counter = Counter::new("vera.session.uploads");
pub(crate) static SESSION_UPLOAD_FAILURES: Counter = Counter::new("vera.session.upload_failures");
pub(crate) static SESSION_CANCELLATIONS: Counter = Counter::new("vera.session.cancellations");
pub(crate) static SESSION_TURN_DURATION: Moments =
    Moments::new("vera.session.turn_duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_TOKENS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);

    collector.register_counter(&SESSION_SENDS);
    collector.register_counter(&SESSION_SENDS_REJECTED);
    collector.register_counter(&SESSION_SEND_FAILURES);
    collector.register_counter(&SESSION_UPLOADS);
    collector.register_counter(&SESSION_UPLOAD_FAILURES);
    collector.register_counter(&SESSION_CANCELLATIONS);
    collector.register_moments(&SESSION_TURN_DURATION);
}
