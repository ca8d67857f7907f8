//! In-memory log capture for tests
//!
//! Captured events are decoded into their canonical fields, so a test can pull
//! everything one update cycle logged by its `cycle_id` instead of matching
//! raw strings.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock};

use nightlist_core_types::schema::{
    FIELD_COMPONENT, FIELD_CYCLE_ID, FIELD_EVENT, FIELD_OP, FIELD_OUTCOME, FIELD_SUBMISSION,
};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// One captured log event
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub component: Option<String>,
    pub op: Option<String>,
    pub event: Option<String>,
    /// Update cycle the event belongs to, if it was logged inside one
    pub cycle_id: Option<String>,
    pub submission: Option<u64>,
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Check if this is the `event` phase of operation `op`
    pub fn is(&self, op: &str, event: &str) -> bool {
        self.op.as_deref() == Some(op) && self.event.as_deref() == Some(event)
    }

    fn decode(level: Level, fields: BTreeMap<String, String>) -> Self {
        Self {
            level,
            component: fields.get(FIELD_COMPONENT).cloned(),
            op: fields.get(FIELD_OP).cloned(),
            event: fields.get(FIELD_EVENT).cloned(),
            cycle_id: fields.get(FIELD_CYCLE_ID).cloned(),
            submission: fields.get(FIELD_SUBMISSION).and_then(|s| s.parse().ok()),
            fields,
        }
    }
}

/// Everything logged for one update cycle, in emission order
#[derive(Clone, Debug)]
pub struct CycleLog {
    cycle_id: String,
    events: Vec<CapturedEvent>,
}

impl CycleLog {
    pub fn cycle_id(&self) -> &str {
        &self.cycle_id
    }

    pub fn events(&self) -> &[CapturedEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Submission the cycle was started for
    pub fn submission(&self) -> Option<u64> {
        self.events.iter().find_map(|e| e.submission)
    }

    /// First event of the given phase (`start`, `end`, `end_error`)
    pub fn phase(&self, event: &str) -> Option<&CapturedEvent> {
        self.events
            .iter()
            .find(|e| e.event.as_deref() == Some(event))
    }

    /// How the cycle ended, as logged on its end event
    pub fn outcome(&self) -> Option<&str> {
        self.events.iter().rev().find_map(|e| e.field(FIELD_OUTCOME))
    }

    /// Events logged at error level
    pub fn errors(&self) -> impl Iterator<Item = &CapturedEvent> {
        self.events.iter().filter(|e| e.level == Level::ERROR)
    }
}

#[derive(Default)]
struct FieldVisitor(BTreeMap<String, String>);

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }
}

type Sink = Arc<Mutex<Vec<CapturedEvent>>>;

/// Layer that records every event into a shared sink
pub struct TestCaptureLayer {
    sink: Sink,
}

impl TestCaptureLayer {
    pub fn new() -> (Self, TestCapture) {
        let sink = Sink::default();
        (
            Self {
                sink: Arc::clone(&sink),
            },
            TestCapture { sink },
        )
    }
}

impl<S: Subscriber> Layer<S> for TestCaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let captured = CapturedEvent::decode(*event.metadata().level(), visitor.0);
        if let Ok(mut events) = self.sink.lock() {
            events.push(captured);
        }
    }
}

/// Handle onto the captured events
#[derive(Clone)]
pub struct TestCapture {
    sink: Sink,
}

impl TestCapture {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.sink.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events logged under one `cycle_id`
    pub fn cycle(&self, cycle_id: &str) -> CycleLog {
        let events = self
            .events()
            .into_iter()
            .filter(|e| e.cycle_id.as_deref() == Some(cycle_id))
            .collect();
        CycleLog {
            cycle_id: cycle_id.to_string(),
            events,
        }
    }

    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().iter().filter(|e| predicate(e)).count()
    }

    /// # Panics
    ///
    /// Panics if no `event` phase of `op` was captured.
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let events = self.events();
        assert!(
            events.iter().any(|e| e.is(op, event)),
            "Expected event op={} event={} not found in {} captured events",
            op,
            event,
            events.len()
        );
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture layer as the global subscriber, once per process
///
/// Tests running in parallel share the capture, so assertions should select
/// their own events, by `cycle_id` or by a unique op name.
///
/// ```
/// use nightlist_core::logging_facility::test_capture::init_test_capture;
/// use nightlist_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("wrap_snapshot", cycle_id = "c-1", submission = 3u64);
/// assert_eq!(capture.cycle("c-1").submission(), Some(3));
/// ```
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let (layer, capture) = TestCaptureLayer::new();
            tracing_subscriber::registry().with(layer).init();
            capture
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(level: Level, pairs: &[(&str, &str)]) -> CapturedEvent {
        let fields = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CapturedEvent::decode(level, fields)
    }

    #[test]
    fn test_decode_reads_cycle_fields() {
        let e = event(
            Level::INFO,
            &[("op", "update_cycle"), ("event", "start"), ("cycle_id", "c-9"), ("submission", "4")],
        );
        assert!(e.is("update_cycle", "start"));
        assert_eq!(e.cycle_id.as_deref(), Some("c-9"));
        assert_eq!(e.submission, Some(4));
    }

    #[test]
    fn test_cycle_log_phases_and_outcome() {
        let log = CycleLog {
            cycle_id: "c-1".to_string(),
            events: vec![
                event(Level::INFO, &[("event", "start"), ("submission", "2")]),
                event(Level::ERROR, &[("reported", "9")]),
                event(Level::INFO, &[("event", "end"), ("outcome", "applied")]),
            ],
        };

        assert_eq!(log.submission(), Some(2));
        assert!(log.phase("start").is_some());
        assert!(log.phase("end_error").is_none());
        assert_eq!(log.outcome(), Some("applied"));
        assert_eq!(log.errors().count(), 1);
    }
}
