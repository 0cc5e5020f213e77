#![forbid(unsafe_code)]

//! Tracing instrumentation tests.
//!
//! Each aggregation pass opens its own span; finalize opens one on the
//! owning thread; panel validation emits `trace!` events. Spans are captured
//! on the test thread, so the passes are driven directly rather than through
//! a worker.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use inspect_core::{ControlTree, Selection};
use inspect_harness::{CountingInterpreters, MockObject, PanelLog, RecordingContainer};
use inspect_runtime::{
    AggregateOptions, AggregationMode, GenerationCounter, ManagerConfig, PropertiesManager,
    aggregate, build_panels, interpret_groups,
};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    message: String,
    fields: HashMap<String, String>,
}

#[derive(Default)]
struct Captured {
    spans: Mutex<Vec<CapturedSpan>>,
    events: Mutex<Vec<CapturedEvent>>,
}

struct Capture(Arc<Captured>);

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        self.0.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.remove("message").unwrap_or_default();
        self.0
            .events
            .lock()
            .unwrap()
            .push(CapturedEvent { message, fields });
    }
}

fn with_capture<F: FnOnce()>(f: F) -> Arc<Captured> {
    let captured = Arc::new(Captured::default());
    let subscriber = tracing_subscriber::registry().with(Capture(Arc::clone(&captured)));
    tracing::subscriber::with_default(subscriber, f);
    captured
}

fn span_names(captured: &Captured) -> Vec<String> {
    captured
        .spans
        .lock()
        .unwrap()
        .iter()
        .map(|s| s.name.clone())
        .collect()
}

fn selection() -> Selection {
    Selection::new([
        MockObject::new("A")
            .properties(["x", "y"])
            .symbols(["EntityData"])
            .accepts(["P1", "P2"])
            .into_ref(),
        MockObject::new("B")
            .properties(["y"])
            .symbols(["EntityData"])
            .accepts(["P2"])
            .into_ref(),
    ])
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn every_pass_opens_its_span() {
    let captured = with_capture(|| {
        let registry = PanelLog::new().registry(&["P1", "P2"]);
        let counter = GenerationCounter::new();
        let token = counter.token();
        let aggregation = aggregate(
            &selection(),
            &registry,
            &AggregateOptions::new(AggregationMode::Intersection),
            &token,
        )
        .unwrap();
        let mut tree = ControlTree::new();
        build_panels(&aggregation, &registry, &mut tree, &token).unwrap();
        interpret_groups(&aggregation, &CountingInterpreters::new(), &mut tree, &token).unwrap();
    });

    assert_eq!(
        span_names(&captured),
        vec![
            "selection_processing",
            "panel_materialization",
            "reflect_interpret",
            "symbol_interpret",
        ]
    );

    let spans = captured.spans.lock().unwrap();
    assert_eq!(spans[0].fields.get("objects").map(String::as_str), Some("2"));
    assert_eq!(spans[0].fields.get("generation").map(String::as_str), Some("g0"));
    assert_eq!(spans[1].fields.get("panels").map(String::as_str), Some("1"));
    assert_eq!(spans[2].fields.get("groups").map(String::as_str), Some("1"));
    assert_eq!(spans[3].fields.get("groups").map(String::as_str), Some("1"));
}

#[test]
fn panel_decisions_are_traced() {
    let captured = with_capture(|| {
        let registry = PanelLog::new().registry(&["P1", "P2"]);
        let counter = GenerationCounter::new();
        aggregate(
            &selection(),
            &registry,
            &AggregateOptions::new(AggregationMode::Intersection),
            &counter.token(),
        )
        .unwrap();
    });

    let decisions: Vec<(String, String, String)> = captured
        .events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.message == "panel validation")
        .map(|e| {
            (
                e.fields["object"].clone(),
                e.fields["panel"].clone(),
                e.fields["accepted"].clone(),
            )
        })
        .collect();

    let expected: Vec<(String, String, String)> = [
        ("A", "P1", "true"),
        ("A", "P2", "true"),
        ("B", "P1", "false"),
        ("B", "P2", "true"),
    ]
    .iter()
    .map(|(o, p, a)| ((*o).to_owned(), (*p).to_owned(), (*a).to_owned()))
    .collect();
    assert_eq!(decisions, expected);
}

#[test]
fn finalize_span_on_owning_thread() {
    let captured = with_capture(|| {
        let mut manager = PropertiesManager::new(
            RecordingContainer::new(),
            PanelLog::new().registry(&["P1", "P2"]),
            Arc::new(CountingInterpreters::new()),
            ManagerConfig::default(),
        );
        manager.set_selection(selection());
        assert!(manager.wait_for_current(Duration::from_secs(5)));
    });

    let names = span_names(&captured);
    assert_eq!(names, vec!["finalize"]);

    let events = captured.events.lock().unwrap();
    assert!(events.iter().any(|e| e.message == "selection changed"));
    assert!(events.iter().any(|e| e.message == "worker spawned"));
    assert!(events.iter().any(|e| e.message == "result applied"));
}
