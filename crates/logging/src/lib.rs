#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Bridges `tracing` events into the controller interface's log bridge.
//!
//! This crate exists so that ordinary `tracing::info!`/`tracing::warn!`
//! call sites throughout a node's codebase reach controller connections
//! subscribed to the corresponding `DEBUG`/`INFO`/`NOTICE`/`WARN`/`ERR`
//! events, without those call sites knowing anything about the control
//! protocol.

use core::logbridge::{self, LogMessage, Severity};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Translates a `tracing` event into [`Severity`].
///
/// `tracing::Level::TRACE` has no correspondent in this protocol's five
/// severities and collapses into [`Severity::Debug`].
#[must_use]
pub fn severity_for_level(level: &Level) -> Severity {
    match *level {
        Level::TRACE | Level::DEBUG => Severity::Debug,
        Level::INFO => Severity::Info,
        Level::WARN => Severity::Warn,
        Level::ERROR => Severity::Err,
    }
}

/// Collects the `message` field of a `tracing::Event` into a single string,
/// replacing embedded CR/LF with spaces per the wire contract for log event
/// lines.
#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}").replace(['\r', '\n'], " ");
        }
    }
}

/// Something that accepts a forwarded log message, implemented by the
/// connection hub to fan it out to subscribed controllers.
pub trait LogSink: Send + Sync {
    /// Delivers one already-suppression-checked message.
    fn deliver(&self, message: LogMessage);
}

/// A `tracing_subscriber::Layer` that forwards every event into a
/// [`LogSink`], skipping delivery entirely while
/// [`logbridge::is_suppressed`] (i.e. while a prior forwarding call for this
/// thread is still in progress).
pub struct BridgeLayer<S> {
    sink: S,
}

impl<S: LogSink> BridgeLayer<S> {
    /// Wraps `sink` as a layer.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

impl<S, Sub> Layer<Sub> for BridgeLayer<S>
where
    S: LogSink + 'static,
    Sub: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, Sub>) {
        let severity = severity_for_level(event.metadata().level());
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let message = LogMessage {
            severity,
            text: visitor.message,
        };
        let Some((message, _guard)) = logbridge::begin_forward(message) else {
            return;
        };
        self.sink.deliver(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::prelude::*;

    #[derive(Default, Clone)]
    struct RecordingSink(Arc<Mutex<Vec<LogMessage>>>);

    impl LogSink for RecordingSink {
        fn deliver(&self, message: LogMessage) {
            self.0.lock().unwrap().push(message);
        }
    }

    #[test]
    fn level_translation_matches_wire_severities() {
        assert_eq!(severity_for_level(&Level::DEBUG), Severity::Debug);
        assert_eq!(severity_for_level(&Level::INFO), Severity::Info);
        assert_eq!(severity_for_level(&Level::WARN), Severity::Warn);
        assert_eq!(severity_for_level(&Level::ERROR), Severity::Err);
    }

    #[test]
    fn emitted_event_reaches_the_sink() {
        let sink = RecordingSink::default();
        let layer = BridgeLayer::new(sink.clone());
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("disk nearly full");
        });
        let recorded = sink.0.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].severity, Severity::Warn);
        assert!(recorded[0].text.contains("disk nearly full"));
    }

    #[test]
    fn suppressed_region_drops_the_event() {
        let sink = RecordingSink::default();
        let layer = BridgeLayer::new(sink.clone());
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            let _guard = logbridge::SuppressionGuard::enter();
            tracing::error!("recursive failure while forwarding a log line");
        });
        assert!(sink.0.lock().unwrap().is_empty());
    }
}
