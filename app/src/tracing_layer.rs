// In app/src/tracing_layer.rs

use chrono::Utc;
use events::{WsLogMessage, WsMessage};
use std::fmt::Write as _;
use tokio::sync::broadcast;
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use web_server::WsCache;

/// Forwards log events to `/ws` subscribers and the replay cache.
pub struct WsBroadcastLayer {
    tx: broadcast::Sender<WsMessage>,
    cache: WsCache,
}

impl WsBroadcastLayer {
    pub fn new(tx: broadcast::Sender<WsMessage>, cache: WsCache) -> Self {
        Self { tx, cache }
    }
}

impl<S> Layer<S> for WsBroadcastLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = LogMessageVisitor::default();
        event.record(&mut visitor);

        let msg = WsMessage::Log(WsLogMessage {
            timestamp: Utc::now(),
            level: event.metadata().level().to_string(),
            message: visitor.finish(),
        });
        // Send to live clients; no subscribers is fine.
        let _ = self.tx.send(msg.clone());
        web_server::cache_message(&self.cache, msg);
    }
}

/// Renders an event as `message key=value key=value`.
#[derive(Default)]
struct LogMessageVisitor {
    message: String,
    fields: String,
}

impl LogMessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl tracing::field::Visit for LogMessageVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}
