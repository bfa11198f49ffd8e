//! Span export pipeline.
//!
//! # Data Flow
//! ```text
//! tracing span closes
//!     → SpanExportLayer (sampling, attributes, span events)
//!     → unbounded channel
//!     → batch task (flush on size or interval)
//!     → SpanExporter::export
//! ```
//!
//! # Design Decisions
//! - Sampling is decided once per trace at the root span; children inherit it
//! - Export runs on its own task so closing a span never blocks on I/O
//! - Resource attributes (`service.name`, `library.language`) ride on every span

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::config::TelemetryConfig;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("exporter is shut down")]
    ShutDown,
    #[error("export failed: {0}")]
    Failed(String),
}

/// Attributes describing the process that produced the spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub attributes: BTreeMap<&'static str, String>,
}

impl Resource {
    pub fn from_config(config: &TelemetryConfig) -> Self {
        let attributes = BTreeMap::from([
            ("service.name", config.service_name.clone()),
            ("library.language", config.library_language.clone()),
        ]);
        Self { attributes }
    }
}

/// An event recorded while its span was current.
#[derive(Debug, Clone)]
pub struct SpanEvent {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub timestamp: SystemTime,
}

/// A finished span, ready for export.
#[derive(Debug, Clone)]
pub struct SpanRecord {
    pub trace_id: u64,
    pub span_id: u64,
    pub parent_id: Option<u64>,
    pub name: &'static str,
    pub target: &'static str,
    pub attributes: BTreeMap<String, String>,
    pub events: Vec<SpanEvent>,
    pub start: SystemTime,
    pub end: SystemTime,
    pub resource: Arc<Resource>,
}

impl SpanRecord {
    pub fn duration(&self) -> Duration {
        self.end.duration_since(self.start).unwrap_or_default()
    }
}

/// Destination for finished spans.
pub trait SpanExporter: Send + Sync {
    fn export(&self, batch: &[SpanRecord]) -> Result<(), ExportError>;

    fn shutdown(&self);
}

/// Writes every exported span to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogExporter;

impl SpanExporter for LogExporter {
    fn export(&self, batch: &[SpanRecord]) -> Result<(), ExportError> {
        for span in batch {
            tracing::info!(
                trace_id = %format_args!("{:016x}", span.trace_id),
                span_id = %format_args!("{:016x}", span.span_id),
                name = span.name,
                duration_us = span.duration().as_micros() as u64,
                attributes = ?span.attributes,
                events = span.events.len(),
                resource = ?span.resource.attributes,
                "Exported span"
            );
        }
        Ok(())
    }

    fn shutdown(&self) {
        tracing::info!("Log exporter shutting down");
    }
}

/// Keeps exported spans in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryExporter {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
    shut_down: Arc<AtomicBool>,
}

impl InMemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> Vec<SpanRecord> {
        self.spans.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl SpanExporter for InMemoryExporter {
    fn export(&self, batch: &[SpanRecord]) -> Result<(), ExportError> {
        if self.is_shut_down() {
            return Err(ExportError::ShutDown);
        }
        let mut spans = self
            .spans
            .lock()
            .map_err(|e| ExportError::Failed(e.to_string()))?;
        spans.extend_from_slice(batch);
        Ok(())
    }

    fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
    }
}

/// Per-trace sampling decision.
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    ratio: f64,
}

impl Sampler {
    pub fn new(ratio: f64) -> Self {
        Self {
            ratio: ratio.clamp(0.0, 1.0),
        }
    }

    pub fn should_sample(&self) -> bool {
        if self.ratio >= 1.0 {
            true
        } else if self.ratio <= 0.0 {
            false
        } else {
            fastrand::f64() < self.ratio
        }
    }
}

/// Span state kept in the registry's extensions while the span is open.
struct SpanData {
    trace_id: u64,
    span_id: u64,
    parent_id: Option<u64>,
    sampled: bool,
    attributes: BTreeMap<String, String>,
    events: Vec<SpanEvent>,
    start: SystemTime,
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: BTreeMap<String, String>,
}

impl FieldVisitor {
    fn into_fields(self) -> BTreeMap<String, String> {
        self.fields
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let value = format!("{value:?}");
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), value.to_string());
    }
}

/// `tracing_subscriber` layer that captures finished spans for export.
pub struct SpanExportLayer {
    sampler: Sampler,
    resource: Arc<Resource>,
    tx: mpsc::UnboundedSender<SpanRecord>,
}

impl<S> Layer<S> for SpanExportLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let inherited = span.parent().and_then(|parent| {
            let extensions = parent.extensions();
            extensions
                .get::<SpanData>()
                .map(|data| (data.trace_id, data.span_id, data.sampled))
        });
        let (trace_id, parent_id, sampled) = match inherited {
            Some((trace_id, parent_id, sampled)) => (trace_id, Some(parent_id), sampled),
            None => (fastrand::u64(1..), None, self.sampler.should_sample()),
        };

        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);

        span.extensions_mut().insert(SpanData {
            trace_id,
            span_id: fastrand::u64(1..),
            parent_id,
            sampled,
            attributes: visitor.into_fields(),
            events: Vec::new(),
            start: SystemTime::now(),
        });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(data) = extensions.get_mut::<SpanData>() {
            let mut visitor = FieldVisitor::default();
            values.record(&mut visitor);
            data.attributes.extend(visitor.into_fields());
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.event_span(event) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        let Some(data) = extensions.get_mut::<SpanData>() else {
            return;
        };
        if !data.sampled {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        data.events.push(SpanEvent {
            name: visitor
                .message
                .take()
                .unwrap_or_else(|| event.metadata().name().to_string()),
            attributes: visitor.into_fields(),
            timestamp: SystemTime::now(),
        });
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            return;
        };
        let Some(data) = span.extensions_mut().remove::<SpanData>() else {
            return;
        };
        if !data.sampled {
            return;
        }

        let metadata = span.metadata();
        let record = SpanRecord {
            trace_id: data.trace_id,
            span_id: data.span_id,
            parent_id: data.parent_id,
            name: metadata.name(),
            target: metadata.target(),
            attributes: data.attributes,
            events: data.events,
            start: data.start,
            end: SystemTime::now(),
            resource: self.resource.clone(),
        };
        // The batch task is gone only after shutdown; late spans are dropped.
        let _ = self.tx.send(record);
    }
}

/// Handle to the running batch task.
pub struct TelemetryGuard {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TelemetryGuard {
    /// Flush pending spans and shut the exporter down.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Span batch task failed");
        }
    }
}

/// Build the export layer and spawn its batch task.
///
/// Must be called from within a Tokio runtime.
pub fn pipeline(
    config: &TelemetryConfig,
    exporter: Arc<dyn SpanExporter>,
) -> (SpanExportLayer, TelemetryGuard) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = oneshot::channel();

    let layer = SpanExportLayer {
        sampler: Sampler::new(config.sampling_ratio),
        resource: Arc::new(Resource::from_config(config)),
        tx,
    };

    let batcher = Batcher {
        exporter,
        max_batch_size: config.max_batch_size.max(1),
        interval: Duration::from_millis(config.export_interval_ms.max(1)),
    };
    let task = tokio::spawn(batcher.run(rx, stop_rx));

    (
        layer,
        TelemetryGuard {
            stop: Some(stop_tx),
            task,
        },
    )
}

struct Batcher {
    exporter: Arc<dyn SpanExporter>,
    max_batch_size: usize,
    interval: Duration,
}

impl Batcher {
    async fn run(
        self,
        mut rx: mpsc::UnboundedReceiver<SpanRecord>,
        mut stop: oneshot::Receiver<()>,
    ) {
        let mut batch = Vec::with_capacity(self.max_batch_size);
        let mut ticker = time::interval(self.interval);

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(record) => {
                        batch.push(record);
                        if batch.len() >= self.max_batch_size {
                            self.flush(&mut batch);
                        }
                    }
                    None => break,
                },
                _ = ticker.tick() => self.flush(&mut batch),
                _ = &mut stop => {
                    while let Ok(record) = rx.try_recv() {
                        batch.push(record);
                    }
                    break;
                }
            }
        }

        self.flush(&mut batch);
        self.exporter.shutdown();
    }

    fn flush(&self, batch: &mut Vec<SpanRecord>) {
        if batch.is_empty() {
            return;
        }
        match self.exporter.export(batch) {
            Ok(()) => metrics::record_spans_exported(batch.len()),
            Err(e) => tracing::warn!(error = %e, dropped = batch.len(), "Span export failed"),
        }
        batch.clear();
    }
}
