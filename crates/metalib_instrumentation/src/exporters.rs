//! Concrete metric exporter implementations.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::mpsc::Sender;

use serde_json::to_string;

use crate::recorder::{EnrichedMetricEvent, MetricExporter};

/// Append metrics as JSON lines to a file.
pub struct JsonlExporter {
    writer: Mutex<BufWriter<File>>,
}

impl JsonlExporter {
    pub fn new<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl MetricExporter for JsonlExporter {
    fn export(&self, event: &EnrichedMetricEvent) {
        let Ok(serialised) = to_string(event) else {
            return;
        };
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        // Flush per line so short-lived tools still leave a complete file behind.
        if let Err(error) = writeln!(writer, "{serialised}").and_then(|()| writer.flush()) {
            tracing::error!(target: "instrument", ?error, "failed to write metric to jsonl");
        }
    }
}

/// Print metrics to stdout.
#[derive(Default)]
pub struct ConsoleExporter;

impl ConsoleExporter {
    pub fn new() -> Self {
        Self
    }
}

impl MetricExporter for ConsoleExporter {
    fn export(&self, event: &EnrichedMetricEvent) {
        if let Ok(serialised) = to_string(event) {
            println!("METRIC: {serialised}");
        }
    }
}

/// Forward metrics through an in-process channel.
pub struct ChannelExporter {
    sender: Sender<EnrichedMetricEvent>,
}

impl ChannelExporter {
    pub fn new(sender: Sender<EnrichedMetricEvent>) -> Self {
        Self { sender }
    }
}

impl MetricExporter for ChannelExporter {
    fn export(&self, event: &EnrichedMetricEvent) {
        let _ = self.sender.send(event.clone());
    }
}
