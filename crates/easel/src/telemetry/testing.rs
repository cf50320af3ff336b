// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory sink for formatted `query.event` records.

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;

use super::attributes::QUERY_EVENT_NAME;

/// Collects everything a test subscriber formats, one shared buffer per capture.
///
/// Install [`subscriber`](Self::subscriber) with `tracing::subscriber::set_default` and
/// inspect the text afterwards.
#[derive(Clone, Debug, Default)]
pub(crate) struct LogCapture {
    text: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber(&self) -> impl tracing::Subscriber {
        let layer = tracing_subscriber::fmt::layer().with_ansi(false).with_writer(self.clone());
        tracing_subscriber::registry().with(layer)
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.text.lock()).into_owned()
    }

    /// Formatted `query.event` records, in emission order.
    pub fn events(&self) -> Vec<String> {
        self.output()
            .lines()
            .filter(|line| line.contains(QUERY_EVENT_NAME))
            .map(str::to_owned)
            .collect()
    }

    pub fn assert_contains(&self, needle: &str) {
        let output = self.output();
        assert!(output.contains(needle), "expected `{needle}` in captured logs:\n{output}");
    }

    pub fn assert_not_contains(&self, needle: &str) {
        let output = self.output();
        assert!(!output.contains(needle), "did not expect `{needle}` in captured logs:\n{output}");
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.text.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_keep_only_query_records() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        tracing::info!(query.activity = "query.hit", "query.event");
        tracing::info!("unrelated");
        tracing::warn!(query.activity = "query.error", "query.event");

        let events = capture.events();
        assert_eq!(events.len(), 2);
        assert!(events[0].contains("query.hit"));
        assert!(events[1].contains("query.error"));
        capture.assert_contains("unrelated");
        capture.assert_not_contains("query.miss");
    }
}
