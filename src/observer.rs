use crate::metrics::PaginationMetrics;
use crate::page_set::PageSetId;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowDrawn {
    pub row_index: usize,
    pub page_set: PageSetId,
    pub height: f32,
    /// Physical page per column group, in group order.
    pub pages: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSetCreated {
    pub page_set: PageSetId,
    pub first_page: usize,
    pub page_count: usize,
    /// Index of the row that overflowed, `None` for the opening set.
    pub trigger_row: Option<usize>,
    pub released: usize,
}

/// Receives pagination events as they happen.
pub trait RowObserver {
    fn on_row_drawn(&mut self, event: &RowDrawn);

    fn on_page_set_created(&mut self, _event: &PageSetCreated) {}
}

impl<F> RowObserver for F
where
    F: FnMut(&RowDrawn),
{
    fn on_row_drawn(&mut self, event: &RowDrawn) {
        self(event)
    }
}

/// An observer owned by the caller and shared across renders.
pub(crate) struct SharedObserver(pub(crate) Arc<Mutex<dyn RowObserver + Send>>);

impl RowObserver for SharedObserver {
    fn on_row_drawn(&mut self, event: &RowDrawn) {
        if let Ok(mut observer) = self.0.lock() {
            observer.on_row_drawn(event);
        }
    }

    fn on_page_set_created(&mut self, event: &PageSetCreated) {
        if let Ok(mut observer) = self.0.lock() {
            observer.on_page_set_created(event);
        }
    }
}

/// Forwards every event to each observer in order.
pub(crate) struct Fanout(pub(crate) Vec<Box<dyn RowObserver + Send>>);

impl RowObserver for Fanout {
    fn on_row_drawn(&mut self, event: &RowDrawn) {
        for observer in &mut self.0 {
            observer.on_row_drawn(event);
        }
    }

    fn on_page_set_created(&mut self, event: &PageSetCreated) {
        for observer in &mut self.0 {
            observer.on_page_set_created(event);
        }
    }
}

/// Writes one JSON record per event and keeps named counters. Clones share
/// the same file, so a handle kept by the caller can emit the summary after
/// the paginator has been consumed.
#[derive(Clone)]
pub struct JsonlObserver {
    inner: Arc<Mutex<JsonlState>>,
}

struct JsonlState {
    writer: BufWriter<File>,
    counters: BTreeMap<String, u64>,
}

impl JsonlObserver {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(JsonlState {
                writer: BufWriter::new(file),
                counters: BTreeMap::new(),
            })),
        })
    }

    pub fn log_json(&self, value: &serde_json::Value) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = writeln!(state.writer, "{value}");
        }
    }

    pub fn increment(&self, key: &str, amount: u64) {
        if let Ok(mut state) = self.inner.lock() {
            let entry = state.counters.entry(key.to_string()).or_insert(0);
            *entry = entry.saturating_add(amount);
        }
    }

    /// Writes the counters (draining them) plus the run metrics, then flushes.
    pub fn emit_summary(&self, context: &str, metrics: &PaginationMetrics) {
        if let Ok(mut state) = self.inner.lock() {
            let counts = std::mem::take(&mut state.counters);
            let record = json!({
                "type": "widetable.summary",
                "context": context,
                "counts": counts,
                "metrics": metrics,
            });
            let _ = writeln!(state.writer, "{record}");
            let _ = state.writer.flush();
        }
    }

    pub fn flush(&self) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = state.writer.flush();
        }
    }
}

impl RowObserver for JsonlObserver {
    fn on_row_drawn(&mut self, event: &RowDrawn) {
        self.log_json(&json!({ "type": "widetable.row", "event": event }));
        self.increment("widetable.rows", 1);
        self.increment("widetable.row_pages", event.pages.len() as u64);
    }

    fn on_page_set_created(&mut self, event: &PageSetCreated) {
        self.log_json(&json!({ "type": "widetable.page_set", "event": event }));
        self.increment("widetable.page_sets", 1);
        self.increment("widetable.pages", event.page_count as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!(
            "widetable_{name}_{}_{nanos}.jsonl",
            std::process::id()
        ))
    }

    #[test]
    fn closures_observe_rows() {
        let mut seen = Vec::new();
        {
            let mut observer = |event: &RowDrawn| seen.push(event.row_index);
            let event = RowDrawn {
                row_index: 4,
                page_set: 0,
                height: 30.0,
                pages: vec![0],
            };
            observer.on_row_drawn(&event);
            observer.on_page_set_created(&PageSetCreated {
                page_set: 1,
                first_page: 1,
                page_count: 1,
                trigger_row: Some(5),
                released: 0,
            });
        }
        assert_eq!(seen, vec![4]);
    }

    #[test]
    fn jsonl_records_and_summary() {
        let path = temp_path("observer");
        let handle = JsonlObserver::new(&path).unwrap();
        let mut observer = handle.clone();
        observer.on_page_set_created(&PageSetCreated {
            page_set: 0,
            first_page: 0,
            page_count: 2,
            trigger_row: None,
            released: 0,
        });
        observer.on_row_drawn(&RowDrawn {
            row_index: 0,
            page_set: 0,
            height: 30.0,
            pages: vec![0, 1],
        });
        let metrics = PaginationMetrics {
            rows_drawn: 1,
            ..PaginationMetrics::default()
        };
        handle.emit_summary("test", &metrics);

        let text = std::fs::read_to_string(&path).unwrap();
        let records: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["type"], "widetable.page_set");
        assert_eq!(records[1]["event"]["pages"], json!([0, 1]));
        assert_eq!(records[2]["counts"]["widetable.rows"], 1);
        assert_eq!(records[2]["counts"]["widetable.pages"], 2);
        assert_eq!(records[2]["metrics"]["rows_drawn"], 1);
        let _ = std::fs::remove_file(&path);
    }
}
