use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// One page transition taken by the document driver.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageBreak<'a> {
    pub doc_id: Option<usize>,
    pub reason: &'a str,
    pub from_page: usize,
    pub to_page: usize,
    pub frame_index: usize,
    pub flowable: Option<&'a str>,
}

/// JSON-lines trace of pagination decisions, shared by every document of a
/// batch.
#[derive(Clone)]
pub(crate) struct DebugLogger {
    inner: Arc<Mutex<DebugState>>,
}

struct DebugState {
    writer: BufWriter<File>,
    counters: BTreeMap<String, u64>,
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(DebugState {
                writer: BufWriter::new(file),
                counters: BTreeMap::new(),
            })),
        })
    }

    pub fn log_json(&self, json: &str) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = writeln!(state.writer, "{json}");
        }
    }

    pub fn increment(&self, key: &str, amount: u64) {
        if let Ok(mut state) = self.inner.lock() {
            let entry = state.counters.entry(key.to_string()).or_insert(0);
            *entry = entry.saturating_add(amount);
        }
    }

    pub fn page_break(&self, event: PageBreak<'_>) {
        let doc_id = event
            .doc_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "null".to_string());
        let flowable = event
            .flowable
            .map(|name| format!("\"{}\"", json_escape(name)))
            .unwrap_or_else(|| "null".to_string());
        self.log_json(&format!(
            "{{\"type\":\"layout.page_break\",\"doc_id\":{},\"reason\":\"{}\",\"from_page\":{},\"to_page\":{},\"frame_index\":{},\"flowable\":{}}}",
            doc_id,
            json_escape(event.reason),
            event.from_page,
            event.to_page,
            event.frame_index,
            flowable
        ));
        self.increment(&format!("layout.page_break.{}", event.reason), 1);
    }

    /// Writes the accumulated counters and resets them.
    pub fn emit_summary(&self, context: &str) {
        if let Ok(mut state) = self.inner.lock() {
            let counters = std::mem::take(&mut state.counters);
            let counts = counters
                .iter()
                .map(|(key, value)| format!("\"{}\":{}", json_escape(key), value))
                .collect::<Vec<_>>()
                .join(",");
            let json = format!(
                "{{\"type\":\"debug.summary\",\"context\":\"{}\",\"counts\":{{{}}}}}",
                json_escape(context),
                counts
            );
            let _ = writeln!(state.writer, "{json}");
        }
    }

    pub fn flush(&self) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = state.writer.flush();
        }
    }
}

pub(crate) fn json_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}
