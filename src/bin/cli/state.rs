use chrono::{DateTime, Local};
use live_stomp::Headers;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Maximum number of messages kept for the summary report
pub const MAX_MESSAGES: usize = 1000;

/// Statistics for a single subscription destination
#[derive(Debug, Clone, Default)]
pub struct SubStats {
    /// Number of messages received on this destination
    pub message_count: u64,
}

/// A received message kept for the report
#[derive(Debug, Clone)]
pub struct DisplayMessage {
    pub timestamp: DateTime<Local>,
    pub destination: String,
    pub body: String,
    pub headers: Headers,
}

/// Session state shared across all tasks
pub struct AppState {
    pub start_time: DateTime<Local>,
    pub endpoint: String,
    /// Subscriptions: destination -> stats
    pub subscriptions: HashMap<String, SubStats>,
    pub sent_count: u64,
    /// Ring buffer of received messages
    pub messages: VecDeque<DisplayMessage>,
}

impl AppState {
    pub fn new(endpoint: String) -> Self {
        Self {
            start_time: Local::now(),
            endpoint,
            subscriptions: HashMap::new(),
            sent_count: 0,
            messages: VecDeque::with_capacity(MAX_MESSAGES),
        }
    }

    /// Record a received message
    pub fn record_message(&mut self, destination: &str, body: String, headers: Headers) {
        let stats = self.subscriptions.entry(destination.to_string()).or_default();
        stats.message_count += 1;

        self.messages.push_back(DisplayMessage {
            timestamp: Local::now(),
            destination: destination.to_string(),
            body,
            headers,
        });
        while self.messages.len() > MAX_MESSAGES {
            self.messages.pop_front();
        }
    }

    pub fn record_sent(&mut self) {
        self.sent_count += 1;
    }

    pub fn register_subscription(&mut self, destination: &str) {
        self.subscriptions.entry(destination.to_string()).or_default();
    }

    pub fn total_message_count(&self) -> u64 {
        self.subscriptions.values().map(|s| s.message_count).sum()
    }

    /// Generate session summary text
    pub fn generate_summary(&self) -> String {
        let end_time = Local::now();
        let total_secs = end_time.signed_duration_since(self.start_time).num_seconds();

        let mut lines = Vec::new();
        lines.push("════════════════════════════════════════════════════════════".to_string());
        lines.push("  live-stomp Session Report".to_string());
        lines.push("════════════════════════════════════════════════════════════".to_string());
        lines.push(format!("  Endpoint:   {}", self.endpoint));
        lines.push(format!("  Started:    {}", self.start_time.format("%Y-%m-%d %H:%M:%S")));
        lines.push(format!("  Ended:      {}", end_time.format("%Y-%m-%d %H:%M:%S")));
        lines.push(format!("  Duration:   {}m {}s", total_secs / 60, total_secs % 60));
        lines.push(format!("  Sent:       {}", self.sent_count));
        if let Some(last) = self.messages.back() {
            lines.push(format!(
                "  Last:       {} on {} ({} headers, {} bytes)",
                last.timestamp.format("%H:%M:%S"),
                last.destination,
                last.headers.len(),
                last.body.len()
            ));
        }
        lines.push(String::new());
        lines.push("  Subscriptions:".to_string());

        // most active first
        let mut subs: Vec<_> = self.subscriptions.iter().collect();
        subs.sort_by(|a, b| b.1.message_count.cmp(&a.1.message_count));

        let width = subs.iter().map(|(d, _)| d.len()).max().unwrap_or(20).min(40);
        for (dest, stats) in &subs {
            lines.push(format!(
                "    {:width$} {:>6}",
                truncate_str(dest, width),
                stats.message_count,
                width = width
            ));
        }
        lines.push(format!("    {:─>w$}", "", w = width + 7));
        lines.push(format!(
            "    {:width$} {:>6}",
            "Total",
            self.total_message_count(),
            width = width
        ));
        lines.push("════════════════════════════════════════════════════════════".to_string());
        lines.join("\n")
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        ".".repeat(max_len)
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

/// Thread-safe shared state
pub type SharedState = Arc<Mutex<AppState>>;

pub fn new_shared_state(endpoint: String) -> SharedState {
    Arc::new(Mutex::new(AppState::new(endpoint)))
}
