use crate::client::{PipelineState, ReviewEntry};
use std::collections::VecDeque;
use std::time::Instant;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub enum FeedStatus {
    Loading,
    Ready,
    Failed(String),
}

/// Snapshot the browser publishes to the terminal on every change.
#[derive(Debug, Clone)]
pub struct AppState {
    pub reviews: Vec<ReviewEntry>,
    pub feed: FeedStatus,
    pub pipeline: PipelineState,
    pub logs: VecDeque<LogEntry>,
    pub start_time: Instant,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub message: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            reviews: Vec::new(),
            feed: FeedStatus::Loading,
            pipeline: PipelineState::Idle,
            logs: VecDeque::with_capacity(MAX_LOGS),
            start_time: Instant::now(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pipeline.is_busy()
    }

    pub fn push_log(&mut self, level: &str, message: String) {
        let time = chrono::Local::now().format("%H:%M:%S%.3f").to_string();
        if self.logs.len() >= MAX_LOGS {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry {
            time,
            level: level.to_string(),
            message,
        });
    }

    pub fn uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let h = secs / 3600;
        let m = (secs % 3600) / 60;
        format!("{}h {:02}m", h, m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_log_is_bounded() {
        let mut state = AppState::new();
        for i in 0..(MAX_LOGS + 5) {
            state.push_log("INFO", format!("line {}", i));
        }
        assert_eq!(state.logs.len(), MAX_LOGS);
        assert_eq!(state.logs.front().unwrap().message, "line 5");
    }

    #[test]
    fn test_busy_follows_pipeline() {
        let mut state = AppState::new();
        assert!(!state.is_busy());
        state.pipeline = PipelineState::FetchingId { title: "Portal".into() };
        assert!(state.is_busy());
    }
}
