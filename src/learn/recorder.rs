//! Learn recorder (spec §4.7): a process-wide singleton state machine that
//! records actions across tabs into an on-disk action log.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};
use tracing::warn;

use crate::error::BrowserError;
use crate::learn::action::Action;

enum State {
    Idle,
    Recording { name: String, started_at_ms: u64, dir: PathBuf },
}

/// Owned by the registry behind `Arc<Mutex<_>>`; tabs hold only a `Weak`
/// reference so a tab outliving the recorder (or vice versa) never panics.
pub struct LearnRecorder {
    state: State,
    actions: Vec<Action>,
    sequence: u64,
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

impl LearnRecorder {
    pub fn new() -> Self {
        Self { state: State::Idle, actions: Vec::new(), sequence: 0 }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, State::Recording { .. })
    }

    /// `learn_root` is `<temp>/aslan-learn`; the recording directory is
    /// `<learn_root>/<name>/`, recreated from empty.
    pub async fn start(&mut self, name: &str, learn_root: &std::path::Path) -> Result<(), BrowserError> {
        if self.is_recording() {
            return Err(BrowserError::LearnMode("a recording is already in progress".into()));
        }
        let dir = learn_root.join(name);
        if dir.exists() {
            tokio::fs::remove_dir_all(&dir)
                .await
                .map_err(|e| BrowserError::Internal(format!("failed to clear recording dir: {e}")))?;
        }
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| BrowserError::Internal(format!("failed to create recording dir: {e}")))?;

        self.actions.clear();
        self.sequence = 0;
        self.state = State::Recording { name: name.to_string(), started_at_ms: now_ms(), dir };
        Ok(())
    }

    pub fn stop(&mut self) -> Result<Value, BrowserError> {
        let State::Recording { name, started_at_ms, dir } = std::mem::replace(&mut self.state, State::Idle) else {
            return Err(BrowserError::LearnMode("no recording in progress".into()));
        };
        let duration_ms = now_ms().saturating_sub(started_at_ms);
        let log = json!({
            "name": name,
            "startedAt": started_at_ms,
            "durationMs": duration_ms,
            "actionCount": self.actions.len(),
            "screenshotDir": dir.display().to_string(),
            "actions": self.actions,
        });
        self.actions.clear();
        Ok(log)
    }

    pub fn status(&self) -> Value {
        match &self.state {
            State::Idle => json!({"recording": false}),
            State::Recording { name, started_at_ms, .. } => {
                json!({"recording": true, "name": name, "startedAt": started_at_ms, "actionCount": self.actions.len()})
            }
        }
    }

    /// Assign `seq`/`timestamp`, persist `screenshot` off the caller's
    /// execution context as `step-NNN.jpg`, and append the action.
    pub async fn record_action(&mut self, tab_id: &str, raw: Value, screenshot: Option<Vec<u8>>) {
        let State::Recording { dir, .. } = &self.state else { return };
        let dir = dir.clone();
        let seq = self.sequence;
        self.sequence += 1;

        let screenshot_path = match screenshot {
            Some(bytes) => match self.persist_screenshot(&dir, seq, bytes).await {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(error = %e, "failed to persist learn screenshot");
                    None
                }
            },
            None => None,
        };

        let action = Action::from_captured(seq, now_ms(), tab_id, raw, screenshot_path);
        self.actions.push(action);
    }

    pub fn record_synthetic(&mut self, tab_id: &str, kind: &str) {
        if !self.is_recording() {
            return;
        }
        let seq = self.sequence;
        self.sequence += 1;
        self.actions.push(Action::synthetic(seq, now_ms(), tab_id, kind));
    }

    pub fn record_annotation(&mut self, tab_id: &str, text: &str) -> Result<(), BrowserError> {
        if !self.is_recording() {
            return Err(BrowserError::LearnMode("no recording in progress".into()));
        }
        let seq = self.sequence;
        self.sequence += 1;
        self.actions.push(Action::annotation(seq, now_ms(), tab_id, text));
        Ok(())
    }

    async fn persist_screenshot(&self, dir: &std::path::Path, seq: u64, bytes: Vec<u8>) -> Result<String, BrowserError> {
        let filename = format!("step-{seq:03}.jpg");
        let path = dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| BrowserError::Internal(format!("failed to write screenshot: {e}")))?;
        Ok(filename)
    }
}

impl Default for LearnRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let dir = std::env::temp_dir().join("aslan-browser-test-recorder-start-twice");
        let mut recorder = LearnRecorder::new();
        recorder.start("session-a", &dir).await.unwrap();
        let err = recorder.start("session-b", &dir).await.unwrap_err();
        assert!(matches!(err, BrowserError::LearnMode(_)));
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn stop_without_start_is_rejected() {
        let mut recorder = LearnRecorder::new();
        assert!(recorder.stop().is_err());
    }

    #[tokio::test]
    async fn full_cycle_produces_action_log_with_screenshot() {
        let dir = std::env::temp_dir().join("aslan-browser-test-recorder-cycle");
        let mut recorder = LearnRecorder::new();
        recorder.start("demo", &dir).await.unwrap();
        recorder
            .record_action("tab0", json!({"type": "click", "target": {"tagName": "button"}}), Some(vec![1, 2, 3]))
            .await;
        recorder.record_synthetic("tab0", "navigation");

        let log = recorder.stop().unwrap();
        assert_eq!(log["actionCount"], 2);
        assert_eq!(log["actions"][0]["type"], "click");
        assert!(log["actions"][0]["screenshot"].as_str().unwrap().starts_with("step-"));

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn annotation_requires_active_recording() {
        let mut recorder = LearnRecorder::new();
        assert!(recorder.record_annotation("tab0", "note").is_err());
    }
}
