//! Always-available last-resort sink.
//!
//! A "send" durably records the fully rendered message in the structured
//! log and an in-process ring buffer. It is a local write and cannot
//! fail, which is what guarantees `dispatch` never drops a message.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::{channel::NotifyChannel, error::ChannelError, types::Readiness};

/// Ring buffer capacity for operator inspection.
const RECORD_CAP: usize = 256;

/// One durably recorded, undelivered message.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedMessage {
    pub destination: String,
    pub body: String,
    pub recorded_at: i64,
}

pub struct RecordingChannel {
    records: Mutex<VecDeque<RecordedMessage>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(RECORD_CAP)),
        }
    }

    /// Most recent records, newest last.
    pub fn recent(&self) -> Vec<RecordedMessage> {
        self.records
            .lock()
            .expect("recording mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }
}

impl Default for RecordingChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotifyChannel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    fn readiness(&self) -> Readiness {
        Readiness::Ready
    }

    fn readiness_detail(&self) -> String {
        "recording to local log".to_string()
    }

    async fn send(&self, destination: &str, body: &str) -> Result<(), ChannelError> {
        // The durable record keeps the full destination — this is the
        // message of last resort and must stay reconstructable.
        info!(destination = %destination, body = %body, "notification recorded (no outbound channel)");

        let mut records = self.records.lock().expect("recording mutex poisoned");
        if records.len() == RECORD_CAP {
            records.pop_front();
        }
        records.push_back(RecordedMessage {
            destination: destination.to_string(),
            body: body.to_string(),
            recorded_at: chrono::Utc::now().timestamp(),
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_always_succeeds_and_keeps_the_message() {
        let channel = RecordingChannel::new();
        assert_eq!(channel.readiness(), Readiness::Ready);

        channel.send("+911234567890", "approved").await.unwrap();

        let records = channel.recent();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].destination, "+911234567890");
        assert_eq!(records[0].body, "approved");
    }

    #[tokio::test]
    async fn ring_buffer_drops_oldest_at_capacity() {
        let channel = RecordingChannel::new();
        for i in 0..RECORD_CAP + 5 {
            channel.send("+911234567890", &format!("msg {i}")).await.unwrap();
        }
        let records = channel.recent();
        assert_eq!(records.len(), RECORD_CAP);
        assert_eq!(records[0].body, "msg 5");
    }
}
