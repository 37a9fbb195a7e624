//! In-memory fakes for the completion backend and the messenger.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chatrelay_ai::{CompletionBackend, CompletionError, Turn};
use chatrelay_common::{IncomingMessage, RelayError};

use crate::messenger::Messenger;

pub enum Script {
    /// Always answer with this text.
    Reply(String),
    /// Answer `re: <last user turn>`.
    Echo,
    /// Always fail with a transport error.
    Fail,
    /// Echo after sleeping, leaving room for other rounds to interleave.
    SlowEcho(Duration),
}

pub struct FakeBackend {
    script: Script,
    calls: Mutex<Vec<Vec<Turn>>>,
}

impl FakeBackend {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Vec<Turn>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

fn echo(history: &[Turn]) -> String {
    let last = history.last().map(|t| t.content.as_str()).unwrap_or("");
    format!("re: {last}")
}

#[async_trait]
impl CompletionBackend for FakeBackend {
    async fn completion(&self, history: &[Turn]) -> Result<String, CompletionError> {
        self.calls.lock().unwrap().push(history.to_vec());
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Echo => Ok(echo(history)),
            Script::Fail => Err(CompletionError::Transport("connection refused".into())),
            Script::SlowEcho(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(echo(history))
            }
        }
    }
}

#[derive(Default)]
pub struct RecordingMessenger {
    fail: bool,
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        })
    }

    /// `(message id, text)` pairs in delivery order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn relay(&self, message: &IncomingMessage, text: &str) -> Result<(), RelayError> {
        if self.fail {
            return Err(RelayError::ChannelClosed);
        }
        self.sent
            .lock()
            .unwrap()
            .push((message.id.clone(), text.to_string()));
        Ok(())
    }
}
