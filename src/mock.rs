use crate::{
    inference::{InferenceError, InferenceProvider},
    model::StoredImageReference,
    store::{ContentStore, StoreError},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Put { filename: String, size: usize },
    Analyze { mime_type: String, size: usize },
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn record(&self, call: Call) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push(call);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn put_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Put { .. }))
            .count()
    }

    pub fn analyze_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Analyze { .. }))
            .count()
    }
}

pub struct MockStore {
    log: CallLog,
    fail: bool,
}

impl MockStore {
    /// Answers every put with `https://store.test/{filename}`.
    pub fn succeeding(log: CallLog) -> Self {
        Self { log, fail: false }
    }

    /// Answers every put with a 500 status.
    pub fn failing(log: CallLog) -> Self {
        Self { log, fail: true }
    }
}

#[async_trait]
impl ContentStore for MockStore {
    async fn put(&self, filename: &str, bytes: &[u8]) -> Result<StoredImageReference, StoreError> {
        self.log.record(Call::Put {
            filename: filename.to_owned(),
            size: bytes.len(),
        });

        if self.fail {
            return Err(StoreError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "mock store failure".to_owned(),
            });
        }

        Ok(StoredImageReference {
            filename: filename.to_owned(),
            download_url: format!("https://store.test/{filename}"),
        })
    }
}

pub struct MockProvider {
    log: CallLog,
    answer: Option<String>,
}

impl MockProvider {
    pub fn succeeding(log: CallLog, answer: &str) -> Self {
        Self {
            log,
            answer: Some(answer.to_owned()),
        }
    }

    /// Fails every call with [`InferenceError::EmptyResponse`].
    pub fn failing(log: CallLog) -> Self {
        Self { log, answer: None }
    }
}

#[async_trait]
impl InferenceProvider for MockProvider {
    async fn analyze(&self, bytes: &[u8], mime_type: &str) -> Result<String, InferenceError> {
        self.log.record(Call::Analyze {
            mime_type: mime_type.to_owned(),
            size: bytes.len(),
        });

        self.answer.clone().ok_or(InferenceError::EmptyResponse)
    }
}
