use std::sync::Mutex;
use tracing::{error, info};

/// Progress of a single submission through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    UploadStarted { filename: String, size: usize },
    Uploaded { filename: String, url: String },
    UploadFailed { filename: String, reason: String },
    AnalysisCompleted { filename: String },
    /// The image stays in the content store; nothing rolls it back.
    AnalysisFailed {
        filename: String,
        url: String,
        reason: String,
    },
}

pub trait PipelineObserver: Send + Sync {
    fn notify(&self, event: &PipelineEvent);
}

/// Writes every event as a structured `tracing` record.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn notify(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::UploadStarted { filename, size } => {
                info!(%filename, size, "Uploading image to content store")
            }
            PipelineEvent::Uploaded { filename, url } => {
                info!(%filename, %url, "Image uploaded")
            }
            PipelineEvent::UploadFailed { filename, reason } => {
                error!(%filename, %reason, "Image upload failed")
            }
            PipelineEvent::AnalysisCompleted { filename } => {
                info!(%filename, "Analysis completed")
            }
            PipelineEvent::AnalysisFailed {
                filename,
                url,
                reason,
            } => {
                error!(%filename, orphaned_url = %url, %reason, "Analysis failed after upload")
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl PipelineObserver for RecordingObserver {
    fn notify(&self, event: &PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
