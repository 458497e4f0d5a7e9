use crate::{
    events::{PipelineEvent, PipelineObserver, TracingObserver},
    inference::{InferenceError, InferenceProvider},
    model::{AnalysisResult, StoredImageReference, UploadRequest},
    store::{stored_filename, ContentStore, StoreError},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Upload failed: {0}")]
    Upload(#[source] StoreError),
    #[error("Analysis failed for {}: {source}", .image.download_url)]
    Analysis {
        image: StoredImageReference,
        #[source]
        source: InferenceError,
    },
}

pub struct Pipeline {
    store: Arc<dyn ContentStore>,
    inference: Arc<dyn InferenceProvider>,
    observer: Arc<dyn PipelineObserver>,
    clock: Clock,
}

impl Pipeline {
    pub fn new(store: Arc<dyn ContentStore>, inference: Arc<dyn InferenceProvider>) -> Self {
        Self {
            store,
            inference,
            observer: Arc::new(TracingObserver),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub async fn run(&self, request: UploadRequest) -> Result<AnalysisResult, PipelineError> {
        let stored = self.upload(&request).await?;
        let analysis = self.analyze(&request, &stored).await?;

        Ok(AnalysisResult {
            analysis,
            image_url: Some(stored.download_url),
            uploaded_at: (self.clock)(),
        })
    }

    async fn upload(&self, request: &UploadRequest) -> Result<StoredImageReference, PipelineError> {
        let filename = stored_filename(
            (self.clock)().timestamp_millis(),
            &request.original_filename,
        );

        self.observer.notify(&PipelineEvent::UploadStarted {
            filename: filename.clone(),
            size: request.bytes.len(),
        });

        match self.store.put(&filename, &request.bytes).await {
            Ok(stored) => {
                self.observer.notify(&PipelineEvent::Uploaded {
                    filename,
                    url: stored.download_url.clone(),
                });
                Ok(stored)
            }
            Err(err) => {
                self.observer.notify(&PipelineEvent::UploadFailed {
                    filename,
                    reason: err.to_string(),
                });
                Err(PipelineError::Upload(err))
            }
        }
    }

    async fn analyze(
        &self,
        request: &UploadRequest,
        stored: &StoredImageReference,
    ) -> Result<String, PipelineError> {
        match self
            .inference
            .analyze(&request.bytes, &request.mime_type)
            .await
        {
            Ok(analysis) => {
                self.observer.notify(&PipelineEvent::AnalysisCompleted {
                    filename: stored.filename.clone(),
                });
                Ok(analysis)
            }
            Err(source) => {
                self.observer.notify(&PipelineEvent::AnalysisFailed {
                    filename: stored.filename.clone(),
                    url: stored.download_url.clone(),
                    reason: source.to_string(),
                });
                Err(PipelineError::Analysis {
                    image: stored.clone(),
                    source,
                })
            }
        }
    }
}
