use crate::{pipeline::PipelineError, response::ErrorResponse};
use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

pub const MISSING_IMAGE_MESSAGE: &str = "No image provided";
pub const PROCESSING_FAILED_MESSAGE: &str = "Failed to process image";

#[derive(Debug, Error)]
pub enum Error {
    #[error("No image provided")]
    MissingImage,
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Request is not multipart: {0}")]
    Rejection(#[from] MultipartRejection),
    #[error("Image field is not a file")]
    NotAFile,
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (code, message) = match &self {
            Error::MissingImage => (StatusCode::BAD_REQUEST, MISSING_IMAGE_MESSAGE),
            Error::Multipart(_) | Error::Rejection(_) | Error::NotAFile | Error::Pipeline(_) => {
                error!("Error processing image: {self}");
                (StatusCode::INTERNAL_SERVER_ERROR, PROCESSING_FAILED_MESSAGE)
            }
        };

        let body = ErrorResponse {
            error: message.to_owned(),
        };
        (code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::InferenceError;
    use crate::model::StoredImageReference;

    #[test]
    fn missing_image_is_bad_request() {
        let response = Error::MissingImage.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn text_image_field_is_internal() {
        let response = Error::NotAFile.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn pipeline_failures_are_internal() {
        let err = Error::from(PipelineError::Analysis {
            image: StoredImageReference {
                filename: "1-leaf.jpg".to_owned(),
                download_url: "https://store.test/1-leaf.jpg".to_owned(),
            },
            source: InferenceError::EmptyResponse,
        });
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
