use crate::{
    config::Config,
    error::Error,
    model::UploadRequest,
    pipeline::Pipeline,
    response::{AnalyzeResponse, ConfigStatus},
};
use axum::{
    extract::{multipart::MultipartRejection, Multipart},
    http::StatusCode,
    response::Html,
    Extension, Json,
};
use std::sync::Arc;
use tracing::info;

const INDEX: &str = include_str!("../web/index.html");
pub const IMAGE_FIELD: &str = "image";
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub async fn index() -> Html<&'static str> {
    Html(INDEX)
}

pub async fn analyze(
    Extension(pipeline): Extension<Arc<Pipeline>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, Error> {
    let mut multipart = multipart?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        // A plain text part under the image name carries no file.
        let filename = field.file_name().map(str::to_owned).ok_or(Error::NotAFile)?;
        let mime_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await?;

        upload = Some(UploadRequest::new(
            bytes.to_vec(),
            Some(&filename),
            mime_type.as_deref(),
        ));
        break;
    }

    let request = upload.ok_or(Error::MissingImage)?;
    let filename = request.original_filename.clone();

    let result = pipeline.run(request).await?;
    info!("Analysis completed for: {filename}");

    Ok(Json(result.into()))
}

pub async fn config_status(
    Extension(config): Extension<Arc<Config>>,
) -> (StatusCode, Json<ConfigStatus>) {
    let missing = config.missing();

    if missing.is_empty() {
        (
            StatusCode::OK,
            Json(ConfigStatus {
                configured: true,
                missing: Vec::new(),
                message: "All environment variables are configured".to_owned(),
            }),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(ConfigStatus {
                configured: false,
                missing: missing.into_iter().map(str::to_owned).collect(),
                message: "Please configure the missing environment variables".to_owned(),
            }),
        )
    }
}
