use chrono::{DateTime, SecondsFormat, Utc};

pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";
/// Name browsers give to file parts submitted without one.
pub const FALLBACK_FILENAME: &str = "blob";

/// A single leaf photo as received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub original_filename: String,
    pub mime_type: String,
}

impl UploadRequest {
    /// Builds a request, sniffing the MIME type from the payload when the
    /// client did not declare a usable one.
    pub fn new(bytes: Vec<u8>, filename: Option<&str>, declared_mime: Option<&str>) -> Self {
        let original_filename = filename
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_FILENAME)
            .to_owned();

        let mime_type = match declared_mime {
            Some(mime) if !mime.is_empty() && mime != FALLBACK_MIME_TYPE => mime.to_owned(),
            _ => infer::get(&bytes)
                .map(|kind| kind.mime_type())
                .unwrap_or(FALLBACK_MIME_TYPE)
                .to_owned(),
        };

        Self {
            bytes,
            original_filename,
            mime_type,
        }
    }
}

/// Where the content store put an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImageReference {
    pub filename: String,
    pub download_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub analysis: String,
    pub image_url: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// ISO-8601 with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
    pub fn uploaded_at_iso(&self) -> String {
        self.uploaded_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
