use crate::{handlers::IMAGE_FIELD, inference::data_uri, response::AnalyzeResponse};
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tracing::debug;

pub const ANALYZE_FAILED_MESSAGE: &str = "Failed to analyze image";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Idle,
    FileSelected,
    Analyzing,
    Result,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("No file selected")]
    NoFile,
    #[error("An analysis is already in progress")]
    InProgress,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormController {
    selected: Option<SelectedFile>,
    preview_url: Option<String>,
    analyzing: bool,
    result: Option<AnalyzeResponse>,
    error: Option<String>,
}

impl FormController {
    pub fn state(&self) -> FormState {
        if self.analyzing {
            FormState::Analyzing
        } else if self.result.is_some() {
            FormState::Result
        } else if self.error.is_some() {
            FormState::Error
        } else if self.selected.is_some() {
            FormState::FileSelected
        } else {
            FormState::Idle
        }
    }

    /// Returns `false` and changes nothing while a submission is in flight.
    pub fn select_file(&mut self, file: SelectedFile) -> bool {
        if self.analyzing {
            return false;
        }

        self.preview_url = Some(data_uri(&file.mime_type, &file.bytes));
        self.selected = Some(file);
        self.result = None;
        self.error = None;
        true
    }

    pub fn can_submit(&self) -> bool {
        self.selected.is_some() && !self.analyzing
    }

    /// Moves to `Analyzing` and hands out the file to send.
    pub fn begin_submission(&mut self) -> Result<SelectedFile, SubmitError> {
        if self.analyzing {
            return Err(SubmitError::InProgress);
        }
        let file = self.selected.clone().ok_or(SubmitError::NoFile)?;

        self.analyzing = true;
        self.error = None;
        Ok(file)
    }

    pub fn finish(&mut self, outcome: Result<AnalyzeResponse, String>) {
        self.analyzing = false;
        match outcome {
            Ok(response) => self.result = Some(response),
            Err(message) => self.error = Some(message),
        }
    }

    /// Leaves `Analyzing` without an outcome, e.g. after the `submit` future was dropped.
    pub fn cancel(&mut self) {
        self.analyzing = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Posts the selected file to `{base_url}/api/analyze-plant` and records the outcome.
    pub async fn submit(
        &mut self,
        http: &reqwest::Client,
        base_url: &str,
    ) -> Result<FormState, SubmitError> {
        let file = self.begin_submission()?;
        let outcome = send(http, base_url, file).await;
        self.finish(outcome);
        Ok(self.state())
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview_url.as_deref()
    }

    pub fn result(&self) -> Option<&AnalyzeResponse> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

async fn send(
    http: &reqwest::Client,
    base_url: &str,
    file: SelectedFile,
) -> Result<AnalyzeResponse, String> {
    let part = Part::bytes(file.bytes)
        .file_name(file.name)
        .mime_str(&file.mime_type)
        .map_err(|e| e.to_string())?;
    let form = Form::new().part(IMAGE_FIELD, part);

    let url = format!("{}/api/analyze-plant", base_url.trim_end_matches('/'));
    let response = http
        .post(url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        debug!("Analysis request returned {}", response.status());
        return Err(ANALYZE_FAILED_MESSAGE.to_owned());
    }

    response
        .json::<AnalyzeResponse>()
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn leaf() -> SelectedFile {
        SelectedFile {
            name: "leaf.png".to_owned(),
            mime_type: "image/png".to_owned(),
            bytes: vec![1, 2, 3],
        }
    }

    fn response() -> AnalyzeResponse {
        AnalyzeResponse {
            analysis: "Powdery mildew".to_owned(),
            image_url: Some("https://store.test/1-leaf.png".to_owned()),
            uploaded_at: Some("2024-05-01T12:00:00.000Z".to_owned()),
        }
    }

    #[test]
    fn starts_idle() {
        let form = FormController::default();
        assert_eq!(form.state(), FormState::Idle);
        assert!(!form.can_submit());
    }

    #[test]
    fn selecting_a_file_previews_it() {
        let mut form = FormController::default();
        assert!(form.select_file(leaf()));

        assert_eq!(form.state(), FormState::FileSelected);
        assert_eq!(form.preview_url(), Some("data:image/png;base64,AQID"));
        assert!(form.can_submit());
    }

    #[test]
    fn selecting_clears_previous_outcome() {
        let mut form = FormController::default();
        form.select_file(leaf());
        form.begin_submission().unwrap();
        form.finish(Err("boom".to_owned()));
        assert_eq!(form.state(), FormState::Error);

        form.select_file(leaf());
        assert_eq!(form.state(), FormState::FileSelected);
        assert_eq!(form.error(), None);
    }

    #[test]
    fn no_second_submission_while_analyzing() {
        let mut form = FormController::default();
        form.select_file(leaf());
        form.begin_submission().unwrap();

        assert_eq!(form.state(), FormState::Analyzing);
        assert!(!form.can_submit());
        assert_eq!(form.begin_submission(), Err(SubmitError::InProgress));
        assert!(!form.select_file(leaf()));
    }

    #[test]
    fn cancel_unsticks_an_abandoned_submission() {
        let mut form = FormController::default();
        form.select_file(leaf());
        form.begin_submission().unwrap();

        form.cancel();

        assert_eq!(form.state(), FormState::FileSelected);
        assert!(form.can_submit());
        assert_eq!(form.begin_submission(), Ok(leaf()));
    }

    #[tokio::test]
    async fn dropped_submit_can_be_cancelled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let mut form = FormController::default();
        form.select_file(leaf());
        let http = reqwest::Client::new();

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            form.submit(&http, &server.uri()),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(form.state(), FormState::Analyzing);

        form.cancel();
        assert_eq!(form.state(), FormState::FileSelected);
    }

    #[test]
    fn submit_requires_a_file() {
        let mut form = FormController::default();
        assert_eq!(form.begin_submission(), Err(SubmitError::NoFile));
        assert_eq!(form.state(), FormState::Idle);
    }

    #[test]
    fn reset_after_result_matches_initial_state() {
        let mut form = FormController::default();
        form.select_file(leaf());
        form.begin_submission().unwrap();
        form.finish(Ok(response()));
        assert_eq!(form.state(), FormState::Result);

        form.reset();

        assert_eq!(form, FormController::default());
        assert_eq!(form.selected_file(), None);
        assert_eq!(form.preview_url(), None);
        assert_eq!(form.result(), None);
    }

    #[tokio::test]
    async fn submit_records_the_analysis() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/analyze-plant"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "analysis": "Powdery mildew",
                "imageUrl": "https://store.test/1-leaf.png",
                "uploadedAt": "2024-05-01T12:00:00.000Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut form = FormController::default();
        form.select_file(leaf());

        let state = form
            .submit(&reqwest::Client::new(), &server.uri())
            .await
            .unwrap();

        assert_eq!(state, FormState::Result);
        assert_eq!(form.result(), Some(&response()));
    }

    #[tokio::test]
    async fn server_error_becomes_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "error": "Failed to process image" })),
            )
            .mount(&server)
            .await;

        let mut form = FormController::default();
        form.select_file(leaf());

        let state = form
            .submit(&reqwest::Client::new(), &server.uri())
            .await
            .unwrap();

        assert_eq!(state, FormState::Error);
        assert_eq!(form.error(), Some(ANALYZE_FAILED_MESSAGE));
        assert!(form.selected_file().is_some());
    }
}
