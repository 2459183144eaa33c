use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

use crate::config::Config;
use crate::error::PredictError;
use crate::types::{AnnotationPayload, ModelVariant, PredictionRequest, PredictionResult, UploadTarget};

/// Thin client for the remote prediction service. One call per submit
/// action, no retries; the transport-level timeout is the deadline.
#[derive(Clone)]
pub struct PredictionClient {
    http: Client,
    base_url: String,
}

impl PredictionClient {
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(config, &config.base_url())
    }

    pub fn with_base_url(config: &Config, base_url: &str) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds()))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint_url(&self, variant: ModelVariant) -> String {
        format!("{}/{}", self.base_url, variant.endpoint())
    }

    pub async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResult, PredictError> {
        let url = self.endpoint_url(request.variant);
        debug!("Submitting {} request to {}", request.variant.label(), url);

        let builder = match &request.target {
            UploadTarget::AudioFile { name, mime, bytes } => {
                let part = Part::bytes(bytes.clone()).file_name(name.clone());
                // An unparsable MIME string just gets omitted.
                let part = match part.mime_str(mime) {
                    Ok(part) => part,
                    Err(_) => Part::bytes(bytes.clone()).file_name(name.clone()),
                };
                self.http.post(&url).multipart(Form::new().part("file", part))
            }
            UploadTarget::Recording { events, duration } => {
                self.http.post(&url).json(&AnnotationPayload {
                    events,
                    duration: *duration,
                })
            }
        };

        let response = builder.send().await.map_err(classify_transport)?;
        classify_response(response).await
    }
}

fn classify_transport(error: reqwest::Error) -> PredictError {
    if error.is_timeout() {
        PredictError::Timeout
    } else {
        PredictError::Network(error.to_string())
    }
}

async fn classify_response(response: Response) -> Result<PredictionResult, PredictError> {
    let status = response.status();

    if status.is_server_error() {
        return Err(PredictError::Server(status.as_u16()));
    }
    if status.is_client_error() {
        let body = response.text().await.unwrap_or_default();
        return Err(PredictError::Rejected(rejection_message(status, &body)));
    }

    let body = response.text().await.map_err(classify_transport)?;
    serde_json::from_str(&body)
        .map_err(|error| PredictError::InvalidResponse(error.to_string()))
}

/// Surfaces the server's own validation message when the 4xx body
/// carries one, falling back to a generic wording.
fn rejection_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    format!("Request rejected (HTTP {})", status.as_u16())
}
