//! REST transport for the StudioAI API.
//!
//! Wraps a [`reqwest::Client`], attaches the session's bearer token, and
//! converts non-2xx responses into [`ClientError`] via the shared error
//! body shape.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use studioai_core::files::{FileUpload, FormEncode};

use crate::error::ClientError;
use crate::store::SessionStore;

/// Request body, chosen by the resource layer from the typed input.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Json(serde_json::Value),
    Multipart {
        text: Vec<(String, String)>,
        files: Vec<(String, FileUpload)>,
    },
}

impl Payload {
    pub fn json<T: Serialize>(body: &T) -> Result<Payload, ClientError> {
        Ok(Payload::Json(serde_json::to_value(body)?))
    }

    /// Multipart body from a form's text and file parts.
    pub fn multipart<F: FormEncode>(form: &F) -> Payload {
        Payload::Multipart {
            text: form
                .text_fields()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            files: form
                .file_fields()
                .into_iter()
                .map(|(k, f)| (k.to_string(), f.clone()))
                .collect(),
        }
    }

    /// Multipart when the form carries a file, JSON otherwise.
    pub fn from_form<F: FormEncode + Serialize>(form: &F) -> Result<Payload, ClientError> {
        if form.has_files() {
            Ok(Payload::multipart(form))
        } else {
            Payload::json(form)
        }
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Payload::Multipart { .. })
    }

    fn into_form(
        text: Vec<(String, String)>,
        files: Vec<(String, FileUpload)>,
    ) -> Result<reqwest::multipart::Form, ClientError> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in text {
            form = form.text(name, value);
        }
        for (name, file) in files {
            let part = reqwest::multipart::Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.mime_type)
                .map_err(|e| ClientError::Validation(format!("Invalid file type: {e}")))?;
            form = form.part(name, part);
        }
        Ok(form)
    }
}

/// HTTP client bound to one API base URL and one session.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// * `base_url` - API origin, e.g. `http://localhost:3001`.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: Arc<SessionStore>,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, session))
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        session: Arc<SessionStore>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Same connection pool and session, different origin.
    pub fn rebased(&self, base_url: impl Into<String>) -> Self {
        Self::with_client(self.client.clone(), base_url, Arc::clone(&self.session))
    }

    /// `GET {base}{path}` with query pairs, decoded as `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let request = self.request(Method::GET, path).query(query);
        let response = request.send().await?;
        Self::parse_response(response).await
    }

    /// Send a write with `payload`, decoded as `T`.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: Payload,
    ) -> Result<T, ClientError> {
        let response = self.dispatch(method, path, payload).await?;
        Self::parse_response(response).await
    }

    /// Send a write whose response body is ignored.
    pub async fn send_unit(
        &self,
        method: Method,
        path: &str,
        payload: Payload,
    ) -> Result<(), ClientError> {
        let response = self.dispatch(method, path, payload).await?;
        Self::check_status(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send_unit(Method::DELETE, path, Payload::Empty).await
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        payload: Payload,
    ) -> Result<reqwest::Response, ClientError> {
        tracing::debug!(%method, path, multipart = payload.is_multipart(), "API request");
        let request = self.request(method, path);
        let request = match payload {
            Payload::Empty => request,
            Payload::Json(body) => request.json(&body),
            Payload::Multipart { text, files } => {
                request.multipart(Payload::into_form(text, files)?)
            }
        };
        Ok(request.send().await?)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.request(method, url);
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or the classified error body on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            let err = ClientError::from_response(status.as_u16(), &body);
            tracing::debug!(status = status.as_u16(), error = %err, "API error response");
            return Err(err);
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ClientError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use studioai_core::models::character::CharacterDraft;

    use super::*;

    #[test]
    fn draft_without_file_is_json() {
        let draft = CharacterDraft {
            name: "Pip".into(),
            ..Default::default()
        };
        let payload = Payload::from_form(&draft).unwrap();
        match payload {
            Payload::Json(body) => assert_eq!(body["name"], "Pip"),
            other => panic!("expected JSON, got {other:?}"),
        }
    }

    #[test]
    fn draft_with_file_is_multipart() {
        let draft = CharacterDraft {
            name: "Pip".into(),
            reference_image: Some(FileUpload::new("pip.png", "image/png", vec![1, 2, 3])),
            ..Default::default()
        };
        let payload = Payload::from_form(&draft).unwrap();
        match payload {
            Payload::Multipart { text, files } => {
                assert!(text.iter().any(|(k, v)| k == "name" && v == "Pip"));
                assert_eq!(files.len(), 1);
                assert_eq!(files[0].0, "reference_image");
            }
            other => panic!("expected multipart, got {other:?}"),
        }
    }
}
