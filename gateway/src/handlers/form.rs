//! Form extraction shared by the synthesis endpoints.
//!
//! Callers send fields as `multipart/form-data` (browser `FormData`, file
//! uploads) or `application/x-www-form-urlencoded` (scripts, the warmup tool).
//! Any other request is read from its query string, so GET and POST behave the
//! same way on every synthesis path.

use std::collections::HashMap;

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use bytes::Bytes;

use crate::core::audio::{PromptSpeech, decode_prompt_speech};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Default, Clone)]
pub struct SynthesisForm {
    fields: HashMap<String, String>,
    files: HashMap<String, Bytes>,
}

impl SynthesisForm {
    fn from_pairs(input: &[u8]) -> Self {
        let fields = url::form_urlencoded::parse(input).into_owned().collect();
        Self {
            fields,
            files: HashMap::new(),
        }
    }

    async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read field {name}: {e}")))?;

            if let Ok(text) = std::str::from_utf8(&data) {
                form.fields.insert(name.clone(), text.to_string());
            }
            form.files.insert(name, data);
        }

        Ok(form)
    }

    /// A required text field
    pub fn text(&self, name: &str) -> AppResult<String> {
        self.fields
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::Validation(format!("Missing required field: {name}")))
    }

    pub fn optional_text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// A required uploaded file
    pub fn file(&self, name: &str) -> AppResult<&Bytes> {
        self.files
            .get(name)
            .filter(|data| !data.is_empty())
            .ok_or_else(|| AppError::Validation(format!("Missing required file: {name}")))
    }

    /// Decode a required upload into 16 kHz mono reference speech
    pub fn prompt_speech(&self, name: &str) -> AppResult<PromptSpeech> {
        let data = self.file(name)?;
        decode_prompt_speech(data)
            .map_err(|e| AppError::Validation(format!("Malformed audio upload in {name}: {e}")))
    }

    /// The optional `seed` field, defaulting to 0
    pub fn seed(&self) -> AppResult<u64> {
        match self.optional_text("seed").map(str::trim) {
            None | Some("") => Ok(0),
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::Validation(format!("seed must be a non-negative integer, got '{raw}'"))),
        }
    }
}

impl<S> FromRequest<S> for SynthesisForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?;
            return Self::from_multipart(multipart).await;
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read request body: {e}")))?;
            return Ok(Self::from_pairs(&body));
        }

        let query = req.uri().query().unwrap_or_default();
        Ok(Self::from_pairs(query.as_bytes()))
    }
}
