//! Request body extractor shared by every form-style endpoint.
//!
//! Admin and public forms accept either a JSON object or
//! `multipart/form-data`. Both decode into a [`ContentForm`]: JSON members
//! and multipart text fields become `values`, multipart file parts become
//! `files`.

use axum::async_trait;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use serde_json::{Map, Value};

use crate::config;
use crate::error::ApiError;
use crate::services::content_service::ContentForm;
use crate::services::upload_service::UploadedFile;

pub mod reject;

pub use reject::{Json, Path, Query};

/// Largest single file part accepted before the upload service applies its own per-kind limit.
fn max_part_bytes() -> usize {
    let uploads = &config::config().uploads;
    uploads.max_image_bytes.max(uploads.max_attachment_bytes)
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
}

pub async fn read_multipart(mut multipart: Multipart) -> Result<ContentForm, ApiError> {
    let limit = max_part_bytes();
    let mut form = ContentForm::default();

    while let Some(mut field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        let Some(file_name) = field.file_name().map(str::to_string) else {
            let text = field.text().await?;
            form.values.insert(name, Value::String(text));
            continue;
        };

        let content_type = field.content_type().map(str::to_string);
        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if bytes.len() + chunk.len() > limit {
                tracing::warn!("Rejected upload '{}': larger than {} bytes", file_name, limit);
                return Err(ApiError::payload_too_large(format!(
                    "File '{}' exceeds the maximum size of {} MB",
                    file_name,
                    limit / (1024 * 1024)
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        form.files.push(UploadedFile { field: name, file_name, content_type, bytes });
    }

    Ok(form)
}

#[async_trait]
impl<S> FromRequest<S> for ContentForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(format!("Invalid multipart request: {}", e)))?;
            return read_multipart(multipart).await;
        }

        let Json(body) = Json::<Value>::from_request(req, state).await?;
        match body {
            Value::Object(values) => Ok(ContentForm::from_json(values)),
            Value::Null => Ok(ContentForm::from_json(Map::new())),
            _ => Err(ApiError::bad_request("Request body must be a JSON object")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[tokio::test]
    async fn json_object_becomes_values() {
        let req = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":"Piknik","is_active":true}"#))
            .unwrap();
        let form = ContentForm::from_request(req, &()).await.unwrap();
        assert_eq!(form.values["title"], "Piknik");
        assert!(form.files.is_empty());
    }

    #[tokio::test]
    async fn json_array_is_rejected() {
        let req = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("[1,2]"))
            .unwrap();
        let err = ContentForm::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn multipart_splits_text_and_files() {
        let body = "--XYZ\r\n\
            Content-Disposition: form-data; name=\"title\"\r\n\r\n\
            Bahar\r\n\
            --XYZ\r\n\
            Content-Disposition: form-data; name=\"image\"; filename=\"bahar.png\"\r\n\
            Content-Type: image/png\r\n\r\n\
            PNGDATA\r\n\
            --XYZ--\r\n";
        let req = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "multipart/form-data; boundary=XYZ")
            .body(Body::from(body))
            .unwrap();
        let form = ContentForm::from_request(req, &()).await.unwrap();
        assert_eq!(form.values["title"], "Bahar");
        assert_eq!(form.files.len(), 1);
        assert_eq!(form.files[0].field, "image");
        assert_eq!(form.files[0].file_name, "bahar.png");
        assert_eq!(form.files[0].content_type.as_deref(), Some("image/png"));
        assert_eq!(form.files[0].bytes, b"PNGDATA");
    }
}
