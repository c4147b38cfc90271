//! Contact form submissions: public intake and the admin inbox.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::PgPool;
use tracing::info;

use crate::database::models::ContactSubmission;
use crate::database::{ColumnSpec, TenantRepository};
use crate::filter::FilterData;
use crate::services::content_service::ContentForm;
use crate::services::upload_service::UploadService;
use crate::services::validation::ValidationErrors;
use crate::services::ServiceResult;

const COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::text("first_name"),
    ColumnSpec::text("last_name"),
    ColumnSpec::text("email"),
    ColumnSpec::text("phone"),
    ColumnSpec::text("subject"),
    ColumnSpec::text("message"),
    ColumnSpec::text("file_path"),
];

const READ_COLUMNS: &[ColumnSpec] = &[ColumnSpec::boolean("is_read")];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInput {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactInput {
    pub fn clean(self) -> Result<Self, ValidationErrors> {
        let input = Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        };
        let mut errors = ValidationErrors::new();
        errors
            .required("first_name", &input.first_name)
            .max_len("first_name", Some(&input.first_name), 100)
            .required("last_name", &input.last_name)
            .max_len("last_name", Some(&input.last_name), 100)
            .required("email", &input.email)
            .max_len("email", Some(&input.email), 200)
            .email("email", Some(&input.email))
            .required("phone", &input.phone)
            .max_len("phone", Some(&input.phone), 50)
            .required("subject", &input.subject)
            .max_len("subject", Some(&input.subject), 200)
            .required("message", &input.message);
        errors.into_result().map(|_| input)
    }
}

pub struct MessageService {
    repository: TenantRepository<ContactSubmission>,
    uploads: UploadService,
}

impl MessageService {
    pub fn new(pool: PgPool, kindergarten_id: i32, uploads: UploadService) -> Self {
        Self {
            repository: TenantRepository::new("contact_submissions", pool, kindergarten_id),
            uploads,
        }
    }

    /// Store a public contact form, with its optional attachment.
    pub async fn submit(&self, form: ContentForm) -> ServiceResult<ContactSubmission> {
        let input: ContactInput = serde_json::from_value(Value::Object(form.values.clone()))
            .map_err(|e| ValidationErrors::single("form", e.to_string()))?;
        let input = input.clean()?;

        let mut values = match serde_json::to_value(&input) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        let stored = match form.file() {
            Some(file) => Some(self.uploads.save_attachment(self.repository.kindergarten_id(), file).await?),
            None => None,
        };
        if let Some(path) = &stored {
            values.insert("file_path".to_string(), Value::String(path.clone()));
        }

        match self.repository.insert(COLUMNS, &values).await {
            Ok(submission) => {
                info!(
                    "Contact message {} received for kindergarten {}",
                    submission.id,
                    submission.kindergarten_id
                );
                Ok(submission)
            }
            Err(e) => {
                self.uploads.discard(stored.as_deref()).await;
                Err(e.into())
            }
        }
    }

    /// Newest first.
    pub async fn list(&self) -> ServiceResult<Vec<ContactSubmission>> {
        Ok(self
            .repository
            .select_any(FilterData { order: Some(json!("submitted_at desc, id desc")), ..Default::default() })
            .await?)
    }

    pub async fn recent(&self, limit: i32) -> ServiceResult<Vec<ContactSubmission>> {
        Ok(self
            .repository
            .select_any(FilterData {
                order: Some(json!("submitted_at desc, id desc")),
                limit: Some(limit),
                ..Default::default()
            })
            .await?)
    }

    /// Opening a message marks it read.
    pub async fn open(&self, id: i32) -> ServiceResult<ContactSubmission> {
        let message = self.repository.select_404(id, "Message").await?;
        if message.is_read {
            return Ok(message);
        }
        self.set_read(id, true).await
    }

    pub async fn set_read(&self, id: i32, is_read: bool) -> ServiceResult<ContactSubmission> {
        let mut values = Map::new();
        values.insert("is_read".to_string(), json!(is_read));
        Ok(self.repository.update(id, READ_COLUMNS, &values, "Message").await?)
    }

    pub async fn delete(&self, id: i32) -> ServiceResult<ContactSubmission> {
        let message = self.repository.delete(id, "Message").await?;
        self.uploads.discard(message.file_path.as_deref()).await;
        Ok(message)
    }

    pub async fn unread_count(&self) -> ServiceResult<i64> {
        Ok(self
            .repository
            .count(FilterData { where_clause: Some(json!({ "is_read": false })), ..Default::default() })
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ContactInput {
        ContactInput {
            first_name: "Elif".into(),
            last_name: "Yılmaz".into(),
            email: "elif@example.com".into(),
            phone: "+90 555 000 00 00".into(),
            subject: "Kayıt".into(),
            message: "Merhaba".into(),
        }
    }

    #[test]
    fn all_contact_fields_are_required() {
        let errors = ContactInput::default().clean().unwrap_err().into_fields();
        for field in ["first_name", "last_name", "email", "phone", "subject", "message"] {
            assert_eq!(errors.get(field).map(String::as_str), Some("This field is required"), "{}", field);
        }
    }

    #[test]
    fn contact_email_must_be_valid() {
        let input = ContactInput { email: "elif@".into(), ..complete() };
        assert_eq!(input.clean().unwrap_err().get("email"), Some("Invalid email address"));
    }

    #[test]
    fn complete_contact_is_trimmed() {
        let input = ContactInput { first_name: "  Elif ".into(), ..complete() }.clean().unwrap();
        assert_eq!(input.first_name, "Elif");
    }
}
