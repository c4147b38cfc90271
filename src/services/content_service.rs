//! Tenant-scoped CRUD shared by every list-style content type.
//!
//! Each content table implements [`ContentEntity`], declaring its editable
//! columns, list order, optional image slot and input validation. The
//! generic [`ContentService`] does the rest through a [`TenantRepository`],
//! so every statement carries the kindergarten predicate.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use crate::database::mutation::{coerce_form_value, ColumnSpec};
use crate::database::TenantRepository;
use crate::filter::FilterData;
use crate::services::upload_service::{UploadService, UploadedFile};
use crate::services::validation::ValidationErrors;
use crate::services::ServiceResult;

/// Where an entity keeps its uploaded image.
#[derive(Debug, Clone, Copy)]
pub struct ImageSlot {
    pub column: &'static str,
    pub folder: &'static str,
    pub required: bool,
}

pub trait ContentEntity: for<'r> FromRow<'r, PgRow> + Serialize + Send + Sync + Unpin + 'static {
    const TABLE: &'static str;
    /// Singular, human readable; used in "not found" messages.
    const LABEL: &'static str;
    /// Columns the admin API may write. Never includes `id` or `kindergarten_id`.
    const COLUMNS: &'static [ColumnSpec];
    /// ORDER BY for admin and public lists.
    const ORDER: &'static str;
    /// New rows are appended after the current highest `display_order`.
    const APPENDS: bool = false;
    const IMAGE: Option<ImageSlot> = None;

    type Input: DeserializeOwned + Serialize + Send;

    /// Validate and normalize an input before it is written.
    fn clean(input: Self::Input) -> Result<Self::Input, ValidationErrors>;

    fn id(&self) -> i32;

    fn image_path(&self) -> Option<&str> {
        None
    }

    /// Title and body of the notification announced after creation, if any.
    fn notification(&self) -> Option<(String, String)> {
        None
    }
}

/// Decoded request body: form or JSON values plus any uploaded files.
#[derive(Debug, Default, Clone)]
pub struct ContentForm {
    pub values: Map<String, Value>,
    pub files: Vec<UploadedFile>,
}

impl ContentForm {
    pub fn from_json(values: Map<String, Value>) -> Self {
        Self { values, files: vec![] }
    }

    /// First non-empty uploaded file.
    pub fn file(&self) -> Option<&UploadedFile> {
        self.files.iter().find(|f| !f.is_empty())
    }
}

/// Turn string values into the JSON type of their column.
fn coerce(columns: &[ColumnSpec], values: &mut Map<String, Value>) {
    for column in columns {
        if let Some(Value::String(raw)) = values.get(column.name) {
            let coerced = coerce_form_value(column.sql_type, raw);
            values.insert(column.name.to_string(), coerced);
        }
    }
}

/// Coerce, deserialize, validate and re-serialize the writable values.
pub fn prepare_input<E: ContentEntity>(mut values: Map<String, Value>) -> Result<Map<String, Value>, ValidationErrors> {
    coerce(E::COLUMNS, &mut values);
    let input: E::Input = serde_json::from_value(Value::Object(values))
        .map_err(|e| ValidationErrors::single("form", e.to_string()))?;
    let cleaned = E::clean(input)?;
    match serde_json::to_value(cleaned) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) | Err(_) => Err(ValidationErrors::single("form", "Unexpected form structure")),
    }
}

pub struct ContentService<E> {
    repository: TenantRepository<E>,
    uploads: UploadService,
}

impl<E: ContentEntity> ContentService<E> {
    pub fn new(pool: PgPool, kindergarten_id: i32, uploads: UploadService) -> Self {
        Self {
            repository: TenantRepository::new(E::TABLE, pool, kindergarten_id),
            uploads,
        }
    }

    pub fn kindergarten_id(&self) -> i32 {
        self.repository.kindergarten_id()
    }

    /// Every record of the kindergarten, inactive ones included.
    pub async fn list(&self) -> ServiceResult<Vec<E>> {
        Ok(self
            .repository
            .select_any(FilterData { order: Some(json!(E::ORDER)), ..Default::default() })
            .await?)
    }

    pub async fn list_recent(&self, limit: i32) -> ServiceResult<Vec<E>> {
        Ok(self
            .repository
            .select_any(FilterData { order: Some(json!(E::ORDER)), limit: Some(limit), ..Default::default() })
            .await?)
    }

    pub async fn list_active(&self, limit: Option<i32>) -> ServiceResult<Vec<E>> {
        Ok(self
            .repository
            .select_any(FilterData {
                where_clause: Some(json!({ "is_active": true })),
                order: Some(json!(E::ORDER)),
                limit,
                ..Default::default()
            })
            .await?)
    }

    pub async fn get(&self, id: i32) -> ServiceResult<E> {
        Ok(self.repository.select_404(id, E::LABEL).await?)
    }

    /// Public detail pages: inactive records read as missing.
    pub async fn get_active(&self, id: i32) -> ServiceResult<E> {
        let record = self
            .repository
            .select_one(FilterData {
                where_clause: Some(json!({ "id": id, "is_active": true })),
                ..Default::default()
            })
            .await?;
        record.ok_or_else(|| crate::services::ServiceError::NotFound(format!("{} not found", E::LABEL)))
    }

    pub async fn count(&self, where_clause: Option<Value>) -> ServiceResult<i64> {
        Ok(self.repository.count(FilterData { where_clause, ..Default::default() }).await?)
    }

    async fn store_image(&self, form: &ContentForm, values: &mut Map<String, Value>) -> ServiceResult<Option<String>> {
        let Some(slot) = E::IMAGE else {
            return Ok(None);
        };
        values.remove(slot.column);
        let Some(file) = form.file() else {
            return Ok(None);
        };
        let path = self.uploads.save_image(self.kindergarten_id(), slot.folder, file).await?;
        values.insert(slot.column.to_string(), Value::String(path.clone()));
        Ok(Some(path))
    }

    pub async fn create(&self, form: ContentForm) -> ServiceResult<E> {
        let mut values = prepare_input::<E>(form.values.clone())?;

        if let Some(slot) = E::IMAGE.filter(|s| s.required) {
            if form.file().is_none() {
                return Err(ValidationErrors::single(slot.column, "An image file is required").into());
            }
        }

        if E::APPENDS && !values.get("display_order").is_some_and(Value::is_i64) {
            let next = self.repository.max_display_order().await? + 1;
            values.insert("display_order".to_string(), json!(next));
        }

        let stored = self.store_image(&form, &mut values).await?;
        match self.repository.insert(E::COLUMNS, &values).await {
            Ok(record) => {
                debug!("Created {} {} for kindergarten {}", E::LABEL, record.id(), self.kindergarten_id());
                Ok(record)
            }
            Err(e) => {
                self.uploads.discard(stored.as_deref()).await;
                Err(e.into())
            }
        }
    }

    /// Replace the editable fields. A new upload replaces (and deletes) the old image.
    pub async fn update(&self, id: i32, form: ContentForm) -> ServiceResult<E> {
        let existing = self.get(id).await?;
        let mut values = prepare_input::<E>(form.values.clone())?;

        if E::APPENDS && !values.get("display_order").is_some_and(Value::is_i64) {
            values.remove("display_order");
        }

        let stored = self.store_image(&form, &mut values).await?;
        match self.repository.update(id, E::COLUMNS, &values, E::LABEL).await {
            Ok(record) => {
                if stored.is_some() {
                    self.uploads.discard(existing.image_path()).await;
                }
                Ok(record)
            }
            Err(e) => {
                self.uploads.discard(stored.as_deref()).await;
                Err(e.into())
            }
        }
    }

    pub async fn delete(&self, id: i32) -> ServiceResult<E> {
        let record = self.repository.delete(id, E::LABEL).await?;
        self.uploads.discard(record.image_path()).await;
        debug!("Deleted {} {} for kindergarten {}", E::LABEL, id, self.kindergarten_id());
        Ok(record)
    }

    /// Set `display_order` on one record. False when the record is not in this kindergarten.
    pub async fn update_order(&self, id: i32, display_order: i32) -> ServiceResult<bool> {
        let mut values = Map::new();
        values.insert("display_order".to_string(), json!(display_order));
        match self
            .repository
            .update(id, &[ColumnSpec::integer("display_order")], &values, E::LABEL)
            .await
        {
            Ok(_) => Ok(true),
            Err(crate::database::DatabaseError::NotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn uploads(&self) -> &UploadService {
        &self.uploads
    }

    pub(crate) fn repository(&self) -> &TenantRepository<E> {
        &self.repository
    }
}
