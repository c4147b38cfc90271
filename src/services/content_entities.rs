//! Column lists, ordering and input rules for each content type.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::PgConnection;
use tracing::{info, warn};

use crate::database::models::{Announcement, CoreEducationProgram, Event, GalleryImage, ParentTestimonial, Staff};
use crate::database::ColumnSpec;
use crate::services::content_service::{ContentEntity, ContentService, ImageSlot};
use crate::services::upload_service::{validate, UploadError, UploadKind, UploadedFile};
use crate::services::validation::{normalize, ValidationErrors};
use crate::services::{ServiceError, ServiceResult};

fn default_true() -> bool {
    true
}

/// Accept RFC 3339, `YYYY-MM-DDTHH:MM`, `YYYY-MM-DD HH:MM[:SS]` or a bare date.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramInput {
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ContentEntity for CoreEducationProgram {
    const TABLE: &'static str = "core_education_programs";
    const LABEL: &'static str = "Program";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::text("icon"),
        ColumnSpec::text("title"),
        ColumnSpec::text("description"),
        ColumnSpec::integer("display_order"),
        ColumnSpec::boolean("is_active"),
    ];
    const ORDER: &'static str = "display_order asc, id asc";
    const APPENDS: bool = true;

    type Input = ProgramInput;

    fn clean(input: ProgramInput) -> Result<ProgramInput, ValidationErrors> {
        let input = ProgramInput {
            icon: normalize(input.icon),
            title: input.title.trim().to_string(),
            description: normalize(input.description),
            ..input
        };
        let mut errors = ValidationErrors::new();
        errors
            .required("title", &input.title)
            .max_len("title", Some(&input.title), 200)
            .max_len("icon", input.icon.as_deref(), 100);
        errors.into_result().map(|_| input)
    }

    fn id(&self) -> i32 {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestimonialInput {
    #[serde(default)]
    pub parent_name: String,
    #[serde(default = "default_rating")]
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_rating() -> i32 {
    5
}

impl ContentEntity for ParentTestimonial {
    const TABLE: &'static str = "parent_testimonials";
    const LABEL: &'static str = "Testimonial";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::text("parent_name"),
        ColumnSpec::text("parent_photo"),
        ColumnSpec::integer("rating"),
        ColumnSpec::text("comment"),
        ColumnSpec::boolean("is_active"),
    ];
    const ORDER: &'static str = "created_at desc, id desc";
    const IMAGE: Option<ImageSlot> = Some(ImageSlot { column: "parent_photo", folder: "testimonials", required: false });

    type Input = TestimonialInput;

    fn clean(input: TestimonialInput) -> Result<TestimonialInput, ValidationErrors> {
        let input = TestimonialInput {
            parent_name: input.parent_name.trim().to_string(),
            comment: normalize(input.comment),
            ..input
        };
        let mut errors = ValidationErrors::new();
        errors
            .required("parent_name", &input.parent_name)
            .max_len("parent_name", Some(&input.parent_name), 200)
            .range("rating", input.rating, 1, 5);
        errors.into_result().map(|_| input)
    }

    fn id(&self) -> i32 {
        self.id
    }

    fn image_path(&self) -> Option<&str> {
        self.parent_photo.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub detailed_description: Option<String>,
    /// Any format accepted by [`parse_datetime`]; stored as RFC 3339.
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub event_schedule: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ContentEntity for Event {
    const TABLE: &'static str = "events";
    const LABEL: &'static str = "Event";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::text("title"),
        ColumnSpec::text("short_description"),
        ColumnSpec::text("detailed_description"),
        ColumnSpec::text("image_path"),
        ColumnSpec::timestamp("event_date"),
        ColumnSpec::text("event_time"),
        ColumnSpec::text("location"),
        ColumnSpec::text("event_schedule"),
        ColumnSpec::boolean("is_active"),
    ];
    const ORDER: &'static str = "event_date desc, id desc";
    const IMAGE: Option<ImageSlot> = Some(ImageSlot { column: "image_path", folder: "events", required: false });

    type Input = EventInput;

    fn clean(input: EventInput) -> Result<EventInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let event_date = normalize(input.event_date);
        let parsed = event_date.as_deref().and_then(parse_datetime);
        match (&event_date, parsed) {
            (None, _) => errors.add("event_date", "This field is required"),
            (Some(_), None) => errors.add("event_date", "Invalid date"),
            _ => {}
        }

        let input = EventInput {
            title: input.title.trim().to_string(),
            short_description: normalize(input.short_description),
            detailed_description: normalize(input.detailed_description),
            event_date: parsed.map(|at| at.to_rfc3339()),
            event_time: normalize(input.event_time),
            location: normalize(input.location),
            event_schedule: normalize(input.event_schedule),
            is_active: input.is_active,
        };
        errors
            .required("title", &input.title)
            .max_len("title", Some(&input.title), 300)
            .max_len("short_description", input.short_description.as_deref(), 500)
            .max_len("event_time", input.event_time.as_deref(), 50)
            .max_len("location", input.location.as_deref(), 300);
        errors.into_result().map(|_| input)
    }

    fn id(&self) -> i32 {
        self.id
    }

    fn image_path(&self) -> Option<&str> {
        self.image_path.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffInput {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ContentEntity for Staff {
    const TABLE: &'static str = "staff_members";
    const LABEL: &'static str = "Staff member";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::text("full_name"),
        ColumnSpec::text("title"),
        ColumnSpec::text("branch"),
        ColumnSpec::text("biography"),
        ColumnSpec::text("photo_path"),
        ColumnSpec::integer("display_order"),
        ColumnSpec::boolean("is_active"),
    ];
    const ORDER: &'static str = "display_order asc, id asc";
    const APPENDS: bool = true;
    const IMAGE: Option<ImageSlot> = Some(ImageSlot { column: "photo_path", folder: "staff", required: false });

    type Input = StaffInput;

    fn clean(input: StaffInput) -> Result<StaffInput, ValidationErrors> {
        let input = StaffInput {
            full_name: input.full_name.trim().to_string(),
            title: normalize(input.title),
            branch: normalize(input.branch),
            biography: normalize(input.biography),
            ..input
        };
        let mut errors = ValidationErrors::new();
        errors
            .required("full_name", &input.full_name)
            .max_len("full_name", Some(&input.full_name), 200)
            .max_len("title", input.title.as_deref(), 200)
            .max_len("branch", input.branch.as_deref(), 200);
        errors.into_result().map(|_| input)
    }

    fn id(&self) -> i32 {
        self.id
    }

    fn image_path(&self) -> Option<&str> {
        self.photo_path.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to now on create; left unchanged on update when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announcement_date: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ContentEntity for Announcement {
    const TABLE: &'static str = "announcements";
    const LABEL: &'static str = "Announcement";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::text("title"),
        ColumnSpec::text("description"),
        ColumnSpec::timestamp("announcement_date"),
        ColumnSpec::boolean("is_active"),
    ];
    const ORDER: &'static str = "announcement_date desc, id desc";

    type Input = AnnouncementInput;

    fn clean(input: AnnouncementInput) -> Result<AnnouncementInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let announcement_date = match normalize(input.announcement_date) {
            Some(raw) => match parse_datetime(&raw) {
                Some(at) => Some(at.to_rfc3339()),
                None => {
                    errors.add("announcement_date", "Invalid date");
                    None
                }
            },
            None => None,
        };

        let input = AnnouncementInput {
            title: input.title.trim().to_string(),
            description: normalize(input.description),
            announcement_date,
            is_active: input.is_active,
        };
        errors
            .required("title", &input.title)
            .max_len("title", Some(&input.title), 300);
        errors.into_result().map(|_| input)
    }

    fn id(&self) -> i32 {
        self.id
    }

    fn notification(&self) -> Option<(String, String)> {
        Some((self.title.clone(), self.description.clone().unwrap_or_default()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ContentEntity for GalleryImage {
    const TABLE: &'static str = "gallery_images";
    const LABEL: &'static str = "Gallery image";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::text("image_path"),
        ColumnSpec::text("title"),
        ColumnSpec::integer("display_order"),
        ColumnSpec::boolean("is_active"),
    ];
    const ORDER: &'static str = "display_order asc, id asc";
    const APPENDS: bool = true;
    const IMAGE: Option<ImageSlot> = Some(ImageSlot { column: "image_path", folder: "gallery", required: true });

    type Input = GalleryInput;

    fn clean(input: GalleryInput) -> Result<GalleryInput, ValidationErrors> {
        let input = GalleryInput { title: normalize(input.title), ..input };
        let mut errors = ValidationErrors::new();
        errors.max_len("title", input.title.as_deref(), 200);
        errors.into_result().map(|_| input)
    }

    fn id(&self) -> i32 {
        self.id
    }

    fn image_path(&self) -> Option<&str> {
        Some(&self.image_path)
    }
}

/// One image of a bulk upload, validated and numbered before anything is written.
#[derive(Debug)]
pub(crate) struct BulkImage<'a> {
    pub file: &'a UploadedFile,
    pub title: Option<String>,
    pub display_order: i32,
}

/// Validate every non-empty file up front, then title each after its file
/// name and number them consecutively from `first_order`.
pub(crate) fn plan_bulk_upload(files: &[UploadedFile], first_order: i32) -> Result<Vec<BulkImage<'_>>, UploadError> {
    let files: Vec<&UploadedFile> = files.iter().filter(|f| !f.is_empty()).collect();
    for file in &files {
        validate(file, UploadKind::Image)?;
    }

    Ok(files
        .into_iter()
        .zip(first_order..)
        .map(|(file, display_order)| {
            let title = file.stem();
            BulkImage { file, title: (!title.is_empty()).then_some(title), display_order }
        })
        .collect())
}

impl ContentService<GalleryImage> {
    /// One active image per non-empty file, appended in upload order.
    ///
    /// All or nothing: a file that fails validation rejects the whole batch
    /// before anything is stored, and rows are inserted in one transaction
    /// whose failure also removes the files already written.
    pub async fn bulk_upload(&self, files: &[UploadedFile]) -> ServiceResult<usize> {
        let first_order = self.repository().max_display_order().await? + 1;
        let plan = plan_bulk_upload(files, first_order)?;

        let mut tx = self.repository().begin().await?;
        let mut written = Vec::with_capacity(plan.len());

        let outcome = match self.insert_bulk(&mut tx, &plan, &mut written).await {
            Ok(()) => tx.commit().await.map_err(ServiceError::from),
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!("Rollback of gallery upload failed: {}", rollback);
                }
                Err(e)
            }
        };

        if let Err(e) = outcome {
            for path in &written {
                self.uploads().discard(Some(path)).await;
            }
            return Err(e);
        }

        info!("Bulk uploaded {} gallery images for kindergarten {}", plan.len(), self.kindergarten_id());
        Ok(plan.len())
    }

    async fn insert_bulk(
        &self,
        conn: &mut PgConnection,
        plan: &[BulkImage<'_>],
        written: &mut Vec<String>,
    ) -> ServiceResult<()> {
        for image in plan {
            let path = self.uploads().save_image(self.kindergarten_id(), "gallery", image.file).await?;
            written.push(path.clone());

            let mut values = Map::new();
            values.insert("image_path".to_string(), Value::String(path));
            values.insert("title".to_string(), image.title.clone().map_or(Value::Null, Value::String));
            values.insert("display_order".to_string(), json!(image.display_order));
            values.insert("is_active".to_string(), Value::Bool(true));
            self.repository().insert_on(conn, GalleryImage::COLUMNS, &values).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::content_service::prepare_input;

    fn form(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn parses_common_date_formats() {
        assert!(parse_datetime("2024-05-01").is_some());
        assert!(parse_datetime("2024-05-01T14:30").is_some());
        assert!(parse_datetime("2024-05-01 14:30:00").is_some());
        assert!(parse_datetime("2024-05-01T14:30:00+03:00").is_some());
        assert!(parse_datetime("01/05/2024").is_none());
    }

    #[test]
    fn event_requires_title_and_date() {
        let errors = prepare_input::<Event>(form(json!({ "title": " " }))).unwrap_err();
        assert_eq!(errors.get("title"), Some("This field is required"));
        assert_eq!(errors.get("event_date"), Some("This field is required"));
    }

    #[test]
    fn event_date_is_normalized() {
        let values = prepare_input::<Event>(form(json!({ "title": "Picnic", "event_date": "2024-05-01" }))).unwrap();
        assert_eq!(values["event_date"], "2024-05-01T00:00:00+00:00");
        assert_eq!(values["is_active"], true);
    }

    #[test]
    fn multipart_strings_are_coerced_by_column_type() {
        let values = prepare_input::<ParentTestimonial>(form(json!({
            "parent_name": "Zeynep",
            "rating": "4",
            "is_active": "on",
            "comment": ""
        })))
        .unwrap();
        assert_eq!(values["rating"], 4);
        assert_eq!(values["is_active"], true);
        assert_eq!(values["comment"], Value::Null);
    }

    #[test]
    fn testimonial_rating_must_be_in_range() {
        let errors = prepare_input::<ParentTestimonial>(form(json!({ "parent_name": "Ali", "rating": 9 }))).unwrap_err();
        assert_eq!(errors.get("rating"), Some("Must be between 1 and 5"));
    }

    #[test]
    fn non_numeric_rating_is_a_form_error() {
        let errors = prepare_input::<ParentTestimonial>(form(json!({ "parent_name": "Ali", "rating": "five" }))).unwrap_err();
        assert!(errors.get("form").is_some());
    }

    #[test]
    fn image_columns_cannot_be_set_from_input() {
        let values = prepare_input::<Staff>(form(json!({ "full_name": "Ayşe", "photo_path": "/etc/passwd" }))).unwrap();
        assert!(values.get("photo_path").is_none());
        assert!(values.get("display_order").is_none());
    }

    #[test]
    fn announcement_date_is_optional() {
        let values = prepare_input::<Announcement>(form(json!({ "title": "Holiday" }))).unwrap();
        assert!(values.get("announcement_date").is_none());
    }

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn upload(name: &str, mime: &str, bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            field: "images".to_string(),
            file_name: name.to_string(),
            content_type: Some(mime.to_string()),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn bulk_upload_numbers_images_consecutively() {
        let files = vec![
            upload("bahar-senligi.png", "image/png", PNG),
            upload("", "application/octet-stream", b""),
            upload("piknik.png", "image/png", PNG),
        ];
        let plan = plan_bulk_upload(&files, 4).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].display_order, 4);
        assert_eq!(plan[0].title.as_deref(), Some("bahar-senligi"));
        assert_eq!(plan[1].display_order, 5);
        assert_eq!(plan[1].title.as_deref(), Some("piknik"));
    }

    #[test]
    fn one_bad_file_rejects_the_whole_batch() {
        let files = vec![
            upload("a.png", "image/png", PNG),
            upload("b.png", "image/png", PNG),
            upload("c.svg", "image/svg+xml", b"<svg/>"),
        ];
        let err = plan_bulk_upload(&files, 1).unwrap_err();
        assert!(matches!(err, UploadError::ExtensionNotAllowed(ext) if ext == "svg"));
    }
}
