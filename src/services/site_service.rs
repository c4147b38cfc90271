//! Per-kindergarten singletons (settings, mission/vision, about) and the
//! page models the public site is rendered from.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};

use crate::database::models::{
    AboutUsContent, CoreEducationProgram, GeneralSettings, Kindergarten, MissionVision, ParentTestimonial,
};
use crate::database::{ColumnSpec, TenantRepository};
use crate::services::content_service::{ContentEntity, ContentForm, ContentService};
use crate::services::upload_service::UploadService;
use crate::services::validation::{normalize, ValidationErrors};
use crate::services::ServiceResult;

const SETTINGS_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::text("logo_path"),
    ColumnSpec::text("footer_logo_path"),
    ColumnSpec::text("slogan"),
    ColumnSpec::text("sub_slogan"),
    ColumnSpec::text("hero_background_path"),
    ColumnSpec::text("footer_slogan"),
    ColumnSpec::text("address"),
    ColumnSpec::text("phone"),
    ColumnSpec::text("email"),
    ColumnSpec::text("facebook_url"),
    ColumnSpec::text("twitter_url"),
    ColumnSpec::text("instagram_url"),
    ColumnSpec::text("google_map_embed"),
    ColumnSpec::timestamp("updated_at"),
];

const MISSION_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::text("mission_title"),
    ColumnSpec::text("mission_text"),
    ColumnSpec::text("vision_title"),
    ColumnSpec::text("vision_text"),
    ColumnSpec::timestamp("updated_at"),
];

const ABOUT_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::text("title"),
    ColumnSpec::text("description"),
    ColumnSpec::text("image_path"),
    ColumnSpec::timestamp("updated_at"),
];

/// Multipart field names accepted for each settings image, with the column they fill.
const SETTINGS_IMAGES: &[(&[&str], &str)] = &[
    (&["logo", "logo_path"], "logo_path"),
    (&["footer_logo", "footer_logo_path"], "footer_logo_path"),
    (&["hero_background", "hero_background_path"], "hero_background_path"),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsInput {
    #[serde(default)]
    pub slogan: Option<String>,
    #[serde(default)]
    pub sub_slogan: Option<String>,
    #[serde(default)]
    pub footer_slogan: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub facebook_url: Option<String>,
    #[serde(default)]
    pub twitter_url: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
    #[serde(default)]
    pub google_map_embed: Option<String>,
    #[serde(default)]
    pub mission_title: Option<String>,
    #[serde(default)]
    pub mission_text: Option<String>,
    #[serde(default)]
    pub vision_title: Option<String>,
    #[serde(default)]
    pub vision_text: Option<String>,
}

impl SettingsInput {
    fn clean(self) -> Result<Self, ValidationErrors> {
        let input = Self {
            slogan: normalize(self.slogan),
            sub_slogan: normalize(self.sub_slogan),
            footer_slogan: normalize(self.footer_slogan),
            address: normalize(self.address),
            phone: normalize(self.phone),
            email: normalize(self.email),
            facebook_url: normalize(self.facebook_url),
            twitter_url: normalize(self.twitter_url),
            instagram_url: normalize(self.instagram_url),
            google_map_embed: normalize(self.google_map_embed),
            mission_title: normalize(self.mission_title),
            mission_text: normalize(self.mission_text),
            vision_title: normalize(self.vision_title),
            vision_text: normalize(self.vision_text),
        };

        let mut errors = ValidationErrors::new();
        errors
            .max_len("slogan", input.slogan.as_deref(), 500)
            .max_len("sub_slogan", input.sub_slogan.as_deref(), 500)
            .max_len("footer_slogan", input.footer_slogan.as_deref(), 500)
            .max_len("address", input.address.as_deref(), 500)
            .max_len("phone", input.phone.as_deref(), 50)
            .max_len("email", input.email.as_deref(), 200)
            .email("email", input.email.as_deref())
            .url("facebook_url", input.facebook_url.as_deref())
            .url("twitter_url", input.twitter_url.as_deref())
            .url("instagram_url", input.instagram_url.as_deref())
            .max_len("mission_title", input.mission_title.as_deref(), 200)
            .max_len("vision_title", input.vision_title.as_deref(), 200);
        errors.into_result().map(|_| input)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AboutInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Settings and mission/vision are edited together on one admin screen.
#[derive(Debug, Clone, Serialize)]
pub struct SiteSettings {
    pub settings: GeneralSettings,
    pub mission_vision: MissionVision,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteKindergarten {
    pub id: i32,
    pub name: String,
    pub subdomain: String,
}

/// Layout data every public page carries.
#[derive(Debug, Clone, Serialize)]
pub struct SiteInfo {
    pub kindergarten: SiteKindergarten,
    pub settings: Option<GeneralSettings>,
}

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub site: SiteInfo,
    pub mission_vision: Option<MissionVision>,
    pub programs: Vec<CoreEducationProgram>,
    pub testimonials: Vec<ParentTestimonial>,
}

#[derive(Debug, Serialize)]
pub struct AboutPage {
    pub site: SiteInfo,
    pub about: Option<AboutUsContent>,
    pub mission_vision: Option<MissionVision>,
}

#[derive(Debug, Serialize)]
pub struct ListPage<T> {
    pub site: SiteInfo,
    pub items: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct DetailPage<T> {
    pub site: SiteInfo,
    pub item: T,
}

#[derive(Debug, Serialize)]
pub struct ContactPage {
    pub site: SiteInfo,
}

fn to_map<T: Serialize>(value: T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn parse_form<T: for<'de> Deserialize<'de>>(values: Map<String, Value>) -> Result<T, ValidationErrors> {
    serde_json::from_value(Value::Object(values)).map_err(|e| ValidationErrors::single("form", e.to_string()))
}

pub struct SiteService {
    pool: PgPool,
    kindergarten_id: i32,
    uploads: UploadService,
}

impl SiteService {
    pub fn new(pool: PgPool, kindergarten_id: i32, uploads: UploadService) -> Self {
        Self { pool, kindergarten_id, uploads }
    }

    fn repository<T>(&self, table: &'static str) -> TenantRepository<T>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
    {
        TenantRepository::new(table, self.pool.clone(), self.kindergarten_id)
    }

    /// Fetch the kindergarten's row, inserting an empty one on first access.
    async fn singleton<T>(&self, table: &'static str) -> ServiceResult<T>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
    {
        let query = format!(
            "INSERT INTO \"{}\" (kindergarten_id) VALUES ($1) ON CONFLICT (kindergarten_id) DO NOTHING",
            table
        );
        sqlx::query(&query).bind(self.kindergarten_id).execute(&self.pool).await?;
        let repository = self.repository::<T>(table);
        Ok(repository
            .select_one(Default::default())
            .await?
            .ok_or_else(|| crate::services::ServiceError::NotFound(format!("{} not found", table)))?)
    }

    async fn find_singleton<T>(&self, table: &'static str) -> ServiceResult<Option<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
    {
        Ok(self.repository::<T>(table).select_one(Default::default()).await?)
    }

    pub async fn settings(&self) -> ServiceResult<SiteSettings> {
        Ok(SiteSettings {
            settings: self.singleton("general_settings").await?,
            mission_vision: self.singleton("mission_visions").await?,
        })
    }

    pub async fn find_settings(&self) -> ServiceResult<Option<GeneralSettings>> {
        self.find_singleton("general_settings").await
    }

    pub async fn about(&self) -> ServiceResult<AboutUsContent> {
        self.singleton("about_us_contents").await
    }

    /// Upsert settings and mission/vision. Uploaded logos and the hero
    /// background replace the stored files.
    pub async fn update_settings(&self, form: ContentForm) -> ServiceResult<SiteSettings> {
        let input = parse_form::<SettingsInput>(form.values.clone())?.clean()?;
        let current = self.settings().await?;
        let now = json!(Utc::now().to_rfc3339());

        let mut settings_values = to_map(&input);
        settings_values.insert("updated_at".to_string(), now.clone());
        let mut mission_values = settings_values.clone();

        let mut replaced = Vec::new();
        for (fields, column) in SETTINGS_IMAGES {
            let Some(file) = form.files.iter().find(|f| !f.is_empty() && fields.contains(&f.field.as_str())) else {
                continue;
            };
            let path = self.uploads.save_image(self.kindergarten_id, "settings", file).await?;
            settings_values.insert(column.to_string(), Value::String(path));
            replaced.push(*column);
        }
        for column in ["logo_path", "footer_logo_path", "hero_background_path"] {
            if !replaced.contains(&column) {
                settings_values.remove(column);
            }
        }
        mission_values.retain(|k, _| MISSION_COLUMNS.iter().any(|c| c.name == k));

        let settings: GeneralSettings = self
            .repository("general_settings")
            .update(current.settings.id, SETTINGS_COLUMNS, &settings_values, "Settings")
            .await?;
        let mission_vision: MissionVision = self
            .repository("mission_visions")
            .update(current.mission_vision.id, MISSION_COLUMNS, &mission_values, "Mission and vision")
            .await?;

        let old = &current.settings;
        for (column, previous) in [
            ("logo_path", &old.logo_path),
            ("footer_logo_path", &old.footer_logo_path),
            ("hero_background_path", &old.hero_background_path),
        ] {
            if replaced.contains(&column) {
                self.uploads.discard(previous.as_deref()).await;
            }
        }

        Ok(SiteSettings { settings, mission_vision })
    }

    pub async fn update_about(&self, form: ContentForm) -> ServiceResult<AboutUsContent> {
        let input: AboutInput = parse_form(form.values.clone())?;
        let input = AboutInput { title: normalize(input.title), description: normalize(input.description) };
        let mut errors = ValidationErrors::new();
        errors.max_len("title", input.title.as_deref(), 500);
        errors.into_result()?;

        let current = self.about().await?;
        let mut values = to_map(&input);
        values.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let stored = match form.file() {
            Some(file) => Some(self.uploads.save_image(self.kindergarten_id, "about", file).await?),
            None => None,
        };
        if let Some(path) = &stored {
            values.insert("image_path".to_string(), Value::String(path.clone()));
        }

        let about: AboutUsContent = self
            .repository("about_us_contents")
            .update(current.id, ABOUT_COLUMNS, &values, "About content")
            .await?;
        if stored.is_some() {
            self.uploads.discard(current.image_path.as_deref()).await;
        }
        Ok(about)
    }

    fn content<E: ContentEntity>(&self) -> ContentService<E> {
        ContentService::new(self.pool.clone(), self.kindergarten_id, self.uploads.clone())
    }

    pub async fn site(&self, kindergarten: &Kindergarten) -> ServiceResult<SiteInfo> {
        Ok(SiteInfo {
            kindergarten: SiteKindergarten {
                id: kindergarten.id,
                name: kindergarten.name.clone(),
                subdomain: kindergarten.subdomain.clone(),
            },
            settings: self.find_settings().await?,
        })
    }

    pub async fn home_page(&self, kindergarten: &Kindergarten) -> ServiceResult<HomePage> {
        let programs_service = self.content::<CoreEducationProgram>();
        let testimonials_service = self.content::<ParentTestimonial>();
        let (site, mission_vision, programs, testimonials) = futures::try_join!(
            self.site(kindergarten),
            self.find_singleton::<MissionVision>("mission_visions"),
            programs_service.list_active(None),
            testimonials_service.list_active(Some(6)),
        )?;
        Ok(HomePage { site, mission_vision, programs, testimonials })
    }

    pub async fn about_page(&self, kindergarten: &Kindergarten) -> ServiceResult<AboutPage> {
        let (site, about, mission_vision) = futures::try_join!(
            self.site(kindergarten),
            self.find_singleton::<AboutUsContent>("about_us_contents"),
            self.find_singleton::<MissionVision>("mission_visions"),
        )?;
        Ok(AboutPage { site, about, mission_vision })
    }

    pub async fn list_page<E: ContentEntity>(&self, kindergarten: &Kindergarten) -> ServiceResult<ListPage<E>> {
        let content = self.content::<E>();
        let (site, items) = futures::try_join!(self.site(kindergarten), content.list_active(None))?;
        Ok(ListPage { site, items })
    }

    pub async fn detail_page<E: ContentEntity>(&self, kindergarten: &Kindergarten, id: i32) -> ServiceResult<DetailPage<E>> {
        let item = self.content::<E>().get_active(id).await?;
        Ok(DetailPage { site: self.site(kindergarten).await?, item })
    }

    pub async fn contact_page(&self, kindergarten: &Kindergarten) -> ServiceResult<ContactPage> {
        Ok(ContactPage { site: self.site(kindergarten).await? })
    }
}
