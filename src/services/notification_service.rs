//! WhatsApp notifications for new contact messages and announcements.
//!
//! Delivery is best effort: it runs on a background task and failures are
//! only logged, so a slow or broken messaging API never fails a request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config;
use crate::database::models::{ContactSubmission, GeneralSettings};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("No recipient phone number configured")]
    MissingRecipient,

    #[error("Messaging API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Messaging API responded with status {0}")]
    Rejected(reqwest::StatusCode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Accepted by the messaging API.
    Sent,
    /// No API configured; a click-to-chat link was produced instead.
    Link(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, phone: &str, message: &str) -> Result<Delivery, NotifyError>;
}

/// Strip `+` and spaces, the form both the API and wa.me links expect.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| *c != '+' && !c.is_whitespace()).collect()
}

pub fn click_to_chat_link(phone: &str, message: &str) -> String {
    let text: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
    format!("https://wa.me/{}?text={}", normalize_phone(phone), text.replace('+', "%20"))
}

pub struct WhatsAppNotifier {
    client: reqwest::Client,
    api_url: Option<String>,
    api_token: Option<String>,
}

impl WhatsAppNotifier {
    pub fn new(api_url: Option<String>, api_token: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_url: api_url.filter(|v| !v.is_empty()),
            api_token: api_token.filter(|v| !v.is_empty()),
        }
    }

    pub fn from_config() -> Self {
        let settings = &config::config().notifications;
        Self::new(
            settings.whatsapp_api_url.clone(),
            settings.whatsapp_api_token.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    async fn send(&self, phone: &str, message: &str) -> Result<Delivery, NotifyError> {
        let phone = normalize_phone(phone);
        if phone.is_empty() {
            return Err(NotifyError::MissingRecipient);
        }

        let (Some(api_url), Some(api_token)) = (&self.api_url, &self.api_token) else {
            return Ok(Delivery::Link(click_to_chat_link(&phone, message)));
        };

        let response = self
            .client
            .post(api_url)
            .bearer_auth(api_token)
            .json(&json!({ "phone": phone, "message": message }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(Delivery::Sent)
        } else {
            Err(NotifyError::Rejected(response.status()))
        }
    }
}

pub fn contact_message(submission: &ContactSubmission) -> String {
    format!(
        "*New contact form message*\n\n\
         *Name:* {}\n\
         *Email:* {}\n\
         *Phone:* {}\n\
         *Subject:* {}\n\
         *Message:* {}\n\
         *Date:* {}",
        submission.sender_name(),
        submission.email,
        submission.phone,
        submission.subject,
        submission.message,
        format_date(submission.submitted_at),
    )
}

pub fn announcement_message(title: &str, content: &str, published_at: DateTime<Utc>) -> String {
    format!(
        "*New announcement published*\n\n*Title:* {}\n*Content:* {}\n*Date:* {}",
        title,
        content,
        format_date(published_at)
    )
}

fn format_date(at: DateTime<Utc>) -> String {
    at.format("%d.%m.%Y %H:%M").to_string()
}

#[derive(Clone)]
pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
    enabled: bool,
    extra_email: Option<String>,
}

impl NotificationService {
    pub fn new(notifier: Arc<dyn Notifier>, enabled: bool, extra_email: Option<String>) -> Self {
        Self { notifier, enabled, extra_email }
    }

    pub fn from_config() -> Self {
        let settings = &config::config().notifications;
        Self::new(
            Arc::new(WhatsAppNotifier::from_config()),
            settings.enabled,
            settings.extra_email.clone(),
        )
    }

    /// `settings.email` plus the configured extra address.
    pub fn email_recipients(&self, settings: Option<&GeneralSettings>) -> Vec<String> {
        settings
            .and_then(|s| s.email.clone())
            .into_iter()
            .chain(self.extra_email.clone())
            .filter(|e| !e.trim().is_empty())
            .collect()
    }

    pub async fn notify_contact(&self, submission: &ContactSubmission, settings: Option<&GeneralSettings>) {
        if !self.enabled {
            return;
        }
        let recipients = self.email_recipients(settings);
        if !recipients.is_empty() {
            info!(
                "Contact message {} from {} for email recipients: {}",
                submission.id,
                submission.sender_name(),
                recipients.join(", ")
            );
        }
        let phone = settings.and_then(|s| s.phone.as_deref()).unwrap_or_default();
        self.deliver(phone, &contact_message(submission)).await;
    }

    pub async fn notify_announcement(&self, title: &str, content: &str, settings: Option<&GeneralSettings>) {
        if !self.enabled {
            return;
        }
        let phone = settings.and_then(|s| s.phone.as_deref()).unwrap_or_default();
        self.deliver(phone, &announcement_message(title, content, Utc::now())).await;
    }

    async fn deliver(&self, phone: &str, message: &str) {
        match self.notifier.send(phone, message).await {
            Ok(Delivery::Sent) => debug!("WhatsApp notification sent to {}", normalize_phone(phone)),
            Ok(Delivery::Link(link)) => info!("WhatsApp API not configured, send manually: {}", link),
            Err(NotifyError::MissingRecipient) => debug!("Skipping WhatsApp notification: no phone number"),
            Err(e) => warn!("WhatsApp notification failed: {}", e),
        }
    }

    /// Run `notify_contact` on a background task.
    pub fn spawn_contact(&self, submission: ContactSubmission, settings: Option<GeneralSettings>) {
        let service = self.clone();
        tokio::spawn(async move {
            service.notify_contact(&submission, settings.as_ref()).await;
        });
    }

    pub fn spawn_announcement(&self, title: String, content: String, settings: Option<GeneralSettings>) {
        let service = self.clone();
        tokio::spawn(async move {
            service.notify_announcement(&title, &content, settings.as_ref()).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Notifier for Recorder {
        async fn send(&self, phone: &str, message: &str) -> Result<Delivery, NotifyError> {
            self.sent.lock().unwrap().push((phone.to_string(), message.to_string()));
            Ok(Delivery::Sent)
        }
    }

    fn settings(phone: Option<&str>, email: Option<&str>) -> GeneralSettings {
        GeneralSettings {
            id: 1,
            kindergarten_id: 1,
            logo_path: None,
            footer_logo_path: None,
            slogan: None,
            sub_slogan: None,
            hero_background_path: None,
            footer_slogan: None,
            address: None,
            phone: phone.map(str::to_string),
            email: email.map(str::to_string),
            facebook_url: None,
            twitter_url: None,
            instagram_url: None,
            google_map_embed: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn normalizes_phone_numbers() {
        assert_eq!(normalize_phone("+90 555 123 45 67"), "905551234567");
    }

    #[test]
    fn builds_click_to_chat_link() {
        let link = click_to_chat_link("+90 555", "Hello there & welcome");
        assert_eq!(link, "https://wa.me/90555?text=Hello%20there%20%26%20welcome");
    }

    #[tokio::test]
    async fn without_api_falls_back_to_link() {
        let notifier = WhatsAppNotifier::new(None, None, Duration::from_secs(1));
        let delivery = notifier.send("+90 555", "hi").await.unwrap();
        assert_eq!(delivery, Delivery::Link("https://wa.me/90555?text=hi".to_string()));
        assert!(matches!(notifier.send(" ", "hi").await, Err(NotifyError::MissingRecipient)));
    }

    #[tokio::test]
    async fn announcement_goes_to_kindergarten_phone() {
        let recorder = Arc::new(Recorder::default());
        let service = NotificationService::new(recorder.clone(), true, None);
        service
            .notify_announcement("Picnic", "Friday at the park", Some(&settings(Some("+90 555"), None)))
            .await;
        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "+90 555");
        assert!(sent[0].1.contains("*Title:* Picnic"));
    }

    #[tokio::test]
    async fn disabled_service_sends_nothing() {
        let recorder = Arc::new(Recorder::default());
        let service = NotificationService::new(recorder.clone(), false, None);
        service.notify_announcement("Picnic", "", Some(&settings(Some("555"), None))).await;
        assert!(recorder.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn email_recipients_include_extra_address() {
        let service = NotificationService::new(Arc::new(Recorder::default()), true, Some("ops@kres.com".into()));
        let recipients = service.email_recipients(Some(&settings(None, Some("info@ornek.com"))));
        assert_eq!(recipients, vec!["info@ornek.com".to_string(), "ops@kres.com".to_string()]);
    }
}
