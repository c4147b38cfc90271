// handlers/public/site/mod.rs - Public kindergarten website
//
// Every route here runs behind `resolve_site_tenant`, which maps the host
// subdomain to an active kindergarten. Responses are JSON page models that
// carry the `site` layout block alongside the page content.

pub mod contact;
pub mod pages;

pub use contact::{contact_get, contact_post};
pub use pages::{about, announcement_detail, announcements, event_detail, events, gallery, home, staff};
