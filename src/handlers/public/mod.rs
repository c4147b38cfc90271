// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Security Level: None
// Routes: /auth/* (session acquisition) and the kindergarten site pages,
// which are scoped by the request subdomain instead of a session.

pub mod auth;
pub mod site;
