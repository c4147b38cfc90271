// handlers/protected/mod.rs - Protected handlers (session required)
//
// Security Level: JWT session (bearer header or cookie)
// Route Prefix: /api/auth/* and /api/admin/*
// Middleware: jwt_auth -> validate_user -> require_roles -> validate_tenant
//
// Kindergarten admins and teachers act on their own kindergarten. A
// SuperAdmin selects one with the X-Kindergarten-Id header.

pub mod admin;
pub mod auth;
