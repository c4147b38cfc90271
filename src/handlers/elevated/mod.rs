// handlers/elevated/mod.rs - Elevated handlers (SuperAdmin only)
//
// System console spanning all kindergartens.
//
// Security Level: JWT session with the SuperAdmin role
// Route Prefix: /api/root/*
// Middleware: jwt_auth -> validate_user -> require_roles(ROOT)

pub mod root;
