// handlers/mod.rs - Three-tier handler architecture
//
// Public (no session)    -> /auth/*, kindergarten site pages
// Protected (session)    -> /api/auth/*, /api/admin/*
// Elevated (SuperAdmin)  -> /api/root/*

pub mod elevated;
pub mod protected;
pub mod public;
