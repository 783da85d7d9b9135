// ============================================================================
// Auth Service
// ============================================================================
//
// Login, logout and current-account routes under /api/auth.
//
// ============================================================================

pub mod core;
pub mod handlers;
