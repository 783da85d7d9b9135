// ============================================================================
// User Service
// ============================================================================
//
// Account management routes under /api/users.
//
// ============================================================================

pub mod handlers;
