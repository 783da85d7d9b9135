// ============================================================================
// Image Service
// ============================================================================
//
// Upload orchestration (core) and the /api/images routes (handlers).
//
// ============================================================================

pub mod core;
pub mod handlers;
