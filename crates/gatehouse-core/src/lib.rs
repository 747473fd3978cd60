//! # Gatehouse Core
//!
//! Core types, errors, and utilities for the Gatehouse admin API.
//!
//! This crate provides foundational types used throughout the application:
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`permissions`]: The [`PermissionSet`] value type and permission constants
//! - [`pagination`]: Page-based pagination for list endpoints
//! - [`password`]: Password hashing and verification
//!
//! # Example
//!
//! ```ignore
//! use gatehouse_core::{AppError, PermissionSet, permissions};
//!
//! let mut granted = PermissionSet::from_iter([permissions::USER_VIEW]);
//! granted.add(permissions::USER_EDIT);
//!
//! if !granted.has(permissions::USER_DELETE) {
//!     return Err(AppError::forbidden("access control require permission: user:delete"));
//! }
//! ```

pub mod errors;
pub mod pagination;
pub mod password;
pub mod permissions;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
pub use permissions::PermissionSet;
