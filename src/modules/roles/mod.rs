//! Role listing and permission management.

pub mod controller;
pub mod router;
pub mod service;
