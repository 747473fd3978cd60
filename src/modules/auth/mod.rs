//! Registration, login, token refresh and password change.

pub mod controller;
pub mod router;
pub mod service;
