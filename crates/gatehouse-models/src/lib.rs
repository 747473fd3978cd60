//! # Gatehouse Models
//!
//! Domain entities and request/response DTOs for the Gatehouse admin API.
//!
//! - [`users`]: [`User`](users::User), account status and user DTOs
//! - [`roles`]: [`Role`](roles::Role), predefined role templates and role DTOs
//! - [`auth`]: login, registration and token DTOs

pub mod auth;
pub mod roles;
pub mod users;
