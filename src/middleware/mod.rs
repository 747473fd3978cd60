//! Request pipeline middleware.
//!
//! Every request under `/api` passes through, in order:
//!
//! 1. [`rate_limit`]: sliding-window admission per client address (429)
//! 2. [`auth`]: bearer access token verification, attaching [`Identity`] (401)
//! 3. [`policy`]: the route's role/permission [`Policy`], if any (403)
//!
//! Each step either passes the request on or short-circuits with the
//! `{code, message}` error body; the handler never runs after a rejection.
//!
//! [`Identity`]: auth::Identity
//! [`Policy`]: policy::Policy

pub mod auth;
pub mod policy;
pub mod rate_limit;
