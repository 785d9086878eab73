//! HTTP route handlers grouped by resource.
//!
//! Paths are absolute so the whole surface mounts at `/` under one OpenAPI
//! document. Handlers stay thin: bind the request, call
//! [`crate::directory::DirectoryService`], wrap the result in the envelope.

pub mod health;
pub(crate) mod helpers;
pub mod organisations;
pub mod users;
