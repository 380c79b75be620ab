//! Custom extractors for Axum handlers.
//!
//! This module provides reusable extractors that reduce boilerplate
//! and standardize error handling across your API.

pub mod form_fields;

pub use form_fields::{FormFields, UploadedFile};
