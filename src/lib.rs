//! Client-side core for a community-service events app: typed access to the
//! remote events API plus the validation, participation and listing rules
//! the views are built on.

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod listing;
pub mod participation;
pub mod repository;
pub mod scope;
pub mod service;
pub mod validation;

pub use error::{AppError, ErrorKind, Result};
