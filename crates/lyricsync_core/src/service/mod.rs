//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate decoding and repository calls into import use-cases.
//! - Keep CLI and other callers decoupled from storage details.

pub mod batch_import;
pub mod merge_service;
