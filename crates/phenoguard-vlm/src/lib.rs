//! Vision-language model wrapper for visual PII auditing.
//!
//! This crate inspects redacted document pages for leaked personal data
//! (names, dates of birth, NHS numbers, faces, text under failed redaction
//! boxes) by sending them to a vision-language model. The model call sits
//! behind the [`VisionClient`] trait so tests and offline deployments can use
//! [`MockVisionClient`].

pub mod audit;
pub mod client;
pub mod prompts;

pub use audit::*;
pub use client::*;
pub use prompts::*;
