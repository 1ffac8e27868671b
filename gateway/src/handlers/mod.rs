//! HTTP request handlers
//!
//! This module organizes all API handlers into logical groups:
//! - `api` - Health check endpoint
//! - `form` - Request field extraction shared by the synthesis endpoints
//! - `inference` - Synthesis endpoints (streamed PCM and WAV)
//! - `voices` - Voice profile and speaker listing

pub mod api;
pub mod form;
pub mod inference;
pub mod voices;

pub use form::SynthesisForm;
