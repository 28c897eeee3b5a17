//! HTTP request handlers
//!
//! This module organizes all API handlers into logical groups:
//! - `api` - Health check endpoint
//! - `images` - Image generation endpoint
//! - `messages` - Chat message listing and creation
//! - `training_data` - Persona training-data listing and creation
//! - `voice_samples` - Voice-sample listing and split trigger

pub mod api;
pub mod images;
pub mod messages;
pub mod training_data;
pub mod voice_samples;
