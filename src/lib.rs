//! Whispersubs - Batch Subtitle Generation
//!
//! Turns folders of videos into sibling `.srt` files using whisper-cpp for
//! speech recognition and ffmpeg for audio extraction.

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod language;
pub mod media;
pub mod models;
pub mod progress;
pub mod subtitle;
pub mod transcribe;
pub mod workflow;
