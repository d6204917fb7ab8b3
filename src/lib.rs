//! Care Compass - Policy-Gated Health Triage Conversation Service
//!
//! This crate gates a free-form text generator behind a deterministic
//! safety-and-format policy for a multi-turn health triage conversation:
//! rule-based risk classification, a strict stage machine, exact-phrase
//! response validation, and deterministic repair when generation fails.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
