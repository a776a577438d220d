//! GSTIN Credibility API Library
//!
//! Scores Indian businesses by GSTIN with a deterministic credibility engine
//! and attaches a language-model narrative to each report on a best-effort basis.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Scoring engine, models and validation.
//! - `integrations`: External service integrations (language model).
//! - `circuit_breaker`: Circuit breaker for language model calls.
//! - `config`: Configuration management.
//! - `constants`: Weights, name pool and fixed narratives.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `lookups`: Lookup lifecycle (placeholder first, narrative later).
//! - `models`: Report and API data models.
//! - `narrative`: Narrative generation and enrichment.
//! - `narrative_cache`: Checksum-validated narrative cache.
//! - `router`: Route table.
//! - `scoring`: Deterministic credibility scoring.
//! - `validation`: GSTIN input validation.

pub mod api;
pub mod core;
pub mod integrations;

pub mod circuit_breaker;
pub mod config;
pub mod constants;
pub mod errors;
pub mod handlers;
pub mod lookups;
pub mod models;
pub mod narrative;
pub mod narrative_cache;
pub mod router;
pub mod scoring;
pub mod validation;
