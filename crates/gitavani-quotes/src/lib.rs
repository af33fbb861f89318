//! `gitavani-quotes` — quote content for daily notifications.
//!
//! # Overview
//!
//! The [`service::QuoteService`] turns (language, strategy, cursor
//! position) into deliverable text. It asks the generative provider for
//! a rigidly formatted response (`Verse:` / `Sanskrit:` /
//! `Translation:` sections plus a strategy-specific one), parses it
//! with section-anchored extraction, and falls back to the embedded
//! corpus whenever the provider errors out or returns something
//! unusable — a dispatch must never be left without content.
//!
//! The provider itself sits behind the [`provider::QuoteProvider`]
//! trait so tests run against a stub and the Gemini REST client stays
//! an implementation detail.

pub mod gemini;
pub mod parse;
pub mod prompt;
pub mod provider;
pub mod service;

pub use provider::{ProviderError, QuoteProvider};
pub use service::{QuoteResult, QuoteService, QuoteSource};
