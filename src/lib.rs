//! umbra: a shadow-document language server for single-file components
//!
//! This crate provides IDE intelligence for component documents that
//! interleave markup, script, and style regions in one file. The static
//! analysis service it delegates to only understands plain script, so for
//! every open component document the server synthesizes an equivalent
//! script-only *shadow document*, keeps it registered with the service, and
//! translates positions between the two coordinate spaces in both
//! directions.
//!
//! # Architecture
//!
//! - [`blocks`]: splits raw component text into typed byte-range blocks
//! - [`shadow`]: emits the shadow text and the position map built alongside
//! - [`registry`]: per-open-document state, replaced wholesale on each edit
//! - [`service`]: the injected analysis-service boundary and wire types
//! - Feature modules ([`completion`], [`hover`], [`gotodef`], [`references`],
//!   [`rename`], [`signature`], [`highlights`], [`diagnostics`]): translate
//!   request positions out, delegate, translate every response span back
//!
//! # Usage
//!
//! This crate backs the `umbra` binary, which serves the language protocol
//! over stdio. Programmatic use goes through [`registry::ShadowRegistry`]
//! with an [`service::AnalysisHost`] implementation:
//!
//! ```ignore
//! use umbra::config::Settings;
//! use umbra::registry::ShadowRegistry;
//!
//! let registry = ShadowRegistry::new(host, Settings::default());
//! registry.register(&uri, &text);
//! ```

// Core modules - extraction, generation, mapping, lifecycle
pub mod blocks;
pub mod registry;
pub mod service;
pub mod shadow;

// LSP feature modules
pub mod completion;
pub mod diagnostics;
pub mod gotodef;
pub mod highlights;
pub mod hover;
pub mod references;
pub mod rename;
pub mod signature;

// Configuration and text utilities
pub mod config;
pub mod text;

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;
