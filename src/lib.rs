//! CAD Document Handler
//!
//! A thin layer over a CAD application's automation interface.
//!
//! This library provides:
//! - Scoped opening or creation of a document that is always closed on exit
//! - The automation traits a binding implements, plus an in-memory application
//! - A length unit conversion table
//! - Configuration management for the `cad-doc` CLI

pub mod automation;
pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod units;

// Re-exports for clean public API
pub use automation::{Application, Connector, Document, DocumentKind, Documents};
pub use config::Config;
pub use error::HandlerError;
pub use handler::{DocHandler, DocScope, ExitOutcome, HandlerOptions, ScopeState};
pub use units::{convert_units, LengthUnit, UnitError, UNIT_CONVERSION};
