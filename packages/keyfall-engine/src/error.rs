//! # Error Types
//!
//! This module defines all error types for the keyfall engine.
//!
//! Every error is raised at an input boundary: chart text, chart front matter,
//! or a configuration value. Nothing that happens during a tick can fail; a
//! note receiving a second judgment or a negative elapsed time is ruled out by
//! construction rather than reported.
//!
//! ## Error Types
//! - `ParseError` - Malformed chart text, with the 1-based position of the bad triple
//! - `MetadataError` - Invalid YAML front matter in a chart document
//! - `ConfigError` - Tempo, meter, or judgment settings outside the supported bounds
//!
//! ## Usage
//! ```rust
//! use keyfall_engine::{parse_chart, EngineError};
//!
//! match parse_chart("C4:0:400,H4:500:400") {
//!     Ok(notes) => println!("{} notes", notes.len()),
//!     Err(EngineError::ParseError { note, message }) => {
//!         eprintln!("Bad note {}: {}", note, message);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Parse error with the position of the offending triple.
    ///
    /// The whole chart is rejected; no partial result is returned.
    ///
    /// # Example
    /// ```
    /// # use keyfall_engine::EngineError;
    /// let err = EngineError::ParseError {
    ///     note: 3,
    ///     message: "expected pitch:onset:duration, found 2 fields".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Parse error at note 3: expected pitch:onset:duration, found 2 fields");
    /// ```
    #[error("Parse error at note {note}: {message}")]
    ParseError { note: usize, message: String },

    /// Invalid chart front matter.
    ///
    /// # Example
    /// ```
    /// # use keyfall_engine::EngineError;
    /// let err = EngineError::MetadataError("bpm: invalid type".to_string());
    /// assert_eq!(err.to_string(), "Invalid metadata: bpm: invalid type");
    /// ```
    #[error("Invalid metadata: {0}")]
    MetadataError(String),

    /// A configuration value outside the supported bounds.
    ///
    /// The previous valid configuration stays in effect.
    ///
    /// # Example
    /// ```
    /// # use keyfall_engine::EngineError;
    /// let err = EngineError::ConfigError("bpm must be between 40 and 240, got 300".to_string());
    /// assert_eq!(err.to_string(), "Invalid configuration: bpm must be between 40 and 240, got 300");
    /// ```
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
