//! # nlreader
//!
//! A reader for NL files, the format in which AMPL passes optimization
//! problems to solvers.
//!
//! This library provides:
//! - A parser for the ten-line NL header
//! - Tokenizers for text, binary and byte-swapped binary bodies
//! - Expression trees for nonlinear objectives and constraints
//! - A [`Handler`] trait that receives the problem piece by piece
//!
//! ## Architecture
//!
//! - [`nl`] - Header, tokenizers, expression reader and segment parser
//! - [`error`] - Error type with `source:line:column` diagnostics
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! nlread model.nl
//! nlread --header-only model.nl
//! ```
//!
//! ### Library
//!
//! ```no_run
//! use nlreader::{Expr, Handler, Reader};
//!
//! #[derive(Default)]
//! struct Objectives(Vec<Expr>);
//!
//! impl Handler for Objectives {
//!     fn handle_objective(&mut self, _index: usize, _maximize: bool, expr: Expr) {
//!         self.0.push(expr);
//!     }
//! }
//!
//! let mut reader = Reader::new(Objectives::default());
//! reader.read_file(std::path::Path::new("model.nl"))?;
//! for expr in &reader.handler().0 {
//!     println!("{}", expr);
//! }
//! # Ok::<(), nlreader::NlError>(())
//! ```
//!
//! ## Reading Model
//!
//! The header is parsed in full before anything reaches the handler. Body
//! segments are then delivered one callback at a time in file order. Errors
//! stop reading at once; callbacks already made are not undone.

pub mod error;
pub mod nl;

// Re-export main types for convenience
pub use error::{NlError, Result};
pub use nl::{Expr, Format, Handler, Header, NullHandler, Reader};

/// Maximum number of solver options in the first header line
pub const MAX_NL_OPTIONS: usize = 9;

/// Arithmetic kind of binary files written on this host
pub const NATIVE_ARITH_KIND: i32 = if cfg!(target_endian = "little") { 1 } else { 2 };

/// Default limit on the nesting depth of expressions
pub const DEFAULT_MAX_EXPR_DEPTH: usize = 1024;

/// Source name used in errors for input read from a string
pub const INPUT_SOURCE_NAME: &str = "(input)";
