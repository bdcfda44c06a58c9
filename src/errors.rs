//! Error types with rich diagnostics using miette
//!
//! Parse errors carry source spans; resolution and render errors name the
//! records involved.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::types::NumericError;

/// Source context for error reporting
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Name of the source (table column or "<markup>")
    pub name: String,
    /// The full source text
    pub source: String,
}

impl SourceContext {
    /// Create a new source context
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Create a NamedSource for miette
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.source.clone())
    }
}

/// Convert a pest error location into a miette span
pub(crate) fn pest_span<R: pest::RuleType>(err: &pest::error::Error<R>) -> SourceSpan {
    match err.location {
        pest::error::InputLocation::Pos(p) => SourceSpan::from((p, 0)),
        pest::error::InputLocation::Span((start, end)) => SourceSpan::from((start, end - start)),
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Malformed markup (overlay or raw markup fragment)
#[derive(Error, Diagnostic, Debug)]
#[error("malformed markup: {message}")]
#[diagnostic(
    code(dungeondraw::markup::malformed),
    help("markup must be a complete, well-formed element")
)]
pub struct MarkupError {
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: SourceSpan,
}

/// Malformed draw code or tag list in a table column
#[derive(Error, Diagnostic, Debug)]
#[error("invalid draw code: {message}")]
#[diagnostic(code(dungeondraw::parse::draw_code))]
pub struct DrawCodeError {
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: SourceSpan,
}

// ============================================================================
// Table Errors
// ============================================================================

/// Errors raised while turning table rows into records
#[derive(Error, Diagnostic, Debug)]
pub enum TableError {
    #[error("no transform registered for table type `{table}`")]
    #[diagnostic(code(dungeondraw::table::unknown_table))]
    UnknownTable { table: String },

    #[error("row {row} of `{table}` has {got} values, expected {expected}")]
    #[diagnostic(code(dungeondraw::table::column_count))]
    ColumnCount {
        table: String,
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("row {row} of `{table}`: `{value}` is not an integer in column `{column}`")]
    #[diagnostic(code(dungeondraw::table::invalid_integer))]
    InvalidInteger {
        table: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row} of `{table}` continues a record, but no record came before it")]
    #[diagnostic(
        code(dungeondraw::table::orphan_row),
        help("fill in the key columns of the first row")
    )]
    OrphanRow { table: String, row: usize },

    #[error("row {row} of `{table}` sets only one of the key columns")]
    #[diagnostic(code(dungeondraw::table::partial_key))]
    PartialKey { table: String, row: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    DrawCode(#[from] DrawCodeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Markup(#[from] MarkupError),
}

// ============================================================================
// Resolution Errors
// ============================================================================

/// Errors that occur while expanding tile and cell references
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("cyclic reference: {cycle}")]
    #[diagnostic(
        code(dungeondraw::resolve::cyclic_reference),
        help("a tile or cell must not reference itself, directly or indirectly")
    )]
    CyclicReference { cycle: String },

    #[error("reference chain from {root} is deeper than {limit}")]
    #[diagnostic(code(dungeondraw::resolve::depth_exceeded))]
    DepthExceeded { root: String, limit: usize },
}

// ============================================================================
// Render Errors
// ============================================================================

/// Errors that abort a render
#[derive(Error, Diagnostic, Debug)]
pub enum RenderError {
    #[error("invalid scale: {source}")]
    #[diagnostic(code(dungeondraw::render::invalid_scale))]
    InvalidScale {
        #[source]
        source: NumericError,
    },

    #[error("invalid nudge: ({x}, {y})")]
    #[diagnostic(
        code(dungeondraw::render::invalid_nudge),
        help("nudge offsets must be finite pixel values")
    )]
    InvalidNudge { x: f64, y: f64 },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Markup(#[from] MarkupError),
}

/// Problems that do not stop a render; the offending fragment passes through unchanged
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum RenderWarning {
    #[error("unrecognized path opcode `{opcode}`")]
    #[diagnostic(code(dungeondraw::scale::unknown_opcode), severity(Warning))]
    UnknownOpcode { opcode: String },

    #[error("opcode `{opcode}` takes arguments in groups of {group}, got {count}")]
    #[diagnostic(code(dungeondraw::scale::malformed_args), severity(Warning))]
    MalformedArgs {
        opcode: String,
        group: usize,
        count: usize,
    },
}
