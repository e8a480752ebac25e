//! Suitetree Error Handling
//!
//! Every failure mode of query parsing, parameter generation, and tree
//! construction is a variant of [`SuiteTreeError`]. Errors carry a
//! `miette` diagnostic code so the CLI can render them with help text;
//! query parse errors also carry the query text and a labeled span.
//!
//! None of these are recoverable mid-build: a tree build that hits any of
//! them is abandoned and the error is returned to the caller.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SuiteTreeError>;

/// Boxed error produced by an external loader.
pub type BoxedLoaderError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error, Diagnostic)]
pub enum SuiteTreeError {
    // ========================================================================
    // Query errors: malformed query strings or query components
    // ========================================================================
    #[error("could not parse query: {message}")]
    #[diagnostic(code(suitetree::query::parse))]
    QueryParse {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
        #[help]
        help: Option<String>,
    },

    #[error("invalid query: {message}")]
    #[diagnostic(code(suitetree::query::invalid))]
    InvalidQuery { message: String },

    #[error("invalid value for parameter `{key}`: {reason}")]
    #[diagnostic(
        code(suitetree::query::param_value),
        help("serialized parameter values must not contain `;`, `=` or `*`")
    )]
    InvalidParamValue { key: String, reason: String },

    // ========================================================================
    // Parameter combinator errors
    // ========================================================================
    #[error("ambiguous parameter `{key}`: defined by more than one combined source")]
    #[diagnostic(
        code(suitetree::params::duplicate),
        help("each parameter name may be produced by only one of the combined sources")
    )]
    DuplicateParam { key: String },

    // ========================================================================
    // Tree construction errors
    // ========================================================================
    #[error("`{query}` already has a description")]
    #[diagnostic(
        code(suitetree::tree::duplicate_description),
        help("a node may receive at most one description (README or spec file docstring)")
    )]
    DuplicateDescription { query: String },

    #[error("duplicate test case: {query}")]
    #[diagnostic(code(suitetree::tree::duplicate_case))]
    DuplicateCase { query: String },

    #[error("tree corrupted: key `{key}` under `{parent}` holds a {found} where a {expected} was expected")]
    #[diagnostic(
        code(suitetree::tree::corrupted),
        help("two distinct queries mapped to the same child key; this is a bug in key derivation")
    )]
    StructuralCorruption {
        key: String,
        parent: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("query `{query}` does not match any cases")]
    #[diagnostic(code(suitetree::tree::nothing_matched))]
    NothingMatched { query: String },

    #[error("subqueries-to-expand entry did not match anything:\n  {query}")]
    #[diagnostic(
        code(suitetree::tree::unused_expansion),
        help("the entry is either wrong or redundant with a previous entry")
    )]
    UnusedExpansion { query: String },

    #[error("`{query}` has no cases")]
    #[diagnostic(
        code(suitetree::tree::empty_spec_file),
        help("add cases to the file, or mark its description with TODO")
    )]
    EmptySpecFile { query: String },

    // ========================================================================
    // Loader and I/O errors
    // ========================================================================
    #[error("loader failed for `{file}`")]
    #[diagnostic(code(suitetree::loader))]
    Loader {
        file: String,
        #[source]
        source: BoxedLoaderError,
    },

    #[error(transparent)]
    #[diagnostic(code(suitetree::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(suitetree::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    #[diagnostic(code(suitetree::json))]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code(suitetree::walk))]
    Walk(#[from] walkdir::Error),
}

impl SuiteTreeError {
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Wraps a failure reported by an external loader for `file`.
    pub fn loader(file: impl Into<String>, source: impl Into<BoxedLoaderError>) -> Self {
        Self::Loader {
            file: file.into(),
            source: source.into(),
        }
    }

    /// Builds a parse error labeled at `span` within `query`.
    pub fn query_parse(
        query: &str,
        message: impl Into<String>,
        span: impl Into<SourceSpan>,
        help: Option<String>,
    ) -> Self {
        Self::QueryParse {
            message: message.into(),
            src: NamedSource::new("query", query.to_string()),
            span: span.into(),
            help,
        }
    }
}

/// Prints an error with full miette diagnostics to stderr.
pub fn print_error(error: SuiteTreeError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}
