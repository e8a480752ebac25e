//! Query string parser.
//!
//! Parses the string form produced by `TestQuery`'s `Display` impl back into
//! a query. The grammar lives in `query/grammar.pest`; syntax errors are
//! reported as labeled `miette` diagnostics pointing into the query text.

use pest::{error::InputLocation, iterators::Pair, Parser};
use pest_derive::Parser;

use super::params::TestParams;
use super::TestQuery;
use crate::errors::{Result, SuiteTreeError};

#[derive(Parser)]
#[grammar = "query/grammar.pest"]
struct QueryParser;

const QUERY_FORMS_HELP: &str = "queries look like `suite:*`, `suite:a,b,*`, `suite:a,b:c,*`, \
     `suite:a,b:c:x=1;*` or `suite:a,b:c:x=1`";

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses a query string into a [`TestQuery`].
pub fn parse_query(text: &str) -> Result<TestQuery> {
    let mut pairs =
        QueryParser::parse(Rule::query, text).map_err(|e| convert_parse_error(text, e))?;
    let query = pairs.next().ok_or_else(|| malformed(text))?;

    let mut inner = query.into_inner();
    let suite = inner.next().ok_or_else(|| malformed(text))?.as_str();
    let level = inner.next().ok_or_else(|| malformed(text))?;

    match level.as_rule() {
        Rule::file_level => {
            let file_path = level
                .into_inner()
                .find(|p| p.as_rule() == Rule::file_path)
                .map(path_parts)
                .unwrap_or_default();
            TestQuery::multi_file(suite, file_path)
        }
        Rule::test_level => {
            let mut file_path = Vec::new();
            let mut test_path = Vec::new();
            for p in level.into_inner() {
                match p.as_rule() {
                    Rule::file_path => file_path = path_parts(p),
                    Rule::test_path => test_path = path_parts(p),
                    _ => {}
                }
            }
            TestQuery::multi_test(suite, file_path, test_path)
        }
        Rule::case_level => build_case_query(text, suite, level),
        _ => Err(malformed(text)),
    }
}

// ============================================================================
// BUILDERS
// ============================================================================

fn build_case_query(text: &str, suite: &str, level: Pair<Rule>) -> Result<TestQuery> {
    let mut file_path = Vec::new();
    let mut test_path = Vec::new();
    let mut params = TestParams::new();
    let mut wildcard = false;

    for p in level.into_inner() {
        match p.as_rule() {
            Rule::file_path => file_path = path_parts(p),
            Rule::test_path => test_path = path_parts(p),
            Rule::multi_params | Rule::single_params => {
                wildcard = p.as_rule() == Rule::multi_params;
                for param in p.into_inner().filter(|p| p.as_rule() == Rule::param) {
                    let (key, value) = build_param(text, param)?;
                    if params.contains_key(&key) {
                        return Err(SuiteTreeError::invalid_query(format!(
                            "param `{key}` appears more than once in `{text}`"
                        )));
                    }
                    params.insert(key, value);
                }
            }
            _ => {}
        }
    }

    if wildcard {
        TestQuery::multi_case(suite, file_path, test_path, params)
    } else {
        TestQuery::single_case(suite, file_path, test_path, params)
    }
}

fn build_param(text: &str, pair: Pair<Rule>) -> Result<(String, serde_json::Value)> {
    let mut inner = pair.into_inner();
    let key = inner.next().ok_or_else(|| malformed(text))?;
    let value = inner.next().ok_or_else(|| malformed(text))?;
    let span = value.as_span();
    let parsed = serde_json::from_str(value.as_str()).map_err(|e| {
        SuiteTreeError::query_parse(
            text,
            format!("param value is not valid JSON: {e}"),
            (span.start(), span.end() - span.start()),
            Some("string values must be quoted, e.g. `format=\"rgba8unorm\"`".into()),
        )
    })?;
    Ok((key.as_str().to_string(), parsed))
}

fn path_parts(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner().map(|p| p.as_str().to_string()).collect()
}

// ============================================================================
// ERRORS
// ============================================================================

fn malformed(text: &str) -> SuiteTreeError {
    SuiteTreeError::invalid_query(format!("malformed query `{text}`"))
}

fn convert_parse_error(text: &str, error: pest::error::Error<Rule>) -> SuiteTreeError {
    let (start, len) = match error.location {
        InputLocation::Pos(pos) => (pos, 0),
        InputLocation::Span((start, end)) => (start, end - start),
    };
    SuiteTreeError::query_parse(
        text,
        error.variant.message().to_string(),
        (start, len),
        Some(help_for(text)),
    )
}

/// Points at the most likely mistake for a rejected query string.
fn help_for(text: &str) -> String {
    let big_parts = text.split(super::BIG_SEPARATOR).count();
    let ends_with_wildcard = text.ends_with(super::WILDCARD);
    if big_parts == 1 {
        return format!("a query needs at least one `:` after the suite name; {QUERY_FORMS_HELP}");
    }
    if big_parts == 2 && !ends_with_wildcard {
        return "file-level query without wildcard: append `,*` for a file-level query or `:*` \
                for a test-level query"
            .into();
    }
    if big_parts == 3 && !ends_with_wildcard {
        return "test-level query without wildcard: append `,*` for a test-level query or `:*` \
                for a case-level query"
            .into();
    }
    if text.contains("**") || text.matches(super::WILDCARD).count() > 1 {
        return "the wildcard `*` may only appear once, as the last part of the query".into();
    }
    QUERY_FORMS_HELP.into()
}
