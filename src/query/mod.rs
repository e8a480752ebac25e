//! Test queries: immutable descriptors of a set of test cases.
//!
//! A query names cases at one of four levels of specificity:
//!
//! | Level        | String form              | Matches                                   |
//! |--------------|--------------------------|-------------------------------------------|
//! | `MultiFile`  | `suite:a,b,*`            | every file under the `a,b` path prefix    |
//! | `MultiTest`  | `suite:a,b:c,*`          | every test in file `a,b` under test `c`   |
//! | `MultiCase`  | `suite:a,b:c:x=1;*`      | every case of test `c` with `x=1`         |
//! | `SingleCase` | `suite:a,b:c:x=1;y=2`    | exactly one case                          |
//!
//! Queries are compared with [`compare::compare_queries`] and parsed with
//! [`parser::parse_query`]; `Display` is the inverse of parsing.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

pub mod compare;
pub mod params;
pub mod parser;

use crate::errors::{Result, SuiteTreeError};
use params::{is_public_param, stringify_param_value, stringify_single_param, TestParams};

/// Separates suite, file path, test path, and params.
pub const BIG_SEPARATOR: char = ':';
/// Separates the segments of a file path or test path.
pub const PATH_SEPARATOR: char = ',';
/// Separates `key=value` assignments.
pub const PARAM_SEPARATOR: char = ';';
/// Separates a parameter name from its value.
pub const KV_SEPARATOR: char = '=';
/// Terminates a level that is left unspecified.
pub const WILDCARD: char = '*';

static VALID_QUERY_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").unwrap()); // static pattern

/// Specificity level of a query. Ordered from least to most specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueryLevel {
    MultiFile = 1,
    MultiTest = 2,
    MultiCase = 3,
    SingleCase = 4,
}

impl QueryLevel {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestQuery {
    MultiFile {
        suite: String,
        file_path: Vec<String>,
    },
    MultiTest {
        suite: String,
        file_path: Vec<String>,
        test_path: Vec<String>,
    },
    MultiCase {
        suite: String,
        file_path: Vec<String>,
        test_path: Vec<String>,
        params: TestParams,
    },
    SingleCase {
        suite: String,
        file_path: Vec<String>,
        test_path: Vec<String>,
        params: TestParams,
    },
}

// =====================
// Construction
// =====================

impl TestQuery {
    /// All cases in `suite` whose file path starts with `file_path`.
    pub fn multi_file<S, I, P>(suite: S, file_path: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let suite = validate_suite(suite.into())?;
        let file_path = validate_path("file path", file_path)?;
        Ok(Self::MultiFile { suite, file_path })
    }

    /// All cases in file `file_path` whose test path starts with `test_path`.
    pub fn multi_test<S, F, FP, T, TP>(suite: S, file_path: F, test_path: T) -> Result<Self>
    where
        S: Into<String>,
        F: IntoIterator<Item = FP>,
        FP: Into<String>,
        T: IntoIterator<Item = TP>,
        TP: Into<String>,
    {
        let suite = validate_suite(suite.into())?;
        let file_path = validate_path("file path", file_path)?;
        if file_path.is_empty() {
            return Err(SuiteTreeError::invalid_query(
                "a test-level query needs a non-empty file path",
            ));
        }
        let test_path = validate_path("test path", test_path)?;
        Ok(Self::MultiTest {
            suite,
            file_path,
            test_path,
        })
    }

    /// All cases of one test whose params include every entry of `params`.
    pub fn multi_case<S, F, FP, T, TP>(
        suite: S,
        file_path: F,
        test_path: T,
        params: TestParams,
    ) -> Result<Self>
    where
        S: Into<String>,
        F: IntoIterator<Item = FP>,
        FP: Into<String>,
        T: IntoIterator<Item = TP>,
        TP: Into<String>,
    {
        let (suite, file_path, test_path) = validate_case_parts(suite, file_path, test_path)?;
        validate_params(&params)?;
        Ok(Self::MultiCase {
            suite,
            file_path,
            test_path,
            params,
        })
    }

    /// Exactly one case; `params` is its complete public parameter set.
    pub fn single_case<S, F, FP, T, TP>(
        suite: S,
        file_path: F,
        test_path: T,
        params: TestParams,
    ) -> Result<Self>
    where
        S: Into<String>,
        F: IntoIterator<Item = FP>,
        FP: Into<String>,
        T: IntoIterator<Item = TP>,
        TP: Into<String>,
    {
        let (suite, file_path, test_path) = validate_case_parts(suite, file_path, test_path)?;
        validate_params(&params)?;
        Ok(Self::SingleCase {
            suite,
            file_path,
            test_path,
            params,
        })
    }
}

fn validate_suite(suite: String) -> Result<String> {
    if !VALID_QUERY_PART.is_match(&suite) {
        return Err(SuiteTreeError::invalid_query(format!(
            "suite name `{suite}` must match {}",
            VALID_QUERY_PART.as_str()
        )));
    }
    Ok(suite)
}

fn validate_path<I, P>(what: &str, parts: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = P>,
    P: Into<String>,
{
    parts
        .into_iter()
        .map(|p| {
            let p = p.into();
            if VALID_QUERY_PART.is_match(&p) {
                Ok(p)
            } else {
                Err(SuiteTreeError::invalid_query(format!(
                    "{what} segment `{p}` must match {}",
                    VALID_QUERY_PART.as_str()
                )))
            }
        })
        .collect()
}

fn validate_case_parts<S, F, FP, T, TP>(
    suite: S,
    file_path: F,
    test_path: T,
) -> Result<(String, Vec<String>, Vec<String>)>
where
    S: Into<String>,
    F: IntoIterator<Item = FP>,
    FP: Into<String>,
    T: IntoIterator<Item = TP>,
    TP: Into<String>,
{
    let suite = validate_suite(suite.into())?;
    let file_path = validate_path("file path", file_path)?;
    let test_path = validate_path("test path", test_path)?;
    if file_path.is_empty() {
        return Err(SuiteTreeError::invalid_query(
            "a case-level query needs a non-empty file path",
        ));
    }
    if test_path.is_empty() {
        return Err(SuiteTreeError::invalid_query(
            "a case-level query needs a non-empty test path",
        ));
    }
    Ok((suite, file_path, test_path))
}

fn validate_params(params: &TestParams) -> Result<()> {
    for (key, value) in params {
        if !VALID_QUERY_PART.is_match(key) {
            return Err(SuiteTreeError::invalid_query(format!(
                "param name `{key}` must match {}",
                VALID_QUERY_PART.as_str()
            )));
        }
        if !is_public_param(key) {
            return Err(SuiteTreeError::invalid_query(format!(
                "private param `{key}` cannot appear in a query"
            )));
        }
        stringify_param_value(key, value)?;
    }
    Ok(())
}

// =====================
// Accessors
// =====================

impl TestQuery {
    pub fn level(&self) -> QueryLevel {
        match self {
            Self::MultiFile { .. } => QueryLevel::MultiFile,
            Self::MultiTest { .. } => QueryLevel::MultiTest,
            Self::MultiCase { .. } => QueryLevel::MultiCase,
            Self::SingleCase { .. } => QueryLevel::SingleCase,
        }
    }

    pub fn suite(&self) -> &str {
        match self {
            Self::MultiFile { suite, .. }
            | Self::MultiTest { suite, .. }
            | Self::MultiCase { suite, .. }
            | Self::SingleCase { suite, .. } => suite,
        }
    }

    pub fn file_path(&self) -> &[String] {
        match self {
            Self::MultiFile { file_path, .. }
            | Self::MultiTest { file_path, .. }
            | Self::MultiCase { file_path, .. }
            | Self::SingleCase { file_path, .. } => file_path,
        }
    }

    /// `None` for file-level queries.
    pub fn test_path(&self) -> Option<&[String]> {
        match self {
            Self::MultiFile { .. } => None,
            Self::MultiTest { test_path, .. }
            | Self::MultiCase { test_path, .. }
            | Self::SingleCase { test_path, .. } => Some(test_path),
        }
    }

    /// `None` for file- and test-level queries.
    pub fn params(&self) -> Option<&TestParams> {
        match self {
            Self::MultiFile { .. } | Self::MultiTest { .. } => None,
            Self::MultiCase { params, .. } | Self::SingleCase { params, .. } => Some(params),
        }
    }

    pub fn is_multi_file(&self) -> bool {
        matches!(self, Self::MultiFile { .. })
    }

    pub fn is_multi_test(&self) -> bool {
        matches!(self, Self::MultiTest { .. })
    }

    pub fn is_multi_case(&self) -> bool {
        matches!(self, Self::MultiCase { .. })
    }
}

// =====================
// Stringification
// =====================

fn join_with_wildcard(parts: &[String], separator: char) -> String {
    parts
        .iter()
        .map(String::as_str)
        .chain(std::iter::once("*"))
        .collect::<Vec<_>>()
        .join(&separator.to_string())
}

fn join_params(params: &TestParams) -> Vec<String> {
    params
        .iter()
        .map(|(k, v)| stringify_single_param(k, v))
        .collect()
}

impl fmt::Display for TestQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = PATH_SEPARATOR.to_string();
        match self {
            Self::MultiFile { suite, file_path } => {
                write!(
                    f,
                    "{suite}{BIG_SEPARATOR}{}",
                    join_with_wildcard(file_path, PATH_SEPARATOR)
                )
            }
            Self::MultiTest {
                suite,
                file_path,
                test_path,
            } => write!(
                f,
                "{suite}{BIG_SEPARATOR}{}{BIG_SEPARATOR}{}",
                file_path.join(&path),
                join_with_wildcard(test_path, PATH_SEPARATOR)
            ),
            Self::MultiCase {
                suite,
                file_path,
                test_path,
                params,
            } => {
                let mut parts = join_params(params);
                parts.push(WILDCARD.to_string());
                write!(
                    f,
                    "{suite}{BIG_SEPARATOR}{}{BIG_SEPARATOR}{}{BIG_SEPARATOR}{}",
                    file_path.join(&path),
                    test_path.join(&path),
                    parts.join(&PARAM_SEPARATOR.to_string())
                )
            }
            Self::SingleCase {
                suite,
                file_path,
                test_path,
                params,
            } => write!(
                f,
                "{suite}{BIG_SEPARATOR}{}{BIG_SEPARATOR}{}{BIG_SEPARATOR}{}",
                file_path.join(&path),
                test_path.join(&path),
                join_params(params).join(&PARAM_SEPARATOR.to_string())
            ),
        }
    }
}
