//! A [`TestFileLoader`] backed by a directory of declarative YAML spec files.
//!
//! Layout under the loader root:
//!
//! ```text
//! <root>/<suite>/README.md              suite description
//! <root>/<suite>/a/README.txt           description of directory `a`
//! <root>/<suite>/a/b.spec.yaml          spec file `a,b`
//! ```
//!
//! A spec file declares its tests and the parameter axes they are combined
//! over:
//!
//! ```yaml
//! description: Buffer mapping
//! tests:
//!   - path: map,read          # or [map, read]
//!     params:
//!       - name: size
//!         values: [4, 16]
//!       - bool: mapped_at_creation
//!   - path: [destroy]
//!     skip: not implemented yet
//! ```
//!
//! Declared cases carry no body; running one passes unless the test is
//! marked `skip`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::{Result, SuiteTreeError};
use crate::loader::{
    cases_for_test, CaseIter, CaseStatus, ListingEntry, RunCase, SpecFile, TestFileLoader,
};
use crate::params::{combine, enumerate, pbool, ParamsBuilder};
use crate::query::{TestQuery, PATH_SEPARATOR};

pub const SPEC_FILE_SUFFIX: &str = ".spec.yaml";
const README_NAMES: [&str; 2] = ["README.md", "README.txt"];

// =====================
// Spec file documents
// =====================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpecDocument {
    #[serde(default)]
    description: String,
    #[serde(default)]
    tests: Vec<TestDeclaration>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TestDeclaration {
    path: TestPathDeclaration,
    #[serde(default)]
    params: Vec<AxisDeclaration>,
    #[serde(default)]
    skip: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TestPathDeclaration {
    Joined(String),
    Parts(Vec<String>),
}

impl TestPathDeclaration {
    fn into_parts(self) -> Vec<String> {
        match self {
            Self::Joined(s) => s.split(PATH_SEPARATOR).map(str::to_string).collect(),
            Self::Parts(parts) => parts,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AxisDeclaration {
    Values {
        name: String,
        values: Vec<serde_json::Value>,
    },
    Bool {
        bool: String,
    },
}

impl AxisDeclaration {
    fn into_builder(self) -> ParamsBuilder {
        match self {
            Self::Values { name, values } => enumerate(&name, values),
            Self::Bool { bool } => pbool(&bool),
        }
    }
}

/// Runs a declared case: the only outcome it knows is whether it is skipped.
struct DeclaredCase {
    skip: Option<String>,
}

impl RunCase for DeclaredCase {
    fn run(&self, _query: &TestQuery) -> CaseStatus {
        match &self.skip {
            Some(reason) => CaseStatus::Skip {
                reason: reason.clone(),
            },
            None => CaseStatus::Pass,
        }
    }
}

// =====================
// Loader
// =====================

#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn suite_dir(&self, suite: &str) -> PathBuf {
        self.root.join(suite)
    }

    fn spec_path(&self, suite: &str, file_path: &[String]) -> Result<PathBuf> {
        let Some((last, dirs)) = file_path.split_last() else {
            return Err(SuiteTreeError::invalid_query("spec file path is empty"));
        };
        let mut path = self.suite_dir(suite);
        path.extend(dirs);
        path.push(format!("{last}{SPEC_FILE_SUFFIX}"));
        Ok(path)
    }
}

/// Relative path components of `path` under `base`, as strings.
fn relative_parts(base: &Path, path: &Path) -> Vec<String> {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect()
}

#[async_trait]
impl TestFileLoader for DirectoryLoader {
    async fn listing(&self, suite: &str) -> Result<Vec<ListingEntry>> {
        let suite_dir = self.suite_dir(suite);
        if !suite_dir.is_dir() {
            return Err(SuiteTreeError::loader(
                suite,
                format!("suite directory {} does not exist", suite_dir.display()),
            ));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&suite_dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let mut parts = relative_parts(&suite_dir, entry.path());

            if README_NAMES.contains(&name.as_str()) {
                parts.pop();
                let readme = fs::read_to_string(entry.path())?;
                entries.push(ListingEntry::Readme {
                    file_path: parts,
                    readme,
                });
            } else if let Some(stem) = name.strip_suffix(SPEC_FILE_SUFFIX) {
                if let Some(last) = parts.last_mut() {
                    *last = stem.to_string();
                }
                entries.push(ListingEntry::Spec { file_path: parts });
            }
        }
        debug!(suite, entries = entries.len(), dir = %suite_dir.display(), "listed suite directory");
        Ok(entries)
    }

    async fn import_spec_file(&self, suite: &str, file_path: &[String]) -> Result<SpecFile> {
        let path = self.spec_path(suite, file_path)?;
        let source = fs::read_to_string(&path)
            .map_err(|e| SuiteTreeError::loader(path.display().to_string(), e))?;
        let document: SpecDocument = serde_yaml::from_str(&source)
            .map_err(|e| SuiteTreeError::loader(path.display().to_string(), e))?;

        let cases: CaseIter = Box::new(document.tests.into_iter().flat_map(|test| {
            let axes = test.params.into_iter().map(AxisDeclaration::into_builder);
            let run: Arc<dyn RunCase> = Arc::new(DeclaredCase { skip: test.skip });
            cases_for_test(test.path.into_parts(), &combine(axes), run)
        }));

        Ok(SpecFile {
            description: document.description,
            cases,
        })
    }
}
