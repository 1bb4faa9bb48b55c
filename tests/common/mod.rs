//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new().with_file("app.json", r#"{"a": 1}"#);
//! let value = fixture.read_json("app.json");
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

use file_transformer::document::Document;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::doc;
    pub use super::TestFixture;
}

/// Parse a JSON literal into a document.
#[allow(dead_code)]
pub fn doc(json: &str) -> Document {
    serde_json::from_str(json).expect("test JSON should be valid")
}

/// A temporary directory pre-populated with input files.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of a file inside the fixture.
    pub fn join(&self, path: &str) -> PathBuf {
        self.temp_dir.path().join(path)
    }

    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.join(path)).expect("Failed to read file")
    }

    /// Decode a JSON file of the fixture into a document.
    pub fn read_json(&self, path: &str) -> Document {
        serde_json::from_str(&self.read(path)).expect("File should contain valid JSON")
    }

    /// Decode a YAML file of the fixture into a document.
    pub fn read_yaml(&self, path: &str) -> Document {
        serde_yaml::from_str(&self.read(path)).expect("File should contain valid YAML")
    }

    /// Create a command configured to run in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("file-transformer");
        cmd.current_dir(self.path());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
