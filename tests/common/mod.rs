/*!
 * Common test utilities for the sheetlate test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::Result;
use tempfile::TempDir;

use sheetlate::providers::mock::MockProvider;
use sheetlate::translation::{FallbackPolicy, Translator};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a tab-separated sheet export with the source text in column C
pub fn create_test_sheet(dir: &Path, filename: &str) -> Result<PathBuf> {
    let content = "id\tkey\tsource\n\
        1\tgreeting\tHello world\n\
        2\tcta\tClick <b>here</b> to continue\n\
        3\tconfirm\tyes\n\
        4\tregion\tfr\n\
        5\twelcome\tHello${name}world\n\
        6\tshort\n";
    create_test_file(dir, filename, content)
}

/// Owned strings from literals
pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Translator over a mock backend that uppercases every unit
pub fn uppercase_translator(policy: FallbackPolicy) -> (Translator, MockProvider) {
    let mock = MockProvider::working().with_custom_response(|unit| unit.to_uppercase());
    (Translator::new(Arc::new(mock.clone()), policy), mock)
}

/// Translator over a mock backend that always fails
pub fn failing_translator(policy: FallbackPolicy) -> (Translator, MockProvider) {
    let mock = MockProvider::failing();
    (Translator::new(Arc::new(mock.clone()), policy), mock)
}
