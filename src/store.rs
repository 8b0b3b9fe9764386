// Result file handling. The file holds one JSON array that grows across
// runs: each save reads whatever array is already there, appends the new
// entries and rewrites the whole file.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;

/// Default output path, relative to the working directory.
pub const DEFAULT_OUTPUT: &str = "auth0_users.json";

/// Append `results` to the array stored at `path` and return the total
/// number of entries now in the file.
///
/// An existing file that is unreadable, not JSON, or not an array is
/// replaced with a warning. Write failures are returned.
pub fn save_results<T: Serialize>(results: &[T], path: &Path) -> Result<usize> {
    let mut merged = load_existing(path);
    let previous = merged.len();
    for result in results {
        merged.push(serde_json::to_value(result)?);
    }

    let body = serde_json::to_string_pretty(&Value::Array(merged))?;
    fs::write(path, body)?;

    let total = previous + results.len();
    debug!(path = %path.display(), previous, added = results.len(), total, "results saved");
    Ok(total)
}

fn load_existing(path: &Path) -> Vec<Value> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read existing results, overwriting");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!(path = %path.display(), "existing results file is not a JSON array, overwriting");
            Vec::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "existing results file is not valid JSON, overwriting");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read(path: &Path) -> Vec<Value> {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn creates_file_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        let total = save_results(&[json!({"n": 1}), json!({"n": 2})], &path).unwrap();
        assert_eq!(total, 2);
        assert_eq!(read(&path), vec![json!({"n": 1}), json!({"n": 2})]);
    }

    #[test]
    fn appends_across_saves_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        save_results(&[json!({"n": 1})], &path).unwrap();
        let total = save_results(&[json!({"n": 2}), json!({"n": 3})], &path).unwrap();

        assert_eq!(total, 3);
        assert_eq!(
            read(&path),
            vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})]
        );
    }

    #[test]
    fn invalid_json_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        fs::write(&path, "{ not json").unwrap();

        let total = save_results(&[json!({"n": 1})], &path).unwrap();
        assert_eq!(total, 1);
        assert_eq!(read(&path), vec![json!({"n": 1})]);
    }

    #[test]
    fn non_array_json_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        fs::write(&path, r#"{"user_id": "auth0|1"}"#).unwrap();

        assert_eq!(save_results(&[json!({"n": 1})], &path).unwrap(), 1);
        assert_eq!(read(&path), vec![json!({"n": 1})]);
    }

    #[test]
    fn write_failure_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        assert!(save_results(&[json!({"n": 1})], &path).is_err());
    }
}
