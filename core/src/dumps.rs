use crate::error::LoadError;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const COURSES_FILE: &str = "courses.json";
pub const COURSE_INDEX_FILE: &str = "course_search_index.json";
pub const EMPLOYEES_FILE: &str = "employees.json";
pub const EMPLOYEE_INDEX_FILE: &str = "employee_search_index.json";

/// Locations of the four input dumps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpPaths {
    pub courses: PathBuf,
    pub course_index: PathBuf,
    pub employees: PathBuf,
    pub employee_index: PathBuf,
}

impl DumpPaths {
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            courses: dir.join(COURSES_FILE),
            course_index: dir.join(COURSE_INDEX_FILE),
            employees: dir.join(EMPLOYEES_FILE),
            employee_index: dir.join(EMPLOYEE_INDEX_FILE),
        }
    }
}

/// Parsed dumps; `None` marks a dump that failed to load.
#[derive(Debug, Clone, Default)]
pub struct LoadedDumps {
    pub courses: Option<Value>,
    pub course_index: Option<Value>,
    pub employees: Option<Value>,
    pub employee_index: Option<Value>,
}

impl LoadedDumps {
    /// Read every dump, logging and absorbing per-file failures.
    pub fn load(paths: &DumpPaths) -> Self {
        Self {
            courses: load_logged(&paths.courses),
            course_index: load_logged(&paths.course_index),
            employees: load_logged(&paths.employees),
            employee_index: load_logged(&paths.employee_index),
        }
    }

    pub fn loaded_count(&self) -> usize {
        [&self.courses, &self.course_index, &self.employees, &self.employee_index]
            .iter()
            .filter(|d| d.is_some())
            .count()
    }
}

/// Parse one dump file. An empty or whitespace-only file is an empty dump
/// (`Value::Null`), not an error.
pub fn read_dump(path: &Path) -> Result<Value, LoadError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(LoadError::Missing(path.to_path_buf())),
        Err(source) => return Err(LoadError::Io { path: path.to_path_buf(), source }),
    };
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|source| LoadError::Parse { path: path.to_path_buf(), source })
}

fn load_logged(path: &Path) -> Option<Value> {
    match read_dump(path) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(error = %e, "dump unavailable");
            None
        }
    }
}
