//! Loading parsed programs from disk
//!
//! A program is stored as the JSON form of its syntax tree. Modules that a
//! unit imports without declaring are looked up as `<dir>/<module>.json` in
//! each search directory, in order.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;
use vela_ast::Program;
use vela_sema::ModuleLoader;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' is not a valid syntax tree: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read the syntax tree stored at `path`. A tree without a path of its own
/// takes the file's.
pub fn read_program(path: &Path) -> Result<Program, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut program: Program = serde_json::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if program.path.is_empty() {
        program.path = path.display().to_string();
    }
    Ok(program)
}

/// Module loader over a list of search directories
#[derive(Debug, Default)]
pub struct FileLoader {
    search_dirs: Vec<PathBuf>,
    /// (path, source) of every unit loaded so far
    loaded: Vec<(String, String)>,
}

impl FileLoader {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            loaded: Vec::new(),
        }
    }

    pub fn add_dir(&mut self, dir: impl Into<PathBuf>) {
        self.search_dirs.push(dir.into());
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// First `<dir>/<name>.json` that exists
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        self.search_dirs
            .iter()
            .map(|dir| dir.join(format!("{}.json", name)))
            .find(|candidate| candidate.is_file())
    }

    /// Path and source text of the units loaded so far
    pub fn loaded_sources(&self) -> impl Iterator<Item = (&str, &str)> {
        self.loaded
            .iter()
            .map(|(path, source)| (path.as_str(), source.as_str()))
    }
}

impl ModuleLoader for FileLoader {
    fn load(&mut self, name: &str) -> Option<Program> {
        let Some(path) = self.find(name) else {
            debug!("module '{}' not found in {} search dirs", name, self.search_dirs.len());
            return None;
        };

        match read_program(&path) {
            Ok(program) => {
                debug!("loaded module '{}' from {}", name, path.display());
                self.loaded.push((program.path.clone(), program.source.clone()));
                Some(program)
            }
            Err(err) => {
                warn!("{}", err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_MODULE: &str = r#"{
        "path": "",
        "modules": [{ "value": { "name": { "value": "geo" }, "body": [] } }]
    }"#;

    #[test]
    fn test_read_program_takes_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geo.json");
        fs::write(&path, EMPTY_MODULE).unwrap();

        let program = read_program(&path).unwrap();
        assert_eq!(program.path, path.display().to_string());
        assert_eq!(program.modules[0].value.name.value.name, "geo");
    }

    #[test]
    fn test_read_program_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        assert!(matches!(read_program(&missing), Err(LoadError::Io { .. })));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ \"modules\": ").unwrap();
        let err = read_program(&broken).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_search_dirs_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("geo.json"), EMPTY_MODULE).unwrap();

        let mut loader = FileLoader::new(vec![first.path().to_path_buf()]);
        assert!(loader.find("geo").is_none());
        assert!(loader.load("geo").is_none());

        loader.add_dir(second.path());
        assert_eq!(loader.search_dirs().len(), 2);
        assert!(loader.load("geo").is_some());
        assert_eq!(loader.loaded_sources().count(), 1);
    }

    #[test]
    fn test_unparsable_module_is_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("geo.json"), "not json").unwrap();

        let mut loader = FileLoader::new(vec![dir.path().to_path_buf()]);
        assert!(loader.find("geo").is_some());
        assert!(loader.load("geo").is_none());
        assert_eq!(loader.loaded_sources().count(), 0);
    }
}
