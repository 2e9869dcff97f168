//! Source discovery and loading.
//!
//! All inputs are read into memory up front; the analysis itself never does
//! file I/O.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub struct SourceLoader;

const JS_EXTENSIONS: [&str; 3] = ["js", "mjs", "cjs"];

impl SourceLoader {
    /// Read a single explicitly named input file.
    pub fn load_file(path: &str) -> Result<(String, String)> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path))?;
        Ok((path.to_string(), source))
    }

    /// Recursively collect JavaScript files from a folder. Unreadable
    /// entries are skipped with a warning, matching explicit-file loading
    /// being strict and folder scanning being tolerant.
    pub fn collect_js_files(dir: &str) -> Vec<(String, String)> {
        let mut files = Vec::new();
        Self::visit_dir(Path::new(dir), &mut files);
        files.sort_by(|a, b| a.0.cmp(&b.0));
        files
    }

    fn visit_dir(dir: &Path, files: &mut Vec<(String, String)>) {
        if dir.ends_with("node_modules") || dir.ends_with(".git") {
            return;
        }
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("WARN: cannot read directory {}: {}", dir.display(), e);
                return;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                Self::visit_dir(&path, files);
            } else if Self::is_js_file(&path) {
                match fs::read_to_string(&path) {
                    Ok(source) => files.push((path.to_string_lossy().to_string(), source)),
                    Err(e) => eprintln!("WARN: cannot read file {}: {}", path.display(), e),
                }
            }
        }
    }

    fn is_js_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| JS_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}
