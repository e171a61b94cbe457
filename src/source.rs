// src/source.rs
//! File contents as seen by the rule checks.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheManager, CacheStats};
use crate::config::CacheSettings;
use crate::discovery::relative_path;
use crate::error::{AuditError, Result};

/// One file's text, with its project-relative path and line split.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Relative path, forward slashes.
    pub path: String,
    pub content: Arc<str>,
}

impl SourceFile {
    #[must_use]
    pub fn new(path: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Lines without terminators. A trailing newline does not add an empty line.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.lines()
    }

    #[must_use]
    pub fn line_vec(&self) -> Vec<&str> {
        self.content.lines().collect()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }

    /// Final path component.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// True if the path has `segment` as a directory component, e.g. `components/`.
    #[must_use]
    pub fn in_dir(&self, segment: &str) -> bool {
        self.path.starts_with(segment) || self.path.contains(&format!("/{segment}"))
    }
}

/// Reads files under a project root, keeping contents in a TTL cache so
/// several agents over the same tree hit the disk once per file.
pub struct SourceLoader {
    root: PathBuf,
    cache: CacheManager<Arc<str>>,
}

impl SourceLoader {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, settings: &CacheSettings) -> Self {
        Self::with_cache(
            root,
            CacheManager::new(Duration::from_millis(settings.default_ttl_ms), settings.max_size),
        )
    }

    #[must_use]
    pub fn with_cache(root: impl Into<PathBuf>, cache: CacheManager<Arc<str>>) -> Self {
        Self {
            root: root.into(),
            cache,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads `path` (absolute or root-relative).
    ///
    /// # Errors
    /// Returns error if the file cannot be read. Bytes that are not valid
    /// UTF-8 are replaced with U+FFFD rather than rejected.
    pub fn load(&mut self, path: &Path) -> Result<SourceFile> {
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let rel = relative_path(&self.root, &full);

        if let Some(content) = self.cache.get(&rel) {
            return Ok(SourceFile::new(rel, content));
        }

        let bytes = fs::read(&full).map_err(|e| AuditError::io(e, &full))?;
        let content: Arc<str> = Arc::from(String::from_utf8_lossy(&bytes));
        self.cache.set(rel.clone(), Arc::clone(&content));
        Ok(SourceFile::new(rel, content))
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.get_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_count_ignores_trailing_newline() {
        let f = SourceFile::new("a.ts", "one\ntwo\n");
        assert_eq!(f.line_count(), 2);
        assert_eq!(SourceFile::new("a.ts", "").line_count(), 0);
    }

    #[test]
    fn dir_segments_match_whole_components() {
        let f = SourceFile::new("src/components/Header.tsx", "");
        assert!(f.in_dir("components/"));
        assert!(!f.in_dir("pages/"));
        assert_eq!(f.file_name(), "Header.tsx");

        let top = SourceFile::new("hooks/useAuth.ts", "");
        assert!(top.in_dir("hooks/"));
        assert!(!SourceFile::new("src/mycomponents/x.ts", "").in_dir("components/"));
    }

    #[test]
    fn loader_reads_each_file_once() {
        let d = tempfile::tempdir().unwrap();
        fs::create_dir_all(d.path().join("src")).unwrap();
        fs::write(d.path().join("src/a.ts"), "const a = 1;\n").unwrap();

        let mut loader = SourceLoader::new(d.path(), &CacheSettings::default());
        let first = loader.load(&d.path().join("src/a.ts")).unwrap();
        let second = loader.load(Path::new("src/a.ts")).unwrap();

        assert_eq!(first.path, "src/a.ts");
        assert_eq!(second.content.as_ref(), "const a = 1;\n");
        let stats = loader.cache_stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn loader_decodes_latin1_lossily() {
        let d = tempfile::tempdir().unwrap();
        fs::write(d.path().join("Noticia.tsx"), b"// not\xedcia\nconst x = 1;\n").unwrap();

        let mut loader = SourceLoader::new(d.path(), &CacheSettings::default());
        let file = loader.load(Path::new("Noticia.tsx")).unwrap();

        assert_eq!(file.line_count(), 2);
        assert!(file.content.starts_with("// not\u{fffd}cia"));
    }

    #[test]
    fn loader_reports_missing_file_with_path() {
        let d = tempfile::tempdir().unwrap();
        let mut loader = SourceLoader::new(d.path(), &CacheSettings::default());
        let err = loader.load(Path::new("gone.ts")).unwrap_err();
        assert!(err.to_string().contains("gone.ts"));
    }
}
