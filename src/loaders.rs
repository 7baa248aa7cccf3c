//! Dataset loading
//!
//! Loads single files, whole directory trees and ZIP archives. Every file is
//! parsed and validated on its own: a syntax error is fatal for that file
//! only, and schema problems are collected per file so that a whole batch can
//! be reported in one pass. In strict mode the first failing file aborts the
//! batch instead.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::context::Context;
use crate::dataobject::Dataset;
use crate::documents::Document;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::schema::Generation;
use crate::validation::{self, ConformanceIssue};

/// File suffixes loaded from directories and archives by default
pub const DEFAULT_SUFFIXES: &[&str] = &["xml", "spold"];

/// A dataset loaded as part of a batch
#[derive(Debug)]
pub struct LoadedFile {
    /// File path, or archive path joined with the entry name
    pub path: PathBuf,
    /// The dataset; check [`Dataset::is_valid`] for conformance
    pub dataset: Dataset,
}

/// A file that failed to load or to validate
#[derive(Debug)]
pub struct FileError {
    /// File path, or archive path joined with the entry name
    pub path: PathBuf,
    /// What went wrong
    pub error: Error,
}

/// Result of loading a directory or archive
#[derive(Debug, Default)]
pub struct Batch {
    /// Every file that parsed, valid or not
    pub files: Vec<LoadedFile>,
    /// Every file that failed to parse or to validate
    pub errors: Vec<FileError>,
}

impl Batch {
    /// Files whose datasets conform to the schema
    pub fn valid(&self) -> impl Iterator<Item = &LoadedFile> {
        self.files.iter().filter(|f| f.dataset.is_valid())
    }

    /// True if no file failed
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Conformance report for one file
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    /// File path, or archive path joined with the entry name
    pub path: PathBuf,
    /// Problems found; a syntax error is reported as a single issue
    pub issues: Vec<ConformanceIssue>,
}

impl FileReport {
    /// True if the file conforms
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Loader for datasets of one generation
#[derive(Debug, Clone)]
pub struct Loader {
    context: Arc<Context>,
    generation: Generation,
    strict: bool,
    suffixes: Vec<String>,
    limits: Limits,
}

impl Loader {
    /// Create a loader using the context's limits
    pub fn new(context: Arc<Context>, generation: Generation) -> Self {
        let limits = context.limits().clone();
        Self {
            context,
            generation,
            strict: false,
            suffixes: DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            limits,
        }
    }

    /// Abort on the first invalid file instead of collecting errors
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the recognised file suffixes (with or without a leading dot)
    pub fn suffixes(mut self, suffixes: &[&str]) -> Self {
        self.suffixes = suffixes
            .iter()
            .map(|s| s.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Set the limits
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(false, |ext| {
                self.suffixes.iter().any(|s| s.eq_ignore_ascii_case(ext))
            })
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        let size = fs::metadata(path)?.len();
        self.limits.check_xml_size(size as usize)?;
        Ok(fs::read(path)?)
    }

    /// Parse and validate without applying the strict policy
    fn parse(&self, path: &Path, bytes: &[u8]) -> Result<Dataset> {
        let document = Document::parse(bytes, &self.limits).map_err(|e| match e {
            Error::Parse(err) => Error::Parse(err.with_source_name(path.display().to_string())),
            other => other,
        })?;
        let issues = validation::validate(
            &document,
            self.generation.schema(),
            Some(self.context.xsd_schema(self.generation)),
        );
        debug!(path = %path.display(), issues = issues.len(), "parsed dataset");

        let mut dataset = Dataset::from_document(Arc::clone(&self.context), self.generation, document)?;
        dataset.set_issues(issues);
        Ok(dataset)
    }

    fn conformance_error(path: &Path, dataset: &Dataset) -> Error {
        Error::SchemaConformance {
            path: path.to_path_buf(),
            issues: dataset.issues().to_vec(),
        }
    }

    // =========================================================================
    // Single files
    // =========================================================================

    /// Load one file
    ///
    /// Schema problems are attached to the dataset, or returned as
    /// [`Error::SchemaConformance`] in strict mode.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let bytes = self.read_file(path)?;
        self.load_bytes(path, &bytes)
    }

    /// Load a dataset from memory; `name` is used in messages
    pub fn load_bytes(&self, name: impl AsRef<Path>, bytes: &[u8]) -> Result<Dataset> {
        let name = name.as_ref();
        let dataset = self.parse(name, bytes)?;
        if self.strict && !dataset.is_valid() {
            return Err(Self::conformance_error(name, &dataset));
        }
        Ok(dataset)
    }

    // =========================================================================
    // Batches
    // =========================================================================

    fn record(&self, batch: &mut Batch, path: PathBuf, outcome: Result<Dataset>) -> Result<()> {
        match outcome {
            Ok(dataset) if dataset.is_valid() => batch.files.push(LoadedFile { path, dataset }),
            Ok(dataset) => {
                let error = Self::conformance_error(&path, &dataset);
                if self.strict {
                    return Err(error);
                }
                warn!(path = %path.display(), %error, "dataset does not conform");
                batch.errors.push(FileError {
                    path: path.clone(),
                    error,
                });
                batch.files.push(LoadedFile { path, dataset });
            }
            Err(error) => {
                if self.strict {
                    return Err(error);
                }
                warn!(path = %path.display(), %error, "failed to load dataset");
                batch.errors.push(FileError { path, error });
            }
        }
        Ok(())
    }

    fn directory_files(&self, dir: &Path) -> Result<Vec<Result<PathBuf>>> {
        if !dir.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("'{}' is not a directory", dir.display()),
            )));
        }
        Ok(WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) if entry.file_type().is_file() && self.accepts(entry.path()) => {
                    Some(Ok(entry.into_path()))
                }
                Ok(_) => None,
                Err(e) => Some(Err(Error::Io(e.into()))),
            })
            .collect())
    }

    /// Load every file with a recognised suffix below `dir`
    ///
    /// Files are visited in file-name order.
    pub fn load_directory(&self, dir: impl AsRef<Path>) -> Result<Batch> {
        let dir = dir.as_ref();
        let mut batch = Batch::default();
        for entry in self.directory_files(dir)? {
            match entry {
                Ok(path) => {
                    let outcome = self.read_file(&path).and_then(|b| self.parse(&path, &b));
                    self.record(&mut batch, path, outcome)?;
                }
                Err(error) => self.record(&mut batch, dir.to_path_buf(), Err(error))?,
            }
        }
        info!(
            path = %dir.display(),
            files = batch.files.len(),
            errors = batch.errors.len(),
            "loaded directory"
        );
        Ok(batch)
    }

    fn open_archive(&self, path: &Path) -> Result<ZipArchive<BufReader<File>>> {
        let archive = ZipArchive::new(BufReader::new(File::open(path)?))?;
        self.limits.check_archive_entries(archive.len())?;
        Ok(archive)
    }

    /// Read archive entry `index` if it is a file with a recognised suffix
    ///
    /// The returned name is relative. The size declared in the archive is
    /// only a first check: reading stops one byte past the limit.
    fn read_entry(
        &self,
        archive: &mut ZipArchive<BufReader<File>>,
        index: usize,
    ) -> Result<Option<(String, Vec<u8>)>> {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().trim_start_matches('/').to_string();
        if entry.is_dir() || !self.accepts(Path::new(&name)) {
            return Ok(None);
        }
        self.limits.check_xml_size(entry.size() as usize)?;

        let max_size = self.limits.max_xml_size;
        let mut bytes = Vec::with_capacity((entry.size() as usize).min(max_size));
        (&mut entry)
            .take(max_size as u64 + 1)
            .read_to_end(&mut bytes)?;
        self.limits.check_xml_size(bytes.len())?;
        Ok(Some((name, bytes)))
    }

    /// Load every entry with a recognised suffix from a ZIP archive
    ///
    /// Entries are read into memory; nothing is extracted to disk.
    pub fn load_archive(&self, path: impl AsRef<Path>) -> Result<Batch> {
        let path = path.as_ref();
        let mut archive = self.open_archive(path)?;
        let mut batch = Batch::default();

        for index in 0..archive.len() {
            match self.read_entry(&mut archive, index) {
                Ok(Some((name, bytes))) => {
                    let entry_path = path.join(&name);
                    let outcome = self.parse(&entry_path, &bytes);
                    self.record(&mut batch, entry_path, outcome)?;
                }
                Ok(None) => {}
                Err(error) => {
                    let entry_path = path.join(format!("#{}", index));
                    self.record(&mut batch, entry_path, Err(error))?;
                }
            }
        }
        info!(
            path = %path.display(),
            files = batch.files.len(),
            errors = batch.errors.len(),
            "loaded archive"
        );
        Ok(batch)
    }

    // =========================================================================
    // Validation only
    // =========================================================================

    fn report(&self, path: PathBuf, bytes: Result<Vec<u8>>) -> Result<FileReport> {
        let issues = match bytes.and_then(|b| self.parse(&path, &b)) {
            Ok(dataset) => dataset.issues().to_vec(),
            Err(error @ (Error::Parse(_) | Error::LimitExceeded(_))) => vec![ConformanceIssue {
                path: "/".to_string(),
                message: error.to_string(),
            }],
            Err(error) => return Err(error),
        };
        debug!(path = %path.display(), issues = issues.len(), "validated file");
        Ok(FileReport { path, issues })
    }

    /// Check one file
    pub fn validate_file(&self, path: impl AsRef<Path>) -> Result<FileReport> {
        let path = path.as_ref();
        self.report(path.to_path_buf(), self.read_file(path))
    }

    /// Check every file with a recognised suffix below `dir`
    pub fn validate_directory(&self, dir: impl AsRef<Path>) -> Result<Vec<FileReport>> {
        let mut reports = Vec::new();
        for entry in self.directory_files(dir.as_ref())? {
            let path = entry?;
            let bytes = self.read_file(&path);
            reports.push(self.report(path, bytes)?);
        }
        Ok(reports)
    }

    /// Check every entry with a recognised suffix in a ZIP archive
    pub fn validate_archive(&self, path: impl AsRef<Path>) -> Result<Vec<FileReport>> {
        let path = path.as_ref();
        let mut archive = self.open_archive(path)?;
        let mut reports = Vec::new();
        for index in 0..archive.len() {
            if let Some((name, bytes)) = self.read_entry(&mut archive, index)? {
                reports.push(self.report(path.join(name), Ok(bytes))?);
            }
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const VALID: &str = r#"<ecoSpold xmlns="http://www.EcoInvent.org/EcoSpold01"/>"#;
    const INVALID: &str = r#"<ecoSpold xmlns="http://www.EcoInvent.org/EcoSpold01"><dataset/></ecoSpold>"#;

    fn loader() -> Loader {
        Loader::new(Arc::new(Context::embedded().unwrap()), Generation::V1)
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", VALID).unwrap();

        let dataset = loader().load(file.path()).unwrap();
        assert!(dataset.is_valid());
        assert_eq!(dataset.generation(), Generation::V1);
    }

    #[test]
    fn test_strict_single_file() {
        let dataset = loader().load_bytes("invalid.xml", INVALID.as_bytes()).unwrap();
        assert!(!dataset.is_valid());

        let err = loader()
            .strict(true)
            .load_bytes("invalid.xml", INVALID.as_bytes())
            .unwrap_err();
        assert!(matches!(err, Error::SchemaConformance { .. }));
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let err = loader().load_bytes("broken.xml", b"<ecoSpold>").unwrap_err();
        assert!(err.to_string().contains("broken.xml"));
    }

    #[test]
    fn test_size_limit() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", VALID).unwrap();

        let limits = Limits {
            max_xml_size: 10,
            ..Limits::default()
        };
        let result = loader().limits(limits).load(file.path());
        assert!(matches!(result, Err(Error::LimitExceeded(_))));
    }

    #[test]
    fn test_suffix_filter() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.spold"), VALID).unwrap();
        fs::write(dir.path().join("b.XML"), VALID).unwrap();
        fs::write(dir.path().join("notes.txt"), "not xml").unwrap();

        let batch = loader().load_directory(dir.path()).unwrap();
        assert_eq!(batch.files.len(), 2);

        let batch = loader().suffixes(&[".spold"]).load_directory(dir.path()).unwrap();
        assert_eq!(batch.files.len(), 1);
    }

    #[test]
    fn test_missing_directory() {
        assert!(matches!(
            loader().load_directory("/nonexistent/datasets"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_validate_file_reports_syntax_errors() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "<ecoSpold").unwrap();
        let report = loader().validate_file(file.path()).unwrap();
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].message.contains("parse error"));
    }
}
