//! Dataset serialization
//!
//! Writes a dataset tree back to UTF-8 XML. Directories are only created when
//! asked for, and registry defaults are only written when asked for, so a
//! save never changes more than the caller requested.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use tracing::debug;

use crate::dataobject::Dataset;
use crate::error::{Error, Result};

/// Options for [`save`] and [`to_bytes`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    /// Create missing parent directories
    pub create_dirs: bool,
    /// Write registry defaults into absent fields before serializing
    pub fill_defaults: bool,
    /// Indent the output
    pub pretty: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            create_dirs: false,
            fill_defaults: false,
            pretty: true,
        }
    }
}

impl SaveOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether missing parent directories are created
    pub fn with_create_dirs(mut self, create: bool) -> Self {
        self.create_dirs = create;
        self
    }

    /// Set whether registry defaults are filled in first
    pub fn with_fill_defaults(mut self, fill: bool) -> Self {
        self.fill_defaults = fill;
        self
    }

    /// Set whether the output is indented
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// The dataset to write; a filled copy when defaults were requested
fn prepared<'a>(dataset: &'a Dataset, options: &SaveOptions) -> Result<Cow<'a, Dataset>> {
    if !options.fill_defaults {
        return Ok(Cow::Borrowed(dataset));
    }
    let mut filled = dataset.clone();
    let written = filled.fill_defaults()?;
    debug!(written, "filled defaults before save");
    Ok(Cow::Owned(filled))
}

/// Serialize `dataset` to bytes
pub fn to_bytes(dataset: &Dataset, options: &SaveOptions) -> Result<Vec<u8>> {
    prepared(dataset, options)?.document().to_bytes(options.pretty)
}

/// Write `dataset` to `path`
///
/// The dataset itself is never modified; with `fill_defaults` a copy is
/// filled and written.
pub fn save(dataset: &Dataset, path: impl AsRef<Path>, options: &SaveOptions) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            if !options.create_dirs {
                return Err(Error::Io(std::io::Error::new(
                    ErrorKind::NotFound,
                    format!("directory '{}' does not exist", parent.display()),
                )));
            }
            std::fs::create_dir_all(parent)?;
            debug!(path = %parent.display(), "created output directory");
        }
    }

    let dataset = prepared(dataset, options)?;
    let mut sink = BufWriter::new(File::create(path)?);
    dataset.document().write_to(&mut sink, options.pretty)?;
    sink.flush()?;
    debug!(path = %path.display(), "saved dataset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::schema::Generation;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn dataset() -> Dataset {
        Dataset::new(Arc::new(Context::embedded().unwrap()), Generation::V1).unwrap()
    }

    #[test]
    fn test_save_options_builder() {
        let options = SaveOptions::new().with_create_dirs(true).with_pretty(false);
        assert!(options.create_dirs);
        assert!(!options.fill_defaults);
        assert!(!options.pretty);
    }

    #[test]
    fn test_declaration_and_namespace() {
        let bytes = to_bytes(&dataset(), &SaveOptions::default()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(text.contains(r#"xmlns="http://www.EcoInvent.org/EcoSpold01""#));
    }

    #[test]
    fn test_missing_directory_is_not_created() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out").join("dataset.xml");

        let err = save(&dataset(), &target, &SaveOptions::default()).unwrap_err();
        match err {
            Error::Io(e) => assert_eq!(e.kind(), ErrorKind::NotFound),
            other => panic!("unexpected error: {}", other),
        }
        assert!(!dir.path().join("out").exists());

        save(&dataset(), &target, &SaveOptions::new().with_create_dirs(true)).unwrap();
        assert!(target.is_file());
    }

    #[test]
    fn test_fill_defaults_leaves_source_untouched() {
        let mut ds = dataset();
        ds.root_mut().append("dataset").unwrap();
        let before = ds.document().to_bytes(false).unwrap();

        let plain = to_bytes(&ds, &SaveOptions::new().with_pretty(false)).unwrap();
        let filled = to_bytes(
            &ds,
            &SaveOptions::new().with_pretty(false).with_fill_defaults(true),
        )
        .unwrap();

        assert_eq!(plain, before);
        assert_ne!(filled, before);
        assert_eq!(ds.document().to_bytes(false).unwrap(), before);
    }
}
