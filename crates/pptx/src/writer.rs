//! Writing presentations to disk.

use crate::package::PackageAssembler;
use crate::template::Template;
use crate::viewer;
use deck_core::{Error, Presentation, Result};
use std::io::{self, Cursor, Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Options for [`PptxWriter`].
#[derive(Debug, Clone)]
pub struct WriteOptions {
    overwrite: bool,
    open_after_write: bool,
    template: Option<PathBuf>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace an existing destination file instead of failing.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Launch the system's default viewer once the file is written.
    pub fn with_open_after_write(mut self, open: bool) -> Self {
        self.open_after_write = open;
        self
    }

    /// Merge into this `.pptx` instead of the bundled empty presentation.
    pub fn with_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template = Some(path.into());
        self
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn open_after_write(&self) -> bool {
        self.open_after_write
    }

    pub fn template(&self) -> Option<&Path> {
        self.template.as_deref()
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            open_after_write: true,
            template: None,
        }
    }
}

/// PPTX writer.
///
/// A write either produces a complete file at the destination or leaves the
/// destination untouched: the package is assembled in a temporary file next
/// to it and moved into place at the end.
pub struct PptxWriter {
    options: WriteOptions,
}

impl PptxWriter {
    pub fn new(options: WriteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Write `presentation` to `path`.
    pub fn write(&self, path: &Path, presentation: &Presentation) -> Result<()> {
        if !self.options.overwrite && path.exists() {
            return Err(Error::DestinationExists(path.to_path_buf()));
        }

        let template = self.load_template()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staging = NamedTempFile::new_in(dir).map_err(|source| Error::WriteDenied {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Staging {} at {}", path.display(), staging.path().display());

        stage(template, presentation, path, staging.as_file_mut())?;
        staging.as_file().sync_all().map_err(|source| Error::WriteDenied {
            path: path.to_path_buf(),
            source,
        })?;

        let persisted = if self.options.overwrite {
            staging.persist(path)
        } else {
            staging.persist_noclobber(path)
        };
        persisted.map_err(|e| match e.error.kind() {
            io::ErrorKind::AlreadyExists if !self.options.overwrite => {
                Error::DestinationExists(path.to_path_buf())
            }
            _ => Error::WriteDenied {
                path: path.to_path_buf(),
                source: e.error,
            },
        })?;

        log::info!("Wrote {} slide(s) to {}", presentation.len(), path.display());

        if self.options.open_after_write {
            if let Err(e) = viewer::open_with_default_app(path) {
                log::warn!("Could not open {}: {}", path.display(), e);
            }
        }
        Ok(())
    }

    /// Assemble the package in memory.
    pub fn write_to_bytes(&self, presentation: &Presentation) -> Result<Vec<u8>> {
        let template = self.load_template()?;
        let cursor = PackageAssembler::new(template)
            .assemble(presentation, Cursor::new(Vec::new()))?;
        Ok(cursor.into_inner())
    }

    fn load_template(&self) -> Result<Template> {
        match &self.options.template {
            Some(path) => Template::open(path),
            None => Template::bundled(),
        }
    }
}

impl Default for PptxWriter {
    fn default() -> Self {
        Self::new(WriteOptions::default())
    }
}

/// Assemble into the staging file for `destination`. Failures of the staging
/// file itself (permissions, disk space) become [`Error::WriteDenied`].
fn stage<W: Write + Seek>(
    template: Template,
    presentation: &Presentation,
    destination: &Path,
    staging: W,
) -> Result<W> {
    PackageAssembler::new(template)
        .assemble(presentation, staging)
        .map_err(|e| match e {
            Error::IoError(source) => Error::WriteDenied {
                path: destination.to_path_buf(),
                source,
            },
            other => other,
        })
}

/// Write `presentation` to `path` with the given options.
pub fn write(
    path: impl AsRef<Path>,
    presentation: &Presentation,
    options: &WriteOptions,
) -> Result<()> {
    PptxWriter::new(options.clone()).write(path.as_ref(), presentation)
}
