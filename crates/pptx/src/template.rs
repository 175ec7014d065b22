//! Template packages that generated parts are merged into.
//!
//! The bundled template is an empty presentation (no slides) with a title
//! layout and a title-and-content layout, compiled into the library as plain
//! XML parts and zipped in memory when requested.

use crate::xml::part;
use deck_core::{Error, Layout, Result};
use regex::Regex;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::LazyLock;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

static SLIDE_PART_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());
static MEDIA_PART_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ppt/media/image(\d+)\.[A-Za-z0-9]+$").unwrap());

/// Parts of the bundled empty presentation.
const BUNDLED_PARTS: &[(&str, &str)] = &[
    ("[Content_Types].xml", include_str!("../templates/no-slides/[Content_Types].xml")),
    ("_rels/.rels", include_str!("../templates/no-slides/_rels/.rels")),
    ("docProps/core.xml", include_str!("../templates/no-slides/docProps/core.xml")),
    ("docProps/app.xml", include_str!("../templates/no-slides/docProps/app.xml")),
    ("ppt/presentation.xml", include_str!("../templates/no-slides/ppt/presentation.xml")),
    (
        "ppt/_rels/presentation.xml.rels",
        include_str!("../templates/no-slides/ppt/_rels/presentation.xml.rels"),
    ),
    ("ppt/presProps.xml", include_str!("../templates/no-slides/ppt/presProps.xml")),
    ("ppt/viewProps.xml", include_str!("../templates/no-slides/ppt/viewProps.xml")),
    ("ppt/tableStyles.xml", include_str!("../templates/no-slides/ppt/tableStyles.xml")),
    ("ppt/theme/theme1.xml", include_str!("../templates/no-slides/ppt/theme/theme1.xml")),
    (
        "ppt/slideMasters/slideMaster1.xml",
        include_str!("../templates/no-slides/ppt/slideMasters/slideMaster1.xml"),
    ),
    (
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        include_str!("../templates/no-slides/ppt/slideMasters/_rels/slideMaster1.xml.rels"),
    ),
    (
        "ppt/slideLayouts/slideLayout1.xml",
        include_str!("../templates/no-slides/ppt/slideLayouts/slideLayout1.xml"),
    ),
    (
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        include_str!("../templates/no-slides/ppt/slideLayouts/_rels/slideLayout1.xml.rels"),
    ),
    (
        "ppt/slideLayouts/slideLayout2.xml",
        include_str!("../templates/no-slides/ppt/slideLayouts/slideLayout2.xml"),
    ),
    (
        "ppt/slideLayouts/_rels/slideLayout2.xml.rels",
        include_str!("../templates/no-slides/ppt/slideLayouts/_rels/slideLayout2.xml.rels"),
    ),
];

/// Parts the assembler rewrites or extends; a template must provide them.
pub const REQUIRED_PARTS: &[&str] = &[
    part::CONTENT_TYPES,
    part::ROOT_RELS,
    part::PRESENTATION,
    part::PRESENTATION_RELS,
];

/// An opened template package.
pub struct Template {
    source: String,
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl Template {
    /// The bundled empty presentation.
    pub fn bundled() -> Result<Self> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, content) in BUNDLED_PARTS {
            zip.start_file(*name, options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
            zip.write_all(content.as_bytes())?;
        }
        let bytes = zip
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish bundled template: {}", e)))?
            .into_inner();
        Self::from_bytes(bytes, "bundled template")
    }

    /// Open a template package from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            Error::TemplateCorrupt(format!("cannot read template {}: {}", path.display(), e))
        })?;
        Self::from_bytes(bytes, &path.display().to_string())
    }

    /// Open a template package from raw bytes.
    pub fn from_bytes(bytes: Vec<u8>, source: &str) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
            Error::TemplateCorrupt(format!("{} is not a valid archive: {}", source, e))
        })?;
        log::debug!("Opened {} with {} entries", source, archive.len());
        Ok(Self {
            source: source.to_string(),
            archive,
        })
    }

    /// Human-readable origin, for messages.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Entry names, in no particular order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.archive.file_names()
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.archive.file_names().any(|n| n == name)
    }

    /// Check that every part we rewrite exists, plus each referenced layout.
    pub fn validate(&self, layouts: impl IntoIterator<Item = Layout>) -> Result<()> {
        for name in REQUIRED_PARTS {
            if !self.has_part(name) {
                return Err(Error::TemplateCorrupt(format!("{} is missing {}", self.source, name)));
            }
        }
        for layout in layouts {
            let name = part::slide_layout(layout.index());
            if !self.has_part(&name) {
                return Err(Error::TemplateCorrupt(format!(
                    "{} has no layout {} ({})",
                    self.source,
                    layout.index(),
                    name
                )));
            }
        }
        Ok(())
    }

    /// Read a part as UTF-8 text.
    pub fn read_part(&mut self, name: &str) -> Result<String> {
        let mut file = self.archive.by_name(name).map_err(|e| {
            Error::TemplateCorrupt(format!("{} has no readable '{}': {}", self.source, name, e))
        })?;
        let mut content = String::new();
        file.read_to_string(&mut content).map_err(|e| {
            Error::TemplateCorrupt(format!("{}: failed to read '{}': {}", self.source, name, e))
        })?;
        Ok(content)
    }

    /// Highest `N` among `ppt/slides/slideN.xml` parts, 0 if none.
    pub fn last_slide_number(&self) -> u32 {
        max_capture(self.archive.file_names(), &SLIDE_PART_REGEX)
    }

    /// Highest `N` among `ppt/media/imageN.*` parts, 0 if none.
    pub fn last_media_number(&self) -> u32 {
        max_capture(self.archive.file_names(), &MEDIA_PART_REGEX)
    }

    pub(crate) fn archive_mut(&mut self) -> &mut ZipArchive<Cursor<Vec<u8>>> {
        &mut self.archive
    }
}

fn max_capture<'a>(names: impl Iterator<Item = &'a str>, regex: &Regex) -> u32 {
    names
        .filter_map(|n| regex.captures(n))
        .filter_map(|c| c[1].parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}
