//! Merges rendered slides into a template package.

use crate::parts::{self, ContentTypes};
use crate::relationships::{RelationshipKind, Relationships};
use crate::slide_xml::{RenderedSlide, SlideWriter};
use crate::template::Template;
use crate::xml::{self, content_type, part};
use chrono::Utc;
use deck_core::{Error, Presentation, Result};
use std::collections::BTreeMap;
use std::io::{Seek, Write};
use zip::write::FileOptions;
use zip::result::ZipError;
use zip::{CompressionMethod, ZipWriter};

/// Output-side archive errors. I/O failures stay `IoError` so the caller can
/// attribute them to the destination.
fn zip_err(context: &str, e: ZipError) -> Error {
    match e {
        ZipError::Io(source) => Error::IoError(source),
        other => Error::ZipError(format!("{}: {}", context, other)),
    }
}

/// Builds a complete `.pptx` archive from a template and a presentation.
pub struct PackageAssembler {
    template: Template,
}

impl PackageAssembler {
    pub fn new(template: Template) -> Self {
        Self { template }
    }

    /// Write the package to `writer` and hand it back once the archive is
    /// finished.
    ///
    /// Failures of `writer` itself surface as [`Error::IoError`].
    ///
    /// Template entries are copied without recompression, except for the
    /// parts this crate regenerates, which are replaced in place.
    pub fn assemble<W: Write + Seek>(
        mut self,
        presentation: &Presentation,
        writer: W,
    ) -> Result<W> {
        self.template
            .validate(presentation.slides().iter().map(|s| s.layout()))?;

        let slide_offset = self.template.last_slide_number();
        let media_offset = self.template.last_media_number();
        if slide_offset > 0 {
            log::debug!(
                "{} already holds {} slide(s); numbering continues after them",
                self.template.source(),
                slide_offset
            );
        }

        let rendered = SlideWriter::new(presentation, slide_offset, media_offset).render_all()?;
        let replacements = self.regenerate_parts(presentation, &rendered)?;

        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        write_entry(&mut zip, options, part::CONTENT_TYPES, &replacements[part::CONTENT_TYPES])?;

        let archive = self.template.archive_mut();
        for index in 0..archive.len() {
            let file = archive
                .by_index_raw(index)
                .map_err(|e| Error::TemplateCorrupt(format!("unreadable entry {}: {}", index, e)))?;
            let name = file.name().to_string();
            if name == part::CONTENT_TYPES {
                continue;
            }
            match replacements.get(&name) {
                Some(content) => {
                    drop(file);
                    write_entry(&mut zip, options, &name, content)?;
                }
                None => zip
                    .raw_copy_file(file)
                    .map_err(|e| zip_err(&format!("Failed to copy '{}'", name), e))?,
            }
        }

        for slide in &rendered {
            write_entry(&mut zip, options, &part::slide(slide.number), &slide.xml)?;
            write_entry(
                &mut zip,
                options,
                &part::slide_rels(slide.number),
                &slide.relationships.to_xml(),
            )?;
            for media in &slide.media {
                let name = part::media(&media.name.file_name());
                zip.start_file(name.as_str(), options)
                    .map_err(|e| zip_err(&format!("Failed to add '{}'", name), e))?;
                zip.write_all(&media.bytes)?;
            }
        }

        if !self.template.has_part(part::CORE_PROPERTIES) {
            write_entry(
                &mut zip,
                options,
                part::CORE_PROPERTIES,
                &replacements[part::CORE_PROPERTIES],
            )?;
        }

        let writer = zip
            .finish()
            .map_err(|e| zip_err("Failed to finish package", e))?;
        log::info!(
            "Assembled package with {} new slide(s) from {}",
            rendered.len(),
            self.template.source()
        );
        Ok(writer)
    }

    /// Regenerated package parts, keyed by part name.
    fn regenerate_parts(
        &mut self,
        presentation: &Presentation,
        rendered: &[RenderedSlide],
    ) -> Result<BTreeMap<String, String>> {
        let mut replacements = BTreeMap::new();

        let mut types = ContentTypes::parse(&self.template.read_part(part::CONTENT_TYPES)?)?;
        let mut pres_rels =
            Relationships::parse(&self.template.read_part(part::PRESENTATION_RELS)?)?;
        let mut slide_rel_ids = Vec::with_capacity(rendered.len());

        for slide in rendered {
            types.add_override(&part::slide(slide.number), content_type::SLIDE);
            for media in &slide.media {
                let extension = &media.name.extension;
                types.add_default(extension, xml::media_content_type(extension));
            }
            slide_rel_ids.push(pres_rels.register(
                RelationshipKind::Slide,
                format!("slides/slide{}.xml", slide.number),
            ));
        }
        types.add_override(part::CORE_PROPERTIES, content_type::CORE_PROPERTIES);

        let presentation_xml = self.template.read_part(part::PRESENTATION)?;
        replacements.insert(
            part::PRESENTATION.to_string(),
            parts::patch_presentation_xml(&presentation_xml, &slide_rel_ids)?,
        );
        replacements.insert(part::PRESENTATION_RELS.to_string(), pres_rels.to_xml());

        let mut root_rels = Relationships::parse(&self.template.read_part(part::ROOT_RELS)?)?;
        if parts::ensure_core_properties_rel(&mut root_rels) {
            replacements.insert(part::ROOT_RELS.to_string(), root_rels.to_xml());
        }

        replacements.insert(
            part::CORE_PROPERTIES.to_string(),
            parts::core_properties_xml(presentation.title(), presentation.author(), Utc::now()),
        );
        replacements.insert(part::CONTENT_TYPES.to_string(), types.to_xml());

        Ok(replacements)
    }
}

fn write_entry<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    options: FileOptions,
    name: &str,
    content: &str,
) -> Result<()> {
    zip.start_file(name, options)
        .map_err(|e| zip_err(&format!("Failed to add '{}'", name), e))?;
    zip.write_all(content.as_bytes())?;
    Ok(())
}
