//! Package-level parts regenerated on every write: the content-types
//! manifest, the presentation part and the core document properties.

use crate::relationships::{RelationshipKind, Relationships};
use crate::xml::{self, escape, escape_text, ns};
use chrono::{DateTime, Utc};
use deck_core::{Error, Result};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::fmt::Write as FmtWrite;
use std::io::Cursor;

/// Lowest identifier PowerPoint accepts in `<p:sldId id="...">`.
pub const MIN_SLIDE_ID: u32 = 256;

/// Elements that must precede `<p:sldIdLst>` inside `<p:presentation>`.
const BEFORE_SLIDE_LIST: &[&[u8]] =
    &[b"sldMasterIdLst", b"notesMasterIdLst", b"handoutMasterIdLst"];

fn xml_err(e: quick_xml::Error) -> Error {
    Error::XmlError(format!("Error patching presentation part: {}", e))
}

/// The `[Content_Types].xml` manifest.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    pub fn parse(xml_content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml_content);
        reader.trim_text(true);
        let mut types = Self::default();

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    let local = xml::local_name(name.as_ref());
                    if local != b"Default" && local != b"Override" {
                        continue;
                    }
                    let mut key = String::new();
                    let mut content_type = String::new();
                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map_err(|e| {
                                Error::XmlError(format!("Bad content type attribute: {}", e))
                            })?
                            .into_owned();
                        match attr.key.as_ref() {
                            b"Extension" | b"PartName" => key = value,
                            b"ContentType" => content_type = value,
                            _ => {}
                        }
                    }
                    if local == b"Default" {
                        types.defaults.push((key, content_type));
                    } else {
                        types.overrides.push((key, content_type));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing content types: {}", e)))
                }
                _ => {}
            }
        }

        Ok(types)
    }

    /// Declare a content type for an extension unless one already exists.
    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        if !self.defaults.iter().any(|(ext, _)| ext.eq_ignore_ascii_case(extension)) {
            self.defaults.push((extension.to_string(), content_type.to_string()));
        }
    }

    /// Declare a content type for a part; `part_name` is relative to the
    /// package root without the leading slash.
    pub fn add_override(&mut self, part_name: &str, content_type: &str) {
        let part_name = format!("/{}", part_name.trim_start_matches('/'));
        match self.overrides.iter_mut().find(|(name, _)| name.eq_ignore_ascii_case(&part_name)) {
            Some(entry) => entry.1 = content_type.to_string(),
            None => self.overrides.push((part_name, content_type.to_string())),
        }
    }

    pub fn has_default(&self, extension: &str) -> bool {
        self.defaults.iter().any(|(ext, _)| ext.eq_ignore_ascii_case(extension))
    }

    pub fn has_override(&self, part_name: &str) -> bool {
        let part_name = format!("/{}", part_name.trim_start_matches('/'));
        self.overrides.iter().any(|(name, _)| name.eq_ignore_ascii_case(&part_name))
    }

    pub fn to_xml(&self) -> String {
        let entries = self.defaults.len() + self.overrides.len();
        let mut out = String::with_capacity(512 + entries * 128);
        out.push_str(xml::XML_DECLARATION);
        let _ = write!(out, r#"<Types xmlns="{}">"#, ns::CONTENT_TYPES);
        for (extension, content_type) in &self.defaults {
            let _ = write!(
                out,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape(extension),
                escape(content_type)
            );
        }
        for (part_name, content_type) in &self.overrides {
            let _ = write!(
                out,
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape(part_name),
                escape(content_type)
            );
        }
        out.push_str("</Types>");
        out
    }
}

/// Append `<p:sldId>` entries for `rel_ids` to a presentation part.
///
/// Everything else in the part is streamed through unchanged. Existing slide
/// entries are kept; new ids continue after the highest one (at least
/// [`MIN_SLIDE_ID`]). When the part has no slide list, one is inserted after
/// the master lists.
pub fn patch_presentation_xml(template_xml: &str, rel_ids: &[String]) -> Result<String> {
    let mut reader = Reader::from_str(template_xml);
    let capacity = template_xml.len() + rel_ids.len() * 48;
    let mut writer = Writer::new(Cursor::new(Vec::with_capacity(capacity)));

    let mut depth = 0usize;
    let mut prefix = String::new();
    let mut r_prefix = String::from("r");
    let mut in_slide_list = false;
    let mut next_id = MIN_SLIDE_ID;
    let mut inserted = false;

    loop {
        let event = reader.read_event().map_err(xml_err)?;
        match event {
            Event::Start(e) if depth == 0 => {
                let name = e.name();
                if xml::local_name(name.as_ref()) != b"presentation" {
                    return Err(Error::TemplateCorrupt(format!(
                        "presentation part has unexpected root <{}>",
                        String::from_utf8_lossy(name.as_ref())
                    )));
                }
                prefix = element_prefix(name.as_ref());
                let mut root = e.clone();
                match namespace_prefix(&e, ns::RELATIONSHIPS) {
                    Some(bound) => r_prefix = bound,
                    None => {
                        if namespace_prefix_taken(&e, "r") {
                            r_prefix = "rel".to_string();
                        }
                        let key = format!("xmlns:{}", r_prefix);
                        root.push_attribute((key.as_str(), ns::RELATIONSHIPS));
                    }
                }
                depth += 1;
                writer.write_event(Event::Start(root)).map_err(xml_err)?;
            }
            Event::Start(e) => {
                let name = e.name();
                let local = xml::local_name(name.as_ref());
                if in_slide_list && depth == 2 && local == b"sldId" {
                    if let Some(id) = attribute_u32(&e, b"id")? {
                        next_id = next_id.max(id.saturating_add(1));
                    }
                } else if depth == 1 && !inserted && local == b"sldIdLst" {
                    in_slide_list = true;
                } else if depth == 1 && !inserted && !BEFORE_SLIDE_LIST.contains(&local) {
                    write_slide_list(&mut writer, &prefix, &r_prefix, next_id, rel_ids)?;
                    inserted = true;
                }
                depth += 1;
                writer.write_event(Event::Start(e)).map_err(xml_err)?;
            }
            Event::Empty(e) => {
                let name = e.name();
                let local = xml::local_name(name.as_ref());
                if in_slide_list && depth == 2 && local == b"sldId" {
                    if let Some(id) = attribute_u32(&e, b"id")? {
                        next_id = next_id.max(id.saturating_add(1));
                    }
                    writer.write_event(Event::Empty(e)).map_err(xml_err)?;
                } else if depth == 1 && !inserted && local == b"sldIdLst" {
                    write_slide_list(&mut writer, &prefix, &r_prefix, next_id, rel_ids)?;
                    inserted = true;
                } else {
                    if depth == 1 && !inserted && !BEFORE_SLIDE_LIST.contains(&local) {
                        write_slide_list(&mut writer, &prefix, &r_prefix, next_id, rel_ids)?;
                        inserted = true;
                    }
                    writer.write_event(Event::Empty(e)).map_err(xml_err)?;
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if in_slide_list && depth == 1 {
                    write_slide_ids(&mut writer, &prefix, &r_prefix, next_id, rel_ids)?;
                    in_slide_list = false;
                    inserted = true;
                } else if depth == 0 && !inserted {
                    write_slide_list(&mut writer, &prefix, &r_prefix, next_id, rel_ids)?;
                    inserted = true;
                }
                writer.write_event(Event::End(e)).map_err(xml_err)?;
            }
            Event::Eof => break,
            other => writer.write_event(other).map_err(xml_err)?,
        }
    }

    if !inserted {
        return Err(Error::TemplateCorrupt("presentation part has no root element".to_string()));
    }

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| Error::XmlError(format!("Patched presentation part is not UTF-8: {}", e)))
}

fn write_slide_list(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    prefix: &str,
    r_prefix: &str,
    first_id: u32,
    rel_ids: &[String],
) -> Result<()> {
    let name = format!("{}sldIdLst", prefix);
    writer
        .write_event(Event::Start(BytesStart::new(name.as_str())))
        .map_err(xml_err)?;
    write_slide_ids(writer, prefix, r_prefix, first_id, rel_ids)?;
    writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(xml_err)?;
    Ok(())
}

fn write_slide_ids(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    prefix: &str,
    r_prefix: &str,
    first_id: u32,
    rel_ids: &[String],
) -> Result<()> {
    let r_id = format!("{}:id", r_prefix);
    for (offset, rel_id) in rel_ids.iter().enumerate() {
        let id = (first_id + offset as u32).to_string();
        let element = BytesStart::new(format!("{}sldId", prefix))
            .with_attributes([("id", id.as_str()), (r_id.as_str(), rel_id.as_str())]);
        writer.write_event(Event::Empty(element)).map_err(xml_err)?;
    }
    Ok(())
}

/// `"p:"` for `p:presentation`, empty for an unprefixed name.
fn element_prefix(name: &[u8]) -> String {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => format!("{}:", String::from_utf8_lossy(&name[..pos])),
        None => String::new(),
    }
}

fn namespace_prefix(element: &BytesStart, namespace: &str) -> Option<String> {
    element.attributes().flatten().find_map(|attr| {
        let key = attr.key.as_ref();
        let prefix = key.strip_prefix(b"xmlns:")?;
        (attr.value.as_ref() == namespace.as_bytes())
            .then(|| String::from_utf8_lossy(prefix).into_owned())
    })
}

fn namespace_prefix_taken(element: &BytesStart, prefix: &str) -> bool {
    let key = format!("xmlns:{}", prefix);
    element.attributes().flatten().any(|attr| attr.key.as_ref() == key.as_bytes())
}

fn attribute_u32(element: &BytesStart, key: &[u8]) -> Result<Option<u32>> {
    for attr in element.attributes().flatten() {
        if attr.key.as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::XmlError(format!("Bad attribute: {}", e)))?;
            return Ok(value.trim().parse::<u32>().ok());
        }
    }
    Ok(None)
}

/// `docProps/core.xml` with title, creator and timestamps.
pub fn core_properties_xml(title: &str, author: &str, now: DateTime<Utc>) -> String {
    let timestamp = now.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let mut out = String::with_capacity(768);
    out.push_str(xml::XML_DECLARATION);
    let _ = write!(
        out,
        concat!(
            r#"<cp:coreProperties xmlns:cp="{}" xmlns:dc="http://purl.org/dc/elements/1.1/" "#,
            r#"xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#
        ),
        ns::CORE_PROPERTIES
    );
    let _ = write!(out, "<dc:title>{}</dc:title>", escape_text(title));
    let _ = write!(out, "<dc:creator>{}</dc:creator>", escape_text(author));
    let _ = write!(out, "<cp:lastModifiedBy>{}</cp:lastModifiedBy>", escape_text(author));
    out.push_str("<cp:revision>1</cp:revision>");
    let _ = write!(
        out,
        r#"<dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>"#,
        timestamp
    );
    let _ = write!(
        out,
        r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{}</dcterms:modified>"#,
        timestamp
    );
    out.push_str("</cp:coreProperties>");
    out
}

/// Make sure the package root points at `docProps/core.xml`.
///
/// Returns true if a relationship was added.
pub fn ensure_core_properties_rel(root_rels: &mut Relationships) -> bool {
    if root_rels.contains_kind(RelationshipKind::CoreProperties) {
        return false;
    }
    root_rels.register(RelationshipKind::CoreProperties, crate::xml::part::CORE_PROPERTIES);
    true
}
