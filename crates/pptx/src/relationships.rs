//! Relationship and media-name bookkeeping for one serialization pass.
//!
//! Each part owns a [`Relationships`] set whose ids (`rId1`, `rId2`, ...) are
//! unique only within that part. Media file names come from a single
//! package-wide [`MediaNames`] counter.

use crate::xml::{self, escape, ns, rel_type};
use deck_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::fmt::Write as FmtWrite;
use std::sync::LazyLock;

static REL_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^rId(\d+)$").unwrap());

/// What a relationship points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    SlideLayout,
    Image,
    /// A slide, either from the presentation part or as a hyperlink target.
    Slide,
    CoreProperties,
}

impl RelationshipKind {
    pub fn uri(self) -> &'static str {
        match self {
            RelationshipKind::SlideLayout => rel_type::SLIDE_LAYOUT,
            RelationshipKind::Image => rel_type::IMAGE,
            RelationshipKind::Slide => rel_type::SLIDE,
            RelationshipKind::CoreProperties => rel_type::CORE_PROPERTIES,
        }
    }
}

/// A single `<Relationship>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// The relationships of one part, in registration order.
#[derive(Debug, Clone)]
pub struct Relationships {
    entries: Vec<Relationship>,
    next_id: u32,
}

impl Relationships {
    /// Empty set; the first registered id is `rId1`.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Continue an existing set; new ids start after the highest `rIdN`.
    pub fn continuing(existing: Vec<Relationship>) -> Self {
        let max = existing
            .iter()
            .filter_map(|r| REL_ID_REGEX.captures(&r.id))
            .filter_map(|c| c[1].parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        Self {
            entries: existing,
            next_id: max + 1,
        }
    }

    /// Parse a template `.rels` part and continue numbering after it.
    pub fn parse(xml_content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml_content);
        reader.trim_text(true);
        let mut existing = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if xml::local_name(e.name().as_ref()) == b"Relationship" =>
                {
                    let mut rel = Relationship {
                        id: String::new(),
                        rel_type: String::new(),
                        target: String::new(),
                        external: false,
                    };
                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map_err(|e| {
                                Error::XmlError(format!("Bad relationship attribute: {}", e))
                            })?
                            .into_owned();
                        match attr.key.as_ref() {
                            b"Id" => rel.id = value,
                            b"Type" => rel.rel_type = value,
                            b"Target" => rel.target = value,
                            b"TargetMode" => rel.external = value == "External",
                            _ => {}
                        }
                    }
                    existing.push(rel);
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing relationships: {}", e)));
                }
                _ => {}
            }
        }

        Ok(Self::continuing(existing))
    }

    /// Register a new relationship and return its id.
    pub fn register(&mut self, kind: RelationshipKind, target: impl Into<String>) -> String {
        let id = format!("rId{}", self.next_id);
        self.next_id += 1;
        self.entries.push(Relationship {
            id: id.clone(),
            rel_type: kind.uri().to_string(),
            target: target.into(),
            external: false,
        });
        id
    }

    /// Whether any relationship has the given kind.
    pub fn contains_kind(&self, kind: RelationshipKind) -> bool {
        self.entries.iter().any(|r| r.rel_type == kind.uri())
    }

    /// Relationships in registration order.
    pub fn entries(&self) -> &[Relationship] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the `.rels` part.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(256 + self.entries.len() * 160);
        out.push_str(xml::XML_DECLARATION);
        let _ = write!(out, r#"<Relationships xmlns="{}">"#, ns::PACKAGE_RELATIONSHIPS);
        for rel in &self.entries {
            let _ = write!(
                out,
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape(&rel.id),
                escape(&rel.rel_type),
                escape(&rel.target)
            );
            if rel.external {
                out.push_str(r#" TargetMode="External""#);
            }
            out.push_str("/>");
        }
        out.push_str("</Relationships>");
        out
    }
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new()
    }
}

/// A media file name handed out by [`MediaNames`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaName {
    pub number: u32,
    pub extension: String,
}

impl MediaName {
    /// File name inside `ppt/media/`, e.g. `image3.png`.
    pub fn file_name(&self) -> String {
        format!("image{}.{}", self.number, self.extension)
    }

    /// Target relative to a slide part.
    pub fn slide_target(&self) -> String {
        format!("../media/{}", self.file_name())
    }
}

/// Package-wide counter for `ppt/media/imageN.ext` names.
///
/// Every registration yields a new name; identical sources are not shared.
#[derive(Debug, Clone)]
pub struct MediaNames {
    next: u32,
}

impl MediaNames {
    /// Start numbering after `existing` images already in the package.
    pub fn starting_after(existing: u32) -> Self {
        Self { next: existing + 1 }
    }

    pub fn register(&mut self, extension: &str) -> MediaName {
        let name = MediaName {
            number: self.next,
            extension: extension.to_string(),
        };
        self.next += 1;
        name
    }
}

impl Default for MediaNames {
    fn default() -> Self {
        Self::starting_after(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic_from_one() {
        let mut rels = Relationships::new();
        assert_eq!(
            rels.register(RelationshipKind::SlideLayout, "../slideLayouts/slideLayout1.xml"),
            "rId1"
        );
        assert_eq!(rels.register(RelationshipKind::Image, "../media/image1.png"), "rId2");
        assert_eq!(rels.register(RelationshipKind::Slide, "slide2.xml"), "rId3");
        assert_eq!(rels.len(), 3);
        assert_eq!(rels.entries()[1].rel_type, rel_type::IMAGE);
    }

    #[test]
    fn test_parse_continues_after_highest_id() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId3"
    Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme"
    Target="theme/theme1.xml"/>
  <Relationship Id="rId1"
    Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster"
    Target="slideMasters/slideMaster1.xml"/>
  <Relationship Id="custom" Type="urn:x" Target="http://example.com/?a=1&amp;b=2"
    TargetMode="External"/>
</Relationships>"#;
        let mut rels = Relationships::parse(xml).unwrap();
        assert_eq!(rels.len(), 3);
        assert!(rels.entries()[2].external);
        assert_eq!(rels.entries()[2].target, "http://example.com/?a=1&b=2");
        assert_eq!(rels.register(RelationshipKind::Slide, "slides/slide1.xml"), "rId4");
    }

    #[test]
    fn test_to_xml_escapes_and_keeps_order() {
        let mut rels = Relationships::new();
        rels.register(RelationshipKind::SlideLayout, "../slideLayouts/slideLayout2.xml");
        rels.register(RelationshipKind::Slide, "slide1.xml");
        let xml = rels.to_xml();
        let layout = xml.find("slideLayout2.xml").unwrap();
        let slide = xml.find(r#"Target="slide1.xml""#).unwrap();
        assert!(layout < slide);

        let external = Relationships::continuing(vec![Relationship {
            id: "rId1".into(),
            rel_type: "urn:x".into(),
            target: "a&b".into(),
            external: true,
        }]);
        let xml = external.to_xml();
        assert!(xml.contains(r#"Target="a&amp;b" TargetMode="External""#));
    }

    #[test]
    fn test_media_names_do_not_dedup() {
        let mut media = MediaNames::default();
        let a = media.register("png");
        let b = media.register("png");
        assert_eq!(a.file_name(), "image1.png");
        assert_eq!(b.file_name(), "image2.png");
        assert_eq!(b.slide_target(), "../media/image2.png");

        let mut continued = MediaNames::starting_after(4);
        assert_eq!(continued.register("jpg").file_name(), "image5.jpg");
    }
}
