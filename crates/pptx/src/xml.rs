//! XML constants and text helpers shared by the part writers.

use std::borrow::Cow;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub mod ns {
    pub const PRESENTATIONML: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
    pub const DRAWINGML: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
    pub const DRAWINGML_TABLE: &str = "http://schemas.openxmlformats.org/drawingml/2006/table";
    pub const RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    pub const PACKAGE_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships";
    pub const CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
}

pub mod rel_type {
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
}

pub mod content_type {
    pub const SLIDE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
}

/// Package part names this crate reads or regenerates.
pub mod part {
    pub const CONTENT_TYPES: &str = "[Content_Types].xml";
    pub const ROOT_RELS: &str = "_rels/.rels";
    pub const PRESENTATION: &str = "ppt/presentation.xml";
    pub const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";
    pub const CORE_PROPERTIES: &str = "docProps/core.xml";

    pub fn slide(number: u32) -> String {
        format!("ppt/slides/slide{}.xml", number)
    }

    pub fn slide_rels(number: u32) -> String {
        format!("ppt/slides/_rels/slide{}.xml.rels", number)
    }

    pub fn slide_layout(index: u32) -> String {
        format!("ppt/slideLayouts/slideLayout{}.xml", index)
    }

    pub fn media(file_name: &str) -> String {
        format!("ppt/media/{}", file_name)
    }
}

/// Escape the five XML special characters in text or attribute values.
pub fn escape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Escape user text for character data, dropping characters XML 1.0 forbids.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        return escape(text);
    }
    let cleaned: String = text.chars().filter(|&c| is_xml_char(c)).collect();
    Cow::Owned(escape(&cleaned).into_owned())
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\u{9}'
            | '\u{A}'
            | '\u{D}'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Content type for a media file extension.
pub fn media_content_type(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" | "jpe" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "application/octet-stream",
    }
}

/// Local part of a possibly prefixed element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_all_special_characters() {
        assert_eq!(escape(r#"<b>&"tag"</b>"#), "&lt;b&gt;&amp;&quot;tag&quot;&lt;/b&gt;");
        assert_eq!(escape("it's"), "it&apos;s");
        assert_eq!(escape(""), "");
        assert!(matches!(escape("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_text_drops_control_characters() {
        assert_eq!(escape_text("a\u{0}b\u{1B}c"), "abc");
        assert_eq!(escape_text("tab\there"), "tab\there");
        assert_eq!(escape_text("<\u{8}>"), "&lt;&gt;");
    }

    #[test]
    fn test_media_content_type() {
        assert_eq!(media_content_type("jpg"), "image/jpeg");
        assert_eq!(media_content_type("svg"), "image/svg+xml");
        assert_eq!(media_content_type("xyz"), "application/octet-stream");
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sldIdLst"), b"sldIdLst");
        assert_eq!(local_name(b"Override"), b"Override");
    }

    #[test]
    fn test_part_names() {
        assert_eq!(part::slide(3), "ppt/slides/slide3.xml");
        assert_eq!(part::slide_rels(3), "ppt/slides/_rels/slide3.xml.rels");
        assert_eq!(part::slide_layout(2), "ppt/slideLayouts/slideLayout2.xml");
        assert_eq!(part::media("image1.png"), "ppt/media/image1.png");
    }
}
