//! Slide part serialization.
//!
//! Renders each slide to `ppt/slides/slideN.xml` plus its relationship part,
//! registering layout, image and hyperlink relationships as shapes are
//! visited in push order.

use crate::relationships::{MediaName, MediaNames, RelationshipKind, Relationships};
use crate::xml::{escape, escape_text, ns, XML_DECLARATION};
use deck_core::{
    BoundingBox, Error, Picture, Presentation, Result, Shape, Slide, SlideRef, Table, TextBox,
};
use std::fmt::Write as FmtWrite;

const HYPERLINK_SLIDE_JUMP: &str = "ppaction://hlinksldjump";
const MEDIA_FALLBACK_EXTENSION: &str = "png";

fn fmt_err(e: std::fmt::Error) -> Error {
    Error::XmlError(e.to_string())
}

/// Image bytes destined for `ppt/media/`.
#[derive(Debug, Clone)]
pub struct MediaPart {
    pub name: MediaName,
    pub bytes: Vec<u8>,
}

/// A serialized slide with everything it references.
#[derive(Debug, Clone)]
pub struct RenderedSlide {
    /// Package slide number (`slideN.xml`).
    pub number: u32,
    pub xml: String,
    pub relationships: Relationships,
    pub media: Vec<MediaPart>,
}

/// Serializes the slides of one presentation.
///
/// Owns the media counter for the pass, so every write starts from fresh
/// numbering.
pub struct SlideWriter<'a> {
    presentation: &'a Presentation,
    slide_offset: u32,
    media: MediaNames,
}

impl<'a> SlideWriter<'a> {
    /// `slide_offset` and `media_offset` are the highest slide and image
    /// numbers already present in the template.
    pub fn new(presentation: &'a Presentation, slide_offset: u32, media_offset: u32) -> Self {
        Self {
            presentation,
            slide_offset,
            media: MediaNames::starting_after(media_offset),
        }
    }

    /// Package slide number for a 0-based slide position.
    pub fn package_number(&self, position: usize) -> u32 {
        self.slide_offset + position as u32 + 1
    }

    /// Render every slide in append order.
    ///
    /// All hyperlinks are resolved before any image is read.
    pub fn render_all(&mut self) -> Result<Vec<RenderedSlide>> {
        self.check_hyperlinks()?;
        let presentation = self.presentation;
        presentation
            .slides()
            .iter()
            .enumerate()
            .map(|(position, slide)| self.render(position, slide))
            .collect()
    }

    fn check_hyperlinks(&self) -> Result<()> {
        for (position, slide) in self.presentation.slides().iter().enumerate() {
            for shape in slide.shapes() {
                if let Some(target) = shape.hyperlink() {
                    self.resolve_link(position, shape.render_ref_id(), target)?;
                }
            }
        }
        Ok(())
    }

    fn resolve_link(&self, position: usize, shape_id: u32, target: SlideRef) -> Result<u32> {
        let index = self
            .presentation
            .slide_index_of(target)
            .ok_or(Error::DanglingHyperlink {
                slide: self.package_number(position) as usize,
                shape_id,
            })?;
        Ok(self.package_number(index))
    }

    /// Render one slide at a 0-based position.
    pub fn render(&mut self, position: usize, slide: &Slide) -> Result<RenderedSlide> {
        let number = self.package_number(position);
        let mut rels = Relationships::new();
        let mut media = Vec::new();

        rels.register(
            RelationshipKind::SlideLayout,
            format!("../slideLayouts/slideLayout{}.xml", slide.layout().index()),
        );

        let mut xml = String::with_capacity(2048 + slide.shapes().len() * 1024);
        xml.push_str(XML_DECLARATION);
        write!(
            xml,
            r#"<p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">"#,
            ns::DRAWINGML,
            ns::RELATIONSHIPS,
            ns::PRESENTATIONML
        )
        .map_err(fmt_err)?;
        xml.push_str("<p:cSld><p:spTree>");
        xml.push_str(
            r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
        );
        xml.push_str(concat!(
            "<p:grpSpPr><a:xfrm>",
            r#"<a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
            r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/>"#,
            "</a:xfrm></p:grpSpPr>"
        ));

        if !slide.title().is_empty() {
            write_title(&mut xml, slide)?;
        }

        for shape in slide.shapes() {
            let shape_id = shape.render_ref_id();

            if let Shape::Table(table) = shape {
                if table.column_count() == 0 {
                    log::warn!("Skipping table {} on slide {}: no columns", shape_id, number);
                    continue;
                }
            }

            let image_rel = match shape {
                Shape::Picture(picture) => {
                    let part = self.load_media(picture)?;
                    let rid = rels.register(RelationshipKind::Image, part.name.slide_target());
                    media.push(part);
                    Some(rid)
                }
                _ => None,
            };

            let link_rel = match shape.hyperlink() {
                Some(target) => {
                    let target_number = self.resolve_link(position, shape_id, target)?;
                    let target = format!("slide{}.xml", target_number);
                    Some(rels.register(RelationshipKind::Slide, target))
                }
                None => None,
            };

            match shape {
                Shape::TextBox(text) => {
                    write_text_box(&mut xml, shape_id, text, link_rel.as_deref())?
                }
                Shape::Picture(picture) => write_picture(
                    &mut xml,
                    shape_id,
                    picture,
                    image_rel.as_deref().unwrap_or_default(),
                    link_rel.as_deref(),
                )?,
                Shape::Table(table) => write_table(&mut xml, shape_id, table, link_rel.as_deref())?,
            }
        }

        xml.push_str("</p:spTree></p:cSld>");
        xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
        xml.push_str("</p:sld>");

        log::debug!(
            "Rendered slide {} with {} shapes and {} relationships",
            number,
            slide.shapes().len(),
            rels.len()
        );

        Ok(RenderedSlide {
            number,
            xml,
            relationships: rels,
            media,
        })
    }

    fn load_media(&mut self, picture: &Picture) -> Result<MediaPart> {
        let bytes = picture.resolve_bytes()?;
        let extension = picture.extension().filter(|e| !e.is_empty()).unwrap_or_else(|| {
            log::warn!(
                "{} has no file extension, storing it as .{}",
                picture.source().display(),
                MEDIA_FALLBACK_EXTENSION
            );
            MEDIA_FALLBACK_EXTENSION.to_string()
        });
        Ok(MediaPart {
            name: self.media.register(&extension),
            bytes,
        })
    }
}

fn write_title(xml: &mut String, slide: &Slide) -> Result<()> {
    let placeholder = if slide.layout().is_title() { "ctrTitle" } else { "title" };
    xml.push_str("<p:sp><p:nvSpPr>");
    xml.push_str(r#"<p:cNvPr id="2" name="Title 1"/>"#);
    xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#);
    write!(xml, r#"<p:nvPr><p:ph type="{}"/></p:nvPr>"#, placeholder).map_err(fmt_err)?;
    xml.push_str("</p:nvSpPr><p:spPr/>");
    xml.push_str("<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r>");
    xml.push_str(r#"<a:rPr lang="en-US" dirty="0"/>"#);
    write!(xml, "<a:t>{}</a:t>", escape_text(slide.title())).map_err(fmt_err)?;
    xml.push_str("</a:r></a:p></p:txBody></p:sp>");
    Ok(())
}

fn write_xfrm(xml: &mut String, tag: &str, bbox: BoundingBox) -> Result<()> {
    write!(
        xml,
        r#"<{tag}><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></{tag}>"#,
        bbox.x,
        bbox.y,
        bbox.width,
        bbox.height,
        tag = tag
    )
    .map_err(fmt_err)
}

fn write_hlink_click(xml: &mut String, rel_id: &str) -> Result<()> {
    write!(
        xml,
        r#"<a:hlinkClick r:id="{}" action="{}"/>"#,
        escape(rel_id),
        HYPERLINK_SLIDE_JUMP
    )
    .map_err(fmt_err)
}

/// `<p:cNvPr>` with an optional slide-jump hyperlink child.
fn write_c_nv_pr(
    xml: &mut String,
    id: u32,
    name: &str,
    descr: Option<&str>,
    link: Option<&str>,
) -> Result<()> {
    write!(xml, r#"<p:cNvPr id="{}" name="{} {}""#, id, name, id).map_err(fmt_err)?;
    if let Some(descr) = descr {
        write!(xml, r#" descr="{}""#, escape_text(descr)).map_err(fmt_err)?;
    }
    match link {
        Some(rid) => {
            xml.push('>');
            write_hlink_click(xml, rid)?;
            xml.push_str("</p:cNvPr>");
        }
        None => xml.push_str("/>"),
    }
    Ok(())
}

fn write_text_box(xml: &mut String, id: u32, text: &TextBox, link: Option<&str>) -> Result<()> {
    let lines: Vec<&str> = text
        .content()
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    // Without a text run the link sits on the shape itself.
    let has_runs = lines.iter().any(|line| !line.is_empty());
    let (shape_link, run_link) = if has_runs { (None, link) } else { (link, None) };

    xml.push_str("<p:sp><p:nvSpPr>");
    write_c_nv_pr(xml, id, "TextBox", None, shape_link)?;
    xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#);

    xml.push_str("<p:spPr>");
    write_xfrm(xml, "a:xfrm", text.bounding_box())?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/>"#);
    xml.push_str("</p:spPr>");

    xml.push_str("<p:txBody>");
    xml.push_str(r#"<a:bodyPr wrap="square" rtlCol="0"><a:spAutoFit/></a:bodyPr><a:lstStyle/>"#);

    let style = text.style();
    for line in lines {
        xml.push_str("<a:p>");
        if line.is_empty() {
            xml.push_str(r#"<a:endParaRPr lang="en-US" dirty="0"/>"#);
        } else {
            xml.push_str(r#"<a:r><a:rPr lang="en-US""#);
            if style.bold {
                xml.push_str(r#" b="1""#);
            }
            if style.italic {
                xml.push_str(r#" i="1""#);
            }
            xml.push_str(r#" dirty="0""#);
            match run_link {
                Some(rid) => {
                    xml.push('>');
                    write_hlink_click(xml, rid)?;
                    xml.push_str("</a:rPr>");
                }
                None => xml.push_str("/>"),
            }
            write!(xml, "<a:t>{}</a:t></a:r>", escape_text(line)).map_err(fmt_err)?;
        }
        xml.push_str("</a:p>");
    }

    xml.push_str("</p:txBody></p:sp>");
    Ok(())
}

fn write_picture(
    xml: &mut String,
    id: u32,
    picture: &Picture,
    image_rel: &str,
    link: Option<&str>,
) -> Result<()> {
    let descr = picture
        .source()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    xml.push_str("<p:pic><p:nvPicPr>");
    write_c_nv_pr(xml, id, "Picture", Some(&descr), link)?;
    xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/>"#);
    xml.push_str("</p:nvPicPr>");

    xml.push_str("<p:blipFill>");
    write!(xml, r#"<a:blip r:embed="{}"/>"#, escape(image_rel)).map_err(fmt_err)?;
    xml.push_str("<a:stretch><a:fillRect/></a:stretch></p:blipFill>");

    xml.push_str("<p:spPr>");
    write_xfrm(xml, "a:xfrm", picture.bounding_box())?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
    xml.push_str("</p:spPr></p:pic>");
    Ok(())
}

/// Split `total` into `parts` integer lengths; the last absorbs the remainder.
fn split_evenly(total: i64, parts: usize) -> Vec<i64> {
    if parts == 0 {
        return Vec::new();
    }
    let base = total / parts as i64;
    let mut lengths = vec![base; parts];
    lengths[parts - 1] = total - base * (parts as i64 - 1);
    lengths
}

fn write_table(xml: &mut String, id: u32, table: &Table, link: Option<&str>) -> Result<()> {
    let bbox = table.bounding_box();
    let columns = table.column_count();
    let rows = table.row_count();

    xml.push_str("<p:graphicFrame><p:nvGraphicFramePr>");
    write_c_nv_pr(xml, id, "Table", None, link)?;
    xml.push_str(
        r#"<p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr><p:nvPr/>"#,
    );
    xml.push_str("</p:nvGraphicFramePr>");
    write_xfrm(xml, "p:xfrm", bbox)?;

    write!(
        xml,
        r#"<a:graphic><a:graphicData uri="{}"><a:tbl>"#,
        ns::DRAWINGML_TABLE
    )
    .map_err(fmt_err)?;
    xml.push_str(r#"<a:tblPr firstRow="1" bandRow="1"/>"#);

    xml.push_str("<a:tblGrid>");
    for width in split_evenly(bbox.width, columns) {
        write!(xml, r#"<a:gridCol w="{}"/>"#, width).map_err(fmt_err)?;
    }
    xml.push_str("</a:tblGrid>");

    for (row, height) in split_evenly(bbox.height, rows).into_iter().enumerate() {
        write!(xml, r#"<a:tr h="{}">"#, height).map_err(fmt_err)?;
        for column in 0..columns {
            xml.push_str("<a:tc><a:txBody><a:bodyPr/><a:lstStyle/><a:p>");
            let cell = table.cell(row, column);
            if cell.is_empty() {
                xml.push_str(r#"<a:endParaRPr lang="en-US" dirty="0"/>"#);
            } else {
                write!(
                    xml,
                    r#"<a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r>"#,
                    escape_text(&cell)
                )
                .map_err(fmt_err)?;
            }
            xml.push_str("</a:p></a:txBody><a:tcPr/></a:tc>");
        }
        xml.push_str("</a:tr>");
    }

    xml.push_str("</a:tbl></a:graphicData></a:graphic></p:graphicFrame>");
    Ok(())
}
