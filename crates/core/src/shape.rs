//! Placeable slide content: text boxes, pictures and tables.
//!
//! Every shape is built from millimeter inputs through a builder and stores
//! its frame in EMUs from then on.

use crate::error::{Error, Result};
use crate::slide::SlideRef;
use crate::table::{TableContent, Tabular};
use crate::units::{to_native, Emu};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_TEXT_OFFSET_MM: f64 = 50.0;
const DEFAULT_TEXT_WIDTH_MM: f64 = 40.0;
const DEFAULT_TEXT_HEIGHT_MM: f64 = 30.0;

const DEFAULT_PICTURE_WIDTH_MM: f64 = 40.0;
const FALLBACK_PICTURE_HEIGHT_MM: f64 = 30.0;

const DEFAULT_TABLE_OFFSET_MM: f64 = 50.0;
const DEFAULT_TABLE_WIDTH_MM: f64 = 150.0;
const DEFAULT_TABLE_HEIGHT_MM: f64 = 100.0;

/// Position and size of a shape, in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub x: Emu,
    pub y: Emu,
    pub width: Emu,
    pub height: Emu,
}

impl BoundingBox {
    /// Build a bounding box from millimeter values.
    pub fn from_mm(x: f64, y: f64, width: f64, height: f64) -> Result<Self> {
        Ok(Self {
            x: to_native(x)?,
            y: to_native(y)?,
            width: to_native(width)?,
            height: to_native(height)?,
        })
    }
}

/// State shared by every shape variant.
#[derive(Debug, Clone, Default)]
struct Frame {
    bbox: BoundingBox,
    hyperlink: Option<SlideRef>,
    /// Id within the owning slide; zero until pushed.
    ref_id: u32,
}

/// Character style flags for a text box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

/// Any shape that can be placed on a slide.
#[derive(Debug, Clone)]
pub enum Shape {
    TextBox(TextBox),
    Picture(Picture),
    Table(Table),
}

impl Shape {
    fn frame(&self) -> &Frame {
        match self {
            Shape::TextBox(s) => &s.frame,
            Shape::Picture(s) => &s.frame,
            Shape::Table(s) => &s.frame,
        }
    }

    fn frame_mut(&mut self) -> &mut Frame {
        match self {
            Shape::TextBox(s) => &mut s.frame,
            Shape::Picture(s) => &mut s.frame,
            Shape::Table(s) => &mut s.frame,
        }
    }

    /// Position and size in EMUs.
    pub fn bounding_box(&self) -> BoundingBox {
        self.frame().bbox
    }

    /// Shape id unique within the slide this shape was pushed into.
    pub fn render_ref_id(&self) -> u32 {
        self.frame().ref_id
    }

    pub(crate) fn set_render_ref_id(&mut self, id: u32) {
        self.frame_mut().ref_id = id;
    }

    /// Slide this shape links to, if any.
    pub fn hyperlink(&self) -> Option<SlideRef> {
        self.frame().hyperlink
    }

    /// Set or clear the slide this shape links to.
    pub fn set_hyperlink(&mut self, target: Option<SlideRef>) {
        self.frame_mut().hyperlink = target;
    }

    /// Human-readable name of the variant, used for element names.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::TextBox(_) => "TextBox",
            Shape::Picture(_) => "Picture",
            Shape::Table(_) => "Table",
        }
    }
}

impl From<TextBox> for Shape {
    fn from(shape: TextBox) -> Self {
        Shape::TextBox(shape)
    }
}

impl From<Picture> for Shape {
    fn from(shape: Picture) -> Self {
        Shape::Picture(shape)
    }
}

impl From<Table> for Shape {
    fn from(shape: Table) -> Self {
        Shape::Table(shape)
    }
}

/// A text box.
#[derive(Debug, Clone)]
pub struct TextBox {
    content: String,
    style: TextStyle,
    frame: Frame,
}

impl TextBox {
    /// Start building a text box with the given content.
    pub fn builder(content: impl Into<String>) -> TextBoxBuilder {
        TextBoxBuilder {
            content: content.into(),
            style: TextStyle::default(),
            offset: (DEFAULT_TEXT_OFFSET_MM, DEFAULT_TEXT_OFFSET_MM),
            size: (DEFAULT_TEXT_WIDTH_MM, DEFAULT_TEXT_HEIGHT_MM),
            hyperlink: None,
        }
    }

    /// Build a text box with default position and size.
    pub fn new(content: impl Into<String>) -> Result<Self> {
        Self::builder(content).build()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn style(&self) -> TextStyle {
        self.style
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.frame.bbox
    }

    /// Set or clear the slide this text box links to.
    pub fn set_hyperlink(&mut self, target: Option<SlideRef>) {
        self.frame.hyperlink = target;
    }
}

/// Builder for [`TextBox`]. Offsets and sizes are in millimeters.
#[derive(Debug, Clone)]
pub struct TextBoxBuilder {
    content: String,
    style: TextStyle,
    offset: (f64, f64),
    size: (f64, f64),
    hyperlink: Option<SlideRef>,
}

impl TextBoxBuilder {
    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset = (x, y);
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = (width, height);
        self
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.style.bold = bold;
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.style.italic = italic;
        self
    }

    /// Link the text to another slide of the same presentation.
    pub fn with_hyperlink(mut self, target: SlideRef) -> Self {
        self.hyperlink = Some(target);
        self
    }

    /// Convert dimensions to EMUs and build the text box.
    pub fn build(self) -> Result<TextBox> {
        Ok(TextBox {
            content: self.content,
            style: self.style,
            frame: Frame {
                bbox: BoundingBox::from_mm(self.offset.0, self.offset.1, self.size.0, self.size.1)?,
                hyperlink: self.hyperlink,
                ref_id: 0,
            },
        })
    }
}

/// A picture backed by an image file.
///
/// The file is only read when the presentation is written.
#[derive(Debug, Clone)]
pub struct Picture {
    source: PathBuf,
    frame: Frame,
}

impl Picture {
    /// Start building a picture from an image path.
    pub fn builder(source: impl Into<PathBuf>) -> PictureBuilder {
        PictureBuilder {
            source: source.into(),
            offset: (0.0, 0.0),
            size_x: None,
            size_y: None,
            hyperlink: None,
        }
    }

    /// Build a picture at the top-left corner, sized from the image.
    pub fn new(source: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(source).build()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.frame.bbox
    }

    /// Set or clear the slide this picture links to.
    pub fn set_hyperlink(&mut self, target: Option<SlideRef>) {
        self.frame.hyperlink = target;
    }

    /// Read the image bytes.
    pub fn resolve_bytes(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.source).map_err(|e| Error::AssetNotFound {
            path: self.source.clone(),
            source: e,
        })
    }

    /// Pixel size of the source image, or `None` when it cannot be read
    /// (missing file, vector format, unknown codec).
    pub fn intrinsic_size(&self) -> Option<(u32, u32)> {
        read_dimensions(&self.source)
    }

    /// Lowercase file extension of the source, used to name the media part.
    pub fn extension(&self) -> Option<String> {
        self.source
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

fn read_dimensions(path: &Path) -> Option<(u32, u32)> {
    let reader = match image::ImageReader::open(path).and_then(|r| r.with_guessed_format()) {
        Ok(reader) => reader,
        Err(e) => {
            log::debug!("Cannot open {} for size probing: {}", path.display(), e);
            return None;
        }
    };
    match reader.into_dimensions() {
        Ok((w, h)) if w > 0 && h > 0 => Some((w, h)),
        Ok(_) => None,
        Err(e) => {
            log::warn!("Unrecognized image {}: {}", path.display(), e);
            None
        }
    }
}

/// Builder for [`Picture`]. Offsets and sizes are in millimeters.
#[derive(Debug, Clone)]
pub struct PictureBuilder {
    source: PathBuf,
    offset: (f64, f64),
    size_x: Option<f64>,
    size_y: Option<f64>,
    hyperlink: Option<SlideRef>,
}

impl PictureBuilder {
    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset = (x, y);
        self
    }

    /// Set the width; the height follows the image aspect ratio unless also set.
    pub fn with_width(mut self, width: f64) -> Self {
        self.size_x = Some(width);
        self
    }

    /// Set the height; the width follows the image aspect ratio unless also set.
    pub fn with_height(mut self, height: f64) -> Self {
        self.size_y = Some(height);
        self
    }

    /// Set both width and height, ignoring the image aspect ratio.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size_x = Some(width);
        self.size_y = Some(height);
        self
    }

    pub fn with_hyperlink(mut self, target: SlideRef) -> Self {
        self.hyperlink = Some(target);
        self
    }

    /// Convert dimensions to EMUs, probing the image when a side is missing.
    pub fn build(self) -> Result<Picture> {
        let x = to_native(self.offset.0)?;
        let y = to_native(self.offset.1)?;
        let (width, height) = match (self.size_x, self.size_y) {
            (Some(w), Some(h)) => (to_native(w)?, to_native(h)?),
            (size_x, size_y) => fit_to_image(size_x, size_y, read_dimensions(&self.source))?,
        };

        Ok(Picture {
            source: self.source,
            frame: Frame {
                bbox: BoundingBox { x, y, width, height },
                hyperlink: self.hyperlink,
                ref_id: 0,
            },
        })
    }
}

/// Derive the missing side(s) of a picture from its pixel aspect ratio.
fn fit_to_image(
    size_x: Option<f64>,
    size_y: Option<f64>,
    intrinsic: Option<(u32, u32)>,
) -> Result<(Emu, Emu)> {
    let Some((px_w, px_h)) = intrinsic else {
        return Ok((
            to_native(size_x.unwrap_or(DEFAULT_PICTURE_WIDTH_MM))?,
            to_native(size_y.unwrap_or(FALLBACK_PICTURE_HEIGHT_MM))?,
        ));
    };
    let ratio = px_h as f64 / px_w as f64;

    match (size_x, size_y) {
        (None, Some(h)) => {
            let height = to_native(h)?;
            Ok(((height as f64 / ratio).round() as Emu, height))
        }
        (w, _) => {
            let width = to_native(w.unwrap_or(DEFAULT_PICTURE_WIDTH_MM))?;
            Ok((width, (width as f64 * ratio).round() as Emu))
        }
    }
}

/// A table of text cells. The first emitted row is the column header.
#[derive(Debug, Clone)]
pub struct Table {
    content: TableContent,
    frame: Frame,
}

impl Table {
    /// Start building a table from content.
    pub fn builder(content: TableContent) -> TableBuilder {
        TableBuilder {
            content,
            offset: (DEFAULT_TABLE_OFFSET_MM, DEFAULT_TABLE_OFFSET_MM),
            size: (DEFAULT_TABLE_WIDTH_MM, DEFAULT_TABLE_HEIGHT_MM),
            hyperlink: None,
        }
    }

    /// Build a table from any tabular source with default position and size.
    pub fn from_tabular<T: Tabular + ?Sized>(source: &T) -> Result<Self> {
        Self::builder(TableContent::from_tabular(source)).build()
    }

    pub fn content(&self) -> &TableContent {
        &self.content
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.frame.bbox
    }

    /// Set or clear the slide this table links to.
    pub fn set_hyperlink(&mut self, target: Option<SlideRef>) {
        self.frame.hyperlink = target;
    }

    /// Number of emitted rows, header included.
    pub fn row_count(&self) -> usize {
        self.content.rows.len() + 1
    }

    pub fn column_count(&self) -> usize {
        self.content.columns.len()
    }

    /// Text of an emitted cell; row 0 is the header.
    pub fn cell(&self, row: usize, column: usize) -> String {
        if row == 0 {
            self.content.columns.get(column).cloned().unwrap_or_default()
        } else {
            self.content.cell(row - 1, column)
        }
    }
}

/// Builder for [`Table`]. Offsets and sizes are in millimeters.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    content: TableContent,
    offset: (f64, f64),
    size: (f64, f64),
    hyperlink: Option<SlideRef>,
}

impl TableBuilder {
    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset = (x, y);
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = (width, height);
        self
    }

    pub fn with_hyperlink(mut self, target: SlideRef) -> Self {
        self.hyperlink = Some(target);
        self
    }

    pub fn build(self) -> Result<Table> {
        Ok(Table {
            content: self.content,
            frame: Frame {
                bbox: BoundingBox::from_mm(self.offset.0, self.offset.1, self.size.0, self.size.1)?,
                hyperlink: self.hyperlink,
                ref_id: 0,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_box_defaults() {
        let text = TextBox::new("Hello world!").unwrap();
        assert_eq!(
            text.bounding_box(),
            BoundingBox { x: 1_800_000, y: 1_800_000, width: 1_440_000, height: 1_080_000 }
        );
        assert_eq!(text.style(), TextStyle::default());
    }

    #[test]
    fn test_text_box_custom_width() {
        let text = TextBox::builder("Hello world!").with_size(30.0, 30.0).build().unwrap();
        assert_eq!(text.bounding_box().width, 1_080_000);
        assert_eq!(text.bounding_box().height, 1_080_000);
    }

    #[test]
    fn test_negative_offset_rejected() {
        let result = TextBox::builder("x").with_offset(-5.0, 0.0).build();
        assert!(matches!(result, Err(Error::InvalidDimension(v)) if v == -5.0));
    }

    #[test]
    fn test_picture_explicit_size_skips_image_read() {
        let pic = Picture::builder("does/not/exist.svg").with_size(40.0, 30.0).build().unwrap();
        assert_eq!(pic.bounding_box().width, 1_440_000);
        assert_eq!(pic.bounding_box().height, 1_080_000);
    }

    #[test]
    fn test_picture_unknown_size_falls_back() {
        let pic = Picture::new("does/not/exist.png").unwrap();
        assert_eq!(
            pic.bounding_box(),
            BoundingBox {
                x: 0,
                y: 0,
                width: 1_440_000,
                height: 1_080_000
            }
        );
        assert!(pic.intrinsic_size().is_none());
    }

    #[test]
    fn test_picture_keeps_aspect_ratio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        image::RgbImage::new(200, 100).save(&path).unwrap();

        let pic = Picture::new(&path).unwrap();
        assert_eq!(pic.intrinsic_size(), Some((200, 100)));
        assert_eq!(pic.bounding_box().width, 1_440_000);
        assert_eq!(pic.bounding_box().height, 720_000);

        let tall = Picture::builder(&path).with_height(10.0).build().unwrap();
        assert_eq!(tall.bounding_box().width, 720_000);
        assert_eq!(tall.bounding_box().height, 360_000);
    }

    #[test]
    fn test_picture_missing_asset() {
        let pic = Picture::new("nowhere/missing.jpg").unwrap();
        assert!(matches!(pic.resolve_bytes(), Err(Error::AssetNotFound { .. })));
        assert_eq!(pic.extension().as_deref(), Some("jpg"));
    }

    #[test]
    fn test_table_cells_include_header() {
        let content = TableContent::new(["a", "b", "c"], vec![vec![1, 3, 5], vec![2, 4, 6]]);
        let table = Table::builder(content).with_size(30.0, 100.0).build().unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.cell(0, 1), "b");
        assert_eq!(table.cell(2, 2), "6");
        assert_eq!(table.bounding_box().width, 1_080_000);
        assert_eq!(table.bounding_box().height, 3_600_000);
    }

    #[test]
    fn test_shape_dispatch() {
        let shape: Shape = TextBox::new("t").unwrap().into();
        assert_eq!(shape.kind_name(), "TextBox");
        assert_eq!(shape.render_ref_id(), 0);
        assert!(shape.hyperlink().is_none());
    }
}
