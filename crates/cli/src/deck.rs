//! JSON deck descriptions.

use anyhow::{bail, Context, Result};
use deck_core::{
    Layout, Picture, Presentation, Shape, Slide, SlideRef, Table, TableContent, TextBox, TextStyle,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A deck document, as read from disk.
#[derive(Debug, Deserialize)]
pub struct Deck {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub slides: Vec<SlideSpec>,
}

#[derive(Debug, Deserialize)]
pub struct SlideSpec {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub shapes: Vec<ShapeSpec>,
}

/// One shape. Offsets and sizes are `[x, y]` / `[width, height]` in mm;
/// `hyperlink` is the 0-based index of the target slide.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeSpec {
    TextBox {
        content: String,
        #[serde(default)]
        offset: Option<[f64; 2]>,
        #[serde(default)]
        size: Option<[f64; 2]>,
        #[serde(default)]
        style: TextStyle,
        #[serde(default)]
        hyperlink: Option<usize>,
    },
    Picture {
        path: PathBuf,
        #[serde(default)]
        offset: Option<[f64; 2]>,
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        height: Option<f64>,
        #[serde(default)]
        hyperlink: Option<usize>,
    },
    Table {
        columns: Vec<String>,
        #[serde(default)]
        rows: Vec<Vec<serde_json::Value>>,
        #[serde(default)]
        offset: Option<[f64; 2]>,
        #[serde(default)]
        size: Option<[f64; 2]>,
        #[serde(default)]
        hyperlink: Option<usize>,
    },
}

impl Deck {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Invalid deck description in {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build the presentation. Relative picture paths are resolved against
    /// `base_dir`.
    pub fn into_presentation(self, base_dir: &Path) -> Result<Presentation> {
        let mut slides: Vec<Slide> = self
            .slides
            .iter()
            .map(|s| Slide::with_title(s.title.clone()).with_layout(s.layout))
            .collect();
        let handles: Vec<SlideRef> = slides.iter().map(Slide::handle).collect();

        for (index, spec) in self.slides.into_iter().enumerate() {
            for (position, shape) in spec.shapes.into_iter().enumerate() {
                let shape = build_shape(shape, base_dir, &handles)
                    .with_context(|| format!("slide {}, shape {}", index, position))?;
                slides[index].push(shape);
            }
        }

        let title = self.title.unwrap_or_else(|| "unknown".to_string());
        let mut presentation = Presentation::from_slides(slides, title);
        if let Some(author) = self.author {
            presentation = presentation.with_author(author);
        }
        Ok(presentation)
    }
}

fn link(target: Option<usize>, handles: &[SlideRef]) -> Result<Option<SlideRef>> {
    match target {
        None => Ok(None),
        Some(index) => match handles.get(index) {
            Some(handle) => Ok(Some(*handle)),
            None => bail!(
                "hyperlink to slide {} but the deck has {} slide(s)",
                index,
                handles.len()
            ),
        },
    }
}

fn build_shape(spec: ShapeSpec, base_dir: &Path, handles: &[SlideRef]) -> Result<Shape> {
    let shape: Shape = match spec {
        ShapeSpec::TextBox { content, offset, size, style, hyperlink } => {
            let mut builder = TextBox::builder(content).with_style(style);
            if let Some([x, y]) = offset {
                builder = builder.with_offset(x, y);
            }
            if let Some([w, h]) = size {
                builder = builder.with_size(w, h);
            }
            if let Some(target) = link(hyperlink, handles)? {
                builder = builder.with_hyperlink(target);
            }
            builder.build()?.into()
        }
        ShapeSpec::Picture { path, offset, width, height, hyperlink } => {
            let path = if path.is_relative() { base_dir.join(path) } else { path };
            let mut builder = Picture::builder(path);
            if let Some([x, y]) = offset {
                builder = builder.with_offset(x, y);
            }
            if let Some(w) = width {
                builder = builder.with_width(w);
            }
            if let Some(h) = height {
                builder = builder.with_height(h);
            }
            if let Some(target) = link(hyperlink, handles)? {
                builder = builder.with_hyperlink(target);
            }
            builder.build()?.into()
        }
        ShapeSpec::Table { columns, rows, offset, size, hyperlink } => {
            let mut content = TableContent {
                columns,
                rows: Vec::with_capacity(rows.len()),
            };
            for row in rows {
                content.rows.push(row.iter().map(cell_text).collect());
            }
            let mut builder = Table::builder(content);
            if let Some([x, y]) = offset {
                builder = builder.with_offset(x, y);
            }
            if let Some([w, h]) = size {
                builder = builder.with_size(w, h);
            }
            if let Some(target) = link(hyperlink, handles)? {
                builder = builder.with_hyperlink(target);
            }
            builder.build()?.into()
        }
    };
    Ok(shape)
}

/// Strings are used verbatim, everything else in its JSON form.
fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK: &str = r#"{
        "title": "Roadmap",
        "author": "Platform team",
        "slides": [
            {"title": "Roadmap"},
            {"title": "Details", "layout": 2, "shapes": [
                {"type": "text_box", "content": "Back to start",
                 "style": {"bold": true}, "hyperlink": 0},
                {"type": "picture", "path": "img/logo.png", "width": 30, "height": 10},
                {"type": "table", "columns": ["quarter", "goal"],
                 "rows": [["Q1", "ship"], [2, null]]}
            ]}
        ]
    }"#;

    #[test]
    fn test_deck_builds_presentation() {
        let deck = Deck::from_json(DECK).unwrap();
        let presentation = deck.into_presentation(Path::new("/decks")).unwrap();

        assert_eq!(presentation.title(), "Roadmap");
        assert_eq!(presentation.author(), "Platform team");
        assert_eq!(presentation.len(), 2);

        let details = &presentation.slides()[1];
        assert_eq!(details.layout(), Layout::TEXT);
        assert_eq!(details.shapes().len(), 3);
        assert_eq!(details.shapes()[0].hyperlink(), Some(presentation.slides()[0].handle()));

        match &details.shapes()[1] {
            Shape::Picture(p) => assert_eq!(p.source(), Path::new("/decks/img/logo.png")),
            other => panic!("expected picture, got {}", other.kind_name()),
        }
        match &details.shapes()[2] {
            Shape::Table(t) => {
                assert_eq!(t.cell(2, 0), "2");
                assert_eq!(t.cell(2, 1), "");
            }
            other => panic!("expected table, got {}", other.kind_name()),
        }
    }

    #[test]
    fn test_hyperlink_out_of_range_is_rejected() {
        let deck = Deck::from_json(
            r#"{"slides": [{"shapes": [{"type": "text_box", "content": "x", "hyperlink": 4}]}]}"#,
        )
        .unwrap();
        let err = deck.into_presentation(Path::new(".")).unwrap_err();
        assert!(format!("{:#}", err).contains("hyperlink to slide 4"));
    }

    #[test]
    fn test_unknown_shape_type_is_rejected() {
        assert!(Deck::from_json(r#"{"slides": [{"shapes": [{"type": "chart"}]}]}"#).is_err());
    }
}
