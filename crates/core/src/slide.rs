//! Slides: ordered shapes plus a title and a layout reference.

use crate::shape::Shape;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SLIDE_REF: AtomicU64 = AtomicU64::new(1);

/// Identity of a slide, usable as a hyperlink target before the slide is
/// pushed into a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlideRef(u64);

impl SlideRef {
    fn fresh() -> Self {
        Self(NEXT_SLIDE_REF.fetch_add(1, Ordering::Relaxed))
    }
}

/// 1-based index of a slide layout in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout(pub u32);

impl Layout {
    /// The title slide layout.
    pub const TITLE: Layout = Layout(1);
    /// The title-and-content layout.
    pub const TEXT: Layout = Layout(2);

    pub fn index(self) -> u32 {
        self.0
    }

    pub fn is_title(self) -> bool {
        self == Self::TITLE
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::TITLE
    }
}

/// A slide of a presentation.
///
/// Shapes render in the order they were pushed.
#[derive(Debug)]
pub struct Slide {
    handle: SlideRef,
    title: String,
    layout: Layout,
    shapes: Vec<Shape>,
    /// 1-based position in the owning presentation, set on push.
    number: Option<u32>,
}

impl Slide {
    /// Create an empty slide using the title layout.
    pub fn new() -> Self {
        Self::with_title("")
    }

    /// Create an empty slide with a title, using the title layout.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            handle: SlideRef::fresh(),
            title: title.into(),
            layout: Layout::TITLE,
            shapes: Vec::new(),
            number: None,
        }
    }

    /// Set the layout this slide is based on.
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Identity token to use as a hyperlink target.
    pub fn handle(&self) -> SlideRef {
        self.handle
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Position in the owning presentation, or `None` if not yet pushed.
    pub fn number(&self) -> Option<u32> {
        self.number
    }

    pub(crate) fn set_number(&mut self, number: u32) {
        self.number = Some(number);
    }

    /// Append a shape. Shape ids start at 3: id 1 is the shape tree and id 2
    /// the title placeholder.
    pub fn push(&mut self, shape: impl Into<Shape>) -> &mut Self {
        let mut shape = shape.into();
        shape.set_render_ref_id(self.shapes.len() as u32 + 3);
        self.shapes.push(shape);
        self
    }
}

impl Default for Slide {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::TextBox;

    #[test]
    fn test_push_preserves_order_and_assigns_ids() {
        let mut slide = Slide::with_title("Hello Title").with_layout(Layout::TEXT);
        slide
            .push(TextBox::new("a").unwrap())
            .push(TextBox::new("b").unwrap())
            .push(TextBox::new("c").unwrap());

        let contents: Vec<_> = slide
            .shapes()
            .iter()
            .map(|s| match s {
                Shape::TextBox(t) => t.content().to_string(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(contents, vec!["a", "b", "c"]);

        let ids: Vec<_> = slide.shapes().iter().map(Shape::render_ref_id).collect();
        assert_eq!(ids, vec![3, 4, 5]);
        assert_eq!(slide.layout(), Layout::TEXT);
        assert_eq!(slide.number(), None);
    }

    #[test]
    fn test_handles_are_unique() {
        let a = Slide::new();
        let b = Slide::new();
        assert_ne!(a.handle(), b.handle());
        assert_eq!(a.handle(), a.handle());
    }
}
