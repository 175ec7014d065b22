//! The presentation: ordered slides plus document metadata.

use crate::slide::{Layout, Slide, SlideRef};

const UNKNOWN: &str = "unknown";

/// A presentation to be written to PPTX.
///
/// Never empty: constructing one without slides adds a title slide.
#[derive(Debug)]
pub struct Presentation {
    slides: Vec<Slide>,
    title: String,
    author: String,
}

impl Presentation {
    /// Create a presentation with a single title slide carrying `title`.
    pub fn new(title: impl Into<String>) -> Self {
        Self::from_slides(Vec::new(), title)
    }

    /// Create a presentation from existing slides.
    ///
    /// An empty list yields one title-layout slide carrying `title`.
    pub fn from_slides(slides: Vec<Slide>, title: impl Into<String>) -> Self {
        let title = title.into();
        let mut presentation = Self {
            slides: Vec::with_capacity(slides.len().max(1)),
            title,
            author: UNKNOWN.to_string(),
        };

        if slides.is_empty() {
            let first = Slide::with_title(presentation.title.clone()).with_layout(Layout::TITLE);
            presentation.push(first);
        } else {
            for slide in slides {
                presentation.push(slide);
            }
        }

        presentation
    }

    /// Set the document author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Mutable access to an already pushed slide, by 0-based position.
    pub fn slide_mut(&mut self, index: usize) -> Option<&mut Slide> {
        self.slides.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Append a slide and assign its 1-based number.
    pub fn push(&mut self, mut slide: Slide) -> &mut Self {
        let number = self.slides.len() as u32 + 1;
        slide.set_number(number);
        log::debug!("Pushed slide {} ({:?})", number, slide.layout());
        self.slides.push(slide);
        self
    }

    /// 0-based position of the slide identified by `target`, or `None` if
    /// it was never pushed into this presentation.
    pub fn slide_index_of(&self, target: SlideRef) -> Option<usize> {
        self.slides.iter().position(|s| s.handle() == target)
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::new(UNKNOWN)
    }
}
