//! PPTX (Office Open XML) writer for the deck presentation model.
//!
//! A `.pptx` file is a ZIP package of XML parts. Slides are rendered to
//! PresentationML and merged into a template package, either the bundled
//! empty presentation or one supplied by the caller.

pub mod package;
pub mod parts;
pub mod relationships;
pub mod slide_xml;
pub mod template;
pub mod viewer;
pub mod writer;
pub mod xml;

pub use package::PackageAssembler;
pub use template::Template;
pub use writer::{write, PptxWriter, WriteOptions};
