//! Core presentation model, unit conversion, and error types for PPTX
//! generation.

pub mod error;
pub mod presentation;
pub mod shape;
pub mod slide;
pub mod table;
pub mod units;

pub use error::{Error, Result};
pub use presentation::Presentation;
pub use shape::{BoundingBox, Picture, Shape, Table, TextBox, TextStyle};
pub use slide::{Layout, Slide, SlideRef};
pub use table::{TableContent, Tabular};
pub use units::{from_native, to_native, Emu, EMU_PER_MM};
