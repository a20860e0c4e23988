//! Source-tree passes: span resolution, classification and source rendering

pub mod source;
pub mod resolver;


pub use source::{SourceFile, line_count};
pub use resolver::{ResolveReport, render_source, resolve_symbols};
