//! RS-274X command-stream decoding, geometry realization and boundary-offset scaling.
//!
//! ```no_run
//! use gerber_offset::{parse, ScaleTransformer};
//!
//! # fn main() -> Result<(), gerber_offset::ParseError> {
//! let text = std::fs::read_to_string("copper_top.gbr").unwrap_or_default();
//! let file = parse(&text)?;
//! let output = ScaleTransformer::new(1.02, 1.02).apply(&file);
//! for geometry in &output.transformed {
//!     println!("{:?}: {} points", geometry.kind(), geometry.points().len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod aperture;
pub mod error;
pub mod format;
pub mod geometry;
pub mod lexer;
pub mod macros;
pub mod offset;
pub mod parser;
pub mod spacial;
pub mod transformer;
pub mod types;

#[cfg(feature = "testing")]
pub mod testing;

pub use aperture::{ApertureCatalog, ApertureRecord, ApertureShape, MacroAperture};
pub use error::*;
pub use format::FormatState;
pub use geometry::{BoundingBox, Geometry, GeometryKind, PolygonMesh, RealizeOptions, Realizer};
pub use macros::{BuiltinMacroEvaluator, MacroEvaluator, MacroProgram, MacroShape};
pub use offset::{offset, offset_ring, OffsetRing};
pub use parser::{parse, parse_with_options, Command, DrawMode, ParsedFile, ParserOptions};
pub use spacial::{Position, Vector};
pub use transformer::{ScaleTransformer, TransformOutput};
pub use types::{Exposure, Units, ZeroSuppression};
