//! The scale pipeline: realize every command of a parsed file, then offset each geometry.

use log::info;

use crate::aperture::ApertureCatalog;
use crate::geometry::{Geometry, Realizer};
use crate::offset::offset;
use crate::parser::ParsedFile;

/// Both geometry sets of a transform run. The originals are never modified.
#[derive(Debug, Clone)]
pub struct TransformOutput<'p> {
    pub original: Vec<Geometry<'p>>,
    pub transformed: Vec<Geometry<'p>>,
    /// Only present when requested with [`ScaleTransformer::with_scaled_catalog`].
    pub scaled_catalog: Option<ApertureCatalog>,
}

pub struct ScaleTransformer<'e> {
    sx: f64,
    sy: f64,
    scale_catalog: bool,
    realizer: Realizer<'e>,
}

impl ScaleTransformer<'static> {
    pub fn new(sx: f64, sy: f64) -> Self {
        Self {
            sx,
            sy,
            scale_catalog: false,
            realizer: Realizer::default(),
        }
    }
}

impl<'e> ScaleTransformer<'e> {
    pub fn with_scaled_catalog(mut self, enabled: bool) -> Self {
        self.scale_catalog = enabled;
        self
    }

    /// Use a different sampling resolution or macro evaluator.
    pub fn with_realizer<'r>(self, realizer: Realizer<'r>) -> ScaleTransformer<'r> {
        ScaleTransformer {
            sx: self.sx,
            sy: self.sy,
            scale_catalog: self.scale_catalog,
            realizer,
        }
    }

    pub fn scale(&self) -> (f64, f64) {
        (self.sx, self.sy)
    }

    pub fn is_identity(&self) -> bool {
        self.sx == 1.0 && self.sy == 1.0
    }

    #[profiling::function]
    pub fn apply<'p>(&self, file: &'p ParsedFile) -> TransformOutput<'p> {
        let original = self.realizer.realize_all(&file.commands);

        let transformed: Vec<Geometry<'p>> = match self.is_identity() {
            true => original.clone(),
            false => original
                .iter()
                .map(|geometry| offset(geometry, self.sx, self.sy))
                .collect(),
        };

        let scaled_catalog = self
            .scale_catalog
            .then(|| file.catalog.scaled(self.sx, self.sy));

        info!(
            "transformed. sx: {}, sy: {}, commands: {}, geometries: {}, scaled_catalog: {}",
            self.sx,
            self.sy,
            file.commands.len(),
            transformed.len(),
            scaled_catalog.is_some()
        );

        TransformOutput {
            original,
            transformed,
            scaled_catalog,
        }
    }
}
