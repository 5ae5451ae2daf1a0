use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};

use crate::error::ApertureError;
use crate::macros::MacroProgram;
use crate::types::Units;

/// Typed aperture shape, all lengths in millimeters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ApertureShape {
    Circle {
        diameter: f64,
        /// kept for provenance, not realized
        hole_diameter: Option<f64>,
    },
    Rectangle {
        width: f64,
        height: f64,
    },
    Obround {
        width: f64,
        height: f64,
    },
    Polygon {
        outer_diameter: f64,
        vertices: u32,
        /// degrees
        rotation: f64,
    },
    Ellipse {
        width: f64,
        height: f64,
    },
    RoundedRectangle {
        width: f64,
        height: f64,
        radius: f64,
    },
    ChamferedRectangle {
        width: f64,
        height: f64,
        chamfer: f64,
    },
    Diamond {
        width: f64,
        height: f64,
        chamfer: f64,
    },
    Macro(MacroAperture),
}

/// A macro-backed aperture. Parameters stay in source units, the realizer converts the
/// evaluated shapes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MacroAperture {
    pub program: Arc<MacroProgram>,
    pub params: Vec<f64>,
    /// applied to evaluated shapes in addition to the unit conversion
    pub local_scale: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApertureRecord {
    pub code: u32,
    pub shape: ApertureShape,
    pub units: Units,
}

impl ApertureRecord {
    /// Short shape name, as used in aperture definitions.
    pub fn shape_name(&self) -> &str {
        match &self.shape {
            ApertureShape::Circle { .. } => "C",
            ApertureShape::Rectangle { .. } => "R",
            ApertureShape::Obround { .. } => "O",
            ApertureShape::Polygon { .. } => "P",
            ApertureShape::Ellipse { .. } => "E",
            ApertureShape::RoundedRectangle { .. } => "RR",
            ApertureShape::ChamferedRectangle { .. } => "CR",
            ApertureShape::Diamond { .. } => "D",
            ApertureShape::Macro(aperture) => &aperture.program.name,
        }
    }

    /// The ordered parameter list, lengths in millimeters (source units for macros).
    pub fn params(&self) -> Vec<f64> {
        match &self.shape {
            ApertureShape::Circle {
                diameter,
                hole_diameter,
            } => std::iter::once(*diameter)
                .chain(*hole_diameter)
                .collect(),
            ApertureShape::Rectangle {
                width,
                height,
            }
            | ApertureShape::Obround {
                width,
                height,
            }
            | ApertureShape::Ellipse {
                width,
                height,
            } => vec![*width, *height],
            ApertureShape::Polygon {
                outer_diameter,
                vertices,
                rotation,
            } => vec![*outer_diameter, *vertices as f64, *rotation],
            ApertureShape::RoundedRectangle {
                width,
                height,
                radius: extra,
            }
            | ApertureShape::ChamferedRectangle {
                width,
                height,
                chamfer: extra,
            }
            | ApertureShape::Diamond {
                width,
                height,
                chamfer: extra,
            } => vec![*width, *height, *extra],
            ApertureShape::Macro(aperture) => aperture.params.clone(),
        }
    }

    /// A new record with the shape stretched by `sx` horizontally and `sy` vertically.
    pub fn scaled(&self, sx: f64, sy: f64) -> ApertureRecord {
        let corner_scale = sx.min(sy);
        let shape = match &self.shape {
            ApertureShape::Circle {
                diameter,
                hole_diameter,
            } => {
                if sx == sy {
                    ApertureShape::Circle {
                        diameter: diameter * sx,
                        hole_diameter: hole_diameter.map(|hole| hole * sx),
                    }
                } else {
                    ApertureShape::Ellipse {
                        width: diameter * sx,
                        height: diameter * sy,
                    }
                }
            }
            ApertureShape::Rectangle {
                width,
                height,
            } => ApertureShape::Rectangle {
                width: width * sx,
                height: height * sy,
            },
            ApertureShape::Obround {
                width,
                height,
            } => ApertureShape::Obround {
                width: width * sx,
                height: height * sy,
            },
            ApertureShape::Ellipse {
                width,
                height,
            } => ApertureShape::Ellipse {
                width: width * sx,
                height: height * sy,
            },
            ApertureShape::Polygon {
                outer_diameter,
                vertices,
                rotation,
            } => ApertureShape::Polygon {
                outer_diameter: outer_diameter * sx,
                vertices: *vertices,
                rotation: *rotation,
            },
            ApertureShape::RoundedRectangle {
                width,
                height,
                radius,
            } => ApertureShape::RoundedRectangle {
                width: width * sx,
                height: height * sy,
                radius: radius * corner_scale,
            },
            ApertureShape::ChamferedRectangle {
                width,
                height,
                chamfer,
            } => ApertureShape::ChamferedRectangle {
                width: width * sx,
                height: height * sy,
                chamfer: chamfer * corner_scale,
            },
            ApertureShape::Diamond {
                width,
                height,
                chamfer,
            } => ApertureShape::Diamond {
                width: width * sx,
                height: height * sy,
                chamfer: chamfer * corner_scale,
            },
            ApertureShape::Macro(aperture) => ApertureShape::Macro(MacroAperture {
                program: aperture.program.clone(),
                params: aperture.params.clone(),
                local_scale: (aperture.local_scale.0 * sx, aperture.local_scale.1 * sy),
            }),
        };

        ApertureRecord {
            code: self.code,
            shape,
            units: self.units,
        }
    }
}

/// Aperture definitions and macro programs for one file. Re-defining a code replaces the
/// previous entry.
#[derive(Debug, Clone, Default)]
pub struct ApertureCatalog {
    apertures: HashMap<u32, Arc<ApertureRecord>>,
    macros: HashMap<String, Arc<MacroProgram>>,
}

impl ApertureCatalog {
    /// Define a standard aperture from its shape letter(s) and raw parameters in `units`.
    pub fn define_standard(
        &mut self,
        code: u32,
        shape_letter: &str,
        raw_params: &[f64],
        units: Units,
    ) -> Result<Arc<ApertureRecord>, ApertureError> {
        let mm = |value: f64| units.to_millimeters(value);
        let require = |shape: &'static str, expected: usize| {
            if raw_params.len() < expected {
                Err(ApertureError::MissingParameters {
                    shape,
                    expected,
                    found: raw_params.len(),
                })
            } else {
                Ok(())
            }
        };

        let shape = match shape_letter {
            "C" => {
                require("C", 1)?;
                ApertureShape::Circle {
                    diameter: mm(raw_params[0]),
                    hole_diameter: raw_params.get(1).copied().map(mm),
                }
            }
            "R" => {
                require("R", 2)?;
                ApertureShape::Rectangle {
                    width: mm(raw_params[0]),
                    height: mm(raw_params[1]),
                }
            }
            "O" => {
                require("O", 2)?;
                ApertureShape::Obround {
                    width: mm(raw_params[0]),
                    height: mm(raw_params[1]),
                }
            }
            "E" => {
                require("E", 2)?;
                ApertureShape::Ellipse {
                    width: mm(raw_params[0]),
                    height: mm(raw_params[1]),
                }
            }
            "P" => {
                require("P", 2)?;
                let vertices = raw_params[1];
                if !(3.0..=12.0).contains(&vertices) || vertices.fract() != 0.0 {
                    return Err(ApertureError::InvalidParameter(format!("vertex count {}", vertices)));
                }
                ApertureShape::Polygon {
                    outer_diameter: mm(raw_params[0]),
                    vertices: vertices as u32,
                    rotation: raw_params.get(2).copied().unwrap_or(0.0),
                }
            }
            "RR" => {
                require("RR", 3)?;
                ApertureShape::RoundedRectangle {
                    width: mm(raw_params[0]),
                    height: mm(raw_params[1]),
                    radius: mm(raw_params[2]),
                }
            }
            "CR" => {
                require("CR", 3)?;
                ApertureShape::ChamferedRectangle {
                    width: mm(raw_params[0]),
                    height: mm(raw_params[1]),
                    chamfer: mm(raw_params[2]),
                }
            }
            "D" => {
                require("D", 3)?;
                ApertureShape::Diamond {
                    width: mm(raw_params[0]),
                    height: mm(raw_params[1]),
                    chamfer: mm(raw_params[2]),
                }
            }
            other => return Err(ApertureError::UnknownShape(other.to_string())),
        };

        Ok(self.insert(ApertureRecord {
            code,
            shape,
            units,
        }))
    }

    pub fn define_macro(
        &mut self,
        code: u32,
        macro_program: Arc<MacroProgram>,
        instantiation_params: Vec<f64>,
        units: Units,
    ) -> Arc<ApertureRecord> {
        self.insert(ApertureRecord {
            code,
            shape: ApertureShape::Macro(MacroAperture {
                program: macro_program,
                params: instantiation_params,
                local_scale: (1.0, 1.0),
            }),
            units,
        })
    }

    pub fn lookup(&self, code: u32) -> Result<&Arc<ApertureRecord>, ApertureError> {
        self.apertures
            .get(&code)
            .ok_or(ApertureError::NotFound(code))
    }

    pub fn define_macro_program(&mut self, program: MacroProgram) -> Arc<MacroProgram> {
        let program = Arc::new(program);
        debug!("macro defined. name: {}", program.name);
        self.macros
            .insert(program.name.clone(), program.clone());
        program
    }

    pub fn macro_program(&self, name: &str) -> Option<&Arc<MacroProgram>> {
        self.macros.get(name)
    }

    pub fn len(&self) -> usize {
        self.apertures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apertures.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = u32> + '_ {
        self.apertures.keys().copied()
    }

    /// A new catalog with every aperture scaled, see [`ApertureRecord::scaled`].
    pub fn scaled(&self, sx: f64, sy: f64) -> ApertureCatalog {
        let apertures = self
            .apertures
            .iter()
            .map(|(code, record)| (*code, Arc::new(record.scaled(sx, sy))))
            .collect();

        ApertureCatalog {
            apertures,
            macros: self.macros.clone(),
        }
    }

    fn insert(&mut self, record: ApertureRecord) -> Arc<ApertureRecord> {
        trace!("aperture defined. record: {:?}", record);
        let record = Arc::new(record);
        if self
            .apertures
            .insert(record.code, record.clone())
            .is_some()
        {
            debug!("aperture redefined. code: {}", record.code);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_define_and_lookup_circle() {
        // given
        let mut catalog = ApertureCatalog::default();

        // when
        catalog
            .define_standard(10, "C", &[1.0], Units::Millimeters)
            .unwrap();

        // then
        let record = catalog.lookup(10).unwrap();
        assert_eq!(record.shape, ApertureShape::Circle {
            diameter: 1.0,
            hole_diameter: None
        });
        assert_eq!(record.shape_name(), "C");
        assert_eq!(record.params(), vec![1.0]);
    }

    #[test]
    fn test_inch_parameters_are_converted() {
        // given
        let mut catalog = ApertureCatalog::default();

        // when
        let record = catalog
            .define_standard(11, "P", &[0.1, 6.0, 30.0], Units::Inches)
            .unwrap();

        // then
        assert_eq!(record.shape, ApertureShape::Polygon {
            outer_diameter: 0.1 * 25.4,
            vertices: 6,
            rotation: 30.0,
        });
    }

    #[test]
    fn test_lookup_unknown_code() {
        let catalog = ApertureCatalog::default();
        assert_eq!(catalog.lookup(42).unwrap_err(), ApertureError::NotFound(42));
    }

    #[test]
    fn test_redefinition_replaces_entry_but_not_earlier_references() {
        // given
        let mut catalog = ApertureCatalog::default();
        let first = catalog
            .define_standard(10, "C", &[1.0], Units::Millimeters)
            .unwrap();

        // when
        catalog
            .define_standard(10, "R", &[1.0, 2.0], Units::Millimeters)
            .unwrap();

        // then
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup(10).unwrap().shape_name(), "R");
        assert_eq!(first.shape_name(), "C");
    }

    #[rstest]
    #[case("R", &[1.0])]
    #[case("RR", &[1.0, 2.0])]
    #[case("C", &[])]
    fn test_missing_parameters(#[case] shape: &str, #[case] params: &[f64]) {
        let mut catalog = ApertureCatalog::default();
        assert!(matches!(
            catalog.define_standard(10, shape, params, Units::Millimeters),
            Err(ApertureError::MissingParameters { .. })
        ));
    }

    #[rstest]
    #[case("Q")]
    #[case("RECT")]
    fn test_unknown_shape(#[case] shape: &str) {
        let mut catalog = ApertureCatalog::default();
        assert_eq!(
            catalog.define_standard(10, shape, &[1.0], Units::Millimeters),
            Err(ApertureError::UnknownShape(shape.to_string()))
        );
    }

    #[rstest]
    #[case(2.0)]
    #[case(13.0)]
    #[case(200000.0)]
    #[case(4.5)]
    #[case(f64::NAN)]
    fn test_polygon_vertex_count_is_limited(#[case] vertices: f64) {
        let mut catalog = ApertureCatalog::default();
        assert!(matches!(
            catalog.define_standard(10, "P", &[1.0, vertices], Units::Millimeters),
            Err(ApertureError::InvalidParameter(_))
        ));
        assert_eq!(catalog.codes().count(), 0);
    }

    #[test]
    fn test_codes_lists_defined_apertures() {
        // given
        let mut catalog = ApertureCatalog::default();

        // when
        catalog
            .define_standard(10, "P", &[1.0, 12.0], Units::Millimeters)
            .unwrap();
        catalog
            .define_standard(11, "C", &[0.5], Units::Millimeters)
            .unwrap();

        // then
        let mut codes: Vec<u32> = catalog.codes().collect();
        codes.sort_unstable();
        assert_eq!(codes, vec![10, 11]);
    }

    #[test]
    fn test_macro_aperture_keeps_source_units() {
        // given
        let mut catalog = ApertureCatalog::default();
        let program = catalog.define_macro_program(MacroProgram {
            name: "DONUT".to_string(),
            statements: vec!["1,1,$1,0,0".to_string()],
        });

        // when
        let record = catalog.define_macro(20, program, vec![0.05], Units::Inches);

        // then
        assert_eq!(record.shape_name(), "DONUT");
        assert_eq!(record.params(), vec![0.05]);
        assert!(catalog.macro_program("DONUT").is_some());
    }

    #[rstest]
    #[case(2.0, 2.0, ApertureShape::Circle { diameter: 2.0, hole_diameter: None })]
    #[case(2.0, 3.0, ApertureShape::Ellipse { width: 2.0, height: 3.0 })]
    fn test_scaled_circle(#[case] sx: f64, #[case] sy: f64, #[case] expected: ApertureShape) {
        // given
        let mut catalog = ApertureCatalog::default();
        let record = catalog
            .define_standard(10, "C", &[1.0], Units::Millimeters)
            .unwrap();

        // when
        let scaled = record.scaled(sx, sy);

        // then
        assert_eq!(scaled.shape, expected);
        assert_eq!(record.shape, ApertureShape::Circle {
            diameter: 1.0,
            hole_diameter: None
        });
    }

    #[test]
    fn test_scaled_catalog() {
        // given
        let mut catalog = ApertureCatalog::default();
        catalog
            .define_standard(10, "RR", &[2.0, 1.0, 0.25], Units::Millimeters)
            .unwrap();
        let program = catalog.define_macro_program(MacroProgram {
            name: "M".to_string(),
            statements: vec![],
        });
        catalog.define_macro(11, program, vec![1.0], Units::Millimeters);

        // when
        let scaled = catalog.scaled(2.0, 4.0);

        // then
        assert_eq!(scaled.lookup(10).unwrap().shape, ApertureShape::RoundedRectangle {
            width: 4.0,
            height: 4.0,
            radius: 0.5,
        });
        let ApertureShape::Macro(aperture) = &scaled.lookup(11).unwrap().shape else {
            panic!("expected a macro aperture");
        };
        assert_eq!(aperture.local_scale, (2.0, 4.0));
        assert_eq!(aperture.params, vec![1.0]);
    }
}
