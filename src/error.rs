use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Coordinate decoded before a format directive established the digit counts")]
    NotEstablished,
    #[error("Invalid digit counts. integer: {integer}, fraction: {fraction}")]
    InvalidDigitCounts { integer: u8, fraction: u8 },
    #[error("Unsupported coordinate mode '{0}', only absolute coordinates are supported")]
    UnsupportedCoordinateMode(char),
    #[error("Malformed format directive: {0}")]
    MalformedFormat(String),
    #[error("Malformed units directive: {0}")]
    MalformedUnits(String),
    #[error("Invalid coordinate token '{token}' for {digits} digits")]
    InvalidCoordinate { token: String, digits: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApertureError {
    #[error("Aperture D{0} is not defined")]
    NotFound(u32),
    #[error("Unknown aperture shape '{0}'")]
    UnknownShape(String),
    #[error("Aperture shape '{shape}' needs {expected} parameters, found {found}")]
    MissingParameters {
        shape: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Invalid aperture parameter '{0}'")]
    InvalidParameter(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MacroError {
    #[error("Invalid macro expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },
    #[error("Macro primitive {code} needs {expected} modifiers, found {found}")]
    MissingModifiers { code: u32, expected: usize, found: usize },
    #[error("Unknown macro primitive code '{0}'")]
    UnknownPrimitive(String),
    #[error("Unsupported macro primitive {0}")]
    UnsupportedPrimitive(u32),
    #[error("Invalid variable number {0}")]
    InvalidVariable(u32),
}

/// Fatal parse failure, aborts the run.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: '{token}': {cause}")]
pub struct ParseError {
    pub line: usize,
    pub token: String,
    #[source]
    pub cause: FormatError,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Only closed rings can be tessellated")]
    NotClosed,
    #[error("Tessellation failed: {0}")]
    Tessellation(String),
}

/// Non-fatal condition met while parsing, the run continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseWarningKind {
    #[error("Unknown aperture D{0}, previous selection kept")]
    UnknownAperture(u32),
    #[error("Malformed directive: {0}")]
    MalformedDirective(String),
    #[error("No units directive, assuming millimeters")]
    UnitsDefaulted,
    #[error("Invalid aperture definition: {0}")]
    InvalidAperture(ApertureError),
    #[error("Region still open at end of input, discarded")]
    UnterminatedRegion,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: '{token}': {kind}")]
pub struct ParseWarning {
    pub line: usize,
    pub token: String,
    pub kind: ParseWarningKind,
}
