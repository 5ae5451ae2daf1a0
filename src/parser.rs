use std::sync::Arc;

use lazy_regex::{lazy_regex, Lazy};
use log::{debug, info, trace, warn};
use regex::{Captures, Regex};

use crate::aperture::{ApertureCatalog, ApertureRecord};
use crate::error::{ApertureError, FormatError, ParseError, ParseWarning, ParseWarningKind};
use crate::format::FormatState;
use crate::lexer::{block_statements, tokenize, Token, TokenKind};
use crate::macros::MacroProgram;
use crate::spacial::{Position, Vector};
use crate::types::{Axis, Units, ZeroSuppression};

static RE_OPERATION: Lazy<Regex> = lazy_regex!(
    r"^(?:G0?(?P<g>[123]))?(?:X(?P<x>[+-]?[0-9]+))?(?:Y(?P<y>[+-]?[0-9]+))?(?:I(?P<i>[+-]?[0-9]+))?(?:J(?P<j>[+-]?[0-9]+))?D0?(?P<d>[123])$"
);
static RE_TOOL_SELECT: Lazy<Regex> = lazy_regex!(r"^(?:G5[04])?D(?P<code>[0-9]+)$");
static RE_INTERPOLATION_MODE: Lazy<Regex> = lazy_regex!(r"^G0?(?P<g>[123])$");
static RE_FORMAT_STATEMENT: Lazy<Regex> =
    lazy_regex!(r"^FS(?P<zeros>[LT])(?P<mode>[AI])X(?P<xi>[0-9])(?P<xf>[0-9])Y(?P<yi>[0-9])(?P<yf>[0-9])$");
static RE_UNITS: Lazy<Regex> = lazy_regex!(r"^MO(?P<units>IN|MM)$");
static RE_APERTURE_DEFINITION: Lazy<Regex> =
    lazy_regex!(r"^ADD(?P<code>[0-9]+)(?P<shape>[A-Za-z_$.][A-Za-z0-9_$.]*)(?:,(?P<params>.*))?$");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Draw,
    /// Pen-up move, only emitted with [`ParserOptions::emit_moves`].
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Linear,
    Clockwise,
    CounterClockwise,
}

impl InterpolationMode {
    fn from_code(code: &str) -> Self {
        match code {
            "2" => InterpolationMode::Clockwise,
            "3" => InterpolationMode::CounterClockwise,
            _ => InterpolationMode::Linear,
        }
    }
}

/// A drawing command, positions in millimeters.
///
/// Aperture references are shared with the catalog that was current when the command was
/// parsed, a later re-definition of the same code does not change them.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Flash {
        position: Position,
        aperture: Arc<ApertureRecord>,
    },
    Draw {
        path: Vec<Position>,
        aperture: Arc<ApertureRecord>,
        mode: DrawMode,
    },
    Region {
        polygon: Vec<Position>,
    },
    Arc {
        start: Position,
        end: Position,
        /// center relative to `start`
        center_offset: Vector,
        clockwise: bool,
        aperture: Arc<ApertureRecord>,
    },
}

impl Command {
    pub fn aperture(&self) -> Option<&Arc<ApertureRecord>> {
        match self {
            Command::Flash {
                aperture, ..
            }
            | Command::Draw {
                aperture, ..
            }
            | Command::Arc {
                aperture, ..
            } => Some(aperture),
            Command::Region {
                ..
            } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    /// Emit `Draw { mode: Move }` for `D02` operations when an aperture is selected.
    pub emit_moves: bool,
}

#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub format: FormatState,
    pub catalog: ApertureCatalog,
    pub commands: Vec<Command>,
    pub warnings: Vec<ParseWarning>,
}

pub fn parse(text: &str) -> Result<ParsedFile, ParseError> {
    parse_with_options(text, ParserOptions::default())
}

#[profiling::function]
pub fn parse_with_options(text: &str, options: ParserOptions) -> Result<ParsedFile, ParseError> {
    let mut parser = Parser::new(options);

    for token in tokenize(text) {
        trace!("token: {:?}, line: {}, text: {}", token.kind, token.line, token.text);
        parser.line = token.line;

        let flow = match token.kind {
            TokenKind::Comment => Flow::Continue,
            TokenKind::Parameter => parser.parameter_block(&token)?,
            TokenKind::Word => parser.word(&token)?,
        };

        if let Flow::Stop = flow {
            debug!("program end. line: {}", token.line);
            break;
        }
    }

    Ok(parser.finish())
}

enum Flow {
    Continue,
    Stop,
}

#[derive(Debug, Default)]
enum RegionState {
    #[default]
    Idle,
    InRegion(Vec<Position>),
}

/// Transient per-run state, owned by the parser.
#[derive(Debug)]
struct ParserState {
    region: RegionState,
    aperture: Option<Arc<ApertureRecord>>,
    pen: Position,
    interpolation: InterpolationMode,
}

impl ParserState {
    fn new() -> Self {
        Self {
            region: RegionState::Idle,
            aperture: None,
            pen: Position::origin(),
            interpolation: InterpolationMode::Linear,
        }
    }
}

struct Parser {
    options: ParserOptions,
    format: FormatState,
    catalog: ApertureCatalog,
    commands: Vec<Command>,
    warnings: Vec<ParseWarning>,
    state: ParserState,
    line: usize,
}

impl Parser {
    fn new(options: ParserOptions) -> Self {
        Self {
            options,
            format: FormatState::default(),
            catalog: ApertureCatalog::default(),
            commands: vec![],
            warnings: vec![],
            state: ParserState::new(),
            line: 1,
        }
    }

    fn finish(mut self) -> ParsedFile {
        if let RegionState::InRegion(_) = self.state.region {
            self.warn(self.line, "G36", ParseWarningKind::UnterminatedRegion);
        }

        info!(
            "parsed. commands: {}, apertures: {}, warnings: {}",
            self.commands.len(),
            self.catalog.len(),
            self.warnings.len()
        );

        ParsedFile {
            format: self.format,
            catalog: self.catalog,
            commands: self.commands,
            warnings: self.warnings,
        }
    }

    fn warn(&mut self, line: usize, token: &str, kind: ParseWarningKind) {
        warn!("line {}: '{}': {}", line, token, kind);
        self.warnings.push(ParseWarning {
            line,
            token: token.to_string(),
            kind,
        });
    }

    fn emit(&mut self, command: Command) {
        trace!("command: {:?}", command);
        self.commands.push(command);
    }

    fn parameter_block(&mut self, token: &Token) -> Result<Flow, ParseError> {
        for statement in block_statements(&token.text) {
            self.parameter(token.line, statement)?;
        }
        Ok(Flow::Continue)
    }

    fn parameter(&mut self, line: usize, statement: &str) -> Result<(), ParseError> {
        let fatal = |cause: FormatError| ParseError {
            line,
            token: statement.to_string(),
            cause,
        };

        if statement.starts_with("FS") {
            let captures = RE_FORMAT_STATEMENT
                .captures(statement)
                .ok_or_else(|| fatal(FormatError::MalformedFormat(statement.to_string())))?;
            if &captures["mode"] == "I" {
                return Err(fatal(FormatError::UnsupportedCoordinateMode('I')));
            }
            let zero_suppression = match &captures["zeros"] {
                "T" => ZeroSuppression::Trailing,
                _ => ZeroSuppression::Leading,
            };
            self.format
                .set_format(
                    zero_suppression,
                    digit(&captures, "xi"),
                    digit(&captures, "xf"),
                    digit(&captures, "yi"),
                    digit(&captures, "yf"),
                )
                .map_err(fatal)?;
        } else if statement.starts_with("MO") {
            let captures = RE_UNITS
                .captures(statement)
                .ok_or_else(|| fatal(FormatError::MalformedUnits(statement.to_string())))?;
            let units = match &captures["units"] {
                "IN" => Units::Inches,
                _ => Units::Millimeters,
            };
            debug!("units: {:?}", units);
            self.format.set_units(units);
        } else if statement.starts_with("AD") {
            self.aperture_definition(line, statement);
        } else if statement.starts_with("AM") {
            match MacroProgram::from_block(statement) {
                Some(program) => {
                    self.catalog
                        .define_macro_program(program);
                }
                None => self.warn(
                    line,
                    statement,
                    ParseWarningKind::MalformedDirective("aperture macro without a name".to_string()),
                ),
            }
        } else {
            trace!("ignored parameter. line: {}, statement: {}", line, statement);
        }

        Ok(())
    }

    fn aperture_definition(&mut self, line: usize, statement: &str) {
        let Some(captures) = RE_APERTURE_DEFINITION.captures(statement) else {
            self.warn(
                line,
                statement,
                ParseWarningKind::MalformedDirective("aperture definition".to_string()),
            );
            return;
        };

        let Ok(code) = captures["code"].parse::<u32>() else {
            self.warn(
                line,
                statement,
                ParseWarningKind::InvalidAperture(ApertureError::InvalidParameter(captures["code"].to_string())),
            );
            return;
        };

        let mut params = vec![];
        if let Some(raw_params) = captures.name("params") {
            for raw in raw_params
                .as_str()
                .split('X')
                .filter(|raw| !raw.is_empty())
            {
                match raw.parse::<f64>() {
                    Ok(value) => params.push(value),
                    Err(_) => {
                        self.warn(
                            line,
                            statement,
                            ParseWarningKind::InvalidAperture(ApertureError::InvalidParameter(raw.to_string())),
                        );
                        return;
                    }
                }
            }
        }

        let units = self.ensure_units(line, statement);
        let shape = &captures["shape"];

        let result = match self.catalog.macro_program(shape).cloned() {
            Some(program) => Ok(self
                .catalog
                .define_macro(code, program, params, units)),
            None => self
                .catalog
                .define_standard(code, shape, &params, units),
        };

        if let Err(cause) = result {
            self.warn(line, statement, ParseWarningKind::InvalidAperture(cause));
        }
    }

    fn ensure_units(&mut self, line: usize, token: &str) -> Units {
        if !self.format.has_units() {
            self.warn(line, token, ParseWarningKind::UnitsDefaulted);
            self.format.set_units(Units::Millimeters);
        }
        self.format.units()
    }

    fn word(&mut self, token: &Token) -> Result<Flow, ParseError> {
        let word = token.text.as_str();

        if let Some(captures) = RE_OPERATION.captures(word) {
            self.operation(token, &captures)?;
        } else if let Some(captures) = RE_TOOL_SELECT.captures(word) {
            self.select_aperture(token, &captures["code"]);
        } else if let Some(captures) = RE_INTERPOLATION_MODE.captures(word) {
            self.state.interpolation = InterpolationMode::from_code(&captures["g"]);
            trace!("interpolation mode: {:?}", self.state.interpolation);
        } else {
            match word {
                "G36" => self.begin_region(token),
                "G37" => self.end_region(token),
                "G70" => self.format.set_units(Units::Inches),
                "G71" => self.format.set_units(Units::Millimeters),
                "G91" => {
                    return Err(ParseError {
                        line: token.line,
                        token: word.to_string(),
                        cause: FormatError::UnsupportedCoordinateMode('I'),
                    })
                }
                "M02" => return Ok(Flow::Stop),
                _ => trace!("ignored directive. line: {}, word: {}", token.line, word),
            }
        }

        Ok(Flow::Continue)
    }

    fn select_aperture(&mut self, token: &Token, code: &str) {
        let Ok(code) = code.parse::<u32>() else {
            self.warn(
                token.line,
                &token.text,
                ParseWarningKind::MalformedDirective("aperture code out of range".to_string()),
            );
            return;
        };

        match self.catalog.lookup(code) {
            Ok(record) => {
                trace!("aperture selected. code: {}", code);
                self.state.aperture = Some(record.clone());
            }
            Err(_) => self.warn(token.line, &token.text, ParseWarningKind::UnknownAperture(code)),
        }
    }

    fn operation(&mut self, token: &Token, captures: &Captures) -> Result<(), ParseError> {
        if let Some(code) = captures.name("g") {
            self.state.interpolation = InterpolationMode::from_code(code.as_str());
        }

        let pen = self.state.pen;
        let (Some(x), Some(y)) = (
            self.coordinate(token, captures, "x", Axis::X, pen.x)?,
            self.coordinate(token, captures, "y", Axis::Y, pen.y)?,
        ) else {
            return Ok(());
        };
        let end = Position::new(x, y);

        match &captures["d"] {
            "1" => self.interpolate(token, captures, end)?,
            "2" => self.move_to(end),
            _ => self.flash(token, end),
        }

        Ok(())
    }

    /// Decode a captured axis value, or return `current` when the axis is absent.
    ///
    /// A token that cannot be decoded is reported and yields `None`, the operation is then skipped.
    /// Decoding before any format statement is fatal.
    fn coordinate(
        &mut self,
        token: &Token,
        captures: &Captures,
        name: &str,
        axis: Axis,
        current: f64,
    ) -> Result<Option<f64>, ParseError> {
        let Some(raw) = captures.name(name) else {
            return Ok(Some(current));
        };

        self.ensure_units(token.line, &token.text);
        match self.format.decode_axis(axis, raw.as_str()) {
            Ok(value) => Ok(Some(value)),
            Err(cause @ FormatError::InvalidCoordinate { .. }) => {
                self.warn(
                    token.line,
                    &token.text,
                    ParseWarningKind::MalformedDirective(cause.to_string()),
                );
                Ok(None)
            }
            Err(cause) => Err(ParseError {
                line: token.line,
                token: token.text.clone(),
                cause,
            }),
        }
    }

    fn interpolate(&mut self, token: &Token, captures: &Captures, end: Position) -> Result<(), ParseError> {
        let start = self.state.pen;
        self.state.pen = end;

        if let RegionState::InRegion(points) = &mut self.state.region {
            points.push(end);
            return Ok(());
        }

        let Some(aperture) = self.state.aperture.clone() else {
            debug!("interpolation without a selected aperture dropped. line: {}", token.line);
            return Ok(());
        };

        let command = match self.state.interpolation {
            InterpolationMode::Linear => Command::Draw {
                path: vec![end],
                aperture,
                mode: DrawMode::Draw,
            },
            mode => {
                let (Some(i), Some(j)) = (
                    self.coordinate(token, captures, "i", Axis::X, 0.0)?,
                    self.coordinate(token, captures, "j", Axis::Y, 0.0)?,
                ) else {
                    return Ok(());
                };
                Command::Arc {
                    start,
                    end,
                    center_offset: Vector::new(i, j),
                    clockwise: mode == InterpolationMode::Clockwise,
                    aperture,
                }
            }
        };
        self.emit(command);

        Ok(())
    }

    fn move_to(&mut self, end: Position) {
        self.state.pen = end;

        if !self.options.emit_moves || !matches!(self.state.region, RegionState::Idle) {
            return;
        }
        if let Some(aperture) = self.state.aperture.clone() {
            self.emit(Command::Draw {
                path: vec![end],
                aperture,
                mode: DrawMode::Move,
            });
        }
    }

    fn flash(&mut self, token: &Token, position: Position) {
        self.state.pen = position;
        if let RegionState::InRegion(_) = self.state.region {
            self.warn(
                token.line,
                &token.text,
                ParseWarningKind::MalformedDirective("flash inside a region".to_string()),
            );
            return;
        }

        match self.state.aperture.clone() {
            Some(aperture) => self.emit(Command::Flash {
                position,
                aperture,
            }),
            None => debug!("flash without a selected aperture dropped. line: {}", token.line),
        }
    }

    fn begin_region(&mut self, token: &Token) {
        if let RegionState::InRegion(_) = self.state.region {
            self.warn(
                token.line,
                &token.text,
                ParseWarningKind::MalformedDirective("region start inside a region".to_string()),
            );
        }
        self.state.region = RegionState::InRegion(vec![]);
    }

    fn end_region(&mut self, token: &Token) {
        match std::mem::take(&mut self.state.region) {
            RegionState::InRegion(polygon) => {
                debug!("region. line: {}, points: {}", token.line, polygon.len());
                self.emit(Command::Region {
                    polygon,
                });
            }
            RegionState::Idle => self.warn(
                token.line,
                &token.text,
                ParseWarningKind::MalformedDirective("region end without region start".to_string()),
            ),
        }
    }
}

/// A single-digit capture, guaranteed by the pattern.
fn digit(captures: &Captures, name: &str) -> u8 {
    captures[name].as_bytes()[0] - b'0'
}
