//! Aperture macros.
//!
//! A macro is stored as its raw body statements; turning a body plus instantiation
//! parameters into shapes goes through [`MacroEvaluator`], so a host can swap in its own
//! interpreter. [`BuiltinMacroEvaluator`] covers the primitives used by common CAD exports.

use std::collections::HashMap;
use std::f64::consts::PI;

use log::{error, trace, warn};

use crate::error::MacroError;
use crate::spacial::{length, Position, Rotate, Vector};
use crate::types::Exposure;

/// A named macro definition from an `%AM<name>*<body>%` block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MacroProgram {
    pub name: String,
    /// Body statements, without their `*` terminators.
    pub statements: Vec<String>,
}

impl MacroProgram {
    /// Build from the contents of an `AM` parameter block, e.g. `CIRC*1,1,$1,0,0*`.
    /// Returns `None` when the block has no name.
    pub fn from_block(block: &str) -> Option<Self> {
        let block = block.strip_prefix("AM").unwrap_or(block);
        let mut statements = block
            .split('*')
            .map(str::trim)
            .filter(|statement| !statement.is_empty());

        let name = statements.next()?.to_string();
        let statements = statements.map(str::to_string).collect();

        Some(Self {
            name,
            statements,
        })
    }
}

/// A shape produced by evaluating a macro, in macro-local coordinates and source units.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MacroShape {
    Circle {
        center: Position,
        diameter: f64,
        exposure: Exposure,
    },
    Line {
        start: Position,
        end: Position,
        exposure: Exposure,
    },
    Arc {
        start: Position,
        end: Position,
        center: Position,
        clockwise: bool,
        exposure: Exposure,
    },
    Outline {
        points: Vec<Position>,
        exposure: Exposure,
    },
    Rectangle {
        center: Position,
        width: f64,
        height: f64,
        /// degrees, counter-clockwise
        rotation: f64,
        exposure: Exposure,
    },
}

impl MacroShape {
    pub fn exposure(&self) -> Exposure {
        match self {
            MacroShape::Circle { exposure, .. }
            | MacroShape::Line { exposure, .. }
            | MacroShape::Arc { exposure, .. }
            | MacroShape::Outline { exposure, .. }
            | MacroShape::Rectangle { exposure, .. } => *exposure,
        }
    }
}

pub trait MacroEvaluator {
    /// Evaluate `program` with `$1..$n` bound to `params`.
    fn evaluate(&self, program: &MacroProgram, params: &[f64]) -> Result<Vec<MacroShape>, MacroError>;
}

/// Variable bindings for one macro evaluation.
#[derive(Debug, Default, Clone)]
pub struct MacroContext {
    variables: HashMap<u32, f64>,
}

impl MacroContext {
    pub fn from_params(params: &[f64]) -> Self {
        let variables = params
            .iter()
            .enumerate()
            .map(|(index, value)| ((index + 1) as u32, *value))
            .collect();
        Self {
            variables,
        }
    }

    /// Undefined variables read as zero.
    pub fn get(&self, number: u32) -> f64 {
        self.variables
            .get(&number)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn put(&mut self, number: u32, value: f64) -> Result<(), MacroError> {
        if number == 0 {
            return Err(MacroError::InvalidVariable(number));
        }
        self.variables.insert(number, value);
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinMacroEvaluator;

impl MacroEvaluator for BuiltinMacroEvaluator {
    fn evaluate(&self, program: &MacroProgram, params: &[f64]) -> Result<Vec<MacroShape>, MacroError> {
        let mut context = MacroContext::from_params(params);
        let mut shapes = vec![];

        for statement in &program.statements {
            trace!("macro statement: {}", statement);
            match evaluate_statement(statement, &mut context) {
                Ok(Some(shape)) => shapes.push(shape),
                Ok(None) => {}
                Err(cause) => {
                    error!(
                        "Error processing macro statement. macro: {}, statement: {}, cause: {}",
                        program.name, statement, cause
                    );
                }
            }
        }
        trace!("macro shapes: {:?}", shapes);

        Ok(shapes)
    }
}

/// Evaluate one body statement, updating `context` for variable definitions.
pub fn evaluate_statement(statement: &str, context: &mut MacroContext) -> Result<Option<MacroShape>, MacroError> {
    let statement = statement.trim();

    if let Some(definition) = statement.strip_prefix('$') {
        let (number, expression) = definition
            .split_once('=')
            .ok_or_else(|| MacroError::InvalidExpression {
                expression: statement.to_string(),
                reason: "expected '$n=<expression>'".to_string(),
            })?;
        let number: u32 = number
            .trim()
            .parse()
            .map_err(|_| MacroError::InvalidExpression {
                expression: statement.to_string(),
                reason: "invalid variable number".to_string(),
            })?;
        let value = evaluate_expression(expression, context)?;
        context.put(number, value)?;
        return Ok(None);
    }

    let mut fields = statement.split(',');
    let code_field = fields.next().unwrap_or_default().trim();
    if code_field == "0" || code_field.starts_with("0 ") {
        return Ok(None);
    }
    let code: u32 = code_field
        .parse()
        .map_err(|_| MacroError::UnknownPrimitive(code_field.to_string()))?;

    let modifiers = fields
        .map(|field| evaluate_expression(field, context))
        .collect::<Result<Vec<f64>, MacroError>>()?;

    let require = |expected: usize| {
        if modifiers.len() < expected {
            Err(MacroError::MissingModifiers {
                code,
                expected,
                found: modifiers.len(),
            })
        } else {
            Ok(())
        }
    };

    let shape = match code {
        1 => {
            require(4)?;
            let rotation = modifiers.get(4).copied().unwrap_or(0.0);
            Some(MacroShape::Circle {
                center: Position::new(modifiers[2], modifiers[3]).rotate_degrees(rotation),
                diameter: modifiers[1],
                exposure: exposure(modifiers[0]),
            })
        }
        2 | 20 => {
            require(7)?;
            let rotation = modifiers[6];
            let start = Position::new(modifiers[2], modifiers[3]).rotate_degrees(rotation);
            let end = Position::new(modifiers[4], modifiers[5]).rotate_degrees(rotation);
            vector_line(start, end, modifiers[1], exposure(modifiers[0]))
        }
        21 => {
            require(6)?;
            let rotation = modifiers[5];
            Some(MacroShape::Rectangle {
                center: Position::new(modifiers[3], modifiers[4]).rotate_degrees(rotation),
                width: modifiers[1],
                height: modifiers[2],
                rotation,
                exposure: exposure(modifiers[0]),
            })
        }
        22 => {
            require(6)?;
            let (width, height) = (modifiers[1], modifiers[2]);
            let rotation = modifiers[5];
            let center = Position::new(modifiers[3] + width / 2.0, modifiers[4] + height / 2.0);
            Some(MacroShape::Rectangle {
                center: center.rotate_degrees(rotation),
                width,
                height,
                rotation,
                exposure: exposure(modifiers[0]),
            })
        }
        4 => {
            require(2)?;
            let vertex_count = vertex_count(statement, modifiers[1], modifiers.len())?;
            // start point + vertex_count points + rotation
            let expected = vertex_count
                .checked_add(1)
                .and_then(|points| points.checked_mul(2))
                .and_then(|coordinates| coordinates.checked_add(3))
                .ok_or_else(|| MacroError::InvalidExpression {
                    expression: statement.to_string(),
                    reason: "vertex count overflows".to_string(),
                })?;
            require(expected)?;
            if vertex_count < 2 {
                warn!("Outline with less than 3 points. statement: {}", statement);
                return Ok(None);
            }
            let rotation = modifiers[expected - 1];
            let points = modifiers[2..expected - 1]
                .chunks_exact(2)
                .map(|pair| Position::new(pair[0], pair[1]).rotate_degrees(rotation))
                .collect();
            Some(MacroShape::Outline {
                points,
                exposure: exposure(modifiers[0]),
            })
        }
        5 => {
            require(6)?;
            let vertex_count = vertex_count(statement, modifiers[1], MAX_POLYGON_VERTICES)?;
            if vertex_count < 3 {
                warn!("Polygon with less than 3 vertices. statement: {}", statement);
                return Ok(None);
            }
            let center = Vector::new(modifiers[2], modifiers[3]);
            let radius = modifiers[4] / 2.0;
            let rotation = modifiers[5];
            let points = (0..vertex_count)
                .map(|index| {
                    let angle = 2.0 * PI * index as f64 / vertex_count as f64;
                    let vertex = Position::new(radius * angle.cos(), radius * angle.sin()) + center;
                    vertex.rotate_degrees(rotation)
                })
                .collect();
            Some(MacroShape::Outline {
                points,
                exposure: exposure(modifiers[0]),
            })
        }
        6 | 7 => return Err(MacroError::UnsupportedPrimitive(code)),
        _ => return Err(MacroError::UnknownPrimitive(code_field.to_string())),
    };

    Ok(shape)
}

fn exposure(value: f64) -> Exposure {
    // 2 toggles exposure, without polarity tracking it is treated as on
    Exposure::from(value.round() as i64 != 0)
}

/// A stroked line becomes a four-corner outline, a zero-width one stays a line.
fn vector_line(start: Position, end: Position, width: f64, exposure: Exposure) -> Option<MacroShape> {
    let direction = end - start;
    let line_length = length(direction);
    if line_length == 0.0 {
        return None;
    }
    if width == 0.0 {
        return Some(MacroShape::Line {
            start,
            end,
            exposure,
        });
    }

    let half_width = Vector::new(-direction.y, direction.x) / line_length * (width / 2.0);
    Some(MacroShape::Outline {
        points: vec![start - half_width, start + half_width, end + half_width, end - half_width],
        exposure,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ExpressionToken {
    Number(f64),
    Variable(u32),
    Plus,
    Minus,
    Multiply,
    Divide,
    Open,
    Close,
}

const MAX_POLYGON_VERTICES: usize = 12;

/// A vertex count modifier as an integer no larger than `limit`. Negative counts read as 0.
fn vertex_count(statement: &str, value: f64, limit: usize) -> Result<usize, MacroError> {
    if !value.is_finite() || value.fract() != 0.0 || value > limit as f64 {
        return Err(MacroError::InvalidExpression {
            expression: statement.to_string(),
            reason: format!("vertex count {} is not an integer in 0..={}", value, limit),
        });
    }
    Ok(value.max(0.0) as usize)
}

/// Evaluate a macro arithmetic expression; `x`/`X` multiply, `$n` reads a variable.
pub fn evaluate_expression(expression: &str, context: &MacroContext) -> Result<f64, MacroError> {
    let invalid = |reason: &str| MacroError::InvalidExpression {
        expression: expression.to_string(),
        reason: reason.to_string(),
    };

    let tokens = tokenize_expression(expression).map_err(|reason| invalid(&reason))?;
    if tokens.is_empty() {
        return Err(invalid("empty expression"));
    }

    let mut parser = ExpressionParser {
        tokens: &tokens,
        position: 0,
        context,
    };
    let value = parser
        .sum()
        .map_err(|reason| invalid(&reason))?;
    if parser.position != tokens.len() {
        return Err(invalid("unexpected trailing tokens"));
    }
    Ok(value)
}

fn tokenize_expression(expression: &str) -> Result<Vec<ExpressionToken>, String> {
    let mut tokens = vec![];
    let mut chars = expression.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(ExpressionToken::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(ExpressionToken::Minus);
            }
            'x' | 'X' => {
                chars.next();
                tokens.push(ExpressionToken::Multiply);
            }
            '/' => {
                chars.next();
                tokens.push(ExpressionToken::Divide);
            }
            '(' => {
                chars.next();
                tokens.push(ExpressionToken::Open);
            }
            ')' => {
                chars.next();
                tokens.push(ExpressionToken::Close);
            }
            '$' => {
                chars.next();
                let mut digits = String::new();
                while let Some(digit) = chars.next_if(|c| c.is_ascii_digit()) {
                    digits.push(digit);
                }
                let number = digits
                    .parse()
                    .map_err(|_| format!("bad variable reference '${}'", digits))?;
                tokens.push(ExpressionToken::Variable(number));
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut number = String::new();
                while let Some(digit) = chars.next_if(|c| c.is_ascii_digit() || *c == '.') {
                    number.push(digit);
                }
                let value = number
                    .parse()
                    .map_err(|_| format!("bad number '{}'", number))?;
                tokens.push(ExpressionToken::Number(value));
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }

    Ok(tokens)
}

struct ExpressionParser<'a> {
    tokens: &'a [ExpressionToken],
    position: usize,
    context: &'a MacroContext,
}

impl ExpressionParser<'_> {
    fn peek(&self) -> Option<ExpressionToken> {
        self.tokens.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<ExpressionToken> {
        let token = self.peek();
        self.position += 1;
        token
    }

    fn sum(&mut self) -> Result<f64, String> {
        let mut value = self.product()?;
        loop {
            match self.peek() {
                Some(ExpressionToken::Plus) => {
                    self.advance();
                    value += self.product()?;
                }
                Some(ExpressionToken::Minus) => {
                    self.advance();
                    value -= self.product()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn product(&mut self) -> Result<f64, String> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(ExpressionToken::Multiply) => {
                    self.advance();
                    value *= self.unary()?;
                }
                Some(ExpressionToken::Divide) => {
                    self.advance();
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err("division by zero".to_string());
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some(ExpressionToken::Minus) => {
                self.advance();
                Ok(-self.unary()?)
            }
            Some(ExpressionToken::Plus) => {
                self.advance();
                self.unary()
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<f64, String> {
        match self.advance() {
            Some(ExpressionToken::Number(value)) => Ok(value),
            Some(ExpressionToken::Variable(number)) => Ok(self.context.get(number)),
            Some(ExpressionToken::Open) => {
                let value = self.sum()?;
                match self.advance() {
                    Some(ExpressionToken::Close) => Ok(value),
                    _ => Err("missing ')'".to_string()),
                }
            }
            Some(token) => Err(format!("unexpected token {:?}", token)),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}
