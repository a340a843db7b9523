//! Expression composition, parsing and evaluation
//!
//! This module provides the arithmetic layer over parameters: expressions
//! are trees whose leaves are numbers and [`Parameter`] symbols, built
//! either through operator overloading or by parsing a string against a
//! symbol resolver. Equality is structural, and at the leaves it reduces to
//! parameter identity, so an expression rebuilt from reconstructed
//! parameters compares equal to the original.

use crate::parameters::identity::ParameterId;
use crate::parameters::parameter::Parameter;
use crate::parameters::vector::ParameterVector;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0},
    combinator::recognize,
    multi::many0,
    number::complete::double,
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use thiserror::Error;

/// Error that can occur during expression parsing or evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Failed to parse expression: {message}")]
    ParseError { message: String },

    #[error("Unknown symbol: {name}")]
    UnknownSymbol { name: String },

    #[error("Undefined function: {name}")]
    UndefinedFunction { name: String },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Parameter '{name}' has no bound value")]
    UnboundParameter { name: String },

    #[error("Division by zero")]
    DivisionByZero,
}

/// Result type for expression operations
type ExprResult<T> = Result<T, ExpressionError>;

/// Unary operations and elementary functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    Sin,
    Cos,
    Tan,
    Exp,
    /// Natural logarithm
    Ln,
    Sqrt,
    Abs,
}

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Addition (+)
    Add,

    /// Subtraction (-)
    Sub,

    /// Multiplication (*)
    Mul,

    /// Division (/)
    Div,

    /// Power (^)
    Pow,
}

/// Expression AST node
///
/// Expressions own their parameter leaves (cheap clones of shared records),
/// so an expression stays a valid operand after the vector that produced
/// its leaves has shrunk or been dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant number
    Number(f64),

    /// Symbolic parameter leaf
    Parameter(Parameter),

    /// Unary operation or elementary function
    Unary(UnaryOp, Box<Expression>),

    /// Binary operation
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
}

/// Resolves display names to existing parameters while parsing.
///
/// Parsing never invents identities: every symbol in the input must map to
/// a parameter that already exists, supplied by the resolver.
pub trait SymbolResolver {
    /// Look up the parameter for a display name.
    fn resolve(&self, name: &str) -> Option<Parameter>;
}

impl SymbolResolver for HashMap<String, Parameter> {
    fn resolve(&self, name: &str) -> Option<Parameter> {
        self.get(name).cloned()
    }
}

impl SymbolResolver for [Parameter] {
    fn resolve(&self, name: &str) -> Option<Parameter> {
        self.iter().find(|param| param.name() == name).cloned()
    }
}

impl SymbolResolver for ParameterVector {
    /// Resolves `"{name}[{index}]"` forms against the live elements.
    fn resolve(&self, name: &str) -> Option<Parameter> {
        let rest = name.strip_prefix(self.name())?;
        let digits = rest.strip_prefix('[')?.strip_suffix(']')?;
        let index = digits.parse::<usize>().ok()?;
        self.get(index).ok()
    }
}

impl Expression {
    /// Parse an expression, resolving symbols through `resolver`.
    ///
    /// Symbol names may carry a bracketed index (`theta[10]`), which is
    /// resolved as a whole; a [`ParameterVector`] resolver maps such names
    /// to its own elements.
    pub fn parse<R: SymbolResolver + ?Sized>(input: &str, resolver: &R) -> ExprResult<Self> {
        match expr_parser(input.trim()) {
            Ok((remainder, parsed)) => {
                // Make sure the entire input was consumed
                if remainder.trim().is_empty() {
                    resolve_parsed(parsed, resolver)
                } else {
                    Err(ExpressionError::ParseError {
                        message: format!("Unexpected trailing characters: '{}'", remainder),
                    })
                }
            }
            Err(e) => Err(ExpressionError::ParseError {
                message: format!("{:?}", e),
            }),
        }
    }

    /// The distinct parameters appearing in the expression, in canonical
    /// order (vector name, then numeric index).
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut seen = HashSet::new();
        let mut params = Vec::new();
        self.collect_parameters(&mut seen, &mut params);
        params.sort_by(Parameter::canonical_cmp);
        params
    }

    fn collect_parameters(&self, seen: &mut HashSet<ParameterId>, out: &mut Vec<Parameter>) {
        match self {
            Self::Number(_) => {}
            Self::Parameter(param) => {
                if seen.insert(param.id()) {
                    out.push(param.clone());
                }
            }
            Self::Unary(_, operand) => operand.collect_parameters(seen, out),
            Self::Binary(_, left, right) => {
                left.collect_parameters(seen, out);
                right.collect_parameters(seen, out);
            }
        }
    }

    /// Whether `param` (by identity) appears as a leaf.
    pub fn contains(&self, param: &Parameter) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Parameter(leaf) => leaf == param,
            Self::Unary(_, operand) => operand.contains(param),
            Self::Binary(_, left, right) => left.contains(param) || right.contains(param),
        }
    }

    /// Replace bound parameters with their numeric values.
    ///
    /// Parameters missing from `values` are left symbolic, so partial
    /// binding composes.
    pub fn bind(&self, values: &HashMap<ParameterId, f64>) -> Expression {
        match self {
            Self::Number(n) => Self::Number(*n),
            Self::Parameter(param) => match values.get(&param.id()) {
                Some(value) => Self::Number(*value),
                None => Self::Parameter(param.clone()),
            },
            Self::Unary(op, operand) => Self::Unary(*op, Box::new(operand.bind(values))),
            Self::Binary(op, left, right) => Self::Binary(
                *op,
                Box::new(left.bind(values)),
                Box::new(right.bind(values)),
            ),
        }
    }

    /// [`bind`](Self::bind) keyed by display name instead of identity.
    pub fn bind_by_name(&self, values: &HashMap<String, f64>) -> Expression {
        let by_id = self
            .parameters()
            .into_iter()
            .filter_map(|param| values.get(param.name()).map(|value| (param.id(), *value)))
            .collect();
        self.bind(&by_id)
    }

    /// Replace parameters with whole expressions.
    pub fn subs(&self, replacements: &HashMap<ParameterId, Expression>) -> Expression {
        match self {
            Self::Number(n) => Self::Number(*n),
            Self::Parameter(param) => match replacements.get(&param.id()) {
                Some(replacement) => replacement.clone(),
                None => Self::Parameter(param.clone()),
            },
            Self::Unary(op, operand) => Self::Unary(*op, Box::new(operand.subs(replacements))),
            Self::Binary(op, left, right) => Self::Binary(
                *op,
                Box::new(left.subs(replacements)),
                Box::new(right.subs(replacements)),
            ),
        }
    }

    /// Evaluate the expression with the given parameter values.
    ///
    /// # Errors
    ///
    /// [`ExpressionError::UnboundParameter`] when a leaf has no value in
    /// `values`; [`ExpressionError::DivisionByZero`] on a zero divisor.
    pub fn evaluate(&self, values: &HashMap<ParameterId, f64>) -> ExprResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),

            Self::Parameter(param) => values.get(&param.id()).copied().ok_or_else(|| {
                ExpressionError::UnboundParameter {
                    name: param.name().to_string(),
                }
            }),

            Self::Unary(op, operand) => {
                let value = operand.evaluate(values)?;
                Ok(match op {
                    UnaryOp::Neg => -value,
                    UnaryOp::Sin => value.sin(),
                    UnaryOp::Cos => value.cos(),
                    UnaryOp::Tan => value.tan(),
                    UnaryOp::Exp => value.exp(),
                    UnaryOp::Ln => value.ln(),
                    UnaryOp::Sqrt => value.sqrt(),
                    UnaryOp::Abs => value.abs(),
                })
            }

            Self::Binary(op, left, right) => {
                let lhs = left.evaluate(values)?;
                let rhs = right.evaluate(values)?;

                match op {
                    BinaryOp::Add => Ok(lhs + rhs),
                    BinaryOp::Sub => Ok(lhs - rhs),
                    BinaryOp::Mul => Ok(lhs * rhs),
                    BinaryOp::Div => {
                        if rhs == 0.0 {
                            Err(ExpressionError::DivisionByZero)
                        } else {
                            Ok(lhs / rhs)
                        }
                    }
                    BinaryOp::Pow => Ok(lhs.powf(rhs)),
                }
            }
        }
    }

    /// Evaluate a fully bound expression.
    pub fn value(&self) -> ExprResult<f64> {
        self.evaluate(&HashMap::new())
    }

    pub fn sin(self) -> Self {
        Self::Unary(UnaryOp::Sin, Box::new(self))
    }

    pub fn cos(self) -> Self {
        Self::Unary(UnaryOp::Cos, Box::new(self))
    }

    pub fn tan(self) -> Self {
        Self::Unary(UnaryOp::Tan, Box::new(self))
    }

    pub fn exp(self) -> Self {
        Self::Unary(UnaryOp::Exp, Box::new(self))
    }

    pub fn ln(self) -> Self {
        Self::Unary(UnaryOp::Ln, Box::new(self))
    }

    pub fn sqrt(self) -> Self {
        Self::Unary(UnaryOp::Sqrt, Box::new(self))
    }

    pub fn abs(self) -> Self {
        Self::Unary(UnaryOp::Abs, Box::new(self))
    }

    pub fn pow<T: Into<Expression>>(self, exponent: T) -> Self {
        Self::Binary(BinaryOp::Pow, Box::new(self), Box::new(exponent.into()))
    }

    /// Printing precedence; negative literals count as lowest so they get
    /// parenthesized inside larger expressions and the output re-parses.
    fn precedence(&self) -> u8 {
        match self {
            Self::Number(n) if *n < 0.0 => 0,
            Self::Number(_) | Self::Parameter(_) => 4,
            Self::Unary(UnaryOp::Neg, _) => 0,
            Self::Unary(..) => 4,
            Self::Binary(op, ..) => match op {
                BinaryOp::Add | BinaryOp::Sub => 1,
                BinaryOp::Mul | BinaryOp::Div => 2,
                BinaryOp::Pow => 3,
            },
        }
    }

    fn fmt_operand(
        &self,
        f: &mut fmt::Formatter<'_>,
        parent_prec: u8,
        needs_parens_on_tie: bool,
    ) -> fmt::Result {
        let prec = self.precedence();
        if prec < parent_prec || (prec == parent_prec && needs_parens_on_tie) {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),

            Self::Parameter(param) => f.write_str(param.name()),

            Self::Unary(UnaryOp::Neg, operand) => {
                f.write_str("-")?;
                operand.fmt_operand(f, 4, false)
            }

            Self::Unary(op, operand) => {
                let name = match op {
                    UnaryOp::Sin => "sin",
                    UnaryOp::Cos => "cos",
                    UnaryOp::Tan => "tan",
                    UnaryOp::Exp => "exp",
                    UnaryOp::Ln => "ln",
                    UnaryOp::Sqrt => "sqrt",
                    UnaryOp::Abs => "abs",
                    UnaryOp::Neg => unreachable!(),
                };
                write!(f, "{}({})", name, operand)
            }

            Self::Binary(op, left, right) => {
                let (symbol, prec) = match op {
                    BinaryOp::Add => ("+", 1),
                    BinaryOp::Sub => ("-", 1),
                    BinaryOp::Mul => ("*", 2),
                    BinaryOp::Div => ("/", 2),
                    BinaryOp::Pow => ("^", 3),
                };
                // Pow is right-associative; Sub and Div do not associate on
                // the right.
                left.fmt_operand(f, prec, matches!(op, BinaryOp::Pow))?;
                f.write_str(symbol)?;
                right.fmt_operand(
                    f,
                    prec,
                    matches!(op, BinaryOp::Sub | BinaryOp::Div),
                )
            }
        }
    }
}

impl From<Parameter> for Expression {
    fn from(param: Parameter) -> Self {
        Self::Parameter(param)
    }
}

impl From<&Parameter> for Expression {
    fn from(param: &Parameter) -> Self {
        Self::Parameter(param.clone())
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Expression {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<u32> for Expression {
    fn from(value: u32) -> Self {
        Self::Number(value as f64)
    }
}

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        Expression::Unary(UnaryOp::Neg, Box::new(self))
    }
}

impl Neg for Parameter {
    type Output = Expression;

    fn neg(self) -> Expression {
        Expression::Unary(UnaryOp::Neg, Box::new(self.into()))
    }
}

macro_rules! binary_ops {
    ($($trait:ident :: $method:ident => $op:path),* $(,)?) => {$(
        impl<T: Into<Expression>> $trait<T> for Expression {
            type Output = Expression;

            #[inline]
            fn $method(self, other: T) -> Expression {
                Expression::Binary($op, Box::new(self), Box::new(other.into()))
            }
        }

        impl<T: Into<Expression>> $trait<T> for Parameter {
            type Output = Expression;

            #[inline]
            fn $method(self, other: T) -> Expression {
                Expression::Binary($op, Box::new(self.into()), Box::new(other.into()))
            }
        }
    )*}
}

binary_ops! {
    Add::add => BinaryOp::Add,
    Sub::sub => BinaryOp::Sub,
    Mul::mul => BinaryOp::Mul,
    Div::div => BinaryOp::Div,
}

macro_rules! binary_assign_ops {
    ($($trait:ident :: $method:ident => $op:path),* $(,)?) => {$(
        impl<T: Into<Expression>> $trait<T> for Expression {
            #[inline]
            fn $method(&mut self, other: T) {
                let left = std::mem::replace(self, Expression::Number(0.0));
                *self = Expression::Binary($op, Box::new(left), Box::new(other.into()));
            }
        }
    )*}
}

binary_assign_ops! {
    AddAssign::add_assign => BinaryOp::Add,
    SubAssign::sub_assign => BinaryOp::Sub,
    MulAssign::mul_assign => BinaryOp::Mul,
    DivAssign::div_assign => BinaryOp::Div,
}

// Parser functions using nom. Parsing produces a name-based AST first;
// symbols are then resolved to parameters in a second pass.

#[derive(Debug)]
enum ParsedExpr {
    Number(f64),
    Symbol(String),
    Call(String, Vec<ParsedExpr>),
    Unary(UnaryOp, Box<ParsedExpr>),
    Binary(BinaryOp, Box<ParsedExpr>, Box<ParsedExpr>),
}

fn function_op(name: &str) -> Option<UnaryOp> {
    match name {
        "sin" => Some(UnaryOp::Sin),
        "cos" => Some(UnaryOp::Cos),
        "tan" => Some(UnaryOp::Tan),
        "exp" => Some(UnaryOp::Exp),
        "ln" | "log" => Some(UnaryOp::Ln),
        "sqrt" => Some(UnaryOp::Sqrt),
        "abs" => Some(UnaryOp::Abs),
        _ => None,
    }
}

fn resolve_parsed<R: SymbolResolver + ?Sized>(
    parsed: ParsedExpr,
    resolver: &R,
) -> ExprResult<Expression> {
    match parsed {
        ParsedExpr::Number(n) => Ok(Expression::Number(n)),

        ParsedExpr::Symbol(name) => resolver
            .resolve(&name)
            .map(Expression::Parameter)
            .ok_or(ExpressionError::UnknownSymbol { name }),

        ParsedExpr::Call(name, args) => {
            let op = function_op(&name)
                .ok_or_else(|| ExpressionError::UndefinedFunction { name: name.clone() })?;
            let [arg] = <[ParsedExpr; 1]>::try_from(args).map_err(|args| {
                ExpressionError::InvalidOperation {
                    message: format!("{}() requires 1 argument, got {}", name, args.len()),
                }
            })?;
            Ok(Expression::Unary(op, Box::new(resolve_parsed(arg, resolver)?)))
        }

        ParsedExpr::Unary(op, operand) => Ok(Expression::Unary(
            op,
            Box::new(resolve_parsed(*operand, resolver)?),
        )),

        ParsedExpr::Binary(op, left, right) => Ok(Expression::Binary(
            op,
            Box::new(resolve_parsed(*left, resolver)?),
            Box::new(resolve_parsed(*right, resolver)?),
        )),
    }
}

/// Parse an identifier (symbol or function name)
fn identifier(input: &str) -> IResult<&str, String> {
    let mut parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));

    let (input, matched) = parser.parse(input)?;
    Ok((input, matched.to_string()))
}

/// Parse a symbol reference, including `name[index]` forms
fn symbol(input: &str) -> IResult<&str, ParsedExpr> {
    let (input, base) = identifier(input)?;

    let mut index_parser = recognize(delimited(
        char::<&str, nom::error::Error<&str>>('['),
        digit1,
        char(']'),
    ));
    match index_parser.parse(input) {
        Ok((rest, suffix)) => Ok((rest, ParsedExpr::Symbol(format!("{}{}", base, suffix)))),
        Err(_) => Ok((input, ParsedExpr::Symbol(base))),
    }
}

/// Parse a comma-separated list of expressions (for function arguments)
fn args_list(input: &str) -> IResult<&str, Vec<ParsedExpr>> {
    let (input, first) = expr_parser(input)?;
    let mut res = vec![first];

    let mut remainder = input;
    loop {
        let mut comma_parser = delimited(
            multispace0::<&str, nom::error::Error<&str>>,
            char::<&str, nom::error::Error<&str>>(','),
            multispace0::<&str, nom::error::Error<&str>>,
        );

        match comma_parser.parse(remainder) {
            Ok((after_comma, _)) => match expr_parser(after_comma) {
                Ok((after_expr, expr)) => {
                    res.push(expr);
                    remainder = after_expr;
                }
                Err(_) => break,
            },
            Err(_) => break,
        }
    }

    Ok((remainder, res))
}

/// Parse a function call
fn function_call(input: &str) -> IResult<&str, ParsedExpr> {
    let (input, name) = identifier(input)?;
    let (input, _) = multispace0::<&str, nom::error::Error<&str>>.parse(input)?;
    let (input, _) = char::<&str, nom::error::Error<&str>>('(').parse(input)?;
    let (input, _) = multispace0::<&str, nom::error::Error<&str>>.parse(input)?;

    // Handle empty arguments case
    if let Ok((input, _)) = char::<&str, nom::error::Error<&str>>(')').parse(input) {
        return Ok((input, ParsedExpr::Call(name, vec![])));
    }

    let (input, args) = args_list(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = char::<&str, nom::error::Error<&str>>(')').parse(input)?;

    Ok((input, ParsedExpr::Call(name, args)))
}

/// Parse a number
fn number(input: &str) -> IResult<&str, ParsedExpr> {
    let (input, num) = double(input)?;
    Ok((input, ParsedExpr::Number(num)))
}

/// Parse a parenthesized expression
fn parens(input: &str) -> IResult<&str, ParsedExpr> {
    let (input, _) = char('(').parse(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, expr) = expr_parser(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = char::<_, nom::error::Error<_>>(')').parse(input)?;
    Ok((input, expr))
}

/// Parse a primary expression (number, function call, symbol, or
/// parenthesized expression)
fn primary(input: &str) -> IResult<&str, ParsedExpr> {
    if let Ok(result) = number(input) {
        return Ok(result);
    }

    if let Ok(result) = function_call(input) {
        return Ok(result);
    }

    if let Ok(result) = symbol(input) {
        return Ok(result);
    }

    parens(input)
}

/// Parse a unary expression (-expr)
fn unary(input: &str) -> IResult<&str, ParsedExpr> {
    let (input, _) = multispace0.parse(input)?;

    let mut neg_parser = preceded(char('-'), primary);
    match neg_parser.parse(input) {
        Ok((remaining, expr)) => Ok((
            remaining,
            ParsedExpr::Unary(UnaryOp::Neg, Box::new(expr)),
        )),
        Err(_) => primary(input),
    }
}

/// Parse a power expression (expr ^ expr, right-associative)
fn power(input: &str) -> IResult<&str, ParsedExpr> {
    let (input, left) = unary(input)?;
    let (input, _) = multispace0.parse(input)?;

    let mut op_parser = char::<_, nom::error::Error<_>>('^');
    match op_parser.parse(input) {
        Ok((after_op, _)) => {
            let (after_op, _) = multispace0.parse(after_op)?;
            let (after_right, right) = power(after_op)?;
            Ok((
                after_right,
                ParsedExpr::Binary(BinaryOp::Pow, Box::new(left), Box::new(right)),
            ))
        }
        Err(_) => Ok((input, left)),
    }
}

/// Parse a multiplicative expression (expr * expr, expr / expr),
/// left-associative
fn term(input: &str) -> IResult<&str, ParsedExpr> {
    let (input, first) = power(input)?;

    let mut expr = first;
    let mut remainder = input;
    loop {
        let (after_space, _) = multispace0::<&str, nom::error::Error<&str>>.parse(remainder)?;

        let op = if let Ok((rest, _)) =
            char::<&str, nom::error::Error<&str>>('*').parse(after_space)
        {
            Some((rest, BinaryOp::Mul))
        } else if let Ok((rest, _)) = char::<&str, nom::error::Error<&str>>('/').parse(after_space)
        {
            Some((rest, BinaryOp::Div))
        } else {
            None
        };

        match op {
            Some((rest, op)) => {
                let (rest, _) = multispace0.parse(rest)?;
                let (rest, right) = power(rest)?;
                expr = ParsedExpr::Binary(op, Box::new(expr), Box::new(right));
                remainder = rest;
            }
            None => return Ok((remainder, expr)),
        }
    }
}

/// Parse an additive expression (expr + expr, expr - expr),
/// left-associative
fn expr_parser(input: &str) -> IResult<&str, ParsedExpr> {
    let (input, _) = multispace0.parse(input)?;
    let (input, first) = term(input)?;

    let mut expr = first;
    let mut remainder = input;
    loop {
        let (after_space, _) = multispace0::<&str, nom::error::Error<&str>>.parse(remainder)?;

        let op = if let Ok((rest, _)) =
            char::<&str, nom::error::Error<&str>>('+').parse(after_space)
        {
            Some((rest, BinaryOp::Add))
        } else if let Ok((rest, _)) = char::<&str, nom::error::Error<&str>>('-').parse(after_space)
        {
            Some((rest, BinaryOp::Sub))
        } else {
            None
        };

        match op {
            Some((rest, op)) => {
                let (rest, _) = multispace0.parse(rest)?;
                let (rest, right) = term(rest)?;
                expr = ParsedExpr::Binary(op, Box::new(expr), Box::new(right));
                remainder = rest;
            }
            None => return Ok((remainder, expr)),
        }
    }
}
