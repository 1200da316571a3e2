//! Equation parsing.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := factor (('*' | '/') factor)*
//! factor  := ('-' | '+') factor | power
//! power   := primary (('^' | '**') factor)?
//! primary := number | call | constant | symbol | '(' expr ')'
//! ```
//!
//! The names `oo` and `nan` read back the printed forms of infinity and NaN.
//!
//! Both `^` and `**` denote exponentiation, so equations written for either
//! convention parse the same way.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::recognize,
    multi::many0,
    number::complete::double,
    sequence::pair,
    IResult, Parser,
};

use super::expr::{Constant, Expr, Function};
use super::SymbolicError;

type ParseResult<'a, O> = IResult<&'a str, O>;

/// Parse equation text into an expression tree.
pub fn parse(input: &str) -> Result<Expr, SymbolicError> {
    if input.trim().is_empty() {
        return Err(SymbolicError::ParseError {
            message: "empty equation".to_string(),
        });
    }

    match expression(input) {
        Ok((remainder, expr)) => {
            if remainder.trim().is_empty() {
                validate(&expr)?;
                Ok(expr)
            } else {
                Err(SymbolicError::ParseError {
                    message: format!("Unexpected trailing characters: '{}'", remainder.trim()),
                })
            }
        }
        Err(e) => Err(SymbolicError::ParseError {
            message: format!("{:?}", e),
        }),
    }
}

/// Reject calls with unknown names or a wrong number of arguments.
fn validate(expr: &Expr) -> Result<(), SymbolicError> {
    match expr {
        Expr::Number(_) | Expr::Symbol(_) | Expr::Constant(_) => Ok(()),
        Expr::Neg(inner) => validate(inner),
        Expr::Add(lhs, rhs)
        | Expr::Sub(lhs, rhs)
        | Expr::Mul(lhs, rhs)
        | Expr::Div(lhs, rhs)
        | Expr::Pow(lhs, rhs) => {
            validate(lhs)?;
            validate(rhs)
        }
        Expr::Call(function, args) => {
            if args.len() != function.arity() {
                return Err(SymbolicError::ArityMismatch {
                    name: function.name().to_string(),
                    expected: function.arity(),
                    found: args.len(),
                });
            }
            args.iter().try_for_each(validate)
        }
    }
}

fn ws(input: &str) -> ParseResult<'_, &str> {
    multispace0(input)
}

fn symbol_char(c: char, input: &str) -> ParseResult<'_, char> {
    char(c).parse(input)
}

fn keyword<'a>(word: &'static str, input: &'a str) -> ParseResult<'a, &'a str> {
    tag(word).parse(input)
}

/// Parse an identifier (symbol, constant or function name)
fn identifier(input: &str) -> ParseResult<'_, String> {
    let mut parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));

    let parsed: ParseResult<'_, &str> = parser.parse(input);
    let (input, matched) = parsed?;
    Ok((input, matched.to_string()))
}

/// Parse an unsigned numeric literal
fn number(input: &str) -> ParseResult<'_, Expr> {
    let parsed: ParseResult<'_, f64> = double(input);
    let (input, value) = parsed?;
    Ok((input, Expr::Number(value)))
}

/// Parse a comma-separated argument list, after the opening parenthesis
fn arguments(input: &str) -> ParseResult<'_, Vec<Expr>> {
    let (input, _) = ws(input)?;
    if let Ok((rest, _)) = symbol_char(')', input) {
        return Ok((rest, Vec::new()));
    }

    let (mut input, first) = expression(input)?;
    let mut args = vec![first];
    loop {
        let (rest, _) = ws(input)?;
        if let Ok((rest, _)) = symbol_char(',', rest) {
            let (rest, arg) = expression(rest)?;
            args.push(arg);
            input = rest;
        } else {
            let (rest, _) = symbol_char(')', rest)?;
            return Ok((rest, args));
        }
    }
}

/// Parse a symbol, constant or function call
fn named(input: &str) -> ParseResult<'_, Expr> {
    let (after_name, name) = identifier(input)?;
    let (after_space, _) = ws(after_name)?;

    if let Ok((rest, _)) = symbol_char('(', after_space) {
        return match Function::from_name(&name) {
            Some(function) => {
                let (rest, args) = arguments(rest)?;
                Ok((rest, Expr::Call(function, args)))
            }
            // Unknown function names are a hard failure rather than a backtrack.
            None => Err(nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Verify,
            ))),
        };
    }

    let expr = match name.as_str() {
        "pi" => Expr::Constant(Constant::Pi),
        "E" => Expr::Constant(Constant::E),
        "oo" => Expr::Number(f64::INFINITY),
        "nan" => Expr::Number(f64::NAN),
        _ => Expr::Symbol(name),
    };
    Ok((after_name, expr))
}

/// Parse a parenthesized expression
fn parens(input: &str) -> ParseResult<'_, Expr> {
    let (input, _) = symbol_char('(', input)?;
    let (input, expr) = expression(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = symbol_char(')', input)?;
    Ok((input, expr))
}

/// Parse a primary expression
fn primary(input: &str) -> ParseResult<'_, Expr> {
    let (input, _) = ws(input)?;
    match input.chars().next() {
        Some(c) if c.is_ascii_digit() || c == '.' => number(input),
        Some(c) if c.is_alphabetic() || c == '_' => named(input),
        _ => parens(input),
    }
}

/// Parse a power expression, right associative
fn power(input: &str) -> ParseResult<'_, Expr> {
    let (input, base) = primary(input)?;
    let (after_space, _) = ws(input)?;

    let operator = keyword("**", after_space).or_else(|_| keyword("^", after_space));
    match operator {
        Ok((rest, _)) => {
            let (rest, exponent) = factor(rest)?;
            Ok((rest, base.pow(exponent)))
        }
        Err(_) => Ok((input, base)),
    }
}

/// Parse a signed factor
fn factor(input: &str) -> ParseResult<'_, Expr> {
    let (input, _) = ws(input)?;
    if let Ok((rest, _)) = symbol_char('-', input) {
        let (rest, operand) = factor(rest)?;
        return Ok((rest, Expr::Neg(Box::new(operand))));
    }
    if let Ok((rest, _)) = symbol_char('+', input) {
        return factor(rest);
    }
    power(input)
}

/// Parse a multiplicative expression, left associative
fn term(input: &str) -> ParseResult<'_, Expr> {
    let (mut input, mut acc) = factor(input)?;
    loop {
        let (rest, _) = ws(input)?;
        if keyword("**", rest).is_err() {
            if let Ok((rest, _)) = symbol_char('*', rest) {
                let (rest, rhs) = factor(rest)?;
                acc = Expr::Mul(Box::new(acc), Box::new(rhs));
                input = rest;
                continue;
            }
        }
        if let Ok((rest, _)) = symbol_char('/', rest) {
            let (rest, rhs) = factor(rest)?;
            acc = Expr::Div(Box::new(acc), Box::new(rhs));
            input = rest;
            continue;
        }
        return Ok((input, acc));
    }
}

/// Parse an additive expression, left associative
fn expression(input: &str) -> ParseResult<'_, Expr> {
    let (mut input, mut acc) = term(input)?;
    loop {
        let (rest, _) = ws(input)?;
        if let Ok((rest, _)) = symbol_char('+', rest) {
            let (rest, rhs) = term(rest)?;
            acc = Expr::Add(Box::new(acc), Box::new(rhs));
            input = rest;
        } else if let Ok((rest, _)) = symbol_char('-', rest) {
            let (rest, rhs) = term(rest)?;
            acc = Expr::Sub(Box::new(acc), Box::new(rhs));
            input = rest;
        } else {
            return Ok((input, acc));
        }
    }
}
