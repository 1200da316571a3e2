//! Plain-text and LaTeX printing of expressions.
//!
//! The plain-text form parses back to an equal expression tree for everything
//! the parser accepts, which is what model serialization relies on.

use std::fmt;

use super::expr::{Constant, Expr, Function};

const GREEK: [&str; 24] = [
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "omicron", "rho", "sigma", "tau", "upsilon", "phi", "chi",
    "psi", "omega", "Omega",
];

/// Binding strength used to decide where parentheses go.
fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Add(_, _) | Expr::Sub(_, _) => 1,
        Expr::Mul(_, _) | Expr::Div(_, _) => 2,
        Expr::Neg(_) => 3,
        Expr::Number(v) if *v < 0.0 => 3,
        Expr::Pow(_, _) => 4,
        _ => 5,
    }
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "oo".to_string()
        } else {
            "-oo".to_string()
        }
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(v) => write!(f, "{}", format_number(*v)),
            Expr::Symbol(name) => write!(f, "{}", name),
            Expr::Constant(c) => write!(f, "{}", c.name()),
            Expr::Neg(inner) => {
                write!(f, "-")?;
                write_operand(f, inner, precedence(inner) < 4)
            }
            Expr::Add(lhs, rhs) => {
                write_operand(f, lhs, false)?;
                write!(f, " + ")?;
                write_operand(f, rhs, precedence(rhs) <= 1)
            }
            Expr::Sub(lhs, rhs) => {
                write_operand(f, lhs, false)?;
                write!(f, " - ")?;
                write_operand(f, rhs, precedence(rhs) <= 1 || precedence(rhs) == 3)
            }
            Expr::Mul(lhs, rhs) => {
                write_operand(f, lhs, precedence(lhs) < 2)?;
                write!(f, "*")?;
                write_operand(f, rhs, precedence(rhs) < 2 || precedence(rhs) == 3)
            }
            Expr::Div(lhs, rhs) => {
                write_operand(f, lhs, precedence(lhs) < 2)?;
                write!(f, "/")?;
                write_operand(f, rhs, precedence(rhs) <= 3)
            }
            Expr::Pow(base, exponent) => {
                write_operand(f, base, precedence(base) <= 4)?;
                write!(f, "^")?;
                write_operand(f, exponent, precedence(exponent) < 4)
            }
            Expr::Call(function, args) => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl Expr {
    /// Render the expression as LaTeX.
    pub fn to_latex(&self) -> String {
        match self {
            Expr::Number(v) => {
                if v.is_infinite() {
                    if *v > 0.0 {
                        "\\infty".to_string()
                    } else {
                        "-\\infty".to_string()
                    }
                } else {
                    format_number(*v)
                }
            }
            Expr::Symbol(name) => latex_symbol(name),
            Expr::Constant(Constant::Pi) => "\\pi".to_string(),
            Expr::Constant(Constant::E) => "e".to_string(),
            Expr::Neg(inner) => format!("- {}", latex_operand(inner, precedence(inner) < 2)),
            Expr::Add(lhs, rhs) => format!(
                "{} + {}",
                lhs.to_latex(),
                latex_operand(rhs, precedence(rhs) <= 1)
            ),
            Expr::Sub(lhs, rhs) => format!(
                "{} - {}",
                lhs.to_latex(),
                latex_operand(rhs, precedence(rhs) <= 1 || precedence(rhs) == 3)
            ),
            Expr::Mul(lhs, rhs) => {
                let left = latex_operand(lhs, precedence(lhs) < 2);
                let right = latex_operand(rhs, precedence(rhs) < 2 || precedence(rhs) == 3);
                // Juxtaposition reads as a product unless a digit would run into another
                if matches!(**rhs, Expr::Number(_)) {
                    format!("{} \\cdot {}", left, right)
                } else {
                    format!("{} {}", left, right)
                }
            }
            Expr::Div(lhs, rhs) => format!("\\frac{{{}}}{{{}}}", lhs.to_latex(), rhs.to_latex()),
            Expr::Pow(base, exponent) => {
                if let Expr::Constant(Constant::E) = **base {
                    return format!("e^{{{}}}", exponent.to_latex());
                }
                if exponent.as_number() == Some(0.5) {
                    return format!("\\sqrt{{{}}}", base.to_latex());
                }
                let base_text = match **base {
                    Expr::Call(function, _) if !function.is_special() => {
                        format!("\\left({}\\right)", base.to_latex())
                    }
                    _ => latex_operand(base, precedence(base) <= 4),
                };
                format!("{}^{{{}}}", base_text, exponent.to_latex())
            }
            Expr::Call(function, args) => latex_call(*function, args),
        }
    }
}

fn latex_operand(expr: &Expr, parens: bool) -> String {
    if parens {
        format!("\\left({}\\right)", expr.to_latex())
    } else {
        expr.to_latex()
    }
}

fn latex_symbol(name: &str) -> String {
    let (head, subscript) = match name.split_once('_') {
        Some((head, tail)) if !head.is_empty() && !tail.is_empty() => (head, Some(tail)),
        _ => (name, None),
    };
    let head = if GREEK.contains(&head) {
        format!("\\{}", head)
    } else {
        head.to_string()
    };
    match subscript {
        Some(sub) => format!("{}_{{{}}}", head, sub),
        None => head,
    }
}

fn latex_call(function: Function, args: &[Expr]) -> String {
    if function.is_special() && args.len() == 2 {
        let order = args[0].to_latex();
        let arg = args[1].to_latex();
        let head = match function {
            Function::BesselJ => format!("J_{{{}}}", order),
            Function::BesselY => format!("Y_{{{}}}", order),
            Function::BesselI => format!("I_{{{}}}", order),
            Function::BesselK => format!("K_{{{}}}", order),
            Function::Hankel1 => format!("H^{{(1)}}_{{{}}}", order),
            _ => format!("H^{{(2)}}_{{{}}}", order),
        };
        return format!("{}\\left({}\\right)", head, arg);
    }

    let arg = args
        .iter()
        .map(Expr::to_latex)
        .collect::<Vec<_>>()
        .join(", ");
    match function {
        Function::Exp => format!("e^{{{}}}", arg),
        Function::Sqrt => format!("\\sqrt{{{}}}", arg),
        Function::Abs => format!("\\left|{}\\right|", arg),
        Function::Ln => format!("\\log{{\\left({} \\right)}}", arg),
        Function::Log10 => format!("\\log_{{10}}{{\\left({} \\right)}}", arg),
        Function::Asin => format!("\\operatorname{{asin}}{{\\left({} \\right)}}", arg),
        Function::Acos => format!("\\operatorname{{acos}}{{\\left({} \\right)}}", arg),
        Function::Atan => format!("\\operatorname{{atan}}{{\\left({} \\right)}}", arg),
        _ => format!("\\{}{{\\left({} \\right)}}", function.name(), arg),
    }
}
