//! Arithmetic over functional models.
//!
//! `+ - * /` are implemented for every combination of owned and borrowed
//! models and `f64`. Combining two models can fail (a name may be a parameter
//! in one and a variable in the other), so model-with-model operators return
//! [`Result`]. Operators with a number cannot fail and return the model
//! directly.
//!
//! Parameters and variables of the result are the ordered union of both
//! operands' names: the left operand's names first, then the right operand's
//! new names in their declared order. Operands are never modified.

use std::collections::HashMap;
use std::ops::{Add, Div, Mul, Neg, Sub};

use super::FunctionalModel;
use crate::error::Result;
use crate::symbolic::Expr;

/// Right-hand side of a model operation.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    /// Another model
    Model(&'a FunctionalModel),

    /// A plain number
    Number(f64),
}

impl<'a> From<&'a FunctionalModel> for Operand<'a> {
    fn from(model: &'a FunctionalModel) -> Self {
        Operand::Model(model)
    }
}

impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Operand::Number(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn apply(self, lhs: Expr, rhs: Expr) -> Expr {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            BinaryOp::Pow => lhs.pow(rhs),
        }
    }
}

/// `left` followed by the names of `right` not already in `left`.
pub(crate) fn ordered_union(left: &[String], right: &[String]) -> Vec<String> {
    let mut names = left.to_vec();
    for name in right {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}

/// Bound values of both operands; the left operand wins on shared names.
pub(crate) fn merge_values(
    left: &HashMap<String, f64>,
    right: &HashMap<String, f64>,
) -> HashMap<String, f64> {
    let mut values = right.clone();
    values.extend(left.iter().map(|(name, value)| (name.clone(), *value)));
    values
}

impl FunctionalModel {
    fn combine(&self, rhs: Operand<'_>, op: BinaryOp) -> Result<FunctionalModel> {
        match rhs {
            Operand::Number(value) => Ok(self.with_number(value, op, false)),
            Operand::Model(other) => FunctionalModel::build(
                ordered_union(&self.parameters, &other.parameters),
                ordered_union(&self.variables, &other.variables),
                op.apply(self.equation.clone(), other.equation.clone()),
                self.special_function || other.special_function,
                merge_values(&self.parameter_values, &other.parameter_values),
            ),
        }
    }

    fn with_number(&self, value: f64, op: BinaryOp, number_on_left: bool) -> FunctionalModel {
        let equation = if number_on_left {
            op.apply(Expr::Number(value), self.equation.clone())
        } else {
            op.apply(self.equation.clone(), Expr::Number(value))
        };
        self.with_equation(equation)
    }

    /// Raise the model to a power given by a number or another model.
    ///
    /// ```rust
    /// use symfit_rs::FunctionalModel;
    ///
    /// let line = FunctionalModel::new("m b", "x", "m*x + b").unwrap();
    /// let squared = line.pow(2.0).unwrap();
    /// assert_eq!(squared.call(&[2.0, 1.0, 1.0]).unwrap(), 9.0);
    /// ```
    pub fn pow<'a>(&self, exponent: impl Into<Operand<'a>>) -> Result<FunctionalModel> {
        self.combine(exponent.into(), BinaryOp::Pow)
    }
}

macro_rules! impl_model_op {
    { $op_trait:ident, $method:ident, $op:expr } => {
        impl $op_trait<&FunctionalModel> for &FunctionalModel {
            type Output = Result<FunctionalModel>;

            fn $method(self, rhs: &FunctionalModel) -> Self::Output {
                self.combine(Operand::Model(rhs), $op)
            }
        }

        impl $op_trait<FunctionalModel> for FunctionalModel {
            type Output = Result<FunctionalModel>;

            fn $method(self, rhs: FunctionalModel) -> Self::Output {
                self.combine(Operand::Model(&rhs), $op)
            }
        }

        impl $op_trait<&FunctionalModel> for FunctionalModel {
            type Output = Result<FunctionalModel>;

            fn $method(self, rhs: &FunctionalModel) -> Self::Output {
                self.combine(Operand::Model(rhs), $op)
            }
        }

        impl $op_trait<FunctionalModel> for &FunctionalModel {
            type Output = Result<FunctionalModel>;

            fn $method(self, rhs: FunctionalModel) -> Self::Output {
                self.combine(Operand::Model(&rhs), $op)
            }
        }

        impl $op_trait<f64> for &FunctionalModel {
            type Output = FunctionalModel;

            fn $method(self, rhs: f64) -> FunctionalModel {
                self.with_number(rhs, $op, false)
            }
        }

        impl $op_trait<f64> for FunctionalModel {
            type Output = FunctionalModel;

            fn $method(self, rhs: f64) -> FunctionalModel {
                self.with_number(rhs, $op, false)
            }
        }

        impl $op_trait<&FunctionalModel> for f64 {
            type Output = FunctionalModel;

            fn $method(self, rhs: &FunctionalModel) -> FunctionalModel {
                rhs.with_number(self, $op, true)
            }
        }

        impl $op_trait<FunctionalModel> for f64 {
            type Output = FunctionalModel;

            fn $method(self, rhs: FunctionalModel) -> FunctionalModel {
                rhs.with_number(self, $op, true)
            }
        }
    };
}

impl_model_op! { Add, add, BinaryOp::Add }
impl_model_op! { Sub, sub, BinaryOp::Sub }
impl_model_op! { Mul, mul, BinaryOp::Mul }
impl_model_op! { Div, div, BinaryOp::Div }

impl Neg for &FunctionalModel {
    type Output = FunctionalModel;

    fn neg(self) -> FunctionalModel {
        self.with_equation(-self.equation.clone())
    }
}

impl Neg for FunctionalModel {
    type Output = FunctionalModel;

    fn neg(self) -> FunctionalModel {
        -&self
    }
}
