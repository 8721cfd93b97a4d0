//! Composition expression algebra.
//!
//! Expressions are small immutable trees that render to the text of a
//! composition `ExpressionAnimation`. Every node has a [`simplified`] form
//! with constants folded and identities removed, and the text of a node is
//! always produced from its simplified children.
//!
//! [`simplified`]: Expression::simplified

mod bezier;
mod progress;

pub use bezier::CubicBezierFunction;
pub use progress::{progress_expression, Segment};

use std::fmt;

use thiserror::Error;

/// Errors raised while building a piecewise progress expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("progress expression has no segments")]
    Empty,
    #[error("progress expression is not contiguous")]
    NotContiguous,
    #[error("progress expression is not fully defined")]
    NotFullyDefined,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(f64),
    /// A reference such as `_.Progress` or `my.Position`.
    Name(String),
    Vector2(Box<Expression>, Box<Expression>),
    Sum(Box<Expression>, Box<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
    Multiply(Box<Expression>, Box<Expression>),
    Squared(Box<Expression>),
    Cubed(Box<Expression>),
    LessThan(Box<Expression>, Box<Expression>),
    Ternary {
        condition: Box<Expression>,
        true_value: Box<Expression>,
        false_value: Box<Expression>,
    },
    /// Expression text passed through verbatim.
    Untyped(String),
}

impl Expression {
    pub fn number(value: f64) -> Self {
        Expression::Number(value)
    }

    pub fn name(name: impl Into<String>) -> Self {
        Expression::Name(name.into())
    }

    pub fn untyped(text: impl Into<String>) -> Self {
        Expression::Untyped(text.into())
    }

    pub fn vector2(x: f64, y: f64) -> Self {
        Expression::Vector2(
            Box::new(Expression::Number(x)),
            Box::new(Expression::Number(y)),
        )
    }

    pub fn sum(a: Expression, b: Expression) -> Self {
        Expression::Sum(Box::new(a), Box::new(b))
    }

    pub fn subtract(a: Expression, b: Expression) -> Self {
        Expression::Subtract(Box::new(a), Box::new(b))
    }

    pub fn multiply(a: Expression, b: Expression) -> Self {
        Expression::Multiply(Box::new(a), Box::new(b))
    }

    pub fn squared(value: Expression) -> Self {
        Expression::Squared(Box::new(value))
    }

    pub fn cubed(value: Expression) -> Self {
        Expression::Cubed(Box::new(value))
    }

    pub fn less_than(a: Expression, b: Expression) -> Self {
        Expression::LessThan(Box::new(a), Box::new(b))
    }

    pub fn ternary(condition: Expression, true_value: Expression, false_value: Expression) -> Self {
        Expression::Ternary {
            condition: Box::new(condition),
            true_value: Box::new(true_value),
            false_value: Box::new(false_value),
        }
    }

    /// Left-nested sum of all terms. An empty list is zero.
    pub fn sum_all(terms: impl IntoIterator<Item = Expression>) -> Self {
        terms
            .into_iter()
            .reduce(Expression::sum)
            .unwrap_or(Expression::Number(0.0))
    }

    /// Left-nested product of all factors. An empty list is one.
    pub fn multiply_all(factors: impl IntoIterator<Item = Expression>) -> Self {
        factors
            .into_iter()
            .reduce(Expression::multiply)
            .unwrap_or(Expression::Number(1.0))
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Expression::Number(v) => Some(*v),
            _ => None,
        }
    }

    fn is_zero(&self) -> bool {
        match self {
            Expression::Number(v) => *v == 0.0,
            Expression::Vector2(x, y) => x.is_zero() && y.is_zero(),
            _ => false,
        }
    }

    fn is_one(&self) -> bool {
        match self {
            Expression::Number(v) => *v == 1.0,
            Expression::Vector2(x, y) => x.is_one() && y.is_one(),
            _ => false,
        }
    }

    /// True if the text form can be parsed unambiguously without parentheses.
    fn is_atomic(&self) -> bool {
        match self {
            Expression::Number(v) => *v >= 0.0,
            Expression::Name(_)
            | Expression::Vector2(..)
            | Expression::Squared(_)
            | Expression::Cubed(_) => true,
            _ => false,
        }
    }

    /// Returns the expression with constants folded and identities removed.
    ///
    /// Simplification rebuilds the tree from simplified children, so
    /// `e.simplified().simplified() == e.simplified()`.
    pub fn simplified(&self) -> Expression {
        match self {
            Expression::Number(_) | Expression::Name(_) | Expression::Untyped(_) => self.clone(),
            Expression::Vector2(x, y) => Expression::Vector2(
                Box::new(x.simplified()),
                Box::new(y.simplified()),
            ),
            Expression::Sum(a, b) => {
                let (a, b) = (a.simplified(), b.simplified());
                if a.is_zero() {
                    b
                } else if b.is_zero() {
                    a
                } else if let Some((x, y)) = a.as_number().zip(b.as_number()) {
                    Expression::Number(x + y)
                } else {
                    Expression::sum(a, b)
                }
            }
            Expression::Subtract(a, b) => {
                let (a, b) = (a.simplified(), b.simplified());
                if b.is_zero() {
                    a
                } else if let Some((x, y)) = a.as_number().zip(b.as_number()) {
                    Expression::Number(x - y)
                } else {
                    Expression::subtract(a, b)
                }
            }
            Expression::Multiply(a, b) => {
                let (a, b) = (a.simplified(), b.simplified());
                if a.is_zero() || b.is_one() {
                    a
                } else if b.is_zero() || a.is_one() {
                    b
                } else if let Some((x, y)) = a.as_number().zip(b.as_number()) {
                    Expression::Number(x * y)
                } else {
                    Expression::multiply(a, b)
                }
            }
            Expression::Squared(v) => match v.simplified() {
                Expression::Number(n) => Expression::Number(n * n),
                other => Expression::squared(other),
            },
            Expression::Cubed(v) => match v.simplified() {
                Expression::Number(n) => Expression::Number(n * n * n),
                other => Expression::cubed(other),
            },
            Expression::LessThan(a, b) => Expression::less_than(a.simplified(), b.simplified()),
            Expression::Ternary {
                condition,
                true_value,
                false_value,
            } => Expression::ternary(
                condition.simplified(),
                true_value.simplified(),
                false_value.simplified(),
            ),
        }
    }

    /// Evaluates a scalar expression, resolving names through `lookup`.
    /// Returns `None` for vectors, untyped text and unresolved names.
    pub fn evaluate(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Option<f64> {
        Some(match self {
            Expression::Number(v) => *v,
            Expression::Name(name) => lookup(name)?,
            Expression::Vector2(..) | Expression::Untyped(_) => return None,
            Expression::Sum(a, b) => a.evaluate(lookup)? + b.evaluate(lookup)?,
            Expression::Subtract(a, b) => a.evaluate(lookup)? - b.evaluate(lookup)?,
            Expression::Multiply(a, b) => a.evaluate(lookup)? * b.evaluate(lookup)?,
            Expression::Squared(v) => v.evaluate(lookup)?.powi(2),
            Expression::Cubed(v) => v.evaluate(lookup)?.powi(3),
            Expression::LessThan(a, b) => {
                if a.evaluate(lookup)? < b.evaluate(lookup)? {
                    1.0
                } else {
                    0.0
                }
            }
            Expression::Ternary {
                condition,
                true_value,
                false_value,
            } => {
                if condition.evaluate(lookup)? != 0.0 {
                    true_value.evaluate(lookup)?
                } else {
                    false_value.evaluate(lookup)?
                }
            }
        })
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::Number(value)
    }
}

/// Formats a number the way the composition expression parser reads it:
/// single precision, no exponent, no trailing zeros.
pub fn format_number(value: f64) -> String {
    format!("{}", value as f32)
}

struct Parenthesized<'a>(&'a Expression);

impl fmt::Display for Parenthesized<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_atomic() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "({})", self.0)
        }
    }
}

fn paren(e: &Expression) -> Parenthesized<'_> {
    Parenthesized(e)
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(v) => f.write_str(&format_number(*v)),
            Expression::Name(name) => f.write_str(name),
            Expression::Untyped(text) => f.write_str(text),
            Expression::Vector2(x, y) => write!(f, "Vector2({},{})", paren(x), paren(y)),
            Expression::Sum(a, b) => {
                let (a, b) = (a.simplified(), b.simplified());
                match &a {
                    Expression::Sum(..) => write!(f, "{a}")?,
                    _ => write!(f, "{}", paren(&a))?,
                }
                f.write_str(" + ")?;
                match &b {
                    Expression::Sum(..) => write!(f, "{b}"),
                    _ => write!(f, "{}", paren(&b)),
                }
            }
            Expression::Subtract(a, b) => {
                let (a, b) = (a.simplified(), b.simplified());
                write!(f, "{} - {}", paren(&a), paren(&b))
            }
            Expression::Multiply(a, b) => {
                let (a, b) = (a.simplified(), b.simplified());
                match &a {
                    Expression::Multiply(..) => write!(f, "{a}")?,
                    _ => write!(f, "{}", paren(&a))?,
                }
                f.write_str(" * ")?;
                match &b {
                    Expression::Multiply(..) => write!(f, "{b}"),
                    _ => write!(f, "{}", paren(&b)),
                }
            }
            Expression::Squared(v) => write!(f, "Square({})", paren(&v.simplified())),
            Expression::Cubed(v) => write!(f, "Pow({}, 3)", v.simplified()),
            Expression::LessThan(a, b) => {
                write!(f, "{} < {}", paren(&a.simplified()), paren(&b.simplified()))
            }
            Expression::Ternary {
                condition,
                true_value,
                false_value,
            } => write!(
                f,
                "{} ? {} : {}",
                paren(condition),
                paren(true_value),
                paren(false_value)
            ),
        }
    }
}
