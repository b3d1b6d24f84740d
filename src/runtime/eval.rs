//! This module computes attribute and argument values from expressions.
//!
//! ## Core Responsibility: Expr → Scalar
//!
//! Evaluation is total. Every expression tree yields a [`Scalar`]; when a value cannot be
//! computed the result is [`Scalar::Unknown`] and a typed diagnostic is recorded in the
//! [`Diagnostics`] sink. Whether that diagnostic is fatal is decided by the caller's policy,
//! never here.
//!
//! ## Operator Semantics
//!
//! | op  | number, number | string involved                     | otherwise |
//! |-----|----------------|-------------------------------------|-----------|
//! | `+` | sum            | concatenation of natural forms      | unknown   |
//! | `*` | product        | string × number repeats the string  | unknown   |
//! | `-` `/` `%` | arithmetic | unknown                           | unknown   |
//! | `^` | bitwise xor of the integer parts | unknown           | unknown   |
//!
//! `Unknown` is absorbing: once an operand is unknown the result is unknown, and no second
//! diagnostic is recorded for it.
//!
//! A bare variable reference does not read the environment; it evaluates to
//! [`VARIABLE_PLACEHOLDER`].

use tracing::trace;

use crate::ast::{BinaryOp, EnumEntryRef, Expr, Metamodel};
use crate::diagnostics::Diagnostics;
use crate::err_msg;
use crate::runtime::environment::Environment;
use crate::runtime::value::Scalar;
use crate::InstantiaError;

/// What a bare variable reference evaluates to.
pub const VARIABLE_PLACEHOLDER: &str = "<variable>";

/// Upper bound on the byte length of a string produced by `*` repetition.
pub const MAX_REPEAT_LEN: usize = 1 << 24;

pub struct Evaluator<'a> {
    model: &'a Metamodel,
    diagnostics: &'a mut Diagnostics,
    max_depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(model: &'a Metamodel, diagnostics: &'a mut Diagnostics, max_depth: usize) -> Self {
        Self {
            model,
            diagnostics,
            max_depth,
        }
    }

    /// Evaluates `expr` in `env`. Never fails.
    pub fn evaluate(&mut self, expr: &Expr, env: &Environment) -> Scalar {
        self.evaluate_at(expr, env, 0)
    }

    fn evaluate_at(&mut self, expr: &Expr, env: &Environment, depth: usize) -> Scalar {
        if depth > self.max_depth {
            return self.degrade(err_msg!(
                RecursionLimit,
                "expression nested deeper than {} levels",
                self.max_depth
            ));
        }

        match expr {
            Expr::Bool { value } => Scalar::Bool(*value),
            Expr::Number { value } => Scalar::Number(*value),
            Expr::String { value } => Scalar::String(value.clone()),
            Expr::Variable { name } => {
                trace!(variable = %name, bound = env.contains(name), "variable reference evaluates to placeholder");
                Scalar::String(VARIABLE_PLACEHOLDER.to_string())
            }
            Expr::EnumValue { entry } => self.evaluate_enum_value(entry, env, depth),
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.evaluate_at(lhs, env, depth + 1);
                let rhs = self.evaluate_at(rhs, env, depth + 1);
                match apply_binary(*op, lhs, rhs) {
                    Ok(value) => value,
                    Err(err) => self.degrade(err.with_help(format!("in {}", expr.pretty()))),
                }
            }
            Expr::Unsupported => {
                self.degrade(err_msg!(UnsupportedExpression, "unrecognized expression shape"))
            }
        }
    }

    fn evaluate_enum_value(&mut self, entry: &EnumEntryRef, env: &Environment, depth: usize) -> Scalar {
        let model = self.model;
        let Some((package, decl, entry_decl)) = model.enum_entry(entry) else {
            return self.degrade(err_msg!(UnresolvedReference, "enum entry '{}' does not exist", entry));
        };
        match &entry_decl.value {
            Some(default) => self.evaluate_at(default, env, depth + 1),
            None => Scalar::String(format!("{}.{}.{}", package.name, decl.name, entry_decl.name)),
        }
    }

    fn degrade(&mut self, err: InstantiaError) -> Scalar {
        self.diagnostics.push(err);
        Scalar::Unknown
    }
}

// ============================================================================
// OPERATORS
// ============================================================================

/// Applies a binary operator to two evaluated operands.
///
/// # Errors
/// `UnsupportedExpression` for operand combinations the operator does not define, and
/// `DivisionByZero` for `/` or `%` by zero. An unknown operand is not an error; it yields
/// `Ok(Scalar::Unknown)`.
pub fn apply_binary(op: BinaryOp, lhs: Scalar, rhs: Scalar) -> Result<Scalar, InstantiaError> {
    if lhs.is_unknown() || rhs.is_unknown() {
        return Ok(Scalar::Unknown);
    }

    match (op, lhs, rhs) {
        (BinaryOp::Unsupported, _, _) => Err(err_msg!(UnsupportedExpression, "unrecognized binary operator")),

        (BinaryOp::Add, Scalar::Number(a), Scalar::Number(b)) => Ok(Scalar::Number(a + b)),
        (BinaryOp::Add, lhs @ Scalar::String(_), rhs) | (BinaryOp::Add, lhs, rhs @ Scalar::String(_)) => {
            Ok(Scalar::String(format!("{}{}", lhs, rhs)))
        }

        (BinaryOp::Mul, Scalar::Number(a), Scalar::Number(b)) => Ok(Scalar::Number(a * b)),
        (BinaryOp::Mul, Scalar::String(s), Scalar::Number(n))
        | (BinaryOp::Mul, Scalar::Number(n), Scalar::String(s)) => repeat(&s, n),

        (BinaryOp::Sub, Scalar::Number(a), Scalar::Number(b)) => Ok(Scalar::Number(a - b)),
        (BinaryOp::Div, Scalar::Number(a), Scalar::Number(b)) => {
            let b = non_zero(b, a, op)?;
            Ok(Scalar::Number(a / b))
        }
        (BinaryOp::Rem, Scalar::Number(a), Scalar::Number(b)) => {
            let b = non_zero(b, a, op)?;
            Ok(Scalar::Number(a % b))
        }
        (BinaryOp::Xor, Scalar::Number(a), Scalar::Number(b)) => {
            Ok(Scalar::Number(((a.trunc() as i64) ^ (b.trunc() as i64)) as f64))
        }

        (op, lhs, rhs) => Err(err_msg!(
            UnsupportedExpression,
            "operator '{}' is not defined for {} and {}",
            op,
            lhs.type_name(),
            rhs.type_name()
        )),
    }
}

fn non_zero(divisor: f64, dividend: f64, op: BinaryOp) -> Result<f64, InstantiaError> {
    if divisor == 0.0 {
        return Err(err_msg!(DivisionByZero, "{} {} 0", dividend, op));
    }
    Ok(divisor)
}

// Fractional counts truncate; negative and NaN counts repeat zero times.
fn repeat(text: &str, count: f64) -> Result<Scalar, InstantiaError> {
    let count = if count.is_nan() || count <= 0.0 {
        0
    } else {
        count.trunc().min(usize::MAX as f64) as usize
    };
    match text.len().checked_mul(count) {
        Some(len) if len <= MAX_REPEAT_LEN => Ok(Scalar::String(text.repeat(count))),
        _ => Err(err_msg!(
            UnsupportedExpression,
            "repeating a {}-byte string {} times exceeds {} bytes",
            text.len(),
            count,
            MAX_REPEAT_LEN
        )),
    }
}
