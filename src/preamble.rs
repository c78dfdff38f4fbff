//! Default preamble: the built-in binary operator implementations
//! registered into a freshly constructed [`Engine`].
//!
//! Grounded on spec.md §4.5's preamble table; the original's actual
//! `imbueDefaultPrelude`-equivalent source file wasn't present in the
//! retrieved pack, so the table here is built straight from that
//! description rather than ported line-for-line. `**` and `%` on doubles
//! are deliberate omissions, per spec.

use crate::error::EvaluateError;
use crate::evaluator::Engine;
use crate::operator::Operator;
use crate::source_tracker::Span;
use crate::value::{TypeTag, Value};

/// Registers every default binary operator described in spec.md §4.5 into
/// `engine`. Call once per freshly constructed `Engine`; an `Engine` with
/// no preamble installed is perfectly legal (useful for hosts that want a
/// fully custom operator set) but won't evaluate anything spec.md's §8
/// end-to-end scenarios rely on.
pub fn install(engine: &mut Engine) {
    install_int64_int64(engine);
    install_double_double(engine);
    install_mixed_numeric(engine);
    install_string_string(engine);
}

fn division_by_zero() -> EvaluateError {
    EvaluateError::new(Span::default(), "division by zero")
}

fn shift_out_of_range() -> EvaluateError {
    EvaluateError::new(Span::default(), "shift amount out of range")
}

fn integer_overflow() -> EvaluateError {
    EvaluateError::new(Span::default(), "integer overflow")
}

macro_rules! bin {
    ($engine:expr, $op:expr, $lhs_tag:expr, $rhs_tag:expr, |$a:ident, $b:ident| $body:expr) => {
        $engine.register_binary_op($op, $lhs_tag, $rhs_tag, |$a: &Value, $b: &Value| $body)
    };
}

fn install_int64_int64(engine: &mut Engine) {
    let t = TypeTag::Int64;

    macro_rules! ii {
        ($a:ident, $b:ident as i64) => {
            (
                match $a {
                    Value::Int64(v) => *v,
                    _ => unreachable!("dispatched as int64"),
                },
                match $b {
                    Value::Int64(v) => *v,
                    _ => unreachable!("dispatched as int64"),
                },
            )
        };
    }

    bin!(engine, Operator::Equal, t, t, |a, b| { let (x, y) = ii!(a, b as i64); Ok(Value::Bool(x == y)) });
    bin!(engine, Operator::Inequal, t, t, |a, b| { let (x, y) = ii!(a, b as i64); Ok(Value::Bool(x != y)) });
    bin!(engine, Operator::Greater, t, t, |a, b| { let (x, y) = ii!(a, b as i64); Ok(Value::Bool(x > y)) });
    bin!(engine, Operator::Less, t, t, |a, b| { let (x, y) = ii!(a, b as i64); Ok(Value::Bool(x < y)) });
    bin!(engine, Operator::GreaterOrEqual, t, t, |a, b| { let (x, y) = ii!(a, b as i64); Ok(Value::Bool(x >= y)) });
    bin!(engine, Operator::LessOrEqual, t, t, |a, b| { let (x, y) = ii!(a, b as i64); Ok(Value::Bool(x <= y)) });

    bin!(engine, Operator::Plus, t, t, |a, b| {
        let (x, y) = ii!(a, b as i64);
        x.checked_add(y).map(Value::Int64).ok_or_else(integer_overflow)
    });
    bin!(engine, Operator::Minus, t, t, |a, b| {
        let (x, y) = ii!(a, b as i64);
        x.checked_sub(y).map(Value::Int64).ok_or_else(integer_overflow)
    });
    bin!(engine, Operator::Times, t, t, |a, b| {
        let (x, y) = ii!(a, b as i64);
        x.checked_mul(y).map(Value::Int64).ok_or_else(integer_overflow)
    });
    bin!(engine, Operator::Divide, t, t, |a, b| {
        let (x, y) = ii!(a, b as i64);
        x.checked_div(y).map(Value::Int64).ok_or_else(division_by_zero)
    });
    bin!(engine, Operator::Modulo, t, t, |a, b| {
        let (x, y) = ii!(a, b as i64);
        x.checked_rem(y).map(Value::Int64).ok_or_else(division_by_zero)
    });

    bin!(engine, Operator::LeftShift, t, t, |a, b| {
        let (x, y) = ii!(a, b as i64);
        u32::try_from(y).ok().and_then(|y| x.checked_shl(y)).map(Value::Int64).ok_or_else(shift_out_of_range)
    });
    bin!(engine, Operator::RightShift, t, t, |a, b| {
        let (x, y) = ii!(a, b as i64);
        u32::try_from(y).ok().and_then(|y| x.checked_shr(y)).map(Value::Int64).ok_or_else(shift_out_of_range)
    });
    bin!(engine, Operator::BitAnd, t, t, |a, b| { let (x, y) = ii!(a, b as i64); Ok(Value::Int64(x & y)) });
    bin!(engine, Operator::BitOr, t, t, |a, b| { let (x, y) = ii!(a, b as i64); Ok(Value::Int64(x | y)) });
    bin!(engine, Operator::BitXor, t, t, |a, b| { let (x, y) = ii!(a, b as i64); Ok(Value::Int64(x ^ y)) });

    bin!(engine, Operator::LogicalAnd, t, t, |a, b| { let (x, y) = ii!(a, b as i64); Ok(Value::Bool(x != 0 && y != 0)) });
    bin!(engine, Operator::LogicalOr, t, t, |a, b| { let (x, y) = ii!(a, b as i64); Ok(Value::Bool(x != 0 || y != 0)) });
}

fn install_double_double(engine: &mut Engine) {
    let t = TypeTag::Double;

    macro_rules! dd {
        ($a:ident, $b:ident as f64) => {
            (
                match $a {
                    Value::Double(v) => *v,
                    _ => unreachable!("dispatched as double"),
                },
                match $b {
                    Value::Double(v) => *v,
                    _ => unreachable!("dispatched as double"),
                },
            )
        };
    }

    bin!(engine, Operator::Equal, t, t, |a, b| { let (x, y) = dd!(a, b as f64); Ok(Value::Bool(x == y)) });
    bin!(engine, Operator::Inequal, t, t, |a, b| { let (x, y) = dd!(a, b as f64); Ok(Value::Bool(x != y)) });
    bin!(engine, Operator::Greater, t, t, |a, b| { let (x, y) = dd!(a, b as f64); Ok(Value::Bool(x > y)) });
    bin!(engine, Operator::Less, t, t, |a, b| { let (x, y) = dd!(a, b as f64); Ok(Value::Bool(x < y)) });
    bin!(engine, Operator::GreaterOrEqual, t, t, |a, b| { let (x, y) = dd!(a, b as f64); Ok(Value::Bool(x >= y)) });
    bin!(engine, Operator::LessOrEqual, t, t, |a, b| { let (x, y) = dd!(a, b as f64); Ok(Value::Bool(x <= y)) });

    bin!(engine, Operator::Plus, t, t, |a, b| { let (x, y) = dd!(a, b as f64); Ok(Value::Double(x + y)) });
    bin!(engine, Operator::Minus, t, t, |a, b| { let (x, y) = dd!(a, b as f64); Ok(Value::Double(x - y)) });
    bin!(engine, Operator::Times, t, t, |a, b| { let (x, y) = dd!(a, b as f64); Ok(Value::Double(x * y)) });
    bin!(engine, Operator::Divide, t, t, |a, b| { let (x, y) = dd!(a, b as f64); Ok(Value::Double(x / y)) });

    bin!(engine, Operator::LogicalAnd, t, t, |a, b| { let (x, y) = dd!(a, b as f64); Ok(Value::Bool(x != 0.0 && y != 0.0)) });
    bin!(engine, Operator::LogicalOr, t, t, |a, b| { let (x, y) = dd!(a, b as f64); Ok(Value::Bool(x != 0.0 || y != 0.0)) });
}

fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Int64(v) => *v as f64,
        Value::Double(v) => *v,
        _ => unreachable!("dispatched as a numeric type"),
    }
}

/// `(double, int64)` and `(int64, double)`: comparisons, `+ - * /`, and
/// logical and/or, with the integer side widened to `f64` for the
/// comparison/arithmetic. Per spec.md §4.5 this set deliberately excludes
/// shifts, bitwise ops, and `%`.
fn install_mixed_numeric(engine: &mut Engine) {
    for (lhs_tag, rhs_tag) in [(TypeTag::Double, TypeTag::Int64), (TypeTag::Int64, TypeTag::Double)] {
        bin!(engine, Operator::Equal, lhs_tag, rhs_tag, |a, b| Ok(Value::Bool(as_f64(a) == as_f64(b))));
        bin!(engine, Operator::Inequal, lhs_tag, rhs_tag, |a, b| Ok(Value::Bool(as_f64(a) != as_f64(b))));
        bin!(engine, Operator::Greater, lhs_tag, rhs_tag, |a, b| Ok(Value::Bool(as_f64(a) > as_f64(b))));
        bin!(engine, Operator::Less, lhs_tag, rhs_tag, |a, b| Ok(Value::Bool(as_f64(a) < as_f64(b))));
        bin!(engine, Operator::GreaterOrEqual, lhs_tag, rhs_tag, |a, b| Ok(Value::Bool(as_f64(a) >= as_f64(b))));
        bin!(engine, Operator::LessOrEqual, lhs_tag, rhs_tag, |a, b| Ok(Value::Bool(as_f64(a) <= as_f64(b))));

        bin!(engine, Operator::Plus, lhs_tag, rhs_tag, |a, b| Ok(Value::Double(as_f64(a) + as_f64(b))));
        bin!(engine, Operator::Minus, lhs_tag, rhs_tag, |a, b| Ok(Value::Double(as_f64(a) - as_f64(b))));
        bin!(engine, Operator::Times, lhs_tag, rhs_tag, |a, b| Ok(Value::Double(as_f64(a) * as_f64(b))));
        bin!(engine, Operator::Divide, lhs_tag, rhs_tag, |a, b| Ok(Value::Double(as_f64(a) / as_f64(b))));

        bin!(engine, Operator::LogicalAnd, lhs_tag, rhs_tag, |a, b| {
            Ok(Value::Bool(as_f64(a) != 0.0 && as_f64(b) != 0.0))
        });
        bin!(engine, Operator::LogicalOr, lhs_tag, rhs_tag, |a, b| {
            Ok(Value::Bool(as_f64(a) != 0.0 || as_f64(b) != 0.0))
        });
    }
}

fn install_string_string(engine: &mut Engine) {
    let t = TypeTag::String;

    macro_rules! ss {
        ($a:ident, $b:ident as &str) => {
            (
                match $a {
                    Value::String(v) => v.as_str(),
                    _ => unreachable!("dispatched as string"),
                },
                match $b {
                    Value::String(v) => v.as_str(),
                    _ => unreachable!("dispatched as string"),
                },
            )
        };
    }

    bin!(engine, Operator::Equal, t, t, |a, b| { let (x, y) = ss!(a, b as &str); Ok(Value::Bool(x == y)) });
    bin!(engine, Operator::Inequal, t, t, |a, b| { let (x, y) = ss!(a, b as &str); Ok(Value::Bool(x != y)) });
    bin!(engine, Operator::Greater, t, t, |a, b| { let (x, y) = ss!(a, b as &str); Ok(Value::Bool(x > y)) });
    bin!(engine, Operator::Less, t, t, |a, b| { let (x, y) = ss!(a, b as &str); Ok(Value::Bool(x < y)) });
    bin!(engine, Operator::GreaterOrEqual, t, t, |a, b| { let (x, y) = ss!(a, b as &str); Ok(Value::Bool(x >= y)) });
    bin!(engine, Operator::LessOrEqual, t, t, |a, b| { let (x, y) = ss!(a, b as &str); Ok(Value::Bool(x <= y)) });

    bin!(engine, Operator::Plus, t, t, |a, b| {
        let (x, y) = ss!(a, b as &str);
        Ok(Value::String(format!("{x}{y}")))
    });
}
