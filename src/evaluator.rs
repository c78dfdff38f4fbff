//! Tree-walking evaluator: reduces a parsed [`Expr`] to a [`Value`] against
//! an [`Engine`]'s operator tables and prelude.
//!
//! Grounded on `original_source/src/evaluate.cpp`, including the corrected
//! lhs/rhs evaluation order (the original's draft evaluates `expr->lhs`
//! twice for a binary operator's rhs; this evaluates each side exactly
//! once, per the Open Question resolution).
//!
//! The original's context stack holds raw pointers into the prelude and
//! into the object literal currently under construction, relying on C++
//! pointer aliasing and careful scope-exit ordering to stay sound. Rather
//! than chase that with borrows here, each frame is an owned `ValueObject`
//! clone — `BTreeMap<String, Value>` clones are cheap at config-file scale,
//! and it sidesteps a self-referential-borrow problem (the object under
//! construction needs to be both mutated and visible to lookups within the
//! same `evaluate` call) that has no clean borrowed solution in safe Rust.

use crate::ast::Expr;
use crate::error::{bail_eval_error, EvaluateError};
use crate::operator::Operator;
use crate::source_tracker::Tracker;
use crate::value::{TypeTag, Value, ValueObject};
use rustc_hash::FxHashMap;

pub type BinaryOp = Box<dyn Fn(&Value, &Value) -> Result<Value, EvaluateError> + Send + Sync>;
pub type UnaryOp = Box<dyn Fn(&Value) -> Result<Value, EvaluateError> + Send + Sync>;
pub type NamedFn = Box<dyn Fn(&[Value]) -> Result<Value, EvaluateError> + Send + Sync>;

/// Owns the operator dispatch tables and the prelude, installed once at
/// construction and read-only thereafter — safe to share across threads as
/// long as the `Tracker` each caller evaluates against is itself shared
/// safely (see spec's concurrency model).
#[derive(Default)]
pub struct Engine {
    binary_ops: FxHashMap<(Operator, TypeTag, TypeTag), BinaryOp>,
    unary_ops: FxHashMap<(Operator, TypeTag), UnaryOp>,
    named_functions: FxHashMap<String, NamedFn>,
    prelude: Vec<ValueObject>,
}

impl Engine {
    pub fn new() -> Self {
        Engine::default()
    }

    pub fn register_binary_op(
        &mut self,
        op: Operator,
        lhs: TypeTag,
        rhs: TypeTag,
        f: impl Fn(&Value, &Value) -> Result<Value, EvaluateError> + Send + Sync + 'static,
    ) {
        self.binary_ops.insert((op, lhs, rhs), Box::new(f));
    }

    pub fn register_unary_op(
        &mut self,
        op: Operator,
        ty: TypeTag,
        f: impl Fn(&Value) -> Result<Value, EvaluateError> + Send + Sync + 'static,
    ) {
        self.unary_ops.insert((op, ty), Box::new(f));
    }

    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Result<Value, EvaluateError> + Send + Sync + 'static,
    ) {
        self.named_functions.insert(name.into(), Box::new(f));
    }

    pub fn call_function(&self, name: &str, args: &[Value]) -> Option<Result<Value, EvaluateError>> {
        self.named_functions.get(name).map(|f| f(args))
    }

    /// Appends an object frame to the prelude, outermost-last (pushed as
    /// the outermost frame of every context stack).
    pub fn push_prelude_frame(&mut self, frame: ValueObject) {
        self.prelude.push(frame);
    }

    /// Evaluates a single expression tree, seeding a fresh context stack
    /// from the prelude.
    pub fn evaluate(&self, tracker: &Tracker, expr: &Expr) -> Result<Value, EvaluateError> {
        let mut stack: Vec<ValueObject> = self.prelude.clone();
        self.eval(tracker, &mut stack, expr)
    }

    fn resolve(stack: &[ValueObject], name: &str) -> Option<Value> {
        stack.iter().rev().find_map(|frame| frame.get(name).cloned())
    }

    fn eval(&self, tracker: &Tracker, stack: &mut Vec<ValueObject>, expr: &Expr) -> Result<Value, EvaluateError> {
        match expr {
            Expr::Identifier { name } => {
                let text = tracker.text(*name);
                Self::resolve(stack, text)
                    .ok_or_else(|| EvaluateError::new(*name, format!("could not resolve identifier: {text}")))
            }

            Expr::IntLiteral { value, .. } => Ok(Value::Int64(*value)),
            Expr::DoubleLiteral { value, .. } => Ok(Value::Double(*value)),
            Expr::StringLiteral { span } => match String::from_utf8(tracker.bytes(*span).to_vec()) {
                Ok(s) => Ok(Value::String(s)),
                Err(_) => bail_eval_error!(*span, "string literal is not valid UTF-8 once its escapes are decoded"),
            },

            Expr::Operator { op, op_span, lhs: None, rhs, .. } => {
                let operand = self.eval(tracker, stack, rhs)?;
                let tag = operand.type_tag();
                let f = self
                    .unary_ops
                    .get(&(*op, tag))
                    .ok_or_else(|| EvaluateError::new(*op_span, format!("operator `{}' not defined for {tag}", op.as_str())))?;
                f(&operand)
            }

            Expr::Operator { op, op_span, lhs: Some(lhs), rhs, .. } => {
                let lhs_val = self.eval(tracker, stack, lhs)?;
                let rhs_val = self.eval(tracker, stack, rhs)?;
                let (lhs_tag, rhs_tag) = (lhs_val.type_tag(), rhs_val.type_tag());
                let f = self.binary_ops.get(&(*op, lhs_tag, rhs_tag)).ok_or_else(|| {
                    EvaluateError::new(
                        *op_span,
                        format!("operator `{}' not defined for ({lhs_tag}, {rhs_tag})", op.as_str()),
                    )
                })?;
                f(&lhs_val, &rhs_val)
            }

            Expr::List { items, .. } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(tracker, stack, item)?);
                }
                Ok(Value::List(values))
            }

            Expr::Object { keys, values, .. } => {
                let mut decoded_keys = Vec::with_capacity(keys.len());
                for key in keys {
                    match self.eval(tracker, stack, key)? {
                        Value::String(s) => decoded_keys.push(s),
                        other => bail_eval_error!(key.span(), "key is not a string: {other}"),
                    }
                }

                stack.push(ValueObject::new());
                let result = self.fill_object_frame(tracker, stack, &decoded_keys, values);
                let frame = stack.pop().expect("just pushed this frame above");
                result?;
                Ok(Value::Object(frame))
            }
        }
    }

    /// Evaluates each value expression in order, inserting into the frame
    /// just pushed onto `stack` so later values can see earlier keys.
    /// Split out so the frame is reliably popped by the caller whether
    /// this returns `Ok` or `Err`.
    fn fill_object_frame(
        &self,
        tracker: &Tracker,
        stack: &mut Vec<ValueObject>,
        keys: &[String],
        values: &[Expr],
    ) -> Result<(), EvaluateError> {
        for (key, value_expr) in keys.iter().zip(values.iter()) {
            let value = self.eval(tracker, stack, value_expr)?;
            let frame = stack.last_mut().expect("fill_object_frame called with a pushed frame");
            if frame.insert(key.clone(), value).is_some() {
                bail_eval_error!(value_expr.span(), "duplicate key: {key}");
            }
        }
        Ok(())
    }
}
