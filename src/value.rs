//! The typed runtime value the evaluator produces.
//!
//! The original implementation keeps an open, type-erased `Value` (a
//! `ValueBase`/`ValueImpl<T>` pair downcast by `std::type_index`) so host
//! applications can register arbitrary C++ types. This crate closes that
//! set into a single `enum`, per the redesign guidance: the built-in types
//! are all CTL ever produces, and a `match` replaces the dynamic-cast
//! registry.

use std::collections::BTreeMap;
use std::cmp::Ordering;
use std::fmt;

pub type ValueList = Vec<Value>;

/// CTL object keys are always strings (reflected in the AST too — see
/// `ast::Expr::Object`), so the evaluated form is a plain ordered map keyed
/// by `String` rather than by `Value`.
pub type ValueObject = BTreeMap<String, Value>;

/// The type tag used for operator dispatch keys. Equality is by identity
/// of the variant, never by structure of the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeTag {
    Int64,
    Double,
    String,
    Bool,
    List,
    Object,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Int64 => "int64",
            TypeTag::Double => "double",
            TypeTag::String => "string",
            TypeTag::Bool => "bool",
            TypeTag::List => "list",
            TypeTag::Object => "object",
        };
        f.write_str(name)
    }
}

/// A dynamically-typed, value-semantic container. Cloning a `List` or
/// `Object` deep-clones its contents, matching the original's
/// copy-on-clone `Value`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int64(i64),
    Double(f64),
    String(String),
    Bool(bool),
    List(ValueList),
    Object(ValueObject),
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Int64(_) => TypeTag::Int64,
            Value::Double(_) => TypeTag::Double,
            Value::String(_) => TypeTag::String,
            Value::Bool(_) => TypeTag::Bool,
            Value::List(_) => TypeTag::List,
            Value::Object(_) => TypeTag::Object,
        }
    }

    pub fn is<T: ValueView>(&self) -> bool {
        T::view(self).is_some()
    }

    pub fn as_view<T: ValueView>(&self) -> Option<&T::Target> {
        T::view(self)
    }

    pub fn int64(v: i64) -> Value {
        Value::Int64(v)
    }

    pub fn double(v: f64) -> Value {
        Value::Double(v)
    }

    pub fn string(v: impl Into<String>) -> Value {
        Value::String(v.into())
    }

    pub fn bool(v: bool) -> Value {
        Value::Bool(v)
    }

    pub fn list(v: ValueList) -> Value {
        Value::List(v)
    }

    pub fn object(v: ValueObject) -> Value {
        Value::Object(v)
    }

    pub fn swap(&mut self, other: &mut Value) {
        std::mem::swap(self, other);
    }
}

/// Host-facing typed accessor, giving the `is::<T>()` / `as::<T>()` surface
/// described in the spec's "Value types" external interface without
/// resurrecting the original's `dynamic_cast`-based downcasting.
pub trait ValueView {
    type Target;
    fn view(value: &Value) -> Option<&Self::Target>;
}

macro_rules! value_view {
    ($ty:ty, $variant:ident) => {
        impl ValueView for $ty {
            type Target = $ty;
            fn view(value: &Value) -> Option<&$ty> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

value_view!(i64, Int64);
value_view!(f64, Double);
value_view!(String, String);
value_view!(bool, Bool);
value_view!(ValueList, List);
value_view!(ValueObject, Object);

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int64(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(fields) => {
                f.write_str("{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// A total order over values, used when values (rather than just their
/// string keys) need to be compared or sorted. Doubles are ordered with
/// `f64::total_cmp` rather than `PartialOrd` so that `NaN` has a stable
/// position instead of comparing unordered with everything; this mirrors
/// the original's `ValueLess` comparator being a standalone function
/// rather than an operator on `Value` itself.
pub fn total_cmp(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Bool(_) => 0,
            Value::Int64(_) => 1,
            Value::Double(_) => 2,
            Value::String(_) => 3,
            Value::List(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int64(x), Value::Int64(y)) => x.cmp(y),
        (Value::Double(x), Value::Double(y)) => x.total_cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::List(x), Value::List(y)) => {
            x.iter().zip(y.iter()).map(|(xv, yv)| total_cmp(xv, yv)).find(|o| *o != Ordering::Equal)
                .unwrap_or_else(|| x.len().cmp(&y.len()))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.iter().zip(y.iter())
                .map(|((xk, xv), (yk, yv))| xk.cmp(yk).then_with(|| total_cmp(xv, yv)))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or_else(|| x.len().cmp(&y.len()))
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tag_is_by_identity_not_structure() {
        assert_eq!(Value::int64(0).type_tag(), Value::int64(1).type_tag());
        assert_ne!(Value::int64(0).type_tag(), Value::double(0.0).type_tag());
    }

    #[test]
    fn view_accessors_round_trip() {
        let v = Value::string("hi");
        assert!(v.is::<String>());
        assert_eq!(v.as_view::<String>(), Some(&"hi".to_string()));
        assert_eq!(v.as_view::<i64>(), None);
    }

    #[test]
    fn total_cmp_orders_nan_consistently() {
        let nan = Value::double(f64::NAN);
        let one = Value::double(1.0);
        assert_eq!(total_cmp(&nan, &nan), Ordering::Equal);
        assert_ne!(total_cmp(&nan, &one), Ordering::Equal);
    }

    #[test]
    fn objects_deep_clone() {
        let mut obj = ValueObject::new();
        obj.insert("a".to_string(), Value::int64(1));
        let original = Value::object(obj);
        let mut cloned = original.clone();
        if let Value::Object(map) = &mut cloned {
            map.insert("b".to_string(), Value::int64(2));
        }
        assert_eq!(original.as_view::<ValueObject>().unwrap().len(), 1);
    }
}
