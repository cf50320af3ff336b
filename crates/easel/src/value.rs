// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bound argument values and their canonical rendering.
//!
//! Query arguments are converted into a small closed set of shapes ([`Value`]) through the
//! [`ToValue`] trait. The [`Display`](fmt::Display) rendering of a `Value` is what goes
//! into a query identifier, so it must be deterministic: equal inputs always render to the
//! same string, whatever the iteration order of the maps involved.
//!
//! Distinct inputs must also render differently. Text is quoted and escaped, so a string
//! never reads as a number, a separator or [`ABSENT`], and floats always carry a decimal
//! point or exponent.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::{self, Write as _};
use std::hash::BuildHasher;
use std::rc::Rc;
use std::sync::Arc;

/// Rendering of an absent value.
pub const ABSENT: &str = "<nil>";

/// A bound query argument.
///
/// # Examples
///
/// ```
/// use easel::{ToValue, Value};
/// use std::collections::HashMap;
///
/// let args = vec![
///     1_i64.to_value(),
///     None::<&str>.to_value(),
///     HashMap::from([("b", 2_i32), ("a", 1)]).to_value(),
/// ];
/// assert_eq!(Value::Seq(args).to_string(), r#"[1, <nil>, {"a": 1, "b": 2}]"#);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// No value, such as `None` or SQL `NULL`.
    Absent,
    /// A value reached through an indirection; renders as the value itself.
    Ref(Box<Value>),
    /// Key/value pairs; rendered sorted by key.
    Map(Vec<(Value, Value)>),
    /// An ordered sequence.
    Seq(Vec<Value>),
    /// A leaf value.
    Scalar(Scalar),
}

/// A leaf argument value.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A floating point number; renders with a decimal point or exponent.
    Float(f64),
    /// Text; renders quoted and escaped.
    Str(String),
    /// A value outside the closed set, kept as its display form; renders as `@` followed
    /// by the quoted form.
    Other(String),
}

impl Value {
    /// Wraps `value` as a reference to another value.
    #[must_use]
    pub fn reference(value: Self) -> Self {
        Self::Ref(Box::new(value))
    }

    /// Captures any displayable value by its display form.
    ///
    /// Use this for argument types that have no [`ToValue`] implementation, such as
    /// timestamps or identifiers from other crates.
    #[must_use]
    pub fn display(value: &impl fmt::Display) -> Self {
        Self::Scalar(Scalar::Other(value.to_string()))
    }

    /// Returns `true` for [`Value::Absent`].
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str(ABSENT),
            Self::Ref(inner) => inner.fmt(f),
            Self::Map(entries) => {
                let mut rendered: Vec<(String, String)> = entries
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect();
                rendered.sort_unstable();

                f.write_char('{')?;
                for (i, (key, value)) in rendered.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_char('}')
            }
            Self::Seq(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt(f)?;
                }
                f.write_char(']')
            }
            Self::Scalar(scalar) => scalar.fmt(f),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => v.fmt(f),
            Self::Int(v) => v.fmt(f),
            Self::UInt(v) => v.fmt(f),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::Other(v) => write!(f, "@{v:?}"),
        }
    }
}

/// Conversion of a Rust value into a bound query argument.
///
/// Implemented for the primitive types, strings, `Option`, references and smart pointers,
/// slices, arrays, vectors, sets and maps. Implement it for your own argument types, or
/// fall back to [`Value::display`].
pub trait ToValue {
    /// Converts `self` into a [`Value`].
    fn to_value(&self) -> Value;
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for Scalar {
    fn to_value(&self) -> Value {
        Value::Scalar(self.clone())
    }
}

macro_rules! impl_to_value {
    ($variant:ident as $target:ty: $($ty:ty),+) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::Scalar(Scalar::$variant(<$target>::from(*self)))
                }
            }
        )+
    };
}

impl_to_value!(Bool as bool: bool);
impl_to_value!(Int as i64: i8, i16, i32, i64);
impl_to_value!(UInt as u64: u8, u16, u32, u64);
impl_to_value!(Float as f64: f32, f64);

impl ToValue for isize {
    fn to_value(&self) -> Value {
        i64::try_from(*self).map_or_else(|_| Value::display(self), |v| Value::Scalar(Scalar::Int(v)))
    }
}

impl ToValue for usize {
    fn to_value(&self) -> Value {
        u64::try_from(*self).map_or_else(|_| Value::display(self), |v| Value::Scalar(Scalar::UInt(v)))
    }
}

impl ToValue for i128 {
    fn to_value(&self) -> Value {
        if let Ok(v) = i64::try_from(*self) {
            return Value::Scalar(Scalar::Int(v));
        }
        u64::try_from(*self).map_or_else(|_| Value::display(self), |v| Value::Scalar(Scalar::UInt(v)))
    }
}

impl ToValue for u128 {
    fn to_value(&self) -> Value {
        u64::try_from(*self).map_or_else(|_| Value::display(self), |v| Value::Scalar(Scalar::UInt(v)))
    }
}

impl ToValue for char {
    fn to_value(&self) -> Value {
        Value::Scalar(Scalar::Str(self.to_string()))
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Scalar(Scalar::Str(self.to_owned()))
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        self.as_str().to_value()
    }
}

impl ToValue for () {
    fn to_value(&self) -> Value {
        Value::Absent
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        Value::reference((**self).to_value())
    }
}

impl<T: ToValue + ?Sized> ToValue for &mut T {
    fn to_value(&self) -> Value {
        Value::reference((**self).to_value())
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Value {
        Value::reference((**self).to_value())
    }
}

impl<T: ToValue + ?Sized> ToValue for Rc<T> {
    fn to_value(&self) -> Value {
        Value::reference((**self).to_value())
    }
}

impl<T: ToValue + ?Sized> ToValue for Arc<T> {
    fn to_value(&self) -> Value {
        Value::reference((**self).to_value())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Absent, |v| Value::reference(v.to_value()))
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T: ToValue> ToValue for BTreeSet<T> {
    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue, S> ToValue for HashSet<T, S> {
    fn to_value(&self) -> Value {
        // Sets have no meaningful order; sort by rendering like map keys.
        let mut items: Vec<Value> = self.iter().map(ToValue::to_value).collect();
        items.sort_by_cached_key(ToString::to_string);
        Value::Seq(items)
    }
}

impl<K: ToValue, V: ToValue> ToValue for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }
}

impl<K: ToValue, V: ToValue, S: BuildHasher> ToValue for HashMap<K, V, S> {
    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_renders_nil() {
        assert_eq!(Value::Absent.to_string(), "<nil>");
        assert_eq!(None::<i32>.to_value().to_string(), "<nil>");
        assert_eq!(None::<Box<str>>.to_value().to_string(), "<nil>");
    }

    #[test]
    fn references_render_their_target() {
        let n = 5_u8;
        assert_eq!((&n).to_value().to_string(), "5");
        assert_eq!(Some(Box::new("x")).to_value().to_string(), r#""x""#);
        assert_eq!(Arc::new(Some(true)).to_value().to_string(), "true");
    }

    #[test]
    fn scalars_render_unambiguously() {
        assert_eq!(true.to_value().to_string(), "true");
        assert_eq!((-12_i32).to_value().to_string(), "-12");
        assert_eq!(u64::MAX.to_value().to_string(), "18446744073709551615");
        assert_eq!(1.5_f64.to_value().to_string(), "1.5");
        assert_eq!(2.0_f64.to_value().to_string(), "2.0");
        assert_eq!("text".to_value().to_string(), r#""text""#);
        assert_eq!('c'.to_value().to_string(), r#""c""#);
    }

    #[test]
    fn wide_integers_fall_back_to_display() {
        let big = i128::MAX;
        assert_eq!(big.to_value().to_string(), big.to_string());
        assert_eq!(7_i128.to_value(), Value::Scalar(Scalar::Int(7)));
        assert_eq!(i128::from(u64::MAX).to_value(), u64::MAX.to_value());
    }

    #[test]
    fn sequences_keep_order() {
        assert_eq!(vec![3_i32, 1, 2].to_value().to_string(), "[3, 1, 2]");
        assert_eq!(Vec::<i32>::new().to_value().to_string(), "[]");
        assert_eq!([Some(1_i32), None].to_value().to_string(), "[1, <nil>]");
    }

    #[test]
    fn maps_render_sorted_by_key() {
        let map = HashMap::from([("zeta", 1_i32), ("alpha", 2), ("mid", 3)]);
        assert_eq!(map.to_value().to_string(), r#"{"alpha": 2, "mid": 3, "zeta": 1}"#);
    }

    #[test]
    fn hash_map_and_btree_map_render_identically() {
        let hashed: HashMap<String, Vec<i32>> = (0..32).map(|i| (format!("k{i}"), vec![i])).collect();
        let ordered: BTreeMap<String, Vec<i32>> = hashed.clone().into_iter().collect();
        assert_eq!(hashed.to_value().to_string(), ordered.to_value().to_string());
    }

    #[test]
    fn sets_render_sorted() {
        let set = HashSet::from(["b", "c", "a"]);
        assert_eq!(set.to_value().to_string(), r#"["a", "b", "c"]"#);
    }

    #[test]
    fn nested_containers_render_recursively() {
        let nested = vec![
            Value::Map(vec![(1_i32.to_value(), vec![Some("a"), None].to_value())]),
            Value::reference(Value::Absent),
        ];
        assert_eq!(Value::Seq(nested).to_string(), r#"[{1: ["a", <nil>]}, <nil>]"#);
    }

    #[test]
    fn display_fallback_uses_display_form() {
        let addr = std::net::Ipv4Addr::LOCALHOST;
        assert_eq!(Value::display(&addr).to_string(), r#"@"127.0.0.1""#);
        assert_ne!(Value::display(&addr).to_string(), "127.0.0.1".to_value().to_string());
    }

    #[test]
    fn text_never_renders_like_other_shapes() {
        assert_ne!("1".to_value().to_string(), 1_i32.to_value().to_string());
        assert_ne!("true".to_value().to_string(), true.to_value().to_string());
        assert_ne!("<nil>".to_value().to_string(), Value::Absent.to_string());
        assert_ne!(1.0_f64.to_value().to_string(), 1_i32.to_value().to_string());
        assert_ne!(vec!["a, b"].to_value().to_string(), vec!["a", "b"].to_value().to_string());
        assert_eq!("say \"hi\"".to_value().to_string(), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn unit_is_absent() {
        assert!(().to_value().is_absent());
    }
}
