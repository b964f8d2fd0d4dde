use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fmt,
    hash::{BuildHasher, Hash, Hasher},
    rc::Rc,
    sync::Arc,
};

use indexmap::{IndexMap, IndexSet};


/// Equality used to decide whether a property value actually changed.
///
/// This is the ordinary `==` for every type except floating point numbers,
/// where any NaN is equal to any other NaN.
/// Properties use it to suppress notifications for writes that do not change anything.
///
/// For your own types, [`impl_property_eq_by_partial_eq`](crate::impl_property_eq_by_partial_eq)
/// implements this trait in terms of `PartialEq`.
pub trait PropertyEq {
    fn property_eq(&self, other: &Self) -> bool;
}

/// Implements [`PropertyEq`] for types whose `PartialEq` already has the desired semantics.
#[macro_export]
macro_rules! impl_property_eq_by_partial_eq {
    ($($t:ty),* $(,)?) => {
        $(
            impl $crate::PropertyEq for $t {
                fn property_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_property_eq_by_partial_eq!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    str,
    String,
);

impl PropertyEq for f32 {
    fn property_eq(&self, other: &Self) -> bool {
        self == other || (self.is_nan() && other.is_nan())
    }
}
impl PropertyEq for f64 {
    fn property_eq(&self, other: &Self) -> bool {
        self == other || (self.is_nan() && other.is_nan())
    }
}

impl<T: PropertyEq + ?Sized> PropertyEq for &T {
    fn property_eq(&self, other: &Self) -> bool {
        T::property_eq(self, other)
    }
}
impl<T: PropertyEq + ?Sized> PropertyEq for Box<T> {
    fn property_eq(&self, other: &Self) -> bool {
        T::property_eq(self, other)
    }
}
impl<T: PropertyEq + ?Sized> PropertyEq for Rc<T> {
    fn property_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other) || T::property_eq(self, other)
    }
}
impl<T: PropertyEq + ?Sized> PropertyEq for Arc<T> {
    fn property_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other) || T::property_eq(self, other)
    }
}
impl<T: PropertyEq + ToOwned + ?Sized> PropertyEq for Cow<'_, T> {
    fn property_eq(&self, other: &Self) -> bool {
        T::property_eq(self, other)
    }
}

// `None` equals `None`, matching two absent values.
impl<T: PropertyEq> PropertyEq for Option<T> {
    fn property_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.property_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}
impl<T: PropertyEq, E: PropertyEq> PropertyEq for std::result::Result<T, E> {
    fn property_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Ok(a), Ok(b)) => a.property_eq(b),
            (Err(a), Err(b)) => a.property_eq(b),
            _ => false,
        }
    }
}

fn slice_eq<T: PropertyEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.property_eq(b))
}
impl<T: PropertyEq> PropertyEq for [T] {
    fn property_eq(&self, other: &Self) -> bool {
        slice_eq(self, other)
    }
}
impl<T: PropertyEq, const N: usize> PropertyEq for [T; N] {
    fn property_eq(&self, other: &Self) -> bool {
        slice_eq(self, other)
    }
}
impl<T: PropertyEq> PropertyEq for Vec<T> {
    fn property_eq(&self, other: &Self) -> bool {
        slice_eq(self, other)
    }
}

impl<T: Eq + Hash, S: BuildHasher> PropertyEq for HashSet<T, S> {
    fn property_eq(&self, other: &Self) -> bool {
        self == other
    }
}
impl<T: Ord> PropertyEq for BTreeSet<T> {
    fn property_eq(&self, other: &Self) -> bool {
        self == other
    }
}
impl<T: Eq + Hash, S: BuildHasher> PropertyEq for IndexSet<T, S> {
    fn property_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|x| other.contains(x))
    }
}
impl<K: Eq + Hash, V: PropertyEq, S: BuildHasher> PropertyEq for HashMap<K, V, S> {
    fn property_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| v.property_eq(o)))
    }
}
impl<K: Ord, V: PropertyEq> PropertyEq for BTreeMap<K, V> {
    fn property_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| v.property_eq(o)))
    }
}
impl<K: Eq + Hash, V: PropertyEq, S: BuildHasher> PropertyEq for IndexMap<K, V, S> {
    fn property_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| v.property_eq(o)))
    }
}

macro_rules! impl_property_eq_for_tuple {
    ($($t:ident $i:tt),*) => {
        impl<$($t: PropertyEq),*> PropertyEq for ($($t,)*) {
            fn property_eq(&self, other: &Self) -> bool {
                $(self.$i.property_eq(&other.$i))&&*
            }
        }
    };
}
impl_property_eq_for_tuple!(T0 0);
impl_property_eq_for_tuple!(T0 0, T1 1);
impl_property_eq_for_tuple!(T0 0, T1 1, T2 2);
impl_property_eq_for_tuple!(T0 0, T1 1, T2 2, T3 3);

/// A dynamically typed property value.
///
/// `Eq` and `Hash` follow the same rules as [`PropertyEq`]:
/// NaN is equal to NaN regardless of float width, so `Value` can be stored in
/// a [`SetProperty`](crate::SetProperty) or used as a map key.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
    pub fn is_nan(&self) -> bool {
        match self {
            Value::F32(v) => v.is_nan(),
            Value::F64(v) => v.is_nan(),
            _ => false,
        }
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(f64::from(*v)),
            Value::F64(v) => Some(*v),
            Value::I64(v) => Some(*v as f64),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.is_nan() && other.is_nan() {
            return true;
        }
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if self.is_nan() {
            state.write_u8(0xff);
            return;
        }
        match self {
            Value::Null => state.write_u8(0),
            Value::Bool(v) => {
                state.write_u8(1);
                v.hash(state);
            }
            Value::I64(v) => {
                state.write_u8(2);
                v.hash(state);
            }
            Value::F32(v) => {
                state.write_u8(3);
                // `0.0 == -0.0`, so both must hash alike.
                (if *v == 0.0 { 0.0f32 } else { *v }).to_bits().hash(state);
            }
            Value::F64(v) => {
                state.write_u8(4);
                (if *v == 0.0 { 0.0f64 } else { *v }).to_bits().hash(state);
            }
            Value::String(v) => {
                state.write_u8(5);
                v.hash(state);
            }
            Value::List(v) => {
                state.write_u8(6);
                v.hash(state);
            }
        }
    }
}

impl PropertyEq for Value {
    fn property_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => fmt::Debug::fmt(v, f),
            Value::I64(v) => fmt::Debug::fmt(v, f),
            Value::F32(v) => write!(f, "{v:?}f32"),
            Value::F64(v) => fmt::Debug::fmt(v, f),
            Value::String(v) => fmt::Debug::fmt(v, f),
            Value::List(v) => f.debug_list().entries(v).finish(),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}
impl_from_for_value!(
    bool => Bool,
    i8 => I64,
    i16 => I64,
    i32 => I64,
    i64 => I64,
    u8 => I64,
    u16 => I64,
    u32 => I64,
    f32 => F32,
    f64 => F64,
    String => String,
    &str => String,
    Vec<Value> => List,
);
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
