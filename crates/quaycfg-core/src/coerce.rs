//! Field descriptors and the type coercion engine.
//!
//! Each field group declares a static table of [`FieldSpec`]s. Construction
//! reads a field through [`field`], which applies the declared default when
//! the key is absent and otherwise narrows the document value to the field's
//! Rust type. Narrowing never converts: `"30"` is not an integer and `30` is
//! not a string.

use crate::constraint::Constraint;
use crate::error::{ConstructError, ConstructResult};
use crate::value::{Mapping, Value, ValueKind};

/// Declared default of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    /// No default: the field starts at its type's zero value.
    None,
    Bool(bool),
    Int(i64),
    Text(&'static str),
}

/// Descriptor for one field of a field group.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Wire key, e.g. `REPO_MIRROR_INTERVAL`.
    pub key: &'static str,
    pub kind: ValueKind,
    pub default: FieldDefault,
    pub constraints: &'static [Constraint],
    /// Drop the key from the wire form when it holds a zero value.
    pub omit_empty: bool,
}

impl FieldSpec {
    pub const fn new(key: &'static str, kind: ValueKind) -> Self {
        Self {
            key,
            kind,
            default: FieldDefault::None,
            constraints: &[],
            omit_empty: true,
        }
    }

    pub const fn default_to(self, default: FieldDefault) -> Self {
        Self { default, ..self }
    }

    pub const fn constrained(self, constraints: &'static [Constraint]) -> Self {
        Self {
            constraints,
            ..self
        }
    }

    /// Always emit the key, even when it holds a zero value.
    pub const fn always_emit(self) -> Self {
        Self {
            omit_empty: false,
            ..self
        }
    }
}

/// A Rust type a document value can be narrowed into.
pub trait FieldValue: Sized {
    const KIND: ValueKind;

    /// Narrow a present, non-null value. `None` means a type mismatch.
    fn from_value(value: &Value) -> Option<Self>;

    /// The value used when the key is absent.
    fn from_default(default: &FieldDefault) -> Self;

    fn to_value(&self) -> Value;
}

impl FieldValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn from_default(default: &FieldDefault) -> Self {
        match default {
            FieldDefault::Text(s) => (*s).to_string(),
            _ => String::new(),
        }
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl FieldValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn from_default(default: &FieldDefault) -> Self {
        matches!(default, FieldDefault::Bool(true))
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FieldValue for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    fn from_default(default: &FieldDefault) -> Self {
        match default {
            FieldDefault::Int(i) => *i,
            _ => 0,
        }
    }

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }
}

impl FieldValue for Vec<String> {
    const KIND: ValueKind = ValueKind::TextList;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => None,
        }
    }

    fn from_default(_default: &FieldDefault) -> Self {
        Vec::new()
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().cloned().map(Value::Text).collect())
    }
}

impl FieldValue for Vec<Value> {
    const KIND: ValueKind = ValueKind::List;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => Some(items.clone()),
            _ => None,
        }
    }

    fn from_default(_default: &FieldDefault) -> Self {
        Vec::new()
    }

    fn to_value(&self) -> Value {
        Value::List(self.clone())
    }
}

impl FieldValue for Mapping {
    const KIND: ValueKind = ValueKind::Map;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Map(map) => Some(map.clone()),
            _ => None,
        }
    }

    fn from_default(_default: &FieldDefault) -> Self {
        Mapping::new()
    }

    fn to_value(&self) -> Value {
        Value::Map(self.clone())
    }
}

/// Optional scalars keep "absent" distinct from the zero value.
impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn from_value(value: &Value) -> Option<Self> {
        T::from_value(value).map(Some)
    }

    fn from_default(default: &FieldDefault) -> Self {
        match default {
            FieldDefault::None => None,
            other => Some(T::from_default(other)),
        }
    }

    fn to_value(&self) -> Value {
        self.as_ref().map(FieldValue::to_value).unwrap_or(Value::Null)
    }
}

/// Read one field from a document, applying its default when absent.
///
/// An explicit `null` counts as absent.
pub fn field<T: FieldValue>(doc: &Mapping, spec: &FieldSpec) -> ConstructResult<T> {
    debug_assert_eq!(spec.kind, T::KIND, "descriptor kind for {}", spec.key);
    match doc.get(spec.key) {
        None | Some(Value::Null) => Ok(T::from_default(&spec.default)),
        Some(value) => {
            T::from_value(value).ok_or_else(|| ConstructError::type_mismatch(spec.key, T::KIND))
        }
    }
}

/// Read a nested mapping field and build a structure from it.
///
/// Returns `None` when the key is absent. Errors raised by `build` are
/// re-keyed under the field's key.
pub fn nested<T>(
    doc: &Mapping,
    spec: &FieldSpec,
    build: impl FnOnce(&Mapping) -> ConstructResult<T>,
) -> ConstructResult<Option<T>> {
    match doc.get(spec.key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Map(map)) => build(map).map(Some).map_err(|err| err.within(spec.key)),
        Some(_) => Err(ConstructError::type_mismatch(spec.key, ValueKind::Map)),
    }
}

/// Read a list-of-mappings field, building one structure per element.
pub fn nested_list<T>(
    doc: &Mapping,
    spec: &FieldSpec,
    mut build: impl FnMut(&Mapping) -> ConstructResult<T>,
) -> ConstructResult<Vec<T>> {
    let items = match doc.get(spec.key) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::List(items)) => items,
        Some(_) => return Err(ConstructError::type_mismatch(spec.key, ValueKind::List)),
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Map(map) => build(map).map_err(|err| err.within(&format!("[{i}]"))),
            _ => Err(ConstructError::type_mismatch(format!("[{i}]"), ValueKind::Map)),
        })
        .collect::<ConstructResult<Vec<T>>>()
        .map_err(|err| err.within(spec.key))
}

/// Write a field into its wire mapping, honouring `omit_empty`.
pub fn emit<T: FieldValue>(doc: &mut Mapping, spec: &FieldSpec, value: &T) {
    emit_value(doc, spec, value.to_value());
}

/// Write an already-built value into a wire mapping, honouring `omit_empty`.
pub fn emit_value(doc: &mut Mapping, spec: &FieldSpec, value: Value) {
    if matches!(value, Value::Null) || (spec.omit_empty && value.is_zero()) {
        return;
    }
    doc.insert(spec.key.to_string(), value);
}
