#![forbid(unsafe_code)]

use super::{ObjectClass, Payload};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

pub type RehydrateFn = fn(ObjectClass, &JsonValue) -> Result<JsonValue, RehydrateError>;

/// One row of the class registry: stored class name to rehydration function.
#[derive(Clone, Copy, Debug)]
pub struct ClassEntry {
    pub name: &'static str,
    pub class: ObjectClass,
    pub rehydrate: RehydrateFn,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RehydrateError {
    #[error("unknown object class {0:?}")]
    UnknownClass(String),
    #[error("{class} payload must be a json {expected}")]
    Shape {
        class: ObjectClass,
        expected: &'static str,
    },
}

static CLASS_REGISTRY: [ClassEntry; 11] = [
    entry(ObjectClass::Person, rehydrate_object),
    entry(ObjectClass::Family, rehydrate_object),
    entry(ObjectClass::Source, rehydrate_object),
    entry(ObjectClass::Event, rehydrate_object),
    entry(ObjectClass::Media, rehydrate_object),
    entry(ObjectClass::Place, rehydrate_object),
    entry(ObjectClass::Repository, rehydrate_object),
    entry(ObjectClass::Reference, rehydrate_reference),
    entry(ObjectClass::Note, rehydrate_object),
    entry(ObjectClass::Tag, rehydrate_object),
    entry(ObjectClass::Citation, rehydrate_object),
];

const fn entry(class: ObjectClass, rehydrate: RehydrateFn) -> ClassEntry {
    ClassEntry {
        name: class_name_const(class),
        class,
        rehydrate,
    }
}

// `ObjectClass::name` is not const; keep this table in sync with it.
const fn class_name_const(class: ObjectClass) -> &'static str {
    match class {
        ObjectClass::Person => "Person",
        ObjectClass::Family => "Family",
        ObjectClass::Source => "Source",
        ObjectClass::Event => "Event",
        ObjectClass::Media => "Media",
        ObjectClass::Place => "Place",
        ObjectClass::Repository => "Repository",
        ObjectClass::Reference => "Reference",
        ObjectClass::Note => "Note",
        ObjectClass::Tag => "Tag",
        ObjectClass::Citation => "Citation",
    }
}

pub fn class_registry() -> &'static [ClassEntry] {
    &CLASS_REGISTRY
}

/// Resolves a stored class name, or the numeric class key older writers used
/// for classes without a name (the reference table).
pub fn lookup_class(name: &str) -> Option<&'static ClassEntry> {
    let class = ObjectClass::from_stored(name)?;
    CLASS_REGISTRY.iter().find(|entry| entry.class == class)
}

/// Turns a stored payload back into the plain JSON shape the history API returns.
pub fn rehydrate(class_name: &str, payload: &Payload) -> Result<JsonValue, RehydrateError> {
    let entry =
        lookup_class(class_name).ok_or_else(|| RehydrateError::UnknownClass(class_name.to_string()))?;
    (entry.rehydrate)(entry.class, payload.as_json())
}

/// Like [`rehydrate`], but absent payloads and failures become `{}`.
pub fn rehydrate_or_empty(class_name: &str, payload: Option<&Payload>) -> JsonValue {
    payload
        .and_then(|payload| rehydrate(class_name, payload).ok())
        .unwrap_or_else(empty_object)
}

pub fn empty_object() -> JsonValue {
    JsonValue::Object(Map::new())
}

// Stored objects come back field for field; only the shape is checked.
fn rehydrate_object(class: ObjectClass, data: &JsonValue) -> Result<JsonValue, RehydrateError> {
    match data {
        JsonValue::Object(_) => Ok(data.clone()),
        _ => Err(RehydrateError::Shape {
            class,
            expected: "object",
        }),
    }
}

fn rehydrate_reference(class: ObjectClass, data: &JsonValue) -> Result<JsonValue, RehydrateError> {
    match data {
        JsonValue::Array(_) => Ok(data.clone()),
        _ => Err(RehydrateError::Shape {
            class,
            expected: "array",
        }),
    }
}
