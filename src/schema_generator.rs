use crate::ast::{TypeAliasDeclaration, TypeNode};
use crate::error::{AnalysisError, Result};
use crate::extractor::http::is_service_wrapper;
use indexmap::IndexMap;
use log::debug;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Primitive types supported in annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    String,
    Number,
    Null,
}

impl Primitive {
    /// Maps a type keyword through the fixed primitive table.
    pub fn from_keyword(keyword: &str) -> Result<Self> {
        match keyword {
            "boolean" => Ok(Primitive::Boolean),
            "string" => Ok(Primitive::String),
            "number" => Ok(Primitive::Number),
            "null" => Ok(Primitive::Null),
            other => Err(AnalysisError::UnknownPrimitiveType(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Null => "null",
        }
    }
}

/// A JSON-Schema-shaped description of a resolved type.
///
/// Serializes as `{"type": "<primitive>"}` or
/// `{"type": "object", "properties": {...}, "required": [...]}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Primitive(Primitive),
    /// An object shape with properties in declaration order.
    Object {
        properties: IndexMap<String, Schema>,
        required: Vec<String>,
    },
    /// A nested object left unexpanded.
    OpaqueObject,
}

impl Schema {
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            Schema::Primitive(primitive) => Some(*primitive),
            _ => None,
        }
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Schema::Primitive(primitive) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("type", primitive.as_str())?;
                map.end()
            }
            Schema::Object {
                properties,
                required,
            } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "object")?;
                map.serialize_entry("properties", properties)?;
                map.serialize_entry("required", required)?;
                map.end()
            }
            Schema::OpaqueObject => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("type", "object")?;
                map.end()
            }
        }
    }
}

/// Builds the schema of a located alias instantiated with already-resolved arguments.
///
/// Service wrappers (`Path<T>`, `JSONResp<T>`, ...) are transparent and yield their first
/// argument. Any other alias must have an object body; its fields become properties, and
/// all of them are listed as required.
///
/// # Errors
///
/// - [`AnalysisError::UnsupportedDeclaration`] for a non-object body or a missing argument
/// - [`AnalysisError::UnknownPrimitiveType`] for a field keyword outside the primitive table
pub fn synthesize(alias: &TypeAliasDeclaration, arguments: &[Schema]) -> Result<Schema> {
    if is_service_wrapper(&alias.name) {
        return arguments
            .first()
            .cloned()
            .ok_or_else(|| unsupported(alias, "wrapper has no type argument"));
    }

    let TypeNode::Object { fields, .. } = &alias.body else {
        return Err(unsupported(
            alias,
            &format!("body is {}, not an object type", alias.body.describe()),
        ));
    };

    let mut bindings: HashMap<&str, &Schema> = HashMap::with_capacity(alias.type_parameters.len());
    for (index, parameter) in alias.type_parameters.iter().enumerate() {
        let argument = arguments.get(index).ok_or_else(|| {
            unsupported(alias, &format!("no type argument for parameter `{}`", parameter))
        })?;
        bindings.insert(parameter, argument);
    }

    let mut properties = IndexMap::with_capacity(fields.len());
    let mut required = Vec::with_capacity(fields.len());
    for field in fields {
        let schema = field_schema(&field.type_node, &bindings)?;
        properties.insert(field.name.clone(), schema);
        required.push(field.name.clone());
    }

    debug!("Synthesized `{}` with {} properties", alias.name, properties.len());
    Ok(Schema::Object {
        properties,
        required,
    })
}

fn field_schema(node: &TypeNode, bindings: &HashMap<&str, &Schema>) -> Result<Schema> {
    match node {
        TypeNode::Reference {
            name, arguments, ..
        } if arguments.is_empty() && bindings.contains_key(name.as_str()) => {
            Ok(bindings[name.as_str()].clone())
        }
        TypeNode::Keyword { name, .. } => Primitive::from_keyword(name).map(Schema::Primitive),
        // nested generics stay unexpanded
        TypeNode::Reference { .. } | TypeNode::Object { .. } => Ok(Schema::OpaqueObject),
        TypeNode::Unsupported { kind, .. } => {
            Err(AnalysisError::UnknownPrimitiveType(kind.clone()))
        }
    }
}

fn unsupported(alias: &TypeAliasDeclaration, reason: &str) -> AnalysisError {
    AnalysisError::UnsupportedDeclaration {
        name: alias.name.clone(),
        reason: reason.to_string(),
    }
}
