use crate::config::DocumentInfo;
use crate::extractor::{HttpMethod, ParameterLocation};
use crate::schema_generator::Schema;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything recovered about one HTTP endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDescriptor {
    pub method: HttpMethod,
    /// Path as written in the route options (`/pet/:id`)
    pub path: String,
    /// Parameters in handler declaration order
    pub parameters: Vec<EndpointParameter>,
    pub response_schema: Schema,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointParameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Schema,
}

/// Everything recovered about one graph field resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphFieldDescriptor {
    pub type_name: String,
    pub is_mutation: bool,
    pub parameters: Vec<GraphParameter>,
    pub response_schema: Schema,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphParameter {
    pub name: String,
    pub schema: Schema,
}

/// Swagger parameter object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    /// Parameter location (query, header, path, body, form)
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    /// Inline primitive type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Object schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Swagger response object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// `<method> <path>`
    pub description: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Swagger operation object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    pub parameters: Vec<Parameter>,
    pub responses: BTreeMap<String, Response>,
    pub produces: Vec<String>,
    pub consumes: Vec<String>,
}

/// Normalized path -> lowercase method -> operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ApiDocument {
    pub paths: BTreeMap<String, BTreeMap<String, Operation>>,
}

impl ApiDocument {
    pub fn operation(&self, path: &str, method: HttpMethod) -> Option<&Operation> {
        self.paths.get(path)?.get(method.as_str())
    }

    /// Number of operations across all paths.
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Graph field parameter, rendered like a Swagger parameter without location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphParameterEntry {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEndpoint {
    pub parameters: Vec<GraphParameterEntry>,
    /// The graph type name
    pub description: String,
    pub response: Schema,
    pub mutation: bool,
}

/// Graph type name -> field description.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GraphSchema {
    pub fields: BTreeMap<String, GraphEndpoint>,
}

impl GraphSchema {
    pub fn get(&self, type_name: &str) -> Option<&GraphEndpoint> {
        self.fields.get(type_name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// API info block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Info {
    pub title: String,
    pub version: String,
}

/// Complete Swagger 2.0 document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwaggerDocument {
    pub swagger: String,
    pub host: String,
    #[serde(rename = "basePath")]
    pub base_path: String,
    pub info: Info,
    pub paths: ApiDocument,
    /// Always empty: schemas are inlined
    pub definitions: BTreeMap<String, Schema>,
}

impl SwaggerDocument {
    /// Wraps the emitted paths in the Swagger envelope.
    pub fn new(api: ApiDocument, info: &DocumentInfo) -> Self {
        Self {
            swagger: "2.0".to_string(),
            host: info.host.clone(),
            base_path: info.base_path.clone(),
            info: Info {
                title: info.title.clone(),
                version: info.version.clone(),
            },
            paths: api,
            definitions: BTreeMap::new(),
        }
    }
}

/// Output of [`SchemaAccumulator::emit`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmittedSchemas {
    pub api: ApiDocument,
    pub graph: GraphSchema,
}

/// Schema accumulator - merges endpoint and graph fragments of one run.
///
/// Later records replace earlier ones with the same (path, method) or type name.
#[derive(Debug, Default)]
pub struct SchemaAccumulator {
    api: ApiDocument,
    graph: GraphSchema,
}

impl SchemaAccumulator {
    pub fn new() -> Self {
        debug!("Initializing SchemaAccumulator");
        Self::default()
    }

    /// Records an endpoint under its normalized path and lowercase method.
    pub fn record(&mut self, endpoint: EndpointDescriptor) {
        let path = normalize_path(&endpoint.path);
        let method = endpoint.method.as_str();
        debug!("Adding route: {} {}", method, path);

        let parameters = endpoint
            .parameters
            .into_iter()
            .map(|parameter| {
                let (type_name, schema) = split_schema(parameter.schema);
                Parameter {
                    name: parameter.name,
                    location: parameter.location.as_str().to_string(),
                    required: parameter.required,
                    type_name,
                    schema,
                }
            })
            .collect();

        let (type_name, schema) = split_schema(endpoint.response_schema);
        let mut responses = BTreeMap::new();
        responses.insert(
            "200".to_string(),
            Response {
                description: format!("{} {}", method, path),
                type_name,
                schema,
            },
        );

        let operation = Operation {
            parameters,
            responses,
            produces: vec![endpoint.content_type.clone()],
            consumes: vec![endpoint.content_type],
        };

        let previous = self
            .api
            .paths
            .entry(path.clone())
            .or_default()
            .insert(method.to_string(), operation);
        if previous.is_some() {
            debug!("Replaced existing operation {} {}", method, path);
        }
    }

    /// Records a graph field under its type name.
    pub fn record_graph_field(&mut self, field: GraphFieldDescriptor) {
        debug!("Adding graph field: {}", field.type_name);

        let parameters = field
            .parameters
            .into_iter()
            .map(|parameter| {
                let (type_name, schema) = split_schema(parameter.schema);
                GraphParameterEntry {
                    name: parameter.name,
                    type_name,
                    schema,
                }
            })
            .collect();

        let endpoint = GraphEndpoint {
            parameters,
            description: field.type_name.clone(),
            response: field.response_schema,
            mutation: field.is_mutation,
        };
        if self.graph.fields.insert(field.type_name.clone(), endpoint).is_some() {
            debug!("Replaced existing graph field {}", field.type_name);
        }
    }

    /// Returns the accumulated documents.
    pub fn emit(self) -> EmittedSchemas {
        debug!(
            "Emitting {} operations and {} graph fields",
            self.api.operation_count(),
            self.graph.len()
        );
        EmittedSchemas {
            api: self.api,
            graph: self.graph,
        }
    }
}

/// A primitive schema renders as an inline `type`, anything else under `schema`.
fn split_schema(schema: Schema) -> (Option<String>, Option<Schema>) {
    match schema.primitive() {
        Some(primitive) => (Some(primitive.as_str().to_string()), None),
        None => (None, Some(schema)),
    }
}

/// Converts `:param` path segments to `{param}`.
///
/// Already-normalized paths are returned unchanged.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{}}}", name),
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}
