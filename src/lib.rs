//! Swagger from Flow - Swagger 2.0 documentation from Flow-annotated route handlers.
//!
//! Handler files declare routes as curried calls whose handler carries inline type
//! annotations:
//!
//! ```text
//! route({method: 'GET', path: '/pet/:id'})((id: Path<number>): JSONResp<Resp<Pet>> => ...);
//! GraphQLResolver({typeName: 'pet'})((id: number): Pet => ...);
//! ```
//!
//! The annotations are resolved to their type alias declarations, possibly in other files,
//! through a "jump to definition" service, and turned into JSON-Schema fragments.
//!
//! # Limitations
//!
//! Sources are parsed with the TypeScript grammar, which covers the Flow annotations
//! handler files normally use (`type X<T> = {...}`, `import type`, optional parameters).
//! Flow-only syntax such as exact objects (`{| |}`), maybe types (`?T`) or utility types
//! in unsupported positions makes the whole file a parse error: `analyze_file` rejects it,
//! and `analyze_folder` records one failure for that file and keeps going.
//!
//! Fields whose type is itself a generic instantiation or an object literal are emitted
//! as `{type: "object"}` without properties.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Lists the handler files of a folder
//! 2. [`parser`] - Parses sources with oxc and lowers them into the owned [`ast`]
//! 3. [`extractor`] - Classifies top-level statements as HTTP routes, graph routes or neither
//! 4. [`lookup`] - Definition lookup services (Flow subprocess, in-process index, cache)
//! 5. [`type_resolver`] - Walks references to their alias declarations
//! 6. [`schema_generator`] - Synthesizes schemas from aliases and resolved type arguments
//! 7. [`openapi_builder`] - Accumulates endpoints and graph fields into documents
//! 8. [`analyzer`] - Drives the pipeline and isolates per-route failures
//! 9. [`serializer`] - Renders documents as YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use swagger_from_flow::{
//!     analyzer::Analyzer, config::DocumentInfo, lookup::SourceIndexService,
//!     serializer::serialize_yaml,
//! };
//! use std::path::Path;
//!
//! let analyzer = Analyzer::new(SourceIndexService::new());
//! let report = analyzer.analyze_folder(Path::new("./controllers")).unwrap();
//! for failure in &report.failures {
//!     eprintln!("{}", failure);
//! }
//!
//! let yaml = serialize_yaml(&report.swagger(&DocumentInfo::default())).unwrap();
//! println!("{}", yaml);
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod analyzer;
pub mod ast;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod lookup;
pub mod openapi_builder;
pub mod parser;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
pub mod type_resolver;
