//! Pipeline driver: parse, match, resolve, accumulate.
//!
//! Files of a folder, route candidates of a file and type arguments of a reference are
//! resolved in parallel with rayon. Results are collected in source order and merged into
//! one [`SchemaAccumulator`] by the calling thread, so later declarations win.

use crate::config::{DocumentInfo, LookupConfig};
use crate::error::{AnalysisError, Result};
use crate::extractor::{route_candidates, GraphRoute, HttpRoute, RouteCandidate};
use crate::lookup::{CachedDefinitionService, DefinitionService};
use crate::openapi_builder::{
    ApiDocument, EndpointDescriptor, EndpointParameter, GraphFieldDescriptor, GraphParameter,
    GraphSchema, SchemaAccumulator, SwaggerDocument,
};
use crate::parser::{AstParser, ParsedFile};
use crate::scanner::FileScanner;
use crate::type_resolver::TypeResolver;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};

/// A route candidate or file that could not be turned into a schema fragment.
#[derive(Debug)]
pub struct Failure {
    pub file: PathBuf,
    /// Line of the failing statement; `None` for whole-file failures
    pub line: Option<u32>,
    /// `GET /pet/:id` or `graph pet`, when the options could be read
    pub route: Option<String>,
    pub error: AnalysisError,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(route) = &self.route {
            write!(f, " ({})", route)?;
        }
        write!(f, ": {}", self.error)
    }
}

/// Result of one analysis run.
#[derive(Debug, Default)]
pub struct AnalysisReport {
    pub api: ApiDocument,
    pub graph: GraphSchema,
    /// Per-candidate and per-file failures, in source order
    pub failures: Vec<Failure>,
    /// Scanner warnings
    pub warnings: Vec<String>,
}

impl AnalysisReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// The API document wrapped in its Swagger envelope.
    pub fn swagger(&self, info: &DocumentInfo) -> SwaggerDocument {
        SwaggerDocument::new(self.api.clone(), info)
    }
}

/// Schema fragment produced by one route candidate.
enum Fragment {
    Endpoint(EndpointDescriptor),
    GraphField(GraphFieldDescriptor),
}

type Outcome = std::result::Result<Fragment, Failure>;

/// Entry point of the library.
///
/// # Example
///
/// ```no_run
/// use swagger_from_flow::analyzer::Analyzer;
/// use swagger_from_flow::lookup::SourceIndexService;
/// use std::path::Path;
///
/// let analyzer = Analyzer::new(SourceIndexService::new());
/// let report = analyzer.analyze_folder(Path::new("./controllers")).unwrap();
/// println!("{} operations", report.api.operation_count());
/// ```
pub struct Analyzer<S> {
    service: S,
}

impl Analyzer<Box<dyn DefinitionService>> {
    /// Creates an analyzer using the configured lookup backend.
    pub fn from_config(config: &LookupConfig) -> Self {
        Self::new(config.build_service())
    }
}

impl<S: DefinitionService> Analyzer<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Analyzes a single handler file.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file cannot be read or parsed; every other problem is
    /// recorded as a [`Failure`] in the report.
    pub fn analyze_file(&self, path: &Path) -> Result<AnalysisReport> {
        info!("Analyzing file {}", path.display());
        let parsed = AstParser::parse_file(path)?;

        let lookups = CachedDefinitionService::new(&self.service);
        let resolver = TypeResolver::new(&lookups);
        let outcomes = Self::analyze_parsed(&parsed, &resolver);

        Ok(Self::accumulate(outcomes, Vec::new()))
    }

    /// Analyzes every script file directly inside `dir`.
    ///
    /// A file that fails to parse is recorded as a failure and the other files are still
    /// analyzed.
    ///
    /// # Errors
    ///
    /// Returns an error only if `dir` cannot be listed.
    pub fn analyze_folder(&self, dir: &Path) -> Result<AnalysisReport> {
        info!("Analyzing folder {}", dir.display());
        let scan = FileScanner::new(dir.to_path_buf()).scan()?;
        info!("Found {} handler files", scan.source_files.len());

        let lookups = CachedDefinitionService::new(&self.service);
        let resolver = TypeResolver::new(&lookups);

        let outcomes: Vec<Outcome> = scan
            .source_files
            .par_iter()
            .map(|path| match AstParser::parse_file(path) {
                Ok(parsed) => Self::analyze_parsed(&parsed, &resolver),
                Err(error) => vec![Err(Failure {
                    file: path.clone(),
                    line: None,
                    route: None,
                    error,
                })],
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();

        debug!("Answered {} distinct lookups", lookups.len());
        Ok(Self::accumulate(outcomes, scan.warnings))
    }

    fn analyze_parsed(file: &ParsedFile, resolver: &TypeResolver<'_>) -> Vec<Outcome> {
        let candidates: Vec<RouteCandidate<'_>> = route_candidates(file).collect();
        debug!(
            "{} route candidates in {}",
            candidates.len(),
            file.path.display()
        );

        candidates
            .par_iter()
            .filter_map(|candidate| {
                let (label, fragment) = match candidate {
                    RouteCandidate::NotARoute => return None,
                    RouteCandidate::Http(route) => (
                        http_label(route),
                        endpoint(route, &file.path, resolver).map(Fragment::Endpoint),
                    ),
                    RouteCandidate::Graph(route) => (
                        graph_label(route),
                        graph_field(route, &file.path, resolver).map(Fragment::GraphField),
                    ),
                };
                Some(fragment.map_err(|error| Failure {
                    file: file.path.clone(),
                    line: candidate.span().map(|span| span.start.line),
                    route: label,
                    error,
                }))
            })
            .collect()
    }

    fn accumulate(outcomes: Vec<Outcome>, warnings: Vec<String>) -> AnalysisReport {
        let mut accumulator = SchemaAccumulator::new();
        let mut failures = Vec::new();

        for outcome in outcomes {
            match outcome {
                Ok(Fragment::Endpoint(endpoint)) => accumulator.record(endpoint),
                Ok(Fragment::GraphField(field)) => accumulator.record_graph_field(field),
                Err(failure) => {
                    warn!("{}", failure);
                    failures.push(failure);
                }
            }
        }

        let emitted = accumulator.emit();
        AnalysisReport {
            api: emitted.api,
            graph: emitted.graph,
            failures,
            warnings,
        }
    }
}

fn http_label(route: &HttpRoute<'_>) -> Option<String> {
    route
        .options()
        .ok()
        .map(|options| format!("{} {}", options.method.as_str().to_uppercase(), options.path))
}

fn graph_label(route: &GraphRoute<'_>) -> Option<String> {
    route
        .options()
        .ok()
        .map(|options| format!("graph {}", options.type_name))
}

fn endpoint(
    route: &HttpRoute<'_>,
    file: &Path,
    resolver: &TypeResolver<'_>,
) -> Result<EndpointDescriptor> {
    let options = route.options()?;
    let content_type = route.content_type()?;
    let return_type = route.shape.return_type()?;

    let parameters = route
        .parameters()?
        .par_iter()
        .map(|located| {
            Ok(EndpointParameter {
                name: located.parameter.name.to_string(),
                location: located.location,
                required: located.parameter.required,
                schema: resolver.resolve(located.parameter.annotation, file)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let response_schema = resolver.resolve(return_type, file)?;

    Ok(EndpointDescriptor {
        method: options.method,
        path: options.path,
        parameters,
        response_schema,
        content_type: content_type.to_string(),
    })
}

fn graph_field(
    route: &GraphRoute<'_>,
    file: &Path,
    resolver: &TypeResolver<'_>,
) -> Result<GraphFieldDescriptor> {
    let options = route.options()?;
    let return_type = route.return_type()?;

    let parameters = route
        .parameters()?
        .par_iter()
        .map(|parameter| {
            Ok(GraphParameter {
                name: parameter.name.to_string(),
                schema: resolver.resolve(parameter.annotation, file)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let response_schema = resolver.resolve(return_type, file)?;

    Ok(GraphFieldDescriptor {
        type_name: options.type_name,
        is_mutation: options.is_mutation,
        parameters,
        response_schema,
    })
}
