//! Route-expression matching for annotated handler files.
//!
//! A route is declared as a curried call whose first call takes an options object literal
//! and whose second call takes the annotated handler function:
//!
//! ```text
//! route({method: 'GET', path: '/pet/:id'})((id: Path<number>): JSONResp<Pet> => ...)
//! GraphQLResolver({typeName: 'pet'})((id: number): Pet => ...)
//! ```
//!
//! Each top-level statement is classified into a [`RouteCandidate`] by trying the
//! [`RouteMatcher`] implementations in priority order: HTTP first, then graph.
//!
//! # Supported Route Kinds
//!
//! - **HTTP endpoints**: See [`http::HttpMatcher`]
//! - **Graph fields**: See [`graph::GraphMatcher`]
//!
//! # Example
//!
//! ```no_run
//! use swagger_from_flow::extractor::route_candidates;
//! use swagger_from_flow::parser::AstParser;
//! use std::path::Path;
//!
//! let parsed = AstParser::parse_file(Path::new("controllers/pets.js")).unwrap();
//! let routes: Vec<_> = route_candidates(&parsed).collect();
//! println!("Found {} routes", routes.len());
//! ```

pub mod graph;
pub mod http;

use crate::ast::{
    Expression, FunctionLiteral, Literal, ObjectLiteral, Span, Statement, TypeNode,
};
use crate::error::{AnalysisError, Result};
use crate::parser::ParsedFile;
use log::debug;

pub use graph::{GraphMatcher, GraphRoute, GraphRouteOptions};
pub use http::{HttpMatcher, HttpMethod, HttpRoute, HttpRouteOptions, ParameterLocation};

/// Outcome of classifying one top-level statement.
#[derive(Debug, Clone)]
pub enum RouteCandidate<'a> {
    NotARoute,
    Http(HttpRoute<'a>),
    Graph(GraphRoute<'a>),
}

impl RouteCandidate<'_> {
    /// Span of the statement the candidate was read from.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::NotARoute => None,
            Self::Http(route) => Some(route.shape.span),
            Self::Graph(route) => Some(route.shape.span),
        }
    }
}

/// Structural part shared by every route kind: `callee(options)(handler)`.
#[derive(Debug, Clone, Copy)]
pub struct RouteShape<'a> {
    /// The options object literal given to the first call
    pub options: &'a ObjectLiteral,
    /// The annotated handler given to the second call
    pub handler: &'a FunctionLiteral,
    /// Span of the whole statement
    pub span: Span,
}

impl<'a> RouteShape<'a> {
    /// Matches the curried call shape on a bare expression statement.
    pub fn from_statement(statement: &'a Statement) -> Option<Self> {
        let Statement::Expression(Expression::Call(outer), span) = statement else {
            return None;
        };
        let [Expression::Function(handler)] = outer.arguments.as_slice() else {
            return None;
        };
        let Expression::Call(inner) = outer.callee.as_ref() else {
            return None;
        };
        let [Expression::Object(options)] = inner.arguments.as_slice() else {
            return None;
        };

        Some(Self {
            options,
            handler,
            span: *span,
        })
    }

    /// Annotated handler parameters, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::EndpointShape`] for a destructured or unannotated parameter.
    pub fn parameters(&self) -> Result<Vec<HandlerParameter<'a>>> {
        self.handler
            .params
            .iter()
            .enumerate()
            .map(|(index, param)| {
                let name = param.name.as_deref().ok_or_else(|| {
                    AnalysisError::EndpointShape(format!(
                        "parameter #{} must be a plain identifier",
                        index + 1
                    ))
                })?;
                let annotation = param.type_annotation.as_ref().ok_or_else(|| {
                    AnalysisError::EndpointShape(format!(
                        "parameter `{}` has no type annotation",
                        name
                    ))
                })?;
                Ok(HandlerParameter {
                    name,
                    required: !param.optional,
                    annotation,
                })
            })
            .collect()
    }

    /// The handler's return annotation.
    pub fn return_type(&self) -> Result<&'a TypeNode> {
        self.handler
            .return_type
            .as_ref()
            .ok_or_else(|| AnalysisError::EndpointShape("handler has no return annotation".into()))
    }
}

/// One annotated handler parameter.
#[derive(Debug, Clone, Copy)]
pub struct HandlerParameter<'a> {
    pub name: &'a str,
    pub required: bool,
    pub annotation: &'a TypeNode,
}

/// Classifies a matched [`RouteShape`] as one route kind.
///
/// Implementations return `None` when the shape is not theirs, letting the next matcher
/// in priority order try.
pub trait RouteMatcher: Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    fn match_shape<'a>(&self, shape: RouteShape<'a>) -> Option<RouteCandidate<'a>>;
}

/// Matchers in priority order.
static MATCHERS: &[&dyn RouteMatcher] = &[&HttpMatcher, &GraphMatcher];

/// Classifies a single top-level statement.
pub fn classify(statement: &Statement) -> RouteCandidate<'_> {
    let Some(shape) = RouteShape::from_statement(statement) else {
        return RouteCandidate::NotARoute;
    };

    MATCHERS
        .iter()
        .find_map(|matcher| {
            let candidate = matcher.match_shape(shape);
            if candidate.is_some() {
                debug!("Statement at {} matched as {} route", shape.span.start, matcher.name());
            }
            candidate
        })
        .unwrap_or(RouteCandidate::NotARoute)
}

/// Lazily yields the route candidates of a parsed file, in source order.
pub fn route_candidates(file: &ParsedFile) -> impl Iterator<Item = RouteCandidate<'_>> + '_ {
    file.statements.iter().filter_map(|statement| match classify(statement) {
        RouteCandidate::NotARoute => {
            debug!(
                "Skipping {} statement at {}:{}",
                statement.kind_name(),
                file.path.display(),
                statement.span().start
            );
            None
        }
        candidate => Some(candidate),
    })
}

/// Literal key/value pairs of a route options object, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOptions {
    entries: Vec<(String, Literal)>,
}

impl RouteOptions {
    /// Reads every property of the options literal.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnsupportedInput`] for a computed key, a spread, or a value
    /// that is not a literal.
    pub fn from_literal(object: &ObjectLiteral) -> Result<Self> {
        let entries = object
            .properties
            .iter()
            .map(|property| {
                let key = property.key.clone().ok_or_else(|| {
                    AnalysisError::UnsupportedInput(format!(
                        "route option at {} must have a static key",
                        property.span.start
                    ))
                })?;
                match &property.value {
                    Expression::Literal(literal, _) => Ok((key, literal.clone())),
                    _ => Err(AnalysisError::UnsupportedInput(format!(
                        "route option `{}` must be a literal value",
                        key
                    ))),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&Literal> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// String value of `key`; an absent key or a non-string value is an endpoint-shape error.
    pub fn require_str(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(Literal::String(value)) => Ok(value),
            Some(other) => Err(AnalysisError::EndpointShape(format!(
                "route option `{}` must be a string, found {:?}",
                key, other
            ))),
            None => Err(AnalysisError::EndpointShape(format!(
                "route option `{}` is missing",
                key
            ))),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            Some(Literal::Boolean(value)) => Ok(Some(*value)),
            Some(other) => Err(AnalysisError::EndpointShape(format!(
                "route option `{}` must be a boolean, found {:?}",
                key, other
            ))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::AstParser;
    use std::path::Path;

    fn parse(source: &str) -> ParsedFile {
        AstParser::parse_source(Path::new("routes.js"), source).unwrap()
    }

    #[test]
    fn test_classify_http_and_graph_routes() {
        let file = parse(
            r#"
route({method: 'GET', path: '/pet/:id'})((id: Path<number>): JSONResp<Pet> => null);
GraphQLResolver({typeName: 'pet'})((id: number): Pet => null);
GraphQLResolver({isMutation: true, typeName: 'addPet'})(function (name: string): Pet { return null; });
"#,
        );

        let kinds: Vec<&str> = file
            .statements
            .iter()
            .map(|statement| match classify(statement) {
                RouteCandidate::NotARoute => "none",
                RouteCandidate::Http(_) => "http",
                RouteCandidate::Graph(_) => "graph",
            })
            .collect();

        assert_eq!(kinds, vec!["http", "graph", "graph"]);
    }

    #[test]
    fn test_non_routes_are_skipped() {
        let file = parse(
            r#"
const x = 1;
console.log('hello');
route({method: 'GET', path: '/a'})((id: number) => null);
route({method: 'GET', path: '/b'})((id: number): Promise<number> => null);
route({method: 'GET', path: '/c'}, 1)((id: number): JSONResp<number> => null);
helper((id: number): JSONResp<number> => null);
route(opts)((id: number): JSONResp<number> => null);
type A = { a: string };
"#,
        );

        assert_eq!(route_candidates(&file).count(), 0);
    }

    #[test]
    fn test_http_takes_priority_over_graph() {
        let file = parse("route({typeName: 'x'})((): JSONResp<number> => null);");

        assert!(matches!(
            classify(&file.statements[0]),
            RouteCandidate::Http(_)
        ));
    }

    #[test]
    fn test_parameters_keep_order_and_optionality() {
        let file = parse(
            "route({method: 'GET', path: '/a'})((b: Path<number>, a?: QueryString<string>): JSONResp<number> => null);",
        );
        let shape = RouteShape::from_statement(&file.statements[0]).unwrap();

        let params = shape.parameters().unwrap();

        let summary: Vec<(&str, bool, String)> = params
            .iter()
            .map(|p| (p.name, p.required, p.annotation.describe()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("b", true, "Path<number>".to_string()),
                ("a", false, "QueryString<string>".to_string()),
            ]
        );
    }

    #[test]
    fn test_unannotated_parameter_is_shape_error() {
        let file = parse("route({method: 'GET', path: '/a'})((id): JSONResp<number> => null);");
        let shape = RouteShape::from_statement(&file.statements[0]).unwrap();

        assert!(matches!(
            shape.parameters(),
            Err(AnalysisError::EndpointShape(_))
        ));
    }

    #[test]
    fn test_options_must_be_literals() {
        let file = parse("route({method: METHOD, path: '/a'})((): JSONResp<number> => null);");
        let shape = RouteShape::from_statement(&file.statements[0]).unwrap();

        let err = RouteOptions::from_literal(shape.options).unwrap_err();

        assert_eq!(err.kind(), "unsupported-input");
    }

    #[test]
    fn test_options_accessors() {
        let file = parse(
            "route({method: 'GET', isMutation: false, path: 5})((): JSONResp<number> => null);",
        );
        let shape = RouteShape::from_statement(&file.statements[0]).unwrap();
        let options = RouteOptions::from_literal(shape.options).unwrap();

        assert_eq!(options.require_str("method").unwrap(), "GET");
        assert_eq!(options.get_bool("isMutation").unwrap(), Some(false));
        assert_eq!(options.get_bool("other").unwrap(), None);
        assert!(options.require_str("path").is_err());
        assert!(options.require_str("missing").is_err());
        assert!(options.get_bool("method").is_err());
    }
}
