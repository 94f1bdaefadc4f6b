use super::{HandlerParameter, RouteCandidate, RouteMatcher, RouteOptions, RouteShape};
use crate::ast::TypeNode;
use crate::error::Result;

/// Option keys that mark a graph resolver when they come first.
const GRAPH_OPTION_KEYS: &[&str] = &["typeName", "isMutation"];

/// Matches `GraphQLResolver({typeName, isMutation?})((...): T => ...)`.
pub struct GraphMatcher;

impl RouteMatcher for GraphMatcher {
    fn name(&self) -> &'static str {
        "graph"
    }

    fn match_shape<'a>(&self, shape: RouteShape<'a>) -> Option<RouteCandidate<'a>> {
        shape.handler.return_type.as_ref()?;
        let first_key = shape.options.first_key()?;
        GRAPH_OPTION_KEYS
            .contains(&first_key)
            .then_some(RouteCandidate::Graph(GraphRoute { shape }))
    }
}

/// A graph field resolver candidate.
#[derive(Debug, Clone, Copy)]
pub struct GraphRoute<'a> {
    pub shape: RouteShape<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRouteOptions {
    pub type_name: String,
    pub is_mutation: bool,
}

impl<'a> GraphRoute<'a> {
    pub fn options(&self) -> Result<GraphRouteOptions> {
        let options = RouteOptions::from_literal(self.shape.options)?;
        Ok(GraphRouteOptions {
            type_name: options.require_str("typeName")?.to_string(),
            is_mutation: options.get_bool("isMutation")?.unwrap_or(false),
        })
    }

    pub fn parameters(&self) -> Result<Vec<HandlerParameter<'a>>> {
        self.shape.parameters()
    }

    pub fn return_type(&self) -> Result<&'a TypeNode> {
        self.shape.return_type()
    }
}
