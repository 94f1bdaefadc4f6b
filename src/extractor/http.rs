use super::{HandlerParameter, RouteCandidate, RouteMatcher, RouteOptions, RouteShape};
use crate::error::{AnalysisError, Result};
use std::fmt;
use std::str::FromStr;

/// Parameter wrapper names and the request location each one maps to.
pub const PARAMETER_WRAPPERS: &[(&str, ParameterLocation)] = &[
    ("Headers", ParameterLocation::Header),
    ("QueryString", ParameterLocation::Query),
    ("Path", ParameterLocation::Path),
    ("Form", ParameterLocation::Form),
    ("JSONBody", ParameterLocation::Body),
];

/// Response wrapper names and the content type each one implies.
pub const RESPONSE_WRAPPERS: &[(&str, &str)] = &[("JSONResp", "application/json")];

/// True for every alias that only tags its single type argument.
pub fn is_service_wrapper(name: &str) -> bool {
    PARAMETER_WRAPPERS.iter().any(|(wrapper, _)| *wrapper == name)
        || RESPONSE_WRAPPERS.iter().any(|(wrapper, _)| *wrapper == name)
}

/// Content type implied by a response wrapper name.
pub fn content_type_for(wrapper: &str) -> Option<&'static str> {
    RESPONSE_WRAPPERS
        .iter()
        .find(|(name, _)| *name == wrapper)
        .map(|(_, content_type)| *content_type)
}

/// HTTP methods accepted in a route's `method` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    /// Lowercase name, as used for operation keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "delete" => Ok(HttpMethod::Delete),
            "patch" => Ok(HttpMethod::Patch),
            "options" => Ok(HttpMethod::Options),
            "head" => Ok(HttpMethod::Head),
            _ => Err(AnalysisError::EndpointShape(format!(
                "unknown HTTP method `{}`",
                s
            ))),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter is read from in an HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Body,
    Form,
}

impl ParameterLocation {
    /// Maps a parameter wrapper name (`Headers`, `Path`, ...) to its location.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnknownWrapperType`] for any other name.
    pub fn from_wrapper(name: &str) -> Result<Self> {
        PARAMETER_WRAPPERS
            .iter()
            .find(|(wrapper, _)| *wrapper == name)
            .map(|(_, location)| *location)
            .ok_or_else(|| AnalysisError::UnknownWrapperType(name.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Path => "path",
            ParameterLocation::Body => "body",
            ParameterLocation::Form => "form",
        }
    }
}

/// Matches `route({method, path})((...): JSONResp<T> => ...)`.
pub struct HttpMatcher;

impl RouteMatcher for HttpMatcher {
    fn name(&self) -> &'static str {
        "http"
    }

    fn match_shape<'a>(&self, shape: RouteShape<'a>) -> Option<RouteCandidate<'a>> {
        let wrapper = shape.handler.return_type.as_ref()?.outer_name()?;
        content_type_for(wrapper)?;
        Some(RouteCandidate::Http(HttpRoute { shape }))
    }
}

/// An HTTP endpoint candidate.
#[derive(Debug, Clone, Copy)]
pub struct HttpRoute<'a> {
    pub shape: RouteShape<'a>,
}

/// The `method` and `path` options of an HTTP route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRouteOptions {
    pub method: HttpMethod,
    pub path: String,
}

/// A handler parameter with its request location.
#[derive(Debug, Clone, Copy)]
pub struct LocatedParameter<'a> {
    pub parameter: HandlerParameter<'a>,
    pub location: ParameterLocation,
}

impl<'a> HttpRoute<'a> {
    pub fn options(&self) -> Result<HttpRouteOptions> {
        let options = RouteOptions::from_literal(self.shape.options)?;
        let method = options.require_str("method")?.parse()?;
        let path = options.require_str("path")?.to_string();
        Ok(HttpRouteOptions { method, path })
    }

    /// Parameters with the location read off each annotation's outer wrapper.
    pub fn parameters(&self) -> Result<Vec<LocatedParameter<'a>>> {
        self.shape
            .parameters()?
            .into_iter()
            .map(|parameter| {
                let wrapper = parameter.annotation.outer_name().ok_or_else(|| {
                    AnalysisError::UnknownWrapperType(parameter.annotation.describe())
                })?;
                Ok(LocatedParameter {
                    parameter,
                    location: ParameterLocation::from_wrapper(wrapper)?,
                })
            })
            .collect()
    }

    /// Content type implied by the return wrapper.
    pub fn content_type(&self) -> Result<&'static str> {
        let return_type = self.shape.return_type()?;
        return_type
            .outer_name()
            .and_then(content_type_for)
            .ok_or_else(|| AnalysisError::UnknownWrapperType(return_type.describe()))
    }
}
