use std::path::PathBuf;

use thiserror::Error;

use crate::ast::SourceLocation;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Error kinds produced while analyzing annotated handler files.
///
/// Apart from `Io` and `Parse` on the root input, every variant is scoped to a single
/// route candidate: the analyzer records it as a failure and carries on.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A source file or directory could not be read.
    #[error("failed to read '{path}': {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Source text does not parse.
    #[error("failed to parse '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    /// A recognized candidate is missing `method`, `path`, `typeName` or similar.
    #[error("malformed route declaration: {0}")]
    EndpointShape(String),

    /// Route options must be literal strings or booleans.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// The lookup chain or the target file did not yield a declaration.
    #[error("definition not found for `{name}` at {location}")]
    DefinitionNotFound {
        name: String,
        location: SourceLocation,
    },

    /// The declaration found is not a usable type alias.
    #[error("unsupported declaration `{name}`: {reason}")]
    UnsupportedDeclaration { name: String, reason: String },

    /// A type keyword outside the boolean/string/number/null table.
    #[error("unknown primitive type `{0}`")]
    UnknownPrimitiveType(String),

    /// A parameter or response wrapper missing from the fixed wrapper tables.
    #[error("unknown wrapper type `{0}`")]
    UnknownWrapperType(String),

    /// The definition lookup subprocess failed or timed out.
    #[error("definition lookup `{command}` failed: {message}")]
    ExternalProcess { command: String, message: String },

    /// Alias resolution came back to a location it had already visited.
    #[error("cyclic type reference through `{name}` at {location}")]
    CyclicTypeReference {
        name: String,
        location: SourceLocation,
    },
}

impl AnalysisError {
    /// Helper to create a parse error from multiple diagnostic strings.
    pub fn parse_error(path: PathBuf, diagnostics: &[String]) -> Self {
        let message = diagnostics.join("; ");
        Self::Parse { path, message }
    }

    /// Short stable name of the error kind, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io-error",
            Self::Parse { .. } => "parse-error",
            Self::EndpointShape(_) => "endpoint-shape-error",
            Self::UnsupportedInput(_) => "unsupported-input",
            Self::DefinitionNotFound { .. } => "definition-not-found",
            Self::UnsupportedDeclaration { .. } => "unsupported-declaration",
            Self::UnknownPrimitiveType(_) => "unknown-primitive-type",
            Self::UnknownWrapperType(_) => "unknown-wrapper-type",
            Self::ExternalProcess { .. } => "external-process-failure",
            Self::CyclicTypeReference { .. } => "cyclic-type-reference",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Position;

    #[test]
    fn test_parse_error_joins_diagnostics() {
        let err = AnalysisError::parse_error(
            PathBuf::from("routes.js"),
            &["unexpected token".to_string(), "missing `)`".to_string()],
        );

        assert_eq!(err.kind(), "parse-error");
        assert_eq!(
            err.to_string(),
            "failed to parse 'routes.js': unexpected token; missing `)`"
        );
    }

    #[test]
    fn test_display_includes_location() {
        let location = SourceLocation::new(
            PathBuf::from("model.js"),
            Position::new(3, 13),
            Position::new(3, 16),
        );
        let err = AnalysisError::DefinitionNotFound {
            name: "Pet".to_string(),
            location,
        };

        assert_eq!(err.kind(), "definition-not-found");
        assert_eq!(
            err.to_string(),
            "definition not found for `Pet` at model.js:3:13,3:16"
        );
    }
}
