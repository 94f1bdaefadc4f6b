use crate::ast::{SourceLocation, Span, Statement, TypeAliasDeclaration, TypeNode};
use crate::error::{AnalysisError, Result};
use crate::lookup::DefinitionService;
use crate::parser::AstParser;
use crate::schema_generator::{synthesize, Primitive, Schema};
use log::debug;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::Path;

/// A type alias together with the location it was found at.
#[derive(Debug, Clone)]
pub struct LocatedAlias {
    pub declaration: TypeAliasDeclaration,
    pub location: SourceLocation,
}

/// Definition resolver - walks type references to their alias declarations.
///
/// Each reference is looked up through the injected [`DefinitionService`], re-querying on
/// every answer until the service points back at the query. The declaration at that fixed
/// point is read from the target file.
pub struct TypeResolver<'s> {
    service: &'s dyn DefinitionService,
}

impl<'s> TypeResolver<'s> {
    pub fn new(service: &'s dyn DefinitionService) -> Self {
        Self { service }
    }

    /// Locates the alias declaration of the reference `name` written at `span` in `file`.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::DefinitionNotFound`] when the service has no answer or the target
    ///   file has no node at the answer
    /// - [`AnalysisError::UnsupportedDeclaration`] when the node found is not a type alias
    /// - [`AnalysisError::CyclicTypeReference`] when lookups revisit a location
    pub fn locate(&self, name: &str, span: Span, file: &Path) -> Result<LocatedAlias> {
        let mut query = SourceLocation::from_span(file, span);
        let mut hops = HashSet::new();

        let location = loop {
            if !hops.insert((query.file.clone(), query.start)) {
                return Err(AnalysisError::CyclicTypeReference {
                    name: name.to_string(),
                    location: query,
                });
            }
            let answer = self
                .service
                .lookup_definition(&query)?
                .ok_or_else(|| AnalysisError::DefinitionNotFound {
                    name: name.to_string(),
                    location: query.clone(),
                })?;
            if answer.is_same_point(&query) {
                break query;
            }
            debug!("`{}`: {} -> {}", name, query, answer);
            query = answer;
        };

        let target = AstParser::parse_file(&location.file)?;
        let statement = target
            .statements
            .into_iter()
            .find(|statement| statement.has_node_at(&location))
            .ok_or_else(|| AnalysisError::DefinitionNotFound {
                name: name.to_string(),
                location: location.clone(),
            })?;

        match unwrap_export(statement) {
            Statement::TypeAlias(declaration) => {
                debug!("Located `{}` as alias `{}` at {}", name, declaration.name, location);
                Ok(LocatedAlias {
                    declaration,
                    location,
                })
            }
            other => Err(AnalysisError::UnsupportedDeclaration {
                name: name.to_string(),
                reason: format!("{} is not a type alias", other.kind_name()),
            }),
        }
    }

    /// Resolves an annotation written in `file` to a schema.
    ///
    /// Primitive keywords map directly. A reference has its type arguments resolved in
    /// `file` first (in parallel), then its alias is located and synthesized with them.
    pub fn resolve(&self, node: &TypeNode, file: &Path) -> Result<Schema> {
        match node {
            TypeNode::Keyword { name, .. } => Primitive::from_keyword(name).map(Schema::Primitive),
            TypeNode::Reference {
                name,
                arguments,
                span,
            } => {
                let arguments = arguments
                    .par_iter()
                    .map(|argument| self.resolve(argument, file))
                    .collect::<Result<Vec<_>>>()?;

                let located = self.locate(name, *span, file)?;
                synthesize(&located.declaration, &arguments)
            }
            TypeNode::Object { fields, .. } => {
                let inline = TypeAliasDeclaration {
                    name: node.describe(),
                    name_span: node.span(),
                    type_parameters: Vec::new(),
                    body: TypeNode::Object {
                        fields: fields.clone(),
                        span: node.span(),
                    },
                    span: node.span(),
                };
                synthesize(&inline, &[])
            }
            TypeNode::Unsupported { kind, .. } => {
                Err(AnalysisError::UnknownPrimitiveType(kind.clone()))
            }
        }
    }
}

fn unwrap_export(statement: Statement) -> Statement {
    match statement {
        Statement::Export { declaration, .. } => unwrap_export(*declaration),
        other => other,
    }
}
