use crate::ast::{
    CallExpression, Expression, FunctionLiteral, FunctionParam, ImportBinding, ImportDeclaration,
    Literal, ObjectField, ObjectLiteral, Position, Property, Span, Statement,
    TypeAliasDeclaration, TypeNode,
};
use crate::error::{AnalysisError, Result};
use crate::scanner::read_source;
use log::debug;
use oxc_allocator::Allocator;
use oxc_ast::ast as js;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use std::path::{Path, PathBuf};

/// AST parser for annotated handler files.
///
/// Handler files are JavaScript modules with inline generic type annotations
/// (`(id: Path<number>): JSONResp<Pet> => ...`, `type Resp<T> = {...}`). That annotation
/// subset is valid TypeScript, so files are parsed with the oxc TypeScript grammar
/// regardless of their extension, then lowered into the owned tree in [`crate::ast`].
///
/// # Example
///
/// ```no_run
/// use swagger_from_flow::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("controllers/pets.js")).unwrap();
/// println!("Parsed {} statements", parsed.statements.len());
/// ```
pub struct AstParser;

/// A successfully parsed source file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// Top-level statements in source order
    pub statements: Vec<Statement>,
}

impl ParsedFile {
    /// Type aliases declared at the top level, including exported ones.
    pub fn type_aliases(&self) -> impl Iterator<Item = &TypeAliasDeclaration> {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::TypeAlias(alias) => Some(alias),
            Statement::Export { declaration, .. } => match declaration.as_ref() {
                Statement::TypeAlias(alias) => Some(alias),
                _ => None,
            },
            _ => None,
        })
    }

    pub fn find_alias(&self, name: &str) -> Option<&TypeAliasDeclaration> {
        self.type_aliases().find(|alias| alias.name == name)
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportDeclaration> {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::Import(import) => Some(import),
            _ => None,
        })
    }

    /// Finds the import that binds `local` in this file.
    pub fn find_import(&self, local: &str) -> Option<(&ImportDeclaration, &ImportBinding)> {
        self.imports().find_map(|import| {
            import
                .bindings
                .iter()
                .find(|binding| binding.local == local)
                .map(|binding| (import, binding))
        })
    }
}

impl AstParser {
    /// Reads and parses a single source file.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Io`] when the file cannot be read and
    /// [`AnalysisError::Parse`] when it does not parse.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let source = read_source(path)?;
        Self::parse_source(path, &source)
    }

    /// Parses in-memory source text as if it were read from `path`.
    pub fn parse_source(path: &Path, source: &str) -> Result<ParsedFile> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, source_type_for(path)).parse();

        if ret.panicked || !ret.errors.is_empty() {
            let diagnostics: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
            return Err(AnalysisError::parse_error(path.to_path_buf(), &diagnostics));
        }

        let lowering = Lowering {
            lines: LineIndex::new(source),
        };
        let statements = ret
            .program
            .body
            .iter()
            .map(|statement| lowering.statement(statement))
            .collect::<Vec<_>>();

        debug!(
            "Successfully parsed {} ({} statements)",
            path.display(),
            statements.len()
        );

        Ok(ParsedFile {
            path: path.to_path_buf(),
            statements,
        })
    }
}

/// TypeScript dialects keep their own flavour; plain script files use `.ts` rules so that
/// inline annotations parse.
fn source_type_for(path: &Path) -> SourceType {
    SourceType::from_path(path)
        .ok()
        .filter(|source_type| source_type.is_typescript())
        .unwrap_or_else(SourceType::ts)
}

/// Converts byte offsets into line/column positions.
struct LineIndex<'s> {
    source: &'s str,
    line_starts: Vec<usize>,
}

impl<'s> LineIndex<'s> {
    fn new(source: &'s str) -> Self {
        let mut line_starts = Vec::with_capacity(64);
        line_starts.push(0);
        for (idx, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self {
            source,
            line_starts,
        }
    }

    fn position(&self, offset: u32) -> Position {
        let offset = (offset as usize).min(self.source.len());
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        };
        let line_start = self.line_starts[idx];
        let column = self
            .source
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count());
        Position::new(idx as u32 + 1, column as u32)
    }
}

struct Lowering<'s> {
    lines: LineIndex<'s>,
}

impl Lowering<'_> {
    fn span(&self, span: oxc_span::Span) -> Span {
        Span::new(
            self.lines.position(span.start),
            self.lines.position(span.end),
        )
    }

    fn statement(&self, statement: &js::Statement<'_>) -> Statement {
        match statement {
            js::Statement::ExpressionStatement(expression) => Statement::Expression(
                self.expression(&expression.expression),
                self.span(expression.span),
            ),
            js::Statement::TSTypeAliasDeclaration(alias) => {
                Statement::TypeAlias(self.type_alias(alias))
            }
            js::Statement::ImportDeclaration(import) => Statement::Import(self.import(import)),
            js::Statement::ExportNamedDeclaration(export) => {
                let span = self.span(export.span);
                match &export.declaration {
                    Some(js::Declaration::TSTypeAliasDeclaration(alias)) => Statement::Export {
                        declaration: Box::new(Statement::TypeAlias(self.type_alias(alias))),
                        span,
                    },
                    Some(declaration) => Statement::Export {
                        declaration: Box::new(Statement::Other(self.span(declaration.span()))),
                        span,
                    },
                    // Re-export lists (`export {A} from './a'`) are not followed.
                    None => Statement::Other(span),
                }
            }
            other => Statement::Other(self.span(other.span())),
        }
    }

    fn expression(&self, expression: &js::Expression<'_>) -> Expression {
        match expression {
            js::Expression::CallExpression(call) => Expression::Call(CallExpression {
                callee: Box::new(self.expression(&call.callee)),
                arguments: call
                    .arguments
                    .iter()
                    .map(|argument| self.argument(argument))
                    .collect(),
                span: self.span(call.span),
            }),
            js::Expression::ArrowFunctionExpression(arrow) => Expression::Function(FunctionLiteral {
                params: self.params(&arrow.params),
                return_type: arrow
                    .return_type
                    .as_ref()
                    .map(|annotation| self.type_node(&annotation.type_annotation)),
                is_arrow: true,
                span: self.span(arrow.span),
            }),
            js::Expression::FunctionExpression(function) => Expression::Function(FunctionLiteral {
                params: self.params(&function.params),
                return_type: function
                    .return_type
                    .as_ref()
                    .map(|annotation| self.type_node(&annotation.type_annotation)),
                is_arrow: false,
                span: self.span(function.span),
            }),
            js::Expression::ObjectExpression(object) => Expression::Object(self.object(object)),
            js::Expression::StringLiteral(literal) => Expression::Literal(
                Literal::String(literal.value.to_string()),
                self.span(literal.span),
            ),
            js::Expression::BooleanLiteral(literal) => {
                Expression::Literal(Literal::Boolean(literal.value), self.span(literal.span))
            }
            js::Expression::NumericLiteral(literal) => {
                Expression::Literal(Literal::Number(literal.value), self.span(literal.span))
            }
            js::Expression::NullLiteral(literal) => {
                Expression::Literal(Literal::Null, self.span(literal.span))
            }
            js::Expression::Identifier(identifier) => {
                Expression::Identifier(identifier.name.to_string(), self.span(identifier.span))
            }
            js::Expression::ParenthesizedExpression(inner) => self.expression(&inner.expression),
            other => Expression::Other(self.span(other.span())),
        }
    }

    fn argument(&self, argument: &js::Argument<'_>) -> Expression {
        match argument.as_expression() {
            Some(expression) => self.expression(expression),
            // spread arguments
            None => Expression::Other(self.span(argument.span())),
        }
    }

    fn object(&self, object: &js::ObjectExpression<'_>) -> ObjectLiteral {
        let properties = object
            .properties
            .iter()
            .map(|property| match property {
                js::ObjectPropertyKind::ObjectProperty(property) => Property {
                    key: if property.computed {
                        None
                    } else {
                        property.key.static_name().map(|name| name.to_string())
                    },
                    value: self.expression(&property.value),
                    span: self.span(property.span),
                },
                js::ObjectPropertyKind::SpreadProperty(spread) => Property {
                    key: None,
                    value: Expression::Other(self.span(spread.span)),
                    span: self.span(spread.span),
                },
            })
            .collect();

        ObjectLiteral {
            properties,
            span: self.span(object.span),
        }
    }

    fn params(&self, params: &js::FormalParameters<'_>) -> Vec<FunctionParam> {
        params
            .items
            .iter()
            .map(|param| {
                let pattern = &param.pattern;
                FunctionParam {
                    name: match &pattern.kind {
                        js::BindingPatternKind::BindingIdentifier(identifier) => {
                            Some(identifier.name.to_string())
                        }
                        _ => None,
                    },
                    optional: pattern.optional,
                    type_annotation: pattern
                        .type_annotation
                        .as_ref()
                        .map(|annotation| self.type_node(&annotation.type_annotation)),
                    span: self.span(param.span),
                }
            })
            .collect()
    }

    fn type_alias(&self, alias: &js::TSTypeAliasDeclaration<'_>) -> TypeAliasDeclaration {
        TypeAliasDeclaration {
            name: alias.id.name.to_string(),
            name_span: self.span(alias.id.span),
            type_parameters: alias
                .type_parameters
                .as_ref()
                .map(|declaration| {
                    declaration
                        .params
                        .iter()
                        .map(|param| param.name.name.to_string())
                        .collect()
                })
                .unwrap_or_default(),
            body: self.type_node(&alias.type_annotation),
            span: self.span(alias.span),
        }
    }

    fn import(&self, import: &js::ImportDeclaration<'_>) -> ImportDeclaration {
        let bindings = import
            .specifiers
            .iter()
            .flatten()
            .map(|specifier| match specifier {
                js::ImportDeclarationSpecifier::ImportSpecifier(specifier) => ImportBinding {
                    imported: specifier.imported.name().to_string(),
                    local: specifier.local.name.to_string(),
                    local_span: self.span(specifier.local.span),
                },
                js::ImportDeclarationSpecifier::ImportDefaultSpecifier(specifier) => ImportBinding {
                    imported: "default".to_string(),
                    local: specifier.local.name.to_string(),
                    local_span: self.span(specifier.local.span),
                },
                js::ImportDeclarationSpecifier::ImportNamespaceSpecifier(specifier) => {
                    ImportBinding {
                        imported: "*".to_string(),
                        local: specifier.local.name.to_string(),
                        local_span: self.span(specifier.local.span),
                    }
                }
            })
            .collect();

        ImportDeclaration {
            source: import.source.value.to_string(),
            bindings,
            span: self.span(import.span),
        }
    }

    fn type_node(&self, ty: &js::TSType<'_>) -> TypeNode {
        let span = self.span(ty.span());
        let keyword = |name: &str| TypeNode::Keyword {
            name: name.to_string(),
            span,
        };
        match ty {
            js::TSType::TSBooleanKeyword(_) => keyword("boolean"),
            js::TSType::TSStringKeyword(_) => keyword("string"),
            js::TSType::TSNumberKeyword(_) => keyword("number"),
            js::TSType::TSNullKeyword(_) => keyword("null"),
            js::TSType::TSAnyKeyword(_) => keyword("any"),
            js::TSType::TSUnknownKeyword(_) => keyword("unknown"),
            js::TSType::TSVoidKeyword(_) => keyword("void"),
            js::TSType::TSUndefinedKeyword(_) => keyword("undefined"),
            js::TSType::TSNeverKeyword(_) => keyword("never"),
            js::TSType::TSObjectKeyword(_) => keyword("object"),
            js::TSType::TSBigIntKeyword(_) => keyword("bigint"),
            js::TSType::TSSymbolKeyword(_) => keyword("symbol"),
            js::TSType::TSTypeReference(reference) => TypeNode::Reference {
                name: type_name(&reference.type_name),
                arguments: reference
                    .type_arguments
                    .as_ref()
                    .map(|arguments| {
                        arguments
                            .params
                            .iter()
                            .map(|argument| self.type_node(argument))
                            .collect()
                    })
                    .unwrap_or_default(),
                span,
            },
            js::TSType::TSTypeLiteral(literal) => TypeNode::Object {
                fields: literal
                    .members
                    .iter()
                    .filter_map(|member| match member {
                        js::TSSignature::TSPropertySignature(property) => {
                            Some(self.object_field(property))
                        }
                        _ => None,
                    })
                    .collect(),
                span,
            },
            js::TSType::TSUnionType(_) => TypeNode::Unsupported {
                kind: "union type".to_string(),
                span,
            },
            js::TSType::TSArrayType(_) => TypeNode::Unsupported {
                kind: "array type".to_string(),
                span,
            },
            js::TSType::TSLiteralType(_) => TypeNode::Unsupported {
                kind: "literal type".to_string(),
                span,
            },
            _ => TypeNode::Unsupported {
                kind: "type expression".to_string(),
                span,
            },
        }
    }

    fn object_field(&self, property: &js::TSPropertySignature<'_>) -> ObjectField {
        let span = self.span(property.span);
        ObjectField {
            name: property
                .key
                .static_name()
                .map(|name| name.to_string())
                .unwrap_or_default(),
            optional: property.optional,
            type_node: property
                .type_annotation
                .as_ref()
                .map(|annotation| self.type_node(&annotation.type_annotation))
                .unwrap_or(TypeNode::Unsupported {
                    kind: "missing annotation".to_string(),
                    span,
                }),
            span,
        }
    }
}

fn type_name(name: &js::TSTypeName<'_>) -> String {
    match name {
        js::TSTypeName::IdentifierReference(identifier) => identifier.name.to_string(),
        js::TSTypeName::QualifiedName(qualified) => {
            format!("{}.{}", type_name(&qualified.left), qualified.right.name)
        }
        #[allow(unreachable_patterns)]
        _ => "this".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    /// Helper function to create a temporary file with content
    fn create_temp_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        let mut file = fs::File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file_path
    }

    const CONTROLLER: &str = r#"// @flow
import type {Headers, Path, JSONResp} from './types';
import type {Pet} from './model.js';

type Resp<T> = {
  success: boolean,
  data: T
};

route({method: 'GET', path: '/pet/:id'})((id: Path<number>, token: Headers<string>): JSONResp<Resp<Pet>> => {
  return {success: true, data: {name: 'Bob', id: 12}};
});
"#;

    #[test]
    fn test_parse_annotated_controller() {
        let parsed = AstParser::parse_source(Path::new("controller.js"), CONTROLLER).unwrap();

        assert_eq!(parsed.statements.len(), 4);
        assert_eq!(parsed.imports().count(), 2);

        let resp = parsed.find_alias("Resp").unwrap();
        assert_eq!(resp.type_parameters, vec!["T"]);
        assert_eq!(resp.name_span.start, Position::new(5, 5));
        match &resp.body {
            TypeNode::Object { fields, .. } => {
                let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["success", "data"]);
            }
            other => panic!("Expected object body, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_route_call_shape() {
        let parsed = AstParser::parse_source(Path::new("controller.js"), CONTROLLER).unwrap();

        let Statement::Expression(Expression::Call(call), _) = &parsed.statements[3] else {
            panic!("Expected a call expression statement");
        };
        assert_eq!(call.arguments.len(), 1);

        let Expression::Function(handler) = &call.arguments[0] else {
            panic!("Expected a function literal argument");
        };
        assert!(handler.is_arrow);
        let names: Vec<_> = handler.params.iter().map(|p| p.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["id", "token"]);
        assert_eq!(
            handler.return_type.as_ref().unwrap().describe(),
            "JSONResp<Resp<Pet>>"
        );
        let return_type = handler.return_type.as_ref().unwrap();
        assert_eq!(return_type.span().start, Position::new(10, 85));

        let Expression::Call(options_call) = call.callee.as_ref() else {
            panic!("Expected curried call");
        };
        let Expression::Object(options) = &options_call.arguments[0] else {
            panic!("Expected object literal options");
        };
        assert_eq!(options.first_key(), Some("method"));
        assert!(matches!(
            &options.properties[1].value,
            Expression::Literal(Literal::String(path), _) if path == "/pet/:id"
        ));
    }

    #[test]
    fn test_parse_imports_and_exports() {
        let source = r#"
export type Headers<T> = T;
export const helper = 1;
import {route as r} from './app';
"#;
        let parsed = AstParser::parse_source(Path::new("types.js"), source).unwrap();

        let headers = parsed.find_alias("Headers").unwrap();
        assert_eq!(headers.name_span.start, Position::new(2, 12));
        assert!(matches!(&headers.body, TypeNode::Reference { name, .. } if name == "T"));

        assert!(matches!(
            &parsed.statements[1],
            Statement::Export { declaration, .. }
                if matches!(declaration.as_ref(), Statement::Other(_))
        ));

        let (import, binding) = parsed.find_import("r").unwrap();
        assert_eq!(import.source, "./app");
        assert_eq!(binding.imported, "route");
    }

    #[test]
    fn test_parse_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = create_temp_file(&temp_dir, "broken.js", "route({method: 'GET'}((: => {");

        let result = AstParser::parse_file(&file_path);

        assert!(matches!(result, Err(AnalysisError::Parse { .. })));
    }

    #[test]
    fn test_parse_nonexistent_file() {
        let result = AstParser::parse_file(Path::new("/nonexistent/controller.js"));

        assert!(matches!(result, Err(AnalysisError::Io { .. })));
    }

    #[test]
    fn test_unsupported_annotations_are_kept() {
        let source = "type Mixed = { tags: string[], state: 'on' | 'off', any: any };";
        let parsed = AstParser::parse_source(Path::new("mixed.ts"), source).unwrap();

        let TypeNode::Object { fields, .. } = &parsed.find_alias("Mixed").unwrap().body else {
            panic!("Expected object body");
        };
        assert!(matches!(
            &fields[0].type_node,
            TypeNode::Unsupported { kind, .. } if kind == "array type"
        ));
        assert!(matches!(
            &fields[1].type_node,
            TypeNode::Unsupported { kind, .. } if kind == "union type"
        ));
        assert!(matches!(&fields[2].type_node, TypeNode::Keyword { name, .. } if name == "any"));
    }
}
