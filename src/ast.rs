//! Owned syntax tree for annotated handler files.
//!
//! The parser lowers the arena-allocated oxc AST into these plain, owned nodes. Only the
//! shapes the analysis cares about get their own variant (calls, function literals,
//! object literals, literals, type annotations, type aliases, imports, exports); the rest
//! collapse into `Other` variants that only keep their span.
//!
//! Lines are 1-based everywhere. AST columns are 0-based, while [`SourceLocation`] (the
//! address format of definition lookups) uses 1-based columns.

use std::fmt;
use std::path::{Path, PathBuf};

/// A line/column point in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Start and end of an AST node, with 0-based columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// A span in a specific file, addressed with 1-based columns.
///
/// This is the request/response format of the definition lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub start: Position,
    pub end: Position,
}

impl SourceLocation {
    pub fn new(file: PathBuf, start: Position, end: Position) -> Self {
        debug_assert!(start <= end, "location start must not follow its end");
        Self { file, start, end }
    }

    /// Converts an AST span into lookup coordinates by shifting columns by one.
    pub fn from_span(file: &Path, span: Span) -> Self {
        Self::new(
            file.to_path_buf(),
            Position::new(span.start.line, span.start.column + 1),
            Position::new(span.end.line, span.end.column + 1),
        )
    }

    /// True when both locations start at the same point of the same file.
    pub fn is_same_point(&self, other: &SourceLocation) -> bool {
        self.file == other.file && self.start == other.start
    }

    /// True when an AST node starting at `span` begins exactly at this location.
    pub fn matches_span(&self, span: Span) -> bool {
        span.start.line == self.start.line && span.start.column + 1 == self.start.column
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{},{}:{}",
            self.file.display(),
            self.start.line,
            self.start.column,
            self.end.line,
            self.end.column
        )
    }
}

/// A top-level statement.
#[derive(Debug, Clone)]
pub enum Statement {
    /// A bare expression statement.
    Expression(Expression, Span),
    TypeAlias(TypeAliasDeclaration),
    Import(ImportDeclaration),
    /// `export <declaration>`; the inner statement is `Other` unless it is a type alias.
    Export {
        declaration: Box<Statement>,
        span: Span,
    },
    Other(Span),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Expression(_, span) => *span,
            Statement::TypeAlias(alias) => alias.span,
            Statement::Import(import) => import.span,
            Statement::Export { span, .. } => *span,
            Statement::Other(span) => *span,
        }
    }

    /// Human-readable statement kind for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Expression(..) => "expression statement",
            Statement::TypeAlias(_) => "type alias",
            Statement::Import(_) => "import declaration",
            Statement::Export { .. } => "export declaration",
            Statement::Other(_) => "statement",
        }
    }

    /// Visits every type annotation node reachable from this statement, outermost first.
    pub fn walk_types<'a>(&'a self, visit: &mut dyn FnMut(&'a TypeNode)) {
        match self {
            Statement::Expression(expression, _) => expression.walk_types(visit),
            Statement::TypeAlias(alias) => alias.body.walk(visit),
            Statement::Export { declaration, .. } => declaration.walk_types(visit),
            Statement::Import(_) | Statement::Other(_) => {}
        }
    }

    /// True when this statement, or a node inside it, starts exactly at `location`.
    pub fn has_node_at(&self, location: &SourceLocation) -> bool {
        if location.matches_span(self.span()) {
            return true;
        }
        match self {
            Statement::TypeAlias(alias) => {
                if location.matches_span(alias.name_span) {
                    return true;
                }
            }
            Statement::Import(import) => {
                if import
                    .bindings
                    .iter()
                    .any(|binding| location.matches_span(binding.local_span))
                {
                    return true;
                }
            }
            Statement::Export { declaration, .. } => return declaration.has_node_at(location),
            Statement::Expression(..) | Statement::Other(_) => {}
        }
        let mut found = false;
        self.walk_types(&mut |node| found |= location.matches_span(node.span()));
        found
    }
}

/// The subset of expressions the route matcher understands.
#[derive(Debug, Clone)]
pub enum Expression {
    Call(CallExpression),
    Function(FunctionLiteral),
    Object(ObjectLiteral),
    Literal(Literal, Span),
    Identifier(String, Span),
    Other(Span),
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Call(call) => call.span,
            Expression::Function(function) => function.span,
            Expression::Object(object) => object.span,
            Expression::Literal(_, span) | Expression::Identifier(_, span) => *span,
            Expression::Other(span) => *span,
        }
    }

    fn walk_types<'a>(&'a self, visit: &mut dyn FnMut(&'a TypeNode)) {
        match self {
            Expression::Call(call) => {
                call.callee.walk_types(visit);
                for argument in &call.arguments {
                    argument.walk_types(visit);
                }
            }
            Expression::Function(function) => {
                for param in &function.params {
                    if let Some(annotation) = &param.type_annotation {
                        annotation.walk(visit);
                    }
                }
                if let Some(return_type) = &function.return_type {
                    return_type.walk(visit);
                }
            }
            Expression::Object(object) => {
                for property in &object.properties {
                    property.value.walk_types(visit);
                }
            }
            Expression::Literal(..) | Expression::Identifier(..) | Expression::Other(_) => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

/// An arrow function or function expression with its annotations.
#[derive(Debug, Clone)]
pub struct FunctionLiteral {
    /// Parameters in declaration order; order decides positional binding at runtime.
    pub params: Vec<FunctionParam>,
    pub return_type: Option<TypeNode>,
    pub is_arrow: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FunctionParam {
    /// `None` for destructuring and default-value patterns.
    pub name: Option<String>,
    pub optional: bool,
    pub type_annotation: Option<TypeNode>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ObjectLiteral {
    pub properties: Vec<Property>,
    pub span: Span,
}

impl ObjectLiteral {
    /// Key of the first property, if it is a static key.
    pub fn first_key(&self) -> Option<&str> {
        self.properties.first().and_then(|property| property.key.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct Property {
    /// `None` for computed keys and spread elements.
    pub key: Option<String>,
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Boolean(bool),
    Number(f64),
    Null,
}

/// A type annotation.
#[derive(Debug, Clone)]
pub enum TypeNode {
    /// A keyword type such as `string` or `number`.
    Keyword { name: String, span: Span },
    /// A named type, optionally with type arguments (`Resp<Pet>`).
    Reference {
        name: String,
        arguments: Vec<TypeNode>,
        span: Span,
    },
    /// An inline object shape (`{ name: string }`).
    Object { fields: Vec<ObjectField>, span: Span },
    /// Any annotation outside the supported model (unions, arrays, functions, ...).
    Unsupported { kind: String, span: Span },
}

impl TypeNode {
    pub fn span(&self) -> Span {
        match self {
            TypeNode::Keyword { span, .. }
            | TypeNode::Reference { span, .. }
            | TypeNode::Object { span, .. }
            | TypeNode::Unsupported { span, .. } => *span,
        }
    }

    /// Name of the outer generic reference (`JSONResp` for `JSONResp<Resp<Pet>>`).
    pub fn outer_name(&self) -> Option<&str> {
        match self {
            TypeNode::Reference { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Short rendering used in log and error messages.
    pub fn describe(&self) -> String {
        match self {
            TypeNode::Keyword { name, .. } => name.clone(),
            TypeNode::Reference {
                name, arguments, ..
            } if arguments.is_empty() => name.clone(),
            TypeNode::Reference {
                name, arguments, ..
            } => {
                let arguments: Vec<String> = arguments.iter().map(TypeNode::describe).collect();
                format!("{}<{}>", name, arguments.join(", "))
            }
            TypeNode::Object { .. } => "object literal".to_string(),
            TypeNode::Unsupported { kind, .. } => kind.clone(),
        }
    }

    /// Visits this node and every nested type node, outermost first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a TypeNode)) {
        visit(self);
        match self {
            TypeNode::Reference { arguments, .. } => {
                for argument in arguments {
                    argument.walk(visit);
                }
            }
            TypeNode::Object { fields, .. } => {
                for field in fields {
                    field.type_node.walk(visit);
                }
            }
            TypeNode::Keyword { .. } | TypeNode::Unsupported { .. } => {}
        }
    }
}

/// A field of an object-shaped type.
#[derive(Debug, Clone)]
pub struct ObjectField {
    pub name: String,
    pub optional: bool,
    pub type_node: TypeNode,
    pub span: Span,
}

/// `type Name<T, U> = body`
#[derive(Debug, Clone)]
pub struct TypeAliasDeclaration {
    pub name: String,
    /// Span of the alias identifier; this is where definition lookups land.
    pub name_span: Span,
    pub type_parameters: Vec<String>,
    pub body: TypeNode,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ImportDeclaration {
    /// Module specifier as written (`'./model.js'`).
    pub source: String,
    pub bindings: Vec<ImportBinding>,
    pub span: Span,
}

/// One imported name; `imported` is `default` or `*` for default and namespace imports.
#[derive(Debug, Clone)]
pub struct ImportBinding {
    pub imported: String,
    pub local: String,
    pub local_span: Span,
}
