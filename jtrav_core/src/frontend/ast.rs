//! Outline syntax tree produced by the front end
//!
//! Declarations are modelled precisely; statements and expressions only
//! carry their kind, source text and nesting, which is what the bridge
//! needs to rebuild them on the foreign side.

use crate::utils::Span;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilationUnitDecl {
    pub package: Option<PackageDecl>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
    pub span: Span,
}

impl CompilationUnitDecl {
    /// All type declarations, outer types before their members
    pub fn all_types(&self) -> Vec<&TypeDecl> {
        let mut out = Vec::new();
        for ty in &self.types {
            collect_types(ty, &mut out);
        }
        out
    }

    /// Whether any method body still waits for deferred parsing
    pub fn has_unparsed_bodies(&self) -> bool {
        self.types.iter().any(TypeDecl::has_unparsed_bodies)
    }
}

fn collect_types<'a>(ty: &'a TypeDecl, out: &mut Vec<&'a TypeDecl>) {
    out.push(ty);
    for member in &ty.members {
        if let MemberDecl::Type(nested) = member {
            collect_types(nested, out);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageDecl {
    /// Dotted name
    pub name: String,
    pub span: Span,
}

impl PackageDecl {
    pub fn tokens(&self) -> Vec<String> {
        self.name.split('.').map(str::to_string).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    /// Dotted name without the trailing `.*`
    pub name: String,
    pub is_static: bool,
    pub on_demand: bool,
    pub span: Span,
}

impl ImportDecl {
    /// Last segment of a single-type import
    pub fn simple_name(&self) -> Option<&str> {
        if self.on_demand {
            None
        } else {
            self.name.rsplit('.').next()
        }
    }

    /// Qualifier of the imported name (`a.b` for `a.b.C`)
    pub fn qualifier(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) => &self.name[..idx],
            None => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Annotation => "annotation",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: String,
    pub modifiers: Vec<String>,
    pub type_parameters: Option<String>,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub members: Vec<MemberDecl>,
    pub span: Span,
}

impl TypeDecl {
    pub fn is_public(&self) -> bool {
        self.modifiers.iter().any(|m| m == "public")
    }

    fn has_unparsed_bodies(&self) -> bool {
        self.members.iter().any(|member| match member {
            MemberDecl::Method(m) => matches!(m.body, Body::Unparsed(_)),
            MemberDecl::Initializer(i) => matches!(i.body, Body::Unparsed(_)),
            MemberDecl::Type(t) => t.has_unparsed_bodies(),
            MemberDecl::EnumConstant(c) => c.body.iter().any(|t| t.has_unparsed_bodies()),
            MemberDecl::Field(_) => false,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberDecl {
    Field(FieldDecl),
    Method(MethodDecl),
    Initializer(InitializerDecl),
    Type(TypeDecl),
    EnumConstant(EnumConstantDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub modifiers: Vec<String>,
    pub type_name: String,
    pub variables: Vec<VariableDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    pub name: String,
    pub initializer: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub modifiers: Vec<String>,
    pub type_parameters: Option<String>,
    /// `None` for constructors
    pub return_type: Option<String>,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub throws: Vec<String>,
    pub body: Body,
    pub span: Span,
}

impl MethodDecl {
    pub fn is_constructor(&self) -> bool {
        self.return_type.is_none()
    }

    /// Erasure-free signature key used for duplicate detection
    pub fn signature_key(&self) -> String {
        let params: Vec<&str> = self.parameters.iter().map(|p| p.type_name.as_str()).collect();
        format!("{}({})", self.name, params.join(","))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub modifiers: Vec<String>,
    pub type_name: String,
    pub name: String,
    pub varargs: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitializerDecl {
    pub is_static: bool,
    pub body: Body,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumConstantDecl {
    pub name: String,
    pub arguments: Vec<Expression>,
    /// Constant-specific class body
    pub body: Option<TypeDecl>,
    pub span: Span,
}

/// Body of a method or initializer
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Abstract or native: no body
    None,
    /// Skipped by a diet parse; span covers the braces
    Unparsed(Span),
    Parsed(Block),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Block,
    LocalVariable,
    LocalType,
    Expression,
    If,
    For,
    ForEach,
    While,
    Do,
    Switch,
    SwitchCase,
    Try,
    Catch,
    Finally,
    Return,
    Throw,
    Break,
    Continue,
    Synchronized,
    Labeled,
    Assert,
    Empty,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Block => "block",
            StatementKind::LocalVariable => "local_variable",
            StatementKind::LocalType => "local_type",
            StatementKind::Expression => "expression",
            StatementKind::If => "if",
            StatementKind::For => "for",
            StatementKind::ForEach => "foreach",
            StatementKind::While => "while",
            StatementKind::Do => "do",
            StatementKind::Switch => "switch",
            StatementKind::SwitchCase => "case",
            StatementKind::Try => "try",
            StatementKind::Catch => "catch",
            StatementKind::Finally => "finally",
            StatementKind::Return => "return",
            StatementKind::Throw => "throw",
            StatementKind::Break => "break",
            StatementKind::Continue => "continue",
            StatementKind::Synchronized => "synchronized",
            StatementKind::Labeled => "labeled",
            StatementKind::Assert => "assert",
            StatementKind::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    /// Label, local variable names or catch parameter, when the kind has one
    pub label: Option<String>,
    pub expressions: Vec<Expression>,
    pub children: Vec<Statement>,
    pub span: Span,
}

impl Statement {
    pub fn new(kind: StatementKind, span: Span) -> Self {
        Self {
            kind,
            label: None,
            expressions: Vec::new(),
            children: Vec::new(),
            span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionKind {
    Literal,
    Name,
    MethodInvocation,
    FieldAccess,
    Assignment,
    ObjectCreation,
    ArrayCreation,
    Lambda,
    Conditional,
    Binary,
    Unary,
    Cast,
    Parenthesized,
    Other,
}

impl ExpressionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpressionKind::Literal => "literal",
            ExpressionKind::Name => "name",
            ExpressionKind::MethodInvocation => "method_invocation",
            ExpressionKind::FieldAccess => "field_access",
            ExpressionKind::Assignment => "assignment",
            ExpressionKind::ObjectCreation => "object_creation",
            ExpressionKind::ArrayCreation => "array_creation",
            ExpressionKind::Lambda => "lambda",
            ExpressionKind::Conditional => "conditional",
            ExpressionKind::Binary => "binary",
            ExpressionKind::Unary => "unary",
            ExpressionKind::Cast => "cast",
            ExpressionKind::Parenthesized => "parenthesized",
            ExpressionKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    /// Source text with whitespace normalised to single spaces
    pub text: String,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(name: &str, members: Vec<MemberDecl>) -> TypeDecl {
        TypeDecl {
            kind: TypeKind::Class,
            name: name.to_string(),
            modifiers: vec!["public".to_string()],
            type_parameters: None,
            superclass: None,
            interfaces: Vec::new(),
            members,
            span: Span::dummy(),
        }
    }

    #[test]
    fn test_import_helpers() {
        let import = ImportDecl {
            name: "java.util.List".to_string(),
            is_static: false,
            on_demand: false,
            span: Span::dummy(),
        };
        assert_eq!(import.simple_name(), Some("List"));
        assert_eq!(import.qualifier(), "java.util");

        let on_demand = ImportDecl {
            on_demand: true,
            name: "java.util".to_string(),
            ..import
        };
        assert_eq!(on_demand.simple_name(), None);
    }

    #[test]
    fn test_all_types_walks_nested_declarations() {
        let inner = ty("Inner", Vec::new());
        let outer = ty("Outer", vec![MemberDecl::Type(inner)]);
        let unit = CompilationUnitDecl {
            types: vec![outer, ty("Second", Vec::new())],
            ..Default::default()
        };

        let names: Vec<&str> = unit.all_types().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Outer", "Inner", "Second"]);
    }

    #[test]
    fn test_unparsed_bodies_detected_in_nested_types() {
        let method = MethodDecl {
            modifiers: Vec::new(),
            type_parameters: None,
            return_type: Some("void".to_string()),
            name: "run".to_string(),
            parameters: Vec::new(),
            throws: Vec::new(),
            body: Body::Unparsed(Span::dummy()),
            span: Span::dummy(),
        };
        assert_eq!(method.signature_key(), "run()");

        let inner = ty("Inner", vec![MemberDecl::Method(method)]);
        let unit = CompilationUnitDecl {
            types: vec![ty("Outer", vec![MemberDecl::Type(inner)])],
            ..Default::default()
        };
        assert!(unit.has_unparsed_bodies());
    }
}
