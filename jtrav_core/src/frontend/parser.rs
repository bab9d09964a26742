//! Outline parser for Java compilation units
//!
//! Declarations (package, imports, types, members, signatures) are parsed
//! precisely. Method bodies are either parsed into a statement tree or, in
//! diet mode, skipped and kept as a span for deferred parsing. Expressions
//! are captured as classified source text.

use super::ast::*;
use super::lexer::{self, LexerError, Token, TokenKind};
use crate::logging::{codes, Code};
use crate::utils::{Position, Span};

const MAX_NESTING_DEPTH: usize = 256;

const MODIFIERS: &[&str] = &[
    "public", "protected", "private", "static", "final", "abstract", "native", "synchronized",
    "transient", "volatile", "strictfp", "default",
];

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>>=",
];

const BINARY_OPERATORS: &[&str] = &[
    "||", "&&", "|", "^", "&", "==", "!=", "<=", ">=", "<<", "+", "-", "*", "/", "%",
    "instanceof", "<", ">",
];

const UNARY_PREFIX: &[&str] = &["!", "~", "-", "+", "++", "--"];

/// Syntax errors reported while building the outline
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyntaxError {
    #[error("Syntax error: expected {expected}, found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("Syntax error: unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: String, span: Span },

    #[error("Syntax error: nesting too deep")]
    NestingTooDeep { span: Span },

    #[error("{0}")]
    Lexical(#[from] LexerError),
}

impl SyntaxError {
    pub fn error_code(&self) -> Code {
        codes::front_end::SYNTAX_ERROR
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::UnexpectedEof { span, .. }
            | Self::NestingTooDeep { span } => *span,
            Self::Lexical(e) => e.span(),
        }
    }
}

type PResult<T> = Result<T, SyntaxError>;

/// Result of parsing a whole source file
#[derive(Debug, Clone)]
pub struct ParsedSource {
    pub decl: CompilationUnitDecl,
    pub line_separators: Vec<usize>,
    pub errors: Vec<SyntaxError>,
}

/// Parse a compilation unit; `diet` skips method and initializer bodies
pub fn parse_compilation_unit(source: &str, diet: bool) -> ParsedSource {
    let lexed = lexer::tokenize(source);
    let mut parser = Parser::new(&lexed.tokens, diet);
    let decl = parser.compilation_unit();

    let mut errors: Vec<SyntaxError> = lexed.errors.into_iter().map(SyntaxError::from).collect();
    errors.extend(parser.errors);

    ParsedSource {
        decl,
        line_separators: lexed.line_separators,
        errors,
    }
}

/// Parse a body skipped by a diet parse; `span` covers its braces
pub fn parse_deferred_body(source: &str, span: Span) -> (Block, Vec<SyntaxError>) {
    let lexed = lexer::tokenize_from(source, span.start, span.end.offset);
    let mut parser = Parser::new(&lexed.tokens, false);
    let block = match parser.block() {
        Ok(block) => block,
        Err(e) => {
            parser.errors.push(e);
            Block {
                statements: Vec::new(),
                span,
            }
        }
    };

    let mut errors: Vec<SyntaxError> = lexed.errors.into_iter().map(SyntaxError::from).collect();
    errors.extend(parser.errors);
    (block, errors)
}

/// Fill in every diet-parsed body of `decl`
pub fn parse_deferred_bodies(decl: &mut CompilationUnitDecl, source: &str) -> Vec<SyntaxError> {
    let mut errors = Vec::new();
    for ty in &mut decl.types {
        complete_type(ty, source, &mut errors);
    }
    errors
}

fn complete_type(ty: &mut TypeDecl, source: &str, errors: &mut Vec<SyntaxError>) {
    for member in &mut ty.members {
        match member {
            MemberDecl::Method(m) => complete_body(&mut m.body, source, errors),
            MemberDecl::Initializer(i) => complete_body(&mut i.body, source, errors),
            MemberDecl::Type(nested) => complete_type(nested, source, errors),
            MemberDecl::EnumConstant(c) => {
                if let Some(body) = c.body.as_mut() {
                    complete_type(body, source, errors);
                }
            }
            MemberDecl::Field(_) => {}
        }
    }
}

fn complete_body(body: &mut Body, source: &str, errors: &mut Vec<SyntaxError>) {
    if let Body::Unparsed(span) = body {
        let (block, body_errors) = parse_deferred_body(source, *span);
        errors.extend(body_errors);
        *body = Body::Parsed(block);
    }
}

// ============================================================================
// PARSER
// ============================================================================

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    diet: bool,
    depth: usize,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], diet: bool) -> Self {
        Self {
            tokens,
            pos: 0,
            diet,
            depth: 0,
            errors: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Token access
    // ------------------------------------------------------------------

    fn peek(&self) -> &'a Token {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &'a Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + n).min(last)]
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    fn at(&self, text: &str) -> bool {
        self.peek().is(text)
    }

    fn at_identifier(&self, text: &str) -> bool {
        let token = self.peek();
        token.is_identifier() && token.text == text
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.at(text) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let token = self.peek();
        if token.is_eof() {
            SyntaxError::UnexpectedEof {
                expected: expected.to_string(),
                span: token.span,
            }
        } else {
            SyntaxError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.text.clone(),
                span: token.span,
            }
        }
    }

    fn expect(&mut self, text: &str) -> PResult<Span> {
        if self.at(text) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(&format!("'{}'", text)))
        }
    }

    fn expect_identifier(&mut self) -> PResult<&'a Token> {
        if self.peek().is_identifier() {
            Ok(self.advance())
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    fn span_from(&self, start: Position) -> Span {
        let end = if self.pos == 0 {
            start
        } else {
            self.tokens[self.pos - 1].span.end
        };
        if end.offset < start.offset {
            Span::new(start, start)
        } else {
            Span::new(start, end)
        }
    }

    fn enter(&mut self) -> PResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(SyntaxError::NestingTooDeep {
                span: self.peek().span,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // ------------------------------------------------------------------
    // Recovery
    // ------------------------------------------------------------------

    /// Skip a balanced bracket group starting at the current opener
    fn skip_balanced(&mut self) -> PResult<Span> {
        let open = self.advance();
        let close = match open.text.as_str() {
            "(" => ")",
            "[" => "]",
            "{" => "}",
            "<" => ">",
            _ => return Err(self.unexpected("bracket")),
        };
        let mut depth = 1usize;
        loop {
            let token = self.peek();
            if token.is_eof() {
                return Err(SyntaxError::UnexpectedEof {
                    expected: format!("'{}'", close),
                    span: token.span,
                });
            }
            self.advance();
            if token.is(&open.text) {
                depth += 1;
            } else if token.is(close) {
                depth -= 1;
                if depth == 0 {
                    return Ok(Span::new(open.span.start, token.span.end));
                }
            }
        }
    }

    /// Skip to the end of the current member or statement
    fn recover(&mut self) {
        let mut depth = 0usize;
        loop {
            let token = self.peek();
            if token.is_eof() {
                return;
            }
            if token.is("{") || token.is("(") || token.is("[") {
                depth += 1;
            } else if token.is("}") || token.is(")") || token.is("]") {
                if depth == 0 {
                    return;
                }
                depth -= 1;
                if depth == 0 && token.is("}") {
                    self.advance();
                    return;
                }
            } else if token.is(";") && depth == 0 {
                self.advance();
                return;
            }
            self.advance();
        }
    }

    // ------------------------------------------------------------------
    // Text helpers
    // ------------------------------------------------------------------

    /// Token texts joined with single spaces where the source had a gap
    fn text_of(tokens: &[Token]) -> String {
        let mut out = String::new();
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 && tokens[i - 1].span.end.offset < token.span.start.offset {
                out.push(' ');
            }
            out.push_str(&token.text);
        }
        out
    }

    fn text_since(&self, start_index: usize) -> String {
        Self::text_of(&self.tokens[start_index..self.pos])
    }

    // ------------------------------------------------------------------
    // Compilation unit
    // ------------------------------------------------------------------

    fn compilation_unit(&mut self) -> CompilationUnitDecl {
        let start = self.peek().span.start;
        let mut unit = CompilationUnitDecl::default();

        if let Err(e) = self.skip_annotations() {
            self.errors.push(e);
        }

        if self.at("package") {
            match self.package_declaration() {
                Ok(package) => unit.package = Some(package),
                Err(e) => {
                    self.errors.push(e);
                    self.recover();
                }
            }
        }

        while self.at("import") {
            match self.import_declaration() {
                Ok(import) => unit.imports.push(import),
                Err(e) => {
                    self.errors.push(e);
                    self.recover();
                }
            }
        }

        while !self.peek().is_eof() {
            if self.eat(";") {
                continue;
            }
            let before = self.pos;
            let type_start = self.peek().span.start;
            let result = self
                .modifiers()
                .and_then(|modifiers| self.type_declaration(modifiers, type_start));
            match result {
                Ok(ty) => unit.types.push(ty),
                Err(e) => {
                    self.errors.push(e);
                    self.recover();
                    if self.pos == before {
                        self.advance();
                    }
                }
            }
        }

        unit.span = self.span_from(start);
        unit
    }

    fn qualified_name(&mut self) -> PResult<String> {
        let mut name = self.expect_identifier()?.text.clone();
        while self.at(".") && self.peek_at(1).is_identifier() {
            self.advance();
            name.push('.');
            name.push_str(&self.advance().text);
        }
        Ok(name)
    }

    fn package_declaration(&mut self) -> PResult<PackageDecl> {
        let start = self.expect("package")?.start;
        let name = self.qualified_name()?;
        self.expect(";")?;
        Ok(PackageDecl {
            name,
            span: self.span_from(start),
        })
    }

    fn import_declaration(&mut self) -> PResult<ImportDecl> {
        let start = self.expect("import")?.start;
        let is_static = self.eat("static");
        let name = self.qualified_name()?;
        let on_demand = if self.at(".") && self.peek_at(1).is("*") {
            self.advance();
            self.advance();
            true
        } else {
            false
        };
        self.expect(";")?;
        Ok(ImportDecl {
            name,
            is_static,
            on_demand,
            span: self.span_from(start),
        })
    }

    // ------------------------------------------------------------------
    // Modifiers and annotations
    // ------------------------------------------------------------------

    fn at_annotation(&self) -> bool {
        self.at("@") && !self.peek_at(1).is("interface")
    }

    fn skip_annotations(&mut self) -> PResult<()> {
        while self.at_annotation() {
            self.advance();
            self.qualified_name()?;
            if self.at("(") {
                self.skip_balanced()?;
            }
        }
        Ok(())
    }

    fn modifiers(&mut self) -> PResult<Vec<String>> {
        let mut modifiers = Vec::new();
        loop {
            let token = self.peek();
            if token.kind == TokenKind::Keyword && MODIFIERS.contains(&token.text.as_str()) {
                // `default:` inside a switch is not a modifier
                if token.text == "default" && (self.peek_at(1).is(":") || self.peek_at(1).is("->")) {
                    break;
                }
                modifiers.push(self.advance().text.clone());
            } else if token.is_identifier()
                && (token.text == "sealed" || token.text == "non")
                && (self.peek_at(1).is_identifier()
                    || self.peek_at(1).kind == TokenKind::Keyword
                    || self.peek_at(1).is("-"))
                && self.at_sealed_modifier()
            {
                self.skip_sealed_modifier();
            } else if self.at_annotation() {
                self.skip_annotations()?;
            } else {
                break;
            }
        }
        Ok(modifiers)
    }

    fn at_sealed_modifier(&self) -> bool {
        let token = self.peek();
        if token.text == "sealed" {
            let next = self.peek_at(1);
            next.is("class") || next.is("interface") || next.is("abstract") || next.is("public")
        } else {
            self.peek_at(1).is("-") && self.peek_at(2).text == "sealed"
        }
    }

    fn skip_sealed_modifier(&mut self) {
        if self.peek().text == "non" {
            self.advance();
            self.advance();
        }
        self.advance();
    }

    fn at_type_declaration(&self) -> bool {
        self.at("class")
            || self.at("interface")
            || self.at("enum")
            || (self.at("@") && self.peek_at(1).is("interface"))
            || (self.at_identifier("record") && self.peek_at(1).is_identifier())
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// A type reference: primitive or qualified name with type arguments and dimensions
    fn type_ref(&mut self) -> PResult<String> {
        self.skip_annotations()?;
        let start = self.pos;
        if !self.peek().is_type_start() && !self.at("?") {
            return Err(self.unexpected("type"));
        }
        self.advance();
        loop {
            if self.at("<") {
                self.skip_balanced()?;
            } else if self.at(".") && self.peek_at(1).is_identifier() {
                self.advance();
                self.advance();
            } else if self.at(".") && self.peek_at(1).is("@") {
                self.advance();
                self.skip_annotations()?;
            } else {
                break;
            }
        }
        while self.at("[") && self.peek_at(1).is("]") {
            self.advance();
            self.advance();
        }
        Ok(self.text_since(start))
    }

    fn type_list(&mut self) -> PResult<Vec<String>> {
        let mut types = vec![self.type_ref()?];
        while self.eat(",") {
            types.push(self.type_ref()?);
        }
        Ok(types)
    }

    fn type_parameters(&mut self) -> PResult<Option<String>> {
        if self.at("<") {
            let start = self.pos;
            self.skip_balanced()?;
            Ok(Some(self.text_since(start)))
        } else {
            Ok(None)
        }
    }

    // ------------------------------------------------------------------
    // Type declarations
    // ------------------------------------------------------------------

    fn type_declaration(&mut self, modifiers: Vec<String>, start: Position) -> PResult<TypeDecl> {
        self.enter()?;
        let result = self.type_declaration_inner(modifiers, start);
        self.leave();
        result
    }

    fn type_declaration_inner(
        &mut self,
        modifiers: Vec<String>,
        start: Position,
    ) -> PResult<TypeDecl> {
        let kind = if self.eat("class") {
            TypeKind::Class
        } else if self.eat("interface") {
            TypeKind::Interface
        } else if self.eat("enum") {
            TypeKind::Enum
        } else if self.at("@") && self.peek_at(1).is("interface") {
            self.advance();
            self.advance();
            TypeKind::Annotation
        } else if self.at_identifier("record") {
            self.advance();
            TypeKind::Class
        } else {
            return Err(self.unexpected("type declaration"));
        };

        let name = self.expect_identifier()?.text.clone();
        let type_parameters = self.type_parameters()?;

        // Record components
        if self.at("(") {
            self.skip_balanced()?;
        }

        let mut superclass = None;
        let mut interfaces = Vec::new();

        if self.eat("extends") {
            if kind == TypeKind::Interface {
                interfaces = self.type_list()?;
            } else {
                superclass = Some(self.type_ref()?);
            }
        }
        if self.eat("implements") {
            interfaces.extend(self.type_list()?);
        }
        if self.at_identifier("permits") {
            self.advance();
            self.type_list()?;
        }

        let members = self.type_body(kind, &name)?;

        Ok(TypeDecl {
            kind,
            name,
            modifiers,
            type_parameters,
            superclass,
            interfaces,
            members,
            span: self.span_from(start),
        })
    }

    fn type_body(&mut self, kind: TypeKind, type_name: &str) -> PResult<Vec<MemberDecl>> {
        self.expect("{")?;
        let mut members = Vec::new();

        if kind == TypeKind::Enum {
            self.enum_constants(&mut members)?;
        }

        while !self.at("}") {
            if self.peek().is_eof() {
                self.errors.push(self.unexpected("'}'"));
                return Ok(members);
            }
            if self.eat(";") {
                continue;
            }
            let before = self.pos;
            match self.member(type_name) {
                Ok(member) => members.push(member),
                Err(e) => {
                    self.errors.push(e);
                    self.recover();
                    if self.pos == before {
                        self.advance();
                    }
                }
            }
        }
        self.expect("}")?;
        Ok(members)
    }

    fn enum_constants(&mut self, members: &mut Vec<MemberDecl>) -> PResult<()> {
        loop {
            self.skip_annotations()?;
            if self.eat(";") || self.at("}") {
                return Ok(());
            }

            let start = self.peek().span.start;
            let name = self.expect_identifier()?.text.clone();
            let arguments = if self.at("(") {
                self.arguments()?
            } else {
                Vec::new()
            };
            let body = if self.at("{") {
                let body_start = self.peek().span.start;
                let members = self.type_body(TypeKind::Class, &name)?;
                Some(TypeDecl {
                    kind: TypeKind::Class,
                    name: name.clone(),
                    modifiers: Vec::new(),
                    type_parameters: None,
                    superclass: None,
                    interfaces: Vec::new(),
                    members,
                    span: self.span_from(body_start),
                })
            } else {
                None
            };

            members.push(MemberDecl::EnumConstant(EnumConstantDecl {
                name,
                arguments,
                body,
                span: self.span_from(start),
            }));

            if !self.eat(",") {
                if self.eat(";") || self.at("}") {
                    return Ok(());
                }
                return Err(self.unexpected("',', ';' or '}'"));
            }
        }
    }

    fn member(&mut self, type_name: &str) -> PResult<MemberDecl> {
        let start = self.peek().span.start;

        if self.at("{") || (self.at("static") && self.peek_at(1).is("{")) {
            let is_static = self.eat("static");
            let body = self.body()?;
            return Ok(MemberDecl::Initializer(InitializerDecl {
                is_static,
                body,
                span: self.span_from(start),
            }));
        }

        let modifiers = self.modifiers()?;

        if self.at_type_declaration() {
            return Ok(MemberDecl::Type(self.type_declaration(modifiers, start)?));
        }

        let type_parameters = self.type_parameters()?;

        // Constructor
        if self.peek().is_identifier() && self.peek().text == type_name && self.peek_at(1).is("(")
        {
            let name = self.advance().text.clone();
            return self.method_rest(modifiers, type_parameters, None, name, start);
        }

        // Compact record constructor
        if self.peek().is_identifier() && self.peek().text == type_name && self.peek_at(1).is("{")
        {
            let name = self.advance().text.clone();
            let body = self.body()?;
            return Ok(MemberDecl::Method(MethodDecl {
                modifiers,
                type_parameters,
                return_type: None,
                name,
                parameters: Vec::new(),
                throws: Vec::new(),
                body,
                span: self.span_from(start),
            }));
        }

        let field_type = self.type_ref()?;
        let name = self.expect_identifier()?.text.clone();

        if self.at("(") {
            return self.method_rest(modifiers, type_parameters, Some(field_type), name, start);
        }

        let variables = self.variable_declarators(name)?;
        self.expect(";")?;
        Ok(MemberDecl::Field(FieldDecl {
            modifiers,
            type_name: field_type,
            variables,
            span: self.span_from(start),
        }))
    }

    fn variable_declarators(&mut self, first_name: String) -> PResult<Vec<VariableDeclarator>> {
        let mut variables = Vec::new();
        let mut name = first_name;
        let mut var_start = self.tokens[self.pos.saturating_sub(1)].span.start;
        loop {
            while self.at("[") && self.peek_at(1).is("]") {
                self.advance();
                self.advance();
            }
            let initializer = if self.eat("=") {
                Some(self.expression_until(&[",", ";"])?)
            } else {
                None
            };
            variables.push(VariableDeclarator {
                name,
                initializer,
                span: self.span_from(var_start),
            });
            if !self.eat(",") {
                return Ok(variables);
            }
            var_start = self.peek().span.start;
            name = self.expect_identifier()?.text.clone();
        }
    }

    fn method_rest(
        &mut self,
        modifiers: Vec<String>,
        type_parameters: Option<String>,
        return_type: Option<String>,
        name: String,
        start: Position,
    ) -> PResult<MemberDecl> {
        let parameters = self.parameters()?;
        while self.at("[") && self.peek_at(1).is("]") {
            self.advance();
            self.advance();
        }
        let throws = if self.eat("throws") {
            self.type_list()?
        } else {
            Vec::new()
        };
        // Annotation member default value
        if self.eat("default") {
            self.expression_until(&[";"])?;
        }

        let body = if self.eat(";") {
            Body::None
        } else {
            self.body()?
        };

        Ok(MemberDecl::Method(MethodDecl {
            modifiers,
            type_parameters,
            return_type,
            name,
            parameters,
            throws,
            body,
            span: self.span_from(start),
        }))
    }

    fn parameters(&mut self) -> PResult<Vec<Parameter>> {
        self.expect("(")?;
        let mut parameters = Vec::new();
        if self.eat(")") {
            return Ok(parameters);
        }
        loop {
            let start = self.peek().span.start;
            let modifiers = self.modifiers()?;
            let type_name = self.type_ref()?;
            let varargs = self.eat("...");
            // Receiver parameter
            let name = if self.at("this") {
                self.advance().text.clone()
            } else {
                let ident = self.expect_identifier()?.text.clone();
                while self.at("[") && self.peek_at(1).is("]") {
                    self.advance();
                    self.advance();
                }
                ident
            };
            parameters.push(Parameter {
                modifiers,
                type_name,
                name,
                varargs,
                span: self.span_from(start),
            });
            if !self.eat(",") {
                break;
            }
        }
        self.expect(")")?;
        Ok(parameters)
    }

    /// A method or initializer body, skipped in diet mode
    fn body(&mut self) -> PResult<Body> {
        if !self.at("{") {
            return Err(self.unexpected("'{'"));
        }
        if self.diet {
            let span = self.skip_balanced()?;
            Ok(Body::Unparsed(span))
        } else {
            Ok(Body::Parsed(self.block()?))
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn block(&mut self) -> PResult<Block> {
        let start = self.expect("{")?.start;
        let mut statements = Vec::new();
        while !self.at("}") {
            if self.peek().is_eof() {
                self.errors.push(self.unexpected("'}'"));
                return Ok(Block {
                    statements,
                    span: self.span_from(start),
                });
            }
            let before = self.pos;
            match self.statement() {
                Ok(statement) => statements.push(statement),
                Err(e) => {
                    self.errors.push(e);
                    self.recover();
                    if self.pos == before {
                        self.advance();
                    }
                }
            }
        }
        self.expect("}")?;
        Ok(Block {
            statements,
            span: self.span_from(start),
        })
    }

    fn statement(&mut self) -> PResult<Statement> {
        self.enter()?;
        let result = self.statement_inner();
        self.leave();
        result
    }

    fn statement_inner(&mut self) -> PResult<Statement> {
        let start = self.peek().span.start;
        let token = self.peek();

        if token.is("{") {
            let block = self.block()?;
            let mut statement = Statement::new(StatementKind::Block, block.span);
            statement.children = block.statements;
            return Ok(statement);
        }
        if token.is(";") {
            self.advance();
            return Ok(Statement::new(StatementKind::Empty, self.span_from(start)));
        }

        match token.text.as_str() {
            "if" if token.kind == TokenKind::Keyword => {
                self.advance();
                let condition = self.parenthesized()?;
                let mut statement = Statement::new(StatementKind::If, Span::dummy());
                statement.expressions.push(condition);
                statement.children.push(self.statement()?);
                if self.eat("else") {
                    statement.children.push(self.statement()?);
                }
                statement.span = self.span_from(start);
                Ok(statement)
            }
            "while" if token.kind == TokenKind::Keyword => {
                self.advance();
                let condition = self.parenthesized()?;
                let mut statement = Statement::new(StatementKind::While, Span::dummy());
                statement.expressions.push(condition);
                statement.children.push(self.statement()?);
                statement.span = self.span_from(start);
                Ok(statement)
            }
            "do" if token.kind == TokenKind::Keyword => {
                self.advance();
                let mut statement = Statement::new(StatementKind::Do, Span::dummy());
                statement.children.push(self.statement()?);
                self.expect("while")?;
                statement.expressions.push(self.parenthesized()?);
                self.expect(";")?;
                statement.span = self.span_from(start);
                Ok(statement)
            }
            "for" if token.kind == TokenKind::Keyword => self.for_statement(start),
            "switch" if token.kind == TokenKind::Keyword => self.switch_statement(start),
            "try" if token.kind == TokenKind::Keyword => self.try_statement(start),
            "synchronized" if token.kind == TokenKind::Keyword && self.peek_at(1).is("(") => {
                self.advance();
                let lock = self.parenthesized()?;
                let block = self.block()?;
                let mut statement = Statement::new(StatementKind::Synchronized, Span::dummy());
                statement.expressions.push(lock);
                statement.children = block.statements;
                statement.span = self.span_from(start);
                Ok(statement)
            }
            "return" | "throw" if token.kind == TokenKind::Keyword => {
                let kind = if token.text == "return" {
                    StatementKind::Return
                } else {
                    StatementKind::Throw
                };
                self.advance();
                let mut statement = Statement::new(kind, Span::dummy());
                if !self.at(";") {
                    statement.expressions.push(self.expression_until(&[";"])?);
                }
                self.expect(";")?;
                statement.span = self.span_from(start);
                Ok(statement)
            }
            "break" | "continue" if token.kind == TokenKind::Keyword => {
                let kind = if token.text == "break" {
                    StatementKind::Break
                } else {
                    StatementKind::Continue
                };
                self.advance();
                let mut statement = Statement::new(kind, Span::dummy());
                if self.peek().is_identifier() {
                    statement.label = Some(self.advance().text.clone());
                }
                self.expect(";")?;
                statement.span = self.span_from(start);
                Ok(statement)
            }
            "assert" if token.kind == TokenKind::Keyword => {
                self.advance();
                let mut statement = Statement::new(StatementKind::Assert, Span::dummy());
                statement.expressions.push(self.expression_until(&[":", ";"])?);
                if self.eat(":") {
                    statement.expressions.push(self.expression_until(&[";"])?);
                }
                self.expect(";")?;
                statement.span = self.span_from(start);
                Ok(statement)
            }
            _ => self.declaration_or_expression_statement(start),
        }
    }

    fn declaration_or_expression_statement(&mut self, start: Position) -> PResult<Statement> {
        // Labeled statement
        if self.peek().is_identifier() && self.peek_at(1).is(":") {
            let label = self.advance().text.clone();
            self.advance();
            let mut statement = Statement::new(StatementKind::Labeled, Span::dummy());
            statement.label = Some(label);
            statement.children.push(self.statement()?);
            statement.span = self.span_from(start);
            return Ok(statement);
        }

        let checkpoint = self.pos;
        let modifiers = self.modifiers()?;

        if self.at_type_declaration() {
            let ty = self.type_declaration(modifiers, start)?;
            let mut statement = Statement::new(StatementKind::LocalType, ty.span);
            statement.label = Some(ty.name);
            return Ok(statement);
        }

        if self.looks_like_local_declaration() {
            self.type_ref()?;
            let first = self.expect_identifier()?.text.clone();
            let variables = self.variable_declarators(first)?;
            self.expect(";")?;
            let mut statement = Statement::new(StatementKind::LocalVariable, Span::dummy());
            statement.label = Some(
                variables
                    .iter()
                    .map(|v| v.name.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
            );
            statement.expressions = variables.into_iter().filter_map(|v| v.initializer).collect();
            statement.span = self.span_from(start);
            return Ok(statement);
        }

        if !modifiers.is_empty() {
            return Err(self.unexpected("declaration"));
        }
        self.pos = checkpoint;

        let expression = self.expression_until(&[";"])?;
        self.expect(";")?;
        let mut statement = Statement::new(StatementKind::Expression, Span::dummy());
        statement.expressions.push(expression);
        statement.span = self.span_from(start);
        Ok(statement)
    }

    /// Speculative scan: type reference followed by a declarator name
    fn looks_like_local_declaration(&mut self) -> bool {
        let checkpoint = self.pos;
        let errors = self.errors.len();
        let result = self.type_ref().is_ok()
            && self.peek().is_identifier()
            && {
                let next = self.peek_at(1);
                next.is("=") || next.is(";") || next.is(",") || next.is("[") || next.is(":")
            };
        self.pos = checkpoint;
        self.errors.truncate(errors);
        result
    }

    fn parenthesized(&mut self) -> PResult<Expression> {
        self.expect("(")?;
        let expression = self.expression_until(&[")"])?;
        self.expect(")")?;
        Ok(expression)
    }

    fn for_statement(&mut self, start: Position) -> PResult<Statement> {
        self.expect("for")?;
        self.expect("(")?;

        let header_start = self.pos;
        let mut depth = 0usize;
        let mut is_foreach = false;
        let mut index = self.pos;
        while index < self.tokens.len() {
            let token = &self.tokens[index];
            if token.is_eof() {
                break;
            }
            if token.is("(") || token.is("[") || token.is("{") {
                depth += 1;
            } else if token.is(")") || token.is("]") || token.is("}") {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            } else if depth == 0 && token.is(";") {
                break;
            } else if depth == 0 && token.is(":") {
                is_foreach = true;
                break;
            }
            index += 1;
        }

        let mut statement;
        if is_foreach {
            statement = Statement::new(StatementKind::ForEach, Span::dummy());
            self.modifiers()?;
            self.type_ref()?;
            statement.label = Some(self.expect_identifier()?.text.clone());
            self.expect(":")?;
            statement.expressions.push(self.expression_until(&[")"])?);
        } else {
            statement = Statement::new(StatementKind::For, Span::dummy());
            self.pos = header_start;
            for terminator in [";", ";", ")"] {
                if !self.at(terminator) {
                    let modifiers = self.modifiers()?;
                    if !modifiers.is_empty() || self.looks_like_local_declaration() {
                        self.type_ref()?;
                    }
                    statement
                        .expressions
                        .push(self.expression_until(&[terminator])?);
                }
                if terminator != ")" {
                    self.expect(terminator)?;
                }
            }
        }
        self.expect(")")?;
        statement.children.push(self.statement()?);
        statement.span = self.span_from(start);
        Ok(statement)
    }

    fn switch_statement(&mut self, start: Position) -> PResult<Statement> {
        self.expect("switch")?;
        let selector = self.parenthesized()?;
        self.expect("{")?;

        let mut statement = Statement::new(StatementKind::Switch, Span::dummy());
        statement.expressions.push(selector);

        while !self.at("}") {
            if self.peek().is_eof() {
                return Err(self.unexpected("'}'"));
            }
            let case_start = self.peek().span.start;
            let mut case = Statement::new(StatementKind::SwitchCase, Span::dummy());
            if self.eat("case") {
                loop {
                    case.expressions.push(self.expression_until(&[",", ":", "->"])?);
                    if !self.eat(",") {
                        break;
                    }
                }
            } else if self.eat("default") {
                case.label = Some("default".to_string());
            } else {
                return Err(self.unexpected("'case' or 'default'"));
            }

            if self.eat("->") {
                case.children.push(self.statement()?);
            } else {
                self.expect(":")?;
                while !self.at("case") && !self.at("default") && !self.at("}") {
                    if self.peek().is_eof() {
                        return Err(self.unexpected("'}'"));
                    }
                    let before = self.pos;
                    match self.statement() {
                        Ok(child) => case.children.push(child),
                        Err(e) => {
                            self.errors.push(e);
                            self.recover();
                            if self.pos == before {
                                self.advance();
                            }
                        }
                    }
                }
            }
            case.span = self.span_from(case_start);
            statement.children.push(case);
        }
        self.expect("}")?;
        statement.span = self.span_from(start);
        Ok(statement)
    }

    fn try_statement(&mut self, start: Position) -> PResult<Statement> {
        self.expect("try")?;
        let mut statement = Statement::new(StatementKind::Try, Span::dummy());

        if self.eat("(") {
            while !self.at(")") {
                self.modifiers()?;
                if self.looks_like_local_declaration() {
                    self.type_ref()?;
                }
                statement
                    .expressions
                    .push(self.expression_until(&[";", ")"])?);
                if !self.eat(";") {
                    break;
                }
            }
            self.expect(")")?;
        }

        let block = self.block()?;
        let mut body = Statement::new(StatementKind::Block, block.span);
        body.children = block.statements;
        statement.children.push(body);

        let mut has_handler = false;
        while self.at("catch") {
            let catch_start = self.advance().span.start;
            self.expect("(")?;
            self.modifiers()?;
            self.type_ref()?;
            while self.eat("|") {
                self.type_ref()?;
            }
            let parameter = self.expect_identifier()?.text.clone();
            self.expect(")")?;
            let block = self.block()?;
            let mut catch = Statement::new(StatementKind::Catch, Span::dummy());
            catch.label = Some(parameter);
            catch.children = block.statements;
            catch.span = self.span_from(catch_start);
            statement.children.push(catch);
            has_handler = true;
        }
        if self.at("finally") {
            let finally_start = self.advance().span.start;
            let block = self.block()?;
            let mut finally = Statement::new(StatementKind::Finally, Span::dummy());
            finally.children = block.statements;
            finally.span = self.span_from(finally_start);
            statement.children.push(finally);
            has_handler = true;
        }

        if !has_handler && statement.expressions.is_empty() {
            return Err(self.unexpected("'catch' or 'finally'"));
        }

        statement.span = self.span_from(start);
        Ok(statement)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn arguments(&mut self) -> PResult<Vec<Expression>> {
        self.expect("(")?;
        let mut arguments = Vec::new();
        if self.eat(")") {
            return Ok(arguments);
        }
        loop {
            arguments.push(self.expression_until(&[",", ")"])?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect(")")?;
        Ok(arguments)
    }

    /// Capture tokens up to a depth-0 stop token and classify them
    fn expression_until(&mut self, stops: &[&str]) -> PResult<Expression> {
        let start = self.pos;
        let mut depth = 0usize;
        loop {
            let token = self.peek();
            if token.is_eof() {
                break;
            }
            if depth == 0 && stops.iter().any(|s| token.is(s)) {
                break;
            }
            if token.is("(") || token.is("[") || token.is("{") {
                depth += 1;
            } else if token.is(")") || token.is("]") || token.is("}") {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            self.advance();
        }

        let tokens = &self.tokens[start..self.pos];
        if tokens.is_empty() {
            return Err(self.unexpected("expression"));
        }
        Ok(Expression {
            kind: classify_expression(tokens),
            text: Self::text_of(tokens),
            span: Span::new(tokens[0].span.start, tokens[tokens.len() - 1].span.end),
        })
    }
}

// ============================================================================
// EXPRESSION CLASSIFICATION
// ============================================================================

/// Indices of tokens at bracket depth 0, skipping type-argument lists
fn top_level_indices(tokens: &[Token]) -> Vec<usize> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token.is("(") || token.is("[") || token.is("{") {
            if depth == 0 {
                out.push(i);
            }
            depth += 1;
        } else if token.is(")") || token.is("]") || token.is("}") {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                out.push(i);
            }
        } else if depth == 0 {
            if token.is("<") {
                if let Some(end) = type_arguments_end(tokens, i) {
                    i = end + 1;
                    continue;
                }
            }
            out.push(i);
        }
        i += 1;
    }
    out
}

/// If `tokens[open]` starts a type-argument list, the index of its closer
fn type_arguments_end(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.is("<") {
            depth += 1;
        } else if token.is(">") {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        } else if !(token.is_type_start()
            || token.is(",")
            || token.is(".")
            || token.is("?")
            || token.is("extends")
            || token.is("super")
            || token.is("[")
            || token.is("]")
            || token.is("&"))
        {
            return None;
        }
    }
    None
}

fn classify_expression(tokens: &[Token]) -> ExpressionKind {
    let top = top_level_indices(tokens);
    let first = &tokens[0];
    let last = &tokens[tokens.len() - 1];

    if top.iter().any(|&i| tokens[i].is("->")) {
        return ExpressionKind::Lambda;
    }

    for &i in &top {
        let token = &tokens[i];
        let compound_shift = token.is(">=")
            && i > 0
            && tokens[i - 1].is(">")
            && tokens[i - 1].span.end.offset == token.span.start.offset;
        if ASSIGNMENT_OPERATORS.iter().any(|op| token.is(op)) || compound_shift {
            return ExpressionKind::Assignment;
        }
    }

    if top.iter().any(|&i| tokens[i].is("?")) {
        return ExpressionKind::Conditional;
    }

    for (pos, &i) in top.iter().enumerate() {
        let token = &tokens[i];
        if !BINARY_OPERATORS.iter().any(|op| token.is(op)) {
            continue;
        }
        // A leading operator or one following another operator is unary
        let is_prefix = pos == 0
            || top
                .get(pos - 1)
                .map(|&p| {
                    let prev = &tokens[p];
                    prev.kind == TokenKind::Operator
                        && !prev.is(")")
                        && !prev.is("]")
                        && !prev.is("}")
                        && !prev.is("++")
                        && !prev.is("--")
                })
                .unwrap_or(false);
        if !is_prefix {
            return ExpressionKind::Binary;
        }
    }

    if first.is("new") {
        let array = top.iter().any(|&i| tokens[i].is("["));
        let call = top.iter().any(|&i| tokens[i].is("("));
        return if array && !call {
            ExpressionKind::ArrayCreation
        } else {
            ExpressionKind::ObjectCreation
        };
    }

    if first.is("(") {
        let close = top.iter().copied().find(|&i| i > 0 && tokens[i].is(")"));
        match close {
            Some(i) if i == tokens.len() - 1 => return ExpressionKind::Parenthesized,
            Some(i) if looks_like_cast(&tokens[1..i], tokens.get(i + 1)) => {
                return ExpressionKind::Cast
            }
            _ => {}
        }
    }

    if UNARY_PREFIX.iter().any(|op| first.is(op)) || last.is("++") || last.is("--") {
        return ExpressionKind::Unary;
    }

    if tokens.len() == 1 {
        return match first.kind {
            TokenKind::Literal => ExpressionKind::Literal,
            TokenKind::Identifier => ExpressionKind::Name,
            _ if first.is("this") || first.is("super") => ExpressionKind::Name,
            _ => ExpressionKind::Other,
        };
    }

    if last.is(")") {
        return ExpressionKind::MethodInvocation;
    }

    let dotted_name = tokens
        .iter()
        .all(|t| t.is_identifier() || t.is(".") || t.is("this") || t.is("super"));
    if dotted_name {
        return ExpressionKind::Name;
    }

    if last.is_identifier() && tokens.len() >= 2 && tokens[tokens.len() - 2].is(".") {
        return ExpressionKind::FieldAccess;
    }

    ExpressionKind::Other
}

fn looks_like_cast(inner: &[Token], next: Option<&Token>) -> bool {
    if inner.is_empty() {
        return false;
    }
    let type_like = inner.iter().all(|t| {
        t.is_type_start()
            || t.is(".")
            || t.is("<")
            || t.is(">")
            || t.is(",")
            || t.is("?")
            || t.is("[")
            || t.is("]")
            || t.is("&")
            || t.is("extends")
            || t.is("super")
    });
    let operand = next
        .map(|t| {
            t.is_identifier()
                || t.kind == TokenKind::Literal
                || t.is("(")
                || t.is("this")
                || t.is("new")
                || t.is("!")
                || t.is("~")
        })
        .unwrap_or(false);
    type_like && operand
}
