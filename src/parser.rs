//! Declaration-level parser for Go source files.
//!
//! Reads the package clause, import declarations and interface type
//! declarations into a [`SourceUnit`]. Every other declaration is skipped
//! by bracket matching, so function bodies never need to be understood.

use std::fmt;
use std::ops::Range;

use crate::lexer::{LexError, Lexer, Token, TokenKind};
use crate::model::*;

/// A parse error.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub start: usize,
    pub end: usize,
}

impl ParseError {
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.start, self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        Self {
            message: err.message,
            start: err.start,
            end: err.end,
        }
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a Go source string into a [`SourceUnit`].
pub fn parse(src: &str) -> ParseResult<SourceUnit> {
    let tokens = Lexer::new(src).tokenize()?;
    Parser::new(src, tokens).parse_file()
}

/// One entry of a parameter list before Go's name grouping is applied.
enum ParamEntry {
    Named(String, TypeDescriptor),
    Bare(TypeDescriptor),
}

/// Elements of an interface body.
#[derive(Default)]
struct InterfaceBody {
    methods: Vec<Method>,
    embeds: Vec<TypeDescriptor>,
    /// Source text of type-set elements.
    terms: Vec<String>,
}

struct Parser<'src> {
    src: &'src str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn new(src: &'src str, tokens: Vec<Token>) -> Self {
        Self {
            src,
            tokens,
            pos: 0,
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_nth(&self, n: usize) -> &TokenKind {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error<T>(&self, message: impl Into<String>) -> ParseResult<T> {
        let token = self.current();
        Err(ParseError {
            message: message.into(),
            start: token.start,
            end: token.end,
        })
    }

    fn expect(&mut self, kind: &TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            self.error(format!("expected {:?}, found {:?}", kind, self.peek()))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => self.error(format!("expected identifier, found {:?}", other)),
        }
    }

    fn skip_semicolons(&mut self) {
        while self.matches(&TokenKind::Semicolon) {}
    }

    /// End of a declaration or element: a semicolon, or a closing token left
    /// for the enclosing group.
    fn expect_terminator(&mut self) -> ParseResult<()> {
        match self.peek() {
            TokenKind::Semicolon => {
                self.advance();
                Ok(())
            }
            TokenKind::RParen | TokenKind::RBrace | TokenKind::Eof => Ok(()),
            other => self.error(format!("expected `;`, found {:?}", other)),
        }
    }

    /// Source text from the start of token `from` up to the current token.
    fn text_since(&self, from: usize) -> String {
        let start = self.tokens[from].start;
        let end = self.tokens[self.pos.saturating_sub(1).max(from)].end;
        self.src[start..end.max(start)].trim().to_string()
    }

    fn parse_file(&mut self) -> ParseResult<SourceUnit> {
        self.skip_semicolons();
        self.expect(&TokenKind::Package)?;
        let package = self.expect_ident()?;
        self.expect_terminator()?;

        let mut imports = Vec::new();
        loop {
            self.skip_semicolons();
            if !self.check(&TokenKind::Import) {
                break;
            }
            self.parse_import_decl(&mut imports)?;
        }

        let mut interfaces = Vec::new();
        loop {
            self.skip_semicolons();
            match self.peek() {
                TokenKind::Eof => break,
                TokenKind::Type => self.parse_type_decl(&mut interfaces)?,
                TokenKind::Import => {
                    return self.error("imports must appear before other declarations");
                }
                _ => self.skip_decl(false)?,
            }
        }

        Ok(SourceUnit {
            package,
            imports,
            interfaces,
        })
    }

    fn parse_import_decl(&mut self, out: &mut Vec<Import>) -> ParseResult<()> {
        self.expect(&TokenKind::Import)?;
        if self.matches(&TokenKind::LParen) {
            loop {
                self.skip_semicolons();
                if self.matches(&TokenKind::RParen) {
                    break;
                }
                out.push(self.parse_import_spec()?);
                self.expect_terminator()?;
            }
            self.expect_terminator()
        } else {
            out.push(self.parse_import_spec()?);
            self.expect_terminator()
        }
    }

    fn parse_import_spec(&mut self) -> ParseResult<Import> {
        let alias = match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Some(name)
            }
            TokenKind::Dot => {
                self.advance();
                Some(".".to_string())
            }
            _ => None,
        };
        match self.peek().clone() {
            TokenKind::StringLiteral(path) => {
                self.advance();
                Ok(Import { alias, path })
            }
            other => self.error(format!("expected import path, found {:?}", other)),
        }
    }

    fn parse_type_decl(&mut self, out: &mut Vec<Interface>) -> ParseResult<()> {
        self.expect(&TokenKind::Type)?;
        if self.matches(&TokenKind::LParen) {
            loop {
                self.skip_semicolons();
                if self.matches(&TokenKind::RParen) {
                    break;
                }
                self.parse_type_spec(out, true)?;
            }
            self.expect_terminator()
        } else {
            self.parse_type_spec(out, false)
        }
    }

    fn parse_type_spec(&mut self, out: &mut Vec<Interface>, grouped: bool) -> ParseResult<()> {
        let name = self.expect_ident()?;
        let type_params = if self.is_type_param_list() {
            Some(self.bracketed_text()?)
        } else {
            None
        };
        // Alias declarations decorate the same way as definitions.
        self.matches(&TokenKind::Assign);

        if self.check(&TokenKind::Interface) && matches!(self.peek_nth(1), TokenKind::LBrace) {
            let body = self.parse_interface_body()?;
            let embeds = body
                .embeds
                .into_iter()
                .map(|ty| {
                    if ty.is_leaf() && is_identifier(&ty.ty) {
                        Embed::Local(ty.ty)
                    } else {
                        Embed::External(ty.ty)
                    }
                })
                .collect();
            out.push(Interface {
                name,
                type_params,
                methods: body.methods,
                embeds,
                constraint: !body.terms.is_empty(),
            });
            self.expect_terminator()
        } else {
            self.skip_decl(grouped)
        }
    }

    /// `[T any]` after a type name, as opposed to an array length `[N]`.
    fn is_type_param_list(&self) -> bool {
        matches!(self.peek(), TokenKind::LBracket)
            && matches!(self.peek_nth(1), TokenKind::Ident(_))
            && matches!(
                self.peek_nth(2),
                TokenKind::Ident(_)
                    | TokenKind::Comma
                    | TokenKind::Star
                    | TokenKind::Tilde
                    | TokenKind::LBracket
                    | TokenKind::Interface
                    | TokenKind::Struct
                    | TokenKind::Map
                    | TokenKind::Chan
                    | TokenKind::Func
            )
    }

    /// Consume a balanced `[ ... ]` and return the text between the brackets.
    fn bracketed_text(&mut self) -> ParseResult<String> {
        self.expect(&TokenKind::LBracket)?;
        let from = self.pos;
        let mut depth = 0usize;
        loop {
            match self.peek() {
                TokenKind::LBracket | TokenKind::LParen | TokenKind::LBrace => depth += 1,
                TokenKind::RBracket if depth == 0 => break,
                TokenKind::RBracket | TokenKind::RParen | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Eof => return self.error("unterminated `[`"),
                _ => {}
            }
            self.advance();
        }
        let text = if self.pos == from {
            String::new()
        } else {
            self.text_since(from)
        };
        self.expect(&TokenKind::RBracket)?;
        Ok(text)
    }

    /// Skip a declaration up to its terminating semicolon. Inside a grouped
    /// declaration the closing `)` ends it too and is left unconsumed.
    fn skip_decl(&mut self, grouped: bool) -> ParseResult<()> {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                TokenKind::Eof => return Ok(()),
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::RParen if depth == 0 && grouped => return Ok(()),
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    if depth == 0 {
                        return self.error(format!("unexpected {:?}", self.peek()));
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Skip one interface element up to `;` or the closing `}`.
    fn skip_element(&mut self) -> ParseResult<()> {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                TokenKind::Eof => return self.error("unterminated interface"),
                TokenKind::Semicolon | TokenKind::RBrace if depth == 0 => return Ok(()),
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn parse_interface_body(&mut self) -> ParseResult<InterfaceBody> {
        self.expect(&TokenKind::Interface)?;
        self.expect(&TokenKind::LBrace)?;
        let mut body = InterfaceBody::default();
        loop {
            self.skip_semicolons();
            if self.matches(&TokenKind::RBrace) {
                break;
            }

            let from = self.pos;
            if matches!(self.peek(), TokenKind::Ident(_))
                && matches!(self.peek_nth(1), TokenKind::LParen)
            {
                let name = self.expect_ident()?;
                let (params, results) = self.parse_signature()?;
                body.methods.push(Method {
                    name,
                    params,
                    results,
                });
            } else if self.check(&TokenKind::Tilde) {
                self.skip_element()?;
                body.terms.push(self.text_since(from));
            } else {
                let ty = self.parse_type()?;
                if self.check(&TokenKind::Pipe) {
                    self.skip_element()?;
                    body.terms.push(self.text_since(from));
                } else {
                    body.embeds.push(ty);
                }
            }

            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Semicolon)?;
            }
        }
        Ok(body)
    }

    fn parse_signature(&mut self) -> ParseResult<(Vec<TypeDescriptor>, Vec<TypeDescriptor>)> {
        let params = self.parse_params()?;
        let results = if self.check(&TokenKind::LParen) {
            self.parse_params()?
        } else if self.starts_type() {
            vec![self.parse_type()?]
        } else {
            Vec::new()
        };
        Ok((params, results))
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Ident(_)
                | TokenKind::Star
                | TokenKind::LBracket
                | TokenKind::Map
                | TokenKind::Chan
                | TokenKind::Arrow
                | TokenKind::Func
                | TokenKind::Interface
                | TokenKind::Struct
        )
    }

    /// Parse `( ... )` into one descriptor per parameter, expanding grouped
    /// names: `(s, t string)` yields two `string` parameters.
    fn parse_params(&mut self) -> ParseResult<Vec<TypeDescriptor>> {
        self.expect(&TokenKind::LParen)?;
        let mut entries = Vec::new();
        while !self.check(&TokenKind::RParen) {
            if self.is_named_param() {
                let name = self.expect_ident()?;
                let ty = self.parse_type()?;
                entries.push(ParamEntry::Named(name, ty));
            } else {
                entries.push(ParamEntry::Bare(self.parse_type()?));
            }
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        if !self.check(&TokenKind::RParen) {
            return self.error(format!("expected `)`, found {:?}", self.peek()));
        }
        let params = self.group_params(entries);
        let close = self.advance();
        params.map_err(|message| ParseError {
            message,
            start: close.start,
            end: close.end,
        })
    }

    /// An identifier directly followed by the start of a type names a parameter.
    fn is_named_param(&self) -> bool {
        if !matches!(self.peek(), TokenKind::Ident(_)) {
            return false;
        }
        match self.peek_nth(1) {
            TokenKind::Ident(_)
            | TokenKind::Star
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Arrow
            | TokenKind::Func
            | TokenKind::Interface
            | TokenKind::Struct
            | TokenKind::Ellipsis
            | TokenKind::LParen => true,
            TokenKind::LBracket => self.array_type_follows(1),
            _ => false,
        }
    }

    /// Whether the `[ ... ]` starting `offset` tokens ahead is followed by an
    /// element type. `buf [N]byte` is a named array parameter, while
    /// `List[T]` is a bare generic instantiation.
    fn array_type_follows(&self, offset: usize) -> bool {
        let mut depth = 0usize;
        let mut n = offset;
        loop {
            match self.peek_nth(n) {
                TokenKind::LBracket | TokenKind::LParen | TokenKind::LBrace => depth += 1,
                TokenKind::RBracket | TokenKind::RParen | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            n += 1;
        }
        matches!(
            self.peek_nth(n + 1),
            TokenKind::Ident(_)
                | TokenKind::Star
                | TokenKind::LBracket
                | TokenKind::Map
                | TokenKind::Chan
                | TokenKind::Arrow
                | TokenKind::Func
                | TokenKind::Interface
                | TokenKind::Struct
                | TokenKind::LParen
        )
    }

    fn group_params(&self, entries: Vec<ParamEntry>) -> Result<Vec<TypeDescriptor>, String> {
        let any_named = entries.iter().any(|e| matches!(e, ParamEntry::Named(..)));
        if !any_named {
            return Ok(entries
                .into_iter()
                .map(|e| match e {
                    ParamEntry::Bare(ty) | ParamEntry::Named(_, ty) => ty,
                })
                .collect());
        }

        let mut params = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for entry in entries {
            match entry {
                ParamEntry::Bare(ty) if ty.is_leaf() && is_identifier(&ty.ty) => {
                    pending.push(ty.ty);
                }
                ParamEntry::Bare(ty) => {
                    return Err(format!("mixed named and unnamed parameters at `{}`", ty.ty));
                }
                ParamEntry::Named(name, ty) => {
                    for grouped in pending.drain(..) {
                        params.push(ty.clone().named(grouped));
                    }
                    params.push(ty.named(name));
                }
            }
        }
        if let Some(name) = pending.first() {
            return Err(format!("missing type for parameter `{}`", name));
        }
        Ok(params)
    }

    fn parse_type(&mut self) -> ParseResult<TypeDescriptor> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                let mut base = name;
                if self.matches(&TokenKind::Dot) {
                    let selector = self.expect_ident()?;
                    base = format!("{}.{}", base, selector);
                }
                if self.check(&TokenKind::LBracket) {
                    self.parse_type_args(base)
                } else {
                    Ok(TypeDescriptor::leaf(base))
                }
            }
            TokenKind::Star => {
                self.advance();
                let pointee = self.parse_type()?;
                let text = format!("*{}", pointee.ty);
                if pointee.is_leaf() {
                    Ok(TypeDescriptor::leaf(text))
                } else {
                    Ok(TypeDescriptor::composite(text, vec![pointee]))
                }
            }
            TokenKind::LBracket => {
                let len = if matches!(self.peek_nth(1), TokenKind::RBracket) {
                    self.advance();
                    self.advance();
                    String::new()
                } else {
                    self.bracketed_text()?
                };
                let elem = self.parse_type()?;
                Ok(TypeDescriptor::composite(
                    format!("[{}]{}", len, elem.ty),
                    vec![elem],
                ))
            }
            TokenKind::Map => {
                self.advance();
                self.expect(&TokenKind::LBracket)?;
                let key = self.parse_type()?;
                self.expect(&TokenKind::RBracket)?;
                let value = self.parse_type()?;
                Ok(TypeDescriptor::composite(
                    format!("map[{}]{}", key.ty, value.ty),
                    vec![key, value],
                ))
            }
            TokenKind::Chan => {
                self.advance();
                let send_only = self.matches(&TokenKind::Arrow);
                let elem = self.parse_type()?;
                let text = if send_only {
                    format!("chan<- {}", elem.ty)
                } else {
                    format!("chan {}", elem.ty)
                };
                Ok(TypeDescriptor::composite(text, vec![elem]))
            }
            TokenKind::Arrow => {
                self.advance();
                self.expect(&TokenKind::Chan)?;
                let elem = self.parse_type()?;
                Ok(TypeDescriptor::composite(
                    format!("<-chan {}", elem.ty),
                    vec![elem],
                ))
            }
            TokenKind::Func => {
                self.advance();
                let (params, results) = self.parse_signature()?;
                let text = format!("func{}", render_signature(&params, &results));
                let inner: Vec<TypeDescriptor> = params
                    .into_iter()
                    .chain(results)
                    .map(|mut ty| {
                        ty.name = None;
                        ty
                    })
                    .collect();
                Ok(TypeDescriptor::composite(text, inner))
            }
            TokenKind::Interface => self.parse_inline_interface(),
            TokenKind::Struct => self.parse_inline_struct(),
            TokenKind::LParen => {
                self.advance();
                let ty = self.parse_type()?;
                self.expect(&TokenKind::RParen)?;
                Ok(ty)
            }
            TokenKind::Ellipsis => {
                self.advance();
                let elem = self.parse_type()?;
                Ok(TypeDescriptor::composite(
                    format!("...{}", elem.ty),
                    vec![elem],
                ))
            }
            other => self.error(format!("expected type, found {:?}", other)),
        }
    }

    /// `Base[A, B]`: the base name is kept as a child so its package prefix
    /// stays visible to import resolution.
    fn parse_type_args(&mut self, base: String) -> ParseResult<TypeDescriptor> {
        self.expect(&TokenKind::LBracket)?;
        let mut args = Vec::new();
        while !self.check(&TokenKind::RBracket) {
            args.push(self.parse_type()?);
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        let text = format!(
            "{}[{}]",
            base,
            args.iter().map(|a| a.ty.as_str()).collect::<Vec<_>>().join(", ")
        );
        let mut inner = vec![TypeDescriptor::leaf(base)];
        inner.extend(args);
        Ok(TypeDescriptor::composite(text, inner))
    }

    fn parse_inline_interface(&mut self) -> ParseResult<TypeDescriptor> {
        let body = self.parse_interface_body()?;
        let mut elements = Vec::new();
        let mut inner = Vec::new();
        for method in body.methods {
            elements.push(format!(
                "{}{}",
                method.name,
                render_signature(&method.params, &method.results)
            ));
            inner.extend(method.params.into_iter().chain(method.results).map(|mut ty| {
                ty.name = None;
                ty
            }));
        }
        for embed in body.embeds {
            elements.push(embed.ty.clone());
            inner.push(embed);
        }
        elements.extend(body.terms);

        if elements.is_empty() {
            return Ok(TypeDescriptor::leaf("interface{}"));
        }
        Ok(TypeDescriptor::composite(
            format!("interface{{ {} }}", elements.join("; ")),
            inner,
        ))
    }

    fn parse_inline_struct(&mut self) -> ParseResult<TypeDescriptor> {
        self.expect(&TokenKind::Struct)?;
        self.expect(&TokenKind::LBrace)?;
        let mut fields = Vec::new();
        let mut inner = Vec::new();
        loop {
            self.skip_semicolons();
            if self.matches(&TokenKind::RBrace) {
                break;
            }

            let embedded = matches!(self.peek(), TokenKind::Star)
                || matches!(self.peek(), TokenKind::Ident(_))
                    && matches!(
                        self.peek_nth(1),
                        TokenKind::Dot
                            | TokenKind::Semicolon
                            | TokenKind::RBrace
                            | TokenKind::StringLiteral(_)
                    );
            if embedded {
                let ty = self.parse_type()?;
                fields.push(ty.ty.clone());
                inner.push(ty);
            } else {
                let mut names = vec![self.expect_ident()?];
                while self.matches(&TokenKind::Comma) {
                    names.push(self.expect_ident()?);
                }
                let ty = self.parse_type()?;
                fields.push(format!("{} {}", names.join(", "), ty.ty));
                inner.push(ty);
            }
            // Field tags carry no type information.
            if let TokenKind::StringLiteral(_) = self.peek() {
                self.advance();
            }
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Semicolon)?;
            }
        }

        if fields.is_empty() {
            return Ok(TypeDescriptor::leaf("struct{}"));
        }
        Ok(TypeDescriptor::composite(
            format!("struct{{ {} }}", fields.join("; ")),
            inner,
        ))
    }
}

/// Render `(params) results` the way it would be written in a function type.
fn render_signature(params: &[TypeDescriptor], results: &[TypeDescriptor]) -> String {
    let list = |items: &[TypeDescriptor]| {
        items
            .iter()
            .map(|ty| match &ty.name {
                Some(name) => format!("{} {}", name, ty.ty),
                None => ty.ty.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut out = format!("({})", list(params));
    match results {
        [] => {}
        [single] if single.name.is_none() => {
            out.push(' ');
            out.push_str(&single.ty);
        }
        _ => {
            out.push_str(&format!(" ({})", list(results)));
        }
    }
    out
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}
