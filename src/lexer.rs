//! Lexer for Go source files.
//!
//! Only the tokens the declaration parser cares about get their own kind;
//! everything else is carried as `Op` so function bodies can be skipped by
//! bracket matching. Semicolons are inserted automatically at line ends, as Go does.

use std::iter::Peekable;
use std::str::CharIndices;

/// Token kinds for Go source.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    /// Contents of an interpreted or raw string literal, quotes removed.
    StringLiteral(String),
    /// Number, rune or imaginary literal, as written.
    Literal(String),

    // Keywords
    Package,
    Import,
    Type,
    Interface,
    Struct,
    Func,
    Map,
    Chan,
    Const,
    Var,

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    LBrace,    // {
    RBrace,    // }
    Comma,     // ,
    Semicolon, // ; (explicit or inserted)
    Dot,       // .
    Ellipsis,  // ...
    Star,      // *
    Arrow,     // <-
    Tilde,     // ~
    Pipe,      // |
    Assign,    // =
    /// Any other operator.
    Op(String),

    Eof,
}

impl TokenKind {
    /// Whether a newline after this token ends the statement.
    fn ends_line(&self) -> bool {
        match self {
            TokenKind::Ident(_)
            | TokenKind::StringLiteral(_)
            | TokenKind::Literal(_)
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::RBrace => true,
            TokenKind::Op(op) => op == "++" || op == "--",
            _ => false,
        }
    }
}

/// A token with its kind and byte position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }
}

/// A lexical error: unterminated literal or comment, or a stray character.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub start: usize,
    pub end: usize,
}

pub struct Lexer<'src> {
    src: &'src str,
    chars: Peekable<CharIndices<'src>>,
    pos: usize,
    /// Last emitted token allows semicolon insertion at the next newline.
    insert_semi: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
            pos: 0,
            insert_semi: false,
        }
    }

    /// Tokenize the whole input. The last token is always `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_second(&self) -> Option<char> {
        let mut rest = self.src[self.pos..].chars();
        rest.next();
        rest.next()
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((pos, ch)) = self.chars.next() {
            self.pos = pos + ch.len_utf8();
            Some(ch)
        } else {
            None
        }
    }

    fn error(&self, message: impl Into<String>, start: usize) -> LexError {
        LexError {
            message: message.into(),
            start,
            end: self.pos.max(start),
        }
    }

    /// Emit `kind`, recording whether a following newline inserts a semicolon.
    fn emit(&mut self, kind: TokenKind, start: usize) -> Token {
        self.insert_semi = kind.ends_line();
        Token::new(kind, start, self.pos)
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            let start = self.pos;
            let Some(ch) = self.peek() else {
                if self.insert_semi {
                    self.insert_semi = false;
                    return Ok(Token::new(TokenKind::Semicolon, start, start));
                }
                return Ok(Token::new(TokenKind::Eof, start, start));
            };

            match ch {
                '\n' => {
                    self.advance();
                    if self.insert_semi {
                        self.insert_semi = false;
                        return Ok(Token::new(TokenKind::Semicolon, start, start));
                    }
                }
                '\u{feff}' if start == 0 => {
                    self.advance();
                }
                c if c.is_whitespace() => {
                    self.advance();
                }
                '/' if self.peek_second() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                '/' if self.peek_second() == Some('*') => {
                    self.advance();
                    self.advance();
                    let mut newline = false;
                    loop {
                        match self.advance() {
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                break;
                            }
                            Some('\n') => newline = true,
                            Some(_) => {}
                            None => return Err(self.error("unterminated comment", start)),
                        }
                    }
                    if newline && self.insert_semi {
                        self.insert_semi = false;
                        return Ok(Token::new(TokenKind::Semicolon, start, start));
                    }
                }
                _ => return self.lex_token(start),
            }
        }
    }

    fn lex_token(&mut self, start: usize) -> Result<Token, LexError> {
        let Some(ch) = self.advance() else {
            return Ok(Token::new(TokenKind::Eof, start, start));
        };

        let kind = match ch {
            c if is_ident_start(c) => {
                let ident = self.read_ident(start);
                keyword(&ident).unwrap_or(TokenKind::Ident(ident))
            }
            c if c.is_ascii_digit() => TokenKind::Literal(self.read_number(start)),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                TokenKind::Literal(self.read_number(start))
            }
            '"' => TokenKind::StringLiteral(self.read_string(start)?),
            '`' => TokenKind::StringLiteral(self.read_raw_string(start)?),
            '\'' => TokenKind::Literal(self.read_rune(start)?),
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '~' => TokenKind::Tilde,
            '.' => {
                if self.src[self.pos..].starts_with("..") {
                    self.advance();
                    self.advance();
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }
            '*' if self.peek() != Some('=') => TokenKind::Star,
            '<' if self.peek() == Some('-') => {
                self.advance();
                TokenKind::Arrow
            }
            '|' if !matches!(self.peek(), Some('|') | Some('=')) => TokenKind::Pipe,
            '=' if self.peek() != Some('=') => TokenKind::Assign,
            c if is_operator_char(c) => TokenKind::Op(self.read_operator(start)),
            other => {
                return Err(self.error(format!("unexpected character `{other}`"), start));
            }
        };

        Ok(self.emit(kind, start))
    }

    fn read_ident(&mut self, start: usize) -> String {
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.advance();
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn read_number(&mut self, start: usize) -> String {
        while let Some(c) = self.peek() {
            let text = &self.src[start..self.pos];
            let hex = text.starts_with("0x") || text.starts_with("0X");
            let exponent_sign = (c == '+' || c == '-')
                && match text.chars().last() {
                    Some('e' | 'E') => !hex,
                    Some('p' | 'P') => true,
                    _ => false,
                };
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                self.advance();
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn read_string(&mut self, start: usize) -> Result<String, LexError> {
        let mut s = String::new();
        loop {
            match self.advance() {
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some('\\') => s.push('\\'),
                    Some('"') => s.push('"'),
                    Some(other) => {
                        s.push('\\');
                        s.push(other);
                    }
                    None => return Err(self.error("unterminated string", start)),
                },
                Some('"') => return Ok(s),
                Some('\n') | None => return Err(self.error("unterminated string", start)),
                Some(c) => s.push(c),
            }
        }
    }

    fn read_raw_string(&mut self, start: usize) -> Result<String, LexError> {
        let mut s = String::new();
        loop {
            match self.advance() {
                Some('`') => return Ok(s),
                Some('\r') => {}
                Some(c) => s.push(c),
                None => return Err(self.error("unterminated raw string", start)),
            }
        }
    }

    fn read_rune(&mut self, start: usize) -> Result<String, LexError> {
        loop {
            match self.advance() {
                Some('\\') => {
                    self.advance();
                }
                Some('\'') => return Ok(self.src[start..self.pos].to_string()),
                Some('\n') | None => return Err(self.error("unterminated rune literal", start)),
                Some(_) => {}
            }
        }
    }

    /// Greedily read the rest of a multi-character operator.
    fn read_operator(&mut self, start: usize) -> String {
        while let Some(c) = self.peek() {
            let candidate = format!("{}{}", &self.src[start..self.pos], c);
            if is_operator(&candidate) {
                self.advance();
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_string()
    }
}

fn keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "package" => TokenKind::Package,
        "import" => TokenKind::Import,
        "type" => TokenKind::Type,
        "interface" => TokenKind::Interface,
        "struct" => TokenKind::Struct,
        "func" => TokenKind::Func,
        "map" => TokenKind::Map,
        "chan" => TokenKind::Chan,
        "const" => TokenKind::Const,
        "var" => TokenKind::Var,
        _ => return None,
    };
    Some(kind)
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '%' | '&' | '|' | '^' | '<' | '>' | '=' | '!' | ':'
    )
}

fn is_operator(op: &str) -> bool {
    matches!(
        op,
        "+" | "-"
            | "*"
            | "/"
            | "%"
            | "&"
            | "|"
            | "^"
            | "<"
            | ">"
            | "="
            | "!"
            | ":"
            | "<<"
            | ">>"
            | "&^"
            | "+="
            | "-="
            | "*="
            | "/="
            | "%="
            | "&="
            | "|="
            | "^="
            | "<<="
            | ">>="
            | "&^="
            | "&&"
            | "||"
            | "++"
            | "--"
            | "=="
            | "<="
            | ">="
            | "!="
            | ":="
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn ident(s: &str) -> TokenKind {
        TokenKind::Ident(s.to_string())
    }

    #[test]
    fn test_package_clause_inserts_semicolon() {
        assert_eq!(
            kinds("package main\n"),
            vec![TokenKind::Package, ident("main"), TokenKind::Semicolon, TokenKind::Eof]
        );
    }

    #[test]
    fn test_semicolon_at_eof() {
        assert_eq!(
            kinds("package p"),
            vec![TokenKind::Package, ident("p"), TokenKind::Semicolon, TokenKind::Eof]
        );
    }

    #[test]
    fn test_no_semicolon_after_open_brace() {
        assert_eq!(
            kinds("interface {\n}"),
            vec![
                TokenKind::Interface,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_strings_are_unquoted() {
        assert_eq!(
            kinds(r#"import "net/http""#)[1],
            TokenKind::StringLiteral("net/http".to_string())
        );
        assert_eq!(
            kinds("import `os`")[1],
            TokenKind::StringLiteral("os".to_string())
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = kinds("a // trailing\n/* block */ b");
        assert_eq!(
            tokens,
            vec![ident("a"), TokenKind::Semicolon, ident("b"), TokenKind::Semicolon, TokenKind::Eof]
        );
    }

    #[test]
    fn test_multiline_block_comment_acts_as_newline() {
        let tokens = kinds("a /* one\ntwo */ b");
        assert_eq!(tokens[1], TokenKind::Semicolon);
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            kinds("...*<-~| =.")[..7],
            [
                TokenKind::Ellipsis,
                TokenKind::Star,
                TokenKind::Arrow,
                TokenKind::Tilde,
                TokenKind::Pipe,
                TokenKind::Assign,
                TokenKind::Dot,
            ]
        );
    }

    #[test]
    fn test_operators_are_greedy() {
        assert_eq!(
            kinds("x := y || z")[1..4],
            [TokenKind::Op(":=".to_string()), ident("y"), TokenKind::Op("||".to_string())]
        );
    }

    #[test]
    fn test_increment_ends_line() {
        let tokens = kinds("i++\nj");
        assert_eq!(tokens[2], TokenKind::Semicolon);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("0x1p-2")[0], TokenKind::Literal("0x1p-2".to_string()));
        assert_eq!(kinds("1e+9")[0], TokenKind::Literal("1e+9".to_string()));
        assert_eq!(kinds("3.14")[0], TokenKind::Literal("3.14".to_string()));
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("\"abc").tokenize().unwrap_err();
        assert_eq!(err.message, "unterminated string");
        assert_eq!(err.start, 0);
    }

    #[test]
    fn test_spans() {
        let tokens = Lexer::new("type Foo").tokenize().unwrap();
        assert_eq!((tokens[1].start, tokens[1].end), (5, 8));
    }

    #[test]
    fn test_leading_byte_order_mark() {
        let tokens = Lexer::new("\u{feff}package p\n").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Package);
        assert_eq!(tokens[0].start, 3);
        assert!(Lexer::new("package p\n\u{feff}").tokenize().is_err());
    }
}
