//! CSS tokenizer.
//!
//! Produces CSS Syntax Level 3 tokens together with the byte range each one
//! covers in the source, so callers can slice raw text (declaration values,
//! selector lists, at-rule bodies) back out of the input verbatim.

use std::ops::Range;

/// CSS token types per CSS Syntax Level 3.
#[derive(Debug, Clone, PartialEq)]
pub enum CssToken {
    Ident(String),
    Function(String),
    AtKeyword(String),
    Hash { value: String, is_id: bool },
    String(String),
    Url(String),
    Number(f64),
    Percentage(f64),
    Dimension { value: f64, unit: String },
    Whitespace,
    Colon,
    Semicolon,
    Comma,
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Delim(char),
    /// `<!--`
    CDO,
    /// `-->`
    CDC,
}

/// A token plus the byte range it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: CssToken,
    pub span: Range<usize>,
}

/// Tokenize `input` completely. Comments are dropped.
pub fn tokenize(input: &str) -> Vec<Spanned> {
    let mut tokenizer = CssTokenizer::new(input);
    let mut out = Vec::new();
    while let Some(tok) = tokenizer.next_spanned() {
        out.push(tok);
    }
    out
}

/// Cursor over a CSS source string.
pub struct CssTokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> CssTokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Next token with its span, or `None` at end of input.
    pub fn next_spanned(&mut self) -> Option<Spanned> {
        self.skip_comments();
        let start = self.pos;
        let token = self.next_token()?;
        Some(Spanned {
            token,
            span: start..self.pos,
        })
    }

    fn next_token(&mut self) -> Option<CssToken> {
        let ch = self.peek()?;

        if is_whitespace(ch) {
            self.eat_while(is_whitespace);
            return Some(CssToken::Whitespace);
        }

        let token = match ch {
            '"' | '\'' => self.consume_string(ch),
            '#' => {
                self.bump();
                if self.peek().is_some_and(is_name_char) || self.at_escape(0) {
                    let is_id = self.starts_ident(0);
                    CssToken::Hash {
                        value: self.consume_name(),
                        is_id,
                    }
                } else {
                    CssToken::Delim('#')
                }
            }
            '+' | '.' if self.starts_number(0) => self.consume_numeric(),
            '-' if self.starts_number(0) => self.consume_numeric(),
            '-' if self.rest().starts_with("-->") => {
                self.pos += 3;
                CssToken::CDC
            }
            '-' if self.starts_ident(0) => self.consume_ident_like(),
            '0'..='9' => self.consume_numeric(),
            '@' => {
                self.bump();
                if self.starts_ident(0) {
                    CssToken::AtKeyword(self.consume_name())
                } else {
                    CssToken::Delim('@')
                }
            }
            '<' if self.rest().starts_with("<!--") => {
                self.pos += 4;
                CssToken::CDO
            }
            ':' => self.single(CssToken::Colon),
            ';' => self.single(CssToken::Semicolon),
            ',' => self.single(CssToken::Comma),
            '[' => self.single(CssToken::LBracket),
            ']' => self.single(CssToken::RBracket),
            '(' => self.single(CssToken::LParen),
            ')' => self.single(CssToken::RParen),
            '{' => self.single(CssToken::LBrace),
            '}' => self.single(CssToken::RBrace),
            c if is_name_start_char(c) || self.at_escape(0) => self.consume_ident_like(),
            c => {
                self.bump();
                CssToken::Delim(c)
            }
        };
        Some(token)
    }

    // --- Helper methods ---

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Character `n` chars ahead of the cursor.
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn single(&mut self, token: CssToken) -> CssToken {
        self.bump();
        token
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }

    fn skip_comments(&mut self) {
        while self.rest().starts_with("/*") {
            match self.rest()[2..].find("*/") {
                Some(end) => self.pos += 2 + end + 2,
                None => self.pos = self.src.len(),
            }
        }
    }

    fn at_escape(&self, n: usize) -> bool {
        self.peek_nth(n) == Some('\\') && self.peek_nth(n + 1).is_some_and(|c| c != '\n')
    }

    fn starts_ident(&self, n: usize) -> bool {
        match self.peek_nth(n) {
            Some('-') => match self.peek_nth(n + 1) {
                Some(c) if is_name_start_char(c) || c == '-' => true,
                Some('\\') => self.at_escape(n + 1),
                _ => false,
            },
            Some('\\') => self.at_escape(n),
            Some(c) => is_name_start_char(c),
            None => false,
        }
    }

    fn starts_number(&self, n: usize) -> bool {
        let digit = |i| self.peek_nth(i).is_some_and(|c: char| c.is_ascii_digit());
        match self.peek_nth(n) {
            Some('+') | Some('-') => {
                digit(n + 1) || (self.peek_nth(n + 1) == Some('.') && digit(n + 2))
            }
            Some('.') => digit(n + 1),
            Some(c) => c.is_ascii_digit(),
            None => false,
        }
    }

    fn consume_string(&mut self, quote: char) -> CssToken {
        self.bump();
        let mut value = String::new();
        while let Some(ch) = self.bump() {
            match ch {
                c if c == quote => break,
                // Unescaped newline ends the string (a parse error upstream).
                '\n' => break,
                '\\' => match self.peek() {
                    None => break,
                    Some('\n') => {
                        self.bump();
                    }
                    Some(_) => value.push(self.consume_escape()),
                },
                c => value.push(c),
            }
        }
        CssToken::String(value)
    }

    /// Called with the cursor just past a backslash.
    fn consume_escape(&mut self) -> char {
        let Some(ch) = self.bump() else {
            return '\u{FFFD}';
        };
        if !ch.is_ascii_hexdigit() {
            return ch;
        }
        let mut hex = String::from(ch);
        while hex.len() < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            hex.extend(self.bump());
        }
        if self.peek().is_some_and(is_whitespace) {
            self.bump();
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or('\u{FFFD}')
    }

    fn consume_name(&mut self) -> String {
        let mut name = String::new();
        loop {
            match self.peek() {
                Some(c) if is_name_char(c) => {
                    name.push(c);
                    self.bump();
                }
                Some('\\') if self.at_escape(0) => {
                    self.bump();
                    name.push(self.consume_escape());
                }
                _ => return name,
            }
        }
    }

    fn consume_numeric(&mut self) -> CssToken {
        let start = self.pos;
        if matches!(self.peek(), Some('+') | Some('-')) {
            self.bump();
        }
        self.eat_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.eat_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let signed = matches!(self.peek_nth(1), Some('+') | Some('-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += digit_at;
                self.eat_while(|c| c.is_ascii_digit());
            }
        }
        let value = self.src[start..self.pos].parse::<f64>().unwrap_or(0.0);

        if self.starts_ident(0) {
            let unit = self.consume_name();
            return CssToken::Dimension { value, unit };
        }
        if self.peek() == Some('%') {
            self.bump();
            return CssToken::Percentage(value);
        }
        CssToken::Number(value)
    }

    fn consume_ident_like(&mut self) -> CssToken {
        let name = self.consume_name();
        if self.peek() != Some('(') {
            return CssToken::Ident(name);
        }
        self.bump();
        if name.eq_ignore_ascii_case("url") {
            self.eat_while(is_whitespace);
            // Quoted urls stay a function token followed by a string.
            if !matches!(self.peek(), Some('"') | Some('\'')) {
                return self.consume_url();
            }
        }
        CssToken::Function(name)
    }

    /// Unquoted `url(...)` body, up to and including the closing paren.
    fn consume_url(&mut self) -> CssToken {
        let mut url = String::new();
        while let Some(ch) = self.peek() {
            match ch {
                ')' => {
                    self.bump();
                    break;
                }
                c if is_whitespace(c) => {
                    self.eat_while(is_whitespace);
                    if self.peek() == Some(')') {
                        self.bump();
                    }
                    break;
                }
                '\\' if self.at_escape(0) => {
                    self.bump();
                    url.push(self.consume_escape());
                }
                c => {
                    url.push(c);
                    self.bump();
                }
            }
        }
        CssToken::Url(url)
    }
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

fn is_name_start_char(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || !ch.is_ascii()
}

fn is_name_char(ch: char) -> bool {
    is_name_start_char(ch) || ch.is_ascii_digit() || ch == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<CssToken> {
        tokenize(input).into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_basic_tokens() {
        let tokens = tokens("body { color: red; }");
        assert_eq!(tokens[0], CssToken::Ident("body".into()));
        assert_eq!(tokens[1], CssToken::Whitespace);
        assert_eq!(tokens[2], CssToken::LBrace);
        assert_eq!(tokens[4], CssToken::Ident("color".into()));
        assert_eq!(tokens[5], CssToken::Colon);
        assert_eq!(tokens[7], CssToken::Ident("red".into()));
        assert_eq!(tokens[8], CssToken::Semicolon);
        assert_eq!(tokens[10], CssToken::RBrace);
    }

    #[test]
    fn test_spans_slice_source() {
        let src = "a { margin: 0 auto }";
        let spanned = tokenize(src);
        let texts: Vec<&str> = spanned.iter().map(|t| &src[t.span.clone()]).collect();
        assert_eq!(
            texts,
            vec!["a", " ", "{", " ", "margin", ":", " ", "0", " ", "auto", " ", "}"]
        );
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let src = "p::after{content:\"→\"}";
        let spanned = tokenize(src);
        let last = spanned.last().unwrap();
        assert_eq!(last.token, CssToken::RBrace);
        assert_eq!(last.span, src.len() - 1..src.len());
    }

    #[test]
    fn test_numbers_and_dimensions() {
        let tokens = tokens("10px 2.5em 50% 100 -3px");
        assert_eq!(
            tokens[0],
            CssToken::Dimension {
                value: 10.0,
                unit: "px".into()
            }
        );
        assert_eq!(
            tokens[2],
            CssToken::Dimension {
                value: 2.5,
                unit: "em".into()
            }
        );
        assert_eq!(tokens[4], CssToken::Percentage(50.0));
        assert_eq!(tokens[6], CssToken::Number(100.0));
        assert_eq!(
            tokens[8],
            CssToken::Dimension {
                value: -3.0,
                unit: "px".into()
            }
        );
    }

    #[test]
    fn test_scientific_notation() {
        let tokens = tokens("1e2 3.14E+1");
        assert_eq!(tokens[0], CssToken::Number(100.0));
        assert_eq!(tokens[2], CssToken::Number(31.4));
    }

    #[test]
    fn test_string_tokens() {
        let tokens = tokens(r#""hello" 'wo\'rld'"#);
        assert_eq!(tokens[0], CssToken::String("hello".into()));
        assert_eq!(tokens[2], CssToken::String("wo'rld".into()));
    }

    #[test]
    fn test_hash_and_class() {
        let tokens = tokens("#main .cls #123");
        assert_eq!(
            tokens[0],
            CssToken::Hash {
                value: "main".into(),
                is_id: true
            }
        );
        assert_eq!(tokens[2], CssToken::Delim('.'));
        assert_eq!(tokens[3], CssToken::Ident("cls".into()));
        assert_eq!(
            tokens[5],
            CssToken::Hash {
                value: "123".into(),
                is_id: false
            }
        );
    }

    #[test]
    fn test_at_keyword_and_function() {
        let tokens = self::tokens("@media screen rgb(255, 0, 0)");
        assert_eq!(tokens[0], CssToken::AtKeyword("media".into()));
        assert_eq!(tokens[2], CssToken::Ident("screen".into()));
        assert_eq!(tokens[4], CssToken::Function("rgb".into()));
        assert_eq!(tokens[5], CssToken::Number(255.0));
    }

    #[test]
    fn test_unquoted_url_swallows_semicolons() {
        let tokens = tokens("url(data:image/png;base64,iVBOR=)");
        assert_eq!(tokens, vec![CssToken::Url("data:image/png;base64,iVBOR=".into())]);
    }

    #[test]
    fn test_quoted_url_is_function() {
        let tokens = tokens("url( 'a.png')");
        assert_eq!(tokens[0], CssToken::Function("url".into()));
        assert_eq!(tokens[1], CssToken::String("a.png".into()));
        assert_eq!(tokens[2], CssToken::RParen);
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = tokens("a /* comment */ b/* unterminated");
        assert_eq!(
            tokens,
            vec![
                CssToken::Ident("a".into()),
                CssToken::Whitespace,
                CssToken::Whitespace,
                CssToken::Ident("b".into()),
            ]
        );
    }

    #[test]
    fn test_cdo_cdc() {
        let tokens = tokens("<!-- -->");
        assert_eq!(tokens[0], CssToken::CDO);
        assert_eq!(tokens[2], CssToken::CDC);
    }

    #[test]
    fn test_escapes_in_names() {
        let tokens = tokens(".a\\:b \\31 0");
        assert_eq!(tokens[1], CssToken::Ident("a:b".into()));
        assert_eq!(tokens[3], CssToken::Ident("10".into()));
    }
}
