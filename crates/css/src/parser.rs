use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::selector::{
    ComplexSelector, SelectorError, SelectorErrorKind, parse_selector_list, span_text,
    split_top_level,
};
use crate::token::{CssToken, Spanned, tokenize};

/// A CSS declaration (property: value).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased property name, e.g. `color`, `margin-left`. Custom
    /// properties (`--x`) keep their case.
    pub property: String,
    /// Raw value text as written, without `!important`.
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>, important: bool) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            important,
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.value)?;
        if self.important {
            f.write_str(" !important")?;
        }
        Ok(())
    }
}

/// One selector of a style rule. Rules written with a selector list are
/// split so every entry gets its own `CssRule`; they share the declarations.
#[derive(Debug, Clone)]
pub struct CssRule {
    pub selector: ComplexSelector,
    pub declarations: Arc<[Declaration]>,
    /// Index of this rule within its stylesheet, counting every selector.
    pub position: usize,
}

/// CSS that cannot be inlined and is carried through as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Passthrough {
    /// A style rule whose selector needs dynamic state or a pseudo-element.
    Rule {
        selector: String,
        declarations: Vec<Declaration>,
    },
    Media {
        prelude: String,
        blocks: Vec<Passthrough>,
    },
    /// Any other at-rule, exactly as written.
    Verbatim(String),
}

impl Passthrough {
    /// Render back to CSS. With `force_important` every declaration of a
    /// rule is marked `!important` so it still beats inlined styles.
    pub fn to_css(&self, force_important: bool) -> String {
        match self {
            Passthrough::Rule {
                selector,
                declarations,
            } => {
                if declarations.is_empty() {
                    return format!("{selector} {{}}");
                }
                let body: Vec<String> = declarations
                    .iter()
                    .map(|d| {
                        let mut d = d.clone();
                        d.important |= force_important;
                        d.to_string()
                    })
                    .collect();
                format!("{selector} {{ {} }}", body.join("; "))
            }
            Passthrough::Media { prelude, blocks } => {
                let inner: Vec<String> = blocks.iter().map(|b| b.to_css(force_important)).collect();
                format!("@media {prelude} {{\n{}\n}}", inner.join("\n"))
            }
            Passthrough::Verbatim(text) => text.clone(),
        }
    }
}

/// Non-fatal problems found while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CssDiagnostic {
    #[error("dropped malformed declaration `{0}`")]
    MalformedDeclaration(String),
    #[error("dropped rule: {0}")]
    MalformedSelector(#[from] SelectorError),
    #[error("`{0}` cannot be inlined and was passed through")]
    UnsupportedConstruct(String),
}

/// A parsed CSS stylesheet.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    /// Style rules in source order, one per selector.
    pub rules: Vec<CssRule>,
    pub passthrough: Vec<Passthrough>,
    pub diagnostics: Vec<CssDiagnostic>,
}

impl Stylesheet {
    /// The passthrough blocks rendered as a stylesheet.
    pub fn passthrough_css(&self, force_important: bool) -> String {
        self.passthrough
            .iter()
            .map(|p| p.to_css(force_important))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Everything that stays in the stylesheet after inlining: the
    /// passthrough blocks and, with `keep_universal`, the rules using `*`
    /// that were not inlined. Universal rules follow any leading `@charset`
    /// and `@import` and are never forced `!important`.
    pub fn leftover_css(&self, force_important: bool, keep_universal: bool) -> String {
        let universal: Vec<String> = if keep_universal {
            self.rules
                .iter()
                .filter(|r| r.selector.is_supported() && r.selector.has_universal())
                .map(|r| {
                    Passthrough::Rule {
                        selector: r.selector.text.clone(),
                        declarations: r.declarations.to_vec(),
                    }
                    .to_css(false)
                })
                .collect()
        } else {
            Vec::new()
        };
        if universal.is_empty() {
            return self.passthrough_css(force_important);
        }

        let preamble = self
            .passthrough
            .iter()
            .take_while(|p| {
                matches!(p, Passthrough::Verbatim(text)
                    if text.starts_with("@charset") || text.starts_with("@import"))
            })
            .count();
        let (head, tail) = self.passthrough.split_at(preamble);
        head.iter()
            .map(|p| p.to_css(force_important))
            .chain(universal)
            .chain(tail.iter().map(|p| p.to_css(force_important)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Declarations from a `style` attribute or any other bare block.
#[derive(Debug, Clone, Default)]
pub struct DeclarationBlock {
    pub declarations: Vec<Declaration>,
    pub diagnostics: Vec<CssDiagnostic>,
}

/// Parse a complete CSS stylesheet from a string.
pub fn parse_stylesheet(input: &str) -> Stylesheet {
    let tokens = tokenize(input);
    let mut parser = SheetParser {
        src: input,
        sheet: Stylesheet::default(),
    };
    let passthrough = parser.parse_rules(&tokens, false);
    parser.sheet.passthrough = passthrough;
    parser.sheet
}

/// Parse a declaration list such as the contents of a `style` attribute.
pub fn parse_declaration_block(input: &str) -> DeclarationBlock {
    let tokens = tokenize(input);
    let mut diagnostics = Vec::new();
    let declarations = parse_declarations(input, &tokens, &mut diagnostics);
    DeclarationBlock {
        declarations,
        diagnostics,
    }
}

struct SheetParser<'a> {
    src: &'a str,
    sheet: Stylesheet,
}

impl<'a> SheetParser<'a> {
    /// Parse a list of rules. Inside `@media` nothing is inlinable, so every
    /// rule goes to the returned passthrough list.
    fn parse_rules(&mut self, tokens: &[Spanned], in_media: bool) -> Vec<Passthrough> {
        let mut passthrough = Vec::new();
        let mut pos = 0;

        while pos < tokens.len() {
            match &tokens[pos].token {
                CssToken::Whitespace | CssToken::CDO | CssToken::CDC | CssToken::Semicolon => {
                    pos += 1;
                }
                CssToken::AtKeyword(name) => {
                    let end = at_rule_end(tokens, pos);
                    passthrough.push(self.parse_at_rule(name, &tokens[pos..end]));
                    pos = end;
                }
                _ => {
                    let Some(open) = find_top_level(tokens, pos, |t| *t == CssToken::LBrace) else {
                        let text = span_text(self.src, &tokens[pos..]).trim().to_string();
                        tracing::debug!(%text, "trailing css without a block");
                        self.sheet.diagnostics.push(
                            SelectorError {
                                text,
                                kind: SelectorErrorKind::MissingBlock,
                            }
                            .into(),
                        );
                        break;
                    };
                    let close = matching_brace(tokens, open);
                    let body = &tokens[open + 1..close];
                    let prelude = span_text(self.src, &tokens[pos..open]).trim();
                    self.parse_style_rule(prelude, body, in_media, &mut passthrough);
                    pos = close + 1;
                }
            }
        }
        passthrough
    }

    fn parse_at_rule(&mut self, name: &str, tokens: &[Spanned]) -> Passthrough {
        let name = name.to_ascii_lowercase();
        let open = find_top_level(tokens, 0, |t| *t == CssToken::LBrace);
        if let ("media", Some(open)) = (name.as_str(), open) {
            let prelude = span_text(self.src, &tokens[1..open]).trim().to_string();
            let close = matching_brace(tokens, open);
            let blocks = self.parse_rules(&tokens[open + 1..close], true);
            self.sheet
                .diagnostics
                .push(CssDiagnostic::UnsupportedConstruct(format!("@media {prelude}")));
            return Passthrough::Media { prelude, blocks };
        }
        self.sheet
            .diagnostics
            .push(CssDiagnostic::UnsupportedConstruct(format!("@{name}")));
        Passthrough::Verbatim(span_text(self.src, tokens).trim().to_string())
    }

    fn parse_style_rule(
        &mut self,
        prelude: &str,
        body: &[Spanned],
        in_media: bool,
        passthrough: &mut Vec<Passthrough>,
    ) {
        let declarations = parse_declarations(self.src, body, &mut self.sheet.diagnostics);
        if in_media {
            passthrough.push(Passthrough::Rule {
                selector: prelude.to_string(),
                declarations,
            });
            return;
        }

        let shared: Arc<[Declaration]> = Arc::from(declarations.as_slice());
        for parsed in parse_selector_list(prelude) {
            let selector = match parsed {
                Ok(selector) => selector,
                Err(err) => {
                    tracing::debug!(%err, "skipping selector");
                    self.sheet.diagnostics.push(err.into());
                    continue;
                }
            };
            if !selector.is_supported() {
                self.sheet
                    .diagnostics
                    .push(CssDiagnostic::UnsupportedConstruct(selector.text.clone()));
                passthrough.push(Passthrough::Rule {
                    selector: selector.text.clone(),
                    declarations: declarations.clone(),
                });
            }
            let position = self.sheet.rules.len();
            self.sheet.rules.push(CssRule {
                selector,
                declarations: Arc::clone(&shared),
                position,
            });
        }
    }
}

/// Index just past the at-rule starting at `start`: its `;` or its block.
fn at_rule_end(tokens: &[Spanned], start: usize) -> usize {
    match find_top_level(tokens, start + 1, |t| {
        matches!(t, CssToken::Semicolon | CssToken::LBrace)
    }) {
        Some(i) if tokens[i].token == CssToken::LBrace => (matching_brace(tokens, i) + 1).min(tokens.len()),
        Some(i) => i + 1,
        None => tokens.len(),
    }
}

/// First index at or after `start` whose token satisfies `pred` outside any
/// parens or brackets.
fn find_top_level(
    tokens: &[Spanned],
    start: usize,
    pred: impl Fn(&CssToken) -> bool,
) -> Option<usize> {
    let mut depth = 0usize;
    for (i, t) in tokens.iter().enumerate().skip(start) {
        if depth == 0 && pred(&t.token) {
            return Some(i);
        }
        match t.token {
            CssToken::LParen | CssToken::Function(_) | CssToken::LBracket => depth += 1,
            CssToken::RParen | CssToken::RBracket => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

/// Index of the `}` closing the block opened at `open`, or `tokens.len()`
/// when the block runs to end of input.
fn matching_brace(tokens: &[Spanned], open: usize) -> usize {
    let mut depth = 0usize;
    for (i, t) in tokens.iter().enumerate().skip(open) {
        match t.token {
            CssToken::LBrace => depth += 1,
            CssToken::RBrace => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    tokens.len()
}

fn trim_whitespace(mut tokens: &[Spanned]) -> &[Spanned] {
    while tokens.first().is_some_and(|t| t.token == CssToken::Whitespace) {
        tokens = &tokens[1..];
    }
    while tokens.last().is_some_and(|t| t.token == CssToken::Whitespace) {
        tokens = &tokens[..tokens.len() - 1];
    }
    tokens
}

/// Parse a `;`-separated declaration list. Each malformed entry is dropped
/// and reported on its own.
fn parse_declarations(
    src: &str,
    tokens: &[Spanned],
    diagnostics: &mut Vec<CssDiagnostic>,
) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    for range in split_top_level(tokens, |t| *t == CssToken::Semicolon) {
        let chunk = trim_whitespace(&tokens[range]);
        if chunk.is_empty() {
            continue;
        }
        match parse_declaration(src, chunk) {
            Some(decl) => declarations.push(decl),
            None => {
                let text = span_text(src, chunk).to_string();
                tracing::debug!(%text, "dropping malformed declaration");
                diagnostics.push(CssDiagnostic::MalformedDeclaration(text));
            }
        }
    }
    declarations
}

/// Parse a single declaration: `property: value [!important]`.
fn parse_declaration(src: &str, tokens: &[Spanned]) -> Option<Declaration> {
    let (name, rest) = tokens.split_first()?;
    let CssToken::Ident(name) = &name.token else {
        return None;
    };
    let (colon, value) = trim_whitespace(rest).split_first()?;
    if colon.token != CssToken::Colon {
        return None;
    }

    let (value, important) = strip_important(trim_whitespace(value));
    let value = trim_whitespace(value);
    let nested = value.iter().any(|t| {
        matches!(
            t.token,
            CssToken::LBrace | CssToken::RBrace | CssToken::Delim('!')
        )
    });
    if value.is_empty() || nested {
        return None;
    }

    let property = if name.starts_with("--") {
        name.clone()
    } else {
        name.to_ascii_lowercase()
    };
    Some(Declaration {
        property,
        value: span_text(src, value).to_string(),
        important,
    })
}

/// Check if the value tokens end with `!important`, and strip it if so.
fn strip_important(tokens: &[Spanned]) -> (&[Spanned], bool) {
    let Some((last, rest)) = tokens.split_last() else {
        return (tokens, false);
    };
    match &last.token {
        CssToken::Ident(word) if word.eq_ignore_ascii_case("important") => {}
        _ => return (tokens, false),
    }
    match trim_whitespace(rest).split_last() {
        Some((bang, before)) if bang.token == CssToken::Delim('!') => (before, true),
        _ => (tokens, false),
    }
}
