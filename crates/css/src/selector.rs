use std::ops::Range;

use thiserror::Error;

use crate::token::{CssToken, Spanned, tokenize};

/// Combinator between compound selectors in a complex selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: ancestor descendant
    Descendant,
    /// `>`: parent > child
    Child,
    /// `+`: prev + next
    NextSibling,
    /// `~`: prev ~ subsequent
    SubsequentSibling,
}

/// Attribute selector operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    /// `[attr]`
    Exists,
    /// `[attr=val]`
    Eq,
    /// `[attr~=val]`
    Includes,
    /// `[attr|=val]`
    DashMatch,
    /// `[attr^=val]`
    Prefix,
    /// `[attr$=val]`
    Suffix,
    /// `[attr*=val]`
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub op: AttrOp,
    pub value: Option<String>,
    /// Set by the trailing ` i` flag.
    pub case_insensitive: bool,
}

/// `an+b` coefficients of the `:nth-*` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nth {
    pub a: i32,
    pub b: i32,
}

impl Nth {
    /// Whether the 1-based `index` is selected.
    pub fn matches(self, index: i32) -> bool {
        if self.a == 0 {
            return index == self.b;
        }
        let (a, diff) = (i64::from(self.a), i64::from(index) - i64::from(self.b));
        diff % a == 0 && diff / a >= 0
    }
}

/// Pseudo-classes. Anything that depends on user interaction or document
/// state outside the markup is `Unsupported` and can never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
    NthChild(Nth),
    NthLastChild(Nth),
    NthOfType(Nth),
    NthLastOfType(Nth),
    Empty,
    Root,
    /// `:not(...)` containing a compound selector.
    Not(Box<CompoundSelector>),
    Unsupported(String),
}

/// A compound selector is a sequence of simple selectors
/// without any combinator between them (e.g. `div.foo#bar`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    /// Lowercased type selector.
    pub tag: Option<String>,
    pub universal: bool,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeSelector>,
    pub pseudo_classes: Vec<PseudoClass>,
    pub pseudo_element: Option<String>,
}

impl CompoundSelector {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn is_supported(&self) -> bool {
        self.pseudo_element.is_none()
            && self.pseudo_classes.iter().all(|pc| match pc {
                PseudoClass::Unsupported(_) => false,
                PseudoClass::Not(inner) => inner.is_supported(),
                _ => true,
            })
    }

    pub fn specificity(&self) -> Specificity {
        let mut spec = Specificity::new(
            0,
            u32::from(self.id.is_some()),
            (self.classes.len() + self.attributes.len()) as u32,
            u32::from(self.tag.is_some()) + u32::from(self.pseudo_element.is_some()),
        );
        for pc in &self.pseudo_classes {
            spec = spec.add(match pc {
                // :not() uses the specificity of its argument
                PseudoClass::Not(inner) => inner.specificity(),
                _ => Specificity::new(0, 0, 1, 0),
            });
        }
        spec
    }
}

/// A complex selector is a chain of compound selectors separated by combinators.
/// Stored right-to-left for efficient matching: `parts[0]` is the rightmost
/// (subject) compound selector.
///
/// Each element is `(compound_selector, combinator_to_the_left)`.
/// The last element's combinator is always `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub parts: Vec<(CompoundSelector, Option<Combinator>)>,
    /// Source text, trimmed.
    pub text: String,
}

impl ComplexSelector {
    pub fn specificity(&self) -> Specificity {
        self.parts
            .iter()
            .fold(Specificity::default(), |acc, (c, _)| acc.add(c.specificity()))
    }

    /// `false` when any part needs a pseudo-element or a pseudo-class that
    /// cannot be evaluated against static markup.
    pub fn is_supported(&self) -> bool {
        self.parts.iter().all(|(c, _)| c.is_supported())
    }

    pub fn has_universal(&self) -> bool {
        self.parts.iter().any(|(c, _)| c.universal)
    }
}

/// CSS specificity `(inline, ids, classes, types)`, compared lexicographically.
///   - `inline`: 1 for declarations from a `style` attribute
///   - `ids`: count of ID selectors
///   - `classes`: count of class selectors, attribute selectors, and pseudo-classes
///   - `types`: count of type selectors and pseudo-elements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Specificity {
    pub inline: u32,
    pub ids: u32,
    pub classes: u32,
    pub types: u32,
}

impl Specificity {
    pub const INLINE: Specificity = Specificity::new(1, 0, 0, 0);

    pub const fn new(inline: u32, ids: u32, classes: u32, types: u32) -> Self {
        Self {
            inline,
            ids,
            classes,
            types,
        }
    }

    /// Add two specificities component-wise.
    pub fn add(self, other: Specificity) -> Specificity {
        Specificity {
            inline: self.inline + other.inline,
            ids: self.ids + other.ids,
            classes: self.classes + other.classes,
            types: self.types + other.types,
        }
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.inline
            .cmp(&other.inline)
            .then(self.ids.cmp(&other.ids))
            .then(self.classes.cmp(&other.classes))
            .then(self.types.cmp(&other.types))
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector `{text}`: {kind}")]
pub struct SelectorError {
    pub text: String,
    pub kind: SelectorErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorErrorKind {
    #[error("empty selector")]
    Empty,
    #[error("unexpected `{0}`")]
    Unexpected(String),
    #[error("selector ends after a combinator")]
    DanglingCombinator,
    #[error("expected a name after `{0}`")]
    ExpectedName(char),
    #[error("unclosed `{0}`")]
    Unclosed(char),
    #[error("conflicting ids `#{0}` and `#{1}`")]
    ConflictingIds(String, String),
    #[error("invalid an+b expression `{0}`")]
    InvalidNth(String),
    #[error("no declaration block follows")]
    MissingBlock,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a comma-separated selector list. Each entry is parsed on its own so
/// one bad selector does not take its siblings down with it.
pub fn parse_selector_list(input: &str) -> Vec<Result<ComplexSelector, SelectorError>> {
    let tokens = tokenize(input);
    split_top_level(&tokens, |t| *t == CssToken::Comma)
        .into_iter()
        .map(|range| {
            let slice = &tokens[range];
            let text = span_text(input, slice).trim().to_string();
            SelectorParser::new(input, slice)
                .parse_complex(text.clone())
                .map_err(|kind| SelectorError { text, kind })
        })
        .collect()
}

/// Parse exactly one complex selector.
pub fn parse_selector(input: &str) -> Result<ComplexSelector, SelectorError> {
    let tokens = tokenize(input);
    let text = input.trim().to_string();
    SelectorParser::new(input, &tokens)
        .parse_complex(text.clone())
        .map_err(|kind| SelectorError { text, kind })
}

/// Index ranges of `tokens` separated by top-level tokens matching `is_sep`.
/// Brackets, parens and braces nest.
pub(crate) fn split_top_level(
    tokens: &[Spanned],
    is_sep: impl Fn(&CssToken) -> bool,
) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, t) in tokens.iter().enumerate() {
        match t.token {
            CssToken::LParen | CssToken::Function(_) | CssToken::LBracket | CssToken::LBrace => {
                depth += 1
            }
            CssToken::RParen | CssToken::RBracket | CssToken::RBrace => {
                depth = depth.saturating_sub(1)
            }
            _ if depth == 0 && is_sep(&t.token) => {
                out.push(start..i);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(start..tokens.len());
    out
}

/// Source text covered by a token slice.
pub(crate) fn span_text<'s>(src: &'s str, tokens: &[Spanned]) -> &'s str {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => &src[first.span.start..last.span.end],
        _ => "",
    }
}

struct SelectorParser<'a> {
    src: &'a str,
    tokens: &'a [Spanned],
    pos: usize,
}

type PResult<T> = Result<T, SelectorErrorKind>;

impl<'a> SelectorParser<'a> {
    fn new(src: &'a str, tokens: &'a [Spanned]) -> Self {
        Self {
            src,
            tokens,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&'a CssToken> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a CssToken> {
        self.tokens.get(self.pos + offset).map(|t| &t.token)
    }

    fn unexpected(&self) -> SelectorErrorKind {
        match self.tokens.get(self.pos) {
            Some(t) => SelectorErrorKind::Unexpected(self.src[t.span.clone()].to_string()),
            None => SelectorErrorKind::Empty,
        }
    }

    /// Returns whether any whitespace was skipped.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek() == Some(&CssToken::Whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_complex(mut self, text: String) -> PResult<ComplexSelector> {
        let mut parts_ltr: Vec<(CompoundSelector, Option<Combinator>)> = Vec::new();
        let mut pending: Option<Combinator> = None;

        self.skip_whitespace();
        if self.peek().is_none() {
            return Err(SelectorErrorKind::Empty);
        }

        loop {
            let compound = self.parse_compound()?;
            if compound.is_empty() {
                return Err(self.unexpected());
            }
            parts_ltr.push((compound, pending.take()));

            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                None => break,
                Some(CssToken::Delim('>')) => Combinator::Child,
                Some(CssToken::Delim('+')) => Combinator::NextSibling,
                Some(CssToken::Delim('~')) => Combinator::SubsequentSibling,
                Some(_) if had_whitespace => {
                    pending = Some(Combinator::Descendant);
                    continue;
                }
                Some(_) => return Err(self.unexpected()),
            };
            self.pos += 1;
            self.skip_whitespace();
            if self.peek().is_none() {
                return Err(SelectorErrorKind::DanglingCombinator);
            }
            pending = Some(combinator);
        }

        // In LTR order each combinator links a compound to the one on its left,
        // so after reversing parts[i].1 leads from parts[i] to parts[i + 1].
        parts_ltr.reverse();
        Ok(ComplexSelector {
            parts: parts_ltr,
            text,
        })
    }

    /// Parse a compound selector (sequence of simple selectors without combinators).
    fn parse_compound(&mut self) -> PResult<CompoundSelector> {
        let mut compound = CompoundSelector::default();
        let mut first = true;

        while let Some(token) = self.peek() {
            match token {
                CssToken::Ident(name) if first => {
                    compound.tag = Some(name.to_ascii_lowercase());
                    self.pos += 1;
                }
                CssToken::Delim('*') if first => {
                    compound.universal = true;
                    self.pos += 1;
                }
                CssToken::Hash { value, .. } => {
                    match &compound.id {
                        Some(existing) if existing != value => {
                            return Err(SelectorErrorKind::ConflictingIds(
                                existing.clone(),
                                value.clone(),
                            ));
                        }
                        _ => compound.id = Some(value.clone()),
                    }
                    self.pos += 1;
                }
                CssToken::Delim('.') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(CssToken::Ident(name)) => {
                            compound.classes.push(name.clone());
                            self.pos += 1;
                        }
                        _ => return Err(SelectorErrorKind::ExpectedName('.')),
                    }
                }
                CssToken::LBracket => {
                    let attr = self.parse_attribute()?;
                    compound.attributes.push(attr);
                }
                CssToken::Colon => self.parse_pseudo(&mut compound)?,
                CssToken::Delim('|') => return Err(self.unexpected()),
                _ => break,
            }
            first = false;
        }
        Ok(compound)
    }

    /// Parse an attribute selector `[name op? value? flag?]`.
    fn parse_attribute(&mut self) -> PResult<AttributeSelector> {
        self.pos += 1; // '['
        self.skip_whitespace();
        let name = match self.peek() {
            Some(CssToken::Ident(n)) => n.to_ascii_lowercase(),
            _ => return Err(SelectorErrorKind::ExpectedName('[')),
        };
        self.pos += 1;
        self.skip_whitespace();

        let op = match (self.peek(), self.peek_at(1)) {
            (Some(CssToken::RBracket), _) => {
                self.pos += 1;
                return Ok(AttributeSelector {
                    name,
                    op: AttrOp::Exists,
                    value: None,
                    case_insensitive: false,
                });
            }
            (Some(CssToken::Delim('=')), _) => AttrOp::Eq,
            (Some(CssToken::Delim(c)), Some(CssToken::Delim('='))) => match c {
                '~' => AttrOp::Includes,
                '|' => AttrOp::DashMatch,
                '^' => AttrOp::Prefix,
                '$' => AttrOp::Suffix,
                '*' => AttrOp::Substring,
                _ => return Err(self.unexpected()),
            },
            (None, _) => return Err(SelectorErrorKind::Unclosed('[')),
            _ => return Err(self.unexpected()),
        };
        self.pos += if op == AttrOp::Eq { 1 } else { 2 };
        self.skip_whitespace();

        let value = match self.tokens.get(self.pos) {
            Some(Spanned {
                token: CssToken::String(s),
                ..
            }) => s.clone(),
            Some(Spanned {
                token:
                    CssToken::Ident(_)
                    | CssToken::Number(_)
                    | CssToken::Dimension { .. }
                    | CssToken::Percentage(_),
                span,
            }) => self.src[span.clone()].to_string(),
            None => return Err(SelectorErrorKind::Unclosed('[')),
            _ => return Err(self.unexpected()),
        };
        self.pos += 1;
        self.skip_whitespace();

        let mut case_insensitive = false;
        if let Some(CssToken::Ident(flag)) = self.peek() {
            match flag.to_ascii_lowercase().as_str() {
                "i" => case_insensitive = true,
                "s" => {}
                _ => return Err(self.unexpected()),
            }
            self.pos += 1;
            self.skip_whitespace();
        }

        match self.peek() {
            Some(CssToken::RBracket) => {
                self.pos += 1;
                Ok(AttributeSelector {
                    name,
                    op,
                    value: Some(value),
                    case_insensitive,
                })
            }
            None => Err(SelectorErrorKind::Unclosed('[')),
            Some(_) => Err(self.unexpected()),
        }
    }

    /// Pseudo-class (`:first-child`, `:nth-child(...)`, `:not(...)`) or
    /// pseudo-element (`::before`, legacy `:after`).
    fn parse_pseudo(&mut self, compound: &mut CompoundSelector) -> PResult<()> {
        self.pos += 1;
        let double = self.peek() == Some(&CssToken::Colon);
        if double {
            self.pos += 1;
        }

        match self.peek() {
            Some(CssToken::Ident(name)) => {
                let lower = name.to_ascii_lowercase();
                self.pos += 1;
                let legacy_element = matches!(
                    lower.as_str(),
                    "before" | "after" | "first-line" | "first-letter"
                );
                if double || legacy_element {
                    compound.pseudo_element = Some(lower);
                    return Ok(());
                }
                let pc = match lower.as_str() {
                    "first-child" => PseudoClass::FirstChild,
                    "last-child" => PseudoClass::LastChild,
                    "only-child" => PseudoClass::OnlyChild,
                    "first-of-type" => PseudoClass::FirstOfType,
                    "last-of-type" => PseudoClass::LastOfType,
                    "only-of-type" => PseudoClass::OnlyOfType,
                    "empty" => PseudoClass::Empty,
                    "root" => PseudoClass::Root,
                    _ => PseudoClass::Unsupported(lower),
                };
                compound.pseudo_classes.push(pc);
                Ok(())
            }
            Some(CssToken::Function(name)) => {
                let lower = name.to_ascii_lowercase();
                self.pos += 1;
                let args = self.function_args()?;
                if double {
                    compound.pseudo_element = Some(lower);
                    return Ok(());
                }
                let nth = || {
                    let text = span_text(self.src, args);
                    parse_nth(text).ok_or_else(|| SelectorErrorKind::InvalidNth(text.trim().into()))
                };
                let pc = match lower.as_str() {
                    "nth-child" => PseudoClass::NthChild(nth()?),
                    "nth-last-child" => PseudoClass::NthLastChild(nth()?),
                    "nth-of-type" => PseudoClass::NthOfType(nth()?),
                    "nth-last-of-type" => PseudoClass::NthLastOfType(nth()?),
                    "not" => {
                        let mut inner = SelectorParser::new(self.src, args);
                        inner.skip_whitespace();
                        let compound = inner.parse_compound()?;
                        inner.skip_whitespace();
                        if compound.is_empty() || inner.peek().is_some() {
                            return Err(inner.unexpected());
                        }
                        PseudoClass::Not(Box::new(compound))
                    }
                    _ => PseudoClass::Unsupported(format!("{lower}()")),
                };
                compound.pseudo_classes.push(pc);
                Ok(())
            }
            _ => Err(SelectorErrorKind::ExpectedName(':')),
        }
    }

    /// Tokens between a function token and its matching `)`; the cursor ends
    /// past the `)`.
    fn function_args(&mut self) -> PResult<&'a [Spanned]> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token {
                CssToken::LParen | CssToken::Function(_) => depth += 1,
                CssToken::RParen if depth == 0 => {
                    let tokens = self.tokens;
                    let args = &tokens[start..self.pos];
                    self.pos += 1;
                    return Ok(args);
                }
                CssToken::RParen => depth -= 1,
                _ => {}
            }
            self.pos += 1;
        }
        Err(SelectorErrorKind::Unclosed('('))
    }
}

/// Parse the `an+b` microsyntax.
fn parse_nth(text: &str) -> Option<Nth> {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    match compact.as_str() {
        "odd" => return Some(Nth { a: 2, b: 1 }),
        "even" => return Some(Nth { a: 2, b: 0 }),
        "" => return None,
        _ => {}
    }
    let Some((a, b)) = compact.split_once('n') else {
        return Some(Nth {
            a: 0,
            b: compact.parse().ok()?,
        });
    };
    let a = match a {
        "" | "+" => 1,
        "-" => -1,
        other => other.parse().ok()?,
    };
    let b = match b {
        "" => 0,
        rest if rest.starts_with(['+', '-']) => rest.parse().ok()?,
        _ => return None,
    };
    Some(Nth { a, b })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(input: &str) -> ComplexSelector {
        parse_selector(input).unwrap()
    }

    fn tag(name: &str) -> CompoundSelector {
        CompoundSelector {
            tag: Some(name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_simple_type_selector() {
        let sel = one("DIV");
        assert_eq!(sel.parts, vec![(tag("div"), None)]);
        assert_eq!(sel.text, "DIV");
    }

    #[test]
    fn test_class_and_id() {
        let sel = one("div.foo#bar.baz");
        let compound = &sel.parts[0].0;
        assert_eq!(compound.tag.as_deref(), Some("div"));
        assert_eq!(compound.id.as_deref(), Some("bar"));
        assert_eq!(compound.classes, vec!["foo", "baz"]);
    }

    #[test]
    fn test_descendant_combinator() {
        let parts = one("div p").parts;
        // RTL: p first, div second
        assert_eq!(parts, vec![(tag("p"), Some(Combinator::Descendant)), (tag("div"), None)]);
    }

    #[test]
    fn test_mixed_combinators_are_right_to_left() {
        let parts = one("ul > li + li ~ a b").parts;
        let links: Vec<Option<Combinator>> = parts.iter().map(|(_, c)| *c).collect();
        assert_eq!(
            links,
            vec![
                Some(Combinator::Descendant),
                Some(Combinator::SubsequentSibling),
                Some(Combinator::NextSibling),
                Some(Combinator::Child),
                None,
            ]
        );
        assert_eq!(parts[0].0, tag("b"));
        assert_eq!(parts[4].0, tag("ul"));
    }

    #[test]
    fn test_combinator_without_spaces() {
        let parts = one("ul>li").parts;
        assert_eq!(parts, vec![(tag("li"), Some(Combinator::Child)), (tag("ul"), None)]);
    }

    #[test]
    fn test_selector_list_comma() {
        let list = parse_selector_list("h1, h2 ,h3");
        let texts: Vec<String> = list.into_iter().map(|s| s.unwrap().text).collect();
        assert_eq!(texts, vec!["h1", "h2", "h3"]);
    }

    #[test]
    fn test_bad_entry_does_not_poison_list() {
        let list = parse_selector_list("p, ??, a:not(.x, .y), em");
        assert!(list[0].is_ok());
        assert_eq!(list[1].as_ref().unwrap_err().text, "??");
        assert!(list[2].is_err());
        assert!(list[3].is_ok());
    }

    #[test]
    fn test_errors() {
        let kind = |s: &str| parse_selector(s).unwrap_err().kind;
        assert_eq!(kind("  "), SelectorErrorKind::Empty);
        assert_eq!(kind("p >"), SelectorErrorKind::DanglingCombinator);
        assert_eq!(kind("> p"), SelectorErrorKind::Unexpected(">".into()));
        assert_eq!(kind("p."), SelectorErrorKind::ExpectedName('.'));
        assert_eq!(kind("[href"), SelectorErrorKind::Unclosed('['));
        assert_eq!(
            kind("#a#b"),
            SelectorErrorKind::ConflictingIds("a".into(), "b".into())
        );
        assert_eq!(
            kind("li:nth-child(foo)"),
            SelectorErrorKind::InvalidNth("foo".into())
        );
    }

    #[test]
    fn test_specificity_components() {
        assert_eq!(one("div").specificity(), Specificity::new(0, 0, 0, 1));
        assert_eq!(one(".foo").specificity(), Specificity::new(0, 0, 1, 0));
        assert_eq!(one("#bar").specificity(), Specificity::new(0, 1, 0, 0));
        assert_eq!(one("div.foo#bar").specificity(), Specificity::new(0, 1, 1, 1));
        assert_eq!(one("div p").specificity(), Specificity::new(0, 0, 0, 2));
        assert_eq!(
            one("a[href]:first-child::before").specificity(),
            Specificity::new(0, 0, 2, 2)
        );
        assert_eq!(one("p:not(#x)").specificity(), Specificity::new(0, 1, 0, 1));
    }

    #[test]
    fn test_universal_zero_specificity() {
        let sel = one("*");
        assert!(sel.has_universal());
        assert_eq!(sel.specificity(), Specificity::default());
        assert_eq!(one("* > p").specificity(), Specificity::new(0, 0, 0, 1));
    }

    #[test]
    fn test_specificity_ordering() {
        let t = Specificity::new(0, 0, 0, 1);
        let c = Specificity::new(0, 0, 1, 0);
        let i = Specificity::new(0, 1, 0, 0);
        assert!(t < c && c < i);
        assert!(Specificity::new(0, 0, 12, 0) < i);
        assert!(Specificity::new(0, 9, 9, 9) < Specificity::INLINE);
    }

    #[test]
    fn test_dynamic_pseudo_classes_are_unsupported() {
        let sel = one("a:hover");
        assert_eq!(
            sel.parts[0].0.pseudo_classes,
            vec![PseudoClass::Unsupported("hover".into())]
        );
        assert!(!sel.is_supported());
        assert!(!one("a:not(:visited)").is_supported());
        assert!(!one("p:lang(en)").is_supported());
    }

    #[test]
    fn test_structural_pseudo_classes_are_supported() {
        let sel = one("li:first-child:nth-child(2n+1):not(.skip)");
        assert!(sel.is_supported());
        assert_eq!(sel.parts[0].0.pseudo_classes.len(), 3);
    }

    #[test]
    fn test_pseudo_elements() {
        for input in ["p::before", "p:after", "p::first-line"] {
            let sel = one(input);
            assert!(sel.parts[0].0.pseudo_element.is_some(), "{input}");
            assert!(!sel.is_supported(), "{input}");
        }
    }

    #[test]
    fn test_attribute_selector() {
        let attr = &one("[href]").parts[0].0.attributes[0];
        assert_eq!(attr.name, "href");
        assert_eq!(attr.op, AttrOp::Exists);
        assert_eq!(attr.value, None);
    }

    #[test]
    fn test_attribute_operators() {
        let cases = [
            (r#"[type="text"]"#, AttrOp::Eq, "text"),
            ("[class~=a]", AttrOp::Includes, "a"),
            ("[lang|=en]", AttrOp::DashMatch, "en"),
            ("[href^='http']", AttrOp::Prefix, "http"),
            (r#"[src$=".png"]"#, AttrOp::Suffix, ".png"),
            ("[title*=x]", AttrOp::Substring, "x"),
            ("[colspan=2]", AttrOp::Eq, "2"),
        ];
        for (input, op, value) in cases {
            let sel = parse_selector(input);
            let sel = match sel {
                Ok(sel) => sel,
                Err(e) => panic!("{input}: {e}"),
            };
            let attr = &sel.parts[0].0.attributes[0];
            assert_eq!(attr.op, op, "{input}");
            assert_eq!(attr.value.as_deref(), Some(value), "{input}");
        }
    }

    #[test]
    fn test_attribute_case_flag() {
        let attr = &one("[type=TEXT i]").parts[0].0.attributes[0];
        assert!(attr.case_insensitive);
    }

    #[test]
    fn test_nth_microsyntax() {
        assert_eq!(parse_nth("odd"), Some(Nth { a: 2, b: 1 }));
        assert_eq!(parse_nth(" EVEN "), Some(Nth { a: 2, b: 0 }));
        assert_eq!(parse_nth("3"), Some(Nth { a: 0, b: 3 }));
        assert_eq!(parse_nth("2n + 1"), Some(Nth { a: 2, b: 1 }));
        assert_eq!(parse_nth("-n+3"), Some(Nth { a: -1, b: 3 }));
        assert_eq!(parse_nth("n"), Some(Nth { a: 1, b: 0 }));
        assert_eq!(parse_nth("+4n-2"), Some(Nth { a: 4, b: -2 }));
        assert_eq!(parse_nth("2n1"), None);
        assert_eq!(parse_nth(""), None);
    }

    #[test]
    fn test_nth_matches() {
        let odd = Nth { a: 2, b: 1 };
        assert!(odd.matches(1) && odd.matches(3) && !odd.matches(2));
        let first_three = Nth { a: -1, b: 3 };
        assert!(first_three.matches(1) && first_three.matches(3));
        assert!(!first_three.matches(4));
        assert!(Nth { a: 0, b: 2 }.matches(2));
        assert!(!Nth { a: 0, b: 2 }.matches(4));
    }

    #[test]
    fn test_nth_extreme_offsets() {
        assert!(Nth { a: 1, b: i32::MIN }.matches(1));
        assert!(!Nth { a: -1, b: i32::MIN }.matches(1));
        assert!(Nth { a: i32::MIN, b: 1 }.matches(1));
        assert!(!Nth { a: 2, b: i32::MAX }.matches(i32::MIN));
    }
}
