//! FTS5-style keyword queries.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! query   := and ("OR" and)*
//! and     := not (["AND"] not)*
//! not     := ["NOT"] primary ("NOT" primary)*
//! primary := word | word* | "quoted phrase" | "(" query ")"
//! ```
//!
//! Operators are upper case, as in FTS5. `a AND NOT b` reads as `a NOT b`,
//! and a leading `NOT b` matches anything without `b`. The lone token `0`
//! means "no keyword constraint".

use std::collections::HashMap;

use domain_ai::FALLBACK_KEYWORDS;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeywordError {
    #[error("unterminated phrase")]
    UnterminatedPhrase,
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("operator {0} is missing an operand")]
    DanglingOperator(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Single token; `prefix` matches any token starting with it
    Term { token: String, prefix: bool },
    /// Consecutive tokens
    Phrase(Vec<String>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    /// Left side without the right side
    Not(Box<Expr>, Box<Expr>),
    /// Anything not matching the inner expression
    Without(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeywordQuery {
    /// No keyword constraint
    Any,
    Expr(Expr),
}

/// Lower-cased alphanumeric tokens of `text`
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    Open,
    Close,
    And,
    Or,
    Not,
}

fn lex(input: &str) -> Result<Vec<Token>, KeywordError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '"' => {
                chars.next();
                let mut phrase = String::new();
                loop {
                    match chars.next() {
                        // "" inside a phrase is an escaped quote
                        Some('"') if chars.peek() == Some(&'"') => {
                            chars.next();
                            phrase.push('"');
                        }
                        Some('"') => break,
                        Some(ch) => phrase.push(ch),
                        None => return Err(KeywordError::UnterminatedPhrase),
                    }
                }
                tokens.push(Token::Quoted(phrase));
            }
            _ => {
                let mut word = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"' {
                        break;
                    }
                    word.push(ch);
                    chars.next();
                }
                tokens.push(match word.as_str() {
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "NOT" => Token::Not,
                    _ => Token::Word(word),
                });
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn or_expr(&mut self) -> Result<Option<Expr>, KeywordError> {
        let mut left = self.and_expr()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.and_expr()?.ok_or(KeywordError::DanglingOperator("OR"))?;
            let lhs = left.ok_or(KeywordError::DanglingOperator("OR"))?;
            left = Some(Expr::Or(Box::new(lhs), Box::new(right)));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Option<Expr>, KeywordError> {
        let mut left = self.not_expr()?;
        loop {
            let explicit = match self.peek() {
                Some(Token::And) => true,
                Some(Token::Word(_) | Token::Quoted(_) | Token::Open) => false,
                _ => break,
            };
            if explicit {
                self.pos += 1;
            }
            // A word with no searchable characters was consumed without
            // producing a term.
            let Some(right) = self.not_expr()? else {
                if explicit {
                    return Err(KeywordError::DanglingOperator("AND"));
                }
                continue;
            };
            left = Some(match (left, right) {
                (Some(lhs), Expr::Without(excluded)) => Expr::Not(Box::new(lhs), excluded),
                (Some(lhs), right) => Expr::And(Box::new(lhs), Box::new(right)),
                (None, _) if explicit => return Err(KeywordError::DanglingOperator("AND")),
                (None, right) => right,
            });
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Option<Expr>, KeywordError> {
        let mut left = if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            let excluded = self.primary()?.ok_or(KeywordError::DanglingOperator("NOT"))?;
            Some(Expr::Without(Box::new(excluded)))
        } else {
            self.primary()?
        };
        while self.peek() == Some(&Token::Not) {
            self.pos += 1;
            let right = self.primary()?.ok_or(KeywordError::DanglingOperator("NOT"))?;
            let lhs = left.ok_or(KeywordError::DanglingOperator("NOT"))?;
            left = Some(Expr::Not(Box::new(lhs), Box::new(right)));
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<Option<Expr>, KeywordError> {
        match self.peek().cloned() {
            Some(Token::Word(word)) => {
                self.pos += 1;
                Ok(word_expr(&word))
            }
            Some(Token::Quoted(phrase)) => {
                self.pos += 1;
                Ok(phrase_expr(tokenize(&phrase)))
            }
            Some(Token::Open) => {
                self.pos += 1;
                let inner = self.or_expr()?;
                if self.next() != Some(Token::Close) {
                    return Err(KeywordError::UnbalancedParens);
                }
                Ok(inner)
            }
            _ => Ok(None),
        }
    }
}

fn word_expr(word: &str) -> Option<Expr> {
    let (body, prefix) = match word.strip_suffix('*') {
        Some(body) => (body, true),
        None => (word, false),
    };
    let mut tokens = tokenize(body);
    match tokens.len() {
        0 => None,
        1 => tokens.pop().map(|token| Expr::Term { token, prefix }),
        // "two-person" searches as the phrase "two person"
        _ => Some(Expr::Phrase(tokens)),
    }
}

fn phrase_expr(mut tokens: Vec<String>) -> Option<Expr> {
    match tokens.len() {
        0 => None,
        1 => tokens.pop().map(|token| Expr::Term {
            token,
            prefix: false,
        }),
        _ => Some(Expr::Phrase(tokens)),
    }
}

/// Token counts of one document
pub struct Document {
    tokens: Vec<String>,
    counts: HashMap<String, usize>,
}

impl Document {
    pub fn new(text: &str) -> Self {
        let tokens = tokenize(text);
        let mut counts = HashMap::new();
        for token in &tokens {
            *counts.entry(token.clone()).or_insert(0) += 1;
        }
        Self { tokens, counts }
    }

    fn term_frequency(&self, token: &str, prefix: bool) -> usize {
        if prefix {
            self.counts
                .iter()
                .filter(|(t, _)| t.starts_with(token))
                .map(|(_, n)| n)
                .sum()
        } else {
            self.counts.get(token).copied().unwrap_or(0)
        }
    }

    fn phrase_frequency(&self, phrase: &[String]) -> usize {
        self.tokens
            .windows(phrase.len())
            .filter(|window| *window == phrase)
            .count()
    }
}

impl Expr {
    /// Term-frequency score, `None` when the document does not match.
    fn score(&self, doc: &Document) -> Option<f32> {
        match self {
            Expr::Term { token, prefix } => {
                let tf = doc.term_frequency(token, *prefix);
                (tf > 0).then_some(tf as f32)
            }
            Expr::Phrase(tokens) => {
                let tf = doc.phrase_frequency(tokens);
                (tf > 0).then_some(tf as f32)
            }
            Expr::And(l, r) => Some(l.score(doc)? + r.score(doc)?),
            Expr::Or(l, r) => match (l.score(doc), r.score(doc)) {
                (None, None) => None,
                (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
            },
            Expr::Not(l, r) => match r.score(doc) {
                Some(_) => None,
                None => l.score(doc),
            },
            Expr::Without(inner) => match inner.score(doc) {
                Some(_) => None,
                None => Some(0.0),
            },
        }
    }

    /// Right-hand sides of `NOT` outside any `OR` branch
    fn exclusions<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        match self {
            Expr::Not(l, r) => {
                l.exclusions(out);
                out.push(r);
            }
            Expr::And(l, r) => {
                l.exclusions(out);
                r.exclusions(out);
            }
            Expr::Without(inner) => out.push(inner),
            Expr::Or(..) | Expr::Term { .. } | Expr::Phrase(_) => {}
        }
    }

    fn positive_terms(&self, out: &mut Vec<String>) {
        match self {
            Expr::Term { token, .. } => out.push(token.clone()),
            Expr::Phrase(tokens) => out.push(format!("\"{}\"", tokens.join(" "))),
            Expr::And(l, r) | Expr::Or(l, r) => {
                l.positive_terms(out);
                r.positive_terms(out);
            }
            Expr::Not(l, _) => l.positive_terms(out),
            Expr::Without(_) => {}
        }
    }
}

impl KeywordQuery {
    /// Parse a keyword string. Blank input and the fallback token `0` yield
    /// [`KeywordQuery::Any`].
    pub fn parse(input: &str) -> Result<Self, KeywordError> {
        let input = input.trim();
        if input.is_empty() || input == FALLBACK_KEYWORDS {
            return Ok(KeywordQuery::Any);
        }

        let mut parser = Parser {
            tokens: lex(input)?,
            pos: 0,
        };
        let expr = parser.or_expr()?;
        match parser.peek() {
            None => {}
            Some(Token::Close) => return Err(KeywordError::UnbalancedParens),
            Some(Token::And) => return Err(KeywordError::DanglingOperator("AND")),
            Some(Token::Or) => return Err(KeywordError::DanglingOperator("OR")),
            Some(Token::Not) => return Err(KeywordError::DanglingOperator("NOT")),
            Some(_) => return Err(KeywordError::UnbalancedParens),
        }

        Ok(expr.map_or(KeywordQuery::Any, KeywordQuery::Expr))
    }

    /// Parse, degrading to an `OR` of the plain words when the string is not
    /// valid query syntax. Words following a `NOT` stay exclusions.
    pub fn parse_lenient(input: &str) -> Self {
        match Self::parse(input) {
            Ok(query) => query,
            Err(e) => {
                tracing::warn!(error = %e, keywords = input, "Keyword query did not parse, matching any word");
                Self::any_word(input)
            }
        }
    }

    fn any_word(input: &str) -> Self {
        let mut included = Vec::new();
        let mut excluded = Vec::new();
        let mut negate = false;

        for word in input.split(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '"')) {
            if word.eq_ignore_ascii_case("not") {
                negate = true;
                continue;
            }
            if word.eq_ignore_ascii_case("and") || word.eq_ignore_ascii_case("or") {
                continue;
            }
            let tokens = tokenize(word);
            if tokens.is_empty() {
                continue;
            }
            if negate {
                excluded.extend(tokens);
            } else {
                included.extend(tokens);
            }
            negate = false;
        }

        fn any_of(tokens: Vec<String>) -> Option<Expr> {
            tokens
                .into_iter()
                .map(|token| Expr::Term {
                    token,
                    prefix: false,
                })
                .reduce(|l, r| Expr::Or(Box::new(l), Box::new(r)))
        }

        let expr = match (any_of(included), any_of(excluded)) {
            (Some(l), Some(r)) => Expr::Not(Box::new(l), Box::new(r)),
            (Some(l), None) => l,
            (None, Some(r)) => Expr::Without(Box::new(r)),
            (None, None) => return KeywordQuery::Any,
        };
        KeywordQuery::Expr(expr)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, KeywordQuery::Any)
    }

    /// Score of a matching document. `Any` and purely negative queries
    /// score nothing since they contribute no keyword ranking.
    pub fn score(&self, text: &str) -> Option<f32> {
        match self {
            KeywordQuery::Any => None,
            KeywordQuery::Expr(expr) => expr
                .score(&Document::new(text))
                .filter(|score| *score > 0.0),
        }
    }

    /// True when `text` contains something the query explicitly excludes
    pub fn excludes(&self, text: &str) -> bool {
        let KeywordQuery::Expr(expr) = self else {
            return false;
        };
        let mut exclusions = Vec::new();
        expr.exclusions(&mut exclusions);
        if exclusions.is_empty() {
            return false;
        }

        let doc = Document::new(text);
        exclusions.iter().any(|e| e.score(&doc).is_some())
    }

    /// MongoDB `$text` search string: positive terms and phrases, excluded
    /// terms prefixed with `-`.
    ///
    /// `None` without positive terms: `$text` matches nothing for a purely
    /// negated string, so exclusions are left to the caller.
    pub fn to_text_search(&self) -> Option<String> {
        let KeywordQuery::Expr(expr) = self else {
            return None;
        };

        let mut parts = Vec::new();
        expr.positive_terms(&mut parts);
        if parts.is_empty() {
            return None;
        }

        let mut exclusions = Vec::new();
        expr.exclusions(&mut exclusions);
        for excluded in exclusions {
            let mut terms = Vec::new();
            excluded.positive_terms(&mut terms);
            parts.extend(terms.into_iter().map(|t| format!("-{}", t)));
        }

        Some(parts.join(" "))
    }
}
