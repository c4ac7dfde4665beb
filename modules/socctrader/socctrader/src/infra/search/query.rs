//! The search query language: a subset of the Lucene query-string syntax.
//!
//! ```text
//! teamName:AAAAA                 field term
//! aaa bbb  /  aaa OR bbb         either term
//! aaa AND bbb                    both terms (AND binds tighter than OR)
//! +currency:EUR -action:DEPOSIT  required / prohibited
//! "two words"  league*  *        phrase, prefix, everything
//! ```
//!
//! Text is split into lower-cased alphanumeric tokens; a `.` between digits
//! stays inside the token so `1.0` is one token. Numbers match exactly.

use serde_json::Value;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("query is empty")]
    Empty,
    #[error("operator '{0}' is missing an operand")]
    DanglingOperator(&'static str),
    #[error("field '{0}' has no value")]
    MissingValue(String),
    #[error("unterminated quoted phrase")]
    UnterminatedQuote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Any,
    Word(String),
    Prefix(String),
    Phrase(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Occur {
    Should,
    Must,
    MustNot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Term {
    field: Option<String>,
    pattern: Pattern,
    negated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    And,
    Or,
    Atom(Occur, Term),
}

/// A parsed query, ready to be evaluated against document bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    required: Vec<Term>,
    prohibited: Vec<Term>,
    /// OR of AND-groups.
    optional: Vec<Vec<Term>>,
}

impl Query {
    /// # Errors
    /// Returns a [`QueryError`] describing the first syntax problem.
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(QueryError::Empty);
        }

        let mut chains: Vec<Vec<(Occur, Term)>> = Vec::new();
        let mut current: Vec<(Occur, Term)> = Vec::new();
        let mut pending: Option<&'static str> = None;
        let mut join_next = false;

        for token in tokens {
            match token {
                Token::And | Token::Or if current.is_empty() || pending.is_some() => {
                    return Err(QueryError::DanglingOperator(operator_name(&token)));
                }
                Token::And => {
                    join_next = true;
                    pending = Some("AND");
                }
                Token::Or => {
                    chains.push(std::mem::take(&mut current));
                    pending = Some("OR");
                }
                Token::Atom(occur, term) => {
                    if !join_next && !current.is_empty() {
                        chains.push(std::mem::take(&mut current));
                    }
                    current.push((occur, term));
                    join_next = false;
                    pending = None;
                }
            }
        }

        if let Some(op) = pending {
            return Err(QueryError::DanglingOperator(op));
        }
        chains.push(current);

        let mut query = Self {
            required: Vec::new(),
            prohibited: Vec::new(),
            optional: Vec::new(),
        };
        for mut chain in chains {
            if chain.len() == 1 {
                let (occur, term) = chain.remove(0);
                match occur {
                    Occur::Must => query.required.push(term),
                    Occur::MustNot => query.prohibited.push(term),
                    Occur::Should => query.optional.push(vec![term]),
                }
            } else {
                query.optional.push(
                    chain
                        .into_iter()
                        .map(|(occur, mut term)| {
                            term.negated = occur == Occur::MustNot;
                            term
                        })
                        .collect(),
                );
            }
        }
        Ok(query)
    }

    /// Whether `body` (a document's JSON object) satisfies the query.
    #[must_use]
    pub fn matches(&self, body: &Value) -> bool {
        if !self.required.iter().all(|t| t.matches(body)) {
            return false;
        }
        if self.prohibited.iter().any(|t| t.matches(body)) {
            return false;
        }
        // With required clauses present the optional ones only rank, they do not filter.
        !self.required.is_empty()
            || self.optional.is_empty()
            || self
                .optional
                .iter()
                .any(|group| group.iter().all(|t| t.matches(body)))
    }
}

fn operator_name(token: &Token) -> &'static str {
    match token {
        Token::And => "AND",
        _ => "OR",
    }
}

impl Term {
    fn matches(&self, body: &Value) -> bool {
        let hit = match &self.field {
            Some(field) => body
                .get(field)
                .is_some_and(|value| value_matches(&self.pattern, value)),
            None => match body {
                Value::Object(fields) => fields
                    .iter()
                    .filter(|(name, _)| name.as_str() != VERSION_FIELD)
                    .any(|(_, value)| value_matches(&self.pattern, value)),
                other => value_matches(&self.pattern, other),
            },
        };
        hit != self.negated
    }
}

/// Bookkeeping field that unqualified terms skip.
const VERSION_FIELD: &str = "version";

fn value_matches(pattern: &Pattern, value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => items.iter().any(|v| value_matches(pattern, v)),
        Value::Object(map) => map.values().any(|v| value_matches(pattern, v)),
        Value::Number(n) => scalar_matches(pattern, &n.to_string()),
        Value::Bool(b) => scalar_matches(pattern, if *b { "true" } else { "false" }),
        Value::String(s) => text_matches(pattern, s),
    }
}

fn scalar_matches(pattern: &Pattern, scalar: &str) -> bool {
    match pattern {
        Pattern::Any => true,
        Pattern::Word(word) => word == scalar,
        Pattern::Prefix(prefix) => scalar.starts_with(prefix.as_str()),
        Pattern::Phrase(words) => words.len() == 1 && words[0] == scalar,
    }
}

fn text_matches(pattern: &Pattern, text: &str) -> bool {
    let tokens = analyze(text);
    match pattern {
        Pattern::Any => true,
        Pattern::Word(word) => tokens.iter().any(|t| t == word),
        Pattern::Prefix(prefix) => tokens.iter().any(|t| t.starts_with(prefix.as_str())),
        Pattern::Phrase(words) => {
            !words.is_empty() && tokens.windows(words.len()).any(|w| w == words.as_slice())
        }
    }
}

/// Lower-cased alphanumeric tokens of `text`.
fn analyze(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut token = String::new();

    for (i, &c) in chars.iter().enumerate() {
        let inner_dot = c == '.'
            && token.chars().next_back().is_some_and(|p| p.is_ascii_digit())
            && chars.get(i + 1).is_some_and(char::is_ascii_digit);
        if c.is_alphanumeric() || inner_dot {
            token.extend(c.to_lowercase());
        } else if !token.is_empty() {
            tokens.push(std::mem::take(&mut token));
        }
    }
    if !token.is_empty() {
        tokens.push(token);
    }
    tokens
}

fn word_pattern(raw: &str) -> Pattern {
    if raw == "*" {
        return Pattern::Any;
    }
    if let Some(stem) = raw.strip_suffix('*') {
        return Pattern::Prefix(stem.to_lowercase());
    }
    let mut tokens = analyze(raw);
    if tokens.len() == 1 {
        Pattern::Word(tokens.remove(0))
    } else {
        Pattern::Phrase(tokens)
    }
}

struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl Scanner<'_> {
    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn word(&mut self, stop_at_colon: bool) -> String {
        let mut word = String::new();
        while let Some(c) = self
            .chars
            .next_if(|&c| !c.is_whitespace() && c != '"' && !(stop_at_colon && c == ':'))
        {
            word.push(c);
        }
        word
    }

    fn phrase(&mut self) -> Result<Pattern, QueryError> {
        let mut text = String::new();
        for c in self.chars.by_ref() {
            if c == '"' {
                return Ok(Pattern::Phrase(analyze(&text)));
            }
            text.push(c);
        }
        Err(QueryError::UnterminatedQuote)
    }

    fn value(&mut self) -> Result<Option<Pattern>, QueryError> {
        match self.chars.peek() {
            Some('"') => {
                self.chars.next();
                self.phrase().map(Some)
            }
            Some(c) if !c.is_whitespace() => Ok(Some(word_pattern(&self.word(false)))),
            _ => Ok(None),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, QueryError> {
    let mut scanner = Scanner {
        chars: text.chars().peekable(),
    };
    let mut tokens = Vec::new();

    loop {
        scanner.skip_whitespace();
        let Some(&first) = scanner.chars.peek() else {
            break;
        };

        let occur = match first {
            '+' => Occur::Must,
            '-' => Occur::MustNot,
            _ => Occur::Should,
        };
        if occur != Occur::Should {
            scanner.chars.next();
        }

        if scanner.chars.peek() == Some(&'"') {
            scanner.chars.next();
            let pattern = scanner.phrase()?;
            tokens.push(Token::Atom(occur, Term { field: None, pattern, negated: false }));
            continue;
        }

        let word = scanner.word(true);
        if scanner.chars.next_if_eq(&':').is_some() {
            let pattern = scanner
                .value()?
                .ok_or_else(|| QueryError::MissingValue(word.clone()))?;
            tokens.push(Token::Atom(
                occur,
                Term { field: Some(word), pattern, negated: false },
            ));
            continue;
        }

        match (occur, word.as_str()) {
            (Occur::Should, "AND") => tokens.push(Token::And),
            (Occur::Should, "OR") => tokens.push(Token::Or),
            (_, "") if occur != Occur::Should => {
                // A bare `+` or `-`.
                return Err(QueryError::DanglingOperator(if occur == Occur::Must { "+" } else { "-" }));
            }
            _ => tokens.push(Token::Atom(
                occur,
                Term { field: None, pattern: word_pattern(&word), negated: false },
            )),
        }
    }

    Ok(tokens)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::*;

    fn team() -> Value {
        json!({"id": 3, "version": 2, "teamId": 1, "teamName": "Real Madrid CF", "leagueId": null})
    }

    fn money() -> Value {
        json!({"id": 8, "action": "DEPOSIT", "amount": "1.0", "currency": "EUR"})
    }

    fn hit(query: &str, body: &Value) -> bool {
        Query::parse(query).unwrap().matches(body)
    }

    #[test]
    fn bare_terms_are_or_combined_and_case_insensitive() {
        assert!(hit("madrid", &team()));
        assert!(hit("barcelona MADRID", &team()));
        assert!(!hit("barcelona valencia", &team()));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert!(hit("barcelona OR real AND madrid", &team()));
        assert!(!hit("real AND barcelona", &team()));
        assert!(hit("real AND barcelona OR cf", &team()));
    }

    #[test]
    fn field_terms_phrases_and_prefixes() {
        assert!(hit("teamName:real", &team()));
        assert!(!hit("leagueId:real", &team()));
        assert!(hit("teamName:\"real madrid\"", &team()));
        assert!(!hit("\"madrid real\"", &team()));
        assert!(hit("teamName:mad*", &team()));
        assert!(hit("*", &team()));
        assert!(!hit("leagueId:*", &team()));
    }

    #[test]
    fn bare_terms_skip_the_version() {
        assert!(!hit("2", &team()));
        assert!(hit("version:2", &team()));
        assert!(hit("3", &team()));
    }

    #[test]
    fn numbers_match_exactly() {
        assert!(hit("teamId:1", &team()));
        assert!(!hit("teamId:10", &team()));
        assert!(hit("amount:1.0", &money()));
        assert!(!hit("amount:1", &money()));
    }

    #[test]
    fn required_and_prohibited_clauses() {
        assert!(hit("+currency:EUR -action:WITHDRAW", &money()));
        assert!(!hit("+currency:USD", &money()));
        assert!(!hit("-action:deposit", &money()));
        assert!(hit("+currency:eur barcelona", &money()));
        assert!(!hit("currency:eur AND -action:deposit", &money()));
    }

    #[test]
    fn malformed_queries_are_rejected() {
        assert_eq!(Query::parse(""), Err(QueryError::Empty));
        assert_eq!(Query::parse("   "), Err(QueryError::Empty));
        assert_eq!(Query::parse("a AND"), Err(QueryError::DanglingOperator("AND")));
        assert_eq!(Query::parse("OR a"), Err(QueryError::DanglingOperator("OR")));
        assert_eq!(Query::parse("a OR AND b"), Err(QueryError::DanglingOperator("AND")));
        assert_eq!(
            Query::parse("teamName: x"),
            Err(QueryError::MissingValue("teamName".to_owned()))
        );
        assert_eq!(Query::parse("\"open"), Err(QueryError::UnterminatedQuote));
        assert_eq!(Query::parse("+"), Err(QueryError::DanglingOperator("+")));
    }
}
