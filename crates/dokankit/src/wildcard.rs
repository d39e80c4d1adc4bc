//! Wildcard matching for directory enumeration
//!
//! Patterns use the two driver wildcards: `?` matches exactly one character,
//! `*` matches any run (including the empty run). Everything else is literal.
//! Comparison is per Unicode scalar value.

use std::fmt;

use thiserror::Error;

/// A pattern that cannot be compiled.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern contains a null byte")]
    IllegalByte,
}

/// One unit of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Characters that must appear verbatim.
    Literal(Vec<char>),
    /// `?`
    AnyChar,
    /// `*` (a run of stars is stored once)
    AnyRun,
}

/// A tokenized wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardPattern {
    tokens: Vec<Token>,
}

impl WildcardPattern {
    /// Tokenize a pattern. The empty pattern is `*`.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.contains('\0') {
            return Err(PatternError::IllegalByte);
        }
        if pattern.is_empty() {
            return Ok(Self::match_all());
        }

        let mut tokens = Vec::new();
        let mut literal = Vec::new();
        for c in pattern.chars() {
            match c {
                '?' | '*' => {
                    if !literal.is_empty() {
                        tokens.push(Token::Literal(std::mem::take(&mut literal)));
                    }
                    if c == '?' {
                        tokens.push(Token::AnyChar);
                    } else if tokens.last() != Some(&Token::AnyRun) {
                        tokens.push(Token::AnyRun);
                    }
                }
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Ok(Self { tokens })
    }

    /// The pattern matching every name.
    pub fn match_all() -> Self {
        Self {
            tokens: vec![Token::AnyRun],
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_match_all(&self) -> bool {
        self.tokens == [Token::AnyRun]
    }

    /// Test `text` against this pattern.
    pub fn matches(&self, text: &str, case_sensitive: bool) -> bool {
        let text: Vec<char> = text.chars().collect();
        let tokens = &self.tokens;
        let last = tokens.len().saturating_sub(1);

        // (token index, text index) to resume from in free mode
        let mut backtrack: Vec<(usize, usize)> = Vec::new();
        let mut wi = 0;
        let mut ti = 0;
        let mut free = false;

        loop {
            if let Some((w, t)) = backtrack.pop() {
                wi = w;
                ti = t;
                free = true;
            }

            while wi < tokens.len() {
                match &tokens[wi] {
                    Token::AnyChar => {
                        if ti >= text.len() {
                            break;
                        }
                        // A free `?` may also start later.
                        if free && ti + 1 < text.len() {
                            backtrack.push((wi, ti + 1));
                        }
                        ti += 1;
                        free = false;
                    }
                    Token::AnyRun => {
                        free = true;
                        if wi == last {
                            ti = text.len();
                        }
                    }
                    Token::Literal(lit) => {
                        if free {
                            let Some(found) = find(&text, lit, ti, case_sensitive) else {
                                break;
                            };
                            if find(&text, lit, found + 1, case_sensitive).is_some() {
                                backtrack.push((wi, found + 1));
                            }
                            ti = found;
                        } else if !region_matches(&text, ti, lit, case_sensitive) {
                            break;
                        }
                        ti += lit.len();
                        free = false;
                    }
                }
                wi += 1;
            }

            if wi == tokens.len() && ti == text.len() {
                return true;
            }
            if backtrack.is_empty() {
                return false;
            }
        }
    }
}

impl fmt::Display for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            match token {
                Token::Literal(chars) => {
                    for c in chars {
                        write!(f, "{c}")?;
                    }
                }
                Token::AnyChar => f.write_str("?")?,
                Token::AnyRun => f.write_str("*")?,
            }
        }
        Ok(())
    }
}

/// Match a candidate name against a pattern.
///
/// `(None, None)` matches; exactly one `None` does not. A pattern that cannot
/// be compiled matches nothing.
pub fn matches(candidate: Option<&str>, pattern: Option<&str>, case_sensitive: bool) -> bool {
    match (candidate, pattern) {
        (None, None) => true,
        (Some(text), Some(pattern)) => WildcardPattern::parse(pattern)
            .map(|p| p.matches(text, case_sensitive))
            .unwrap_or(false),
        _ => false,
    }
}

fn chars_equal(a: char, b: char, case_sensitive: bool) -> bool {
    if a == b {
        return true;
    }
    if case_sensitive {
        return false;
    }
    a.to_uppercase().eq(b.to_uppercase()) || a.to_lowercase().eq(b.to_lowercase())
}

fn region_matches(text: &[char], at: usize, lit: &[char], case_sensitive: bool) -> bool {
    text.len() >= at + lit.len()
        && text[at..at + lit.len()]
            .iter()
            .zip(lit)
            .all(|(a, b)| chars_equal(*a, *b, case_sensitive))
}

fn find(text: &[char], lit: &[char], from: usize, case_sensitive: bool) -> Option<usize> {
    if text.len() < lit.len() {
        return None;
    }
    (from..=text.len() - lit.len()).find(|&at| region_matches(text, at, lit, case_sensitive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(text: &str, pattern: &str) -> bool {
        matches(Some(text), Some(pattern), true)
    }

    #[test]
    fn exact_literal() {
        assert!(m("report.txt", "report.txt"));
        assert!(!m("report.txt", "report.tx"));
        assert!(!m("report.tx", "report.txt"));
    }

    #[test]
    fn case_modes() {
        assert!(!matches(Some("Report.txt"), Some("report.txt"), true));
        assert!(matches(Some("Report.txt"), Some("report.txt"), false));
        assert!(matches(Some("STRASSE"), Some("strasse"), false));
        assert!(matches(Some("ÄBC"), Some("äb?"), false));
    }

    #[test]
    fn question_mark_consumes_one() {
        assert!(m("ab", "a?"));
        assert!(!m("a", "a?"));
        assert!(!m("abc", "a?"));
        assert!(m("abc", "???"));
    }

    #[test]
    fn star_backtracks() {
        assert!(m("abcabcxyz", "*abc*xyz"));
        assert!(m("abcabc", "*abc"));
        assert!(m("aXbXc", "a*b*c"));
        assert!(!m("abcabd", "*abc"));
        assert!(m("mississippi", "*sip*"));
        assert!(m("mississippi", "m*iss*ppi"));
    }

    // `?` right after `*` records its own backtrack point, so `*?` behaves as
    // "one or more characters" (Windows FindFirstFile semantics). Backtracking
    // only from literals would reject "aab" against "*?b".
    #[test]
    fn star_then_question_is_one_or_more() {
        assert!(m("aab", "*?b"));
        assert!(m("b1", "*?"));
        assert!(!m("", "*?"));
        assert!(m("abcd", "a*?d"));
        assert!(!m("ad", "a*?d"));
    }

    #[test]
    fn star_matches_everything() {
        assert!(m("", "*"));
        assert!(m("anything.at.all", "*"));
        assert!(m("anything", "**"));
        assert!(m("x", ""));
        assert!(m("", ""));
    }

    #[test]
    fn star_at_start_and_middle() {
        assert!(m("file.txt", "*.txt"));
        assert!(!m("file.txt.bak", "*.txt"));
        assert!(m("file.txt.bak", "*.txt*"));
        assert!(m("data_2024.csv", "data_*.csv"));
    }

    #[test]
    fn none_handling() {
        assert!(matches(None, None, true));
        assert!(!matches(Some("x"), None, true));
        assert!(!matches(None, Some("*"), false));
    }

    #[test]
    fn null_byte_matches_nothing() {
        assert_eq!(
            WildcardPattern::parse("a\0*"),
            Err(PatternError::IllegalByte)
        );
        assert!(!m("a", "a\0*"));
    }

    #[test]
    fn tokens_reconstruct_pattern() {
        let pattern = WildcardPattern::parse("a***b?c*").unwrap();
        assert_eq!(pattern.to_string(), "a*b?c*");
        assert_eq!(
            pattern.tokens(),
            &[
                Token::Literal(vec!['a']),
                Token::AnyRun,
                Token::Literal(vec!['b']),
                Token::AnyChar,
                Token::Literal(vec!['c']),
                Token::AnyRun,
            ]
        );
        assert!(WildcardPattern::parse("").unwrap().is_match_all());
    }
}
