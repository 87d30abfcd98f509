//! Rule string tokenizer

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use crate::error::{Result, RuleError};

/// Token patterns, tried in order at each position.
const TOKEN_PATTERNS: &[&str] = &[
    // Condition atom: field, comparator, then a quoted string, a number or a word.
    r"(?P<cond>\w+\s*[<>=]\s*(?:'[^']*'|-?\d+(?:\.\d+)?\b|\w+))",
    r"(?P<and>\bAND\b)",
    r"(?P<or>\bOR\b)",
    r"(?P<lparen>\()",
    r"(?P<rparen>\))",
];

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(&TOKEN_PATTERNS.join("|")).unwrap());

/// Lexical token of a rule string
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Raw condition text like `age > 30`
    Condition(String),
    And,
    Or,
    LParen,
    RParen,
}

/// Tokenize a rule string, silently skipping text that is not a token.
pub fn tokenize(rule: &str) -> Result<Vec<Token>> {
    tokenize_with(rule, false)
}

/// Tokenize a rule string.
///
/// In strict mode any non-whitespace text between tokens is rejected with
/// [`RuleError::UnknownToken`] instead of being skipped.
pub fn tokenize_with(rule: &str, strict: bool) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut last_end = 0;

    for caps in TOKEN_RE.captures_iter(rule) {
        let Some(whole) = caps.get(0) else {
            continue;
        };

        if strict {
            reject_gap(&rule[last_end..whole.start()])?;
        }
        last_end = whole.end();

        let token = if let Some(cond) = caps.name("cond") {
            Token::Condition(cond.as_str().to_string())
        } else if caps.name("and").is_some() {
            Token::And
        } else if caps.name("or").is_some() {
            Token::Or
        } else if caps.name("lparen").is_some() {
            Token::LParen
        } else {
            Token::RParen
        };
        tokens.push(token);
    }

    if strict {
        reject_gap(&rule[last_end..])?;
    }

    if tokens.is_empty() {
        return Err(RuleError::InvalidRule(
            "no valid tokens found".to_string(),
        ));
    }

    trace!(count = tokens.len(), strict, "tokenized rule");
    Ok(tokens)
}

fn reject_gap(gap: &str) -> Result<()> {
    let stray = gap.trim();
    if stray.is_empty() {
        return Ok(());
    }
    debug!(fragment = stray, "rejecting unrecognized text in strict mode");
    Err(RuleError::UnknownToken(stray.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(text: &str) -> Token {
        Token::Condition(text.to_string())
    }

    #[test]
    fn test_tokenize_full_rule() {
        let tokens =
            tokenize("age > 30 AND (department = 'Sales' OR experience > 5)").unwrap();
        assert_eq!(
            tokens,
            vec![
                cond("age > 30"),
                Token::And,
                Token::LParen,
                cond("department = 'Sales'"),
                Token::Or,
                cond("experience > 5"),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_tokenize_without_spaces() {
        let tokens = tokenize("(a>1)OR(b<2)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                cond("a>1"),
                Token::RParen,
                Token::Or,
                Token::LParen,
                cond("b<2"),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_tokenize_operand_shapes() {
        assert_eq!(tokenize("balance > -2.5").unwrap(), vec![cond("balance > -2.5")]);
        assert_eq!(tokenize("city = 'New York'").unwrap(), vec![cond("city = 'New York'")]);
        assert_eq!(tokenize("code = 30abc").unwrap(), vec![cond("code = 30abc")]);
    }

    #[test]
    fn test_connectives_are_case_sensitive() {
        let tokens = tokenize("a > 1 and b > 2").unwrap();
        assert_eq!(tokens, vec![cond("a > 1"), cond("b > 2")]);
    }

    #[test]
    fn test_connective_inside_quotes_is_literal() {
        let tokens = tokenize("name = 'Tom AND Jerry'").unwrap();
        assert_eq!(tokens, vec![cond("name = 'Tom AND Jerry'")]);
    }

    #[test]
    fn test_lenient_mode_drops_unknown_text() {
        let tokens = tokenize("a > 1 && b > 2").unwrap();
        assert_eq!(tokens, vec![cond("a > 1"), cond("b > 2")]);

        let tokens = tokenize("age >= 30 AND b > 1").unwrap();
        assert_eq!(tokens, vec![Token::And, cond("b > 1")]);
    }

    #[test]
    fn test_strict_mode_rejects_unknown_text() {
        assert_eq!(
            tokenize_with("a > 1 && b > 2", true),
            Err(RuleError::UnknownToken("&&".to_string()))
        );
        assert_eq!(
            tokenize_with("a > 1 AND b > 2 ;", true),
            Err(RuleError::UnknownToken(";".to_string()))
        );
        assert!(tokenize_with("  a > 1 AND (b > 2)  ", true).is_ok());
    }

    #[test]
    fn test_no_tokens_is_invalid() {
        assert!(matches!(tokenize(""), Err(RuleError::InvalidRule(_))));
        assert!(matches!(tokenize("hello world"), Err(RuleError::InvalidRule(_))));
        assert!(matches!(tokenize_with("", true), Err(RuleError::InvalidRule(_))));
    }
}
