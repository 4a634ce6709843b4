//! Standard lexemes of the Tarn scripting language
//!
//! Registration order matters only for ties: keywords are registered before
//! identifiers so `if` is a keyword while `iffy` is an identifier.

use crate::lexer::{Lexer, LexerBuilder};
use crate::rule::LexicalRule;

/// Lexeme identifiers used by the standard grammar
pub mod kinds {
    pub const WHITESPACE: &str = "whitespace";
    pub const LINE_COMMENT: &str = "line-comment";
    pub const BLOCK_COMMENT: &str = "block-comment";
    pub const KEYWORD: &str = "keyword";
    pub const IDENTIFIER: &str = "identifier";
    pub const NUMBER: &str = "number";
    pub const STRING: &str = "string";
    pub const OPERATOR: &str = "operator";
    pub const PUNCTUATION: &str = "punctuation";
}

pub const KEYWORDS: &[&str] = &[
    "var", "function", "class", "extends", "constructor", "new", "return", "if", "else", "while",
    "do", "for", "switch", "case", "default", "break", "continue", "goto", "this", "super",
    "null", "true", "false", "public", "private", "protected", "static", "get", "set",
];

/// Operators, matched longest first by the lexer
pub const OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "=", "==", "!=", "===", "!==", "<", ">", "<=", ">=", "&&", "||",
    "!", "&", "|", "^", "~", "<<", ">>", "++", "--", "+=", "-=", "*=", "/=", "%=", "&&=",
    "||=", "??", "??=", "?", "=>",
];

pub const PUNCTUATION: &str = "(){}[];,.:#";

fn digits() -> LexicalRule {
    LexicalRule::range('0', '9').at_least_once()
}

fn block_comment() -> LexicalRule {
    let stars = LexicalRule::chars("*").at_least_once();
    let body = LexicalRule::none_of("*").many();
    LexicalRule::sequence([
        LexicalRule::literal("/*"),
        body.clone(),
        stars.clone(),
        LexicalRule::sequence([LexicalRule::none_of("/*"), body, stars]).many(),
        LexicalRule::literal("/"),
    ])
}

fn identifier() -> LexicalRule {
    let start = LexicalRule::range('a', 'z')
        .or(LexicalRule::range('A', 'Z'))
        .or(LexicalRule::chars("_$"));
    let rest = start.clone().or(LexicalRule::range('0', '9'));
    start.then(rest.many())
}

fn number() -> LexicalRule {
    let fraction = LexicalRule::literal(".").then(digits());
    let exponent = LexicalRule::sequence([
        LexicalRule::chars("eE"),
        LexicalRule::chars("+-").optional(),
        digits(),
    ]);
    LexicalRule::sequence([digits(), fraction.optional(), exponent.optional()])
}

fn string(quote: char) -> LexicalRule {
    let quote_text = quote.to_string();
    let plain = LexicalRule::none_of(&format!("{quote}\\\n"));
    let escaped = LexicalRule::literal("\\").then(LexicalRule::any());
    LexicalRule::sequence([
        LexicalRule::literal(&quote_text),
        plain.or(escaped).many(),
        LexicalRule::literal(&quote_text),
    ])
}

/// Builder with every standard lexeme registered
pub fn script_lexer_builder() -> LexerBuilder {
    let mut builder = LexerBuilder::new();
    builder
        .skippable(kinds::WHITESPACE, LexicalRule::chars(" \t\r\n").at_least_once())
        .skippable(
            kinds::LINE_COMMENT,
            LexicalRule::literal("//").then(LexicalRule::none_of("\n").many()),
        )
        .skippable(kinds::BLOCK_COMMENT, block_comment())
        .lexeme(
            kinds::KEYWORD,
            LexicalRule::alternatives(KEYWORDS.iter().map(|k| LexicalRule::literal(k))),
        )
        .lexeme(kinds::IDENTIFIER, identifier())
        .lexeme(kinds::NUMBER, number())
        .lexeme(kinds::STRING, string('"').or(string('\'')))
        .lexeme(
            kinds::OPERATOR,
            LexicalRule::alternatives(OPERATORS.iter().map(|op| LexicalRule::literal(op))),
        )
        .lexeme(kinds::PUNCTUATION, LexicalRule::chars(PUNCTUATION));
    builder
}

/// Lexer over `source` using the standard lexemes
pub fn script_lexer(source: &str) -> Lexer {
    script_lexer_builder().build(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LexicalError;
    use tarn_core::LinePragma;

    fn lex(source: &str) -> Vec<(String, String)> {
        script_lexer(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| (t.kind().to_string(), t.text().to_string()))
            .collect()
    }

    fn texts(source: &str) -> Vec<String> {
        lex(source).into_iter().map(|(_, text)| text).collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(texts("123 45.67 1e10 2.5E-3"), vec!["123", "45.67", "1e10", "2.5E-3"]);
    }

    #[test]
    fn test_number_followed_by_member_access() {
        assert_eq!(texts("1.x"), vec!["1", ".", "x"]);
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens = lex("if iffy var variable _x $y");
        assert_eq!(tokens[0], (kinds::KEYWORD.into(), "if".into()));
        assert_eq!(tokens[1], (kinds::IDENTIFIER.into(), "iffy".into()));
        assert_eq!(tokens[2], (kinds::KEYWORD.into(), "var".into()));
        assert_eq!(tokens[3], (kinds::IDENTIFIER.into(), "variable".into()));
        assert_eq!(tokens[4].1, "_x");
        assert_eq!(tokens[5].1, "$y");
    }

    #[test]
    fn test_operators_longest_first() {
        assert_eq!(
            texts("a === b ??= c && d++ <<= e"),
            vec!["a", "===", "b", "??=", "c", "&&", "d", "++", "<<", "=", "e"]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            texts(r#""hello world" 'it''s' "a\"b""#),
            vec![r#""hello world""#, "'it'", "'s'", r#""a\"b""#]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "a // line\n/* block ** with * stars */ b /**/ c";
        assert_eq!(texts(source), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_division_is_not_a_comment() {
        assert_eq!(texts("a / b"), vec!["a", "/", "b"]);
    }

    #[test]
    fn test_statement() {
        let tokens = script_lexer("var x = 1;\nx += 2;\nreturn x;").tokenize().unwrap();
        assert_eq!(tokens.len(), 12);
        assert_eq!(tokens[5].text(), "x");
        assert_eq!(tokens[5].pragma(), LinePragma::new(2, 1));
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = script_lexer("x = \"abc");
        lexer.read().unwrap();
        lexer.read().unwrap();
        assert_eq!(
            lexer.read(),
            Err(LexicalError::NoLexemeMatched {
                pragma: LinePragma::new(1, 5)
            })
        );
    }
}
