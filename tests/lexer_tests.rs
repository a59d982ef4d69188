use braq_compiler::lexer::{LexError, Lexer, Token};

fn lex_str(code: &str) -> Vec<Token> {
    Lexer::new().lex(code).expect("lexing should succeed")
}

/// Token stream with the whitespace boundaries filtered out.
fn lex_solid(code: &str) -> Vec<Token> {
    lex_str(code)
        .into_iter()
        .filter(|t| *t != Token::Whitespace)
        .collect()
}

#[test]
fn brackets_and_words() {
    let tokens = lex_solid("[do [print x]]");
    let expected = vec![
        Token::Bracket('['),
        Token::Word("do".into()),
        Token::Bracket('['),
        Token::Word("print".into()),
        Token::Word("x".into()),
        Token::Bracket(']'),
        Token::Bracket(']'),
    ];
    assert_eq!(tokens, expected);
}

#[test]
fn whitespace_runs_collapse() {
    let tokens = lex_str("a  \n\t b");
    let expected = vec![
        Token::Word("a".into()),
        Token::Whitespace,
        Token::Word("b".into()),
        Token::Whitespace, // the virtual trailing newline
    ];
    assert_eq!(tokens, expected);
}

#[test]
fn operator_words() {
    let tokens = lex_solid("<- $x @@ .WriteChar >>>");
    let expected = vec![
        Token::Word("<-".into()),
        Token::Word("$x".into()),
        Token::Word("@@".into()),
        Token::Word(".WriteChar".into()),
        Token::Word(">>>".into()),
    ];
    assert_eq!(tokens, expected);
}

#[test]
fn numeric_forms() {
    let tokens = lex_solid("12 -3 1_000 1.5 -2.25 0xFF 0b1010 12a");
    let expected = vec![
        Token::Int("12".into()),
        Token::Int("-3".into()),
        Token::Int("1_000".into()),
        Token::Float("1.5".into()),
        Token::Float("-2.25".into()),
        Token::Hex("0xFF".into()),
        Token::Bin("0b1010".into()),
        Token::Word("12a".into()),
    ];
    assert_eq!(tokens, expected);
}

#[test]
fn string_escapes() {
    let tokens = lex_solid("\"a\\n\\t\\x41\\\\ \\\"q\\\"\"");
    assert_eq!(tokens, vec![Token::Str("a\n\tA\\ \"q\"".into())]);
}

#[test]
fn char_literals() {
    assert_eq!(lex_solid("'b'"), vec![Token::Char("b".into())]);
    assert_eq!(lex_solid("'\\n'"), vec![Token::Char("\n".into())]);
    assert_eq!(lex_solid("'\\''"), vec![Token::Char("'".into())]);
}

#[test]
fn char_literal_wrong_length() {
    assert_eq!(Lexer::new().lex("'ab'"), Err(LexError::CharLength(2)));
    assert_eq!(Lexer::new().lex("''"), Err(LexError::CharLength(0)));
}

#[test]
fn comments_nest_and_disappear() {
    let tokens = lex_solid("a { skip { deeper [x] } more } b");
    assert_eq!(
        tokens,
        vec![Token::Word("a".into()), Token::Word("b".into())]
    );
}

#[test]
fn comment_errors() {
    assert_eq!(Lexer::new().lex("{ open"), Err(LexError::UnclosedComment));
    assert_eq!(Lexer::new().lex("a } b"), Err(LexError::UnbalancedComment));
}

#[test]
fn bad_escapes() {
    assert_eq!(Lexer::new().lex("\"\\q\""), Err(LexError::BadEscape('q')));
    assert_eq!(Lexer::new().lex("\"\\xZZ\""), Err(LexError::BadHexEscape));
}

#[test]
fn unterminated_literals() {
    assert_eq!(Lexer::new().lex("\"abc"), Err(LexError::UnterminatedString));
}

#[test]
fn final_token_closes_at_end_of_input() {
    // no trailing whitespace in the source; the virtual newline closes it
    let tokens = lex_str("abc");
    assert_eq!(
        tokens,
        vec![Token::Word("abc".into()), Token::Whitespace]
    );
}
