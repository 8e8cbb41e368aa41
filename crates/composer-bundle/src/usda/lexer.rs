//! Tokenizer for the USDA text grammar.

use crate::BundleError;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Bare word: keywords, type names, attribute names (may contain `:`
    /// and `.`), `true`/`false`.
    Ident(String),
    /// Numeric literal, kept as text until the parser needs it.
    Number(String),
    /// Quoted string (single- or triple-quoted), unescaped.
    Str(String),
    /// `@path@` asset reference.
    Asset(String),
    /// `<path>` scene path.
    Path(String),
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Equals,
    Colon,
    Semicolon,
}

/// A token with its 1-based source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, details: impl Into<String>) -> BundleError {
        BundleError::MalformedDescription {
            line: self.line,
            column: self.column,
            details: details.into(),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':' || c == '.'
}

fn is_number_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '+' || c == '-'
}

/// Split `src` into tokens. `#` starts a comment running to end of line
/// (this covers the `#usda 1.0` header).
pub fn tokenize(src: &str) -> Result<Vec<Spanned>, BundleError> {
    let mut cur = Cursor::new(src);
    let mut out = Vec::new();

    while let Some(c) = cur.peek() {
        if c.is_whitespace() {
            cur.bump();
            continue;
        }
        if c == '#' {
            while let Some(c) = cur.peek() {
                if c == '\n' {
                    break;
                }
                cur.bump();
            }
            continue;
        }

        let (line, column) = (cur.line, cur.column);
        let token = match c {
            '(' => single(&mut cur, Token::LParen),
            ')' => single(&mut cur, Token::RParen),
            '{' => single(&mut cur, Token::LBrace),
            '}' => single(&mut cur, Token::RBrace),
            '[' => single(&mut cur, Token::LBracket),
            ']' => single(&mut cur, Token::RBracket),
            ',' => single(&mut cur, Token::Comma),
            '=' => single(&mut cur, Token::Equals),
            ':' => single(&mut cur, Token::Colon),
            ';' => single(&mut cur, Token::Semicolon),
            '"' | '\'' => Token::Str(lex_string(&mut cur, c)?),
            '@' => Token::Asset(lex_delimited(&mut cur, '@', '@')?),
            '<' => Token::Path(lex_delimited(&mut cur, '<', '>')?),
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let mut text = String::new();
                while let Some(c) = cur.peek() {
                    if !is_number_continue(c) {
                        break;
                    }
                    // An exponent sign is part of the number; any other sign
                    // after the first character ends it.
                    if (c == '-' || c == '+')
                        && !text.is_empty()
                        && !text.ends_with(['e', 'E'])
                    {
                        break;
                    }
                    text.push(c);
                    cur.bump();
                }
                Token::Number(text)
            }
            c if is_ident_start(c) => {
                let mut text = String::new();
                while let Some(c) = cur.peek() {
                    if !is_ident_continue(c) {
                        break;
                    }
                    text.push(c);
                    cur.bump();
                }
                Token::Ident(text)
            }
            other => return Err(cur.error(format!("unexpected character '{other}'"))),
        };
        out.push(Spanned {
            token,
            line,
            column,
        });
    }

    Ok(out)
}

fn single(cur: &mut Cursor<'_>, token: Token) -> Token {
    cur.bump();
    token
}

fn lex_delimited(cur: &mut Cursor<'_>, open: char, close: char) -> Result<String, BundleError> {
    cur.bump();
    let mut text = String::new();
    loop {
        match cur.bump() {
            Some(c) if c == close => return Ok(text),
            Some('\n') | None => {
                return Err(cur.error(format!("unterminated '{open}' literal")));
            }
            Some(c) => text.push(c),
        }
    }
}

fn lex_string(cur: &mut Cursor<'_>, quote: char) -> Result<String, BundleError> {
    cur.bump();
    // Triple-quoted strings may span lines and contain single quotes.
    let triple = if cur.peek() == Some(quote) {
        cur.bump();
        if cur.peek() == Some(quote) {
            cur.bump();
            true
        } else {
            // Empty string.
            return Ok(String::new());
        }
    } else {
        false
    };

    let mut text = String::new();
    loop {
        let Some(c) = cur.bump() else {
            return Err(cur.error("unterminated string"));
        };
        match c {
            '\\' => match cur.bump() {
                Some('n') => text.push('\n'),
                Some('t') => text.push('\t'),
                Some(other) => text.push(other),
                None => return Err(cur.error("unterminated escape")),
            },
            c if c == quote && !triple => return Ok(text),
            c if c == quote && triple => {
                if cur.peek() == Some(quote) {
                    cur.bump();
                    if cur.peek() == Some(quote) {
                        cur.bump();
                        return Ok(text);
                    }
                    text.push(quote);
                }
                text.push(quote);
            }
            '\n' if !triple => return Err(cur.error("newline in string")),
            c => text.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn header_is_a_comment() {
        assert!(tokens("#usda 1.0\n").is_empty());
    }

    #[test]
    fn attribute_line() {
        assert_eq!(
            tokens("double3 xformOp:translate = (1, -3.5, 2e-3)"),
            vec![
                Token::Ident("double3".into()),
                Token::Ident("xformOp:translate".into()),
                Token::Equals,
                Token::LParen,
                Token::Number("1".into()),
                Token::Comma,
                Token::Number("-3.5".into()),
                Token::Comma,
                Token::Number("2e-3".into()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn asset_path_and_scene_path() {
        assert_eq!(
            tokens("references = @./assets/Box/box.glb@</Box>"),
            vec![
                Token::Ident("references".into()),
                Token::Equals,
                Token::Asset("./assets/Box/box.glb".into()),
                Token::Path("/Box".into()),
            ]
        );
    }

    #[test]
    fn strings_single_and_triple() {
        assert_eq!(
            tokens(r#""a\"b" """multi
line""" """#),
            vec![
                Token::Str("a\"b".into()),
                Token::Str("multi\nline".into()),
                Token::Str(String::new()),
            ]
        );
    }

    #[test]
    fn unterminated_string_reports_position() {
        let err = tokenize("\n  \"oops").unwrap_err();
        match err {
            BundleError::MalformedDescription { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn negative_infinity_is_a_number() {
        assert_eq!(tokens("-inf"), vec![Token::Number("-inf".into())]);
    }
}
