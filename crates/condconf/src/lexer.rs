//! Lexer for conditional config sources.
//!
//! A source is made of lines. Most of them are raw configuration lines which are never tokenized, they are
//! copied verbatim. Only the assignment block (`{ ... }`, only as the first thing in a file) and predicate
//! headers (a line starting with `[`) are split into [Token]s.
//!
//! The [crate::parser::Parser] decides which mode to use for the next line. [Lexer::line_kind] classifies the
//! line at the cursor, [Lexer::raw_line] consumes it verbatim and [Lexer::next_token] reads expression tokens.
use crate::error::{ParseError, ParseErrorKind};
use crate::token::{Position, Token, TokenKind};
use std::iter::Peekable;
use std::str::CharIndices;

/// Whether a newline ends the current expression context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Newlines {
    /// Newlines are whitespace (assignment block)
    Skip,
    /// Newlines produce [TokenKind::EndOfLine] (predicate header)
    Significant,
}

/// Classification of the line at the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// First non-blank character is `[`
    Header,
    Raw,
    Eof,
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Does the source start with an assignment block?
    ///
    /// Only blanks and comments may precede the opening `{`.
    pub fn starts_with_block(&self) -> bool {
        let mut chars = self.chars.clone();
        while let Some((_, c)) = chars.next() {
            match c {
                '#' => {
                    for (_, c) in chars.by_ref() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                '{' => return true,
                c if c.is_whitespace() => {}
                _ => return false,
            }
        }
        false
    }

    /// Classify the line at the cursor without consuming it
    ///
    /// Must only be called at the start of a line.
    pub fn line_kind(&self) -> LineKind {
        let mut chars = self.chars.clone();
        if chars.peek().is_none() {
            return LineKind::Eof;
        }

        for (_, c) in chars {
            match c {
                ' ' | '\t' => continue,
                '[' => return LineKind::Header,
                _ => return LineKind::Raw,
            }
        }
        LineKind::Raw
    }

    /// Consume the rest of the current line and return it verbatim, without its line terminator
    pub fn raw_line(&mut self) -> &'a str {
        let input = self.input;
        let start = self.offset();
        while let Some((index, c)) = self.advance_char() {
            if c == '\n' {
                let line = &input[start..index];
                return line.strip_suffix('\r').unwrap_or(line);
            }
        }
        &input[start..]
    }

    pub fn next_token(&mut self, newlines: Newlines) -> Result<Token, ParseError> {
        self.skip_trivia(newlines);

        let position = self.position();
        let Some(&(start, ch)) = self.chars.peek() else {
            return Ok(Token::new(TokenKind::Eof, position));
        };

        let kind = match ch {
            '\n' => self.single(TokenKind::EndOfLine),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '*' => self.single(TokenKind::Star),
            '=' => self.with_equals(TokenKind::Assign, TokenKind::Eq),
            '<' => self.with_equals(TokenKind::Lt, TokenKind::Le),
            '>' => self.with_equals(TokenKind::Gt, TokenKind::Ge),
            '!' => {
                self.advance_char();
                if !self.eat('=') {
                    return Err(ParseError::new(
                        position,
                        ParseErrorKind::UnexpectedCharacter('!'),
                    ));
                }
                TokenKind::Ne
            }
            '"' | '\'' => self.read_string(ch, position)?,
            c if c.is_ascii_digit() => self.read_number(start, position)?,
            c if c.is_alphabetic() || c == '_' => self.read_word(start),
            c => {
                return Err(ParseError::new(
                    position,
                    ParseErrorKind::UnexpectedCharacter(c),
                ))
            }
        };

        Ok(Token::new(kind, position))
    }

    /// Skip blanks and comments, and newlines too when they are not significant
    fn skip_trivia(&mut self, newlines: Newlines) {
        while let Some(&(_, c)) = self.chars.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.advance_char();
                }
                '\n' if newlines == Newlines::Skip => {
                    self.advance_char();
                }
                '#' => {
                    while matches!(self.chars.peek(), Some(&(_, c)) if c != '\n') {
                        self.advance_char();
                    }
                }
                _ => break,
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance_char();
        kind
    }

    /// `<`, `<=` and friends
    fn with_equals(&mut self, alone: TokenKind, with_equals: TokenKind) -> TokenKind {
        self.advance_char();
        if self.eat('=') {
            with_equals
        } else {
            alone
        }
    }

    fn read_word(&mut self, start: usize) -> TokenKind {
        while matches!(self.chars.peek(), Some(&(_, c)) if c.is_alphanumeric() || c == '_') {
            self.advance_char();
        }

        let end = self.offset();
        match &self.input[start..end] {
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "in" => TokenKind::In,
            "True" | "true" => TokenKind::Boolean(true),
            "False" | "false" => TokenKind::Boolean(false),
            word => TokenKind::Identifier(word.to_owned()),
        }
    }

    /// Number literals are unsigned, a leading `-` is a separate token
    fn read_number(&mut self, start: usize, position: Position) -> Result<TokenKind, ParseError> {
        let mut decimal = false;
        self.eat_digits();

        if self.eat('.') {
            if !self.eat_digits() {
                return Err(self.malformed_number(start, position));
            }
            decimal = true;
        }

        if self.eat('e') || self.eat('E') {
            if !self.eat('+') {
                self.eat('-');
            }
            if !self.eat_digits() {
                return Err(self.malformed_number(start, position));
            }
            decimal = true;
        }

        if matches!(self.chars.peek(), Some(&(_, c)) if c.is_alphanumeric() || c == '_' || c == '.')
        {
            return Err(self.malformed_number(start, position));
        }

        let end = self.offset();
        let text = &self.input[start..end];
        if decimal {
            text.parse::<f64>()
                .map(TokenKind::Decimal)
                .map_err(|_| ParseError::new(position, ParseErrorKind::MalformedNumber(text.into())))
        } else {
            text.parse::<i64>().map(TokenKind::Integer).map_err(|_| {
                ParseError::new(position, ParseErrorKind::IntegerOverflow(text.into()))
            })
        }
    }

    /// Consume what is left of a broken number literal and report it
    fn malformed_number(&mut self, start: usize, position: Position) -> ParseError {
        while matches!(self.chars.peek(), Some(&(_, c)) if c.is_alphanumeric() || c == '_' || c == '.')
        {
            self.advance_char();
        }

        let end = self.offset();
        let text = &self.input[start..end];
        ParseError::new(position, ParseErrorKind::MalformedNumber(text.into()))
    }

    fn read_string(&mut self, quote: char, position: Position) -> Result<TokenKind, ParseError> {
        self.advance_char(); // opening quote
        let mut value = String::new();

        loop {
            let escape_position = self.position();
            let Some((_, c)) = self.advance_char() else {
                return Err(ParseError::new(position, ParseErrorKind::UnterminatedString));
            };

            match c {
                '\n' => return Err(ParseError::new(position, ParseErrorKind::UnterminatedString)),
                c if c == quote => return Ok(TokenKind::String(value)),
                '\\' => value.push(self.read_escape(escape_position, position)?),
                c => value.push(c),
            }
        }
    }

    /// Decode the escape sequence following a `\`
    fn read_escape(
        &mut self,
        escape_position: Position,
        string_position: Position,
    ) -> Result<char, ParseError> {
        let invalid =
            |sequence: String| ParseError::new(escape_position, ParseErrorKind::InvalidEscape(sequence));

        let Some((_, c)) = self.advance_char() else {
            return Err(ParseError::new(
                string_position,
                ParseErrorKind::UnterminatedString,
            ));
        };

        match c {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            '0' => Ok('\0'),
            '\\' | '"' | '\'' => Ok(c),
            'u' => {
                if !self.eat('{') {
                    return Err(invalid("\\u".into()));
                }

                let mut digits = String::new();
                while matches!(self.chars.peek(), Some(&(_, c)) if c.is_ascii_hexdigit()) {
                    if let Some((_, c)) = self.advance_char() {
                        digits.push(c);
                    }
                }

                if !self.eat('}') || digits.is_empty() || digits.len() > 6 {
                    return Err(invalid(format!("\\u{{{digits}")));
                }

                u32::from_str_radix(&digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| invalid(format!("\\u{{{digits}}}")))
            }
            '\n' => Err(ParseError::new(
                string_position,
                ParseErrorKind::UnterminatedString,
            )),
            c => Err(invalid(format!("\\{c}"))),
        }
    }

    fn eat_digits(&mut self) -> bool {
        let mut any = false;
        while matches!(self.chars.peek(), Some(&(_, c)) if c.is_ascii_digit()) {
            self.advance_char();
            any = true;
        }
        any
    }

    fn eat(&mut self, expected: char) -> bool {
        if matches!(self.chars.peek(), Some(&(_, c)) if c == expected) {
            self.advance_char();
            true
        } else {
            false
        }
    }

    fn offset(&mut self) -> usize {
        match self.chars.peek() {
            Some(&(index, _)) => index,
            None => self.input.len(),
        }
    }

    fn advance_char(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokens(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input);
        let mut kinds = vec![];
        loop {
            let token = lexer.next_token(Newlines::Significant).expect("must lex");
            if token.kind == TokenKind::Eof {
                return kinds;
            }
            kinds.push(token.kind);
        }
    }

    fn lex_error(input: &str) -> ParseError {
        let mut lexer = Lexer::new(input);
        loop {
            match lexer.next_token(Newlines::Skip) {
                Err(e) => return e,
                Ok(token) if token.kind == TokenKind::Eof => panic!("no error in {input:?}"),
                Ok(_) => {}
            }
        }
    }

    #[test]
    fn operators_and_keywords() {
        use TokenKind::*;
        assert_eq!(
            tokens("[not a == 1 and b != 2.5 or c in [x, y]] # comment"),
            vec![
                LBracket,
                Not,
                Identifier("a".into()),
                Eq,
                Integer(1),
                And,
                Identifier("b".into()),
                Ne,
                Decimal(2.5),
                Or,
                Identifier("c".into()),
                In,
                LBracket,
                Identifier("x".into()),
                Comma,
                Identifier("y".into()),
                RBracket,
                RBracket,
            ]
        );
        assert_eq!(
            tokens("< <= > >= = + - * ( ) { } ;"),
            vec![Lt, Le, Gt, Ge, Assign, Plus, Minus, Star, LParen, RParen, LBrace, RBrace, Semicolon]
        );
        assert_eq!(
            tokens("True False true false"),
            vec![Boolean(true), Boolean(false), Boolean(true), Boolean(false)]
        );
    }

    #[test]
    fn newline_handling() {
        let mut lexer = Lexer::new("a\nb");
        assert_eq!(
            lexer.next_token(Newlines::Significant).unwrap().kind,
            TokenKind::Identifier("a".into())
        );
        assert_eq!(
            lexer.next_token(Newlines::Significant).unwrap().kind,
            TokenKind::EndOfLine
        );

        let mut lexer = Lexer::new("a # comment\n\n  b");
        lexer.next_token(Newlines::Skip).unwrap();
        let b = lexer.next_token(Newlines::Skip).unwrap();
        assert_eq!(b.kind, TokenKind::Identifier("b".into()));
        assert_eq!(b.position, Position::new(3, 3));
    }

    #[test]
    fn strings() {
        assert_eq!(
            tokens(r#""a\"b\\c\n" 'it''s' "\u{e9}""#),
            vec![
                TokenKind::String("a\"b\\c\n".into()),
                TokenKind::String("it".into()),
                TokenKind::String("s".into()),
                TokenKind::String("é".into()),
            ]
        );
    }

    #[test]
    fn numbers() {
        use TokenKind::*;
        assert_eq!(
            tokens("0 42 1.5 2e3 1.5E-2"),
            vec![Integer(0), Integer(42), Decimal(1.5), Decimal(2000.0), Decimal(0.015)]
        );
    }

    #[test]
    fn positions() {
        let mut lexer = Lexer::new("{\n  foo = 'x'\n}");
        let positions: Vec<Position> = std::iter::from_fn(|| {
            let token = lexer.next_token(Newlines::Skip).unwrap();
            (token.kind != TokenKind::Eof).then_some(token.position)
        })
        .collect();

        assert_eq!(
            positions,
            vec![
                Position::new(1, 1),
                Position::new(2, 3),
                Position::new(2, 7),
                Position::new(2, 9),
                Position::new(3, 1),
            ]
        );
    }

    #[test]
    fn errors() {
        assert_eq!(
            lex_error("x = \"abc"),
            ParseError::new(Position::new(1, 5), ParseErrorKind::UnterminatedString)
        );
        assert_eq!(
            lex_error("'abc\n'"),
            ParseError::new(Position::new(1, 1), ParseErrorKind::UnterminatedString)
        );
        assert_eq!(
            lex_error("  \"a\\qb\""),
            ParseError::new(Position::new(1, 5), ParseErrorKind::InvalidEscape("\\q".into()))
        );
        assert_eq!(
            lex_error("1.2.3"),
            ParseError::new(Position::new(1, 1), ParseErrorKind::MalformedNumber("1.2.3".into()))
        );
        assert_eq!(
            lex_error("x 12abc"),
            ParseError::new(Position::new(1, 3), ParseErrorKind::MalformedNumber("12abc".into()))
        );
        assert_eq!(
            lex_error("1."),
            ParseError::new(Position::new(1, 1), ParseErrorKind::MalformedNumber("1.".into()))
        );
        assert_eq!(
            lex_error("99999999999999999999"),
            ParseError::new(
                Position::new(1, 1),
                ParseErrorKind::IntegerOverflow("99999999999999999999".into())
            )
        );
        assert_eq!(
            lex_error("a ! b"),
            ParseError::new(Position::new(1, 3), ParseErrorKind::UnexpectedCharacter('!'))
        );
        assert_eq!(
            lex_error("a $ b"),
            ParseError::new(Position::new(1, 3), ParseErrorKind::UnexpectedCharacter('$'))
        );
    }

    #[test]
    fn line_classification() {
        let mut lexer = Lexer::new("key = value\r\n  [flag]\n\nlast");
        assert_eq!(lexer.line_kind(), LineKind::Raw);
        assert_eq!(lexer.raw_line(), "key = value");
        assert_eq!(lexer.line_kind(), LineKind::Header);
        assert_eq!(lexer.raw_line(), "  [flag]");
        assert_eq!(lexer.line_kind(), LineKind::Raw);
        assert_eq!(lexer.raw_line(), "");
        assert_eq!(lexer.raw_line(), "last");
        assert_eq!(lexer.line_kind(), LineKind::Eof);
    }

    #[test]
    fn block_detection() {
        assert!(Lexer::new("# leading comment\n\n  { a = 1 }").starts_with_block());
        assert!(!Lexer::new("key = value\n{ a = 1 }").starts_with_block());
        assert!(!Lexer::new("").starts_with_block());
    }
}
