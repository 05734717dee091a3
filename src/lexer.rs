use crate::{
    error::{Error, Result},
    token::{Span, Token, TokenKind, KEYWORDS},
};

/// The Mica lexer.
///
/// Walks the source a byte at a time (only ASCII is meaningful to the
/// grammar) and produces one token per [`next_token`] call. Whitespace and
/// comments are skipped; every produced token borrows its lexeme from the
/// source, so spans and lexemes always agree.
///
/// [`next_token`]: Lexer::next_token
pub struct Lexer<'src> {
    src: &'src str,
    cursor: usize,
    token_start: usize,
}

/// Eagerly lexes the whole input, stopping after the end-of-file token.
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::with_capacity(src.len() / 4 + 1);
    loop {
        let token = lexer.next_token()?;
        let done = token.is_eof();
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Lexer<'src> {
        Lexer {
            src,
            cursor: 0,
            token_start: 0,
        }
    }

    pub fn next_token(&mut self) -> Result<Token<'src>> {
        self.skip_whitespace_and_comments();
        self.token_start = self.cursor;

        let Some(byte) = self.peek() else {
            return Ok(Token::new(
                TokenKind::Eof,
                "",
                Span::new(self.cursor, self.cursor),
            ));
        };

        if byte.is_ascii_digit() {
            return self.lex_integer_literal();
        }
        if byte == b'\'' {
            return self.lex_char_literal();
        }
        if is_identifier_start(byte) {
            return Ok(self.lex_identifier_or_keyword());
        }
        self.lex_operator()
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(byte) if byte.is_ascii_whitespace() => {
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(byte) = self.peek() {
                        if byte == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.advance();
                    self.advance();
                    // Not nesting; an unterminated comment runs to end of file.
                    loop {
                        match self.peek() {
                            None => break,
                            Some(b'*') if self.peek_at(1) == Some(b'/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => self.advance(),
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_integer_literal(&mut self) -> Result<Token<'src>> {
        let mut kind = TokenKind::DecimalLiteral;
        let radix_prefix_might_follow = self.peek() == Some(b'0');
        self.advance();

        let mut digit_is_legal: fn(u8) -> bool = |b| b.is_ascii_digit();
        if radix_prefix_might_follow {
            match self.peek() {
                Some(b'b') => {
                    kind = TokenKind::BinaryLiteral;
                    digit_is_legal = |b| b == b'0' || b == b'1';
                    self.advance();
                }
                Some(b'o') => {
                    kind = TokenKind::OctalLiteral;
                    digit_is_legal = |b| (b'0'..=b'7').contains(&b);
                    self.advance();
                }
                Some(b'x') => {
                    kind = TokenKind::HexadecimalLiteral;
                    digit_is_legal = |b| b.is_ascii_hexdigit();
                    self.advance();
                }
                _ => {}
            }
        }

        while self.peek().is_some_and(digit_is_legal) {
            self.advance();
        }

        // `_` introduces a type suffix; its spelling is validated by the
        // type checker, the lexer only demands identifier shape.
        if self.peek() == Some(b'_') {
            let suffix_start = self.cursor;
            self.advance();
            if !self.peek().is_some_and(is_identifier_start) {
                let end = (self.cursor + 1).min(self.src.len());
                return Err(Error::new(
                    "Invalid integer literal suffix",
                    Span::new(suffix_start, end),
                ));
            }
            while self.peek().is_some_and(is_identifier_middle) {
                self.advance();
            }
        }

        Ok(self.produce(kind))
    }

    fn lex_char_literal(&mut self) -> Result<Token<'src>> {
        let start = self.token_start;
        self.advance();

        let Some(byte) = self.peek() else {
            return Err(Error::new(
                "unexpected end of file while parsing char literal",
                Span::new(start, self.cursor),
            ));
        };

        match byte {
            b'\'' => {
                return Err(Error::new(
                    "empty char literals are not valid",
                    Span::new(start, self.cursor + 1),
                ));
            }
            b'\n' | b'\r' | b'\t' => {
                return Err(Error::new(
                    "unexpected character inside char literal",
                    Span::new(start, self.cursor + 1),
                ));
            }
            b'\\' => {
                let escape_start = self.cursor;
                self.advance();
                match self.peek() {
                    Some(b'\'' | b'n' | b'r' | b't' | b'\\' | b'0') => self.advance(),
                    Some(b'x') => {
                        self.advance();
                        // Two hex digits, the first restricted to 0-7 so the
                        // value stays within ASCII.
                        if !self.peek().is_some_and(|b| (b'0'..=b'7').contains(&b)) {
                            return Err(self.invalid_escape(escape_start));
                        }
                        self.advance();
                        if !self.peek().is_some_and(|b| b.is_ascii_hexdigit()) {
                            return Err(self.invalid_escape(escape_start));
                        }
                        self.advance();
                    }
                    _ => return Err(self.invalid_escape(escape_start)),
                }
            }
            _ => self.advance_char(),
        }

        if self.peek() != Some(b'\'') {
            return Err(Error::new(
                "missing closing single quote for char literal",
                Span::new(start, self.cursor),
            ));
        }
        self.advance();

        Ok(self.produce(TokenKind::CharLiteral))
    }

    fn invalid_escape(&self, escape_start: usize) -> Error {
        let end = (self.cursor + 1).min(self.src.len());
        Error::new(
            "invalid escape sequence inside char literal",
            Span::new(escape_start, end),
        )
    }

    fn lex_identifier_or_keyword(&mut self) -> Token<'src> {
        while self.peek().is_some_and(is_identifier_middle) {
            self.advance();
        }
        let kind = KEYWORDS
            .get(self.lexeme())
            .copied()
            .unwrap_or(TokenKind::Identifier);
        self.produce(kind)
    }

    fn lex_operator(&mut self) -> Result<Token<'src>> {
        use TokenKind::*;
        let byte = self.peek().expect("caller checked for end of input");
        self.advance();

        let kind = match byte {
            b'&' => match self.peek() {
                Some(b'&') => {
                    self.advance();
                    self.advance_if(b'=', AmpAmpEq, AmpAmp)
                }
                Some(b'=') => {
                    self.advance();
                    AmpEq
                }
                _ => Amp,
            },
            b'|' => match self.peek() {
                Some(b'|') => {
                    self.advance();
                    self.advance_if(b'=', PipePipeEq, PipePipe)
                }
                Some(b'=') => {
                    self.advance();
                    PipeEq
                }
                _ => Pipe,
            },
            b'<' => match self.peek() {
                Some(b'<') => {
                    self.advance();
                    self.advance_if(b'=', ShlEq, Shl)
                }
                Some(b'=') => {
                    self.advance();
                    LessEq
                }
                _ => Less,
            },
            b'>' => match self.peek() {
                Some(b'>') => {
                    self.advance();
                    self.advance_if(b'=', ShrEq, Shr)
                }
                Some(b'=') => {
                    self.advance();
                    GreaterEq
                }
                _ => Greater,
            },
            b'+' => match self.peek() {
                Some(b'+') => {
                    self.advance();
                    PlusPlus
                }
                Some(b'=') => {
                    self.advance();
                    PlusEq
                }
                _ => Plus,
            },
            b'-' => match self.peek() {
                Some(b'-') => {
                    self.advance();
                    MinusMinus
                }
                Some(b'=') => {
                    self.advance();
                    MinusEq
                }
                _ => Minus,
            },
            b'=' => self.advance_if(b'=', EqEq, Eq),
            b'!' => self.advance_if(b'=', BangEq, Bang),
            b'*' => self.advance_if(b'=', StarEq, Star),
            b'/' => self.advance_if(b'=', SlashEq, Slash),
            b'%' => self.advance_if(b'=', PercentEq, Percent),
            b'^' => self.advance_if(b'=', CaretEq, Caret),
            b'.' => match (self.peek(), self.peek_at(1)) {
                (Some(b'.'), Some(b'=')) => {
                    self.advance();
                    self.advance();
                    DotDotEq
                }
                (Some(b'.'), Some(b'<')) => {
                    self.advance();
                    self.advance();
                    DotDotLess
                }
                _ => {
                    return Err(Error::new(
                        "unexpected character while lexing",
                        Span::new(self.token_start, self.cursor),
                    ));
                }
            },
            b'~' => Tilde,
            b'@' => At,
            b':' => Colon,
            b';' => Semicolon,
            b',' => Comma,
            b'(' => LParen,
            b')' => RParen,
            b'{' => LBrace,
            b'}' => RBrace,
            b'[' => LBracket,
            b']' => RBracket,
            _ => {
                return Err(Error::new(
                    "unexpected character while lexing",
                    Span::new(self.token_start, self.cursor),
                ));
            }
        };

        Ok(self.produce(kind))
    }
}

impl<'src> Lexer<'src> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.cursor).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.as_bytes().get(self.cursor + offset).copied()
    }

    fn advance(&mut self) {
        if self.cursor < self.src.len() {
            self.cursor += 1;
        }
    }

    /// Advances over one full character, so that the following lexeme slice
    /// stays on a UTF-8 boundary even for non-ASCII input.
    fn advance_char(&mut self) {
        if let Some(c) = self.src[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    fn advance_if(&mut self, expected: u8, then: TokenKind, otherwise: TokenKind) -> TokenKind {
        if self.peek() == Some(expected) {
            self.advance();
            then
        } else {
            otherwise
        }
    }

    fn span(&self) -> Span {
        Span::new(self.token_start, self.cursor)
    }

    fn lexeme(&self) -> &'src str {
        &self.src[self.token_start..self.cursor]
    }

    fn produce(&self, kind: TokenKind) -> Token<'src> {
        Token::new(kind, self.lexeme(), self.span())
    }
}

fn is_identifier_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b'$'
}

fn is_identifier_middle(byte: u8) -> bool {
    is_identifier_start(byte) || byte.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn lex_error(src: &str) -> Error {
        tokenize(src).unwrap_err()
    }

    /// Every token's lexeme must be exactly the source bytes at its span, and
    /// spans must be ascending and non-overlapping.
    fn assert_span_discipline(src: &str) {
        let tokens = tokenize(src).unwrap();
        let mut previous_end = 0;
        for token in &tokens {
            let span = token.span();
            assert!(span.start >= previous_end, "overlapping spans in {src:?}");
            assert_eq!(token.lexeme, &src[span.range()]);
            previous_end = span.end;
        }
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn single_tokens_with_exact_spans() {
        let tokens = tokenize("a + bc").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenKind::Identifier, "a", Span::new(0, 1)),
                Token::new(TokenKind::Plus, "+", Span::new(2, 3)),
                Token::new(TokenKind::Identifier, "bc", Span::new(4, 6)),
                Token::new(TokenKind::Eof, "", Span::new(6, 6)),
            ]
        );
    }

    #[test]
    fn operator_longest_match() {
        use TokenKind::*;
        assert_eq!(
            kinds("&& &&= &= & || ||= |= | == = != ! <<= << <= < >>= >> >= >"),
            vec![
                AmpAmp, AmpAmpEq, AmpEq, Amp, PipePipe, PipePipeEq, PipeEq, Pipe, EqEq, Eq,
                BangEq, Bang, ShlEq, Shl, LessEq, Less, ShrEq, Shr, GreaterEq, Greater, Eof,
            ]
        );
        assert_eq!(
            kinds("++ += + -- -= - *= * /= / %= % ^= ^ ..= ..<"),
            vec![
                PlusPlus, PlusEq, Plus, MinusMinus, MinusEq, Minus, StarEq, Star, SlashEq,
                Slash, PercentEq, Percent, CaretEq, Caret, DotDotEq, DotDotLess, Eof,
            ]
        );
        assert_eq!(
            kinds("~ @ : ; , ( ) { } [ ]"),
            vec![
                Tilde, At, Colon, Semicolon, Comma, LParen, RParen, LBrace, RBrace, LBracket,
                RBracket, Eof,
            ]
        );
    }

    #[test]
    fn adjacent_operators_split_greedily() {
        use TokenKind::*;
        // `<<=<` must lex as `<<=` `<`, not `<<` `=<`.
        assert_eq!(kinds("<<=<"), vec![ShlEq, Less, Eof]);
        assert_eq!(kinds("&&&"), vec![AmpAmp, Amp, Eof]);
        assert_eq!(kinds("+++"), vec![PlusPlus, Plus, Eof]);
    }

    #[test]
    fn keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("fn main var mut anon return if else for in true false null"),
            vec![
                Fn, Identifier, Var, Mut, Anon, Return, If, Else, For, In, True, False, Null,
                Eof,
            ]
        );
        assert_eq!(
            kinds("u8 u16 u32 u64 usize i8 i16 i32 i64 isize bool char"),
            vec![U8, U16, U32, U64, Usize, I8, I16, I32, I64, Isize, Bool, Char, Eof]
        );
        assert_eq!(
            kinds("$dollar _under a1z FN Mainly"),
            vec![Identifier, Identifier, Identifier, Identifier, Identifier, Eof]
        );
    }

    #[test]
    fn integer_literals_with_radix_and_suffix() {
        let tokens = tokenize("0b101_u8 0o17 0x2A_usize 42_i64 0 9").unwrap();
        let got: Vec<_> = tokens
            .iter()
            .map(|token| (token.kind, token.lexeme))
            .collect();
        assert_eq!(
            got,
            vec![
                (TokenKind::BinaryLiteral, "0b101_u8"),
                (TokenKind::OctalLiteral, "0o17"),
                (TokenKind::HexadecimalLiteral, "0x2A_usize"),
                (TokenKind::DecimalLiteral, "42_i64"),
                (TokenKind::DecimalLiteral, "0"),
                (TokenKind::DecimalLiteral, "9"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn integer_suffix_must_be_identifier_shaped() {
        let error = lex_error("1_%");
        assert_eq!(error.message, "Invalid integer literal suffix");
        assert_eq!(error.span, Span::new(1, 3));

        let error = lex_error("7_");
        assert_eq!(error.message, "Invalid integer literal suffix");
        assert_eq!(error.span, Span::new(1, 2));
    }

    #[test]
    fn radix_digits_stop_at_the_alphabet() {
        use TokenKind::*;
        // `0b2` is a binary literal `0b` followed by a decimal `2`.
        assert_eq!(kinds("0b2"), vec![BinaryLiteral, DecimalLiteral, Eof]);
        assert_eq!(kinds("0o8"), vec![OctalLiteral, DecimalLiteral, Eof]);
    }

    #[test]
    fn char_literals() {
        let tokens = tokenize(r"'a' '\n' '\\' '\'' '\0' '\x41'").unwrap();
        let got: Vec<_> = tokens
            .iter()
            .map(|token| (token.kind, token.lexeme))
            .collect();
        assert_eq!(
            got,
            vec![
                (TokenKind::CharLiteral, "'a'"),
                (TokenKind::CharLiteral, r"'\n'"),
                (TokenKind::CharLiteral, r"'\\'"),
                (TokenKind::CharLiteral, r"'\''"),
                (TokenKind::CharLiteral, r"'\0'"),
                (TokenKind::CharLiteral, r"'\x41'"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn char_literal_errors() {
        assert_eq!(
            lex_error("''").message,
            "empty char literals are not valid"
        );
        assert_eq!(
            lex_error("'a").message,
            "missing closing single quote for char literal"
        );
        assert_eq!(
            lex_error("'").message,
            "unexpected end of file while parsing char literal"
        );
        assert_eq!(
            lex_error(r"'\q'").message,
            "invalid escape sequence inside char literal"
        );
        // \x escapes must stay within ASCII: first digit is 0-7.
        assert_eq!(
            lex_error(r"'\x81'").message,
            "invalid escape sequence inside char literal"
        );
        assert_eq!(
            lex_error("'\n'").message,
            "unexpected character inside char literal"
        );
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = tokenize("a // x\nb /* y */ c").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenKind::Identifier, "a", Span::new(0, 1)),
                Token::new(TokenKind::Identifier, "b", Span::new(7, 8)),
                Token::new(TokenKind::Identifier, "c", Span::new(17, 18)),
                Token::new(TokenKind::Eof, "", Span::new(18, 18)),
            ]
        );
    }

    #[test]
    fn unterminated_block_comment_runs_to_eof() {
        let tokens = tokenize("a /* zzz").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenKind::Identifier, "a", Span::new(0, 1)),
                Token::new(TokenKind::Eof, "", Span::new(8, 8)),
            ]
        );
    }

    #[test]
    fn unknown_character_is_reported_with_its_span() {
        let error = lex_error("a ? b");
        assert_eq!(error.message, "unexpected character while lexing");
        assert_eq!(error.span, Span::new(2, 3));

        let error = lex_error("a . b");
        assert_eq!(error.message, "unexpected character while lexing");
        assert_eq!(error.span, Span::new(2, 3));
    }

    #[test]
    fn spans_cover_the_source_in_order() {
        assert_span_discipline("fn main(): void { var x: i32 = 1 + 2 * 3; }");
        assert_span_discipline("for (i in 0..<10) { i; } /* tail */");
        assert_span_discipline(r"'\x41' 0xff_u8 &&= ..=");
    }
}
