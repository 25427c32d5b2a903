mod error;
mod token;

pub use error::{LexicalError, LexicalErrorKind};
use std::iter::Peekable;
use std::rc::Rc;
use std::str::CharIndices;
pub use token::{Span, Token, TokenKind, KEYWORD_HASHMAP};

/// Byte-offset to 1-based line number mapping for error reporting.
#[derive(Debug, Clone)]
pub struct LineBreaks {
    line_starts: Rc<[u32]>,
}

impl LineBreaks {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((offset + 1) as u32);
            }
        }
        Self {
            line_starts: line_starts.into(),
        }
    }

    pub fn get_line(&self, offset: u32) -> u32 {
        self.line_starts.partition_point(|start| *start <= offset) as u32
    }

    pub fn get_line_from_span(&self, span: Span) -> u32 {
        self.get_line(span.start)
    }
}

#[derive(Debug)]
pub struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<CharIndices<'src>>,
    line_breaks: LineBreaks,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line_breaks: LineBreaks::new(source),
        }
    }

    pub fn get_line_breaks(&self) -> LineBreaks {
        self.line_breaks.clone()
    }

    pub fn get_lexeme(&self, span: &Span) -> Option<&'src str> {
        self.source.get(span.range())
    }

    pub fn next_token(&mut self) -> Result<Token, LexicalError> {
        self.skip_trivia();

        let Some((start, c)) = self.chars.next() else {
            return Ok(self.emit(TokenKind::Eof, self.source.len(), 0));
        };

        let kind = match c {
            '(' => TokenKind::LeftParenthesis,
            ')' => TokenKind::RightParenthesis,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            ',' => TokenKind::Comma,
            '-' => TokenKind::Minus,
            '+' => TokenKind::Plus,
            ';' => TokenKind::Semicolon,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '=' => match self.eat_if('=') {
                true => TokenKind::EqualEqual,
                false => TokenKind::Equal,
            },
            '<' => match self.eat_if('=') {
                true => TokenKind::LessThanEqual,
                false => TokenKind::LessThan,
            },
            '"' => return self.scan_string(start),
            c if c.is_ascii_digit() => return Ok(self.scan_number(start)),
            c if is_ident_start(c) => return Ok(self.scan_ident(start)),
            c => {
                return Err(LexicalError {
                    kind: LexicalErrorKind::Unrecognized(c),
                    span: Span::new(start as u32, c.len_utf8() as u32),
                })
            }
        };
        let length = self.offset() - start;
        Ok(self.emit(kind, start, length))
    }
}

impl<'src> Lexer<'src> {
    /// The byte offset just past the last consumed character.
    fn offset(&mut self) -> usize {
        match self.chars.peek() {
            Some((offset, _)) => *offset,
            None => self.source.len(),
        }
    }

    fn emit(&self, kind: TokenKind, start: usize, length: usize) -> Token {
        Token {
            kind,
            span: Span::new(start as u32, length as u32),
        }
    }

    fn eat_if(&mut self, expected: char) -> bool {
        match self.chars.peek() {
            Some((_, c)) if *c == expected => {
                let _ = self.chars.next();
                true
            }
            _ => false,
        }
    }

    fn skip_trivia(&mut self) {
        while let Some((_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                let _ = self.chars.next();
            } else if *c == '/' {
                // Only a comment when followed by a second slash.
                let mut probe = self.chars.clone();
                let _ = probe.next();
                if !matches!(probe.peek(), Some((_, '/'))) {
                    return;
                }
                while let Some((_, c)) = self.chars.next() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                return;
            }
        }
    }

    fn scan_string(&mut self, start: usize) -> Result<Token, LexicalError> {
        while let Some((_, c)) = self.chars.next() {
            if c == '"' {
                let length = self.offset() - start;
                return Ok(self.emit(TokenKind::StringLiteral, start, length));
            }
        }
        Err(LexicalError {
            kind: LexicalErrorKind::UnclosedString,
            span: Span::new(start as u32, (self.source.len() - start) as u32),
        })
    }

    fn scan_number(&mut self, start: usize) -> Token {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_ascii_digit()) {
            let _ = self.chars.next();
        }
        // A fractional part needs a digit after the dot, otherwise the dot is
        // left for the next token.
        let mut probe = self.chars.clone();
        if matches!(probe.next(), Some((_, '.'))) && matches!(probe.peek(), Some((_, c)) if c.is_ascii_digit())
        {
            let _ = self.chars.next();
            while matches!(self.chars.peek(), Some((_, c)) if c.is_ascii_digit()) {
                let _ = self.chars.next();
            }
        }
        let length = self.offset() - start;
        self.emit(TokenKind::NumericLiteral, start, length)
    }

    fn scan_ident(&mut self, start: usize) -> Token {
        while matches!(self.chars.peek(), Some((_, c)) if is_ident_continue(*c)) {
            let _ = self.chars.next();
        }
        let length = self.offset() - start;
        let lexeme = &self.source[start..start + length];
        let kind = KEYWORD_HASHMAP
            .get(lexeme)
            .copied()
            .unwrap_or(TokenKind::Ident);
        self.emit(kind, start, length)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut kinds = Vec::new();
        loop {
            let token = lexer.next_token().expect("valid source");
            if token.kind == TokenKind::Eof {
                return kinds;
            }
            kinds.push(token.kind);
        }
    }

    #[test]
    fn scans_generator_declaration_header() {
        assert_eq!(
            kinds("gen range(start, end) {"),
            vec![
                TokenKind::KeywordGen,
                TokenKind::Ident,
                TokenKind::LeftParenthesis,
                TokenKind::Ident,
                TokenKind::Comma,
                TokenKind::Ident,
                TokenKind::RightParenthesis,
                TokenKind::LeftBrace,
            ]
        );
    }

    #[test]
    fn mod_is_a_keyword_operator() {
        assert_eq!(
            kinds("a mod 2 == 0"),
            vec![
                TokenKind::Ident,
                TokenKind::KeywordMod,
                TokenKind::NumericLiteral,
                TokenKind::EqualEqual,
                TokenKind::NumericLiteral,
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            kinds("1 // yield i;\n2"),
            vec![TokenKind::NumericLiteral, TokenKind::NumericLiteral]
        );
    }

    #[test]
    fn unterminated_string_is_a_lexical_error() {
        let mut lexer = Lexer::new("\"oops");
        let error = lexer.next_token().expect_err("should fail");
        assert!(matches!(error.kind, LexicalErrorKind::UnclosedString));
    }

    #[test]
    fn line_breaks_map_offsets_to_lines() {
        let breaks = LineBreaks::new("ab\ncd\nef");
        assert_eq!(breaks.get_line(0), 1);
        assert_eq!(breaks.get_line(3), 2);
        assert_eq!(breaks.get_line(7), 3);
    }
}
