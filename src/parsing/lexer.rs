//! State machine lexer
//!
//! Each step looks at one character and tries, in this order: whitespace,
//! comments, identifiers and keywords, numbers, operators and punctuation.
//! The first stage that accepts the character wins.

use miette::Diagnostic;
use thiserror::Error;
use tracing::trace;

use super::stream::CharacterStream;
use super::token::{Keyword, Operator, Punctuation, Token, TokenKind};
use crate::{DiagnosticRecord, Severity, Span, Type};

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum LexError {
    #[error("Unable to process character {character:?}")]
    UnexpectedCharacter {
        character: char,

        #[label("unknown character")]
        span: Span,
    },

    #[error("Unterminated block comment")]
    #[diagnostic(help("Every `/*` needs a matching `*/`, nested comments included"))]
    UnterminatedComment {
        #[label("comment starts here")]
        span: Span,
    },

    #[error("Invalid number literal `{text}`")]
    #[diagnostic(help("Integers must fit into a signed 64 bit integer, floats must be finite"))]
    InvalidNumber {
        text: String,

        #[label("this literal")]
        span: Span,
    },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedComment { span }
            | LexError::InvalidNumber { span, .. } => *span,
        }
    }

    pub fn record(&self) -> DiagnosticRecord {
        DiagnosticRecord::new(Severity::Error, self.to_string(), self.span())
    }
}

type Result<T> = std::result::Result<T, LexError>;

pub struct Lexer<'src> {
    stream: CharacterStream<'src>,
    tokens: Vec<Token>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            stream: CharacterStream::new(source),
            tokens: Vec::new(),
        }
    }

    /// Tokenize the whole input
    ///
    /// The returned stream always ends with a [TokenKind::EndOfInput] token.
    /// The first error halts tokenization.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        while !self.stream.is_at_end() {
            self.process_char()?;
        }

        let end = self.stream.position();
        self.tokens.push(Token::new(TokenKind::EndOfInput, end));
        Ok(self.tokens)
    }

    fn process_char(&mut self) -> Result<()> {
        let start = self.stream.position();
        let Some(character) = self.stream.next() else {
            return Ok(());
        };

        if character.is_whitespace() || self.process_comment(character, start)? {
            return Ok(());
        }

        let kind = if let Some(kind) = self.process_word(character, start) {
            kind
        } else if let Some(kind) = self.process_number(character, start)? {
            kind
        } else if let Some(kind) = self.process_operator(character) {
            kind
        } else if let Some(kind) = self.process_punctuation(character) {
            kind
        } else {
            return Err(LexError::UnexpectedCharacter {
                character,
                span: self.stream.span_from(start),
            });
        };

        let token = Token::new(kind, self.stream.span_from(start));
        trace!(kind = ?token.kind, line = token.line(), column = token.column(), "token");
        self.tokens.push(token);
        Ok(())
    }

    /// Skip `// ...` and nestable `/* ... */` comments
    fn process_comment(&mut self, character: char, start: Span) -> Result<bool> {
        if character != '/' {
            return Ok(false);
        }

        if self.stream.next_if('/') {
            while let Some(c) = self.stream.next() {
                if c == '\n' {
                    break;
                }
            }
            return Ok(true);
        }

        if !self.stream.next_if('*') {
            return Ok(false);
        }

        let mut depth = 1usize;
        while depth > 0 {
            match self.stream.next() {
                Some('*') if self.stream.next_if('/') => depth -= 1,
                Some('/') if self.stream.next_if('*') => depth += 1,
                Some(_) => {}
                None => {
                    return Err(LexError::UnterminatedComment {
                        span: Span {
                            end: start.start + 2,
                            ..start
                        },
                    })
                }
            }
        }

        Ok(true)
    }

    /// Identifiers, keywords, type keywords and boolean literals
    fn process_word(&mut self, character: char, start: Span) -> Option<TokenKind> {
        if !(character.is_ascii_alphabetic() || character == '_') {
            return None;
        }

        while self
            .stream
            .peek(0)
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.stream.next();
        }

        let word = self.stream.slice(self.stream.span_from(start));
        let kind = match word {
            "func" => TokenKind::Keyword(Keyword::Func),
            "return" => TokenKind::Keyword(Keyword::Return),
            "if" => TokenKind::Keyword(Keyword::If),
            "else" => TokenKind::Keyword(Keyword::Else),
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            _ => match Type::from_keyword(word) {
                Some(typ) => TokenKind::TypeKeyword(typ),
                None => TokenKind::Ident(word.to_string()),
            },
        };

        Some(kind)
    }

    /// Integer literals, and float literals of the form `digits.digits`
    fn process_number(&mut self, character: char, start: Span) -> Result<Option<TokenKind>> {
        if !character.is_ascii_digit() {
            return Ok(None);
        }

        self.skip_digits();

        let is_float = self.stream.peek(0) == Some('.')
            && self.stream.peek(1).is_some_and(|c| c.is_ascii_digit());
        if is_float {
            self.stream.next();
            self.skip_digits();
        }

        let span = self.stream.span_from(start);
        let text = self.stream.slice(span);
        let invalid = || LexError::InvalidNumber {
            text: text.to_string(),
            span,
        };

        let kind = if is_float {
            let value: f64 = text.parse().map_err(|_| invalid())?;
            if !value.is_finite() {
                return Err(invalid());
            }
            TokenKind::Float(value)
        } else {
            TokenKind::Int(text.parse().map_err(|_| invalid())?)
        };

        Ok(Some(kind))
    }

    fn skip_digits(&mut self) {
        while self.stream.peek(0).is_some_and(|c| c.is_ascii_digit()) {
            self.stream.next();
        }
    }

    fn process_operator(&mut self, character: char) -> Option<TokenKind> {
        let op = match character {
            '=' if self.stream.next_if('=') => Operator::Equals,
            '=' => Operator::Assign,
            '!' if self.stream.next_if('=') => Operator::NotEquals,
            '<' if self.stream.next_if('=') => Operator::LessEq,
            '<' => Operator::Less,
            '>' if self.stream.next_if('=') => Operator::GreaterEq,
            '>' => Operator::Greater,
            '&' if self.stream.next_if('&') => Operator::And,
            '|' if self.stream.next_if('|') => Operator::Or,
            ':' => Operator::Colon,
            '+' => Operator::Plus,
            '-' => Operator::Minus,
            '*' => Operator::Star,
            '/' => Operator::Slash,
            _ => return None,
        };

        Some(TokenKind::Operator(op))
    }

    fn process_punctuation(&mut self, character: char) -> Option<TokenKind> {
        let kind = match character {
            ';' => TokenKind::EndOfStatement,
            '(' => TokenKind::Punctuation(Punctuation::ParenOpen),
            ')' => TokenKind::Punctuation(Punctuation::ParenClose),
            '{' => TokenKind::Punctuation(Punctuation::CurlyOpen),
            '}' => TokenKind::Punctuation(Punctuation::CurlyClose),
            ',' => TokenKind::Punctuation(Punctuation::Comma),
            _ => return None,
        };

        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::token::render_tokens;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn ident(name: &str) -> TokenKind {
        TokenKind::Ident(String::from(name))
    }

    #[test]
    fn declaration() {
        assert_eq!(
            kinds("x: int = 5;"),
            vec![
                ident("x"),
                TokenKind::Operator(Operator::Colon),
                TokenKind::TypeKeyword(Type::Int),
                TokenKind::Operator(Operator::Assign),
                TokenKind::Int(5),
                TokenKind::EndOfStatement,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn keywords_and_literals() {
        assert_eq!(
            kinds("func if else return true false void float bool _a1"),
            vec![
                TokenKind::Keyword(Keyword::Func),
                TokenKind::Keyword(Keyword::If),
                TokenKind::Keyword(Keyword::Else),
                TokenKind::Keyword(Keyword::Return),
                TokenKind::Bool(true),
                TokenKind::Bool(false),
                TokenKind::TypeKeyword(Type::Void),
                TokenKind::TypeKeyword(Type::Float),
                TokenKind::TypeKeyword(Type::Bool),
                ident("_a1"),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn multi_character_operators() {
        assert_eq!(
            kinds("<= >= == != && || < > ="),
            vec![
                TokenKind::Operator(Operator::LessEq),
                TokenKind::Operator(Operator::GreaterEq),
                TokenKind::Operator(Operator::Equals),
                TokenKind::Operator(Operator::NotEquals),
                TokenKind::Operator(Operator::And),
                TokenKind::Operator(Operator::Or),
                TokenKind::Operator(Operator::Less),
                TokenKind::Operator(Operator::Greater),
                TokenKind::Operator(Operator::Assign),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn float_literal() {
        assert_eq!(
            kinds("1.25 7"),
            vec![TokenKind::Float(1.25), TokenKind::Int(7), TokenKind::EndOfInput]
        );
    }

    #[test]
    fn dot_without_digits_is_an_error() {
        let err = Lexer::new("1.").tokenize().unwrap_err();
        assert!(matches!(
            err,
            LexError::UnexpectedCharacter { character: '.', .. }
        ));
    }

    #[test]
    fn integer_out_of_range() {
        let err = Lexer::new("99999999999999999999").tokenize().unwrap_err();
        assert!(matches!(err, LexError::InvalidNumber { .. }));
    }

    #[test]
    fn float_out_of_range() {
        let source = format!("x: = 1{}.0;", "0".repeat(400));
        let err = Lexer::new(&source).tokenize().unwrap_err();
        assert!(matches!(err, LexError::InvalidNumber { .. }));
        assert_eq!((err.span().line, err.span().column), (1, 6));
    }

    #[test]
    fn large_finite_float_round_trips() {
        let source = format!("x: = 1{}.5;", "0".repeat(300));
        let tokens = Lexer::new(&source).tokenize().unwrap();
        let rendered = render_tokens(&tokens);
        assert_eq!(kinds(&rendered), kinds(&source));
    }

    #[test]
    fn record_has_position() {
        let err = Lexer::new("x: int = 5;\n  @").tokenize().unwrap_err();
        let record = err.record();
        assert_eq!(record.severity, Severity::Error);
        assert_eq!((record.line, record.column), (2, 3));
        assert_eq!(record.message, "Unable to process character '@'");
    }

    #[test]
    fn line_comment() {
        assert_eq!(
            kinds("// nothing here\nx"),
            vec![ident("x"), TokenKind::EndOfInput]
        );
    }

    #[test]
    fn nested_block_comment() {
        let tokens = Lexer::new("/* outer /* inner */ still-inside */ code")
            .tokenize()
            .unwrap();
        assert_eq!(tokens[0].kind, ident("code"));
        assert_eq!(tokens[0].column(), 38);
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn unterminated_block_comment() {
        let err = Lexer::new("x /* never closed").tokenize().unwrap_err();
        assert_eq!(
            err,
            LexError::UnterminatedComment {
                span: Span::new(2, 4, 1, 3)
            }
        );
    }

    #[test]
    fn unterminated_nested_block_comment() {
        let err = Lexer::new("/* a /* b */").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedComment { .. }));
    }

    #[test]
    fn unknown_character() {
        let err = Lexer::new("x: int = 5;\n  @").tokenize().unwrap_err();
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                character: '@',
                span: Span::new(14, 15, 2, 3),
            }
        );
    }

    #[test]
    fn tokens_start_at_first_character() {
        let tokens = Lexer::new("func main()\n  int").tokenize().unwrap();
        let positions: Vec<_> = tokens.iter().map(|t| (t.line(), t.column())).collect();
        assert_eq!(positions, vec![(1, 1), (1, 6), (1, 10), (1, 11), (2, 3), (2, 6)]);
    }

    #[test]
    fn rendering_relexes_to_same_tokens() {
        let source = "x: float = 2.0; func f(a: int, b: bool) int { if (a <= 3 && b) { return a * 2; }; return 0; };";
        let tokens = kinds(source);
        let rendered = render_tokens(&Lexer::new(source).tokenize().unwrap());
        assert_eq!(kinds(&rendered), tokens);
    }
}
