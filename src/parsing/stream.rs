use crate::Span;

/// Cursor over the source text with line and column tracking
///
/// Lines and columns start at 1. Reaching the end of the input is not an
/// error, [CharacterStream::next] and [CharacterStream::peek] just return `None`.
#[derive(Debug, Clone)]
pub struct CharacterStream<'src> {
    source: &'src str,
    chars: Vec<char>,
    cursor: usize,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'src> CharacterStream<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            cursor: 0,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Consume the current character
    pub fn next(&mut self) -> Option<char> {
        let character = *self.chars.get(self.cursor)?;
        self.cursor += 1;
        self.offset += character.len_utf8();

        if character == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(character)
    }

    /// Inspect the character `offset` positions ahead without consuming it
    pub fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.cursor + offset).copied()
    }

    /// Consume the current character if it is `expected`
    pub fn next_if(&mut self, expected: char) -> bool {
        if self.peek(0) == Some(expected) {
            self.next();
            true
        } else {
            false
        }
    }

    /// True once every character has been consumed
    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.chars.len()
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Zero-width span at the cursor
    pub fn position(&self) -> Span {
        Span::marker(self.offset, self.line, self.column)
    }

    /// Span from `start` up to the cursor
    pub fn span_from(&self, start: Span) -> Span {
        Span {
            end: self.offset,
            ..start
        }
    }

    /// Source text covered by `span`
    pub fn slice(&self, span: Span) -> &'src str {
        &self.source[span.start..span.end]
    }
}
