//! Splits Gerber text into directive tokens.
//!
//! Words end at `*`. `%...%` parameter blocks and `G04...*` comments are kept whole so the
//! parser sees them as one unit. Line breaks never separate tokens and are dropped from
//! token text.

use std::iter::FusedIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A `*` terminated word, e.g. `X100Y200D01`.
    Word,
    /// The content of a `%...%` block, without the `%` delimiters.
    Parameter,
    /// A `G04` comment, without the `G04` prefix.
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based line of the first character of the token.
    pub line: usize,
    /// The raw slice, delimiters excluded, newlines included.
    pub raw: &'a str,
}

pub fn tokenize(text: &str) -> Tokens<'_> {
    Tokens {
        text,
        offset: 0,
        line: 1,
    }
}

/// Lazy token iterator; call [`tokenize`] again to restart.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    text: &'a str,
    offset: usize,
    line: usize,
}

impl<'a> Tokens<'a> {
    fn skip_whitespace(&mut self) {
        let rest = &self.text[self.offset..];
        let trimmed = rest.trim_start();
        let skipped = &rest[..rest.len() - trimmed.len()];
        self.line += skipped.matches('\n').count();
        self.offset += skipped.len();
    }

    /// Consume up to (and including) `terminator`, or to the end of input.
    fn take_until(&mut self, start: usize, terminator: char) -> &'a str {
        let text: &'a str = self.text;
        let rest = &text[start..];
        let (raw, consumed) = match rest.find(terminator) {
            Some(index) => (&rest[..index], index + terminator.len_utf8()),
            None => (rest, rest.len()),
        };
        self.offset = start + consumed;
        raw
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        if self.offset >= self.text.len() {
            return None;
        }

        let line = self.line;
        let start = self.offset;
        let rest = &self.text[self.offset..];
        let (kind, raw) = if rest.starts_with('%') {
            (TokenKind::Parameter, self.take_until(self.offset + 1, '%'))
        } else if rest.starts_with("G04") {
            (TokenKind::Comment, self.take_until(self.offset + 3, '*'))
        } else {
            (TokenKind::Word, self.take_until(self.offset, '*'))
        };

        self.line += self.text[start..self.offset]
            .matches('\n')
            .count();

        let text = match kind {
            TokenKind::Comment => raw.replace(['\r', '\n'], "").trim().to_string(),
            _ => raw
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect(),
        };

        Some(Token {
            kind,
            text,
            line,
            raw,
        })
    }
}

impl FusedIterator for Tokens<'_> {}

/// Split a parameter block into its `*` terminated statements.
///
/// Aperture macro blocks are returned whole, their body belongs to the macro.
pub fn block_statements(block: &str) -> Vec<&str> {
    if block.starts_with("AM") {
        return vec![block.trim_end_matches('*')];
    }
    block
        .split('*')
        .filter(|statement| !statement.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn texts(input: &str) -> Vec<(TokenKind, String)> {
        tokenize(input)
            .map(|token| (token.kind, token.text))
            .collect()
    }

    #[test]
    fn test_words_blocks_and_comments() {
        // given
        let input = "G04 hello world*\n%FSLAX24Y24*%\n%MOMM*%\nD10*\nX100Y200D03*\nM02*\n";

        // when
        let tokens = texts(input);

        // then
        assert_eq!(tokens, vec![
            (TokenKind::Comment, "hello world".to_string()),
            (TokenKind::Parameter, "FSLAX24Y24*".to_string()),
            (TokenKind::Parameter, "MOMM*".to_string()),
            (TokenKind::Word, "D10".to_string()),
            (TokenKind::Word, "X100Y200D03".to_string()),
            (TokenKind::Word, "M02".to_string()),
        ]);
    }

    #[test]
    fn test_line_numbers() {
        // given
        let input = "%FSLAX24Y24*%\n\nD10*X1Y1D03*\n%AMBOX*\n21,1,$1,$2,0,0,0*%\nM02*";

        // when
        let lines: Vec<usize> = tokenize(input)
            .map(|token| token.line)
            .collect();

        // then
        assert_eq!(lines, vec![1, 3, 3, 4, 6]);
    }

    #[test]
    fn test_newlines_inside_tokens_are_removed() {
        // given
        let input = "X100\r\nY200\nD01*%AMBOX*\n1,1,$1,0,0*%";

        // when
        let tokens = texts(input);

        // then
        assert_eq!(tokens, vec![
            (TokenKind::Word, "X100Y200D01".to_string()),
            (TokenKind::Parameter, "AMBOX*1,1,$1,0,0*".to_string()),
        ]);
    }

    #[rstest]
    #[case("X100Y100D01", vec![(TokenKind::Word, "X100Y100D01".to_string())])]
    #[case("%MOMM*", vec![(TokenKind::Parameter, "MOMM*".to_string())])]
    #[case("G04 unterminated", vec![(TokenKind::Comment, "unterminated".to_string())])]
    #[case("", vec![])]
    #[case("  \n\n  ", vec![])]
    fn test_unterminated_and_empty_input(#[case] input: &str, #[case] expected: Vec<(TokenKind, String)>) {
        assert_eq!(texts(input), expected);
    }

    #[test]
    fn test_restartable() {
        let input = "D10*D11*";
        assert_eq!(tokenize(input).count(), 2);
        assert_eq!(tokenize(input).count(), 2);
    }

    #[rstest]
    #[case("FSLAX24Y24*MOMM*", vec!["FSLAX24Y24", "MOMM"])]
    #[case("ADD10C,0.5*", vec!["ADD10C,0.5"])]
    #[case("AMBOX*21,1,$1,$2,0,0,0*", vec!["AMBOX*21,1,$1,$2,0,0,0"])]
    fn test_block_statements(#[case] block: &str, #[case] expected: Vec<&str>) {
        assert_eq!(block_statements(block), expected);
    }
}
