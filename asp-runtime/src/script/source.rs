//! # Source 模块
//!
//! 带位置信息的字符流。Lexer 只依赖 [`CharSource`] 能力，不直接读取文件。

use std::fmt;
use std::iter::Peekable;
use std::sync::Arc;
use std::str::Chars;

use serde::{Deserialize, Serialize};

/// 源码位置（行列均从 1 开始）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// 源名称（通常是文件路径）
    pub source_name: Arc<str>,
    /// 行号
    pub line: usize,
    /// 列号
    pub column: usize,
}

impl Location {
    pub fn new(source_name: impl Into<Arc<str>>, line: usize, column: usize) -> Self {
        Self {
            source_name: source_name.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source_name, self.line, self.column)
    }
}

/// 带位置的字符
#[derive(Debug, Clone, PartialEq)]
pub struct SourceChar {
    pub ch: char,
    pub location: Location,
}

/// 带位置信息的字符流
pub trait CharSource {
    /// 源名称
    fn source_name(&self) -> Arc<str>;

    /// 读取下一个字符
    fn next_char(&mut self) -> Option<SourceChar>;

    /// 查看下一个字符（不前进）
    fn peek_char(&mut self) -> Option<char>;

    /// 下一个字符的位置；流结束时为结尾位置
    fn location(&self) -> Location;
}

/// 内存字符串字符流
pub struct StrSource<'a> {
    name: Arc<str>,
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> StrSource<'a> {
    pub fn new(name: impl Into<Arc<str>>, text: &'a str) -> Self {
        Self {
            name: name.into(),
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
        }
    }
}

impl CharSource for StrSource<'_> {
    fn source_name(&self) -> Arc<str> {
        self.name.clone()
    }

    fn next_char(&mut self) -> Option<SourceChar> {
        let ch = self.chars.next()?;
        let location = self.location();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(SourceChar { ch, location })
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn location(&self) -> Location {
        Location::new(self.name.clone(), self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_lines_and_columns() {
        let mut source = StrSource::new("t.asp", "ab\nc");
        let a = source.next_char().unwrap();
        assert_eq!((a.ch, a.location.line, a.location.column), ('a', 1, 1));
        source.next_char();
        let newline = source.next_char().unwrap();
        assert_eq!((newline.location.line, newline.location.column), (1, 3));
        assert_eq!(source.peek_char(), Some('c'));
        let c = source.next_char().unwrap();
        assert_eq!((c.location.line, c.location.column), (2, 1));
        assert!(source.next_char().is_none());
        assert_eq!(source.location().to_string(), "t.asp:2:2");
    }
}
