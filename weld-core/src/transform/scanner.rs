//! 轻量 JavaScript 扫描器
//!
//! 只做 ES 模块改写需要的事情：
//! - 跳过注释、字符串、模板字符串和正则字面量，保证不会把其中的文本当成 import/export
//! - 记录每个 token 的字节区间、行列号和括号嵌套深度
//!
//! 不构建语法树；开闭括号（`{`/`}`、`(`/`)`、`[`/`]`）记录相同的深度，
//! 便于找到匹配的闭括号。

use super::TransformError;

/// Token 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// 标识符或关键字
    Ident,
    /// 标点符号
    Punct,
    /// 字符串字面量（含引号）
    Str,
    /// 模板字符串片段
    Template,
    /// 正则字面量
    Regex,
    /// 数字字面量
    Number,
}

/// Token 结构
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// 起始字节偏移
    pub start: usize,
    /// 结束字节偏移（不含）
    pub end: usize,
    /// 行号，1-based
    pub line: usize,
    /// 列号，1-based
    pub column: usize,
    /// 嵌套深度（开括号取进入前的值，闭括号取退出后的值）
    pub depth: usize,
    /// 与上一个 token 之间是否有换行
    pub newline_before: bool,
}

impl Token {
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start..self.end]
    }

    pub fn is(&self, source: &str, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text(source) == text
    }

    pub fn is_punct(&self, source: &str, text: &str) -> bool {
        self.is(source, TokenKind::Punct, text)
    }

    pub fn is_ident(&self, source: &str, text: &str) -> bool {
        self.is(source, TokenKind::Ident, text)
    }
}

/// 字符游标，跟踪字节偏移与行列号
struct Cursor<'s> {
    source: &'s str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'s> Cursor<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    /// 向前查看 ASCII 字节
    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.source.as_bytes().get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> TransformError {
        TransformError::Syntax {
            message: message.into(),
            line,
            column,
        }
    }
}

/// 允许在其后出现正则字面量的关键字
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c == '#' || c.is_alphabetic()
}

fn is_ident_part(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric() || c == '\u{200c}' || c == '\u{200d}'
}

/// 扫描整个源文件
pub(crate) fn scan(source: &str) -> Result<Vec<Token>, TransformError> {
    Scanner::new(source).run()
}

struct Scanner<'s> {
    cursor: Cursor<'s>,
    tokens: Vec<Token>,
    depth: usize,
    /// 每个未闭合的 `${` 打开后的深度
    template_stack: Vec<usize>,
    /// 每个未闭合的 `(` 是否为 `if`/`while`/`for`/`with` 的条件头
    paren_stack: Vec<bool>,
    /// 上一个 token 是条件头的 `)`，其后的 `/` 开始正则字面量
    after_control_head: bool,
    newline_before: bool,
}

impl<'s> Scanner<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            cursor: Cursor::new(source),
            tokens: Vec::new(),
            depth: 0,
            template_stack: Vec::new(),
            paren_stack: Vec::new(),
            after_control_head: false,
            newline_before: false,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, TransformError> {
        // hashbang 只允许出现在文件开头
        if self.cursor.source.starts_with("#!") {
            while let Some(c) = self.cursor.peek() {
                if c == '\n' {
                    break;
                }
                self.cursor.advance();
            }
        }

        loop {
            self.skip_trivia()?;
            let Some(c) = self.cursor.peek() else {
                break;
            };

            let (start, line, column) = (self.cursor.pos, self.cursor.line, self.cursor.column);
            let kind = match c {
                '"' | '\'' => {
                    self.scan_string(c)?;
                    TokenKind::Str
                }
                '`' => {
                    self.cursor.advance();
                    self.scan_template_chunk(line, column)?;
                    TokenKind::Template
                }
                '}' if self.template_stack.last() == Some(&self.depth) => {
                    // `${ ... }` 结束，回到模板字符串
                    self.template_stack.pop();
                    self.depth -= 1;
                    self.cursor.advance();
                    self.scan_template_chunk(line, column)?;
                    TokenKind::Template
                }
                c if c.is_ascii_digit()
                    || (c == '.' && self.cursor.peek_byte(1).is_some_and(|b| b.is_ascii_digit())) =>
                {
                    self.scan_number();
                    TokenKind::Number
                }
                c if is_ident_start(c) => {
                    self.cursor.advance();
                    while self.cursor.peek().is_some_and(is_ident_part) {
                        self.cursor.advance();
                    }
                    TokenKind::Ident
                }
                '/' if self.regex_allowed() => {
                    self.scan_regex(line, column)?;
                    TokenKind::Regex
                }
                _ => {
                    self.scan_punct();
                    TokenKind::Punct
                }
            };

            let text = &self.cursor.source[start..self.cursor.pos];
            let mut closes_control_head = false;
            match (kind, text) {
                (TokenKind::Punct, "(") => {
                    let head = self.opens_control_head();
                    self.paren_stack.push(head);
                }
                (TokenKind::Punct, ")") => closes_control_head = self.paren_stack.pop().unwrap_or(false),
                _ => {}
            }
            let depth = match (kind, text) {
                (TokenKind::Punct, "{" | "(" | "[") => {
                    self.depth += 1;
                    self.depth - 1
                }
                (TokenKind::Punct, "}" | ")" | "]") => {
                    if self.depth == 0 {
                        return Err(self.cursor.error(line, column, format!("unmatched '{}'", text)));
                    }
                    self.depth -= 1;
                    self.depth
                }
                _ => self.depth,
            };

            self.tokens.push(Token {
                kind,
                start,
                end: self.cursor.pos,
                line,
                column,
                depth,
                newline_before: self.newline_before,
            });
            self.newline_before = false;
            self.after_control_head = closes_control_head;
        }

        if !self.template_stack.is_empty() {
            return Err(self.cursor.error(
                self.cursor.line,
                self.cursor.column,
                "unterminated template substitution",
            ));
        }
        Ok(self.tokens)
    }

    /// 跳过空白和注释
    fn skip_trivia(&mut self) -> Result<(), TransformError> {
        while let Some(c) = self.cursor.peek() {
            if c == '\n' || c == '\u{2028}' || c == '\u{2029}' {
                self.newline_before = true;
                self.cursor.advance();
            } else if c.is_whitespace() || c == '\u{feff}' {
                self.cursor.advance();
            } else if c == '/' && self.cursor.peek_byte(1) == Some(b'/') {
                while let Some(c) = self.cursor.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.cursor.advance();
                }
            } else if c == '/' && self.cursor.peek_byte(1) == Some(b'*') {
                let (line, column) = (self.cursor.line, self.cursor.column);
                self.cursor.advance();
                self.cursor.advance();
                loop {
                    match self.cursor.advance() {
                        Some('*') if self.cursor.peek() == Some('/') => {
                            self.cursor.advance();
                            break;
                        }
                        Some('\n') => self.newline_before = true,
                        Some(_) => {}
                        None => return Err(self.cursor.error(line, column, "unterminated comment")),
                    }
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    fn scan_string(&mut self, quote: char) -> Result<(), TransformError> {
        let (line, column) = (self.cursor.line, self.cursor.column);
        self.cursor.advance();
        loop {
            match self.cursor.advance() {
                Some('\\') => {
                    self.cursor.advance();
                }
                Some(c) if c == quote => return Ok(()),
                Some('\n') | None => {
                    return Err(self.cursor.error(line, column, "unterminated string literal"))
                }
                Some(_) => {}
            }
        }
    }

    /// 扫描模板片段，直到结尾的反引号或下一个 `${`
    fn scan_template_chunk(&mut self, line: usize, column: usize) -> Result<(), TransformError> {
        loop {
            match self.cursor.advance() {
                Some('\\') => {
                    self.cursor.advance();
                }
                Some('`') => return Ok(()),
                Some('$') if self.cursor.peek() == Some('{') => {
                    self.cursor.advance();
                    self.depth += 1;
                    self.template_stack.push(self.depth);
                    return Ok(());
                }
                Some(_) => {}
                None => return Err(self.cursor.error(line, column, "unterminated template literal")),
            }
        }
    }

    fn scan_number(&mut self) {
        while let Some(c) = self.cursor.peek() {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                self.cursor.advance();
            } else {
                break;
            }
        }
    }

    fn scan_regex(&mut self, line: usize, column: usize) -> Result<(), TransformError> {
        self.cursor.advance();
        let mut in_class = false;
        loop {
            match self.cursor.advance() {
                Some('\\') => {
                    self.cursor.advance();
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some('\n') | None => {
                    return Err(self.cursor.error(line, column, "unterminated regular expression"))
                }
                Some(_) => {}
            }
        }
        // flags
        while self.cursor.peek().is_some_and(is_ident_part) {
            self.cursor.advance();
        }
        Ok(())
    }

    fn scan_punct(&mut self) {
        let rest = &self.cursor.source[self.cursor.pos..];
        // 只有 `...` 和 `=>` 需要整体识别，其余按单字符处理
        let len = if rest.starts_with("...") {
            3
        } else if rest.starts_with("=>") {
            2
        } else {
            1
        };
        for _ in 0..len {
            self.cursor.advance();
        }
    }

    /// 即将压入的 `(` 是否紧跟在 `if`/`while`/`for`/`with`（或 `for await`）之后
    fn opens_control_head(&self) -> bool {
        let source = self.cursor.source;
        let mut prev = self.tokens.iter().rev();
        match prev.next() {
            Some(t) if t.kind == TokenKind::Ident => match t.text(source) {
                "if" | "while" | "for" | "with" => true,
                "await" => prev.next().is_some_and(|t| t.is_ident(source, "for")),
                _ => false,
            },
            _ => false,
        }
    }

    /// 根据上一个 token 判断 `/` 是否开始正则字面量
    fn regex_allowed(&self) -> bool {
        let Some(prev) = self.tokens.last() else {
            return true;
        };
        let text = prev.text(self.cursor.source);
        match prev.kind {
            TokenKind::Punct if text == ")" => self.after_control_head,
            TokenKind::Punct => text != "]",
            TokenKind::Ident => REGEX_PRECEDING_KEYWORDS.contains(&text),
            TokenKind::Template => text.ends_with("${"),
            TokenKind::Str | TokenKind::Regex | TokenKind::Number => false,
        }
    }
}

/// 字符串字面量的值（去掉引号并处理转义）
///
/// 支持 `\xHH`、`\uXXXX`（含代理对）和 `\u{...}`；无效的转义序列解码为 U+FFFD。
pub(crate) fn string_value(literal: &str) -> String {
    let inner = &literal[1..literal.len().saturating_sub(1).max(1)];
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('r') => value.push('\r'),
            Some('b') => value.push('\u{8}'),
            Some('f') => value.push('\u{c}'),
            Some('v') => value.push('\u{b}'),
            Some('0') => value.push('\0'),
            Some('x') => push_code_point(&mut value, hex_digits(&mut chars, 2)),
            Some('u') => {
                let code = unicode_escape(&mut chars);
                push_code_point(&mut value, code);
            }
            // 续行
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some('\n' | '\u{2028}' | '\u{2029}') | None => {}
            Some(other) => value.push(other),
        }
    }
    value
}

type EscapeChars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

/// 读取 `\u` 之后的部分，合并 UTF-16 代理对
fn unicode_escape(chars: &mut EscapeChars<'_>) -> Option<u32> {
    if chars.peek() == Some(&'{') {
        chars.next();
        let mut digits = String::new();
        for c in chars.by_ref() {
            if c == '}' {
                return u32::from_str_radix(&digits, 16).ok();
            }
            digits.push(c);
        }
        return None;
    }

    let high = hex_digits(chars, 4)?;
    if !(0xD800..=0xDBFF).contains(&high) {
        return Some(high);
    }
    let mut ahead = chars.clone();
    if ahead.next() == Some('\\') && ahead.next() == Some('u') {
        if let Some(low) = hex_digits(&mut ahead, 4).filter(|low| (0xDC00..=0xDFFF).contains(low)) {
            *chars = ahead;
            return Some(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00));
        }
    }
    Some(high)
}

fn hex_digits(chars: &mut EscapeChars<'_>, count: usize) -> Option<u32> {
    let mut code = 0;
    for _ in 0..count {
        let digit = chars.peek()?.to_digit(16)?;
        chars.next();
        code = code * 16 + digit;
    }
    Some(code)
}

fn push_code_point(value: &mut String, code: Option<u32>) {
    value.push(code.and_then(char::from_u32).unwrap_or(char::REPLACEMENT_CHARACTER));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<&str> {
        scan(source)
            .unwrap()
            .iter()
            .map(|t| t.text(source))
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        let source = "import { a } from './a.js';";
        assert_eq!(
            texts(source),
            vec!["import", "{", "a", "}", "from", "'./a.js'", ";"]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "// import x from './no.js'\n/* export default 1 */ var y = 2;";
        assert_eq!(texts(source), vec!["var", "y", "=", "2", ";"]);
    }

    #[test]
    fn test_strings_hide_keywords() {
        let tokens = scan(r#"var s = "import x from 'y'";"#).unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[3].kind, TokenKind::Str);
    }

    #[test]
    fn test_template_substitution_depth() {
        let source = "var t = `a ${ {b: 1}.b } c`; x";
        let tokens = scan(source).unwrap();
        let last = tokens.last().unwrap();
        assert_eq!(last.text(source), "x");
        assert_eq!(last.depth, 0);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Template && t.text(source).ends_with("c`")));
    }

    #[test]
    fn test_regex_vs_division() {
        let source = "var r = /[/]import/g; var d = a / b / c;";
        let tokens = scan(source).unwrap();
        assert_eq!(tokens[3].kind, TokenKind::Regex);
        assert_eq!(tokens[3].text(source), "/[/]import/g");
        let divisions = tokens.iter().filter(|t| t.is_punct(source, "/")).count();
        assert_eq!(divisions, 2);
    }

    #[test]
    fn test_depth_of_matching_braces() {
        let source = "function f() { if (x) { y } }";
        let tokens = scan(source).unwrap();
        let open = tokens.iter().find(|t| t.is_punct(source, "{")).unwrap();
        let close = tokens.iter().rev().find(|t| t.is_punct(source, "}")).unwrap();
        assert_eq!(open.depth, 0);
        assert_eq!(close.depth, 0);
    }

    #[test]
    fn test_newline_tracking_and_positions() {
        let source = "a\n  b";
        let tokens = scan(source).unwrap();
        assert!(!tokens[0].newline_before);
        assert!(tokens[1].newline_before);
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
    }

    #[test]
    fn test_hashbang_skipped() {
        assert_eq!(texts("#!/usr/bin/env node\nrun();"), vec!["run", "(", ")", ";"]);
    }

    #[test]
    fn test_unterminated_errors() {
        for source in ["var s = 'abc", "/* open", "`tpl ${ x", "var r = /abc"] {
            let err = scan(source).unwrap_err();
            assert!(matches!(err, TransformError::Syntax { .. }), "{}", source);
        }
    }

    #[test]
    fn test_unmatched_closer() {
        let err = scan("a }").unwrap_err();
        assert_eq!(err.position(), Some((1, 3)));
    }

    #[test]
    fn test_string_value() {
        assert_eq!(string_value("'./a.js'"), "./a.js");
        assert_eq!(string_value(r#""./it\'s.js""#), "./it's.js");
        assert_eq!(string_value(r#""a\\b""#), "a\\b");
    }

    #[test]
    fn test_string_value_unicode_escapes() {
        assert_eq!(string_value(r#""./\u0061.js""#), "./a.js");
        assert_eq!(string_value(r#"'./\x62.js'"#), "./b.js");
        assert_eq!(string_value(r#""./\u{1F600}.js""#), "./\u{1F600}.js");
        assert_eq!(string_value(r#""\uD83D\uDE00""#), "\u{1F600}");
        assert_eq!(string_value(r#""\uZZZZ""#), "\u{FFFD}ZZZZ");
    }

    #[test]
    fn test_regex_after_control_head() {
        let source = "if (ok) /'/.test(s);\nwhile (a) /x/g.exec(b);\nvar q = (a) / 2;";
        let tokens = scan(source).unwrap();
        let regexes: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Regex)
            .map(|t| t.text(source))
            .collect();
        assert_eq!(regexes, vec!["/'/", "/x/g"]);
        assert!(tokens.iter().any(|t| t.is_punct(source, "/")));
    }

    #[test]
    fn test_nested_parens_in_control_head() {
        let source = "for (let i = f(x); i < n; i++) /re/.test(i);\nfoo(if_)/ 2;";
        let tokens = scan(source).unwrap();
        assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Regex).count(), 1);
    }
}
