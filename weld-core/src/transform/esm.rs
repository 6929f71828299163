//! ES 模块改写
//!
//! 把 `import` / `export` 语法改写为 `(require, exports)` 约定，其余代码原样保留：
//!
//! | 源码 | 改写结果 |
//! |------|----------|
//! | `import './a.js'` | `require("./a.js");` |
//! | `import d from './a.js'` | `var d = require("./a.js").default;` |
//! | `import * as ns from './a.js'` | `var ns = require("./a.js");` |
//! | `import { x, y as z } from './a.js'` | `var t = require(...); var x = t.x; var z = t.y;` |
//! | `export const a = 1` | `const a = 1;` + `exports.a = a;` |
//! | `export function f() {}` | 声明保留，`exports.f = f;` 提升到模块顶部 |
//! | `export default expr` | `exports.default = expr` |
//! | `export { a as b }` | 模块末尾 `exports.b = a;` |
//! | `export { a } from './m.js'` / `export * from './m.js'` | 通过 getter 转发 |
//!
//! import 与转发导出按源码顺序提升到模块顶部，和 ES 模块的求值顺序一致。
//! 导入的绑定在 import 处读取一次（非 live binding）。

use tracing::{debug, warn};

use super::scanner::{scan, string_value, Token, TokenKind};
use super::{TransformError, Transformed, Transformer};
use crate::js::{is_identifier, js_string, member};
use crate::module::ModuleId;

/// 临时变量前缀
const TEMP_PREFIX: &str = "__weld_import_";

/// 内置的 ES 模块转换器
#[derive(Debug, Clone, Copy, Default)]
pub struct EsmTransformer;

impl EsmTransformer {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for EsmTransformer {
    fn transform(&self, source: &str, path: &ModuleId) -> Result<Transformed, TransformError> {
        let tokens = scan(source)?;
        let mut rewriter = Rewriter::new(source, &tokens);
        rewriter.run()?;

        if rewriter.dynamic_imports > 0 {
            warn!(
                target: "weld::transform",
                module = %path,
                count = rewriter.dynamic_imports,
                "dynamic import() is not bundled and is left untouched"
            );
        }

        let transformed = rewriter.finish();
        debug!(
            target: "weld::transform",
            module = %path,
            imports = transformed.import_specifiers.len(),
            "transformed module"
        );
        Ok(transformed)
    }
}

/// 源码替换：把 `[start, end)` 替换为 `text`
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

/// `{ a, b as c }` 列表中的一项
struct ListItem {
    name: String,
    alias: String,
}

struct Rewriter<'a> {
    source: &'a str,
    tokens: &'a [Token],
    edits: Vec<Edit>,
    /// 提升到顶部的导出赋值（函数声明）
    hoisted_exports: Vec<String>,
    /// 提升到顶部的 require（import 与转发导出）
    hoisted_requires: Vec<String>,
    /// 追加在模块末尾的导出赋值
    trailing_exports: Vec<String>,
    /// 本模块自己声明的导出名，`export *` 不会覆盖它们
    local_exports: Vec<String>,
    /// `export * from` 在 `hoisted_requires` 中的位置和临时变量
    star_reexports: Vec<(usize, String)>,
    specifiers: Vec<String>,
    temp_count: usize,
    dynamic_imports: usize,
}

impl<'a> Rewriter<'a> {
    fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        Self {
            source,
            tokens,
            edits: Vec::new(),
            hoisted_exports: Vec::new(),
            hoisted_requires: Vec::new(),
            trailing_exports: Vec::new(),
            local_exports: Vec::new(),
            star_reexports: Vec::new(),
            specifiers: Vec::new(),
            temp_count: 0,
            dynamic_imports: 0,
        }
    }

    fn run(&mut self) -> Result<(), TransformError> {
        let mut i = 0;
        while i < self.tokens.len() {
            let token = self.tokens[i];
            if token.kind == TokenKind::Ident && !self.after_dot(i) {
                let text = token.text(self.source);
                let next = self.text(i + 1);
                if text == "import" && next == "(" {
                    self.dynamic_imports += 1;
                } else if token.depth == 0 && text == "import" && next != "." {
                    i = self.import_statement(i)?;
                    continue;
                } else if token.depth == 0 && text == "export" {
                    i = self.export_statement(i)?;
                    continue;
                }
            }
            i += 1;
        }
        Ok(())
    }

    fn finish(mut self) -> Transformed {
        let body_start = if self.source.starts_with("#!") {
            self.source.find('\n').unwrap_or(self.source.len())
        } else {
            0
        };

        let skipped = std::iter::once("default")
            .chain(self.local_exports.iter().map(String::as_str))
            .map(js_string)
            .collect::<Vec<_>>()
            .join(", ");
        for (index, temp) in &self.star_reexports {
            self.hoisted_requires[*index].push_str(&format!(
                " Object.keys({temp}).forEach(function (key) {{ \
                 if ([{skipped}].indexOf(key) !== -1 || Object.prototype.hasOwnProperty.call(exports, key)) return; \
                 Object.defineProperty(exports, key, {{ enumerable: true, get: function () {{ return {temp}[key]; }} }}); }});",
                temp = temp,
                skipped = skipped,
            ));
        }

        let mut code = String::with_capacity(self.source.len() + 64);
        for line in self.hoisted_exports.iter().chain(&self.hoisted_requires) {
            code.push_str(line);
            code.push('\n');
        }

        self.edits.sort_by_key(|edit| edit.start);
        let mut cursor = body_start;
        for edit in &self.edits {
            code.push_str(&self.source[cursor..edit.start]);
            code.push_str(&edit.text);
            cursor = edit.end;
        }
        code.push_str(&self.source[cursor..]);

        if !self.trailing_exports.is_empty() {
            if !code.ends_with('\n') {
                code.push('\n');
            }
            for line in &self.trailing_exports {
                code.push_str(line);
                code.push('\n');
            }
        }

        Transformed {
            code,
            import_specifiers: self.specifiers,
        }
    }

    // ---- token 访问 ----

    fn token(&self, idx: usize) -> Option<&Token> {
        self.tokens.get(idx)
    }

    fn text(&self, idx: usize) -> &'a str {
        self.tokens
            .get(idx)
            .map(|t| t.text(self.source))
            .unwrap_or("")
    }

    fn is_punct(&self, idx: usize, punct: &str) -> bool {
        self.token(idx).is_some_and(|t| t.is_punct(self.source, punct))
    }

    fn is_ident(&self, idx: usize, ident: &str) -> bool {
        self.token(idx).is_some_and(|t| t.is_ident(self.source, ident))
    }

    fn kind(&self, idx: usize) -> Option<TokenKind> {
        self.token(idx).map(|t| t.kind)
    }

    /// `foo.import` / `foo.export` 是属性访问
    fn after_dot(&self, idx: usize) -> bool {
        idx > 0 && self.is_punct(idx - 1, ".")
    }

    fn error_at(&self, idx: usize, message: impl Into<String>) -> TransformError {
        let (line, column) = match self.tokens.get(idx).or(self.tokens.last()) {
            Some(t) => (t.line, t.column),
            None => (1, 1),
        };
        TransformError::Syntax {
            message: message.into(),
            line,
            column,
        }
    }

    fn expect_ident(&self, idx: usize, what: &str) -> Result<&'a str, TransformError> {
        match self.kind(idx) {
            Some(TokenKind::Ident) => Ok(self.text(idx)),
            _ => Err(self.error_at(idx, format!("expected {}", what))),
        }
    }

    /// 读取 `from '<specifier>'`，返回 specifier 和下一个 token 的下标
    fn expect_from(&mut self, idx: usize) -> Result<(String, usize), TransformError> {
        if !self.is_ident(idx, "from") {
            return Err(self.error_at(idx, "expected 'from' after import/export clause"));
        }
        if self.kind(idx + 1) != Some(TokenKind::Str) {
            return Err(self.error_at(idx + 1, "expected module specifier string"));
        }
        let specifier = string_value(self.text(idx + 1));
        let mut next = idx + 2;

        // import attributes: `with { type: 'json' }`
        let attributes = self.is_ident(next, "with") || self.is_ident(next, "assert");
        if attributes && self.is_punct(next + 1, "{") {
            next = self.matching_close(next + 1)? + 1;
        }

        self.record_specifier(&specifier);
        Ok((specifier, next))
    }

    /// 可选的分号
    fn consume_semicolon(&self, idx: usize) -> usize {
        if self.is_punct(idx, ";") {
            idx + 1
        } else {
            idx
        }
    }

    fn matching_close(&self, open: usize) -> Result<usize, TransformError> {
        let depth = self.tokens[open].depth;
        let close = match self.text(open) {
            "{" => "}",
            "[" => "]",
            _ => ")",
        };
        (open + 1..self.tokens.len())
            .find(|&j| self.tokens[j].depth == depth && self.is_punct(j, close))
            .ok_or_else(|| self.error_at(open, format!("missing '{}'", close)))
    }

    fn record_specifier(&mut self, specifier: &str) {
        if !self.specifiers.iter().any(|s| s == specifier) {
            self.specifiers.push(specifier.to_string());
        }
    }

    fn temp(&mut self) -> String {
        let name = format!("{}{}", TEMP_PREFIX, self.temp_count);
        self.temp_count += 1;
        name
    }

    /// 删除 `[first, last]` 两个 token 覆盖的源码
    fn remove_tokens(&mut self, first: usize, last: usize) {
        self.edits.push(Edit {
            start: self.tokens[first].start,
            end: self.tokens[last].end,
            text: String::new(),
        });
    }

    /// 替换 token `first` 起到 token `until` 起始处之间的源码（含空白）
    fn replace_prefix(&mut self, first: usize, until: usize, text: &str) {
        self.edits.push(Edit {
            start: self.tokens[first].start,
            end: self.tokens[until].start,
            text: text.to_string(),
        });
    }

    fn insert_after(&mut self, idx: usize, text: String) {
        let pos = self.tokens[idx].end;
        self.edits.push(Edit {
            start: pos,
            end: pos,
            text,
        });
    }

    /// 解析 `{ a, b as c, "d" as e }`，返回列表和 `}` 之后的下标
    fn braced_list(&self, open: usize) -> Result<(Vec<ListItem>, usize), TransformError> {
        let mut items = Vec::new();
        let mut j = open + 1;
        loop {
            if self.is_punct(j, "}") {
                return Ok((items, j + 1));
            }
            let name = match self.kind(j) {
                Some(TokenKind::Ident) => self.text(j).to_string(),
                Some(TokenKind::Str) => string_value(self.text(j)),
                _ => return Err(self.error_at(j, "expected binding name")),
            };
            j += 1;

            let alias = if self.is_ident(j, "as") {
                let alias = match self.kind(j + 1) {
                    Some(TokenKind::Ident) => self.text(j + 1).to_string(),
                    Some(TokenKind::Str) => string_value(self.text(j + 1)),
                    _ => return Err(self.error_at(j + 1, "expected name after 'as'")),
                };
                j += 2;
                alias
            } else {
                name.clone()
            };
            items.push(ListItem { name, alias });

            if self.is_punct(j, ",") {
                j += 1;
            } else if !self.is_punct(j, "}") {
                return Err(self.error_at(j, "expected ',' or '}'"));
            }
        }
    }

    // ---- import ----

    fn import_statement(&mut self, start: usize) -> Result<usize, TransformError> {
        let mut j = start + 1;

        // import './side-effect.js'
        if self.kind(j) == Some(TokenKind::Str) {
            let specifier = string_value(self.text(j));
            self.record_specifier(&specifier);
            let end = self.consume_semicolon(j + 1);
            self.remove_tokens(start, end - 1);
            self.hoisted_requires
                .push(format!("require({});", js_string(&specifier)));
            return Ok(end);
        }

        let mut default = None;
        let mut namespace = None;
        let mut named = Vec::new();

        if self.kind(j) == Some(TokenKind::Ident) && !self.is_ident(j, "from") {
            default = Some(self.text(j));
            j += 1;
            if self.is_punct(j, ",") {
                j += 1;
            } else if !self.is_ident(j, "from") {
                return Err(self.error_at(j, "expected ',' or 'from' after default import"));
            }
        }

        if self.is_punct(j, "*") {
            if !self.is_ident(j + 1, "as") {
                return Err(self.error_at(j + 1, "expected 'as' after '*'"));
            }
            namespace = Some(self.expect_ident(j + 2, "namespace name")?);
            j += 3;
        } else if self.is_punct(j, "{") {
            let (items, next) = self.braced_list(j)?;
            for item in &items {
                if !is_identifier(&item.alias) {
                    return Err(self.error_at(j, format!("'{}' is not a valid local name", item.alias)));
                }
            }
            named = items;
            j = next;
        } else if default.is_none() {
            return Err(self.error_at(j, "expected import clause"));
        }

        let (specifier, next) = self.expect_from(j)?;
        let end = self.consume_semicolon(next);
        self.remove_tokens(start, end - 1);

        let source = format!("require({})", js_string(&specifier));
        let code = match (default, namespace, named.is_empty()) {
            (None, None, true) => format!("{};", source),
            (None, Some(ns), true) => format!("var {} = {};", ns, source),
            (Some(d), None, true) => format!("var {} = {}.default;", d, source),
            _ => {
                let temp = self.temp();
                let mut code = format!("var {} = {};", temp, source);
                if let Some(d) = default {
                    code.push_str(&format!(" var {} = {}.default;", d, temp));
                }
                if let Some(ns) = namespace {
                    code.push_str(&format!(" var {} = {};", ns, temp));
                }
                for item in &named {
                    code.push_str(&format!(" var {} = {}{};", item.alias, temp, member(&item.name)));
                }
                code
            }
        };
        self.hoisted_requires.push(code);
        Ok(end)
    }

    // ---- export ----

    fn export_statement(&mut self, start: usize) -> Result<usize, TransformError> {
        let k = start + 1;
        match self.text(k) {
            "default" => self.export_default(start, k + 1),
            "const" | "let" | "var" => self.export_declaration(start, k),
            "function" => self.export_function(start, k),
            "async" if self.is_ident(k + 1, "function") => self.export_function(start, k),
            "class" => self.export_class(start, k, None),
            "{" => self.export_list(start, k),
            "*" => self.export_star(start, k),
            "" => Err(self.error_at(k, "unexpected end of input after 'export'")),
            other => Err(self.error_at(k, format!("unexpected '{}' after 'export'", other))),
        }
    }

    /// 函数名所在下标（跳过 `async`、`function`、`*`）
    fn function_name_index(&self, k: usize) -> usize {
        let mut n = k;
        if self.is_ident(n, "async") {
            n += 1;
        }
        n += 1;
        if self.is_punct(n, "*") {
            n += 1;
        }
        n
    }

    fn export_function(&mut self, start: usize, k: usize) -> Result<usize, TransformError> {
        let name = self.expect_ident(self.function_name_index(k), "function name")?;
        self.replace_prefix(start, k, "");
        self.local_exports.push(name.to_string());
        self.hoisted_exports
            .push(format!("exports{} = {};", member(name), name));
        Ok(k)
    }

    /// `export class C {}` / `export default class C {}`
    fn export_class(
        &mut self,
        start: usize,
        k: usize,
        exported: Option<&str>,
    ) -> Result<usize, TransformError> {
        let name = self.expect_ident(k + 1, "class name")?;
        let open = (k + 1..self.tokens.len())
            .find(|&j| self.tokens[j].depth == 0 && self.is_punct(j, "{"))
            .ok_or_else(|| self.error_at(k, "missing class body"))?;
        let close = self.matching_close(open)?;

        self.replace_prefix(start, k, "");
        let exported = exported.unwrap_or(name);
        self.local_exports.push(exported.to_string());
        self.insert_after(close, format!("\nexports{} = {};", member(exported), name));
        Ok(close + 1)
    }

    fn export_default(&mut self, start: usize, k: usize) -> Result<usize, TransformError> {
        if self.token(k).is_none() {
            return Err(self.error_at(k, "expected expression after 'export default'"));
        }

        let is_function =
            self.is_ident(k, "function") || (self.is_ident(k, "async") && self.is_ident(k + 1, "function"));
        if is_function {
            let n = self.function_name_index(k);
            if self.kind(n) == Some(TokenKind::Ident) {
                let name = self.text(n);
                self.replace_prefix(start, k, "");
                self.hoisted_exports.push(format!("exports.default = {};", name));
                return Ok(k);
            }
        }

        let named_class = self.is_ident(k, "class")
            && self.kind(k + 1) == Some(TokenKind::Ident)
            && !self.is_ident(k + 1, "extends");
        if named_class {
            return self.export_class(start, k, Some("default"));
        }

        // 表达式、匿名函数、匿名类
        self.replace_prefix(start, k, "exports.default = ");
        Ok(k)
    }

    fn export_declaration(&mut self, start: usize, kw: usize) -> Result<usize, TransformError> {
        let mut names = Vec::new();
        let mut expect_binding = true;
        let mut j = kw + 1;

        let last = loop {
            let Some(token) = self.token(j).copied() else {
                break j - 1;
            };
            let top_level = token.depth == 0;
            let closer = token.kind == TokenKind::Punct
                && matches!(token.text(self.source), "}" | ")" | "]");

            if top_level && token.is_punct(self.source, ";") {
                break j;
            }
            if top_level && !closer && j > kw + 1 && token.newline_before && !self.continues(j - 1, j) {
                break j - 1;
            }

            if expect_binding {
                if token.kind == TokenKind::Ident {
                    names.push(token.text(self.source).to_string());
                    expect_binding = false;
                    j += 1;
                    continue;
                }
                if token.is_punct(self.source, "{") || token.is_punct(self.source, "[") {
                    let close = self.matching_close(j)?;
                    self.pattern_names(j + 1, close, &mut names);
                    expect_binding = false;
                    j = close + 1;
                    continue;
                }
                return Err(self.error_at(j, "expected binding name in exported declaration"));
            }

            if top_level && token.is_punct(self.source, ",") {
                expect_binding = true;
            }
            j += 1;
        };

        if names.is_empty() {
            return Err(self.error_at(kw, "exported declaration declares no names"));
        }

        self.replace_prefix(start, kw, "");
        self.local_exports.extend(names.iter().cloned());
        let separator = if self.is_punct(last, ";") { "" } else { ";" };
        let assignments = names
            .iter()
            .map(|name| format!("exports{} = {};", member(name), name))
            .collect::<Vec<_>>()
            .join(" ");
        self.insert_after(last, format!("{}\n{}", separator, assignments));
        Ok(last + 1)
    }

    /// 收集解构模式中的绑定名（跳过属性名和默认值表达式）
    fn pattern_names(&self, from: usize, close: usize, names: &mut Vec<String>) {
        let mut default_depth: Option<usize> = None;
        for j in from..close {
            let token = self.tokens[j];
            if let Some(depth) = default_depth {
                let ends_default =
                    token.depth < depth || (token.depth == depth && token.is_punct(self.source, ","));
                if ends_default {
                    default_depth = None;
                }
                continue;
            }
            if token.is_punct(self.source, "=") {
                default_depth = Some(token.depth);
            } else if token.kind == TokenKind::Ident
                && !self.is_punct(j + 1, ":")
                && !self.after_dot(j)
            {
                names.push(token.text(self.source).to_string());
            }
        }
    }

    /// 换行处的语句是否继续（用于自动分号插入的判断）
    fn continues(&self, prev: usize, next: usize) -> bool {
        const OPERATORS: &[&str] = &[
            "=", ",", "+", "-", "*", "/", "%", "?", ":", "&", "|", "^", "<", ">", "!", "~", ".", "=>",
            "...",
        ];
        const CONTINUING_KEYWORDS: &[&str] = &["in", "instanceof", "of"];

        let prev_text = self.text(prev);
        let next_text = self.text(next);
        let prev_continues = match self.kind(prev) {
            Some(TokenKind::Punct) => OPERATORS.contains(&prev_text) || matches!(prev_text, "(" | "[" | "{"),
            Some(TokenKind::Ident) => {
                CONTINUING_KEYWORDS.contains(&prev_text)
                    || matches!(prev_text, "new" | "typeof" | "void" | "delete" | "await" | "yield")
            }
            _ => false,
        };
        let next_continues = match self.kind(next) {
            Some(TokenKind::Punct) => {
                (OPERATORS.contains(&next_text) && !matches!(next_text, "!" | "~" | "..."))
                    || matches!(next_text, "(" | "[")
            }
            Some(TokenKind::Ident) => CONTINUING_KEYWORDS.contains(&next_text),
            Some(TokenKind::Template) => true,
            _ => false,
        };
        prev_continues || next_continues
    }

    fn export_list(&mut self, start: usize, open: usize) -> Result<usize, TransformError> {
        let (items, next) = self.braced_list(open)?;

        if self.is_ident(next, "from") {
            let (specifier, after) = self.expect_from(next)?;
            let end = self.consume_semicolon(after);
            self.remove_tokens(start, end - 1);

            let temp = self.temp();
            let mut code = format!("var {} = require({});", temp, js_string(&specifier));
            for item in &items {
                code.push_str(&format!(" {}", reexport(&item.alias, &format!("{}{}", temp, member(&item.name)))));
            }
            self.hoisted_requires.push(code);
            return Ok(end);
        }

        for item in &items {
            if !is_identifier(&item.name) {
                return Err(self.error_at(open, format!("cannot export '{}' without 'from'", item.name)));
            }
        }
        let end = self.consume_semicolon(next);
        self.remove_tokens(start, end - 1);
        for item in &items {
            self.local_exports.push(item.alias.clone());
            self.trailing_exports
                .push(format!("exports{} = {};", member(&item.alias), item.name));
        }
        Ok(end)
    }

    fn export_star(&mut self, start: usize, star: usize) -> Result<usize, TransformError> {
        // export * as ns from './m.js'
        if self.is_ident(star + 1, "as") {
            let name = match self.kind(star + 2) {
                Some(TokenKind::Ident) => self.text(star + 2).to_string(),
                Some(TokenKind::Str) => string_value(self.text(star + 2)),
                _ => return Err(self.error_at(star + 2, "expected name after 'as'")),
            };
            let (specifier, after) = self.expect_from(star + 3)?;
            let end = self.consume_semicolon(after);
            self.remove_tokens(start, end - 1);
            self.hoisted_requires.push(format!(
                "exports{} = require({});",
                member(&name),
                js_string(&specifier)
            ));
            return Ok(end);
        }

        let (specifier, after) = self.expect_from(star + 1)?;
        let end = self.consume_semicolon(after);
        self.remove_tokens(start, end - 1);

        let temp = self.temp();
        self.star_reexports.push((self.hoisted_requires.len(), temp.clone()));
        self.hoisted_requires
            .push(format!("var {} = require({});", temp, js_string(&specifier)));
        Ok(end)
    }
}

/// 以 getter 形式转发导出，保持与源模块的实时绑定
fn reexport(exported: &str, target: &str) -> String {
    format!(
        "Object.defineProperty(exports, {}, {{ enumerable: true, get: function () {{ return {}; }} }});",
        js_string(exported),
        target
    )
}
