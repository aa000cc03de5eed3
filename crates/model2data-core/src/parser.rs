//! Parser for the supported subset of the DBML schema-description language.
//!
//! The parser is line oriented. Each line is classified against the block it
//! sits in (top level, `Table`, `indexes`, `Ref`, `Enum`, or a skipped block
//! such as `Note`/`Project`), so text inside skipped blocks never produces
//! columns or references. References are collected raw and resolved once the
//! whole text has been read, which lets them use table aliases declared later.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifier::{normalize_identifier, strip_quotes};
use crate::schema::{ColumnDef, EnumDef, ParsedSchema, Reference, SchemaCatalog, TableDef};
use crate::settings::{ColumnSetting, ColumnSettings};

const NAME: &str = r#"(?:"[^"]*"|'[^']*'|`[^`]*`|[^\s\[{"'`])+"#;
const ENDPOINT: &str = r#"(?:"[^"]*"|'[^']*'|`[^`]*`|\([^)]*\)|[^\s<>\-\[\]"'`(])+"#;
const TRIPLE_QUOTE: &str = "'''";

static TABLE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^table\s+(?P<name>{NAME})(?:\s+as\s+(?P<alias>{NAME}))?"
    ))
    .expect("valid table header regex")
});

static ENUM_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^enum\s+(?P<name>{NAME})")).expect("valid enum header regex")
});

static RELATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?P<left>{ENDPOINT})\s*(?P<op><>|>|<|-)\s*(?P<right>{ENDPOINT})\s*(?:\[.*\])?\s*$"
    ))
    .expect("valid relation regex")
});

static INLINE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*(?P<op><>|>|<|-)\s*(?P<target>{ENDPOINT})\s*$"))
        .expect("valid inline ref regex")
});

/// Read a schema file fully and parse it.
///
/// A missing file surfaces as [`Error::NotFound`]; any other read failure as
/// [`Error::Io`].
pub fn parse_schema_file(path: &Path) -> Result<ParsedSchema> {
    let text = std::fs::read_to_string(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(path.to_path_buf())
        } else {
            Error::Io(err)
        }
    })?;
    parse_schema(&text)
}

/// Parse schema text into a table catalog and the list of references.
///
/// Fails with [`Error::EmptySchema`] when no `Table` block was found.
pub fn parse_schema(text: &str) -> Result<ParsedSchema> {
    let mut parser = SchemaParser::default();
    for line in text.lines() {
        parser.feed_line(line);
    }
    let parsed = parser.finish();

    if parsed.catalog.is_empty() {
        return Err(Error::EmptySchema);
    }

    info!(
        tables = parsed.catalog.len(),
        references = parsed.references.len(),
        enums = parsed.catalog.enums.len(),
        "schema parsed"
    );
    Ok(parsed)
}

/// Relationship symbol between two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelationKind {
    /// `>`: left references right.
    ManyToOne,
    /// `<`: right references left.
    OneToMany,
    /// `-`: treated like `>`.
    OneToOne,
    /// `<>`: no child side.
    ManyToMany,
}

impl RelationKind {
    fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(Self::ManyToOne),
            "<" => Some(Self::OneToMany),
            "-" => Some(Self::OneToOne),
            "<>" => Some(Self::ManyToMany),
            _ => None,
        }
    }
}

/// Un-normalized `table.column` endpoint as written in the text.
#[derive(Debug, Clone)]
struct RawEndpoint {
    table: String,
    column: String,
}

#[derive(Debug, Clone)]
struct PendingRef {
    child: RawEndpoint,
    parent: RawEndpoint,
}

#[derive(Debug)]
enum Frame {
    Table { table: TableDef, raw_name: String },
    Ref,
    Enum(EnumDef),
    /// `indexes`, `Note`, `Project`, `TableGroup` and unknown blocks.
    Skipped { depth: usize },
}

/// Header seen without its opening brace; the brace is expected next.
#[derive(Debug)]
enum PendingHeader {
    Table { table: TableDef, raw_name: String },
    Ref,
    Enum(EnumDef),
    Skipped,
}

#[derive(Debug, Default)]
struct SchemaParser {
    catalog: SchemaCatalog,
    pending_refs: Vec<PendingRef>,
    aliases: HashMap<String, String>,
    stack: Vec<Frame>,
    pending_header: Option<PendingHeader>,
    in_triple_quote: bool,
    in_block_comment: bool,
}

impl SchemaParser {
    fn feed_line(&mut self, raw_line: &str) {
        let code = self.code_of(raw_line);
        self.feed_code(&code);
    }

    /// Code part of one physical line.
    ///
    /// Drops `//` comments, `/* */` comments and the body of multi-line `'''`
    /// strings. An unclosed block comment or `'''` string carries over to the
    /// following lines. Quoted text is copied as is.
    fn code_of(&mut self, raw_line: &str) -> String {
        let mut code = String::with_capacity(raw_line.len());
        let mut idx = 0;

        while idx < raw_line.len() {
            let rest = &raw_line[idx..];

            if self.in_block_comment {
                match rest.find("*/") {
                    Some(end) => {
                        self.in_block_comment = false;
                        idx += end + 2;
                        code.push(' ');
                        continue;
                    }
                    None => break,
                }
            }
            if self.in_triple_quote {
                match rest.find(TRIPLE_QUOTE) {
                    Some(end) => {
                        self.in_triple_quote = false;
                        idx += end + TRIPLE_QUOTE.len();
                        continue;
                    }
                    None => break,
                }
            }

            if rest.starts_with("//") {
                break;
            }
            if rest.starts_with("/*") {
                self.in_block_comment = true;
                idx += 2;
                continue;
            }
            if let Some(body) = rest.strip_prefix(TRIPLE_QUOTE) {
                match body.find(TRIPLE_QUOTE) {
                    Some(end) => {
                        let len = end + 2 * TRIPLE_QUOTE.len();
                        code.push_str(&rest[..len]);
                        idx += len;
                    }
                    None => {
                        self.in_triple_quote = true;
                        break;
                    }
                }
                continue;
            }

            let Some(ch) = rest.chars().next() else {
                break;
            };
            if matches!(ch, '"' | '\'' | '`') {
                let len = rest[1..].find(ch).map_or(rest.len(), |end| end + 2);
                code.push_str(&rest[..len]);
                idx += len;
                continue;
            }
            code.push(ch);
            idx += ch.len_utf8();
        }

        code
    }

    /// Classify comment-free text against the innermost open block.
    fn feed_code(&mut self, code: &str) {
        let line = code.trim();
        if line.is_empty() {
            return;
        }

        if let Some(header) = self.pending_header.take() {
            if let Some(rest) = line.strip_prefix('{') {
                self.open(header);
                self.feed_code(rest);
                return;
            }
            warn!(line, "block header without opening brace, ignoring header");
        }

        match self.stack.last() {
            None => self.top_level_line(line),
            Some(Frame::Skipped { .. }) => self.skipped_line(line),
            Some(Frame::Table { .. }) => self.table_line(line),
            Some(Frame::Ref) => self.ref_block_line(line),
            Some(Frame::Enum(_)) => self.enum_line(line),
        }
    }

    fn skipped_line(&mut self, line: &str) {
        let (opens, closes) = count_braces(line);
        if let Some(Frame::Skipped { depth }) = self.stack.last_mut() {
            *depth = (*depth + opens).saturating_sub(closes);
            if *depth == 0 {
                self.stack.pop();
            }
        }
    }

    fn top_level_line(&mut self, line: &str) {
        let keyword = leading_keyword(line);
        match keyword.as_str() {
            "table" => self.table_header(line),
            "ref" => self.ref_directive(&line[keyword.len()..]),
            "enum" => self.enum_header(line),
            _ => {
                if line.starts_with('}') {
                    warn!(line, "unbalanced closing brace");
                } else if is_block_header(line) {
                    debug!(keyword = %keyword, "skipping block");
                    self.open_or_defer(PendingHeader::Skipped, line);
                } else if !is_directive(line, &keyword) {
                    debug!(line, "ignoring top-level line");
                }
            }
        }
    }

    fn table_header(&mut self, line: &str) {
        let Some(caps) = TABLE_HEADER.captures(line) else {
            warn!(line, "malformed table header");
            self.open_or_defer(PendingHeader::Skipped, line);
            return;
        };

        let raw_name = join_name_parts(&caps["name"]);
        let name = normalize_identifier(&raw_name);
        if let Some(alias) = caps.name("alias") {
            let alias = strip_quotes(alias.as_str()).to_string();
            self.aliases.insert(alias, name.clone());
        }

        let header = PendingHeader::Table {
            table: TableDef::new(name),
            raw_name,
        };
        self.open_or_defer(header, line);
    }

    fn enum_header(&mut self, line: &str) {
        let Some(caps) = ENUM_HEADER.captures(line) else {
            warn!(line, "malformed enum header");
            self.open_or_defer(PendingHeader::Skipped, line);
            return;
        };
        let header = PendingHeader::Enum(EnumDef {
            name: join_name_parts(&caps["name"]),
            labels: Vec::new(),
        });
        self.open_or_defer(header, line);
    }

    /// `Ref: a > b`, `Ref name: a > b`, `Ref name { ... }`.
    fn ref_directive(&mut self, rest: &str) {
        let colon = find_outside_quotes(rest, |ch| ch == ':');
        let brace = find_outside_quotes(rest, |ch| ch == '{');
        match (colon, brace) {
            (Some(colon), brace) if brace.is_none_or(|brace| colon < brace) => {
                self.relation(&rest[colon + 1..]);
            }
            _ => self.open_or_defer(PendingHeader::Ref, rest),
        }
    }

    /// Open the block now when its `{` is on this line, otherwise wait for it.
    ///
    /// A block closed on the same line (`Ref { a.x > b.y }`) is handled whole.
    fn open_or_defer(&mut self, header: PendingHeader, line: &str) {
        let Some(open) = find_outside_quotes(line, |ch| ch == '{') else {
            self.pending_header = Some(header);
            return;
        };

        self.open(header);
        let inner = &line[open + 1..];
        match find_outside_quotes(inner, |ch| ch == '}') {
            Some(close) => {
                self.feed_code(&inner[..close]);
                self.feed_code("}");
            }
            None => self.feed_code(inner),
        }
    }

    fn open(&mut self, header: PendingHeader) {
        let frame = match header {
            PendingHeader::Table { table, raw_name } => Frame::Table { table, raw_name },
            PendingHeader::Ref => Frame::Ref,
            PendingHeader::Enum(enum_def) => Frame::Enum(enum_def),
            PendingHeader::Skipped => Frame::Skipped { depth: 1 },
        };
        self.stack.push(frame);
    }

    fn close(&mut self) {
        match self.stack.pop() {
            Some(Frame::Table { table, .. }) => {
                debug!(table = %table.name, columns = table.columns.len(), "table parsed");
                let name = table.name.clone();
                if self.catalog.upsert_table(table) {
                    warn!(table = %name, "table defined twice, keeping the later definition");
                }
            }
            Some(Frame::Enum(enum_def)) => {
                self.catalog.enums.retain(|existing| existing.name != enum_def.name);
                self.catalog.enums.push(enum_def);
            }
            Some(Frame::Ref) | Some(Frame::Skipped { .. }) | None => {}
        }
    }

    fn table_line(&mut self, line: &str) {
        if line.starts_with('}') {
            self.close();
            return;
        }

        let keyword = leading_keyword(line);
        if keyword == "indexes" && opens_block(line, &keyword) {
            self.open_or_defer(PendingHeader::Skipped, line);
            return;
        }
        if keyword == "note" && is_directive(line, &keyword) {
            if is_block_header(line) {
                self.open_or_defer(PendingHeader::Skipped, line);
            }
            return;
        }
        if keyword == "ref" && is_directive(line, &keyword) {
            if let Some(colon) = find_outside_quotes(line, |ch| ch == ':') {
                self.relation(&line[colon + 1..]);
            }
            return;
        }

        self.column_line(line);
    }

    fn column_line(&mut self, line: &str) {
        let Some(Frame::Table { table, raw_name }) = self.stack.last_mut() else {
            return;
        };

        let (name_token, rest) = split_first_token(line);
        let name = strip_quotes(name_token).to_string();
        if name.is_empty() {
            warn!(table = %table.name, line, "column without a name");
            return;
        }

        let (type_part, settings_part) = match find_outside_quotes(rest, |ch| ch == '[') {
            Some(open) => {
                let close = rest.rfind(']').filter(|close| *close > open);
                let settings = match close {
                    Some(close) => &rest[open + 1..close],
                    None => &rest[open + 1..],
                };
                (&rest[..open], Some(settings))
            }
            None => (rest, None),
        };

        let data_type = strip_quotes(type_part).to_string();
        if data_type.is_empty() {
            warn!(table = %table.name, column = %name, "column without a data type, skipping");
            return;
        }

        let mut settings = ColumnSettings::new();
        let mut inline_refs = Vec::new();
        if let Some(settings_part) = settings_part {
            for token in split_outside_quotes(settings_part, ',') {
                let trimmed = token.trim();
                if leading_keyword(trimmed) == "ref" && is_directive(trimmed, "ref") {
                    if let Some(colon) = trimmed.find(':') {
                        inline_refs.push(trimmed[colon + 1..].to_string());
                    }
                } else if let Some(setting) = ColumnSetting::parse(trimmed) {
                    settings.insert(setting);
                }
            }
        }

        let column = ColumnDef::new(name.clone(), data_type).with_settings(settings);
        if !table.push_column(column) {
            warn!(table = %table.name, column = %name, "duplicate column, keeping the first definition");
            return;
        }

        let here = RawEndpoint {
            table: raw_name.clone(),
            column: name,
        };
        for inline in inline_refs {
            self.inline_relation(&here, &inline);
        }
    }

    fn ref_block_line(&mut self, line: &str) {
        if line.starts_with('}') {
            self.close();
            return;
        }
        self.relation(line);
    }

    fn enum_line(&mut self, line: &str) {
        if line.starts_with('}') {
            self.close();
            return;
        }
        if let Some(Frame::Enum(enum_def)) = self.stack.last_mut() {
            let (label, _) = split_first_token(line);
            let label = strip_quotes(label);
            if !label.is_empty() {
                enum_def.labels.push(label.to_string());
            }
        }
    }

    fn relation(&mut self, text: &str) {
        let Some(caps) = RELATION.captures(text) else {
            warn!(relation = text.trim(), "malformed reference, skipping");
            return;
        };
        let (Some(left), Some(right)) = (
            parse_endpoint(&caps["left"]),
            parse_endpoint(&caps["right"]),
        ) else {
            warn!(relation = text.trim(), "composite or incomplete reference endpoint, skipping");
            return;
        };
        self.push_relation(left, &caps["op"], right, text);
    }

    fn inline_relation(&mut self, here: &RawEndpoint, text: &str) {
        let Some(caps) = INLINE_REF.captures(text) else {
            warn!(relation = text.trim(), "malformed inline reference, skipping");
            return;
        };
        let Some(target) = parse_endpoint(&caps["target"]) else {
            warn!(relation = text.trim(), "composite or incomplete reference endpoint, skipping");
            return;
        };
        self.push_relation(here.clone(), &caps["op"], target, text);
    }

    fn push_relation(&mut self, left: RawEndpoint, symbol: &str, right: RawEndpoint, text: &str) {
        let pending = match RelationKind::parse(symbol) {
            Some(RelationKind::ManyToOne) | Some(RelationKind::OneToOne) => PendingRef {
                child: left,
                parent: right,
            },
            Some(RelationKind::OneToMany) => PendingRef {
                child: right,
                parent: left,
            },
            Some(RelationKind::ManyToMany) | None => {
                warn!(relation = text.trim(), "many-to-many reference has no child side, skipping");
                return;
            }
        };
        self.pending_refs.push(pending);
    }

    fn finish(mut self) -> ParsedSchema {
        if self.in_triple_quote {
            warn!("unterminated ''' string at end of schema");
        }
        if !self.stack.is_empty() {
            warn!(open_blocks = self.stack.len(), "unterminated block at end of schema");
            while !self.stack.is_empty() {
                self.close();
            }
        }

        let references = self
            .pending_refs
            .iter()
            .map(|pending| {
                Reference::new(
                    self.resolve_table(&pending.child.table),
                    pending.child.column.clone(),
                    self.resolve_table(&pending.parent.table),
                    pending.parent.column.clone(),
                )
            })
            .collect();

        ParsedSchema {
            catalog: self.catalog,
            references,
        }
    }

    fn resolve_table(&self, raw: &str) -> String {
        self.aliases
            .get(raw)
            .cloned()
            .unwrap_or_else(|| normalize_identifier(raw))
    }
}

/// `table.column`, `schema.table.column`; the column is the last dotted part.
fn parse_endpoint(raw: &str) -> Option<RawEndpoint> {
    let parts: Vec<&str> = split_outside_quotes(raw.trim(), '.');
    if parts.len() < 2 {
        return None;
    }
    let column = strip_quotes(parts[parts.len() - 1]);
    if column.is_empty() || column.starts_with('(') {
        return None;
    }
    let table = parts[..parts.len() - 1]
        .iter()
        .map(|part| strip_quotes(part))
        .collect::<Vec<_>>()
        .join(".");
    if table.is_empty() {
        return None;
    }
    Some(RawEndpoint {
        table,
        column: column.to_string(),
    })
}

/// `"core"."users"` -> `core.users`.
fn join_name_parts(raw: &str) -> String {
    split_outside_quotes(raw, '.')
        .into_iter()
        .map(strip_quotes)
        .collect::<Vec<_>>()
        .join(".")
}

fn leading_keyword(line: &str) -> String {
    line.chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Keyword followed by `:` or `{` (`Note:`, `Ref:`, `indexes {`).
fn is_directive(line: &str, keyword: &str) -> bool {
    let rest = line[keyword.len().min(line.len())..].trim_start();
    rest.starts_with(':') || rest.starts_with('{')
}

fn is_block_header(line: &str) -> bool {
    let colon = find_outside_quotes(line, |ch| ch == ':');
    match find_outside_quotes(line, |ch| ch == '{') {
        Some(brace) => colon.is_none_or(|colon| brace < colon),
        None => colon.is_none() && line.split_whitespace().count() <= 3,
    }
}

/// `keyword` alone or followed by `{`; a header whose brace is on the next line
/// has nothing after the keyword.
fn opens_block(line: &str, keyword: &str) -> bool {
    let rest = line[keyword.len().min(line.len())..].trim_start();
    rest.is_empty() || rest.starts_with('{')
}

fn split_first_token(line: &str) -> (&str, &str) {
    let end = find_outside_quotes(line, char::is_whitespace).unwrap_or(line.len());
    (&line[..end], line[end..].trim())
}

fn count_braces(line: &str) -> (usize, usize) {
    let mut opens = 0;
    let mut closes = 0;
    scan_outside_quotes(line, |_, ch| {
        match ch {
            '{' => opens += 1,
            '}' => closes += 1,
            _ => {}
        }
        false
    });
    (opens, closes)
}

fn find_outside_quotes(text: &str, mut pred: impl FnMut(char) -> bool) -> Option<usize> {
    scan_outside_quotes(text, |_, ch| pred(ch))
}

fn split_outside_quotes(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    scan_outside_quotes(text, |idx, ch| {
        if ch == separator {
            parts.push(&text[start..idx]);
            start = idx + ch.len_utf8();
        }
        false
    });
    parts.push(&text[start..]);
    parts
}

/// Visit every character outside `"`, `'` and `` ` `` quotes until `visit`
/// returns `true`; returns that character's byte offset.
fn scan_outside_quotes(text: &str, mut visit: impl FnMut(usize, char) -> bool) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (idx, ch) in text.char_indices() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None if matches!(ch, '"' | '\'' | '`') => quote = Some(ch),
            None => {
                if visit(idx, ch) {
                    return Some(idx);
                }
            }
        }
    }
    None
}
