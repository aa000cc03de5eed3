/// Identifier used when normalization leaves nothing behind.
pub const FALLBACK_IDENTIFIER: &str = "table";

/// Turn a raw name into a lowercase `[a-z0-9_]` identifier.
///
/// Each run of other characters becomes a single `_` (existing underscores are
/// kept as written). Leading/trailing `_` are stripped, an empty result becomes
/// [`FALLBACK_IDENTIFIER`] and a leading digit gets a `t_` prefix. Total: any
/// input yields a usable identifier.
pub fn normalize_identifier(raw: &str) -> String {
    let mut replaced = String::with_capacity(raw.len());
    let mut in_invalid_run = false;
    for ch in raw.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            replaced.push(ch);
            in_invalid_run = false;
        } else if !in_invalid_run {
            replaced.push('_');
            in_invalid_run = true;
        }
    }

    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() {
        return FALLBACK_IDENTIFIER.to_string();
    }

    if trimmed.starts_with(|ch: char| ch.is_ascii_digit()) {
        format!("t_{trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Strip one pair of surrounding `"`, `'` or `` ` `` quotes and outer whitespace.
pub fn strip_quotes(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['"', '\'', '`'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].trim();
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_case() {
        assert_eq!(normalize_identifier("Table Name"), "table_name");
        assert_eq!(normalize_identifier("table-name"), "table_name");
        assert_eq!(normalize_identifier("table.name"), "table_name");
        assert_eq!(normalize_identifier("TableName"), "tablename");
    }

    #[test]
    fn collapses_runs_of_invalid_characters() {
        assert_eq!(normalize_identifier("table::name!!123"), "table_name_123");
        assert_eq!(normalize_identifier("stories__kids"), "stories__kids");
    }

    #[test]
    fn strips_outer_underscores() {
        assert_eq!(normalize_identifier("_table_name_"), "table_name");
        assert_eq!(normalize_identifier("  spaced  "), "spaced");
    }

    #[test]
    fn prefixes_leading_digit() {
        assert_eq!(normalize_identifier("123_table"), "t_123_table");
        assert_eq!(normalize_identifier("_9lives"), "t_9lives");
    }

    #[test]
    fn falls_back_when_nothing_is_left() {
        assert_eq!(normalize_identifier("!!!"), "table");
        assert_eq!(normalize_identifier(""), "table");
        assert_eq!(normalize_identifier("___"), "table");
    }

    #[test]
    fn replaces_non_ascii_letters() {
        assert_eq!(normalize_identifier("café"), "caf");
        assert_eq!(normalize_identifier("ünits"), "nits");
    }

    #[test]
    fn strip_quotes_handles_all_quote_styles() {
        assert_eq!(strip_quotes("\"table_name\""), "table_name");
        assert_eq!(strip_quotes("'table_name'"), "table_name");
        assert_eq!(strip_quotes("`table_name`"), "table_name");
        assert_eq!(strip_quotes("  \"table_name\"  "), "table_name");
        assert_eq!(strip_quotes("  table_name  "), "table_name");
        assert_eq!(strip_quotes("'"), "'");
    }
}
