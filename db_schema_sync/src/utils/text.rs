//! SQL text helpers

/// Remove every occurrence of the given characters
pub fn strip_chars(text: &str, chars: &[char]) -> String {
    text.chars().filter(|c| !chars.contains(c)).collect()
}

/// Escape a value for use inside a single-quoted MySQL string
pub fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "''")
}

/// Quote a value as a MySQL string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_literal(value))
}

/// Quote an identifier in backticks, doubling any backtick inside it
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Join quoted identifiers with `,` as used inside key column lists
pub fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_layout_characters() {
        assert_eq!(
            strip_chars("CREATE TABLE \"t\" (\n\tid int\n);", &['\n', '\t', '"']),
            "CREATE TABLE t (id int);"
        );
    }

    #[test]
    fn quotes_and_escapes() {
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(quote_literal(r"C:\tmp"), r"'C:\\tmp'");
        assert_eq!(quote_literal(""), "''");
    }

    #[test]
    fn joins_columns() {
        assert_eq!(column_list(&["a".into(), "b".into()]), "`a`,`b`");
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_identifier("order"), "`order`");
        assert_eq!(quote_identifier("order items"), "`order items`");
        assert_eq!(quote_identifier("odd`name"), "`odd``name`");
    }
}
