//! Inline parameter rendering for unprepared statements.
//!
//! When a command is not server-side prepared, its parameters are rendered
//! into the statement text as SQL literals. The scanner honors `'`, `"` and
//! `` ` `` quoting (with backslash and doubled-quote escapes) so placeholder
//! characters inside literals and identifiers are left untouched.
//!
//! Two placeholder forms are substituted:
//! - `?` consumes the next unnamed parameter in order;
//! - `@name` substitutes the parameter with that name, and is left as-is
//!   when no such parameter exists (it may be a user variable).

use mysql_types::MySqlValue;

use crate::batch::BatchParameter;
use crate::error::{Error, Result};

/// Render `value` as a SQL literal into `out`.
pub fn append_literal(out: &mut String, value: &MySqlValue) {
    match value {
        MySqlValue::Null => out.push_str("NULL"),
        MySqlValue::Int(v) => {
            out.push_str(&v.to_string());
        }
        MySqlValue::UInt(v) => {
            out.push_str(&v.to_string());
        }
        MySqlValue::Float(v) => {
            out.push_str(&v.to_string());
        }
        MySqlValue::Double(v) => {
            out.push_str(&v.to_string());
        }
        MySqlValue::Text(v) => {
            out.push('\'');
            for c in v.chars() {
                match c {
                    '\'' => out.push_str("''"),
                    '\\' => out.push_str("\\\\"),
                    '\0' => out.push_str("\\0"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\u{1A}' => out.push_str("\\Z"),
                    c => out.push(c),
                }
            }
            out.push('\'');
        }
        MySqlValue::Bytes(v) => {
            out.push_str("X'");
            for b in v.iter() {
                out.push_str(&format!("{b:02X}"));
            }
            out.push('\'');
        }
    }
}

/// Render `value` as a standalone SQL literal.
#[must_use]
pub fn literal(value: &MySqlValue) -> String {
    let mut out = String::new();
    append_literal(&mut out, value);
    out
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Substitute parameters into `sql`, returning the rendered statement text.
pub fn interpolate(sql: &str, parameters: &[BatchParameter]) -> Result<String> {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.char_indices().peekable();
    let mut unnamed = parameters.iter().filter(|p| p.name.is_none());
    let mut quote: Option<char> = None;

    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' && q != '`' {
                if let Some((_, escaped)) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q {
                // A doubled quote stays inside the literal.
                if chars.peek().map(|(_, next)| *next) == Some(q) {
                    let (_, next) = chars.next().unwrap_or((i, q));
                    out.push(next);
                } else {
                    quote = None;
                }
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                out.push(c);
            }
            '?' => {
                let param = unnamed.next().ok_or_else(|| {
                    Error::InvalidOperation(
                        "statement has more `?` placeholders than unnamed parameters".into(),
                    )
                })?;
                append_literal(&mut out, &param.value);
            }
            '@' => {
                let mut name = String::new();
                while let Some((_, next)) = chars.peek() {
                    if is_name_char(*next) {
                        name.push(*next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match parameters
                    .iter()
                    .find(|p| p.name.as_deref() == Some(name.as_str()))
                {
                    Some(param) => append_literal(&mut out, &param.value),
                    None => {
                        // Not a parameter; keep the user variable verbatim.
                        out.push('@');
                        out.push_str(&name);
                    }
                }
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unnamed(value: impl Into<MySqlValue>) -> BatchParameter {
        BatchParameter::new(value)
    }

    fn named(name: &str, value: impl Into<MySqlValue>) -> BatchParameter {
        BatchParameter::named(name, value)
    }

    #[test]
    fn test_positional_substitution() {
        let sql = interpolate(
            "SELECT * FROM users WHERE id = ? AND name = ?",
            &[unnamed(7i32), unnamed("alice")],
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE id = 7 AND name = 'alice'");
    }

    #[test]
    fn test_named_substitution() {
        let sql = interpolate(
            "UPDATE t SET n = @n WHERE id = @id",
            &[named("n", 2i32), named("id", 5i32)],
        )
        .unwrap();
        assert_eq!(sql, "UPDATE t SET n = 2 WHERE id = 5");
    }

    #[test]
    fn test_user_variable_left_alone() {
        let sql = interpolate("SET @counter = @counter + ?", &[unnamed(1i32)]).unwrap();
        assert_eq!(sql, "SET @counter = @counter + 1");
    }

    #[test]
    fn test_placeholders_inside_literals_ignored() {
        let sql = interpolate("SELECT '?', \"@x\", `a?b` FROM t WHERE c = ?", &[unnamed(3i32)])
            .unwrap();
        assert_eq!(sql, "SELECT '?', \"@x\", `a?b` FROM t WHERE c = 3");
    }

    #[test]
    fn test_escaped_quote_inside_literal() {
        let sql = interpolate(r"SELECT 'it''s ?', 'a\'b?' , ?", &[unnamed(1i32)]).unwrap();
        assert_eq!(sql, r"SELECT 'it''s ?', 'a\'b?' , 1");
    }

    #[test]
    fn test_missing_parameter_rejected() {
        assert!(interpolate("SELECT ?", &[]).is_err());
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(literal(&MySqlValue::Text("a'b\\c\nd".into())), "'a''b\\\\c\\nd'");
    }

    #[test]
    fn test_null_and_binary_literals() {
        assert_eq!(literal(&MySqlValue::Null), "NULL");
        assert_eq!(literal(&MySqlValue::from(vec![0xDEu8, 0xAD])), "X'DEAD'");
    }
}
