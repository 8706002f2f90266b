//! Indentation helpers shared by extraction and synthesis.

/// Remove the longest common leading whitespace from every non-blank line.
///
/// Whitespace-only lines do not take part in computing the margin and come
/// out empty. Line structure, including a trailing newline, is preserved.
pub fn dedent(text: &str) -> String {
    let mut margin: Option<&str> = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let indent = &line[..line.len() - line.trim_start().len()];
        margin = Some(match margin {
            None => indent,
            Some(current) => common_prefix(current, indent),
        });
    }
    let margin = margin.unwrap_or("");

    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if line.trim().is_empty() {
            continue;
        }
        out.push_str(line.strip_prefix(margin).unwrap_or(line));
    }
    out
}

/// Prefix every non-blank line of `text` with `prefix`.
pub fn indent(text: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(text.len() + prefix.len() * 4);
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if !line.trim().is_empty() {
            out.push_str(prefix);
        }
        out.push_str(line);
    }
    out
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map_or(0, |((i, c), _)| i + c.len_utf8());
    &a[..len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dedent_removes_common_margin() {
        let text = "    if n <= 1\n        return n\n    end\n";
        assert_eq!(dedent(text), "if n <= 1\n    return n\nend\n");
    }

    #[test]
    fn dedent_ignores_blank_lines() {
        let text = "\n        a = 1\n\n  \n        b = 2\n    ";
        assert_eq!(dedent(text), "\na = 1\n\n\nb = 2\n");
    }

    #[test]
    fn dedent_mixed_tabs_and_spaces_share_nothing() {
        let text = "\tx\n    y";
        assert_eq!(dedent(text), text);
    }

    #[test]
    fn indent_skips_blank_lines() {
        assert_eq!(indent("a\n\nb", "    "), "    a\n\n    b");
    }
}
