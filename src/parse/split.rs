/// Split `input` on `delim`. A delimiter preceded by a backslash is literal
/// content; the backslash is dropped. Other backslashes are kept as-is.
///
/// Always returns at least one (possibly empty) part.
pub fn split_escaped(input: &str, delim: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&delim) {
            current.push(delim);
            chars.next();
        } else if c == delim {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

/// Inverse of [`split_escaped`] for a single part. A part ending in a
/// backslash cannot be round-tripped when another part follows it.
pub fn escape(part: &str, delim: char) -> String {
    let mut out = String::with_capacity(part.len());
    for c in part.chars() {
        if c == delim {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_split() {
        assert_eq!(split_escaped("Y;twinx;color=red", ';'), vec!["Y", "twinx", "color=red"]);
    }

    #[test]
    fn test_escaped_delimiter_is_literal() {
        assert_eq!(split_escaped(r"a\;b;c", ';'), vec!["a;b", "c"]);
    }

    #[test]
    fn test_other_backslashes_survive() {
        assert_eq!(split_escaped(r"$\alpha$;b", ';'), vec![r"$\alpha$", "b"]);
    }

    #[test]
    fn test_empty_parts() {
        assert_eq!(split_escaped("", ';'), vec![""]);
        assert_eq!(split_escaped("a;;", ';'), vec!["a", "", ""]);
    }

    #[test]
    fn test_escape_then_split() {
        let encoded = format!("{};{}", escape("x;y", ';'), escape("z", ';'));
        assert_eq!(split_escaped(&encoded, ';'), vec!["x;y", "z"]);
    }

    proptest! {
        #[test]
        fn prop_split_recovers_joined_parts(parts in prop::collection::vec("[^;\\\\]{0,8}", 1..6)) {
            let joined = parts.join(";");
            prop_assert_eq!(split_escaped(&joined, ';'), parts);
        }

        #[test]
        fn prop_escape_round_trips(parts in prop::collection::vec("[a-z;,=]{0,8}", 1..6)) {
            let joined = parts.iter().map(|p| escape(p, ';')).collect::<Vec<_>>().join(";");
            prop_assert_eq!(split_escaped(&joined, ';'), parts);
        }
    }
}
