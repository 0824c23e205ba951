use super::types::SyntaxIssue;

const MAX_LOCAL_LEN: usize = 64;

/// Permissive local-part check: a dot-atom of common atext characters, or a
/// quoted string with balanced quotes and complete escapes.
pub(crate) fn check_local(local: &str) -> Result<(), SyntaxIssue> {
    if local.is_empty() || local.len() > MAX_LOCAL_LEN {
        return Err(SyntaxIssue::LocalLength);
    }
    if local.starts_with('"') {
        return check_quoted(local);
    }
    if local.contains('"') {
        return if local.matches('"').count() % 2 == 1 {
            Err(SyntaxIssue::UnbalancedQuote)
        } else {
            Err(SyntaxIssue::LocalChars)
        };
    }
    check_dot_atom(local)
}

fn check_dot_atom(s: &str) -> Result<(), SyntaxIssue> {
    if s.starts_with('.') || s.ends_with('.') || s.contains("..") {
        return Err(SyntaxIssue::LocalDots);
    }
    let ok = s.chars().all(|c| {
        c.is_ascii_alphanumeric()
            || matches!(
                c,
                '!' | '#'
                    | '$'
                    | '%'
                    | '&'
                    | '\''
                    | '*'
                    | '+'
                    | '-'
                    | '/'
                    | '='
                    | '?'
                    | '^'
                    | '_'
                    | '`'
                    | '{'
                    | '|'
                    | '}'
                    | '~'
                    | '.'
            )
    });
    if ok { Ok(()) } else { Err(SyntaxIssue::LocalChars) }
}

fn check_quoted(s: &str) -> Result<(), SyntaxIssue> {
    if s.len() < 2 || !s.ends_with('"') {
        return Err(SyntaxIssue::UnbalancedQuote);
    }
    let inner = &s[1..s.len() - 1];
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if chars.next().is_none() {
                    return Err(SyntaxIssue::UnbalancedQuote);
                }
            }
            '"' => return Err(SyntaxIssue::UnbalancedQuote),
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dots() {
        assert_eq!(check_local(".abc"), Err(SyntaxIssue::LocalDots));
        assert_eq!(check_local("abc."), Err(SyntaxIssue::LocalDots));
        assert_eq!(check_local("a..b"), Err(SyntaxIssue::LocalDots));
        assert_eq!(check_local("a.b"), Ok(()));
    }

    #[test]
    fn quoted_local_parts() {
        assert_eq!(check_local("\"a b\""), Ok(()));
        assert_eq!(check_local("\"a@b\""), Ok(()));
        assert_eq!(check_local("\"a\\\"b\""), Ok(()));
        assert_eq!(check_local("\"abc"), Err(SyntaxIssue::UnbalancedQuote));
        assert_eq!(check_local("\"a\"b\""), Err(SyntaxIssue::UnbalancedQuote));
        assert_eq!(check_local("ab\"c"), Err(SyntaxIssue::UnbalancedQuote));
    }

    #[test]
    fn length_and_chars() {
        assert_eq!(check_local(""), Err(SyntaxIssue::LocalLength));
        assert_eq!(check_local(&"a".repeat(65)), Err(SyntaxIssue::LocalLength));
        assert_eq!(check_local("a b"), Err(SyntaxIssue::LocalChars));
        assert_eq!(check_local("first+tag"), Ok(()));
    }
}
