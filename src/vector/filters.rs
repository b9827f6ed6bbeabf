//! Filter expressions understood by the vector store.

/// Equality predicate scoping a query to one upload session.
///
/// Single quotes and backslashes are escaped so the value cannot close the string literal.
pub fn session_filter(session_id: &str) -> String {
    let escaped = session_id.replace('\\', "\\\\").replace('\'', "\\'");
    format!("session_id = '{escaped}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_equality_predicate() {
        assert_eq!(session_filter("abc-123"), "session_id = 'abc-123'");
    }

    #[test]
    fn escapes_quotes() {
        assert_eq!(session_filter("a'b"), "session_id = 'a\\'b'");
    }
}
