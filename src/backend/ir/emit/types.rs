//! Type spelling helpers for emission.

/// Strip the `package.` qualifier from every type name that belongs to the output package.
///
/// `*app.User` in package `app` becomes `*User`; names from other packages keep their qualifier.
pub(super) fn local_type(spelling: &str, package: &str) -> String {
    if package.is_empty() {
        return spelling.to_string();
    }
    let prefix = format!("{package}.");
    let mut out = String::with_capacity(spelling.len());
    let mut prev: Option<char> = None;
    let mut i = 0;
    while i < spelling.len() {
        let rest = &spelling[i..];
        let at_boundary = !prev.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.');
        if at_boundary && rest.starts_with(&prefix) {
            i += prefix.len();
            prev = Some('.');
            continue;
        }
        let Some(c) = rest.chars().next() else {
            break;
        };
        out.push(c);
        prev = Some(c);
        i += c.len_utf8();
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_type_strips_own_package() {
        assert_eq!(local_type("*app.User", "app"), "*User");
        assert_eq!(local_type("map[string][]*app.Item", "app"), "map[string][]*Item");
        assert_eq!(local_type("other.User", "app"), "other.User");
        assert_eq!(local_type("myapp.User", "app"), "myapp.User");
        assert_eq!(local_type("app.User", ""), "app.User");
    }
}
