//! Struct tag helpers.
//!
//! Tags follow the conventional `key:"value" other:"value,opt"` layout.

/// Look up `key` in a struct tag. Malformed trailing content ends the scan.
pub fn tag_value(tag: &str, key: &str) -> Option<String> {
    let mut rest = tag;
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return None;
        }

        let name_len = rest
            .find(|c: char| c <= ' ' || c == ':' || c == '"' || c == '\u{7f}')
            .unwrap_or(rest.len());
        let after_name = &rest[name_len..];
        if name_len == 0 || !after_name.starts_with(":\"") {
            return None;
        }
        let name = &rest[..name_len];

        let quoted = &after_name[1..];
        let mut end = None;
        let mut escaped = false;
        for (i, c) in quoted.char_indices().skip(1) {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => {
                    end = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let end = end?;
        if name == key {
            return Some(unquote(&quoted[1..end]));
        }
        rest = &quoted[end + 1..];
    }
}

fn unquote(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// The part of a tag value before the first comma (`"id,omitempty"` -> `"id"`).
pub fn first_value(value: &str) -> &str {
    value.split_once(',').map_or(value, |(first, _)| first)
}

/// Two tags match when any of `keys` carries the same non-empty first value in both.
pub fn tags_match(a: &str, b: &str, keys: &[String]) -> bool {
    keys.iter().any(|key| {
        let (Some(va), Some(vb)) = (tag_value(a, key), tag_value(b, key)) else {
            return false;
        };
        let (va, vb) = (first_value(&va), first_value(&vb));
        !va.is_empty() && va == vb
    })
}

// ============================================================================
// Tests
// ============================================================================
