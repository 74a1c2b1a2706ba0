//! Glob matching for key scans.
//!
//! Supports `*` (any run), `?` (any one char), `[abc]`, `[a-z]`, `[^a]`, and
//! `\` to escape the next character.

/// Whether `key` matches `pattern`.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();
    matches_at(&pattern, &key)
}

fn matches_at(pattern: &[char], key: &[char]) -> bool {
    let Some((&first, rest)) = pattern.split_first() else {
        return key.is_empty();
    };
    match first {
        '*' => (0..=key.len()).any(|skip| matches_at(rest, &key[skip..])),
        '?' => !key.is_empty() && matches_at(rest, &key[1..]),
        '[' => match class_end(rest) {
            Some(end) => {
                !key.is_empty()
                    && class_matches(&rest[..end], key[0])
                    && matches_at(&rest[end + 1..], &key[1..])
            }
            None => literal(first, rest, key),
        },
        '\\' => match rest.split_first() {
            Some((&escaped, tail)) => literal(escaped, tail, key),
            None => literal('\\', rest, key),
        },
        c => literal(c, rest, key),
    }
}

fn literal(c: char, rest: &[char], key: &[char]) -> bool {
    key.first() == Some(&c) && matches_at(rest, &key[1..])
}

fn class_end(class: &[char]) -> Option<usize> {
    let mut i = 0;
    while i < class.len() {
        match class[i] {
            '\\' => i += 2,
            ']' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn class_matches(class: &[char], c: char) -> bool {
    let (negated, class) = match class.split_first() {
        Some((&'^', rest)) => (true, rest),
        _ => (false, class),
    };
    let mut found = false;
    let mut i = 0;
    while i < class.len() {
        let lo = if class[i] == '\\' && i + 1 < class.len() {
            i += 1;
            class[i]
        } else {
            class[i]
        };
        if i + 2 < class.len() && class[i + 1] == '-' {
            let hi = class[i + 2];
            if lo <= c && c <= hi {
                found = true;
            }
            i += 3;
        } else {
            if lo == c {
                found = true;
            }
            i += 1;
        }
    }
    found != negated
}

/// Escape glob metacharacters so `literal` matches only itself.
pub fn escape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
