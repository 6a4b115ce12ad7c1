//! Filename helpers.

use std::collections::HashSet;

/// Make a name safe to use as a single path component.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // Trim and limit length
    let trimmed = sanitized.trim().trim_matches('_');
    if trimmed.chars().count() > 100 {
        trimmed.chars().take(100).collect()
    } else if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Return `name`, or `name (n).ext` with the smallest n not yet in `taken`.
///
/// The returned name is recorded in `taken`.
pub fn disambiguate(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    };

    let mut n = 2;
    loop {
        let candidate = format!("{} ({}){}", stem, n, ext);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("nota.pdf"), "nota.pdf");
        assert_eq!(sanitize_filename("a/b\\c.pdf"), "a_b_c.pdf");
        assert_eq!(sanitize_filename("  "), "file");
        assert_eq!(sanitize_filename(&"x".repeat(150)).len(), 100);
    }

    #[test]
    fn test_disambiguate() {
        let mut taken = HashSet::new();
        assert_eq!(disambiguate("001_nota.pdf", &mut taken), "001_nota.pdf");
        assert_eq!(disambiguate("001_nota.pdf", &mut taken), "001_nota (2).pdf");
        assert_eq!(disambiguate("001_nota.pdf", &mut taken), "001_nota (3).pdf");
        assert_eq!(disambiguate("README", &mut taken), "README");
        assert_eq!(disambiguate("README", &mut taken), "README (2)");
    }
}
