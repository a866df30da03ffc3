//! Signed permission (`sp`) helpers.

/// Order the service expects permission letters in for a service SAS.
pub const CANONICAL_ORDER: &str = "racwudpl";

/// Filter and reorder `sp` into [`CANONICAL_ORDER`].
///
/// Unknown letters and duplicates are dropped. Only service SAS permissions
/// are canonicalized; an account SAS signs the letters in caller order.
pub fn canonicalize_permissions(sp: &str) -> String {
    CANONICAL_ORDER.chars().filter(|c| sp.contains(*c)).collect()
}

/// Human readable name of a permission letter.
pub fn describe(letter: char) -> Option<&'static str> {
    match letter {
        'r' => Some("read"),
        'a' => Some("add"),
        'c' => Some("create"),
        'w' => Some("write"),
        'u' => Some("update"),
        'd' => Some("delete"),
        'p' => Some("process"),
        'l' => Some("list"),
        _ => None,
    }
}
