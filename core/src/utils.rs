//! Redaction of secrets in `Debug` output.

use std::fmt;

/// Masks an account key when debug printed.
///
/// Keys shorter than 12 characters are masked entirely. Longer keys keep
/// their first and last three characters so two keys can be told apart.
pub struct Redact<'a>(Option<&'a str>);

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(Some(value))
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(Some(value))
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        Redact(value.as_deref())
    }
}

impl fmt::Debug for Redact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(secret) = self.0 else {
            return f.write_str("<unset>");
        };

        let len = secret.chars().count();
        match len {
            0 => f.write_str("<empty>"),
            1..=11 => f.write_str("***"),
            _ => {
                let head: String = secret.chars().take(3).collect();
                let tail: String = secret.chars().skip(len - 3).collect();
                write!(f, "{head}***{tail}")
            }
        }
    }
}
