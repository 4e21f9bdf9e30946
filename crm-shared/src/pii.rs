use serde::{Serialize, Serializer};
use std::fmt;

/// Wraps customer contact data (email, phone) so it never reaches log output in clear text.
///
/// Serialization still writes the real value: API responses need it, log macros must not.
#[derive(Clone)]
pub struct Masked<T>(pub T);

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", mask(&self.0.to_string()))
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", mask(&self.0.to_string()))
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

/// Keeps the first character and, for emails, the domain: `alice@example.com` -> `a****@example.com`.
fn mask(raw: &str) -> String {
    let mut chars = raw.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return String::new(),
    };

    match raw.split_once('@') {
        Some((_, domain)) => format!("{}****@{}", first, domain),
        None => format!("{}****", first),
    }
}
