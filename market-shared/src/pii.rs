use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps buyer contact data (phone, email, address) so that `{:?}` and `{}`
/// in log macros never print it. Serialization still emits the real value,
/// since API responses and SQL binds need it.
#[derive(Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(&self.0.to_string()))
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(&self.0.to_string()))
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

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

/// Keeps the first character so operators can still tell values apart.
fn redact(raw: &str) -> String {
    match raw.chars().next() {
        Some(first) => format!("{}********", first),
        None => String::new(),
    }
}
