//! Serde helpers for legacy field encodings

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrInt {
    Bool(bool),
    Int(i64),
}

impl BoolOrInt {
    fn into_bool(self) -> bool {
        match self {
            BoolOrInt::Bool(b) => b,
            // only a literal 1 counts as set
            BoolOrInt::Int(n) => n == 1,
        }
    }
}

/// Deserialize bool that also accepts numeric `1`/`0` and treats null as false
pub fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<BoolOrInt>::deserialize(deserializer).map(|opt| opt.is_some_and(BoolOrInt::into_bool))
}

/// Optional variant of [`flexible_bool`]; null stays `None`
pub fn option_flexible_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<BoolOrInt>::deserialize(deserializer).map(|opt| opt.map(BoolOrInt::into_bool))
}

/// Keep an explicit `null` apart from a missing field
///
/// Use together with `#[serde(default)]`: missing → `None`,
/// `null` → `Some(None)`, value → `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
