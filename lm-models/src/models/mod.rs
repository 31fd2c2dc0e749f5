//! Entity model definitions.

pub mod billing;
pub mod contact;
pub mod event;
pub mod file;
pub mod matter;
pub mod note;
pub mod task;

/// Numeric identifier used by every LawMatics entity.
pub type EntityId = i64;

#[cfg(test)]
pub(crate) mod test_support {
    use serde::de::DeserializeOwned;
    use serde::Serialize;

    /// Wrap `value` in a `{"data": ...}` envelope, serialize, and decode it back.
    pub fn envelope_roundtrip<T: Serialize + DeserializeOwned>(value: &T) -> T {
        let wire = serde_json::json!({ "data": value }).to_string();
        let mut decoded: serde_json::Value = serde_json::from_str(&wire).unwrap();
        serde_json::from_value(decoded["data"].take()).unwrap()
    }
}
