//! Legacy text encoding of a progress vector.
//!
//! The user record schema stores a vector as 28 comma-separated decimals,
//! e.g. `100.0,20.0,10.0,5.0,0.0,...`. Only storage adapters use this; the
//! engine works on `ProgressVector` directly.

use progress_core::model::{ProgressVector, SLOT_COUNT};

use crate::repository::StorageError;

/// Encode as comma-separated shortest round-trip decimals (`0.0`, `100.0`).
#[must_use]
pub fn encode_vector(vector: &ProgressVector) -> String {
    vector
        .values()
        .iter()
        .map(|v| format!("{v:?}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode the comma-separated form.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if a field is not a number, the field
/// count is not `SLOT_COUNT`, or a value falls outside `[0, 100]`.
pub fn decode_vector(raw: &str) -> Result<ProgressVector, StorageError> {
    let values = raw
        .split(',')
        .map(|field| {
            field.trim().parse::<f64>().map_err(|_| {
                StorageError::Serialization(format!("invalid progress field: {field:?}"))
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;

    if values.len() != SLOT_COUNT {
        return Err(StorageError::Serialization(format!(
            "progress vector has {} fields, expected {SLOT_COUNT}",
            values.len()
        )));
    }

    ProgressVector::from_values(&values).map_err(|e| StorageError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use progress_core::project;

    #[test]
    fn zeroed_vector_matches_legacy_default() {
        let encoded = encode_vector(&ProgressVector::zeroed());
        assert_eq!(encoded, vec!["0.0"; SLOT_COUNT].join(","));
    }

    #[test]
    fn fractional_values_survive_encoding() {
        let vector = project(1.0, &[1.0, 3.0], &[0, 1], &ProgressVector::zeroed());
        let encoded = encode_vector(&vector);
        assert!(encoded.starts_with("100.0,33.333333333333336,0.0"));
        assert_eq!(decode_vector(&encoded).unwrap(), vector);
    }

    #[test]
    fn accepts_whitespace_and_integer_fields() {
        let raw = vec![" 0 "; SLOT_COUNT].join(",");
        assert_eq!(decode_vector(&raw).unwrap(), ProgressVector::zeroed());
    }

    #[test]
    fn rejects_wrong_field_count_and_garbage() {
        let short = vec!["0.0"; SLOT_COUNT - 1].join(",");
        assert!(matches!(
            decode_vector(&short),
            Err(StorageError::Serialization(msg)) if msg.contains("27 fields")
        ));

        let mut fields = vec!["0.0"; SLOT_COUNT];
        fields[2] = "abc";
        assert!(decode_vector(&fields.join(",")).is_err());

        fields[2] = "150.0";
        assert!(decode_vector(&fields.join(",")).is_err());
    }
}
