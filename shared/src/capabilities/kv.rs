use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub const MAX_VALUE_SIZE: usize = 5 * 1024 * 1024;

/// Storage key of the user report log.
const REPORTS_KEY: &str = "userReports";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KvKey(String);

impl KvKey {
    pub fn reports() -> Self {
        Self(REPORTS_KEY.to_string())
    }
}

impl From<KvKey> for String {
    fn from(key: KvKey) -> Self {
        key.0
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KvError {
    #[error("value too large: {size} bytes exceeds maximum of {max} bytes")]
    ValueTooLarge { size: usize, max: usize },

    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("serialization error: {message}")]
    Serialization { message: String },
}

/// Normalises the store's answer to a `get`/`set`.
pub fn from_store<E: std::fmt::Display>(
    result: Result<Option<Vec<u8>>, E>,
) -> Result<Option<Vec<u8>>, KvError> {
    result.map_err(|e| KvError::Storage {
        message: e.to_string(),
    })
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, KvError> {
    let data = serde_json::to_vec(value).map_err(|e| KvError::Serialization {
        message: e.to_string(),
    })?;
    if data.len() > MAX_VALUE_SIZE {
        return Err(KvError::ValueTooLarge {
            size: data.len(),
            max: MAX_VALUE_SIZE,
        });
    }
    Ok(data)
}

pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, KvError> {
    serde_json::from_slice(data).map_err(|e| KvError::Serialization {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_key() {
        assert_eq!(String::from(KvKey::reports()), "userReports");
    }

    #[test]
    fn test_encode_rejects_oversized_values() {
        let big = "x".repeat(MAX_VALUE_SIZE);
        assert!(matches!(
            encode(&big),
            Err(KvError::ValueTooLarge { max: MAX_VALUE_SIZE, .. })
        ));
    }

    #[test]
    fn test_from_store_maps_errors() {
        let ok: Result<Option<Vec<u8>>, String> = Ok(Some(b"[]".to_vec()));
        assert_eq!(from_store(ok), Ok(Some(b"[]".to_vec())));

        let err: Result<Option<Vec<u8>>, String> = Err("quota".into());
        assert_eq!(
            from_store(err),
            Err(KvError::Storage {
                message: "quota".into()
            })
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode::<Vec<u32>>(b"{not json"),
            Err(KvError::Serialization { .. })
        ));
        assert_eq!(decode::<Vec<u32>>(&encode(&vec![1u32, 2]).unwrap()).unwrap(), vec![1, 2]);
    }
}
