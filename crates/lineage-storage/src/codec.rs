//! Binary encoding of persisted values.

use lineage_core::{LineageError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

fn config() -> bincode::config::Configuration {
    bincode::config::standard()
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(value, config())
        .map_err(|e| LineageError::encoding(format!("encode failed: {}", e)))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, _read) = bincode::serde::decode_from_slice(bytes, config())
        .map_err(|e| LineageError::encoding(format!("decode failed: {}", e)))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_core::{IndividualRecord, Node, Record, Sex};
    use std::sync::Arc;

    #[test]
    fn test_node_survives_encoding() {
        let record = IndividualRecord::new("Ada", "King")
            .with_sex(Sex::Female)
            .born(1815, Some("London"));
        let node = Node::new("I1", Arc::new(Record::Individual(record)));

        let bytes = encode(&node).unwrap();
        let back: Node = decode(&bytes).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_garbage_is_encoding_error() {
        let err = decode::<Node>(&[0xff, 0x00, 0x13]).unwrap_err();
        assert!(matches!(err, LineageError::Encoding(_)));
    }
}
