//! Extended Format serialization.
//!
//! EF carries each input's source satoshis and locking script inline, so
//! script evaluation can proceed without resolving source transactions
//! separately. The layout is the raw format with a 6-byte marker after
//! the version and `source_satoshis || varint(len) || locking_script`
//! appended to every input.

use std::sync::Arc;

use txforge_primitives::codec::{Reader, VarInt, Writer};
use txforge_script::Script;

use crate::input::TransactionInput;
use crate::output::TransactionOutput;
use crate::transaction::Transaction;
use crate::TransactionError;

/// Marker bytes following the version in an EF payload.
pub const EF_MARKER: [u8; 6] = [0x00, 0x00, 0x00, 0x00, 0x00, 0xEF];

impl Transaction {
    /// Serialize this transaction to Extended Format.
    ///
    /// Every input must resolve its source output; otherwise
    /// `MissingSource` is returned.
    pub fn to_ef(&self) -> Result<Vec<u8>, TransactionError> {
        let mut writer = Writer::with_capacity(256);
        writer.write_u32_le(self.version);
        writer.write_bytes(&EF_MARKER);

        writer.write_varint(VarInt::from(self.inputs.len()));
        for (index, input) in self.inputs.iter().enumerate() {
            let source_output = input.source_output().ok_or_else(|| {
                TransactionError::MissingSource(format!(
                    "input {} needs a source transaction for extended serialization",
                    index
                ))
            })?;
            let source_satoshis = source_output.satoshis.ok_or_else(|| {
                TransactionError::MissingSource(format!(
                    "input {} resolves to a source output with no amount",
                    index
                ))
            })?;

            input.write_to(&mut writer, index)?;
            writer.write_u64_le(source_satoshis);
            let locking = source_output.locking_script.to_bytes();
            writer.write_varint(VarInt::from(locking.len()));
            writer.write_bytes(locking);
        }

        self.write_outputs(&mut writer)?;
        writer.write_u32_le(self.lock_time);
        Ok(writer.into_bytes())
    }

    /// Serialize this transaction to Extended Format hex.
    pub fn to_ef_hex(&self) -> Result<String, TransactionError> {
        Ok(hex::encode(self.to_ef()?))
    }

    /// Parse a transaction from Extended Format bytes.
    ///
    /// Each input gains a synthetic `source_transaction` holding the
    /// carried output at its referenced index, so the result behaves like
    /// a fully source-resolved transaction.
    pub fn from_ef(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = Reader::new(bytes);

        let version = reader.read_u32_le().map_err(|e| {
            TransactionError::InvalidEf(format!("reading version: {}", e))
        })?;
        let marker = reader.read_bytes(6).map_err(|e| {
            TransactionError::InvalidEf(format!("reading marker: {}", e))
        })?;
        if marker != EF_MARKER {
            return Err(TransactionError::InvalidEf(format!(
                "expected marker {}, found {}",
                hex::encode(EF_MARKER),
                hex::encode(marker)
            )));
        }

        let input_count = reader.read_varint().map_err(|e| {
            TransactionError::InvalidEf(format!("reading input count: {}", e))
        })?;
        let mut inputs = Vec::with_capacity(input_count.value() as usize);
        for _ in 0..input_count.value() {
            let mut input = TransactionInput::read_from(&mut reader)?;

            let source_satoshis = reader.read_u64_le().map_err(|e| {
                TransactionError::InvalidEf(format!("reading source satoshis: {}", e))
            })?;
            let script_len = reader.read_varint().map_err(|e| {
                TransactionError::InvalidEf(format!("reading source script length: {}", e))
            })?;
            let script_bytes =
                reader.read_bytes(script_len.value() as usize).map_err(|e| {
                    TransactionError::InvalidEf(format!("reading source script: {}", e))
                })?;

            input.source_transaction = Some(Arc::new(synthetic_source(
                input.source_output_index,
                source_satoshis,
                Script::from_bytes(script_bytes),
            )));
            inputs.push(input);
        }

        let output_count = reader.read_varint().map_err(|e| {
            TransactionError::InvalidEf(format!("reading output count: {}", e))
        })?;
        let mut outputs = Vec::with_capacity(output_count.value() as usize);
        for _ in 0..output_count.value() {
            outputs.push(TransactionOutput::read_from(&mut reader)?);
        }

        let lock_time = reader.read_u32_le().map_err(|e| {
            TransactionError::InvalidEf(format!("reading lock time: {}", e))
        })?;
        if reader.remaining() != 0 {
            return Err(TransactionError::InvalidEf(format!(
                "trailing {} bytes after transaction",
                reader.remaining()
            )));
        }

        let mut tx = Transaction::new();
        tx.version = version;
        tx.inputs = inputs;
        tx.outputs = outputs;
        tx.lock_time = lock_time;
        Ok(tx)
    }

    /// Parse a transaction from Extended Format hex.
    pub fn from_ef_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| TransactionError::InvalidEf(format!("invalid hex: {}", e)))?;
        Self::from_ef(&bytes)
    }
}

/// An otherwise-empty transaction carrying one known output at `index`.
fn synthetic_source(index: u32, satoshis: u64, locking_script: Script) -> Transaction {
    let mut source = Transaction::new();
    source.outputs = vec![TransactionOutput::default(); index as usize + 1];
    source.outputs[index as usize] = TransactionOutput {
        satoshis: Some(satoshis),
        locking_script,
        change: false,
    };
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use txforge_primitives::chainhash::Hash;

    fn source_resolved_tx() -> Transaction {
        let mut source = Transaction::new();
        source.outputs = vec![
            TransactionOutput::default(),
            TransactionOutput::default(),
            TransactionOutput {
                satoshis: Some(4200),
                locking_script: Script::from_hex(
                    "76a914eb0bd5edba389198e73f8efabddfc61666969ff788ac",
                )
                .unwrap(),
                change: false,
            },
        ];

        let mut tx = Transaction::new();
        let mut input = TransactionInput::new();
        input.source_txid = Hash::from_hex("0a").unwrap();
        input.source_output_index = 2;
        input.unlocking_script = Some(Script::from_bytes(&[0x51]));
        input.source_transaction = Some(Arc::new(source));
        tx.add_input(input).unwrap();
        tx.add_output(TransactionOutput {
            satoshis: Some(4100),
            locking_script: Script::from_bytes(&[0x51]),
            change: false,
        });
        tx
    }

    #[test]
    fn test_ef_header_layout() {
        let tx = source_resolved_tx();
        let ef = tx.to_ef().unwrap();
        assert_eq!(&ef[..4], &1u32.to_le_bytes());
        assert_eq!(&ef[4..10], &EF_MARKER);
    }

    #[test]
    fn test_ef_roundtrip_reconstructs_source_outputs() {
        let tx = source_resolved_tx();
        let parsed = Transaction::from_ef(&tx.to_ef().unwrap()).unwrap();

        // The raw portions agree byte for byte.
        assert_eq!(parsed.to_bytes().unwrap(), tx.to_bytes().unwrap());

        // The synthetic source holds the carried output at index 2.
        let source = parsed.inputs[0].source_transaction.as_ref().unwrap();
        assert_eq!(source.outputs.len(), 3);
        assert_eq!(source.outputs[2].satoshis, Some(4200));
        assert_eq!(
            source.outputs[2].locking_script.to_hex(),
            "76a914eb0bd5edba389198e73f8efabddfc61666969ff788ac"
        );
        assert_eq!(parsed.inputs[0].source_satoshis(), Some(4200));

        // And EF re-emission is stable.
        assert_eq!(parsed.to_ef().unwrap(), tx.to_ef().unwrap());
    }

    #[test]
    fn test_ef_emission_requires_sources() {
        let mut tx = source_resolved_tx();
        tx.inputs[0].source_transaction = None;
        assert!(matches!(
            tx.to_ef(),
            Err(TransactionError::MissingSource(_))
        ));
    }

    #[test]
    fn test_ef_rejects_bad_marker() {
        let tx = source_resolved_tx();
        let mut ef = tx.to_ef().unwrap();
        ef[9] = 0xEE;
        assert!(matches!(
            Transaction::from_ef(&ef),
            Err(TransactionError::InvalidEf(_))
        ));
    }

    #[test]
    fn test_ef_rejects_plain_raw_bytes() {
        let tx = source_resolved_tx();
        let raw = tx.to_bytes().unwrap();
        assert!(Transaction::from_ef(&raw).is_err());
    }
}
