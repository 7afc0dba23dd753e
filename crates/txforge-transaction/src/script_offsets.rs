//! Script offset parsing.
//!
//! Walks the raw transaction layout and reports where every unlocking and
//! locking script sits, without materializing the script bytes. Useful
//! for tooling that patches or inspects scripts inside large payloads.

use txforge_primitives::codec::Reader;

use crate::transaction::Transaction;
use crate::TransactionError;

/// Location of one script inside a raw transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptOffset {
    /// Input (vin) or output (vout) position of the script's owner.
    pub index: u32,
    /// Byte offset of the script's first byte within the payload.
    pub offset: usize,
    /// Script length in bytes.
    pub length: usize,
}

/// Script locations of every input and output of a raw transaction.
#[derive(Clone, Debug, Default)]
pub struct ScriptOffsets {
    /// Unlocking script locations, by input order.
    pub inputs: Vec<ScriptOffset>,
    /// Locking script locations, by output order.
    pub outputs: Vec<ScriptOffset>,
}

impl Transaction {
    /// Compute the script offsets of a raw transaction payload.
    pub fn parse_script_offsets(bytes: &[u8]) -> Result<ScriptOffsets, TransactionError> {
        let mut reader = Reader::new(bytes);
        let short = |what: &str| {
            TransactionError::Serialization(format!("payload ends inside {}", what))
        };

        reader.read_bytes(4).map_err(|_| short("version"))?;

        let input_count = reader.read_varint().map_err(|_| short("input count"))?;
        let mut inputs = Vec::with_capacity(input_count.value() as usize);
        for vin in 0..input_count.value() {
            // Outpoint: 32-byte txid plus 4-byte output index.
            reader.read_bytes(36).map_err(|_| short("outpoint"))?;
            let length = reader
                .read_varint()
                .map_err(|_| short("script length"))?
                .value() as usize;
            let offset = reader.position();
            reader.read_bytes(length).map_err(|_| short("unlocking script"))?;
            inputs.push(ScriptOffset {
                index: vin as u32,
                offset,
                length,
            });
            reader.read_bytes(4).map_err(|_| short("sequence"))?;
        }

        let output_count = reader.read_varint().map_err(|_| short("output count"))?;
        let mut outputs = Vec::with_capacity(output_count.value() as usize);
        for vout in 0..output_count.value() {
            reader.read_bytes(8).map_err(|_| short("satoshis"))?;
            let length = reader
                .read_varint()
                .map_err(|_| short("script length"))?
                .value() as usize;
            let offset = reader.position();
            reader.read_bytes(length).map_err(|_| short("locking script"))?;
            outputs.push(ScriptOffset {
                index: vout as u32,
                offset,
                length,
            });
        }

        reader.read_bytes(4).map_err(|_| short("lock time"))?;
        Ok(ScriptOffsets { inputs, outputs })
    }
}
