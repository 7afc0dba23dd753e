//! Transaction output: a satoshi amount and the script that locks it.

use txforge_primitives::codec::Reader;
use txforge_script::Script;

use crate::TransactionError;

/// A single transaction output.
///
/// `satoshis` is `None` only for a change output whose amount has not yet
/// been filled in by fee computation; serialization of such an output
/// fails. The `change` flag is a local annotation and never hits the wire.
///
/// # Wire format
///
/// | Field          | Size         |
/// |----------------|--------------|
/// | satoshis       | 8 bytes (LE) |
/// | script length  | VarInt       |
/// | locking_script | variable     |
#[derive(Clone, Debug, Default)]
pub struct TransactionOutput {
    /// Amount in satoshis; `None` while awaiting fee computation.
    pub satoshis: Option<u64>,

    /// The locking script (scriptPubKey).
    pub locking_script: Script,

    /// Marks an output whose amount the fee engine fills in.
    pub change: bool,
}

impl TransactionOutput {
    /// Create an output with no amount and an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserialize an output from a reader in the standard wire format.
    pub fn read_from(reader: &mut Reader) -> Result<Self, TransactionError> {
        let satoshis = reader.read_u64_le().map_err(|e| {
            TransactionError::Serialization(format!("reading satoshis: {}", e))
        })?;

        let script_len = reader.read_varint().map_err(|e| {
            TransactionError::Serialization(format!("reading script length: {}", e))
        })?;
        let script_bytes = reader.read_bytes(script_len.value() as usize).map_err(|e| {
            TransactionError::Serialization(format!("reading locking script: {}", e))
        })?;

        Ok(TransactionOutput {
            satoshis: Some(satoshis),
            locking_script: Script::from_bytes(script_bytes),
            change: false,
        })
    }
}
