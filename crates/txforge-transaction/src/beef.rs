//! BEEF and Atomic BEEF serialization.
//!
//! BEEF packages a transaction together with its ancestor DAG and a
//! deduplicated table of merkle paths (BUMPs), so a receiver can verify
//! the whole history offline. Atomic BEEF wraps a BEEF payload with a
//! declared subject TXID and the invariant that every embedded
//! transaction is an ancestor of that subject.
//!
//! # Layout
//!
//! ```text
//! BEEF:   version (u32 LE, = BEEF_V1)
//!         varint(n_bumps)  bump*
//!         varint(n_txs)    (raw_tx  has_bump(u8)  [varint(bump_index)])*
//! Atomic: 0x01010101 (u32 LE)  subject_txid (32 bytes, big-endian)  beef
//! ```
//!
//! Transactions are emitted parents-first; a transaction carrying a
//! merkle path terminates the recursion below it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use txforge_primitives::chainhash::Hash;
use txforge_primitives::codec::{Reader, VarInt, Writer};
use txforge_spv::MerklePath;

use crate::transaction::Transaction;
use crate::TransactionError;

/// BEEF version magic (`0100beef` on the wire).
pub const BEEF_V1: u32 = 4022206465;
/// Atomic BEEF prefix.
pub const ATOMIC_BEEF: u32 = 0x01010101;

/// One transaction record accumulated during emission.
struct BeefEntry {
    txid: Hash,
    raw: Vec<u8>,
    path_index: Option<usize>,
}

/// Parsed-but-unlinked payload: transactions by txid (with their bump
/// index), the stream order, and the BUMP table.
struct BeefPayload {
    transactions: HashMap<Hash, (Transaction, Option<usize>)>,
    order: Vec<Hash>,
    bumps: Vec<Arc<MerklePath>>,
}

impl Transaction {
    // -----------------------------------------------------------------
    // Emission
    // -----------------------------------------------------------------

    /// Serialize this transaction and its ancestry to BEEF.
    ///
    /// With `allow_partial`, an input missing its source transaction is
    /// silently left out of the payload instead of failing with
    /// `MissingSource`.
    pub fn to_beef(&self, allow_partial: bool) -> Result<Vec<u8>, TransactionError> {
        let mut bumps: Vec<Arc<MerklePath>> = Vec::new();
        let mut entries: Vec<BeefEntry> = Vec::new();
        let mut seen: HashSet<Hash> = HashSet::new();
        self.collect_ancestry(&mut bumps, &mut entries, &mut seen, allow_partial)?;

        let mut writer = Writer::with_capacity(512);
        writer.write_u32_le(BEEF_V1);

        writer.write_varint(VarInt::from(bumps.len()));
        for bump in &bumps {
            writer.write_bytes(&bump.to_bytes());
        }

        writer.write_varint(VarInt::from(entries.len()));
        for entry in &entries {
            writer.write_bytes(&entry.raw);
            match entry.path_index {
                Some(index) => {
                    writer.write_u8(1);
                    writer.write_varint(VarInt::from(index));
                }
                None => writer.write_u8(0),
            }
        }

        Ok(writer.into_bytes())
    }

    /// Serialize to BEEF hex.
    pub fn to_beef_hex(&self, allow_partial: bool) -> Result<String, TransactionError> {
        Ok(hex::encode(self.to_beef(allow_partial)?))
    }

    /// Serialize to Atomic BEEF: the prefix, this transaction's TXID in
    /// big-endian (natural hex) order, then the BEEF payload.
    pub fn to_atomic_beef(&self, allow_partial: bool) -> Result<Vec<u8>, TransactionError> {
        let mut writer = Writer::with_capacity(512);
        writer.write_u32_le(ATOMIC_BEEF);
        let mut subject = *self.tx_id()?.as_bytes();
        subject.reverse();
        writer.write_bytes(&subject);
        writer.write_bytes(&self.to_beef(allow_partial)?);
        Ok(writer.into_bytes())
    }

    /// Serialize to Atomic BEEF hex.
    pub fn to_atomic_beef_hex(&self, allow_partial: bool) -> Result<String, TransactionError> {
        Ok(hex::encode(self.to_atomic_beef(allow_partial)?))
    }

    /// Walk the ancestor DAG depth-first, emitting every first-seen
    /// transaction after its ancestors so parents always precede
    /// children, and folding merkle paths into the shared BUMP table.
    /// Recursion stops below proof-anchored nodes.
    fn collect_ancestry(
        &self,
        bumps: &mut Vec<Arc<MerklePath>>,
        entries: &mut Vec<BeefEntry>,
        seen: &mut HashSet<Hash>,
        allow_partial: bool,
    ) -> Result<(), TransactionError> {
        let txid = self.tx_id()?;
        if !seen.insert(txid) {
            return Ok(());
        }

        let path_index = match &self.merkle_path {
            Some(path) => Some(merge_bump(bumps, path)?),
            None => None,
        };

        if path_index.is_none() {
            for (index, input) in self.inputs.iter().enumerate() {
                match &input.source_transaction {
                    Some(source) => {
                        source.collect_ancestry(bumps, entries, seen, allow_partial)?
                    }
                    None if allow_partial => {}
                    None => {
                        return Err(TransactionError::MissingSource(format!(
                            "input {} of {} has no source transaction to embed",
                            index, txid
                        )))
                    }
                }
            }
        }

        entries.push(BeefEntry {
            txid,
            raw: self.to_bytes()?,
            path_index,
        });
        Ok(())
    }

    // -----------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------

    /// Parse a BEEF payload and return its subject (the final
    /// transaction in the stream) with its ancestry linked.
    pub fn from_beef(bytes: &[u8]) -> Result<Transaction, TransactionError> {
        let mut reader = Reader::new(bytes);
        let payload = read_beef(&mut reader)?;
        let subject = *payload
            .order
            .last()
            .ok_or_else(|| TransactionError::InvalidBeef("no transactions".to_string()))?;

        let mut linked = HashMap::new();
        let root = link_ancestry(subject, &payload, &mut linked)?;
        Ok((*root).clone())
    }

    /// Parse a BEEF payload from hex.
    pub fn from_beef_hex(hex_str: &str) -> Result<Transaction, TransactionError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| TransactionError::InvalidBeef(format!("invalid hex: {}", e)))?;
        Self::from_beef(&bytes)
    }

    /// Parse an Atomic BEEF payload and return its subject transaction.
    ///
    /// Beyond plain BEEF parsing this enforces the atomic invariant:
    /// every embedded transaction must be reachable from the subject by
    /// following inputs, where nodes covered at some BUMP's level 0 are
    /// terminal witnesses. Unreachable transactions fail with
    /// `UnrelatedTx`; references that are neither embedded nor covered
    /// fail with `UnknownInputTx`.
    pub fn from_atomic_beef(bytes: &[u8]) -> Result<Transaction, TransactionError> {
        let mut reader = Reader::new(bytes);
        let prefix = reader.read_u32_le().map_err(|e| {
            TransactionError::InvalidAtomicBeef(format!("reading prefix: {}", e))
        })?;
        if prefix != ATOMIC_BEEF {
            return Err(TransactionError::InvalidAtomicBeef(format!(
                "expected prefix {:#010x}, found {:#010x}",
                ATOMIC_BEEF, prefix
            )));
        }
        let subject_bytes = reader.read_bytes_reverse(32).map_err(|e| {
            TransactionError::InvalidAtomicBeef(format!("reading subject txid: {}", e))
        })?;
        let subject = Hash::from_bytes(&subject_bytes)?;

        let payload = read_beef(&mut reader)?;
        if !payload.transactions.contains_key(&subject) {
            return Err(TransactionError::InvalidAtomicBeef(format!(
                "subject transaction {} is not embedded",
                subject
            )));
        }

        check_reachability(subject, &payload)?;

        let mut linked = HashMap::new();
        let root = link_ancestry(subject, &payload, &mut linked)?;
        Ok((*root).clone())
    }

    /// Parse an Atomic BEEF payload from hex.
    pub fn from_atomic_beef_hex(hex_str: &str) -> Result<Transaction, TransactionError> {
        let bytes = hex::decode(hex_str).map_err(|e| {
            TransactionError::InvalidAtomicBeef(format!("invalid hex: {}", e))
        })?;
        Self::from_atomic_beef(&bytes)
    }
}

/// Fold `path` into the BUMP table, returning its index.
///
/// Reference-identical paths reuse their slot directly. A path proving
/// the same root at the same height is merged into the stored BUMP via
/// `combine`. Anything else is appended.
fn merge_bump(
    bumps: &mut Vec<Arc<MerklePath>>,
    path: &Arc<MerklePath>,
) -> Result<usize, TransactionError> {
    for (index, existing) in bumps.iter_mut().enumerate() {
        if Arc::ptr_eq(existing, path) {
            return Ok(index);
        }
        if existing.block_height == path.block_height
            && existing.compute_root(None)? == path.compute_root(None)?
        {
            Arc::make_mut(existing).combine(path)?;
            return Ok(index);
        }
    }
    bumps.push(Arc::clone(path));
    Ok(bumps.len() - 1)
}

/// Read the BUMP table and transaction records of a BEEF stream.
fn read_beef(reader: &mut Reader) -> Result<BeefPayload, TransactionError> {
    let version = reader
        .read_u32_le()
        .map_err(|e| TransactionError::InvalidBeef(format!("reading version: {}", e)))?;
    if version != BEEF_V1 {
        return Err(TransactionError::InvalidBeef(format!(
            "unsupported version {}, expected {}",
            version, BEEF_V1
        )));
    }

    let n_bumps = reader
        .read_varint()
        .map_err(|e| TransactionError::InvalidBeef(format!("reading bump count: {}", e)))?;
    let mut bumps = Vec::with_capacity(n_bumps.value() as usize);
    for _ in 0..n_bumps.value() {
        bumps.push(Arc::new(MerklePath::from_reader(reader)?));
    }

    let n_txs = reader
        .read_varint()
        .map_err(|e| TransactionError::InvalidBeef(format!("reading tx count: {}", e)))?;
    let mut transactions = HashMap::new();
    let mut order = Vec::with_capacity(n_txs.value() as usize);
    for _ in 0..n_txs.value() {
        let tx = Transaction::read_from(reader)?;
        let has_bump = reader
            .read_u8()
            .map_err(|e| TransactionError::InvalidBeef(format!("reading bump flag: {}", e)))?;
        let path_index = if has_bump != 0 {
            let index = reader
                .read_varint()
                .map_err(|e| {
                    TransactionError::InvalidBeef(format!("reading bump index: {}", e))
                })?
                .value() as usize;
            if index >= bumps.len() {
                return Err(TransactionError::InvalidBumpIndex(index));
            }
            Some(index)
        } else {
            None
        };

        let txid = tx.tx_id()?;
        order.push(txid);
        transactions.insert(txid, (tx, path_index));
    }

    Ok(BeefPayload {
        transactions,
        order,
        bumps,
    })
}

/// Rebuild the ancestor DAG below `txid`.
///
/// A node with a bump index binds its merkle path and terminates the
/// walk; otherwise every input must resolve within the payload.
fn link_ancestry(
    txid: Hash,
    payload: &BeefPayload,
    linked: &mut HashMap<Hash, Arc<Transaction>>,
) -> Result<Arc<Transaction>, TransactionError> {
    if let Some(done) = linked.get(&txid) {
        return Ok(Arc::clone(done));
    }

    let (tx, path_index) = payload
        .transactions
        .get(&txid)
        .ok_or_else(|| TransactionError::UnknownInputTx(txid.to_string()))?;
    let mut tx = tx.clone();

    match path_index {
        Some(index) => {
            tx.merkle_path = Some(Arc::clone(&payload.bumps[*index]));
        }
        None => {
            for input in &mut tx.inputs {
                input.source_transaction =
                    Some(link_ancestry(input.source_txid, payload, linked)?);
            }
        }
    }

    let tx = Arc::new(tx);
    linked.insert(txid, Arc::clone(&tx));
    Ok(tx)
}

/// Enforce the atomic invariant: every embedded transaction is an
/// ancestor of `subject`.
fn check_reachability(subject: Hash, payload: &BeefPayload) -> Result<(), TransactionError> {
    let anchored: HashSet<Hash> = payload
        .bumps
        .iter()
        .filter_map(|bump| bump.path.first())
        .flatten()
        .filter_map(|leaf| leaf.hash)
        .collect();

    let mut visited: HashSet<Hash> = HashSet::new();
    let mut pending = vec![subject];
    while let Some(txid) = pending.pop() {
        if !visited.insert(txid) {
            continue;
        }
        if anchored.contains(&txid) {
            // A proof-anchored node is a terminal witness.
            continue;
        }
        let (tx, _) = &payload.transactions[&txid];
        for input in &tx.inputs {
            if payload.transactions.contains_key(&input.source_txid) {
                pending.push(input.source_txid);
            } else if !anchored.contains(&input.source_txid) {
                return Err(TransactionError::UnknownInputTx(
                    input.source_txid.to_string(),
                ));
            }
        }
    }

    for txid in payload.transactions.keys() {
        if !visited.contains(txid) {
            return Err(TransactionError::UnrelatedTx(txid.to_string()));
        }
    }
    Ok(())
}
