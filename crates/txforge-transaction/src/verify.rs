//! Recursive SPV verification.
//!
//! Verification walks the input DAG with a worklist. Each transaction is
//! either short-circuited at its merkle anchor or fully validated: every
//! input's script is evaluated through the [`SpendValidator`] seam, value
//! conservation is enforced, and unproven sources are queued for the same
//! treatment. Script and value violations yield `Ok(false)`; structural
//! defects (missing sources, amounts, or unlocking scripts) are errors.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use txforge_spv::ChainTracker;

use crate::fee::{ChangeDistribution, FeeModel};
use crate::spend::{Spend, SpendValidator};
use crate::transaction::Transaction;
use crate::TransactionError;

impl Transaction {
    /// Verify this transaction and its ancestry.
    ///
    /// * `chain_tracker` — header oracle consulted for merkle anchors.
    ///   `None` means "scripts only": anchors are accepted without header
    ///   checks. A tracker that rejects an anchor does not fail the
    ///   verification outright; the anchored transaction falls through to
    ///   full script validation instead.
    /// * `fee_model` — when present, each fully-validated transaction
    ///   must pay at least what the model computes for an equivalent
    ///   change-bearing clone (`InsufficientFee` otherwise).
    /// * `validator` — the script interpreter evaluating each spend.
    ///
    /// Returns `Ok(true)` once the worklist drains with every script
    /// accepted and value conserved.
    pub fn verify(
        &self,
        chain_tracker: Option<&dyn ChainTracker>,
        fee_model: Option<&dyn FeeModel>,
        validator: &dyn SpendValidator,
    ) -> Result<bool, TransactionError> {
        let mut verified = HashSet::new();
        let mut queue: VecDeque<Arc<Transaction>> = VecDeque::new();
        queue.push_back(Arc::new(self.clone()));

        while let Some(tx) = queue.pop_front() {
            let txid = tx.tx_id()?;
            if verified.contains(&txid) {
                continue;
            }

            // Proof short-circuit.
            if let Some(path) = &tx.merkle_path {
                match chain_tracker {
                    None => {
                        verified.insert(txid);
                        continue;
                    }
                    Some(tracker) => {
                        if path.verify(&txid, tracker)? {
                            verified.insert(txid);
                            continue;
                        }
                        // Anchor not accepted: validate scripts instead.
                    }
                }
            }

            if let Some(model) = fee_model {
                tx.check_fee_floor(model, &txid)?;
            }

            let mut input_total: u64 = 0;
            for (index, input) in tx.inputs.iter().enumerate() {
                let source = input.source_transaction.as_ref().ok_or_else(|| {
                    TransactionError::MissingSource(format!(
                        "input {} of {} has no source transaction to verify against",
                        index, txid
                    ))
                })?;
                let unlocking_script = input
                    .unlocking_script
                    .as_ref()
                    .ok_or(TransactionError::MissingUnlockingScript(index))?;

                let source_txid = source.tx_id()?;
                let source_output = source
                    .outputs
                    .get(input.source_output_index as usize)
                    .ok_or_else(|| {
                        TransactionError::MissingSource(format!(
                            "input {} of {} references output {} beyond its source",
                            index, txid, input.source_output_index
                        ))
                    })?;
                let source_satoshis = source_output
                    .satoshis
                    .ok_or_else(|| TransactionError::MissingOutputAmount(source_txid.to_string()))?;
                input_total += source_satoshis;

                if !verified.contains(&source_txid) {
                    queue.push_back(Arc::clone(source));
                }

                let spend = Spend {
                    source_txid,
                    source_output_index: input.source_output_index,
                    source_satoshis,
                    locking_script: source_output.locking_script.clone(),
                    transaction_version: tx.version,
                    other_inputs: tx
                        .inputs
                        .iter()
                        .enumerate()
                        .filter(|(other, _)| *other != index)
                        .map(|(_, other)| other.clone())
                        .collect(),
                    outputs: tx.outputs.clone(),
                    unlocking_script: unlocking_script.clone(),
                    input_sequence: input.sequence,
                    input_index: index,
                    lock_time: tx.lock_time,
                };
                if !validator.validate(&spend)? {
                    return Ok(false);
                }
            }

            let mut output_total: u64 = 0;
            for output in &tx.outputs {
                output_total += output
                    .satoshis
                    .ok_or_else(|| TransactionError::MissingOutputAmount(txid.to_string()))?;
            }
            if output_total > input_total {
                return Ok(false);
            }

            verified.insert(txid);
        }

        Ok(true)
    }

    /// Fee-model floor check: rebuild this transaction through EF, strip
    /// the first output's amount, re-derive it as change under `model`,
    /// and require the actual fee to be at least the clone's.
    fn check_fee_floor(
        &self,
        model: &dyn FeeModel,
        txid: &txforge_primitives::chainhash::Hash,
    ) -> Result<(), TransactionError> {
        let mut clone = Transaction::from_ef(&self.to_ef()?)?;
        if let Some(first) = clone.outputs.first_mut() {
            first.satoshis = None;
            first.change = true;
        }
        clone.fee(model, ChangeDistribution::Equal)?;
        if self.get_fee()? < clone.get_fee()? {
            return Err(TransactionError::InsufficientFee(txid.to_string()));
        }
        Ok(())
    }
}
