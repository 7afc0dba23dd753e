//! Fee models and change distribution.
//!
//! [`Transaction::fee`] asks a [`FeeModel`] what the transaction should
//! pay, then distributes the remaining input value across the outputs
//! flagged as change. Distribution is either an equal split or a
//! Benford-biased random split; the random path takes an injected RNG so
//! tests stay deterministic.

use rand::rngs::OsRng;
use rand::Rng;

use txforge_primitives::codec::VarInt;

use crate::transaction::Transaction;
use crate::TransactionError;

/// Capability that decides what fee a transaction should pay.
///
/// Models may introspect the whole transaction, including the estimated
/// lengths of not-yet-produced unlocking scripts.
pub trait FeeModel {
    /// Compute the fee in satoshis for `tx`.
    fn compute_fee(&self, tx: &Transaction) -> Result<u64, TransactionError>;
}

/// The naive size-based model: a flat rate per 1000 serialized bytes,
/// rounded up.
pub struct SatoshisPerKilobyte {
    /// Satoshis charged per kilobyte.
    pub value: u64,
}

impl SatoshisPerKilobyte {
    /// Create a model charging `value` satoshis per kilobyte.
    pub fn new(value: u64) -> Self {
        SatoshisPerKilobyte { value }
    }
}

impl FeeModel for SatoshisPerKilobyte {
    fn compute_fee(&self, tx: &Transaction) -> Result<u64, TransactionError> {
        let mut size = 4u64 + VarInt::from(tx.inputs.len()).length() as u64;
        for (index, input) in tx.inputs.iter().enumerate() {
            let script_len = match (&input.unlocking_script, &input.unlocking_script_template) {
                (Some(script), _) => script.len() as u64,
                (None, Some(template)) => template.estimate_length(tx, index),
                (None, None) => {
                    return Err(TransactionError::Fee(format!(
                        "input {} has neither an unlocking script nor a template to estimate one",
                        index
                    )))
                }
            };
            size += 36 + VarInt(script_len).length() as u64 + script_len + 4;
        }
        size += VarInt::from(tx.outputs.len()).length() as u64;
        for output in &tx.outputs {
            let script_len = output.locking_script.len() as u64;
            size += 8 + VarInt(script_len).length() as u64 + script_len;
        }
        size += 4;

        Ok((size as f64 / 1000.0 * self.value as f64).ceil() as u64)
    }
}

/// Adapter turning a constant satoshi amount into a fee model.
pub struct FixedFee(pub u64);

impl FeeModel for FixedFee {
    fn compute_fee(&self, _tx: &Transaction) -> Result<u64, TransactionError> {
        Ok(self.0)
    }
}

/// How computed change is spread across the change outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeDistribution {
    /// Every change output receives the same floor share.
    Equal,
    /// Benford-biased random shares.
    Random,
}

impl Transaction {
    /// Compute the fee and distribute change, using the operating
    /// system's RNG for the random distribution.
    pub fn fee(
        &mut self,
        model: &dyn FeeModel,
        distribution: ChangeDistribution,
    ) -> Result<(), TransactionError> {
        self.fee_with_rng(model, distribution, &mut OsRng)
    }

    /// Compute the fee and distribute change with a caller-supplied RNG.
    ///
    /// `change = Σ input source satoshis − fee − Σ fixed output
    /// satoshis`. When change is zero or negative all change outputs are
    /// dropped and the surplus becomes fee. Otherwise the change outputs
    /// are filled per `distribution`, and any dust remainder is added to
    /// the transaction's final output.
    pub fn fee_with_rng<R: Rng>(
        &mut self,
        model: &dyn FeeModel,
        distribution: ChangeDistribution,
        rng: &mut R,
    ) -> Result<(), TransactionError> {
        let fee = model.compute_fee(self)?;

        let mut total_in: i128 = 0;
        for (index, input) in self.inputs.iter().enumerate() {
            let satoshis = input.source_satoshis().ok_or_else(|| {
                TransactionError::MissingSource(format!(
                    "input {} has no resolvable source output for fee computation",
                    index
                ))
            })?;
            total_in += satoshis as i128;
        }

        let mut fixed_out: i128 = 0;
        for (index, output) in self.outputs.iter().enumerate() {
            if !output.change {
                fixed_out += output
                    .satoshis
                    .ok_or(TransactionError::MissingAmount(index))?
                    as i128;
            }
        }

        self.invalidate_cache();

        let change = total_in - fee as i128 - fixed_out;
        if change <= 0 {
            self.outputs.retain(|output| !output.change);
            return Ok(());
        }

        self.distribute_change(change as u64, distribution, rng);
        Ok(())
    }

    /// Spread `change` satoshis over the change outputs.
    fn distribute_change<R: Rng>(
        &mut self,
        change: u64,
        distribution: ChangeDistribution,
        rng: &mut R,
    ) {
        let change_indices: Vec<usize> = self
            .outputs
            .iter()
            .enumerate()
            .filter(|(_, output)| output.change)
            .map(|(index, _)| index)
            .collect();
        let k = change_indices.len() as u64;
        if k == 0 {
            // Nothing to fill; the surplus is implicitly paid as fee.
            return;
        }

        let leftover = match distribution {
            ChangeDistribution::Random if change > k => {
                // Every change output reserves one satoshi, then the
                // first k-1 outputs take Benford-weighted bites out of
                // the rest. floor(r * log10(1 + 1/d)) < r for d in 1..=9,
                // so the pool never underflows.
                let mut remaining = change - k;
                for &index in &change_indices {
                    self.outputs[index].satoshis = Some(1);
                }
                for &index in &change_indices[..change_indices.len() - 1] {
                    let digit = rng.gen_range(1u32..=9);
                    let share =
                        (remaining as f64 * (1.0 + 1.0 / digit as f64).log10()).floor() as u64;
                    self.outputs[index].satoshis =
                        Some(self.outputs[index].satoshis.unwrap_or(0) + share);
                    remaining -= share;
                }
                remaining
            }
            _ => {
                // Equal split; change <= k satoshis is too small to bias,
                // so the random path degenerates to this one.
                let per_output = change / k;
                for &index in &change_indices {
                    self.outputs[index].satoshis = Some(per_output);
                }
                change - per_output * k
            }
        };

        // The remainder lands on the transaction's final output, change
        // or not.
        if leftover > 0 {
            if let Some(last) = self.outputs.last_mut() {
                last.satoshis = Some(last.satoshis.unwrap_or(0) + leftover);
            }
        }
    }

    /// The fee this transaction currently pays: inputs minus outputs.
    pub fn get_fee(&self) -> Result<u64, TransactionError> {
        let total_in = self.total_input_satoshis()?;
        let total_out = self.total_output_satoshis()?;
        total_in.checked_sub(total_out).ok_or_else(|| {
            TransactionError::Fee(format!(
                "outputs ({}) exceed inputs ({})",
                total_out, total_in
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use txforge_script::Script;

    use super::*;
    use crate::input::TransactionInput;
    use crate::output::TransactionOutput;

    /// A transaction spending `satoshis` from a single synthetic source.
    fn spending_tx(satoshis: u64) -> Transaction {
        let mut source = Transaction::new();
        source.outputs.push(TransactionOutput {
            satoshis: Some(satoshis),
            locking_script: Script::from_bytes(&[0x51]),
            change: false,
        });

        let mut tx = Transaction::new();
        let mut input = TransactionInput::new();
        input.unlocking_script = Some(Script::new());
        input.source_transaction = Some(Arc::new(source));
        tx.add_input(input).unwrap();
        tx
    }

    fn fixed_output(satoshis: u64) -> TransactionOutput {
        TransactionOutput {
            satoshis: Some(satoshis),
            locking_script: Script::from_bytes(&[0x51]),
            change: false,
        }
    }

    fn change_output() -> TransactionOutput {
        TransactionOutput {
            satoshis: None,
            locking_script: Script::from_bytes(&[0x51]),
            change: true,
        }
    }

    #[test]
    fn test_equal_split_across_change_outputs() {
        let mut tx = spending_tx(1100);
        tx.add_output(fixed_output(900));
        tx.add_output(change_output());
        tx.add_output(change_output());

        tx.fee(&FixedFee(100), ChangeDistribution::Equal).unwrap();

        assert_eq!(tx.outputs[1].satoshis, Some(50));
        assert_eq!(tx.outputs[2].satoshis, Some(50));
        assert_eq!(tx.get_fee().unwrap(), 100);
    }

    #[test]
    fn test_equal_split_remainder_goes_to_last_output() {
        let mut tx = spending_tx(1101);
        tx.add_output(fixed_output(900));
        tx.add_output(change_output());
        tx.add_output(change_output());

        tx.fee(&FixedFee(100), ChangeDistribution::Equal).unwrap();

        // change = 101, floor share 50 each, 1 sat lands on the last output.
        assert_eq!(tx.outputs[1].satoshis, Some(50));
        assert_eq!(tx.outputs[2].satoshis, Some(51));
        assert_eq!(tx.get_fee().unwrap(), 100);
    }

    #[test]
    fn test_remainder_lands_on_final_output_even_if_not_change() {
        let mut tx = spending_tx(1101);
        tx.add_output(change_output());
        tx.add_output(change_output());
        tx.add_output(fixed_output(900));

        tx.fee(&FixedFee(100), ChangeDistribution::Equal).unwrap();

        assert_eq!(tx.outputs[0].satoshis, Some(50));
        assert_eq!(tx.outputs[1].satoshis, Some(50));
        // The non-change final output absorbs the dust satoshi.
        assert_eq!(tx.outputs[2].satoshis, Some(901));
        assert_eq!(tx.get_fee().unwrap(), 100);
    }

    #[test]
    fn test_negative_change_drops_change_outputs() {
        let mut tx = spending_tx(1000);
        tx.add_output(fixed_output(950));
        tx.add_output(change_output());

        tx.fee(&FixedFee(100), ChangeDistribution::Equal).unwrap();

        assert_eq!(tx.outputs.len(), 1);
        assert!(!tx.outputs[0].change);
        // The 50 sat shortfall is simply a 50 sat fee.
        assert_eq!(tx.get_fee().unwrap(), 50);
    }

    #[test]
    fn test_random_split_is_deterministic_and_conserving() {
        let build = || {
            let mut tx = spending_tx(1100);
            tx.add_output(fixed_output(500));
            tx.add_output(change_output());
            tx.add_output(change_output());
            tx.add_output(change_output());
            tx
        };

        let mut first = build();
        let mut rng = StdRng::seed_from_u64(42);
        first
            .fee_with_rng(&FixedFee(100), ChangeDistribution::Random, &mut rng)
            .unwrap();

        let mut second = build();
        let mut rng = StdRng::seed_from_u64(42);
        second
            .fee_with_rng(&FixedFee(100), ChangeDistribution::Random, &mut rng)
            .unwrap();

        let amounts: Vec<_> = first.outputs.iter().map(|o| o.satoshis).collect();
        assert_eq!(
            amounts,
            second.outputs.iter().map(|o| o.satoshis).collect::<Vec<_>>()
        );

        // Every change output holds at least its reserved satoshi, and the
        // full 500 sats of change were distributed.
        for output in &first.outputs[1..] {
            assert!(output.satoshis.unwrap() >= 1);
        }
        assert_eq!(first.get_fee().unwrap(), 100);
        assert_eq!(first.total_output_satoshis().unwrap(), 1000);
    }

    #[test]
    fn test_random_split_with_tiny_change_degenerates_to_equal() {
        let mut tx = spending_tx(1002);
        tx.add_output(fixed_output(900));
        tx.add_output(change_output());
        tx.add_output(change_output());
        tx.add_output(change_output());

        let mut rng = StdRng::seed_from_u64(7);
        tx.fee_with_rng(&FixedFee(100), ChangeDistribution::Random, &mut rng)
            .unwrap();

        // change = 2 over 3 outputs: floor share 0, remainder 2 on the last.
        assert_eq!(tx.outputs[1].satoshis, Some(0));
        assert_eq!(tx.outputs[2].satoshis, Some(0));
        assert_eq!(tx.outputs[3].satoshis, Some(2));
        assert_eq!(tx.get_fee().unwrap(), 100);
    }

    #[test]
    fn test_fee_requires_resolvable_sources() {
        let mut tx = Transaction::new();
        let mut input = TransactionInput::new();
        input.source_txid =
            txforge_primitives::chainhash::Hash::from_hex("01").unwrap();
        input.unlocking_script = Some(Script::new());
        tx.add_input(input).unwrap();
        tx.add_output(change_output());

        let result = tx.fee(&FixedFee(10), ChangeDistribution::Equal);
        assert!(matches!(result, Err(TransactionError::MissingSource(_))));
    }

    #[test]
    fn test_satoshis_per_kilobyte_rounds_up() {
        struct StubTemplate;
        impl crate::template::UnlockingScriptTemplate for StubTemplate {
            fn sign(
                &self,
                _tx: &Transaction,
                _input_index: usize,
            ) -> Result<Script, TransactionError> {
                Ok(Script::new())
            }
            fn estimate_length(&self, _tx: &Transaction, _input_index: usize) -> u64 {
                106
            }
        }

        let mut tx = spending_tx(100_000);
        tx.inputs[0].unlocking_script = None;
        tx.inputs[0].unlocking_script_template = Some(Arc::new(StubTemplate));
        tx.add_output(TransactionOutput {
            satoshis: Some(99_000),
            locking_script: Script::from_bytes(&[0u8; 25]),
            change: false,
        });

        // 4 + 1 + (36 + 1 + 106 + 4) + 1 + (8 + 1 + 25) + 4 = 191 bytes.
        let model = SatoshisPerKilobyte::new(500);
        assert_eq!(model.compute_fee(&tx).unwrap(), 96);

        // A signed input uses the real script length instead.
        tx.inputs[0].unlocking_script = Some(Script::from_bytes(&[0u8; 106]));
        assert_eq!(model.compute_fee(&tx).unwrap(), 96);
    }

    #[test]
    fn test_get_fee_rejects_overspend() {
        let mut tx = spending_tx(100);
        tx.add_output(fixed_output(200));
        assert!(matches!(tx.get_fee(), Err(TransactionError::Fee(_))));
    }
}
