use proptest::prelude::*;

use txforge_primitives::chainhash::Hash;
use txforge_script::Script;
use txforge_transaction::{Transaction, TransactionInput, TransactionOutput};

/// Strategy generating structurally valid transactions.
fn arb_transaction() -> impl Strategy<Value = Transaction> {
    let arb_input = (
        prop::array::uniform32(any::<u8>()),
        any::<u32>(),
        prop::collection::vec(any::<u8>(), 0..64),
        any::<u32>(),
    )
        .prop_map(|(txid, vout, script, sequence)| {
            let mut input = TransactionInput::new();
            input.source_txid = Hash::new(txid);
            input.source_output_index = vout;
            input.unlocking_script = Some(Script::from_bytes(&script));
            input.sequence = sequence;
            input
        });

    let arb_output = (any::<u64>(), prop::collection::vec(any::<u8>(), 0..64)).prop_map(
        |(satoshis, script)| TransactionOutput {
            satoshis: Some(satoshis),
            locking_script: Script::from_bytes(&script),
            change: false,
        },
    );

    (
        any::<u32>(),
        prop::collection::vec(arb_input, 1..4),
        prop::collection::vec(arb_output, 1..4),
        any::<u32>(),
    )
        .prop_map(|(version, inputs, outputs, lock_time)| {
            let mut tx = Transaction::new();
            tx.version = version;
            tx.lock_time = lock_time;
            tx.inputs = inputs;
            tx.outputs = outputs;
            tx
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn raw_serialization_roundtrip(tx in arb_transaction()) {
        let bytes = tx.to_bytes().unwrap();
        let parsed = Transaction::from_bytes(&bytes).unwrap();
        prop_assert_eq!(parsed.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn hex_roundtrip(tx in arb_transaction()) {
        let hex_str = tx.to_hex().unwrap();
        let parsed = Transaction::from_hex(&hex_str).unwrap();
        prop_assert_eq!(parsed.to_hex().unwrap(), hex_str);
    }

    #[test]
    fn txid_is_stable_across_roundtrip(tx in arb_transaction()) {
        let parsed = Transaction::from_bytes(&tx.to_bytes().unwrap()).unwrap();
        prop_assert_eq!(parsed.tx_id().unwrap(), tx.tx_id().unwrap());
    }

    #[test]
    fn script_offsets_slice_every_script(tx in arb_transaction()) {
        let bytes = tx.to_bytes().unwrap();
        let offsets = Transaction::parse_script_offsets(&bytes).unwrap();
        prop_assert_eq!(offsets.inputs.len(), tx.inputs.len());
        prop_assert_eq!(offsets.outputs.len(), tx.outputs.len());
        for (slot, input) in offsets.inputs.iter().zip(&tx.inputs) {
            prop_assert_eq!(
                &bytes[slot.offset..slot.offset + slot.length],
                input.unlocking_script.as_ref().unwrap().to_bytes()
            );
        }
        for (slot, output) in offsets.outputs.iter().zip(&tx.outputs) {
            prop_assert_eq!(
                &bytes[slot.offset..slot.offset + slot.length],
                output.locking_script.to_bytes()
            );
        }
    }
}
