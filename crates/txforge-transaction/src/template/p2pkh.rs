//! Pay-to-Public-Key-Hash locking scripts.

use txforge_script::opcodes::*;
use txforge_script::{Address, Script};

/// Build a P2PKH locking script for an address.
///
/// Produces the standard 25-byte script:
/// `OP_DUP OP_HASH160 <20-byte pubkey hash> OP_EQUALVERIFY OP_CHECKSIG`.
pub fn lock(address: &Address) -> Script {
    let mut bytes = Vec::with_capacity(25);
    bytes.push(OP_DUP);
    bytes.push(OP_HASH160);
    bytes.push(OP_DATA_20);
    bytes.extend_from_slice(&address.public_key_hash);
    bytes.push(OP_EQUALVERIFY);
    bytes.push(OP_CHECKSIG);
    Script::from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_builds_standard_script() {
        let address = Address::from_string("1E7ucTTWRTahCyViPhxSMor2pj4VGQdFMr").unwrap();
        let script = lock(&address);
        assert_eq!(script.len(), 25);
        assert!(script.is_p2pkh());
        assert_eq!(
            script.to_hex(),
            "76a9148fe80c75c9560e8b56ed64ea3c26e18d2c52211b88ac"
        );
    }
}
