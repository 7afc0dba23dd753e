//! Base58Check P2PKH address handling.
//!
//! An address wraps the 20-byte public key hash consumed by the P2PKH
//! locking template, together with the network its version byte encodes.

use std::fmt;

use txforge_primitives::hash::sha256d;

use crate::ScriptError;

/// Mainnet P2PKH address version byte.
const MAINNET_P2PKH: u8 = 0x00;
/// Testnet P2PKH address version byte.
const TESTNET_P2PKH: u8 = 0x6F;

/// Network discriminator carried by the address version byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Network {
    /// Mainnet (version 0x00, addresses start with '1').
    Mainnet,
    /// Testnet (version 0x6f, addresses start with 'm' or 'n').
    Testnet,
}

/// A P2PKH address: a 20-byte public key hash plus its network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    /// The Base58Check string form.
    pub address_string: String,
    /// The 20-byte public key hash.
    pub public_key_hash: [u8; 20],
    /// The network the version byte encodes.
    pub network: Network,
}

impl Address {
    /// Parse a Base58Check address string.
    ///
    /// Validates the SHA-256d checksum and requires a P2PKH version byte.
    ///
    /// # Arguments
    /// * `addr` - The Base58Check address string.
    ///
    /// # Returns
    /// An `Address`, or a `ScriptError` describing why the string is
    /// unusable.
    pub fn from_string(addr: &str) -> Result<Self, ScriptError> {
        let decoded = bs58::decode(addr)
            .into_vec()
            .map_err(|_| ScriptError::InvalidAddress(format!("bad char in '{}'", addr)))?;

        if decoded.len() != 25 {
            return Err(ScriptError::InvalidAddressLength(addr.to_string()));
        }

        let checksum = sha256d(&decoded[..21]);
        if decoded[21..] != checksum[..4] {
            return Err(ScriptError::ChecksumFailed);
        }

        let network = match decoded[0] {
            MAINNET_P2PKH => Network::Mainnet,
            TESTNET_P2PKH => Network::Testnet,
            _ => return Err(ScriptError::UnsupportedAddress(addr.to_string())),
        };

        let mut public_key_hash = [0u8; 20];
        public_key_hash.copy_from_slice(&decoded[1..21]);

        Ok(Address {
            address_string: addr.to_string(),
            public_key_hash,
            network,
        })
    }

    /// Build an address from a raw 20-byte public key hash.
    pub fn from_public_key_hash(hash: &[u8; 20], network: Network) -> Self {
        let version = match network {
            Network::Mainnet => MAINNET_P2PKH,
            Network::Testnet => TESTNET_P2PKH,
        };

        let mut payload = Vec::with_capacity(25);
        payload.push(version);
        payload.extend_from_slice(hash);
        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);

        Address {
            address_string: bs58::encode(&payload).into_string(),
            public_key_hash: *hash,
            network,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address_string)
    }
}
