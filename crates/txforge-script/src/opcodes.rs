//! Opcode constants emitted or recognized by the SDK.
//!
//! Only the opcodes the engine itself produces are listed; the full opcode
//! table belongs to the external script interpreter.

/// Push an empty byte vector (numeric zero).
pub const OP_0: u8 = 0x00;
/// Alias for `OP_0`.
pub const OP_FALSE: u8 = 0x00;
/// Push the number 1.
pub const OP_1: u8 = 0x51;
/// Alias for `OP_1`.
pub const OP_TRUE: u8 = 0x51;
/// Push the next 20 bytes (a public key hash).
pub const OP_DATA_20: u8 = 0x14;
/// Duplicate the top stack item.
pub const OP_DUP: u8 = 0x76;
/// Hash the top stack item with RIPEMD-160(SHA-256(x)).
pub const OP_HASH160: u8 = 0xA9;
/// Pop two items and fail unless they are equal.
pub const OP_EQUALVERIFY: u8 = 0x88;
/// Verify an ECDSA signature against a public key.
pub const OP_CHECKSIG: u8 = 0xAC;
/// Mark an output as unspendable data carrier.
pub const OP_RETURN: u8 = 0x6A;
