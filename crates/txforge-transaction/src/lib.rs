//! txforge SDK - transaction assembly, serialization, and verification.
//!
//! Provides the `Transaction` aggregate with inputs, outputs, fee
//! computation and change distribution, template-driven signing, three
//! wire formats (raw, Extended Format, BEEF/Atomic BEEF), script offset
//! parsing, broadcasting seams, and recursive SPV verification.

pub mod transaction;
pub mod input;
pub mod output;
pub mod template;
pub mod fee;
pub mod ef;
pub mod beef;
pub mod script_offsets;
pub mod spend;
pub mod verify;
pub mod broadcaster;

mod error;

pub use beef::{ATOMIC_BEEF, BEEF_V1};
pub use broadcaster::{BroadcastFailure, BroadcastSuccess, Broadcaster};
pub use error::TransactionError;
pub use fee::{ChangeDistribution, FeeModel, FixedFee, SatoshisPerKilobyte};
pub use input::{TransactionInput, DEFAULT_SEQUENCE};
pub use output::TransactionOutput;
pub use script_offsets::{ScriptOffset, ScriptOffsets};
pub use spend::{Spend, SpendValidator};
pub use transaction::Transaction;
