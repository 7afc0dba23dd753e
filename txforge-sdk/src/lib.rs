#![deny(missing_docs)]

//! txforge SDK - complete SDK.
//!
//! Re-exports every txforge component for single-crate usage.

pub use txforge_primitives as primitives;
pub use txforge_script as script;
pub use txforge_spv as spv;
pub use txforge_transaction as transaction;
