//! Transaction broadcasting interfaces.
//!
//! The engine only defines the seam; HTTP or peer-to-peer delivery is an
//! external concern.

use crate::transaction::Transaction;
use crate::TransactionError;

/// Result of a successful broadcast.
#[derive(Debug, Clone)]
pub struct BroadcastSuccess {
    /// The transaction ID acknowledged by the network.
    pub txid: String,
    /// Status message from the broadcaster.
    pub message: String,
}

/// Result of a failed broadcast.
#[derive(Debug, Clone)]
pub struct BroadcastFailure {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable description.
    pub description: String,
}

impl std::fmt::Display for BroadcastFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}

impl std::error::Error for BroadcastFailure {}

/// Capability that delivers transactions to the network.
pub trait Broadcaster {
    /// Broadcast a transaction.
    fn broadcast(&self, tx: &Transaction) -> Result<BroadcastSuccess, BroadcastFailure>;
}

impl Transaction {
    /// Broadcast this transaction through `broadcaster`.
    ///
    /// A failure is surfaced unchanged as
    /// [`TransactionError::Broadcast`].
    pub fn broadcast(
        &self,
        broadcaster: &dyn Broadcaster,
    ) -> Result<BroadcastSuccess, TransactionError> {
        broadcaster
            .broadcast(self)
            .map_err(|failure| TransactionError::Broadcast {
                code: failure.code,
                description: failure.description,
            })
    }
}
