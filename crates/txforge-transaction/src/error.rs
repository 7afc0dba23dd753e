/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// An input has no source transaction where one is required (on add,
    /// during fee computation, extended serialization, or verification).
    #[error("missing source transaction: {0}")]
    MissingSource(String),
    /// An output has no satoshi amount at sign or serialize time.
    #[error("output {0} has no satoshi amount")]
    MissingAmount(usize),
    /// A change output is still awaiting fee computation.
    #[error("change output {0} has no amount; compute the fee first")]
    MissingChangeAmount(usize),
    /// An input has no unlocking script at serialize or verify time.
    #[error("input {0} has no unlocking script")]
    MissingUnlockingScript(usize),
    /// Malformed Extended Format payload (bad marker or truncated data).
    #[error("invalid extended format: {0}")]
    InvalidEf(String),
    /// Malformed BEEF payload (bad version, truncated data).
    #[error("invalid BEEF: {0}")]
    InvalidBeef(String),
    /// Malformed Atomic BEEF payload (bad prefix, missing subject).
    #[error("invalid atomic BEEF: {0}")]
    InvalidAtomicBeef(String),
    /// A BEEF payload references a parent transaction it does not embed.
    #[error("reference to unknown input transaction {0}")]
    UnknownInputTx(String),
    /// An Atomic BEEF payload embeds a transaction unreachable from its
    /// subject.
    #[error("transaction {0} is not an ancestor of the atomic subject")]
    UnrelatedTx(String),
    /// A BEEF transaction record points past the end of the BUMP table.
    #[error("bump index {0} out of range")]
    InvalidBumpIndex(usize),
    /// Verification-time fee check: the transaction pays less than the
    /// supplied fee model requires.
    #[error("insufficient fee paid by transaction {0}")]
    InsufficientFee(String),
    /// Verification-time output sum: an output amount is unresolved.
    #[error("missing output amount while verifying transaction {0}")]
    MissingOutputAmount(String),
    /// A broadcaster rejected the transaction; code and description are
    /// surfaced unchanged.
    #[error("broadcast failed ({code}): {description}")]
    Broadcast {
        /// Machine-readable failure code from the broadcaster.
        code: String,
        /// Human-readable description from the broadcaster.
        description: String,
    },
    /// Fee computation failed.
    #[error("fee calculation error: {0}")]
    Fee(String),
    /// Binary or hex serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// An underlying script or address error.
    #[error("script error: {0}")]
    Script(#[from] txforge_script::ScriptError),
    /// An underlying SPV error (merkle paths, chain tracking).
    #[error("spv error: {0}")]
    Spv(#[from] txforge_spv::SpvError),
    /// An underlying primitives error.
    #[error("primitives error: {0}")]
    Primitives(#[from] txforge_primitives::PrimitivesError),
}
