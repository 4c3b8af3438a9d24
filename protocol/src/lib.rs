//! The fairchain round protocol.
//!
//! A session commits to a SHA-256 hash chain, obtains a public key for that
//! commitment from the signer authority, and then plays one round per revealed
//! seed: the authority signs the round message, the signature is verified with
//! two pairings, and the verified signature is turned into a multiplier.
//!
//! Any verification failure aborts the session; running out of seeds ends it
//! normally.

pub mod audit;
pub mod collaborator;
pub mod config;
pub mod error;
pub mod local_signer;
pub mod message;
pub mod session;

pub use audit::Auditor;
pub use collaborator::{KeyRegistry, SignatureRequest, Signer};
pub use config::ProtocolConfig;
pub use error::{AuditError, CollaboratorError, ProtocolError};
pub use local_signer::LocalSigner;
pub use message::{MessageConfig, MessageShape};
pub use session::{
    RoundProtocol, RoundResult, SessionStart, SessionState, SessionSummary, TranscriptEvent,
};
