//! Verifiable randomness for fair rounds.
//!
//! An independent authority signs each round message with BLS12-381. Anyone
//! holding the public key can check the signature with two pairings, and the
//! signature bytes are then turned into a uniformly distributed multiplier.
//!
//! - [`bls`]: signature verification via `e(G1, sig) == e(pk, H(msg))`
//! - [`outcome`]: digest → 52-bit uniform `X` → crash multiplier

pub mod bls;
pub mod error;
pub mod outcome;

pub use bls::{verify, verify_with_dst};
pub use error::{OutcomeError, VerifyError};
pub use outcome::{
    top_bits, uniform, BoundaryPolicy, DerivationMode, MultiplierFormula, Outcome, OutcomeConfig,
    OutcomeDeriver, MAX_MULTIPLIER, N_BITS,
};
