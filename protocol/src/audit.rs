//! Player-side verification of a finished session.
//!
//! Everything a session publishes (the start record, every round, the
//! summary) is enough to recheck it without trusting the game server or the
//! signer: the reveals must walk back down the hash chain from the
//! commitment, every signature must verify over the rebuilt message, and every
//! multiplier must recompute exactly.

use fairchain_crypto::verify_link;
use fairchain_types::{RoundIndex, Seed};
use fairchain_vrf::{DerivationMode, OutcomeConfig, OutcomeDeriver};

use crate::config::ProtocolConfig;
use crate::error::AuditError;
use crate::message::MessageConfig;
use crate::session::{RoundResult, SessionStart, SessionSummary};

pub struct Auditor {
    message: MessageConfig,
    deriver: OutcomeDeriver,
}

impl Auditor {
    /// Build an auditor for sessions played under `config`.
    pub fn new(config: &ProtocolConfig) -> Result<Self, AuditError> {
        Self::with_settings(&config.message, &config.outcome)
    }

    /// Build an auditor from the settings a session published in its start
    /// record.
    pub fn for_session(start: &SessionStart) -> Result<Self, AuditError> {
        Self::with_settings(&start.message, &start.outcome)
    }

    fn with_settings(message: &MessageConfig, outcome: &OutcomeConfig) -> Result<Self, AuditError> {
        message
            .validate()
            .map_err(|e| AuditError::Setup(e.to_string()))?;
        let deriver = OutcomeDeriver::new(outcome.clone())
            .map_err(|e| AuditError::Setup(e.to_string()))?;
        Ok(Self {
            message: message.clone(),
            deriver,
        })
    }

    /// Re-verify a whole session transcript.
    pub fn audit(&self, summary: &SessionSummary, rounds: &[RoundResult]) -> Result<(), AuditError> {
        if rounds.len() as u64 != summary.rounds_played {
            return Err(AuditError::RoundCount {
                expected: summary.rounds_played,
                actual: rounds.len(),
            });
        }

        let needs_next = self.deriver.config().derivation == DerivationMode::HmacWithNextSeed;
        if needs_next && !rounds.is_empty() {
            let terminal = summary
                .terminal_seed
                .ok_or(AuditError::MissingTerminalSeed)?;
            if let Some(last) = rounds.last() {
                if !verify_link(&terminal, &last.seed) {
                    return Err(AuditError::BrokenTerminalLink);
                }
            }
        }

        let mut expected_round = RoundIndex::FIRST;
        let mut previous: Option<&Seed> = None;
        for result in rounds {
            if result.round != expected_round {
                return Err(AuditError::RoundOrder {
                    expected: expected_round,
                    actual: result.round,
                });
            }
            if result.commitment != summary.commitment {
                return Err(AuditError::ForeignRound {
                    round: result.round,
                });
            }

            match previous {
                None if result.seed != summary.commitment.as_seed() => {
                    return Err(AuditError::WrongFirstReveal)
                }
                Some(prev) if !verify_link(&result.seed, prev) => {
                    return Err(AuditError::BrokenLink {
                        round: result.round,
                    })
                }
                _ => {}
            }
            previous = Some(&result.seed);
            expected_round = expected_round.next();
        }

        // The chain is sound; now every signature and multiplier.
        for (i, result) in rounds.iter().enumerate() {
            let next_seed = rounds
                .get(i + 1)
                .map(|r| r.seed)
                .or(summary.terminal_seed);
            self.audit_round(summary, result, next_seed.as_ref())?;
        }

        tracing::info!(
            commitment = %summary.commitment,
            rounds = rounds.len(),
            "transcript audited"
        );
        Ok(())
    }

    fn audit_round(
        &self,
        summary: &SessionSummary,
        result: &RoundResult,
        next_seed: Option<&Seed>,
    ) -> Result<(), AuditError> {
        let round = result.round;
        let request = self
            .message
            .request(&summary.commitment, &result.seed, round)
            .map_err(|e| AuditError::Setup(e.to_string()))?;

        match fairchain_vrf::verify(&result.signature, request.message(), &summary.public_key) {
            Ok(true) => {}
            Ok(false) => {
                return Err(AuditError::Signature {
                    round,
                    reason: "signature does not match the round message".into(),
                })
            }
            Err(e) => {
                return Err(AuditError::Signature {
                    round,
                    reason: e.to_string(),
                })
            }
        }

        let outcome = self
            .deriver
            .derive(&result.signature, next_seed)
            .map_err(|e| AuditError::Signature {
                round,
                reason: e.to_string(),
            })?;

        let tolerance = f64::EPSILON * outcome.multiplier.abs();
        if (outcome.multiplier - result.multiplier).abs() > tolerance {
            return Err(AuditError::MultiplierMismatch {
                round,
                expected: outcome.multiplier,
                actual: result.multiplier,
            });
        }
        Ok(())
    }
}
