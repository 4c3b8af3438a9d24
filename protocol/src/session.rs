//! The per-session round orchestrator.
//!
//! ```text
//! Init ──commit──▶ Committed ──play──▶ Playing{k} ──…──▶ Exhausted
//!   │                  │                   │
//!   └──────────────────┴───── fatal ───────┴──▶ Aborted
//! ```
//!
//! All session state (the remaining chain, the round counter) is owned by one
//! [`RoundProtocol`]; only the collaborators are shared between sessions.

use std::sync::Arc;

use fairchain_crypto::{HashChain, HashChainGenerator};
use fairchain_types::{BlsPublicKey, BlsSignature, Commitment, RoundIndex, Seed};
use fairchain_vrf::{OutcomeConfig, OutcomeDeriver};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::collaborator::{KeyRegistry, Signer};
use crate::config::ProtocolConfig;
use crate::error::ProtocolError;
use crate::message::MessageConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No chain yet.
    Init,
    /// Commitment and public key are published; no rounds played.
    Committed,
    /// `remaining` rounds can still be played.
    Playing { remaining: usize },
    /// Every playable seed has been revealed.
    Exhausted,
    /// A fatal error ended the session.
    Aborted,
}

/// Published at session start, before any round.
///
/// Carries the message and outcome settings the session plays under, so a
/// transcript can be audited without knowing how the server was configured.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionStart {
    pub commitment: Commitment,
    pub public_key: BlsPublicKey,
    pub rounds: usize,
    #[serde(default)]
    pub message: MessageConfig,
    #[serde(default)]
    pub outcome: OutcomeConfig,
}

/// One played round. Everything here is public once emitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub commitment: Commitment,
    pub round: RoundIndex,
    /// The seed revealed by this round.
    pub seed: Seed,
    pub signature: BlsSignature,
    pub multiplier: f64,
    pub verified: bool,
}

/// Published when a session ends normally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub commitment: Commitment,
    pub public_key: BlsPublicKey,
    pub rounds_played: u64,
    /// The seed after the last played round. Needed to audit the last round
    /// when outcomes are keyed by the next seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_seed: Option<Seed>,
}

/// A line of a published transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum TranscriptEvent {
    Start(SessionStart),
    Round(RoundResult),
    Summary(SessionSummary),
}

/// Drives the rounds of one hash chain.
pub struct RoundProtocol {
    config: ProtocolConfig,
    deriver: OutcomeDeriver,
    signer: Arc<dyn Signer>,
    registry: Arc<dyn KeyRegistry>,
    state: SessionState,
    chain: Option<HashChain>,
    public_key: Option<BlsPublicKey>,
    next_round: RoundIndex,
}

impl RoundProtocol {
    pub fn new(
        config: ProtocolConfig,
        signer: Arc<dyn Signer>,
        registry: Arc<dyn KeyRegistry>,
    ) -> Result<Self, ProtocolError> {
        config.validate()?;
        let deriver = OutcomeDeriver::new(config.outcome.clone())
            .map_err(|e| ProtocolError::Config(e.to_string()))?;
        Ok(Self {
            config,
            deriver,
            signer,
            registry,
            state: SessionState::Init,
            chain: None,
            public_key: None,
            next_round: RoundIndex::FIRST,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn commitment(&self) -> Option<Commitment> {
        self.chain.as_ref().map(HashChain::commitment)
    }

    pub fn public_key(&self) -> Option<BlsPublicKey> {
        self.public_key
    }

    /// Generate a fresh chain from `rng` and register its commitment.
    pub fn commit<R>(&mut self, rng: &mut R) -> Result<SessionStart, ProtocolError>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        self.ensure_state(SessionState::Init)?;
        let generated = match HashChainGenerator.generate(rng, self.config.chain_length) {
            Ok(generated) => generated,
            Err(e) => return Err(self.abort(e.into())),
        };
        self.commit_chain(generated.into_play_order())
    }

    /// Register an already-built play-order chain.
    ///
    /// A chain too short for a single round leaves the session exhausted
    /// straight away.
    pub fn commit_chain(&mut self, chain: HashChain) -> Result<SessionStart, ProtocolError> {
        self.ensure_state(SessionState::Init)?;
        let commitment = chain.commitment();

        let public_key = match self.registry.make_commitment(&commitment) {
            Ok(pk) => pk,
            Err(e) => return Err(self.abort(e.into())),
        };

        let rounds = self.playable_rounds(&chain);
        self.chain = Some(chain);
        self.public_key = Some(public_key);
        self.state = if rounds == 0 {
            SessionState::Exhausted
        } else {
            SessionState::Committed
        };

        tracing::info!(
            commitment = %commitment,
            public_key = %public_key,
            rounds,
            signer = self.signer.name(),
            "session committed"
        );

        Ok(SessionStart {
            commitment,
            public_key,
            rounds,
            message: self.config.message.clone(),
            outcome: self.config.outcome.clone(),
        })
    }

    /// Play the next round.
    ///
    /// Returns [`ProtocolError::ExhaustedChain`] once no round is left; any
    /// other error aborts the session for good.
    pub fn play_round(&mut self) -> Result<RoundResult, ProtocolError> {
        match self.state {
            SessionState::Init => return Err(ProtocolError::InvalidState("session not committed")),
            SessionState::Exhausted => return Err(ProtocolError::ExhaustedChain),
            SessionState::Aborted => return Err(ProtocolError::SessionAborted),
            SessionState::Committed | SessionState::Playing { .. } => {}
        }

        match self.next() {
            Ok(result) => {
                let remaining = self.chain.as_ref().map_or(0, |c| self.playable_rounds(c));
                self.state = if remaining == 0 {
                    SessionState::Exhausted
                } else {
                    SessionState::Playing { remaining }
                };
                Ok(result)
            }
            Err(ProtocolError::ExhaustedChain) => {
                self.state = SessionState::Exhausted;
                Err(ProtocolError::ExhaustedChain)
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    /// Play every remaining round, handing each result to `sink`.
    pub fn run<F>(&mut self, mut sink: F) -> Result<SessionSummary, ProtocolError>
    where
        F: FnMut(&RoundResult),
    {
        let commitment = self
            .commitment()
            .ok_or(ProtocolError::InvalidState("session not committed"))?;
        let span = tracing::info_span!("session", commitment = %hex_prefix(&commitment));
        let _guard = span.enter();

        loop {
            match self.play_round() {
                Ok(result) => sink(&result),
                Err(ProtocolError::ExhaustedChain) => break,
                Err(e) => return Err(e),
            }
        }

        let summary = self.summary()?;
        tracing::info!(rounds = summary.rounds_played, "session exhausted");
        Ok(summary)
    }

    /// The end-of-session record. The terminal seed is only disclosed once the
    /// session is exhausted.
    pub fn summary(&self) -> Result<SessionSummary, ProtocolError> {
        let chain = self
            .chain
            .as_ref()
            .ok_or(ProtocolError::InvalidState("session not committed"))?;
        let public_key = self
            .public_key
            .ok_or(ProtocolError::InvalidState("session not committed"))?;
        let terminal_seed = match self.state {
            SessionState::Exhausted => chain.peek().copied(),
            _ => None,
        };
        Ok(SessionSummary {
            commitment: chain.commitment(),
            public_key,
            rounds_played: self.next_round.get() - 1,
            terminal_seed,
        })
    }

    fn next(&mut self) -> Result<RoundResult, ProtocolError> {
        let public_key = self
            .public_key
            .ok_or(ProtocolError::InvalidState("session not committed"))?;
        let seeds_per_round = self.config.outcome.derivation.seeds_per_round();

        let chain = self
            .chain
            .as_mut()
            .ok_or(ProtocolError::InvalidState("session not committed"))?;
        if chain.len() < seeds_per_round {
            return Err(ProtocolError::ExhaustedChain);
        }
        let commitment = chain.commitment();
        let seed = chain.pop_next()?;
        let next_seed = chain.peek().copied();

        let round = self.next_round;
        let request = self.config.message.request(&commitment, &seed, round)?;
        let signature = self.signer.make_signature(&request)?;

        let verified = fairchain_vrf::verify(&signature, request.message(), &public_key)
            .map_err(|e| ProtocolError::from_verify(round, e))?;
        if !verified {
            return Err(ProtocolError::VerificationMismatch { round });
        }

        let outcome = self
            .deriver
            .derive(&signature, next_seed.as_ref())
            .map_err(|source| ProtocolError::Outcome { round, source })?;

        self.next_round = round.next();
        tracing::debug!(
            round = round.get(),
            multiplier = outcome.multiplier,
            boundary_hit = outcome.boundary_hit,
            "round played"
        );

        Ok(RoundResult {
            commitment,
            round,
            seed,
            signature,
            multiplier: outcome.multiplier,
            verified,
        })
    }

    fn playable_rounds(&self, chain: &HashChain) -> usize {
        (chain.len() + 1).saturating_sub(self.config.outcome.derivation.seeds_per_round())
    }

    fn ensure_state(&self, expected: SessionState) -> Result<(), ProtocolError> {
        if self.state == expected {
            return Ok(());
        }
        Err(match self.state {
            SessionState::Aborted => ProtocolError::SessionAborted,
            _ => ProtocolError::InvalidState("session already committed"),
        })
    }

    fn abort(&mut self, err: ProtocolError) -> ProtocolError {
        tracing::error!(error = %err, "session aborted");
        self.state = SessionState::Aborted;
        err
    }
}

fn hex_prefix(commitment: &Commitment) -> String {
    commitment.to_hex()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_signer::LocalSigner;
    use fairchain_types::Seed;
    use fairchain_vrf::DerivationMode;

    fn protocol(config: ProtocolConfig) -> RoundProtocol {
        let signer = Arc::new(LocalSigner::from_master([9; 32]));
        RoundProtocol::new(config, signer.clone(), signer).unwrap()
    }

    fn zero_chain(length: usize) -> HashChain {
        HashChainGenerator
            .from_root(&Seed::ZERO, length)
            .unwrap()
            .into_play_order()
    }

    #[test]
    fn play_before_commit_is_invalid() {
        let mut session = protocol(ProtocolConfig::default());
        assert_eq!(session.state(), SessionState::Init);
        assert!(matches!(
            session.play_round(),
            Err(ProtocolError::InvalidState(_))
        ));
        // Not fatal: the session can still be committed.
        assert!(session.commit_chain(zero_chain(3)).is_ok());
    }

    #[test]
    fn double_commit_rejected() {
        let mut session = protocol(ProtocolConfig::default());
        session.commit_chain(zero_chain(3)).unwrap();
        assert!(matches!(
            session.commit_chain(zero_chain(3)),
            Err(ProtocolError::InvalidState(_))
        ));
    }

    #[test]
    fn state_walks_to_exhausted() {
        let mut session = protocol(ProtocolConfig::default());
        let start = session.commit_chain(zero_chain(3)).unwrap();
        assert_eq!(start.rounds, 2);
        assert_eq!(session.state(), SessionState::Committed);

        let first = session.play_round().unwrap();
        assert_eq!(first.round, RoundIndex::FIRST);
        assert_eq!(first.seed, start.commitment.as_seed());
        assert!(first.verified);
        assert_eq!(session.state(), SessionState::Playing { remaining: 1 });

        session.play_round().unwrap();
        assert_eq!(session.state(), SessionState::Exhausted);
        assert_eq!(session.play_round(), Err(ProtocolError::ExhaustedChain));
    }

    #[test]
    fn hash_mode_plays_every_seed() {
        let mut config = ProtocolConfig::default();
        config.outcome.derivation = DerivationMode::HashOfSignature;
        let mut session = protocol(config);
        session.commit_chain(zero_chain(3)).unwrap();
        let summary = session.run(|_| {}).unwrap();
        assert_eq!(summary.rounds_played, 3);
        assert_eq!(summary.terminal_seed, None);
    }

    #[test]
    fn hmac_mode_reveals_terminal_seed_at_end_only() {
        let mut session = protocol(ProtocolConfig::default());
        session.commit_chain(zero_chain(4)).unwrap();
        session.play_round().unwrap();
        assert_eq!(session.summary().unwrap().terminal_seed, None);

        let summary = session.run(|_| {}).unwrap();
        assert_eq!(summary.rounds_played, 3);
        let deepest = HashChainGenerator.from_root(&Seed::ZERO, 4).unwrap().as_slice()[0];
        assert_eq!(summary.terminal_seed, Some(deepest));
    }

    #[test]
    fn start_records_session_settings() {
        let mut config = ProtocolConfig::default();
        config.message.client_seed = Some("bob".into());
        config.outcome.house_edge = 0.01;
        let mut session = protocol(config.clone());
        let start = session.commit_chain(zero_chain(3)).unwrap();
        assert_eq!(start.message, config.message);
        assert_eq!(start.outcome, config.outcome);
    }

    #[test]
    fn chain_without_playable_rounds_commits_exhausted() {
        let mut session = protocol(ProtocolConfig::default());
        let start = session.commit_chain(zero_chain(1)).unwrap();
        assert_eq!(start.rounds, 0);
        assert_eq!(session.state(), SessionState::Exhausted);
        assert_eq!(session.play_round(), Err(ProtocolError::ExhaustedChain));

        let summary = session.summary().unwrap();
        assert_eq!(summary.rounds_played, 0);
        assert_eq!(summary.terminal_seed, Some(start.commitment.as_seed()));
    }

    #[test]
    fn run_before_commit_fails() {
        let mut session = protocol(ProtocolConfig::default());
        assert!(session.run(|_| {}).is_err());
    }

    #[test]
    fn exhausted_is_not_fatal() {
        assert!(!ProtocolError::ExhaustedChain.is_fatal());
        assert!(ProtocolError::VerificationMismatch {
            round: RoundIndex::FIRST
        }
        .is_fatal());
    }
}
