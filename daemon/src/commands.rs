//! Subcommand implementations.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use fairchain_crypto::HashChainGenerator;
use fairchain_protocol::{
    Auditor, LocalSigner, ProtocolConfig, ProtocolError, RoundProtocol, RoundResult,
    SessionStart, SessionSummary, TranscriptEvent,
};
use fairchain_types::{BlsPublicKey, BlsSignature, Commitment, Seed};
use fairchain_utils::{format_elapsed, StatsCounter};
use fairchain_vrf::OutcomeDeriver;
use rand::rngs::OsRng;
use rayon::prelude::*;

use crate::OutputFormat;

/// Everything one session produced, buffered so parallel sessions print
/// without interleaving.
struct SessionReport {
    events: Vec<TranscriptEvent>,
    error: Option<ProtocolError>,
}

pub fn run(config: &ProtocolConfig, sessions: usize, format: OutputFormat) -> anyhow::Result<()> {
    let signer = Arc::new(LocalSigner::new(&mut OsRng).context("starting local signer")?);
    let stats = StatsCounter::new(&["sessions", "rounds", "aborted"]);
    let started = Instant::now();

    let reports: Vec<SessionReport> = (0..sessions)
        .into_par_iter()
        .map(|_| play_session(config, signer.clone(), &stats))
        .collect();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for report in &reports {
        match format {
            OutputFormat::Json => {
                for event in &report.events {
                    writeln!(out, "{}", serde_json::to_string(event)?)?;
                }
            }
            OutputFormat::Text => write_text(&mut out, report)?,
        }
    }

    tracing::info!(
        sessions = stats.get("sessions"),
        rounds = stats.get("rounds"),
        aborted = stats.get("aborted"),
        elapsed = %format_elapsed(started.elapsed()),
        "run finished"
    );

    let aborted = stats.get("aborted");
    if aborted > 0 {
        bail!("{aborted} of {sessions} sessions aborted");
    }
    Ok(())
}

fn play_session(
    config: &ProtocolConfig,
    signer: Arc<LocalSigner>,
    stats: &StatsCounter,
) -> SessionReport {
    stats.increment("sessions");
    let mut events = Vec::new();

    let result = (|| {
        let mut session = RoundProtocol::new(config.clone(), signer.clone(), signer.clone())?;
        let start = session.commit(&mut OsRng)?;
        let commitment = start.commitment;
        events.push(TranscriptEvent::Start(start));
        let outcome = session.run(|round| {
            stats.increment("rounds");
            events.push(TranscriptEvent::Round(round.clone()));
        });
        signer.forget(&commitment);
        events.push(TranscriptEvent::Summary(outcome?));
        Ok::<(), ProtocolError>(())
    })();

    let error = result.err();
    if error.is_some() {
        stats.increment("aborted");
    }
    SessionReport { events, error }
}

fn write_text(out: &mut impl Write, report: &SessionReport) -> std::io::Result<()> {
    for event in &report.events {
        match event {
            TranscriptEvent::Start(start) => {
                writeln!(out, "commitment  {}", start.commitment)?;
                writeln!(out, "public key  {}", start.public_key)?;
            }
            TranscriptEvent::Round(round) => {
                writeln!(
                    out,
                    "  round {:>4}  multiplier {:>14.2}  {}",
                    round.round.get(),
                    round.multiplier,
                    if round.verified { "verified" } else { "UNVERIFIED" }
                )?;
            }
            TranscriptEvent::Summary(summary) => {
                write!(out, "rounds played {}", summary.rounds_played)?;
                if let Some(seed) = &summary.terminal_seed {
                    write!(out, ", terminal seed {seed}")?;
                }
                writeln!(out)?;
            }
        }
    }
    if let Some(err) = &report.error {
        writeln!(out, "session aborted: {err}")?;
    }
    writeln!(out)
}

pub fn verify(signature: &str, message: &str, public_key: &str, text: bool) -> anyhow::Result<()> {
    let signature = BlsSignature::from_hex(signature).context("parsing signature")?;
    let public_key = BlsPublicKey::from_hex(public_key).context("parsing public key")?;
    let message = if text {
        message.as_bytes().to_vec()
    } else {
        hex::decode(message.trim_start_matches("0x")).context("parsing message")?
    };

    let valid = fairchain_vrf::verify(&signature, &message, &public_key)?;
    println!("{valid}");
    if !valid {
        bail!("signature does not verify");
    }
    Ok(())
}

pub fn derive(
    config: &ProtocolConfig,
    signature: &str,
    next_seed: Option<&str>,
) -> anyhow::Result<()> {
    let signature = BlsSignature::from_hex(signature).context("parsing signature")?;
    let next_seed = next_seed
        .map(Seed::from_hex)
        .transpose()
        .context("parsing next seed")?;

    let deriver = OutcomeDeriver::new(config.outcome.clone())?;
    let outcome = deriver.derive(&signature, next_seed.as_ref())?;
    println!("uniform     {}", outcome.uniform);
    println!("multiplier  {}", outcome.multiplier);
    if outcome.boundary_hit {
        println!("boundary    hit");
    }
    Ok(())
}

pub fn chain(root: &str, length: usize) -> anyhow::Result<()> {
    let root = Seed::from_hex(root).context("parsing root")?;
    let chain = HashChainGenerator.from_root(&root, length)?.into_play_order();
    println!("commitment  {}", chain.commitment());
    for (i, seed) in chain.iter().enumerate() {
        println!("{:>5}  {seed}", i + 1);
    }
    Ok(())
}

#[derive(Default)]
struct Collected {
    start: Option<SessionStart>,
    summary: Option<SessionSummary>,
    rounds: Vec<RoundResult>,
}

pub fn audit(config: &ProtocolConfig, transcript: &Path) -> anyhow::Result<()> {
    let reader: Box<dyn BufRead> = if transcript == Path::new("-") {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let file = std::fs::File::open(transcript)
            .with_context(|| format!("opening {}", transcript.display()))?;
        Box::new(BufReader::new(file))
    };

    let stdout = std::io::stdout();
    let (failed, total) = audit_transcript(config, reader, &mut stdout.lock())?;
    if failed > 0 {
        bail!("{failed} of {total} sessions failed audit");
    }
    Ok(())
}

/// Audit every session in a JSON-lines transcript, writing one verdict line
/// per session. Returns `(failed, total)`.
///
/// A session is audited under the settings from its own start record;
/// `config` only covers sessions whose start record is missing.
fn audit_transcript(
    config: &ProtocolConfig,
    reader: impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<(usize, usize)> {
    let mut order: Vec<Commitment> = Vec::new();
    let mut sessions: HashMap<Commitment, Collected> = HashMap::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: TranscriptEvent = serde_json::from_str(&line)
            .with_context(|| format!("transcript line {}", n + 1))?;
        let commitment = match &event {
            TranscriptEvent::Start(start) => start.commitment,
            TranscriptEvent::Round(round) => round.commitment,
            TranscriptEvent::Summary(summary) => summary.commitment,
        };
        let entry = sessions.entry(commitment).or_insert_with(|| {
            order.push(commitment);
            Collected::default()
        });
        match event {
            TranscriptEvent::Start(start) => entry.start = Some(start),
            TranscriptEvent::Round(round) => entry.rounds.push(round),
            TranscriptEvent::Summary(summary) => entry.summary = Some(summary),
        }
    }

    let fallback = Auditor::new(config)?;
    let mut failed = 0usize;
    for commitment in &order {
        let Some(collected) = sessions.get(commitment) else {
            continue;
        };
        let verdict = match (&collected.start, &collected.summary) {
            (_, None) => Err("no summary (session did not finish)".to_string()),
            (Some(start), Some(summary)) => Auditor::for_session(start)
                .and_then(|auditor| auditor.audit(summary, &collected.rounds))
                .map_err(|e| e.to_string()),
            (None, Some(summary)) => fallback
                .audit(summary, &collected.rounds)
                .map_err(|e| e.to_string()),
        };
        match verdict {
            Ok(()) => writeln!(out, "{commitment}  ok  {} rounds", collected.rounds.len())?,
            Err(reason) => {
                failed += 1;
                writeln!(out, "{commitment}  FAILED  {reason}")?;
            }
        }
    }

    Ok((failed, order.len()))
}
