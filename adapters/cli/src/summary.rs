use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SUMMARY_DOMAIN: &str = "arena";
const SUMMARY_VERSION: &str = "v1";
const FIELD_DELIMITER: char = ':';

/// Outcome of a headless match, printable as a single line so a later run
/// can be checked against it with `--expect`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MatchSummary {
    /// Seed the skirmish was generated from.
    pub(crate) seed: u64,
    /// Ticks actually played.
    pub(crate) ticks: u64,
    /// Squads deployed over the match.
    pub(crate) squads_formed: u32,
    /// Own units alive at the end.
    pub(crate) mine: usize,
    /// Opponent units alive at the end.
    pub(crate) enemies: usize,
    /// Digest of the accepted command stream.
    pub(crate) fingerprint: String,
}

#[derive(Serialize, Deserialize)]
struct Payload {
    ticks: u64,
    squads_formed: u32,
    mine: usize,
    enemies: usize,
    fingerprint: String,
}

impl MatchSummary {
    /// Encodes the summary as `arena:v1:<seed>:<payload>`.
    pub(crate) fn encode(&self) -> Result<String, SummaryError> {
        let payload = Payload {
            ticks: self.ticks,
            squads_formed: self.squads_formed,
            mine: self.mine,
            enemies: self.enemies,
            fingerprint: self.fingerprint.clone(),
        };
        let json = serde_json::to_vec(&payload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{SUMMARY_DOMAIN}:{SUMMARY_VERSION}:{}:{encoded}",
            self.seed
        ))
    }

    /// Parses a line produced by [`MatchSummary::encode`].
    pub(crate) fn decode(value: &str) -> Result<Self, SummaryError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SummaryError::Empty);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(SummaryError::Truncated("prefix"))?;
        let version = parts.next().ok_or(SummaryError::Truncated("version"))?;
        let seed = parts.next().ok_or(SummaryError::Truncated("seed"))?;
        let payload = parts.next().ok_or(SummaryError::Truncated("payload"))?;

        if domain != SUMMARY_DOMAIN {
            return Err(SummaryError::InvalidPrefix(domain.to_owned()));
        }
        if version != SUMMARY_VERSION {
            return Err(SummaryError::UnsupportedVersion(version.to_owned()));
        }
        let seed = seed
            .parse::<u64>()
            .map_err(|_| SummaryError::InvalidSeed(seed.to_owned()))?;
        let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
        let payload: Payload = serde_json::from_slice(&bytes)?;

        Ok(Self {
            seed,
            ticks: payload.ticks,
            squads_formed: payload.squads_formed,
            mine: payload.mine,
            enemies: payload.enemies,
            fingerprint: payload.fingerprint,
        })
    }
}

/// Errors raised while reading an encoded summary.
#[derive(Debug, Error)]
pub(crate) enum SummaryError {
    /// The line was blank.
    #[error("summary is empty")]
    Empty,
    /// A field is missing.
    #[error("summary is missing its {0}")]
    Truncated(&'static str),
    /// Not an arena summary.
    #[error("summary prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// Written by an incompatible version.
    #[error("summary version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The seed field is not a number.
    #[error("could not parse seed '{0}'")]
    InvalidSeed(String),
    /// The payload is not valid base64.
    #[error("could not decode summary payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The payload is not a valid summary document.
    #[error("could not parse summary payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}
