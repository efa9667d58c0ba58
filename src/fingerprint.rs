//! # Fingerprint Module
//!
//! Computes input sequences that tell every member of a family of deterministic transducers
//! apart. The family is refined into blocks of members with equal output traces; while a block
//! holds more than one member, a separating sequence for two of them is added and the blocks are
//! derived again from all sequences found so far.
//!
//! ```
//! use rust_ffsm::fingerprint::Fingerprint;
//! use rust_ffsm::mealy::MealyBuilder;
//!
//! let family: Vec<_> = ["0", "1", "2"]
//!     .iter()
//!     .map(|out| {
//!         MealyBuilder::new()
//!             .with_transition("s", "a", out, "s")
//!             .with_initial("s")
//!             .build()
//!             .unwrap()
//!     })
//!     .collect();
//!
//! let fingerprint = Fingerprint::compute(&family).unwrap();
//! assert_eq!(fingerprint.sequences(), &[vec!["a".to_string()]]);
//! assert_eq!(fingerprint.identify_transducer(&family[2]), Some(2));
//! ```

use crate::error::{FingerprintError, SeparationError};
use crate::mealy::{Trace, Transducer};
use crate::separating::{find_separating_sequence_with, SearchConfig};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// The traces a transducer produces for each fingerprint sequence, in order.
pub type Signature = Vec<Trace>;

/// Sequences that fingerprint a family, in the order they were discovered.
pub fn compute_fingerprint_sequences<T: Transducer>(
    family: &[T],
) -> Result<Vec<Vec<String>>, FingerprintError> {
    compute_fingerprint_sequences_with(family, &SearchConfig::default())
}

/// Like [compute_fingerprint_sequences], passing `config` to every separating sequence search.
pub fn compute_fingerprint_sequences_with<T: Transducer>(
    family: &[T],
    config: &SearchConfig,
) -> Result<Vec<Vec<String>>, FingerprintError> {
    let mut sequences: Vec<Vec<String>> = Vec::new();
    let mut partition = partition_by(family, &sequences);

    loop {
        let Some((first, second)) = partition
            .iter()
            .find(|block| block.len() > 1)
            .map(|block| (block[0], block[1]))
        else {
            break;
        };

        let sequence = find_separating_sequence_with(&family[first], &family[second], config)
            .map_err(|e| match e {
                SeparationError::Indistinguishable => {
                    FingerprintError::Indistinguishable { first, second }
                }
                other => other.into(),
            })?;

        info!(
            "members {} and {} separated by {:?}",
            first, second, sequence
        );
        sequences.push(sequence);
        partition = partition_by(family, &sequences);
        debug!("partition is now {:?}", partition);
    }

    info!(
        "fingerprinted {} transducers with {} sequences",
        family.len(),
        sequences.len()
    );
    Ok(sequences)
}

/// Replay `sequences` on `t`.
pub fn signature<T: Transducer>(t: &T, sequences: &[Vec<String>]) -> Signature {
    sequences.iter().map(|seq| t.output_trace(seq)).collect()
}

/// Group family members by their signature under `sequences`.
///
/// Blocks are ordered by signature; members inside a block keep their family order.
pub fn partition_by<T: Transducer>(family: &[T], sequences: &[Vec<String>]) -> Vec<Vec<usize>> {
    let mut blocks: BTreeMap<Signature, Vec<usize>> = BTreeMap::new();
    for (idx, t) in family.iter().enumerate() {
        blocks.entry(signature(t, sequences)).or_default().push(idx);
    }
    blocks.into_values().collect()
}

/// A fingerprint of a family together with the signature of each member.
#[derive(Clone, Debug)]
pub struct Fingerprint {
    sequences: Vec<Vec<String>>,
    signatures: Vec<Signature>,
}

impl Fingerprint {
    pub fn compute<T: Transducer>(family: &[T]) -> Result<Self, FingerprintError> {
        Self::compute_with(family, &SearchConfig::default())
    }

    pub fn compute_with<T: Transducer>(
        family: &[T],
        config: &SearchConfig,
    ) -> Result<Self, FingerprintError> {
        let sequences = compute_fingerprint_sequences_with(family, config)?;
        let signatures = family.iter().map(|t| signature(t, &sequences)).collect();
        Ok(Fingerprint {
            sequences,
            signatures,
        })
    }

    pub fn sequences(&self) -> &[Vec<String>] {
        &self.sequences
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Index of the family member that produced `observed`, if any.
    pub fn identify(&self, observed: &Signature) -> Option<usize> {
        self.signatures.iter().position(|s| s == observed)
    }

    /// Replay the fingerprint on `t` and look up the matching family member.
    pub fn identify_transducer<T: Transducer>(&self, t: &T) -> Option<usize> {
        self.identify(&signature(t, &self.sequences))
    }
}
