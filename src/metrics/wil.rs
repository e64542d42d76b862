use serde::{Deserialize, Serialize};

use crate::types::EditScript;

/// Counts behind one Word Information Lost value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WilScore {
    pub matches: usize,
    pub hyp_length: usize,
    pub ref_length: usize,
}

impl WilScore {
    /// Matches are the Match operations of the script, which equals
    /// `ref_len - substitutions - deletions`.
    pub fn from_script(script: &EditScript) -> Self {
        let ref_length = script.ref_len();
        let matches = ref_length - script.substitutions() - script.deletions();
        debug_assert_eq!(matches, script.matches());
        Self {
            matches,
            hyp_length: script.hyp_len(),
            ref_length,
        }
    }

    pub fn loss(&self) -> f64 {
        information_lost(self.matches as u64, self.hyp_length as u64, self.ref_length as u64)
    }
}

/// `1 - (matches / hyp_length) * (matches / ref_length)`.
///
/// Both lengths zero is a perfect (empty) transcription: 0. Exactly one zero
/// length leaves nothing to match: 1.
pub fn information_lost(matches: u64, hyp_length: u64, ref_length: u64) -> f64 {
    match (hyp_length, ref_length) {
        (0, 0) => 0.0,
        (0, _) | (_, 0) => 1.0,
        (h, r) => {
            let m = matches as f64;
            let loss = 1.0 - (m / h as f64) * (m / r as f64);
            loss.clamp(0.0, 1.0)
        }
    }
}
