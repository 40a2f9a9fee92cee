//! Phrase search over sentence bytes.
//!
//! The responder's core: count non-overlapping occurrences of the target
//! phrase and record where the first one starts. Offsets are 0-based byte
//! offsets, the same unit the wire format's `first_find_pos` carries.

/// Result of scanning a sentence for a phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrences {
    /// How many non-overlapping occurrences were found.
    pub count: u32,
    /// Byte offset of the first occurrence, if any.
    pub first: Option<u32>,
}

impl Occurrences {
    const NONE: Occurrences = Occurrences {
        count: 0,
        first: None,
    };
}

/// Scan `sentence` for non-overlapping occurrences of `phrase`.
///
/// After a match the scan resumes past the matched bytes, so in `aaaa`
/// the phrase `aa` occurs twice, not three times. An empty phrase never
/// matches. Comparison is exact bytes; no case folding.
pub fn find_occurrences(sentence: &[u8], phrase: &[u8]) -> Occurrences {
    if phrase.is_empty() || sentence.len() < phrase.len() {
        return Occurrences::NONE;
    }

    let mut count = 0u32;
    let mut first = None;
    let mut at = 0;
    while at + phrase.len() <= sentence.len() {
        if &sentence[at..at + phrase.len()] == phrase {
            if first.is_none() {
                first = Some(at as u32);
            }
            count += 1;
            at += phrase.len();
        } else {
            at += 1;
        }
    }

    Occurrences { count, first }
}
