use rand::Rng;

use crate::{
    corpus::{Corpus, EntryId, PreferredSlot},
    schedule::TimeSlot,
};

/// Current entry plus the LIFO trail of entries navigated away from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    current: EntryId,
    history: Vec<EntryId>,
}

impl Navigator {
    /// Pick the opening entry for `slot`: first exact match, then first
    /// `Any`, then the first entry of the corpus.
    pub fn initialize(corpus: &Corpus, slot: TimeSlot) -> Self {
        let current = corpus
            .position(|e| e.preferred_slot.is(slot))
            .or_else(|| corpus.position(|e| e.preferred_slot == PreferredSlot::Any))
            .unwrap_or(EntryId(0));

        Self {
            current,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> EntryId {
        self.current
    }

    /// History, oldest first.
    pub fn history(&self) -> &[EntryId] {
        &self.history
    }

    /// Push the current entry and move to a random eligible one.
    ///
    /// With more than one candidate the result always differs from the entry
    /// being left.
    pub fn advance<R: Rng + ?Sized>(&mut self, corpus: &Corpus, slot: TimeSlot, rng: &mut R) -> EntryId {
        let previous = self.current;
        self.history.push(previous);

        let next = pick_different(&candidates(corpus, slot), previous, rng);
        tracing::debug!(from = previous.0, to = next.0, %slot, "Advanced");

        self.current = next;
        next
    }

    /// Pop back to the most recent entry; `None` when there is nothing to undo.
    pub fn retreat(&mut self) -> Option<EntryId> {
        let previous = self.history.pop()?;
        tracing::debug!(from = self.current.0, to = previous.0, "Retreated");
        self.current = previous;
        Some(previous)
    }
}

/// Entries eligible during `slot`, falling back to the full corpus.
pub fn candidates(corpus: &Corpus, slot: TimeSlot) -> Vec<EntryId> {
    let eligible: Vec<EntryId> = corpus
        .iter()
        .filter(|(_, e)| e.preferred_slot.matches(slot))
        .map(|(id, _)| id)
        .collect();

    if eligible.is_empty() {
        corpus.iter().map(|(id, _)| id).collect()
    } else {
        eligible
    }
}

/// Uniform draw that avoids `previous` whenever another candidate exists.
///
/// Random draws are capped at `candidates.len()`; if all of them hit
/// `previous`, the first other candidate is taken.
fn pick_different<R: Rng + ?Sized>(candidates: &[EntryId], previous: EntryId, rng: &mut R) -> EntryId {
    if let [only] = candidates {
        return *only;
    }

    for _ in 0..candidates.len() {
        let pick = candidates[rng.gen_range(0..candidates.len())];
        if pick != previous {
            return pick;
        }
    }

    candidates
        .iter()
        .copied()
        .find(|&id| id != previous)
        .unwrap_or(previous)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::corpus::{AZKAR, ZikrEntry};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn corpus_of(entries: &[ZikrEntry]) -> Corpus {
        Corpus::new(Box::leak(entries.to_vec().into_boxed_slice())).unwrap()
    }

    // ==================== Initialization Tests ====================

    #[test]
    fn test_initialize_picks_first_exact_match() {
        let corpus = Corpus::standard();
        assert_eq!(Navigator::initialize(&corpus, TimeSlot::Morning).current(), EntryId(0));
        assert_eq!(Navigator::initialize(&corpus, TimeSlot::Friday).current(), EntryId(2));
        assert_eq!(Navigator::initialize(&corpus, TimeSlot::Night).current(), EntryId(3));
        assert_eq!(Navigator::initialize(&corpus, TimeSlot::Afternoon).current(), EntryId(6));
        assert_eq!(Navigator::initialize(&corpus, TimeSlot::Evening).current(), EntryId(9));
    }

    #[test]
    fn test_initialize_falls_back_to_any_then_first() {
        let corpus = corpus_of(&[AZKAR[3], AZKAR[1]]);
        assert_eq!(Navigator::initialize(&corpus, TimeSlot::Morning).current(), EntryId(1));

        let corpus = corpus_of(&[AZKAR[3], AZKAR[7]]);
        assert_eq!(Navigator::initialize(&corpus, TimeSlot::Morning).current(), EntryId(0));
    }

    #[test]
    fn test_initialize_has_empty_history() {
        let nav = Navigator::initialize(&Corpus::standard(), TimeSlot::Evening);
        assert!(nav.history().is_empty());
    }

    // ==================== Candidate Tests ====================

    #[test]
    fn test_candidates_include_any_entries() {
        let corpus = Corpus::standard();
        assert_eq!(
            candidates(&corpus, TimeSlot::Morning),
            vec![EntryId(0), EntryId(1), EntryId(4), EntryId(5)]
        );
        assert_eq!(
            candidates(&corpus, TimeSlot::Evening),
            vec![EntryId(1), EntryId(5), EntryId(9)]
        );
    }

    #[test]
    fn test_candidates_fall_back_to_full_corpus() {
        let corpus = corpus_of(&[AZKAR[3], AZKAR[7]]);
        assert_eq!(
            candidates(&corpus, TimeSlot::Morning),
            vec![EntryId(0), EntryId(1)]
        );
    }

    // ==================== Advance / Retreat Tests ====================

    #[test]
    fn test_advance_never_repeats_with_multiple_candidates() {
        let corpus = Corpus::standard();
        let mut rng = rng();
        let mut nav = Navigator::initialize(&corpus, TimeSlot::Evening);

        for _ in 0..500 {
            let before = nav.current();
            let after = nav.advance(&corpus, TimeSlot::Evening, &mut rng);
            assert_ne!(before, after);
            assert!(corpus.entry(after).preferred_slot.matches(TimeSlot::Evening));
        }
    }

    #[test]
    fn test_advance_single_candidate_may_repeat() {
        let corpus = corpus_of(&[AZKAR[0]]);
        let mut nav = Navigator::initialize(&corpus, TimeSlot::Night);

        assert_eq!(nav.advance(&corpus, TimeSlot::Night, &mut rng()), EntryId(0));
        assert_eq!(nav.history(), &[EntryId(0)]);
    }

    #[test]
    fn test_advance_records_history() {
        let corpus = Corpus::standard();
        let mut rng = rng();
        let mut nav = Navigator::initialize(&corpus, TimeSlot::Morning);
        let first = nav.current();

        let second = nav.advance(&corpus, TimeSlot::Morning, &mut rng);
        nav.advance(&corpus, TimeSlot::Morning, &mut rng);

        assert_eq!(nav.history(), &[first, second]);
    }

    #[test]
    fn test_retreat_on_empty_history_is_noop() {
        let mut nav = Navigator::initialize(&Corpus::standard(), TimeSlot::Night);
        let before = nav.clone();
        assert_eq!(nav.retreat(), None);
        assert_eq!(nav, before);
    }

    #[test]
    fn test_retreat_unwinds_in_lifo_order() {
        let corpus = Corpus::standard();
        let mut rng = rng();
        let mut nav = Navigator::initialize(&corpus, TimeSlot::Night);
        let a = nav.current();

        let b = nav.advance(&corpus, TimeSlot::Afternoon, &mut rng);
        let c = nav.advance(&corpus, TimeSlot::Afternoon, &mut rng);
        let _d = nav.advance(&corpus, TimeSlot::Afternoon, &mut rng);

        assert_eq!(nav.retreat(), Some(c));
        assert_eq!(nav.retreat(), Some(b));
        assert_eq!(nav.retreat(), Some(a));
        assert_eq!(nav.retreat(), None);
        assert_eq!(nav.current(), a);
        assert!(nav.history().is_empty());
    }

    // ==================== Bounded Retry Tests ====================

    /// Rng that always yields zero, so every draw hits the first candidate.
    struct ZeroRng;

    impl rand::RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            dest.fill(0);
            Ok(())
        }
    }

    #[test]
    fn test_pick_terminates_when_draws_keep_hitting_previous() {
        let candidates = [EntryId(4), EntryId(5), EntryId(6)];
        assert_eq!(pick_different(&candidates, EntryId(4), &mut ZeroRng), EntryId(5));
        assert_eq!(pick_different(&candidates, EntryId(5), &mut ZeroRng), EntryId(4));
    }
}
