//! Queue advancement rules.
//!
//! Pure functions of (queue length, cursor, shuffle, repeat, rng); the
//! controller applies whatever index they return.

use rand::Rng;

use super::types::RepeatMode;

/// What to do when the current track finishes on its own.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EndAction {
    /// Play the same queue entry again from the start.
    Restart,
    /// Play the entry at this index.
    Advance(usize),
    /// Nothing left to play.
    Stop,
}

/// Uniform pick among queue indices other than `cursor`.
///
/// With no valid cursor every index is eligible; with one, a queue of a
/// single track has nothing to pick.
fn random_other<R: Rng + ?Sized>(len: usize, cursor: Option<usize>, rng: &mut R) -> Option<usize> {
    match cursor {
        Some(c) if c < len => {
            if len <= 1 {
                return None;
            }
            let pick = rng.gen_range(0..len - 1);
            Some(if pick >= c { pick + 1 } else { pick })
        }
        _ => Some(rng.gen_range(0..len)),
    }
}

/// Index to play after `cursor`, or `None` to stay put.
pub fn next_index<R: Rng + ?Sized>(
    len: usize,
    cursor: Option<usize>,
    shuffle: bool,
    repeat: RepeatMode,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if shuffle {
        return random_other(len, cursor, rng);
    }
    match cursor {
        None => Some(0),
        Some(c) if c + 1 >= len => (repeat == RepeatMode::All).then_some(0),
        Some(c) => Some(c + 1),
    }
}

/// Index to play before `cursor`; wraps to the last entry from the first.
pub fn previous_index<R: Rng + ?Sized>(
    len: usize,
    cursor: Option<usize>,
    shuffle: bool,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if shuffle {
        return random_other(len, cursor, rng);
    }
    match cursor {
        Some(c) if c > 0 && c < len => Some(c - 1),
        _ => Some(len - 1),
    }
}

/// Decide what follows a track that played to its end.
pub fn on_track_end<R: Rng + ?Sized>(
    len: usize,
    cursor: Option<usize>,
    shuffle: bool,
    repeat: RepeatMode,
    rng: &mut R,
) -> EndAction {
    if repeat == RepeatMode::One && cursor.is_some_and(|c| c < len) {
        return EndAction::Restart;
    }
    match next_index(len, cursor, shuffle, repeat, rng) {
        Some(i) => EndAction::Advance(i),
        None => EndAction::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn sequential_next_advances_by_one() {
        let mut r = rng();
        assert_eq!(next_index(3, Some(0), false, RepeatMode::Off, &mut r), Some(1));
        assert_eq!(next_index(3, Some(1), false, RepeatMode::One, &mut r), Some(2));
        assert_eq!(next_index(3, None, false, RepeatMode::Off, &mut r), Some(0));
    }

    #[test]
    fn next_wraps_to_zero_only_with_repeat_all() {
        let mut r = rng();
        assert_eq!(next_index(3, Some(2), false, RepeatMode::All, &mut r), Some(0));
        assert_eq!(next_index(3, Some(2), false, RepeatMode::Off, &mut r), None);
        assert_eq!(next_index(3, Some(2), false, RepeatMode::One, &mut r), None);
        assert_eq!(next_index(1, Some(0), false, RepeatMode::All, &mut r), Some(0));
    }

    #[test]
    fn empty_queue_never_advances() {
        let mut r = rng();
        for repeat in [RepeatMode::Off, RepeatMode::One, RepeatMode::All] {
            for shuffle in [false, true] {
                assert_eq!(next_index(0, None, shuffle, repeat, &mut r), None);
                assert_eq!(previous_index(0, None, shuffle, &mut r), None);
                assert_eq!(on_track_end(0, None, shuffle, repeat, &mut r), EndAction::Stop);
            }
        }
    }

    #[test]
    fn shuffle_next_never_repeats_current() {
        let mut r = rng();
        for len in 2..8 {
            for cur in 0..len {
                for _ in 0..50 {
                    let n = next_index(len, Some(cur), true, RepeatMode::Off, &mut r).unwrap();
                    assert_ne!(n, cur);
                    assert!(n < len);
                }
            }
        }
    }

    #[test]
    fn shuffle_next_reaches_every_other_index() {
        let mut r = rng();
        let mut seen = [false; 5];
        for _ in 0..500 {
            let n = next_index(5, Some(2), true, RepeatMode::Off, &mut r).unwrap();
            seen[n] = true;
        }
        assert_eq!(seen, [true, true, false, true, true]);
    }

    #[test]
    fn shuffle_with_single_track_is_a_no_op() {
        let mut r = rng();
        assert_eq!(next_index(1, Some(0), true, RepeatMode::All, &mut r), None);
        assert_eq!(previous_index(1, Some(0), true, &mut r), None);
        // Nothing selected yet: the only track is fair game.
        assert_eq!(next_index(1, None, true, RepeatMode::Off, &mut r), Some(0));
    }

    #[test]
    fn previous_decrements_and_wraps_at_zero() {
        let mut r = rng();
        assert_eq!(previous_index(4, Some(2), false, &mut r), Some(1));
        assert_eq!(previous_index(4, Some(0), false, &mut r), Some(3));
        assert_eq!(previous_index(4, None, false, &mut r), Some(3));
        assert_eq!(previous_index(1, Some(0), false, &mut r), Some(0));
    }

    #[test]
    fn shuffle_previous_excludes_current() {
        let mut r = rng();
        for _ in 0..200 {
            let p = previous_index(3, Some(1), true, &mut r).unwrap();
            assert_ne!(p, 1);
        }
    }

    #[test]
    fn track_end_repeat_one_restarts() {
        let mut r = rng();
        assert_eq!(
            on_track_end(3, Some(1), false, RepeatMode::One, &mut r),
            EndAction::Restart
        );
        assert_eq!(
            on_track_end(3, Some(2), true, RepeatMode::One, &mut r),
            EndAction::Restart
        );
    }

    #[test]
    fn track_end_defers_to_next_rule() {
        let mut r = rng();
        assert_eq!(
            on_track_end(3, Some(0), false, RepeatMode::Off, &mut r),
            EndAction::Advance(1)
        );
        assert_eq!(
            on_track_end(3, Some(2), false, RepeatMode::Off, &mut r),
            EndAction::Stop
        );
        assert_eq!(
            on_track_end(3, Some(2), false, RepeatMode::All, &mut r),
            EndAction::Advance(0)
        );
    }

    #[test]
    fn repeat_cycle_order() {
        assert_eq!(RepeatMode::Off.cycle(), RepeatMode::All);
        assert_eq!(RepeatMode::All.cycle(), RepeatMode::One);
        assert_eq!(RepeatMode::One.cycle(), RepeatMode::Off);
    }
}
