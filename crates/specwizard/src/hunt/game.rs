//! Treasure hunt progression.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::HuntMode;

/// Result of feeding one scanned code to the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Wrong code, repeated code, or no game in progress.
    Ignored,
    /// The expected code was scanned; show the next clue.
    Advanced {
        /// New current step, 1-based.
        step: usize,
        /// Code whose picture is the next clue.
        clue: String,
    },
    /// The hunt is over; show where the treasure is.
    Completed {
        /// Code whose picture shows the treasure.
        treasure: String,
    },
}

/// One play-through of a hunt.
///
/// The last stored step is the treasure itself: players follow the clues up
/// to it but never scan it.
#[derive(Debug, Clone, Default)]
pub struct HuntGame {
    sequence: Vec<String>,
    play_order: Vec<String>,
    scanned: Vec<String>,
    current_step: usize,
    started: bool,
    complete: bool,
}

impl HuntGame {
    /// Create a game over the stored step order.
    #[must_use]
    pub fn new(sequence: Vec<String>) -> Self {
        Self {
            sequence,
            ..Self::default()
        }
    }

    /// Start (or restart) the hunt and return the first clue.
    ///
    /// In [`HuntMode::Random`] every step but the treasure is shuffled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HuntEmpty`] if there are no steps.
    pub fn start<R: Rng + ?Sized>(&mut self, mode: HuntMode, rng: &mut R) -> Result<String> {
        let Some((treasure, clues)) = self.sequence.split_last() else {
            return Err(Error::HuntEmpty);
        };

        self.play_order = match mode {
            HuntMode::Sequential => self.sequence.clone(),
            HuntMode::Random => {
                let mut order = clues.to_vec();
                order.shuffle(rng);
                order.push(treasure.clone());
                order
            }
        };
        self.scanned.clear();
        self.current_step = 1;
        self.started = true;
        self.complete = false;

        info!(%mode, steps = self.sequence.len(), "Hunt started");
        Ok(self.play_order[0].clone())
    }

    /// The code that advances the hunt, if one is in progress.
    #[must_use]
    pub fn expected_code(&self) -> Option<&str> {
        if !self.started || self.complete {
            return None;
        }
        self.play_order
            .get(self.current_step.checked_sub(1)?)
            .map(String::as_str)
    }

    /// Feed a scanned code.
    pub fn scan(&mut self, code: &str) -> ScanOutcome {
        let Some(expected) = self.expected_code() else {
            return ScanOutcome::Ignored;
        };
        if code != expected || self.scanned.iter().any(|c| c == code) {
            debug!(code, expected, "Ignoring scan");
            return ScanOutcome::Ignored;
        }

        self.scanned.push(code.to_string());
        let len = self.play_order.len();

        if self.current_step + 1 >= len {
            self.current_step = len;
            self.complete = true;
            let treasure = self.sequence.last().cloned().unwrap_or_default();
            info!(%treasure, "Hunt complete");
            return ScanOutcome::Completed { treasure };
        }

        self.current_step += 1;
        let clue = self.play_order[self.current_step - 1].clone();
        debug!(step = self.current_step, %clue, "Hunt advanced");
        ScanOutcome::Advanced {
            step: self.current_step,
            clue,
        }
    }

    /// Current step, 1-based; 0 before the game starts.
    #[must_use]
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Codes in the order they are played.
    #[must_use]
    pub fn play_order(&self) -> &[String] {
        &self.play_order
    }

    /// Codes accepted so far.
    #[must_use]
    pub fn scanned(&self) -> &[String] {
        &self.scanned
    }

    /// Whether the treasure has been revealed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn codes(n: usize) -> Vec<String> {
        (1..=n).map(|i| i.to_string()).collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_start_empty_hunt() {
        let mut game = HuntGame::new(Vec::new());
        assert!(matches!(
            game.start(HuntMode::Sequential, &mut rng()),
            Err(Error::HuntEmpty)
        ));
    }

    #[test]
    fn test_not_started_ignores_scans() {
        let mut game = HuntGame::new(codes(3));
        assert_eq!(game.expected_code(), None);
        assert_eq!(game.scan("1"), ScanOutcome::Ignored);
    }

    #[test]
    fn test_sequential_play_through() {
        let mut game = HuntGame::new(codes(3));
        assert_eq!(game.start(HuntMode::Sequential, &mut rng()).unwrap(), "1");
        assert_eq!(game.current_step(), 1);

        assert_eq!(
            game.scan("1"),
            ScanOutcome::Advanced {
                step: 2,
                clue: "2".to_string()
            }
        );
        assert_eq!(
            game.scan("2"),
            ScanOutcome::Completed {
                treasure: "3".to_string()
            }
        );
        assert!(game.is_complete());
        assert_eq!(game.current_step(), 3);
        assert_eq!(game.scan("3"), ScanOutcome::Ignored);
    }

    #[test]
    fn test_wrong_and_repeated_codes_are_ignored() {
        let mut game = HuntGame::new(codes(4));
        game.start(HuntMode::Sequential, &mut rng()).unwrap();

        assert_eq!(game.scan("3"), ScanOutcome::Ignored);
        assert!(matches!(game.scan("1"), ScanOutcome::Advanced { step: 2, .. }));
        assert_eq!(game.scan("1"), ScanOutcome::Ignored);
        assert_eq!(game.current_step(), 2);
        assert_eq!(game.scanned(), ["1"]);
    }

    #[test]
    fn test_single_step_hunt() {
        let mut game = HuntGame::new(codes(1));
        assert_eq!(game.start(HuntMode::Random, &mut rng()).unwrap(), "1");
        assert_eq!(
            game.scan("1"),
            ScanOutcome::Completed {
                treasure: "1".to_string()
            }
        );
    }

    #[test]
    fn test_random_keeps_treasure_last() {
        let mut game = HuntGame::new(codes(6));
        game.start(HuntMode::Random, &mut rng()).unwrap();

        let order = game.play_order();
        assert_eq!(order.last().map(String::as_str), Some("6"));
        let mut clues = order[..5].to_vec();
        clues.sort();
        assert_eq!(clues, codes(5));
    }

    #[test]
    fn test_random_play_through_follows_play_order() {
        let mut game = HuntGame::new(codes(5));
        let first = game.start(HuntMode::Random, &mut rng()).unwrap();
        let order = game.play_order().to_vec();
        assert_eq!(first, order[0]);

        for (i, code) in order.iter().take(3).enumerate() {
            assert_eq!(
                game.scan(code),
                ScanOutcome::Advanced {
                    step: i + 2,
                    clue: order[i + 1].clone()
                }
            );
        }
        assert_eq!(
            game.scan(&order[3]),
            ScanOutcome::Completed {
                treasure: "5".to_string()
            }
        );
    }

    #[test]
    fn test_restart_resets_progress() {
        let mut game = HuntGame::new(codes(3));
        game.start(HuntMode::Sequential, &mut rng()).unwrap();
        game.scan("1");

        game.start(HuntMode::Sequential, &mut rng()).unwrap();
        assert_eq!(game.current_step(), 1);
        assert!(game.scanned().is_empty());
        assert_eq!(game.expected_code(), Some("1"));
    }
}
