use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::session::SessionError;

/// Reading speeds offered, in words per minute.
pub const SPEED_STEPS: [u32; 7] = [300, 400, 500, 600, 700, 800, 900];

/// A validated words-per-minute value from [`SPEED_STEPS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Speed(u32);

impl Speed {
    pub const SLOWEST: Speed = Speed(SPEED_STEPS[0]);
    pub const FASTEST: Speed = Speed(SPEED_STEPS[SPEED_STEPS.len() - 1]);

    pub fn new(wpm: u32) -> Result<Self, SessionError> {
        if SPEED_STEPS.contains(&wpm) {
            Ok(Self(wpm))
        } else {
            Err(SessionError::InvalidSpeed(wpm))
        }
    }

    pub fn wpm(self) -> u32 {
        self.0
    }

    /// Time each word stays on screen: 60000 / wpm milliseconds.
    pub fn word_delay(self) -> Duration {
        Duration::from_nanos(60_000_000_000 / u64::from(self.0))
    }

    fn step_index(self) -> usize {
        SPEED_STEPS.iter().position(|s| *s == self.0).unwrap_or(0)
    }

    /// Moves `steps` notches through [`SPEED_STEPS`], saturating at the ends.
    pub fn step(self, steps: i32) -> Self {
        let idx = self.step_index() as i64 + i64::from(steps);
        let idx = idx.clamp(0, SPEED_STEPS.len() as i64 - 1) as usize;
        Self(SPEED_STEPS[idx])
    }

    pub fn faster(self) -> Self {
        self.step(1)
    }

    pub fn slower(self) -> Self {
        self.step(-1)
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::SLOWEST
    }
}

impl TryFrom<u32> for Speed {
    type Error = SessionError;

    fn try_from(wpm: u32) -> Result<Self, Self::Error> {
        Self::new(wpm)
    }
}

impl From<Speed> for u32 {
    fn from(speed: Speed) -> Self {
        speed.0
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} WPM", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_word_delay() {
        assert_eq!(Speed::new(300).unwrap().word_delay(), Duration::from_millis(200));
        assert_eq!(Speed::new(400).unwrap().word_delay(), Duration::from_millis(150));
        assert_eq!(Speed::new(600).unwrap().word_delay(), Duration::from_millis(100));
        assert_eq!(
            Speed::new(700).unwrap().word_delay(),
            Duration::from_nanos(85_714_285)
        );
    }

    #[test]
    fn test_rejects_speeds_outside_the_set() {
        assert_matches!(Speed::new(350), Err(SessionError::InvalidSpeed(350)));
        assert_matches!(Speed::new(0), Err(SessionError::InvalidSpeed(0)));
        assert_matches!(Speed::new(1000), Err(SessionError::InvalidSpeed(1000)));
    }

    #[test]
    fn test_step_saturates() {
        assert_eq!(Speed::SLOWEST.slower(), Speed::SLOWEST);
        assert_eq!(Speed::FASTEST.faster(), Speed::FASTEST);
        assert_eq!(Speed::new(500).unwrap().faster().wpm(), 600);
        assert_eq!(Speed::new(500).unwrap().step(-5), Speed::SLOWEST);
    }

    #[test]
    fn test_serde_validates() {
        let speed: Speed = serde_json::from_str("800").unwrap();
        assert_eq!(speed.wpm(), 800);
        assert!(serde_json::from_str::<Speed>("850").is_err());
        assert_eq!(serde_json::to_string(&speed).unwrap(), "800");
    }

    #[test]
    fn test_display() {
        assert_eq!(Speed::default().to_string(), "300 WPM");
    }
}
