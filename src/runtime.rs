use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::timer::{ScheduledTick, TickToken};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum ReaderEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait ReaderEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<ReaderEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<ReaderEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // Windows reports releases too
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    tx.send(ReaderEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => tx.send(ReaderEvent::Resize),
                Ok(_) => Ok(()),
                Err(e) => {
                    log::error!("terminal event stream closed: {e}");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ReaderEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Event source fed from a channel, for tests and scripted runs
pub struct ChannelEventSource {
    rx: Receiver<ReaderEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<ReaderEvent>) -> Self {
        Self { rx }
    }
}

impl ReaderEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ReaderEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Turns the session's pending tick into a wall-clock deadline.
///
/// The session only says "fire this token after this delay"; the driver
/// remembers when the delay started and reports the token once it is due.
#[derive(Debug, Default)]
pub struct TimerDriver {
    armed: Option<(TickToken, Instant)>,
}

impl TimerDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks `pending`. A token already tracked keeps its original deadline.
    pub fn sync(&mut self, pending: Option<ScheduledTick>, now: Instant) {
        self.armed = match (pending, self.armed) {
            (Some(tick), Some((token, deadline))) if tick.token == token => {
                Some((token, deadline))
            }
            (Some(tick), _) => Some((tick.token, now + tick.delay)),
            (None, _) => None,
        };
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|(_, deadline)| deadline)
    }

    /// How long the loop may block before the tick is due, capped at `max`.
    pub fn wait(&self, now: Instant, max: Duration) -> Duration {
        self.deadline()
            .map_or(max, |deadline| deadline.saturating_duration_since(now).min(max))
    }

    /// The tracked token, once its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<TickToken> {
        match self.armed {
            Some((token, deadline)) if deadline <= now => {
                self.armed = None;
                Some(token)
            }
            _ => None,
        }
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: ReaderEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: ReaderEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> ReaderEvent {
        self.step_within(self.ticker.interval())
    }

    /// Like [`Runner::step`], but never blocks longer than `max_wait`.
    pub fn step_within(&self, max_wait: Duration) -> ReaderEvent {
        let timeout = self.ticker.interval().min(max_wait);
        match self.event_source.recv_timeout(timeout) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                ReaderEvent::Tick
            }
        }
    }
}
