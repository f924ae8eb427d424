//! The RSVP engine: one word per tick, chapters chained automatically.
//!
//! [`ReadingSession`] holds no terminal or storage handles. Every operation
//! updates state, arms at most one [`ScheduledTick`] and queues
//! [`SessionEvent`]s; the caller owns real time (it reports due ticks through
//! [`ReadingSession::fire`]) and drains the events to render and persist.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::clock::{Clock, SystemClock};
use crate::corpus::TextStore;
use crate::navigation::{next_chapter, ChapterRef};
use crate::orp::WordFrame;
use crate::speed::Speed;
use crate::stats::ReadingStats;
use crate::timer::{ScheduledTick, TickKind, TickToken, TimerSlot};
use crate::tokenize::{prepare_text, TokenizeError, WordSequence};

/// Pause between a finished chapter and the next one.
pub const CHAPTER_COMPLETE_PAUSE: Duration = Duration::from_millis(1500);
/// Pause before the first word of an automatically loaded chapter.
pub const CHAPTER_TRANSITION_DELAY: Duration = Duration::from_millis(500);
/// Position and stats are snapshotted every this many words.
pub const PERSIST_EVERY_WORDS: usize = 10;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error("Already reading! Ignoring start request.")]
    AlreadyPlaying,
    #[error("{0} WPM is not a supported speed")]
    InvalidSpeed(u32),
    #[error("no readable chapter found after {attempts} attempts")]
    AdvanceExhausted { attempts: usize },
    #[error("no content available")]
    NoContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PlayState {
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingPosition {
    pub book: String,
    pub chapter: String,
    pub word_index: usize,
}

/// Everything a store needs to resume later.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub version: String,
    pub position: Option<ReadingPosition>,
    pub speed: Speed,
    pub stats: ReadingStats,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ChapterStarted {
        location: ChapterRef,
        total_words: usize,
        start_index: usize,
    },
    Word(WordFrame),
    ChapterComplete(ChapterRef),
    /// The corpus has no chapter after the one just finished.
    AllComplete,
    Paused,
    Resumed,
    Stopped,
    SpeedChanged(Speed),
    Persist(Snapshot),
    Failed(SessionError),
}

pub struct ReadingSession<C: Clock = SystemClock> {
    store: Arc<TextStore>,
    book_order: Vec<String>,
    words: WordSequence,
    index: usize,
    location: Option<ChapterRef>,
    speed: Speed,
    state: PlayState,
    timer: TimerSlot,
    stats: ReadingStats,
    // first index not yet counted in `stats` for this chapter pass
    counted_through: usize,
    chapter_counted: bool,
    events: VecDeque<SessionEvent>,
    clock: C,
}

impl ReadingSession<SystemClock> {
    pub fn new(store: Arc<TextStore>) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<C: Clock> ReadingSession<C> {
    pub fn with_clock(store: Arc<TextStore>, clock: C) -> Self {
        Self {
            book_order: store.book_order(),
            store,
            words: WordSequence::default(),
            index: 0,
            location: None,
            speed: Speed::default(),
            state: PlayState::Stopped,
            timer: TimerSlot::default(),
            stats: ReadingStats::default(),
            counted_through: 0,
            chapter_counted: false,
            events: VecDeque::new(),
            clock,
        }
    }

    pub fn with_stats(mut self, stats: ReadingStats) -> Self {
        self.stats = stats.restored();
        self
    }

    pub fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn location(&self) -> Option<&ChapterRef> {
        self.location.as_ref()
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn stats(&self) -> &ReadingStats {
        &self.stats
    }

    pub fn store(&self) -> &Arc<TextStore> {
        &self.store
    }

    pub fn book_order(&self) -> &[String] {
        &self.book_order
    }

    pub fn pending_tick(&self) -> Option<ScheduledTick> {
        self.timer.pending()
    }

    /// Total reading time including the stretch still running.
    pub fn live_seconds(&self) -> f64 {
        self.stats.live_seconds(self.clock.now())
    }

    pub fn position(&self) -> Option<ReadingPosition> {
        self.location.as_ref().map(|loc| ReadingPosition {
            book: loc.book.clone(),
            chapter: loc.chapter.clone(),
            word_index: self.index,
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: self.store.name().to_string(),
            position: self.position(),
            speed: self.speed,
            stats: self.stats.clone(),
        }
    }

    /// Takes every event queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    /// First chapter of the corpus that tokenizes to at least one word.
    pub fn first_readable_chapter(&self) -> Result<ChapterRef, SessionError> {
        self.book_order
            .iter()
            .flat_map(|book| {
                self.store
                    .chapter_numbers(book)
                    .into_iter()
                    .map(move |chapter| ChapterRef::new(book.as_str(), chapter))
            })
            .find(|loc| prepare_text(&self.store, &loc.book, &loc.chapter).is_ok())
            .ok_or(SessionError::NoContent)
    }

    /// Switches to another version. Reading stops first.
    pub fn set_store(&mut self, store: Arc<TextStore>) {
        self.stop();
        self.book_order = store.book_order();
        self.store = store;
    }

    pub fn start(&mut self, book: &str, chapter: &str) -> Result<(), SessionError> {
        self.start_from(book, chapter, 0)
    }

    /// Starts reading at `resume_index`; an index past the end restarts the
    /// chapter from its first word.
    pub fn start_from(
        &mut self,
        book: &str,
        chapter: &str,
        resume_index: usize,
    ) -> Result<(), SessionError> {
        if self.state != PlayState::Stopped {
            log::warn!("already reading; ignoring start of {book} {chapter}");
            return Err(SessionError::AlreadyPlaying);
        }

        self.timer.cancel();
        let words = prepare_text(&self.store, book, chapter).inspect_err(|e| {
            log::warn!("cannot start {book} {chapter}: {e}");
        })?;
        let index = if resume_index < words.len() {
            resume_index
        } else {
            0
        };

        log::info!("reading {book} {chapter} from word {index} at {}", self.speed);
        self.state = PlayState::Playing;
        self.stats.begin_active(self.clock.now());
        self.load_chapter(ChapterRef::new(book, chapter), words, index);
        self.emit_snapshot();
        self.timer.arm(Duration::ZERO, TickKind::RevealWord);
        Ok(())
    }

    /// Reports that `token`'s delay has elapsed. Stale tokens are ignored.
    pub fn fire(&mut self, token: TickToken) {
        let Some(tick) = self.timer.claim(token) else {
            log::debug!("ignoring stale tick {token:?}");
            return;
        };
        match tick.kind {
            TickKind::RevealWord => self.reveal_next(),
            TickKind::AdvanceChapter => self.advance_chapter(),
        }
    }

    /// Reveals the next word right away, replacing whatever tick was pending.
    pub fn reveal_next(&mut self) {
        self.timer.cancel();
        self.reveal();
    }

    fn reveal(&mut self) {
        if self.state != PlayState::Playing {
            return;
        }
        if self.index >= self.words.len() {
            self.complete_chapter();
            return;
        }

        let label = self.location_label();
        let frame = WordFrame::new(
            &self.words[self.index],
            self.index + 1,
            self.words.len(),
            &label,
        );
        self.events.push_back(SessionEvent::Word(frame));

        if self.index >= self.counted_through {
            self.stats.total_words_read += 1;
            self.counted_through = self.index + 1;
        }
        self.index += 1;

        if self.index % PERSIST_EVERY_WORDS == 0 {
            self.emit_snapshot();
        }
        self.timer
            .arm(self.speed.word_delay(), TickKind::RevealWord);
    }

    fn complete_chapter(&mut self) {
        if !self.chapter_counted {
            self.chapter_counted = true;
            self.stats.chapters_completed += 1;
            self.stats.fold_active(self.clock.now());
            if let Some(location) = self.location.clone() {
                log::info!("finished {location}");
                self.events
                    .push_back(SessionEvent::ChapterComplete(location));
            }
            self.emit_snapshot();
        }
        self.timer
            .arm(CHAPTER_COMPLETE_PAUSE, TickKind::AdvanceChapter);
    }

    fn advance_chapter(&mut self) {
        if self.state != PlayState::Playing {
            return;
        }
        let Some(mut cursor) = self.location.clone() else {
            self.stop();
            return;
        };

        let max_attempts = self.store.total_chapters().max(1);
        let mut skipped = 0;
        for _ in 0..max_attempts {
            let Some(next) =
                next_chapter(&self.store, &cursor.book, &cursor.chapter, &self.book_order)
            else {
                if skipped > 0 {
                    self.give_up_advancing(skipped);
                } else {
                    log::info!("reached the end of {} after {cursor}", self.store.name());
                    self.events.push_back(SessionEvent::AllComplete);
                    self.stop();
                }
                return;
            };

            match prepare_text(&self.store, &next.book, &next.chapter) {
                Ok(words) => {
                    self.load_chapter(next, words, 0);
                    self.timer
                        .arm(CHAPTER_TRANSITION_DELAY, TickKind::RevealWord);
                    return;
                }
                Err(e) => {
                    log::warn!("skipping {next}: {e}");
                    skipped += 1;
                    cursor = next;
                }
            }
        }

        self.give_up_advancing(max_attempts);
    }

    fn give_up_advancing(&mut self, attempts: usize) {
        log::error!("gave up advancing after {attempts} unreadable chapters");
        self.events
            .push_back(SessionEvent::Failed(SessionError::AdvanceExhausted { attempts }));
        self.stop();
    }

    fn load_chapter(&mut self, location: ChapterRef, words: WordSequence, index: usize) {
        self.events.push_back(SessionEvent::ChapterStarted {
            location: location.clone(),
            total_words: words.len(),
            start_index: index,
        });
        self.words = words;
        self.index = index;
        self.location = Some(location);
        self.counted_through = index;
        self.chapter_counted = false;
    }

    /// Pauses while playing, resumes while paused, does nothing when stopped.
    pub fn toggle_pause(&mut self) {
        self.timer.cancel();
        match self.state {
            PlayState::Stopped => {}
            PlayState::Playing => {
                self.state = PlayState::Paused;
                self.stats.end_active(self.clock.now());
                self.events.push_back(SessionEvent::Paused);
                self.emit_snapshot();
            }
            PlayState::Paused => {
                self.state = PlayState::Playing;
                self.stats.begin_active(self.clock.now());
                self.events.push_back(SessionEvent::Resumed);
                self.timer.arm(Duration::ZERO, TickKind::RevealWord);
            }
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlayState::Playing {
            self.toggle_pause();
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlayState::Paused {
            self.toggle_pause();
        }
    }

    pub fn stop(&mut self) {
        self.timer.cancel();
        if self.state == PlayState::Stopped {
            return;
        }

        self.stats.end_active(self.clock.now());
        self.emit_snapshot();
        self.state = PlayState::Stopped;
        self.words = WordSequence::default();
        self.index = 0;
        self.location = None;
        self.events.push_back(SessionEvent::Stopped);
    }

    /// Takes effect from the next armed tick; a tick already counting down
    /// keeps its delay.
    pub fn change_speed(&mut self, wpm: u32) -> Result<Speed, SessionError> {
        let speed = Speed::new(wpm)?;
        self.set_speed(speed);
        Ok(speed)
    }

    pub fn faster(&mut self) -> Speed {
        self.set_speed(self.speed.faster());
        self.speed
    }

    pub fn slower(&mut self) -> Speed {
        self.set_speed(self.speed.slower());
        self.speed
    }

    fn set_speed(&mut self, speed: Speed) {
        if speed != self.speed {
            log::debug!("speed changed to {speed}");
            self.speed = speed;
            self.events.push_back(SessionEvent::SpeedChanged(speed));
        }
    }

    fn location_label(&self) -> String {
        self.location
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    fn emit_snapshot(&mut self) {
        let snapshot = self.snapshot();
        self.events.push_back(SessionEvent::Persist(snapshot));
    }
}
