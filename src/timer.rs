use std::time::Duration;

/// Identifies one armed tick. A fired token that no longer matches the slot
/// belongs to a cancelled or superseded tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    RevealWord,
    AdvanceChapter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTick {
    pub token: TickToken,
    pub delay: Duration,
    pub kind: TickKind,
}

/// Holds at most one pending tick.
#[derive(Debug, Default)]
pub struct TimerSlot {
    pending: Option<ScheduledTick>,
    issued: u64,
}

impl TimerSlot {
    /// Arms a new tick. The slot must be empty: cancel first.
    pub fn arm(&mut self, delay: Duration, kind: TickKind) -> ScheduledTick {
        debug_assert!(
            self.pending.is_none(),
            "tick armed while {:?} is still pending",
            self.pending
        );
        if let Some(stale) = self.pending.take() {
            log::warn!("replacing pending tick {:?}", stale.token);
        }

        self.issued += 1;
        let tick = ScheduledTick {
            token: TickToken(self.issued),
            delay,
            kind,
        };
        self.pending = Some(tick);
        tick
    }

    pub fn cancel(&mut self) -> Option<ScheduledTick> {
        self.pending.take()
    }

    /// Takes the pending tick if `token` is the one currently armed.
    pub fn claim(&mut self, token: TickToken) -> Option<ScheduledTick> {
        match self.pending {
            Some(tick) if tick.token == token => self.pending.take(),
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<ScheduledTick> {
        self.pending
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}
