use std::{
    collections::HashMap,
    time::{
        Duration,
        Instant,
    },
};

use crate::core::{
    CardId,
    Side,
};

/// How long a key sits idle before its pending edit is flushed.
pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// Keystrokes past this within one burst flush immediately.
pub const BURST_THRESHOLD: u32 = 10;

/// A persistence request produced by the coalescer; the caller performs the
/// actual `writeCardSide`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flush {
    pub card_id: CardId,
    pub side: Side,
    pub content: String,
}

struct Pending {
    content: String, // always the latest content seen for this key
    deadline: Instant,
    keystrokes: u32,
}

/// Per-(card, side) debounce state machine that turns a stream of keystrokes
/// into batched persistence calls. A key is either idle (no entry) or pending
/// with the latest content and a deadline; the deadline is drained by
/// `poll_due` once per UI frame, so there is no timer closure that could
/// capture stale content.
#[derive(Default)]
pub struct EditCoalescer {
    pending: HashMap<(CardId, Side), Pending>,
}

impl EditCoalescer {
    pub fn new() -> Self {
        EditCoalescer { pending: HashMap::new() }
    }

    /// Called on every keystroke. Returns a flush when the edit is final
    /// (focus lost) or the burst threshold is crossed; otherwise the save is
    /// rescheduled for `DEBOUNCE` past `now` with the new content.
    pub fn on_edit(
        &mut self,
        card_id: &str,
        side: Side,
        content: &str,
        is_final: bool,
        now: Instant,
    ) -> Option<Flush> {
        let key = (card_id.to_string(), side);
        let keystrokes = self.pending.get(&key).map(|p| p.keystrokes).unwrap_or(0) + 1;

        if is_final || keystrokes > BURST_THRESHOLD {
            self.pending.remove(&key);
            return Some(Flush { card_id: key.0, side, content: content.to_string() });
        }

        self.pending.insert(
            key,
            Pending { content: content.to_string(), deadline: now + DEBOUNCE, keystrokes },
        );
        None
    }

    /// Drains every key whose debounce window has elapsed, carrying the latest
    /// content seen for it. Meant to be called once per frame.
    pub fn poll_due(&mut self, now: Instant) -> Vec<Flush> {
        let due: Vec<(CardId, Side)> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();

        let mut flushes = Vec::with_capacity(due.len());
        for key in due {
            if let Some(pending) = self.pending.remove(&key) {
                flushes.push(Flush { card_id: key.0, side: key.1, content: pending.content });
            }
        }
        flushes
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drops un-flushed edits; used at sign-out after a final flush pass.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
