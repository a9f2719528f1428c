use std::collections::{
    HashMap,
    HashSet,
    VecDeque,
};

use crate::{
    core::{
        Card,
        CardId,
        FlashnoteError,
        Sheet,
        SheetId,
        Side,
    },
    sync::SyncFacade,
};

pub const DEFAULT_CEILING: usize = 1000;

/// The working set: the subset of the remote card collection held in memory.
/// Cards are loaded a whole sheet at a time and evicted the same way, FIFO by
/// sheet activation, so a rendered sheet's cards are either all present or all
/// absent.
pub struct WorkingSetCache {
    resident: HashMap<CardId, Card>,
    load_batches: VecDeque<Vec<CardId>>, // oldest first; owned copies of cardOrder
    resident_count: usize,
    ceiling: usize,
    in_flight: HashSet<SheetId>,
}

impl WorkingSetCache {
    pub fn new() -> Self {
        Self::with_ceiling(DEFAULT_CEILING)
    }

    pub fn with_ceiling(ceiling: usize) -> Self {
        WorkingSetCache {
            resident: HashMap::new(),
            load_batches: VecDeque::new(),
            resident_count: 0,
            ceiling,
            in_flight: HashSet::new(),
        }
    }

    pub fn get(&self, card_id: &str) -> Option<&Card> {
        self.resident.get(card_id)
    }

    pub fn get_mut(&mut self, card_id: &str) -> Option<&mut Card> {
        self.resident.get_mut(card_id)
    }

    pub fn is_resident(&self, card_id: &str) -> bool {
        self.resident.contains_key(card_id)
    }

    pub fn resident_count(&self) -> usize {
        self.resident_count
    }

    /// Loads the cards of `sheet` unless they are already resident. If the
    /// first ID of the sheet's cardOrder is resident the whole batch is
    /// (batches load and evict atomically) and the fetch is skipped. Loading
    /// may push the resident count over the ceiling, in which case the oldest
    /// batch is evicted; at most one per activation, and never the batch that
    /// was just loaded.
    pub async fn activate_sheet<S: SyncFacade>(
        &mut self,
        sheet: &Sheet,
        sync: &S,
    ) -> Result<(), FlashnoteError> {
        if sheet.card_order.is_empty() {
            return Ok(());
        }
        if self.is_resident(&sheet.card_order[0]) {
            return Ok(());
        }
        // Activation and eviction bookkeeping for the same sheet must not
        // interleave across the fetch suspension point
        if !self.in_flight.insert(sheet.id.clone()) {
            return Ok(());
        }

        let fetched = match sync.fetch_cards(&sheet.card_order).await {
            Ok(cards) => cards,
            Err(e) => {
                self.in_flight.remove(&sheet.id);
                return Err(e);
            }
        };

        for (id, card) in fetched {
            self.resident.insert(id, card);
        }
        self.load_batches.push_back(sheet.card_order.clone());
        self.resident_count += sheet.card_order.len();

        let result = self.evict_if_over_ceiling();
        self.in_flight.remove(&sheet.id);
        result
    }

    fn evict_if_over_ceiling(&mut self) -> Result<(), FlashnoteError> {
        if self.resident_count <= self.ceiling {
            return Ok(());
        }
        if self.load_batches.is_empty() {
            // Over the ceiling with nothing to evict: the bookkeeping is
            // corrupt and the cache must be reset by the caller
            return Err(FlashnoteError::EmptyEvictionQueue);
        }
        if self.load_batches.len() == 1 {
            // The only batch is the one just loaded; a single oversized sheet
            // is allowed to exceed the raw ceiling
            return Ok(());
        }
        if let Some(batch) = self.load_batches.pop_front() {
            for card_id in &batch {
                // Stale IDs from since-deleted cards are a no-op here
                if self.resident.remove(card_id).is_some() {
                    self.resident_count -= 1;
                }
            }
        }
        Ok(())
    }

    /// Single-card optimistic insert for the create path. Such cards are not
    /// batch-tracked and do not count toward the ceiling.
    pub fn insert(&mut self, card: Card) {
        self.resident.insert(card.id.clone(), card);
    }

    /// Synchronous local edit; persistence catches up behind the coalescer.
    pub fn update_side(&mut self, card_id: &str, side: Side, content: &str) -> bool {
        match self.resident.get_mut(card_id) {
            Some(card) => {
                card.set_side(side, content.to_string());
                true
            }
            None => false,
        }
    }

    /// Drops a card from the working set. The resident count only moves when
    /// the card was batch-tracked; stale IDs left inside old batches resolve
    /// to nothing at eviction time.
    pub fn remove(&mut self, card_id: &str) -> Option<Card> {
        let tracked = self.load_batches.iter().any(|batch| batch.iter().any(|id| id == card_id));
        let removed = self.resident.remove(card_id);
        if removed.is_some() && tracked {
            self.resident_count -= 1;
        }
        removed
    }

    /// Sign-out teardown; the working set never survives a session.
    pub fn clear(&mut self) {
        self.resident.clear();
        self.load_batches.clear();
        self.resident_count = 0;
        self.in_flight.clear();
    }
}

impl Default for WorkingSetCache {
    fn default() -> Self {
        Self::new()
    }
}
