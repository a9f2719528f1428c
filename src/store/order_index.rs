use std::collections::HashMap;

use crate::core::{
    CardId,
    FlashnoteError,
    FolderId,
    IdKind,
    SheetId,
};

/// The three ordered ID lists (folders, sheets per folder, cards per sheet) and
/// the monotonic ID allocators. This is the immediate source of truth for
/// membership and order; durability is the sync layer's job.
pub struct OrderedIndex {
    folder_order: Vec<FolderId>,
    sheet_orders: HashMap<FolderId, Vec<SheetId>>,
    card_orders: HashMap<SheetId, Vec<CardId>>,
    next_folder_id: u64,
    next_sheet_id: u64,
    next_card_id: u64,
}

impl OrderedIndex {
    pub fn new() -> Self {
        Self::seed(Vec::new(), 1, 1, 1)
    }

    /// Counters and the folder order come from the root document at sign-in.
    pub fn seed(
        folder_order: Vec<FolderId>,
        next_folder_id: u64,
        next_sheet_id: u64,
        next_card_id: u64,
    ) -> Self {
        OrderedIndex {
            folder_order,
            sheet_orders: HashMap::new(),
            card_orders: HashMap::new(),
            next_folder_id,
            next_sheet_id,
            next_card_id,
        }
    }

    pub fn register_folder_sheets(&mut self, folder_id: &str, order: Vec<SheetId>) {
        self.sheet_orders.insert(folder_id.to_string(), order);
    }

    pub fn register_sheet_cards(&mut self, sheet_id: &str, order: Vec<CardId>) {
        self.card_orders.insert(sheet_id.to_string(), order);
    }

    pub fn folder_order(&self) -> &[FolderId] {
        &self.folder_order
    }

    pub fn sheet_order(&self, folder_id: &str) -> &[SheetId] {
        self.sheet_orders.get(folder_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn card_order(&self, sheet_id: &str) -> &[CardId] {
        self.card_orders.get(sheet_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Which sheet's cardOrder names this card, if any (I1: at most one does).
    pub fn sheet_of_card(&self, card_id: &str) -> Option<&SheetId> {
        self.card_orders
            .iter()
            .find(|(_, order)| order.iter().any(|id| id == card_id))
            .map(|(sheet_id, _)| sheet_id)
    }

    pub fn insert_folder(&mut self, folder_id: &str) {
        append_once(&mut self.folder_order, folder_id);
    }

    pub fn insert_sheet(&mut self, folder_id: &str, sheet_id: &str) {
        append_once(self.sheet_orders.entry(folder_id.to_string()).or_default(), sheet_id);
    }

    pub fn insert_card(&mut self, sheet_id: &str, card_id: &str) {
        append_once(self.card_orders.entry(sheet_id.to_string()).or_default(), card_id);
    }

    pub fn remove_folder(&mut self, folder_id: &str) {
        self.folder_order.retain(|id| id != folder_id);
        self.sheet_orders.remove(folder_id);
    }

    pub fn remove_sheet(&mut self, folder_id: &str, sheet_id: &str) {
        if let Some(order) = self.sheet_orders.get_mut(folder_id) {
            order.retain(|id| id != sheet_id);
        }
        self.card_orders.remove(sheet_id);
    }

    pub fn remove_card(&mut self, sheet_id: &str, card_id: &str) {
        if let Some(order) = self.card_orders.get_mut(sheet_id) {
            order.retain(|id| id != card_id);
        }
    }

    pub fn reorder_folders(&mut self, new_order: Vec<FolderId>) -> Result<(), FlashnoteError> {
        apply_reorder("folderOrder", &mut self.folder_order, new_order)
    }

    pub fn reorder_sheets(
        &mut self,
        folder_id: &str,
        new_order: Vec<SheetId>,
    ) -> Result<(), FlashnoteError> {
        let current = self.sheet_orders.entry(folder_id.to_string()).or_default();
        apply_reorder(folder_id, current, new_order)
    }

    pub fn reorder_cards(
        &mut self,
        sheet_id: &str,
        new_order: Vec<CardId>,
    ) -> Result<(), FlashnoteError> {
        let current = self.card_orders.entry(sheet_id.to_string()).or_default();
        apply_reorder(sheet_id, current, new_order)
    }

    /// Returns the next ID for `kind` as its string form and advances the
    /// counter. Every minted ID is strictly greater than any previously issued
    /// ID of that kind.
    pub fn next_id(&mut self, kind: IdKind) -> String {
        let counter = self.counter_mut(kind);
        let id = counter.to_string();
        *counter += 1;
        id
    }

    pub fn peek_next(&self, kind: IdKind) -> u64 {
        match kind {
            IdKind::Folder => self.next_folder_id,
            IdKind::Sheet => self.next_sheet_id,
            IdKind::Card => self.next_card_id,
        }
    }

    /// Rides a counter over a server-assigned ID so that locally minted IDs
    /// stay strictly ahead of it. Counters never move backwards.
    pub fn observe_id(&mut self, kind: IdKind, id: &str) {
        if let Ok(numeric) = id.parse::<u64>() {
            let counter = self.counter_mut(kind);
            *counter = (*counter).max(numeric + 1);
        }
    }

    pub fn clear(&mut self) {
        self.folder_order.clear();
        self.sheet_orders.clear();
        self.card_orders.clear();
    }

    fn counter_mut(&mut self, kind: IdKind) -> &mut u64 {
        match kind {
            IdKind::Folder => &mut self.next_folder_id,
            IdKind::Sheet => &mut self.next_sheet_id,
            IdKind::Card => &mut self.next_card_id,
        }
    }
}

impl Default for OrderedIndex {
    fn default() -> Self {
        Self::new()
    }
}

// arrayUnion semantics: appending an ID that is already present is a no-op.
fn append_once(order: &mut Vec<String>, id: &str) {
    if !order.iter().any(|existing| existing == id) {
        order.push(id.to_string());
    }
}

fn apply_reorder(
    parent: &str,
    current: &mut Vec<String>,
    new_order: Vec<String>,
) -> Result<(), FlashnoteError> {
    let mut have = current.clone();
    let mut want = new_order.clone();
    have.sort();
    want.sort();
    if have != want {
        return Err(FlashnoteError::InvalidOrder { parent: parent.to_string() });
    }
    *current = new_order;
    Ok(())
}
