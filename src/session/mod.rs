use std::{
    collections::HashMap,
    time::Instant,
};

use crate::{
    core::{
        Card,
        CardId,
        FlashnoteError,
        Folder,
        FolderId,
        IdKind,
        Sheet,
        SheetId,
        Side,
    },
    editor::EditCoalescer,
    store::{
        OrderedIndex,
        WorkingSetCache,
    },
    sync::SyncFacade,
    template::Template,
};

/// Session-scoped store for one signed-in user: folder and sheet maps, the
/// ordered-list index, the working-set cache, the edit coalescer, templates
/// and the review queue. Built empty at sign-in via `init`, torn down at
/// sign-out via `teardown`; nothing here survives a session.
pub struct SessionStore {
    folders: HashMap<FolderId, Folder>,
    sheets: HashMap<SheetId, Sheet>,
    index: OrderedIndex,
    cache: WorkingSetCache,
    coalescer: EditCoalescer,
    templates: HashMap<String, Template>,
    review_queue: Vec<Card>,
    active_sheet: Option<SheetId>,
}

impl SessionStore {
    pub async fn init<S: SyncFacade>(
        sync: &S,
        session_key: &str,
    ) -> Result<Self, FlashnoteError> {
        let root = sync.fetch_root(session_key).await?;
        let folders = sync.fetch_folders().await?;
        let sheets = sync.fetch_sheets().await?;
        println!("Session loaded: {} folders, {} sheets", folders.len(), sheets.len());

        let mut index = OrderedIndex::seed(
            root.folder_order,
            root.next_folder_id,
            root.next_sheet_id,
            root.next_card_id,
        );
        for (id, folder) in &folders {
            index.register_folder_sheets(id, folder.sheet_order.clone());
        }
        for (id, sheet) in &sheets {
            index.register_sheet_cards(id, sheet.card_order.clone());
        }

        Ok(SessionStore {
            folders,
            sheets,
            index,
            cache: WorkingSetCache::new(),
            coalescer: EditCoalescer::new(),
            templates: root.templates,
            review_queue: root.review_queue,
            active_sheet: None,
        })
    }

    pub fn teardown(&mut self) {
        self.folders.clear();
        self.sheets.clear();
        self.index.clear();
        self.cache.clear();
        self.coalescer.clear();
        self.templates.clear();
        self.review_queue.clear();
        self.active_sheet = None;
    }

    pub fn folder(&self, folder_id: &str) -> Option<&Folder> {
        self.folders.get(folder_id)
    }

    pub fn sheet(&self, sheet_id: &str) -> Option<&Sheet> {
        self.sheets.get(sheet_id)
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cache.get(card_id)
    }

    pub fn index(&self) -> &OrderedIndex {
        &self.index
    }

    pub fn cache(&self) -> &WorkingSetCache {
        &self.cache
    }

    pub fn templates(&self) -> &HashMap<String, Template> {
        &self.templates
    }

    pub fn review_queue(&self) -> &[Card] {
        &self.review_queue
    }

    pub fn active_sheet(&self) -> Option<&SheetId> {
        self.active_sheet.as_ref()
    }

    /// Makes `sheet_id` the viewed sheet, lazily loading its cards. A fetch
    /// that completes after the sheet was deleted still merges into the cache
    /// but must not mark the stale sheet active.
    pub async fn activate_sheet<S: SyncFacade>(
        &mut self,
        sheet_id: &str,
        sync: &S,
    ) -> Result<(), FlashnoteError> {
        let sheet = self
            .sheets
            .get(sheet_id)
            .cloned()
            .ok_or_else(|| FlashnoteError::NotFound(sheet_id.to_string()))?;

        self.cache.activate_sheet(&sheet, sync).await?;

        // Re-validate after the await: the sheet may be gone by now
        if self.sheets.contains_key(sheet_id) {
            self.active_sheet = Some(sheet_id.to_string());
        }
        Ok(())
    }

    /// Creates a card on `sheet_id` with a locally minted ID, appends it to
    /// the sheet's cardOrder and the review queue, and persists the full queue
    /// snapshot.
    pub async fn create_card<S: SyncFacade>(
        &mut self,
        front: &str,
        back: &str,
        sheet_id: &str,
        sync: &S,
    ) -> Result<CardId, FlashnoteError> {
        let folder_id = self
            .sheets
            .get(sheet_id)
            .map(|sheet| sheet.folder_id.clone())
            .ok_or_else(|| FlashnoteError::NotFound(sheet_id.to_string()))?;

        let next_id = self.index.next_id(IdKind::Card);
        let card = Card::new(
            next_id.clone(),
            front.to_string(),
            back.to_string(),
            sheet_id.to_string(),
            folder_id,
        );

        let new_id = sync.create_card(&card, sheet_id, &next_id).await?;
        self.index.observe_id(IdKind::Card, &new_id);

        let mut card = card;
        card.id = new_id.clone();
        self.cache.insert(card.clone());
        self.index.insert_card(sheet_id, &new_id);
        if let Some(sheet) = self.sheets.get_mut(sheet_id) {
            if !sheet.card_order.contains(&new_id) {
                sheet.card_order.push(new_id.clone());
            }
        }

        // New cards enter the review queue; the store only takes full snapshots
        self.review_queue.push(card);
        sync.persist_review_queue(&self.review_queue).await?;

        Ok(new_id)
    }

    /// Creates a card by filling the named template with `values`.
    pub async fn create_card_from_template<S: SyncFacade>(
        &mut self,
        template_name: &str,
        field_values: &[String],
        sheet_id: &str,
        sync: &S,
    ) -> Result<CardId, FlashnoteError> {
        let template = self
            .templates
            .get(template_name)
            .ok_or_else(|| FlashnoteError::NotFound(template_name.to_string()))?;
        let (front, back) = template.fill(field_values)?;
        self.create_card(&front, &back, sheet_id, sync).await
    }

    /// Deletes a card everywhere it is named: working set, its sheet's
    /// cardOrder, the index and the review queue. Stale copies of the ID left
    /// inside old load batches are tolerated and resolve to nothing at
    /// eviction time. Local state changes first; the remote delete follows.
    pub async fn delete_card<S: SyncFacade>(
        &mut self,
        card_id: &str,
        sync: &S,
    ) -> Result<(), FlashnoteError> {
        let sheet_id = self.index.sheet_of_card(card_id).cloned();

        self.cache.remove(card_id);
        if let Some(sheet_id) = &sheet_id {
            self.index.remove_card(sheet_id, card_id);
            if let Some(sheet) = self.sheets.get_mut(sheet_id) {
                sheet.card_order.retain(|id| id != card_id);
            }
        }

        sync.delete_card(card_id).await?;

        let before = self.review_queue.len();
        self.review_queue.retain(|card| card.id != card_id);
        if self.review_queue.len() != before {
            sync.persist_review_queue(&self.review_queue).await?;
        }
        Ok(())
    }

    pub async fn create_sheet<S: SyncFacade>(
        &mut self,
        name: &str,
        icon_color: &str,
        folder_id: &str,
        sync: &S,
    ) -> Result<SheetId, FlashnoteError> {
        if !self.folders.contains_key(folder_id) {
            return Err(FlashnoteError::NotFound(folder_id.to_string()));
        }

        let sheet = Sheet {
            id: String::new(), // assigned by the store
            name: name.to_string(),
            icon_color: icon_color.to_string(),
            folder_id: folder_id.to_string(),
            card_order: Vec::new(),
            layout: None,
        };
        let new_id = sync.create_sheet(&sheet, folder_id).await?;
        self.index.observe_id(IdKind::Sheet, &new_id);

        let mut sheet = sheet;
        sheet.id = new_id.clone();
        self.index.insert_sheet(folder_id, &new_id);
        if let Some(folder) = self.folders.get_mut(folder_id) {
            if !folder.sheet_order.contains(&new_id) {
                folder.sheet_order.push(new_id.clone());
            }
        }
        self.sheets.insert(new_id.clone(), sheet);
        Ok(new_id)
    }

    pub async fn create_folder<S: SyncFacade>(
        &mut self,
        name: &str,
        icon_color: &str,
        sync: &S,
    ) -> Result<FolderId, FlashnoteError> {
        let folder = Folder {
            id: String::new(),
            name: name.to_string(),
            icon_color: icon_color.to_string(),
            sheet_order: Vec::new(),
            total_cards: 0,
            cards_due: 0,
        };
        let new_id = sync.create_folder(&folder).await?;
        self.index.observe_id(IdKind::Folder, &new_id);

        let mut folder = folder;
        folder.id = new_id.clone();
        self.index.insert_folder(&new_id);
        self.folders.insert(new_id.clone(), folder);
        Ok(new_id)
    }

    /// Replaces a folder's sheet order after validating the new list is a
    /// permutation of the current membership.
    pub async fn reorder_sheets<S: SyncFacade>(
        &mut self,
        folder_id: &str,
        new_order: Vec<SheetId>,
        sync: &S,
    ) -> Result<(), FlashnoteError> {
        self.index.reorder_sheets(folder_id, new_order.clone())?;
        if let Some(folder) = self.folders.get_mut(folder_id) {
            folder.sheet_order = new_order.clone();
        }
        sync.write_sheet_order(folder_id, &new_order).await
    }

    pub async fn reorder_folders<S: SyncFacade>(
        &mut self,
        new_order: Vec<FolderId>,
        sync: &S,
    ) -> Result<(), FlashnoteError> {
        self.index.reorder_folders(new_order.clone())?;
        sync.write_folder_order(&new_order).await
    }

    pub async fn reorder_cards<S: SyncFacade>(
        &mut self,
        sheet_id: &str,
        new_order: Vec<CardId>,
        sync: &S,
    ) -> Result<(), FlashnoteError> {
        self.index.reorder_cards(sheet_id, new_order.clone())?;
        let sheet = match self.sheets.get_mut(sheet_id) {
            Some(sheet) => {
                sheet.card_order = new_order;
                sheet.clone()
            }
            None => return Err(FlashnoteError::NotFound(sheet_id.to_string())),
        };
        sync.update_sheet(&sheet).await
    }

    pub async fn set_layout<S: SyncFacade>(
        &mut self,
        sheet_id: &str,
        layout: &str,
        sync: &S,
    ) -> Result<(), FlashnoteError> {
        let sheet = match self.sheets.get_mut(sheet_id) {
            Some(sheet) => {
                sheet.layout = Some(layout.to_string());
                sheet.clone()
            }
            None => return Err(FlashnoteError::NotFound(sheet_id.to_string())),
        };
        sync.update_sheet(&sheet).await
    }

    /// Called on every keystroke. Local card state updates synchronously; the
    /// remote write happens immediately on a final edit or a burst, otherwise
    /// once the debounce window closes (see `flush_due`). A failed write does
    /// not roll the local edit back.
    pub async fn edit_card<S: SyncFacade>(
        &mut self,
        card_id: &str,
        side: Side,
        content: &str,
        is_final: bool,
        now: Instant,
        sync: &S,
    ) -> Result<(), FlashnoteError> {
        if !self.cache.update_side(card_id, side, content) {
            return Err(FlashnoteError::NotFound(card_id.to_string()));
        }
        if let Some(flush) = self.coalescer.on_edit(card_id, side, content, is_final, now) {
            sync.write_card_side(&flush.card_id, flush.side, &flush.content).await?;
        }
        Ok(())
    }

    /// Persists every pending edit whose debounce window has elapsed. Meant to
    /// run once per UI frame. One failed write does not hold back the other
    /// keys; the first error is surfaced after the pass.
    pub async fn flush_due<S: SyncFacade>(
        &mut self,
        now: Instant,
        sync: &S,
    ) -> Result<(), FlashnoteError> {
        let mut first_err = None;
        for flush in self.coalescer.poll_due(now) {
            if let Err(e) = sync.write_card_side(&flush.card_id, flush.side, &flush.content).await {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Parses and stores a new template, persisting the merged map. A
    /// malformed side fails validation and no template is created.
    pub async fn create_template<S: SyncFacade>(
        &mut self,
        name: &str,
        front: &str,
        back: &str,
        sync: &S,
    ) -> Result<(), FlashnoteError> {
        let template = Template::new(front.to_string(), back.to_string())?;
        self.templates.insert(name.to_string(), template);
        sync.persist_templates(&self.templates).await
    }

    /// Replaces the review queue and persists the full snapshot.
    pub async fn set_review_queue<S: SyncFacade>(
        &mut self,
        queue: Vec<Card>,
        sync: &S,
    ) -> Result<(), FlashnoteError> {
        self.review_queue = queue;
        sync.persist_review_queue(&self.review_queue).await
    }
}
