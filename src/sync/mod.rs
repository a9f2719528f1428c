pub mod remote;

use std::collections::HashMap;

use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    core::{
        Card,
        CardId,
        FlashnoteError,
        Folder,
        FolderId,
        Sheet,
        SheetId,
        Side,
    },
    template::Template,
};

pub use remote::RemoteStore;

/// The per-user root document: folder order, the three ID counters, templates
/// and the review queue, fetched once at sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootDocument {
    #[serde(default)]
    pub folder_order: Vec<FolderId>,
    pub next_card_id: u64,
    pub next_sheet_id: u64,
    pub next_folder_id: u64,
    #[serde(default)]
    pub templates: HashMap<String, Template>,
    #[serde(default)]
    pub review_queue: Vec<Card>,
}

/// The only boundary to the remote store. Everything above talks to the store
/// through this interface; retry and timeout policy live behind it, never in
/// the callers.
#[allow(async_fn_in_trait)]
pub trait SyncFacade {
    async fn fetch_root(&self, session_key: &str) -> Result<RootDocument, FlashnoteError>;

    async fn fetch_folders(&self) -> Result<HashMap<FolderId, Folder>, FlashnoteError>;

    async fn fetch_sheets(&self) -> Result<HashMap<SheetId, Sheet>, FlashnoteError>;

    async fn fetch_cards(
        &self,
        card_ids: &[CardId],
    ) -> Result<HashMap<CardId, Card>, FlashnoteError>;

    async fn write_card_side(
        &self,
        card_id: &str,
        side: Side,
        content: &str,
    ) -> Result<(), FlashnoteError>;

    async fn create_card(
        &self,
        card: &Card,
        sheet_id: &str,
        next_id: &str,
    ) -> Result<CardId, FlashnoteError>;

    async fn delete_card(&self, card_id: &str) -> Result<(), FlashnoteError>;

    async fn create_sheet(&self, sheet: &Sheet, folder_id: &str)
        -> Result<SheetId, FlashnoteError>;

    async fn create_folder(&self, folder: &Folder) -> Result<FolderId, FlashnoteError>;

    async fn update_sheet(&self, sheet: &Sheet) -> Result<(), FlashnoteError>;

    async fn write_sheet_order(
        &self,
        folder_id: &str,
        order: &[SheetId],
    ) -> Result<(), FlashnoteError>;

    async fn write_folder_order(&self, order: &[FolderId]) -> Result<(), FlashnoteError>;

    async fn persist_templates(
        &self,
        templates: &HashMap<String, Template>,
    ) -> Result<(), FlashnoteError>;

    /// Snapshot replace, never a merge: callers always submit the full queue.
    async fn persist_review_queue(&self, queue: &[Card]) -> Result<(), FlashnoteError>;
}

#[cfg(test)]
pub(crate) mod mock {
    use std::sync::{
        atomic::{
            AtomicU64,
            Ordering,
        },
        Mutex,
    };

    use super::*;

    /// In-memory facade for tests; records every remote call it receives.
    pub struct MockStore {
        pub root: Mutex<RootDocument>,
        pub folders: Mutex<HashMap<FolderId, Folder>>,
        pub sheets: Mutex<HashMap<SheetId, Sheet>>,
        pub cards: Mutex<HashMap<CardId, Card>>,
        pub calls: Mutex<Vec<String>>,
        next_entity_id: AtomicU64,
    }

    impl MockStore {
        pub fn new() -> Self {
            MockStore {
                root: Mutex::new(RootDocument {
                    folder_order: Vec::new(),
                    next_card_id: 1,
                    next_sheet_id: 1,
                    next_folder_id: 1,
                    templates: HashMap::new(),
                    review_queue: Vec::new(),
                }),
                folders: Mutex::new(HashMap::new()),
                sheets: Mutex::new(HashMap::new()),
                cards: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                next_entity_id: AtomicU64::new(100),
            }
        }

        pub fn with_cards(cards: Vec<Card>) -> Self {
            let store = Self::new();
            {
                let mut map = store.cards.lock().unwrap();
                for card in cards {
                    map.insert(card.id.clone(), card);
                }
            }
            store
        }

        pub fn calls_named(&self, name: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| c.starts_with(name)).count()
        }

        pub fn last_call(&self) -> Option<String> {
            self.calls.lock().unwrap().last().cloned()
        }

        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl SyncFacade for MockStore {
        async fn fetch_root(&self, _session_key: &str) -> Result<RootDocument, FlashnoteError> {
            self.log("fetchRoot".to_string());
            Ok(self.root.lock().unwrap().clone())
        }

        async fn fetch_folders(&self) -> Result<HashMap<FolderId, Folder>, FlashnoteError> {
            self.log("fetchFolders".to_string());
            Ok(self.folders.lock().unwrap().clone())
        }

        async fn fetch_sheets(&self) -> Result<HashMap<SheetId, Sheet>, FlashnoteError> {
            self.log("fetchSheets".to_string());
            Ok(self.sheets.lock().unwrap().clone())
        }

        async fn fetch_cards(
            &self,
            card_ids: &[CardId],
        ) -> Result<HashMap<CardId, Card>, FlashnoteError> {
            self.log(format!("fetchCards {:?}", card_ids));
            let cards = self.cards.lock().unwrap();
            let mut out = HashMap::new();
            for id in card_ids {
                let card =
                    cards.get(id).cloned().ok_or_else(|| FlashnoteError::NotFound(id.clone()))?;
                out.insert(id.clone(), card);
            }
            Ok(out)
        }

        async fn write_card_side(
            &self,
            card_id: &str,
            side: Side,
            content: &str,
        ) -> Result<(), FlashnoteError> {
            self.log(format!("writeCardSide {} {} {}", card_id, side, content));
            let mut cards = self.cards.lock().unwrap();
            let card = cards
                .get_mut(card_id)
                .ok_or_else(|| FlashnoteError::NotFound(card_id.to_string()))?;
            card.set_side(side, content.to_string());
            Ok(())
        }

        async fn create_card(
            &self,
            card: &Card,
            sheet_id: &str,
            next_id: &str,
        ) -> Result<CardId, FlashnoteError> {
            self.log(format!("createCard {} {}", sheet_id, next_id));
            let mut cards = self.cards.lock().unwrap();
            if cards.contains_key(next_id) {
                return Err(FlashnoteError::AllocationConflict(next_id.to_string()));
            }
            let mut stored = card.clone();
            stored.id = next_id.to_string();
            cards.insert(next_id.to_string(), stored);
            Ok(next_id.to_string())
        }

        async fn delete_card(&self, card_id: &str) -> Result<(), FlashnoteError> {
            self.log(format!("deleteCard {}", card_id));
            self.cards
                .lock()
                .unwrap()
                .remove(card_id)
                .map(|_| ())
                .ok_or_else(|| FlashnoteError::NotFound(card_id.to_string()))
        }

        async fn create_sheet(
            &self,
            sheet: &Sheet,
            folder_id: &str,
        ) -> Result<SheetId, FlashnoteError> {
            self.log(format!("createSheet {}", folder_id));
            let id = self.next_entity_id.fetch_add(1, Ordering::SeqCst).to_string();
            let mut stored = sheet.clone();
            stored.id = id.clone();
            self.sheets.lock().unwrap().insert(id.clone(), stored);
            Ok(id)
        }

        async fn create_folder(&self, folder: &Folder) -> Result<FolderId, FlashnoteError> {
            self.log("createFolder".to_string());
            let id = self.next_entity_id.fetch_add(1, Ordering::SeqCst).to_string();
            let mut stored = folder.clone();
            stored.id = id.clone();
            self.folders.lock().unwrap().insert(id.clone(), stored);
            Ok(id)
        }

        async fn update_sheet(&self, sheet: &Sheet) -> Result<(), FlashnoteError> {
            self.log(format!("updateSheet {}", sheet.id));
            self.sheets.lock().unwrap().insert(sheet.id.clone(), sheet.clone());
            Ok(())
        }

        async fn write_sheet_order(
            &self,
            folder_id: &str,
            order: &[SheetId],
        ) -> Result<(), FlashnoteError> {
            self.log(format!("writeSheetOrder {} {:?}", folder_id, order));
            Ok(())
        }

        async fn write_folder_order(&self, order: &[FolderId]) -> Result<(), FlashnoteError> {
            self.log(format!("writeFolderOrder {:?}", order));
            Ok(())
        }

        async fn persist_templates(
            &self,
            templates: &HashMap<String, Template>,
        ) -> Result<(), FlashnoteError> {
            self.log(format!("persistTemplates {}", templates.len()));
            self.root.lock().unwrap().templates = templates.clone();
            Ok(())
        }

        async fn persist_review_queue(&self, queue: &[Card]) -> Result<(), FlashnoteError> {
            self.log(format!("persistReviewQueue {}", queue.len()));
            self.root.lock().unwrap().review_queue = queue.to_vec();
            Ok(())
        }
    }
}
