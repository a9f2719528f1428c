use std::collections::HashMap;

use reqwest::Client;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::json;

use super::{
    RootDocument,
    SyncFacade,
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

const API_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub error: Option<String>,
}

/// HTTP implementation of the sync facade. Every operation is one POST of an
/// `{action, version, params}` envelope against a single endpoint.
pub struct RemoteStore {
    client: Client,
    endpoint: String,
}

impl RemoteStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        RemoteStore { client: Client::new(), endpoint: endpoint.into() }
    }

    async fn make_request<T: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        params: Option<serde_json::Value>,
    ) -> Result<ApiResponse<T>, FlashnoteError> {
        let mut body = serde_json::Map::new();
        body.insert("action".to_string(), serde_json::Value::String(action.to_string()));
        body.insert("version".to_string(), serde_json::Value::Number(API_VERSION.into()));
        if let Some(params) = params {
            body.insert("params".to_string(), params);
        }

        let response: ApiResponse<T> =
            self.client.post(&self.endpoint).json(&body).send().await?.json().await?;

        Ok(response)
    }

    async fn request<T: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        params: Option<serde_json::Value>,
    ) -> Result<T, FlashnoteError> {
        let response = self.make_request::<T>(action, params).await?;
        if let Some(error) = response.error {
            return Err(map_store_error(&error));
        }
        response
            .result
            .ok_or_else(|| FlashnoteError::Custom(format!("empty result for action '{action}'")))
    }

    // Actions whose only answer is an ack
    async fn request_ack(
        &self,
        action: &str,
        params: Option<serde_json::Value>,
    ) -> Result<(), FlashnoteError> {
        let response = self.make_request::<serde_json::Value>(action, params).await?;
        if let Some(error) = response.error {
            return Err(map_store_error(&error));
        }
        Ok(())
    }

    async fn fetch_card(&self, card_id: &str) -> Result<Card, FlashnoteError> {
        self.request("fetchCard", Some(json!({ "cardId": card_id }))).await
    }

    /// Checks whether the store answers at all.
    pub async fn get_version(&self) -> Result<u32, FlashnoteError> {
        self.request("version", None).await
    }
}

fn map_store_error(error: &str) -> FlashnoteError {
    let (kind, detail) = error.split_once(':').unwrap_or((error, ""));
    match kind {
        "NOT_FOUND" => FlashnoteError::NotFound(detail.to_string()),
        "WRITE_CONFLICT" => FlashnoteError::WriteConflict(detail.to_string()),
        "ALLOCATION_CONFLICT" => FlashnoteError::AllocationConflict(detail.to_string()),
        _ => FlashnoteError::Custom(error.to_string()),
    }
}

impl SyncFacade for RemoteStore {
    async fn fetch_root(&self, session_key: &str) -> Result<RootDocument, FlashnoteError> {
        self.request("fetchRoot", Some(json!({ "sessionKey": session_key }))).await
    }

    async fn fetch_folders(&self) -> Result<HashMap<FolderId, Folder>, FlashnoteError> {
        self.request("fetchFolders", None).await
    }

    async fn fetch_sheets(&self) -> Result<HashMap<SheetId, Sheet>, FlashnoteError> {
        self.request("fetchSheets", None).await
    }

    async fn fetch_cards(
        &self,
        card_ids: &[CardId],
    ) -> Result<HashMap<CardId, Card>, FlashnoteError> {
        // One request per card, in flight together
        let fetches = card_ids.iter().map(|id| self.fetch_card(id));
        let cards = futures::future::try_join_all(fetches).await?;
        Ok(cards.into_iter().map(|card| (card.id.clone(), card)).collect())
    }

    async fn write_card_side(
        &self,
        card_id: &str,
        side: Side,
        content: &str,
    ) -> Result<(), FlashnoteError> {
        self.request_ack(
            "writeCardSide",
            Some(json!({ "cardId": card_id, "side": side.as_str(), "content": content })),
        )
        .await
    }

    async fn create_card(
        &self,
        card: &Card,
        sheet_id: &str,
        next_id: &str,
    ) -> Result<CardId, FlashnoteError> {
        self.request(
            "createCard",
            Some(json!({ "card": card, "sheetId": sheet_id, "nextId": next_id })),
        )
        .await
    }

    async fn delete_card(&self, card_id: &str) -> Result<(), FlashnoteError> {
        self.request_ack("deleteCard", Some(json!({ "cardId": card_id }))).await
    }

    async fn create_sheet(
        &self,
        sheet: &Sheet,
        folder_id: &str,
    ) -> Result<SheetId, FlashnoteError> {
        self.request("createSheet", Some(json!({ "sheet": sheet, "folderId": folder_id }))).await
    }

    async fn create_folder(&self, folder: &Folder) -> Result<FolderId, FlashnoteError> {
        self.request("createFolder", Some(json!({ "folder": folder }))).await
    }

    async fn update_sheet(&self, sheet: &Sheet) -> Result<(), FlashnoteError> {
        self.request_ack("updateSheet", Some(json!({ "sheet": sheet }))).await
    }

    async fn write_sheet_order(
        &self,
        folder_id: &str,
        order: &[SheetId],
    ) -> Result<(), FlashnoteError> {
        self.request_ack(
            "writeSheetOrder",
            Some(json!({ "folderId": folder_id, "sheetOrder": order })),
        )
        .await
    }

    async fn write_folder_order(&self, order: &[FolderId]) -> Result<(), FlashnoteError> {
        self.request_ack("writeFolderOrder", Some(json!({ "folderOrder": order }))).await
    }

    async fn persist_templates(
        &self,
        templates: &HashMap<String, Template>,
    ) -> Result<(), FlashnoteError> {
        self.request_ack("persistTemplates", Some(json!({ "templates": templates }))).await
    }

    async fn persist_review_queue(&self, queue: &[Card]) -> Result<(), FlashnoteError> {
        self.request_ack("persistReviewQueue", Some(json!({ "reviewQueue": queue }))).await
    }
}
