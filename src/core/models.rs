use std::fmt;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

pub type FolderId = String;
pub type SheetId = String;
pub type CardId = String;

/// Which counter an ID is minted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Folder,
    Sheet,
    Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Front,
    Back,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Front => "front",
            Side::Back => "back",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub icon_color: String,
    #[serde(default)]
    pub sheet_order: Vec<SheetId>, // authoritative membership + order of this folder's sheets
    #[serde(default)]
    pub total_cards: u32,
    #[serde(default)]
    pub cards_due: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub id: SheetId,
    pub name: String,
    pub icon_color: String,
    pub folder_id: FolderId,
    #[serde(default)]
    pub card_order: Vec<CardId>, // authoritative membership + order of this sheet's cards
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub front: String,
    pub back: String,
    // Denormalized back-references; must agree with the owning sheet's cardOrder
    pub sheet_id: SheetId,
    pub folder_id: FolderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_review: Option<DateTime<Utc>>,
    // FSRS scheduling state, stored under the store's short field names
    #[serde(rename = "s", skip_serializing_if = "Option::is_none")]
    pub stability: Option<f32>,
    #[serde(rename = "d", skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<f32>,
}

impl Card {
    pub fn new(id: CardId, front: String, back: String, sheet_id: SheetId, folder_id: FolderId) -> Self {
        Card {
            id,
            front,
            back,
            sheet_id,
            folder_id,
            review_date: None,
            last_review: None,
            stability: None,
            difficulty: None,
        }
    }

    pub fn side(&self, side: Side) -> &str {
        match side {
            Side::Front => &self.front,
            Side::Back => &self.back,
        }
    }

    pub fn set_side(&mut self, side: Side, content: String) {
        match side {
            Side::Front => self.front = content,
            Side::Back => self.back = content,
        }
    }
}
