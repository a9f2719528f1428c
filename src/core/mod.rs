pub mod errors;
pub mod models;

pub use errors::FlashnoteError;
pub use models::{ Card, CardId, Folder, FolderId, IdKind, Sheet, SheetId, Side };
