pub mod core;
pub mod editor;
pub mod persistence;
pub mod session;
pub mod store;
pub mod sync;
pub mod template;

pub use crate::core::{ Card, FlashnoteError, Folder, Sheet, Side };
pub use session::SessionStore;
pub use sync::{ RemoteStore, SyncFacade };
pub use template::Template;
