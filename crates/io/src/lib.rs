pub mod listing;
pub mod native;

pub use listing::{MemoryStore, SheetStore, StoreError};
pub use native::{decode, decode_with, encode, get_sheet, Encode, Entity, Registry, WireError};
