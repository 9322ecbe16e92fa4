pub mod address;
pub mod cell;
pub mod edit;
pub mod observe;
pub mod preview;
pub mod sheet;

pub use cell::{Cell, StyleMap};
pub use edit::{Edit, EditError};
pub use observe::{
    Change, ChangeDetail, ChangeLog, Dispatch, Listener, NoticeQueue, Observers, RecordKind,
    RecordRef,
};
pub use preview::Preview;
pub use sheet::{Sheet, SheetSummary};
