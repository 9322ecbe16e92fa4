//! Change tracking for document records.
//!
//! Every entity embeds an [`Observers`] list. Setters follow one
//! contract: writing a value equal to the current one is a no-op, writing
//! a new value commits it and then notifies every registered listener.
//! Delivery goes through an injected [`Dispatch`] strategy — synchronous
//! for headless and test use, queued for interactive embedding where the
//! host drains pending notices from its own scheduler.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Callback invoked for every committed change.
pub type Listener = Rc<dyn Fn(&Change)>;

/// Which kind of record produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Sheet,
    Cell,
    Preview,
}

/// Identity of the record that changed: its kind plus its identity key
/// (sheet uid, cell key, or preview anchor key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRef {
    pub kind: RecordKind,
    pub key: String,
}

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeDetail {
    /// A named field was written with a new value.
    Field { name: &'static str },
    /// A column was resized.
    Column { column: u32, width: u32 },
    /// A row was resized.
    Row { row: u32, height: u32 },
}

/// A committed mutation, delivered to listeners after the value is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub record: RecordRef,
    pub detail: ChangeDetail,
}

impl Change {
    pub fn field(kind: RecordKind, key: &str, name: &'static str) -> Self {
        Self {
            record: RecordRef {
                kind,
                key: key.to_string(),
            },
            detail: ChangeDetail::Field { name },
        }
    }
}

/// Pending notices for queued dispatch, shared between the records that
/// push into it and the host that drains it.
#[derive(Clone, Default)]
pub struct NoticeQueue {
    pending: Rc<RefCell<VecDeque<(Listener, Change)>>>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    fn push(&self, listener: Listener, change: Change) {
        self.pending.borrow_mut().push_back((listener, change));
    }

    /// Deliver every pending notice, including notices queued by the
    /// listeners themselves while draining. Returns how many were
    /// delivered.
    pub fn drain(&self) -> usize {
        let mut delivered = 0;
        loop {
            // Drop the borrow before invoking the listener, which may
            // queue further notices.
            let next = self.pending.borrow_mut().pop_front();
            match next {
                Some((listener, change)) => {
                    listener(&change);
                    delivered += 1;
                }
                None => return delivered,
            }
        }
    }
}

impl fmt::Debug for NoticeQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoticeQueue")
            .field("pending", &self.len())
            .finish()
    }
}

/// Notification delivery strategy, injected by the embedding application.
///
/// `Direct` delivers synchronously in the mutating call; listeners must
/// not re-enter the record that notified them. `Queued` defers delivery
/// onto a [`NoticeQueue`] the host drains at zero delay; cross-record
/// ordering is unspecified.
#[derive(Debug, Clone, Default)]
pub enum Dispatch {
    #[default]
    Direct,
    Queued(NoticeQueue),
}

/// Per-record listener list plus the dispatch strategy it delivers with.
#[derive(Clone, Default)]
pub struct Observers {
    listeners: Vec<Listener>,
    dispatch: Dispatch,
}

impl Observers {
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            listeners: Vec::new(),
            dispatch,
        }
    }

    /// Register a callback for every future committed change.
    pub fn listen(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn set_dispatch(&mut self, dispatch: Dispatch) {
        self.dispatch = dispatch;
    }

    /// Dispatch a committed change to every listener.
    pub fn notify(&self, change: Change) {
        match &self.dispatch {
            Dispatch::Direct => {
                for listener in &self.listeners {
                    listener(&change);
                }
            }
            Dispatch::Queued(queue) => {
                for listener in &self.listeners {
                    queue.push(listener.clone(), change.clone());
                }
            }
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.listeners.len())
            .field("dispatch", &self.dispatch)
            .finish()
    }
}

/// Collects delivered changes. Useful for tests and headless embedding.
#[derive(Clone, Default)]
pub struct ChangeLog {
    changes: Rc<RefCell<Vec<Change>>>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener that appends every delivered change to this log.
    pub fn listener(&self) -> Listener {
        let changes = self.changes.clone();
        Rc::new(move |change: &Change| changes.borrow_mut().push(change.clone()))
    }

    pub fn len(&self) -> usize {
        self.changes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.borrow().is_empty()
    }

    /// Drain and return everything collected so far.
    pub fn take(&self) -> Vec<Change> {
        std::mem::take(&mut *self.changes.borrow_mut())
    }

    /// Field names of the collected changes, in delivery order.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.changes
            .borrow()
            .iter()
            .filter_map(|c| match c.detail {
                ChangeDetail::Field { name } => Some(name),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Debug for ChangeLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeLog")
            .field("changes", &self.changes.borrow())
            .finish()
    }
}
