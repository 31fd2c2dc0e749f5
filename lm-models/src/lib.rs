//! LawMatics Models - data-transfer shapes for the REST API.
//!
//! Every type here is a plain serde struct matching the wire format:
//! snake_case field names, optional fields omitted when `None`.
//! Entity types (`Contact`, `Matter`, ...) are what the API returns;
//! `*Input` types are what create/update calls send.

pub mod models;

// Re-export key types
pub use models::billing::{
    Expense, ExpenseInput, Payment, PaymentInput, PaymentStatus, TimeEntry, TimeEntryInput,
};
pub use models::contact::{
    Address, AddressInput, Contact, ContactInput, CustomContactType, CustomContactTypeInput,
    EmailAddress, EmailAddressInput,
};
pub use models::event::{Event, EventInput, EventLocation, EventType};
pub use models::file::FileRecord;
pub use models::matter::{Matter, MatterInput, MatterStatus, MatterSubStatus};
pub use models::note::{Note, NoteInput};
pub use models::task::{Subtask, Task, TaskInput, TaskStatus};
pub use models::EntityId;
