pub mod message;
pub mod department;
pub mod progress;

pub use message::{Message, MessageId, Sender};
pub use department::DepartmentDirectory;
pub use progress::{UpdateProgress, UpdateStatus};
