//! Client side of the on-call lookup assistant.
//!
//! [`ConversationController`] owns the transcript and decides, per message,
//! whether to answer locally or ask the backend. [`UpdateProgressPoller`]
//! drives a backend reindex. Both talk to the backend through the
//! [`DutyBackend`] trait; [`HttpBackend`] is the reqwest implementation.

pub mod backend;
pub mod client_info;
pub mod conversation;
pub mod departments;
pub mod error;
pub mod http;
pub mod poller;

pub use backend::{ChatAnswer, ChatRequest, DepartmentsResponse, DutyBackend, UpdateStartResponse};
pub use client_info::ClientInfo;
pub use conversation::{ConversationController, ConversationState, SendOutcome};
pub use departments::{
    load_departments, load_with_watchdog, DirectoryLoad, DirectorySource, DEFAULT_WATCHDOG,
};
pub use error::{ClientError, Result};
pub use http::{HttpBackend, CLIENT_INFO_HEADER, SESSION_HEADER};
pub use poller::{PollerSettings, PollerSnapshot, StartOutcome, UpdateProgressPoller};
