//! Type definitions for the chat UI message stream.
//!
//! This crate is the contract between the relay endpoint and the chat client:
//! the conversation model (`Message`, `Part`, `Role`), the request body sent to
//! `/api/chat`, the incremental events streamed back, and a small SSE frame
//! parser used on both sides of the wire.
//!
//! ## Example
//!
//! ```rust
//! use folio_ui_types::{Message, Role};
//!
//! let message = Message::new_user("msg_123", "Hello, who are you?");
//!
//! assert_eq!(message.role, Role::User);
//! assert_eq!(message.text(), "Hello, who are you?");
//! ```

pub mod error;
pub mod events;
pub mod sse;
pub mod types;

pub use error::*;
pub use events::*;
pub use sse::{SseFrame, SseParser};
pub use types::*;
