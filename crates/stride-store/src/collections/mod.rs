//! Typed operations per collection over the document-store boundary.

pub mod chats;
pub mod columns;
pub mod notifications;
pub mod tasks;
