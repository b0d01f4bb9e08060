//! API models for entities, request and response payloads

pub mod task;
pub mod user;

pub use task::{NewTask, SortDirection, Task, TaskFilter, TaskPatch, TaskSort, TaskStats};
pub use user::{TelegramProfile, User};
