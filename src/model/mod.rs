pub mod issue;
pub mod notification;
pub mod task;
