pub mod issue;
pub mod notification;
