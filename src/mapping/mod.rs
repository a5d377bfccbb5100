pub mod channels;
pub mod developers;
pub mod priority;
pub mod projects;
