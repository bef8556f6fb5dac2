pub mod adaptive;
pub mod conflict;
pub mod constraints;
pub mod schedule;
pub mod suggestion;
pub mod task;
