//! Interactive terminal UI for searching and rating faculty

pub mod app;
pub mod rating;
pub mod search;
pub mod session;
pub mod ui;

pub use app::run;
pub use session::{SUBMITTED_NOTICE, Session};
