pub mod config;
pub mod directory;
pub mod store;

pub use config::{Config, ConfigError};
pub use directory::{Faculty, FacultyId, RatingScores, ReviewSubmission, Score};
pub use store::{FacultyStore, RemoteStore, StoreError};

fn user_agent() -> String {
    format!("facrate/{}", env!("CARGO_PKG_VERSION"))
}
