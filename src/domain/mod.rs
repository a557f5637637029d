pub mod de;
pub mod dedup;
pub mod models;

pub use models::*;
