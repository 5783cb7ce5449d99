pub mod cache;
pub mod health;
pub mod translate;

pub use cache::{add_cache_handler, list_cache_handler};
pub use health::{health_handler, ready_handler};
pub use translate::translate_handler;
