// Handler modules
pub mod list;
pub mod score;

// Re-export all handler functions
pub use list::handle_list;
pub use score::handle_score;
