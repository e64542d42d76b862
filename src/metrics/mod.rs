pub mod retrieval;
pub mod ter;
pub mod wil;
