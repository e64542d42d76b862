pub mod edit_distance;
pub mod shift;
pub mod tokenization;
