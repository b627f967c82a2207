pub mod media;
pub mod pagination;
