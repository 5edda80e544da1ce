pub mod documents;
pub mod handlers;
pub mod pagination;
pub mod repository;
