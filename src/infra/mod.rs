pub mod factory;
pub mod meeting;
pub mod notify;
pub mod repositories;
