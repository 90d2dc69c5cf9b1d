pub mod booking;
pub mod boxes;
pub mod health;
pub mod slot;
