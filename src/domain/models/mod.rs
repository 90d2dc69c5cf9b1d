pub mod booking;
pub mod booking_box;
pub mod contact;
pub mod slot;
pub mod time_slot;
