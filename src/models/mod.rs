pub mod booking;
pub mod customer;

pub use booking::{Booking, PropertyDetails, RenterDetails};
pub use customer::{CustomerRecord, STILL_LIVING};
