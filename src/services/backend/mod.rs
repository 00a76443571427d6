pub mod http;

use async_trait::async_trait;

use crate::models::Booking;

/// The marketplace backend that owns all booking state. This service only
/// reads snapshots and requests lifecycle transitions; it never mutates
/// bookings locally.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    /// Rental bookings the renter still occupies: status confirmed or
    /// completed, no check-out recorded.
    async fn fetch_active(&self) -> anyhow::Result<Vec<Booking>>;

    /// Rental bookings with a recorded check-out, minus anything the owner
    /// has hidden.
    async fn fetch_history(&self) -> anyhow::Result<Vec<Booking>>;

    /// Ask the backend to stamp `checked_out_at` on the booking.
    async fn check_out(&self, booking_id: i64) -> anyhow::Result<()>;

    /// Ask the backend to drop the booking from this owner's future history
    /// queries. Does not delete the booking itself.
    async fn hide_from_owner(&self, booking_id: i64) -> anyhow::Result<()>;
}
