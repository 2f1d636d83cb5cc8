pub mod venues;
pub mod seats;
pub mod bookings;

pub use venues::VenueRegistry;
pub use seats::SeatInventory;
pub use bookings::BookingLedger;
