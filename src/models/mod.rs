pub mod venue;
pub mod seat;
pub mod booking;

pub use venue::{NewVenue, Venue, VenueChanges};
pub use seat::{NewSeat, Seat, SeatChanges, SeatReplacement, SeatStatus, SeatType};
pub use booking::{Booking, BookingDetails, NewBooking};
