// Seat claim service: students claim one seat each; admins list, export and clear.

pub mod export;
pub mod model;
#[cfg(feature = "server")]
pub mod routes;
pub mod store;

pub use model::{ClaimOutcome, ClaimRejection, ClaimRequest, ClaimRow, DEFAULT_SEAT_COUNT};
pub use store::SeatDb;
