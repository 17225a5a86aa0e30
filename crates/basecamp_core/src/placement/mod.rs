//! Building placement: reservations, legality checks and the
//! nearest-legal-tile search.

mod placer;
mod reservation;

pub use placer::BuildingPlacer;
pub use reservation::ReservationGrid;
