pub mod availability;
pub mod directory;

pub use availability::{AvailabilityService, bookable_dates, slot_grid};
pub use directory::DirectoryService;
