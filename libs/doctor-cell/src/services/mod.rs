pub mod blocks;
pub mod lookup;
pub mod schedule;
pub mod store;

pub use blocks::AvailabilityBlockService;
pub use lookup::DoctorLookup;
pub use schedule::WeeklyScheduleService;
pub use store::{BlockStore, InMemoryScheduleStore, ScheduleStore};
