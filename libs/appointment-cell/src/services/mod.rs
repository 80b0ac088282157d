pub mod booking;
pub mod conflict;
pub mod directory;
pub mod lifecycle;
pub mod locks;
pub mod slots;
pub mod store;

pub use booking::AppointmentBookingService;
pub use conflict::ConflictDetectionService;
pub use directory::{Directory, DirectorySeed, InMemoryDirectory};
pub use lifecycle::AppointmentLifecycleService;
pub use locks::{SchedulingGuard, SchedulingLocks};
pub use slots::{check_schedule, generate_slots, SlotRequest, SlotService};
pub use store::{AppointmentStore, InMemoryAppointmentStore};
