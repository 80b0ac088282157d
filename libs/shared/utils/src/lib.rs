pub mod clock;
pub mod extractor;
pub mod test_utils;

pub use clock::{Clock, MockClock, SystemClock};
pub use extractor::{OrganizationContext, ORGANIZATION_HEADER};
