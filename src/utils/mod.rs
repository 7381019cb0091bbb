pub mod clock;
pub mod logging;
pub mod timeout;

pub use clock::{fixed_clock, system_clock, Clock};
pub use logging::init_logging;
pub use timeout::{race, Raced};
