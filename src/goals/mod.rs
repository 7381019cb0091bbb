pub mod commit;
pub mod controller;

pub use commit::Transactional;
pub use controller::GoalsController;
