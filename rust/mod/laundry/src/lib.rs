pub mod model;
pub mod rfid;
pub mod service;
pub mod store;

pub use service::backup::Backup;
pub use service::reports::{BranchCount, DailyActivity, DashboardStats};
pub use service::LaundryService;
