pub mod edit_history;
pub mod employee_profile;
pub mod period;
pub mod regional_unit;
pub mod sales_record;

pub use period::{Model as Period, PeriodState};
