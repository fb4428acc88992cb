pub mod date;
pub mod performance;
pub mod report;
pub mod series;
pub mod symbol;

pub use date::*;
pub use performance::*;
pub use report::*;
pub use series::*;
pub use symbol::*;
