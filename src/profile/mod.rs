//! Profile generation: calendar-aware day classification, standard load
//! profile expansion, and the parametric industrial shaper.

pub mod daytype;
pub mod industrial;
pub mod slp;

pub use daytype::{DayClass, DayKind, Season, TimeSlot, classify_day, classify_slot};
pub use industrial::{BusinessWindow, ProfileFactors};
pub use slp::SlpTable;
