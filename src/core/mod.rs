pub mod clock;
pub mod error;
pub mod types;
pub mod value;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CrmError, FieldError, Result};
pub use types::{EntityId, EntityKind};
pub use value::SortValue;
