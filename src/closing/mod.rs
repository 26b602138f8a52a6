//! Period closing (clôture) and its cancellation.
//!
//! The open period moves only through these two transitions:
//!
//! ```text
//! Open(p) --close_period--> Closing(p) --commit--> Open(p.next())
//! Open(p) --cancel_last_closure--> Open(p.previous())
//! ```
//!
//! Both run their writes in a single transaction and are refused once the
//! license has expired.

mod cancel;
mod close;

use rusqlite::Connection;

use crate::error::PayrollResult;
use crate::models::PeriodState;
use crate::store::settings;

pub use cancel::{CancellationOutcome, DeletionCounts, cancel_last_closure};
pub use close::{ClosureOutcome, close_period};

/// The state of the stored period. A closing in progress is only visible
/// to the caller running it, so the store always reports `Open`.
pub fn period_state(conn: &Connection) -> PayrollResult<PeriodState> {
    Ok(PeriodState::Open(settings::load_settings(conn)?.current_period))
}
