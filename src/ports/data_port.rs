//! Bar source port trait.

use crate::domain::bar::Bar;
use crate::domain::error::StructbreakError;

pub trait DataPort {
    /// Bars in timestamp order, indexed 0..N-1 by position.
    fn fetch_bars(&self) -> Result<Vec<Bar>, StructbreakError>;

    /// Human-readable origin of the bars, for progress output.
    fn describe(&self) -> String;
}
