//! Crate-internal prelude.
//!
//! Re-exports the derive macros from derive_more and the chrono calendar
//! traits that nearly every module reaches for.

#[allow(unused_imports)]
pub use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
#[allow(unused_imports)]
pub use derive_more::{Deref, Display};
