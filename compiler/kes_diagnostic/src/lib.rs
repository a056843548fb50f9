//! Diagnostic system for the Kestrel front end.
//!
//! Every phase reports user-facing problems as [`Diagnostic`] values:
//! - Error codes for searchability
//! - Clear messages (what went wrong)
//! - Primary span and file (where it went wrong)
//! - The originating node, so later passes can map a problem back to the
//!   module path or module that caused it
//!
//! Local failures never abort a run; diagnostics accumulate in a
//! [`DiagnosticBag`] in the order they were found.

mod bag;
mod diagnostic;
mod error_code;

pub use bag::DiagnosticBag;
pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
