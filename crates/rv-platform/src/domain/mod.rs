//! Domain Models
//!
//! Core entities of the revalidation workflow. Identities are keyed by their
//! institutional identifier (matric number or staff id), complaints by a
//! generated UUID string and courses by course code.

pub mod identity;
pub mod course;
pub mod complaint;

pub use identity::*;
pub use course::*;
pub use complaint::*;
