//! Reference implementations of the two external collaborators: a taxi that
//! random-walks the grid and reports its position, and a rider that issues one ride
//! request per run (or per line of a requests file) and waits for a reply. These
//! satisfy the message-schema contract only; no matching or routing logic lives here.

pub mod error;
pub mod walk;

pub use error::SimError;
