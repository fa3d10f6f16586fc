//! Session shell - conversation state and transcript per client.

mod registry;
#[allow(clippy::module_inception)]
mod session;

pub use registry::{SessionHandle, SessionRegistry};
pub use session::{Exchange, Session};
