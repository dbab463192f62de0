pub mod extractors;
pub mod provider;
pub mod registry;
pub mod store;

pub use extractors::{ClientSession, CurrentSession, MaybeSession};
pub use provider::{AuthProvider, GoTrueClient};
pub use registry::SessionRegistry;
pub use store::{SessionSnapshot, SessionStatus, SessionStore};
