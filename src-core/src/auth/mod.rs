//! Authentication Boundary
//!
//! Auth service and session persistence seams:
//! - traits: `AuthService`, `SessionStore`
//! - gotrue: hosted auth service over HTTP
//! - fragment: tokens handed back in a redirect URL fragment
//! - memory: in-process stand-ins (tests)

mod traits;
mod token;
mod gotrue;
mod fragment;
#[cfg(test)]
mod memory;

pub use traits::{AuthService, SessionStore, SignUpOutcome};
pub use token::TokenSlot;
pub use gotrue::GoTrueAuth;
pub use fragment::{parse_fragment, FragmentTokens};
#[cfg(test)]
pub use memory::{MemoryAuth, MemorySessionStore};
