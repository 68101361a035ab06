//! Client side of PayLens: a typed HTTP client for the proxy's `/api` surface
//! and the law/rule collection managers that keep a local copy of each
//! collection in step with the backend.

mod api;
mod error;
pub mod laws;
pub mod rules;

#[cfg(feature = "http")]
pub mod http;

pub use api::{Confirm, LawApi, Outcome, RuleApi};
pub use error::ClientError;
pub use laws::{EditBuffer, LawManager, banner};
pub use rules::{RuleForm, RuleManager, RuleSamples};

#[cfg(feature = "http")]
pub use http::{BackendClient, Export};
