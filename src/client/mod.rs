//! Device registration API client
//!
//! Pipeline per operation: resolve credentials, build a descriptor, sign it,
//! execute it, and wrap the response in an [`Outcome`].

pub mod credentials;
pub mod executor;
#[cfg(test)]
pub mod mock;
pub mod registration;
pub mod request;
pub mod signer;

pub use credentials::{
    CredentialChain, CredentialSource, Credentials, EnvironmentSource, ProfileFileSource,
};
pub use executor::{HttpExecutor, HttpResult, ReqwestExecutor};
#[cfg(test)]
pub use mock::MockExecutor;
pub use registration::{
    DeviceRegistrationClient, LogoutOutcome, Outcome, OutcomeKind, RegistrationOutcome,
};
pub use request::{HttpMethod, Operation, RequestDescriptor, SignedRequest};
pub use signer::RequestSigner;
