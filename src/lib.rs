//! Git-Transfer-Auth: credential negotiation and transfer progress reporting for outbound Git
//! transport sessions.
//!
//! Goals
//! - Decide which credential to hand to the transport for each authentication attempt, given the
//!   schemes the remote currently accepts.
//! - Never loop forever on the SSH agent fallback: it is tried at most once per session.
//! - Keep secrets read from the environment in wiped-on-drop buffers for the shortest possible time.
//! - Report object transfer progress without flooding the terminal.
//!
//! Core Capabilities
//! - Negotiation: SSH key, SSH agent, username/password, environment pair and token credentials.
//! - Secrets: `Secret` buffers with fallible allocation, zeroized on drop, redacted in `Debug`.
//! - Progress: decile-gated `Receiving objects` lines and a single final `done.` line.
//! - Driver: a transport-side retry loop over challenges with a bounded number of offers.
//! - libgit2 (feature `git2`): `git2::Cred` backend, remote callbacks and clone.
//!
//! Modules
//! - `credential`: descriptions, allowed types, environment resolution, backends, negotiator.
//! - `session`: the per-operation state shared by the callbacks.
//! - `progress`: transfer snapshots and the progress reporter.
//! - `transport`: the `Transport` trait and the authentication loop.
//! - `config`: serde-loadable transfer options.
//! - `errors`: unified error types.
//! - `remote`: libgit2 integration, behind the `git2` feature.

pub mod config;
pub mod credential;
pub mod errors;
pub mod progress;
#[cfg(feature = "git2")]
pub mod remote;
pub mod session;
pub mod transport;

pub use config::TransferConfig;
pub use credential::{
    AllowedTypes, Credential, CredentialBackend, CredentialDescription, CredentialNegotiator,
    PlainBackend, Secret,
};
pub use errors::{AuthError, ErrorKind};
pub use progress::{ProgressReporter, TransferSnapshot};
pub use session::{AuthRequest, NegotiationSession};
pub use transport::{Transport, Verdict, authenticate};
