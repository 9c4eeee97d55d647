//! Client-side contract invocation pipeline
//!
//! Everything between "call function `f` on contract `C` with these
//! arguments" and a decoded return value: argument encoding, envelope
//! construction, the simulate → prepare → sign → send pipeline,
//! confirmation polling, and result-metadata extraction. The node itself is
//! reached through the injected [`node::NodeClient`] capability set, so the
//! core carries no transport code.
//!
//! ```no_run
//! use std::sync::Arc;
//! use txpilot::{InvokeMode, Invoker, InvokerConfig};
//! use txpilot::codec::{NativeValue, ValueType};
//! use txpilot::test_utils::MockNodeClient;
//! use txpilot::tx::Ed25519Signer;
//! use txpilot::types::Address;
//!
//! # async fn run() -> Result<(), txpilot::InvokeError> {
//! let client = Arc::new(MockNodeClient::new("Test Network ; 2024"));
//! let signer = Ed25519Signer::from_seed([1; 32])?;
//! let invoker = Invoker::new(client, InvokerConfig::default())?;
//! let _result = invoker
//!     .invoke(
//!         &signer,
//!         Address::new("CGAME1")?,
//!         "get_rank",
//!         &[(NativeValue::Str("alice".into()), ValueType::Str)],
//!         InvokeMode::SubmitAndConfirm,
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod confirm;
pub mod errors;
pub mod invoke;
pub mod meta;
pub mod node;
pub mod observability;
pub mod pipeline;
pub mod sequence;
pub mod test_utils;
pub mod tx;
pub mod txcode;
pub mod types;

pub use codec::Decoded;
pub use config::InvokerConfig;
pub use confirm::{ConfirmationOutcome, PollConfig, PollProgress, ProgressSink};
pub use errors::{BuildError, InvokeError};
pub use invoke::{InvokeMode, Invoker};
pub use node::NodeClient;
pub use observability::{init_tracing, CorrelationId};
pub use txcode::{category_for_code, decode_error};
