//! The interpreter: turns a validated [`hypha_parser::ast::Network`] into a
//! live runtime graph and drives it cycle by cycle.
//!
//! ```text
//! parse (hypha-parser) -> analyze (hypha-analyzer) -> Interpreter::new -> step*
//! ```

pub mod error;
pub mod eval;
mod router;
mod scheduler;
pub mod runtime;
pub mod snapshot;
pub mod value;

pub use error::InjectError;
pub use eval::EvalContext;
pub use runtime::{Agent, EnqueueOutcome, FruitingBody, Signal, Socket, Vitality};
pub use scheduler::Interpreter;
pub use snapshot::{AgentView, FruitingBodyView, Phase, RuntimeSnapshot, SocketView};
pub use value::Value;

pub use hypha_analyzer::{analyze, has_errors};
pub use hypha_parser::parse;
