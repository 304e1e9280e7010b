//! [`RuntimeSnapshot`]: the concrete read-only view returned by
//! [`crate::Interpreter::step`] and [`crate::Interpreter::state`].

use hypha_common::Diagnostic;
use indexmap::IndexMap;

use crate::runtime::Vitality;
use crate::value::Value;

/// Which of the three tidal-cycle phases the interpreter is currently in,
/// or last completed a call in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Sense,
    Act,
    Rest,
}

/// Per-agent state exposed in a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentView {
    pub id: String,
    pub template: String,
    pub state: IndexMap<String, Value>,
    pub inbox_depth: usize,
    pub outbox_depth: usize,
    pub vitality: Vitality,
    pub age: u64,
    pub failure_count: u32,
}

/// Per-socket state exposed in a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketView {
    pub from: String,
    pub to: String,
    pub frequency: String,
    pub buffer_len: usize,
    pub capacity: usize,
}

/// Per-fruiting-body state exposed in a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct FruitingBodyView {
    pub name: String,
    pub inbox_depth: usize,
    pub outbox_depth: usize,
}

/// A read-only view of interpreter state at a phase boundary. Cloning this
/// never mutates or is mutated by ongoing interpreter state.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSnapshot {
    pub cycle: u64,
    pub phase: Phase,
    pub agents: Vec<AgentView>,
    pub sockets: Vec<SocketView>,
    pub fruiting_bodies: Vec<FruitingBodyView>,
    /// Per-agent last-reported (metric, value) pairs, keyed by agent id
    /// (one history-free snapshot per agent per cycle).
    pub metrics: IndexMap<String, IndexMap<String, Value>>,
    /// Signals emitted that matched no socket this cycle.
    pub routing_misses: u64,
    /// Runtime-fault diagnostics produced during the cycle(s) leading to
    /// this snapshot: every failure is data, nothing throws.
    pub diagnostics: Vec<Diagnostic>,
}
