//! The runtime graph: agents, sockets, fruiting bodies, and signals.
//! Derived from a validated AST at interpreter construction time, then
//! mutated only by the scheduler.

use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::value::Value;

/// How healthy an agent currently is, computed during REST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vitality {
    Active,
    Idle,
    Degraded,
    Failed,
}

/// A signal in flight: a frequency-typed payload moving through a socket or
/// sitting in an agent's inbox/outbox.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub frequency: String,
    pub payload: IndexMap<String, Value>,
    pub origin: String,
    pub destination: Option<String>,
    pub sequence: u64,
}

/// A runtime instance of a [`hypha_parser::ast::HyphalDef`]. Agents own
/// their state, inbox, and outbox; they hold no direct reference to any
/// other agent — all communication passes through sockets the interpreter
/// owns.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: String,
    pub template: String,
    pub state: IndexMap<String, Value>,
    pub inbox: VecDeque<Signal>,
    pub outbox: VecDeque<Signal>,
    pub vitality: Vitality,
    pub age: u64,
    pub failure_count: u32,
    /// Set by a `die` statement during ACT; retirement happens at REST.
    pub dying: bool,
    /// Last reported (metric, value) pairs this cycle: last-value only,
    /// per agent per cycle.
    pub metrics: IndexMap<String, Value>,
}

impl Agent {
    pub fn new(id: String, template: String, initial_state: IndexMap<String, Value>) -> Self {
        Agent {
            id,
            template,
            state: initial_state,
            inbox: VecDeque::new(),
            outbox: VecDeque::new(),
            vitality: Vitality::Idle,
            age: 0,
            failure_count: 0,
            dying: false,
            metrics: IndexMap::new(),
        }
    }
}

/// A unidirectional, capacity-bounded channel between two endpoints,
/// carrying exactly one frequency.
#[derive(Debug, Clone)]
pub struct Socket {
    pub from: String,
    /// `"*"` denotes broadcast.
    pub to: String,
    pub frequency: String,
    pub buffer: VecDeque<Signal>,
    pub capacity: usize,
}

impl Socket {
    pub fn new(from: String, to: String, frequency: String, capacity: usize) -> Self {
        Socket { from, to, frequency, buffer: VecDeque::new(), capacity }
    }

    pub fn is_broadcast(&self) -> bool {
        self.to == "*"
    }

    /// Enqueue `signal`, evicting the oldest element (drop-head) if the
    /// buffer is at capacity. Returns `true` if an eviction occurred.
    /// Capacity `0` disables the socket: the signal is dropped outright.
    pub fn enqueue(&mut self, signal: Signal) -> EnqueueOutcome {
        if self.capacity == 0 {
            return EnqueueOutcome::Disabled;
        }
        let evicted = if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
            true
        } else {
            false
        };
        self.buffer.push_back(signal);
        if evicted {
            EnqueueOutcome::Evicted
        } else {
            EnqueueOutcome::Enqueued
        }
    }
}

/// The result of a single socket enqueue attempt under the backpressure
/// policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Enqueued,
    /// Drop-head eviction occurred; the origin's failure counter should be
    /// incremented.
    Evicted,
    /// Capacity is zero; the signal never entered the buffer.
    Disabled,
}

/// A named external I/O endpoint: an injection point and an observation
/// point. Both injected signals and signals routed to this endpoint live
/// in `outbox` — `inbox` exists for symmetry with `Agent` but is never
/// populated by the three core subsystems.
#[derive(Debug, Clone, Default)]
pub struct FruitingBody {
    pub name: String,
    pub inbox: VecDeque<Signal>,
    pub outbox: VecDeque<Signal>,
}

impl FruitingBody {
    pub fn new(name: String) -> Self {
        FruitingBody { name, inbox: VecDeque::new(), outbox: VecDeque::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(freq: &str) -> Signal {
        Signal { frequency: freq.to_string(), payload: IndexMap::new(), origin: "A".into(), destination: None, sequence: 0 }
    }

    #[test]
    fn socket_enqueue_within_capacity() {
        let mut s = Socket::new("A".into(), "B".into(), "f".into(), 2);
        assert_eq!(s.enqueue(signal("f")), EnqueueOutcome::Enqueued);
        assert_eq!(s.enqueue(signal("f")), EnqueueOutcome::Enqueued);
        assert_eq!(s.buffer.len(), 2);
    }

    #[test]
    fn socket_enqueue_evicts_oldest_over_capacity() {
        let mut s = Socket::new("A".into(), "B".into(), "f".into(), 1);
        s.enqueue(signal("f"));
        let outcome = s.enqueue(Signal { sequence: 99, ..signal("f") });
        assert_eq!(outcome, EnqueueOutcome::Evicted);
        assert_eq!(s.buffer.len(), 1);
        assert_eq!(s.buffer[0].sequence, 99);
    }

    #[test]
    fn socket_capacity_zero_disables_enqueue() {
        let mut s = Socket::new("A".into(), "B".into(), "f".into(), 0);
        assert_eq!(s.enqueue(signal("f")), EnqueueOutcome::Disabled);
        assert!(s.buffer.is_empty());
    }

    #[test]
    fn broadcast_detection() {
        let s = Socket::new("A".into(), "*".into(), "f".into(), 10);
        assert!(s.is_broadcast());
    }
}
