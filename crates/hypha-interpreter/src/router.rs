//! The signal router: translates an outbox or fruiting-body signal into
//! zero or more socket-buffer enqueues, or a direct delivery into a
//! fruiting body's outbox.
//!
//! This is deliberately a free function rather than an `Interpreter`
//! method: the scheduler needs to route a signal while holding a mutable
//! borrow of the agent that produced it, and a method taking `&mut self`
//! would reborrow the whole interpreter and conflict with that borrow.
//! Taking the two fields it actually touches keeps the borrows disjoint.

use indexmap::IndexMap;

use crate::runtime::{EnqueueOutcome, FruitingBody, Signal, Socket};

/// What happened when [`route_signal`] walked the socket list for one
/// signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteOutcome {
    /// At least one socket had a matching `from`/`frequency` pair. If this
    /// is `false` the signal matched nothing and is silently dropped as a
    /// routing miss.
    pub any_match: bool,
    /// At least one matching socket evicted its oldest buffered signal to
    /// make room for this one under the backpressure policy.
    pub evicted: bool,
}

/// Route one signal against every socket in insertion order. A signal may
/// be enqueued into multiple sockets if multiple match.
pub fn route_signal(
    sockets: &mut [Socket],
    fruiting_bodies: &mut IndexMap<String, FruitingBody>,
    signal: &Signal,
) -> RouteOutcome {
    let mut outcome = RouteOutcome::default();
    for socket in sockets.iter_mut() {
        if socket.from != signal.origin || socket.frequency != signal.frequency {
            continue;
        }
        outcome.any_match = true;
        if let Some(fruiting_body) = fruiting_bodies.get_mut(&socket.to) {
            // Delivery bypasses the socket buffer entirely: no FIFO, no
            // backpressure accounting against this socket.
            fruiting_body.outbox.push_back(signal.clone());
            continue;
        }
        // Unicast or broadcast: either way a single signal occupies a
        // single buffer slot. Broadcast fan-out to every current agent's
        // inbox happens at drain time during SENSE, not here.
        if socket.enqueue(signal.clone()) == EnqueueOutcome::Evicted {
            outcome.evicted = true;
            tracing::warn!(
                from = %socket.from,
                to = %socket.to,
                frequency = %socket.frequency,
                "backpressure: dropped oldest buffered signal"
            );
        }
    }
    if !outcome.any_match {
        tracing::debug!(origin = %signal.origin, frequency = %signal.frequency, "routing miss: signal matched no socket");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(origin: &str, frequency: &str) -> Signal {
        Signal { frequency: frequency.to_string(), payload: IndexMap::new(), origin: origin.to_string(), destination: None, sequence: 0 }
    }

    #[test]
    fn routes_to_single_matching_socket() {
        let mut sockets = vec![Socket::new("A".into(), "B".into(), "f".into(), 10)];
        let mut fruiting_bodies = IndexMap::new();
        let outcome = route_signal(&mut sockets, &mut fruiting_bodies, &signal("A", "f"));
        assert!(outcome.any_match);
        assert!(!outcome.evicted);
        assert_eq!(sockets[0].buffer.len(), 1);
    }

    #[test]
    fn no_match_is_a_routing_miss() {
        let mut sockets = vec![Socket::new("A".into(), "B".into(), "f".into(), 10)];
        let mut fruiting_bodies = IndexMap::new();
        let outcome = route_signal(&mut sockets, &mut fruiting_bodies, &signal("Z", "f"));
        assert!(!outcome.any_match);
        assert!(sockets[0].buffer.is_empty());
    }

    #[test]
    fn fans_out_to_every_matching_socket() {
        let mut sockets = vec![
            Socket::new("A".into(), "B".into(), "f".into(), 10),
            Socket::new("A".into(), "C".into(), "f".into(), 10),
            Socket::new("A".into(), "D".into(), "other".into(), 10),
        ];
        let mut fruiting_bodies = IndexMap::new();
        let outcome = route_signal(&mut sockets, &mut fruiting_bodies, &signal("A", "f"));
        assert!(outcome.any_match);
        assert_eq!(sockets[0].buffer.len(), 1);
        assert_eq!(sockets[1].buffer.len(), 1);
        assert!(sockets[2].buffer.is_empty());
    }

    #[test]
    fn delivery_to_fruiting_body_bypasses_socket_buffer() {
        let mut sockets = vec![Socket::new("A".into(), "output".into(), "f".into(), 10)];
        let mut fruiting_bodies = IndexMap::new();
        fruiting_bodies.insert("output".to_string(), FruitingBody::new("output".to_string()));
        let outcome = route_signal(&mut sockets, &mut fruiting_bodies, &signal("A", "f"));
        assert!(outcome.any_match);
        assert!(sockets[0].buffer.is_empty());
        assert_eq!(fruiting_bodies["output"].outbox.len(), 1);
    }

    #[test]
    fn overflow_at_route_time_is_reported_as_eviction() {
        let mut sockets = vec![Socket::new("A".into(), "B".into(), "f".into(), 1)];
        let mut fruiting_bodies = IndexMap::new();
        route_signal(&mut sockets, &mut fruiting_bodies, &signal("A", "f"));
        let outcome = route_signal(&mut sockets, &mut fruiting_bodies, &signal("A", "f"));
        assert!(outcome.evicted);
        assert_eq!(sockets[0].buffer.len(), 1);
    }
}
