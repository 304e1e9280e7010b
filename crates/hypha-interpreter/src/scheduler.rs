//! The cycle-based scheduler: builds a runtime graph from a validated
//! [`Network`] and drives it through the SENSE → ACT → REST tidal cycle.
//! Owns expression evaluation (via [`crate::eval`]) and signal routing
//! (via [`crate::router`]) as the two collaborators a cycle calls into;
//! this module is the thing that decides *when* they run.

use std::collections::VecDeque;

use hypha_analyzer::analyze;
use hypha_common::{Clock, Diagnostic, SourceLocation, SystemClock};
use hypha_parser::ast::{HyphalDef, Network, PrimitiveKind, Statement, Trigger, TypeRef};
use indexmap::IndexMap;

use crate::error::InjectError;
use crate::eval::{evaluate, EvalContext};
use crate::router::route_signal;
use crate::runtime::{Agent, FruitingBody, Signal, Socket, Vitality};
use crate::snapshot::{AgentView, FruitingBodyView, Phase, RuntimeSnapshot, SocketView};
use crate::value::Value;

/// A live interpreter: the runtime graph plus everything a cycle needs to
/// drive it via `new_interpreter`/`step`/`state`/`inject`.
pub struct Interpreter {
    network: Network,
    templates: IndexMap<String, HyphalDef>,
    agents: IndexMap<String, Agent>,
    sockets: Vec<Socket>,
    fruiting_bodies: IndexMap<String, FruitingBody>,
    cycle: u64,
    phase: Phase,
    next_sequence: u64,
    pending_spawns: VecDeque<(String, String)>,
    /// Whether each agent saw inbox or outbox traffic during the ACT phase
    /// just completed; consumed by `rest` when computing vitality.
    cycle_traffic: IndexMap<String, bool>,
    /// Persists across cycles: the last value reported for each
    /// (agent, metric) pair. Last-value-per-cycle is kept, but metrics not
    /// re-reported this cycle retain their prior value.
    metrics: IndexMap<String, IndexMap<String, Value>>,
    clock: Box<dyn Clock>,
}

impl Interpreter {
    /// Build a runtime graph from a `Network` that has already been
    /// analyzed with zero [`hypha_common::Severity::Error`] diagnostics.
    /// Uses the system wall clock for the `now()` builtin.
    pub fn new(network: Network) -> Self {
        Self::with_clock(network, Box::new(SystemClock))
    }

    /// As [`Interpreter::new`], but with an injected clock — the seam
    /// tests use to assert on fixed `now()` values instead of wall-clock
    /// noise (see [`hypha_common::Clock`]).
    pub fn with_clock(network: Network, clock: Box<dyn Clock>) -> Self {
        let templates: IndexMap<String, HyphalDef> =
            network.hyphae.iter().map(|h| (h.name.clone(), h.clone())).collect();

        let mut agents = IndexMap::new();
        let mut sockets = Vec::new();
        let mut fruiting_bodies = IndexMap::new();

        if let Some(topology) = &network.topology {
            for name in &topology.fruiting_bodies {
                fruiting_bodies.insert(name.clone(), FruitingBody::new(name.clone()));
            }
            for spawn in &topology.spawns {
                if let Some(template) = templates.get(&spawn.template) {
                    let mut scratch = Vec::new();
                    let state = initial_state(template, clock.as_ref(), &mut scratch);
                    agents.insert(spawn.instance.clone(), Agent::new(spawn.instance.clone(), spawn.template.clone(), state));
                }
            }
            for socket in &topology.sockets {
                sockets.push(Socket::new(
                    socket.from.clone(),
                    socket.to.clone(),
                    socket.frequency.clone(),
                    network.config.max_buffer_size,
                ));
            }
        }

        Interpreter {
            network,
            templates,
            agents,
            sockets,
            fruiting_bodies,
            cycle: 0,
            phase: Phase::Rest,
            next_sequence: 0,
            pending_spawns: VecDeque::new(),
            cycle_traffic: IndexMap::new(),
            metrics: IndexMap::new(),
            clock,
        }
    }

    /// Re-run the five-phase analyzer sweep against the network this
    /// interpreter was built from. `analyze` is idempotent.
    pub fn reanalyze(&self) -> Vec<Diagnostic> {
        analyze(&self.network)
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Append `signal` to a fruiting body's outbox, to be routed into its
    /// sockets on a future SENSE. The signal's origin and sequence number
    /// are stamped by the interpreter, not the caller: origin must name
    /// `fruiting_body` for the router to match it against a socket, and
    /// sequence numbers are assigned from this interpreter's own counter.
    pub fn inject(&mut self, fruiting_body: &str, signal: Signal) -> Result<(), InjectError> {
        let body = self
            .fruiting_bodies
            .get_mut(fruiting_body)
            .ok_or_else(|| InjectError::UnknownFruitingBody(fruiting_body.to_string()))?;
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        body.outbox.push_back(Signal {
            frequency: signal.frequency,
            payload: signal.payload,
            origin: fruiting_body.to_string(),
            destination: None,
            sequence,
        });
        Ok(())
    }

    /// Execute exactly one tidal cycle: SENSE, then ACT, then REST (spec
    /// §4.6). Returns a read-only snapshot of the state reached.
    pub fn step(&mut self) -> RuntimeSnapshot {
        let mut diagnostics = Vec::new();
        let mut routing_misses = 0u64;

        self.cycle += 1;
        tracing::debug!(cycle = self.cycle, "beginning tidal cycle");

        self.phase = Phase::Sense;
        tracing::debug!(cycle = self.cycle, phase = ?self.phase, "phase transition");
        self.sense(&mut diagnostics, &mut routing_misses);

        self.phase = Phase::Act;
        tracing::debug!(cycle = self.cycle, phase = ?self.phase, "phase transition");
        self.act(&mut diagnostics, &mut routing_misses);

        self.phase = Phase::Rest;
        tracing::debug!(cycle = self.cycle, phase = ?self.phase, "phase transition");
        self.rest(&mut diagnostics, &mut routing_misses);

        self.build_snapshot(diagnostics, routing_misses)
    }

    /// A read-only view of current state without advancing a cycle (spec
    /// §6's `state`).
    pub fn state(&self) -> RuntimeSnapshot {
        self.build_snapshot(Vec::new(), 0)
    }

    // ── Phase 1: SENSE ───────────────────────────────────────────────────

    fn sense(&mut self, diagnostics: &mut Vec<Diagnostic>, routing_misses: &mut u64) {
        for agent in self.agents.values_mut() {
            agent.inbox.clear();
        }

        // Drain each socket's buffer (FIFO) into the inbox of whatever it
        // targets. Sockets are walked in insertion order, so an agent
        // targeted by more than one socket sees them in topology order.
        for socket in self.sockets.iter_mut() {
            while let Some(signal) = socket.buffer.pop_front() {
                if socket.is_broadcast() {
                    for agent in self.agents.values_mut() {
                        agent.inbox.push_back(signal.clone());
                    }
                } else if let Some(agent) = self.agents.get_mut(&socket.to) {
                    agent.inbox.push_back(signal);
                }
            }
        }

        // Signals injected into a fruiting body (or routed there by a
        // prior ACT) get routed into sockets now, after the agent
        // inbox-drain step above — so an injection made before this
        // step() reaches its target agent's inbox no earlier than the
        // *next* SENSE.
        let names: Vec<String> = self.fruiting_bodies.keys().cloned().collect();
        for name in names {
            let pending = std::mem::take(&mut self.fruiting_bodies.get_mut(&name).expect("just listed").outbox);
            for signal in pending {
                let outcome = route_signal(&mut self.sockets, &mut self.fruiting_bodies, &signal);
                if !outcome.any_match {
                    *routing_misses += 1;
                }
                if outcome.evicted {
                    diagnostics.push(Diagnostic::warning(
                        format!("socket overflow dropped the oldest signal from fruiting body '{name}'"),
                        SourceLocation::synthetic(),
                    ));
                }
            }
        }
    }

    // ── Phase 2: ACT ─────────────────────────────────────────────────────

    fn act(&mut self, diagnostics: &mut Vec<Diagnostic>, routing_misses: &mut u64) {
        let ids: Vec<String> = self.agents.keys().cloned().collect();
        let mut traffic = IndexMap::new();

        for id in &ids {
            let (mut inbox, failed, template_name, had_inbox_activity) = {
                let agent = self.agents.get_mut(id).expect("agent listed above");
                let inbox = std::mem::take(&mut agent.inbox);
                agent.outbox.clear();
                agent.metrics.clear();
                let had_inbox_activity = !inbox.is_empty();
                (inbox, agent.vitality == Vitality::Failed, agent.template.clone(), had_inbox_activity)
            };

            if !failed {
                if let Some(template) = self.templates.get(&template_name).cloned() {
                    for signal in inbox.drain(..) {
                        let guard_state = self.agents[id].state.clone();
                        match find_matching_signal_rule(&template, &signal, &guard_state, self.clock.as_ref(), diagnostics) {
                            Some((rule, mut locals)) => {
                                tracing::debug!(agent = %id, frequency = %signal.frequency, "rule matched");
                                let agent = self.agents.get_mut(id).expect("agent listed above");
                                execute_statements(
                                    &rule.body,
                                    &mut agent.state,
                                    &mut locals,
                                    id,
                                    &mut agent.outbox,
                                    &mut self.next_sequence,
                                    &mut self.pending_spawns,
                                    &mut agent.dying,
                                    &mut agent.metrics,
                                    diagnostics,
                                    self.clock.as_ref(),
                                );
                            }
                            None => diagnostics.push(Diagnostic::warning(
                                format!("agent '{id}' received signal '{}' matching no rule", signal.frequency),
                                SourceLocation::synthetic(),
                            )),
                        }
                    }

                    for rule in &template.rules {
                        if let Trigger::Cycle { period, .. } = &rule.trigger {
                            if *period > 0 && self.cycle % *period == 0 {
                                let agent = self.agents.get_mut(id).expect("agent listed above");
                                let mut locals = IndexMap::new();
                                execute_statements(
                                    &rule.body,
                                    &mut agent.state,
                                    &mut locals,
                                    id,
                                    &mut agent.outbox,
                                    &mut self.next_sequence,
                                    &mut self.pending_spawns,
                                    &mut agent.dying,
                                    &mut agent.metrics,
                                    diagnostics,
                                    self.clock.as_ref(),
                                );
                            }
                        }
                    }
                } else {
                    diagnostics.push(Diagnostic::warning(
                        format!("agent '{id}' has no known template '{template_name}'"),
                        SourceLocation::synthetic(),
                    ));
                }
            }

            // Route everything this agent emitted, same phase: after all
            // inbox signals are processed, route each outbox signal.
            let to_route: Vec<Signal> = {
                let agent = self.agents.get_mut(id).expect("agent listed above");
                agent.outbox.drain(..).collect()
            };
            let had_outbox_activity = !to_route.is_empty();
            for signal in to_route {
                let outcome = route_signal(&mut self.sockets, &mut self.fruiting_bodies, &signal);
                if !outcome.any_match {
                    *routing_misses += 1;
                }
                if outcome.evicted {
                    let agent = self.agents.get_mut(id).expect("agent listed above");
                    agent.failure_count += 1;
                    diagnostics.push(Diagnostic::warning(
                        format!("socket overflow dropped the oldest signal emitted by '{id}'"),
                        SourceLocation::synthetic(),
                    ));
                }
            }

            traffic.insert(id.clone(), had_inbox_activity || had_outbox_activity);
        }

        self.cycle_traffic = traffic;
    }

    // ── Phase 3: REST ────────────────────────────────────────────────────

    fn rest(&mut self, diagnostics: &mut Vec<Diagnostic>, routing_misses: &mut u64) {
        let ids: Vec<String> = self.agents.keys().cloned().collect();
        for id in &ids {
            if self.agents[id].vitality == Vitality::Failed {
                continue;
            }
            let template_name = self.agents[id].template.clone();
            let Some(template) = self.templates.get(&template_name).cloned() else {
                continue;
            };
            for rule in &template.rules {
                if !matches!(rule.trigger, Trigger::Rest { .. }) {
                    continue;
                }
                {
                    let agent = self.agents.get_mut(id).expect("agent listed above");
                    let mut locals = IndexMap::new();
                    execute_statements(
                        &rule.body,
                        &mut agent.state,
                        &mut locals,
                        id,
                        &mut agent.outbox,
                        &mut self.next_sequence,
                        &mut self.pending_spawns,
                        &mut agent.dying,
                        &mut agent.metrics,
                        diagnostics,
                        self.clock.as_ref(),
                    );
                }
                let to_route: Vec<Signal> = {
                    let agent = self.agents.get_mut(id).expect("agent listed above");
                    agent.outbox.drain(..).collect()
                };
                for signal in to_route {
                    let outcome = route_signal(&mut self.sockets, &mut self.fruiting_bodies, &signal);
                    if !outcome.any_match {
                        *routing_misses += 1;
                    }
                    if outcome.evicted {
                        self.agents.get_mut(id).expect("agent listed above").failure_count += 1;
                    }
                }
            }
        }

        // Deferred lifecycle: apply pending spawns in FIFO order, so a
        // `spawn` requested in ACT becomes visible at the next SENSE, not
        // this one.
        while let Some((template_name, instance_name)) = self.pending_spawns.pop_front() {
            if self.agents.contains_key(&instance_name) {
                diagnostics.push(Diagnostic::warning(
                    format!("spawn skipped: instance '{instance_name}' already exists"),
                    SourceLocation::synthetic(),
                ));
                continue;
            }
            match self.templates.get(&template_name) {
                Some(template) => {
                    let mut scratch = Vec::new();
                    let state = initial_state(template, self.clock.as_ref(), &mut scratch);
                    diagnostics.append(&mut scratch);
                    self.agents.insert(instance_name.clone(), Agent::new(instance_name, template_name, state));
                }
                None => diagnostics.push(Diagnostic::warning(
                    format!("spawn references unknown template '{template_name}'"),
                    SourceLocation::synthetic(),
                )),
            }
        }

        // Remove died agents and any socket naming them: no dangling
        // references once an agent retires.
        let died: Vec<String> = self.agents.iter().filter(|(_, a)| a.dying).map(|(id, _)| id.clone()).collect();
        for id in &died {
            self.agents.shift_remove(id);
        }
        if !died.is_empty() {
            self.sockets.retain(|s| !died.contains(&s.from) && !died.contains(&s.to));
        }

        for (id, agent) in self.agents.iter_mut() {
            agent.age += 1;
            if self.network.config.enable_health_monitoring {
                agent.vitality = if agent.failure_count > 3 {
                    Vitality::Failed
                } else if agent.failure_count > 1 {
                    Vitality::Degraded
                } else if self.cycle_traffic.get(id).copied().unwrap_or(false) {
                    Vitality::Active
                } else {
                    Vitality::Idle
                };
            }
        }

        for (id, agent) in &self.agents {
            if agent.metrics.is_empty() {
                continue;
            }
            let entry = self.metrics.entry(id.clone()).or_default();
            for (metric, value) in &agent.metrics {
                entry.insert(metric.clone(), value.clone());
            }
        }
    }

    fn build_snapshot(&self, diagnostics: Vec<Diagnostic>, routing_misses: u64) -> RuntimeSnapshot {
        RuntimeSnapshot {
            cycle: self.cycle,
            phase: self.phase,
            agents: self
                .agents
                .values()
                .map(|a| AgentView {
                    id: a.id.clone(),
                    template: a.template.clone(),
                    state: a.state.clone(),
                    inbox_depth: a.inbox.len(),
                    outbox_depth: a.outbox.len(),
                    vitality: a.vitality,
                    age: a.age,
                    failure_count: a.failure_count,
                })
                .collect(),
            sockets: self
                .sockets
                .iter()
                .map(|s| SocketView {
                    from: s.from.clone(),
                    to: s.to.clone(),
                    frequency: s.frequency.clone(),
                    buffer_len: s.buffer.len(),
                    capacity: s.capacity,
                })
                .collect(),
            fruiting_bodies: self
                .fruiting_bodies
                .values()
                .map(|f| FruitingBodyView { name: f.name.clone(), inbox_depth: f.inbox.len(), outbox_depth: f.outbox.len() })
                .collect(),
            metrics: self.metrics.clone(),
            routing_misses,
            diagnostics,
        }
    }
}

// ── Rule matching ────────────────────────────────────────────────────────

/// First-match-wins search for a `SignalMatch` rule whose frequency equals
/// the signal's and whose guard (if any) evaluates truthy. Returns the
/// matched rule plus the locals scope (the binding, if any) its body
/// should execute with.
fn find_matching_signal_rule<'t>(
    template: &'t HyphalDef,
    signal: &Signal,
    state: &IndexMap<String, Value>,
    clock: &dyn Clock,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<(&'t hypha_parser::ast::Rule, IndexMap<String, Value>)> {
    for rule in &template.rules {
        let Trigger::SignalMatch { frequency, binding, guard, .. } = &rule.trigger else {
            continue;
        };
        if frequency != &signal.frequency {
            continue;
        }
        let mut locals = IndexMap::new();
        if let Some(name) = binding {
            locals.insert(name.clone(), Value::Record(signal.payload.clone()));
        }
        let passes = match guard {
            Some(expr) => {
                let ctx = EvalContext { locals: &locals, state, clock };
                evaluate(expr, &ctx, diagnostics).is_truthy()
            }
            None => true,
        };
        if passes {
            return Some((rule, locals));
        }
    }
    None
}

// ── Statement execution ──────────────────────────────────────────────────

/// Execute a statement list sequentially against one agent's state and a
/// rule-local scope.
#[allow(clippy::too_many_arguments)]
fn execute_statements(
    statements: &[Statement],
    state: &mut IndexMap<String, Value>,
    locals: &mut IndexMap<String, Value>,
    agent_id: &str,
    outbox: &mut VecDeque<Signal>,
    next_sequence: &mut u64,
    pending_spawns: &mut VecDeque<(String, String)>,
    dying: &mut bool,
    metrics: &mut IndexMap<String, Value>,
    diagnostics: &mut Vec<Diagnostic>,
    clock: &dyn Clock,
) {
    for statement in statements {
        execute_statement(
            statement,
            state,
            locals,
            agent_id,
            outbox,
            next_sequence,
            pending_spawns,
            dying,
            metrics,
            diagnostics,
            clock,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn execute_statement(
    statement: &Statement,
    state: &mut IndexMap<String, Value>,
    locals: &mut IndexMap<String, Value>,
    agent_id: &str,
    outbox: &mut VecDeque<Signal>,
    next_sequence: &mut u64,
    pending_spawns: &mut VecDeque<(String, String)>,
    dying: &mut bool,
    metrics: &mut IndexMap<String, Value>,
    diagnostics: &mut Vec<Diagnostic>,
    clock: &dyn Clock,
) {
    match statement {
        Statement::Emit { frequency, fields, .. } => {
            let mut payload = IndexMap::new();
            for (name, expr) in fields {
                let ctx = EvalContext { locals: &*locals, state: &*state, clock };
                payload.insert(name.clone(), evaluate(expr, &ctx, diagnostics));
            }
            let sequence = *next_sequence;
            *next_sequence += 1;
            outbox.push_back(Signal {
                frequency: frequency.clone(),
                payload,
                origin: agent_id.to_string(),
                destination: None,
                sequence,
            });
        }
        Statement::Let { name, value, .. } => {
            let ctx = EvalContext { locals: &*locals, state: &*state, clock };
            let v = evaluate(value, &ctx, diagnostics);
            locals.insert(name.clone(), v);
        }
        Statement::Assignment { path, value, .. } => {
            let ctx = EvalContext { locals: &*locals, state: &*state, clock };
            let v = evaluate(value, &ctx, diagnostics);
            assign_path(state, path, v);
        }
        Statement::Conditional { condition, then_branch, else_ifs, else_branch, .. } => {
            let taken = {
                let ctx = EvalContext { locals: &*locals, state: &*state, clock };
                evaluate(condition, &ctx, diagnostics).is_truthy()
            };
            if taken {
                execute_statements(then_branch, state, locals, agent_id, outbox, next_sequence, pending_spawns, dying, metrics, diagnostics, clock);
                return;
            }
            for (guard, body) in else_ifs {
                let matched = {
                    let ctx = EvalContext { locals: &*locals, state: &*state, clock };
                    evaluate(guard, &ctx, diagnostics).is_truthy()
                };
                if matched {
                    execute_statements(body, state, locals, agent_id, outbox, next_sequence, pending_spawns, dying, metrics, diagnostics, clock);
                    return;
                }
            }
            execute_statements(else_branch, state, locals, agent_id, outbox, next_sequence, pending_spawns, dying, metrics, diagnostics, clock);
        }
        Statement::Report { metric, value, .. } => {
            let ctx = EvalContext { locals: &*locals, state: &*state, clock };
            let v = evaluate(value, &ctx, diagnostics);
            metrics.insert(metric.clone(), v);
        }
        Statement::Spawn { template, instance_name, .. } => {
            pending_spawns.push_back((template.clone(), instance_name.clone()));
        }
        Statement::Die { .. } => {
            *dying = true;
        }
    }
}

/// Mutate a (possibly nested) state field. `path.len() == 1` is the common
/// case (`x = expr`); longer paths (`x.y = expr`) navigate into a
/// [`Value::Record`], creating intermediate records if a segment doesn't
/// exist yet.
fn assign_path(state: &mut IndexMap<String, Value>, path: &[String], new_value: Value) {
    match path.split_first() {
        None => {}
        Some((head, [])) => {
            state.insert(head.clone(), new_value);
        }
        Some((head, rest)) => match state.get_mut(head) {
            Some(Value::Record(fields)) => assign_nested(fields, rest, new_value),
            _ => {
                let mut fields = IndexMap::new();
                assign_nested(&mut fields, rest, new_value);
                state.insert(head.clone(), Value::Record(fields));
            }
        },
    }
}

fn assign_nested(fields: &mut IndexMap<String, Value>, path: &[String], new_value: Value) {
    match path.split_first() {
        None => {}
        Some((head, [])) => {
            fields.insert(head.clone(), new_value);
        }
        Some((head, rest)) => match fields.get_mut(head) {
            Some(Value::Record(inner)) => assign_nested(inner, rest, new_value),
            _ => {
                let mut inner = IndexMap::new();
                assign_nested(&mut inner, rest, new_value);
                fields.insert(head.clone(), Value::Record(inner));
            }
        },
    }
}

/// Evaluate a `HyphalDef`'s state field initializers in declaration order,
/// each against the fields already built (so a later field's initializer
/// may reference an earlier one). Fields without an initializer get a
/// zero value for their declared type.
fn initial_state(template: &HyphalDef, clock: &dyn Clock, diagnostics: &mut Vec<Diagnostic>) -> IndexMap<String, Value> {
    let mut state = IndexMap::new();
    let empty_locals = IndexMap::new();
    for field in &template.state {
        let value = match &field.initial {
            Some(expr) => {
                let ctx = EvalContext { locals: &empty_locals, state: &state, clock };
                evaluate(expr, &ctx, diagnostics)
            }
            None => default_value_for_type(&field.ty),
        };
        state.insert(field.name.clone(), value);
    }
    state
}

/// The zero value for a declared type, used when a state field has no
/// initializer.
fn default_value_for_type(ty: &TypeRef) -> Value {
    match ty {
        TypeRef::Primitive { kind, .. } => match kind {
            PrimitiveKind::U32 | PrimitiveKind::I64 => Value::Integer(0),
            PrimitiveKind::F64 => Value::Float(0.0),
            PrimitiveKind::String => Value::Str(String::new()),
            PrimitiveKind::Binary => Value::Bytes(Vec::new()),
            PrimitiveKind::Boolean => Value::Bool(false),
        },
        TypeRef::Container { kind, .. } => match kind {
            hypha_parser::ast::ContainerKind::Vec => Value::List(Vec::new()),
            hypha_parser::ast::ContainerKind::Queue => Value::Queue(VecDeque::new()),
            hypha_parser::ast::ContainerKind::Map => Value::Map(IndexMap::new()),
        },
        TypeRef::Named { .. } => Value::Record(IndexMap::new()),
    }
}
