//! Semantic analysis: a fixed five-phase sweep over a parsed `Network`
//! that populates two symbol tables (frequencies, hyphal templates),
//! validates topology connectivity, and checks every rule's frequency
//! references — all without mutating the AST.
//!
//! An AST carrying any diagnostic with [`Severity::Error`](hypha_common::Severity)
//! must not be handed to the interpreter; see [`has_errors`].

use hypha_common::{Diagnostic, SourceLocation};
use hypha_parser::ast::*;
use indexmap::IndexMap;

/// Run the full five-phase sweep and return every diagnostic produced.
pub fn analyze(network: &Network) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    // Phase 1: register frequencies by name.
    let frequencies = register_frequencies(network, &mut diagnostics);
    validate_frequency_fields(network, &frequencies, &mut diagnostics);

    // Phase 2: register hyphal templates by name.
    let hyphae = register_hyphae(network, &mut diagnostics);
    validate_state_fields(network, &frequencies, &mut diagnostics);

    // Phase 3: topology spawns.
    let instances = register_spawns(network, &hyphae, &mut diagnostics);

    // Phase 4: socket endpoints and frequencies.
    validate_sockets(network, &frequencies, &instances, &mut diagnostics);

    // Phase 5: rule triggers and emit statements.
    validate_rules(network, &frequencies, &mut diagnostics);

    diagnostics
}

/// `true` if any diagnostic in the list is an error. An AST with errors must
/// not be executed.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

// ── Phase 1: frequencies ────────────────────────────────────────────────

fn register_frequencies<'n>(
    network: &'n Network,
    diagnostics: &mut Vec<Diagnostic>,
) -> IndexMap<&'n str, &'n FrequencyDef> {
    let mut table = IndexMap::new();
    for freq in &network.frequencies {
        if let Some(existing) = table.insert(freq.name.as_str(), freq) {
            diagnostics.push(Diagnostic::error(
                format!("duplicate frequency '{}' (first declared at {})", freq.name, existing.location),
                freq.location.clone(),
            ));
        }
    }
    table
}

fn validate_frequency_fields(
    network: &Network,
    frequencies: &IndexMap<&str, &FrequencyDef>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for freq in &network.frequencies {
        let mut seen: IndexMap<&str, &SourceLocation> = IndexMap::new();
        for field in &freq.fields {
            if let Some(prev) = seen.insert(field.name.as_str(), &field.location) {
                diagnostics.push(Diagnostic::error(
                    format!(
                        "duplicate field '{}' in frequency '{}' (first declared at {})",
                        field.name, freq.name, prev
                    ),
                    field.location.clone(),
                ));
            }
            check_type_ref(&field.ty, frequencies, diagnostics);
        }
    }
}

/// Recursively validates that every named type reference resolves to a
/// declared frequency.
fn check_type_ref(ty: &TypeRef, frequencies: &IndexMap<&str, &FrequencyDef>, diagnostics: &mut Vec<Diagnostic>) {
    match ty {
        TypeRef::Primitive { .. } => {}
        TypeRef::Container { args, .. } => {
            for arg in args {
                check_type_ref(arg, frequencies, diagnostics);
            }
        }
        TypeRef::Named { name, location } => {
            if !frequencies.contains_key(name.as_str()) {
                diagnostics.push(Diagnostic::error(
                    format!("unresolved type reference '{name}': no frequency with this name is declared"),
                    location.clone(),
                ));
            }
        }
    }
}

// ── Phase 2: hyphal templates ───────────────────────────────────────────

fn register_hyphae<'n>(network: &'n Network, diagnostics: &mut Vec<Diagnostic>) -> IndexMap<&'n str, &'n HyphalDef> {
    let mut table = IndexMap::new();
    for hyphal in &network.hyphae {
        if let Some(existing) = table.insert(hyphal.name.as_str(), hyphal) {
            diagnostics.push(Diagnostic::error(
                format!("duplicate hyphal template '{}' (first declared at {})", hyphal.name, existing.location),
                hyphal.location.clone(),
            ));
        }
    }
    table
}

fn validate_state_fields(
    network: &Network,
    frequencies: &IndexMap<&str, &FrequencyDef>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for hyphal in &network.hyphae {
        let mut seen: IndexMap<&str, &SourceLocation> = IndexMap::new();
        for field in &hyphal.state {
            if let Some(prev) = seen.insert(field.name.as_str(), &field.location) {
                diagnostics.push(Diagnostic::error(
                    format!(
                        "duplicate state field '{}' in hyphal '{}' (first declared at {})",
                        field.name, hyphal.name, prev
                    ),
                    field.location.clone(),
                ));
            }
            check_type_ref(&field.ty, frequencies, diagnostics);
        }
    }
}

// ── Phase 3: topology spawns ─────────────────────────────────────────────

fn register_spawns<'n>(
    network: &'n Network,
    hyphae: &IndexMap<&str, &HyphalDef>,
    diagnostics: &mut Vec<Diagnostic>,
) -> IndexMap<&'n str, &'n SpawnDecl> {
    let mut instances = IndexMap::new();
    let Some(topology) = &network.topology else {
        return instances;
    };
    for spawn in &topology.spawns {
        if !hyphae.contains_key(spawn.template.as_str()) {
            diagnostics.push(Diagnostic::error(
                format!("spawn references unknown hyphal template '{}'", spawn.template),
                spawn.location.clone(),
            ));
        }
        if let Some(existing) = instances.insert(spawn.instance.as_str(), spawn) {
            diagnostics.push(Diagnostic::error(
                format!(
                    "duplicate instance id '{}' (first spawned at {})",
                    spawn.instance, existing.location
                ),
                spawn.location.clone(),
            ));
        }
    }
    instances
}

// ── Phase 4: sockets ─────────────────────────────────────────────────────

fn validate_sockets(
    network: &Network,
    frequencies: &IndexMap<&str, &FrequencyDef>,
    instances: &IndexMap<&str, &SpawnDecl>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(topology) = &network.topology else {
        return;
    };
    let is_endpoint = |name: &str| {
        name == "*" || topology.fruiting_bodies.iter().any(|fb| fb == name) || instances.contains_key(name)
    };
    for socket in &topology.sockets {
        if socket.from == "*" {
            diagnostics.push(Diagnostic::error(
                "socket 'from' endpoint may not be a broadcast ('*')",
                socket.location.clone(),
            ));
        } else if !is_endpoint(&socket.from) {
            diagnostics.push(Diagnostic::error(
                format!("socket 'from' endpoint '{}' is not a declared fruiting body or instance", socket.from),
                socket.location.clone(),
            ));
        }
        if !is_endpoint(&socket.to) {
            diagnostics.push(Diagnostic::error(
                format!("socket 'to' endpoint '{}' is not '*', a declared fruiting body, or an instance", socket.to),
                socket.location.clone(),
            ));
        }
        if !frequencies.contains_key(socket.frequency.as_str()) {
            diagnostics.push(Diagnostic::error(
                format!("socket references unknown frequency '{}'", socket.frequency),
                socket.location.clone(),
            ));
        }
    }
}

// ── Phase 5: rule triggers and emits ────────────────────────────────────

fn validate_rules(network: &Network, frequencies: &IndexMap<&str, &FrequencyDef>, diagnostics: &mut Vec<Diagnostic>) {
    for hyphal in &network.hyphae {
        for rule in &hyphal.rules {
            if let Trigger::SignalMatch { frequency, location, .. } = &rule.trigger {
                if !frequencies.contains_key(frequency.as_str()) {
                    diagnostics.push(Diagnostic::error(
                        format!("rule trigger references unknown frequency '{frequency}'"),
                        location.clone(),
                    ));
                }
            }
            validate_statements(&rule.body, frequencies, diagnostics);
        }
    }
}

fn validate_statements(
    statements: &[Statement],
    frequencies: &IndexMap<&str, &FrequencyDef>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for statement in statements {
        match statement {
            Statement::Emit { frequency, location, .. } => {
                if !frequencies.contains_key(frequency.as_str()) {
                    diagnostics.push(Diagnostic::error(
                        format!("emit references unknown frequency '{frequency}'"),
                        location.clone(),
                    ));
                }
            }
            Statement::Conditional { then_branch, else_ifs, else_branch, .. } => {
                validate_statements(then_branch, frequencies, diagnostics);
                for (_, body) in else_ifs {
                    validate_statements(body, frequencies, diagnostics);
                }
                validate_statements(else_branch, frequencies, diagnostics);
            }
            Statement::Let { .. }
            | Statement::Assignment { .. }
            | Statement::Report { .. }
            | Statement::Spawn { .. }
            | Statement::Die { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypha_parser::parse;

    fn analyze_source(src: &str) -> Vec<Diagnostic> {
        let (network, parse_diags) = parse(src, None);
        assert!(parse_diags.is_empty(), "parse diagnostics: {parse_diags:?}");
        analyze(&network.expect("should parse"))
    }

    #[test]
    fn clean_network_has_no_diagnostics() {
        let src = r#"
            network n {
                frequencies {
                    frequency greeting { name: string }
                }
                hyphae {
                    hyphal greeter {
                        on signal(greeting, g) {
                            emit greeting { name: g.name }
                        }
                    }
                }
                topology {
                    fruiting_body input
                    fruiting_body output
                    spawn greeter as G1
                    socket input -> G1 (greeting)
                    socket G1 -> output (greeting)
                }
            }
        "#;
        let diags = analyze_source(src);
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn duplicate_frequency_name_is_an_error() {
        let src = r#"
            network n {
                frequencies {
                    frequency a { x: i64 }
                    frequency a { y: i64 }
                }
                hyphae {}
            }
        "#;
        let diags = analyze_source(src);
        assert!(diags.iter().any(|d| d.message.contains("duplicate frequency")));
    }

    #[test]
    fn duplicate_hyphal_name_is_an_error() {
        let src = r#"
            network n {
                frequencies {}
                hyphae {
                    hyphal h { on rest {} }
                    hyphal h { on rest {} }
                }
            }
        "#;
        let diags = analyze_source(src);
        assert!(diags.iter().any(|d| d.message.contains("duplicate hyphal template")));
    }

    #[test]
    fn unresolved_named_type_is_an_error() {
        let src = r#"
            network n {
                frequencies {
                    frequency a { payload: Missing }
                }
                hyphae {}
            }
        "#;
        let diags = analyze_source(src);
        assert!(diags.iter().any(|d| d.message.contains("unresolved type reference")));
    }

    #[test]
    fn spawn_of_unknown_template_is_an_error() {
        let src = r#"
            network n {
                frequencies {}
                hyphae {}
                topology {
                    spawn ghost as G1
                }
            }
        "#;
        let diags = analyze_source(src);
        assert!(diags.iter().any(|d| d.message.contains("unknown hyphal template")));
    }

    #[test]
    fn duplicate_instance_id_is_an_error() {
        let src = r#"
            network n {
                frequencies {}
                hyphae {
                    hyphal h { on rest {} }
                }
                topology {
                    spawn h as G1
                    spawn h as G1
                }
            }
        "#;
        let diags = analyze_source(src);
        assert!(diags.iter().any(|d| d.message.contains("duplicate instance id")));
    }

    #[test]
    fn socket_from_cannot_be_broadcast() {
        let src = r#"
            network n {
                frequencies {
                    frequency f { v: i64 }
                }
                hyphae {}
                topology {
                    fruiting_body out
                    socket * -> out (f)
                }
            }
        "#;
        let diags = analyze_source(src);
        assert!(diags.iter().any(|d| d.message.contains("may not be a broadcast")));
    }

    #[test]
    fn socket_to_broadcast_is_allowed() {
        let src = r#"
            network n {
                frequencies {
                    frequency f { v: i64 }
                }
                hyphae {
                    hyphal h { on rest {} }
                }
                topology {
                    spawn h as A
                    socket A -> * (f)
                }
            }
        "#;
        let diags = analyze_source(src);
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn socket_references_unknown_endpoint() {
        let src = r#"
            network n {
                frequencies {
                    frequency f { v: i64 }
                }
                hyphae {
                    hyphal h { on rest {} }
                }
                topology {
                    spawn h as A
                    socket A -> nowhere (f)
                }
            }
        "#;
        let diags = analyze_source(src);
        assert!(diags.iter().any(|d| d.message.contains("is not '*'")));
    }

    #[test]
    fn socket_references_unknown_frequency() {
        let src = r#"
            network n {
                frequencies {}
                hyphae {
                    hyphal h { on rest {} }
                }
                topology {
                    fruiting_body out
                    spawn h as A
                    socket A -> out (ghost)
                }
            }
        "#;
        let diags = analyze_source(src);
        assert!(diags.iter().any(|d| d.message.contains("unknown frequency")));
    }

    #[test]
    fn rule_trigger_references_unknown_frequency() {
        let src = r#"
            network n {
                frequencies {}
                hyphae {
                    hyphal h {
                        on signal(ghost, g) {}
                    }
                }
            }
        "#;
        let diags = analyze_source(src);
        assert!(diags.iter().any(|d| d.message.contains("trigger references unknown frequency")));
    }

    #[test]
    fn emit_inside_nested_conditional_is_checked() {
        let src = r#"
            network n {
                frequencies {}
                hyphae {
                    hyphal h {
                        on rest {
                            if true {
                                emit ghost {}
                            } else {
                                emit ghost2 {}
                            }
                        }
                    }
                }
            }
        "#;
        let diags = analyze_source(src);
        assert!(diags.iter().any(|d| d.message.contains("'ghost'")));
        assert!(diags.iter().any(|d| d.message.contains("'ghost2'")));
    }

    #[test]
    fn analyze_is_idempotent() {
        let src = r#"
            network n {
                frequencies { frequency f { v: i64 } }
                hyphae { hyphal h { on signal(f, x) { emit f { v: x.v } } } }
            }
        "#;
        let (network, _) = parse(src, None);
        let network = network.unwrap();
        let first = analyze(&network);
        let second = analyze(&network);
        assert_eq!(first, second);
    }

    #[test]
    fn has_errors_detects_error_severity() {
        let diags = vec![Diagnostic::warning("w", hypha_common::SourceLocation::synthetic())];
        assert!(!has_errors(&diags));
        let diags = vec![Diagnostic::error("e", hypha_common::SourceLocation::synthetic())];
        assert!(has_errors(&diags));
    }
}
