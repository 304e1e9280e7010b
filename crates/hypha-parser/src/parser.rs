//! Recursive-descent parser: one pass, single-token lookahead plus the
//! one two-token lookahead used to tell an object-construction `Ident {`
//! apart from `Ident` used as a plain value.

use hypha_common::{Diagnostic, SourceLocation, Token, TokenKind};

use crate::ast::*;

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

/// Tokens that start a new top-level section, used as synchronization
/// points during error recovery.
const SECTION_KEYWORDS: &[TokenKind] =
    &[TokenKind::Frequencies, TokenKind::Hyphae, TokenKind::Topology, TokenKind::Config];

/// Tokens that start a new statement, also used as synchronization points.
const STATEMENT_KEYWORDS: &[TokenKind] = &[
    TokenKind::Emit,
    TokenKind::Let,
    TokenKind::If,
    TokenKind::Report,
    TokenKind::Spawn,
    TokenKind::Die,
];

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Parser { tokens, pos: 0, diagnostics: Vec::new() }
    }

    // ── token navigation ────────────────────────────────────────────────

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn nth(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current().kind)
    }

    fn is_eof(&self) -> bool {
        self.at(TokenKind::Eof)
    }

    fn bump(&mut self) -> Token {
        let tok = self.current().clone();
        if !self.is_eof() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    /// Consume `kind`, or emit a diagnostic and leave the cursor in place.
    fn expect(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        if let Some(tok) = self.eat(kind) {
            return Some(tok);
        }
        let loc = self.current().location.clone();
        self.error(format!("expected {what}, found {:?}", self.current().kind), loc);
        None
    }

    fn error(&mut self, message: impl Into<String>, location: SourceLocation) {
        self.diagnostics.push(Diagnostic::error(message, location));
    }

    /// Advance until a synchronization point: a section keyword, a
    /// statement-starting keyword, a `{`, or a `}`, or end of input.
    fn synchronize(&mut self) {
        while !self.is_eof() {
            if self.at(TokenKind::RBrace)
                || self.at(TokenKind::LBrace)
                || self.at_any(SECTION_KEYWORDS)
                || self.at_any(STATEMENT_KEYWORDS)
            {
                return;
            }
            self.bump();
        }
    }

    // ── top level ───────────────────────────────────────────────────────

    /// `network IDENT { section* }`. Returns `None` only when the opening
    /// `network` keyword itself is missing.
    pub fn parse_network(mut self) -> (Option<Network>, Vec<Diagnostic>) {
        let Some(kw) = self.eat(TokenKind::Network) else {
            let loc = self.current().location.clone();
            self.error("expected 'network' declaration", loc);
            return (None, self.diagnostics);
        };
        let location = kw.location;
        let name = self.parse_ident_text("network name");
        self.expect(TokenKind::LBrace, "'{' to open network body");

        let mut frequencies = Vec::new();
        let mut hyphae = Vec::new();
        let mut topology = None;
        let mut config = None;

        while !self.at(TokenKind::RBrace) && !self.is_eof() {
            match self.current().kind {
                TokenKind::Frequencies => {
                    let parsed = self.parse_frequencies_section();
                    if !frequencies.is_empty() {
                        self.error("duplicate 'frequencies' section", parsed.1.clone());
                    }
                    frequencies = parsed.0;
                }
                TokenKind::Hyphae => {
                    let parsed = self.parse_hyphae_section();
                    if !hyphae.is_empty() {
                        self.error("duplicate 'hyphae' section", parsed.1.clone());
                    }
                    hyphae = parsed.0;
                }
                TokenKind::Topology => {
                    let parsed = self.parse_topology_section();
                    if topology.is_some() {
                        self.error("duplicate 'topology' section", parsed.location.clone());
                    }
                    topology = Some(parsed);
                }
                TokenKind::Config => {
                    let parsed = self.parse_config_section();
                    if config.is_some() {
                        self.error("duplicate 'config' section", parsed.location.clone());
                    }
                    config = Some(parsed);
                }
                _ => {
                    let loc = self.current().location.clone();
                    self.error(
                        format!("expected a section keyword, found {:?}", self.current().kind),
                        loc,
                    );
                    self.synchronize();
                }
            }
        }
        self.expect(TokenKind::RBrace, "'}' to close network body");

        let network = Network {
            name,
            frequencies,
            hyphae,
            topology,
            config: config.unwrap_or_default(),
            location,
        };
        (Some(network), self.diagnostics)
    }

    fn parse_ident_text(&mut self, what: &str) -> String {
        match self.expect(TokenKind::Ident, what) {
            Some(tok) => tok.lexeme,
            None => String::new(),
        }
    }

    // ── frequencies ─────────────────────────────────────────────────────

    fn parse_frequencies_section(&mut self) -> (Vec<FrequencyDef>, SourceLocation) {
        let location = self.bump().location; // 'frequencies'
        self.expect(TokenKind::LBrace, "'{' to open frequencies section");
        let mut defs = Vec::new();
        while self.at(TokenKind::Frequency) {
            defs.push(self.parse_frequency_def());
        }
        self.expect(TokenKind::RBrace, "'}' to close frequencies section");
        (defs, location)
    }

    fn parse_frequency_def(&mut self) -> FrequencyDef {
        let location = self.bump().location; // 'frequency'
        let name = self.parse_ident_text("frequency name");
        self.expect(TokenKind::LBrace, "'{' to open frequency body");
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.is_eof() {
            fields.push(self.parse_field());
            if self.at(TokenKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "'}' to close frequency body");
        FrequencyDef { name, fields, location }
    }

    fn parse_field(&mut self) -> Field {
        let location = self.current().location.clone();
        let name = self.parse_ident_text("field name");
        self.expect(TokenKind::Colon, "':' after field name");
        let ty = self.parse_type_ref();
        Field { name, ty, location }
    }

    fn parse_type_ref(&mut self) -> TypeRef {
        let location = self.current().location.clone();
        match self.current().kind {
            TokenKind::U32 => {
                self.bump();
                TypeRef::Primitive { kind: PrimitiveKind::U32, location }
            }
            TokenKind::I64 => {
                self.bump();
                TypeRef::Primitive { kind: PrimitiveKind::I64, location }
            }
            TokenKind::F64 => {
                self.bump();
                TypeRef::Primitive { kind: PrimitiveKind::F64, location }
            }
            TokenKind::StringKw => {
                self.bump();
                TypeRef::Primitive { kind: PrimitiveKind::String, location }
            }
            TokenKind::Binary => {
                self.bump();
                TypeRef::Primitive { kind: PrimitiveKind::Binary, location }
            }
            TokenKind::Boolean => {
                self.bump();
                TypeRef::Primitive { kind: PrimitiveKind::Boolean, location }
            }
            TokenKind::Vec | TokenKind::Queue | TokenKind::Map => {
                let kind = match self.bump().kind {
                    TokenKind::Vec => ContainerKind::Vec,
                    TokenKind::Queue => ContainerKind::Queue,
                    _ => ContainerKind::Map,
                };
                let mut args = Vec::new();
                if self.expect(TokenKind::Lt, "'<' to open type arguments").is_some() {
                    args.push(self.parse_type_ref());
                    while self.eat(TokenKind::Comma).is_some() {
                        args.push(self.parse_type_ref());
                    }
                    self.expect(TokenKind::Gt, "'>' to close type arguments");
                }
                TypeRef::Container { kind, args, location }
            }
            TokenKind::Ident => {
                let name = self.bump().lexeme;
                TypeRef::Named { name, location }
            }
            _ => {
                let loc = self.current().location.clone();
                self.error(format!("expected a type, found {:?}", self.current().kind), loc);
                TypeRef::Named { name: String::new(), location }
            }
        }
    }

    // ── hyphae ──────────────────────────────────────────────────────────

    fn parse_hyphae_section(&mut self) -> (Vec<HyphalDef>, SourceLocation) {
        let location = self.bump().location; // 'hyphae'
        self.expect(TokenKind::LBrace, "'{' to open hyphae section");
        let mut defs = Vec::new();
        while self.at(TokenKind::Hyphal) {
            defs.push(self.parse_hyphal_def());
        }
        self.expect(TokenKind::RBrace, "'}' to close hyphae section");
        (defs, location)
    }

    fn parse_hyphal_def(&mut self) -> HyphalDef {
        let location = self.bump().location; // 'hyphal'
        let name = self.parse_ident_text("hyphal name");
        self.expect(TokenKind::LBrace, "'{' to open hyphal body");
        let mut state = Vec::new();
        let mut rules = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.is_eof() {
            match self.current().kind {
                TokenKind::State => state = self.parse_state_block(),
                TokenKind::On => rules.push(self.parse_rule()),
                _ => {
                    let loc = self.current().location.clone();
                    self.error(
                        format!("expected 'state' or 'on', found {:?}", self.current().kind),
                        loc,
                    );
                    self.synchronize();
                }
            }
        }
        self.expect(TokenKind::RBrace, "'}' to close hyphal body");
        HyphalDef { name, state, rules, location }
    }

    fn parse_state_block(&mut self) -> Vec<StateField> {
        self.bump(); // 'state'
        self.expect(TokenKind::LBrace, "'{' to open state block");
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.is_eof() {
            fields.push(self.parse_state_field());
            if self.at(TokenKind::Comma) {
                self.bump();
            }
        }
        self.expect(TokenKind::RBrace, "'}' to close state block");
        fields
    }

    fn parse_state_field(&mut self) -> StateField {
        let location = self.current().location.clone();
        let name = self.parse_ident_text("state field name");
        self.expect(TokenKind::Colon, "':' after state field name");
        let ty = self.parse_type_ref();
        let initial = if self.eat(TokenKind::Eq).is_some() { Some(self.parse_expression()) } else { None };
        StateField { name, ty, initial, location }
    }

    // ── rules ───────────────────────────────────────────────────────────

    fn parse_rule(&mut self) -> Rule {
        let location = self.current().location.clone();
        let trigger = self.parse_trigger();
        let body = self.parse_block();
        Rule { trigger, body, location }
    }

    fn parse_trigger(&mut self) -> Trigger {
        let location = self.bump().location; // 'on'
        match self.current().kind {
            TokenKind::Signal => {
                self.bump();
                self.expect(TokenKind::LParen, "'(' after 'signal'");
                let frequency = self.parse_ident_text("frequency name");
                let binding = if self.eat(TokenKind::Comma).is_some() {
                    Some(self.parse_ident_text("binding name"))
                } else {
                    None
                };
                // The whole parenthesized block is consumed before 'where'
                // is considered.
                self.expect(TokenKind::RParen, "')' to close signal trigger");
                let guard = if self.eat(TokenKind::Where).is_some() { Some(self.parse_expression()) } else { None };
                Trigger::SignalMatch { frequency, binding, guard, location }
            }
            TokenKind::Cycle => {
                self.bump();
                let period = self.parse_int_literal("cycle period");
                Trigger::Cycle { period, location }
            }
            TokenKind::Rest => {
                self.bump();
                Trigger::Rest { location }
            }
            _ => {
                let loc = self.current().location.clone();
                self.error(
                    format!("expected 'signal', 'cycle', or 'rest', found {:?}", self.current().kind),
                    loc,
                );
                Trigger::Rest { location }
            }
        }
    }

    fn parse_int_literal(&mut self, what: &str) -> u64 {
        match self.expect(TokenKind::Number, what) {
            Some(tok) => tok.lexeme.parse().unwrap_or(0),
            None => 0,
        }
    }

    // ── statements ──────────────────────────────────────────────────────

    fn parse_block(&mut self) -> Vec<Statement> {
        self.expect(TokenKind::LBrace, "'{' to open block");
        let mut statements = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.is_eof() {
            statements.push(self.parse_statement());
        }
        self.expect(TokenKind::RBrace, "'}' to close block");
        statements
    }

    fn parse_statement(&mut self) -> Statement {
        let location = self.current().location.clone();
        match self.current().kind {
            TokenKind::Emit => self.parse_emit_statement(),
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::If => self.parse_conditional(),
            TokenKind::Report => self.parse_report_statement(),
            TokenKind::Spawn => self.parse_spawn_statement(),
            TokenKind::Die => {
                self.bump();
                self.eat(TokenKind::Semicolon);
                Statement::Die { location }
            }
            TokenKind::Ident => self.parse_assignment_statement(),
            _ => {
                self.error(format!("expected a statement, found {:?}", self.current().kind), location.clone());
                self.synchronize();
                Statement::Die { location }
            }
        }
    }

    fn parse_emit_statement(&mut self) -> Statement {
        let location = self.bump().location; // 'emit'
        let frequency = self.parse_ident_text("frequency name");
        let fields = self.parse_field_init_list();
        self.eat(TokenKind::Semicolon);
        Statement::Emit { frequency, fields, location }
    }

    /// `{ name: expr (, name: expr)* (,)? }`. Shared by `emit` statements
    /// and object-construction expressions.
    fn parse_field_init_list(&mut self) -> Vec<(String, Expression)> {
        self.expect(TokenKind::LBrace, "'{' to open field list");
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.is_eof() {
            let name = self.parse_ident_text("field name");
            self.expect(TokenKind::Colon, "':' after field name");
            let value = self.parse_expression();
            fields.push((name, value));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "'}' to close field list");
        fields
    }

    fn parse_let_statement(&mut self) -> Statement {
        let location = self.bump().location; // 'let'
        let name = self.parse_ident_text("binding name");
        self.expect(TokenKind::Eq, "'=' in let binding");
        let value = self.parse_expression();
        self.eat(TokenKind::Semicolon);
        Statement::Let { name, value, location }
    }

    fn parse_assignment_statement(&mut self) -> Statement {
        let location = self.current().location.clone();
        let mut path = vec![self.parse_ident_text("assignment target")];
        while self.eat(TokenKind::Dot).is_some() {
            path.push(self.parse_ident_text("field name"));
        }
        self.expect(TokenKind::Eq, "'=' in assignment");
        let value = self.parse_expression();
        self.eat(TokenKind::Semicolon);
        Statement::Assignment { path, value, location }
    }

    fn parse_conditional(&mut self) -> Statement {
        let location = self.bump().location; // 'if'
        let condition = self.parse_expression();
        let then_branch = self.parse_block();
        let mut else_ifs = Vec::new();
        let mut else_branch = Vec::new();
        while self.at(TokenKind::Else) {
            self.bump();
            if self.eat(TokenKind::If).is_some() {
                let cond = self.parse_expression();
                let body = self.parse_block();
                else_ifs.push((cond, body));
            } else {
                else_branch = self.parse_block();
                break;
            }
        }
        Statement::Conditional { condition, then_branch, else_ifs, else_branch, location }
    }

    fn parse_report_statement(&mut self) -> Statement {
        let location = self.bump().location; // 'report'
        let metric = self.parse_ident_text("metric name");
        self.expect(TokenKind::Eq, "'=' in report statement");
        let value = self.parse_expression();
        self.eat(TokenKind::Semicolon);
        Statement::Report { metric, value, location }
    }

    fn parse_spawn_statement(&mut self) -> Statement {
        let location = self.bump().location; // 'spawn'
        let template = self.parse_ident_text("template name");
        self.expect(TokenKind::As, "'as' in spawn statement");
        let instance_name = self.parse_ident_text("instance name");
        self.eat(TokenKind::Semicolon);
        Statement::Spawn { template, instance_name, location }
    }

    // ── expressions (precedence low → high) ────────────────────────────

    fn parse_expression(&mut self) -> Expression {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> Expression {
        let mut left = self.parse_logical_and();
        while self.at(TokenKind::PipePipe) {
            let location = self.bump().location;
            let right = self.parse_logical_and();
            left = Expression::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::Or,
                right: Box::new(right),
                location,
            };
        }
        left
    }

    fn parse_logical_and(&mut self) -> Expression {
        let mut left = self.parse_equality();
        while self.at(TokenKind::AmpAmp) {
            let location = self.bump().location;
            let right = self.parse_equality();
            left = Expression::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::And,
                right: Box::new(right),
                location,
            };
        }
        left
    }

    fn parse_equality(&mut self) -> Expression {
        let mut left = self.parse_comparison();
        loop {
            let op = match self.current().kind {
                TokenKind::EqEq => BinaryOperator::Eq,
                TokenKind::NotEq => BinaryOperator::NotEq,
                _ => break,
            };
            let location = self.bump().location;
            let right = self.parse_comparison();
            left = Expression::BinaryOp { left: Box::new(left), op, right: Box::new(right), location };
        }
        left
    }

    fn parse_comparison(&mut self) -> Expression {
        let mut left = self.parse_additive();
        loop {
            let op = match self.current().kind {
                TokenKind::Lt => BinaryOperator::Lt,
                TokenKind::LtEq => BinaryOperator::LtEq,
                TokenKind::Gt => BinaryOperator::Gt,
                TokenKind::GtEq => BinaryOperator::GtEq,
                _ => break,
            };
            let location = self.bump().location;
            let right = self.parse_additive();
            left = Expression::BinaryOp { left: Box::new(left), op, right: Box::new(right), location };
        }
        left
    }

    fn parse_additive(&mut self) -> Expression {
        let mut left = self.parse_multiplicative();
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Sub,
                _ => break,
            };
            let location = self.bump().location;
            let right = self.parse_multiplicative();
            left = Expression::BinaryOp { left: Box::new(left), op, right: Box::new(right), location };
        }
        left
    }

    fn parse_multiplicative(&mut self) -> Expression {
        let mut left = self.parse_unary();
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOperator::Mul,
                TokenKind::Slash => BinaryOperator::Div,
                TokenKind::Percent => BinaryOperator::Rem,
                _ => break,
            };
            let location = self.bump().location;
            let right = self.parse_unary();
            left = Expression::BinaryOp { left: Box::new(left), op, right: Box::new(right), location };
        }
        left
    }

    fn parse_unary(&mut self) -> Expression {
        let location = self.current().location.clone();
        match self.current().kind {
            TokenKind::Bang => {
                self.bump();
                let operand = self.parse_unary();
                Expression::UnaryOp { op: UnaryOperator::Not, operand: Box::new(operand), location }
            }
            TokenKind::Minus => {
                self.bump();
                let operand = self.parse_unary();
                Expression::UnaryOp { op: UnaryOperator::Neg, operand: Box::new(operand), location }
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Expression {
        let mut expr = self.parse_primary();
        loop {
            if self.at(TokenKind::Dot) {
                let location = self.bump().location;
                let field = self.parse_ident_text("field name");
                expr = Expression::FieldAccess { base: Box::new(expr), field, location };
            } else {
                break;
            }
        }
        expr
    }

    fn parse_primary(&mut self) -> Expression {
        let location = self.current().location.clone();
        match self.current().kind {
            TokenKind::Number => {
                let tok = self.bump();
                let value = if tok.lexeme.contains('.') {
                    LiteralValue::Float(tok.lexeme.parse().unwrap_or(0.0))
                } else {
                    LiteralValue::Integer(tok.lexeme.parse().unwrap_or(0))
                };
                Expression::Literal { value, location }
            }
            TokenKind::StringLiteral => {
                let tok = self.bump();
                Expression::Literal { value: LiteralValue::Str(unescape(&tok.lexeme)), location }
            }
            TokenKind::BoolLiteral => {
                let tok = self.bump();
                Expression::Literal { value: LiteralValue::Bool(tok.lexeme == "true"), location }
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expression();
                self.expect(TokenKind::RParen, "')' to close parenthesized expression");
                inner
            }
            TokenKind::Ident => self.parse_ident_led(),
            _ => {
                self.error(format!("expected an expression, found {:?}", self.current().kind), location.clone());
                Expression::Literal { value: LiteralValue::Bool(false), location }
            }
        }
    }

    /// An identifier can lead into a function call (`name(args)`), an object
    /// construction (`Name { ... }`, disambiguated by one token of
    /// lookahead), or a plain identifier/field-access chain.
    fn parse_ident_led(&mut self) -> Expression {
        let location = self.current().location.clone();
        let name = self.bump().lexeme;
        if self.at(TokenKind::LParen) {
            self.bump();
            let mut args = Vec::new();
            if !self.at(TokenKind::RParen) {
                args.push(self.parse_expression());
                while self.eat(TokenKind::Comma).is_some() {
                    args.push(self.parse_expression());
                }
            }
            self.expect(TokenKind::RParen, "')' to close call arguments");
            return Expression::FunctionCall { name, args, location };
        }
        if self.at(TokenKind::LBrace) && self.looks_like_object_construction() {
            let fields = self.parse_field_init_list();
            return Expression::ObjectConstruction { tag: name, fields, location };
        }
        Expression::Identifier { name, location }
    }

    /// Two-token lookahead: `Ident {` is object construction only when the
    /// brace is immediately followed by `}` (empty) or `IDENT :` (a field
    /// name), never when it would instead start an unrelated block.
    fn looks_like_object_construction(&self) -> bool {
        matches!(self.nth(1).kind, TokenKind::RBrace)
            || (self.nth(1).kind == TokenKind::Ident && self.nth(2).kind == TokenKind::Colon)
    }

    // ── topology ────────────────────────────────────────────────────────

    fn parse_topology_section(&mut self) -> TopologyDef {
        let location = self.bump().location; // 'topology'
        self.expect(TokenKind::LBrace, "'{' to open topology section");
        let mut fruiting_bodies = Vec::new();
        let mut spawns = Vec::new();
        let mut sockets = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.is_eof() {
            match self.current().kind {
                TokenKind::FruitingBody => {
                    self.bump();
                    fruiting_bodies.push(self.parse_ident_text("fruiting body name"));
                    self.eat(TokenKind::Semicolon);
                }
                TokenKind::Spawn => {
                    let spawn_location = self.bump().location;
                    let template = self.parse_ident_text("template name");
                    self.expect(TokenKind::As, "'as' in spawn declaration");
                    let instance = self.parse_ident_text("instance name");
                    self.eat(TokenKind::Semicolon);
                    spawns.push(SpawnDecl { template, instance, location: spawn_location });
                }
                TokenKind::Socket => {
                    let socket_location = self.bump().location;
                    let from = self.parse_endpoint();
                    self.expect(TokenKind::Arrow, "'->' in socket declaration");
                    let to = self.parse_endpoint();
                    self.expect(TokenKind::LParen, "'(' before socket frequency");
                    let frequency = self.parse_ident_text("socket frequency");
                    self.expect(TokenKind::RParen, "')' after socket frequency");
                    self.eat(TokenKind::Semicolon);
                    sockets.push(SocketDecl { from, to, frequency, location: socket_location });
                }
                _ => {
                    let loc = self.current().location.clone();
                    self.error(
                        format!(
                            "expected 'fruiting_body', 'spawn', or 'socket', found {:?}",
                            self.current().kind
                        ),
                        loc,
                    );
                    self.synchronize();
                }
            }
        }
        self.expect(TokenKind::RBrace, "'}' to close topology section");
        TopologyDef { fruiting_bodies, spawns, sockets, location }
    }

    /// A socket endpoint: `*` (broadcast) or an identifier.
    fn parse_endpoint(&mut self) -> String {
        if self.at(TokenKind::Star) {
            self.bump();
            return "*".to_string();
        }
        self.parse_ident_text("a socket endpoint ('*' or a name)")
    }

    // ── config ──────────────────────────────────────────────────────────

    fn parse_config_section(&mut self) -> Config {
        let location = self.bump().location; // 'config'
        self.expect(TokenKind::LBrace, "'{' to open config section");
        let mut config = Config { location: location.clone(), ..Config::default() };
        while !self.at(TokenKind::RBrace) && !self.is_eof() {
            let key = self.parse_ident_text("config key");
            self.expect(TokenKind::Colon, "':' after config key");
            match key.as_str() {
                "cycle_period_ms" => config.cycle_period_ms = self.parse_int_literal("cycle_period_ms value"),
                "max_buffer_size" => {
                    config.max_buffer_size = self.parse_int_literal("max_buffer_size value") as usize
                }
                "enable_health_monitoring" => {
                    config.enable_health_monitoring = match self.expect(TokenKind::BoolLiteral, "a boolean") {
                        Some(tok) => tok.lexeme == "true",
                        None => true,
                    }
                }
                other => {
                    let loc = self.current().location.clone();
                    self.error(format!("unknown config key '{other}'"), loc);
                    // Best-effort skip of the value so parsing can continue.
                    if !self.at(TokenKind::Comma) && !self.at(TokenKind::RBrace) {
                        self.bump();
                    }
                }
            }
            self.eat(TokenKind::Comma);
        }
        self.expect(TokenKind::RBrace, "'}' to close config section");
        config
    }
}

/// Process `\`-escapes in a raw string lexeme (including the surrounding
/// quote characters) into the string's actual value.
fn unescape(lexeme: &str) -> String {
    let inner = &lexeme[1..lexeme.len().saturating_sub(1)];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse a complete `Network` from source text.
pub fn parse(source: &str, filename: Option<&str>) -> (Option<Network>, Vec<Diagnostic>) {
    let (tokens, mut lex_diagnostics) = hypha_lexer::tokenize(source, filename);
    let (network, parse_diagnostics) = Parser::new(&tokens).parse_network();
    lex_diagnostics.extend(parse_diagnostics);
    (network, lex_diagnostics)
}
