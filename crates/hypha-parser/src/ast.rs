//! The closed family of AST node types.
//!
//! Every node is a plain struct or tagged enum carrying a `SourceLocation`
//! captured at the first token of the production that built it. There is no
//! lossless/incremental concrete syntax tree here: this pipeline never
//! reparses incrementally and never needs to preserve trivia, so there is no
//! green/red tree to build, only the fixed shapes below.

use hypha_common::SourceLocation;

/// The root of a parsed program. Exactly one per parsed input.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    pub name: String,
    pub frequencies: Vec<FrequencyDef>,
    pub hyphae: Vec<HyphalDef>,
    pub topology: Option<TopologyDef>,
    pub config: Config,
    pub location: SourceLocation,
}

/// A named signal schema: `frequency NAME { field: type, ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyDef {
    pub name: String,
    pub fields: Vec<Field>,
    pub location: SourceLocation,
}

/// One field of a [`FrequencyDef`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: TypeRef,
    pub location: SourceLocation,
}

/// A primitive scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    U32,
    I64,
    F64,
    String,
    Binary,
    Boolean,
}

/// A generic container type (`vec<T>`, `queue<T>`, `map<K, V>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Vec,
    Queue,
    Map,
}

/// A declared type, appearing in frequency fields and hyphal state fields.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Primitive { kind: PrimitiveKind, location: SourceLocation },
    Container { kind: ContainerKind, args: Vec<TypeRef>, location: SourceLocation },
    /// A reference to a declared frequency, used as a record type. Resolved
    /// against the frequency symbol table at analysis time.
    Named { name: String, location: SourceLocation },
}

impl TypeRef {
    pub fn location(&self) -> &SourceLocation {
        match self {
            TypeRef::Primitive { location, .. } => location,
            TypeRef::Container { location, .. } => location,
            TypeRef::Named { location, .. } => location,
        }
    }
}

/// An agent template: local state fields plus an ordered list of rules.
#[derive(Debug, Clone, PartialEq)]
pub struct HyphalDef {
    pub name: String,
    pub state: Vec<StateField>,
    pub rules: Vec<Rule>,
    pub location: SourceLocation,
}

/// One state field of a [`HyphalDef`], with an optional initializer.
#[derive(Debug, Clone, PartialEq)]
pub struct StateField {
    pub name: String,
    pub ty: TypeRef,
    pub initial: Option<Expression>,
    pub location: SourceLocation,
}

/// A rule: a trigger plus the statements to run when it fires.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub trigger: Trigger,
    pub body: Vec<Statement>,
    pub location: SourceLocation,
}

/// What causes a [`Rule`] to fire.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// `on signal(FREQ (, BIND)? (where EXPR)?)`.
    SignalMatch {
        frequency: String,
        binding: Option<String>,
        guard: Option<Expression>,
        location: SourceLocation,
    },
    /// `on cycle N`.
    Cycle { period: u64, location: SourceLocation },
    /// `on rest`.
    Rest { location: SourceLocation },
}

impl Trigger {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Trigger::SignalMatch { location, .. } => location,
            Trigger::Cycle { location, .. } => location,
            Trigger::Rest { location } => location,
        }
    }
}

/// A statement inside a rule body or a conditional branch.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `emit FREQ { name: expr, ... }`.
    Emit { frequency: String, fields: Vec<(String, Expression)>, location: SourceLocation },
    /// `let IDENT = EXPR;` — introduces a new rule-local binding.
    Let { name: String, value: Expression, location: SourceLocation },
    /// `target(.field)* = EXPR;` — mutates an existing state field (or a
    /// field of a record held in one).
    Assignment { path: Vec<String>, value: Expression, location: SourceLocation },
    /// `if EXPR { ... } (else if EXPR { ... })* (else { ... })?`.
    Conditional {
        condition: Expression,
        then_branch: Vec<Statement>,
        else_ifs: Vec<(Expression, Vec<Statement>)>,
        else_branch: Vec<Statement>,
        location: SourceLocation,
    },
    /// `report METRIC = EXPR;`.
    Report { metric: String, value: Expression, location: SourceLocation },
    /// `spawn TYPE as NAME;`.
    Spawn { template: String, instance_name: String, location: SourceLocation },
    /// `die;`.
    Die { location: SourceLocation },
}

impl Statement {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Statement::Emit { location, .. } => location,
            Statement::Let { location, .. } => location,
            Statement::Assignment { location, .. } => location,
            Statement::Conditional { location, .. } => location,
            Statement::Report { location, .. } => location,
            Statement::Spawn { location, .. } => location,
            Statement::Die { location } => location,
        }
    }
}

/// A literal value as written in source, before evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Integer(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Neg,
    Not,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal { value: LiteralValue, location: SourceLocation },
    Identifier { name: String, location: SourceLocation },
    FieldAccess { base: Box<Expression>, field: String, location: SourceLocation },
    BinaryOp { left: Box<Expression>, op: BinaryOperator, right: Box<Expression>, location: SourceLocation },
    UnaryOp { op: UnaryOperator, operand: Box<Expression>, location: SourceLocation },
    FunctionCall { name: String, args: Vec<Expression>, location: SourceLocation },
    /// `Tag { name: expr, ... }`.
    ObjectConstruction { tag: String, fields: Vec<(String, Expression)>, location: SourceLocation },
}

impl Expression {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Expression::Literal { location, .. } => location,
            Expression::Identifier { location, .. } => location,
            Expression::FieldAccess { location, .. } => location,
            Expression::BinaryOp { location, .. } => location,
            Expression::UnaryOp { location, .. } => location,
            Expression::FunctionCall { location, .. } => location,
            Expression::ObjectConstruction { location, .. } => location,
        }
    }
}

/// `spawn TYPE as NAME` inside a `topology` block.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnDecl {
    pub template: String,
    pub instance: String,
    pub location: SourceLocation,
}

/// `socket FROM -> TO (FREQUENCY)` inside a `topology` block.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketDecl {
    pub from: String,
    pub to: String,
    pub frequency: String,
    pub location: SourceLocation,
}

/// The instantiated graph of agents and sockets: fruiting bodies (external
/// I/O endpoints), spawns, and the sockets wiring them together.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyDef {
    pub fruiting_bodies: Vec<String>,
    pub spawns: Vec<SpawnDecl>,
    pub sockets: Vec<SocketDecl>,
    pub location: SourceLocation,
}

/// Runtime configuration, with documented defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub cycle_period_ms: u64,
    pub max_buffer_size: usize,
    pub enable_health_monitoring: bool,
    pub location: SourceLocation,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cycle_period_ms: 100,
            max_buffer_size: 1000,
            enable_health_monitoring: true,
            location: SourceLocation::synthetic(),
        }
    }
}
