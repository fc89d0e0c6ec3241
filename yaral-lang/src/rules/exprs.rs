// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::convert::TryFrom;
use std::fmt::Formatter;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default, Serialize, Deserialize, Hash)]
pub struct FileLocation {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl std::fmt::Display for FileLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {} at column {}", self.line, self.column)
    }
}

///
/// Root of the tree, the rules in source order
///
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize, Hash)]
pub struct SourceFile {
    pub rules: Vec<RuleDefinition>,
}

impl SourceFile {
    pub fn rule(&self, name: &str) -> Option<&RuleDefinition> {
        self.rules.iter().find(|r| r.name == name)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct RuleDefinition {
    pub name: String,
    pub sections: Vec<Section>,
    pub location: FileLocation,
}

impl RuleDefinition {
    ///
    /// All sections with the given key. The same key may legally appear more
    /// than once inside a rule, merging or rejecting duplicates is left to the
    /// caller.
    ///
    pub fn sections_with_key(&self, key: SectionKey) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(move |s| s.key == key)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SectionKey {
    Condition,
    Events,
    Match,
    Meta,
    Options,
    Outcome,
}

impl SectionKey {
    pub const ALL: [SectionKey; 6] = [
        SectionKey::Condition,
        SectionKey::Events,
        SectionKey::Match,
        SectionKey::Meta,
        SectionKey::Options,
        SectionKey::Outcome,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKey::Condition => "condition",
            SectionKey::Events => "events",
            SectionKey::Match => "match",
            SectionKey::Meta => "meta",
            SectionKey::Options => "options",
            SectionKey::Outcome => "outcome",
        }
    }
}

impl FromStr for SectionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionKey::ALL
            .iter()
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown section key `{s}`"))
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct Section {
    pub key: SectionKey,
    pub statements: Vec<Statement>,
    pub location: FileLocation,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub enum Statement {
    Assignment(AssignmentStatement),
    Declaration(DeclarationStatement),
    Expression(ExpressionStatement),
    Match(MatchStatement),
}

impl Statement {
    pub fn location(&self) -> FileLocation {
        match self {
            Statement::Assignment(a) => a.location,
            Statement::Declaration(d) => d.location,
            Statement::Expression(e) => e.expression.location(),
            Statement::Match(m) => m.expression.location,
        }
    }
}

///
/// Which side of the `=` holds the bare variable. Both `$x = expr` and
/// `expr = $x` are legal assignments.
///
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize, Hash)]
pub enum AssignmentDirection {
    VariableLeft,
    VariableRight,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct AssignmentStatement {
    pub left: Expression,
    pub right: Expression,
    pub direction: AssignmentDirection,
    pub location: FileLocation,
}

impl AssignmentStatement {
    pub fn variable(&self) -> &Expression {
        match self.direction {
            AssignmentDirection::VariableLeft => &self.left,
            AssignmentDirection::VariableRight => &self.right,
        }
    }

    pub fn value(&self) -> &Expression {
        match self.direction {
            AssignmentDirection::VariableLeft => &self.right,
            AssignmentDirection::VariableRight => &self.left,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub enum DeclarationValue {
    String(StringLiteral),
    Boolean(BooleanLiteral),
}

///
/// `name = "value"` or `name = true`, the left side lacks the `$` sigil
///
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct DeclarationStatement {
    pub left: Identifier,
    pub right: DeclarationValue,
    pub location: FileLocation,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct ExpressionStatement {
    pub expression: Expression,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct MatchStatement {
    pub expression: MatchExpression,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub enum Expression {
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    Call(CallExpression),
    ReferenceList(ReferenceListExpression),
    Index(IndexExpression),
    Parenthesized(ParenthesizedExpression),
    Variable(VariableIdentifier),
    String(StringLiteral),
    Integer(IntegerLiteral),
    Float(FloatLiteral),
    Regex(RegexLiteral),
    Null(NullLiteral),
    Boolean(BooleanLiteral),
}

impl Expression {
    pub fn location(&self) -> FileLocation {
        match self {
            Expression::Unary(e) => e.location,
            Expression::Binary(e) => e.location,
            Expression::Call(e) => e.location,
            Expression::ReferenceList(e) => e.location,
            Expression::Index(e) => e.location,
            Expression::Parenthesized(e) => e.location,
            Expression::Variable(e) => e.location,
            Expression::String(e) => e.location,
            Expression::Integer(e) => e.location,
            Expression::Float(e) => e.location,
            Expression::Regex(e) => e.location,
            Expression::Null(e) => e.location,
            Expression::Boolean(e) => e.location,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableIdentifier> {
        match self {
            Expression::Variable(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize, Hash)]
pub enum UnaryOperator {
    All,
    Any,
    Not,
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::All => "all",
            UnaryOperator::Any => "any",
            UnaryOperator::Not => "not",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "all" => Some(UnaryOperator::All),
            "any" => Some(UnaryOperator::Any),
            "not" => Some(UnaryOperator::Not),
            _ => None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub operand: Box<Expression>,
    pub location: FileLocation,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize, Hash)]
pub enum BinaryOperator {
    Multiply,
    Divide,
    Add,
    Subtract,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

//
// Binding strength, low to high. Unary prefix operators bind tighter than
// every binary operator and primaries bind tightest.
//
pub const PRECEDENCE_OR: u8 = 1;
pub const PRECEDENCE_AND: u8 = 2;
pub const PRECEDENCE_COMPARATIVE: u8 = 3;
pub const PRECEDENCE_ADDITIVE: u8 = 4;
pub const PRECEDENCE_MULTIPLICATIVE: u8 = 5;
pub const PRECEDENCE_UNARY: u8 = 6;
pub const PRECEDENCE_PRIMARY: u8 = 7;

impl BinaryOperator {
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Multiply | BinaryOperator::Divide => PRECEDENCE_MULTIPLICATIVE,
            BinaryOperator::Add | BinaryOperator::Subtract => PRECEDENCE_ADDITIVE,
            BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::Lt
            | BinaryOperator::Le
            | BinaryOperator::Gt
            | BinaryOperator::Ge => PRECEDENCE_COMPARATIVE,
            BinaryOperator::And => PRECEDENCE_AND,
            BinaryOperator::Or => PRECEDENCE_OR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub location: FileLocation,
}

///
/// `operand` or `operand.field`, e.g. `re.regex` or `max`
///
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct FunctionName {
    pub operand: String,
    pub field: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct CallExpression {
    pub function: FunctionName,
    pub arguments: Vec<Expression>,
    pub location: FileLocation,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize, Hash)]
pub enum MatchMode {
    None,
    Regex,
    Cidr,
}

///
/// Membership test against an externally managed list,
/// `$x [not] in [regex|cidr] %list_name`
///
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct ReferenceListExpression {
    pub subject: VariableIdentifier,
    pub negated: bool,
    pub match_mode: MatchMode,
    pub list_name: String,
    pub location: FileLocation,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub enum IndexValue {
    String(StringLiteral),
    Integer(IntegerLiteral),
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct IndexExpression {
    pub operand: VariableIdentifier,
    pub index: IndexValue,
    pub location: FileLocation,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct ParenthesizedExpression {
    pub expression: Box<Expression>,
    pub location: FileLocation,
}

///
/// Grouping keys with an optional correlation window. Only ever appears as the
/// whole of a [MatchStatement].
///
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct MatchExpression {
    pub keys: Vec<VariableIdentifier>,
    pub window: Option<MatchWindow>,
    pub location: FileLocation,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct MatchWindow {
    pub negated: bool,
    pub duration: DurationLiteral,
    pub anchor: Option<MatchAnchor>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize, Hash)]
pub enum AnchorRelation {
    Before,
    After,
}

impl AnchorRelation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorRelation::Before => "before",
            AnchorRelation::After => "after",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct MatchAnchor {
    pub relation: AnchorRelation,
    pub variable: VariableIdentifier,
}

///
/// `$name` with an optional attribute path. The attribute keeps its leading
/// dot, `$e.metadata.event_type` has name `e` and attribute `.metadata.event_type`.
///
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct VariableIdentifier {
    pub name: String,
    pub attribute: Option<String>,
    pub location: FileLocation,
}

impl VariableIdentifier {
    pub fn attribute_path(&self) -> Vec<&str> {
        match &self.attribute {
            Some(attribute) => attribute.split('.').filter(|s| !s.is_empty()).collect(),
            None => vec![],
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct Identifier {
    pub name: String,
    pub location: FileLocation,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize, Hash)]
pub enum StringKind {
    Raw,
    Interpreted,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct EscapeSequence {
    pub text: String,
    pub offset: usize,
}

///
/// `value` is the text between the delimiters exactly as written. Raw strings
/// never contain escapes; interpreted strings list every escape sequence found
/// in `escapes`, in order. Use [StringLiteral::decoded] for the runtime value.
///
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct StringLiteral {
    pub kind: StringKind,
    pub value: String,
    pub escapes: Vec<EscapeSequence>,
    pub location: FileLocation,
}

impl StringLiteral {
    pub fn decoded(&self) -> String {
        match self.kind {
            StringKind::Raw => self.value.clone(),
            StringKind::Interpreted => decode_escapes(&self.value),
        }
    }
}

fn decode_escapes(content: &str) -> String {
    let mut decoded = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            decoded.push(ch);
            continue;
        }
        let escaped = match chars.next() {
            Some(c) => c,
            None => break,
        };
        match escaped {
            'a' => decoded.push('\u{07}'),
            'b' => decoded.push('\u{08}'),
            'f' => decoded.push('\u{0C}'),
            'n' => decoded.push('\n'),
            'r' => decoded.push('\r'),
            't' => decoded.push('\t'),
            'v' => decoded.push('\u{0B}'),
            'x' | 'u' | 'U' => {
                let max = match escaped {
                    'u' => 4,
                    'U' => 8,
                    _ => usize::MAX,
                };
                let mut digits = String::new();
                while digits.len() < max {
                    match chars.peek() {
                        Some(c) if c.is_ascii_hexdigit() => {
                            digits.push(*c);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                let code = u32::from_str_radix(&digits, 16).ok();
                decoded.push(code.and_then(char::from_u32).unwrap_or('\u{FFFD}'));
            }
            '0'..='9' => {
                let mut digits = escaped.to_string();
                while digits.len() < 3 {
                    match chars.peek() {
                        Some(c) if c.is_ascii_digit() => {
                            digits.push(*c);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                let code = u32::from_str_radix(&digits, 8)
                    .or_else(|_| digits.parse::<u32>())
                    .ok();
                decoded.push(code.and_then(char::from_u32).unwrap_or('\u{FFFD}'));
            }
            other => decoded.push(other),
        }
    }
    decoded
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct IntegerLiteral {
    pub text: String,
    pub location: FileLocation,
}

impl IntegerLiteral {
    pub fn value(&self) -> Option<u64> {
        self.text.parse().ok()
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct FloatLiteral {
    pub text: String,
    pub location: FileLocation,
}

impl FloatLiteral {
    pub fn value(&self) -> Option<f64> {
        self.text.parse().ok()
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize, Hash)]
pub enum DurationUnit {
    Minutes,
    Hours,
    Days,
}

impl DurationUnit {
    pub fn suffix(&self) -> char {
        match self {
            DurationUnit::Minutes => 'm',
            DurationUnit::Hours => 'h',
            DurationUnit::Days => 'd',
        }
    }

    pub fn seconds(&self) -> u64 {
        match self {
            DurationUnit::Minutes => 60,
            DurationUnit::Hours => 60 * 60,
            DurationUnit::Days => 24 * 60 * 60,
        }
    }
}

impl TryFrom<char> for DurationUnit {
    type Error = char;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'm' => Ok(DurationUnit::Minutes),
            'h' => Ok(DurationUnit::Hours),
            'd' => Ok(DurationUnit::Days),
            other => Err(other),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct DurationLiteral {
    pub amount: String,
    pub unit: DurationUnit,
    pub location: FileLocation,
}

impl DurationLiteral {
    pub fn seconds(&self) -> Option<u64> {
        self.amount
            .parse::<u64>()
            .ok()
            .and_then(|amount| amount.checked_mul(self.unit.seconds()))
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct RegexLiteral {
    pub pattern: String,
    pub location: FileLocation,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct NullLiteral {
    pub location: FileLocation,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Hash)]
pub struct BooleanLiteral {
    pub value: bool,
    pub location: FileLocation,
}

#[cfg(test)]
#[path = "exprs_tests.rs"]
mod exprs_tests;
