// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Formatter;

use crate::rules::exprs::*;

//
// Binding strength of the node when printed, used to decide whether a child
// needs parentheses to parse back into the same shape
//
fn precedence(expression: &Expression) -> u8 {
    match expression {
        Expression::Binary(binary) => binary.operator.precedence(),
        Expression::Unary(_) => PRECEDENCE_UNARY,
        _ => PRECEDENCE_PRIMARY,
    }
}

struct Operand<'e> {
    expression: &'e Expression,
    min_precedence: u8,
}

impl<'e> std::fmt::Display for Operand<'e> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if precedence(self.expression) < self.min_precedence {
            write!(f, "({})", self.expression)
        } else {
            write!(f, "{}", self.expression)
        }
    }
}

fn operand(expression: &Expression, min_precedence: u8) -> Operand<'_> {
    Operand {
        expression,
        min_precedence,
    }
}

impl std::fmt::Display for SourceFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (idx, rule) in self.rules.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{rule}")?;
        }
        Ok(())
    }
}

impl std::fmt::Display for RuleDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "rule {} {{", self.name)?;
        for section in &self.sections {
            write!(f, "{section}")?;
        }
        writeln!(f, "}}")
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  {}:", self.key)?;
        for statement in &self.statements {
            writeln!(f, "    {statement}")?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::Assignment(assignment) => write!(f, "{assignment}"),
            Statement::Declaration(declaration) => write!(f, "{declaration}"),
            Statement::Expression(statement) => write!(f, "{}", statement.expression),
            Statement::Match(statement) => write!(f, "{}", statement.expression),
        }
    }
}

impl std::fmt::Display for AssignmentStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} = {}",
            operand(&self.left, PRECEDENCE_COMPARATIVE),
            operand(&self.right, PRECEDENCE_COMPARATIVE + 1)
        )
    }
}

impl std::fmt::Display for DeclarationStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.right {
            DeclarationValue::String(value) => write!(f, "{} = {}", self.left.name, value),
            DeclarationValue::Boolean(value) => write!(f, "{} = {}", self.left.name, value),
        }
    }
}

impl std::fmt::Display for MatchExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (idx, key) in self.keys.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}")?;
        }
        if let Some(window) = &self.window {
            if window.negated {
                f.write_str(" not")?;
            }
            write!(f, " over {}", window.duration)?;
            if let Some(anchor) = &window.anchor {
                write!(f, " {} {}", anchor.relation.as_str(), anchor.variable)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Unary(unary) => write!(
                f,
                "{} {}",
                unary.operator.as_str(),
                operand(&unary.operand, PRECEDENCE_UNARY)
            ),

            Expression::Binary(binary) => {
                let precedence = binary.operator.precedence();
                write!(
                    f,
                    "{} {} {}",
                    operand(&binary.left, precedence),
                    binary.operator.as_str(),
                    operand(&binary.right, precedence + 1)
                )
            }

            Expression::Call(call) => {
                f.write_str(&call.function.operand)?;
                if let Some(field) = &call.function.field {
                    write!(f, ".{field}")?;
                }
                f.write_str("(")?;
                for (idx, argument) in call.arguments.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                f.write_str(")")
            }

            Expression::ReferenceList(list) => {
                write!(f, "{}", list.subject)?;
                if list.negated {
                    f.write_str(" not")?;
                }
                f.write_str(" in")?;
                match list.match_mode {
                    MatchMode::None => {}
                    MatchMode::Regex => f.write_str(" regex")?,
                    MatchMode::Cidr => f.write_str(" cidr")?,
                }
                write!(f, " %{}", list.list_name)
            }

            Expression::Index(index) => match &index.index {
                IndexValue::String(value) => write!(f, "{}[{}]", index.operand, value),
                IndexValue::Integer(value) => write!(f, "{}[{}]", index.operand, value.text),
            },

            Expression::Parenthesized(inner) => write!(f, "({})", inner.expression),
            Expression::Variable(variable) => write!(f, "{variable}"),
            Expression::String(value) => write!(f, "{value}"),
            Expression::Integer(value) => f.write_str(&value.text),
            Expression::Float(value) => f.write_str(&value.text),
            Expression::Regex(regex) => write!(f, "/{}/", regex.pattern),
            Expression::Null(_) => f.write_str("null"),
            Expression::Boolean(value) => write!(f, "{value}"),
        }
    }
}

impl std::fmt::Display for VariableIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.name)?;
        if let Some(attribute) = &self.attribute {
            f.write_str(attribute)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for StringLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            StringKind::Raw => write!(f, "`{}`", self.value),
            StringKind::Interpreted => write!(f, "\"{}\"", self.value),
        }
    }
}

impl std::fmt::Display for BooleanLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.value { "true" } else { "false" })
    }
}

impl std::fmt::Display for DurationLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod display_tests;
