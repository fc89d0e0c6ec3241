// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//
// Position free S-expression rendering of the tree. Interior nodes use the
// grammar's node names, operators and leaves are written inline as source
// text, e.g.
//
//   (binary_expression or (binary_expression and $a $b) $c)
//

use std::fmt::Write;

use crate::rules::exprs::*;

fn open(out: &mut String, node: &str) {
    out.push('(');
    out.push_str(node);
}

fn atom(out: &mut String, text: impl std::fmt::Display) {
    // writing into a String never fails
    let _ = write!(out, " {text}");
}

impl SourceFile {
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        open(&mut out, "source_file");
        for rule in &self.rules {
            out.push(' ');
            rule.write_sexp(&mut out);
        }
        out.push(')');
        out
    }
}

impl RuleDefinition {
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        open(out, "rule_definition");
        atom(out, &self.name);
        for section in &self.sections {
            out.push(' ');
            section.write_sexp(out);
        }
        out.push(')');
    }
}

impl Section {
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        open(out, "section");
        atom(out, self.key);
        for statement in &self.statements {
            out.push(' ');
            statement.write_sexp(out);
        }
        out.push(')');
    }
}

impl Statement {
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        match self {
            Statement::Assignment(assignment) => {
                open(out, "assignment_statement");
                out.push(' ');
                assignment.left.write_sexp(out);
                out.push(' ');
                assignment.right.write_sexp(out);
            }
            Statement::Declaration(declaration) => {
                open(out, "declaration_statement");
                atom(out, &declaration.left.name);
                match &declaration.right {
                    DeclarationValue::String(value) => atom(out, value),
                    DeclarationValue::Boolean(value) => atom(out, value),
                }
            }
            Statement::Expression(statement) => {
                open(out, "expression_statement");
                out.push(' ');
                statement.expression.write_sexp(out);
            }
            Statement::Match(statement) => {
                open(out, "match_statement");
                out.push(' ');
                statement.expression.write_sexp(out);
            }
        }
        out.push(')');
    }
}

impl MatchExpression {
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        open(out, "match_expression");
        for key in &self.keys {
            atom(out, key);
        }
        if let Some(window) = &self.window {
            if window.negated {
                atom(out, "not");
            }
            atom(out, "over");
            atom(out, &window.duration);
            if let Some(anchor) = &window.anchor {
                atom(out, anchor.relation.as_str());
                atom(out, &anchor.variable);
            }
        }
        out.push(')');
    }
}

impl Expression {
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        match self {
            Expression::Unary(unary) => {
                open(out, "unary_expression");
                atom(out, unary.operator.as_str());
                out.push(' ');
                unary.operand.write_sexp(out);
            }
            Expression::Binary(binary) => {
                open(out, "binary_expression");
                atom(out, binary.operator.as_str());
                out.push(' ');
                binary.left.write_sexp(out);
                out.push(' ');
                binary.right.write_sexp(out);
            }
            Expression::Call(call) => {
                open(out, "call_expression");
                match &call.function.field {
                    Some(field) => atom(out, format!("{}.{}", call.function.operand, field)),
                    None => atom(out, &call.function.operand),
                }
                for argument in &call.arguments {
                    out.push(' ');
                    argument.write_sexp(out);
                }
            }
            Expression::ReferenceList(list) => {
                open(out, "reference_list_expression");
                atom(out, &list.subject);
                if list.negated {
                    atom(out, "not");
                }
                atom(out, "in");
                match list.match_mode {
                    MatchMode::None => {}
                    MatchMode::Regex => atom(out, "regex"),
                    MatchMode::Cidr => atom(out, "cidr"),
                }
                atom(out, format!("%{}", list.list_name));
            }
            Expression::Index(index) => {
                open(out, "index_expression");
                atom(out, &index.operand);
                match &index.index {
                    IndexValue::String(value) => atom(out, value),
                    IndexValue::Integer(value) => atom(out, &value.text),
                }
            }
            Expression::Parenthesized(inner) => {
                open(out, "parenthesized_expression");
                out.push(' ');
                inner.expression.write_sexp(out);
            }
            leaf => {
                let _ = write!(out, "{leaf}");
                return;
            }
        }
        out.push(')');
    }
}

#[cfg(test)]
#[path = "sexp_tests.rs"]
mod sexp_tests;
