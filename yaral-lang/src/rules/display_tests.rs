// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use indoc::indoc;
use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;
use crate::parse;

fn at() -> FileLocation {
    FileLocation::default()
}

fn int(text: &str) -> Expression {
    Expression::Integer(IntegerLiteral {
        text: text.to_string(),
        location: at(),
    })
}

fn var(name: &str) -> Expression {
    Expression::Variable(VariableIdentifier {
        name: name.to_string(),
        attribute: None,
        location: at(),
    })
}

fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::Binary(BinaryExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
        location: at(),
    })
}

#[rstest]
#[case(
    binary(BinaryOperator::Subtract, binary(BinaryOperator::Subtract, int("1"), int("2")), int("3")),
    "1 - 2 - 3"
)]
#[case(
    binary(BinaryOperator::Subtract, int("1"), binary(BinaryOperator::Subtract, int("2"), int("3"))),
    "1 - (2 - 3)"
)]
#[case(
    binary(BinaryOperator::Multiply, binary(BinaryOperator::Add, int("1"), int("2")), int("3")),
    "(1 + 2) * 3"
)]
#[case(
    binary(BinaryOperator::And, binary(BinaryOperator::Or, var("a"), var("b")), var("c")),
    "($a or $b) and $c"
)]
#[case(
    Expression::Unary(UnaryExpression {
        operator: UnaryOperator::Not,
        operand: Box::new(binary(BinaryOperator::And, var("a"), var("b"))),
        location: at(),
    }),
    "not ($a and $b)"
)]
fn hand_built_trees_get_grouping_parentheses(#[case] expression: Expression, #[case] expected: &str) {
    assert_eq!(expression.to_string(), expected);
}

#[test]
fn assignment_value_of_lower_precedence_is_grouped() {
    let statement = AssignmentStatement {
        left: var("x"),
        right: binary(BinaryOperator::Or, var("a"), var("b")),
        direction: AssignmentDirection::VariableLeft,
        location: at(),
    };
    assert_eq!(statement.to_string(), "$x = ($a or $b)");
}

#[rstest]
#[case("$e.x = \"a\\tb\"")]
#[case("$e.x = `raw\\text`")]
#[case("$e.x = /^a\\/b$/")]
#[case("$x in regex %list")]
#[case("$x not in cidr %ranges")]
#[case("$e.labels[\"k\"] = 1.5")]
#[case("not ($a or $b) and any $c")]
#[case("re.regex($e.x, `a`) and strings.lower($e.y) != null")]
#[case("1 - (2 - 3) * 4 / 5")]
fn expressions_print_as_written(#[case] source: &str) {
    let parsed = parse(&format!("rule r {{ events: {source} }}"));
    assert!(parsed.is_ok(), "{:?}", parsed.diagnostics);
    let statement = &parsed.source_file.rules[0].sections[0].statements[0];
    assert_eq!(statement.to_string(), source);
}

#[test]
fn whole_file_round_trips() {
    let source = indoc! {r#"
        rule login_burst {
          meta:
            author = "secops"
            enabled = true
          events:
            $e.metadata.event_type = "USER_LOGIN"
            $e.principal.user.userid = $user
            $e.target.ip not in cidr %corp_ranges
            re.regex($e.target.url, `.*\.exe$`)
          match:
            $user over 10m after $e
          outcome:
            $risk = max(10 + 5 * 2)
          condition:
            $e and not $f or $g
        }
        rule empty {
        }
    "#};
    let first = parse(source);
    assert!(first.is_ok(), "{:?}", first.diagnostics);
    let printed = first.source_file.to_string();
    let second = parse(&printed);
    assert!(second.is_ok(), "{:?}\n{}", second.diagnostics, printed);
    assert_eq!(second.source_file.to_sexp(), first.source_file.to_sexp());
}

#[test]
fn rule_layout() {
    let parsed = parse("rule r { match: $a, $b not over 1h before $c condition: $a }");
    assert_eq!(
        parsed.source_file.to_string(),
        indoc! {"
            rule r {
              match:
                $a, $b not over 1h before $c
              condition:
                $a
            }
        "}
    );
}
