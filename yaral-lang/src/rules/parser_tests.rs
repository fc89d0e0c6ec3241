// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use indoc::indoc;
use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;
use crate::rules::errors::{Category, LexicalErrorKind};
use crate::{parse, parse_with_options};

fn statements(section: &str, body: &str) -> Vec<Statement> {
    let source = format!("rule r {{\n  {section}:\n    {body}\n}}\n");
    let parsed = parse(&source);
    assert!(parsed.is_ok(), "errors parsing {}: {:?}", source, parsed.diagnostics);
    let mut rules = parsed.source_file.rules;
    assert_eq!(rules.len(), 1);
    let mut sections = rules.remove(0).sections;
    assert_eq!(sections.len(), 1);
    sections.remove(0).statements
}

fn statement_sexps(section: &str, body: &str) -> Vec<String> {
    statements(section, body)
        .iter()
        .map(Statement::to_sexp)
        .collect()
}

#[test]
fn empty_input_has_no_rules() {
    let parsed = parse("  // nothing here\n");
    assert!(parsed.is_ok());
    assert_eq!(parsed.source_file, SourceFile { rules: vec![] });
}

#[test]
fn rule_with_every_section() {
    let source = indoc! {r#"
        rule suspicious_login {
          meta:
            author = "secops"
            enabled = true
          events:
            $e.metadata.event_type = "USER_LOGIN"
            $e.principal.user.userid = $user
          match:
            $user over 10m
          outcome:
            $risk = max(50)
          condition:
            $e
          options:
            allow_zero_values = false
        }
    "#};
    let parsed = parse(source);
    assert!(parsed.is_ok(), "{:?}", parsed.diagnostics);
    let rule = &parsed.source_file.rules[0];
    assert_eq!(rule.name, "suspicious_login");
    assert_eq!(
        rule.sections.iter().map(|s| s.key).collect::<Vec<_>>(),
        vec![
            SectionKey::Meta,
            SectionKey::Events,
            SectionKey::Match,
            SectionKey::Outcome,
            SectionKey::Condition,
            SectionKey::Options,
        ]
    );
    assert_eq!(
        rule.sections
            .iter()
            .map(|s| s.statements.len())
            .collect::<Vec<_>>(),
        vec![2, 2, 1, 1, 1, 1]
    );
    assert_eq!(rule.location, FileLocation { line: 1, column: 1, offset: 0 });
}

#[test]
fn empty_sections_and_rules() {
    let parsed = parse("rule a {}\nrule b { meta: condition: }");
    assert!(parsed.is_ok());
    assert_eq!(
        parsed.source_file.to_sexp(),
        "(source_file (rule_definition a) (rule_definition b (section meta) (section condition)))"
    );
}

#[rstest]
#[case("$x = 5", "(assignment_statement $x 5)")]
#[case("5 = $x", "(assignment_statement 5 $x)")]
#[case("$x = $y", "(assignment_statement $x $y)")]
#[case("$e.target.ip = $ip", "(assignment_statement $e.target.ip $ip)")]
#[case(
    "$total = sum($e.bytes) + 1",
    "(assignment_statement $total (binary_expression + (call_expression sum $e.bytes) 1))"
)]
#[case(
    "($x = 5)",
    "(expression_statement (parenthesized_expression (binary_expression = $x 5)))"
)]
#[case("$x = 5 and $y", "(expression_statement (binary_expression and (binary_expression = $x 5) $y))")]
#[case("1 = 2", "(expression_statement (binary_expression = 1 2))")]
#[case("$x != 5", "(expression_statement (binary_expression != $x 5))")]
#[case("name = \"value\"", "(declaration_statement name \"value\")")]
#[case("raw = `value`", "(declaration_statement raw `value`)")]
#[case("flag = true", "(declaration_statement flag true)")]
#[case("true = $x", "(assignment_statement true $x)")]
fn statement_classification(#[case] body: &str, #[case] expected: &str) {
    assert_eq!(statement_sexps("events", body), vec![expected.to_string()]);
}

#[test]
fn assignment_direction() {
    let found = statements("outcome", "$x = 5\n5 = $x\n$a = $b");
    let directions = found
        .iter()
        .map(|s| match s {
            Statement::Assignment(a) => a.direction,
            other => panic!("unexpected {:?}", other),
        })
        .collect::<Vec<_>>();
    assert_eq!(
        directions,
        vec![
            AssignmentDirection::VariableLeft,
            AssignmentDirection::VariableRight,
            AssignmentDirection::VariableLeft,
        ]
    );
    match &found[1] {
        Statement::Assignment(a) => {
            assert_eq!(a.variable().as_variable().map(|v| v.name.as_str()), Some("x"));
            assert!(matches!(a.value(), Expression::Integer(_)));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn statements_are_separated_by_layout_only() {
    assert_eq!(
        statement_sexps("events", "$a.x = 1 $b.y = \"two\" $c.z != 3"),
        vec![
            "(assignment_statement $a.x 1)",
            "(assignment_statement $b.y \"two\")",
            "(expression_statement (binary_expression != $c.z 3))",
        ]
    );
}

#[rstest]
#[case("$a, $b over 5m after $a", "(match_statement (match_expression $a $b over 5m after $a))")]
#[case("$user over 1h", "(match_statement (match_expression $user over 1h))")]
#[case("$user not over 2d", "(match_statement (match_expression $user not over 2d))")]
#[case("$a, $b, $c", "(match_statement (match_expression $a $b $c))")]
#[case("$host", "(match_statement (match_expression $host))")]
#[case(
    "$h over 5m before $e.ts",
    "(match_statement (match_expression $h over 5m before $e.ts))"
)]
fn match_statements(#[case] body: &str, #[case] expected: &str) {
    assert_eq!(statement_sexps("match", body), vec![expected.to_string()]);
}

#[test]
fn match_expression_fields() {
    let found = statements("match", "$a, $b over 5m after $a");
    let expression = match &found[0] {
        Statement::Match(statement) => &statement.expression,
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(
        expression.keys.iter().map(|k| k.name.as_str()).collect::<Vec<_>>(),
        vec!["a", "b"]
    );
    let window = expression.window.as_ref().unwrap();
    assert!(!window.negated);
    assert_eq!(window.duration.amount, "5");
    assert_eq!(window.duration.unit, DurationUnit::Minutes);
    assert_eq!(window.duration.seconds(), Some(300));
    let anchor = window.anchor.as_ref().unwrap();
    assert_eq!(anchor.relation, AnchorRelation::After);
    assert_eq!(anchor.variable.name, "a");
}

#[test]
fn lone_variable_outside_match_section_is_an_expression() {
    assert_eq!(
        statement_sexps("condition", "$e"),
        vec!["(expression_statement $e)"]
    );
    assert_eq!(
        statement_sexps("outcome", "$a, $b"),
        vec!["(match_statement (match_expression $a $b))"]
    );
}

#[test]
fn match_section_variable_followed_by_operator_is_an_expression() {
    assert_eq!(
        statement_sexps("match", "$a = $b"),
        vec!["(assignment_statement $a $b)"]
    );
}

#[test]
fn duplicate_sections_are_preserved_in_order() {
    let parsed = parse("rule r { events: $a.x = 1 events: $b.y = 2 condition: $a }");
    assert!(parsed.is_ok());
    assert_eq!(
        parsed.source_file.rules[0]
            .sections_with_key(SectionKey::Events)
            .count(),
        2
    );
}

#[test]
fn unknown_section_is_reported_and_skipped() {
    let source = indoc! {r#"
        rule r {
          events:
            $e.x = 1
          foo:
            $e.y = 2
            bar(1, 2)
          condition:
            $e
        }
    "#};
    let parsed = parse(source);
    assert_eq!(parsed.diagnostics.len(), 1);
    let diagnostic = &parsed.diagnostics[0];
    assert_eq!(diagnostic.category, Category::Syntax);
    assert_eq!(
        diagnostic.message,
        "expected section key (condition, events, match, meta, options, outcome), found `foo` (in rule r)"
    );
    assert_eq!(diagnostic.location.line, 4);
    assert_eq!(diagnostic.location.column, 3);
    assert_eq!(
        parsed.source_file.to_sexp(),
        "(source_file (rule_definition r (section events (assignment_statement $e.x 1)) (section condition (expression_statement $e))))"
    );
}

#[test]
fn bad_statement_resynchronizes_at_next_section() {
    let source = indoc! {r#"
        rule r {
          events:
            $e.x = )
            $e.y = 2
          condition:
            $e
        }
        rule s {
          condition:
            $f
        }
    "#};
    let parsed = parse(source);
    assert_eq!(parsed.errors().len(), 1);
    match &parsed.errors()[0] {
        Error::SyntaxError {
            expected,
            found,
            context,
            location,
        } => {
            assert_eq!(expected, "expression");
            assert_eq!(found, "`)`");
            assert_eq!(context, "rule r/section events");
            assert_eq!((location.line, location.column), (3, 12));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        parsed.source_file.to_sexp(),
        "(source_file (rule_definition r (section events) (section condition (expression_statement $e))) (rule_definition s (section condition (expression_statement $f))))"
    );
}

#[test]
fn lexical_error_is_reported_once_and_parsing_continues() {
    let source = indoc! {r#"
        rule r {
          events:
            $e.x = "\x1"
          condition:
            $e
        }
    "#};
    let parsed = parse(source);
    assert_eq!(parsed.diagnostics.len(), 1);
    assert_eq!(parsed.diagnostics[0].category, Category::Lexical);
    assert_eq!(
        parsed.errors()[0],
        Error::LexicalError {
            kind: LexicalErrorKind::InvalidEscape("\\x1".to_string()),
            location: FileLocation {
                line: 3,
                column: 13,
                offset: 31,
            },
        }
    );
    assert_eq!(parsed.source_file.rules[0].sections.len(), 2);
}

#[test]
fn missing_closing_brace_before_next_rule() {
    let parsed = parse("rule a {\n  condition:\n    $a\nrule b {\n  condition:\n    $b\n}\n");
    assert_eq!(parsed.errors().len(), 1);
    match &parsed.errors()[0] {
        Error::SyntaxError {
            expected, found, ..
        } => {
            assert_eq!(expected, "`}`");
            assert_eq!(found, "`rule`");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        parsed
            .source_file
            .rules
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>(),
        vec!["a", "b"]
    );
}

#[test]
fn missing_closing_brace_at_end_of_input() {
    let parsed = parse("rule a {\n  condition:\n    $a\n");
    assert_eq!(parsed.errors().len(), 1);
    match &parsed.errors()[0] {
        Error::SyntaxError {
            expected,
            found,
            location,
            ..
        } => {
            assert_eq!(expected, "`}`");
            assert_eq!(found, "end of input");
            assert_eq!(location.line, 4);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(parsed.source_file.rules.len(), 1);
}

#[rstest]
#[case("rule {}", "rule name", "`{`")]
#[case("rule r condition: $a }", "`{`", "`condition`")]
#[case("events: $a", "`rule`", "`events`")]
fn header_errors(#[case] source: &str, #[case] expected: &str, #[case] found: &str) {
    let parsed = parse(source);
    match parsed.errors().first() {
        Some(Error::SyntaxError {
            expected: e,
            found: f,
            ..
        }) => {
            assert_eq!(e, expected);
            assert_eq!(f, found);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[rstest]
#[case("condition: conditon", "expression", "`conditon`", (1, 21))]
#[case("events: $e.x = \"a\" nocase", "expression", "`nocase`", (1, 29))]
#[case("events: $e.x = any", "expression", "`any`", (1, 25))]
#[case("meta: count = 5", "string or boolean value", "`5`", (1, 24))]
#[case("meta: name = $e", "string or boolean value", "`$e`", (1, 23))]
fn misplaced_identifiers_and_declarations(
    #[case] body: &str,
    #[case] expected: &str,
    #[case] found: &str,
    #[case] at: (u32, u32),
) {
    let source = format!("rule r {{ {} }}", body);
    let parsed = parse(&source);
    assert_eq!(parsed.errors().len(), 1, "{:?}", parsed.diagnostics);
    match &parsed.errors()[0] {
        Error::SyntaxError {
            expected: e,
            found: f,
            location,
            ..
        } => {
            assert_eq!(e, expected);
            assert_eq!(f, found);
            assert_eq!((location.line, location.column), at);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn statement_after_bad_escape_on_same_line_is_kept() {
    let parsed = parse(r#"rule r { events: $e.x = "\x1" $e.y = 2 } rule s { condition: $f }"#);
    assert_eq!(parsed.diagnostics.len(), 1, "{:?}", parsed.diagnostics);
    assert_eq!(parsed.diagnostics[0].category, Category::Lexical);
    assert_eq!(
        parsed.source_file.to_sexp(),
        "(source_file (rule_definition r (section events (assignment_statement $e.y 2))) (rule_definition s (section condition (expression_statement $f))))"
    );
}

#[test]
fn bad_escape_inside_expression_skips_the_statement() {
    let source = indoc! {r#"
        rule r {
          events:
            re.regex($e.x, "\q\x") and $e.y = 1
            $e.z = 2
          condition:
            $e
        }
    "#};
    let parsed = parse(source);
    assert_eq!(parsed.diagnostics.len(), 1, "{:?}", parsed.diagnostics);
    assert_eq!(
        parsed.source_file.to_sexp(),
        "(source_file (rule_definition r (section events) (section condition (expression_statement $e))))"
    );
}

#[test]
fn deeply_nested_statement_is_reported_and_skipped() {
    let source = format!(
        "rule r {{\n  condition:\n    {}$e{}\n}}\nrule s {{ condition: $f }}",
        "(".repeat(5000),
        ")".repeat(5000)
    );
    let parsed = parse(&source);
    assert_eq!(parsed.errors().len(), 1);
    match &parsed.errors()[0] {
        Error::SyntaxError {
            expected,
            found,
            context,
            location,
        } => {
            assert_eq!(expected, "expression nested at most 64 deep");
            assert_eq!(found, "`(`");
            assert_eq!(context, "rule r/section condition");
            assert_eq!((location.line, location.column), (3, 69));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        parsed.source_file.to_sexp(),
        "(source_file (rule_definition r (section condition)) (rule_definition s (section condition (expression_statement $f))))"
    );
}

#[test]
fn fail_fast_stops_at_first_error() {
    let source = indoc! {r#"
        rule r {
          events:
            $e.x = )
          foo:
            $e.y = 2
        }
        rule s {
          condition:
            $f
        }
    "#};
    let recovered = parse(source);
    assert_eq!(recovered.errors().len(), 2);
    assert_eq!(recovered.source_file.rules.len(), 2);

    let options = ParseOptions {
        file_name: "fast.yaral",
        recover: false,
    };
    let parsed = parse_with_options(source, options);
    assert_eq!(parsed.errors().len(), 1);
    assert_eq!(parsed.diagnostics[0].file_name, "fast.yaral");
    assert_eq!(
        parsed.diagnostics[0].to_string(),
        "fast.yaral:3:12: error[syntax]: expected expression, found `)` (in rule r/section events)"
    );
    assert_eq!(parsed.source_file.rules.len(), 1);
    assert_eq!(parsed.source_file.rules[0].name, "r");
}

#[test]
fn stray_tokens_between_rules() {
    let parsed = parse("} rule a { condition: $a } ) rule b {}");
    assert_eq!(parsed.errors().len(), 2);
    assert_eq!(parsed.source_file.rules.len(), 2);
}
