// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::collections::VecDeque;

use log::debug;

use crate::rules::errors::Error;
use crate::rules::exprs::*;
use crate::rules::lexer::{Lexer, Punctuation, Token, TokenKind};
use crate::rules::Result;
use crate::ParseOptions;

mod expr;

//
// Deepest chain of parenthesized, unary or argument expressions accepted
// before the statement is rejected
//
const MAX_NESTING: usize = 64;

const SECTION_KEYS: &str = "section key (condition, events, match, meta, options, outcome)";

///
/// Hand written recursive descent parser over the token stream. Rules,
/// sections and statements are handled here; everything in an expression
/// position is delegated to the precedence climbing routines in [expr].
///
/// Errors never unwind the whole parse. Each one is recorded and the parser
/// skips ahead to the next section key, closing `}` or `rule` before carrying
/// on, unless recovery is switched off in which case it stops at the first
/// error.
///
pub(crate) struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: VecDeque<Result<Token<'a>>>,
    options: ParseOptions<'a>,
    errors: Vec<Error>,
    halted: bool,
    rule: Option<String>,
    section: Option<SectionKey>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(source: &'a str, options: ParseOptions<'a>) -> Self {
        Parser {
            lexer: Lexer::new(source, options.file_name),
            lookahead: VecDeque::new(),
            options,
            errors: Vec::new(),
            halted: false,
            rule: None,
            section: None,
            depth: 0,
        }
    }

    pub(crate) fn into_errors(self) -> Vec<Error> {
        self.errors
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    //                                                                                            //
    //                          Token stream helpers                                              //
    //                                                                                            //
    ////////////////////////////////////////////////////////////////////////////////////////////////

    fn fill(&mut self, n: usize) {
        while self.lookahead.len() <= n {
            match self.lexer.next_token() {
                Ok(Some(token)) => self.lookahead.push_back(Ok(token)),
                Ok(None) => return,
                Err(error) => self.lookahead.push_back(Err(error)),
            }
        }
    }

    fn peek_nth(&mut self, n: usize) -> Option<&Token<'a>> {
        self.fill(n);
        match self.lookahead.get(n) {
            Some(Ok(token)) => Some(token),
            _ => None,
        }
    }

    fn peek(&mut self) -> Option<&Token<'a>> {
        self.peek_nth(0)
    }

    fn at_end(&mut self) -> bool {
        self.fill(0);
        self.lookahead.is_empty()
    }

    fn at_punctuation_nth(&mut self, n: usize, punctuation: Punctuation) -> bool {
        self.peek_nth(n)
            .map_or(false, |t| t.is_punctuation(punctuation))
    }

    fn at_punctuation(&mut self, punctuation: Punctuation) -> bool {
        self.at_punctuation_nth(0, punctuation)
    }

    fn at_keyword_nth(&mut self, n: usize, keyword: &str) -> bool {
        self.peek_nth(n).map_or(false, |t| t.is_keyword(keyword))
    }

    fn at_keyword(&mut self, keyword: &str) -> bool {
        self.at_keyword_nth(0, keyword)
    }

    fn at_identifier_nth(&mut self, n: usize) -> bool {
        matches!(
            self.peek_nth(n),
            Some(Token {
                kind: TokenKind::Identifier(_),
                ..
            })
        )
    }

    fn at_variable_nth(&mut self, n: usize) -> bool {
        matches!(
            self.peek_nth(n),
            Some(Token {
                kind: TokenKind::Variable { .. },
                ..
            })
        )
    }

    fn next(&mut self) -> Option<Result<Token<'a>>> {
        self.fill(0);
        self.lookahead.pop_front()
    }

    fn bump(&mut self, expected: &str) -> Result<Token<'a>> {
        match self.next() {
            Some(token) => token,
            None => Err(self.unexpected(expected)),
        }
    }

    fn expect_punctuation(&mut self, punctuation: Punctuation, expected: &str) -> Result<Token<'a>> {
        if self.at_punctuation(punctuation) {
            self.bump(expected)
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<(String, FileLocation)> {
        if let Some(Token {
            kind: TokenKind::Identifier(name),
            span,
        }) = self.peek()
        {
            let found = (name.to_string(), FileLocation::from(*span));
            self.next();
            return Ok(found);
        }
        Err(self.unexpected(expected))
    }

    fn expect_variable(&mut self) -> Result<VariableIdentifier> {
        if let Some(Token {
            kind: TokenKind::Variable { name, attribute },
            span,
        }) = self.peek()
        {
            let variable = VariableIdentifier {
                name: name.to_string(),
                attribute: attribute.map(String::from),
                location: FileLocation::from(*span),
            };
            self.next();
            return Ok(variable);
        }
        Err(self.unexpected("variable identifier"))
    }

    fn context(&self) -> String {
        match (&self.rule, self.section) {
            (Some(rule), Some(section)) => format!("rule {rule}/section {section}"),
            (Some(rule), None) => format!("rule {rule}"),
            _ => "source file".to_string(),
        }
    }

    fn syntax_error(&self, expected: &str, found: String, location: FileLocation) -> Error {
        Error::SyntaxError {
            expected: expected.to_string(),
            found,
            context: self.context(),
            location,
        }
    }

    //
    // Error describing the token at the head of the stream. A lexical error
    // sitting at the head is the real cause and is returned as is.
    //
    fn unexpected(&mut self, expected: &str) -> Error {
        self.fill(0);
        let (found, location) = match self.lookahead.front() {
            Some(Err(error)) => return error.clone(),
            Some(Ok(token)) => (token.describe(), token.location()),
            None => ("end of input".to_string(), self.lexer.end_location()),
        };
        self.syntax_error(expected, found, location)
    }

    fn report(&mut self, error: Error) {
        if self.halted || self.errors.last() == Some(&error) {
            return;
        }
        debug!("Recording {error}");
        self.errors.push(error);
        if !self.options.recover {
            self.halted = true;
        }
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    //                                                                                            //
    //                          Recovery                                                          //
    //                                                                                            //
    ////////////////////////////////////////////////////////////////////////////////////////////////

    //
    // Section key (known or not), the closing brace of the rule or the start of
    // the next rule
    //
    fn at_section_boundary(&mut self) -> bool {
        self.at_end()
            || self.at_punctuation(Punctuation::RightBrace)
            || (self.at_identifier_nth(0) && self.at_punctuation_nth(1, Punctuation::Colon))
            || self.at_rule_start()
    }

    fn at_rule_start(&mut self) -> bool {
        self.at_keyword("rule") && self.at_identifier_nth(1)
    }

    //
    // Skips tokens up to the next boundary outside of any braces opened while
    // skipping. Lexical errors met on the way are reported as well.
    //
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        loop {
            if self.halted {
                return;
            }
            if depth == 0 && self.at_section_boundary() {
                break;
            }
            match self.next() {
                None => break,
                Some(Err(error)) => self.report(error),
                Some(Ok(token)) => {
                    if token.is_punctuation(Punctuation::LeftBrace) {
                        depth += 1;
                    } else if token.is_punctuation(Punctuation::RightBrace) {
                        depth = depth.saturating_sub(1);
                    }
                }
            }
        }
        let at = match self.peek() {
            Some(token) => token.location(),
            None => self.lexer.end_location(),
        };
        debug!("Resynchronized at {} when handling {}", at, self.context());
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    //                                                                                            //
    //                          Rules and sections                                                //
    //                                                                                            //
    ////////////////////////////////////////////////////////////////////////////////////////////////

    //
    //  source-file = *rule-definition
    //
    pub(crate) fn source_file(&mut self) -> SourceFile {
        let mut rules = Vec::new();
        while !self.halted && !self.at_end() {
            if self.at_keyword("rule") {
                match self.rule_definition() {
                    Ok(rule) => rules.push(rule),
                    Err(error) => {
                        self.report(error);
                        self.synchronize();
                    }
                }
                self.rule = None;
                self.section = None;
                continue;
            }

            let error = self.unexpected("`rule`");
            self.report(error);
            self.next();
            self.synchronize();
        }
        SourceFile { rules }
    }

    //
    //  rule-definition = "rule" identifier "{" *section "}"
    //
    fn rule_definition(&mut self) -> Result<RuleDefinition> {
        let keyword = self.bump("`rule`")?;
        let (name, _) = self.expect_identifier("rule name")?;
        self.rule = Some(name.clone());
        self.expect_punctuation(Punctuation::LeftBrace, "`{`")?;

        let mut sections = Vec::new();
        loop {
            if self.halted {
                break;
            }
            if self.at_punctuation(Punctuation::RightBrace) {
                self.next();
                break;
            }
            if self.at_end() || self.at_rule_start() {
                let error = self.unexpected("`}`");
                self.report(error);
                break;
            }
            if self.at_identifier_nth(0) && self.at_punctuation_nth(1, Punctuation::Colon) {
                if let Some(section) = self.section()? {
                    sections.push(section);
                }
                continue;
            }

            let error = self.unexpected(SECTION_KEYS);
            self.report(error);
            self.synchronize();
        }

        debug!("Parsed rule {} with {} section(s)", name, sections.len());
        Ok(RuleDefinition {
            name,
            sections,
            location: keyword.location(),
        })
    }

    //
    //  section = section-key ":" *statement
    //
    // An unknown key is reported and its statements are skipped, the next
    // section still parses.
    //
    fn section(&mut self) -> Result<Option<Section>> {
        self.section = None;
        let (name, location) = self.expect_identifier(SECTION_KEYS)?;
        let key = match name.parse::<SectionKey>() {
            Ok(key) => key,
            Err(_) => {
                let error = self.syntax_error(SECTION_KEYS, format!("`{name}`"), location);
                self.report(error);
                self.next();
                self.synchronize();
                return Ok(None);
            }
        };
        self.expect_punctuation(Punctuation::Colon, "`:`")?;
        self.section = Some(key);

        let mut statements = Vec::new();
        while !self.halted && !self.at_section_boundary() {
            match self.statement(key) {
                Ok(statement) => statements.push(statement),
                Err(error) => {
                    let lexical =
                        matches!(self.lookahead.front(), Some(Err(head)) if *head == error);
                    self.report(error);
                    if lexical {
                        // the lexer already moved past the malformed token
                        self.next();
                        if self.at_operand_start() {
                            continue;
                        }
                    }
                    self.synchronize();
                }
            }
        }

        debug!(
            "Parsed section {} with {} statement(s)",
            key,
            statements.len()
        );
        self.section = None;
        Ok(Some(Section {
            key,
            statements,
            location,
        }))
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    //                                                                                            //
    //                          Statements                                                        //
    //                                                                                            //
    ////////////////////////////////////////////////////////////////////////////////////////////////

    fn statement(&mut self, key: SectionKey) -> Result<Statement> {
        if self.at_match_statement(key) {
            let expression = self.match_expression()?;
            return Ok(Statement::Match(MatchStatement { expression }));
        }
        if self.at_declaration() {
            return self.declaration();
        }
        let expression = self.expression()?;
        Ok(classify(expression))
    }

    //
    // A plain identifier can only start a statement as the name of a
    // declaration. The literal keywords still start expressions.
    //
    fn at_declaration(&mut self) -> bool {
        let literal =
            self.at_keyword("true") || self.at_keyword("false") || self.at_keyword("null");
        !literal && self.at_identifier_nth(0) && self.at_punctuation_nth(1, Punctuation::Eq)
    }

    //
    //  declaration = identifier "=" (string / "true" / "false")
    //
    fn declaration(&mut self) -> Result<Statement> {
        let (name, location) = self.expect_identifier("identifier")?;
        self.expect_punctuation(Punctuation::Eq, "`=`")?;
        let right = match self.peek() {
            Some(token) => match expr::string_literal(token) {
                Some(value) => Some(DeclarationValue::String(value)),
                None if token.is_keyword("true") || token.is_keyword("false") => {
                    Some(DeclarationValue::Boolean(BooleanLiteral {
                        value: token.is_keyword("true"),
                        location: token.location(),
                    }))
                }
                None => None,
            },
            None => None,
        };
        let right = match right {
            Some(right) => right,
            None => return Err(self.unexpected("string or boolean value")),
        };
        self.next();
        Ok(Statement::Declaration(DeclarationStatement {
            left: Identifier { name, location },
            right,
            location,
        }))
    }

    //
    // A comma separated run of variables or a variable followed by a window
    // clause can only be a match statement. Inside a `match` section a lone
    // variable that nothing continues is one too.
    //
    fn at_match_statement(&mut self, key: SectionKey) -> bool {
        if !self.at_variable_nth(0) {
            return false;
        }
        if self.at_punctuation_nth(1, Punctuation::Comma)
            || self.at_keyword_nth(1, "over")
            || (self.at_keyword_nth(1, "not") && self.at_keyword_nth(2, "over"))
        {
            return true;
        }
        key == SectionKey::Match && !self.continues_operand(1)
    }

    //
    //  match-expression = variable *("," variable)
    //                     [ ["not"] "over" duration [("before" / "after") variable] ]
    //
    fn match_expression(&mut self) -> Result<MatchExpression> {
        let first = self.expect_variable()?;
        let location = first.location;
        let mut keys = vec![first];
        while self.at_punctuation(Punctuation::Comma) {
            self.next();
            keys.push(self.expect_variable()?);
        }

        let window = if self.at_keyword("over")
            || (self.at_keyword("not") && self.at_keyword_nth(1, "over"))
        {
            let negated = self.at_keyword("not");
            if negated {
                self.next();
            }
            self.next();
            let duration = self.duration()?;
            let relation = if self.at_keyword("before") {
                Some(AnchorRelation::Before)
            } else if self.at_keyword("after") {
                Some(AnchorRelation::After)
            } else {
                None
            };
            let anchor = match relation {
                Some(relation) => {
                    self.next();
                    Some(MatchAnchor {
                        relation,
                        variable: self.expect_variable()?,
                    })
                }
                None => None,
            };
            Some(MatchWindow {
                negated,
                duration,
                anchor,
            })
        } else {
            None
        };

        Ok(MatchExpression {
            keys,
            window,
            location,
        })
    }

    fn duration(&mut self) -> Result<DurationLiteral> {
        if let Some(Token {
            kind: TokenKind::Duration { amount, unit },
            span,
        }) = self.peek()
        {
            let duration = DurationLiteral {
                amount: amount.to_string(),
                unit: *unit,
                location: FileLocation::from(*span),
            };
            self.next();
            return Ok(duration);
        }
        Err(self.unexpected("duration (e.g. 5m, 1h, 2d)"))
    }
}

//
// Statements are parsed once as a full expression and the top level `=` is
// reinterpreted afterwards. A bare variable on either side makes it an
// assignment (left wins when both are), anything else stays a comparison.
//
pub(crate) fn classify(expression: Expression) -> Statement {
    let binary = match expression {
        Expression::Binary(binary) if binary.operator == BinaryOperator::Eq => binary,
        other => return Statement::Expression(ExpressionStatement { expression: other }),
    };

    let BinaryExpression {
        operator,
        left,
        right,
        location,
    } = binary;
    match (*left, *right) {
        (left @ Expression::Variable(_), right) => Statement::Assignment(AssignmentStatement {
            left,
            right,
            direction: AssignmentDirection::VariableLeft,
            location,
        }),
        (left, right @ Expression::Variable(_)) => Statement::Assignment(AssignmentStatement {
            left,
            right,
            direction: AssignmentDirection::VariableRight,
            location,
        }),
        (left, right) => Statement::Expression(ExpressionStatement {
            expression: Expression::Binary(BinaryExpression {
                operator,
                left: Box::new(left),
                right: Box::new(right),
                location,
            }),
        }),
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod parser_tests;
