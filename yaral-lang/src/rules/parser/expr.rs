// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use log::trace;

use super::{Parser, MAX_NESTING};
use crate::rules::exprs::*;
use crate::rules::lexer::{Punctuation, Token, TokenKind};
use crate::rules::Result;

fn binary_operator(token: &Token) -> Option<BinaryOperator> {
    Some(match &token.kind {
        TokenKind::Punctuation(punctuation) => match punctuation {
            Punctuation::Star => BinaryOperator::Multiply,
            Punctuation::Slash => BinaryOperator::Divide,
            Punctuation::Plus => BinaryOperator::Add,
            Punctuation::Minus => BinaryOperator::Subtract,
            Punctuation::Eq => BinaryOperator::Eq,
            Punctuation::NotEq => BinaryOperator::NotEq,
            Punctuation::Lt => BinaryOperator::Lt,
            Punctuation::Le => BinaryOperator::Le,
            Punctuation::Gt => BinaryOperator::Gt,
            Punctuation::Ge => BinaryOperator::Ge,
            _ => return None,
        },
        TokenKind::Identifier("and") => BinaryOperator::And,
        TokenKind::Identifier("or") => BinaryOperator::Or,
        _ => return None,
    })
}

fn starts_operand(token: &Token) -> bool {
    match &token.kind {
        TokenKind::Punctuation(punctuation) => {
            matches!(punctuation, Punctuation::LeftParen | Punctuation::Slash)
        }
        TokenKind::Duration { .. } => false,
        _ => true,
    }
}

pub(super) fn string_literal(token: &Token) -> Option<StringLiteral> {
    let location = token.location();
    match &token.kind {
        TokenKind::RawString(content) => Some(StringLiteral {
            kind: StringKind::Raw,
            value: content.to_string(),
            escapes: vec![],
            location,
        }),
        TokenKind::InterpretedString { content, escapes } => Some(StringLiteral {
            kind: StringKind::Interpreted,
            value: content.to_string(),
            escapes: escapes
                .iter()
                .map(|e| EscapeSequence {
                    text: e.text.to_string(),
                    offset: e.offset,
                })
                .collect(),
            location,
        }),
        _ => None,
    }
}

impl<'a> Parser<'a> {
    //
    //  expression = or-expression
    //
    // Precedence climbing, every binary level is left associative. The right
    // operand is parsed one level above the operator so equal precedence
    // operators chain to the left.
    //
    pub(super) fn expression(&mut self) -> Result<Expression> {
        self.binary_expression(PRECEDENCE_OR)
    }

    fn binary_expression(&mut self, min_precedence: u8) -> Result<Expression> {
        let mut left = self.unary_expression()?;
        while let Some(operator) = self.peek().and_then(binary_operator) {
            let precedence = operator.precedence();
            if precedence < min_precedence {
                break;
            }
            self.next();
            trace!("Binary operator {}", operator.as_str());
            let right = self.binary_expression(precedence + 1)?;
            left = Expression::Binary(BinaryExpression {
                operator,
                location: left.location(),
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    //
    // The head token can begin a new statement rather than continue the
    // previous one
    //
    pub(super) fn at_operand_start(&mut self) -> bool {
        self.peek()
            .map_or(false, |token| binary_operator(token).is_none() && starts_operand(token))
    }

    //
    // Token `n` would extend a variable operand, either as a binary operator,
    // an index or a reference list membership test
    //
    pub(super) fn continues_operand(&mut self, n: usize) -> bool {
        match self.peek_nth(n) {
            Some(token) if binary_operator(token).is_some() => true,
            Some(token) if token.is_punctuation(Punctuation::LeftBracket) => true,
            Some(token) if token.is_keyword("in") => true,
            Some(token) if token.is_keyword("not") => self.at_keyword_nth(n + 1, "in"),
            _ => false,
        }
    }

    //
    // Every nested operand passes through here, so this is where the nesting
    // depth is counted.
    //
    fn unary_expression(&mut self) -> Result<Expression> {
        if self.depth >= MAX_NESTING {
            let expected = format!("expression nested at most {} deep", MAX_NESTING);
            return Err(self.unexpected(&expected));
        }
        self.depth += 1;
        let expression = self.unary_operand();
        self.depth -= 1;
        expression
    }

    //
    //  unary-expression = ("all" / "any" / "not") unary-expression / primary
    //
    // The keywords only act as operators when an operand follows, otherwise
    // the keyword itself is reported as a misplaced identifier.
    //
    fn unary_operand(&mut self) -> Result<Expression> {
        let operator = match self.peek() {
            Some(Token {
                kind: TokenKind::Identifier(keyword),
                ..
            }) => UnaryOperator::from_keyword(keyword),
            _ => None,
        };
        let operator = match operator {
            Some(operator) if self.peek_nth(1).map_or(false, starts_operand) => operator,
            _ => return self.primary(),
        };

        let location = self.bump("unary operator")?.location();
        let operand = self.unary_expression()?;
        Ok(Expression::Unary(UnaryExpression {
            operator,
            operand: Box::new(operand),
            location,
        }))
    }

    //
    //  primary = variable-operand / call / literal / "(" expression ")" / regex
    //
    // Plain identifiers only appear as function names here.
    //
    fn primary(&mut self) -> Result<Expression> {
        let token = match self.peek() {
            Some(token) => token.clone(),
            None => return Err(self.unexpected("expression")),
        };
        let location = token.location();

        let expression = match token.kind {
            TokenKind::Variable { .. } => return self.variable_operand(),
            TokenKind::Identifier("true") | TokenKind::Identifier("false") => {
                Expression::Boolean(BooleanLiteral {
                    value: token.is_keyword("true"),
                    location,
                })
            }
            TokenKind::Identifier("null") => Expression::Null(NullLiteral { location }),
            TokenKind::Identifier(_) if self.at_call() => return self.call(),
            TokenKind::Integer(text) => Expression::Integer(IntegerLiteral {
                text: text.to_string(),
                location,
            }),
            TokenKind::Float(text) => Expression::Float(FloatLiteral {
                text: text.to_string(),
                location,
            }),
            TokenKind::RawString(_) | TokenKind::InterpretedString { .. } => {
                match string_literal(&token) {
                    Some(literal) => Expression::String(literal),
                    None => return Err(self.unexpected("expression")),
                }
            }
            TokenKind::Punctuation(Punctuation::LeftParen) => return self.parenthesized(),
            TokenKind::Punctuation(Punctuation::Slash) => return self.regex(location),
            _ => return Err(self.unexpected("expression")),
        };
        self.next();
        Ok(expression)
    }

    //
    // "/" where an operand is expected starts a regular expression. The text
    // is re-read from the slash since tokens already buffered were lexed with
    // "/" as division.
    //
    fn regex(&mut self, location: FileLocation) -> Result<Expression> {
        match self.lexer.regex_at(location.offset) {
            Ok(Some(token)) => {
                self.lookahead.clear();
                match token.kind {
                    TokenKind::Regex(pattern) => Ok(Expression::Regex(RegexLiteral {
                        pattern: pattern.to_string(),
                        location,
                    })),
                    _ => Err(self.unexpected("regular expression")),
                }
            }
            Ok(None) => Err(self.unexpected("expression")),
            Err(error) => {
                self.lookahead.clear();
                Err(error)
            }
        }
    }

    fn parenthesized(&mut self) -> Result<Expression> {
        let location = self.bump("`(`")?.location();
        let expression = self.expression()?;
        self.expect_punctuation(Punctuation::RightParen, "`)`")?;
        Ok(Expression::Parenthesized(ParenthesizedExpression {
            expression: Box::new(expression),
            location,
        }))
    }

    //
    //  variable-operand = variable "[" (string / integer) "]"
    //                   / variable ["not"] "in" ["regex" / "cidr"] "%" identifier
    //                   / variable
    //
    // Both forms share the leading variable, the token after it decides.
    //
    fn variable_operand(&mut self) -> Result<Expression> {
        let variable = self.expect_variable()?;
        let location = variable.location;

        if self.at_punctuation(Punctuation::LeftBracket) {
            self.next();
            let index = match self.peek() {
                Some(token) => match (&token.kind, string_literal(token)) {
                    (_, Some(literal)) => Some(IndexValue::String(literal)),
                    (TokenKind::Integer(text), None) => Some(IndexValue::Integer(IntegerLiteral {
                        text: text.to_string(),
                        location: token.location(),
                    })),
                    _ => None,
                },
                None => None,
            };
            let index = match index {
                Some(index) => index,
                None => return Err(self.unexpected("string or integer index")),
            };
            self.next();
            self.expect_punctuation(Punctuation::RightBracket, "`]`")?;
            return Ok(Expression::Index(IndexExpression {
                operand: variable,
                index,
                location,
            }));
        }

        let negated = self.at_keyword("not") && self.at_keyword_nth(1, "in");
        if !negated && !self.at_keyword("in") {
            return Ok(Expression::Variable(variable));
        }
        if negated {
            self.next();
        }
        self.next();

        let match_mode = if self.at_keyword("regex") {
            MatchMode::Regex
        } else if self.at_keyword("cidr") {
            MatchMode::Cidr
        } else {
            MatchMode::None
        };
        if match_mode != MatchMode::None {
            self.next();
        }
        self.expect_punctuation(Punctuation::Percent, "`%` reference list")?;
        let (list_name, _) = self.expect_identifier("reference list name")?;

        Ok(Expression::ReferenceList(ReferenceListExpression {
            subject: variable,
            negated,
            match_mode,
            list_name,
            location,
        }))
    }

    fn at_call(&mut self) -> bool {
        self.at_punctuation_nth(1, Punctuation::LeftParen)
            || (self.at_punctuation_nth(1, Punctuation::Dot)
                && self.at_identifier_nth(2)
                && self.at_punctuation_nth(3, Punctuation::LeftParen))
    }

    //
    //  call = identifier ["." identifier] "(" [expression *("," expression)] ")"
    //
    fn call(&mut self) -> Result<Expression> {
        let (operand, location) = self.expect_identifier("function name")?;
        let field = if self.at_punctuation(Punctuation::Dot) {
            self.next();
            let (field, _) = self.expect_identifier("function name")?;
            Some(field)
        } else {
            None
        };
        self.expect_punctuation(Punctuation::LeftParen, "`(`")?;

        let mut arguments = Vec::new();
        if !self.at_punctuation(Punctuation::RightParen) {
            arguments.push(self.expression()?);
            while self.at_punctuation(Punctuation::Comma) {
                self.next();
                arguments.push(self.expression()?);
            }
        }
        self.expect_punctuation(Punctuation::RightParen, "`,` or `)`")?;

        Ok(Expression::Call(CallExpression {
            function: FunctionName { operand, field },
            arguments,
            location,
        }))
    }
}

#[cfg(test)]
#[path = "expr_tests.rs"]
mod expr_tests;
