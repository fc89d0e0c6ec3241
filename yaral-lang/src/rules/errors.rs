// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Formatter;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::exprs::FileLocation;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum LexicalErrorKind {
    #[error("unexpected character `{0}`")]
    UnexpectedCharacter(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated raw string literal")]
    UnterminatedRawString,
    #[error("unterminated regular expression literal")]
    UnterminatedRegex,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("invalid escape sequence `{0}`")]
    InvalidEscape(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Lexical error at {location}: {kind}")]
    LexicalError {
        kind: LexicalErrorKind,
        location: FileLocation,
    },
    #[error("Syntax error at {location}, when handling {context}: expected {expected}, found {found}")]
    SyntaxError {
        expected: String,
        found: String,
        context: String,
        location: FileLocation,
    },
}

impl Error {
    pub fn location(&self) -> FileLocation {
        match self {
            Error::LexicalError { location, .. } | Error::SyntaxError { location, .. } => *location,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Error::LexicalError { .. } => Category::Lexical,
            Error::SyntaxError { .. } => Category::Syntax,
        }
    }

    //
    // Message without the location prefix, diagnostics carry the location
    // separately
    //
    pub fn message(&self) -> String {
        match self {
            Error::LexicalError { kind, .. } => kind.to_string(),
            Error::SyntaxError {
                expected,
                found,
                context,
                ..
            } => {
                if context.is_empty() {
                    format!("expected {expected}, found {found}")
                } else {
                    format!("expected {expected}, found {found} (in {context})")
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub struct Errors(pub Vec<Error>);

impl std::fmt::Display for Errors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (idx, each) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{each}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Lexical,
    Syntax,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Lexical => f.write_str("lexical"),
            Category::Syntax => f.write_str("syntax"),
        }
    }
}

///
/// A single problem found while parsing. Diagnostics are reported in the order
/// they were encountered; the parser keeps going after each one unless recovery
/// was switched off in [crate::ParseOptions].
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub location: FileLocation,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_name: String,
}

impl Diagnostic {
    pub(crate) fn from_error(error: &Error, file_name: &str) -> Self {
        Diagnostic {
            severity: Severity::Error,
            category: error.category(),
            message: error.message(),
            location: error.location(),
            file_name: file_name.to_string(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let file_name = if self.file_name.is_empty() {
            "<input>"
        } else {
            self.file_name.as_str()
        };
        write!(
            f,
            "{}:{}:{}: {}[{}]: {}",
            file_name,
            self.location.line,
            self.location.column,
            self.severity,
            self.category,
            self.message
        )
    }
}
