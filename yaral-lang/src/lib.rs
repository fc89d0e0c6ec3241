// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Lexer and parser for YARA-L 2.0 detection rules.
//!
//! ```
//! let parsed = yaral_lang::parse(r#"
//!     rule example {
//!       events:
//!         $e.metadata.event_type = "USER_LOGIN"
//!       condition:
//!         $e
//!     }
//! "#);
//! assert!(parsed.is_ok());
//! assert_eq!(parsed.source_file.rules[0].name, "example");
//! ```
//!

pub mod rules;

pub use crate::rules::errors::{Category, Diagnostic, Error, Errors, LexicalErrorKind, Severity};
pub use crate::rules::exprs::*;

use crate::rules::parser::Parser;

///
/// Knobs for a single parse call
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions<'a> {
    /// Attached to every diagnostic, empty for anonymous input
    pub file_name: &'a str,
    /// Resynchronize after an error and keep going, or stop at the first one
    pub recover: bool,
}

impl<'a> Default for ParseOptions<'a> {
    fn default() -> Self {
        ParseOptions {
            file_name: "",
            recover: true,
        }
    }
}

impl<'a> ParseOptions<'a> {
    pub fn with_file_name(file_name: &'a str) -> Self {
        ParseOptions {
            file_name,
            ..Default::default()
        }
    }

    pub fn fail_fast(self) -> Self {
        ParseOptions {
            recover: false,
            ..self
        }
    }
}

///
/// Outcome of a parse, the tree is always present and is partial when
/// diagnostics were reported
///
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    pub source_file: SourceFile,
    pub diagnostics: Vec<Diagnostic>,
    errors: Vec<Error>,
}

impl ParsedFile {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn into_result(self) -> std::result::Result<SourceFile, Errors> {
        if self.errors.is_empty() {
            Ok(self.source_file)
        } else {
            Err(Errors(self.errors))
        }
    }
}

pub fn parse(source: &str) -> ParsedFile {
    parse_with_options(source, ParseOptions::default())
}

pub fn parse_with_options(source: &str, options: ParseOptions<'_>) -> ParsedFile {
    let mut parser = Parser::new(source, options);
    let source_file = parser.source_file();
    let errors = parser.into_errors();
    let diagnostics = errors
        .iter()
        .map(|e| Diagnostic::from_error(e, options.file_name))
        .collect();
    log::debug!(
        "Parsed {} rule(s) with {} diagnostic(s) from {}",
        source_file.rules.len(),
        errors.len(),
        if options.file_name.is_empty() {
            "<input>"
        } else {
            options.file_name
        }
    );
    ParsedFile {
        source_file,
        diagnostics,
        errors,
    }
}

impl std::str::FromStr for SourceFile {
    type Err = Errors;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        parse(s).into_result()
    }
}
