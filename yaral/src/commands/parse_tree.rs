// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use clap::{Arg, ArgAction, ArgMatches};
use yaral_lang::parse_with_options;

use crate::command::Command;
use crate::commands::{
    read_rules, ERROR_STATUS_CODE, FAIL_FAST, OUTPUT, PARSE_TREE, PRINT_JSON, PRINT_SEXP,
    PRINT_YAML, RULES, SUCCESS_STATUS_CODE,
};
use crate::errors::Result;
use crate::utils::reader::Reader;
use crate::utils::writer::Writer;

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct ParseTree {}

#[allow(clippy::new_without_default)]
impl ParseTree {
    pub fn new() -> Self {
        ParseTree {}
    }
}

impl Command for ParseTree {
    fn name(&self) -> &'static str {
        PARSE_TREE
    }

    fn command(&self) -> clap::Command {
        clap::Command::new(PARSE_TREE)
            .about("Prints out the parse tree for the rules defined in the file. Diagnostics are written to stderr.")
            .arg(
                Arg::new(RULES.0)
                    .long(RULES.0)
                    .short(RULES.1)
                    .help("Provide a rules file, reads from stdin when absent")
                    .action(ArgAction::Set)
                    .required(false),
            )
            .arg(
                Arg::new(OUTPUT.0)
                    .long(OUTPUT.0)
                    .short(OUTPUT.1)
                    .help("Write to output file")
                    .action(ArgAction::Set)
                    .required(false),
            )
            .arg(
                Arg::new(PRINT_JSON.0)
                    .long(PRINT_JSON.0)
                    .short(PRINT_JSON.1)
                    .action(ArgAction::SetTrue)
                    .conflicts_with_all([PRINT_YAML.0, PRINT_SEXP.0])
                    .help("Print output in JSON format"),
            )
            .arg(
                Arg::new(PRINT_YAML.0)
                    .long(PRINT_YAML.0)
                    .short(PRINT_YAML.1)
                    .action(ArgAction::SetTrue)
                    .conflicts_with(PRINT_SEXP.0)
                    .help("Print output in YAML format, the default"),
            )
            .arg(
                Arg::new(PRINT_SEXP.0)
                    .long(PRINT_SEXP.0)
                    .short(PRINT_SEXP.1)
                    .action(ArgAction::SetTrue)
                    .help("Print output as an S-expression, positions omitted"),
            )
            .arg(
                Arg::new(FAIL_FAST.0)
                    .long(FAIL_FAST.0)
                    .short(FAIL_FAST.1)
                    .action(ArgAction::SetTrue)
                    .help("Stop at the first error instead of recovering"),
            )
    }

    fn execute(&self, app: &ArgMatches, writer: &mut Writer, reader: &mut Reader) -> Result<i32> {
        let input = read_rules(app, reader)?;
        let parsed = parse_with_options(&input.content, input.options(app.get_flag(FAIL_FAST.0)));

        for diagnostic in &parsed.diagnostics {
            writer.write_err(diagnostic.to_string())?;
        }

        if app.get_flag(PRINT_JSON.0) {
            serde_json::to_writer_pretty(&mut *writer, &parsed.source_file)?;
            writeln!(writer)?;
        } else if app.get_flag(PRINT_SEXP.0) {
            writeln!(writer, "{}", parsed.source_file.to_sexp())?;
        } else {
            serde_yaml::to_writer(&mut *writer, &parsed.source_file)?;
        }

        Ok(if parsed.is_ok() {
            SUCCESS_STATUS_CODE
        } else {
            ERROR_STATUS_CODE
        })
    }
}
