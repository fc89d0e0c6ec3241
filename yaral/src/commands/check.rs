// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use clap::{Arg, ArgAction, ArgMatches};
use colored::Colorize;
use yaral_lang::{parse_with_options, Diagnostic};

use crate::command::Command;
use crate::commands::{
    display_name, read_rules, CHECK, ERROR_STATUS_CODE, FAIL_FAST, RULES, SUCCESS_STATUS_CODE,
};
use crate::errors::Result;
use crate::utils::reader::Reader;
use crate::utils::writer::Writer;

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Check {}

#[allow(clippy::new_without_default)]
impl Check {
    pub fn new() -> Self {
        Check {}
    }
}

impl Command for Check {
    fn name(&self) -> &'static str {
        CHECK
    }

    fn command(&self) -> clap::Command {
        clap::Command::new(CHECK)
            .about("Checks the rules file for lexical and syntax errors, one line per problem found.")
            .arg(
                Arg::new(RULES.0)
                    .long(RULES.0)
                    .short(RULES.1)
                    .help("Provide a rules file, reads from stdin when absent")
                    .action(ArgAction::Set)
                    .required(false),
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
            print_diagnostic(writer, diagnostic)?;
        }

        let rules = parsed.source_file.rules.len();
        if parsed.is_ok() {
            writeln!(
                writer,
                "{}: {} rule(s) checked, {}",
                input.display_name(),
                rules,
                "no errors".green()
            )?;
            Ok(SUCCESS_STATUS_CODE)
        } else {
            writeln!(
                writer,
                "{}: {} rule(s) checked, {}",
                input.display_name(),
                rules,
                format!("{} error(s)", parsed.diagnostics.len()).red()
            )?;
            Ok(ERROR_STATUS_CODE)
        }
    }
}

fn print_diagnostic(writer: &mut Writer, diagnostic: &Diagnostic) -> Result<()> {
    writeln!(
        writer,
        "{}:{}:{}: {}[{}]: {}",
        display_name(&diagnostic.file_name),
        diagnostic.location.line,
        diagnostic.location.column,
        diagnostic.severity.to_string().red().bold(),
        diagnostic.category,
        diagnostic.message
    )?;
    Ok(())
}
