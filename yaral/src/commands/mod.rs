// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub mod check;
pub mod parse_tree;

use clap::ArgMatches;
use yaral_lang::ParseOptions;

use crate::errors::Result;
use crate::utils::reader::Reader;

//
// Constants
//
// Application metadata
pub const APP_NAME: &str = "yaral";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
// Commands
pub const PARSE_TREE: &str = "parse-tree";
pub const CHECK: &str = "check";
// Arguments for parse-tree, check
pub const RULES: (&str, char) = ("rules", 'r');
pub const FAIL_FAST: (&str, char) = ("fail-fast", 'f');
// Arguments for parse-tree
pub const OUTPUT: (&str, char) = ("output", 'o');
pub const PRINT_JSON: (&str, char) = ("print-json", 'p');
pub const PRINT_YAML: (&str, char) = ("print-yaml", 'y');
pub const PRINT_SEXP: (&str, char) = ("print-sexp", 's');
// Global
pub const VERBOSE: (&str, char) = ("verbose", 'v');

pub const SUCCESS_STATUS_CODE: i32 = 0;
pub const ERROR_STATUS_CODE: i32 = 5;
pub const INTERNAL_FAILURE_STATUS_CODE: i32 = -1;

const STDIN_NAME: &str = "<input>";

pub(crate) struct RulesInput {
    pub(crate) content: String,
    pub(crate) file_name: String,
}

impl RulesInput {
    pub(crate) fn options(&self, fail_fast: bool) -> ParseOptions<'_> {
        let options = ParseOptions::with_file_name(&self.file_name);
        if fail_fast {
            options.fail_fast()
        } else {
            options
        }
    }

    pub(crate) fn display_name(&self) -> &str {
        display_name(&self.file_name)
    }
}

pub(crate) fn display_name(file_name: &str) -> &str {
    if file_name.is_empty() {
        STDIN_NAME
    } else {
        file_name
    }
}

//
// Reads the rules named by --rules, falling back to the supplied reader
// (stdin for the binary) when the flag is absent
//
pub(crate) fn read_rules(app: &ArgMatches, reader: &mut Reader) -> Result<RulesInput> {
    let (content, file_name) = match app.get_one::<String>(RULES.0) {
        Some(file) => (Reader::open(file)?.read_source()?, file.clone()),
        None => (reader.read_source()?, String::new()),
    };

    log::info!(
        "Read {} byte(s) of rules from {}",
        content.len(),
        display_name(&file_name)
    );
    Ok(RulesInput { content, file_name })
}
