// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::process::exit;

use clap::{Arg, ArgAction};
use log::Level;

use yaral::command::Command;
use yaral::commands::{
    APP_NAME, APP_VERSION, INTERNAL_FAILURE_STATUS_CODE, OUTPUT, PARSE_TREE, VERBOSE,
};
use yaral::errors::Error;
use yaral::utils;
use yaral::utils::reader::{ReadBuffer, Reader};
use yaral::utils::writer::WriteBuffer::Stderr;
use yaral::utils::writer::{WriteBuffer::File as WBFile, WriteBuffer::Stdout, Writer};

fn main() -> Result<(), Error> {
    let mut app = clap::Command::new(APP_NAME)
        .version(APP_VERSION)
        .about(
            r#"
  yaral reads YARA-L 2.0 detection rules, reports lexical and syntax errors
  with their file, line and column, and prints the parse tree as YAML, JSON
  or an S-expression."#,
        )
        .arg(
            Arg::new(VERBOSE.0)
                .long(VERBOSE.0)
                .short(VERBOSE.1)
                .action(ArgAction::Count)
                .global(true)
                .help("Sets the level of verbosity - add v's to increase output"),
        )
        .arg_required_else_help(true);

    let commands: Vec<Box<dyn Command>> = utils::get_yaral_commands();

    let mappings = commands.iter().map(|s| (s.name(), s)).fold(
        HashMap::with_capacity(commands.len()),
        |mut map, entry| {
            map.insert(entry.0, entry.1.as_ref());
            map
        },
    );

    for each in &commands {
        app = app.subcommand(each.command());
    }

    let help = app.render_usage();
    let app = app.get_matches();

    match app.subcommand() {
        Some((name, value)) => {
            if let Some(command) = mappings.get(name) {
                let log_level = match value.get_count(VERBOSE.0) {
                    0 => Level::Error,
                    1 => Level::Info,
                    2 => Level::Debug,
                    _ => Level::Trace,
                };
                simple_logger::init_with_level(log_level)?;

                let mut output_writer: Writer = if command.name() == PARSE_TREE {
                    match value.get_one::<String>(OUTPUT.0) {
                        Some(file) => {
                            Writer::new(WBFile(File::create(file)?), Stderr(std::io::stderr()))
                        }
                        None => Writer::new(Stdout(std::io::stdout()), Stderr(std::io::stderr())),
                    }
                } else {
                    Writer::new(Stdout(std::io::stdout()), Stderr(std::io::stderr()))
                };

                match (*command).execute(
                    value,
                    &mut output_writer,
                    &mut Reader::new(ReadBuffer::Stdin(std::io::stdin())),
                ) {
                    Err(e) => {
                        output_writer.write_err(format!("Error occurred {e}"))?;
                        exit(INTERNAL_FAILURE_STATUS_CODE);
                    }
                    Ok(code) => {
                        output_writer.flush()?;
                        exit(code)
                    }
                }
            } else {
                println!("{}", help);
            }
        }
        None => {
            println!("{}", help);
        }
    }

    Ok(())
}
