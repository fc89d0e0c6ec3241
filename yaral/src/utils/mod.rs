// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{command::Command, commands};

pub mod reader;
pub mod writer;

pub fn get_yaral_commands() -> Vec<Box<dyn Command>> {
    vec![
        Box::new(commands::parse_tree::ParseTree::new()),
        Box::new(commands::check::Check::new()),
    ]
}
