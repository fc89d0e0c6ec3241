// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub(crate) mod display;
pub mod errors;
pub mod exprs;
pub(crate) mod lexer;
pub(crate) mod parser;
pub(crate) mod sexp;

use errors::Error;

pub type Result<R> = std::result::Result<R, Error>;
