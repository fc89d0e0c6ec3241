// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::string::FromUtf8Error;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Error writing parse tree as JSON {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Error writing parse tree as YAML {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("I/O error when reading or writing {0}")]
    IoError(#[from] std::io::Error),
    #[error("Output is not valid UTF-8 {0}")]
    Utf8Error(#[from] FromUtf8Error),
    #[error("Unable to install logger {0}")]
    LoggerError(#[from] log::SetLoggerError),
    #[error("{0}")]
    IllegalArguments(String),
}

pub type Result<R> = std::result::Result<R, Error>;
