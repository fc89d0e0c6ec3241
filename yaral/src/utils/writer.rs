// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fs::File;
use std::io::{Stderr, Stdout, Write};

use crate::errors::{Error, Result};

///
/// Output and error streams handed to a command. Tests swap both for in
/// memory buffers and read them back afterwards.
///
pub struct Writer {
    buffer: WriteBuffer,
    err: WriteBuffer,
}

impl Writer {
    pub fn new(buffer: WriteBuffer, err: WriteBuffer) -> Self {
        Self { buffer, err }
    }

    pub fn write_err(&mut self, message: String) -> std::io::Result<()> {
        writeln!(self.err, "{message}")
    }

    pub fn into_string(self) -> Result<String> {
        Ok(String::from_utf8(self.buffer.bytes()?.to_vec())?)
    }

    pub fn stripped(&self) -> Result<String> {
        strip(self.buffer.bytes()?)
    }

    pub fn err_to_stripped(&self) -> Result<String> {
        strip(self.err.bytes()?)
    }
}

fn strip(bytes: &[u8]) -> Result<String> {
    Ok(String::from_utf8(strip_ansi_escapes::strip(bytes)?)?)
}

impl Write for Writer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.write(String::from_utf8_lossy(buf).as_bytes())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.buffer.flush()?;
        self.err.flush()
    }
}

pub enum WriteBuffer {
    Stdout(Stdout),
    Stderr(Stderr),
    Vec(Vec<u8>),
    File(File),
}

impl WriteBuffer {
    fn bytes(&self) -> Result<&[u8]> {
        match self {
            WriteBuffer::Vec(vec) => Ok(vec.as_slice()),
            WriteBuffer::Stdout(..) | WriteBuffer::Stderr(..) | WriteBuffer::File(..) => Err(
                Error::IllegalArguments("only in memory output can be read back".to_string()),
            ),
        }
    }
}

impl Write for WriteBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            WriteBuffer::Stdout(stdout) => stdout.write(buf),
            WriteBuffer::Stderr(stderr) => stderr.write(buf),
            WriteBuffer::Vec(vec) => vec.write(buf),
            WriteBuffer::File(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            WriteBuffer::Stdout(stdout) => stdout.flush(),
            WriteBuffer::Stderr(stderr) => stderr.flush(),
            WriteBuffer::Vec(vec) => vec.flush(),
            WriteBuffer::File(file) => file.flush(),
        }
    }
}
