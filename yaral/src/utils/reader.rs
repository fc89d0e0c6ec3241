// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Stdin};

use crate::errors::Result;

///
/// Source of rule text for a command, stdin for the binary and an in memory
/// cursor in tests
///
pub struct Reader {
    inner: ReadBuffer,
}

impl Read for Reader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            ReadBuffer::Stdin(stdin) => stdin.read(buf),
            ReadBuffer::Cursor(cursor) => cursor.read(buf),
            ReadBuffer::File(file) => file.read(buf),
        }
    }
}

impl Reader {
    pub fn new(buffer: ReadBuffer) -> Self {
        Self { inner: buffer }
    }

    pub fn open(path: &str) -> Result<Self> {
        Ok(Self::new(ReadBuffer::File(BufReader::new(File::open(path)?))))
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(ReadBuffer::Cursor(Cursor::new(text.as_bytes().to_vec())))
    }

    ///
    /// Drains the buffer. Rule files must be UTF-8, anything else surfaces as
    /// an I/O error of kind `InvalidData`.
    ///
    pub fn read_source(&mut self) -> Result<String> {
        let mut content = String::new();
        self.read_to_string(&mut content)?;
        Ok(content)
    }
}

pub enum ReadBuffer {
    Stdin(Stdin),
    Cursor(Cursor<Vec<u8>>),
    File(BufReader<File>),
}
