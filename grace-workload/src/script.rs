use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Result, WorkloadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Insert,
    Delete,
    Lookup,
}

impl Op {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "I" => Some(Op::Insert),
            "D" => Some(Op::Delete),
            "L" => Some(Op::Lookup),
            _ => None,
        }
    }
}

/// One scripted operation. For deletes and lookups `value` is the value the
/// key is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instr {
    pub op: Op,
    pub key: i64,
    pub value: i64,
}

#[derive(Debug, Clone)]
pub struct Script {
    path: PathBuf,
    instrs: Vec<Instr>,
}

impl Script {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| WorkloadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let instrs = parse(&text)?;
        debug!("loaded {} instructions from {}", instrs.len(), path.display());

        Ok(Script {
            path: path.to_path_buf(),
            instrs,
        })
    }

    pub fn from_instrs(path: impl Into<PathBuf>, instrs: Vec<Instr>) -> Self {
        Script {
            path: path.into(),
            instrs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Parses `I key value`, `D key value` and `L key value` lines. Blank lines
/// are skipped, line numbers in errors start at 1.
pub fn parse(text: &str) -> Result<Vec<Instr>> {
    let mut instrs = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let mut tokens = line.split_whitespace();

        let Some(head) = tokens.next() else {
            continue;
        };

        let op = Op::from_token(head).ok_or_else(|| WorkloadError::UnknownInstruction {
            line: line_no,
            found: head.to_string(),
        })?;
        let key = parse_int(tokens.next(), "key", line_no)?;
        let value = parse_int(tokens.next(), "value", line_no)?;

        if let Some(extra) = tokens.next() {
            return Err(WorkloadError::Parse {
                line: line_no,
                message: format!("unexpected trailing token {:?}", extra),
            });
        }

        instrs.push(Instr { op, key, value });
    }

    Ok(instrs)
}

fn parse_int(token: Option<&str>, field: &str, line: usize) -> Result<i64> {
    let token = token.ok_or_else(|| WorkloadError::Parse {
        line,
        message: format!("missing {}", field),
    })?;

    token.parse().map_err(|err| WorkloadError::Parse {
        line,
        message: format!("invalid {} {:?}: {}", field, token, err),
    })
}
