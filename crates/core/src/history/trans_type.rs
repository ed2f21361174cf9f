#![forbid(unsafe_code)]

use thiserror::Error;

/// Kind of mutation a change records. Stored as its integer code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransType {
    Add,
    Update,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("unknown trans_type code {0}")]
pub struct TransTypeError(pub i64);

impl TransType {
    pub const ALL: [TransType; 3] = [TransType::Add, TransType::Update, TransType::Delete];

    pub fn code(self) -> i64 {
        match self {
            Self::Add => 0,
            Self::Update => 1,
            Self::Delete => 2,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, TransTypeError> {
        match code {
            0 => Ok(Self::Add),
            1 => Ok(Self::Update),
            2 => Ok(Self::Delete),
            other => Err(TransTypeError(other)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "add" => Some(Self::Add),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}
