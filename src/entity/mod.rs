//! Per-kind catalog entity records.
//!
//! Every entity type here is split into a `Key` (identity fields — what
//! the stable id is built from) and the remaining data/internal fields.
//! Semantic equality is a handwritten function per kind, comparing
//! identity and data fields only rather than relying on whole-struct
//! structural equality (internal fields like a catalog oid would then
//! spuriously break equality between two otherwise-identical snapshots).

pub mod column;
pub mod constraint;
pub mod function;
pub mod index;
pub mod policy;
pub mod pg_type;
pub mod schema;
pub mod sequence;
pub mod table;
pub mod trigger;
pub mod view;

use crate::ident::StableId;

/// Foreign-key action codes, from `pg_constraint.confupdtype`/`confdeltype`
///.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FkAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl FkAction {
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'a' => Self::NoAction,
            'r' => Self::Restrict,
            'c' => Self::Cascade,
            'n' => Self::SetNull,
            'd' => Self::SetDefault,
            _ => return None,
        })
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// FK match type (`pg_constraint.confmatchtype`): full, partial, simple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FkMatchType {
    Full,
    Partial,
    Simple,
}

impl FkMatchType {
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'f' => Self::Full,
            'p' => Self::Partial,
            's' => Self::Simple,
            _ => return None,
        })
    }
}

/// RLS policy command codes, from `pg_policy.polcmd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PolicyCommand {
    All,
    Select,
    Insert,
    Update,
    Delete,
}

impl PolicyCommand {
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            '*' => Self::All,
            'r' => Self::Select,
            'a' => Self::Insert,
            'w' => Self::Update,
            'd' => Self::Delete,
            _ => return None,
        })
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

/// Generated-column kind, from `pg_attribute.attgenerated`. PostgreSQL 17
/// only defines the stored form; `NotGenerated` is the empty-string case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GeneratedKind {
    NotGenerated,
    Stored,
}

impl GeneratedKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "s" => Self::Stored,
            _ => Self::NotGenerated,
        }
    }
}

/// A trait implemented by every entity kind, giving it a uniform stable-id
/// accessor for snapshot indexing and a handwritten semantic-equality
/// check. Not used as a trait object anywhere — each per-kind map in
/// [`crate::snapshot::Snapshot`] is monomorphic — but it documents the
/// contract every kind must satisfy.
pub trait Entity {
    fn stable_id(&self) -> StableId;

    /// Identity fields and data fields compare equal element-wise;
    /// internal fields (OIDs and the like) are ignored.
    fn semantically_eq(&self, other: &Self) -> bool;
}
