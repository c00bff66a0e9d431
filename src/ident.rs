//! Stable identifiers and SQL identifier quoting.
//!
//! Stable ids are the cross-snapshot matching key; they are
//! plain strings built from user-visible names plus a kind discriminator,
//! never from OIDs.

use std::fmt;

/// A stable identifier, e.g. `r:public.users` or `public.users.email`.
///
/// Newtype rather than a bare `String` so that a stable id can never be
/// accidentally compared against, or substituted for, an unrelated
/// string (a table name, say) at a call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct StableId(String);

impl StableId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the `unknown.<classid_name>.<oid>` sentinel emitted when a
    /// dependency endpoint's OID cannot be resolved to a known entity.
    pub fn is_unknown_sentinel(&self) -> bool {
        self.0.starts_with("unknown.")
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn schema_id(schema: &str) -> StableId {
    StableId::new(schema.to_string())
}

pub fn table_id(schema: &str, name: &str) -> StableId {
    StableId::new(format!("r:{schema}.{name}"))
}

pub fn view_id(schema: &str, name: &str) -> StableId {
    StableId::new(format!("v:{schema}.{name}"))
}

pub fn matview_id(schema: &str, name: &str) -> StableId {
    StableId::new(format!("m:{schema}.{name}"))
}

pub fn column_id(schema: &str, table: &str, column: &str) -> StableId {
    StableId::new(format!("{schema}.{table}.{column}"))
}

pub fn constraint_id(schema: &str, table: &str, name: &str) -> StableId {
    StableId::new(format!("{schema}.{table}.{name}"))
}

pub fn index_id(schema: &str, name: &str) -> StableId {
    StableId::new(format!("i:{schema}.{name}"))
}

pub fn sequence_id(schema: &str, name: &str) -> StableId {
    StableId::new(format!("S:{schema}.{name}"))
}

pub fn policy_id(schema: &str, table: &str, name: &str) -> StableId {
    StableId::new(format!("P:{schema}.{table}.{name}"))
}

pub fn function_id(schema: &str, name: &str, argtypes: &str) -> StableId {
    StableId::new(format!("function:{schema}.{name}({argtypes})"))
}

pub fn trigger_id(schema: &str, table: &str, name: &str) -> StableId {
    StableId::new(format!("trigger:{schema}.{table}.{name}"))
}

pub fn type_id(schema: &str, name: &str) -> StableId {
    StableId::new(format!("type:{schema}.{name}"))
}

/// Double-quote a SQL identifier.
///
/// Doubles an embedded `"` (the standard SQL escaping rule for a quoted
/// identifier) rather than rejecting it, so that `quote_ident` is a total
/// function. See DESIGN.md.
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Double-quote a schema-qualified identifier as `"schema"."name"`.
pub fn quote_qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_identifier() {
        assert_eq!(quote_ident("users"), "\"users\"");
    }

    #[test]
    fn doubles_embedded_quote() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn qualified_form() {
        assert_eq!(quote_qualified("public", "users"), "\"public\".\"users\"");
    }

    #[test]
    fn stable_id_formats_use_expected_prefixes() {
        assert_eq!(schema_id("public").as_str(), "public");
        assert_eq!(table_id("public", "users").as_str(), "r:public.users");
        assert_eq!(view_id("public", "active_users").as_str(), "v:public.active_users");
        assert_eq!(
            matview_id("analytics", "monthly_sales").as_str(),
            "m:analytics.monthly_sales"
        );
        assert_eq!(column_id("public", "users", "email").as_str(), "public.users.email");
        assert_eq!(
            constraint_id("public", "users", "users_pkey").as_str(),
            "public.users.users_pkey"
        );
        assert_eq!(index_id("public", "users_email_idx").as_str(), "i:public.users_email_idx");
        assert_eq!(sequence_id("public", "users_id_seq").as_str(), "S:public.users_id_seq");
        assert_eq!(
            policy_id("public", "posts", "read_posts").as_str(),
            "P:public.posts.read_posts"
        );
        assert_eq!(
            function_id("public", "add", "integer,integer").as_str(),
            "function:public.add(integer,integer)"
        );
        assert_eq!(
            trigger_id("public", "users", "ts_update").as_str(),
            "trigger:public.users.ts_update"
        );
        assert_eq!(type_id("public", "mood").as_str(), "type:public.mood");
    }

    #[test]
    fn unknown_sentinel_detected() {
        assert!(StableId::new("unknown.pg_proc.12345").is_unknown_sentinel());
        assert!(!StableId::new("r:public.users").is_unknown_sentinel());
    }
}
