//! Operation vocabulary: capabilities, operation kinds, and tool descriptors.
//!
//! An operation identifier has the shape `<kind>_<doctype tokens>_<suffix>`,
//! e.g. `list_sales_invoice_documents`. The gateway registers identifiers for
//! every configured doctype up front; [`ToolDescriptor::parse`] is the fallback
//! for identifiers that were not registered.

use std::fmt;

use serde::Serialize;

use crate::error::{DocGateError, Result};

/// Independently grantable permission on a doctype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Read,
    Create,
    Update,
    Delete,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Read,
        Capability::Create,
        Capability::Update,
        Capability::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Read => "read",
            Capability::Create => "create",
            Capability::Update => "update",
            Capability::Delete => "delete",
        }
    }

    /// Case-insensitive lookup; `None` for anything outside the four capabilities.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "read" => Some(Capability::Read),
            "create" => Some(Capability::Create),
            "update" => Some(Capability::Update),
            "delete" => Some(Capability::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a dispatched operation does to a doctype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    List,
    Get,
    Search,
    Create,
    Update,
    Delete,
}

impl OperationKind {
    pub const ALL: [OperationKind; 6] = [
        OperationKind::List,
        OperationKind::Get,
        OperationKind::Search,
        OperationKind::Create,
        OperationKind::Update,
        OperationKind::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::List => "list",
            OperationKind::Get => "get",
            OperationKind::Search => "search",
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }

    /// Capability the policy engine checks before this operation runs.
    pub fn capability(self) -> Capability {
        match self {
            OperationKind::List | OperationKind::Get | OperationKind::Search => Capability::Read,
            OperationKind::Create => Capability::Create,
            OperationKind::Update => Capability::Update,
            OperationKind::Delete => Capability::Delete,
        }
    }

    /// Entity-shape suffix closing the identifier.
    pub fn suffix(self) -> &'static str {
        match self {
            OperationKind::List | OperationKind::Search => "documents",
            _ => "document",
        }
    }

    pub fn requires_name(self) -> bool {
        matches!(
            self,
            OperationKind::Get | OperationKind::Update | OperationKind::Delete
        )
    }

    pub fn requires_data(self) -> bool {
        matches!(self, OperationKind::Create | OperationKind::Update)
    }

    fn from_token(s: &str) -> Option<Self> {
        OperationKind::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed (kind, doctype) pair behind an operation identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub kind: OperationKind,
    pub doctype: String,
    pub requires_name: bool,
    pub requires_data: bool,
}

impl ToolDescriptor {
    pub fn new(kind: OperationKind, doctype: impl Into<String>) -> Self {
        Self {
            kind,
            doctype: doctype.into(),
            requires_name: kind.requires_name(),
            requires_data: kind.requires_data(),
        }
    }

    /// Parse `<kind>_<tokens..>_<suffix>`.
    ///
    /// Doctype tokens are capitalized and joined with spaces, so
    /// `list_sales_invoice_documents` resolves to `Sales Invoice`.
    pub fn parse(identifier: &str) -> Result<Self> {
        let parts: Vec<&str> = identifier.split('_').collect();
        if parts.len() < 3 {
            return Err(DocGateError::Validation(format!(
                "invalid operation identifier: {identifier}"
            )));
        }

        let (first, rest) = parts.split_at(1);
        let (middle, last) = rest.split_at(rest.len() - 1);

        let kind = OperationKind::from_token(first[0])
            .filter(|k| k.suffix() == last[0])
            .ok_or_else(|| DocGateError::Validation(format!("unknown operation: {identifier}")))?;

        if middle.iter().any(|t| t.is_empty()) {
            return Err(DocGateError::Validation(format!(
                "invalid operation identifier: {identifier}"
            )));
        }

        let doctype = middle
            .iter()
            .map(|t| capitalize(t))
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Self::new(kind, doctype))
    }

    /// Stable identifier for this descriptor (inverse of [`ToolDescriptor::parse`]
    /// for doctypes written in title case).
    pub fn identifier(&self) -> String {
        format!(
            "{}_{}_{}",
            self.kind.as_str(),
            snake_case(&self.doctype),
            self.kind.suffix()
        )
    }
}

/// `Sales Invoice` -> `sales_invoice`.
pub fn snake_case(doctype: &str) -> String {
    doctype.to_lowercase().replace(' ', "_")
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
