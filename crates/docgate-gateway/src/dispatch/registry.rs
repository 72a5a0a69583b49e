//! Operation registry: stable identifiers mapped to routes.
//!
//! Built once from the permission configuration. Identifiers for configured
//! doctypes map to the exact configured doctype name, so no string
//! reconstruction happens for them at dispatch time.

use docgate_core::{OperationKind, ToolDescriptor};

use crate::policy::PolicyEngine;

/// Fixed operations that do not act on a single doctype's documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemOp {
    TestConnection,
    SystemInfo,
    ListDoctypes,
    DoctypePermissions,
    DoctypeSchema,
    LinkedDocuments,
}

impl SystemOp {
    pub const ALL: [SystemOp; 6] = [
        SystemOp::TestConnection,
        SystemOp::SystemInfo,
        SystemOp::ListDoctypes,
        SystemOp::DoctypePermissions,
        SystemOp::DoctypeSchema,
        SystemOp::LinkedDocuments,
    ];

    pub fn identifier(self) -> &'static str {
        match self {
            SystemOp::TestConnection => "test_connection",
            SystemOp::SystemInfo => "get_system_info",
            SystemOp::ListDoctypes => "list_doctypes",
            SystemOp::DoctypePermissions => "get_doctype_permissions",
            SystemOp::DoctypeSchema => "get_doctype_schema",
            SystemOp::LinkedDocuments => "list_linked_documents",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Doctype carried by the identifier.
    Document(ToolDescriptor),
    /// Doctype carried by the `doctype` argument.
    Generic(OperationKind),
    System(SystemOp),
}

impl Route {
    /// Name of the service family that handles this route.
    pub fn family(&self) -> &'static str {
        match self {
            Route::Document(_) | Route::Generic(_) => "documents",
            Route::System(_) => "system",
        }
    }
}

pub fn generic_identifier(kind: OperationKind) -> String {
    format!("{}_generic_{}", kind.as_str(), kind.suffix())
}

/// One registry entry. Unlisted entries still resolve, so a configured
/// doctype's own policy decides every kind; they are just not advertised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub name: String,
    pub route: Route,
    pub listed: bool,
}

impl RouteEntry {
    fn listed(name: String, route: Route) -> Self {
        Self {
            name,
            route,
            listed: true,
        }
    }
}

/// Routes for every configured doctype and operation kind, plus the fixed ones.
/// Kinds whose capability the doctype lacks are registered unlisted.
pub fn build_routes(policy: &PolicyEngine) -> Vec<RouteEntry> {
    let mut out = Vec::new();

    for op in SystemOp::ALL {
        out.push(RouteEntry::listed(op.identifier().to_string(), Route::System(op)));
    }
    for kind in OperationKind::ALL {
        out.push(RouteEntry::listed(generic_identifier(kind), Route::Generic(kind)));
    }

    for doctype in policy.configured_doctypes() {
        for kind in OperationKind::ALL {
            let listed = policy.can(kind.capability(), &doctype);
            let d = ToolDescriptor::new(kind, doctype.clone());
            out.push(RouteEntry {
                name: d.identifier(),
                route: Route::Document(d),
                listed,
            });
        }
    }
    out
}
