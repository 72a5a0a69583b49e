//! Operation identifier parsing tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use docgate_core::{Capability, OperationKind, ToolDescriptor};

#[test]
fn parse_multi_word_doctype() {
    let d = ToolDescriptor::parse("list_sales_invoice_documents").unwrap();
    assert_eq!(d.kind, OperationKind::List);
    assert_eq!(d.doctype, "Sales Invoice");
    assert!(!d.requires_name);
    assert!(!d.requires_data);
}

#[test]
fn parse_sets_argument_requirements() {
    let d = ToolDescriptor::parse("update_item_document").unwrap();
    assert_eq!(d.kind, OperationKind::Update);
    assert_eq!(d.doctype, "Item");
    assert!(d.requires_name);
    assert!(d.requires_data);

    let d = ToolDescriptor::parse("delete_item_document").unwrap();
    assert!(d.requires_name);
    assert!(!d.requires_data);
}

#[test]
fn too_few_tokens_is_invalid() {
    let err = ToolDescriptor::parse("list_documents").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "VALIDATION");
    assert!(err.to_string().contains("invalid operation identifier"));
}

#[test]
fn mismatched_suffix_is_unknown() {
    for name in [
        "list_item_document",
        "get_item_documents",
        "delete_item_documents",
        "archive_item_document",
    ] {
        let err = ToolDescriptor::parse(name).expect_err("must fail");
        assert!(err.to_string().contains("unknown operation"), "{name}: {err}");
    }
}

#[test]
fn empty_doctype_token_is_invalid() {
    let err = ToolDescriptor::parse("get__document").expect_err("must fail");
    assert!(err.to_string().contains("invalid operation identifier"));
}

#[test]
fn identifier_round_trips_title_case_doctypes() {
    for kind in OperationKind::ALL {
        let d = ToolDescriptor::new(kind, "Purchase Order");
        let parsed = ToolDescriptor::parse(&d.identifier()).unwrap();
        assert_eq!(parsed, d);
    }
}

#[test]
fn read_kinds_share_read_capability() {
    assert_eq!(OperationKind::List.capability(), Capability::Read);
    assert_eq!(OperationKind::Get.capability(), Capability::Read);
    assert_eq!(OperationKind::Search.capability(), Capability::Read);
    assert_eq!(OperationKind::Delete.capability(), Capability::Delete);
}

#[test]
fn capability_parse_is_case_insensitive() {
    assert_eq!(Capability::parse("CREATE"), Some(Capability::Create));
    assert_eq!(Capability::parse("archive"), None);
}
