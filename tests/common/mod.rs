//! Common test fixtures for list view tests
//!
//! Provides record snapshots shaped like the API payloads for:
//! - Accounts (with contacts and addresses)
//! - Invoices (with commission lines)
//! - Orders

#![allow(dead_code)]

use chrono::NaiveDate;
use listview::listview_core::Snapshot;
use serde_json::{json, Value};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
}

pub fn accounts() -> Vec<Value> {
    vec![
        json!({
            "code": "ABC01", "name": "ABC Farms", "salesAgentId": "John Smith",
            "active": true, "createdAt": "2025-01-15",
            "contacts": [{"name": "Ann Lee", "email": "ann@abcfarms.com", "isPrimary": true}],
            "addresses": [{"line1": "1 Main St", "city": "Fresno", "state": "CA", "postalCode": "93701", "isPrimary": true}]
        }),
        json!({
            "code": "SUM02", "name": "Summit Supply", "salesAgentId": "Mary Jones",
            "active": true, "createdAt": "2025-01-14",
            "contacts": [
                {"name": "Sales", "email": "sales@summit.com", "isPrimary": false},
                {"name": "Info Desk", "email": "info@acme.com", "isPrimary": false}
            ]
        }),
        json!({
            "code": "BLU03", "name": "Blue Orchard", "salesAgentId": "John Smith",
            "active": false, "createdAt": "2024-12-01",
            "contacts": [],
            "addresses": [{"line1": "9 Orchard Rd", "city": "Modesto", "state": "CA", "postalCode": "95350"}]
        }),
        json!({
            "code": "XYZ04", "name": "XYZ Growers",
            "active": true, "createdAt": "2023-06-01"
        }),
        json!({
            "code": "ABD05", "name": "ABD Dairy", "salesAgentId": "John Doe",
            "active": true, "createdAt": "2025-01-09",
            "contacts": [
                {"name": "Zed", "email": "zed@abd.com", "phone": "555-0100"},
                {"name": "Amy", "email": "amy@abd.com", "phone": "555-0199", "isPrimary": true}
            ]
        }),
    ]
}

pub fn invoices() -> Vec<Value> {
    vec![
        json!({
            "orderNo": "SO-1001", "qboDocNumber": "INV-1", "orderDate": "2025-01-15",
            "status": "paid", "agentName": "John",
            "sellerAccountName": "ABC Farms", "sellerAccountCode": "ABC01",
            "buyerAccountName": "Summit Supply", "buyerAccountCode": "SUM02",
            "totalAmount": 100, "lines": [{"commissionAmt": "5.5"}]
        }),
        json!({
            "orderNo": "SO-1002", "qboDocNumber": "INV-2", "orderDate": "2025-01-14",
            "status": "draft", "agentName": "Ann",
            "sellerAccountName": "Blue Orchard", "sellerAccountCode": "BLU03",
            "buyerAccountName": "Summit Supply", "buyerAccountCode": "SUM02",
            "totalAmount": 200, "lines": [{"commissionAmt": 10}]
        }),
        json!({
            "orderNo": "SO-1003", "orderDate": "2025-01-02",
            "status": "paid", "agentName": "Ann",
            "sellerAccountName": "ABC Farms", "sellerAccountCode": "ABC01",
            "buyerAccountName": "XYZ Growers", "buyerAccountCode": "XYZ04",
            "totalAmount": 300, "lines": []
        }),
        json!({
            "orderNo": "SO-1004", "qboDocNumber": "INV-4", "orderDate": "2024-12-01",
            "status": "posted_to_qb",
            "sellerAccountName": "ABD Dairy", "sellerAccountCode": "ABD05",
            "buyerAccountName": "XYZ Growers", "buyerAccountCode": "XYZ04",
            "totalAmount": 400, "lines": [{"commissionAmt": "bad"}, {"commissionAmt": "4.5"}]
        }),
        json!({
            "orderNo": "SO-1005", "qboDocNumber": "INV-5", "orderDate": "2023-06-01",
            "status": "paid", "agentName": "John",
            "sellerAccountName": "ABC Farms", "sellerAccountCode": "ABC01",
            "buyerAccountName": "Blue Orchard", "buyerAccountCode": "BLU03",
            "totalAmount": 500
        }),
    ]
}

pub fn orders() -> Vec<Value> {
    vec![
        json!({"orderNo": "PO-1", "date": "2025-01-15", "status": "pending", "seller": "ABC Farms",
               "buyer": "Summit Supply", "product": "Almonds", "agent": "John", "total": 500, "commissionTotal": 25}),
        json!({"orderNo": "PO-2", "date": "2025-01-10", "status": "cancelled", "seller": "ABC Farms",
               "buyer": "XYZ Growers", "product": "Walnuts", "agent": "Ann", "total": 2500, "commissionTotal": 100}),
        json!({"orderNo": "PO-3", "date": "2024-11-20", "status": "void", "seller": "Blue Orchard",
               "buyer": "Summit Supply", "product": "Pistachios", "agent": "John", "total": 7000}),
        json!({"orderNo": "PO-4", "date": "2025-01-14", "status": "shipped", "seller": "ABD Dairy",
               "buyer": "XYZ Growers", "product": "Almonds", "total": 12000, "commissionTotal": 600}),
        json!({"orderNo": "PO-5", "status": "posted_to_qb", "seller": "ABC Farms",
               "buyer": "Blue Orchard", "agent": "Ann", "total": 999, "commissionTotal": "49.95"}),
    ]
}

pub fn snapshot(records: Vec<Value>) -> Snapshot {
    records.into()
}

/// Field of each resolved row, for readable assertions.
pub fn field_of(records: &[Value], rows: &[usize], field: &str) -> Vec<String> {
    rows.iter()
        .map(|&row| records[row][field].as_str().unwrap_or_default().to_string())
        .collect()
}
