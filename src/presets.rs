//! Built-in column tables for the account, invoice and order list views.
//!
//! Record shapes follow the API payloads: accounts carry `contacts` and
//! `addresses` sub-collections, invoices carry `lines`.

use std::collections::BTreeMap;

use listview_core::{
    ActiveRule, AggregateSpec, Band, CategorySpec, ColumnDef, ColumnTable, GroupStrategy,
    MatchTarget, Matcher, SearchField, SumSpec, ValueSource,
};

/// Names of the built-in tables.
pub const BUILTIN_TABLES: [&str; 3] = ["accounts", "invoices", "orders"];

/// Look up a built-in table by name.
pub fn by_name(name: &str) -> Option<ColumnTable> {
    match name {
        "accounts" => Some(accounts()),
        "invoices" => Some(invoices()),
        "orders" => Some(orders()),
        _ => None,
    }
}

/// Every built-in table keyed by name.
pub fn builtin() -> BTreeMap<String, ColumnTable> {
    BUILTIN_TABLES
        .iter()
        .filter_map(|name| by_name(name))
        .map(|table| (table.name.clone(), table))
        .collect()
}

/// Accounts: contacts and addresses resolve through their primary element.
pub fn accounts() -> ColumnTable {
    let status = ValueSource::flag("active", "active", "inactive");

    ColumnTable::new("accounts")
        .column(ColumnDef::text("code", ValueSource::field("code")))
        .column(ColumnDef::text("name", ValueSource::field("name")))
        .column(
            ColumnDef::text("contact", ValueSource::primary("contacts", &["name"]))
                .with_filter(Matcher::contains(MatchTarget::any_element("contacts", &["name"])))
                .with_empty_label("No Contact"),
        )
        .column(
            ColumnDef::text("phone", ValueSource::primary("contacts", &["phone"]))
                .with_filter(Matcher::contains(MatchTarget::any_element("contacts", &["phone"]))),
        )
        .column(
            ColumnDef::text("email", ValueSource::primary("contacts", &["email"]))
                .with_filter(Matcher::contains(MatchTarget::any_element("contacts", &["email"]))),
        )
        .column(
            ColumnDef::text("address", ValueSource::primary("addresses", &["city", "state"]))
                .with_filter(Matcher::contains(MatchTarget::joined_element(
                    "addresses",
                    &["city", "state"],
                    ", ",
                )))
                .with_empty_label("No Address"),
        )
        .column(ColumnDef::text("agent", ValueSource::field("salesAgentId")).with_empty_label("No Agent"))
        .column(
            ColumnDef::text("status", status.clone()).with_filter(Matcher::exact(MatchTarget::Values {
                sources: vec![status],
            })),
        )
        .column(
            ColumnDef::date("createdAt", ValueSource::field("createdAt"))
                .with_group(GroupStrategy::DateBucket)
                .with_empty_label("No Date"),
        )
        .search_field(SearchField::new("agent", MatchTarget::fields(&["salesAgentId"])))
        .search_field(SearchField::new("name", MatchTarget::fields(&["name"])))
        .search_field(SearchField::new("code", MatchTarget::fields(&["code"])))
        .search_field(SearchField::new(
            "email",
            MatchTarget::any_element("contacts", &["email"]),
        ))
        .search_field(SearchField::new(
            "contact",
            MatchTarget::any_element("contacts", &["name", "email", "phone"]),
        ))
        .search_field(SearchField::new(
            "phone",
            MatchTarget::any_element("contacts", &["phone"]),
        ))
        .search_field(
            SearchField::new(
                "address",
                MatchTarget::any_element("addresses", &["city", "state", "line1", "line2"]),
            )
            .with_alias("city"),
        )
        .search_field(SearchField::new(
            "state",
            MatchTarget::any_element("addresses", &["state"]),
        ))
        .search_field(
            SearchField::new("zip", MatchTarget::any_element("addresses", &["postalCode"]))
                .with_alias("postal"),
        )
        .surface(MatchTarget::fields(&["name", "code", "salesAgentId"]))
        .surface(MatchTarget::any_element("contacts", &["name", "email", "phone"]))
        .surface(MatchTarget::any_element(
            "addresses",
            &["line1", "line2", "city", "state", "postalCode"],
        ))
        .date_column("createdAt")
        .active_rule(ActiveRule::Flag {
            path: "active".to_string(),
        })
}

/// Invoices: commission totals are summed over invoice lines.
pub fn invoices() -> ColumnTable {
    ColumnTable::new("invoices")
        .column(ColumnDef::text("invoiceNumber", ValueSource::field("qboDocNumber")))
        .column(ColumnDef::text("orderNumber", ValueSource::field("orderNo")))
        .column(
            ColumnDef::date("date", ValueSource::field("orderDate"))
                .with_group(GroupStrategy::ExactDate)
                .with_empty_label("No Date"),
        )
        .column(
            ColumnDef::date("dateRange", ValueSource::field("orderDate"))
                .with_group(GroupStrategy::DateBucket)
                .with_empty_label("No Date"),
        )
        .column(
            ColumnDef::text("seller", ValueSource::field("sellerAccountName"))
                .with_filter(Matcher::contains(MatchTarget::fields(&[
                    "sellerAccountName",
                    "sellerAccountCode",
                ])))
                .with_empty_label("Unknown Seller"),
        )
        .column(
            ColumnDef::text("buyer", ValueSource::field("buyerAccountName"))
                .with_filter(Matcher::contains(MatchTarget::fields(&[
                    "buyerAccountName",
                    "buyerAccountCode",
                ])))
                .with_empty_label("Unknown Buyer"),
        )
        .column(ColumnDef::text("agent", ValueSource::field("agentName")).with_empty_label("No Agent"))
        .column(ColumnDef::number("amount", ValueSource::field("totalAmount")))
        .column(
            ColumnDef::text("status", ValueSource::field("status"))
                .with_group(GroupStrategy::UpperValue)
                .with_empty_label("UNKNOWN"),
        )
        .search_field(
            SearchField::new("invoice", MatchTarget::fields(&["qboDocNumber"])).with_alias("number"),
        )
        .search_field(SearchField::new("order", MatchTarget::fields(&["orderNo"])))
        .search_field(SearchField::new(
            "seller",
            MatchTarget::fields(&["sellerAccountName", "sellerAccountCode"]),
        ))
        .search_field(SearchField::new(
            "buyer",
            MatchTarget::fields(&["buyerAccountName", "buyerAccountCode"]),
        ))
        .search_field(SearchField::new("agent", MatchTarget::fields(&["agentName"])))
        .search_field(SearchField::new("status", MatchTarget::fields(&["status"])))
        .surface(MatchTarget::fields(&[
            "qboDocNumber",
            "orderNo",
            "sellerAccountName",
            "buyerAccountName",
            "sellerAccountCode",
            "buyerAccountCode",
            "agentName",
        ]))
        .date_column("date")
        .aggregates(
            AggregateSpec::default()
                .sum(SumSpec::field("totalAmount", "totalAmount"))
                .sum(SumSpec::nested("totalCommission", "lines", "commissionAmt"))
                .category(CategorySpec::new("status")),
        )
}

fn order_value_bands() -> GroupStrategy {
    let band = |below: f64, label: &str| Band {
        below,
        label: label.to_string(),
    };
    GroupStrategy::Bands {
        bands: vec![
            band(1000.0, "1. Small Orders (< $1,000)"),
            band(5000.0, "2. Medium Orders ($1,000 - $5,000)"),
            band(10000.0, "3. Large Orders ($5,000 - $10,000)"),
        ],
        otherwise: "4. Very Large Orders ($10,000+)".to_string(),
    }
}

fn payment_status_mapping() -> GroupStrategy {
    let mut map = BTreeMap::new();
    for status in ["pending", "confirmed", "shipped", "delivered"] {
        map.insert(status.to_string(), "1. Active Orders".to_string());
    }
    map.insert("posted_to_qb".to_string(), "2. Posted to QuickBooks".to_string());
    GroupStrategy::Mapping {
        map,
        otherwise: "3. Other".to_string(),
    }
}

/// Orders: value bands, payment-status categories and an active-only rule
/// excluding cancelled, void and inactive orders.
pub fn orders() -> ColumnTable {
    ColumnTable::new("orders")
        .column(ColumnDef::text("orderNo", ValueSource::field("orderNo")))
        .column(
            ColumnDef::date("date", ValueSource::field("date"))
                .with_group(GroupStrategy::ExactDate)
                .with_empty_label("No Date"),
        )
        .column(
            ColumnDef::date("dateRange", ValueSource::field("date"))
                .with_group(GroupStrategy::DateBucket)
                .with_empty_label("No Date"),
        )
        .column(ColumnDef::text("seller", ValueSource::field("seller")).with_empty_label("Unknown Seller"))
        .column(ColumnDef::text("buyer", ValueSource::field("buyer")).with_empty_label("Unknown Buyer"))
        .column(ColumnDef::text("product", ValueSource::field("product")).with_empty_label("No Product"))
        .column(ColumnDef::text("agent", ValueSource::field("agent")).with_empty_label("No Agent"))
        .column(ColumnDef::number("total", ValueSource::field("total")))
        .column(ColumnDef::number("commission", ValueSource::field("commissionTotal")))
        .column(ColumnDef::number("orderValue", ValueSource::field("total")).with_group(order_value_bands()))
        .column(ColumnDef::text("paymentStatus", ValueSource::field("status")).with_group(payment_status_mapping()))
        .column(
            ColumnDef::text("status", ValueSource::field("status"))
                .with_filter(Matcher::exact(MatchTarget::fields(&["status"]))),
        )
        .search_field(SearchField::new("order", MatchTarget::fields(&["orderNo"])).with_alias("orderno"))
        .search_field(SearchField::new("seller", MatchTarget::fields(&["seller"])))
        .search_field(SearchField::new("buyer", MatchTarget::fields(&["buyer"])))
        .search_field(SearchField::new("product", MatchTarget::fields(&["product"])))
        .search_field(SearchField::new("agent", MatchTarget::fields(&["agent"])))
        .search_field(SearchField::new("status", MatchTarget::fields(&["status"])))
        .surface(MatchTarget::fields(&["orderNo", "seller", "buyer", "product", "agent"]))
        .date_column("date")
        .active_rule(ActiveRule::ExcludeStatuses {
            path: "status".to_string(),
            statuses: vec![
                "cancelled".to_string(),
                "void".to_string(),
                "inactive".to_string(),
            ],
        })
        .aggregates(
            AggregateSpec::default()
                .sum(SumSpec::field("totalAmount", "total"))
                .sum(SumSpec::field("totalCommission", "commissionTotal"))
                .category(CategorySpec::new("status")),
        )
}
