//! Strongly-typed record for the generated invoice schema
//!
//! The model returns one JSON object whose values are parallel arrays under
//! a fixed set of fields. Representing the schema as a struct (rather than
//! an open-ended map) keeps unknown keys out and makes the length-equality
//! pass a plain iteration over the fields.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::storage::DataTable;

/// The fixed invoice schema fields, in artifact column order.
pub const INVOICE_FIELDS: [&str; 21] = [
    "description",
    "codigo_1",
    "quantity",
    "unit_price_usd",
    "amount_usd",
    "customer",
    "origin",
    "brand",
    "part_number",
    "invoice",
    "sender",
    "unit",
    "currency",
    "incoterm",
    "item_id",
    "invoice_date",
    "customer_address",
    "codigo_2",
    "invoice_total",
    "subtotal",
    "due_date",
];

/// Parallel-array invoice record as produced by the generative model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceTable {
    pub description: Vec<String>,
    pub codigo_1: Vec<String>,
    pub quantity: Vec<String>,
    pub unit_price_usd: Vec<String>,
    pub amount_usd: Vec<String>,
    pub customer: Vec<String>,
    pub origin: Vec<String>,
    pub brand: Vec<String>,
    pub part_number: Vec<String>,
    pub invoice: Vec<String>,
    pub sender: Vec<String>,
    pub unit: Vec<String>,
    pub currency: Vec<String>,
    pub incoterm: Vec<String>,
    pub item_id: Vec<String>,
    pub invoice_date: Vec<String>,
    pub customer_address: Vec<String>,
    pub codigo_2: Vec<String>,
    pub invoice_total: Vec<String>,
    pub subtotal: Vec<String>,
    pub due_date: Vec<String>,
}

impl InvoiceTable {
    /// Build from a recovered JSON object.
    ///
    /// Missing schema keys become empty arrays and keys outside the schema
    /// are ignored, but `item_id` must be present and every provided value
    /// must be an array.
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| Error::Validation("model output is not a JSON object".to_string()))?;
        if !map.contains_key("item_id") {
            return Err(Error::Validation(
                "\"item_id\" key not found in model output".to_string(),
            ));
        }

        let mut table = Self::default();
        for (name, slot) in table.fields_mut() {
            if let Some(v) = map.get(name) {
                let array = v.as_array().ok_or_else(|| {
                    Error::Validation(format!("value for \"{}\" must be an array", name))
                })?;
                *slot = array.iter().map(cell_text).collect();
            }
        }
        Ok(table)
    }

    /// Number of generated rows: the literal length of the `item_id` array.
    /// Duplicate item ids are preserved, not deduplicated.
    pub fn row_count(&self) -> usize {
        self.item_id.len()
    }

    /// Force every field array to the `item_id` length.
    ///
    /// Shorter arrays pad: with their constant value when every existing
    /// element is equal, otherwise with the empty-string placeholder (an
    /// empty array always pads with the placeholder). Longer arrays
    /// truncate. Reads against a copy; the input is never mutated.
    pub fn balanced(&self) -> InvoiceTable {
        let target = self.item_id.len();
        let mut balanced = self.clone();
        for (_, list) in balanced.fields_mut() {
            balance_list(list, target);
        }
        balanced
    }

    /// Whether every field array already has the `item_id` length.
    pub fn is_balanced(&self) -> bool {
        let target = self.item_id.len();
        self.fields().iter().all(|(_, list)| list.len() == target)
    }

    /// Transpose into a column-ordered table, schema order preserved.
    pub fn to_table(&self) -> DataTable {
        let mut table = DataTable::new(INVOICE_FIELDS.iter().map(|s| s.to_string()).collect());
        for row in 0..self.row_count() {
            table.push_row(
                self.fields()
                    .iter()
                    .map(|(_, list)| list.get(row).cloned().unwrap_or_default())
                    .collect(),
            );
        }
        table
    }

    fn fields(&self) -> [(&'static str, &Vec<String>); 21] {
        [
            ("description", &self.description),
            ("codigo_1", &self.codigo_1),
            ("quantity", &self.quantity),
            ("unit_price_usd", &self.unit_price_usd),
            ("amount_usd", &self.amount_usd),
            ("customer", &self.customer),
            ("origin", &self.origin),
            ("brand", &self.brand),
            ("part_number", &self.part_number),
            ("invoice", &self.invoice),
            ("sender", &self.sender),
            ("unit", &self.unit),
            ("currency", &self.currency),
            ("incoterm", &self.incoterm),
            ("item_id", &self.item_id),
            ("invoice_date", &self.invoice_date),
            ("customer_address", &self.customer_address),
            ("codigo_2", &self.codigo_2),
            ("invoice_total", &self.invoice_total),
            ("subtotal", &self.subtotal),
            ("due_date", &self.due_date),
        ]
    }

    fn fields_mut(&mut self) -> [(&'static str, &mut Vec<String>); 21] {
        [
            ("description", &mut self.description),
            ("codigo_1", &mut self.codigo_1),
            ("quantity", &mut self.quantity),
            ("unit_price_usd", &mut self.unit_price_usd),
            ("amount_usd", &mut self.amount_usd),
            ("customer", &mut self.customer),
            ("origin", &mut self.origin),
            ("brand", &mut self.brand),
            ("part_number", &mut self.part_number),
            ("invoice", &mut self.invoice),
            ("sender", &mut self.sender),
            ("unit", &mut self.unit),
            ("currency", &mut self.currency),
            ("incoterm", &mut self.incoterm),
            ("item_id", &mut self.item_id),
            ("invoice_date", &mut self.invoice_date),
            ("customer_address", &mut self.customer_address),
            ("codigo_2", &mut self.codigo_2),
            ("invoice_total", &mut self.invoice_total),
            ("subtotal", &mut self.subtotal),
            ("due_date", &mut self.due_date),
        ]
    }
}

/// Array elements arrive as strings most of the time, but the model
/// occasionally emits bare numbers; nulls become the empty placeholder.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn balance_list(list: &mut Vec<String>, target: usize) {
    let current = list.len();
    if current < target {
        let pad = if current == 0 {
            String::new()
        } else if list.iter().all(|element| element == &list[0]) {
            list[0].clone()
        } else {
            // Mixed values: never guess from partial data
            String::new()
        };
        list.resize(target, pad);
    } else if current > target {
        list.truncate(target);
    }
}
