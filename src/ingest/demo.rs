use serde_json::json;

use crate::models::{Dataset, Record};

pub const DEMO_SOURCE_NAME: &str = "FinAura_Demo_Dataset.xlsx";

const DEMO_ROWS: [(&str, &str, &str, i64); 10] = [
    ("2025-01-05", "ABC Retail", "Product Sales", 120_000),
    ("2025-01-10", "XYZ Traders", "Wholesale", 85_000),
    ("2025-01-18", "Online Store", "E-commerce", 45_000),
    ("2025-02-03", "ABC Retail", "Product Sales", 150_000),
    ("2025-02-20", "Corporate Corp", "Bulk Order", 200_000),
    ("2025-03-05", "XYZ Traders", "Wholesale", 95_000),
    ("2025-03-12", "Global Tech", "Consulting", 320_000),
    ("2025-03-25", "Online Store", "E-commerce", 55_000),
    ("2025-04-02", "ABC Retail", "Product Sales", 180_000),
    ("2025-04-15", "Mega Mall", "Retail", 410_000),
];

/// Ten revenue rows with fields `Date, Client, Revenue_Stream, Amount_INR`.
pub fn demo_dataset() -> Dataset {
    let records = DEMO_ROWS
        .iter()
        .filter_map(|(date, client, stream, amount)| {
            let row = json!({
                "Date": date,
                "Client": client,
                "Revenue_Stream": stream,
                "Amount_INR": amount,
            });
            row.as_object().cloned()
        })
        .collect::<Vec<Record>>();
    Dataset::new(records)
}
