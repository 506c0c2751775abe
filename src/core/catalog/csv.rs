use crate::core::catalog::model::{Product, new_id};

/// Minimum number of comma-separated fields in an accepted record.
pub const CSV_FIELD_COUNT: usize = 6;

/// Parses product records: code, name, content, size, price, tax.
///
/// The first line is a header and is discarded. Fields are split on bare
/// commas (no quoting); records with fewer than six fields are dropped and
/// fields past the sixth are ignored.
pub fn parse_products(text: &str) -> Vec<Product> {
    text.lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let values: Vec<&str> = line.split(',').map(str::trim).collect();
            if values.len() < CSV_FIELD_COUNT {
                return None;
            }
            Some(Product {
                id: new_id(),
                product_code: values[0].to_string(),
                product_name: values[1].to_string(),
                content: values[2].to_string(),
                size: values[3].to_string(),
                price: values[4].to_string(),
                tax: values[5].to_string(),
                images: Vec::new(),
                logo_url: None,
            })
        })
        .collect()
}
