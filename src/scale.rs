use crate::row::RawCell;
use serde_json::{Number, Value};

/// Keys whose numeric contents shrink with the table.
pub const SCALABLE_STYLE_FIELDS: [&str; 15] = [
    "cellWidth",
    "cellPadding",
    "cellMargin",
    "lineWidth",
    "doubleLineSpacing",
    "dashedLineLength",
    "dashedLineSpace",
    "fontSize",
    "minCellHeight",
    "maxCellHeight",
    "minCellWidth",
    "stripeSpacing",
    "shadeProps",
    "width",
    "margin",
];

pub fn is_scalable_field(key: &str) -> bool {
    SCALABLE_STYLE_FIELDS.contains(&key)
}

/// Factor that squeezes the header's declared widths into the page.
/// Cells count `styles.cellWidth`, else `width`; cells with neither add
/// nothing. Never greater than 1.
pub fn calculate_scale_factor(header: &[RawCell], printable_width: f64) -> f64 {
    let total: f64 = header
        .iter()
        .filter_map(|cell| {
            cell.styles
                .as_ref()
                .and_then(|styles| styles.cell_width)
                .or(cell.width)
        })
        .map(f64::from)
        .sum();
    let page_width = printable_width.floor();
    if total > 0.0 && page_width < total {
        (page_width / total).min(1.0)
    } else {
        1.0
    }
}

/// Multiplies every number found under a scalable key, at any depth.
/// A factor of 1 leaves the tree untouched.
pub fn scale_value(value: &mut Value, factor: f64) {
    if factor == 1.0 || !factor.is_finite() {
        return;
    }
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if is_scalable_field(key) {
                    scale_numbers(child, factor);
                } else {
                    scale_value(child, factor);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                scale_value(item, factor);
            }
        }
        _ => {}
    }
}

fn scale_numbers(value: &mut Value, factor: f64) {
    match value {
        Value::Number(number) => {
            if let Some(scaled) = number
                .as_f64()
                .map(|n| n * factor)
                .and_then(Number::from_f64)
            {
                *number = scaled;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|item| scale_numbers(item, factor)),
        Value::Object(map) => map.values_mut().for_each(|item| scale_numbers(item, factor)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn header(json: Value) -> Vec<RawCell> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn factor_is_one_when_columns_fit() {
        let head = header(json!([{ "styles": { "cellWidth": 100 } }, { "width": 200 }]));
        assert_eq!(calculate_scale_factor(&head, 500.0), 1.0);
        assert_eq!(calculate_scale_factor(&[], 500.0), 1.0);
    }

    #[test]
    fn factor_shrinks_to_floored_page_width() {
        let head = header(json!([
            { "styles": { "cellWidth": 400 }, "width": 10 },
            { "width": 600 },
            { "content": "no width" }
        ]));
        // 400 + 600 against floor(500.9)
        assert_eq!(calculate_scale_factor(&head, 500.9), 0.5);
    }

    #[test]
    fn scales_nested_style_fields_only() {
        let mut value = json!({
            "head": [[{
                "content": 120,
                "width": 80,
                "styles": {
                    "cellWidth": 100,
                    "cellPadding": { "top": 4, "left": 6 },
                    "lineWidth": [1, 2],
                    "fillColor": "ffffff",
                    "minCellHeight": 30
                }
            }]],
            "scaleFactor": 0.5
        });
        scale_value(&mut value, 0.5);
        let cell = &value["head"][0][0];
        assert_eq!(cell["content"], json!(120));
        assert_eq!(cell["width"], json!(40.0));
        assert_eq!(cell["styles"]["cellWidth"], json!(50.0));
        assert_eq!(cell["styles"]["cellPadding"], json!({ "top": 2.0, "left": 3.0 }));
        assert_eq!(cell["styles"]["lineWidth"], json!([0.5, 1.0]));
        assert_eq!(cell["styles"]["fillColor"], json!("ffffff"));
        assert_eq!(cell["styles"]["minCellHeight"], json!(15.0));
        assert_eq!(value["scaleFactor"], json!(0.5));
    }

    #[test]
    fn unit_factor_is_a_no_op() {
        let original = json!({ "cellWidth": 7, "margin": "lg" });
        let mut value = original.clone();
        scale_value(&mut value, 1.0);
        assert_eq!(value, original);
        scale_value(&mut value, 0.5);
        assert_eq!(value["margin"], json!("lg"));
    }
}
