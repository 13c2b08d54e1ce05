use serde_json::Value;

/// Fields tried in order when printing the single headline number.
const PRIORITY_KEYS: [&str; 4] = ["adjusted_fair_value", "discount_rate", "fair_value", "price"];

/// Print just the key answer value from the output.
///
/// Valuations print the adjusted fair value and their label, fetches print
/// the discount rate; anything else falls back to its first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    println!("{}", minimal_line(result_obj));
}

fn minimal_line(result: &Value) -> String {
    let Value::Object(map) = result else {
        return format_minimal(result);
    };

    for key in PRIORITY_KEYS {
        if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
            return match map.get("classification") {
                Some(Value::String(label)) => format!("{} {}", format_minimal(val), label),
                _ => format_minimal(val),
            };
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, format_minimal(val)),
        None => String::new(),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valuation_prints_adjusted_value_and_label() {
        let result = json!({"fair_value": "59.59", "adjusted_fair_value": "53.63", "classification": "upside"});
        assert_eq!(minimal_line(&result), "53.63 upside");
    }

    #[test]
    fn test_fetch_prints_discount_rate() {
        let result = json!({"symbol": "PETR4.SA", "discount_rate": "0.159", "price": "30"});
        assert_eq!(minimal_line(&result), "0.159");
    }

    #[test]
    fn test_null_priority_field_is_skipped() {
        let result = json!({"symbol": "PETR4.SA", "discount_rate": null, "price": "30"});
        assert_eq!(minimal_line(&result), "30");
    }
}
