use std::fs;

use serde_json::Value;

use crate::error::InputError;

/// Key of the nested row array some exports wrap their data in:
/// `[{"rawData": [row, row, ...]}]`.
pub const RAW_DATA_KEY: &str = "rawData";

/// Key workflow tools put each row under: `{"json": row}`.
pub const ITEM_WRAPPER_KEY: &str = "json";

pub fn load_records(filename: &str) -> Result<Vec<Value>, InputError> {
    let content = fs::read_to_string(filename).map_err(|source| InputError::Io {
        path: filename.to_string(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| InputError::Json {
        path: filename.to_string(),
        source,
    })?;
    let rows = extract_records(value)?;
    log::info!("{}: {} rows", filename, rows.len());
    Ok(rows)
}

pub fn extract_records(value: Value) -> Result<Vec<Value>, InputError> {
    let Value::Array(mut items) = value else {
        return Err(InputError::Shape);
    };
    let wrapped = items
        .first()
        .and_then(|first| first.get(RAW_DATA_KEY))
        .is_some();
    if wrapped {
        let mut first = items.swap_remove(0);
        items = match first.get_mut(RAW_DATA_KEY).map(Value::take) {
            Some(Value::Array(rows)) => rows,
            _ => return Err(InputError::Shape),
        };
    }
    Ok(items.into_iter().map(unwrap_item).collect())
}

fn unwrap_item(item: Value) -> Value {
    match item {
        Value::Object(mut fields)
            if matches!(fields.get(ITEM_WRAPPER_KEY), Some(Value::Object(_))) =>
        {
            fields.remove(ITEM_WRAPPER_KEY).unwrap_or_default()
        }
        other => other,
    }
}
