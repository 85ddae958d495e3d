use crate::error::AppError;
use serde_json::Value;
use std::path::Path;

/// Replaces every character of `chars` with `substitute` in the listed string
/// fields of each label object. Returns the number of replaced characters.
pub fn substitute_in_labels(
    labels: &mut [Value],
    chars: &str,
    substitute: &str,
    fields: &[String],
) -> usize {
    let mut count = 0;
    for label in labels.iter_mut() {
        let Some(object) = label.as_object_mut() else {
            continue;
        };
        for (field, value) in object.iter_mut() {
            if !fields.iter().any(|f| f == field) {
                continue;
            }
            if let Value::String(text) = value {
                let mut replaced = String::with_capacity(text.len());
                for c in text.chars() {
                    if chars.contains(c) {
                        replaced.push_str(substitute);
                        count += 1;
                    } else {
                        replaced.push(c);
                    }
                }
                *text = replaced;
            }
        }
    }
    count
}

/// Applies `substitute_in_labels` to a label file in place. The file is
/// rewritten as a pretty-printed array even if it held a single object.
pub fn fix_label_file(
    path: &Path,
    chars: &str,
    substitute: &str,
    fields: &[String],
) -> Result<usize, AppError> {
    if chars.is_empty() {
        return Err(AppError::Generic("no character to substitute".into()));
    }
    let raw = std::fs::read_to_string(path)?;
    let mut labels = match serde_json::from_str::<Value>(&raw)? {
        Value::Array(labels) => labels,
        other => vec![other],
    };
    let count = substitute_in_labels(&mut labels, chars, substitute, fields);
    std::fs::write(path, serde_json::to_string_pretty(&labels)?)?;
    log::info!("{} substitution(s) made in {:?}", count, path);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn replaces_only_listed_fields() {
        let mut labels = vec![
            json!({"event": "event test 1", "file_name": "a b.jpg", "img_id": 1}),
            json!({"event": "event test", "file_name": "c.jpg", "img_id": "x y"}),
        ];
        let count = substitute_in_labels(&mut labels, " ", "_", &["event".to_string()]);
        assert_eq!(count, 3);
        assert_eq!(labels[0]["event"], "event_test_1");
        assert_eq!(labels[0]["file_name"], "a b.jpg");
        assert_eq!(labels[1]["img_id"], "x y");
    }

    #[test]
    fn rewrites_single_object_file_as_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        std::fs::write(&path, r#"{"event": "a-b", "img_id": 1, "file_name": "1.jpg"}"#).unwrap();

        let count = fix_label_file(&path, "-", "_", &["event".to_string()]).unwrap();
        assert_eq!(count, 1);
        let rewritten: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(rewritten, json!([{"event": "a_b", "img_id": 1, "file_name": "1.jpg"}]));
    }
}
