use crate::label::Label;
use chrono::{Local, NaiveDate};

/// Storage prefix grouping one upload session: `"{event}/{YYYYMMDD}/"`.
///
/// The date is the day the upload runs, not the capture timestamp, so call it
/// once per session. Returns `None` when the batch is empty, when events differ
/// or when the event contains whitespace.
pub fn generate_key_prefix(labels: &[Label]) -> Option<String> {
    key_prefix_for_date(labels, Local::now().date_naive())
}

pub fn key_prefix_for_date(labels: &[Label], date: NaiveDate) -> Option<String> {
    let first = labels.first()?;
    let event = first.event.as_str();

    if event.is_empty() || event.chars().any(char::is_whitespace) {
        log::debug!("Event name {:?} is not usable in a key prefix", event);
        return None;
    }
    if let Some(other) = labels.iter().find(|l| l.event != event) {
        log::debug!(
            "Batch mixes events {:?} and {:?} (img_id {})",
            event,
            other.event,
            other.img_id
        );
        return None;
    }

    Some(format!("{}/{}/", event, date.format("%Y%m%d")))
}

/// Joins a bucket and a key prefix into a location, dropping empty segments so
/// `"bucket/"` + `"/weird/path//"` gives `"bucket/weird/path"`.
pub fn normalize_location(bucket: &str, key_prefix: &str) -> String {
    bucket
        .split('/')
        .chain(key_prefix.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Object path of one picture blob under a location.
pub fn object_path(location: &str, img_id: impl std::fmt::Display) -> String {
    if location.is_empty() {
        img_id.to_string()
    } else {
        format!("{}/{}", location.trim_end_matches('/'), img_id)
    }
}
