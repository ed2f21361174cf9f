#![forbid(unsafe_code)]

use super::seconds_to_rfc3339;
use serde_json::Value;
use std::io::Write;

pub(crate) fn print_json(value: &Value) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Adds a `time` field in RFC 3339 next to the numeric `timestamp` of a
/// transaction and each of its changes.
pub(crate) fn annotate_times(transaction: &mut Value) {
    annotate_one(transaction);
    if let Some(changes) = transaction.get_mut("changes").and_then(Value::as_array_mut) {
        changes.iter_mut().for_each(annotate_one);
    }
}

fn annotate_one(value: &mut Value) {
    let Some(seconds) = value.get("timestamp").and_then(Value::as_f64) else {
        return;
    };
    if let Some(object) = value.as_object_mut() {
        object.insert("time".to_string(), Value::String(seconds_to_rfc3339(seconds)));
    }
}

/// Writes `\rlabel done/total` to stderr, ending the line on the last step.
pub(crate) fn report_progress(label: &str, done: usize, total: usize) {
    eprint!("{}", progress_line(label, done, total));
}

fn progress_line(label: &str, done: usize, total: usize) -> String {
    let end = if done == total { "\n" } else { "" };
    format!("\r{label} {done}/{total}{end}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn progress_line_ends_on_last_step() {
        assert_eq!(progress_line("checked", 1, 3), "\rchecked 1/3");
        assert_eq!(progress_line("checked", 3, 3), "\rchecked 3/3\n");
    }

    #[test]
    fn annotates_transaction_and_changes() {
        let mut value = json!({
            "id": 1,
            "timestamp": 0.0,
            "changes": [{"id": 1, "timestamp": 86_400.0}]
        });
        annotate_times(&mut value);
        assert_eq!(value["time"], "1970-01-01T00:00:00Z");
        assert_eq!(value["changes"][0]["time"], "1970-01-02T00:00:00Z");
    }
}
