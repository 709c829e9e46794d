use serde::Serialize;

use super::{Formatter, iso8601_timestamp};
use crate::processing::ChainOutput;

pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonRecord<'a> {
    ts: String,
    #[serde(flatten)]
    output: &'a ChainOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    r: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phi_deg: Option<f32>,
}

impl Formatter for JsonFormatter {
    fn format(&self, output: &ChainOutput) -> String {
        let record = JsonRecord {
            ts: iso8601_timestamp(),
            output,
            r: output.lock_in.map(|l| l.magnitude()),
            phi_deg: output.lock_in.map(|l| l.phase_deg()),
        };
        serde_json::to_string(&record).unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal_processing::LockInOutput;

    #[test]
    fn test_json_record() {
        let output = ChainOutput {
            index: 1,
            input: 2.0,
            output: 1.5,
            lock_in: Some(LockInOutput {
                in_phase: 3.0,
                quadrature: 4.0,
            }),
        };
        let value: serde_json::Value = serde_json::from_str(&JsonFormatter.format(&output)).unwrap();
        assert_eq!(value["index"], 1);
        assert_eq!(value["output"], 1.5);
        assert_eq!(value["lock_in"]["quadrature"], 4.0);
        assert_eq!(value["r"], 5.0);
        assert!(value["ts"].as_str().unwrap().ends_with('Z'));
    }
}
