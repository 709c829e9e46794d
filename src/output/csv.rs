use super::{Formatter, iso8601_timestamp};
use crate::processing::ChainOutput;

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, output: &ChainOutput) -> String {
        let lock_in = output.lock_in.map_or(",,,".to_string(), |l| {
            format!(
                "{:.6},{:.6},{:.6},{:.3}",
                l.in_phase,
                l.quadrature,
                l.magnitude(),
                l.phase_deg()
            )
        });
        format!(
            "{},{},{:.6},{:.6},{}",
            iso8601_timestamp(),
            output.index,
            output.input,
            output.output,
            lock_in
        )
    }

    fn header(&self) -> Option<&'static str> {
        Some("ts,index,input,output,x,y,r,phi_deg")
    }
}
