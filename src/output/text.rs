use super::Formatter;
use crate::processing::ChainOutput;

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, output: &ChainOutput) -> String {
        let mut line = format!("#{:<8} out: {:>12.6}", output.index, output.output);
        if self.verbose {
            line.push_str(&format!(" (in: {:>12.6})", output.input));
        }
        if let Some(lock_in) = output.lock_in {
            line.push_str(&format!(
                " R: {:>10.6} phi: {:>7.2}°",
                lock_in.magnitude(),
                lock_in.phase_deg()
            ));
            if self.verbose {
                line.push_str(&format!(
                    " [X: {:.6}, Y: {:.6}]",
                    lock_in.in_phase, lock_in.quadrature
                ));
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal_processing::LockInOutput;

    #[test]
    fn test_text_format() {
        let output = ChainOutput {
            index: 3,
            input: 1.0,
            output: 0.5,
            lock_in: None,
        };
        assert_eq!(TextFormatter::new(false).format(&output), "#3        out:     0.500000");
        assert!(TextFormatter::new(true).format(&output).ends_with("(in:     1.000000)"));

        let with_lock_in = ChainOutput {
            lock_in: Some(LockInOutput {
                in_phase: 0.0,
                quadrature: 2.0,
            }),
            ..output
        };
        let line = TextFormatter::new(false).format(&with_lock_in);
        assert!(line.contains("R:   2.000000 phi:   90.00°"), "{}", line);
    }
}
