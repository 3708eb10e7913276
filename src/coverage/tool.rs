use super::{bedcov::accumulate_overlaps, pangene::PangeneCoverage};
use crate::utils::Result;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

/// External interval-coverage program, invoked as `<program> [args..] -abam <bam> -b <bed>`.
#[derive(Debug, Clone)]
pub struct CoverageTool {
    program: PathBuf,
    args: Vec<String>,
}

impl CoverageTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Splits e.g. `"bedtools coverage"` into the program and its leading arguments.
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| "Coverage tool command is empty".to_string())?;
        Ok(Self {
            program: PathBuf::from(program),
            args: parts.map(str::to_string).collect(),
        })
    }

    /// Runs the tool over one reassigned BAM and folds its output into a fresh coverage map.
    ///
    /// Output is consumed line by line while the tool runs.
    pub fn batch_coverage(
        &self,
        bam: &Path,
        bed: &Path,
        read_length: f64,
    ) -> Result<PangeneCoverage> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("-abam")
            .arg(bam)
            .arg("-b")
            .arg(bed)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("Failed to run {}: {}", self.program.display(), e))?;

        let stderr_reader = child.stderr.take().map(|mut err| {
            thread::spawn(move || {
                let mut message = String::new();
                let _ = err.read_to_string(&mut message);
                message
            })
        });
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| format!("No output from {}", self.program.display()))?;
        let mut coverage = PangeneCoverage::default();
        let folded = accumulate_overlaps(BufReader::new(stdout), read_length, &mut coverage);

        if folded.is_err() {
            let _ = child.kill();
        }
        let status = child
            .wait()
            .map_err(|e| format!("{}: {}", self.program.display(), e))?;

        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        let num_records = folded?;
        if !status.success() {
            return Err(format!(
                "{} exited with {} on {}: {}",
                self.program.display(),
                status,
                bam.display(),
                stderr.trim()
            ));
        }
        log::trace!("{}: {} overlap records", bam.display(), num_records);
        Ok(coverage)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn fake_tool(script: &str) -> CoverageTool {
        CoverageTool {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    #[test]
    fn splits_command_line() {
        let tool = CoverageTool::from_command_line("bedtools coverage").unwrap();
        assert_eq!(tool.program, PathBuf::from("bedtools"));
        assert_eq!(tool.args, vec!["coverage".to_string()]);
        assert!(CoverageTool::from_command_line("  ").is_err());
    }

    #[test]
    fn folds_tool_output() {
        let tool = fake_tool("printf 'scaf\\t0\\t100\\tg1\\tpan1\\t4\\t100\\t100\\t1.0\\n'");
        let coverage = tool
            .batch_coverage(Path::new("x.bam"), Path::new("x.bed"), 50.0)
            .unwrap();
        assert_eq!(coverage.get("pan1"), Some(2.0));
    }

    #[test]
    fn malformed_output_fails_batch() {
        let tool = fake_tool("printf 'scaf\\t0\\t100\\tg1\\tpan1\\t4\\t100\\t0\\t1.0\\n'");
        assert!(tool
            .batch_coverage(Path::new("x.bam"), Path::new("x.bed"), 50.0)
            .is_err());
    }

    #[test]
    fn failing_tool_is_an_error() {
        let tool = fake_tool("echo 'no such file' >&2; exit 1");
        let err = tool
            .batch_coverage(Path::new("x.bam"), Path::new("x.bed"), 50.0)
            .unwrap_err();
        assert!(err.contains("no such file"), "{}", err);
    }
}
