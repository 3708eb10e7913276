use crate::utils::Result;
use flate2::{write::GzEncoder, Compression};
use rust_htslib::bam;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Gzipped FASTQ of the reads committed to one cluster.
pub struct FastqWriter {
    path: PathBuf,
    encoder: GzEncoder<BufWriter<File>>,
}

impl FastqWriter {
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        Ok(Self {
            path: path.to_path_buf(),
            encoder: GzEncoder::new(BufWriter::new(file), Compression::default()),
        })
    }

    /// Writes `rec` as `@<qname>.<index> length=<len>`; `index` disambiguates mates.
    pub fn write(&mut self, rec: &bam::Record, index: usize) -> Result<()> {
        let name = String::from_utf8_lossy(rec.qname());
        let seq = rec.seq().as_bytes();
        let quals = encode_qualities(rec.qual());
        let len = seq.len();
        let mut write = || -> std::io::Result<()> {
            writeln!(self.encoder, "@{}.{} length={}", name, index, len)?;
            self.encoder.write_all(&seq)?;
            writeln!(self.encoder)?;
            writeln!(self.encoder, "+{}.{} length={}", name, index, len)?;
            self.encoder.write_all(&quals)?;
            writeln!(self.encoder)
        };
        write().map_err(|e| format!("{}: {}", self.path.display(), e))
    }

    pub fn finish(self) -> Result<()> {
        let path = self.path;
        self.encoder
            .finish()
            .and_then(|mut w| w.flush())
            .map_err(|e| format!("{}: {}", path.display(), e))
    }
}

/// Phred scores to Sanger (Phred+33) ASCII. Missing qualities (0xff) become `!`.
pub fn encode_qualities(quals: &[u8]) -> Vec<u8> {
    const MAX_PHRED: u8 = 93;
    quals
        .iter()
        .map(|&q| if q == 0xff { b'!' } else { q.min(MAX_PHRED) + 33 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::open_text_reader;
    use std::io::BufRead;

    #[test]
    fn test_encode_qualities() {
        assert_eq!(encode_qualities(&[0, 10, 40, 0xff]), b"!+I!".to_vec());
    }

    #[test]
    fn writes_fastq_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("57955.fastq.gz");
        let mut rec = bam::Record::new();
        rec.set(b"SRR1.1", None, b"ACGT", &[30, 30, 20, 10]);

        let mut writer = FastqWriter::new(&path).unwrap();
        writer.write(&rec, 3).unwrap();
        writer.finish().unwrap();

        let lines: Vec<String> = open_text_reader(&path)
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(
            lines,
            vec!["@SRR1.1.3 length=4", "ACGT", "+SRR1.1.3 length=4", "??5+"]
        );
    }
}
