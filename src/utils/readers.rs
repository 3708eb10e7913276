use super::Result;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, Read as ioRead};
use std::path::Path;

/// Opens a plain or gzip-compressed text file, deciding by extension.
pub fn open_text_reader(path: &Path) -> Result<BufReader<Box<dyn ioRead>>> {
    fn is_gzipped(path: &Path) -> bool {
        let path_str = path.to_string_lossy().to_lowercase();
        path_str.ends_with(".gz") || path_str.ends_with(".gzip")
    }
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    if is_gzipped(path) {
        Ok(BufReader::new(Box::new(MultiGzDecoder::new(file))))
    } else {
        Ok(BufReader::new(Box::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::{BufRead, Write};

    #[test]
    fn reads_plain_and_gzipped_files() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("map.tsv");
        std::fs::write(&plain, "a\tb\n").unwrap();

        let gz = dir.path().join("map.tsv.gz");
        let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(b"a\tb\n").unwrap();
        encoder.finish().unwrap();

        for path in [plain, gz] {
            let lines: Vec<String> = open_text_reader(&path)
                .unwrap()
                .lines()
                .map(|l| l.unwrap())
                .collect();
            assert_eq!(lines, vec!["a\tb".to_string()]);
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(open_text_reader(Path::new("/nonexistent/file.gz")).is_err());
    }
}
