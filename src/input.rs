use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::Result;
use swapdoodle::session::ByteSource;

/// Reads a letter from a file, or from stdin when the path is "-".
pub struct InputReader {
    reader: Box<dyn Read>,
    path: PathBuf,
}

impl InputReader {
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let path = input_path.as_ref().to_path_buf();

        let reader: Box<dyn Read> = if is_pipe(&path) {
            Box::new(io::stdin().lock())
        } else {
            Box::new(BufReader::new(File::open(&path)?))
        };

        Ok(Self { reader, path })
    }

    pub fn is_pipe(&self) -> bool {
        is_pipe(&self.path)
    }

    /// File stem used to name derived outputs; "stdin" for pipe input.
    pub fn stem(&self) -> String {
        if self.is_pipe() {
            return "stdin".to_owned();
        }
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "letter".to_owned())
    }
}

impl ByteSource for InputReader {
    fn read_all(mut self) -> io::Result<Vec<u8>> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;
        Ok(data)
    }
}

fn is_pipe(path: &Path) -> bool {
    path.as_os_str() == "-"
}
