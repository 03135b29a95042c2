//! Training input: the `DocumentSource` capability and the line-oriented
//! hex record format the command line tool reads.

use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::File;
use std::io::BufRead;
use std::path::Path;
use tracing::info;

use crate::error::InputError;

/// Yields training documents by index. Implementations must be `Sync`
/// because the statistics pass reads documents from several threads.
pub trait DocumentSource: Sync {
    fn len(&self) -> usize;

    fn document(&self, index: usize) -> Cow<'_, [u8]>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: AsRef<[u8]> + Sync> DocumentSource for [T] {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn document(&self, index: usize) -> Cow<'_, [u8]> {
        Cow::Borrowed(self[index].as_ref())
    }
}

impl<T: AsRef<[u8]> + Sync> DocumentSource for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn document(&self, index: usize) -> Cow<'_, [u8]> {
        Cow::Borrowed(self[index].as_ref())
    }
}

/// Extracts the payload of one record line: the line is split on spaces into
/// at most five fields and the last field is hex-decoded, e.g.
/// `2016/05/04 22:25:13 [info] 15333#15333: 7b226c...`.
pub fn parse_record_line(line: &[u8]) -> Result<Vec<u8>, hex::FromHexError> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let payload = line.splitn(5, |&b| b == b' ').last().unwrap_or(line);
    hex::decode(payload)
}

/// Documents read from hex record lines. Blank lines become empty documents.
#[derive(Debug, Default, Clone)]
pub struct RecordCorpus {
    docs: Vec<Vec<u8>>,
}

impl RecordCorpus {
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, InputError> {
        let mut docs = Vec::new();
        for (i, line) in reader.split(b'\n').enumerate() {
            let line = line?;
            docs.push(decode_line(i + 1, &line)?);
        }
        Ok(Self { docs })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, InputError> {
        let file = File::open(path.as_ref())?;
        if file.metadata()?.len() == 0 {
            return Ok(Self::default());
        }
        let mmap = unsafe { Mmap::map(&file)? };
        let body = mmap.strip_suffix(b"\n").unwrap_or(&mmap[..]);

        let mut docs = Vec::new();
        for (i, line) in body.split(|&b| b == b'\n').enumerate() {
            docs.push(decode_line(i + 1, line)?);
        }
        info!("Read {} records from {}", docs.len(), path.as_ref().display());
        Ok(Self { docs })
    }

    pub fn into_documents(self) -> Vec<Vec<u8>> {
        self.docs
    }

    pub fn total_bytes(&self) -> usize {
        self.docs.iter().map(|d| d.len()).sum()
    }
}

fn decode_line(line_no: usize, line: &[u8]) -> Result<Vec<u8>, InputError> {
    parse_record_line(line).map_err(|e| InputError::MalformedRecord {
        line: line_no,
        reason: e.to_string(),
    })
}

impl DocumentSource for RecordCorpus {
    fn len(&self) -> usize {
        self.docs.len()
    }

    fn document(&self, index: usize) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.docs[index])
    }
}
