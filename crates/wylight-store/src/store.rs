//! Main store implementation.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use wylight_types::Endpoint;

use crate::error::{Error, Result};
use crate::models::EndpointRecord;

/// Recently used controllers, backed by an append-only CSV file.
///
/// Every line holds `address,name,score,last_seen`. An address may appear
/// more than once; its last record wins, while its position in the store is
/// the one of its first record. Lines that cannot be read are skipped.
#[derive(Debug)]
pub struct RecentStore {
    path: PathBuf,
    entries: Vec<Endpoint>,
    positions: HashMap<SocketAddr, usize>,
    skipped: usize,
}

impl RecentStore {
    /// Open the recent file at `path`.
    ///
    /// A missing file is an empty store; it is created on the first
    /// [`remember`](Self::remember).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut store = Self {
            path: path.as_ref().to_path_buf(),
            entries: Vec::new(),
            positions: HashMap::new(),
            skipped: 0,
        };
        store.reload()?;
        Ok(store)
    }

    /// Open the default recent file location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_recent_path())
    }

    /// Re-read the file, dropping the in-memory state.
    pub fn reload(&mut self) -> Result<()> {
        self.entries.clear();
        self.positions.clear();
        self.skipped = 0;

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No recent file at {}", self.path.display());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let mut reader = reader_builder().from_reader(file);
        let mut raw = csv::StringRecord::new();
        loop {
            match reader.read_record(&mut raw) {
                Ok(false) => break,
                Ok(true) => {}
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    let line = e.position().map_or(0, |p| p.line());
                    self.skip(Error::corrupt(line, e.to_string()));
                    continue;
                }
            }

            let line = raw.position().map_or(0, |p| p.line());
            match raw.deserialize::<EndpointRecord>(None) {
                Ok(record) => self.apply(record.into()),
                Err(e) => self.skip(Error::corrupt(line, e.to_string())),
            }
        }

        info!(
            "Loaded {} recent endpoint(s) from {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }

    fn skip(&mut self, error: Error) {
        warn!("{}: {}", self.path.display(), error);
        self.skipped += 1;
    }

    /// Insert or supersede, keeping the first-seen position.
    fn apply(&mut self, endpoint: Endpoint) {
        if let Some(&index) = self.positions.get(&endpoint.address) {
            self.entries[index] = endpoint;
        } else {
            self.positions.insert(endpoint.address, self.entries.len());
            self.entries.push(endpoint);
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of distinct endpoints.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no endpoint.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lines skipped by the last read.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// A copy of the endpoint at `index`, or `None` past the end.
    pub fn get_endpoint(&self, index: usize) -> Option<Endpoint> {
        self.entries.get(index).cloned()
    }

    /// Endpoint with the given address.
    pub fn find(&self, address: &SocketAddr) -> Option<&Endpoint> {
        self.positions.get(address).map(|&i| &self.entries[i])
    }

    /// Iterate endpoints in store order.
    ///
    /// Every call starts again from the first endpoint.
    pub fn iter(&self) -> std::slice::Iter<'_, Endpoint> {
        self.entries.iter()
    }

    /// Record that `endpoint` was used.
    ///
    /// The record is appended to the file; an endpoint already stored keeps
    /// its position and, if the new name is empty, its old name.
    pub fn remember(&mut self, endpoint: &Endpoint) -> Result<()> {
        let mut merged = match self.find(&endpoint.address) {
            Some(existing) => {
                let mut merged = existing.clone();
                merged.merge(endpoint);
                merged
            }
            None => endpoint.clone(),
        };
        merged.score = endpoint.score;
        merged.online = false;

        self.append(&EndpointRecord::from(&merged))?;
        debug!("Remembered {}", merged);
        self.apply(merged);
        Ok(())
    }

    fn append(&self, record: &EndpointRecord) -> Result<()> {
        self.ensure_parent()?;
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;
        if !ends_with_newline(&mut file)? {
            file.write_all(b"\n")?;
        }

        let mut writer = writer_builder().from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    /// Rewrite the file with one record per endpoint, dropping superseded
    /// and corrupt lines.
    pub fn compact(&mut self) -> Result<()> {
        self.ensure_parent()?;
        let tmp = self.path.with_extension("tmp");
        {
            let mut writer = writer_builder().from_path(&tmp)?;
            for endpoint in &self.entries {
                writer.serialize(EndpointRecord::from(endpoint))?;
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        self.skipped = 0;
        info!(
            "Compacted {} to {} endpoint(s)",
            self.path.display(),
            self.entries.len()
        );
        Ok(())
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a RecentStore {
    type Item = &'a Endpoint;
    type IntoIter = std::slice::Iter<'a, Endpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'));
    builder
}

fn writer_builder() -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder.has_headers(false);
    builder
}

/// Whether `file` is empty or its last byte is a newline.
fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
