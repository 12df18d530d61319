//! Durable session storage.
//!
//! Sessions live as `<name>.json` files in a single directory, one file per
//! session. Each file holds a versioned envelope around the transcript's
//! messages. Writes go through a temp file and rename so a crash mid-write
//! cannot truncate an existing session.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::error::{Error, Result};
use crate::transcript::Transcript;
use crate::types::Message;

/// Version written to new session files and the only one accepted on load.
const SESSION_FORMAT_VERSION: u8 = 1;

/// On-disk session format: a versioned envelope around the message list.
#[derive(Serialize, Deserialize)]
struct SessionFile {
    version: u8,
    messages: Vec<Message>,
}

impl SessionFile {
    fn new(messages: &[Message]) -> Self {
        Self {
            version: SESSION_FORMAT_VERSION,
            messages: messages.to_vec(),
        }
    }
}

/// A directory-backed mapping from session name to transcript.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Creates a store rooted at `dir`. The directory is created lazily on
    /// the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the backing directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persists `transcript` under `name`, overwriting any existing session
    /// of that name. Returns the path written.
    pub fn save(&self, name: &str, transcript: &Transcript) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|err| {
            Error::io(
                format!("failed to create sessions directory {:?}", self.dir),
                err,
            )
        })?;

        let path = self.session_path(name);
        let tmp = self.dir.join(format!(".{name}.json.tmp"));

        let file = File::create(&tmp)
            .map_err(|err| Error::io(format!("failed to create session file {tmp:?}"), err))?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, &SessionFile::new(transcript.messages())).map_err(|err| {
            Error::serialization("failed to serialize session", Some(Box::new(err)))
        })?;
        writer
            .flush()
            .map_err(|err| Error::io(format!("failed to flush session file {tmp:?}"), err))?;

        fs::rename(&tmp, &path)
            .map_err(|err| Error::io(format!("failed to move session into place at {path:?}"), err))?;
        Ok(path)
    }

    /// Lists saved session names, sorted for a stable menu.
    ///
    /// A missing directory is an empty store, not an error.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(Error::io(
                    format!("failed to read sessions directory {:?}", self.dir),
                    err,
                ));
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| {
                Error::io(
                    format!("failed to read sessions directory {:?}", self.dir),
                    err,
                )
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json")
                && let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Loads the transcript saved under `name`.
    ///
    /// Missing or corrupt files are reported as errors without touching any
    /// in-memory state; the caller decides what survives.
    pub fn load(&self, name: &str) -> Result<Transcript> {
        let path = self.session_path(name);
        let file = File::open(&path)
            .map_err(|err| Error::io(format!("failed to open session {name:?}"), err))?;
        let reader = BufReader::new(file);
        let envelope: SessionFile = from_reader(reader).map_err(|err| {
            Error::serialization(
                format!("session {name:?} is corrupt or not in the expected format"),
                Some(Box::new(err)),
            )
        })?;
        if envelope.version != SESSION_FORMAT_VERSION {
            return Err(Error::serialization(
                format!(
                    "session {name:?} has unsupported format version {} (expected {SESSION_FORMAT_VERSION})",
                    envelope.version
                ),
                None,
            ));
        }
        Ok(Transcript::from_messages(envelope.messages))
    }

    /// Strips everything outside `[alnum _ -]` from a requested name.
    pub fn sanitize_name(input: &str) -> String {
        input
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-'))
            .collect()
    }

    /// Synthesizes a sortable timestamped name for unnamed sessions.
    pub fn default_name() -> String {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let stamp = format_description!("[year][month][day]_[hour][minute][second]");
        match now.format(&stamp) {
            Ok(stamp) => format!("default_{stamp}"),
            Err(_) => "default".to_string(),
        }
    }

    fn session_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}
