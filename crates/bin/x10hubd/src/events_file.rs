//! Events log file — one line per recorded device event.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use x10hub_app::ports::{EventLog, EventLogError};
use x10hub_domain::event::EventRecord;

/// [`EventLog`] appending to a file that is opened on first use.
#[derive(Debug, Default)]
pub struct FileEventLog {
    path: Option<PathBuf>,
    file: Option<File>,
}

impl FileEventLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventLog for FileEventLog {
    fn redirect(&mut self, path: Option<&Path>) {
        self.path = path.map(Path::to_path_buf);
        self.file = None;
    }

    fn append(&mut self, record: &EventRecord) -> Result<(), EventLogError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| EventLogError::Open {
                    path: path.display().to_string(),
                    source,
                })?;
            self.file = Some(file);
        }
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        writeln!(file, "{record}")?;
        file.flush()?;
        Ok(())
    }
}
