// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::Error;
use crate::ErrorKind;
use crate::render::RenderOptions;
use crate::transport::Entry;
use crate::transport::Rendering;
use crate::transport::Transport;

/// A builder to configure and create a [`File`] transport.
#[derive(Debug)]
#[must_use = "call `build` to create the transport"]
pub struct FileBuilder {
    filepath: PathBuf,
    name: String,
    level: Option<String>,
    options: RenderOptions,
    compact: Option<bool>,
    eol: String,
}

impl FileBuilder {
    /// Create a new builder for a transport named `file` writing to `filepath`.
    ///
    /// Entries are rendered as JSON lines unless configured otherwise.
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
            name: "file".to_string(),
            level: None,
            options: RenderOptions {
                json: true,
                ..RenderOptions::default()
            },
            compact: Some(true),
            eol: "\n".to_string(),
        }
    }

    super::render_option_setters!();

    /// Set the line terminator.
    ///
    /// Default to `\n`.
    pub fn eol(mut self, eol: impl Into<String>) -> Self {
        self.eol = eol.into();
        self
    }

    /// Build the [`File`] transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the log directory or the log file cannot be created.
    pub fn build(self) -> Result<File, Error> {
        let FileBuilder {
            filepath,
            name,
            level,
            options,
            compact,
            eol,
        } = self;

        if let Some(dir) = filepath.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|err| {
                Error::new(ErrorKind::Io, "failed to create log directory")
                    .with_context("path", dir.display())
                    .with_source(err)
            })?;
        }
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&filepath)
            .map_err(|err| {
                Error::new(ErrorKind::Io, "failed to create log file")
                    .with_context("path", filepath.display())
                    .with_source(err)
            })?;

        Ok(File {
            name,
            level,
            rendering: Rendering::new(options, compact),
            eol,
            filepath,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

/// A transport that appends rendered entries to a file.
///
/// Writes are buffered; call [`Logger::flush`] to make sure they reach the file.
///
/// [`Logger::flush`]: crate::Logger::flush
#[derive(Debug)]
pub struct File {
    name: String,
    level: Option<String>,
    rendering: Rendering,
    eol: String,
    filepath: PathBuf,
    writer: Mutex<BufWriter<fs::File>>,
}

impl File {
    /// Create a [`FileBuilder`].
    pub fn builder(filepath: impl Into<PathBuf>) -> FileBuilder {
        FileBuilder::new(filepath)
    }

    /// The path of the log file.
    pub fn path(&self) -> &Path {
        &self.filepath
    }
}

impl Transport for File {
    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    fn log(&self, entry: &Entry<'_>) -> Result<(), Error> {
        let mut line = self.rendering.render(entry);
        line.push_str(&self.eol);

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer
            .write_all(line.as_bytes())
            .map_err(Error::from_io_error)
    }

    fn flush(&self) -> Result<(), Error> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.flush().map_err(Error::from_io_error)
    }

    fn configure(&self, f: &mut dyn FnMut(&mut RenderOptions)) -> bool {
        self.rendering.configure(f);
        true
    }
}

impl Drop for File {
    fn drop(&mut self) {
        let writer = self.writer.get_mut().unwrap_or_else(PoisonError::into_inner);
        let _ = writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use rand::Rng;
    use rand::distr::Alphanumeric;
    use tempfile::TempDir;

    use super::*;
    use crate::meta::Meta;

    #[test]
    fn test_file_appends_lines() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let path = temp_dir.path().join("nested").join("app.log");

        let file = File::builder(&path).json(false).build().unwrap();
        assert_eq!(file.path(), path.as_path());

        let meta = Meta::object();
        let mut expected = String::new();
        for _ in 0..10 {
            let message = rand::rng()
                .sample_iter(&Alphanumeric)
                .take(16)
                .map(char::from)
                .collect::<String>();
            let entry = Entry {
                level: "info",
                id: None,
                message: &message,
                meta: &meta,
            };
            file.log(&entry).unwrap();
            expected.push_str(&format!("info:  {message}\n"));
        }
        file.flush().unwrap();

        let mut contents = String::new();
        fs::File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, expected);
    }

    #[test]
    fn test_file_json_by_default() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let path = temp_dir.path().join("app.log");

        let file = File::builder(&path).build().unwrap();
        let meta = Meta::from(serde_json::json!({"port": 8080}));
        let entry = Entry {
            level: "warn",
            id: Some("http"),
            message: "slow",
            meta: &meta,
        };
        file.log(&entry).unwrap();
        drop(file);

        let contents = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(contents.trim_end()).unwrap();
        assert_eq!(value["level"], "warn");
        assert_eq!(value["id"], "http");
        assert_eq!(value["message"], "slow");
        assert_eq!(value["port"], 8080);
    }
}
