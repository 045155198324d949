//! Loading a Letter and exporting pieces of it.
//!
//! A [`LetterSession`] owns at most one loaded Letter. Loading reads the whole
//! source, decodes it and post-processes it; on success the document, its
//! rendered form and the original bytes are kept for display and export.
//!
//! ```text
//! Empty ──load──▶ Loading ──▶ Ready
//!                    │
//!                    └──────▶ Failed
//! ```
//!
//! Every load goes back through `Loading` and discards the previous Letter
//! first. Exports never change the state.

use std::fmt::{Display, Formatter};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use log::{Level, debug, error};

use crate::codec::{decompress_if_compressed, parse_letter};
use crate::notify::{LogSink, Notification, NotificationSink};
use crate::render::PostProcessor;
use crate::structs::document::LetterDocument;
use crate::structs::rendered::RenderedLetter;
use crate::utils::errors::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Loading,
    Ready,
    Failed,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SessionState::Empty => "empty",
            SessionState::Loading => "loading",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
}

/// Anything a Letter can be read from in one go.
pub trait ByteSource {
    fn read_all(self) -> io::Result<Vec<u8>>;
}

impl ByteSource for &Path {
    fn read_all(self) -> io::Result<Vec<u8>> {
        fs::read(self)
    }
}

impl ByteSource for PathBuf {
    fn read_all(self) -> io::Result<Vec<u8>> {
        fs::read(self)
    }
}

impl ByteSource for &PathBuf {
    fn read_all(self) -> io::Result<Vec<u8>> {
        fs::read(self)
    }
}

impl ByteSource for &[u8] {
    fn read_all(self) -> io::Result<Vec<u8>> {
        Ok(self.to_vec())
    }
}

impl ByteSource for Vec<u8> {
    fn read_all(self) -> io::Result<Vec<u8>> {
        Ok(self)
    }
}

/// Reads an arbitrary [`Read`] to its end, e.g. stdin.
pub struct ReadSource<R>(pub R);

impl<R: Read> ByteSource for ReadSource<R> {
    fn read_all(mut self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.0.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

/// A named artifact ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl Export {
    /// Writes the artifact as `dir/file_name` and returns the path.
    ///
    /// File names that are not a single path component are rejected.
    pub fn write_into(&self, dir: impl AsRef<Path>) -> io::Result<PathBuf> {
        let name = Path::new(&self.file_name);
        if name.file_name() != Some(name.as_os_str()) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Refusing to export to {:?}", self.file_name),
            ));
        }

        let path = dir.as_ref().join(name);
        let mut file = File::create(&path)?;
        file.write_all(&self.data)?;
        file.flush()?;
        debug!("Wrote {} bytes to {}", self.data.len(), path.display());
        Ok(path)
    }
}

struct Loaded {
    raw: Vec<u8>,
    document: LetterDocument,
    rendered: RenderedLetter,
}

pub struct LetterSession<N: NotificationSink = LogSink> {
    state: SessionState,
    loaded: Option<Loaded>,
    processor: PostProcessor,
    sink: N,
    subscribers: Vec<Sender<SessionEvent>>,
}

impl Default for LetterSession<LogSink> {
    fn default() -> Self {
        Self::new(LogSink)
    }
}

impl<N: NotificationSink> LetterSession<N> {
    pub fn new(sink: N) -> Self {
        Self {
            state: SessionState::Empty,
            loaded: None,
            processor: PostProcessor::default(),
            sink,
            subscribers: Vec::new(),
        }
    }

    /// Rendering diagnostics at or above `level` fail the load.
    pub fn set_fail_level(&mut self, level: Level) {
        self.processor.set_fail_level(level);
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.set_fail_level(if strict { Level::Warn } else { Level::Error });
    }

    /// Receives every state change from now on.
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn load_from(&mut self, source: impl ByteSource) -> Result<(), SessionError> {
        self.loaded = None;
        self.transition(SessionState::Loading);

        match self.try_load(source) {
            Ok(loaded) => {
                let summary = format!(
                    "{} thumbnail(s), {} sheet(s){}",
                    loaded.rendered.thumbnails.len(),
                    loaded.rendered.sheets.len(),
                    match &loaded.rendered.stationery {
                        Some(s) => format!(", stationery \"{}\"", s.name),
                        None => String::new(),
                    }
                );
                debug!("Loaded letter: {summary}");
                self.loaded = Some(loaded);
                self.transition(SessionState::Ready);
                self.sink.push(Notification::info("Letter loaded", summary));
                Ok(())
            }
            Err(e) => {
                error!("Failed to load letter: {e}");
                self.transition(SessionState::Failed);
                self.sink.push(failure_notification(&e));
                Err(e)
            }
        }
    }

    fn try_load(&self, source: impl ByteSource) -> Result<Loaded, SessionError> {
        let raw = source.read_all()?;
        debug!("Read {} bytes", raw.len());
        let document = parse_letter(&raw)?;
        let rendered = self.processor.process(&document)?;
        Ok(Loaded {
            raw,
            document,
            rendered,
        })
    }

    /// The loaded Letter as one uncompressed package.
    pub fn export_decompressed(&self, file_name: impl Into<String>) -> Result<Export, SessionError> {
        let loaded = self.ready()?;
        let data = decompress_if_compressed(&loaded.raw)?.into_owned();
        Ok(Export {
            file_name: file_name.into(),
            data,
        })
    }

    /// The bytes of occurrence `index` of block `name`, as `{name}{index}.bin`.
    pub fn export_block(&self, name: &str, index: usize) -> Result<Export, SessionError> {
        let loaded = self.ready()?;
        let data = loaded
            .document
            .blocks()
            .get(name, index)
            .ok_or_else(|| SessionError::NotFound {
                block: name.to_owned(),
                index,
            })?;
        Ok(Export {
            file_name: format!("{name}{index}.bin"),
            data: data.to_vec(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn document(&self) -> Option<&LetterDocument> {
        self.loaded.as_ref().map(|l| &l.document)
    }

    pub fn rendered(&self) -> Option<&RenderedLetter> {
        self.loaded.as_ref().map(|l| &l.rendered)
    }

    pub fn raw_bytes(&self) -> Option<&[u8]> {
        self.loaded.as_ref().map(|l| l.raw.as_slice())
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut N {
        &mut self.sink
    }

    fn ready(&self) -> Result<&Loaded, SessionError> {
        match (&self.loaded, self.state) {
            (Some(loaded), SessionState::Ready) => Ok(loaded),
            _ => Err(SessionError::NotReady(self.state)),
        }
    }

    fn transition(&mut self, to: SessionState) {
        let from = std::mem::replace(&mut self.state, to);
        debug!("Session {from} -> {to}");
        let event = SessionEvent::StateChanged { from, to };
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

fn failure_notification(error: &SessionError) -> Notification {
    match error {
        SessionError::Io(_) => {
            Notification::error("Could not read file", "The file could not be read.")
        }
        SessionError::Render(_) => Notification::error(
            "Could not display letter",
            "This Letter could not be prepared for display.",
        ),
        _ => Notification::error("Invalid file", "This file does not seem to be a valid Letter."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::lzss;
    use crate::fixtures;
    use crate::notify::{Severity, ToastBoard};
    use crate::utils::errors::FormatError;

    fn session() -> LetterSession<ToastBoard> {
        LetterSession::new(ToastBoard::new())
    }

    #[test]
    fn new_session_is_empty() {
        let session = session();
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.document().is_none());
        assert!(matches!(
            session.export_decompressed("letter.bpk"),
            Err(SessionError::NotReady(SessionState::Empty))
        ));
    }

    #[test]
    fn zeroed_magic_fails_without_partial_state() {
        let mut bytes = fixtures::letter_bytes(1, None, 1);
        bytes[..4].fill(0);

        let mut session = session();
        let err = session.load_from(bytes).unwrap_err();

        assert!(matches!(err, SessionError::Format(_)));
        assert_eq!(session.state(), SessionState::Failed);
        assert!(session.document().is_none());
        assert!(session.rendered().is_none());
        assert!(session.raw_bytes().is_none());

        let toasts = session.sink_mut().active();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].1.severity, Severity::Error);
        assert_eq!(toasts[0].1.message, "This file does not seem to be a valid Letter.");
    }

    #[test]
    fn stationery_letter_becomes_ready() {
        let bytes = fixtures::letter_bytes(1, Some(fixtures::stationery(8)), 2);
        let mut session = session();
        let events = session.subscribe();

        session.load_from(bytes.as_slice()).unwrap();

        assert_eq!(session.state(), SessionState::Ready);
        let rendered = session.rendered().unwrap();
        assert_eq!(rendered.thumbnails.len(), 1);
        assert_eq!(rendered.sheets.len(), 2);
        let stationery = rendered.stationery.as_ref().unwrap();
        assert_eq!(stationery.name, fixtures::STATIONERY_NAME);
        assert_eq!(stationery.mask.decode().unwrap().get_pixel(5, 5).0, [0, 0, 0, 136]);
        assert_eq!(session.raw_bytes(), Some(bytes.as_slice()));

        let seen: Vec<_> = events.try_iter().collect();
        assert_eq!(
            seen,
            [
                SessionEvent::StateChanged {
                    from: SessionState::Empty,
                    to: SessionState::Loading
                },
                SessionEvent::StateChanged {
                    from: SessionState::Loading,
                    to: SessionState::Ready
                },
            ]
        );
        let toasts = session.sink_mut().active();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].1.severity, Severity::Info);
        assert_eq!(toasts[0].1.title, "Letter loaded");

        let sender = session.document().unwrap().sender_mii().unwrap();
        assert_eq!(sender.mii_name, fixtures::MII_NAME);
    }

    #[test]
    fn export_block_reads_stored_bytes() {
        let bytes = fixtures::letter_bytes(2, Some(fixtures::stationery(3)), 0);
        let mut session = session();
        session.load_from(bytes).unwrap();

        let export = session.export_block("THUMB2", 1).unwrap();
        assert_eq!(export.file_name, "THUMB21.bin");
        assert_eq!(export.data, fixtures::thumbnail(1));

        let export = session.export_block("STATIN1", 0).unwrap();
        assert_eq!(export.data, fixtures::stationery(3));

        assert!(matches!(
            session.export_block("THUMB2", 2),
            Err(SessionError::NotFound { ref block, index: 2 }) if block == "THUMB2"
        ));
        assert!(matches!(
            session.export_block("BOGUS", 0),
            Err(SessionError::NotFound { .. })
        ));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn export_decompressed_is_passthrough_and_idempotent() {
        let plain = fixtures::letter_bytes(1, None, 1);
        let mut session = session();
        session.load_from(plain.clone()).unwrap();
        assert_eq!(session.export_decompressed("a.bpk").unwrap().data, plain);

        let packed = lzss::compress(&plain).unwrap();
        session.load_from(packed).unwrap();
        let first = session.export_decompressed("a.bpk").unwrap();
        assert_eq!(first.data, plain);

        let mut again = LetterSession::new(ToastBoard::new());
        again.load_from(first.data.clone()).unwrap();
        assert_eq!(again.export_decompressed("a.bpk").unwrap(), first);
    }

    #[test]
    fn reload_after_failure_discards_and_recovers() {
        let mut session = session();
        session.load_from(fixtures::letter_bytes(1, None, 0)).unwrap();
        assert!(session.load_from(&b"garbage!"[..]).is_err());
        assert!(session.document().is_none());
        assert!(matches!(
            session.export_block("THUMB2", 0),
            Err(SessionError::NotReady(SessionState::Failed))
        ));

        session.load_from(fixtures::letter_bytes(1, None, 0)).unwrap();
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn bad_mask_is_a_render_failure() {
        let stationery = fixtures::stationery_with_mask(vec![0x11; 100]);
        let bytes = fixtures::letter_bytes(0, Some(stationery), 0);
        let mut session = session();
        let err = session.load_from(bytes).unwrap_err();
        assert!(matches!(err, SessionError::Render(_)));
        assert_eq!(
            session.sink_mut().active()[0].1.title,
            "Could not display letter"
        );
    }

    #[test]
    fn missing_file_is_an_io_failure() {
        let mut session = session();
        let err = session
            .load_from(Path::new("/nonexistent/letter.bpk"))
            .unwrap_err();
        assert!(matches!(err, SessionError::Io(_)));
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn strict_session_rejects_odd_canvas() {
        let bytes = fixtures::letter_bytes(0, Some(fixtures::stationery_sized((64, 64), 3)), 0);
        let mut session = session();
        session.set_strict(true);
        assert!(matches!(
            session.load_from(bytes.clone()),
            Err(SessionError::Render(_))
        ));
        session.set_strict(false);
        session.load_from(bytes).unwrap();
    }

    #[test]
    fn export_writes_single_component_names_only() {
        let dir = std::env::temp_dir().join(format!("swapdoodle-export-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let export = Export {
            file_name: "SHEET10.bin".into(),
            data: vec![1, 2, 3],
        };
        let path = export.write_into(&dir).unwrap();
        assert_eq!(fs::read(&path).unwrap(), [1, 2, 3]);

        let escaping = Export {
            file_name: "../x.bin".into(),
            data: vec![],
        };
        assert_eq!(
            escaping.write_into(&dir).unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn garbage_is_reported_as_format_error() {
        let mut session = session();
        let err = session.load_from(&b"garbage!"[..]).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Format(FormatError::Decompression(_))
        ));
    }
}
