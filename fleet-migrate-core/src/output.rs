use std::{
    fmt,
    io::{self, Write},
    sync::Arc,
};

use parking_lot::Mutex;

/// Destination of the progress lines printed while migrations run.
///
/// Cloning is cheap and every clone writes to the same sink, which lets the
/// progress ticker of an incremental step share it with the caller.
#[derive(Clone)]
pub struct Output(Sink);

#[derive(Clone)]
enum Sink {
    Stdout,
    Discard,
    Memory(Arc<Mutex<Vec<u8>>>),
    Writer(Arc<Mutex<Box<dyn Write + Send>>>),
}

impl Output {
    pub fn stdout() -> Self {
        Self(Sink::Stdout)
    }

    pub fn discard() -> Self {
        Self(Sink::Discard)
    }

    /// In-memory sink, read back with [`Output::contents`].
    pub fn memory() -> Self {
        Self(Sink::Memory(Arc::default()))
    }

    pub fn writer(writer: impl Write + Send + 'static) -> Self {
        Self(Sink::Writer(Arc::new(Mutex::new(Box::new(writer)))))
    }

    /// Writes `args` followed by a newline.
    ///
    /// Progress output is informational, a failing sink never fails a migration.
    pub fn line(&self, args: fmt::Arguments<'_>) {
        let _ = match &self.0 {
            Sink::Stdout => {
                let mut out = io::stdout().lock();
                out.write_fmt(args).and_then(|_| out.write_all(b"\n"))
            }
            Sink::Discard => Ok(()),
            Sink::Memory(buf) => {
                let mut buf = buf.lock();
                buf.write_fmt(args).and_then(|_| buf.write_all(b"\n"))
            }
            Sink::Writer(w) => {
                let mut w = w.lock();
                w.write_fmt(args).and_then(|_| w.write_all(b"\n"))
            }
        };
    }

    /// Everything written so far to a [`Output::memory`] sink, empty for the others.
    pub fn contents(&self) -> String {
        match &self.0 {
            Sink::Memory(buf) => String::from_utf8_lossy(&buf.lock()).into_owned(),
            _ => String::new(),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.0 {
            Sink::Stdout => "stdout",
            Sink::Discard => "discard",
            Sink::Memory(_) => "memory",
            Sink::Writer(_) => "writer",
        };

        f.debug_tuple("Output").field(&kind).finish()
    }
}
