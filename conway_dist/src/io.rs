// io.rs - Board input/output collaborator (PGM images or memory)

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::grid::{Grid, GridError};
use crate::params::{Params, ParamsError};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, #[source] source: std::io::Error },
    #[error("malformed PGM image: {0}")]
    Malformed(String),
    #[error("image is {actual_width}x{actual_height}, expected {width}x{height}")]
    Dimensions { width: usize, height: usize, actual_width: usize, actual_height: usize },
    #[error("no board named {0}")]
    Missing(String),
    #[error("unknown pattern `{0}`")]
    UnknownPattern(String),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Params(#[from] ParamsError),
    #[error("io task has shut down")]
    Closed,
}

/// Where boards come from and where snapshots go.
pub trait BoardStore: Send + 'static {
    /// Return `width * height` row-major cell bytes for the board called `name`.
    fn load(&mut self, name: &str, width: usize, height: usize) -> Result<Vec<u8>, IoError>;
    fn save(&mut self, name: &str, width: usize, height: usize, cells: &[u8]) -> Result<(), IoError>;
}

/// Reads `<input_dir>/<name>.pgm`, writes `<output_dir>/<name>.pgm`.
#[derive(Debug, Clone)]
pub struct PgmStore {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl PgmStore {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self { input_dir: input_dir.into(), output_dir: output_dir.into() }
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{name}.pgm"))
    }
}

impl BoardStore for PgmStore {
    fn load(&mut self, name: &str, width: usize, height: usize) -> Result<Vec<u8>, IoError> {
        let path = self.input_dir.join(format!("{name}.pgm"));
        let bytes = fs::read(&path).map_err(|source| IoError::Read { path: path.clone(), source })?;
        let (actual_width, actual_height, cells) = decode_pgm(&bytes)?;
        if actual_width != width || actual_height != height {
            return Err(IoError::Dimensions { width, height, actual_width, actual_height });
        }
        debug!(path = %path.display(), "loaded board");
        Ok(cells)
    }

    fn save(&mut self, name: &str, width: usize, height: usize, cells: &[u8]) -> Result<(), IoError> {
        let path = self.output_path(name);
        write_file(&self.output_dir, &path, &encode_pgm(width, height, cells))?;
        info!(path = %path.display(), "wrote snapshot");
        Ok(())
    }
}

fn write_file(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), IoError> {
    let wrap = |source| IoError::Write { path: path.to_path_buf(), source };
    fs::create_dir_all(dir).map_err(wrap)?;
    fs::write(path, bytes).map_err(wrap)
}

/// Binary greymap (P5, maxval 255).
pub fn encode_pgm(width: usize, height: usize, cells: &[u8]) -> Vec<u8> {
    let mut out = format!("P5\n{width} {height}\n255\n").into_bytes();
    out.extend_from_slice(cells);
    out
}

/// Parse a P5 image into `(width, height, cells)`.
pub fn decode_pgm(bytes: &[u8]) -> Result<(usize, usize, Vec<u8>), IoError> {
    let mut header = Header { bytes, pos: 0 };
    if header.token()? != "P5" {
        return Err(IoError::Malformed("not a binary PGM (P5) image".into()));
    }
    let width = header.number("width")?;
    let height = header.number("height")?;
    let maxval = header.number("maxval")?;
    if maxval != 255 {
        return Err(IoError::Malformed(format!("maxval must be 255, got {maxval}")));
    }
    let size = width
        .checked_mul(height)
        .ok_or_else(|| IoError::Malformed(format!("{width}x{height} is too large")))?;
    // Exactly one whitespace byte separates the header from the raster
    let data = bytes.get(header.pos + 1..).unwrap_or_default();
    if data.len() < size {
        return Err(IoError::Malformed(format!("raster holds {} bytes, expected {size}", data.len())));
    }
    Ok((width, height, data[..size].to_vec()))
}

struct Header<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Header<'a> {
    fn token(&mut self) -> Result<&'a str, IoError> {
        loop {
            match self.bytes.get(self.pos) {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'#') => {
                    while self.bytes.get(self.pos).is_some_and(|&b| b != b'\n') {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        let start = self.pos;
        while self.bytes.get(self.pos).is_some_and(|b| !b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(IoError::Malformed("unexpected end of header".into()));
        }
        std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| IoError::Malformed("header is not ASCII".into()))
    }

    fn number(&mut self, field: &str) -> Result<usize, IoError> {
        let token = self.token()?;
        token
            .parse()
            .map_err(|_| IoError::Malformed(format!("{field} `{token}` is not a number")))
    }
}

/// In-memory boards keyed by name. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    boards: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, cells: Vec<u8>) {
        self.lock().insert(name.into(), cells);
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.lock().get(name).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.boards.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BoardStore for MemoryStore {
    fn load(&mut self, name: &str, _width: usize, _height: usize) -> Result<Vec<u8>, IoError> {
        self.get(name).ok_or_else(|| IoError::Missing(name.to_string()))
    }

    fn save(&mut self, name: &str, _width: usize, _height: usize, cells: &[u8]) -> Result<(), IoError> {
        self.insert(name, cells.to_vec());
        Ok(())
    }
}

/// Serves boards seeded in memory first, everything else from `inner`.
/// Snapshots always go to `inner`.
#[derive(Debug, Clone)]
pub struct SeededStore<S> {
    seeds: MemoryStore,
    inner: S,
}

impl<S: BoardStore> SeededStore<S> {
    pub fn new(inner: S) -> Self {
        Self { seeds: MemoryStore::new(), inner }
    }

    pub fn seed(self, name: impl Into<String>, grid: &Grid) -> Self {
        self.seeds.insert(name, grid.cells().to_vec());
        self
    }
}

impl<S: BoardStore> BoardStore for SeededStore<S> {
    fn load(&mut self, name: &str, width: usize, height: usize) -> Result<Vec<u8>, IoError> {
        match self.seeds.get(name) {
            Some(cells) => Ok(cells),
            None => self.inner.load(name, width, height),
        }
    }

    fn save(&mut self, name: &str, width: usize, height: usize, cells: &[u8]) -> Result<(), IoError> {
        self.inner.save(name, width, height, cells)
    }
}

enum IoRequest {
    Input { name: String, width: usize, height: usize, reply: oneshot::Sender<Result<Vec<u8>, IoError>> },
    Output { name: String, width: usize, height: usize, cells: Vec<u8> },
    CheckIdle { reply: oneshot::Sender<()> },
}

/// Handle to the IO task. Requests are served strictly in order, so an idle
/// acknowledgment implies every earlier output has been written.
#[derive(Debug, Clone)]
pub struct IoHandle {
    tx: mpsc::UnboundedSender<IoRequest>,
}

impl std::fmt::Debug for IoRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoRequest::Input { name, .. } => write!(f, "Input({name})"),
            IoRequest::Output { name, .. } => write!(f, "Output({name})"),
            IoRequest::CheckIdle { .. } => f.write_str("CheckIdle"),
        }
    }
}

impl IoHandle {
    /// Move `store` onto a blocking thread that serves requests until every handle is dropped.
    pub fn spawn<S: BoardStore>(mut store: S) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<IoRequest>();
        tokio::task::spawn_blocking(move || {
            while let Some(request) = rx.blocking_recv() {
                debug!(?request, "io request");
                match request {
                    IoRequest::Input { name, width, height, reply } => {
                        let _ = reply.send(store.load(&name, width, height));
                    }
                    IoRequest::Output { name, width, height, cells } => {
                        if let Err(err) = store.save(&name, width, height, &cells) {
                            error!(%err, name = %name, "snapshot write failed");
                        }
                    }
                    IoRequest::CheckIdle { reply } => {
                        let _ = reply.send(());
                    }
                }
            }
            debug!("io task finished");
        });
        Self { tx }
    }

    /// Load the `<W>x<H>` input board.
    pub async fn read_grid(&self, params: &Params) -> Result<Grid, IoError> {
        let (reply, rx) = oneshot::channel();
        self.request(IoRequest::Input {
            name: params.input_name(),
            width: params.image_width,
            height: params.image_height,
            reply,
        })?;
        let cells = rx.await.map_err(|_| IoError::Closed)??;
        Ok(Grid::from_cells(params.image_width, params.image_height, cells)?)
    }

    /// Queue a snapshot write; returns once the request is queued.
    pub fn write_grid(&self, name: String, grid: &Grid) -> Result<(), IoError> {
        self.request(IoRequest::Output {
            name,
            width: grid.width(),
            height: grid.height(),
            cells: grid.cells().to_vec(),
        })
    }

    /// Resolves after every previously queued request has been served.
    pub async fn check_idle(&self) -> Result<(), IoError> {
        let (reply, rx) = oneshot::channel();
        self.request(IoRequest::CheckIdle { reply })?;
        rx.await.map_err(|_| IoError::Closed)
    }

    fn request(&self, request: IoRequest) -> Result<(), IoError> {
        self.tx.send(request).map_err(|_| IoError::Closed)
    }
}
