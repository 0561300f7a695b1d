use std::borrow::Cow;
use std::fmt::{self, Write as _};
use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

use tracing::{debug, warn};

const DEFAULT_MAX_IDLE: usize = 256;

/// Request side of one exchange, as it was sent.
#[derive(Debug, Default)]
pub struct RequestRecord {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RequestRecord {
    #[must_use]
    pub fn headers_text(&self) -> String {
        let mut output = String::new();
        if let Err(err) = self.write_head(&mut output) {
            debug!("Failed to format request head: {}", err);
        }
        output
    }

    fn write_head(&self, output: &mut String) -> fmt::Result {
        if !self.method.is_empty() {
            write!(output, "{} {} HTTP/1.1\r\n", self.method, self.url)?;
        }
        write_headers(output, &self.headers)
    }

    /// Approximate size on the wire: request line, headers, and body.
    #[must_use]
    pub fn wire_len(&self) -> u64 {
        let head = self.headers_text().len();
        let total = head.saturating_add(2).saturating_add(self.body.len());
        u64::try_from(total).unwrap_or(u64::MAX)
    }

    fn clear(&mut self) {
        self.method.clear();
        self.url.clear();
        self.headers.clear();
        self.body.clear();
    }
}

/// Response side of one exchange. Empty when the transport failed early.
#[derive(Debug)]
pub struct ResponseRecord {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Declared `Content-Length`, or -1 when the header was absent or invalid.
    pub content_length: i64,
    pub body: Vec<u8>,
}

impl Default for ResponseRecord {
    fn default() -> Self {
        Self {
            status: 0,
            headers: Vec::new(),
            content_length: -1,
            body: Vec::new(),
        }
    }
}

impl ResponseRecord {
    /// First header value matching `name`, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn header_values<'rec>(&'rec self, name: &'rec str) -> impl Iterator<Item = &'rec str> {
        self.headers
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    #[must_use]
    pub fn headers_text(&self) -> String {
        let mut output = String::new();
        if let Err(err) = self.write_head(&mut output) {
            debug!("Failed to format response head: {}", err);
        }
        output
    }

    fn write_head(&self, output: &mut String) -> fmt::Result {
        if self.status != 0 {
            write!(output, "HTTP/1.1 {}\r\n", self.status)?;
        }
        write_headers(output, &self.headers)
    }

    fn clear(&mut self) {
        self.status = 0;
        self.headers.clear();
        self.content_length = -1;
        self.body.clear();
    }
}

fn write_headers(output: &mut String, headers: &[(String, String)]) -> fmt::Result {
    for (name, value) in headers {
        write!(output, "{}: {}\r\n", name, value)?;
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct ExchangeBuffers {
    pub request: RequestRecord,
    pub response: ResponseRecord,
}

impl ExchangeBuffers {
    fn clear(&mut self) {
        self.request.clear();
        self.response.clear();
    }
}

/// Free list of exchange buffers. Checked-out buffers come back on drop.
#[derive(Debug)]
pub struct ExchangePool {
    idle: Mutex<Vec<ExchangeBuffers>>,
    max_idle: usize,
}

impl Default for ExchangePool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDLE)
    }
}

impl ExchangePool {
    #[must_use]
    pub const fn new(max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    #[must_use]
    pub fn checkout(&self) -> PooledExchange<'_> {
        let buffers = match self.idle.lock() {
            Ok(mut idle) => idle.pop().unwrap_or_default(),
            Err(_) => {
                warn!("Exchange pool lock poisoned; allocating fresh buffers.");
                ExchangeBuffers::default()
            }
        };
        PooledExchange {
            pool: self,
            buffers,
        }
    }

    /// Number of buffers currently waiting for reuse.
    #[must_use]
    pub fn idle_len(&self) -> usize {
        self.idle.lock().map_or(0, |idle| idle.len())
    }

    fn release(&self, mut buffers: ExchangeBuffers) {
        buffers.clear();
        if let Ok(mut idle) = self.idle.lock()
            && idle.len() < self.max_idle
        {
            idle.push(buffers);
        }
    }
}

/// Buffers borrowed from an [`ExchangePool`] for the length of one run.
#[derive(Debug)]
pub struct PooledExchange<'pool> {
    pool: &'pool ExchangePool,
    buffers: ExchangeBuffers,
}

impl Deref for PooledExchange<'_> {
    type Target = ExchangeBuffers;

    fn deref(&self) -> &Self::Target {
        &self.buffers
    }
}

impl DerefMut for PooledExchange<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffers
    }
}

impl Drop for PooledExchange<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buffers));
    }
}
