use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    time::Duration,
};

use image::{Rgba, RgbaImage};

use crate::{config::AssetConfig, Result, TrailError};

/// Maps cyclic asset indices to files on disk.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    dir: PathBuf,
    count: usize,
    extension: String,
}

impl AssetCatalog {
    pub fn new(dir: impl Into<PathBuf>, count: usize, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            count: count.max(1),
            extension: extension.into(),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn resolve(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!("{}.{}", index % self.count, self.extension))
    }

    /// Lists catalog entries whose files are missing.
    pub fn missing(&self) -> Vec<PathBuf> {
        (0..self.count)
            .map(|index| self.resolve(index))
            .filter(|path| !path.is_file())
            .collect()
    }
}

impl From<&AssetConfig> for AssetCatalog {
    fn from(config: &AssetConfig) -> Self {
        Self::new(&config.dir, config.count, &config.extension)
    }
}

/// Correlates a load request with its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(pub u64);

#[derive(Debug)]
pub struct LoadOutcome {
    pub ticket: LoadTicket,
    pub result: Result<Arc<RgbaImage>>,
}

/// Asynchronous image provider.
///
/// `request` must not block. Completions are collected with `poll` and may
/// come back in any order, or not at all until a later poll.
pub trait AssetSource {
    fn request(&mut self, ticket: LoadTicket, index: usize, now: Duration);

    fn poll(&mut self, now: Duration) -> Vec<LoadOutcome>;
}

impl<S: AssetSource + ?Sized> AssetSource for Box<S> {
    fn request(&mut self, ticket: LoadTicket, index: usize, now: Duration) {
        (**self).request(ticket, index, now)
    }

    fn poll(&mut self, now: Duration) -> Vec<LoadOutcome> {
        (**self).poll(now)
    }
}

type Decoded = (usize, std::result::Result<Arc<RgbaImage>, String>);

/// Decodes catalog images on worker threads.
///
/// Each index is decoded at most once at a time: requests that arrive while
/// a decode is running wait on it. Decoded images are cached by index, and
/// cached hits are still handed out through `poll` so callers always see the
/// same async shape.
#[derive(Debug)]
pub struct ImageFileSource {
    catalog: AssetCatalog,
    sender: Sender<Decoded>,
    receiver: Receiver<Decoded>,
    cache: HashMap<usize, Arc<RgbaImage>>,
    decoding: HashMap<usize, Vec<LoadTicket>>,
    ready: Vec<LoadOutcome>,
}

impl ImageFileSource {
    pub fn new(catalog: AssetCatalog) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            catalog,
            sender,
            receiver,
            cache: HashMap::new(),
            decoding: HashMap::new(),
            ready: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    /// Number of decodes currently running on worker threads.
    pub fn decodes_in_flight(&self) -> usize {
        self.decoding.len()
    }
}

impl AssetSource for ImageFileSource {
    fn request(&mut self, ticket: LoadTicket, index: usize, _now: Duration) {
        let index = index % self.catalog.count();
        if let Some(image) = self.cache.get(&index) {
            self.ready.push(LoadOutcome {
                ticket,
                result: Ok(image.clone()),
            });
            return;
        }

        if let Some(waiting) = self.decoding.get_mut(&index) {
            waiting.push(ticket);
            return;
        }
        self.decoding.insert(index, vec![ticket]);

        let path = self.catalog.resolve(index);
        let sender = self.sender.clone();
        std::thread::spawn(move || {
            let result = image::open(&path)
                .map(|decoded| Arc::new(decoded.into_rgba8()))
                .map_err(|err| err.to_string());
            let _ = sender.send((index, result));
        });
    }

    fn poll(&mut self, _now: Duration) -> Vec<LoadOutcome> {
        let mut outcomes = std::mem::take(&mut self.ready);
        while let Ok((index, result)) = self.receiver.try_recv() {
            let waiting = self.decoding.remove(&index).unwrap_or_default();
            match result {
                Ok(image) => {
                    self.cache.entry(index).or_insert_with(|| image.clone());
                    outcomes.extend(waiting.into_iter().map(|ticket| LoadOutcome {
                        ticket,
                        result: Ok(image.clone()),
                    }));
                }
                Err(reason) => {
                    let path = self.catalog.resolve(index);
                    outcomes.extend(waiting.into_iter().map(|ticket| LoadOutcome {
                        ticket,
                        result: Err(TrailError::AssetLoad {
                            path: path.clone(),
                            reason: reason.clone(),
                        }),
                    }));
                }
            }
        }
        outcomes
    }
}

/// Picks file-backed images when any catalog file exists, otherwise
/// generated swatches of `swatch_size` pixels.
pub fn open_source(catalog: AssetCatalog, swatch_size: u32) -> Box<dyn AssetSource> {
    let missing = catalog.missing();
    if missing.len() == catalog.count() {
        tracing::info!(
            dir = ?catalog.resolve(0).parent(),
            "no trail images found, using generated swatches"
        );
        return Box::new(SwatchSource::new(swatch_size));
    }
    if !missing.is_empty() {
        tracing::warn!(?missing, "some trail images are missing and will never appear");
    }
    Box::new(ImageFileSource::new(catalog))
}

const SWATCH_PALETTE: [[u8; 3]; 8] = [
    [0xe6, 0x39, 0x46],
    [0xf1, 0x8f, 0x01],
    [0xf4, 0xd3, 0x5e],
    [0x2a, 0x9d, 0x8f],
    [0x26, 0x46, 0x53],
    [0x8e, 0x44, 0xad],
    [0xee, 0xe8, 0xd5],
    [0x3d, 0x5a, 0x80],
];

#[derive(Debug)]
struct PendingSwatch {
    ready_at: Duration,
    order: u64,
    ticket: LoadTicket,
    index: usize,
}

/// Generated solid-colour tiles with scripted latency.
///
/// Latencies are taken round-robin per request, which makes out-of-order
/// completion easy to reproduce. Indices listed as failing never produce an
/// image.
#[derive(Debug)]
pub struct SwatchSource {
    size: u32,
    latencies: Vec<Duration>,
    failing: HashSet<usize>,
    pending: Vec<PendingSwatch>,
    requests: u64,
}

impl SwatchSource {
    pub fn new(size: u32) -> Self {
        Self {
            size: size.max(1),
            latencies: vec![Duration::ZERO],
            failing: HashSet::new(),
            pending: Vec::new(),
            requests: 0,
        }
    }

    pub fn with_latencies(mut self, latencies: Vec<Duration>) -> Self {
        if !latencies.is_empty() {
            self.latencies = latencies;
        }
        self
    }

    pub fn failing(mut self, index: usize) -> Self {
        self.failing.insert(index);
        self
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    fn swatch(&self, index: usize) -> RgbaImage {
        let [r, g, b] = SWATCH_PALETTE[index % SWATCH_PALETTE.len()];
        RgbaImage::from_pixel(self.size, self.size, Rgba([r, g, b, 255]))
    }
}

impl AssetSource for SwatchSource {
    fn request(&mut self, ticket: LoadTicket, index: usize, now: Duration) {
        let latency = self.latencies[self.requests as usize % self.latencies.len()];
        self.pending.push(PendingSwatch {
            ready_at: now + latency,
            order: self.requests,
            ticket,
            index,
        });
        self.requests += 1;
    }

    fn poll(&mut self, now: Duration) -> Vec<LoadOutcome> {
        let (mut ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|pending| pending.ready_at <= now);
        self.pending = waiting;
        ready.sort_by_key(|pending| (pending.ready_at, pending.order));

        ready
            .into_iter()
            .map(|pending| {
                let result = if self.failing.contains(&pending.index) {
                    Err(TrailError::AssetLoad {
                        path: PathBuf::from(format!("swatch/{}", pending.index)),
                        reason: "scripted failure".to_string(),
                    })
                } else {
                    Ok(Arc::new(self.swatch(pending.index)))
                };
                LoadOutcome {
                    ticket: pending.ticket,
                    result,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn catalog_wraps_indices() {
        let catalog = AssetCatalog::new("img", 8, "jpeg");
        assert_eq!(catalog.resolve(3), PathBuf::from("img/3.jpeg"));
        assert_eq!(catalog.resolve(11), PathBuf::from("img/3.jpeg"));
    }

    #[test]
    fn swatches_complete_by_ready_time() {
        let mut source = SwatchSource::new(4).with_latencies(vec![ms(50), ms(10)]);
        source.request(LoadTicket(1), 0, ms(0));
        source.request(LoadTicket(2), 1, ms(0));

        assert!(source.poll(ms(5)).is_empty());
        let first = source.poll(ms(20));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].ticket, LoadTicket(2));
        assert_eq!(source.in_flight(), 1);

        let second = source.poll(ms(60));
        assert_eq!(second[0].ticket, LoadTicket(1));
        assert_eq!(second[0].result.as_ref().unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn scripted_failures_surface_as_errors() {
        let mut source = SwatchSource::new(4).failing(2);
        source.request(LoadTicket(9), 2, ms(0));
        let outcome = source.poll(ms(0)).pop().unwrap();
        assert!(matches!(outcome.result, Err(TrailError::AssetLoad { .. })));
    }

    fn drain(source: &mut impl AssetSource, expected: usize) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::new();
        for _ in 0..200 {
            outcomes.extend(source.poll(ms(0)));
            if outcomes.len() >= expected {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        outcomes
    }

    fn write_png(dir: &std::path::Path, name: &str, width: u32, height: u32) {
        RgbaImage::from_pixel(width, height, Rgba([1, 2, 3, 255]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn missing_files_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ImageFileSource::new(AssetCatalog::new(dir.path(), 8, "jpeg"));
        assert_eq!(source.catalog().missing().len(), 8);

        source.request(LoadTicket(1), 0, ms(0));
        let outcomes = drain(&mut source, 1);
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0].result, Err(TrailError::AssetLoad { .. })));
    }

    #[test]
    fn decodes_png_files_and_caches_them() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "0.png", 3, 5);

        let mut source = ImageFileSource::new(AssetCatalog::new(dir.path(), 1, "png"));
        source.request(LoadTicket(0), 0, ms(0));
        let mut outcomes = drain(&mut source, 1);

        source.request(LoadTicket(1), 0, ms(0));
        assert_eq!(source.decodes_in_flight(), 0);
        outcomes.extend(source.poll(ms(0)));

        assert_eq!(outcomes.len(), 2);
        for outcome in outcomes {
            assert_eq!(outcome.result.unwrap().dimensions(), (3, 5));
        }
    }

    #[test]
    fn burst_for_one_index_shares_a_decode() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "0.png", 4, 4);

        let mut source = ImageFileSource::new(AssetCatalog::new(dir.path(), 1, "png"));
        for ticket in 0..3 {
            source.request(LoadTicket(ticket), 0, ms(0));
        }
        assert_eq!(source.decodes_in_flight(), 1);

        let mut tickets: Vec<u64> = drain(&mut source, 3)
            .into_iter()
            .map(|outcome| {
                assert!(outcome.result.is_ok());
                outcome.ticket.0
            })
            .collect();
        tickets.sort_unstable();
        assert_eq!(tickets, vec![0, 1, 2]);
        assert_eq!(source.decodes_in_flight(), 0);
    }

    #[test]
    fn empty_catalog_falls_back_to_swatches() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = open_source(AssetCatalog::new(dir.path(), 8, "jpeg"), 6);

        source.request(LoadTicket(1), 3, ms(0));
        let outcome = source.poll(ms(0)).pop().unwrap();
        assert_eq!(outcome.result.unwrap().dimensions(), (6, 6));
    }

    #[test]
    fn populated_catalog_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "0.png", 3, 5);
        let mut source = open_source(AssetCatalog::new(dir.path(), 2, "png"), 6);

        source.request(LoadTicket(1), 0, ms(0));
        let outcome = drain(&mut source, 1).pop().unwrap();
        assert_eq!(outcome.result.unwrap().dimensions(), (3, 5));
    }
}
