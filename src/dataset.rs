//! optdigits bitmap dataset reader
//!
//! Layout: three free-form lines, then `key = value` header lines up to line
//! 21 of the file, then per sample `entheight` rows of `entwidth` digit
//! characters followed by a label line holding one digit.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::shared::PixelGrid;

/// Lines before the header block that carry no data
const PREAMBLE_LINES: usize = 3;
/// Line count of preamble plus header block
const HEADER_END_LINE: usize = 21;
/// Largest accepted sample side in pixels
pub const MAX_SAMPLE_SIDE: u32 = 1024;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("header is missing `{0}`")]
    MissingHeader(&'static str),

    #[error("header declares an empty sample ({width}x{height})")]
    EmptySample { width: u32, height: u32 },

    #[error("header declares a {width}x{height} sample, larger than {max}x{max}")]
    OversizedSample { width: u32, height: u32, max: u32 },

    #[error("sample {sample}, row {row}: expected {expected} pixels, found {found}")]
    RowWidth {
        sample: usize,
        row: u32,
        expected: u32,
        found: usize,
    },

    #[error("sample {sample}, row {row}: invalid pixel {found:?}")]
    BadPixel { sample: usize, row: u32, found: char },

    #[error("sample {sample}: invalid label {found:?}")]
    BadLabel { sample: usize, found: String },

    #[error("sample {sample} is cut off by end of file")]
    Truncated { sample: usize },
}

/// Dimensions and sample count from the file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    pub width: u32,
    pub height: u32,
    pub num_samples: usize,
}

impl DataHeader {
    fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// All samples of a dataset, stored row-major one after another
#[derive(Debug, Clone)]
pub struct Dataset {
    header: DataHeader,
    pixels: Vec<u8>,
    labels: Vec<u8>,
    /// Highest pixel intensity present, at least 1
    max_intensity: u8,
}

impl Dataset {
    pub fn open(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path)?;
        let dataset = Self::from_reader(BufReader::new(file))?;
        info!(
            "Loaded {} samples of {}x{} from {:?}",
            dataset.len(),
            dataset.header.width,
            dataset.header.height,
            path
        );
        Ok(dataset)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, DatasetError> {
        let mut lines = LineReader::new(reader);
        let header = read_header(&mut lines)?;
        debug!("Dataset header: {:?}", header);

        let mut pixels = Vec::new();
        let mut labels = Vec::new();

        for sample in 0..header.num_samples {
            match read_sample(&mut lines, &header, sample, &mut pixels)? {
                Some(label) => labels.push(label),
                None => {
                    warn!(
                        "Dataset ends after {} of {} declared samples",
                        sample, header.num_samples
                    );
                    break;
                }
            }
        }

        let max_intensity = pixels.iter().copied().max().unwrap_or(0).max(1);
        Ok(Self {
            header: DataHeader {
                num_samples: labels.len(),
                ..header
            },
            pixels,
            labels,
            max_intensity,
        })
    }

    /// Header with `num_samples` set to the samples actually loaded
    pub fn header(&self) -> &DataHeader {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<u8> {
        self.labels.get(index).copied()
    }

    pub fn sample(&self, index: usize) -> Option<Sample<'_>> {
        (index < self.len()).then_some(Sample {
            dataset: self,
            index,
        })
    }

    /// Pixel `(row, col)` of sample `index`, bounds-checked on all three axes
    pub fn pixel(&self, index: usize, row: u32, col: u32) -> Option<u8> {
        let header = &self.header;
        if index >= self.len() || row >= header.height || col >= header.width {
            return None;
        }
        let within = row as usize * header.width as usize + col as usize;
        let offset = index
            .checked_mul(header.pixel_count())?
            .checked_add(within)?;
        self.pixels.get(offset).copied()
    }
}

/// One sample borrowed from a [`Dataset`]
#[derive(Debug, Clone, Copy)]
pub struct Sample<'a> {
    dataset: &'a Dataset,
    index: usize,
}

impl PixelGrid for Sample<'_> {
    fn width(&self) -> u32 {
        self.dataset.header.width
    }

    fn height(&self) -> u32 {
        self.dataset.header.height
    }

    fn pixel(&self, row: u32, col: u32) -> Option<u8> {
        self.dataset.pixel(self.index, row, col)
    }

    fn max_intensity(&self) -> u8 {
        self.dataset.max_intensity
    }
}

/// Line reader that tracks the line number and strips line endings
struct LineReader<R> {
    reader: R,
    buf: String,
    line_no: usize,
}

impl<R: BufRead> LineReader<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line_no: 0,
        }
    }

    /// Next line without its terminator, `None` at end of file
    fn next_line(&mut self) -> Result<Option<&str>, DatasetError> {
        self.buf.clear();
        if self.reader.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        Ok(Some(self.buf.trim_end_matches(['\n', '\r'])))
    }
}

fn read_header<R: BufRead>(lines: &mut LineReader<R>) -> Result<DataHeader, DatasetError> {
    let mut width = None;
    let mut height = None;
    let mut count = None;

    while lines.line_no < HEADER_END_LINE {
        let past_preamble = lines.line_no >= PREAMBLE_LINES;
        let Some(line) = lines.next_line()? else {
            break;
        };
        if !past_preamble {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let Ok(value) = value.trim().parse::<u32>() else {
            debug!("Ignoring header line {:?}", line);
            continue;
        };
        match key.trim() {
            "entwidth" => width = Some(value),
            "entheight" => height = Some(value),
            "ntot" => count = Some(value as usize),
            other => debug!("Ignoring header key {:?}", other),
        }
    }

    let header = DataHeader {
        width: width.ok_or(DatasetError::MissingHeader("entwidth"))?,
        height: height.ok_or(DatasetError::MissingHeader("entheight"))?,
        num_samples: count.ok_or(DatasetError::MissingHeader("ntot"))?,
    };
    if header.width == 0 || header.height == 0 {
        return Err(DatasetError::EmptySample {
            width: header.width,
            height: header.height,
        });
    }
    if header.width > MAX_SAMPLE_SIDE || header.height > MAX_SAMPLE_SIDE {
        return Err(DatasetError::OversizedSample {
            width: header.width,
            height: header.height,
            max: MAX_SAMPLE_SIDE,
        });
    }
    Ok(header)
}

/// Append one sample's pixels; returns its label, or `None` if the file ended
/// cleanly before the sample began.
fn read_sample<R: BufRead>(
    lines: &mut LineReader<R>,
    header: &DataHeader,
    sample: usize,
    pixels: &mut Vec<u8>,
) -> Result<Option<u8>, DatasetError> {
    let start = pixels.len();

    for row in 0..header.height {
        let line = loop {
            match lines.next_line()? {
                // Blank separator lines are allowed before a sample.
                Some(line) if row == 0 && line.trim().is_empty() => continue,
                Some(line) => break line,
                None if row == 0 => return Ok(None),
                None => {
                    pixels.truncate(start);
                    return Err(DatasetError::Truncated { sample });
                }
            }
        };

        let row_pixels = line.trim_end();
        let found = row_pixels.chars().count();
        if found != header.width as usize {
            return Err(DatasetError::RowWidth {
                sample,
                row,
                expected: header.width,
                found,
            });
        }
        for c in row_pixels.chars() {
            let value = c
                .to_digit(10)
                .ok_or_else(|| DatasetError::BadPixel { sample, row, found: c })?;
            pixels.push(value as u8);
        }
    }

    let Some(line) = lines.next_line()? else {
        pixels.truncate(start);
        return Err(DatasetError::Truncated { sample });
    };
    let label = line.trim();
    match label.parse::<u8>() {
        Ok(value) if value <= 9 => Ok(Some(value)),
        _ => Err(DatasetError::BadLabel {
            sample,
            found: label.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_block(width: u32, height: u32, count: usize) -> String {
        let mut text = String::from("title line\n\n\n");
        text.push_str(&format!("entwidth = {}\n", width));
        text.push_str(&format!("entheight = {}\n", height));
        text.push_str(&format!("ntot = {}\n", count));
        text.push_str("dbname = optdigits\n");
        // Pad the header block out to line 21.
        for _ in 7..HEADER_END_LINE {
            text.push_str("unrelated header text\n");
        }
        text
    }

    fn parse(text: &str) -> Result<Dataset, DatasetError> {
        Dataset::from_reader(Cursor::new(text.as_bytes()))
    }

    #[test]
    fn test_parses_samples_and_labels() {
        let mut text = header_block(3, 2, 2);
        text.push_str("010\n111\n 7\n");
        text.push_str("100\n001\n 0\n");
        let dataset = parse(&text).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(
            *dataset.header(),
            DataHeader {
                width: 3,
                height: 2,
                num_samples: 2
            }
        );
        assert_eq!(dataset.label(0), Some(7));
        assert_eq!(dataset.label(1), Some(0));
        assert_eq!(dataset.pixel(0, 0, 1), Some(1));
        assert_eq!(dataset.pixel(0, 0, 2), Some(0));
        assert_eq!(dataset.pixel(1, 1, 2), Some(1));
        let sample = dataset.sample(1).unwrap();
        assert_eq!((sample.width(), sample.height()), (3, 2));
        assert_eq!(sample.pixel(0, 0), Some(1));
        assert_eq!(sample.pixel(2, 0), None);
        assert_eq!(sample.max_intensity(), 1);
    }

    #[test]
    fn test_accessor_is_bounds_checked() {
        let mut text = header_block(3, 2, 1);
        text.push_str("010\n111\n 7\n");
        let dataset = parse(&text).unwrap();

        assert_eq!(dataset.pixel(0, 2, 0), None);
        assert_eq!(dataset.pixel(0, 0, 3), None);
        assert_eq!(dataset.pixel(1, 0, 0), None);
        assert!(dataset.sample(usize::MAX).is_none());

        let mut text = header_block(1, 1, 1);
        text.push_str("1\n 2\n");
        let tiny = parse(&text).unwrap();
        assert!(tiny.sample(usize::MAX).is_none());
        assert_eq!(tiny.pixel(usize::MAX, 0, 0), None);
        assert_eq!(tiny.pixel(0, 0, 0), Some(1));
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = header_block(2, 1, 1).replace('\n', "\r\n") + "01\r\n 4\r\n";
        let dataset = parse(&text).unwrap();
        assert_eq!(dataset.label(0), Some(4));
        assert_eq!(dataset.pixel(0, 0, 1), Some(1));
    }

    #[test]
    fn test_header_keys_in_preamble_are_ignored() {
        let text = "entwidth = 9\nentheight = 9\nntot = 9\n";
        assert!(matches!(
            parse(text),
            Err(DatasetError::MissingHeader("entwidth"))
        ));
    }

    #[test]
    fn test_header_stops_at_line_budget() {
        // ntot appears on line 22, which belongs to the sample area.
        let mut text = String::from("a\nb\nc\nentwidth = 2\nentheight = 1\n");
        for _ in 5..HEADER_END_LINE {
            text.push_str("filler\n");
        }
        text.push_str("ntot = 1\n");
        assert!(matches!(parse(&text), Err(DatasetError::MissingHeader("ntot"))));
    }

    #[test]
    fn test_short_file_ends_header_early() {
        let text = "a\nb\nc\nentwidth = 2\nentheight = 1\nntot = 0\n";
        let dataset = parse(text).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.header().width, 2);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let text = header_block(0, 4, 1);
        assert!(matches!(
            parse(&text),
            Err(DatasetError::EmptySample { width: 0, height: 4 })
        ));
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        let text = header_block(1_000_000_000, 4, 0);
        assert!(matches!(
            parse(&text),
            Err(DatasetError::OversizedSample {
                width: 1_000_000_000,
                height: 4,
                max: MAX_SAMPLE_SIDE
            })
        ));
        assert!(parse(&header_block(MAX_SAMPLE_SIDE, MAX_SAMPLE_SIDE, 0)).is_ok());
    }

    #[test]
    fn test_grey_intensities_set_max() {
        let mut text = header_block(3, 1, 1);
        text.push_str("049\n 6\n");
        let dataset = parse(&text).unwrap();
        let sample = dataset.sample(0).unwrap();
        assert_eq!(sample.max_intensity(), 9);
        assert_eq!(sample.pixel(0, 1), Some(4));
    }

    #[test]
    fn test_eof_at_sample_boundary_keeps_loaded_samples() {
        let mut text = header_block(2, 1, 5);
        text.push_str("11\n 1\n10\n 2\n");
        let dataset = parse(&text).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.header().num_samples, 2);
    }

    #[test]
    fn test_eof_inside_sample_is_an_error() {
        let mut text = header_block(2, 3, 1);
        text.push_str("11\n01\n");
        assert!(matches!(parse(&text), Err(DatasetError::Truncated { sample: 0 })));

        let mut text = header_block(2, 1, 1);
        text.push_str("11\n");
        assert!(matches!(parse(&text), Err(DatasetError::Truncated { sample: 0 })));
    }

    #[test]
    fn test_row_width_mismatch() {
        let mut text = header_block(3, 1, 1);
        text.push_str("0101\n 1\n");
        assert!(matches!(
            parse(&text),
            Err(DatasetError::RowWidth {
                sample: 0,
                row: 0,
                expected: 3,
                found: 4
            })
        ));
    }

    #[test]
    fn test_bad_pixel_and_label() {
        let mut text = header_block(2, 1, 1);
        text.push_str("0x\n 1\n");
        assert!(matches!(
            parse(&text),
            Err(DatasetError::BadPixel { found: 'x', .. })
        ));

        let mut text = header_block(2, 1, 1);
        text.push_str("01\n 12\n");
        assert!(matches!(parse(&text), Err(DatasetError::BadLabel { .. })));
    }

    #[test]
    fn test_blank_line_between_samples() {
        let mut text = header_block(1, 1, 2);
        text.push_str("1\n 3\n\n0\n 5\n");
        let dataset = parse(&text).unwrap();
        assert_eq!(dataset.label(1), Some(5));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Dataset::open(&dir.path().join("missing.tra")).unwrap_err();
        assert!(matches!(err, DatasetError::Io(_)));
    }

    #[test]
    fn test_open_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digits.tra");
        let mut text = header_block(2, 2, 1);
        text.push_str("10\n01\n 8\n");
        std::fs::write(&path, text).unwrap();

        let dataset = Dataset::open(&path).unwrap();
        assert_eq!(dataset.label(0), Some(8));
    }
}
