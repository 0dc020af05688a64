// CSV/TSV reading into a headerless grid

use crate::error::LoadError;

/// Decode raw file bytes: UTF-8 first, then Windows-1252 (Excel's default
/// for CSV exports on French locales). A leading BOM is dropped.
pub fn decode(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            tracing::debug!("input is not UTF-8, decoded as Windows-1252");
            decoded.into_owned()
        }
    };
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Detect the most likely field delimiter from the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line.
/// The most common multi-field count is the target; score is the number of
/// lines hitting it times the field count. Single-cell title lines above the
/// header therefore do not disqualify a delimiter.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(10)
        .collect();

    let mut best = b',';
    let mut best_score = 0usize;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| field_count(line, delim))
            .collect();

        let Some(target) = most_common_multi_field(&counts) else {
            continue;
        };
        let consistent = counts.iter().filter(|&&c| c == target).count();
        let score = consistent * target;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

fn field_count(line: &str, delim: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map(|r| r.len())
        .unwrap_or(1)
}

/// Most frequent count above one; ties go to the larger count.
fn most_common_multi_field(counts: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for &c in counts.iter().filter(|&&c| c > 1) {
        let freq = counts.iter().filter(|&&x| x == c).count();
        let better = match best {
            None => true,
            Some((bc, bf)) => freq > bf || (freq == bf && c > bc),
        };
        if better {
            best = Some((c, freq));
        }
    }
    best.map(|(c, _)| c)
}

/// Parse CSV text with a sniffed delimiter.
pub fn read_grid(content: &str) -> Result<Vec<Vec<String>>, LoadError> {
    read_grid_with_delimiter(content, sniff_delimiter(content))
}

/// Parse CSV text into rows of cells. Rows may differ in width.
pub fn read_grid_with_delimiter(content: &str, delimiter: u8) -> Result<Vec<Vec<String>>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for result in reader.records() {
        let record = result?;
        grid.push(record.iter().map(|f| f.to_string()).collect());
    }
    Ok(grid)
}
