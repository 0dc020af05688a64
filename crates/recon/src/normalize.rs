//! Cell value normalizers.
//!
//! Every function here is total: any input maps to exactly one canonical
//! string (or number), and applying a normalizer to its own output is a no-op.

/// Sentinel lot for blank, missing, or `NaN` lot cells.
pub const NO_LOT: &str = "NO_LOT";

/// Canonical label for every recycling-stock spelling.
pub const STOCK_LOT: &str = "STOCK";

/// Known spellings of the recycling lot, already trimmed and uppercased.
/// Exports mix the digit zero and the letter O.
pub const RECYCLE_VARIANTS: &[&str] = &[
    "STOCK+RECYCL0",
    "RECYCL0",
    "STOCK RECYCL0",
    "STOCK+RECYCLO",
    "RECYCLO",
    "STOCK RECYCLO",
];

/// Canonical text for a numeric-looking identifier (article code, EAN, serial).
///
/// Spreadsheet exports turn long identifiers into `3.7E+12` or `1234.0`;
/// both collapse back to plain digits. Anything else is returned trimmed.
pub fn normalize_identifier(value: Option<&str>) -> String {
    let mut current = match value {
        Some(v) => v.trim().to_string(),
        None => return String::new(),
    };
    // Each step either shortens the text or turns it into plain digits,
    // so the loop reaches a fixed point quickly.
    loop {
        let next = identifier_step(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn identifier_step(txt: &str) -> String {
    let txt = txt.trim();
    if txt.is_empty() {
        return String::new();
    }

    if txt.to_ascii_uppercase().contains("E+") {
        if let Ok(n) = txt.replace(',', ".").parse::<f64>() {
            if n.is_finite() {
                return format!("{n:.0}");
            }
        }
    }

    match txt.strip_suffix(".0") {
        Some(stripped) => stripped.to_string(),
        None => txt.to_string(),
    }
}

/// Join-key form of an article code: the identifier form, uppercased so
/// `code001` and `CODE001` name the same article.
pub fn normalize_code(value: Option<&str>) -> String {
    normalize_identifier(value).to_uppercase()
}

/// Canonical lot label using the built-in recycling spellings.
pub fn normalize_lot(value: Option<&str>) -> String {
    normalize_lot_with(value, RECYCLE_VARIANTS)
}

/// Canonical lot label with a caller-supplied list of recycling spellings.
pub fn normalize_lot_with<S: AsRef<str>>(value: Option<&str>, recycle_variants: &[S]) -> String {
    let Some(raw) = value else {
        return NO_LOT.to_string();
    };
    let val = raw.trim().to_uppercase();
    if recycle_variants
        .iter()
        .any(|v| v.as_ref().trim().eq_ignore_ascii_case(&val))
    {
        return STOCK_LOT.to_string();
    }
    if val.is_empty() || val == "NAN" {
        return NO_LOT.to_string();
    }
    val
}

/// Parse a quantity cell. Accepts a decimal comma and thousands spaces.
/// Returns `None` for anything that is not a finite number.
pub fn parse_quantity(value: Option<&str>) -> Option<f64> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Quantity used in sums: non-numeric and missing cells count as zero.
pub fn coerce_quantity(value: Option<&str>) -> f64 {
    parse_quantity(value).unwrap_or(0.0)
}
