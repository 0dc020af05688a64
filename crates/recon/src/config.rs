use serde::Deserialize;

use crate::columns::{Role, Side};
use crate::error::ReconError;
use crate::normalize::RECYCLE_VARIANTS;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Keyword sets driving header detection and column resolution.
///
/// Every section is optional in TOML; omitted sections keep the built-in sets.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default)]
    pub header: HeaderConfig,
    #[serde(default)]
    pub keywords: KeywordConfig,
    #[serde(default)]
    pub scan: ScanKeywords,
    #[serde(default)]
    pub lot: LotConfig,
}

// ---------------------------------------------------------------------------
// Header detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Number of leading rows inspected for a header.
    pub scan_rows: usize,
    /// Article-identifier fragments; one must appear in the header row.
    pub id_keywords: Vec<String>,
    /// Lot/quantity/stock fragments; one must appear alongside an identifier.
    pub companion_keywords: Vec<String>,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            scan_rows: 20,
            id_keywords: strings(&["code", "article"]),
            companion_keywords: strings(&["qte", "quant", "stock", "lot"]),
        }
    }
}

// ---------------------------------------------------------------------------
// Column keywords
// ---------------------------------------------------------------------------

/// Ordered fragment lists per role. Order matters only within a list;
/// column order decides between columns.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub code: Vec<String>,
    pub lot: Vec<String>,
    pub quantity: Vec<String>,
    pub label: Vec<String>,
    pub ean: Vec<String>,
    /// Serial keywords for the computer file.
    pub serial: Vec<String>,
    /// Serial keywords for the field file.
    pub serial_field: Vec<String>,
    pub location: Vec<String>,
    pub site: Vec<String>,
    pub reserved: Vec<String>,
    pub available: Vec<String>,
    pub unit_of_measure: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            code: strings(&["code", "article", "ref"]),
            lot: strings(&["lot", "serie", "batch"]),
            quantity: strings(&["qte", "quant", "stock"]),
            label: strings(&["lib", "designation", "nom"]),
            ean: strings(&["ean", "code_barre"]),
            serial: strings(&["serie", "serial", "s/n"]),
            serial_field: strings(&["serie", "serial"]),
            location: strings(&["emplacement", "rack"]),
            site: strings(&["site", "magasin"]),
            reserved: strings(&["reserve", "réserv"]),
            available: strings(&["dispo", "utilisable"]),
            unit_of_measure: strings(&["um", "unite"]),
        }
    }
}

impl KeywordConfig {
    pub fn for_role(&self, role: Role, side: Side) -> &[String] {
        match role {
            Role::Code => &self.code,
            Role::Lot => &self.lot,
            Role::Quantity => &self.quantity,
            Role::Label => &self.label,
            Role::Ean => &self.ean,
            Role::Serial => match side {
                Side::Computer => &self.serial,
                Side::Field => &self.serial_field,
            },
            Role::Location => &self.location,
            Role::Site => &self.site,
            Role::Reserved => &self.reserved,
            Role::Available => &self.available,
            Role::UnitOfMeasure => &self.unit_of_measure,
        }
    }

    fn lists(&self) -> [(&'static str, &[String]); 12] {
        [
            ("code", self.code.as_slice()),
            ("lot", self.lot.as_slice()),
            ("quantity", self.quantity.as_slice()),
            ("label", self.label.as_slice()),
            ("ean", self.ean.as_slice()),
            ("serial", self.serial.as_slice()),
            ("serial_field", self.serial_field.as_slice()),
            ("location", self.location.as_slice()),
            ("site", self.site.as_slice()),
            ("reserved", self.reserved.as_slice()),
            ("available", self.available.as_slice()),
            ("unit_of_measure", self.unit_of_measure.as_slice()),
        ]
    }
}

/// Keywords used by the scan workflow on the reference file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanKeywords {
    pub code: Vec<String>,
    pub quantity: Vec<String>,
    pub label: Vec<String>,
    pub lot: Vec<String>,
}

impl Default for ScanKeywords {
    fn default() -> Self {
        Self {
            code: strings(&["code", "article", "ref"]),
            quantity: strings(&["qte", "quant", "stock"]),
            label: strings(&["lib", "designation"]),
            lot: strings(&["lot", "serie"]),
        }
    }
}

// ---------------------------------------------------------------------------
// Lot normalization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LotConfig {
    /// Spellings folded into the canonical `STOCK` lot.
    pub recycle_variants: Vec<String>,
}

impl Default for LotConfig {
    fn default() -> Self {
        Self {
            recycle_variants: strings(RECYCLE_VARIANTS),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.header.scan_rows == 0 {
            return Err(ReconError::ConfigValidation(
                "header.scan_rows must be at least 1".into(),
            ));
        }

        let mut lists: Vec<(String, &[String])> = vec![
            ("header.id_keywords".into(), self.header.id_keywords.as_slice()),
            ("header.companion_keywords".into(), self.header.companion_keywords.as_slice()),
            ("scan.code".into(), self.scan.code.as_slice()),
            ("scan.quantity".into(), self.scan.quantity.as_slice()),
            ("scan.label".into(), self.scan.label.as_slice()),
            ("scan.lot".into(), self.scan.lot.as_slice()),
        ];
        lists.extend(
            self.keywords
                .lists()
                .into_iter()
                .map(|(name, list)| (format!("keywords.{name}"), list)),
        );

        for (name, list) in lists {
            if list.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "{name} must list at least one keyword"
                )));
            }
            if list.iter().any(|k| k.trim().is_empty()) {
                return Err(ReconError::ConfigValidation(format!(
                    "{name} contains an empty keyword"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
