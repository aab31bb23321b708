//! Per-country yearly emission values and the tabular reader that produces them.
//!
//! The source is the World Bank indicator export: a short metadata preamble,
//! a header row beginning with `Country Name`, then one row per country laid
//! out as `name, code, indicator name, indicator code, <year cells...>`.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io::Read;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::TabularError;

/// Cells before the first year column: name, code, and two ignored metadata columns.
pub const LEADING_COLUMNS: usize = 4;

const HEADER_MARKER: &str = "Country Name";

// ── YearValue ─────────────────────────────────────────────────────────────────

/// One emission cell. `NoData` is distinct from zero and is never classified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum YearValue {
    Present(f64),
    NoData,
}

impl YearValue {
    /// Interpret a raw cell: empty means no data, anything else must be a finite number.
    pub fn parse_cell(cell: &str) -> Option<Self> {
        let cell = cell.trim();
        if cell.is_empty() {
            return Some(YearValue::NoData);
        }
        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(YearValue::Present(v)),
            _ => None,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            YearValue::Present(v) => Some(v),
            YearValue::NoData => None,
        }
    }

}

impl fmt::Display for YearValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearValue::Present(v) => write!(f, "{v}"),
            YearValue::NoData => f.write_str("No data."),
        }
    }
}

/// Integral values below 2^53 are written without a fractional part so the
/// output reads like the source table.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

fn exact_int(v: f64) -> Option<i64> {
    (v.fract() == 0.0 && v.abs() < MAX_EXACT_INT).then_some(v as i64)
}

impl Serialize for YearValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            YearValue::Present(v) => match exact_int(v) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(v),
            },
            YearValue::NoData => serializer.serialize_str(""),
        }
    }
}

impl From<YearValue> for Value {
    fn from(value: YearValue) -> Self {
        match value {
            YearValue::Present(v) => exact_int(v).map_or_else(|| Value::from(v), Value::from),
            YearValue::NoData => Value::String(String::new()),
        }
    }
}

impl<'de> Deserialize<'de> for YearValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(YearValueVisitor)
    }
}

struct YearValueVisitor;

impl<'de> Visitor<'de> for YearValueVisitor {
    type Value = YearValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, a numeric string, an empty string or null")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<YearValue, E> {
        if v.is_finite() {
            Ok(YearValue::Present(v))
        } else {
            Err(E::custom(format!("non-finite emission value {v}")))
        }
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<YearValue, E> {
        Ok(YearValue::Present(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<YearValue, E> {
        Ok(YearValue::Present(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<YearValue, E> {
        YearValue::parse_cell(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<YearValue, E> {
        Ok(YearValue::NoData)
    }

    fn visit_none<E: de::Error>(self) -> Result<YearValue, E> {
        Ok(YearValue::NoData)
    }
}

// ── YearSeries ────────────────────────────────────────────────────────────────

/// Ordered year → value mapping. Serialised as a JSON object keyed by year strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearSeries(BTreeMap<i32, YearValue>);

impl YearSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, year: i32, value: YearValue) {
        self.0.insert(year, value);
    }

    /// Value for `year`; years outside the series count as no data.
    pub fn get(&self, year: i32) -> YearValue {
        self.0.get(&year).copied().unwrap_or(YearValue::NoData)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, YearValue)> + '_ {
        self.0.iter().map(|(&y, &v)| (y, v))
    }

    pub fn first_year(&self) -> Option<i32> {
        self.0.keys().next().copied()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.0.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(i32, YearValue)> for YearSeries {
    fn from_iter<I: IntoIterator<Item = (i32, YearValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<&YearSeries> for Value {
    fn from(series: &YearSeries) -> Self {
        let map: Map<String, Value> = series
            .iter()
            .map(|(year, value)| (year.to_string(), Value::from(value)))
            .collect();
        Value::Object(map)
    }
}

impl Serialize for YearSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (year, value) in &self.0 {
            map.serialize_entry(&year.to_string(), value)?;
        }
        map.end()
    }
}

// Keys are read as strings and parsed by hand: the series sits next to
// flattened properties, and buffered content cannot be read as integer keys.
impl<'de> Deserialize<'de> for YearSeries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(YearSeriesVisitor)
    }
}

struct YearSeriesVisitor;

impl<'de> Visitor<'de> for YearSeriesVisitor {
    type Value = YearSeries;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object keyed by year")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<YearSeries, A::Error> {
        let mut series = BTreeMap::new();
        while let Some((key, value)) = access.next_entry::<String, YearValue>()? {
            let year = key
                .trim()
                .parse::<i32>()
                .map_err(|_| de::Error::custom(format!("year key {key:?} is not an integer")))?;
            series.insert(year, value);
        }
        Ok(YearSeries(series))
    }
}

// ── EmissionsRecord ───────────────────────────────────────────────────────────

/// One country row of the emissions table.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionsRecord {
    pub name: String,
    pub code: String,
    pub years: YearSeries,
}

/// Layout recovered from the header row, if the table has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct YearColumns {
    base_year: i32,
    count: Option<usize>,
}

impl YearColumns {
    fn from_header(cells: &[&str], fallback_base: i32) -> Self {
        let years: Vec<i32> = cells
            .iter()
            .skip(LEADING_COLUMNS)
            .map_while(|c| c.trim().parse::<i32>().ok())
            .collect();
        match years.first() {
            Some(&first) => Self {
                base_year: first,
                count: Some(years.len()),
            },
            None => Self {
                base_year: fallback_base,
                count: None,
            },
        }
    }
}

fn is_header(first_cell: &str) -> bool {
    first_cell
        .trim_start_matches('\u{feff}')
        .trim()
        .eq_ignore_ascii_case(HEADER_MARKER)
}

/// Read every country row from a delimited emissions table.
///
/// Rows before (and including) a `Country Name` header are skipped, and the
/// header's first year column replaces `base_year`. Without a header every
/// row is data. Any malformed row aborts the whole read.
pub fn read_emissions<R: Read>(reader: R, base_year: i32) -> Result<Vec<EmissionsRecord>, TabularError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows: Vec<(u64, csv::StringRecord)> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        rows.push((line, record));
    }

    let header_at = rows
        .iter()
        .position(|(_, r)| r.get(0).is_some_and(is_header));
    let (columns, data_rows) = match header_at {
        Some(idx) => {
            let header: Vec<&str> = rows[idx].1.iter().collect();
            (YearColumns::from_header(&header, base_year), &rows[idx + 1..])
        }
        None => (
            YearColumns {
                base_year,
                count: None,
            },
            &rows[..],
        ),
    };

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(data_rows.len());
    for (line, row) in data_rows {
        let record = parse_row(*line, row, columns)?;
        if !seen.insert(record.code.clone()) {
            return Err(TabularError::DuplicateCode {
                line: *line,
                code: record.code,
            });
        }
        records.push(record);
    }

    tracing::debug!(
        rows = records.len(),
        base_year = columns.base_year,
        header = header_at.is_some(),
        "read emissions table"
    );
    Ok(records)
}

/// Convenience wrapper over [`read_emissions`] for in-memory text.
pub fn parse_emissions_str(text: &str, base_year: i32) -> Result<Vec<EmissionsRecord>, TabularError> {
    read_emissions(text.as_bytes(), base_year)
}

fn parse_row(line: u64, row: &csv::StringRecord, columns: YearColumns) -> Result<EmissionsRecord, TabularError> {
    if row.len() < 2 {
        return Err(TabularError::ShortRow { line, cells: row.len() });
    }
    let name = row[0].trim().to_string();
    let code = row[1].trim().to_string();
    if code.is_empty() {
        return Err(TabularError::MissingCode { line });
    }

    let cells: Vec<&str> = row.iter().skip(LEADING_COLUMNS).collect();
    let width = columns.count.unwrap_or(cells.len());

    let mut years = YearSeries::new();
    for i in 0..width {
        let year = i32::try_from(i)
            .ok()
            .and_then(|offset| columns.base_year.checked_add(offset))
            .ok_or(TabularError::YearOutOfRange {
                line,
                base_year: columns.base_year,
                column: i,
            })?;
        // Rows shorter than the header are padded so every series spans the same years.
        let raw = cells.get(i).copied().unwrap_or("");
        let value = YearValue::parse_cell(raw).ok_or_else(|| TabularError::InvalidValue {
            line,
            year,
            value: raw.to_string(),
        })?;
        years.insert(year, value);
    }

    Ok(EmissionsRecord { name, code, years })
}
