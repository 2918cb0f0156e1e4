use serde::Serialize;
use std::collections::BTreeMap;
use wikigap_scanner::LengthMode;

/// One article's measured editions. A language without an entry in
/// `lengths` is an absent cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub url: String,
    pub lengths: BTreeMap<String, u64>,
}

/// Article (row) x language (column) content lengths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageLengthTable {
    mode: LengthMode,
    languages: Vec<String>,
    rows: Vec<TableRow>,
}

impl LanguageLengthTable {
    pub fn new(mode: LengthMode) -> Self {
        Self {
            mode,
            languages: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Adds a row. Every language named here becomes a column, including the
    /// ones whose length is `None`.
    pub fn push_row<I, S>(&mut self, url: &str, cells: I)
    where
        I: IntoIterator<Item = (S, Option<u64>)>,
        S: Into<String>,
    {
        let mut lengths = BTreeMap::new();
        for (language, length) in cells {
            let language = language.into();
            self.ensure_language(&language);
            if let Some(length) = length {
                lengths.entry(language).or_insert(length);
            }
        }
        self.rows.push(TableRow {
            url: url.to_string(),
            lengths,
        });
    }

    pub fn ensure_language(&mut self, language: &str) {
        if !self.languages.iter().any(|l| l == language) {
            self.languages.push(language.to_string());
        }
    }

    pub fn mode(&self) -> LengthMode {
        self.mode
    }

    /// Columns in first-seen order.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn row(&self, url: &str) -> Option<&TableRow> {
        self.rows.iter().find(|row| row.url == url)
    }

    pub fn get(&self, url: &str, language: &str) -> Option<u64> {
        self.row(url)
            .and_then(|row| row.lengths.get(language).copied())
    }

    /// `cell / reference cell`; `None` when either cell is absent.
    pub fn ratio(&self, url: &str, language: &str, reference: &str) -> Option<f64> {
        let value = self.get(url, language)?;
        let base = self.get(url, reference)?;
        Some(value as f64 / base as f64)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
