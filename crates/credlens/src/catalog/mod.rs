//! Card catalog snapshots and the providers that load them.
//!
//! A snapshot is immutable. Providers hand out `Arc<CardCatalog>` clones and replace the
//! whole snapshot on reload, so an evaluation in flight keeps the catalog it started with.

mod normalizer;
mod parser;

use crate::domain::CardRecord;
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use normalizer::normalize_name;
use parser::{CardRow, REQUIRED_COLUMNS};

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingColumn(&'static str),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "failed to read card catalog: {}", err),
            CatalogError::Csv(err) => write!(f, "invalid card catalog CSV: {}", err),
            CatalogError::MissingColumn(column) => {
                write!(f, "card catalog is missing required column '{}'", column)
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(err) => Some(err),
            CatalogError::Csv(err) => Some(err),
            CatalogError::MissingColumn(_) => None,
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Ordered, read-only set of cards from one load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardCatalog {
    cards: Vec<CardRecord>,
    skipped_rows: usize,
}

impl CardCatalog {
    /// Builds a snapshot, dropping later entries whose name repeats an earlier one.
    pub fn new(cards: Vec<CardRecord>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(cards.len());
        let mut skipped_rows = 0;

        for card in cards {
            if seen.insert(normalize_name(&card.name)) {
                unique.push(card);
            } else {
                warn!(card = %card.name, "duplicate card name in catalog, keeping first entry");
                skipped_rows += 1;
            }
        }

        Self {
            cards: unique,
            skipped_rows,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|header| header == column) {
                return Err(CatalogError::MissingColumn(column));
            }
        }

        let mut cards = Vec::new();
        let mut rejected = 0;
        for (index, row) in csv_reader.deserialize::<CardRow>().enumerate() {
            let line = index + 2;
            match row {
                Ok(row) => match row.into_record() {
                    Ok(card) => cards.push(card),
                    Err(reason) => {
                        warn!(line, %reason, "skipping catalog row");
                        rejected += 1;
                    }
                },
                Err(err) => {
                    warn!(line, error = %err, "skipping unreadable catalog row");
                    rejected += 1;
                }
            }
        }

        let mut catalog = Self::new(cards);
        catalog.skipped_rows += rejected;
        Ok(catalog)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn cards(&self) -> &[CardRecord] {
        &self.cards
    }

    pub fn find(&self, name: &str) -> Option<&CardRecord> {
        let wanted = normalize_name(name);
        self.cards
            .iter()
            .find(|card| normalize_name(&card.name) == wanted)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Rows dropped during load because they were unreadable or duplicated.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

/// Source of catalog snapshots. Implementations never fail: an unavailable source
/// yields an empty snapshot.
pub trait CatalogProvider: Send + Sync {
    fn snapshot(&self) -> Arc<CardCatalog>;

    /// Operator-facing note about the last load, if it degraded.
    fn diagnostic(&self) -> Option<String> {
        None
    }
}

/// Provider serving one fixed snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogProvider {
    catalog: Arc<CardCatalog>,
}

impl StaticCatalogProvider {
    pub fn new(catalog: CardCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }
}

impl CatalogProvider for StaticCatalogProvider {
    fn snapshot(&self) -> Arc<CardCatalog> {
        Arc::clone(&self.catalog)
    }
}

struct CachedSnapshot {
    loaded_at: Instant,
    catalog: Arc<CardCatalog>,
}

/// Provider reading a CSV file, reloading at most once per refresh interval.
pub struct CsvCatalogProvider {
    path: PathBuf,
    refresh_interval: Duration,
    cached: RwLock<Option<CachedSnapshot>>,
    last_error: Mutex<Option<String>>,
}

impl CsvCatalogProvider {
    pub fn new(path: impl Into<PathBuf>, refresh_interval: Duration) -> Self {
        Self {
            path: path.into(),
            refresh_interval,
            cached: RwLock::new(None),
            last_error: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Diagnostic from the most recent load, `None` when it succeeded.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn fresh_snapshot(&self, cached: &Option<CachedSnapshot>) -> Option<Arc<CardCatalog>> {
        cached
            .as_ref()
            .filter(|snapshot| snapshot.loaded_at.elapsed() < self.refresh_interval)
            .map(|snapshot| Arc::clone(&snapshot.catalog))
    }

    fn load(&self) -> Arc<CardCatalog> {
        let (catalog, diagnostic) = match CardCatalog::from_path(&self.path) {
            Ok(catalog) => {
                info!(
                    path = %self.path.display(),
                    cards = catalog.len(),
                    skipped = catalog.skipped_rows(),
                    "card catalog loaded"
                );
                (catalog, None)
            }
            Err(err) => {
                error!(path = %self.path.display(), error = %err, "card catalog unavailable");
                (CardCatalog::empty(), Some(err.to_string()))
            }
        };

        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = diagnostic;
        Arc::new(catalog)
    }
}

impl CatalogProvider for CsvCatalogProvider {
    fn snapshot(&self) -> Arc<CardCatalog> {
        {
            let cached = self.cached.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(catalog) = self.fresh_snapshot(&cached) {
                return catalog;
            }
        }

        let mut cached = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(catalog) = self.fresh_snapshot(&cached) {
            return catalog;
        }

        debug!(path = %self.path.display(), "refreshing card catalog");
        let catalog = self.load();
        *cached = Some(CachedSnapshot {
            loaded_at: Instant::now(),
            catalog: Arc::clone(&catalog),
        });
        catalog
    }

    fn diagnostic(&self) -> Option<String> {
        self.last_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::io::{Cursor, Write};

    const HEADER: &str = "Card Name,Fee,Min Income,Online Rate,Travel Rate,Dining Rate,Utility Rate,UPI Rate,Base Rate,Monthly Cap,Lounge Access,Reward Type,Status";

    fn parse(body: &str) -> CardCatalog {
        let csv = format!("{HEADER}\n{body}");
        CardCatalog::from_reader(Cursor::new(csv.into_bytes())).expect("catalog parses")
    }

    #[test]
    fn resolves_specialist_rate_defaults() {
        let catalog = parse("Plain Card,500,25000,5,2,,,,1.5,,No,Cashback,\n");
        let card = &catalog.cards()[0];

        assert_eq!(card.rates.utilities, dec!(1.5));
        assert_eq!(card.rates.upi, Decimal::ZERO);
        assert_eq!(card.rates.dining, Decimal::ZERO);
        assert_eq!(card.monthly_cap, None);
        assert!(!card.lounge_access);
        assert_eq!(card.details.pro_reason, "Great cashback rates.");
    }

    #[test]
    fn explicit_specialist_rates_win() {
        let catalog = parse("UPI Star,0,15000,1,1,1,0.5,2,1,750,Yes,Points,Hot\n");
        let card = &catalog.cards()[0];

        assert_eq!(card.rates.utilities, dec!(0.5));
        assert_eq!(card.rates.upi, dec!(2));
        assert_eq!(card.monthly_cap, Some(dec!(750)));
        assert!(card.lounge_access);
        assert_eq!(card.details.status, crate::domain::CardStatus::Hot);
    }

    #[test]
    fn clamps_out_of_range_values() {
        let catalog = parse("Odd Card,-10,-5,150,-2,,,,1,-100,No,,\n");
        let card = &catalog.cards()[0];

        assert_eq!(card.fee, Decimal::ZERO);
        assert_eq!(card.min_income, Decimal::ZERO);
        assert_eq!(card.rates.online, Decimal::ONE_HUNDRED);
        assert_eq!(card.rates.travel, Decimal::ZERO);
        assert_eq!(card.monthly_cap, Some(Decimal::ZERO));
    }

    #[test]
    fn oversized_amounts_are_capped_and_still_rank() {
        let catalog = parse(
            "Huge Fee,90000000000000000000000,0,5,5,,,,1,90000000000000000000000,No,,\n",
        );
        let card = &catalog.cards()[0];

        assert_eq!(card.fee, crate::domain::MAX_MONTHLY_AMOUNT);
        assert_eq!(card.monthly_cap, Some(crate::domain::MAX_MONTHLY_AMOUNT));

        let spend = crate::domain::SpendProfile {
            online: crate::domain::MAX_MONTHLY_AMOUNT,
            upi: crate::domain::MAX_MONTHLY_AMOUNT,
            ..Default::default()
        };
        let ranking = crate::ranking::rank_cards(catalog.cards(), &spend, Decimal::ZERO, false);
        assert_eq!(ranking.len(), 1);
    }

    #[test]
    fn skips_rows_without_name_or_fee_and_duplicates() {
        let catalog = parse(
            ",500,0,1,1,1,1,1,1,,No,,\n\
             No Fee,abc,0,1,1,1,1,1,1,,No,,\n\
             Keeper,0,0,1,1,1,1,1,1,,No,,\n\
             keeper ,99,0,1,1,1,1,1,1,,No,,\n",
        );

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.skipped_rows(), 3);
        assert_eq!(catalog.find("KEEPER").map(|card| card.fee), Some(Decimal::ZERO));
    }

    #[test]
    fn missing_required_column_is_reported() {
        let err = CardCatalog::from_reader(Cursor::new(b"Card Name,Base Rate\nA,1\n".to_vec()))
            .expect_err("fee column required");
        assert!(matches!(err, CatalogError::MissingColumn("Fee")));
    }

    #[test]
    fn missing_file_yields_empty_snapshot_with_diagnostic() {
        let dir = tempfile::tempdir().expect("temp dir");
        let provider = CsvCatalogProvider::new(dir.path().join("absent.csv"), Duration::ZERO);

        let snapshot = provider.snapshot();

        assert!(snapshot.is_empty());
        assert!(provider
            .last_error()
            .expect("diagnostic recorded")
            .contains("failed to read card catalog"));
    }

    #[test]
    fn snapshot_reused_within_refresh_interval() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "{HEADER}\nFirst,0,0,1,1,1,1,1,1,,No,,").expect("write catalog");
        let provider = CsvCatalogProvider::new(file.path(), Duration::from_secs(3600));

        let first = provider.snapshot();
        writeln!(file, "Second,0,0,1,1,1,1,1,1,,No,,").expect("append row");
        let second = provider.snapshot();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
        assert!(provider.last_error().is_none());
    }

    #[test]
    fn snapshot_reloads_after_interval() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "{HEADER}\nFirst,0,0,1,1,1,1,1,1,,No,,").expect("write catalog");
        let provider = CsvCatalogProvider::new(file.path(), Duration::ZERO);

        let first = provider.snapshot();
        writeln!(file, "Second,0,0,1,1,1,1,1,1,,No,,").expect("append row");
        file.flush().expect("flush");
        let second = provider.snapshot();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(second.cards()[1].name, "Second");
    }
}
