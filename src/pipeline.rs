use crate::config::HttpConfig;
use crate::error::{FetchError, Result, ScraperError};
use crate::normalize::{flatten, FlattenedTable};
use crate::session::HttpSession;
use crate::types::{CaseRecord, SearchCriteria, SiteAdapter};
use chrono::NaiveDate;
use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Outcome of collecting one county over a date range.
///
/// `records` empty with no `failures` and no `failed_days` means the court
/// genuinely had nothing on file, as opposed to a fetch problem.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub county: String,
    pub records: Vec<CaseRecord>,
    pub failures: Vec<FetchError>,
    /// Days whose results page could not be fetched or read
    pub failed_days: Vec<NaiveDate>,
}

impl BatchReport {
    pub fn is_zero_results(&self) -> bool {
        self.records.is_empty() && self.failures.is_empty() && self.failed_days.is_empty()
    }
}

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub counties: Vec<String>,
    pub total_records: usize,
    pub failed_cases: usize,
    pub errors: Vec<String>,
    pub output_files: Vec<String>,
}

/// Every day from `start` to `end`, both inclusive.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

pub struct Pipeline;

impl Pipeline {
    /// Collect every case filed in `start..=end` from one county court.
    ///
    /// The HTTP session lives exactly as long as this call.
    #[instrument(skip(adapter, http), fields(county = %adapter.county()))]
    pub async fn collect(
        adapter: &dyn SiteAdapter,
        http: &HttpConfig,
        run_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BatchReport> {
        if end < start {
            return Err(ScraperError::Config(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }

        let county = adapter.county();
        info!("🚀 Collecting {} from {} to {}", county, start, end);
        println!("🚀 Collecting {} county, {} to {}", county, start, end);
        counter!("probate_batches_total", "county" => county).increment(1);
        let t_batch = std::time::Instant::now();

        let session = HttpSession::open(http)?;
        let token = adapter.handshake(&session).await?;

        let mut report = BatchReport {
            run_id,
            county: county.to_string(),
            records: Vec::new(),
            failures: Vec::new(),
            failed_days: Vec::new(),
        };

        for day in days_between(start, end) {
            let criteria = SearchCriteria {
                filed_on: day,
                token: token.clone(),
            };
            if let Err(e) = Self::collect_day(adapter, &session, &criteria, &mut report).await {
                error!("Search for {} failed: {}", day, e);
                println!("❌ {}: {}", day, e);
                report.failed_days.push(day);
            }
        }

        session.close();

        counter!("probate_records_total", "county" => county).increment(report.records.len() as u64);
        counter!("probate_case_failures_total", "county" => county).increment(report.failures.len() as u64);
        histogram!("probate_batch_duration_seconds", "county" => county).record(t_batch.elapsed().as_secs_f64());

        info!(
            "✅ {}: {} records ({} failed cases, {} failed days)",
            county,
            report.records.len(),
            report.failures.len(),
            report.failed_days.len()
        );
        println!(
            "✅ {}: {} records ({} failed cases, {} failed days)",
            county,
            report.records.len(),
            report.failures.len(),
            report.failed_days.len()
        );
        Ok(report)
    }

    async fn collect_day(
        adapter: &dyn SiteAdapter,
        session: &HttpSession,
        criteria: &SearchCriteria,
        report: &mut BatchReport,
    ) -> Result<()> {
        info!("📡 Searching cases filed {}", criteria.filed_on);
        let page = adapter.fetch_page(session, criteria).await?;
        if adapter.has_next_page(&page) {
            warn!("Results for {} span several pages; only the first is read", criteria.filed_on);
        }
        let links = adapter.parse_page(&page)?;
        if links.is_empty() {
            info!("No cases filed {}", criteria.filed_on);
            return Ok(());
        }

        for (i, link) in links.iter().enumerate() {
            session.pause().await;
            let parsed = match adapter.fetch_case_page(session, link).await {
                Ok(case_page) => adapter.parse_case(&case_page),
                Err(e) => Err(e),
            };
            match parsed {
                Ok(record) => {
                    debug!("Parsed case {}/{}: {}", i + 1, links.len(), link.url);
                    report.records.push(record.with_county(adapter.county()));
                }
                Err(e) => {
                    warn!("Skipping {}: {}", link.url, e);
                    report.failures.push(FetchError::new(&link.url, e));
                }
            }
        }
        Ok(())
    }

    /// Collect every adapter in turn and flatten all records into one table.
    ///
    /// A county whose batch fails outright is reported in `errors` and left
    /// out; a join integrity fault aborts the whole run.
    #[instrument(skip(adapters, http))]
    pub async fn run(
        adapters: Vec<Box<dyn SiteAdapter>>,
        http: &HttpConfig,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(FlattenedTable, PipelineResult)> {
        let run_id = Uuid::new_v4();
        let mut table = FlattenedTable::default();
        let mut result = PipelineResult {
            run_id,
            counties: Vec::new(),
            total_records: 0,
            failed_cases: 0,
            errors: Vec::new(),
            output_files: Vec::new(),
        };

        for adapter in adapters {
            let county = adapter.county();
            match Self::collect(adapter.as_ref(), http, run_id, start, end).await {
                Ok(report) => {
                    if report.is_zero_results() {
                        info!("{} had no filings in range", county);
                    }
                    result.failed_cases += report.failures.len();
                    result
                        .errors
                        .extend(report.failures.iter().map(ToString::to_string));
                    result.total_records += report.records.len();
                    table.extend(flatten(&report.records)?);
                    result.counties.push(report.county);
                }
                Err(e) => {
                    error!("{} batch failed: {}", county, e);
                    println!("❌ {} failed: {}", county, e);
                    result.errors.push(format!("{}: {}", county, e));
                }
            }
        }

        Ok((table, result))
    }
}
