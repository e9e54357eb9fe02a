//! Statement execution
//!
//! # Execution Pipeline
//!
//! ```text
//! SELECT → unfold views → bind → legacy query → cache | remote → aggregate → sort → limit
//! DESC   → catalog columns
//! SHOW   → catalog tables
//! CREATE → catalog.add_view
//! ```

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use super::aggregate::aggregate;
use super::binder::{bind, BoundSelect};
use super::error::{QueryError, QueryResult};
use super::result::ResultSet;
use super::rewrite::rewrite;
use super::value::Cell;
use crate::cache::ReportCache;
use crate::catalog::{Catalog, CatalogField, CatalogTable};
use crate::hash::fnv64a;
use crate::query::{
    parse, CreateViewStatement, DescribeStatement, LikePattern, SelectStatement, ShowStatement,
    Statement, Terminator,
};
use crate::remote::ReportSource;

/// What a statement produced
#[derive(Debug)]
pub enum Outcome {
    Rows(ResultSet),
    /// CREATE VIEW stored a view under this name
    ViewStored(String),
}

/// Runs statements for one account against one catalog
pub struct Engine<C: Catalog> {
    catalog: C,
    source: Arc<dyn ReportSource>,
    cache: Option<Arc<dyn ReportCache>>,
    account_id: String,
    today: Option<NaiveDate>,
}

impl<C: Catalog> Engine<C> {
    pub fn new(catalog: C, source: Arc<dyn ReportSource>) -> Self {
        Self {
            catalog,
            source,
            cache: None,
            account_id: String::new(),
            today: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ReportCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Account the reports are downloaded for, part of every cache key
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = account_id.into();
        self
    }

    /// Pin the day DURING literals resolve against
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Parse and run exactly one statement
    pub async fn execute(&mut self, text: &str) -> QueryResult<Outcome> {
        let mut statements = parse(text)?;
        if statements.len() != 1 {
            return Err(QueryError::MultipleStatements(statements.len()));
        }
        let stmt = statements.remove(0);
        self.run(stmt).await
    }

    /// Run a parsed statement
    pub async fn run(&mut self, stmt: Statement) -> QueryResult<Outcome> {
        tracing::debug!(statement = %stmt, "Executing statement");
        match stmt {
            Statement::Select(select) => self.select(select).await.map(Outcome::Rows),
            Statement::Describe(describe) => self.describe(&describe).map(Outcome::Rows),
            Statement::Show(show) => self.show(&show).map(Outcome::Rows),
            Statement::CreateView(create) => self.create_view(&create).map(Outcome::ViewStored),
        }
    }

    /// Unfold views and bind a SELECT without running it
    pub fn prepare(&self, stmt: SelectStatement) -> QueryResult<BoundSelect> {
        let stmt = rewrite(&self.catalog, stmt, self.today())?;
        bind(&self.catalog, &stmt)
    }

    pub async fn select(&self, stmt: SelectStatement) -> QueryResult<ResultSet> {
        let bound = self.prepare(stmt)?;
        let query = bound.legacy_string();
        let records = self.fetch(&query).await?;

        let aggregated = aggregate(&bound, &records)?;
        let mut rs = ResultSet::with_widths(bound.labels(), aggregated.rows, aggregated.widths)
            .vertical(bound.vertical);
        rs.sort(&bound.order_by);
        if let Some(limit) = bound.limit {
            rs.paginate(limit);
        }
        Ok(rs)
    }

    /// Cache key of a reduced query for the current account
    pub fn cache_key(&self, query: &str) -> String {
        format!(
            "{}-{}",
            fnv64a(query.to_lowercase().as_bytes()),
            self.account_id
        )
    }

    async fn fetch(&self, query: &str) -> QueryResult<Vec<Vec<String>>> {
        let key = self.cache_key(query);
        if let Some(cache) = &self.cache {
            match cache.get(&key) {
                Ok(rows) => {
                    tracing::debug!(key = %key, rows = rows.len(), "Cache hit");
                    return Ok(rows);
                }
                Err(e) => tracing::debug!(key = %key, reason = %e, "Cache miss"),
            }
        }

        let rows = self.source.fetch(query).await?;
        if let Some(cache) = &self.cache {
            cache.set(key, rows.clone());
        }
        Ok(rows)
    }

    pub fn describe(&self, stmt: &DescribeStatement) -> QueryResult<ResultSet> {
        let table = self.catalog.table(&stmt.source)?;
        let fields: Vec<&CatalogField> = match &stmt.column {
            Some(column) => vec![self.catalog.field(&table.name, column)?],
            None => table.fields.iter().collect(),
        };

        let mut names = vec![
            "Field".to_string(),
            "Type".to_string(),
            "Key".to_string(),
            "Supports_Zero_Impressions".to_string(),
        ];
        if stmt.full {
            names.push("Enum".to_string());
            names.push("Not_compatible_with".to_string());
        }

        let rows = fields
            .into_iter()
            .map(|field| {
                let key = if field.segment {
                    "MUL"
                } else if field.label() == table.aggregate_field {
                    "PRI"
                } else {
                    ""
                };
                let zero = if field.zero_impressions { "YES" } else { "NO" };
                let mut row = vec![
                    Cell::text(field.label()),
                    Cell::text(field.kind.as_str()),
                    Cell::text(key),
                    Cell::text(zero),
                ];
                if stmt.full {
                    row.push(Cell::text(field.enum_values.join(", ")));
                    row.push(Cell::text(field.incompatible.join(", ")));
                }
                row
            })
            .collect();

        Ok(ResultSet::new(names, rows).vertical(stmt.terminator == Terminator::Vertical))
    }

    pub fn show(&self, stmt: &ShowStatement) -> QueryResult<ResultSet> {
        let mut tables: Vec<&CatalogTable> = match &stmt.like {
            Some(LikePattern::Equal(name)) => self.catalog.table(name).into_iter().collect(),
            Some(LikePattern::Prefix(p)) => self.catalog.tables_prefixed_by(p),
            Some(LikePattern::Suffix(p)) => self.catalog.tables_suffixed_by(p),
            Some(LikePattern::Contains(p)) => self.catalog.tables_containing(p),
            None => match &stmt.with {
                Some(column) => self.catalog.tables_with_column(column),
                None => self.catalog.tables()?,
            },
        };
        if let (Some(_), Some(column)) = (&stmt.like, &stmt.with) {
            tables.retain(|t| t.has_column(column));
        }

        let mut names = vec![format!("Tables_in_{}", self.catalog.version())];
        if stmt.full {
            names.push("Table_type".to_string());
        }
        let rows = tables
            .into_iter()
            .map(|table| {
                let mut row = vec![Cell::text(table.name.as_str())];
                if stmt.full {
                    row.push(Cell::text(if table.is_view() {
                        "VIEW"
                    } else {
                        "BASE TABLE"
                    }));
                }
                row
            })
            .collect();

        Ok(ResultSet::new(names, rows).vertical(stmt.terminator == Terminator::Vertical))
    }

    pub fn create_view(&mut self, stmt: &CreateViewStatement) -> QueryResult<String> {
        self.catalog.add_view(stmt)?;
        Ok(stmt.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, CacheResult};
    use crate::catalog::tests::sample_catalog;
    use crate::catalog::{CatalogError, MemoryCatalog};
    use crate::remote::{FetchError, FetchResult};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned rows and records the queries it received
    #[derive(Default)]
    struct FakeSource {
        reports: HashMap<String, Vec<Vec<String>>>,
        queries: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn with(mut self, query: &str, rows: &[&[&str]]) -> Self {
            self.reports.insert(
                query.to_string(),
                rows.iter()
                    .map(|r| r.iter().map(|v| v.to_string()).collect())
                    .collect(),
            );
            self
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReportSource for FakeSource {
        async fn fetch(&self, query: &str) -> FetchResult<Vec<Vec<String>>> {
            self.queries.lock().unwrap().push(query.to_string());
            self.reports
                .get(query)
                .cloned()
                .ok_or(FetchError::ServiceUnavailable(500))
        }
    }

    #[derive(Default)]
    struct MemoryCache {
        entries: Mutex<HashMap<String, Vec<Vec<String>>>>,
    }

    impl ReportCache for MemoryCache {
        fn get(&self, key: &str) -> CacheResult<Vec<Vec<String>>> {
            self.entries
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or(CacheError::Miss)
        }

        fn set(&self, key: String, rows: Vec<Vec<String>>) {
            self.entries.lock().unwrap().insert(key, rows);
        }
    }

    fn engine(source: FakeSource) -> (Engine<MemoryCatalog>, Arc<FakeSource>) {
        let source = Arc::new(source);
        let engine = Engine::new(sample_catalog(), source.clone())
            .with_account_id("123-456-7890")
            .with_today(NaiveDate::from_ymd_opt(2017, 9, 13).unwrap());
        (engine, source)
    }

    async fn rows(engine: &mut Engine<MemoryCatalog>, query: &str) -> Vec<Vec<String>> {
        match engine.execute(query).await.unwrap() {
            Outcome::Rows(rs) => rs
                .rows()
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
            other => panic!("expected rows, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_count_star() {
        let (mut engine, _) = engine(FakeSource::default().with(
            "SELECT CampaignId FROM CAMPAIGN_PERFORMANCE_REPORT",
            &[&["1"], &["2"], &["3"]],
        ));
        let result = rows(&mut engine, "SELECT COUNT(*) FROM CAMPAIGN_PERFORMANCE_REPORT").await;
        assert_eq!(result, vec![vec!["3"]]);
    }

    #[tokio::test]
    async fn test_group_sum_order_limit() {
        let (mut engine, source) = engine(FakeSource::default().with(
            "SELECT CampaignName, Ctr FROM CAMPAIGN_PERFORMANCE_REPORT DURING LAST_7_DAYS",
            &[&["a", "10"], &["b", "30"], &["a", "15"], &["c", "1"]],
        ));
        let result = rows(
            &mut engine,
            "SELECT CampaignName, SUM(Ctr) AS total FROM CAMPAIGN_PERFORMANCE_REPORT \
             DURING LAST_7_DAYS GROUP BY 1 ORDER BY 2 DESC LIMIT 2",
        )
        .await;
        assert_eq!(result, vec![vec!["b", "30.00"], vec!["a", "25.00"]]);
        assert_eq!(source.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_order_tie_break() {
        let (mut engine, _) = engine(FakeSource::default().with(
            "SELECT CampaignName, Clicks FROM CAMPAIGN_PERFORMANCE_REPORT",
            &[&["b", "1"], &["a", "1"], &["c", "2"]],
        ));
        let result = rows(
            &mut engine,
            "SELECT CampaignName, Clicks FROM CAMPAIGN_PERFORMANCE_REPORT ORDER BY 2 DESC, 1",
        )
        .await;
        assert_eq!(
            result,
            vec![vec!["c", "2"], vec!["a", "1"], vec!["b", "1"]]
        );
    }

    #[tokio::test]
    async fn test_limit_beyond_rows() {
        let data: Vec<Vec<String>> = (1..=12).map(|i| vec![i.to_string()]).collect();
        let data: Vec<Vec<&str>> = data.iter().map(|r| r.iter().map(String::as_str).collect()).collect();
        let data: Vec<&[&str]> = data.iter().map(Vec::as_slice).collect();
        let (mut engine, _) = engine(FakeSource::default().with(
            "SELECT Clicks FROM CAMPAIGN_PERFORMANCE_REPORT",
            &data,
        ));
        let result = rows(
            &mut engine,
            "SELECT Clicks FROM CAMPAIGN_PERFORMANCE_REPORT LIMIT 10, 5",
        )
        .await;
        assert_eq!(result, vec![vec!["11"], vec!["12"]]);
    }

    #[tokio::test]
    async fn test_cache_then_remote() {
        let (engine, source) = engine(FakeSource::default().with(
            "SELECT CampaignName FROM CAMPAIGN_PERFORMANCE_REPORT",
            &[&["a"]],
        ));
        let cache = Arc::new(MemoryCache::default());
        let mut engine = engine.with_cache(cache.clone());

        let query = "SELECT CampaignName FROM CAMPAIGN_PERFORMANCE_REPORT";
        assert_eq!(rows(&mut engine, query).await, vec![vec!["a"]]);
        assert_eq!(rows(&mut engine, query).await, vec![vec!["a"]]);
        assert_eq!(source.queries().len(), 1);

        let key = engine.cache_key(query);
        assert!(key.ends_with("-123-456-7890"));
        assert!(cache.get(&key).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_error_surfaces() {
        let (mut engine, _) = engine(FakeSource::default());
        let err = engine
            .execute("SELECT CampaignName FROM CAMPAIGN_PERFORMANCE_REPORT")
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Fetch(FetchError::ServiceUnavailable(500))));
    }

    #[tokio::test]
    async fn test_view_query() {
        let (mut engine, source) = engine(FakeSource::default().with(
            "SELECT CampaignName, Clicks FROM CAMPAIGN_PERFORMANCE_REPORT WHERE CampaignStatus = ENABLED",
            &[&["a", "3"], &["a", "4"], &["b", "1"]],
        ));

        let outcome = engine
            .execute(
                "CREATE VIEW clicks (Name, Total) AS SELECT CampaignName, SUM(Clicks) \
                 FROM CAMPAIGN_PERFORMANCE_REPORT WHERE CampaignStatus = ENABLED GROUP BY 1",
            )
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::ViewStored(name) if name == "clicks"));

        let result = rows(&mut engine, "SELECT Name, Total FROM clicks ORDER BY 2").await;
        assert_eq!(result, vec![vec!["b", "1"], vec!["a", "7"]]);
        assert_eq!(
            source.queries(),
            vec!["SELECT CampaignName, Clicks FROM CAMPAIGN_PERFORMANCE_REPORT WHERE CampaignStatus = ENABLED"]
        );

        let err = engine
            .execute("SELECT Name FROM clicks WHERE CampaignStatus = PAUSED")
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Catalog(CatalogError::UnknownColumn { .. })));

        let err = engine
            .execute("SELECT Name FROM clicks WHERE Name = \"x\"")
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_view_refilter_out_of_scope() {
        let (mut engine, _) = engine(FakeSource::default());
        engine
            .execute(
                "CREATE VIEW busy AS SELECT CampaignName, Clicks FROM CAMPAIGN_PERFORMANCE_REPORT \
                 WHERE Clicks > 100",
            )
            .await
            .unwrap();
        let err = engine
            .execute("SELECT CampaignName FROM busy WHERE Clicks > 10")
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::OutOfScope(_)));
    }

    #[tokio::test]
    async fn test_describe() {
        let (mut engine, _) = engine(FakeSource::default());
        let result = rows(&mut engine, "DESC CAMPAIGN_PERFORMANCE_REPORT").await;
        assert_eq!(result.len(), 7);
        assert_eq!(result[0], vec!["CampaignId", "LONG", "MUL", "NO"]);
        assert_eq!(result[4], vec!["Cost", "MONEY", "", "YES"]);

        let result = rows(&mut engine, "DESC FULL CAMPAIGN_PERFORMANCE_REPORT CampaignStatus").await;
        assert_eq!(
            result,
            vec![vec!["CampaignStatus", "STRING", "", "NO", "ENABLED, PAUSED, REMOVED", ""]]
        );

        let result = rows(&mut engine, "DESC ADGROUP_PERFORMANCE_REPORT AdGroupId").await;
        assert_eq!(result[0][2], "PRI");

        let err = engine
            .execute("DESC CAMPAIGN_PERFORMANCE_REPORT Nope")
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Catalog(CatalogError::UnknownColumn { .. })));
    }

    #[tokio::test]
    async fn test_show() {
        let (mut engine, _) = engine(FakeSource::default());
        engine
            .execute("CREATE VIEW CAMPAIGN_NAMES AS SELECT CampaignName FROM CAMPAIGN_PERFORMANCE_REPORT")
            .await
            .unwrap();

        match engine.execute("SHOW FULL TABLES LIKE 'CAMPAIGN%'").await.unwrap() {
            Outcome::Rows(rs) => {
                assert_eq!(rs.column_names(), vec!["Tables_in_v201809", "Table_type"]);
                let rendered: Vec<String> = rs.rows().iter().map(|r| r[1].to_string()).collect();
                assert_eq!(rendered, vec!["BASE TABLE", "VIEW"]);
            }
            other => panic!("expected rows, got {:?}", other),
        }

        assert_eq!(
            rows(&mut engine, "SHOW TABLES LIKE 'ADGROUP_PERFORMANCE_REPORT'").await,
            vec![vec!["ADGROUP_PERFORMANCE_REPORT"]]
        );
        assert!(rows(&mut engine, "SHOW TABLES LIKE 'NOPE'").await.is_empty());
        assert_eq!(rows(&mut engine, "SHOW TABLES LIKE '%GROUP%'").await.len(), 1);
        assert_eq!(rows(&mut engine, "SHOW TABLES WITH Impressions").await.len(), 1);
        assert_eq!(rows(&mut engine, "SHOW TABLES").await.len(), 3);
        assert_eq!(
            rows(&mut engine, "SHOW TABLES LIKE '%REPORT' WITH CampaignName").await,
            vec![vec!["CAMPAIGN_PERFORMANCE_REPORT"]]
        );
    }

    #[tokio::test]
    async fn test_single_statement_only() {
        let (mut engine, _) = engine(FakeSource::default());
        let err = engine
            .execute("SHOW TABLES; SHOW FULL TABLES;")
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::MultipleStatements(2)));

        let err = engine.execute("SELEC foo").await.unwrap_err();
        assert!(matches!(err, QueryError::Parse(_)));
    }
}
