//! In-memory catalog
//!
//! Holds every report and view of one API version, loaded from and saved to
//! a JSON document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Catalog, CatalogError, CatalogField, CatalogResult, CatalogTable, ViewDefinition};
use crate::query::{CreateViewStatement, STAR};

/// Catalog backed by a vector of tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryCatalog {
    version: String,
    tables: Vec<CatalogTable>,
}

impl MemoryCatalog {
    pub fn new(version: impl Into<String>, tables: Vec<CatalogTable>) -> Self {
        Self {
            version: version.into(),
            tables,
        }
    }

    /// Parse a catalog document
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a catalog document from disk
    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|error| CatalogError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        let catalog = Self::from_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            tables = catalog.tables.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// Write the catalog document, views included
    pub fn save(&self, path: impl AsRef<Path>) -> CatalogResult<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|error| CatalogError::Io {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Build the table a CREATE VIEW statement describes
    fn compile_view(&self, stmt: &CreateViewStatement) -> CatalogResult<CatalogTable> {
        if let Ok(existing) = self.table(&stmt.name) {
            if !stmt.replace || !existing.is_view() {
                return Err(CatalogError::TableExists(stmt.name.clone()));
            }
        }

        let select = &stmt.select;
        let source = self.table(&select.source)?;

        if !stmt.columns.is_empty() && stmt.columns.len() != select.fields.len() {
            return Err(CatalogError::ColumnMismatch {
                expected: select.fields.len(),
                found: stmt.columns.len(),
            });
        }

        let mut fields = Vec::with_capacity(select.fields.len());
        for (i, field) in select.fields.iter().enumerate() {
            if field.is_star() {
                if !stmt.columns.is_empty() {
                    return Err(CatalogError::ColumnMismatch {
                        expected: source.fields.len(),
                        found: stmt.columns.len(),
                    });
                }
                fields.extend(source.fields.iter().map(|f| CatalogField {
                    name: f.label().to_string(),
                    alias: None,
                    method: None,
                    distinct: false,
                    ..f.clone()
                }));
                continue;
            }

            // COUNT(*) takes the metadata of the aggregate field
            let lookup = if field.name() == STAR {
                source.aggregate_field.as_str()
            } else {
                field.name()
            };
            let meta = source
                .field(lookup)
                .ok_or_else(|| CatalogError::UnknownColumn {
                    table: source.name.clone(),
                    column: field.name().to_string(),
                })?;

            let alias = stmt
                .columns
                .get(i)
                .cloned()
                .or_else(|| field.column.alias.clone())
                .filter(|alias| alias != field.name());

            fields.push(CatalogField {
                name: field.name().to_string(),
                alias,
                method: field.function.map(|f| f.as_str().to_string()),
                distinct: field.distinct,
                ..meta.clone()
            });
        }

        Ok(CatalogTable {
            name: stmt.name.clone(),
            aggregate_field: source.aggregate_field.clone(),
            fields,
            view: Some(ViewDefinition {
                source: source.name.clone(),
                primary_key: source.aggregate_field.clone(),
                conditions: select.conditions.clone(),
                during: select.during,
                group_by: select.group_by.clone(),
                order_by: select.order_by.clone(),
                limit: select.limit,
            }),
        })
    }
}

impl Catalog for MemoryCatalog {
    fn version(&self) -> &str {
        &self.version
    }

    fn table(&self, name: &str) -> CatalogResult<&CatalogTable> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| CatalogError::UnknownTable(name.to_string()))
    }

    fn tables(&self) -> CatalogResult<Vec<&CatalogTable>> {
        if self.tables.is_empty() {
            return Err(CatalogError::NoTable);
        }
        let (views, reports): (Vec<&CatalogTable>, Vec<&CatalogTable>) =
            self.tables.iter().partition(|t| t.is_view());
        Ok(reports.into_iter().chain(views).collect())
    }

    fn add_view(&mut self, stmt: &CreateViewStatement) -> CatalogResult<()> {
        let view = self.compile_view(stmt)?;
        match self.tables.iter().position(|t| t.name == view.name) {
            Some(idx) => self.tables[idx] = view,
            None => self.tables.push(view),
        }
        tracing::info!(view = %stmt.name, replace = stmt.replace, "Stored view");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::query::{parse_statement, Statement};

    pub(crate) fn sample_catalog() -> MemoryCatalog {
        let mut campaign_id = CatalogField::new("CampaignId", "LONG");
        campaign_id.segment = true;
        let mut status = CatalogField::new("CampaignStatus", "STRING");
        status.enum_values = vec!["ENABLED".into(), "PAUSED".into(), "REMOVED".into()];
        let mut cost = CatalogField::new("Cost", "MONEY");
        cost.zero_impressions = true;
        let mut date = CatalogField::new("Date", "DATE");
        date.segment = true;
        date.incompatible = vec!["HourOfDay".into()];

        MemoryCatalog::new(
            "v201809",
            vec![
                CatalogTable {
                    name: "CAMPAIGN_PERFORMANCE_REPORT".into(),
                    aggregate_field: "CampaignId".into(),
                    fields: vec![
                        campaign_id,
                        CatalogField::new("CampaignName", "STRING"),
                        status,
                        CatalogField::new("Clicks", "LONG"),
                        cost,
                        CatalogField::new("Ctr", "DOUBLE"),
                        date,
                    ],
                    view: None,
                },
                CatalogTable {
                    name: "ADGROUP_PERFORMANCE_REPORT".into(),
                    aggregate_field: "AdGroupId".into(),
                    fields: vec![
                        CatalogField::new("AdGroupId", "LONG"),
                        CatalogField::new("CampaignId", "LONG"),
                        CatalogField::new("Impressions", "LONG"),
                    ],
                    view: None,
                },
            ],
        )
    }

    fn create_view(query: &str) -> CreateViewStatement {
        match parse_statement(query).unwrap() {
            Statement::CreateView(stmt) => stmt,
            other => panic!("expected create view, got {:?}", other),
        }
    }

    #[test]
    fn test_table_lookup() {
        let catalog = sample_catalog();
        assert_eq!(
            catalog.table("CAMPAIGN_PERFORMANCE_REPORT").unwrap().aggregate_field,
            "CampaignId"
        );
        assert!(matches!(
            catalog.table("NOPE"),
            Err(CatalogError::UnknownTable(_))
        ));
        assert!(matches!(
            catalog.field("CAMPAIGN_PERFORMANCE_REPORT", "Nope"),
            Err(CatalogError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_table_patterns() {
        let catalog = sample_catalog();
        assert_eq!(catalog.tables_prefixed_by("CAMPAIGN").len(), 1);
        assert_eq!(catalog.tables_suffixed_by("_REPORT").len(), 2);
        assert_eq!(catalog.tables_containing("GROUP").len(), 1);
        assert_eq!(catalog.tables_with_column("CampaignId").len(), 2);
        assert!(catalog.tables_with_column("Nope").is_empty());
    }

    #[test]
    fn test_add_view_enriches_columns() {
        let mut catalog = sample_catalog();
        let stmt = create_view(
            "CREATE VIEW CAMPAIGN_COST (Name, Spent) AS SELECT CampaignName, SUM(Cost) \
             FROM CAMPAIGN_PERFORMANCE_REPORT WHERE CampaignStatus = ENABLED DURING LAST_7_DAYS \
             GROUP BY 1 ORDER BY 2 DESC LIMIT 10",
        );
        catalog.add_view(&stmt).unwrap();

        let view = catalog.table("CAMPAIGN_COST").unwrap();
        assert!(view.is_view());
        assert_eq!(view.aggregate_field, "CampaignId");
        assert_eq!(view.fields.len(), 2);

        let spent = view.field("Spent").unwrap();
        assert_eq!(spent.name, "Cost");
        assert_eq!(spent.kind, "MONEY");
        assert!(spent.zero_impressions);
        assert_eq!(spent.method.as_deref(), Some("SUM"));

        let definition = view.view.as_ref().unwrap();
        assert_eq!(definition.source, "CAMPAIGN_PERFORMANCE_REPORT");
        assert_eq!(definition.conditions.len(), 1);
        assert!(definition.during.is_some());
        assert_eq!(definition.group_by[0].position, 1);
        assert!(definition.order_by[0].desc);
        assert_eq!(definition.limit.map(|l| l.row_count), Some(10));
    }

    #[test]
    fn test_add_view_conflicts() {
        let mut catalog = sample_catalog();

        let over_report = create_view(
            "CREATE OR REPLACE VIEW CAMPAIGN_PERFORMANCE_REPORT AS SELECT CampaignName FROM ADGROUP_PERFORMANCE_REPORT",
        );
        assert!(matches!(
            catalog.add_view(&over_report),
            Err(CatalogError::TableExists(_))
        ));

        let first = create_view("CREATE VIEW v AS SELECT CampaignName FROM CAMPAIGN_PERFORMANCE_REPORT");
        catalog.add_view(&first).unwrap();
        assert!(matches!(
            catalog.add_view(&first),
            Err(CatalogError::TableExists(_))
        ));

        let replace = create_view(
            "CREATE OR REPLACE VIEW v AS SELECT CampaignName, Clicks FROM CAMPAIGN_PERFORMANCE_REPORT",
        );
        catalog.add_view(&replace).unwrap();
        let views: Vec<_> = catalog
            .tables()
            .unwrap()
            .into_iter()
            .filter(|t| t.is_view())
            .collect();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].fields.len(), 2);
    }

    #[test]
    fn test_add_view_unknown_source_or_column() {
        let mut catalog = sample_catalog();
        let stmt = create_view("CREATE VIEW v AS SELECT Id FROM NOPE");
        assert!(matches!(
            catalog.add_view(&stmt),
            Err(CatalogError::UnknownTable(_))
        ));
        let stmt = create_view("CREATE VIEW v AS SELECT Nope FROM CAMPAIGN_PERFORMANCE_REPORT");
        assert!(matches!(
            catalog.add_view(&stmt),
            Err(CatalogError::UnknownColumn { .. })
        ));
        assert!(catalog.table("v").is_err());
    }

    #[test]
    fn test_add_view_star_expands_source() {
        let mut catalog = sample_catalog();
        let stmt = create_view("CREATE VIEW everything AS SELECT * FROM ADGROUP_PERFORMANCE_REPORT");
        catalog.add_view(&stmt).unwrap();
        let view = catalog.table("everything").unwrap();
        let names: Vec<&str> = view.fields.iter().map(|f| f.label()).collect();
        assert_eq!(names, vec!["AdGroupId", "CampaignId", "Impressions"]);
    }

    #[test]
    fn test_json_round_trip() {
        let mut catalog = sample_catalog();
        let stmt = create_view("CREATE VIEW v AS SELECT CampaignName FROM CAMPAIGN_PERFORMANCE_REPORT DURING 20170101,20170131");
        catalog.add_view(&stmt).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        catalog.save(&path).unwrap();

        let loaded = MemoryCatalog::load(&path).unwrap();
        assert_eq!(loaded.version(), "v201809");
        assert_eq!(loaded.table("v").unwrap(), catalog.table("v").unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let err = MemoryCatalog::load("/nonexistent/catalog.json").unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
