//! Pipeline stage, custom field and custom KPI repository

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    is_builtin_status, AccountScope, CustomField, CustomKpi, CustomKpiUpdate, FieldKind,
    PipelineStage,
};
use crate::util::{normalize_text_option, unix_millis_now};
use libsql::{params, Connection};

/// Trait for per-account customisation storage (async)
#[allow(async_fn_in_trait)]
pub trait CustomizationRepository {
    /// Stages ordered by position
    async fn list_stages(&self, scope: &AccountScope) -> Result<Vec<PipelineStage>>;

    /// Append a stage at the end of the pipeline
    async fn add_stage(&self, scope: &AccountScope, label: &str) -> Result<PipelineStage>;

    /// Remove a stage by label (case-insensitive)
    async fn remove_stage(&self, scope: &AccountScope, label: &str) -> Result<()>;

    /// Custom field definitions, oldest first
    async fn list_fields(&self, scope: &AccountScope) -> Result<Vec<CustomField>>;

    async fn add_field(&self, scope: &AccountScope, name: &str, kind: FieldKind)
        -> Result<CustomField>;

    /// Remove a field definition by name (case-insensitive)
    async fn remove_field(&self, scope: &AccountScope, name: &str) -> Result<()>;

    async fn list_kpis(&self, scope: &AccountScope) -> Result<Vec<CustomKpi>>;

    async fn add_kpi(
        &self,
        scope: &AccountScope,
        label: &str,
        color: &str,
        icon: &str,
    ) -> Result<CustomKpi>;

    async fn update_kpi(
        &self,
        scope: &AccountScope,
        id: &str,
        update: CustomKpiUpdate,
    ) -> Result<CustomKpi>;

    async fn remove_kpi(&self, scope: &AccountScope, id: &str) -> Result<()>;
}

/// libSQL implementation of `CustomizationRepository`
pub struct LibSqlCustomizationRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlCustomizationRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn required(value: &str, what: &str) -> Result<String> {
        normalize_text_option(Some(value.to_string()))
            .ok_or_else(|| Error::InvalidInput(format!("{what} cannot be empty")))
    }

    async fn get_kpi(&self, scope: &AccountScope, id: &str) -> Result<Option<CustomKpi>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, label, color, icon FROM custom_kpis WHERE account_scope = ? AND id = ?",
                params![scope.as_str(), id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(CustomKpi {
                id: row.get(0)?,
                label: row.get(1)?,
                color: row.get(2)?,
                icon: row.get(3)?,
            })),
            None => Ok(None),
        }
    }

    fn is_unique_violation(error: &libsql::Error) -> bool {
        error.to_string().contains("UNIQUE constraint failed")
    }
}

impl CustomizationRepository for LibSqlCustomizationRepository<'_> {
    async fn list_stages(&self, scope: &AccountScope) -> Result<Vec<PipelineStage>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, label, position FROM pipeline_stages
                 WHERE account_scope = ? ORDER BY position ASC",
                [scope.as_str()],
            )
            .await?;

        let mut stages = Vec::new();
        while let Some(row) = rows.next().await? {
            stages.push(PipelineStage {
                id: row.get(0)?,
                label: row.get(1)?,
                position: row.get(2)?,
            });
        }
        Ok(stages)
    }

    async fn add_stage(&self, scope: &AccountScope, label: &str) -> Result<PipelineStage> {
        let label = Self::required(label, "stage label")?;
        if is_builtin_status(&label) {
            return Err(Error::InvalidInput(format!(
                "'{label}' is a built-in status"
            )));
        }

        let mut rows = self
            .conn
            .query(
                "SELECT COALESCE(MAX(position), -1) + 1 FROM pipeline_stages WHERE account_scope = ?",
                [scope.as_str()],
            )
            .await?;
        let position: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };

        let stage = PipelineStage {
            id: Uuid::now_v7().to_string(),
            label,
            position,
        };
        let result = self
            .conn
            .execute(
                "INSERT INTO pipeline_stages (id, account_scope, label, position) VALUES (?, ?, ?, ?)",
                params![
                    stage.id.as_str(),
                    scope.as_str(),
                    stage.label.as_str(),
                    stage.position
                ],
            )
            .await;

        match result {
            Ok(_) => Ok(stage),
            Err(error) if Self::is_unique_violation(&error) => Err(Error::InvalidInput(format!(
                "stage '{}' already exists",
                stage.label
            ))),
            Err(error) => Err(error.into()),
        }
    }

    async fn remove_stage(&self, scope: &AccountScope, label: &str) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "DELETE FROM pipeline_stages WHERE account_scope = ? AND label = ?",
                params![scope.as_str(), label.trim()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("stage '{}'", label.trim())));
        }
        Ok(())
    }

    async fn list_fields(&self, scope: &AccountScope) -> Result<Vec<CustomField>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, kind FROM custom_fields
                 WHERE account_scope = ? ORDER BY created_at ASC, rowid ASC",
                [scope.as_str()],
            )
            .await?;

        let mut fields = Vec::new();
        while let Some(row) = rows.next().await? {
            let kind: String = row.get(2)?;
            fields.push(CustomField {
                id: row.get(0)?,
                name: row.get(1)?,
                kind: kind.parse().unwrap_or_default(),
            });
        }
        Ok(fields)
    }

    async fn add_field(
        &self,
        scope: &AccountScope,
        name: &str,
        kind: FieldKind,
    ) -> Result<CustomField> {
        let name = Self::required(name, "field name")?;
        let field = CustomField {
            id: Uuid::now_v7().to_string(),
            name,
            kind,
        };

        let result = self
            .conn
            .execute(
                "INSERT INTO custom_fields (id, account_scope, name, kind, created_at) VALUES (?, ?, ?, ?, ?)",
                params![
                    field.id.as_str(),
                    scope.as_str(),
                    field.name.as_str(),
                    kind.as_str(),
                    unix_millis_now()
                ],
            )
            .await;

        match result {
            Ok(_) => Ok(field),
            Err(error) if Self::is_unique_violation(&error) => Err(Error::InvalidInput(format!(
                "field '{}' already exists",
                field.name
            ))),
            Err(error) => Err(error.into()),
        }
    }

    async fn remove_field(&self, scope: &AccountScope, name: &str) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "DELETE FROM custom_fields WHERE account_scope = ? AND name = ?",
                params![scope.as_str(), name.trim()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("field '{}'", name.trim())));
        }
        Ok(())
    }

    async fn list_kpis(&self, scope: &AccountScope) -> Result<Vec<CustomKpi>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, label, color, icon FROM custom_kpis
                 WHERE account_scope = ? ORDER BY created_at ASC, rowid ASC",
                [scope.as_str()],
            )
            .await?;

        let mut kpis = Vec::new();
        while let Some(row) = rows.next().await? {
            kpis.push(CustomKpi {
                id: row.get(0)?,
                label: row.get(1)?,
                color: row.get(2)?,
                icon: row.get(3)?,
            });
        }
        Ok(kpis)
    }

    async fn add_kpi(
        &self,
        scope: &AccountScope,
        label: &str,
        color: &str,
        icon: &str,
    ) -> Result<CustomKpi> {
        let kpi = CustomKpi {
            id: Uuid::now_v7().to_string(),
            label: Self::required(label, "KPI label")?,
            color: color.trim().to_string(),
            icon: icon.trim().to_string(),
        };

        self.conn
            .execute(
                "INSERT INTO custom_kpis (id, account_scope, label, color, icon, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    kpi.id.as_str(),
                    scope.as_str(),
                    kpi.label.as_str(),
                    kpi.color.as_str(),
                    kpi.icon.as_str(),
                    unix_millis_now()
                ],
            )
            .await?;

        Ok(kpi)
    }

    async fn update_kpi(
        &self,
        scope: &AccountScope,
        id: &str,
        update: CustomKpiUpdate,
    ) -> Result<CustomKpi> {
        let mut kpi = self
            .get_kpi(scope, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("KPI {id}")))?;

        if let Some(label) = update.label {
            kpi.label = Self::required(&label, "KPI label")?;
        }
        if let Some(color) = update.color {
            kpi.color = color.trim().to_string();
        }
        if let Some(icon) = update.icon {
            kpi.icon = icon.trim().to_string();
        }

        self.conn
            .execute(
                "UPDATE custom_kpis SET label = ?, color = ?, icon = ? WHERE account_scope = ? AND id = ?",
                params![
                    kpi.label.as_str(),
                    kpi.color.as_str(),
                    kpi.icon.as_str(),
                    scope.as_str(),
                    id
                ],
            )
            .await?;

        Ok(kpi)
    }

    async fn remove_kpi(&self, scope: &AccountScope, id: &str) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "DELETE FROM custom_kpis WHERE account_scope = ? AND id = ?",
                params![scope.as_str(), id],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("KPI {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn scope() -> AccountScope {
        AccountScope::from_phone("9876543210").unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stages_append_in_order() {
        let db = setup().await;
        let repo = LibSqlCustomizationRepository::new(db.connection());

        repo.add_stage(&scope(), "Site Visit").await.unwrap();
        repo.add_stage(&scope(), "Negotiation").await.unwrap();

        let stages = repo.list_stages(&scope()).await.unwrap();
        let labels: Vec<&str> = stages.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Site Visit", "Negotiation"]);
        assert!(stages[0].position < stages[1].position);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stage_validation() {
        let db = setup().await;
        let repo = LibSqlCustomizationRepository::new(db.connection());

        assert!(repo.add_stage(&scope(), "deal done").await.is_err());
        assert!(repo.add_stage(&scope(), "  ").await.is_err());
        repo.add_stage(&scope(), "Site Visit").await.unwrap();
        assert!(matches!(
            repo.add_stage(&scope(), "site visit").await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_remove_stage_case_insensitive() {
        let db = setup().await;
        let repo = LibSqlCustomizationRepository::new(db.connection());

        repo.add_stage(&scope(), "Site Visit").await.unwrap();
        repo.remove_stage(&scope(), "SITE VISIT").await.unwrap();
        assert!(repo.list_stages(&scope()).await.unwrap().is_empty());
        assert!(matches!(
            repo.remove_stage(&scope(), "Site Visit").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fields_roundtrip() {
        let db = setup().await;
        let repo = LibSqlCustomizationRepository::new(db.connection());

        repo.add_field(&scope(), "Budget", FieldKind::Number)
            .await
            .unwrap();
        repo.add_field(&scope(), "Visit Date", FieldKind::Date)
            .await
            .unwrap();
        assert!(repo
            .add_field(&scope(), "budget", FieldKind::Text)
            .await
            .is_err());

        let fields = repo.list_fields(&scope()).await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].kind, FieldKind::Number);

        repo.remove_field(&scope(), "budget").await.unwrap();
        assert_eq!(repo.list_fields(&scope()).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_kpi_add_update_remove() {
        let db = setup().await;
        let repo = LibSqlCustomizationRepository::new(db.connection());

        let kpi = repo
            .add_kpi(&scope(), "Site Visit", "purple", "map")
            .await
            .unwrap();
        let updated = repo
            .update_kpi(
                &scope(),
                &kpi.id,
                CustomKpiUpdate {
                    color: Some("teal".into()),
                    ..CustomKpiUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.color, "teal");
        assert_eq!(updated.label, "Site Visit");
        assert_eq!(repo.list_kpis(&scope()).await.unwrap(), vec![updated]);

        repo.remove_kpi(&scope(), &kpi.id).await.unwrap();
        assert!(repo.list_kpis(&scope()).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_customisation_is_scoped() {
        let db = setup().await;
        let repo = LibSqlCustomizationRepository::new(db.connection());
        let other = AccountScope::from_phone("9123456780").unwrap();

        repo.add_stage(&scope(), "Site Visit").await.unwrap();
        repo.add_stage(&other, "Site Visit").await.unwrap();
        assert_eq!(repo.list_stages(&other).await.unwrap().len(), 1);
        assert!(repo.list_fields(&other).await.unwrap().is_empty());
    }
}
