use crate::error::AppError;
use crate::search::{IndexSpec, SearchIndex};
use chrono::{Local, NaiveDate};

/// `"{base}-{YYMMDD}"`.
pub fn generate_index_name(base: &str, date: NaiveDate) -> String {
    format!("{}-{}", base, date.format("%y%m%d"))
}

/// Creates a catalog index and makes it the write index of `alias`, demoting
/// `current_write_index` if given. Returns the name of the created index.
pub async fn create_catalog_index(
    search: &dyn SearchIndex,
    alias: &str,
    name_override: Option<&str>,
    current_write_index: Option<&str>,
) -> Result<String, AppError> {
    let name = match name_override {
        Some(name) => name.to_string(),
        None => generate_index_name(alias, Local::now().date_naive()),
    };
    if name == alias {
        return Err(AppError::Generic(format!(
            "index name {:?} cannot be the alias it is bound to",
            name
        )));
    }

    search
        .create_index(&IndexSpec {
            name: name.clone(),
            alias: Some(alias.to_string()),
            is_write_index: true,
            current_write_index: current_write_index.map(str::to_string),
        })
        .await?;
    log::info!("Index '{}' is now the write index for alias '{}'", name, alias);
    Ok(name)
}

pub async fn delete_index(search: &dyn SearchIndex, name: &str) -> Result<bool, AppError> {
    let acknowledged = search.delete_index(name).await?;
    if !acknowledged {
        log::warn!("Deletion of index '{}' was not acknowledged", name);
    }
    Ok(acknowledged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search_clients::memory::MemorySearchIndex;

    #[test]
    fn index_name_uses_short_date() {
        let date = NaiveDate::from_ymd_opt(2020, 2, 5).unwrap();
        assert_eq!(generate_index_name("patate-db", date), "patate-db-200205");
    }

    #[tokio::test]
    async fn create_then_delete() {
        let search = MemorySearchIndex::new();
        let name = create_catalog_index(&search, "patate-db", Some("test_create_index"), None)
            .await
            .unwrap();
        assert_eq!(name, "test_create_index");
        assert_eq!(search.write_index_of("patate-db").as_deref(), Some("test_create_index"));
        assert!(delete_index(&search, &name).await.unwrap());
        assert!(search.alias_members("patate-db").is_empty());
    }

    #[tokio::test]
    async fn default_name_is_dated() {
        let search = MemorySearchIndex::new();
        let name = create_catalog_index(&search, "patate-db", None, None).await.unwrap();
        assert_eq!(name, generate_index_name("patate-db", Local::now().date_naive()));
    }

    #[tokio::test]
    async fn existing_index_is_a_conflict() {
        let search = MemorySearchIndex::new();
        create_catalog_index(&search, "db", Some("db-1"), None).await.unwrap();
        let err = create_catalog_index(&search, "db", Some("db-1"), None).await.unwrap_err();
        assert!(err.is_conflict());
    }
}
