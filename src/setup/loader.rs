//! Batched CSV to PostgreSQL loading.
//!
//! A file is read completely, split into fixed-size batches and each batch is
//! sent as one multi-row `INSERT .. ON CONFLICT (pk) DO NOTHING`. Batches run
//! sequentially on a single connection; the first failing batch aborts the
//! load and earlier batches stay committed.

use super::records::{CustomerRecord, FieldReader, LoadRecord};
use super::{LoadSummary, SetupError};
use csv_async::{AsyncReaderBuilder, StringRecord};
use rocket_db_pools::sqlx::{PgConnection, Postgres, QueryBuilder};
use std::path::Path;

/// Default number of rows per insert statement.
pub const BATCH_SIZE: usize = 1000;

/// PostgreSQL's limit on bind parameters in one statement.
pub const MAX_BIND_PARAMS: usize = u16::MAX as usize;

/// Largest batch that fits the parameter limit for the widest table.
pub const MAX_BATCH_SIZE: usize = MAX_BIND_PARAMS / CustomerRecord::COLUMNS.len();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Rows per insert statement, clamped per table to `1..=max_batch_size::<R>()`.
    pub batch_size: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
        }
    }
}

impl LoaderOptions {
    /// Batch size actually used for `R`.
    pub fn batch_size_for<R: LoadRecord>(&self) -> usize {
        self.batch_size.clamp(1, max_batch_size::<R>())
    }
}

/// Rows of `R` that fit in one statement.
pub fn max_batch_size<R: LoadRecord>() -> usize {
    MAX_BIND_PARAMS / R::COLUMNS.len()
}

/// Split `rows` into consecutive batches of at most `batch_size` rows.
pub fn partition<T>(rows: Vec<T>, batch_size: usize) -> Vec<Vec<T>> {
    let size = batch_size.max(1);
    let mut batches = Vec::with_capacity(rows.len().div_ceil(size));
    let mut rows = rows.into_iter().peekable();
    while rows.peek().is_some() {
        batches.push(rows.by_ref().take(size).collect());
    }
    batches
}

/// Rows parsed from one file plus how many of them needed coercion.
#[derive(Debug)]
pub struct ParsedFile<R> {
    pub records: Vec<R>,
    pub coerced_rows: usize,
}

/// Read every data row of `path` into typed records.
///
/// Columns are matched by header name, so their order in the file does not
/// matter and extra columns are ignored.
pub async fn read_records<R: LoadRecord>(path: &Path) -> Result<ParsedFile<R>, SetupError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| SetupError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let csv_error = |source: csv_async::Error| SetupError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = AsyncReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .create_reader(file);

    let headers = reader.headers().await.map_err(csv_error)?.clone();
    let indices = R::COLUMNS
        .iter()
        .map(|column| {
            headers
                .iter()
                .position(|header| header.trim() == *column)
                .ok_or_else(|| SetupError::MissingHeader {
                    path: path.to_path_buf(),
                    header: column.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut parsed = ParsedFile {
        records: Vec::new(),
        coerced_rows: 0,
    };
    let mut row = StringRecord::new();

    while reader.read_record(&mut row).await.map_err(csv_error)? {
        let values: Vec<&str> = indices
            .iter()
            .map(|&index| row.get(index).unwrap_or(""))
            .collect();
        let mut fields = FieldReader::new(R::COLUMNS, &values);
        let record = R::from_fields(&mut fields);
        if fields.coerced() {
            parsed.coerced_rows += 1;
        }
        parsed.records.push(record);
    }

    Ok(parsed)
}

/// Build the multi-row insert for one batch.
pub fn build_insert<R: LoadRecord>(batch: Vec<R>) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) ",
        R::TABLE,
        R::COLUMNS.join(", ")
    ));
    builder.push_values(batch, |mut row, record| record.push_binds(&mut row));
    builder.push(format!(" ON CONFLICT ({}) DO NOTHING", R::PRIMARY_KEY));
    builder
}

/// Load the CSV file at `path` into `R::TABLE`.
pub async fn load_csv<R: LoadRecord>(
    conn: &mut PgConnection,
    path: &Path,
    options: &LoaderOptions,
) -> Result<LoadSummary, SetupError> {
    log::info!("loading {} from {}", R::TABLE, path.display());

    let parsed = read_records::<R>(path).await?;
    let mut summary = LoadSummary::new(R::TABLE);
    summary.rows_read = parsed.records.len();
    summary.rows_with_coerced_fields = parsed.coerced_rows;

    let batch_size = options.batch_size_for::<R>();
    if batch_size != options.batch_size {
        log::warn!(
            "{}: batch size {} adjusted to {}",
            R::TABLE,
            options.batch_size,
            batch_size
        );
    }
    let batches = partition(parsed.records, batch_size);
    let total_batches = batches.len();

    for (index, batch) in batches.into_iter().enumerate() {
        let rows = batch.len();
        let result = build_insert(batch)
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|source| SetupError::Insert {
                table: R::TABLE,
                batch: index,
                source,
            })?;

        summary.record_batch(result.rows_affected());
        log::debug!(
            "{} batch {}/{}: {} of {} rows inserted",
            R::TABLE,
            index + 1,
            total_batches,
            result.rows_affected(),
            rows
        );
    }

    if summary.rows_with_coerced_fields > 0 {
        log::warn!(
            "{}: {} rows contained unparseable numbers stored as NULL",
            R::TABLE,
            summary.rows_with_coerced_fields
        );
    }
    log::info!("{summary}");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::records::OrderRecord;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn order(id: i32) -> OrderRecord {
        OrderRecord {
            order_id: Some(id),
            user_id: Some(1),
            status: "Complete".to_string(),
            gender: None,
            created_at: "2023-01-01 00:00:00+00:00".to_string(),
            returned_at: None,
            shipped_at: None,
            delivered_at: None,
            num_of_item: Some(1),
        }
    }

    #[test]
    fn partition_rounds_up() {
        let batches = partition((0..2500).collect(), 1000);
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![1000, 1000, 500]);

        assert_eq!(partition((0..1000).collect(), 1000).len(), 1);
        assert!(partition(Vec::<i32>::new(), 1000).is_empty());
        assert_eq!(partition((0..3).collect(), 0).len(), 3);
    }

    #[test]
    fn batch_size_stays_within_parameter_limit() {
        assert_eq!(MAX_BATCH_SIZE, 4369);
        assert_eq!(max_batch_size::<OrderRecord>(), 7281);

        let huge = LoaderOptions { batch_size: 100_000 };
        assert_eq!(huge.batch_size_for::<CustomerRecord>(), 4369);
        assert_eq!(huge.batch_size_for::<OrderRecord>(), 7281);
        assert_eq!(LoaderOptions { batch_size: 0 }.batch_size_for::<OrderRecord>(), 1);
        assert_eq!(LoaderOptions::default().batch_size_for::<CustomerRecord>(), 1000);
    }

    #[test]
    fn insert_statement_has_one_tuple_per_row() {
        let builder = build_insert(vec![order(1), order(2)]);
        let sql = builder.sql();

        assert!(sql.starts_with(
            "INSERT INTO orders (order_id, user_id, status, gender, created_at, returned_at, shipped_at, delivered_at, num_of_item) VALUES ("
        ));
        assert!(sql.contains("$5::timestamptz, $6::timestamptz"));
        assert!(sql.contains("$9), ($10"));
        assert!(sql.ends_with("$18) ON CONFLICT (order_id) DO NOTHING"));
    }

    #[test]
    fn customer_insert_casts_created_at() {
        let mut fields = FieldReader::new(CustomerRecord::COLUMNS, &[]);
        let record = CustomerRecord::from_fields(&mut fields);
        let builder = build_insert(vec![record.clone(), record]);

        assert!(builder.sql().contains("$15::timestamptz), ($16"));
        assert!(builder.sql().ends_with("ON CONFLICT (id) DO NOTHING"));
    }

    #[tokio::test]
    async fn reads_by_header_name_and_counts_coercions() {
        let file = csv_file(
            "num_of_item,order_id,user_id,status,gender,created_at,returned_at,shipped_at,delivered_at\n\
             2,10,1,Shipped,F,2023-01-01 00:00:00+00:00,,2023-01-02 00:00:00+00:00,\n\
             lots,11,1,Complete,M,2023-01-03 00:00:00+00:00,,,\n",
        );

        let parsed = read_records::<OrderRecord>(file.path()).await.unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.coerced_rows, 1);
        assert_eq!(parsed.records[0].order_id, Some(10));
        assert_eq!(parsed.records[0].num_of_item, Some(2));
        assert_eq!(parsed.records[1].num_of_item, None);
    }

    #[tokio::test]
    async fn missing_header_is_reported() {
        let file = csv_file("order_id,user_id\n1,1\n");
        let err = read_records::<OrderRecord>(file.path()).await.unwrap_err();
        assert!(matches!(
            err,
            SetupError::MissingHeader { ref header, .. } if header == "status"
        ));
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let err = read_records::<CustomerRecord>(Path::new("/nonexistent/users.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, SetupError::Read { .. }));
    }

    #[tokio::test]
    async fn quoted_fields_keep_embedded_commas() {
        let file = csv_file(
            "id,first_name,last_name,email,age,gender,state,street_address,postal_code,city,country,latitude,longitude,traffic_source,created_at\n\
             1,Ann,Lee,ann@example.com,30,F,CA,\"12 Main St, Apt 4\",90001,Los Angeles,United States,34.05,-118.24,Search,2023-01-01 00:00:00+00:00\n",
        );

        let parsed = read_records::<CustomerRecord>(file.path()).await.unwrap();
        assert_eq!(parsed.coerced_rows, 0);
        assert_eq!(
            parsed.records[0].street_address.as_deref(),
            Some("12 Main St, Apt 4")
        );
    }
}
