use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;
use tracing::{debug, info};

use crate::storage::models::{PaperRecord, PaperRow, RecordQuery};
use crate::utils::PaperResult;

const SELECT_RECORDS: &str = r#"
    SELECT identifier, title, year, journal, authors, generated_at, summaries_json
    FROM summaries
    WHERE 1 = 1
"#;

/// 摘要存储句柄，每次操作单独获取连接
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// 打开（必要时创建）数据库文件并确保表结构存在
    pub async fn connect(path: &Path) -> PaperResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        info!("数据库连接成功: {}", path.display());

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    pub async fn init_schema(&self) -> PaperResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS summaries (
                identifier TEXT PRIMARY KEY,
                title TEXT,
                year INTEGER,
                journal TEXT,
                authors TEXT,
                generated_at TEXT NOT NULL,
                summaries_json TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("数据库表结构初始化完成");
        Ok(())
    }

    /// 写入记录；同一 identifier 的旧记录被整体替换
    pub async fn upsert(&self, record: &PaperRecord) -> PaperResult<()> {
        let row = PaperRow::try_from(record)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO summaries (identifier, title, year, journal, authors, generated_at, summaries_json)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(identifier) DO UPDATE SET
                title = excluded.title,
                year = excluded.year,
                journal = excluded.journal,
                authors = excluded.authors,
                generated_at = excluded.generated_at,
                summaries_json = excluded.summaries_json
            "#,
        )
        .bind(&row.identifier)
        .bind(&row.title)
        .bind(row.year)
        .bind(&row.journal)
        .bind(&row.authors)
        .bind(&row.generated_at)
        .bind(&row.summaries_json)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        info!("记录已保存: {}", record.identifier);
        Ok(())
    }

    pub async fn get(&self, identifier: &str) -> PaperResult<Option<PaperRecord>> {
        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_RECORDS);
        builder.push(" AND identifier = ").push_bind(identifier);

        let row: Option<PaperRow> = builder
            .build_query_as::<PaperRow>()
            .fetch_optional(&self.pool)
            .await?;

        row.map(PaperRecord::try_from).transpose()
    }

    /// 年份、期刊精确过滤，关键词在任一章节摘要中做不区分大小写的子串匹配；条件之间为 AND
    pub async fn query(&self, filter: &RecordQuery) -> PaperResult<Vec<PaperRecord>> {
        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_RECORDS);
        if let Some(year) = filter.year {
            builder.push(" AND year = ").push_bind(year);
        }
        if let Some(journal) = &filter.journal {
            builder.push(" AND journal = ").push_bind(journal.as_str());
        }
        builder.push(" ORDER BY generated_at DESC, identifier");

        let rows: Vec<PaperRow> = builder
            .build_query_as::<PaperRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let record = PaperRecord::try_from(row)?;
            let keep = match filter.keyword.as_deref() {
                Some(keyword) if !keyword.is_empty() => record.matches_keyword(keyword),
                _ => true,
            };
            if keep {
                records.push(record);
            }
        }

        debug!("查询到 {} 条记录", records.len());
        Ok(records)
    }

    pub async fn distinct_years(&self) -> PaperResult<Vec<i32>> {
        let years = sqlx::query_scalar::<_, i32>(
            "SELECT DISTINCT year FROM summaries WHERE year IS NOT NULL ORDER BY year DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(years)
    }

    pub async fn distinct_journals(&self) -> PaperResult<Vec<String>> {
        let journals = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT journal FROM summaries WHERE journal IS NOT NULL AND journal != '' ORDER BY journal",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(journals)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
