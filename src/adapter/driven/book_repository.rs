use crate::adapter::database_error::DatabaseError;
use crate::adapter::driven::mysql_row::{book_from_row, BOOK_COLUMNS};
use crate::domain::model::{Book, BookId, BookQuery, BookSortKey, SortOrder};
use crate::domain::port::{BookRepository, RepositoryError};
use async_trait::async_trait;

use sqlx::{MySql, Pool};

/// MySQL書籍リポジトリ
#[derive(Clone)]
pub struct MySqlBookRepository {
    pool: Pool<MySql>,
}

impl MySqlBookRepository {
    /// 新しいMySQL書籍リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for MySqlBookRepository {
    async fn save(&self, book: &Book) -> Result<(), RepositoryError> {
        // 既存行の在庫数は上書きしない
        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, domain, price_amount, price_currency, stock_quantity, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                title = VALUES(title),
                author = VALUES(author),
                domain = VALUES(domain),
                price_amount = VALUES(price_amount),
                price_currency = VALUES(price_currency)
            "#,
        )
        .bind(book.id().to_string())
        .bind(book.title())
        .bind(book.author())
        .bind(book.domain())
        .bind(book.price().amount())
        .bind(book.price().currency())
        .bind(book.stock_quantity())
        .bind(book.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("書籍の保存に失敗しました", e))
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS))
            .bind(book_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("書籍の取得に失敗しました", e))
            .map_err(RepositoryError::from)?;

        row.as_ref().map(book_from_row).transpose()
    }

    async fn search(&self, query: &BookQuery) -> Result<Vec<Book>, RepositoryError> {
        let domain_pattern = query
            .domain_pattern()
            .map(|pattern| format!("%{}%", escape_like(&pattern)));

        let mut conditions = Vec::new();
        if domain_pattern.is_some() {
            conditions.push("LOWER(domain) LIKE ?");
        }
        if query.max_price().is_some() {
            conditions.push("price_amount <= ?");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT {} FROM books {} ORDER BY {} {}, id ASC",
            BOOK_COLUMNS,
            where_clause,
            sort_column(query.sort_by()),
            sort_direction(query.order()),
        );

        let mut statement = sqlx::query(&sql);
        if let Some(pattern) = domain_pattern {
            statement = statement.bind(pattern);
        }
        if let Some(max_price) = query.max_price() {
            statement = statement.bind(max_price.amount());
        }

        let rows = statement
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("書籍一覧の取得に失敗しました", e))
            .map_err(RepositoryError::from)?;

        rows.iter().map(book_from_row).collect()
    }
}

// ORDER BY句に埋め込む列名は列挙値からのみ決まる
fn sort_column(key: BookSortKey) -> &'static str {
    match key {
        BookSortKey::Id => "id",
        BookSortKey::Price => "price_amount",
        BookSortKey::Title => "title",
        BookSortKey::CreatedAt => "created_at",
    }
}

fn sort_direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

/// LIKEのワイルドカードをエスケープする（MySQLの既定のエスケープ文字は`\`）
fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
