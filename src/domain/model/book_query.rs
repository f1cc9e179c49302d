use std::cmp::Ordering;

use crate::domain::error::DomainError;
use crate::domain::model::{Book, Money};

/// 書籍一覧の並び替えキー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookSortKey {
    Id,
    Price,
    #[default]
    Title,
    CreatedAt,
}

impl BookSortKey {
    pub const ALL: [BookSortKey; 4] = [
        BookSortKey::Id,
        BookSortKey::Price,
        BookSortKey::Title,
        BookSortKey::CreatedAt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookSortKey::Id => "id",
            BookSortKey::Price => "price",
            BookSortKey::Title => "title",
            BookSortKey::CreatedAt => "created_at",
        }
    }

    /// 文字列から並び替えキーを作成（小文字の正規表記のみ）
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| {
                DomainError::InvalidValue(format!(
                    "並び替えキーが不正です: {} (id, price, title, created_at のいずれか)",
                    s
                ))
            })
    }

    fn compare(&self, a: &Book, b: &Book) -> Ordering {
        match self {
            BookSortKey::Id => a.id().to_string().cmp(&b.id().to_string()),
            BookSortKey::Price => a.price().amount().cmp(&b.price().amount()),
            BookSortKey::Title => a.title().cmp(b.title()),
            BookSortKey::CreatedAt => a.created_at().cmp(&b.created_at()),
        }
    }
}

/// 並び順
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(DomainError::InvalidValue(format!(
                "並び順が不正です: {} (asc または desc)",
                s
            ))),
        }
    }
}

/// 書籍一覧の検索条件
///
/// 分類は大文字小文字を区別しない部分一致、価格は上限以下で絞り込む。
/// 並び替えキーが同じ書籍同士は書籍IDの昇順に並べる。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookQuery {
    domain: Option<String>,
    max_price: Option<Money>,
    sort_by: BookSortKey,
    order: SortOrder,
}

impl BookQuery {
    /// 検索条件を作成
    /// 空の分類は絞り込みなしとして扱う
    ///
    /// # Returns
    /// * `Err(DomainError::InvalidValue)` - 価格の上限が負
    pub fn new(
        domain: Option<String>,
        max_price: Option<Money>,
        sort_by: BookSortKey,
        order: SortOrder,
    ) -> Result<Self, DomainError> {
        if let Some(price) = max_price {
            if price.amount() < 0 {
                return Err(DomainError::InvalidValue(
                    "価格の上限は0以上である必要があります".to_string(),
                ));
            }
        }

        Ok(Self {
            domain: domain.filter(|d| !d.is_empty()),
            max_price,
            sort_by,
            order,
        })
    }

    /// 分類の絞り込み（小文字化済み）
    pub fn domain_pattern(&self) -> Option<String> {
        self.domain.as_ref().map(|d| d.to_lowercase())
    }

    pub fn max_price(&self) -> Option<Money> {
        self.max_price
    }

    pub fn sort_by(&self) -> BookSortKey {
        self.sort_by
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// 書籍が検索条件に一致するか
    pub fn matches(&self, book: &Book) -> bool {
        let domain_matches = match self.domain_pattern() {
            Some(pattern) => book.domain().to_lowercase().contains(&pattern),
            None => true,
        };
        let price_matches = match self.max_price {
            Some(max) => book.price().amount() <= max.amount(),
            None => true,
        };
        domain_matches && price_matches
    }

    /// 条件に一致する書籍を絞り込み、並び替える
    pub fn apply<I>(&self, books: I) -> Vec<Book>
    where
        I: IntoIterator<Item = Book>,
    {
        let mut matched: Vec<Book> = books.into_iter().filter(|book| self.matches(book)).collect();
        matched.sort_by(|a, b| {
            let primary = self.sort_by.compare(a, b);
            let primary = match self.order {
                SortOrder::Asc => primary,
                SortOrder::Desc => primary.reverse(),
            };
            primary.then_with(|| BookSortKey::Id.compare(a, b))
        });
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::BookId;
    use chrono::{Duration, Utc};

    fn book(title: &str, domain: &str, price: i64, age_days: i64) -> Book {
        Book::reconstruct(
            BookId::new(),
            title.to_string(),
            "著者".to_string(),
            domain.to_string(),
            Money::jpy(price),
            1,
            Utc::now() - Duration::days(age_days),
        )
    }

    fn titles(books: &[Book]) -> Vec<&str> {
        books.iter().map(|book| book.title()).collect()
    }

    #[test]
    fn test_default_query_sorts_by_title() {
        let books = vec![book("こころ", "文学", 500, 0), book("か", "文学", 300, 1)];
        let result = BookQuery::default().apply(books);
        assert_eq!(titles(&result), vec!["か", "こころ"]);
    }

    #[test]
    fn test_domain_filter_is_case_insensitive_substring() {
        let query = BookQuery::new(
            Some("fiction".to_string()),
            None,
            BookSortKey::Title,
            SortOrder::Asc,
        )
        .unwrap();

        assert!(query.matches(&book("A", "Science Fiction", 100, 0)));
        assert!(query.matches(&book("B", "FICTION", 100, 0)));
        assert!(!query.matches(&book("C", "History", 100, 0)));
    }

    #[test]
    fn test_max_price_is_inclusive() {
        let query = BookQuery::new(None, Some(Money::jpy(500)), BookSortKey::Price, SortOrder::Asc)
            .unwrap();

        assert!(query.matches(&book("A", "", 500, 0)));
        assert!(!query.matches(&book("B", "", 501, 0)));
    }

    #[test]
    fn test_negative_max_price_is_rejected() {
        let result = BookQuery::new(None, Some(Money::jpy(-1)), BookSortKey::Id, SortOrder::Asc);
        assert!(matches!(result, Err(DomainError::InvalidValue(_))));
    }

    #[test]
    fn test_empty_domain_means_no_filter() {
        let query =
            BookQuery::new(Some(String::new()), None, BookSortKey::Title, SortOrder::Asc).unwrap();
        assert_eq!(query.domain_pattern(), None);
    }

    #[test]
    fn test_sort_by_created_at_desc() {
        let books = vec![
            book("古い", "", 100, 10),
            book("新しい", "", 100, 0),
            book("中間", "", 100, 5),
        ];
        let query =
            BookQuery::new(None, None, BookSortKey::CreatedAt, SortOrder::Desc).unwrap();
        assert_eq!(titles(&query.apply(books)), vec!["新しい", "中間", "古い"]);
    }

    #[test]
    fn test_sort_by_price_desc() {
        let books = vec![
            book("安い", "", 100, 0),
            book("高い", "", 900, 0),
            book("普通", "", 500, 0),
        ];
        let query = BookQuery::new(None, None, BookSortKey::Price, SortOrder::Desc).unwrap();
        assert_eq!(titles(&query.apply(books)), vec!["高い", "普通", "安い"]);
    }

    #[test]
    fn test_parse_sort_key_and_order() {
        assert_eq!(BookSortKey::from_string("created_at"), Ok(BookSortKey::CreatedAt));
        assert!(BookSortKey::from_string("stock").is_err());
        assert!(BookSortKey::from_string("PRICE").is_err());
        assert_eq!(SortOrder::from_string("desc"), Ok(SortOrder::Desc));
        assert!(SortOrder::from_string("down").is_err());
    }
}
