use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::model::{BookQuery, BookSortKey, Money, SortOrder};

/// ユーザー登録用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    /// 省略時は`customer`
    pub role: Option<String>,
}

/// 書籍一覧のクエリパラメータ
/// 例: `/books?domain=fiction&max_price=1500&sort_by=price&order=desc`
#[derive(Serialize, Deserialize, Default)]
pub struct BookSearchParams {
    pub domain: Option<String>,
    pub max_price: Option<i64>, // JPY
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl BookSearchParams {
    /// 検索条件に変換する
    /// 未知の並び替えキー・並び順、負の価格上限は`DomainError::InvalidValue`
    pub fn into_query(self) -> Result<BookQuery, DomainError> {
        let sort_by = match self.sort_by.as_deref() {
            Some(key) => BookSortKey::from_string(key)?,
            None => BookSortKey::default(),
        };
        let order = match self.order.as_deref() {
            Some(order) => SortOrder::from_string(order)?,
            None => SortOrder::default(),
        };
        BookQuery::new(self.domain, self.max_price.map(Money::jpy), sort_by, order)
    }
}

/// 書籍登録用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub domain: String,
    pub price: i64, // JPY
    #[serde(default)]
    pub stock_quantity: u32,
}

/// 書籍情報更新用のリクエストDTO（指定された項目のみ更新）
#[derive(Serialize, Deserialize, Default)]
pub struct ReviseBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub domain: Option<String>,
    pub price: Option<i64>,
}

/// 入荷用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct RestockRequest {
    pub quantity: u32,
}

/// 注文受付用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub book_id: Uuid,
    pub quantity: u32,
}

/// 注文ステータス変更用のリクエストDTO
/// ステータス文字列の検証はアプリケーション層で行う
#[derive(Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_book_request_defaults() {
        let request: CreateBookRequest =
            serde_json::from_str(r#"{"title":"草枕","author":"夏目漱石","price":800}"#).unwrap();

        assert_eq!(request.domain, "");
        assert_eq!(request.stock_quantity, 0);
    }

    #[test]
    fn test_place_order_request_rejects_negative_quantity() {
        let json = format!(r#"{{"book_id":"{}","quantity":-1}}"#, Uuid::new_v4());
        assert!(serde_json::from_str::<PlaceOrderRequest>(&json).is_err());
    }

    #[test]
    fn test_update_order_status_request_keeps_raw_status() {
        // 小文字のまま受け取り、拒否はアプリケーション層に任せる
        let request: UpdateOrderStatusRequest =
            serde_json::from_str(r#"{"status":"shipped"}"#).unwrap();
        assert_eq!(request.status, "shipped");
    }

    #[test]
    fn test_book_search_params_defaults_to_title_ascending() {
        let query = BookSearchParams::default().into_query().unwrap();
        assert_eq!(query, BookQuery::default());
        assert_eq!(query.sort_by(), BookSortKey::Title);
        assert_eq!(query.order(), SortOrder::Asc);
    }

    #[test]
    fn test_book_search_params_conversion() {
        let params = BookSearchParams {
            domain: Some("SF".to_string()),
            max_price: Some(1500),
            sort_by: Some("created_at".to_string()),
            order: Some("desc".to_string()),
        };
        let query = params.into_query().unwrap();
        assert_eq!(query.domain_pattern(), Some("sf".to_string()));
        assert_eq!(query.max_price(), Some(Money::jpy(1500)));
        assert_eq!(query.sort_by(), BookSortKey::CreatedAt);
        assert_eq!(query.order(), SortOrder::Desc);
    }

    #[test]
    fn test_book_search_params_reject_invalid_values() {
        for params in [
            BookSearchParams {
                sort_by: Some("stock_quantity".to_string()),
                ..Default::default()
            },
            BookSearchParams {
                order: Some("descending".to_string()),
                ..Default::default()
            },
            BookSearchParams {
                max_price: Some(-1),
                ..Default::default()
            },
        ] {
            assert!(matches!(
                params.into_query(),
                Err(DomainError::InvalidValue(_))
            ));
        }
    }

    #[test]
    fn test_revise_book_request_partial() {
        let request: ReviseBookRequest = serde_json::from_str(r#"{"price":1200}"#).unwrap();
        assert_eq!(request.price, Some(1200));
        assert!(request.title.is_none());
    }
}
