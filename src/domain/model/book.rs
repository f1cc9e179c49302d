use chrono::{DateTime, Utc};

use crate::domain::error::DomainError;
use crate::domain::model::{BookId, Money};

/// 書籍集約
/// カタログ情報と在庫数を保持する
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    id: BookId,
    title: String,
    author: String,
    domain: String,
    price: Money,
    stock_quantity: u32,
    created_at: DateTime<Utc>,
}

impl Book {
    /// 新しい書籍を作成
    ///
    /// # Arguments
    /// * `id` - 書籍ID
    /// * `title` - タイトル（空不可）
    /// * `author` - 著者（空不可）
    /// * `domain` - 分類（自由記述）
    /// * `price` - 価格（0以上）
    /// * `stock_quantity` - 在庫数
    pub fn new(
        id: BookId,
        title: String,
        author: String,
        domain: String,
        price: Money,
        stock_quantity: u32,
    ) -> Result<Self, DomainError> {
        Self::validate_details(&title, &author, price)?;
        Ok(Self {
            id,
            title,
            author,
            domain,
            price,
            stock_quantity,
            created_at: Utc::now(),
        })
    }

    /// データベースから取得したデータで書籍を再構築
    pub fn reconstruct(
        id: BookId,
        title: String,
        author: String,
        domain: String,
        price: Money,
        stock_quantity: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            author,
            domain,
            price,
            stock_quantity,
            created_at,
        }
    }

    fn validate_details(title: &str, author: &str, price: Money) -> Result<(), DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::InvalidValue("タイトルは空にできません".to_string()));
        }
        if author.trim().is_empty() {
            return Err(DomainError::InvalidValue("著者は空にできません".to_string()));
        }
        if price.amount() < 0 {
            return Err(DomainError::InvalidValue("価格は0以上である必要があります".to_string()));
        }
        Ok(())
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn stock_quantity(&self) -> u32 {
        self.stock_quantity
    }

    /// カタログへの登録日時
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// カタログ情報を更新する
    /// 在庫数はここでは変更しない（在庫の増減は予約・解放・入荷のみ）
    pub fn revise(
        &mut self,
        title: Option<String>,
        author: Option<String>,
        domain: Option<String>,
        price: Option<Money>,
    ) -> Result<(), DomainError> {
        let title = title.unwrap_or_else(|| self.title.clone());
        let author = author.unwrap_or_else(|| self.author.clone());
        let price = price.unwrap_or(self.price);
        Self::validate_details(&title, &author, price)?;

        self.title = title;
        self.author = author;
        if let Some(domain) = domain {
            self.domain = domain;
        }
        self.price = price;
        Ok(())
    }

    /// 在庫を予約する（注文受付時）
    ///
    /// # Returns
    /// * `Ok(())` - 予約成功
    /// * `Err(DomainError::InvalidQuantity)` - 数量が0
    /// * `Err(DomainError::InsufficientStock)` - 在庫不足
    pub fn reserve(&mut self, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        if !self.has_available_stock(quantity) {
            return Err(DomainError::InsufficientStock {
                requested: quantity,
                available: self.stock_quantity,
            });
        }
        self.stock_quantity -= quantity;
        Ok(())
    }

    /// 在庫を戻す（キャンセル時、入荷時）
    pub fn release(&mut self, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        self.stock_quantity = self
            .stock_quantity
            .checked_add(quantity)
            .ok_or(DomainError::StockOverflow)?;
        Ok(())
    }

    /// 指定された数量の在庫が利用可能かチェック
    pub fn has_available_stock(&self, quantity: u32) -> bool {
        self.stock_quantity >= quantity
    }
}
