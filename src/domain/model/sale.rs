use chrono::NaiveDate;

use crate::domain::error::DomainError;
use crate::domain::model::{Book, BookId, Money, Order, OrderId, OrderStatus, SaleId};

/// 売上記録
/// 配達完了した注文ごとに一度だけ作成される追記専用のエントリ
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    id: SaleId,
    order_id: OrderId,
    book_id: BookId,
    quantity: u32,
    price_at_sale: Money,
    domain: String,
    sale_date: NaiveDate,
}

impl Sale {
    /// 配達完了した注文から売上記録を作成
    /// 価格は注文の購入時価格、分類は現時点の書籍の分類を写す
    pub fn record_delivery(
        id: SaleId,
        order: &Order,
        book: &Book,
        sale_date: NaiveDate,
    ) -> Result<Self, DomainError> {
        if order.status() != OrderStatus::Delivered {
            return Err(DomainError::InvalidValue(format!(
                "売上を記録できるのは配達完了の注文のみです: {}",
                order.status()
            )));
        }
        if order.book_id() != book.id() {
            return Err(DomainError::InvalidValue(format!(
                "注文の書籍IDと一致しません: {} != {}",
                order.book_id(),
                book.id()
            )));
        }

        Ok(Self {
            id,
            order_id: order.id(),
            book_id: book.id(),
            quantity: order.quantity(),
            price_at_sale: order.price_at_purchase(),
            domain: book.domain().to_string(),
            sale_date,
        })
    }

    /// データベースから取得したデータで売上記録を再構築
    pub fn reconstruct(
        id: SaleId,
        order_id: OrderId,
        book_id: BookId,
        quantity: u32,
        price_at_sale: Money,
        domain: String,
        sale_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            order_id,
            book_id,
            quantity,
            price_at_sale,
            domain,
            sale_date,
        }
    }

    pub fn id(&self) -> SaleId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn price_at_sale(&self) -> Money {
        self.price_at_sale
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn sale_date(&self) -> NaiveDate {
        self.sale_date
    }

    /// 売上金額（販売時価格 × 数量）
    pub fn revenue(&self) -> Result<Money, DomainError> {
        self.price_at_sale.multiply(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::UserId;

    fn delivered_order(book: &mut Book) -> Order {
        let mut order = Order::place(OrderId::new(), UserId::new(), book, 2).unwrap();
        order.transition_to(OrderStatus::Confirmed).unwrap();
        order.transition_to(OrderStatus::Shipped).unwrap();
        order.transition_to(OrderStatus::Delivered).unwrap();
        order
    }

    fn book() -> Book {
        Book::new(
            BookId::new(),
            "こころ".to_string(),
            "夏目漱石".to_string(),
            "文学".to_string(),
            Money::jpy(100),
            10,
        )
        .unwrap()
    }

    #[test]
    fn test_record_delivery_copies_order_price_and_book_domain() {
        let mut book = book();
        let order = delivered_order(&mut book);
        // 受付後の価格・分類変更
        book.revise(None, None, Some("古典".to_string()), Some(Money::jpy(500)))
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let sale = Sale::record_delivery(SaleId::new(), &order, &book, date).unwrap();

        assert_eq!(sale.order_id(), order.id());
        assert_eq!(sale.quantity(), 2);
        assert_eq!(sale.price_at_sale(), Money::jpy(100));
        assert_eq!(sale.domain(), "古典");
        assert_eq!(sale.sale_date(), date);
        assert_eq!(sale.revenue().unwrap().amount(), 200);
    }

    #[test]
    fn test_record_delivery_requires_delivered_order() {
        let mut book = book();
        let order = Order::place(OrderId::new(), UserId::new(), &mut book, 1).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert!(Sale::record_delivery(SaleId::new(), &order, &book, date).is_err());
    }

    #[test]
    fn test_record_delivery_requires_matching_book() {
        let mut book_a = book();
        let book_b = book();
        let order = delivered_order(&mut book_a);
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert!(Sale::record_delivery(SaleId::new(), &order, &book_b, date).is_err());
    }
}
