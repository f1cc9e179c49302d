use bookstore_order_lifecycle::domain::error::DomainError;
use bookstore_order_lifecycle::domain::model::{
    Book, BookId, Money, Order, OrderId, OrderStatus, UserId,
};
use proptest::prelude::*;

fn status_strategy() -> impl Strategy<Value = OrderStatus> {
    prop::sample::select(OrderStatus::ALL.to_vec())
}

fn book_with_stock(stock: u32, price: i64) -> Book {
    Book::new(
        BookId::new(),
        "虞美人草".to_string(),
        "夏目漱石".to_string(),
        "文学".to_string(),
        Money::jpy(price),
        stock,
    )
    .unwrap()
}

// ステータス遷移のプロパティベーステスト
proptest! {
    /// 任意の遷移要求の列に対し、成功するのは遷移表にある遷移だけ
    #[test]
    fn test_random_walk_follows_transition_table(
        requests in prop::collection::vec(status_strategy(), 1..20),
    ) {
        let mut book = book_with_stock(10, 100);
        let mut order = Order::place(OrderId::new(), UserId::new(), &mut book, 1).unwrap();

        for requested in requests {
            let before = order.status();
            let result = order.transition_to(requested);

            if before.can_transition_to(requested) {
                prop_assert!(result.is_ok());
                prop_assert_eq!(order.status(), requested);
            } else {
                prop_assert_eq!(
                    result,
                    Err(DomainError::IllegalTransition { from: before, to: requested })
                );
                prop_assert_eq!(order.status(), before);
            }
        }
    }

    /// 同じステータスへの遷移は常に拒否される
    #[test]
    fn test_no_op_transition_is_rejected(status in status_strategy()) {
        prop_assert!(!status.can_transition_to(status));
    }

    /// 終端状態からはどのステータスにも遷移できない
    #[test]
    fn test_terminal_states_are_immutable(
        terminal_is_delivered in any::<bool>(),
        requested in status_strategy(),
    ) {
        let mut book = book_with_stock(10, 100);
        let mut order = Order::place(OrderId::new(), UserId::new(), &mut book, 1).unwrap();
        let path: &[OrderStatus] = if terminal_is_delivered {
            &[OrderStatus::Confirmed, OrderStatus::Shipped, OrderStatus::Delivered]
        } else {
            &[OrderStatus::Cancelled]
        };
        for next in path {
            order.transition_to(*next).unwrap();
        }
        let terminal = order.status();
        prop_assert!(terminal.is_terminal());

        prop_assert!(order.transition_to(requested).is_err());
        prop_assert_eq!(order.status(), terminal);
    }

    /// ステータス文字列の解析は大文字の正規表記のみ受け付ける
    #[test]
    fn test_status_parsing_roundtrip_and_case_sensitivity(status in status_strategy()) {
        prop_assert_eq!(OrderStatus::from_string(status.as_str()), Ok(status));
        let lower = status.as_str().to_lowercase();
        prop_assert!(OrderStatus::from_string(&lower).is_err());
    }
}

// 在庫数のプロパティベーステスト
proptest! {
    /// 注文受付は在庫が足りる場合のみ成功し、在庫をちょうど数量分減らす
    #[test]
    fn test_placement_decrements_stock_exactly(
        stock in 0u32..1_000,
        quantity in 1u32..1_500,
    ) {
        let mut book = book_with_stock(stock, 100);
        let result = Order::place(OrderId::new(), UserId::new(), &mut book, quantity);

        if quantity <= stock {
            prop_assert!(result.is_ok());
            prop_assert_eq!(book.stock_quantity(), stock - quantity);
        } else {
            prop_assert_eq!(
                result.err(),
                Some(DomainError::InsufficientStock { requested: quantity, available: stock })
            );
            prop_assert_eq!(book.stock_quantity(), stock);
        }
    }

    /// 引当と戻しは可逆
    #[test]
    fn test_reserve_then_release_restores_stock(
        stock in 1u32..10_000,
        fraction in 0.0f64..1.0,
    ) {
        let quantity = ((f64::from(stock) * fraction) as u32).max(1);
        let mut book = book_with_stock(stock, 100);

        book.reserve(quantity).unwrap();
        book.release(quantity).unwrap();

        prop_assert_eq!(book.stock_quantity(), stock);
    }

    /// 購入時価格は注文後の価格変更の影響を受けない
    #[test]
    fn test_price_at_purchase_is_a_snapshot(
        price in 0i64..100_000,
        new_price in 0i64..100_000,
        quantity in 1u32..50,
    ) {
        let mut book = book_with_stock(100, price);
        let order = Order::place(OrderId::new(), UserId::new(), &mut book, quantity).unwrap();

        book.revise(None, None, None, Some(Money::jpy(new_price))).unwrap();

        prop_assert_eq!(order.price_at_purchase(), Money::jpy(price));
        prop_assert_eq!(order.total(), Ok(Money::jpy(price * i64::from(quantity))));
    }
}
