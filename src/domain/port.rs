// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::model::{
    Book, BookId, BookQuery, Order, OrderId, OrderStatus, Sale, User, UserId,
};
use async_trait::async_trait;

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// 操作に失敗
    #[error("Operation failed: {0}")]
    OperationFailed(String),
    /// データの取得に失敗
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
    /// 競合する書き込み、または制約違反
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// 書籍リポジトリトレイト
/// カタログの読み取りと書籍情報の保存を抽象化する
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// 書籍を保存する
    /// 既存の書籍の場合、在庫数は更新しない（在庫は作業単位の`adjust_stock`でのみ変化する）
    async fn save(&self, book: &Book) -> Result<(), RepositoryError>;

    /// 書籍IDで書籍を検索する
    ///
    /// # Returns
    /// * `Ok(Some(Book))` - 書籍が見つかった
    /// * `Ok(None)` - 書籍が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>, RepositoryError>;

    /// 検索条件に一致する書籍を、条件の並び順で取得する
    async fn search(&self, query: &BookQuery) -> Result<Vec<Book>, RepositoryError>;
}

/// 注文リポジトリトレイト
/// 注文の読み取りを抽象化する（書き込みは作業単位を通す）
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 注文IDで注文を検索する
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// すべての注文を取得する
    /// 作成日時の降順で並べて返す
    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError>;

    /// 指定されたユーザーの注文を取得する
    /// 作成日時の降順で並べて返す
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;
}

/// 売上台帳トレイト（読み取り側）
#[async_trait]
pub trait SaleRepository: Send + Sync {
    /// すべての売上記録を取得する
    /// 販売日の降順で並べて返す
    async fn find_all(&self) -> Result<Vec<Sale>, RepositoryError>;
}

/// ユーザーリポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 新しいユーザーを保存する
    /// ユーザー名が重複する場合は`RepositoryError::Conflict`
    async fn save(&self, user: &User) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;
}

/// 作業単位
/// 1回の注文受付・ステータス遷移を1トランザクションとして扱う
///
/// `*_for_update`で読み取った行は`commit`または破棄まで他の作業単位から保護される。
/// `commit`せずに破棄した場合、すべての書き込みはロールバックされる。
#[async_trait]
pub trait UnitOfWork: Send {
    /// 書籍を排他的に取得する
    async fn find_book_for_update(&mut self, book_id: BookId)
        -> Result<Option<Book>, RepositoryError>;

    /// 在庫数を増減する
    /// 結果が負になる場合、または書籍が存在しない場合は失敗する
    async fn adjust_stock(&mut self, book_id: BookId, delta: i64) -> Result<(), RepositoryError>;

    /// 書籍を参照している未完了（非終端）の注文数を数える
    async fn count_open_orders_for_book(&mut self, book_id: BookId)
        -> Result<u64, RepositoryError>;

    /// 書籍のカタログ情報（タイトル・著者・分類・価格）を更新する
    /// 在庫数は変更しない
    async fn update_book_details(&mut self, book: &Book) -> Result<(), RepositoryError>;

    /// 書籍を削除する
    async fn delete_book(&mut self, book_id: BookId) -> Result<(), RepositoryError>;

    /// 注文を排他的に取得する
    async fn find_order_for_update(
        &mut self,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError>;

    /// 新しい注文を作成する
    async fn create_order(&mut self, order: &Order) -> Result<(), RepositoryError>;

    /// 注文ステータスを更新する
    async fn set_status(
        &mut self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError>;

    /// 売上記録を追記する
    /// 同じ注文の売上記録が既に存在する場合は`RepositoryError::Conflict`
    async fn append_sale(&mut self, sale: &Sale) -> Result<(), RepositoryError>;

    /// すべての書き込みを確定する
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// 作業単位を開始するファクトリ
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError>;
}
