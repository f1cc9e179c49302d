//! 書籍の在庫・注文ライフサイクル管理サービス
//!
//! 注文の受付（在庫予約と価格の記録）、管理者によるステータス遷移、
//! キャンセル時の在庫返却、配達完了時の売上記録をトランザクション単位で扱う。

pub mod adapter;
pub mod application;
pub mod domain;
