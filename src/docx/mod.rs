//! DOCX Module
//!
//! テンプレート文書（Office Open XML）の読み込み・編集・書き出しを行うモジュール群。
//!
//! - `xml`: quick-xmlのイベントから組み立てる要素ツリー
//! - `package`: ZIPパッケージ、リレーションシップ、コンテンツタイプ
//! - `table`: テーブル行・セルの操作
//! - `drawing`: インライン画像
//! - `template`: 組み込みテンプレート

pub(crate) mod drawing;
pub(crate) mod package;
pub(crate) mod table;
pub(crate) mod template;
pub(crate) mod xml;

pub use template::default_template;
