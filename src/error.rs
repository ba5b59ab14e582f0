//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// エラーの責任区分
///
/// 呼び出し側（HTTP層など）がレスポンスの種類を決めるための分類です。
/// 入力ファイルの問題（400系）と内部障害（500系）の境界を保持します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 呼び出し側の入力に問題がある（再アップロードで回復可能）
    CallerInput,
    /// テンプレートや設定など、運用側の資産に問題がある
    Operator,
    /// 想定外の内部障害
    Internal,
}

/// xlsxofferクレート全体で使用するエラー型
///
/// # エラーの種類
///
/// - `EmptyExtraction`: スプレッドシートからポジションが1件も見つからない
/// - `MalformedContainer`: 入力がZIP/XLSXとして読めない
/// - `TemplateConfiguration`: テンプレートにデータテーブルがない
/// - `Unexpected`: その他の想定外の障害
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxoffer::{ConverterBuilder, ErrorClass, OfferError};
///
/// # fn main() -> Result<(), OfferError> {
/// let converter = ConverterBuilder::new().build()?;
/// let template = xlsxoffer::default_template()?;
/// match converter.convert(&[], &template) {
///     Err(e) if e.class() == ErrorClass::CallerInput => println!("400: {}", e),
///     Err(e) => println!("500: {}", e),
///     Ok(_) => {}
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum OfferError {
    /// スプレッドシートから1件のポジションも認識できなかった
    #[error("No positions were recognized in the spreadsheet")]
    EmptyExtraction,

    /// スプレッドシートのコンテナが不正
    ///
    /// ZIPアーカイブとして開けない、シートが読めないなどの場合に発生します。
    #[error("Malformed spreadsheet container: {0}")]
    MalformedContainer(String),

    /// テンプレート文書の構成が不正
    ///
    /// ヘッダーマーカーを持つテーブルがない、`word/document.xml`がない等。
    /// リクエスト単位ではなく、デプロイされた資産の問題を示します。
    #[error("Template configuration error: {0}")]
    TemplateConfiguration(String),

    /// 設定の検証に失敗したエラー
    ///
    /// `ConverterBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。
    #[error("Configuration error: {0}")]
    Config(String),

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb攻撃、パストラバーサル攻撃、ファイルサイズ制限などの
    /// セキュリティ制限に違反した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// I/O操作中に発生したエラー
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Excelファイルの解析中に発生したエラー（calamine由来）
    #[error("Failed to parse Excel file: {0}")]
    Parse(#[from] calamine::Error),

    /// XMLの読み書きエラー
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIPアーカイブの書き出しエラー
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// プレビューのJSONシリアライズエラー
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// その他の想定外のエラー
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl OfferError {
    /// エラーの責任区分を返す
    pub fn class(&self) -> ErrorClass {
        match self {
            OfferError::EmptyExtraction
            | OfferError::MalformedContainer(_)
            | OfferError::SecurityViolation(_)
            | OfferError::Parse(_) => ErrorClass::CallerInput,
            OfferError::TemplateConfiguration(_) | OfferError::Config(_) => ErrorClass::Operator,
            OfferError::Io(_)
            | OfferError::Xml(_)
            | OfferError::Zip(_)
            | OfferError::Json(_)
            | OfferError::Unexpected(_) => ErrorClass::Internal,
        }
    }
}

impl From<zip::result::ZipError> for OfferError {
    fn from(err: zip::result::ZipError) -> Self {
        OfferError::Zip(err.to_string())
    }
}
