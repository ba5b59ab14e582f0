//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

/// 画像の配置方式
///
/// 画像付きポジションをテンプレートのテーブルに書き込む方法を指定します。
/// 1回の変換ではすべてのポジションに同じ方式が適用されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ImageLayout {
    /// 名称セルのテキストの下に画像を追加（デフォルト）
    ///
    /// ```text
    /// | 1 | Poz. 1 okno   | 2 szt. | PCV, biały |
    /// |   | [image]       |        |            |
    /// ```
    BelowName,

    /// データ行の直後に全列を結合した行を追加し、そこに画像を配置
    ///
    /// ```text
    /// | 1 | Poz. 1 okno | 2 szt. | PCV, biały |
    /// |            [image]                    |
    /// ```
    MergedRow,
}

/// テンプレート行の扱い
///
/// データ行を生成する前に、テーブルのどの行を残すかを指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RowTemplate {
    /// ヘッダー行のみを残す（デフォルト）
    ///
    /// 新しい行はヘッダー行のセル構成を元に生成されます。
    HeaderOnly,

    /// ヘッダー行と書式見本行（2行目）を残す
    ///
    /// 1件目のポジションは見本行に書き込まれ、2件目以降は見本行の複製に
    /// 書き込まれます。ポジションが0件の場合は空の見本行が残ります。
    RetainStyleRow,
}

/// ポジションブロックの開始マーカー
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BlockMarker {
    /// 名称列のセルが指定の接頭辞で始まる行（デフォルト: `"Poz."`）
    Prefix(String),

    /// ラベル列のセルが指定のラベルと一致し、名称列が空でない行
    ///
    /// 例: `BlockMarker::Label("Nazwa:".to_string())`
    Label(String),
}

/// 日付の出力形式
///
/// テンプレートの日付プレースホルダーを置換する際の形式を指定します。
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DateFormat {
    /// 日.月.年（ゼロ埋め、デフォルト）
    ///
    /// 例: `05.03.2025`
    DayMonthYear,

    /// ISO 8601形式（YYYY-MM-DD）
    ///
    /// 例: `2025-03-05`
    Iso8601,

    /// カスタム形式（chrono互換フォーマット文字列）
    ///
    /// ```rust,no_run
    /// use xlsxoffer::{ConverterBuilder, DateFormat};
    ///
    /// # fn main() -> Result<(), xlsxoffer::OfferError> {
    /// let converter = ConverterBuilder::new()
    ///     .with_date_format(DateFormat::Custom("%d/%m/%Y".to_string()))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    Custom(String),
}

impl DateFormat {
    /// chrono互換のフォーマット文字列を返す
    pub(crate) fn pattern(&self) -> &str {
        match self {
            DateFormat::DayMonthYear => "%d.%m.%Y",
            DateFormat::Iso8601 => "%Y-%m-%d",
            DateFormat::Custom(s) => s,
        }
    }
}

/// 画像の表示幅
///
/// 画像は固定幅で配置され、高さは縦横比から決まります。
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub enum ImageWidth {
    /// 96 DPI換算のピクセル数（デフォルト: 500）
    Pixels(u32),

    /// センチメートル
    Centimeters(f64),
}

impl ImageWidth {
    /// EMU（English Metric Units, 1インチ = 914400 EMU）に変換
    pub(crate) fn to_emu(self) -> i64 {
        match self {
            ImageWidth::Pixels(px) => (px as f64 * 914_400.0 / 96.0).round() as i64,
            ImageWidth::Centimeters(cm) => (cm * 360_000.0).round() as i64,
        }
    }
}

/// シート選択方式
///
/// ポジションを読み取るシートを選択します。複数シートの変換は行いません。
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SheetSelector {
    /// インデックス指定（0始まり、デフォルト: 0）
    Index(usize),

    /// シート名指定
    ///
    /// 例: `SheetSelector::Name("Arkusz1".to_string())`
    Name(String),
}
