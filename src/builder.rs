//! Builder Module
//!
//! Fluent Builder APIを提供し、`Converter`インスタンスを段階的に構築する。

use crate::api::{BlockMarker, DateFormat, ImageLayout, ImageWidth, RowTemplate, SheetSelector};
use crate::assembler::{AssemblyOptions, TemplateDocumentAssembler};
use crate::associate::associate;
use crate::error::OfferError;
use crate::parser::{MediaExtractor, RecordLayout, SheetRecordParser, WorkbookParser};
use crate::security::SecurityConfig;
use crate::types::Item;
use chrono::format::{Item as FormatItem, StrftimeItems};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::{Read, Seek, Write};
use std::path::Path;

/// 変換処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ConversionConfig {
    /// シート選択方式
    pub sheet_selector: SheetSelector,

    /// ポジションブロックのレイアウト
    pub layout: RecordLayout,

    /// 文書生成の設定
    pub assembly: AssemblyOptions,

    /// 日付形式
    pub date_format: DateFormat,

    /// 固定の日付（Noneの場合は変換時のローカル日付）
    pub date: Option<NaiveDate>,

    /// セキュリティ制限
    pub security: SecurityConfig,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            sheet_selector: SheetSelector::Index(0),
            layout: RecordLayout::default(),
            assembly: AssemblyOptions::default(),
            date_format: DateFormat::DayMonthYear,
            date: None,
            security: SecurityConfig::default(),
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Converter`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxoffer::{ConverterBuilder, ImageLayout, SheetSelector};
///
/// # fn main() -> Result<(), xlsxoffer::OfferError> {
/// let converter = ConverterBuilder::new()
///     .with_sheet_selector(SheetSelector::Index(0))
///     .with_image_layout(ImageLayout::MergedRow)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConverterBuilder {
    /// 内部設定（構築中）
    config: ConversionConfig,
}

impl Default for ConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - シート選択: 先頭シート
    /// - ブロック開始: G列が`"Poz."`で始まる行（ラベルはF列）
    /// - 数量ラベル: `"Ilość:"`、説明ラベル: `"Wypełnienia:"`, `"Opis:"`
    /// - ヘッダーマーカー: `"L.p."`
    /// - 日付: `{{DATA}}`を当日の`DD.MM.YYYY`で置換
    /// - 画像: 名称セルの下に幅500px
    /// - 行テンプレート: ヘッダー行のみ残す
    pub fn new() -> Self {
        Self {
            config: ConversionConfig::default(),
        }
    }

    /// ポジションを読み取るシートを選択する
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use xlsxoffer::{ConverterBuilder, SheetSelector};
    ///
    /// let builder = ConverterBuilder::new()
    ///     .with_sheet_selector(SheetSelector::Name("Arkusz1".to_string()));
    /// ```
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// ブロック開始マーカーを指定する
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use xlsxoffer::{BlockMarker, ConverterBuilder};
    ///
    /// // F列が"Nazwa:"でG列に名称がある行をブロック開始とする
    /// let builder = ConverterBuilder::new()
    ///     .with_block_marker(BlockMarker::Label("Nazwa:".to_string()));
    /// ```
    pub fn with_block_marker(mut self, marker: BlockMarker) -> Self {
        self.config.layout.marker = marker;
        self
    }

    /// ラベル列を指定する（0始まり）
    pub fn with_label_column(mut self, col: u32) -> Self {
        self.config.layout.label_col = col;
        self
    }

    /// 値・名称列を指定する（0始まり）
    pub fn with_value_column(mut self, col: u32) -> Self {
        self.config.layout.value_col = col;
        self
    }

    /// 1ブロックとして読み取る最大行数を指定する
    pub fn with_block_lookahead(mut self, rows: u32) -> Self {
        self.config.layout.block_lookahead = rows;
        self
    }

    /// 数量として扱うラベルを指定する
    pub fn with_quantity_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.layout.quantity_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// 説明として連結するラベルを指定する
    pub fn with_description_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.layout.description_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// フォールバック時の接頭辞列と説明列を指定する（0始まり）
    pub fn with_fallback_columns(mut self, marker_col: u32, description_col: u32) -> Self {
        self.config.layout.fallback_marker_col = marker_col;
        self.config.layout.fallback_description_col = description_col;
        self
    }

    /// テンプレートのデータテーブルを特定するヘッダーマーカーを指定する
    pub fn with_header_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.assembly.header_marker = marker.into();
        self
    }

    /// 日付プレースホルダーを指定する
    pub fn with_date_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.config.assembly.date_placeholder = placeholder.into();
        self
    }

    /// 日付形式を指定する
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use xlsxoffer::{ConverterBuilder, DateFormat};
    ///
    /// let builder = ConverterBuilder::new().with_date_format(DateFormat::Iso8601);
    /// ```
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.config.date_format = format;
        self
    }

    /// 変換時の日付の代わりに固定の日付を使用する
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.config.date = Some(date);
        self
    }

    /// 画像の配置方式を指定する
    pub fn with_image_layout(mut self, layout: ImageLayout) -> Self {
        self.config.assembly.image_layout = layout;
        self
    }

    /// テンプレート行の扱いを指定する
    pub fn with_row_template(mut self, template: RowTemplate) -> Self {
        self.config.assembly.row_template = template;
        self
    }

    /// 画像の表示幅を指定する
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use xlsxoffer::{ConverterBuilder, ImageWidth};
    ///
    /// let builder = ConverterBuilder::new().with_image_width(ImageWidth::Centimeters(12.0));
    /// ```
    pub fn with_image_width(mut self, width: ImageWidth) -> Self {
        self.config.assembly.image_width = width;
        self
    }

    /// 設定を検証し、`Converter`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Converter)` - 設定が有効な場合
    /// * `Err(OfferError::Config)` - 設定が無効な場合
    pub fn build(self) -> Result<Converter, OfferError> {
        let layout = &self.config.layout;
        let assembly = &self.config.assembly;

        // 1. マーカー・ラベルの検証
        let marker = match &layout.marker {
            BlockMarker::Prefix(s) | BlockMarker::Label(s) => s,
        };
        if marker.trim().is_empty() {
            return Err(OfferError::Config("Block marker must not be empty".to_string()));
        }
        if assembly.header_marker.trim().is_empty() {
            return Err(OfferError::Config("Header marker must not be empty".to_string()));
        }
        if assembly.date_placeholder.is_empty() {
            return Err(OfferError::Config(
                "Date placeholder must not be empty".to_string(),
            ));
        }
        for (kind, labels) in [
            ("quantity", &layout.quantity_labels),
            ("description", &layout.description_labels),
        ] {
            if labels.is_empty() || labels.iter().any(|l| l.trim().is_empty()) {
                return Err(OfferError::Config(format!(
                    "At least one non-empty {} label is required",
                    kind
                )));
            }
        }

        // 2. 列・行数の検証
        if layout.label_col == layout.value_col {
            return Err(OfferError::Config(format!(
                "Label and value columns must differ (both {})",
                layout.label_col
            )));
        }
        if layout.fallback_marker_col == layout.fallback_description_col {
            return Err(OfferError::Config(format!(
                "Fallback marker and description columns must differ (both {})",
                layout.fallback_marker_col
            )));
        }
        if layout.block_lookahead == 0 {
            return Err(OfferError::Config(
                "Block lookahead must be at least 1 row".to_string(),
            ));
        }

        // 3. 画像幅の検証
        let width_ok = match assembly.image_width {
            ImageWidth::Pixels(px) => px > 0,
            ImageWidth::Centimeters(cm) => cm.is_finite() && cm > 0.0,
        };
        if !width_ok {
            return Err(OfferError::Config(format!(
                "Image width must be positive: {:?}",
                assembly.image_width
            )));
        }

        // 4. カスタム日付形式の検証
        if let DateFormat::Custom(ref format_str) = self.config.date_format {
            let has_error = StrftimeItems::new(format_str).any(|item| matches!(item, FormatItem::Error));
            if has_error {
                return Err(OfferError::Config(format!(
                    "Invalid date format string: '{}'",
                    format_str
                )));
            }
            // テスト用の日付でフォーマット試行
            let test_date = NaiveDate::from_ymd_opt(2025, 1, 1)
                .ok_or_else(|| OfferError::Config("Failed to create test date".to_string()))?;
            if format_date(test_date, format_str)?.is_empty() {
                return Err(OfferError::Config(format!(
                    "Invalid date format string: '{}'",
                    format_str
                )));
            }
        }

        // 5. Converterインスタンス生成
        Ok(Converter::new(self.config))
    }
}

/// 日付を整形する
///
/// 時刻指定子（`%H`など）は日付だけでは描画できないため、`Config`エラーになります。
fn format_date(date: NaiveDate, pattern: &str) -> Result<String, OfferError> {
    let mut text = String::new();
    write!(text, "{}", date.format(pattern)).map_err(|_| {
        OfferError::Config(format!(
            "Date format cannot be rendered from a date: '{}'",
            pattern
        ))
    })?;
    Ok(text)
}

/// XLSX→DOCX変換を実行する構造体
///
/// 不変の設定のみを保持するため、スレッド間で共有して並行に変換できます。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxoffer::ConverterBuilder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let converter = ConverterBuilder::new().build()?;
/// let spreadsheet = std::fs::read("oferta.xlsx")?;
/// let template = std::fs::read("template.docx")?;
/// let document = converter.convert(&spreadsheet, &template)?;
/// std::fs::write(xlsxoffer::OUTPUT_FILE_NAME, document)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Converter {
    /// 変換設定（不変）
    config: ConversionConfig,
}

/// プレビュー用のポジション（画像データの代わりに有無のみ）
#[derive(Serialize)]
struct PreviewItem<'a> {
    sequence_number: u32,
    name: &'a str,
    quantity: &'a str,
    description: &'a str,
    has_image: bool,
}

impl Converter {
    pub(crate) fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    /// スプレッドシートとテンプレートからオファー文書を生成する
    ///
    /// # 引数
    ///
    /// * `spreadsheet` - XLSXファイルのバイト列
    /// * `template` - テンプレートDOCXのバイト列
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<u8>)` - 生成したDOCXのバイト列
    /// * `Err(OfferError::EmptyExtraction)` - ポジションが1件も見つからない場合
    /// * `Err(OfferError::MalformedContainer)` - スプレッドシートが読めない場合
    /// * `Err(OfferError::TemplateConfiguration)` - テンプレートにデータテーブルがない場合
    pub fn convert(&self, spreadsheet: &[u8], template: &[u8]) -> Result<Vec<u8>, OfferError> {
        let items = self.extract_items(spreadsheet)?;
        if items.is_empty() {
            return Err(OfferError::EmptyExtraction);
        }

        let date = self
            .config
            .date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let date_text = format_date(date, self.config.date_format.pattern())?;

        let assembler =
            TemplateDocumentAssembler::new(&self.config.assembly, self.config.security.clone());
        let document = assembler.assemble(template, &items, &date_text)?;

        log::info!(
            "Generated offer with {} positions ({} with images), {} bytes",
            items.len(),
            items.iter().filter(|item| item.has_image()).count(),
            document.len()
        );
        Ok(document)
    }

    /// ストリームから読み込み、生成した文書をストリームに書き出す
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use std::fs::File;
    /// use xlsxoffer::ConverterBuilder;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let converter = ConverterBuilder::new().build()?;
    /// converter.convert_reader(
    ///     File::open("oferta.xlsx")?,
    ///     File::open("template.docx")?,
    ///     File::create("oferta.docx")?,
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn convert_reader<R: Read + Seek, T: Read, W: Write>(
        &self,
        mut spreadsheet: R,
        mut template: T,
        mut output: W,
    ) -> Result<(), OfferError> {
        // 入力データをメモリに読み込む（並列処理のため）
        let mut spreadsheet_bytes = Vec::new();
        spreadsheet.read_to_end(&mut spreadsheet_bytes)?;
        self.config
            .security
            .check_input_size(spreadsheet_bytes.len())?;

        let mut template_bytes = Vec::new();
        template.read_to_end(&mut template_bytes)?;

        let document = self.convert(&spreadsheet_bytes, &template_bytes)?;
        output.write_all(&document)?;
        output.flush()?;
        Ok(())
    }

    /// ファイルパスを指定して変換する
    pub fn convert_file<P, Q, O>(&self, spreadsheet: P, template: Q, output: O) -> Result<(), OfferError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        O: AsRef<Path>,
    {
        let spreadsheet = std::fs::read(spreadsheet)?;
        let template = std::fs::read(template)?;
        let document = self.convert(&spreadsheet, &template)?;
        std::fs::write(output, document)?;
        Ok(())
    }

    /// ポジションを抽出し、画像を対応付ける（文書は生成しない）
    ///
    /// ポジションが見つからない場合は空のベクターを返します。
    pub fn extract_items(&self, spreadsheet: &[u8]) -> Result<Vec<Item>, OfferError> {
        self.config.security.check_input_size(spreadsheet.len())?;

        // シート解析と画像抽出は互いに独立しているため並列に実行
        let (items, images) = rayon::join(
            || self.parse_items(spreadsheet),
            || MediaExtractor::new(self.config.security.clone()).extract(spreadsheet),
        );
        // セキュリティ違反はワークブックの解析エラーより優先して報告
        let images = images?;
        let items = items?;
        let image_count = images.len();

        let association = associate(items, images);
        log::debug!(
            "Parsed {} positions and {} embedded images ({} dropped)",
            association.items.len(),
            image_count,
            association.dropped_images
        );
        Ok(association.items)
    }

    /// 抽出結果をJSONで返す（画像データは含めず`has_image`のみ）
    pub fn preview_json(&self, spreadsheet: &[u8]) -> Result<String, OfferError> {
        let items = self.extract_items(spreadsheet)?;
        let preview: Vec<PreviewItem<'_>> = items
            .iter()
            .map(|item| PreviewItem {
                sequence_number: item.sequence_number,
                name: &item.name,
                quantity: &item.quantity,
                description: &item.description,
                has_image: item.has_image(),
            })
            .collect();
        Ok(serde_json::to_string_pretty(&preview)?)
    }

    fn parse_items(&self, spreadsheet: &[u8]) -> Result<Vec<Item>, OfferError> {
        let mut workbook = WorkbookParser::open(spreadsheet)?;
        let sheet_name = workbook.select_sheet(&self.config.sheet_selector)?;
        let cells = workbook.read_cells(&sheet_name)?;
        log::debug!("Reading positions from sheet '{}'", sheet_name);
        Ok(SheetRecordParser::new(&self.config.layout).parse(&cells))
    }
}
