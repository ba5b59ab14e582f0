//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use serde::Serialize;
use std::collections::HashMap;

/// セルの値を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 文字列
    String(String),

    /// 論理値
    Bool(bool),

    /// エラー値（例: #DIV/0!）
    Error(String),

    /// 空セル
    Empty,
}

impl CellValue {
    /// 値が空かどうかを判定
    ///
    /// 空白のみの文字列も空として扱います。
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 文字列セルの場合のみ、その値を返す
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// 値を文字列として取得（書式適用前）
    ///
    /// 整数値の浮動小数点は小数部なしで出力されます（`2.0` -> `"2"`）。
    pub fn as_raw_string(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Error(e) => e.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

/// セル座標（0始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// A1形式の文字列に変換（例: (0, 0) -> "A1"）
    #[allow(clippy::wrong_self_convention)]
    pub fn to_a1_notation(&self) -> String {
        let col_str = Self::col_index_to_letter(self.col);
        format!("{}{}", col_str, self.row + 1)
    }

    /// 列インデックスを文字列に変換（0 -> "A", 25 -> "Z", 26 -> "AA"）
    fn col_index_to_letter(mut col: u32) -> String {
        let mut result = String::new();
        loop {
            let remainder = col % 26;
            result.insert(0, (b'A' + remainder as u8) as char);
            if col < 26 {
                break;
            }
            col = col / 26 - 1;
        }
        result
    }
}

/// シートの使用済みセル
///
/// calamineの`Range`を絶対座標で引けるように展開した疎なセル表です。
#[derive(Debug, Clone, Default)]
pub(crate) struct SheetCells {
    cells: HashMap<CellCoord, CellValue>,
    max_row: Option<u32>,
}

impl SheetCells {
    /// 空のセル表を生成
    pub fn new() -> Self {
        Self::default()
    }

    /// セルを設定する（空セルは保持しない）
    pub fn insert(&mut self, coord: CellCoord, value: CellValue) {
        if matches!(value, CellValue::Empty) {
            return;
        }
        self.max_row = Some(self.max_row.map_or(coord.row, |r| r.max(coord.row)));
        self.cells.insert(coord, value);
    }

    /// 指定座標のセル値を取得
    pub fn get(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&CellCoord::new(row, col))
    }

    /// 指定座標が文字列セルならその値を返す
    pub fn text(&self, row: u32, col: u32) -> Option<&str> {
        self.get(row, col).and_then(CellValue::as_str)
    }

    /// 最後の使用行（0始まり）。セルがない場合は`None`
    pub fn max_row(&self) -> Option<u32> {
        self.max_row
    }

    /// テスト用: 行ごとの(列, 文字列)リストからセル表を生成
    #[cfg(test)]
    pub fn from_rows(rows: Vec<(u32, Vec<(u32, &str)>)>) -> Self {
        let mut cells = Self::new();
        for (row, cols) in rows {
            for (col, text) in cols {
                cells.insert(
                    CellCoord::new(row, col),
                    CellValue::String(text.to_string()),
                );
            }
        }
        cells
    }
}

/// スプレッドシートに埋め込まれた画像
///
/// 1回の変換の間だけ保持され、変換をまたいでキャッシュされることはありません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    /// アーカイブ内のエントリ名（例: `xl/media/image1.png`）
    pub entry_name: String,
    /// 小文字の拡張子（`png`, `jpg`, `jpeg`）
    pub extension: String,
    /// エンコード済みの画像データ
    pub data: Vec<u8>,
}

impl ImageBlob {
    /// エントリ名と内容から画像を生成する
    pub fn new(entry_name: impl Into<String>, data: Vec<u8>) -> Self {
        let entry_name = entry_name.into();
        let extension = entry_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        Self {
            entry_name,
            extension,
            data,
        }
    }

    /// 拡張子に対応するMIMEタイプ
    pub fn content_type(&self) -> &'static str {
        match self.extension.as_str() {
            "png" => "image/png",
            _ => "image/jpeg",
        }
    }
}

/// オファーの1ポジション
///
/// パーサーが生成し、画像の対応付けで一度だけ変更され、
/// 文書生成では読み取り専用で使用されます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    /// 通し番号（1始まり、解析時に割り当て）
    pub sequence_number: u32,
    /// 名称（例: `Poz. 1 - Okno`）
    pub name: String,
    /// 数量（元の表記を保持、例: `2 szt.`）
    pub quantity: String,
    /// 説明（複数フィールドを空白1つで連結）
    pub description: String,
    /// 対応付けられた画像
    #[serde(skip)]
    pub image: Option<ImageBlob>,
}

impl Item {
    /// 画像なしのポジションを生成
    pub fn new(sequence_number: u32, name: impl Into<String>) -> Self {
        Self {
            sequence_number,
            name: name.into(),
            quantity: String::new(),
            description: String::new(),
            image: None,
        }
    }

    /// 画像が対応付けられているか
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}
