//! Workbook Parser Module
//!
//! calamineを使用したワークブックの読み込み。
//! 選択したシートの使用済みセルを絶対座標の`SheetCells`に展開します。

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets, Xlsx};
use std::io::Cursor;

use crate::api::SheetSelector;
use crate::error::OfferError;
use crate::types::{CellCoord, CellValue, SheetCells};

/// ワークブックパーサー
///
/// calamineのラッパーとして、ワークブックレベルの操作を提供します。
pub(crate) struct WorkbookParser {
    /// calamineのワークブック（XLSX形式のみサポート）
    workbook: Xlsx<Cursor<Vec<u8>>>,
}

impl WorkbookParser {
    /// バイト列からワークブックを開く
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkbookParser)` - XLSXとして読み込めた場合
    /// * `Err(OfferError::MalformedContainer)` - XLSXとして開けない場合
    pub fn open(bytes: &[u8]) -> Result<Self, OfferError> {
        let sheets = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| OfferError::MalformedContainer(e.to_string()))?;
        match sheets {
            Sheets::Xlsx(workbook) => Ok(Self { workbook }),
            _ => Err(OfferError::MalformedContainer(
                "Only XLSX format is supported".to_string(),
            )),
        }
    }

    /// すべてのシート名を取得
    pub fn get_sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    /// シート選択方式に基づいてシート名を決定
    ///
    /// # 戻り値
    ///
    /// * `Ok(String)` - 選択されたシート名
    /// * `Err(OfferError::MalformedContainer)` - シートが存在しない場合
    pub fn select_sheet(&self, selector: &SheetSelector) -> Result<String, OfferError> {
        let all_sheet_names = self.get_sheet_names();

        match selector {
            SheetSelector::Index(index) => {
                all_sheet_names.get(*index).cloned().ok_or_else(|| {
                    OfferError::MalformedContainer(format!(
                        "Sheet index {} is out of range (total: {})",
                        index,
                        all_sheet_names.len()
                    ))
                })
            }
            SheetSelector::Name(name) => {
                if !all_sheet_names.contains(name) {
                    return Err(OfferError::MalformedContainer(format!(
                        "Sheet '{}' not found",
                        name
                    )));
                }
                Ok(name.clone())
            }
        }
    }

    /// シートを読み込み、使用済みセルを展開する
    ///
    /// calamineの`Range`は使用範囲の左上を原点とするため、
    /// `start()`のオフセットを加えて絶対座標に変換します。
    pub fn read_cells(&mut self, sheet_name: &str) -> Result<SheetCells, OfferError> {
        let range = self
            .workbook
            .worksheet_range(sheet_name)
            .map_err(|e| OfferError::Parse(e.into()))?;

        let (row_offset, col_offset) = range.start().unwrap_or((0, 0));
        let mut cells = SheetCells::new();

        for (row, col, cell) in range.used_cells() {
            let coord = CellCoord::new(row_offset + row as u32, col_offset + col as u32);
            cells.insert(coord, convert_cell(cell));
        }

        Ok(cells)
    }
}

/// calamineのセル値を内部表現に変換
fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        Data::Empty => CellValue::Empty,
        _ => CellValue::Empty,
    }
}
