//! Record Parser Module
//!
//! ラベル/値の組で記述されたシートから、ポジションの一覧を復元するモジュール。
//!
//! シートは表形式ではなく、固定列に散らばったラベルと値の並びとして扱います。
//! 主ヒューリスティック（列ペア走査）で1件も見つからない場合のみ、
//! 先頭列の接頭辞によるフォールバックを適用します。

use crate::api::BlockMarker;
use crate::types::{CellCoord, Item, SheetCells};

/// ポジションブロックのレイアウト設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordLayout {
    /// ブロック開始マーカー
    pub marker: BlockMarker,
    /// ラベル列（0始まり、デフォルト: F列 = 5）
    pub label_col: u32,
    /// 値・名称列（0始まり、デフォルト: G列 = 6）
    pub value_col: u32,
    /// ブロックの最大行数
    pub block_lookahead: u32,
    /// 数量ラベル
    pub quantity_labels: Vec<String>,
    /// 説明ラベル（出現順に連結）
    pub description_labels: Vec<String>,
    /// フォールバック: 接頭辞を判定する列（デフォルト: A列 = 0）
    pub fallback_marker_col: u32,
    /// フォールバック: 説明を読む列（デフォルト: B列 = 1）
    pub fallback_description_col: u32,
    /// フォールバック: 行頭の接頭辞
    pub fallback_prefix: String,
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self {
            marker: BlockMarker::Prefix("Poz.".to_string()),
            label_col: 5,
            value_col: 6,
            block_lookahead: 40,
            quantity_labels: vec!["Ilość:".to_string()],
            description_labels: vec!["Wypełnienia:".to_string(), "Opis:".to_string()],
            fallback_marker_col: 0,
            fallback_description_col: 1,
            fallback_prefix: "Poz.".to_string(),
        }
    }
}

/// シートレコードパーサー
pub(crate) struct SheetRecordParser<'a> {
    layout: &'a RecordLayout,
}

impl<'a> SheetRecordParser<'a> {
    pub fn new(layout: &'a RecordLayout) -> Self {
        Self { layout }
    }

    /// シートからポジションを抽出する
    ///
    /// # 戻り値
    ///
    /// 出現順のポジション一覧（画像なし）。どちらのヒューリスティックでも
    /// マーカーが見つからない場合は空のベクター。
    pub fn parse(&self, cells: &SheetCells) -> Vec<Item> {
        let items = self.parse_blocks(cells);
        if !items.is_empty() {
            log::debug!("Column-pair scan recognized {} positions", items.len());
            return items;
        }

        let items = self.parse_fallback(cells);
        if !items.is_empty() {
            log::debug!("First-cell prefix fallback recognized {} positions", items.len());
        }
        items
    }

    /// 主ヒューリスティック: 列ペア走査
    fn parse_blocks(&self, cells: &SheetCells) -> Vec<Item> {
        let Some(max_row) = cells.max_row() else {
            return Vec::new();
        };

        // 1. ブロック開始行の収集
        let starts: Vec<u32> = (0..=max_row)
            .filter(|&row| self.is_block_start(cells, row))
            .collect();

        // 2. 各ブロックのフィールド収集
        let mut items = Vec::with_capacity(starts.len());
        for (idx, &start) in starts.iter().enumerate() {
            let window_end = start.saturating_add(self.layout.block_lookahead);
            let end = match starts.get(idx + 1) {
                Some(&next) => (next - 1).min(window_end),
                None => max_row.min(window_end),
            };

            let name = cells
                .text(start, self.layout.value_col)
                .map(str::trim)
                .unwrap_or_default();
            let mut item = Item::new(idx as u32 + 1, name);

            log::trace!(
                "Position {} at {} spans rows {}..={}",
                item.sequence_number,
                CellCoord::new(start, self.layout.value_col).to_a1_notation(),
                start + 1,
                end + 1
            );

            for row in start..=end {
                self.collect_field(cells, row, &mut item);
            }
            items.push(item);
        }

        items
    }

    /// 行がブロック開始マーカーに一致するか
    fn is_block_start(&self, cells: &SheetCells, row: u32) -> bool {
        match &self.layout.marker {
            BlockMarker::Prefix(prefix) => cells
                .text(row, self.layout.value_col)
                .is_some_and(|text| text.trim().starts_with(prefix.as_str())),
            BlockMarker::Label(label) => {
                let label_matches = cells
                    .text(row, self.layout.label_col)
                    .is_some_and(|text| text.trim() == label);
                label_matches
                    && cells
                        .text(row, self.layout.value_col)
                        .is_some_and(|text| !text.trim().is_empty())
            }
        }
    }

    /// ラベル列を見て、対応する値をポジションに反映する
    fn collect_field(&self, cells: &SheetCells, row: u32, item: &mut Item) {
        // 文字列以外のラベルセルは無視
        let Some(label) = cells.text(row, self.layout.label_col) else {
            return;
        };
        let label = label.trim();
        if label.is_empty() {
            return;
        }

        let Some(value) = cells.get(row, self.layout.value_col) else {
            return;
        };
        if value.is_empty() {
            return;
        }

        if self.layout.quantity_labels.iter().any(|l| l == label) {
            item.quantity = value.as_raw_string();
        } else if self.layout.description_labels.iter().any(|l| l == label) {
            append_description(&mut item.description, &value.as_raw_string());
        }
    }

    /// フォールバック: 先頭列が接頭辞で始まる行をポジションとみなす
    fn parse_fallback(&self, cells: &SheetCells) -> Vec<Item> {
        let Some(max_row) = cells.max_row() else {
            return Vec::new();
        };

        let mut items = Vec::new();
        for row in 0..=max_row {
            let Some(text) = cells.text(row, self.layout.fallback_marker_col) else {
                continue;
            };
            let text = text.trim();
            if !text.starts_with(self.layout.fallback_prefix.as_str()) {
                continue;
            }

            let mut item = Item::new(items.len() as u32 + 1, text);
            if let Some(value) = cells.get(row, self.layout.fallback_description_col) {
                if !value.is_empty() {
                    append_description(&mut item.description, &value.as_raw_string());
                }
            }
            items.push(item);
        }

        items
    }
}

/// 説明テキストの正規化
///
/// OOXMLの`_xHHHH_`エスケープを復元した後、改行、キャリッジリターン、
/// `_x000D_`を空白に置き換え、連続する空白を1つにまとめる。
pub(crate) fn normalize_text(raw: &str) -> String {
    decode_ooxml_escapes(raw)
        .replace("_x000D_", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `_xHHHH_`形式の文字エスケープを1段だけ復元する
///
/// リテラルの`_x000D_`はセル内で`_x005F_x000D_`として保存され、calamineは
/// これを復元せずに返します。不正な並びはそのまま残します。
fn decode_ooxml_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &candidate[7..];
            }
            None => {
                out.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// 説明に追記する（既存の内容とは空白1つで区切る）
fn append_description(description: &mut String, raw: &str) {
    let text = normalize_text(raw);
    if text.is_empty() {
        return;
    }
    if !description.is_empty() {
        description.push(' ');
    }
    description.push_str(&text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    const F: u32 = 5;
    const G: u32 = 6;

    fn parse(cells: &SheetCells) -> Vec<Item> {
        SheetRecordParser::new(&RecordLayout::default()).parse(cells)
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("PCV\nbiały"), "PCV biały");
        assert_eq!(normalize_text("a_x000D_\nb"), "a b");
        assert_eq!(normalize_text("  a \r\n\r\n b  "), "a b");
        assert_eq!(normalize_text("\n"), "");
        // セル内のリテラル`_x000D_`は`_x005F_`付きで保存される
        assert_eq!(normalize_text("Rama_x005F_x000D_\r\n  PCV"), "Rama PCV");
        assert_eq!(normalize_text("a_x0009_b"), "a b");
        assert_eq!(normalize_text("_x12_ _xZZZZ_"), "_x12_ _xZZZZ_");
    }

    #[test]
    fn test_three_blocks_with_fields() {
        let cells = SheetCells::from_rows(vec![
            (0, vec![(0, "Oferta")]),
            (2, vec![(G, "Poz. 1 Okno")]),
            (3, vec![(F, "Ilość:"), (G, "2 szt.")]),
            (4, vec![(F, "Opis:"), (G, "PCV\nbiały")]),
            (6, vec![(G, "Poz. 2 Drzwi")]),
            (7, vec![(F, "Ilość:"), (G, "1 szt.")]),
            (8, vec![(F, "Wypełnienia:"), (G, "szyba")]),
            (9, vec![(F, "Opis:"), (G, "antracyt")]),
            (11, vec![(G, "Poz. 3 Witryna")]),
        ]);

        let items = parse(&cells);
        assert_eq!(items.len(), 3);
        assert_eq!(
            items.iter().map(|i| i.sequence_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(items[0].name, "Poz. 1 Okno");
        assert_eq!(items[0].quantity, "2 szt.");
        assert_eq!(items[0].description, "PCV biały");
        assert_eq!(items[1].description, "szyba antracyt");
        // 末尾のブロックはフィールドなしでも確定される
        assert_eq!(items[2].name, "Poz. 3 Witryna");
        assert_eq!(items[2].quantity, "");
        assert_eq!(items[2].description, "");
    }

    #[test]
    fn test_quantity_last_write_wins_and_numeric_coercion() {
        let mut cells = SheetCells::from_rows(vec![
            (0, vec![(G, "Poz. 1")]),
            (1, vec![(F, "Ilość:"), (G, "1 szt.")]),
            (2, vec![(F, "Ilość:")]),
        ]);
        cells.insert(CellCoord::new(2, G), CellValue::Number(3.0));

        let items = parse(&cells);
        assert_eq!(items[0].quantity, "3");
    }

    #[test]
    fn test_quantity_keeps_original_formatting() {
        let cells = SheetCells::from_rows(vec![
            (0, vec![(G, "Poz. 1")]),
            (1, vec![(F, "Ilość:"), (G, " 2  szt.\n")]),
        ]);
        let items = parse(&cells);
        assert_eq!(items[0].quantity, " 2  szt.\n");
    }

    #[test]
    fn test_non_string_labels_are_ignored() {
        let mut cells = SheetCells::from_rows(vec![
            (0, vec![(G, "Poz. 1")]),
            (1, vec![(G, "not a field")]),
        ]);
        cells.insert(CellCoord::new(1, F), CellValue::Number(7.0));

        let items = parse(&cells);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, "");
        assert_eq!(items[0].description, "");
    }

    #[test]
    fn test_labels_are_trimmed() {
        let cells = SheetCells::from_rows(vec![
            (0, vec![(G, "  Poz. 1")]),
            (1, vec![(F, " Ilość: "), (G, "4 szt.")]),
        ]);
        let items = parse(&cells);
        assert_eq!(items[0].name, "Poz. 1");
        assert_eq!(items[0].quantity, "4 szt.");
    }

    #[test]
    fn test_block_lookahead_bounds_fields() {
        let layout = RecordLayout {
            block_lookahead: 2,
            ..RecordLayout::default()
        };
        let cells = SheetCells::from_rows(vec![
            (0, vec![(G, "Poz. 1")]),
            (2, vec![(F, "Opis:"), (G, "inside")]),
            (3, vec![(F, "Opis:"), (G, "outside")]),
        ]);
        let items = SheetRecordParser::new(&layout).parse(&cells);
        assert_eq!(items[0].description, "inside");
    }

    #[test]
    fn test_label_marker() {
        let layout = RecordLayout {
            marker: BlockMarker::Label("Nazwa:".to_string()),
            ..RecordLayout::default()
        };
        let cells = SheetCells::from_rows(vec![
            (0, vec![(F, "Nazwa:"), (G, "Okno uchylne")]),
            (1, vec![(F, "Ilość:"), (G, "2 szt.")]),
            (2, vec![(F, "Nazwa:")]),
            (3, vec![(F, "Nazwa:"), (G, "Drzwi")]),
        ]);
        let items = SheetRecordParser::new(&layout).parse(&cells);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Okno uchylne");
        assert_eq!(items[0].quantity, "2 szt.");
        assert_eq!(items[1].name, "Drzwi");
    }

    #[test]
    fn test_fallback_first_cell_prefix() {
        let cells = SheetCells::from_rows(vec![
            (0, vec![(0, "Lista")]),
            (1, vec![(0, "Poz. 1"), (1, "okno\ndwuskrzydłowe")]),
            (2, vec![(0, "Poz. 2")]),
        ]);
        let items = parse(&cells);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Poz. 1");
        assert_eq!(items[0].description, "okno dwuskrzydłowe");
        assert_eq!(items[1].sequence_number, 2);
        assert_eq!(items[1].description, "");
    }

    #[test]
    fn test_primary_heuristic_takes_priority() {
        let cells = SheetCells::from_rows(vec![
            (0, vec![(0, "Poz. A")]),
            (1, vec![(G, "Poz. 1")]),
        ]);
        let items = parse(&cells);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Poz. 1");
    }

    #[test]
    fn test_no_markers_yields_empty() {
        let cells = SheetCells::from_rows(vec![(0, vec![(0, "Cennik"), (G, "Pozycja")])]);
        assert!(parse(&cells).is_empty());
        assert!(parse(&SheetCells::new()).is_empty());
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let cells = SheetCells::from_rows(vec![
            (0, vec![(G, "Poz. 1")]),
            (1, vec![(F, "Opis:"), (G, "a")]),
            (2, vec![(G, "Poz. 2")]),
        ]);
        assert_eq!(parse(&cells), parse(&cells));
    }
}
