//! Parser Module
//!
//! スプレッドシート側の読み取りを担当するモジュール群。
//!
//! - `workbook`: calamineによるシートのセル読み込み
//! - `records`: ラベル/値の並びからポジションを復元
//! - `media`: ZIPコンテナからの埋め込み画像の抽出

mod media;
mod records;
mod workbook;

pub(crate) use media::MediaExtractor;
pub(crate) use records::{RecordLayout, SheetRecordParser};
pub(crate) use workbook::WorkbookParser;
