//! Item Image Associator Module
//!
//! 抽出した画像をポジションに位置（インデックス）で対応付けるモジュール。
//!
//! i番目のポジション（0始まり）にi番目の画像を割り当てます。内容やシート上の
//! アンカー位置による照合は行わないため、作成者がポジション順に1枚ずつ画像を
//! 置いていない場合はずれが生じます。

use crate::types::{ImageBlob, Item};

/// 対応付けの結果
#[derive(Debug)]
pub(crate) struct Association {
    /// 画像を割り当てたポジション
    pub items: Vec<Item>,
    /// ポジション数を超えたため破棄した画像の数
    pub dropped_images: usize,
}

/// 画像をポジションに順番に割り当てる
///
/// 画像はムーブされるため、同じ画像が2つのポジションに割り当てられることはない。
pub(crate) fn associate(mut items: Vec<Item>, images: Vec<ImageBlob>) -> Association {
    let mut images = images.into_iter();
    for item in items.iter_mut() {
        match images.next() {
            Some(image) => item.image = Some(image),
            None => break,
        }
    }

    let dropped_images = images.count();
    if dropped_images > 0 {
        log::warn!(
            "{} embedded images exceed the {} recognized positions and were dropped",
            dropped_images,
            items.len()
        );
    }

    Association {
        items,
        dropped_images,
    }
}
