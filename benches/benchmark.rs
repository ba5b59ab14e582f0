//! パフォーマンスベンチマーク
//!
//! このモジュールは、xlsxofferクレートのパフォーマンスを測定するためのベンチマークを提供します。
//!
//! 実装するベンチマーク:
//! - 小規模オファー（写真付き10ポジション）の変換
//! - 大規模オファー（写真付き100ポジション）の変換
//! - 文書を生成しないポジション抽出のみ
//!
//! フィクスチャはrust_xlsxwriterでメモリ上に生成するため、外部ファイルは不要です。

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use image::{ImageFormat, Rgb, RgbImage};
use rust_xlsxwriter::{Image, Workbook};
use std::io::Cursor;
use xlsxoffer::{default_template, ConverterBuilder};

/// 写真付きのポジションブロックを`count`件持つXLSXを生成
fn generate_offer(count: u32) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for i in 0..count {
        let row = i * 5;
        worksheet
            .write_string(row, 6, format!("Poz. {} - Okno", i + 1))
            .unwrap();
        worksheet.write_string(row + 1, 5, "Ilość:").unwrap();
        worksheet.write_string(row + 1, 6, "2 szt.").unwrap();
        worksheet.write_string(row + 2, 5, "Opis:").unwrap();
        worksheet
            .write_string(row + 2, 6, "PCV\nbiały, szyba 4/16/4")
            .unwrap();

        // 同一画像は重複排除されるため、サイズを変えて生成
        let photo = RgbImage::from_pixel(120 + i, 80, Rgb([(i % 256) as u8, 120, 200]));
        let mut buf = Cursor::new(Vec::new());
        photo.write_to(&mut buf, ImageFormat::Png).unwrap();
        let image = Image::new_from_buffer(buf.get_ref()).unwrap();
        worksheet.insert_image(row, 0, &image).unwrap();
    }

    workbook.save_to_buffer().unwrap()
}

fn benchmark_convert(c: &mut Criterion) {
    let converter = ConverterBuilder::new().build().unwrap();
    let template = default_template().unwrap();

    let mut group = c.benchmark_group("convert");
    for count in [10u32, 100] {
        let data = generate_offer(count);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.sample_size(10);

        group.bench_function(format!("convert_{}_positions", count), |b| {
            b.iter(|| {
                let output = converter
                    .convert(black_box(&data), black_box(&template))
                    .unwrap();
                black_box(output)
            });
        });
    }
    group.finish();
}

fn benchmark_extract(c: &mut Criterion) {
    let converter = ConverterBuilder::new().build().unwrap();
    let data = generate_offer(100);

    c.bench_function("extract_100_positions", |b| {
        b.iter(|| black_box(converter.extract_items(black_box(&data)).unwrap()));
    });
}

criterion_group!(benches, benchmark_convert, benchmark_extract);
criterion_main!(benches);
