//! xlsxoffer - Pure-Rust converter from position-block Excel sheets to DOCX offers
//!
//! This crate reads a spreadsheet in which catalog positions are written as
//! label/value blocks (`Poz. 1 ...`, `Ilość:`, `Opis:`), pairs them with the
//! photos embedded in the workbook, and fills the table of a Word template to
//! produce a ready-to-send offer document.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use xlsxoffer::ConverterBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a converter with default settings
//!     let converter = ConverterBuilder::new().build()?;
//!
//!     let spreadsheet = std::fs::read("oferta.xlsx")?;
//!     let template = std::fs::read("template.docx")?;
//!
//!     // Generate the offer document
//!     let document = converter.convert(&spreadsheet, &template)?;
//!     std::fs::write(xlsxoffer::OUTPUT_FILE_NAME, document)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! When no template is available, the built-in one can be used:
//!
//! ```rust,no_run
//! use xlsxoffer::{default_template, ConverterBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = ConverterBuilder::new().build()?;
//! let spreadsheet: Vec<u8> = vec![]; // Your Excel file bytes
//! let document = converter.convert(&spreadsheet, &default_template()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use xlsxoffer::{BlockMarker, ConverterBuilder, DateFormat, ImageLayout, ImageWidth};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = ConverterBuilder::new()
//!         .with_block_marker(BlockMarker::Label("Nazwa:".to_string()))  // F = "Nazwa:", G = name
//!         .with_image_layout(ImageLayout::MergedRow)  // picture in a full-width row
//!         .with_image_width(ImageWidth::Centimeters(12.0))
//!         .with_date_format(DateFormat::Iso8601)
//!         .build()?;
//!
//!     converter.convert_file("oferta.xlsx", "template.docx", "oferta.docx")?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Preview
//!
//! ```rust,no_run
//! use xlsxoffer::ConverterBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = ConverterBuilder::new().build()?;
//!     let spreadsheet = std::fs::read("oferta.xlsx")?;
//!
//!     // Recognized positions as JSON, without generating a document
//!     println!("{}", converter.preview_json(&spreadsheet)?);
//!
//!     Ok(())
//! }
//! ```

mod api;
mod assembler;
mod associate;
mod builder;
mod docx;
mod error;
mod parser;
mod security;
mod types;

// 公開API
pub use api::{BlockMarker, DateFormat, ImageLayout, ImageWidth, RowTemplate, SheetSelector};
pub use builder::{Converter, ConverterBuilder};
pub use docx::default_template;
pub use error::{ErrorClass, OfferError};
pub use types::{ImageBlob, Item};

/// 生成文書の推奨ファイル名
pub const OUTPUT_FILE_NAME: &str = "oferta.docx";

/// 生成文書のMIMEタイプ
pub const OUTPUT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
