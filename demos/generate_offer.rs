//! Offer Generator CLI Example
//!
//! This example demonstrates how to build a command-line tool
//! using xlsxoffer for turning a position sheet into a DOCX offer.

use std::process;
use xlsxoffer::{
    default_template, ConverterBuilder, ErrorClass, ImageLayout, OfferError, RowTemplate,
    SheetSelector,
};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <input.xlsx> [options]", args[0]);
        eprintln!("\nOptions:");
        eprintln!("  --template <file.docx>  Template document (built-in template if omitted)");
        eprintln!("  --output <file.docx>    Output path (default: oferta.docx)");
        eprintln!("  --sheet-index <n>       Select sheet by index (0-based)");
        eprintln!("  --sheet-name <name>     Select sheet by name");
        eprintln!("  --merged-row            Place photos in a full-width row below each position");
        eprintln!("  --keep-style-row        Keep the template's second row as the row style");
        eprintln!("  --preview               Print the recognized positions as JSON");
        eprintln!("\nExamples:");
        eprintln!("  {} oferta.xlsx", args[0]);
        eprintln!("  {} oferta.xlsx --template template.docx --merged-row", args[0]);
        eprintln!("  {} oferta.xlsx --preview", args[0]);
        process::exit(1);
    }

    let input_path = &args[1];
    let mut template_path: Option<String> = None;
    let mut output_path = xlsxoffer::OUTPUT_FILE_NAME.to_string();
    let mut builder = ConverterBuilder::new();
    let mut preview = false;

    // Parse options
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--template" | "--output" | "--sheet-index" | "--sheet-name" if i + 1 >= args.len() => {
                eprintln!("Error: {} requires a value", args[i]);
                process::exit(1);
            }
            "--template" => {
                template_path = Some(args[i + 1].clone());
                i += 2;
            }
            "--output" => {
                output_path = args[i + 1].clone();
                i += 2;
            }
            "--sheet-index" => {
                let index = args[i + 1].parse::<usize>().unwrap_or_else(|_| {
                    eprintln!("Error: Invalid sheet index: {}", args[i + 1]);
                    process::exit(1);
                });
                builder = builder.with_sheet_selector(SheetSelector::Index(index));
                i += 2;
            }
            "--sheet-name" => {
                builder = builder.with_sheet_selector(SheetSelector::Name(args[i + 1].clone()));
                i += 2;
            }
            "--merged-row" => {
                builder = builder.with_image_layout(ImageLayout::MergedRow);
                i += 1;
            }
            "--keep-style-row" => {
                builder = builder.with_row_template(RowTemplate::RetainStyleRow);
                i += 1;
            }
            "--preview" => {
                preview = true;
                i += 1;
            }
            _ => {
                eprintln!("Error: Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
    }

    let result = run(builder, input_path, template_path.as_deref(), &output_path, preview);
    match result {
        Ok(()) => {
            if !preview {
                println!("Offer generated: {} -> {}", input_path, output_path);
            }
        }
        Err(e) => {
            handle_error(e);
            process::exit(1);
        }
    }
}

fn run(
    builder: ConverterBuilder,
    input_path: &str,
    template_path: Option<&str>,
    output_path: &str,
    preview: bool,
) -> Result<(), OfferError> {
    let converter = builder.build()?;
    let spreadsheet = std::fs::read(input_path)?;

    if preview {
        println!("{}", converter.preview_json(&spreadsheet)?);
        return Ok(());
    }

    let template = match template_path {
        Some(path) => std::fs::read(path)?,
        None => default_template()?,
    };
    let document = converter.convert(&spreadsheet, &template)?;
    std::fs::write(output_path, document)?;
    Ok(())
}

fn handle_error(error: OfferError) {
    match error.class() {
        ErrorClass::CallerInput => {
            eprintln!("Input Error: {}", error);
            eprintln!("Please check that the spreadsheet contains 'Poz.' position blocks.");
        }
        ErrorClass::Operator => {
            eprintln!("Template/Configuration Error: {}", error);
            eprintln!("The template must contain a table whose first header cell is 'L.p.'.");
        }
        ErrorClass::Internal => {
            eprintln!("Error: {}", error);
        }
    }
}
