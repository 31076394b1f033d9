//! Utility to explore xlsx package structure for development
use xlsx2csv::container::{OoxmlContainer, PackageReader};
use xlsx2csv::Workbook;

fn main() -> xlsx2csv::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "test-files/sample.xlsx".to_string());
    let container = OoxmlContainer::open(&path)?;

    println!("=== Files in archive ===");
    for file in container.list_files() {
        println!("  {}", file);
    }

    let workbook = Workbook::from_package(&container)?;
    println!(
        "\n=== {} (appName={}, date1904={}) ===",
        workbook.part, workbook.app_name, workbook.date1904
    );
    for sheet in &workbook.sheets {
        let rels = container.read_relationships(&sheet.target)?;
        println!(
            "  #{} {:?} id={} target={} hidden={} rels={}",
            sheet.index,
            sheet.name,
            sheet.id,
            sheet.target,
            sheet.hidden,
            rels.len()
        );
    }

    for part in ["xl/styles.xml", "xl/sharedStrings.xml"] {
        println!("\n=== {} (first 2000 chars) ===", part);
        if let Ok(content) = container.read_xml(part) {
            let end = content
                .char_indices()
                .nth(2000)
                .map(|(i, _)| i)
                .unwrap_or(content.len());
            println!("{}", &content[..end]);
        }
    }

    Ok(())
}
