//! On-disk dumps of extracted content.

use std::io::Write;
use std::path::Path;

use super::tools::ExtractionError;
use crate::models::ContentItem;

pub const ALL_CONTENT_JSON: &str = "all_content.json";
pub const ALL_CONTENT_TXT: &str = "all_content.txt";
pub const IMAGES_SUBDIR: &str = "images";

/// Write `all_content.json` and a readable `all_content.txt` to `output_dir`.
pub fn save_all_content(items: &[ContentItem], output_dir: &Path) -> Result<(), ExtractionError> {
    std::fs::create_dir_all(output_dir)?;

    let json = serde_json::to_string_pretty(items)?;
    std::fs::write(output_dir.join(ALL_CONTENT_JSON), json)?;

    let mut txt = std::io::BufWriter::new(std::fs::File::create(output_dir.join(ALL_CONTENT_TXT))?);
    let rule = "=".repeat(80);
    for item in items {
        writeln!(txt, "\n{}", rule)?;
        writeln!(txt, "PAGE {} | TYPE: {}", item.page, item.kind)?;
        writeln!(txt, "{}", rule)?;
        write!(txt, "{}", item.content)?;
        writeln!(txt)?;
    }
    txt.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_all_content_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![
            ContentItem::text(1, "First page"),
            ContentItem::table(2, 1, "Table 1 (Page 2):\n\na | b\n"),
        ];

        save_all_content(&items, dir.path()).unwrap();

        let json = std::fs::read_to_string(dir.path().join(ALL_CONTENT_JSON)).unwrap();
        let parsed: Vec<ContentItem> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, items);

        let txt = std::fs::read_to_string(dir.path().join(ALL_CONTENT_TXT)).unwrap();
        assert!(txt.contains("PAGE 1 | TYPE: text\n"));
        assert!(txt.contains("PAGE 2 | TYPE: table\n"));
        assert!(txt.contains("First page\n"));
    }
}
