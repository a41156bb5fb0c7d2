use super::*;
use std::io::Write;
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

fn build_archive(entries: &[(&str, &[u8])]) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("help.hbk");
    let file = File::create(&path).expect("create archive");
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, bytes) in entries {
        writer.start_file(*name, options).expect("start file");
        writer.write_all(bytes).expect("write entry");
    }
    writer.finish().expect("finish archive");
    (dir, path)
}

#[test]
fn lists_entries_in_archive_order() {
    let (_dir, path) = build_archive(&[
        ("objects/catalog.html", b"<html></html>"),
        ("methods/insert.html", b"<html></html>"),
        ("root.st", b"st data"),
    ]);

    let archive = HelpArchive::open(&path).expect("open archive");
    assert_eq!(
        archive.list_entries(),
        &[
            "objects/catalog.html".to_string(),
            "methods/insert.html".to_string(),
            "root.st".to_string(),
        ]
    );
    assert_eq!(
        archive.html_entries(),
        vec!["objects/catalog.html", "methods/insert.html"]
    );
}

#[test]
fn reads_utf8_entry() {
    let (_dir, path) = build_archive(&[("page.html", "Синтаксис".as_bytes())]);
    let mut archive = HelpArchive::open(&path).expect("open archive");
    let text = archive.read_entry_text("page.html").expect("read entry");
    assert_eq!(text, "Синтаксис");
}

#[test]
fn falls_back_to_windows_1251() {
    // "Пример" encoded as windows-1251, which is invalid UTF-8.
    let cp1251: &[u8] = &[0xCF, 0xF0, 0xE8, 0xEC, 0xE5, 0xF0];
    let (_dir, path) = build_archive(&[("legacy.html", cp1251)]);
    let mut archive = HelpArchive::open(&path).expect("open archive");
    let text = archive.read_entry_text("legacy.html").expect("read entry");
    assert_eq!(text, "Пример");
}

#[test]
fn open_rejects_non_zip() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("bogus.hbk");
    std::fs::write(&path, b"not a zip").expect("write file");
    assert!(matches!(
        HelpArchive::open(&path),
        Err(crate::HbkError::Archive(_))
    ));
}

#[test]
fn structure_counts_types_and_categories() {
    let big = "x".repeat(20_000);
    let (_dir, path) = build_archive(&[
        ("objects/a.html", b"<html></html>"),
        ("objects/b.html", big.as_bytes()),
        ("methods/c.html", b"<html></html>"),
        ("root.st", b"st"),
    ]);

    let mut archive = HelpArchive::open(&path).expect("open archive");
    let structure = archive.analyze_structure().expect("analyze");

    assert_eq!(structure.total_files, 4);
    assert_eq!(structure.html_files, 3);
    assert_eq!(structure.st_files, 1);
    assert_eq!(structure.file_types[".html"], 3);
    assert_eq!(structure.categories["objects"], 2);
    assert_eq!(structure.categories["methods"], 1);
    assert_eq!(structure.largest_files.len(), 1);
    assert_eq!(structure.largest_files[0].name, "objects/b.html");
}
