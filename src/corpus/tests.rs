use super::*;
use std::io::Write;
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

fn record(title: &str) -> SyntaxRecord {
    SyntaxRecord {
        filename: format!("pages/{title}.html"),
        title: title.to_string(),
        ..SyntaxRecord::default()
    }
}

#[test]
fn classify_by_title_markers() {
    assert_eq!(classify(&record("СтрНайти (Функция)")), "functions");
    assert_eq!(classify(&record("Вставить (Метод)")), "methods");
    assert_eq!(classify(&record("Количество (Свойство)")), "properties");
    assert_eq!(classify(&record("Новый (Оператор)")), "operators");
    assert_eq!(classify(&record("Экспорт (Ключевое слово)")), "keywords");
}

#[test]
fn classify_english_markers_ignore_case() {
    assert_eq!(classify(&record("StrFind (FUNCTION)")), "functions");
    assert_eq!(classify(&record("Insert (Method)")), "methods");
}

#[test]
fn classify_defaults_to_objects() {
    let mut rec = record("ТаблицаЗначений");
    rec.category = Some(PageCategory::Object);
    assert_eq!(classify(&rec), "objects");

    // Unmarked titles without a path category also land in objects.
    assert_eq!(classify(&record("НечтоБезМаркера")), "objects");
}

#[test]
fn builder_seeds_all_categories_in_order() {
    let builder = CorpusBuilder::new();
    let categories: Vec<&str> = builder.corpus.keys().map(String::as_str).collect();
    assert_eq!(categories, CATEGORY_ORDER);
}

#[test]
fn failed_page_is_counted_but_not_classified() {
    let mut builder = CorpusBuilder::new();
    builder.insert_page(
        "broken.html",
        Err(HbkError::Load("truncated entry".to_string())),
    );
    builder.insert_page(
        "methods/ok.html",
        Ok(r#"<h1 class="V8SH_pagetitle">Вставить (Метод)</h1>"#.to_string()),
    );

    assert_eq!(builder.stats.processed, 2);
    assert_eq!(builder.stats.failed, 1);
    let total: usize = builder.corpus.values().map(IndexMap::len).sum();
    assert_eq!(total, 1);
    assert!(builder.corpus["methods"].contains_key("Вставить (Метод)"));
}

#[test]
fn duplicate_title_keeps_last_record() {
    let mut builder = CorpusBuilder::new();
    builder.insert_page(
        "a.html",
        Ok(r#"<h1 class="V8SH_pagetitle">Найти (Метод)</h1>"#.to_string()),
    );
    builder.insert_page(
        "b.html",
        Ok(r#"<h1 class="V8SH_pagetitle">Найти (Метод)</h1>"#.to_string()),
    );

    let methods = &builder.corpus["methods"];
    assert_eq!(methods.len(), 1);
    assert_eq!(methods["Найти (Метод)"].filename, "b.html");
}

#[test]
fn build_processes_archive_in_order_with_limit() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("help.hbk");
    let file = std::fs::File::create(&path).expect("create archive");
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, body) in [
        ("objects/table.html", "<h1 class=\"V8SH_pagetitle\">ТаблицаЗначений</h1>"),
        ("methods/insert.html", "<h1 class=\"V8SH_pagetitle\">Вставить (Метод)</h1>"),
        ("methods/clear.html", "<h1 class=\"V8SH_pagetitle\">Очистить (Метод)</h1>"),
    ] {
        writer.start_file(name, options).expect("start file");
        writer.write_all(body.as_bytes()).expect("write entry");
    }
    writer.finish().expect("finish archive");

    let mut archive = HelpArchive::open(&path).expect("open archive");
    let (corpus, stats) = CorpusBuilder::new()
        .build(&mut archive, Some(2))
        .expect("build corpus");

    assert_eq!(stats.processed, 2);
    assert_eq!(stats.failed, 0);
    assert!(corpus["objects"].contains_key("ТаблицаЗначений"));
    assert!(corpus["methods"].contains_key("Вставить (Метод)"));
    assert!(!corpus["methods"].contains_key("Очистить (Метод)"));
    assert_eq!(stats.per_category["methods"], 1);
}

#[test]
fn corpus_roundtrip_preserves_order() {
    let mut builder = CorpusBuilder::new();
    for title in ["Б (Метод)", "А (Метод)", "В (Метод)"] {
        builder.insert_page(
            &format!("{title}.html"),
            Ok(format!(r#"<h1 class="V8SH_pagetitle">{title}</h1>"#)),
        );
    }

    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("corpus.json");
    save_corpus(&builder.corpus, &path).expect("save corpus");
    let loaded = load_corpus(&path).expect("load corpus");

    let titles: Vec<&str> = loaded["methods"].keys().map(String::as_str).collect();
    assert_eq!(titles, vec!["Б (Метод)", "А (Метод)", "В (Метод)"]);
}

#[test]
fn load_missing_corpus_is_a_load_error() {
    let dir = TempDir::new().expect("temp dir");
    let result = load_corpus(&dir.path().join("absent.json"));
    assert!(matches!(result, Err(HbkError::Load(_))));
}

#[test]
fn find_by_pattern_searches_title_syntax_description() {
    let mut corpus = Corpus::new();
    let mut rec = record("СтрНайти (Функция)");
    rec.syntax = "СтрНайти(<Строка>, <ПодстрокаПоиска>)".to_string();
    rec.description = "Ищет вхождение подстроки.".to_string();
    corpus
        .entry("functions".to_string())
        .or_default()
        .insert(rec.title.clone(), rec);

    assert_eq!(find_by_pattern(&corpus, "стрнайти").len(), 1);
    assert_eq!(find_by_pattern(&corpus, "ПОДСТРОК").len(), 1);
    assert!(find_by_pattern(&corpus, "отсутствует").is_empty());
}

#[test]
fn markdown_render_includes_sections() {
    let mut corpus = Corpus::new();
    let mut rec = record("Сообщить (Функция)");
    rec.syntax = "Сообщить(<Текст>)".to_string();
    rec.description = "Выводит сообщение.".to_string();
    rec.example = "Сообщить(\"Привет\");".to_string();
    corpus
        .entry("functions".to_string())
        .or_default()
        .insert(rec.title.clone(), rec);
    corpus.insert("operators".to_string(), IndexMap::new());

    let markdown = corpus_to_markdown(&corpus);
    assert!(markdown.contains("## Functions"));
    assert!(markdown.contains("### Сообщить (Функция)"));
    assert!(markdown.contains("**Синтаксис:** `Сообщить(<Текст>)`"));
    assert!(markdown.contains("```bsl\nСообщить(\"Привет\");\n```"));
    // Empty categories are omitted entirely.
    assert!(!markdown.contains("## Operators"));
}
