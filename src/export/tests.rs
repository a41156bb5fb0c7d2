use super::*;
use crate::context::ItemMetadata;
use tempfile::TempDir;

fn item(category: &str, n: usize, content: &str) -> ContextItem {
    ContextItem {
        id: format!("{category}_{n}"),
        title: format!("Элемент {n}"),
        category: category.to_string(),
        content: content.to_string(),
        metadata: ItemMetadata::default(),
    }
}

fn settings(max_kb: usize, max_items: usize) -> ExportSettings {
    ExportSettings {
        max_file_size_kb: max_kb,
        max_items_per_file: max_items,
        ..ExportSettings::default()
    }
}

#[test]
fn chunking_101_items_by_count_yields_50_50_1() {
    let items: Vec<ContextItem> = (0..101).map(|n| item("methods", n, "x")).collect();
    let refs: Vec<&ContextItem> = items.iter().collect();
    // Byte budget far above what 50 tiny items need.
    let chunks = split_into_chunks(&refs, &settings(10240, 50));

    let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![50, 50, 1]);
    // Original order is preserved across chunk boundaries.
    assert_eq!(chunks[1][0].id, "methods_50");
    assert_eq!(chunks[2][0].id, "methods_100");
}

#[test]
fn chunking_respects_byte_budget() {
    // Each item serializes to roughly 2 KB; a 5 KB budget fits two.
    let body = "д".repeat(1024);
    let items: Vec<ContextItem> = (0..6).map(|n| item("objects", n, &body)).collect();
    let refs: Vec<&ContextItem> = items.iter().collect();
    let chunks = split_into_chunks(&refs, &settings(5, 50));

    assert!(chunks.len() >= 3);
    for chunk in &chunks {
        if chunk.len() >= 2 {
            let serialized: usize = chunk
                .iter()
                .map(|i| serde_json::to_string(i).map_or(0, |s| s.len()))
                .sum();
            assert!(serialized <= 5 * 1024);
        }
    }
}

#[test]
fn oversized_single_item_still_gets_a_chunk() {
    let big = item("objects", 0, &"я".repeat(4096));
    let small = item("objects", 1, "мал");
    let refs: Vec<&ContextItem> = vec![&big, &small];
    let chunks = split_into_chunks(&refs, &settings(1, 50));

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].len(), 1);
    assert_eq!(chunks[0][0].id, "objects_0");
    assert_eq!(chunks[1][0].id, "objects_1");
}

#[test]
fn empty_input_yields_no_chunks() {
    let chunks = split_into_chunks(&[], &settings(50, 50));
    assert!(chunks.is_empty());
}

#[test]
fn export_writes_chunks_and_consistent_indices() {
    let mut items: Vec<ContextItem> = (0..101).map(|n| item("methods", n, "x")).collect();
    items.extend((0..3).map(|n| item("objects", n, "y")));

    let dir = TempDir::new().expect("temp dir");
    let summary = export_split(&items, dir.path(), "full_split", &settings(10240, 50))
        .expect("export");

    assert_eq!(summary.total_items, 104);
    assert_eq!(summary.write_failures, 0);
    assert_eq!(summary.total_files, 4);
    assert_eq!(summary.per_category["methods"], (101, 3));
    assert_eq!(summary.per_category["objects"], (3, 1));

    let main: MainIndex = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("main_index.json")).expect("main index"),
    )
    .expect("parse main index");
    assert_eq!(main.total_items, 104);
    assert_eq!(main.mode, "full_split");
    assert_eq!(main.settings.max_items_per_file, 50);

    for (category, summary_entry) in &main.categories {
        let category_dir = dir.path().join(category);
        let index: CategoryIndex = serde_json::from_str(
            &std::fs::read_to_string(category_dir.join(format!("{category}_index.json")))
                .expect("category index"),
        )
        .expect("parse category index");

        assert_eq!(index.total_items, summary_entry.items_count);
        assert_eq!(index.total_chunks, summary_entry.chunks_count);
        assert_eq!(index.chunks, summary_entry.files);

        // Sum of per-chunk counts equals both index totals.
        let mut chunk_sum = 0;
        for filename in &index.chunks {
            let chunk: ChunkFile = serde_json::from_str(
                &std::fs::read_to_string(category_dir.join(filename)).expect("chunk file"),
            )
            .expect("parse chunk");
            assert_eq!(chunk.metadata.items_count, chunk.items.len());
            assert_eq!(chunk.metadata.total_chunks, index.total_chunks);
            chunk_sum += chunk.items.len();
        }
        assert_eq!(chunk_sum, index.total_items);
    }
}

#[test]
fn chunk_filenames_are_one_based_and_zero_padded() {
    let items: Vec<ContextItem> = (0..120).map(|n| item("functions", n, "x")).collect();
    let dir = TempDir::new().expect("temp dir");
    export_split(&items, dir.path(), "full_split", &settings(10240, 50)).expect("export");

    let category_dir = dir.path().join("functions");
    assert!(category_dir.join("functions_001.json").exists());
    assert!(category_dir.join("functions_002.json").exists());
    assert!(category_dir.join("functions_003.json").exists());
    assert!(!category_dir.join("functions_004.json").exists());
}

#[test]
fn prefix_is_applied_to_chunk_filenames() {
    let items = vec![item("methods", 0, "x")];
    let dir = TempDir::new().expect("temp dir");
    let settings = ExportSettings {
        prefix: "optimized".to_string(),
        ..ExportSettings::default()
    };
    export_split(&items, dir.path(), "optimized_split", &settings).expect("export");

    assert!(
        dir.path()
            .join("methods")
            .join("optimized_methods_001.json")
            .exists()
    );
}
