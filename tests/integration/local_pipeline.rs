//! Hand-assembled layout pipeline integration test.
//!
//! Connects tessera-cas + tessera-placement + tessera-store directly, without
//! the engine, and checks the pieces compose into a readable layout.

use std::path::Path;

use bytes::Bytes;
use tessera_cas::{LineChunker, ManifestWriter, load_manifest};
use tessera_engine::audit_store;
use tessera_integration_tests::test_text_seeded;
use tessera_placement::{PlacementSelector, RandomSelector};
use tessera_store::{MemoryStore, PartitionStore};
use tessera_types::{ChunkRecord, FileRecord, Manifest};

/// Chunk `data`, place every chunk, and return the file's record.
async fn place(
    file_path: &str,
    data: &[u8],
    chunker: &LineChunker,
    selector: &dyn PlacementSelector,
    store: &dyn PartitionStore,
    partitions: u32,
    copies: u32,
) -> FileRecord {
    let rel = Path::new(file_path);
    store.mirror(rel).await.unwrap();

    let mut record = FileRecord::new(file_path);
    for chunk in chunker.chunk(data) {
        let placed = selector.select(partitions, copies).unwrap();
        for &partition in &placed {
            store
                .put_chunk(partition, rel, chunk.sequence, chunk.data.clone())
                .await
                .unwrap();
        }
        record.chunks.push(ChunkRecord {
            sequence: chunk.sequence,
            size: chunk.size(),
            partitions: placed,
        });
    }
    record
}

/// Read a file back through the store using the first listed copy.
async fn read_back(record: &FileRecord, store: &dyn PartitionStore) -> Vec<u8> {
    let mut data = Vec::new();
    for chunk in &record.chunks {
        let copy: Bytes = store
            .get_chunk(chunk.partitions[0], Path::new(&record.file_path), chunk.sequence)
            .await
            .unwrap()
            .unwrap();
        data.extend_from_slice(&copy);
    }
    data
}

#[tokio::test]
async fn test_local_pipeline_roundtrip() {
    let (partitions, copies) = (4, 2);
    let store = MemoryStore::new();
    store.create_partitions(partitions).await.unwrap();
    let chunker = LineChunker::new(512);
    let selector = RandomSelector::seeded(99);

    let files: Vec<(String, Vec<u8>)> = (0..6)
        .map(|i| (format!("shard-{i}/data.txt"), test_text_seeded(80 + i * 40, 60, i as u32)))
        .collect();

    let out = tempfile::tempdir().unwrap();
    let mut writer = ManifestWriter::new(out.path());
    for (path, data) in &files {
        let record = place(path, data, &chunker, &selector, &store, partitions, copies).await;
        writer.record(record);
    }
    let (manifest_path, written) = writer.finish().await.unwrap();

    let loaded = load_manifest(&manifest_path).await.unwrap();
    assert_eq!(loaded, written);
    assert_eq!(loaded.len(), files.len());

    for ((path, data), record) in files.iter().zip(&loaded.files) {
        assert_eq!(&record.file_path, path);
        assert_eq!(record.total_size(), data.len() as u64);
        assert_eq!(&read_back(record, &store).await, data);
    }

    let audit = audit_store(&loaded, &store).await.unwrap();
    assert!(audit.is_clean(), "violations: {:?}", audit.violations);
    assert_eq!(store.copy_count(), loaded.chunk_count() * copies as usize);
}

#[tokio::test]
async fn test_streamed_and_buffered_chunking_agree() {
    let data = test_text_seeded(300, 90, 5);
    let chunker = LineChunker::new(700);

    let buffered = chunker.chunk(&data);
    let mut reader = chunker.reader(&data[..]);
    let mut streamed = Vec::new();
    while let Some(chunk) = reader.next_chunk().await.unwrap() {
        streamed.push(chunk);
    }

    assert_eq!(streamed.len(), buffered.len());
    for (a, b) in streamed.iter().zip(&buffered) {
        assert_eq!(a.sequence, b.sequence);
        assert_eq!(a.data, b.data);
    }
}

#[tokio::test]
async fn test_empty_manifest_document() {
    let out = tempfile::tempdir().unwrap();
    let (path, manifest) = ManifestWriter::new(out.path()).finish().await.unwrap();
    assert_eq!(manifest, Manifest::new());
    assert_eq!(std::fs::read_to_string(path).unwrap(), "[]");
}
