//! Torture test for layout generation.
//!
//! Sweeps file sizes around chunk boundaries and every partition/copy
//! combination on small clusters, checking reconstruction and audit each time.

use tessera_engine::GenerationReport;
use tessera_integration_tests::{Workspace, layout, test_text_seeded};
use tessera_types::LayoutConfig;

async fn generate_and_check(ws: &Workspace, config: LayoutConfig) -> GenerationReport {
    let report = ws.generate(config).await;

    let audit = ws.audit().await;
    assert!(
        audit.is_clean(),
        "config {config:?}: violations {:?}",
        audit.violations
    );

    for record in &ws.manifest().await.files {
        let original = std::fs::read(ws.input.path().join(&record.file_path)).unwrap();
        assert_eq!(ws.reconstruct(record).await, original, "{}", record.file_path);
        for chunk in &record.chunks {
            assert_eq!(chunk.partitions.len(), config.copies as usize);
        }
    }
    report
}

// =========================================================================
// 1. Size spectrum
// =========================================================================

/// Files whose sizes sit just below, at, and just above the chunk target,
/// plus lines longer than the target.
#[tokio::test]
#[ntest::timeout(60000)]
async fn test_size_spectrum_around_target() {
    let target = 64u64;
    let ws = Workspace::new();

    for len in [1usize, 2, 63, 64, 65, 127, 128, 129, 1000] {
        // One line of `len` bytes including its newline.
        let mut line = vec![b'x'; len - 1];
        line.push(b'\n');
        ws.write(&format!("single/{len:04}.txt"), &line);

        // Two-byte lines adding up to `len` (rounded down to even).
        let pairs: Vec<u8> = b"y\n".iter().copied().cycle().take(len / 2 * 2).collect();
        ws.write(&format!("pairs/{len:04}.txt"), &pairs);
    }
    ws.write("nonl/tail.txt", b"no trailing newline at all");

    let report = generate_and_check(&ws, layout(3, 2, target)).await;
    let manifest = ws.manifest().await;
    assert_eq!(report.files, manifest.len());

    for record in &manifest.files {
        for chunk in &record.chunks {
            assert!(chunk.size > 0);
        }
        if record.file_path.starts_with("pairs") {
            assert!(record.chunks.iter().all(|c| c.size <= target));
        }
    }
}

// =========================================================================
// 2. Partition/copy grid
// =========================================================================

#[tokio::test]
#[ntest::timeout(120000)]
async fn test_every_partition_copy_combination() {
    for partitions in 1..=5u32 {
        for copies in 1..=partitions {
            let ws = Workspace::new();
            ws.write("a.txt", &test_text_seeded(120, 30, partitions * 10 + copies));
            ws.write("b/c.txt", &test_text_seeded(40, 200, copies));

            let report = generate_and_check(&ws, layout(partitions, copies, 256)).await;
            assert_eq!(
                report.copies_written,
                report.chunks * copies as usize,
                "p={partitions} c={copies}"
            );
        }
    }
}

// =========================================================================
// 3. Wide trees, concurrent placement
// =========================================================================

#[tokio::test]
#[ntest::timeout(120000)]
async fn test_wide_tree_with_concurrency() {
    let ws = Workspace::new();
    for i in 0..60u32 {
        ws.write(
            &format!("d{}/e{}/f-{i:02}.txt", i % 5, i % 3),
            &test_text_seeded(20 + i as usize * 5, 70, i),
        );
    }

    let config = LayoutConfig {
        concurrency: 8,
        ..layout(7, 3, 400)
    };
    let report = generate_and_check(&ws, config).await;
    assert_eq!(report.files, 60);

    let paths: Vec<String> = ws
        .manifest()
        .await
        .files
        .into_iter()
        .map(|f| f.file_path)
        .collect();
    let mut sorted = paths.clone();
    sorted.sort();
    assert_eq!(paths, sorted, "manifest must follow traversal order");
}

// =========================================================================
// 4. Placement spread
// =========================================================================

/// With many chunks, random placement should reach every partition.
#[tokio::test]
#[ntest::timeout(60000)]
async fn test_random_placement_reaches_every_partition() {
    let ws = Workspace::new();
    ws.write("big.txt", &test_text_seeded(2000, 20, 77));
    generate_and_check(&ws, layout(6, 1, 64)).await;

    let mut used = [0usize; 6];
    for chunk in &ws.manifest().await.files[0].chunks {
        used[chunk.partitions[0].get() as usize - 1] += 1;
    }
    assert!(used.iter().all(|&n| n > 0), "uneven placement: {used:?}");
}
