/// mktest — generate deterministic test data under testdata/
///
/// Run with: cargo run --bin mktest
///
/// Wipes and recreates testdata/ from scratch. Expected duplicate groups:
///   "hello world\n"   — 4 files (3 with --skip-hidden)  — 12 bytes each
///   "roses are red\n" — 2 files                    — 14 bytes each
///   128 KB 0xAB block — 2 files                    — 131072 bytes each
///   "" (empty)        — 2 files                    — dropped by --min-size 1
///
/// Decoys: "roses are RED\n" has the same size as the poem but different
/// content; LICENSE has no extension and is dropped by --require-extension.
///
/// Symlink layout (Unix only):
///   testdata/gamma/alpha_link -> ../alpha
///   Used to test --follow-symlinks behaviour.

use std::fs;
use std::io::Write;
use std::path::Path;

fn main() {
    let root = Path::new("testdata");

    // Wipe and recreate
    if root.exists() {
        fs::remove_dir_all(root).expect("remove testdata");
    }
    fs::create_dir_all(root).expect("create testdata");

    // ── alpha/ ────────────────────────────────────────────────────────────────
    let alpha = root.join("alpha");
    let alpha_nested = alpha.join("nested");
    fs::create_dir_all(&alpha_nested).expect("create alpha/nested");
    write_file(&alpha.join("hello.txt"), b"hello world\n");
    write_file(&alpha.join("unique_a.txt"), b"unique content alpha\n");
    write_file(&alpha_nested.join("hello_copy.txt"), b"hello world\n");
    write_file(&alpha_nested.join("empty.log"), b"");

    // ── beta/ ─────────────────────────────────────────────────────────────────
    let beta = root.join("beta");
    let beta_subdir = beta.join("subdir");
    fs::create_dir_all(&beta_subdir).expect("create beta/subdir");
    write_file(&beta.join("LICENSE"), b"hello world\n");
    write_file(&beta.join("empty.log"), b"");
    write_file(&beta_subdir.join("poem.txt"), b"roses are red\n");
    write_file(&beta_subdir.join("poem_shout.txt"), b"roses are RED\n");

    // ── gamma/ ────────────────────────────────────────────────────────────────
    let gamma = root.join("gamma");
    fs::create_dir_all(&gamma).expect("create gamma");
    write_file(&gamma.join("poem_copy.txt"), b"roses are red\n");

    // Symlink: gamma/alpha_link -> ../alpha
    // Without --follow-symlinks the link is ignored; with it, the canonical
    // path check keeps alpha's files from being counted twice.
    #[cfg(unix)]
    std::os::unix::fs::symlink("../alpha", gamma.join("alpha_link"))
        .unwrap_or_else(|e| eprintln!("warning: could not create symlink: {e}"));

    // ── large/ ────────────────────────────────────────────────────────────────
    let large = root.join("large");
    fs::create_dir_all(&large).expect("create large");
    let big_data = vec![0xABu8; 128 * 1024];
    write_file(&large.join("big.bin"), &big_data);
    write_file(&large.join("big_copy.bin"), &big_data);

    // ── hidden/ ───────────────────────────────────────────────────────────────
    let hidden = root.join("hidden");
    fs::create_dir_all(&hidden).expect("create hidden");
    write_file(&hidden.join(".hidden_dup.txt"), b"hello world\n");
    write_file(&hidden.join("visible.txt"), b"visible only\n");

    // ── Summary ───────────────────────────────────────────────────────────────
    println!("Test data created under testdata/");
    println!();
    println!("Expected duplicate groups:");
    println!("  \"hello world\\n\"    4 files   12 bytes each (3 with --skip-hidden, 3 with --require-extension)");
    println!("  \"roses are red\\n\"  2 files   14 bytes each");
    println!("  128 KB 0xAB block  2 files   131072 bytes each");
    println!("  empty files        2 files   0 bytes each");
    println!();
    println!("Test commands:");
    println!("  cargo run -- testdata");
    println!("  cargo run -- testdata --skip-hidden");
    println!("  cargo run -- testdata --min-size 1 --require-extension");
    println!("  cargo run -- testdata/alpha testdata/beta testdata/gamma testdata/large");
    println!("  cargo run -- testdata testdata/alpha        # nested root is dropped");
    println!("  cargo run -- testdata --follow-symlinks     # link followed, no double-count");
    println!("  cargo run -- testdata --verify --json");
}

fn write_file(path: &Path, content: &[u8]) {
    let mut f = fs::File::create(path)
        .unwrap_or_else(|e| panic!("create {}: {}", path.display(), e));
    f.write_all(content)
        .unwrap_or_else(|e| panic!("write {}: {}", path.display(), e));
}
