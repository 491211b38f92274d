use file_external::engine::{
    normalize_lexically, path_relative_to, path_to_display_string, resolve_line, resolve_root,
};
use file_external::pipeline::{
    AbortableLines, BatchMode, Batcher, CancellationToken, LineError, Overflow, decode_line,
    display_word, entry_kind, mtime_ms, spawn_line_reader,
};
use crossbeam_channel::{Receiver, unbounded};
use file_external::utils::{FIRST_BATCH_SIZE, apply_file_to_opts, parse_config_file};
use file_external::{EntryKind, Opts, ResolvedEntry, SearchParams, SearchRequest};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, UNIX_EPOCH};

fn entry(word: &str) -> ResolvedEntry {
    ResolvedEntry {
        word: word.to_string(),
        path: PathBuf::from("/root").join(word),
        kind: EntryKind::File,
        is_link: false,
        size: 0,
        mtime_ms: None,
    }
}

// --- path helpers ---

#[test]
fn test_path_relative_under_base() {
    let base = PathBuf::from("/foo/bar");
    let path = PathBuf::from("/foo/bar/baz/qux");
    assert_eq!(
        path_relative_to(&path, &base),
        Some(PathBuf::from("baz/qux"))
    );
}

#[test]
fn test_path_relative_not_under_base() {
    let base = PathBuf::from("/foo/bar");
    assert_eq!(
        path_relative_to(Path::new("/other/qux"), &base),
        Some(PathBuf::from("../../other/qux"))
    );
    assert_eq!(
        path_relative_to(Path::new("/foo/sib/x.txt"), &base),
        Some(PathBuf::from("../sib/x.txt"))
    );
    assert_eq!(
        path_relative_to(Path::new("/foo"), &base),
        Some(PathBuf::from(".."))
    );
}

#[test]
fn test_path_relative_no_shared_root() {
    assert_eq!(
        path_relative_to(Path::new("other/qux"), Path::new("/foo/bar")),
        None
    );
}

#[test]
fn test_path_to_display_string_forward_slashes() {
    assert_eq!(
        path_to_display_string(&PathBuf::from("src/main.rs")),
        "src/main.rs"
    );
}

#[cfg(unix)]
#[test]
fn test_normalize_lexically_dots() {
    assert_eq!(
        normalize_lexically(Path::new("/r/a/./b/../c")),
        PathBuf::from("/r/a/c")
    );
    assert_eq!(normalize_lexically(Path::new("/../x")), PathBuf::from("/x"));
}

#[cfg(unix)]
#[test]
fn test_resolve_line_relative_and_absolute() {
    let root = Path::new("/r");
    assert_eq!(resolve_line(root, "a.txt"), PathBuf::from("/r/a.txt"));
    assert_eq!(resolve_line(root, "./src/lib.rs"), PathBuf::from("/r/src/lib.rs"));
    assert_eq!(resolve_line(root, "b/"), PathBuf::from("/r/b"));
    assert_eq!(resolve_line(root, "/etc/hosts"), PathBuf::from("/etc/hosts"));
    assert_eq!(resolve_line(root, "."), PathBuf::from("/r"));
}

#[test]
fn test_resolve_root_empty_is_current_dir() {
    let cwd = std::env::current_dir().unwrap();
    assert_eq!(resolve_root("").unwrap(), cwd);
    assert_eq!(resolve_root(".").unwrap(), normalize_lexically(&cwd));
}

#[test]
fn test_resolve_root_relative_becomes_absolute() {
    let resolved = resolve_root("some/dir").unwrap();
    assert!(resolved.is_absolute());
    assert!(resolved.ends_with("some/dir"));
}

// --- classification helpers ---

#[test]
fn test_entry_kind_precedence() {
    assert_eq!(entry_kind(true, true, false), Some(EntryKind::Directory));
    assert_eq!(entry_kind(false, true, true), Some(EntryKind::Symlink));
    assert_eq!(entry_kind(false, false, true), Some(EntryKind::File));
    assert_eq!(entry_kind(false, false, false), None);
}

#[cfg(unix)]
#[test]
fn test_display_word_suffixes_directories_only() {
    let root = Path::new("/r");
    assert_eq!(
        display_word(Path::new("/r/b"), root, EntryKind::Directory),
        "b/"
    );
    assert_eq!(
        display_word(Path::new("/r/a.txt"), root, EntryKind::File),
        "a.txt"
    );
    assert_eq!(
        display_word(Path::new("/r/link"), root, EntryKind::Symlink),
        "link"
    );
    assert_eq!(display_word(Path::new("/r"), root, EntryKind::Directory), "./");
    assert_eq!(
        display_word(Path::new("/elsewhere/x"), root, EntryKind::File),
        "../elsewhere/x"
    );
    assert_eq!(
        display_word(Path::new("/sib"), Path::new("/r/deep"), EntryKind::Directory),
        "../../sib/"
    );
}

#[test]
fn test_mtime_ms_before_and_after_epoch() {
    assert_eq!(mtime_ms(UNIX_EPOCH), Some(0));
    assert_eq!(mtime_ms(UNIX_EPOCH + Duration::from_millis(1500)), Some(1500));
    assert_eq!(mtime_ms(UNIX_EPOCH - Duration::from_millis(2500)), Some(-2500));
}

// --- batcher ---

#[test]
fn test_batcher_first_then_steady() {
    let mut batcher = Batcher::new(2, 3);
    let mut sizes = Vec::new();
    for i in 0..8 {
        if let Some(batch) = batcher.push(entry(&format!("f{i}"))) {
            sizes.push(batch.len());
        }
    }
    assert_eq!(sizes, vec![2, 3, 3]);
    assert_eq!(batcher.finish(), None);
    assert_eq!(batcher.flushed(), 3);
}

#[test]
fn test_batcher_mode_switches_once_after_first_flush() {
    let mut batcher = Batcher::new(2, 100);
    assert_eq!(batcher.mode(), BatchMode::First);
    assert_eq!(batcher.threshold(), 2);
    assert!(batcher.push(entry("a")).is_none());
    assert_eq!(batcher.mode(), BatchMode::First);
    assert!(batcher.push(entry("b")).is_some());
    assert_eq!(batcher.mode(), BatchMode::Steady);
    assert_eq!(batcher.threshold(), 100);
    for i in 0..99 {
        assert!(batcher.push(entry(&format!("s{i}"))).is_none());
    }
    assert_eq!(batcher.push(entry("last")).map(|b| b.len()), Some(100));
    assert_eq!(batcher.mode(), BatchMode::Steady);
}

#[test]
fn test_batcher_final_partial_batch_preserves_order() {
    let mut batcher = Batcher::new(3, 10);
    assert!(batcher.push(entry("a")).is_none());
    assert!(batcher.push(entry("b")).is_none());
    assert_eq!(batcher.pending(), 2);
    let batch = batcher.finish().unwrap();
    let words: Vec<&str> = batch.iter().map(|e| e.word.as_str()).collect();
    assert_eq!(words, vec!["a", "b"]);
    assert_eq!(batcher.pending(), 0);
    assert_eq!(batcher.finish(), None);
}

#[test]
fn test_batcher_empty_stream_has_no_batch() {
    let mut batcher = Batcher::new(FIRST_BATCH_SIZE, 10);
    assert_eq!(batcher.finish(), None);
    assert_eq!(batcher.flushed(), 0);
}

#[test]
fn test_batcher_zero_thresholds_clamped() {
    let mut batcher = Batcher::new(0, 0);
    assert_eq!(batcher.push(entry("a")).map(|b| b.len()), Some(1));
    assert_eq!(batcher.push(entry("b")).map(|b| b.len()), Some(1));
}

// --- cancellation token ---

#[test]
fn test_token_fires_once() {
    let token = CancellationToken::new();
    let other = token.clone();
    assert!(!token.is_fired());
    assert!(other.fire());
    assert!(!token.fire());
    assert!(token.is_fired());
    token.wait();
}

#[test]
fn test_token_wakes_waiting_thread() {
    let token = CancellationToken::new();
    let waiter = {
        let token = token.clone();
        thread::spawn(move || token.wait())
    };
    thread::sleep(Duration::from_millis(20));
    token.fire();
    waiter.join().unwrap();
}

// --- line decoder ---

#[test]
fn test_decode_line_strips_terminators() {
    assert_eq!(decode_line(b"a.txt\n"), Some("a.txt".to_string()));
    assert_eq!(decode_line(b"crlf\r\n"), Some("crlf".to_string()));
    assert_eq!(decode_line(b"tail"), Some("tail".to_string()));
    assert_eq!(decode_line(b"\n"), None);
    assert_eq!(decode_line(b""), None);
    assert_eq!(decode_line(b"bad\xffbyte\n"), Some("bad\u{fffd}byte".to_string()));
}

#[test]
fn test_abortable_lines_reads_to_end() {
    let source = spawn_line_reader(Cursor::new(b"a\n\nb\r\nc".to_vec()), 16, Overflow::Block);
    let lines: Vec<String> = AbortableLines::new(source, CancellationToken::new())
        .map(|l| l.unwrap())
        .collect();
    assert_eq!(lines, vec!["a", "b", "c"]);
}

/// Reader that hands out chunks from a channel and blocks until one arrives.
struct ChannelReader(Receiver<Vec<u8>>);

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.0.recv() {
            Ok(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                Ok(n)
            }
            Err(_) => Ok(0),
        }
    }
}

#[test]
fn test_abortable_lines_aborts_blocked_pull() {
    let (chunk_tx, chunk_rx) = unbounded::<Vec<u8>>();
    chunk_tx.send(b"first\n".to_vec()).unwrap();
    let token = CancellationToken::new();
    let mut lines = AbortableLines::new(
        spawn_line_reader(ChannelReader(chunk_rx), 16, Overflow::Block),
        token.clone(),
    );
    assert_eq!(lines.next().unwrap().unwrap(), "first");

    let firer = {
        let token = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            token.fire();
        })
    };
    assert!(matches!(lines.next(), Some(Err(LineError::Aborted))));
    assert!(lines.next().is_none());
    firer.join().unwrap();
    drop(chunk_tx);
}

#[test]
fn test_line_reader_drop_overflow_counts() {
    let data = (0..10).map(|i| format!("line{i}\n")).collect::<String>();
    let source = spawn_line_reader(Cursor::new(data.into_bytes()), 3, Overflow::Drop);
    // Let the reader finish before pulling so the overflow path is taken.
    thread::sleep(Duration::from_millis(50));
    let mut lines = AbortableLines::new(source, CancellationToken::new());
    let received: Vec<String> = lines.by_ref().map(|l| l.unwrap()).collect();
    assert_eq!(received, vec!["line0", "line1", "line2"]);
    assert_eq!(lines.source().dropped(), 7);
}

// --- request / config ---

#[test]
fn test_search_request_defaults() {
    let params = SearchParams::default();
    assert!(params.cmd.is_empty());
    assert_eq!(params.update_items, 100_000);
    let request = SearchRequest::new("/tmp", params);
    assert_eq!(request.first_batch_size, FIRST_BATCH_SIZE);
    assert_eq!(request.first_batch_size, 1000);
    assert_eq!(request.update_items, 100_000);
}

#[test]
fn test_config_file_applies_present_fields() {
    let text = r#"
[settings]
cmd = ["fd", "--type", "f"]
update_items = 500
json = true
"#;
    let file = parse_config_file(text, Path::new(".file-external.toml")).unwrap();
    let mut opts = Opts::default();
    apply_file_to_opts(&file, &mut opts);
    assert_eq!(opts.cmd, vec!["fd", "--type", "f"]);
    assert_eq!(opts.update_items, 500);
    assert_eq!(opts.first_batch, FIRST_BATCH_SIZE);
    assert!(opts.json);
    assert!(!opts.verbose);
}

#[test]
fn test_config_file_invalid_is_none() {
    assert!(parse_config_file("[settings]\ncmd = 3", Path::new("x.toml")).is_none());
}

#[test]
fn test_resolved_entry_serializes_kind_lowercase() {
    let json = serde_json::to_string(&entry("a.txt")).unwrap();
    assert!(json.contains(r#""kind":"file""#));
    assert!(json.contains(r#""word":"a.txt""#));
}
