use anyhow::Result;
use ironcsv::parallel::split;
use ironcsv::testing::{
    Person, PersonCodec, assert_documents_equal, fixture_file, person_file_content, person_rows,
};
use ironcsv::{
    Error, FnCodec, LineStore, ReadMode, ReadOptions, SingleTypeCodec, read_from_bytes,
    read_from_file,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG=ironcsv=debug cargo test` shows chunking and pool activity.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn header_and_two_rows() -> Result<()> {
    let (_dir, path) = fixture_file("persons.csv", "Names,Age\nBin,3\nBen,5\n")?;
    for opts in [ReadOptions::sequential(), ReadOptions::default()] {
        let doc = read_from_file(&path, PersonCodec, &opts)?;
        assert_eq!(doc.header, vec!["Names", "Age"]);
        assert_eq!(doc.rows, vec![Person::new("Bin", 3), Person::new("Ben", 5)]);
    }
    Ok(())
}

#[test]
fn header_only_file_dispatches_nothing() -> Result<()> {
    init_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let codec = FnCodec::new(
        |p: &Person, d| Ok(format!("{}{d}{}", p.name, p.age)),
        move |line, d| {
            seen.fetch_add(1, Ordering::SeqCst);
            ironcsv::RecordCodec::decode(&PersonCodec, line, d)
        },
    );
    let doc = read_from_bytes(&b"Names,Age\n"[..], codec, &ReadOptions::parallel(8))?;
    assert_eq!(doc.header, vec!["Names", "Age"]);
    assert!(doc.rows.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let mut store = LineStore::from_bytes(&b"Names,Age\n"[..]);
    store.next_line();
    assert!(split(&mut store, 1024)?.is_empty());
    Ok(())
}

#[test]
fn line_longer_than_chunk_is_one_chunk() -> Result<()> {
    let long_name = "x".repeat(10_000);
    let content = format!("Names,Age\n{long_name},41\nshort,1\n");

    let mut store = LineStore::from_bytes(content.clone().into_bytes());
    store.next_line();
    let chunks = split(&mut store, 64)?;
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].len(), long_name.len() + 4);

    let opts = ReadOptions::parallel(4).with_chunk_bytes(64);
    let doc = read_from_bytes(content.into_bytes(), PersonCodec, &opts)?;
    assert_eq!(doc.rows, vec![Person::new(&long_name, 41), Person::new("short", 1)]);
    Ok(())
}

#[test]
fn malformed_age_fails_with_its_line() -> Result<()> {
    init_tracing();
    let content =
        person_file_content(&person_rows(500)).replace("person-000321,30", "person-000321,thirty");

    for opts in [
        ReadOptions::sequential(),
        ReadOptions::parallel(1).with_chunk_bytes(128),
        ReadOptions::parallel(8).with_chunk_bytes(128),
    ] {
        let err = read_from_bytes(content.clone().into_bytes(), PersonCodec, &opts).unwrap_err();
        match &err {
            Error::Format { line, content: bad, .. } => {
                // header is line 1, row i is line i + 2
                assert_eq!(*line, 323, "mode {}", opts.mode);
                assert_eq!(bad, "person-000321,thirty");
            }
            other => panic!("expected a format error, got {other:?}"),
        }
        assert!(err.to_string().contains("line 323"));
    }
    Ok(())
}

#[test]
fn earliest_bad_line_wins_even_when_it_fails_last() -> Result<()> {
    init_tracing();
    let codec = FnCodec::new(
        |p: &Person, d| ironcsv::RecordCodec::encode(&PersonCodec, p, d),
        |line, d| {
            if line.starts_with("slow") {
                thread::sleep(Duration::from_millis(200));
            }
            ironcsv::RecordCodec::decode(&PersonCodec, line, d)
        },
    );
    let codec = Arc::new(codec);
    let content = person_file_content(&person_rows(300))
        .replace("person-000000,0", "slow,oops")
        .replace("person-000250,56", "person-000250,late");

    let seq = read_from_bytes(content.clone().into_bytes(), Arc::clone(&codec), &ReadOptions::sequential())
        .unwrap_err();
    assert_eq!(seq.line(), Some(2));

    // chunk 0 stalls while chunks near line 252 fail first
    let opts = ReadOptions::parallel(4).with_chunk_bytes(16);
    let par = read_from_bytes(content.into_bytes(), codec, &opts).unwrap_err();
    assert_eq!(par.line(), Some(2), "{par}");
    assert!(matches!(par, Error::Format { chunk: Some(0), .. }), "{par:?}");
    assert!(par.to_string().contains("\"oops\""), "{par}");
    Ok(())
}

#[test]
fn parallel_equals_sequential_for_all_pool_sizes() -> Result<()> {
    init_tracing();
    let content = person_file_content(&person_rows(2_000));
    let seq = read_from_bytes(content.clone().into_bytes(), PersonCodec, &ReadOptions::sequential())?;
    assert_eq!(seq.rows.len(), 2_000);

    for workers in [1, 2, 8, 64] {
        let opts = ReadOptions::parallel(workers).with_chunk_bytes(512);
        let par = read_from_bytes(content.clone().into_bytes(), PersonCodec, &opts)?;
        assert_documents_equal(&par, &seq);
    }
    Ok(())
}

#[test]
fn more_workers_than_chunks() -> Result<()> {
    let content = person_file_content(&person_rows(3));
    let opts = ReadOptions::parallel(32).with_chunk_bytes(1 << 20);
    let doc = read_from_bytes(content.into_bytes(), PersonCodec, &opts)?;
    assert_eq!(doc.rows, person_rows(3));
    Ok(())
}

#[test]
fn missing_trailing_newline_and_crlf() -> Result<()> {
    let content = "Names,Age\r\nBin,3\r\n\r\nBen,5";
    for opts in [ReadOptions::sequential(), ReadOptions::parallel(3).with_chunk_bytes(2)] {
        let doc = read_from_bytes(content.as_bytes(), PersonCodec, &opts)?;
        assert_eq!(doc.header, vec!["Names", "Age"]);
        assert_eq!(doc.rows, vec![Person::new("Bin", 3), Person::new("Ben", 5)]);
    }
    Ok(())
}

#[test]
fn custom_delimiter_single_type_rows() -> Result<()> {
    let content = "A;B;C\n1;1;1\n2;2;2\n";
    let codec = SingleTypeCodec::<f32>::new().with_delimiter(';');
    let doc = read_from_bytes(content.as_bytes(), codec, &ReadOptions::parallel(2).with_chunk_bytes(4))?;
    assert_eq!(doc.header, vec!["A", "B", "C"]);
    assert_eq!(doc.rows, vec![vec![1.0, 1.0, 1.0], vec![2.0, 2.0, 2.0]]);
    Ok(())
}

#[test]
fn missing_file_is_io_error() {
    let err = read_from_file("/no/such/dir/persons.csv", PersonCodec, &ReadOptions::default())
        .unwrap_err();
    assert!(err.is_io(), "got {err:?}");
    assert!(err.to_string().contains("open /no/such/dir/persons.csv"));
}

#[test]
fn invalid_options_are_unsupported() {
    let content = b"Names,Age\nBin,3\n";
    for opts in [
        ReadOptions::parallel(0),
        ReadOptions::default().with_chunk_bytes(0),
        ReadOptions::sequential().with_chunk_bytes(0),
    ] {
        let err = read_from_bytes(&content[..], PersonCodec, &opts).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)), "got {err:?}");
    }
    assert!("turbo".parse::<ReadMode>().is_err());
}
