use anyhow::Result;
use ironcsv::testing::{Person, PersonCodec, person_file_content, person_rows};
use ironcsv::{FnCodec, ReadOptions, RecordCodec, read_from_bytes};
use std::thread;
use std::time::Duration;

/// Decodes like [`PersonCodec`] but stalls on names starting with `slow`.
fn stalling_codec() -> impl RecordCodec<Record = Person> {
    FnCodec::new(
        |p: &Person, d| PersonCodec.encode(p, d),
        |line, d| {
            if line.starts_with("slow") {
                thread::sleep(Duration::from_millis(40));
            }
            PersonCodec.decode(line, d)
        },
    )
}

#[test]
fn late_first_chunk_keeps_its_place() -> Result<()> {
    let mut rows = vec![Person::new("slow-a", 1), Person::new("slow-b", 2)];
    rows.extend(person_rows(200));
    let content = person_file_content(&rows);

    // first chunk holds only the slow rows, everything after it finishes first
    let opts = ReadOptions::parallel(4).with_chunk_bytes(16);
    let doc = read_from_bytes(content.into_bytes(), stalling_codec(), &opts)?;
    assert_eq!(doc.rows, rows);
    Ok(())
}

#[test]
fn slow_chunks_scattered_through_the_file() -> Result<()> {
    let rows: Vec<Person> = person_rows(300)
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            if i % 50 == 7 {
                Person::new(&format!("slow-{i}"), p.age)
            } else {
                p
            }
        })
        .collect();
    let content = person_file_content(&rows);

    for workers in [2, 3, 8] {
        let opts = ReadOptions::parallel(workers).with_chunk_bytes(64);
        let doc = read_from_bytes(content.clone().into_bytes(), stalling_codec(), &opts)?;
        assert_eq!(doc.rows, rows, "{workers} workers");
    }
    Ok(())
}

#[test]
fn repeated_reads_are_identical() -> Result<()> {
    let content = person_file_content(&person_rows(1_000));
    let opts = ReadOptions::parallel(6).with_chunk_bytes(100);
    let first = read_from_bytes(content.clone().into_bytes(), PersonCodec, &opts)?;
    for _ in 0..5 {
        let again = read_from_bytes(content.clone().into_bytes(), PersonCodec, &opts)?;
        assert_eq!(again, first);
    }
    Ok(())
}
