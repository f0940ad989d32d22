//! Testing utilities for code that reads and writes delimited files.
//!
//! - **Fixtures**: a small [`Person`] record with its [`PersonCodec`], and a
//!   deterministic row generator
//! - **Temp files**: [`fixture_file`] writes content into a fresh temp dir
//! - **Assertions**: [`assert_documents_equal`] compares two documents
//!   row-by-row and reports the first difference
//!
//! ```
//! use ironcsv::testing::*;
//! use ironcsv::{ReadOptions, read_from_file};
//!
//! # fn main() -> anyhow::Result<()> {
//! let (_dir, path) = fixture_file("persons.csv", "Names,Age\nBin,3\nBen,5\n")?;
//! let doc = read_from_file(&path, PersonCodec, &ReadOptions::default())?;
//! assert_eq!(doc.rows, vec![Person::new("Bin", 3), Person::new("Ben", 5)]);
//! # Ok(())
//! # }
//! ```

use crate::codec::RecordCodec;
use crate::document::Document;
use anyhow::{Context, Result, anyhow};
use std::fmt::Debug;
use std::path::PathBuf;
use tempfile::TempDir;

/// A name and an age, the canonical two-column record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Person {
    pub name: String,
    pub age: i32,
}

impl Person {
    pub fn new(name: &str, age: i32) -> Self {
        Self {
            name: name.to_string(),
            age,
        }
    }
}

/// `name<delimiter>age`. The age must be an integer.
#[derive(Clone, Copy, Debug, Default)]
pub struct PersonCodec;

impl RecordCodec for PersonCodec {
    type Record = Person;

    fn encode(&self, p: &Person, delimiter: char) -> Result<String> {
        Ok(format!("{}{delimiter}{}", p.name, p.age))
    }

    fn decode(&self, line: &str, delimiter: char) -> Result<Person> {
        let (name, age) = line
            .split_once(delimiter)
            .ok_or_else(|| anyhow!("expected `name{delimiter}age`"))?;
        let age = age
            .trim()
            .parse()
            .with_context(|| format!("age {age:?} is not an integer"))?;
        Ok(Person {
            name: name.to_string(),
            age,
        })
    }
}

/// Header used by the person fixtures.
pub fn person_header() -> Vec<String> {
    vec!["Names".to_string(), "Age".to_string()]
}

/// `n` distinct persons in a fixed order.
pub fn person_rows(n: usize) -> Vec<Person> {
    (0..n)
        .map(|i| Person {
            name: format!("person-{i:06}"),
            age: (i % 97) as i32,
        })
        .collect()
}

/// Render persons as file content, header first.
pub fn person_file_content(rows: &[Person]) -> String {
    let mut out = String::from("Names,Age\n");
    for p in rows {
        out.push_str(&p.name);
        out.push(',');
        out.push_str(&p.age.to_string());
        out.push('\n');
    }
    out
}

/// Write `content` to `name` inside a new temp dir.
///
/// Keep the returned [`TempDir`] alive for as long as the file is needed.
pub fn fixture_file(name: &str, content: impl AsRef<[u8]>) -> Result<(TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join(name);
    std::fs::write(&path, content).with_context(|| format!("write {}", path.display()))?;
    Ok((dir, path))
}

/// Assert two documents have the same header and the same rows in the same
/// order.
///
/// # Panics
/// On the first difference, naming the row index.
pub fn assert_documents_equal<R: Debug + PartialEq>(actual: &Document<R>, expected: &Document<R>) {
    assert_eq!(actual.header, expected.header, "header mismatch");
    assert_eq!(
        actual.rows.len(),
        expected.rows.len(),
        "row count mismatch: expected {}, got {}",
        expected.rows.len(),
        actual.rows.len()
    );
    for (i, (a, e)) in actual.rows.iter().zip(&expected.rows).enumerate() {
        assert_eq!(a, e, "row {i} differs");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_codec_round_trips() -> Result<()> {
        for p in person_rows(5) {
            let line = PersonCodec.encode(&p, ';')?;
            assert_eq!(PersonCodec.decode(&line, ';')?, p);
        }
        Ok(())
    }

    #[test]
    fn generated_content_has_one_line_per_row() {
        let content = person_file_content(&person_rows(3));
        assert_eq!(content.lines().count(), 4);
        assert!(content.starts_with("Names,Age\nperson-000000,0\n"));
    }

    #[test]
    #[should_panic(expected = "row 1 differs")]
    fn document_assertion_names_the_row() {
        let a = Document::new(person_header(), vec![Person::new("a", 1), Person::new("b", 2)]);
        let b = Document::new(person_header(), vec![Person::new("a", 1), Person::new("c", 2)]);
        assert_documents_equal(&a, &b);
    }
}
