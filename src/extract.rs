use crate::config::{NAME_ALIASES, NAME_MAX_LEN, SEX_ALIASES};
use crate::models::NameRecord;
use anyhow::{Context, Result};
use csv::{Reader, ReaderBuilder, StringRecord, StringRecordsIntoIter};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Ordered candidate headers for each logical field. The first candidate present in
/// a file's header row is used for every row of that file.
#[derive(Debug, Clone, Copy)]
pub struct HeaderAliases {
    pub name: &'static [&'static str],
    pub sex: &'static [&'static str],
}

impl Default for HeaderAliases {
    fn default() -> Self {
        Self {
            name: NAME_ALIASES,
            sex: SEX_ALIASES,
        }
    }
}

impl HeaderAliases {
    pub fn resolve(&self, headers: &StringRecord) -> ColumnMap {
        ColumnMap {
            name: find_column(headers, self.name),
            sex: find_column(headers, self.sex),
        }
    }
}

fn find_column(headers: &StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|alias| headers.iter().position(|h| h == *alias))
}

/// Column positions of the name and sex fields in one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub name: Option<usize>,
    pub sex: Option<usize>,
}

impl ColumnMap {
    pub fn is_complete(&self) -> bool {
        self.name.is_some() && self.sex.is_some()
    }

    /// Maps one raw row to a record; `None` when either field is absent or blank,
    /// or the name is longer than the name column holds.
    pub fn record(&self, row: &StringRecord) -> Option<NameRecord> {
        let name = row.get(self.name?)?.trim();
        let sex = row.get(self.sex?)?.trim();
        if name.is_empty() || sex.is_empty() || name.chars().count() > NAME_MAX_LEN {
            return None;
        }
        Some(NameRecord::new(name, sex))
    }
}

/// Lazily yields a `NameRecord` for every usable row of a CSV stream.
pub struct NameRecords<R: Read> {
    rows: StringRecordsIntoIter<R>,
    columns: ColumnMap,
    rows_read: u64,
    rows_dropped: u64,
}

impl NameRecords<BufReader<File>> {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open CSV: {}", path.display()))?;
        Self::from_reader(BufReader::with_capacity(128 * 1024, file))
    }
}

impl<R: Read> NameRecords<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        Self::with_aliases(reader, HeaderAliases::default())
    }

    pub fn with_aliases(reader: R, aliases: HeaderAliases) -> Result<Self> {
        let mut reader: Reader<R> = ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.headers().context("Failed to read CSV header")?.clone();
        let columns = aliases.resolve(&headers);
        Ok(Self {
            rows: reader.into_records(),
            columns,
            rows_read: 0,
            rows_dropped: 0,
        })
    }

    pub fn columns(&self) -> ColumnMap {
        self.columns
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    pub fn rows_dropped(&self) -> u64 {
        self.rows_dropped
    }
}

impl<R: Read> Iterator for NameRecords<R> {
    type Item = Result<NameRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = match self.rows.next()? {
                Ok(row) => row,
                Err(e) => {
                    return Some(Err(e).context(format!(
                        "Failed to read CSV row {}",
                        self.rows_read + 1
                    )))
                }
            };
            self.rows_read += 1;
            match self.columns.record(&row) {
                Some(record) => return Some(Ok(record)),
                None => self.rows_dropped += 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn extract(csv: &str) -> Vec<NameRecord> {
        NameRecords::from_reader(csv.as_bytes())
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn extracts_and_trims_canonical_headers() {
        let records = extract("Name,Sex\n  Ann , F \nBob,M\n");
        assert_eq!(
            records,
            vec![NameRecord::new("Ann", "F"), NameRecord::new("Bob", "M")]
        );
    }

    #[test]
    fn drops_rows_with_blank_fields() {
        let mut it = NameRecords::from_reader("Name,Sex\nAnn,\n   ,M\nCara,F\n".as_bytes()).unwrap();
        let records: Vec<_> = it.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(records, vec![NameRecord::new("Cara", "F")]);
        assert_eq!(it.rows_read(), 3);
        assert_eq!(it.rows_dropped(), 2);
    }

    #[test]
    fn drops_names_longer_than_column() {
        let at_limit = "é".repeat(NAME_MAX_LEN);
        let too_long = format!("{}x", "a".repeat(NAME_MAX_LEN));
        let csv = format!("Name,Sex\n{too_long},F\n{at_limit},F\n");

        let mut it = NameRecords::from_reader(csv.as_bytes()).unwrap();
        let records: Vec<_> = it.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(records, vec![NameRecord::new(at_limit, "F")]);
        assert_eq!(it.rows_dropped(), 1);
    }

    #[test]
    fn tolerates_short_rows() {
        let records = extract("Id,Name,Sex\n1,Ann\n2,Bob,M\n");
        assert_eq!(records, vec![NameRecord::new("Bob", "M")]);
    }

    #[test]
    fn resolves_alternate_aliases() {
        let records = extract("Year,child_name,Gender,Count\n1990,Dana,F,12\n");
        assert_eq!(records, vec![NameRecord::new("Dana", "F")]);
    }

    #[test]
    fn first_alias_in_list_wins_over_header_order() {
        // "name" appears first in the file, but "Name" is earlier in the alias list
        let records = extract("name,Name,sex\nlower,Upper,F\n");
        assert_eq!(records, vec![NameRecord::new("Upper", "F")]);
    }

    #[test]
    fn missing_alias_drops_every_row() {
        let mut it = NameRecords::from_reader("Name,Count\nAnn,3\nBob,4\n".as_bytes()).unwrap();
        assert!(!it.columns().is_complete());
        assert_eq!(it.columns().sex, None);
        assert!(it.next().is_none());
        assert_eq!(it.rows_dropped(), 2);
    }

    #[test]
    fn resolve_against_header_record() {
        let headers = StringRecord::from(vec!["Count", "babyName", "gender"]);
        let columns = HeaderAliases::default().resolve(&headers);
        assert_eq!(
            columns,
            ColumnMap {
                name: Some(1),
                sex: Some(2)
            }
        );
    }

    #[test]
    fn yields_lazily() {
        let mut it = NameRecords::from_reader("Name,Sex\nAnn,F\nBob,M\n".as_bytes()).unwrap();
        assert_eq!(it.next().unwrap().unwrap(), NameRecord::new("Ann", "F"));
        assert_eq!(it.rows_read(), 1);
    }

    #[test]
    fn reads_from_path() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "Name,Sex")?;
        writeln!(file, "Eve,F")?;
        file.flush()?;

        let records: Vec<_> = NameRecords::from_path(file.path())?.collect::<Result<_>>()?;
        assert_eq!(records, vec![NameRecord::new("Eve", "F")]);
        Ok(())
    }

    #[test]
    fn missing_path_is_an_error() {
        let result = NameRecords::from_path(Path::new("/nonexistent/names.csv"));
        assert!(result.is_err());
        assert!(result.err().unwrap().to_string().contains("Failed to open CSV"));
    }
}
