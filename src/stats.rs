//! Aggregations over a record collection. Every function here is pure.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::formats::{BookRecord, Category};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Year(i32),
}

impl Scope {
    fn includes(self, record: &BookRecord) -> bool {
        match self {
            Scope::All => true,
            Scope::Year(year) => record.date_read == year,
        }
    }
}

/// Dense year × genre grid. `lines[g].counts[y]` is the count for
/// `lines[g].genre` in `years[y]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenreSeries {
    pub years: Vec<i32>,
    pub lines: Vec<GenreLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreLine {
    pub genre: String,
    pub counts: Vec<usize>,
}

impl GenreSeries {
    pub fn count(&self, year: i32, genre: &str) -> Option<usize> {
        let y = self.years.iter().position(|&v| v == year)?;
        let line = self.lines.iter().find(|line| line.genre == genre)?;
        line.counts.get(y).copied()
    }

    pub fn cells(&self) -> impl Iterator<Item = (i32, &str, usize)> + '_ {
        self.lines.iter().flat_map(move |line| {
            self.years
                .iter()
                .zip(&line.counts)
                .map(move |(&year, &count)| (year, line.genre.as_str(), count))
        })
    }

    pub fn len(&self) -> usize {
        self.years.len() * self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StarredBook {
    pub title: String,
    pub author: String,
    pub date_read: i32,
}

impl From<&BookRecord> for StarredBook {
    fn from(record: &BookRecord) -> Self {
        Self {
            title: record.title.clone(),
            author: record.author.clone(),
            date_read: record.date_read,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StarBuckets {
    /// `stars == 0`
    pub unstarred: Vec<StarredBook>,
    pub one_star: Vec<StarredBook>,
    /// `stars >= 2`
    pub multi_star: Vec<StarredBook>,
}

impl StarBuckets {
    pub fn len(&self) -> usize {
        self.unstarred.len() + self.one_star.len() + self.multi_star.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn total_count(records: &[BookRecord]) -> usize {
    records.len()
}

pub fn count_in_year(records: &[BookRecord], year: i32) -> usize {
    records.iter().filter(|r| r.date_read == year).count()
}

pub fn total_pages(records: &[BookRecord]) -> u64 {
    records
        .iter()
        .filter_map(|r| r.pages.known())
        .map(|&pages| u64::from(pages))
        .sum()
}

pub fn counts_by_year(records: &[BookRecord]) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.date_read).or_insert(0) += 1;
    }
    counts
}

/// Mean of per-year counts over years after `since_year` that have at least
/// one record. `None` when no such year exists.
pub fn average_per_year(records: &[BookRecord], since_year: i32) -> Option<f64> {
    let counts: Vec<usize> = counts_by_year(records)
        .into_iter()
        .filter(|&(year, _)| year > since_year)
        .map(|(_, count)| count)
        .collect();
    if counts.is_empty() {
        return None;
    }
    let total: usize = counts.iter().sum();
    Some(total as f64 / counts.len() as f64)
}

/// Title of the record read most recently. Among records sharing the latest
/// year, the one appended last wins.
pub fn most_recent(records: &[BookRecord]) -> Option<&str> {
    records
        .iter()
        .max_by_key(|r| r.date_read)
        .map(|r| r.title.as_str())
}

pub fn genre_series_by_year(records: &[BookRecord]) -> GenreSeries {
    let years: BTreeSet<i32> = records.iter().map(|r| r.date_read).collect();
    let genres: BTreeSet<&str> = records.iter().map(|r| r.genre.as_str()).collect();

    let mut counts: HashMap<(i32, &str), usize> = HashMap::new();
    for record in records {
        *counts
            .entry((record.date_read, record.genre.as_str()))
            .or_insert(0) += 1;
    }

    let lines = genres
        .into_iter()
        .map(|genre| GenreLine {
            genre: genre.to_owned(),
            counts: years
                .iter()
                .map(|&year| counts.get(&(year, genre)).copied().unwrap_or(0))
                .collect(),
        })
        .collect();

    GenreSeries {
        years: years.into_iter().collect(),
        lines,
    }
}

pub fn genre_breakdown(records: &[BookRecord], scope: Scope) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records.iter().filter(|r| scope.includes(r)) {
        *counts.entry(record.genre.clone()).or_insert(0) += 1;
    }
    counts
}

pub fn category_breakdown(records: &[BookRecord], scope: Scope) -> BTreeMap<Category, usize> {
    let mut counts = BTreeMap::new();
    for record in records.iter().filter(|r| scope.includes(r)) {
        *counts.entry(record.category()).or_insert(0) += 1;
    }
    counts
}

pub fn starred_buckets(records: &[BookRecord]) -> StarBuckets {
    let mut buckets = StarBuckets::default();
    for record in records {
        let bucket = match record.stars {
            0 => &mut buckets.unstarred,
            1 => &mut buckets.one_star,
            _ => &mut buckets.multi_star,
        };
        bucket.push(StarredBook::from(record));
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{Field, normalize_genre};

    fn book(title: &str, genre: &str, stars: u32, date_read: i32) -> BookRecord {
        BookRecord {
            title: title.to_owned(),
            author: format!("{title} author"),
            genre: normalize_genre(genre),
            pages: Field::Unknown,
            stars,
            published_date: Field::Unknown,
            date_read,
        }
    }

    fn sample() -> Vec<BookRecord> {
        vec![
            book("Dune", "Sci-Fi", 2, 2012),
            book("Educated", "memoir", 1, 2012),
            book("Sapiens", "Nonfiction", 0, 2012),
            book("Emma", "Classic", 0, 2013),
            book("Neuromancer", "Sci-Fi", 3, 2013),
            book("Hyperion", "Sci-Fi", 1, 2013),
            book("Circe", "", 2, 2013),
            book("Piranesi", "Fantasy", 2, 2013),
            book("Old Grammar", "Reference", 0, 2008),
        ]
    }

    #[test]
    fn total_count_matches_collection_size() {
        let records = sample();
        assert_eq!(total_count(&records), records.len());
        assert_eq!(total_count(&[]), 0);
    }

    #[test]
    fn count_in_year_filters_on_date_read() {
        let records = sample();
        assert_eq!(count_in_year(&records, 2012), 3);
        assert_eq!(count_in_year(&records, 2013), 5);
        assert_eq!(count_in_year(&records, 1999), 0);
    }

    #[test]
    fn total_pages_skips_unknown() {
        let mut records = sample();
        records[0].pages = Field::Known(412);
        records[3].pages = Field::Known(474);
        assert_eq!(total_pages(&records), 886);
        assert_eq!(total_pages(&sample()), 0);
    }

    #[test]
    fn average_per_year_only_counts_years_after_threshold() {
        let records = sample();
        assert_eq!(average_per_year(&records, 2011), Some(4.0));
        assert_eq!(average_per_year(&records, 2012), Some(5.0));
        assert_eq!(average_per_year(&records, 2013), None);
        assert_eq!(average_per_year(&[], 2011), None);
    }

    #[test]
    fn most_recent_prefers_last_appended_in_latest_year() {
        let records = sample();
        assert_eq!(most_recent(&records), Some("Piranesi"));
        assert_eq!(most_recent(&records[..1]), Some("Dune"));
        assert_eq!(most_recent(&[]), None);
    }

    #[test]
    fn genre_series_is_dense_grid() {
        let records = sample();
        let series = genre_series_by_year(&records);

        assert_eq!(series.years, vec![2008, 2012, 2013]);
        let genres: Vec<&str> = series.lines.iter().map(|l| l.genre.as_str()).collect();
        assert_eq!(
            genres,
            vec![
                "Classic",
                "Fantasy",
                "Nonfiction",
                "Reference",
                "Sci-Fi",
                "memoir",
                "other"
            ]
        );
        assert_eq!(series.len(), 3 * 7);
        assert_eq!(series.cells().count(), series.len());

        assert_eq!(series.count(2013, "Sci-Fi"), Some(2));
        assert_eq!(series.count(2008, "Sci-Fi"), Some(0));
        assert_eq!(series.count(2013, "other"), Some(1));
        assert_eq!(series.count(2014, "Sci-Fi"), None);

        for &year in &series.years {
            let sum: usize = series
                .cells()
                .filter(|&(y, _, _)| y == year)
                .map(|(_, _, count)| count)
                .sum();
            assert_eq!(sum, count_in_year(&records, year), "year={year}");
        }
    }

    #[test]
    fn genre_series_of_empty_collection_is_empty() {
        let series = genre_series_by_year(&[]);
        assert!(series.is_empty());
        assert!(series.years.is_empty());
    }

    #[test]
    fn genre_breakdown_counts_normalized_genres() {
        let records = vec![
            book("A", "Sci-Fi", 0, 2020),
            book("B", "Sci-Fi", 0, 2020),
            book("C", "", 0, 2021),
        ];
        let all = genre_breakdown(&records, Scope::All);
        assert_eq!(
            all,
            BTreeMap::from([("Sci-Fi".to_owned(), 2), ("other".to_owned(), 1)])
        );

        let in_2021 = genre_breakdown(&records, Scope::Year(2021));
        assert_eq!(in_2021, BTreeMap::from([("other".to_owned(), 1)]));
        assert!(genre_breakdown(&records, Scope::Year(1990)).is_empty());
    }

    #[test]
    fn category_breakdown_uses_derived_category() {
        let records = sample();
        let all = category_breakdown(&records, Scope::All);
        assert_eq!(all.get(&Category::NonFiction), Some(&2));
        assert_eq!(all.get(&Category::Fiction), Some(&7));

        let in_2013 = category_breakdown(&records, Scope::Year(2013));
        assert_eq!(in_2013.get(&Category::NonFiction), None);
        assert_eq!(in_2013.get(&Category::Fiction), Some(&5));
    }

    #[test]
    fn starred_buckets_partition_by_rating() {
        let records = vec![
            book("zero", "x", 0, 2020),
            book("one", "x", 1, 2020),
            book("two", "x", 2, 2020),
            book("three", "x", 3, 2020),
        ];
        let buckets = starred_buckets(&records);

        let titles = |bucket: &[StarredBook]| -> Vec<String> {
            bucket.iter().map(|b| b.title.clone()).collect()
        };
        assert_eq!(titles(&buckets.unstarred), vec!["zero"]);
        assert_eq!(titles(&buckets.one_star), vec!["one"]);
        assert_eq!(titles(&buckets.multi_star), vec!["two", "three"]);
        assert_eq!(buckets.len(), total_count(&records));
        assert_eq!(
            buckets.multi_star[0],
            StarredBook {
                title: "two".to_owned(),
                author: "two author".to_owned(),
                date_read: 2020,
            }
        );
    }

    #[test]
    fn starred_buckets_cover_every_record() {
        let records = sample();
        let buckets = starred_buckets(&records);
        assert_eq!(buckets.len(), records.len());
        assert_eq!(buckets.unstarred.len(), 3);
        assert_eq!(buckets.one_star.len(), 2);
        assert_eq!(buckets.multi_star.len(), 4);
    }
}
