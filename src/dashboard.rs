use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Serialize;

use crate::formats::{BookRecord, Category};
use crate::stats::{self, GenreSeries, Scope, StarBuckets, StarredBook};

pub const DEFAULT_SINCE_YEAR: i32 = 2011;

/// Everything one dashboard render shows, computed from a single collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub current_year: i32,
    pub since_year: i32,
    pub total_books: usize,
    pub books_this_year: usize,
    pub average_per_year: Option<f64>,
    pub total_pages: u64,
    pub most_recent: Option<String>,
    pub genres_over_time: GenreSeries,
    pub genres_this_year: BTreeMap<String, usize>,
    pub genres_all_time: BTreeMap<String, usize>,
    pub categories_this_year: BTreeMap<Category, usize>,
    pub categories_all_time: BTreeMap<Category, usize>,
    pub stars: StarBuckets,
}

impl Dashboard {
    pub fn build(records: &[BookRecord], current_year: i32, since_year: i32) -> Self {
        Self {
            current_year,
            since_year,
            total_books: stats::total_count(records),
            books_this_year: stats::count_in_year(records, current_year),
            average_per_year: stats::average_per_year(records, since_year),
            total_pages: stats::total_pages(records),
            most_recent: stats::most_recent(records).map(str::to_owned),
            genres_over_time: stats::genre_series_by_year(records),
            genres_this_year: stats::genre_breakdown(records, Scope::Year(current_year)),
            genres_all_time: stats::genre_breakdown(records, Scope::All),
            categories_this_year: stats::category_breakdown(records, Scope::Year(current_year)),
            categories_all_time: stats::category_breakdown(records, Scope::All),
            stars: stats::starred_buckets(records),
        }
    }

    pub fn average_label(&self) -> String {
        match self.average_per_year {
            Some(avg) => format!("{avg:.2}"),
            None => "n/a".to_owned(),
        }
    }
}

/// Formats `n` with `,` between groups of three digits.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn render_text(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total books read: {}\n", dashboard.total_books));
    out.push_str(&format!(
        "Books read in {}: {}\n",
        dashboard.current_year, dashboard.books_this_year
    ));
    out.push_str(&format!(
        "Avg books per year (after {}): {}\n",
        dashboard.since_year,
        dashboard.average_label()
    ));
    out.push_str(&format!(
        "Total pages read: {}\n",
        group_thousands(dashboard.total_pages)
    ));
    out.push_str(&format!(
        "Most recent book: {}\n",
        dashboard.most_recent.as_deref().unwrap_or("-")
    ));

    out.push_str("\nGenres (all time):\n");
    push_text_counts(&mut out, &dashboard.genres_all_time);
    out.push_str("\nCategories (all time):\n");
    push_text_counts(&mut out, &dashboard.categories_all_time);

    out.push_str(&format!(
        "\nStars: {} unstarred, {} one star, {} two or more\n",
        dashboard.stars.unstarred.len(),
        dashboard.stars.one_star.len(),
        dashboard.stars.multi_star.len()
    ));
    out
}

fn push_text_counts<K: Display>(out: &mut String, counts: &BTreeMap<K, usize>) {
    if counts.is_empty() {
        out.push_str("  (none)\n");
    }
    for (key, count) in counts {
        out.push_str(&format!("  {key}: {count}\n"));
    }
}

pub fn render_html(dashboard: &Dashboard, notice: Option<&str>) -> String {
    let mut html = String::from(
        r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Books I've Read</title>
    <style>
      body { font-family: sans-serif; margin: 2rem; }
      .metrics { display: flex; gap: 2rem; flex-wrap: wrap; }
      .metric .value { font-size: 1.6rem; font-weight: bold; }
      .notice { background: #e6f4ea; padding: 0.5rem 1rem; }
      table { border-collapse: collapse; margin-bottom: 1rem; }
      th, td { border: 1px solid #ccc; padding: 0.25rem 0.6rem; text-align: left; }
      .columns { display: flex; gap: 2rem; flex-wrap: wrap; }
    </style>
  </head>
  <body>
    <h1>Books I've Read Dashboard</h1>
"#,
    );

    if let Some(notice) = notice {
        html.push_str(&format!(
            "    <p class=\"notice\">{}</p>\n",
            escape_html(notice)
        ));
    }

    html.push_str(ADD_BOOK_FORM);

    html.push_str("    <section class=\"metrics\">\n");
    let current_year = dashboard.current_year.to_string();
    let since = format!("Avg Books Per Year (after {})", dashboard.since_year);
    let total_pages = group_thousands(dashboard.total_pages);
    let metrics = [
        ("Total Books Read", dashboard.total_books.to_string()),
        ("Books Read This Year", dashboard.books_this_year.to_string()),
        (since.as_str(), dashboard.average_label()),
        ("Total Pages Read", total_pages),
        (
            "Most Recent Book",
            dashboard.most_recent.clone().unwrap_or_else(|| "-".to_owned()),
        ),
    ];
    for (label, value) in metrics {
        html.push_str(&format!(
            "      <div class=\"metric\"><div>{}</div><div class=\"value\">{}</div></div>\n",
            escape_html(label),
            escape_html(&value)
        ));
    }
    html.push_str("    </section>\n");

    html.push_str("    <h2>Genres Over Time</h2>\n");
    push_genre_series(&mut html, &dashboard.genres_over_time);

    html.push_str("    <div class=\"columns\">\n");
    push_counts_table(
        &mut html,
        &format!("Genres Read in {current_year}"),
        &dashboard.genres_this_year,
    );
    push_counts_table(&mut html, "Genres All Time", &dashboard.genres_all_time);
    push_counts_table(
        &mut html,
        &format!("Fiction vs Non-Fiction in {current_year}"),
        &dashboard.categories_this_year,
    );
    push_counts_table(
        &mut html,
        "Fiction vs Non-Fiction All Time",
        &dashboard.categories_all_time,
    );
    html.push_str("    </div>\n");

    html.push_str("    <h2>Starred Books</h2>\n    <div class=\"columns\">\n");
    push_starred_table(&mut html, "No Stars", &dashboard.stars.unstarred);
    push_starred_table(&mut html, "One Star", &dashboard.stars.one_star);
    push_starred_table(&mut html, "Two or More Stars", &dashboard.stars.multi_star);
    html.push_str("    </div>\n  </body>\n</html>\n");
    html
}

const ADD_BOOK_FORM: &str = r#"    <details>
      <summary>Add a Book</summary>
      <form method="post" action="/books">
        <label>Book Title <input name="title" required></label>
        <label>Author <input name="author" required></label>
        <label>Genre <input name="genre"></label>
        <label>Stars? <input name="stars" type="number" min="0" value="0"></label>
        <button type="submit">Add Book</button>
      </form>
    </details>
"#;

fn push_genre_series(html: &mut String, series: &GenreSeries) {
    if series.is_empty() {
        html.push_str("    <p>No books yet.</p>\n");
        return;
    }

    html.push_str("    <table>\n      <tr><th>Year</th>");
    for line in &series.lines {
        html.push_str(&format!("<th>{}</th>", escape_html(&line.genre)));
    }
    html.push_str("</tr>\n");
    for (y, year) in series.years.iter().enumerate() {
        html.push_str(&format!("      <tr><td>{year}</td>"));
        for line in &series.lines {
            html.push_str(&format!("<td>{}</td>", line.counts[y]));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("    </table>\n");
}

fn push_counts_table<K: Display>(html: &mut String, title: &str, counts: &BTreeMap<K, usize>) {
    html.push_str(&format!(
        "      <div>\n        <h3>{}</h3>\n        <table>\n",
        escape_html(title)
    ));
    if counts.is_empty() {
        html.push_str("          <tr><td>No books</td></tr>\n");
    }
    for (key, count) in counts {
        html.push_str(&format!(
            "          <tr><td>{}</td><td>{count}</td></tr>\n",
            escape_html(&key.to_string())
        ));
    }
    html.push_str("        </table>\n      </div>\n");
}

fn push_starred_table(html: &mut String, title: &str, books: &[StarredBook]) {
    html.push_str(&format!(
        "      <div>\n        <h3>{title}</h3>\n        <table>\n          <tr><th>Title</th><th>Author</th><th>Year Read</th></tr>\n"
    ));
    for book in books {
        html.push_str(&format!(
            "          <tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&book.title),
            escape_html(&book.author),
            book.date_read
        ));
    }
    html.push_str("        </table>\n      </div>\n");
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
