use crate::models::NewBook;

pub fn new_book(isbn13: &str, isbn10: &str, title: &str) -> NewBook {
    NewBook {
        isbn13: isbn13.to_string(),
        isbn10: isbn10.to_string(),
        title: title.to_string(),
        subtitle: None,
        authors: "Unknown".to_string(),
        categories: None,
        thumbnail: None,
        description: None,
        published_year: None,
        average_rating: None,
        num_pages: None,
        ratings_count: None,
    }
}

/// A book in the given categories, ISBNs derived from `seq`
pub fn book_in(seq: u32, title: &str, categories: Option<&str>) -> NewBook {
    NewBook {
        categories: categories.map(str::to_string),
        ..new_book(
            &format!("978{:010}", seq),
            &format!("{:010}", seq),
            title,
        )
    }
}
