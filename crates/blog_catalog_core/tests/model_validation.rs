use blog_catalog_core::db::open_db_in_memory;
use blog_catalog_core::{
    AuthorPatch, BlogPatch, EntryPatch, ModelValidationError, NewAuthor, NewBlog, NewEntry,
    Predicate, RepoError, SqliteCatalog,
};
use chrono::NaiveDate;
use serde_json::json;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn blank_and_overlong_names_are_rejected_before_storage() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();

    let err = catalog.create_blog(NewBlog::new("   ", "tagline")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::Blank { field: "name" })
    ));

    let err = catalog
        .create_blog(NewBlog::new("x".repeat(101), ""))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::TooLong {
            max_chars: 100,
            actual_chars: 101,
            ..
        })
    ));

    let err = catalog
        .create_author(NewAuthor::new("a".repeat(201), "a@example.com"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::TooLong { max_chars: 200, .. })
    ));

    assert_eq!(catalog.count_blogs(&Predicate::All).unwrap(), 0);
    assert_eq!(catalog.count_authors(&Predicate::All).unwrap(), 0);
}

#[test]
fn malformed_email_is_rejected_on_create_and_patch() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();

    let err = catalog
        .create_author(NewAuthor::new("Paul", "not-an-email"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::InvalidEmail(value)) if value == "not-an-email"
    ));

    let mut paul = catalog
        .create_author(NewAuthor::new("Paul", "paul@example.com"))
        .unwrap();
    let patch = AuthorPatch {
        email: Some("paul@".to_string()),
        ..AuthorPatch::default()
    };
    assert!(catalog.update_author(&mut paul, &patch).is_err());
    assert_eq!(paul.email, "paul@example.com");

    let err = catalog.update_all_authors(&patch).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::InvalidEmail(_))
    ));
}

#[test]
fn bulk_update_with_blank_headline_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();
    let blog = catalog.create_blog(NewBlog::new("Beatles Blog", "")).unwrap();
    let entry = catalog
        .create_entry(NewEntry::new(blog.id, "Abbey Road", date(2005, 9, 26)))
        .unwrap();

    let err = catalog
        .update_all_entries(&EntryPatch::headline(""))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::Blank { field: "headline" })
    ));
    assert_eq!(catalog.entry(entry.id).unwrap().headline, "Abbey Road");
}

#[test]
fn empty_patch_updates_no_rows() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();
    catalog.create_blog(NewBlog::new("Laptops", "")).unwrap();

    assert_eq!(catalog.update_all_blogs(&BlogPatch::default()).unwrap(), 0);
}

#[test]
fn records_display_their_primary_text() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();
    let blog = catalog
        .create_blog(NewBlog::new("Beatles Blog", "All the latest Beatles news."))
        .unwrap();
    let author = catalog
        .create_author(NewAuthor::new("Ringo", "ringo@example.com"))
        .unwrap();
    let entry = catalog
        .create_entry(NewEntry::new(blog.id, "Abbey Road", date(2005, 9, 26)))
        .unwrap();

    assert_eq!(blog.to_string(), "Beatles Blog");
    assert_eq!(author.to_string(), "Ringo");
    assert_eq!(entry.to_string(), "Abbey Road");
}

#[test]
fn new_entry_defaults_are_persisted() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();
    let blog = catalog.create_blog(NewBlog::new("Beatles Blog", "")).unwrap();

    let entry = catalog
        .create_entry(NewEntry::new(blog.id, "Abbey Road", date(2005, 9, 26)))
        .unwrap();
    assert_eq!(entry.body_text, "");
    assert_eq!(entry.mod_date, entry.pub_date);
    assert_eq!(entry.number_of_comments, 0);
    assert_eq!(entry.number_of_pingbacks, 0);
    assert_eq!(entry.rating, 0);
    assert!(entry.authors.is_empty());
}

#[test]
fn entry_serializes_dates_as_iso_strings() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();
    let blog = catalog.create_blog(NewBlog::new("Beatles Blog", "")).unwrap();
    let ringo = catalog
        .create_author(NewAuthor::new("Ringo", "ringo@example.com"))
        .unwrap();
    let entry = catalog
        .create_entry(
            NewEntry::new(blog.id, "Abbey Road", date(2005, 9, 26))
                .with_body("Remastered.")
                .with_rating(5)
                .with_authors([ringo.id]),
        )
        .unwrap();

    let value = serde_json::to_value(&entry).unwrap();
    assert_eq!(
        value,
        json!({
            "id": entry.id,
            "blog": blog.id,
            "headline": "Abbey Road",
            "body_text": "Remastered.",
            "pub_date": "2005-09-26",
            "mod_date": "2005-09-26",
            "number_of_comments": 0,
            "number_of_pingbacks": 0,
            "rating": 5,
            "authors": [ringo.id],
        })
    );

    let blog_value = serde_json::to_value(&blog).unwrap();
    assert_eq!(blog_value["name"], "Beatles Blog");
    assert_eq!(blog_value["tagline"], "");
}
