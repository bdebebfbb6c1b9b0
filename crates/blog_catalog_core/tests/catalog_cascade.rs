use blog_catalog_core::db::open_db_in_memory;
use blog_catalog_core::{
    Author, Blog, EntityKind, Entry, EntryField, ListQuery, NewAuthor, NewBlog, NewEntry,
    Predicate, RepoError, SqliteCatalog,
};
use chrono::NaiveDate;
use rusqlite::Connection;

struct Fixture {
    beatles: Blog,
    laptops: Blog,
    paul: Author,
    ringo: Author,
    abbey_road: Entry,
    white_album: Entry,
    thin_and_light: Entry,
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn seed(catalog: &SqliteCatalog<'_>) -> Fixture {
    let beatles = catalog
        .create_blog(NewBlog::new("Beatles Blog", "All the latest Beatles news."))
        .unwrap();
    let laptops = catalog.create_blog(NewBlog::new("Laptops", "")).unwrap();
    let paul = catalog
        .create_author(NewAuthor::new("Paul", "paul@example.com"))
        .unwrap();
    let ringo = catalog
        .create_author(NewAuthor::new("Ringo", "ringo@example.com"))
        .unwrap();
    let abbey_road = catalog
        .create_entry(
            NewEntry::new(beatles.id, "Abbey Road", date(2005, 9, 26))
                .with_authors([paul.id, ringo.id]),
        )
        .unwrap();
    let white_album = catalog
        .create_entry(
            NewEntry::new(beatles.id, "White Album", date(2005, 11, 22)).with_authors([paul.id]),
        )
        .unwrap();
    let thin_and_light = catalog
        .create_entry(
            NewEntry::new(laptops.id, "Thin and light", date(2008, 1, 15)).with_authors([ringo.id]),
        )
        .unwrap();

    Fixture {
        beatles,
        laptops,
        paul,
        ringo,
        abbey_road,
        white_album,
        thin_and_light,
    }
}

fn link_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM entry_authors;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn deleting_blog_cascades_to_entries_and_their_links() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();
    let fx = seed(&catalog);

    let summary = catalog.delete_blog(&fx.beatles).unwrap();
    assert_eq!(summary.total(), 6);
    assert_eq!(summary.count(EntityKind::Blog), 1);
    assert_eq!(summary.count(EntityKind::Entry), 2);
    assert_eq!(summary.count(EntityKind::EntryAuthor), 3);
    assert_eq!(summary.count(EntityKind::Author), 0);

    let remaining: Vec<_> = catalog
        .all_entries(&ListQuery::default())
        .unwrap()
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(remaining, vec![fx.thin_and_light.id]);
    assert!(catalog.entry(fx.abbey_road.id).is_err());
    assert_eq!(link_count(&conn), 1);
    assert_eq!(catalog.count_authors(&Predicate::All).unwrap(), 2);
}

#[test]
fn deleting_author_keeps_entries_and_drops_only_links() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();
    let fx = seed(&catalog);

    let summary = catalog.delete_author(&fx.ringo).unwrap();
    assert_eq!(summary.count(EntityKind::Author), 1);
    assert_eq!(summary.count(EntityKind::EntryAuthor), 2);
    assert_eq!(summary.count(EntityKind::Entry), 0);

    assert_eq!(catalog.count_entries(&Predicate::All).unwrap(), 3);
    assert_eq!(
        catalog.entry(fx.abbey_road.id).unwrap().authors,
        vec![fx.paul.id]
    );
    assert!(catalog.entry(fx.thin_and_light.id).unwrap().authors.is_empty());
}

#[test]
fn delete_all_blogs_reports_labeled_counts() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();
    seed(&catalog);

    let summary = catalog.delete_all_blogs().unwrap();
    let labeled = summary.labeled_counts();
    assert_eq!(labeled.get("blog.Blog"), Some(&2));
    assert_eq!(labeled.get("blog.Entry"), Some(&3));
    assert_eq!(labeled.get("blog.Entry_authors"), Some(&4));
    assert_eq!(summary.total(), 9);

    assert!(catalog.all_blogs(&ListQuery::default()).unwrap().is_empty());
    assert_eq!(link_count(&conn), 0);
}

#[test]
fn filtered_entry_delete_removes_only_matching_year() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();
    let fx = seed(&catalog);

    let summary = catalog
        .delete_entries(&Predicate::year(EntryField::PubDate, 2005))
        .unwrap();
    assert_eq!(summary.count(EntityKind::Entry), 2);
    assert_eq!(summary.count(EntityKind::EntryAuthor), 3);
    assert_eq!(summary.count(EntityKind::Blog), 0);

    assert_eq!(catalog.count_blogs(&Predicate::All).unwrap(), 2);
    assert_eq!(
        catalog.entry(fx.thin_and_light.id).unwrap().blog,
        fx.laptops.id
    );
}

#[test]
fn deleting_nothing_returns_empty_summary() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();

    let summary = catalog.delete_all_entries().unwrap();
    assert!(summary.is_empty());
    assert_eq!(summary.total(), 0);
}

#[test]
fn author_links_can_be_added_removed_and_replaced() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();
    let fx = seed(&catalog);
    let john = catalog
        .create_author(NewAuthor::new("John", "john@example.com"))
        .unwrap();

    let entry = catalog
        .add_authors(fx.white_album.id, &[john.id, fx.paul.id])
        .unwrap();
    assert_eq!(entry.authors, vec![fx.paul.id, john.id]);

    let entry = catalog
        .remove_authors(fx.white_album.id, &[fx.paul.id])
        .unwrap();
    assert_eq!(entry.authors, vec![john.id]);

    let entry = catalog
        .set_authors(fx.white_album.id, &[fx.ringo.id, fx.paul.id, fx.ringo.id])
        .unwrap();
    assert_eq!(entry.authors, vec![fx.paul.id, fx.ringo.id]);

    let entry = catalog.clear_authors(fx.white_album.id).unwrap();
    assert!(entry.authors.is_empty());
}

#[test]
fn replacing_links_with_missing_author_keeps_previous_set() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();
    let fx = seed(&catalog);

    let err = catalog
        .set_authors(fx.abbey_road.id, &[fx.paul.id, 999])
        .unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
    assert_eq!(
        catalog.entry(fx.abbey_road.id).unwrap().authors,
        vec![fx.paul.id, fx.ringo.id]
    );

    let err = catalog.add_authors(12345, &[fx.paul.id]).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: EntityKind::Entry,
            ..
        }
    ));
}

#[test]
fn entries_are_listed_per_author_and_per_blog() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();
    let fx = seed(&catalog);

    let by_ringo: Vec<_> = catalog
        .entries_by_author(fx.ringo.id, &ListQuery::default())
        .unwrap()
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(by_ringo, vec![fx.abbey_road.id, fx.thin_and_light.id]);

    let of_beatles: Vec<_> = catalog
        .entries_of_blog(fx.beatles.id, &ListQuery::default())
        .unwrap()
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(of_beatles, vec![fx.abbey_road.id, fx.white_album.id]);

    assert!(matches!(
        catalog.entries_by_author(999, &ListQuery::default()),
        Err(RepoError::NotFound {
            entity: EntityKind::Author,
            ..
        })
    ));
}

const BULK_ROWS: usize = 33_000;

#[test]
fn bulk_listing_and_cascades_handle_more_rows_than_sql_variables() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();
    let paul = catalog
        .create_author(NewAuthor::new("Paul", "paul@example.com"))
        .unwrap();
    let ringo = catalog
        .create_author(NewAuthor::new("Ringo", "ringo@example.com"))
        .unwrap();
    conn.execute_batch(&format!(
        "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < {rows})
         INSERT INTO blogs (name, tagline) SELECT 'blog ' || n, '' FROM seq;
         INSERT INTO entries (
             blog_id, headline, body_text, pub_date, mod_date,
             number_of_comments, number_of_pingbacks, rating
         )
         SELECT id, 'entry ' || id, '', '2007-01-01', '2007-01-01', 0, 0, 0 FROM blogs;
         INSERT INTO entry_authors (entry_id, author_id) SELECT id, {paul} FROM entries;
         INSERT INTO entry_authors (entry_id, author_id) SELECT id, {ringo} FROM entries;",
        rows = BULK_ROWS,
        paul = paul.id,
        ringo = ringo.id,
    ))
    .unwrap();

    let entries = catalog.all_entries(&ListQuery::default()).unwrap();
    assert_eq!(entries.len(), BULK_ROWS);
    assert!(entries
        .iter()
        .all(|entry| entry.authors == vec![paul.id, ringo.id]));

    let in_2007 = catalog
        .filter_entries(
            &Predicate::year(EntryField::PubDate, 2007),
            &ListQuery::default(),
        )
        .unwrap();
    assert_eq!(in_2007.len(), BULK_ROWS);
    assert_eq!(
        catalog
            .entries_by_author(paul.id, &ListQuery::default())
            .unwrap()
            .len(),
        BULK_ROWS
    );

    let summary = catalog.delete_author(&ringo).unwrap();
    assert_eq!(summary.count(EntityKind::EntryAuthor), BULK_ROWS);

    let summary = catalog.delete_all_blogs().unwrap();
    assert_eq!(summary.count(EntityKind::Blog), BULK_ROWS);
    assert_eq!(summary.count(EntityKind::Entry), BULK_ROWS);
    assert_eq!(summary.count(EntityKind::EntryAuthor), BULK_ROWS);
    assert_eq!(catalog.count_entries(&Predicate::All).unwrap(), 0);
    assert_eq!(link_count(&conn), 0);
    assert_eq!(catalog.count_authors(&Predicate::All).unwrap(), 1);
}

#[test]
fn bulk_entry_delete_removes_links_beyond_sql_variable_limit() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalog::try_from_connection(&conn).unwrap();
    let blog = catalog.create_blog(NewBlog::new("Firehose", "")).unwrap();
    let paul = catalog
        .create_author(NewAuthor::new("Paul", "paul@example.com"))
        .unwrap();
    conn.execute_batch(&format!(
        "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < {rows})
         INSERT INTO entries (
             blog_id, headline, body_text, pub_date, mod_date,
             number_of_comments, number_of_pingbacks, rating
         )
         SELECT {blog}, 'entry ' || n, '', '2008-02-01', '2008-02-01', 0, 0, 0 FROM seq;
         INSERT INTO entry_authors (entry_id, author_id) SELECT id, {paul} FROM entries;",
        rows = BULK_ROWS,
        blog = blog.id,
        paul = paul.id,
    ))
    .unwrap();

    let summary = catalog.delete_all_entries().unwrap();
    assert_eq!(summary.count(EntityKind::Entry), BULK_ROWS);
    assert_eq!(summary.count(EntityKind::EntryAuthor), BULK_ROWS);
    assert_eq!(catalog.count_blogs(&Predicate::All).unwrap(), 1);
}
