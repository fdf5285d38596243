//! End-to-end persistence tests: cascades, atomicity, the full
//! article/author scenario.

use rowmap_core::{
    EntityCollection, EntityDescriptor, MapperError, Related, SqlType, SqlValue, TypeRegistry,
};
use rowmap_store::{InMemoryStore, StoreBackend, StoreHandle};
use std::sync::Arc;

fn blog_registry() -> TypeRegistry {
    let registry = TypeRegistry::new();
    registry.register(
        EntityDescriptor::builder("Author")
            .table("author")
            .id_field("id")
            .field("id", SqlType::Integer)
            .field("name", SqlType::Text)
            .build()
            .unwrap(),
    );
    registry.register(
        EntityDescriptor::builder("Article")
            .table("article")
            .id_field("id")
            .field("id", SqlType::Integer)
            .field("title", SqlType::Text)
            .field("published", SqlType::Date)
            .internal_bound("author", "Author", true)
            .build()
            .unwrap(),
    );
    registry
}

fn memory_store() -> (Arc<InMemoryStore>, StoreHandle) {
    let store = Arc::new(InMemoryStore::new());
    store.create_table("author");
    store.create_table("article");
    let handle: StoreHandle = store.clone();
    (store, handle)
}

#[test]
fn article_author_scenario() {
    let registry = blog_registry();
    let (store, handle) = memory_store();

    let mut author = registry.create("Author").unwrap();
    author.set("name", "Jo").unwrap();

    let mut article = registry.create("Article").unwrap();
    article.set_store(handle.clone());
    article.set("title", "Hello").unwrap();
    article.set_related("author", author).unwrap();

    article.save().unwrap();

    // One insert per table.
    assert_eq!(store.row_count("author").unwrap(), 1);
    assert_eq!(store.row_count("article").unwrap(), 1);
    assert_eq!(store.stats().inserts(), 2);

    // The author was saved first and the article stores its key.
    let author_id = article
        .relation_cached("author")
        .unwrap()
        .as_entity()
        .unwrap()
        .id_value();
    assert_eq!(author_id, SqlValue::Integer(1));

    let article_row = store
        .select_row("article", "id", &article.id_value())
        .unwrap()
        .unwrap();
    assert_eq!(article_row.get("author"), Some(&author_id));
    assert_eq!(article_row.get("title"), Some(&SqlValue::from("Hello")));

    assert!(!article.id_value().is_null());
    assert!(!article.is_modified());
}

#[test]
fn autosave_chain_saves_leaves_first() {
    let registry = blog_registry();
    registry.register(
        EntityDescriptor::builder("Publisher")
            .table("publisher")
            .id_field("id")
            .field("id", SqlType::Integer)
            .field("name", SqlType::Text)
            .build()
            .unwrap(),
    );
    registry.register(
        EntityDescriptor::builder("Imprint")
            .table("imprint")
            .id_field("id")
            .field("id", SqlType::Integer)
            .field("label", SqlType::Text)
            .internal_bound("publisher", "Publisher", true)
            .build()
            .unwrap(),
    );
    registry.register(
        EntityDescriptor::builder("Book")
            .table("book")
            .id_field("id")
            .field("id", SqlType::Integer)
            .field("title", SqlType::Text)
            .internal_bound("imprint", "Imprint", true)
            .build()
            .unwrap(),
    );

    let store = Arc::new(InMemoryStore::new());
    let handle: StoreHandle = store.clone();

    let mut publisher = registry.create("Publisher").unwrap();
    publisher.set("name", "Big House").unwrap();

    let mut imprint = registry.create("Imprint").unwrap();
    imprint.set("label", "Small Press").unwrap();
    imprint.set_related("publisher", publisher).unwrap();

    let mut book = registry.create("Book").unwrap();
    book.set_store(handle);
    book.set("title", "Maps").unwrap();
    book.set_related("imprint", imprint).unwrap();

    book.save().unwrap();

    let book_row = store
        .select_row("book", "id", &book.id_value())
        .unwrap()
        .unwrap();
    let imprint_id = book_row.get("imprint").unwrap().clone();
    let imprint_row = store
        .select_row("imprint", "id", &imprint_id)
        .unwrap()
        .unwrap();
    assert_eq!(imprint_row.get("publisher"), Some(&SqlValue::Integer(1)));
    assert!(!book.is_modified());
}

#[test]
fn failing_post_save_cascade_commits_nothing() {
    let registry = blog_registry();
    registry.register(
        EntityDescriptor::builder("Post")
            .table("post")
            .id_field("id")
            .field("id", SqlType::Integer)
            .field("title", SqlType::Text)
            .loader("comments", |_| {
                Ok(Related::Collection(EntityCollection::new()))
            })
            .saver("comments", |_| {
                Err(MapperError::invalid_operation("comment saver exploded"))
            })
            .build()
            .unwrap(),
    );

    let store = Arc::new(InMemoryStore::new());
    store.create_table("post");
    let handle: StoreHandle = store.clone();

    let mut post = registry.create("Post").unwrap();
    post.set_store(handle);
    post.set("title", "Doomed").unwrap();
    post.set_related("comments", EntityCollection::new()).unwrap();

    let err = post.save().unwrap_err();

    // The original error comes through unwrapped.
    assert!(matches!(err, MapperError::InvalidOperation { .. }));
    // The post's own insert was rolled back with the cascade.
    assert_eq!(store.row_count("post").unwrap(), 0);
    // The entity still considers itself unsaved.
    assert!(post.is_modified());
}

#[test]
fn failing_pre_save_cascade_rolls_back_earlier_children() {
    let registry = blog_registry();
    registry.register(
        EntityDescriptor::builder("Editor")
            .table("editor")
            .id_field("id")
            .field("id", SqlType::Integer)
            .field("hired", SqlType::Date)
            .build()
            .unwrap(),
    );
    registry.register(
        EntityDescriptor::builder("Column")
            .table("col")
            .id_field("id")
            .field("id", SqlType::Integer)
            .field("title", SqlType::Text)
            .internal_bound("author", "Author", true)
            .internal_bound("editor", "Editor", true)
            .build()
            .unwrap(),
    );

    let store = Arc::new(InMemoryStore::new());
    store.create_table("author");
    store.create_table("col");
    let handle: StoreHandle = store.clone();

    let mut author = registry.create("Author").unwrap();
    author.set("name", "Jo").unwrap();

    // A date field holding unparseable text makes the editor's insert fail.
    let mut editor = registry.create("Editor").unwrap();
    editor.set("hired", "never").unwrap();

    let mut column = registry.create("Column").unwrap();
    column.set_store(handle);
    column.set("title", "Weekly").unwrap();
    column.set_related("author", author).unwrap();
    column.set_related("editor", editor).unwrap();

    let err = column.save().unwrap_err();
    assert!(matches!(err, MapperError::Sql(_)));

    // The author was saved before the editor failed; the rollback took
    // that insert with it, and the column itself was never written.
    assert_eq!(store.row_count("author").unwrap(), 0);
    assert_eq!(store.row_count("col").unwrap(), 0);
}

#[test]
fn one_to_many_saver_uses_parent_id() {
    let registry = TypeRegistry::new();
    registry.register(
        EntityDescriptor::builder("Comment")
            .table("comment")
            .id_field("id")
            .field("id", SqlType::Integer)
            .field("post", SqlType::Integer)
            .field("body", SqlType::Text)
            .build()
            .unwrap(),
    );
    registry.register(
        EntityDescriptor::builder("Post")
            .table("post")
            .id_field("id")
            .field("id", SqlType::Integer)
            .field("title", SqlType::Text)
            .loader("comments", |post| {
                let store = Arc::clone(post.store()?);
                let rows = store.select_rows("comment", "post", &post.id_value())?;
                let mut collection = EntityCollection::new();
                for row in &rows {
                    collection.push(post.registry().create_from_row("Comment", row)?);
                }
                Ok(Related::Collection(collection))
            })
            .saver("comments", |post| {
                let post_id = post.id_value();
                let Some(related) = post.relation_cached_mut("comments") else {
                    return Ok(());
                };
                let Some(comments) = related.as_collection_mut() else {
                    return Ok(());
                };
                for comment in comments.iter_mut() {
                    comment.set("post", post_id.clone())?;
                }
                comments.save_all()
            })
            .build()
            .unwrap(),
    );

    let store = Arc::new(InMemoryStore::new());
    store.create_table("post");
    store.create_table("comment");
    let handle: StoreHandle = store.clone();

    let mut post = registry.create("Post").unwrap();
    post.set_store(handle);
    post.set("title", "Hello").unwrap();

    let mut comments = EntityCollection::new();
    for body in ["first", "second"] {
        let mut comment = registry.create("Comment").unwrap();
        comment.set("body", body).unwrap();
        comments.push(comment);
    }
    post.set_related("comments", comments).unwrap();

    post.save().unwrap();

    let post_id = post.id_value();
    assert!(!post_id.is_null());
    let child_rows = store.select_rows("comment", "post", &post_id).unwrap();
    assert_eq!(child_rows.len(), 2);
}

#[test]
fn round_trip_reproduces_field_values() {
    let registry = blog_registry();
    let (_store, handle) = memory_store();

    let mut article = registry.create("Article").unwrap();
    article.set_store(handle.clone());
    article.set("title", "Hello").unwrap();
    article.set("published", "2024-05-01").unwrap();
    article.save().unwrap();

    let mut copy = registry.create("Article").unwrap();
    copy.set_store(handle);
    assert!(copy.load(article.id_value()).unwrap());

    assert_eq!(copy.get("title").unwrap(), &SqlValue::from("Hello"));
    assert!(matches!(copy.get("published").unwrap(), SqlValue::Date(_)));
    assert!(!copy.is_modified());
}

#[test]
fn delete_does_not_cascade() {
    let registry = blog_registry();
    let (store, handle) = memory_store();

    let mut author = registry.create("Author").unwrap();
    author.set("name", "Jo").unwrap();

    let mut article = registry.create("Article").unwrap();
    article.set_store(handle);
    article.set("title", "Hello").unwrap();
    article.set_related("author", author).unwrap();
    article.save().unwrap();

    article.delete().unwrap();

    // The article row is gone; the author row stays.
    assert_eq!(store.row_count("article").unwrap(), 0);
    assert_eq!(store.row_count("author").unwrap(), 1);
}
