use pankitchen_core::db::open_db_in_memory;
use pankitchen_core::{
    NewPhoto, NewPost, NewRecipe, NewUser, Page, PostPatch, PostRepository, PostService,
    RecipePatch, RepoError, SqlitePostRepository, UnitOfWork, UserId, UserService,
};
use rusqlite::Connection;

fn register(conn: &mut Connection, email: &str) -> UserId {
    UserService::new(conn)
        .register(&NewUser::new(email, "argon2$hash"))
        .unwrap()
        .id
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn full_post() -> NewPost {
    let mut post = NewPost::new("Country sourdough", "sourdough");
    post.description = Some("Open crumb, dark crust".to_string());
    post.recipe = Some(NewRecipe {
        ingredients: "flour, water, salt, levain".to_string(),
        instructions: "mix, fold, shape, bake".to_string(),
        fermentation_time: Some("12 hours cold retard".to_string()),
    });
    post.photos = vec![
        NewPhoto::new("https://cdn.example.com/a.jpg", 2),
        NewPhoto::new("https://cdn.example.com/b.jpg", 1),
    ];
    post.tags = vec![
        "sourdough".to_string(),
        "rye".to_string(),
        "sourdough".to_string(),
    ];
    post
}

#[test]
fn create_post_persists_recipe_photos_and_tags() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&mut conn, "baker@example.com");

    let created = PostService::new(&mut conn)
        .create_post(owner, &full_post())
        .unwrap();

    assert_eq!(created.owner_id, owner);
    let recipe = created.recipe.as_ref().unwrap();
    assert_eq!(recipe.post_id, created.id);
    assert_eq!(
        recipe.fermentation_time.as_deref(),
        Some("12 hours cold retard")
    );

    let urls: Vec<&str> = created.photos.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://cdn.example.com/a.jpg", "https://cdn.example.com/b.jpg"]
    );
    let orders: Vec<i64> = created.photos.iter().map(|p| p.order).collect();
    assert_eq!(orders, vec![2, 1]);

    let tags: Vec<&str> = created.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tags, vec!["sourdough", "rye"]);
    assert!(created.likes.is_empty());

    let fetched = PostService::new(&mut conn)
        .get_post(created.id)
        .unwrap()
        .unwrap();
    assert_eq!(fetched, created);
}

#[test]
fn tags_are_reused_by_exact_name() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&mut conn, "baker@example.com");

    let mut first = NewPost::new("Rye loaf", "rye");
    first.tags = vec!["sourdough".to_string()];
    let mut second = NewPost::new("Spelt loaf", "spelt");
    second.tags = vec!["sourdough".to_string(), "Sourdough".to_string()];

    let mut service = PostService::new(&mut conn);
    let a = service.create_post(owner, &first).unwrap();
    let b = service.create_post(owner, &second).unwrap();
    drop(service);

    assert_eq!(a.tags[0].id, b.tags[0].id);
    assert_ne!(b.tags[0].id, b.tags[1].id);
    assert_eq!(count(&conn, "tags"), 2);
    assert_eq!(count(&conn, "post_tags"), 3);
}

#[test]
fn update_replaces_photo_and_tag_sets_but_keeps_tag_rows() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&mut conn, "baker@example.com");
    let mut service = PostService::new(&mut conn);
    let created = service.create_post(owner, &full_post()).unwrap();

    let patch = PostPatch {
        title: Some("Country sourdough v2".to_string()),
        photos: Some(vec![NewPhoto::new("https://cdn.example.com/c.jpg", 0)]),
        tags: Some(vec!["wholewheat".to_string()]),
        ..PostPatch::default()
    };
    let updated = service.update_post_as(owner, created.id, &patch).unwrap();
    drop(service);

    assert_eq!(updated.title, "Country sourdough v2");
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.bread_type, "sourdough");
    assert_eq!(updated.recipe, created.recipe);
    assert_eq!(updated.photos.len(), 1);
    assert_eq!(updated.photos[0].url, "https://cdn.example.com/c.jpg");
    let tags: Vec<&str> = updated.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tags, vec!["wholewheat"]);

    assert_eq!(count(&conn, "photos"), 1);
    assert_eq!(count(&conn, "post_tags"), 1);
    assert_eq!(count(&conn, "tags"), 3);
}

#[test]
fn empty_lists_in_patch_clear_photos_and_tags() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&mut conn, "baker@example.com");
    let mut service = PostService::new(&mut conn);
    let created = service.create_post(owner, &full_post()).unwrap();

    let patch = PostPatch {
        photos: Some(Vec::new()),
        tags: Some(Vec::new()),
        ..PostPatch::default()
    };
    let updated = service.update_post_as(owner, created.id, &patch).unwrap();

    assert!(updated.photos.is_empty());
    assert!(updated.tags.is_empty());
    assert_eq!(updated.title, created.title);
}

#[test]
fn recipe_patch_updates_only_given_fields_or_creates_recipe() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&mut conn, "baker@example.com");
    let mut service = PostService::new(&mut conn);

    let with_recipe = service.create_post(owner, &full_post()).unwrap();
    let patch = PostPatch {
        recipe: Some(RecipePatch {
            fermentation_time: Some(Some("4 hours at 26C".to_string())),
            ..RecipePatch::default()
        }),
        ..PostPatch::default()
    };
    let updated = service
        .update_post_as(owner, with_recipe.id, &patch)
        .unwrap();
    let recipe = updated.recipe.unwrap();
    assert_eq!(recipe.id, with_recipe.recipe.as_ref().unwrap().id);
    assert_eq!(recipe.ingredients, "flour, water, salt, levain");
    assert_eq!(recipe.fermentation_time.as_deref(), Some("4 hours at 26C"));

    let bare = service
        .create_post(owner, &NewPost::new("Pita", "flat"))
        .unwrap();
    let patch = PostPatch {
        recipe: Some(RecipePatch {
            ingredients: Some("flour, water, yeast".to_string()),
            instructions: Some("bake very hot".to_string()),
            fermentation_time: None,
        }),
        ..PostPatch::default()
    };
    let updated = service.update_post_as(owner, bare.id, &patch).unwrap();
    let recipe = updated.recipe.unwrap();
    assert_eq!(recipe.post_id, bare.id);
    assert_eq!(recipe.instructions, "bake very hot");
    assert!(recipe.fermentation_time.is_none());
}

#[test]
fn explicit_null_in_patch_clears_nullable_fields() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&mut conn, "baker@example.com");
    let mut service = PostService::new(&mut conn);
    let created = service.create_post(owner, &full_post()).unwrap();

    let untouched: PostPatch = serde_json::from_str(r#"{"recipe": {}}"#).unwrap();
    let kept = service
        .update_post_as(owner, created.id, &untouched)
        .unwrap();
    assert_eq!(kept.description, created.description);
    assert_eq!(kept.recipe, created.recipe);

    let clearing: PostPatch = serde_json::from_str(
        r#"{"description": null, "recipe": {"fermentation_time": null}}"#,
    )
    .unwrap();
    let cleared = service
        .update_post_as(owner, created.id, &clearing)
        .unwrap();

    assert_eq!(cleared.description, None);
    let recipe = cleared.recipe.unwrap();
    assert_eq!(recipe.fermentation_time, None);
    assert_eq!(recipe.ingredients, "flour, water, salt, levain");
    assert_eq!(cleared.title, created.title);

    let reread = service.get_post(created.id).unwrap().unwrap();
    assert_eq!(reread.description, None);
    assert_eq!(reread.recipe.unwrap().fermentation_time, None);
}

#[test]
fn delete_post_removes_all_children_but_not_tags() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&mut conn, "baker@example.com");
    let fan = register(&mut conn, "fan@example.com");
    let mut post = full_post();
    post.photos
        .push(NewPhoto::new("https://cdn.example.com/crumb.jpg", 3));
    let mut service = PostService::new(&mut conn);
    let created = service.create_post(owner, &post).unwrap();
    assert!(created.recipe.is_some());
    assert_eq!(created.photos.len(), 3);
    assert_eq!(created.tags.len(), 2);
    service.like_post(fan, created.id).unwrap();

    service.delete_post_as(owner, created.id).unwrap();
    assert!(service.get_post(created.id).unwrap().is_none());
    drop(service);

    for table in ["posts", "recipes", "photos", "post_tags", "likes"] {
        assert_eq!(count(&conn, table), 0, "{table} still has rows");
    }
    assert_eq!(count(&conn, "tags"), 2);
}

#[test]
fn delete_and_update_report_missing_posts_without_writing() {
    let mut conn = open_db_in_memory().unwrap();
    register(&mut conn, "baker@example.com");
    let mut uow = UnitOfWork::begin(&mut conn).unwrap();
    let mut repo = SqlitePostRepository::new(&mut uow);

    assert!(!repo.delete_post(404).unwrap());
    let patch = PostPatch {
        title: Some("ghost".to_string()),
        ..PostPatch::default()
    };
    assert!(repo.update_post(404, &patch).unwrap().is_none());
    assert!(repo.get_post(404).unwrap().is_none());
}

#[test]
fn lists_are_paginated_in_creation_order() {
    let mut conn = open_db_in_memory().unwrap();
    let alice = register(&mut conn, "alice@example.com");
    let bob = register(&mut conn, "bob@example.com");
    let mut service = PostService::new(&mut conn);

    let a1 = service
        .create_post(alice, &NewPost::new("Bagel", "boiled"))
        .unwrap();
    let b1 = service
        .create_post(bob, &NewPost::new("Challah", "enriched"))
        .unwrap();
    let a2 = service
        .create_post(alice, &NewPost::new("Ciabatta", "lean"))
        .unwrap();

    let all: Vec<i64> = service
        .list_all_posts(Page::default())
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(all, vec![a1.id, b1.id, a2.id]);

    let window = service.list_all_posts(Page::new(1, 1)).unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].id, b1.id);

    let alices: Vec<i64> = service
        .list_posts_by_user(alice, Page::default())
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(alices, vec![a1.id, a2.id]);

    assert!(service.list_all_posts(Page::new(10, 5)).unwrap().is_empty());
    assert!(service
        .list_posts_by_user(9_999, Page::default())
        .unwrap()
        .is_empty());
}

#[test]
fn abandoned_unit_of_work_discards_created_post() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&mut conn, "baker@example.com");

    {
        let mut uow = UnitOfWork::begin(&mut conn).unwrap();
        let created = SqlitePostRepository::new(&mut uow)
            .create_post(owner, &full_post())
            .unwrap();
        assert!(SqlitePostRepository::new(&mut uow)
            .get_post(created.id)
            .unwrap()
            .is_some());
    }

    for table in ["posts", "recipes", "photos", "post_tags", "tags"] {
        assert_eq!(count(&conn, table), 0, "{table} still has rows");
    }
}

#[test]
fn failure_mid_create_leaves_no_partial_post() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&mut conn, "baker@example.com");
    conn.execute_batch(
        "CREATE TRIGGER reject_broken_photo BEFORE INSERT ON photos
         WHEN NEW.url = 'broken'
         BEGIN SELECT RAISE(ABORT, 'photo rejected'); END;",
    )
    .unwrap();

    let mut post = full_post();
    post.photos.push(NewPhoto::new("broken", 3));

    let mut uow = UnitOfWork::begin(&mut conn).unwrap();
    let err = SqlitePostRepository::new(&mut uow)
        .create_post(owner, &post)
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    uow.commit().unwrap();

    for table in ["posts", "recipes", "photos", "post_tags"] {
        assert_eq!(count(&conn, table), 0, "{table} still has rows");
    }
}

#[test]
fn failure_mid_update_keeps_previous_state() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&mut conn, "baker@example.com");
    let created = PostService::new(&mut conn)
        .create_post(owner, &full_post())
        .unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_broken_photo BEFORE INSERT ON photos
         WHEN NEW.url = 'broken'
         BEGIN SELECT RAISE(ABORT, 'photo rejected'); END;",
    )
    .unwrap();

    let patch = PostPatch {
        title: Some("Renamed".to_string()),
        photos: Some(vec![
            NewPhoto::new("https://cdn.example.com/c.jpg", 0),
            NewPhoto::new("broken", 1),
        ]),
        ..PostPatch::default()
    };
    let mut service = PostService::new(&mut conn);
    assert!(service.update_post_as(owner, created.id, &patch).is_err());

    let current = service.get_post(created.id).unwrap().unwrap();
    assert_eq!(current, created);
}
