use pankitchen_core::db::open_db_in_memory;
use pankitchen_core::{
    NewPost, NewUser, PostPatch, PostService, RepoError, ServiceError, UserService,
    ValidationError,
};

#[test]
fn register_rejects_duplicate_email_and_keeps_first_account() {
    let mut conn = open_db_in_memory().unwrap();
    let mut users = UserService::new(&mut conn);

    let first = users
        .register(&NewUser::new("baker@example.com", "hash-1"))
        .unwrap();
    assert!(first.is_active);

    let err = users
        .register(&NewUser::new("baker@example.com", "hash-2"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Repo(RepoError::Conflict(_))));

    let stored = users.get_user_by_email("baker@example.com").unwrap().unwrap();
    assert_eq!(stored, first);
    assert_eq!(stored.password_hash, "hash-1");
    assert!(users.get_user(first.id + 1).unwrap().is_none());
}

#[test]
fn register_rejects_blank_email() {
    let mut conn = open_db_in_memory().unwrap();

    let err = UserService::new(&mut conn)
        .register(&NewUser::new("  ", "hash"))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Repo(RepoError::InvalidArgument(ValidationError::BlankField("email")))
    ));
}

#[test]
fn serialized_user_omits_password_hash() {
    let mut conn = open_db_in_memory().unwrap();
    let user = UserService::new(&mut conn)
        .register(&NewUser::new("baker@example.com", "secret-hash"))
        .unwrap();

    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(json["email"], "baker@example.com");
    assert!(json.get("password_hash").is_none());
}

#[test]
fn only_the_owner_may_update_or_delete_a_post() {
    let mut conn = open_db_in_memory().unwrap();
    let mut users = UserService::new(&mut conn);
    let owner = users
        .register(&NewUser::new("owner@example.com", "h"))
        .unwrap()
        .id;
    let intruder = users
        .register(&NewUser::new("intruder@example.com", "h"))
        .unwrap()
        .id;
    drop(users);

    let mut posts = PostService::new(&mut conn);
    let post = posts
        .create_post(owner, &NewPost::new("Stollen", "enriched"))
        .unwrap();

    let patch = PostPatch {
        title: Some("Hijacked".to_string()),
        ..PostPatch::default()
    };
    let err = posts.update_post_as(intruder, post.id, &patch).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Forbidden { post_id, caller_id } if post_id == post.id && caller_id == intruder
    ));
    let err = posts.delete_post_as(intruder, post.id).unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden { .. }));

    assert_eq!(posts.get_post(post.id).unwrap().unwrap(), post);
    posts.delete_post_as(owner, post.id).unwrap();
}

#[test]
fn mutating_a_missing_post_reports_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = UserService::new(&mut conn)
        .register(&NewUser::new("owner@example.com", "h"))
        .unwrap()
        .id;

    let mut posts = PostService::new(&mut conn);
    assert!(matches!(
        posts.update_post_as(owner, 77, &PostPatch::default()),
        Err(ServiceError::PostNotFound(77))
    ));
    assert!(matches!(
        posts.delete_post_as(owner, 77),
        Err(ServiceError::PostNotFound(77))
    ));
}

#[test]
fn create_post_for_unknown_owner_is_invalid_argument() {
    let mut conn = open_db_in_memory().unwrap();

    let err = PostService::new(&mut conn)
        .create_post(42, &NewPost::new("Orphan loaf", "lean"))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Repo(RepoError::InvalidArgument(ValidationError::UnknownUser(42)))
    ));
}

#[test]
fn post_serializes_owner_as_user_id() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = UserService::new(&mut conn)
        .register(&NewUser::new("owner@example.com", "h"))
        .unwrap()
        .id;
    let post = PostService::new(&mut conn)
        .create_post(owner, &NewPost::new("Pretzel", "lye"))
        .unwrap();

    let json = serde_json::to_value(&post).unwrap();
    assert_eq!(json["user_id"], owner);
    assert!(json.get("owner_id").is_none());
    assert!(json["recipe"].is_null());
}
