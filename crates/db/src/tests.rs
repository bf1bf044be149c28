use crate::models::{self, ChannelColumn, NewChannel, NewUser, Region, Role, User};

use super::*;

async fn prepare() -> Result<DB> {
    common::init_logger();

    const DIR: &str = "target/test-db";
    const REL_PATH: &str = "../..";
    std::fs::create_dir_all(format!("{REL_PATH}/{DIR}")).unwrap();
    let path_fmt = |id| format!("{REL_PATH}/{DIR}/{id}.db");

    // in hope that no single test can call this at the same time
    let mut id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();

    let mut file = path_fmt(id);
    while std::fs::exists(&file).unwrap() {
        id += 1;
        file = path_fmt(id);
    }

    log::debug!("using db at {DIR}/{id}.db");
    DB::init(&file).await
}

fn channel(tag: &str) -> NewChannel {
    NewChannel::builder()
        .name(format!("channel {tag}"))
        .chat_id(format!("-100{tag}"))
        .invite_link(format!("https://t.me/join_{tag}"))
        .build()
}

#[tokio::test]
async fn test_create_then_get_roundtrip() -> Result<()> {
    let db = prepare().await?;

    let created = db
        .add_channel(
            NewChannel::builder()
                .name("news")
                .chat_id("-1001234")
                .invite_link("https://t.me/some_news")
                .build(),
        )
        .await?;

    let fetched = db.repo::<models::Channel>().get(created.id()).await?;
    assert_eq!(fetched, Some(created));

    Ok(())
}

#[tokio::test]
async fn test_get_missing_is_none() -> Result<()> {
    let db = prepare().await?;

    assert_eq!(db.region(404).await?, None);
    assert_eq!(db.repo::<Region>().delete(404).await?, None);

    Ok(())
}

#[tokio::test]
async fn test_regions_listed_newest_first() -> Result<()> {
    let db = prepare().await?;

    for name in ["first", "second", "third"] {
        db.add_region(name).await?;
    }

    let names: Vec<_> = db.list_regions().await?.iter().map(|r| r.name().to_string()).collect();
    assert_eq!(names, ["third", "second", "first"]);

    Ok(())
}

#[tokio::test]
async fn test_list_districts_filters_by_region() -> Result<()> {
    let db = prepare().await?;

    let tashkent = db.add_region("Tashkent").await?;
    let samarkand = db.add_region("Samarkand").await?;
    let empty = db.add_region("Navoi").await?;

    db.add_district(tashkent.id(), "Chilonzor").await?;
    db.add_district(tashkent.id(), "Yunusobod").await?;
    db.add_district(samarkand.id(), "Urgut").await?;

    assert_eq!(db.list_districts(tashkent.id()).await?.len(), 2);
    assert_eq!(db.list_districts(samarkand.id()).await?.len(), 1);
    // region with no districts and unknown region both yield empty, not error
    assert!(db.list_districts(empty.id()).await?.is_empty());
    assert!(db.list_districts(9000).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_district_requires_region() -> Result<()> {
    let db = prepare().await?;

    let res = db.add_district(77, "Orphan").await;
    assert!(matches!(res, Err(e) if e.is_constraint()));

    Ok(())
}

#[tokio::test]
async fn test_deleting_region_cascades_to_districts() -> Result<()> {
    let db = prepare().await?;

    let region = db.add_region("Fergana").await?;
    db.add_district(region.id(), "Quva").await?;
    db.add_district(region.id(), "Rishton").await?;

    let deleted = db.repo::<Region>().delete(region.id()).await?;
    assert_eq!(deleted.map(|r| r.name().to_string()), Some("Fergana".to_string()));
    assert!(db.list_districts(region.id()).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_get_or_create_user_is_idempotent() -> Result<()> {
    let db = prepare().await?;

    let new = |id| {
        NewUser::builder()
            .id(id)
            .first_name("Aziz".to_string())
            .username("aziz".to_string())
            .build()
    };

    let (first, created) = db.get_or_create_user(new(10)).await?;
    assert!(created);

    let (second, created) = db.get_or_create_user(new(10)).await?;
    assert!(!created);
    assert_eq!(first, second);

    Ok(())
}

#[tokio::test]
async fn test_user_role_defaults_to_user() -> Result<()> {
    let db = prepare().await?;

    let (user, _) = db.get_or_create_user(NewUser::builder().id(1).build()).await?;
    assert_eq!(user.role(), Role::User);
    assert!(!user.is_admin());

    Ok(())
}

#[tokio::test]
async fn test_list_users_by_role() -> Result<()> {
    let db = prepare().await?;

    db.get_or_create_user(NewUser::builder().id(1).role(Role::Admin).build())
        .await?;
    db.get_or_create_user(NewUser::builder().id(2).build()).await?;
    db.get_or_create_user(NewUser::builder().id(3).build()).await?;

    let admins = db.list_users_by_role(Role::Admin).await?;
    assert_eq!(admins.iter().map(User::id).collect::<Vec<_>>(), [1]);

    let users = db.list_users_by_role(Role::User).await?;
    assert_eq!(users.iter().map(User::id).collect::<Vec<_>>(), [3, 2]);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_invite_link_is_constraint_error() -> Result<()> {
    let db = prepare().await?;

    db.add_channel(channel("a")).await?;
    let res = db
        .add_channel(
            NewChannel::builder()
                .name("same link, different chat")
                .chat_id("-100999")
                .invite_link("https://t.me/join_a")
                .build(),
        )
        .await;

    assert!(matches!(res, Err(e) if e.is_constraint()));
    assert_eq!(db.list_channels().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_remove_channel_returns_prior_state() -> Result<()> {
    let db = prepare().await?;

    let saved = db.add_channel(channel("b")).await?;

    let removed = db.remove_channel(saved.id()).await?;
    assert_eq!(removed, Some(saved));

    let removed_again = db.remove_channel(removed.unwrap().id()).await?;
    assert_eq!(removed_again, None);

    Ok(())
}

#[tokio::test]
async fn test_update_patches_only_named_columns() -> Result<()> {
    let db = prepare().await?;

    let saved = db.add_channel(channel("c")).await?;

    let updated = db
        .repo::<models::Channel>()
        .update(saved.id(), Patch::new().set(ChannelColumn::Name, "renamed"))
        .await?
        .unwrap();
    assert_eq!(updated.name(), "renamed");
    assert_eq!(updated.chat_id(), saved.chat_id());
    assert_eq!(updated.invite_link(), saved.invite_link());

    let missing = db
        .repo::<models::Channel>()
        .update(999, Patch::new().set(ChannelColumn::Name, "nope"))
        .await?;
    assert_eq!(missing, None);

    Ok(())
}

#[tokio::test]
async fn test_truncate_returns_snapshot() -> Result<()> {
    let db = prepare().await?;

    db.add_channel(channel("d")).await?;
    db.add_channel(channel("e")).await?;

    let removed = db.repo::<models::Channel>().truncate().await?;
    assert_eq!(removed.len(), 2);
    assert!(db.list_channels().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_filter_comparison_predicates() -> Result<()> {
    let db = prepare().await?;

    for (id, role) in [(5, Role::User), (6, Role::Admin), (7, Role::User)] {
        db.get_or_create_user(NewUser::builder().id(id).role(role).created_at(id * 100).build())
            .await?;
    }

    let late = db
        .repo::<User>()
        .filter(
            Filter::new()
                .cmp(models::UserColumn::CreatedAt, Op::Gt, 500)
                .eq(models::UserColumn::Role, Role::User),
        )
        .await?;
    assert_eq!(late.iter().map(User::id).collect::<Vec<_>>(), [7]);

    Ok(())
}

#[tokio::test]
async fn test_stats_counts_rows() -> Result<()> {
    let db = prepare().await?;

    let region = db.add_region("Bukhara").await?;
    db.add_district(region.id(), "Gijduvon").await?;
    db.add_channel(channel("f")).await?;
    db.get_or_create_user(NewUser::builder().id(1).role(Role::Admin).build())
        .await?;
    db.get_or_create_user(NewUser::builder().id(2).build()).await?;

    let stats = db.load_stats().await?;
    assert_eq!(stats.users, 2);
    assert_eq!(stats.admins, 1);
    assert_eq!(stats.regions, 1);
    assert_eq!(stats.districts, 1);
    assert_eq!(stats.channels, 1);

    Ok(())
}
