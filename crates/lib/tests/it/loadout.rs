//! Loadout ownership, visibility, listing and toggles

use armory::{
    Armory,
    loadout::{ListMode, LoadoutOrdering, LoadoutQuery, NewLoadout},
};

use crate::helpers::*;

struct Pieces {
    helmet: i64,
    armor: i64,
    cape: i64,
}

async fn pieces(armory: &Armory) -> Pieces {
    Pieces {
        helmet: helmet(armory, "FS-05 Marksman", 150).await,
        armor: armor(armory, "CE-35 Trench Engineer", 250).await,
        cape: cape(armory, "Mantle of Liberty", 100).await,
    }
}

fn new_loadout(p: &Pieces, name: &str, is_public: bool) -> NewLoadout {
    NewLoadout {
        name: name.to_string(),
        helmet_id: p.helmet,
        armor_id: p.armor,
        cape_id: p.cape,
        is_public,
    }
}

fn query(mode: ListMode) -> LoadoutQuery {
    LoadoutQuery {
        mode,
        ..LoadoutQuery::default()
    }
}

#[tokio::test]
async fn create_validates_name_and_components() {
    let armory = test_armory().await;
    let owner = test_user(&armory, "owner").await;
    let p = pieces(&armory).await;
    let loadouts = armory.loadouts();

    let created = loadouts
        .create(owner.id, new_loadout(&p, "  Bug Hunter  ", true))
        .await
        .unwrap();
    assert_eq!(created.name, "Bug Hunter");
    assert_eq!(created.owner_username, "owner");
    assert!(created.is_mine);
    assert_eq!((created.like_count, created.favorite_count), (0, 0));

    let err = loadouts
        .create(owner.id, new_loadout(&p, "   ", true))
        .await
        .unwrap_err();
    assert!(err.is_validation_error());

    let err = loadouts
        .create(owner.id, new_loadout(&p, &"x".repeat(101), true))
        .await
        .unwrap_err();
    assert!(err.is_validation_error());

    // Helmet id in the cape slot.
    let swapped = NewLoadout {
        cape_id: p.helmet,
        ..new_loadout(&p, "Swapped", true)
    };
    let err = loadouts.create(owner.id, swapped).await.unwrap_err();
    assert!(err.is_validation_error());
}

#[tokio::test]
async fn private_loadouts_are_hidden_from_others() {
    let armory = test_armory().await;
    let owner = test_user(&armory, "owner").await;
    let other = test_user(&armory, "other").await;
    let p = pieces(&armory).await;
    let loadouts = armory.loadouts();

    let private = loadouts
        .create(owner.id, new_loadout(&p, "Secret", false))
        .await
        .unwrap();

    loadouts.get(private.id, Some(owner.id)).await.unwrap();
    assert!(loadouts.get(private.id, Some(other.id)).await.unwrap_err().is_not_found());
    assert!(loadouts.get(private.id, None).await.unwrap_err().is_not_found());
    assert!(
        loadouts
            .toggle_like(other.id, private.id)
            .await
            .unwrap_err()
            .is_not_found()
    );

    let public = loadouts.list(None, &query(ListMode::Public)).await.unwrap();
    assert_eq!(public.count, 0);
}

#[tokio::test]
async fn only_owners_update() {
    let armory = test_armory().await;
    let owner = test_user(&armory, "owner").await;
    let other = test_user(&armory, "other").await;
    let p = pieces(&armory).await;
    let loadouts = armory.loadouts();

    let loadout = loadouts
        .create(owner.id, new_loadout(&p, "Original", true))
        .await
        .unwrap();

    let err = loadouts
        .update(other.id, loadout.id, new_loadout(&p, "Hijacked", true))
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());

    let updated = loadouts
        .update(owner.id, loadout.id, new_loadout(&p, "Renamed", false))
        .await
        .unwrap();
    assert_eq!(updated.name, "Renamed");
    assert!(!updated.is_public);
    assert!(updated.updated_at >= loadout.updated_at);
}

#[tokio::test]
async fn owners_and_staff_delete() {
    let armory = test_armory().await;
    let owner = test_user(&armory, "owner").await;
    let other = test_user(&armory, "other").await;
    let moderator = test_user(&armory, "moderator").await;
    let moderator = armory.users().set_staff(moderator.id, true).await.unwrap();
    let p = pieces(&armory).await;
    let loadouts = armory.loadouts();

    let public = loadouts
        .create(owner.id, new_loadout(&p, "Public", true))
        .await
        .unwrap();
    let private = loadouts
        .create(owner.id, new_loadout(&p, "Private", false))
        .await
        .unwrap();

    assert!(loadouts.delete(&other, public.id).await.unwrap_err().is_permission_denied());
    assert!(loadouts.delete(&other, private.id).await.unwrap_err().is_not_found());

    loadouts.delete(&moderator, private.id).await.unwrap();
    loadouts.delete(&owner, public.id).await.unwrap();
    assert!(loadouts.get(public.id, Some(owner.id)).await.unwrap_err().is_not_found());
    assert!(loadouts.delete(&owner, public.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn toggles_flip_and_report_counts() {
    let armory = test_armory().await;
    let owner = test_user(&armory, "owner").await;
    let fan = test_user(&armory, "fan").await;
    let p = pieces(&armory).await;
    let loadouts = armory.loadouts();
    let loadout = loadouts
        .create(owner.id, new_loadout(&p, "Liked", true))
        .await
        .unwrap();

    let outcome = loadouts.toggle_like(fan.id, loadout.id).await.unwrap();
    assert!(outcome.active);
    assert_eq!(outcome.like_count, 1);

    let outcome = loadouts.toggle_like(owner.id, loadout.id).await.unwrap();
    assert_eq!(outcome.like_count, 2);

    let outcome = loadouts.toggle_favorite(fan.id, loadout.id).await.unwrap();
    assert!(outcome.active);
    assert_eq!((outcome.like_count, outcome.favorite_count), (2, 1));

    let seen = loadouts.get(loadout.id, Some(fan.id)).await.unwrap();
    assert!(seen.is_liked && seen.is_favorited && !seen.is_mine);

    let outcome = loadouts.toggle_like(fan.id, loadout.id).await.unwrap();
    assert!(!outcome.active);
    assert_eq!(outcome.like_count, 1);
}

#[tokio::test]
async fn listing_modes() {
    let (armory, clock, _mailer) = test_armory_with_clock().await;
    let owner = test_user(&armory, "owner").await;
    let fan = test_user(&armory, "fan").await;
    let p = pieces(&armory).await;
    let loadouts = armory.loadouts();

    let quiet = loadouts
        .create(owner.id, new_loadout(&p, "Quiet", true))
        .await
        .unwrap();
    clock.advance_secs(1);
    let hidden = loadouts
        .create(owner.id, new_loadout(&p, "Hidden", false))
        .await
        .unwrap();
    clock.advance_secs(1);
    let popular = loadouts
        .create(fan.id, new_loadout(&p, "Crowd Favorite", true))
        .await
        .unwrap();
    // Older but more popular.
    loadouts.toggle_like(owner.id, quiet.id).await.unwrap();
    loadouts.toggle_favorite(fan.id, quiet.id).await.unwrap();

    let ids = |page: armory::catalog::Page<armory::loadout::Loadout>| -> Vec<i64> {
        page.results.iter().map(|l| l.id).collect()
    };

    let public = loadouts.list(None, &query(ListMode::Public)).await.unwrap();
    assert_eq!(ids(public), vec![quiet.id, popular.id]);

    let newest = LoadoutQuery {
        ordering: Some(LoadoutOrdering::Newest),
        ..query(ListMode::Public)
    };
    assert_eq!(ids(loadouts.list(None, &newest).await.unwrap()), vec![popular.id, quiet.id]);

    let mine = loadouts.list(Some(owner.id), &query(ListMode::Mine)).await.unwrap();
    assert_eq!(ids(mine), vec![hidden.id, quiet.id]);

    let favorites = loadouts
        .list(Some(fan.id), &query(ListMode::Favorites))
        .await
        .unwrap();
    assert_eq!(ids(favorites), vec![quiet.id]);

    let err = loadouts.list(None, &query(ListMode::Mine)).await.unwrap_err();
    assert!(err.is_authentication_error());
}

#[tokio::test]
async fn search_matches_name_or_owner() {
    let armory = test_armory().await;
    let owner = test_user(&armory, "kettle").await;
    let other = test_user(&armory, "teapot").await;
    let p = pieces(&armory).await;
    let loadouts = armory.loadouts();

    loadouts
        .create(owner.id, new_loadout(&p, "Automaton Breaker", true))
        .await
        .unwrap();
    loadouts
        .create(other.id, new_loadout(&p, "Terminid Sweeper", true))
        .await
        .unwrap();

    let search = |term: &str| LoadoutQuery {
        search: Some(term.to_string()),
        ..query(ListMode::Public)
    };

    let page = loadouts.list(None, &search("automaton")).await.unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].owner_username, "kettle");

    let page = loadouts.list(None, &search("teapot")).await.unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].name, "Terminid Sweeper");

    assert_eq!(loadouts.list(None, &search("bile titan")).await.unwrap().count, 0);
}
