mod common;

use std::time::Duration;

use common::{item_lines, registry, Harness};
use gsadmin::command::privileges::{MAP, STATUS};
use gsadmin::menu::{MenuSettings, KEY_BACK, KEY_NEXT};

fn maps(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("map{:02}", i)).collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn maps_menu_pages_forward_and_back() {
    let mut h = Harness::with_maps(maps(20));
    let admin = h.connect("admin", "STEAM_0:0:1", &[MAP]);

    h.as_player(&admin, "maps");
    h.settle().await;

    let first = h.out.last_menu(admin.user_id).expect("first page");
    assert!(first.body.starts_with("Maps (1/3)\n\n"));
    assert_eq!(item_lines(&first).len(), 8);
    assert!(first.has_key(KEY_NEXT));
    assert!(!first.has_key(KEY_BACK));
    assert!(first.body.ends_with("\n\n0. Next\n"));

    h.press(&admin, 0);
    let second = h.out.last_menu(admin.user_id).expect("second page");
    assert!(second.body.starts_with("Maps (2/3)"));
    assert!(second.has_key(KEY_BACK) && second.has_key(KEY_NEXT));
    assert_eq!(item_lines(&second)[0], "1. map08");
    assert_eq!(h.host.menus.page_of(admin.user_id), Some(1));

    h.press(&admin, 0);
    let third = h.out.last_menu(admin.user_id).expect("third page");
    assert!(third.body.starts_with("Maps (3/3)"));
    assert_eq!(item_lines(&third).len(), 4);
    assert!(!third.has_key(KEY_NEXT));
    // key 0 is not offered on the last page
    let shown = h.out.menus_to(admin.user_id).len();
    h.press(&admin, 0);
    assert_eq!(h.out.menus_to(admin.user_id).len(), shown);

    h.press(&admin, 9);
    h.press(&admin, 9);
    let back = h.out.last_menu(admin.user_id).expect("back to first");
    assert_eq!(back, first);
}

#[tokio::test(flavor = "multi_thread")]
async fn current_map_is_shown_but_not_selectable() {
    let mut h = Harness::with_maps(maps(3));
    let admin = h.connect("admin", "STEAM_0:0:1", &[MAP]);

    h.as_player(&admin, "maps");
    h.settle().await;
    let frame = h.out.last_menu(admin.user_id).expect("maps menu");
    assert_eq!(
        item_lines(&frame),
        vec!["(x) 1. map00", "2. map01", "3. map02"]
    );
    assert_eq!(frame.keys, 0b110);

    // pressing the disabled slot does nothing and keeps the menu open
    h.press(&admin, 1);
    assert!(h.host.menus.is_active(admin.user_id));
    assert_eq!(h.engine.current(), "map00");

    h.press(&admin, 3);
    assert!(!h.host.menus.is_active(admin.user_id));
    assert_eq!(h.engine.current(), "map02");
    h.settle().await;
    assert_eq!(h.store.map_changes().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn unoffered_keys_are_ignored() {
    let mut h = Harness::with_maps(maps(2));
    let admin = h.connect("admin", "STEAM_0:0:1", &[MAP]);

    h.as_player(&admin, "maps");
    h.settle().await;
    let before = h.out.len();

    for key in [3, 8, 9, 0] {
        h.press(&admin, key);
    }
    assert_eq!(h.out.len(), before);
    assert!(h.host.menus.is_active(admin.user_id));
}

#[tokio::test(flavor = "multi_thread")]
async fn exactly_one_full_page_still_offers_an_empty_next_page() {
    let mut h = Harness::new();
    let admin = h.connect("admin", "STEAM_0:0:1", &[STATUS]);
    for i in 0..7 {
        h.connect(&format!("p{}", i), &format!("STEAM_0:0:2{}", i), &[]);
    }

    h.as_player(&admin, "who");
    let first = h.out.last_menu(admin.user_id).expect("who menu");
    assert_eq!(item_lines(&first).len(), 8);
    assert!(first.body.contains("(1/2)"));
    assert!(first.has_key(KEY_NEXT));

    h.press(&admin, 0);
    let second = h.out.last_menu(admin.user_id).expect("empty page");
    assert!(item_lines(&second).is_empty());
    assert_eq!(second.keys, 1 << KEY_BACK);
}

#[tokio::test(flavor = "multi_thread")]
async fn configured_page_size_and_display_time_apply() {
    let settings = MenuSettings {
        items_per_page: 3,
        display_time: Some(Duration::from_secs(15)),
    };
    let mut h = Harness::build(registry(), maps(7), settings);
    let admin = h.connect("admin", "STEAM_0:0:1", &[MAP]);

    h.as_player(&admin, "maps");
    h.settle().await;
    let frame = h.out.last_menu(admin.user_id).expect("maps menu");
    assert!(frame.body.starts_with("Maps (1/3)"));
    assert_eq!(item_lines(&frame).len(), 3);
    assert_eq!(frame.display_time, 15);
}

#[tokio::test(flavor = "multi_thread")]
async fn new_menu_replaces_the_open_one_at_page_one() {
    let mut h = Harness::with_maps(maps(12));
    let admin = h.connect("admin", "STEAM_0:0:1", &[MAP, STATUS]);

    h.as_player(&admin, "maps");
    h.settle().await;
    h.press(&admin, 0);
    assert_eq!(h.host.menus.page_of(admin.user_id), Some(1));

    h.as_player(&admin, "who");
    assert_eq!(h.host.menus.page_of(admin.user_id), Some(0));
    let frame = h.out.last_menu(admin.user_id).expect("who menu");
    assert!(frame.body.contains("nick"));
}

#[tokio::test(flavor = "multi_thread")]
async fn disconnect_forgets_menu_state() {
    let mut h = Harness::new();
    let admin = h.connect("admin", "STEAM_0:0:1", &[STATUS]);

    h.as_player(&admin, "who");
    assert!(h.host.menus.is_active(admin.user_id));
    h.host.disconnect(admin.user_id);
    assert!(!h.host.menus.is_active(admin.user_id));
}
