use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use gridmenu_core::{
    Button, ClickEvent, DragEvent, HostEvent, Item, MemoryHost, MenuRegistry, Pattern,
    SessionData, Surfaces, Template, UserId,
};

const PLAYER: UserId = UserId(7);

fn setup() -> (Arc<MemoryHost>, MenuRegistry) {
    let host = Arc::new(MemoryHost::new());
    let registry = MenuRegistry::new(host.clone());
    (host, registry)
}

/// Feed host notifications back into the registry and tick until idle.
fn settle(host: &MemoryHost, registry: &MenuRegistry) {
    for _ in 0..16 {
        for mut event in host.drain_events() {
            registry.dispatch(&mut event);
        }
        if host.pending_tasks() == 0 && !host.has_events() {
            return;
        }
        host.tick();
    }
}

#[test]
fn bordered_menu_with_cooled_down_button() {
    let (host, registry) = setup();
    let clicks = Arc::new(AtomicUsize::new(0));
    let counter = clicks.clone();

    registry
        .create_chest_template("main", "Main", 3, |template| {
            Ok(template
                .with_pattern(Pattern::new(["XXXXXXXXX"]).glyph('X', "A"))
                .with_button(
                    13,
                    Button::new("B")
                        .click_cooldown(Duration::from_millis(500))
                        .on_click(move |_, _| {
                            counter.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }),
                ))
        })
        .unwrap();

    let session = registry.open(PLAYER, "main", SessionData::new()).unwrap();
    settle(&host, &registry);

    let surface = session.surface();
    assert_eq!(host.size(surface), 27);
    assert_eq!(host.current_top_surface(PLAYER), Some(surface));
    for index in 0..9 {
        assert_eq!(host.cell(surface, index), Some(Item::new("A")), "cell {index}");
    }
    assert_eq!(host.cell(surface, 13), Some(Item::new("B")));
    assert_eq!(host.cell(surface, 9), None);

    let start = Instant::now();
    let mut first = HostEvent::Click(ClickEvent::new(PLAYER, surface, 13, start));
    let mut second = HostEvent::Click(ClickEvent::new(
        PLAYER,
        surface,
        13,
        start + Duration::from_millis(100),
    ));
    registry.dispatch(&mut first);
    registry.dispatch(&mut second);

    assert_eq!(clicks.load(Ordering::SeqCst), 1);
    assert!(first.is_cancelled());
    assert!(second.is_cancelled());

    let mut late = ClickEvent::new(PLAYER, surface, 13, start + Duration::from_millis(600));
    registry.on_click(&mut late);
    assert_eq!(clicks.load(Ordering::SeqCst), 2);

    let mut free_cell = ClickEvent::new(PLAYER, surface, 20, start);
    registry.on_click(&mut free_cell);
    assert!(!free_cell.is_cancelled());

    let mut outside = ClickEvent::new(PLAYER, surface, 40, start);
    registry.on_click(&mut outside);
    assert!(!outside.is_cancelled());

    let mut drag = DragEvent::new(PLAYER, surface, vec![45, 3]);
    registry.on_drag(&mut drag);
    assert!(drag.is_cancelled());
}

#[test]
fn replacing_a_menu_closes_the_old_one_exactly_once() {
    let (host, registry) = setup();
    let log = Arc::new(Mutex::new(Vec::new()));

    for id in ["first", "second"] {
        let log = log.clone();
        registry.register(
            Template::chest(id, id, 1)
                .unwrap()
                .on_close(move |session| {
                    log.lock().unwrap().push(session.template().id().to_string());
                    Ok(())
                }),
        );
    }

    let first = registry.open(PLAYER, "first", SessionData::new()).unwrap();
    settle(&host, &registry);
    let second = registry.open(PLAYER, "second", SessionData::new()).unwrap();
    settle(&host, &registry);

    assert!(first.is_closed());
    assert!(!second.is_closed());
    assert_eq!(log.lock().unwrap().as_slice(), ["first"]);
    assert!(registry.session(PLAYER).unwrap().ptr_eq(&second));
    assert_eq!(host.current_top_surface(PLAYER), Some(second.surface()));

    host.user_close(PLAYER);
    settle(&host, &registry);
    assert!(second.is_closed());
    assert!(registry.session(PLAYER).is_none());
    assert_eq!(log.lock().unwrap().as_slice(), ["first", "second"]);
}

#[test]
fn click_handler_can_open_a_submenu() {
    let (host, registry) = setup();
    let router = registry.clone();

    registry.register(Template::chest("shop", "Shop", 2).unwrap());
    registry.register(Template::chest("main", "Main", 1).unwrap().with_button(
        4,
        Button::new("chest").on_click(move |session, _| {
            let mut data = session.data();
            data.insert("from".into(), "main".into());
            router.open(session.user(), "shop", data)?;
            Ok(())
        }),
    ));

    let main = registry.open(PLAYER, "main", SessionData::new()).unwrap();
    settle(&host, &registry);

    let mut click = ClickEvent::new(PLAYER, main.surface(), 4, Instant::now());
    registry.on_click(&mut click);
    settle(&host, &registry);

    let shop = registry.session(PLAYER).unwrap();
    assert!(main.is_closed());
    assert_eq!(shop.template().id(), "shop");
    assert_eq!(shop.data_value("from"), Some("main".into()));
    assert_eq!(host.current_top_surface(PLAYER), Some(shop.surface()));
}

#[test]
fn animation_stops_once_the_menu_is_closed() {
    let (host, registry) = setup();
    registry.register(Template::chest("spin", "Spin", 1).unwrap().with_button(
        0,
        Button::new("a")
            .animation(vec![Item::new("a"), Item::new("b")], 2)
            .unwrap(),
    ));

    let session = registry.open(PLAYER, "spin", SessionData::new()).unwrap();
    session.start_default_animation();
    settle(&host, &registry);
    assert!(session.is_animating());
    assert_eq!(host.repeating_tasks(), 1);

    host.run_ticks(4);
    registry.close(PLAYER);
    assert!(!session.is_animating());
    host.run_ticks(4);
    assert_eq!(host.repeating_tasks(), 0);
}
