//! Demo menus: a main menu with a click counter, an animated indicator and a
//! link to a small shop that spends the player's coins.

use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use tracing::{info, warn};

use gridmenu_core::{Button, Item, MenuRegistry, Pattern, Session, SessionData, UserId};

pub const MAIN: &str = "main";
pub const SHOP: &str = "shop";
pub const STARTING_COINS: u64 = 20;

const GOODS: [(&str, u64); 4] = [("apple", 2), ("bread", 3), ("iron_sword", 8), ("diamond", 15)];

fn pane() -> Item {
    Item::new("gray_pane").with_label("░░░░")
}

fn counter(session: &Session, key: &str) -> u64 {
    session
        .data_value(key)
        .and_then(|value| value.as_u64())
        .unwrap_or(0)
}

/// Data for a fresh main menu.
pub fn starting_data() -> SessionData {
    SessionData::from([("coins".to_string(), Value::from(STARTING_COINS))])
}

/// Open the main menu for `user` and start its animation.
pub fn open_main(menus: &MenuRegistry, user: UserId, data: SessionData) -> Result<Session> {
    let session = menus.open(user, MAIN, data)?;
    session.start_default_animation();
    Ok(session)
}

pub fn register(menus: &MenuRegistry) -> Result<()> {
    register_main(menus)?;
    register_shop(menus)?;
    Ok(())
}

fn register_main(menus: &MenuRegistry) -> Result<()> {
    let to_shop = menus.clone();
    let closer = menus.clone();

    let lights = vec![
        Item::new("red_wool").with_label("●"),
        Item::new("yellow_wool").with_label("●●"),
        Item::new("green_wool").with_label("●●●"),
    ];

    menus.create_chest_template(MAIN, "Main Menu", 3, |template| {
        Ok(template
            .with_pattern(
                Pattern::new(["GGGGGGGGG", "G       G", "GGGGGGGGG"]).glyph('G', pane()),
            )
            .with_button(
                10,
                Button::new(Item::new("emerald").with_label("Click me"))
                    .updatable(true)
                    .click_cooldown(Duration::from_millis(500))
                    .on_click(|session, _| {
                        session.set_data("clicks", counter(session, "clicks") + 1);
                        session.render();
                        Ok(())
                    }),
            )
            .with_button(13, Button::new("red_wool").animation(lights, 10)?)
            .with_button(
                15,
                Button::new(Item::new("chest").with_label("Shop")).on_click(move |session, _| {
                    to_shop.open(session.user(), SHOP, session.data())?;
                    Ok(())
                }),
            )
            .with_button(
                22,
                Button::new(Item::new("barrier").with_label("Close")).on_click(move |session, _| {
                    closer.close(session.user());
                    Ok(())
                }),
            )
            .on_update(|session| {
                let clicks = counter(session, "clicks");
                session.set_item(11, Some(Item::new("paper").with_label(format!("{clicks} clicks"))));
                Ok(())
            })
            .on_close(|session| {
                info!(
                    user = %session.user(),
                    clicks = counter(session, "clicks"),
                    "main menu closed"
                );
                Ok(())
            }))
    })?;
    Ok(())
}

fn register_shop(menus: &MenuRegistry) -> Result<()> {
    let back = menus.clone();

    menus.create_chest_template(SHOP, "Shop", 2, |template| {
        let mut template = template
            .with_pattern(Pattern::new(["", "GGGG GGGG"]).glyph('G', pane()))
            .with_button(
                13,
                Button::new(Item::new("arrow").with_label("Back")).on_click(move |session, _| {
                    open_main(&back, session.user(), session.data())?;
                    Ok(())
                }),
            )
            .on_update(|session| {
                let coins = counter(session, "coins");
                session.set_item(8, Some(Item::new("gold_nugget").with_label(format!("{coins} coins"))));
                Ok(())
            });

        for (slot, (good, price)) in GOODS.into_iter().enumerate() {
            let icon = Item::new(good).with_label(format!("{good} ${price}"));
            template = template.with_button(
                slot,
                Button::new(icon).on_click(move |session, _| buy(session, good, price)),
            );
        }
        Ok(template)
    })?;
    Ok(())
}

fn buy(session: &Session, good: &str, price: u64) -> Result<()> {
    let coins = counter(session, "coins");
    if coins < price {
        warn!(user = %session.user(), good, price, coins, "not enough coins");
        return Ok(());
    }
    session.set_data("coins", coins - price);
    session.set_data(good, counter(session, good) + 1);
    info!(user = %session.user(), good, price, "bought");
    session.render();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    use gridmenu_core::{ClickEvent, MemoryHost, Surfaces};

    const PLAYER: UserId = UserId(1);

    fn setup() -> (Arc<MemoryHost>, MenuRegistry) {
        let host = Arc::new(MemoryHost::new());
        let menus = MenuRegistry::new(host.clone());
        register(&menus).unwrap();
        (host, menus)
    }

    fn settle(host: &MemoryHost, menus: &MenuRegistry) {
        for _ in 0..16 {
            for mut event in host.drain_events() {
                menus.dispatch(&mut event);
            }
            if host.pending_tasks() == 0 && !host.has_events() {
                return;
            }
            host.tick();
        }
    }

    fn click(menus: &MenuRegistry, slot: i32) -> ClickEvent {
        let surface = menus.session(PLAYER).unwrap().surface();
        let mut event = ClickEvent::new(PLAYER, surface, slot, Instant::now());
        menus.on_click(&mut event);
        event
    }

    #[test]
    fn main_menu_draws_border_and_counter() {
        let (host, menus) = setup();
        let session = open_main(&menus, PLAYER, starting_data()).unwrap();
        settle(&host, &menus);

        let surface = session.surface();
        assert_eq!(host.current_top_surface(PLAYER), Some(surface));
        assert_eq!(host.cell(surface, 0), Some(pane()));
        assert_eq!(host.cell(surface, 11).unwrap().label.as_deref(), Some("0 clicks"));
        assert!(session.is_animating());

        assert!(click(&menus, 10).is_cancelled());
        assert_eq!(counter(&session, "clicks"), 1);
        assert_eq!(host.cell(surface, 11).unwrap().label.as_deref(), Some("1 clicks"));
    }

    #[test]
    fn shop_spends_coins_and_returns_to_main() {
        let (host, menus) = setup();
        open_main(&menus, PLAYER, starting_data()).unwrap();
        settle(&host, &menus);

        click(&menus, 15);
        settle(&host, &menus);
        let shop = menus.session(PLAYER).unwrap();
        assert_eq!(shop.template().id(), SHOP);

        click(&menus, 3);
        click(&menus, 3);
        assert_eq!(counter(&shop, "coins"), STARTING_COINS - 15);
        assert_eq!(counter(&shop, "diamond"), 1);
        assert_eq!(
            host.cell(shop.surface(), 8).unwrap().label.as_deref(),
            Some("5 coins")
        );

        click(&menus, 13);
        settle(&host, &menus);
        let main = menus.session(PLAYER).unwrap();
        assert_eq!(main.template().id(), MAIN);
        assert_eq!(counter(&main, "coins"), 5);
        assert!(shop.is_closed());
    }

    #[test]
    fn close_button_ends_the_session() {
        let (host, menus) = setup();
        let session = open_main(&menus, PLAYER, starting_data()).unwrap();
        settle(&host, &menus);

        click(&menus, 22);
        settle(&host, &menus);
        assert!(session.is_closed());
        assert!(!session.is_animating());
        assert!(menus.session(PLAYER).is_none());
        assert_eq!(host.current_top_surface(PLAYER), None);
    }
}
