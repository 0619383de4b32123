//! Tests of the service loop: events in, commands out, one teardown path.

mod common;

use common::{establish, names, FakeMpd};
use mpd_remote::{
    Action, BindingMap, ButtonBinding, ChannelSource, Level, PinEvent, Player, Pull, Service,
    TriggerEdge,
};
use std::time::Duration;
use tokio::time::Instant;

const SERVICE_COMMANDS: [&str; 9] = [
    "play",
    "pause",
    "stop",
    "next",
    "previous",
    "status",
    "volume",
    "toggleoutput",
    "ping",
];

fn button(pin: u8, action: Action) -> ButtonBinding {
    ButtonBinding {
        pin,
        pull: Pull::Up,
        edge: TriggerEdge::Press,
        action,
        bounce: Duration::from_millis(10),
    }
}

fn press(pin: u8) -> PinEvent {
    PinEvent {
        pin,
        level: Level::Low,
        at: Instant::now(),
    }
}

#[tokio::test]
async fn dispatches_bound_actions_and_tears_down_on_source_close() {
    let server = FakeMpd::start(&SERVICE_COMMANDS).await;
    let player = Player::new(establish(&server).await, 5);
    let bindings = BindingMap::new(vec![button(17, Action::NextTrack)], Vec::new());

    let (tx, source) = ChannelSource::new(8);
    let feeder = tokio::spawn(async move {
        tx.send(press(17)).await.expect("send event");
        // dropping the sender closes the source and ends the loop
    });

    Service::new(player, bindings)
        .run(source, std::future::pending())
        .await;
    feeder.await.expect("feeder task");

    // the trailing `close` is the scoped teardown releasing the connection
    assert_eq!(names(server.received()), ["ping", "next", "close"]);
}

#[tokio::test]
async fn shutdown_future_ends_the_loop_and_tears_down() {
    let server = FakeMpd::start(&SERVICE_COMMANDS).await;
    let player = Player::new(establish(&server).await, 5);
    let bindings = BindingMap::new(vec![button(17, Action::NextTrack)], Vec::new());

    let (_tx, source) = ChannelSource::new(8);
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = stop_tx.send(());
    });

    Service::new(player, bindings)
        .run(source, async {
            let _ = stop_rx.await;
        })
        .await;
    stopper.await.expect("stopper task");

    assert_eq!(names(server.received()), ["close"]);
}

#[tokio::test]
async fn action_failures_do_not_stop_the_loop() {
    let server = FakeMpd::start(&SERVICE_COMMANDS).await;
    let player = Player::new(establish(&server).await, 5);
    let bindings = BindingMap::new(
        vec![button(17, Action::PlayPause), button(27, Action::NextTrack)],
        Vec::new(),
    );
    server.reject_play(true);

    let (tx, source) = ChannelSource::new(8);
    let feeder = tokio::spawn(async move {
        tx.send(press(17)).await.expect("send rejected action");
        tx.send(press(27)).await.expect("send next action");
    });

    Service::new(player, bindings)
        .run(source, std::future::pending())
        .await;
    feeder.await.expect("feeder task");

    let lines = names(server.received());
    // the rejected play is logged and the loop keeps serving events
    assert_eq!(
        lines,
        ["ping", "status", "ping", "play", "ping", "next", "close"]
    );
}

#[tokio::test]
async fn unbound_and_bouncing_events_are_ignored() {
    let server = FakeMpd::start(&SERVICE_COMMANDS).await;
    let player = Player::new(establish(&server).await, 5);
    let bindings = BindingMap::new(vec![button(17, Action::NextTrack)], Vec::new());

    let (tx, source) = ChannelSource::new(8);
    let feeder = tokio::spawn(async move {
        let t0 = Instant::now();
        // unbound pin
        tx.send(PinEvent {
            pin: 4,
            level: Level::Low,
            at: t0,
        })
        .await
        .expect("send unbound");
        // a press and its bounce 2 ms later
        tx.send(PinEvent {
            pin: 17,
            level: Level::Low,
            at: t0,
        })
        .await
        .expect("send press");
        tx.send(PinEvent {
            pin: 17,
            level: Level::Low,
            at: t0 + Duration::from_millis(2),
        })
        .await
        .expect("send bounce");
    });

    Service::new(player, bindings)
        .run(source, std::future::pending())
        .await;
    feeder.await.expect("feeder task");

    assert_eq!(names(server.received()), ["ping", "next", "close"]);
}
