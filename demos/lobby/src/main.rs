//! Watches the room roster of a server and optionally joins one room.
//!
//! ```text
//! lobby [BASE_URL] [ROOM_ID]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::sync::Arc;

use playroom::prelude::*;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

fn describe(room: &Room) -> String {
    let other = room
        .other()
        .map(|p| p.display_name().to_string())
        .unwrap_or_else(|| "-".into());
    let status = if room.ended() {
        match room.winner() {
            Some(seat) => format!("ended, {seat:?} won"),
            None => "ended, draw".into(),
        }
    } else if room.started() {
        format!("playing, {} marks", room.board().marks())
    } else {
        "waiting".into()
    };
    format!(
        "{} | {} vs {} | {status}",
        room.id(),
        room.host().display_name(),
        other
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    playroom::init_tracing();

    let mut args = std::env::args().skip(1);
    let base_url = args.next().unwrap_or_else(|| DEFAULT_BASE_URL.into());
    let room_id = args.next();

    let client = Playroom::builder().base_url(&base_url).build()?;
    client.on_alert(Arc::new(|message: &str| eprintln!("server: {message}")));

    client.register(Arc::new(|rooms: &[Arc<Room>]| {
        println!("-- {} room(s)", rooms.len());
        for room in rooms {
            println!("   {}", describe(room));
        }
    }));

    if let Some(id) = room_id {
        let room = client.join(id).await?;
        room.add_observer(Arc::new(|room: &Room| {
            let changed = room.changed();
            if changed.any() {
                let cells: Vec<_> = changed.positions().collect();
                println!("[{}] moves at {cells:?}", room.id());
            }
            if let Some(line) = room.logs().last() {
                println!("[{}] {line}", room.id());
            }
        }));
        println!("joined {}", describe(&room));
    }

    tracing::info!(%base_url, "watching, press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    Ok(())
}
