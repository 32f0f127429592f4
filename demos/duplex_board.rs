//! Simulated board - drives a `Client` over an in-memory duplex stream.
//!
//! This example demonstrates:
//! - Connecting with `Client::builder()` over any `AsyncRead + AsyncWrite`
//! - Receiving device events through a listener
//! - Subscribing to an analog channel and reading the latched sample
//! - Waiting for the board to hang up with `wait_for_disconnect`
//!
//! A real program passes an opened serial port instead of the duplex half.
//!
//! ```text
//! cargo run --example duplex_board
//! ```

use mbfirmata_client::codec::LIGHT_SENSOR_CHANNEL;
use mbfirmata_client::protocol::{pack_pairs, split_14};
use mbfirmata_client::Client;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;

/// Button A source id and "down" event id on the micro:bit.
const BUTTON_A: u32 = 1;
const BUTTON_DOWN: u32 = 1;

/// Plays the board's side of a short session, then unplugs.
async fn simulated_board(mut port: DuplexStream) -> std::io::Result<()> {
    // Protocol and firmware version queries sent on connect
    let mut queries = [0u8; 6];
    port.read_exact(&mut queries).await?;

    let mut reply = vec![0xF9, 2, 6];
    reply.extend([0xF0, 0x79, 0, 1]);
    reply.extend(pack_pairs(b"micro:bit Firmata"));
    reply.push(0xF7);
    // Button A down: two 21-bit ids, three 7-bit bytes each
    reply.extend([0xF0, 0x0D, BUTTON_A as u8, 0, 0, BUTTON_DOWN as u8, 0, 0, 0xF7]);
    port.write_all(&reply).await?;

    // Analog subscription for the light sensor
    let mut subscribe = [0u8; 2];
    port.read_exact(&mut subscribe).await?;
    println!("board: subscribe {subscribe:02X?}");

    let [lo, hi] = split_14(612);
    port.write_all(&[0xE0 | LIGHT_SENSOR_CHANNEL, lo, hi]).await?;

    // Scroll frame for "hi": F0 04 delay + two pairs + F7
    let mut scroll = [0u8; 8];
    port.read_exact(&mut scroll).await?;
    println!("board: scroll {scroll:02X?}");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (transport, board_port) = duplex(1024);
    let board = tokio::spawn(simulated_board(board_port));

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    let client = Client::builder()
        .scroll_delay(80)
        .on_device_event(move |source, event| {
            let _ = events_tx.send((source, event));
        })
        .on_state_changed(|| println!("client: state changed"))
        .connect(transport)
        .await?;

    if let Some((source, event)) = events_rx.recv().await {
        println!("client: device event {source}/{event}");
    }

    client.stream_analog_channel(LIGHT_SENSOR_CHANNEL, true).await?;
    client.scroll_string("hi").await?;

    board.await??;

    let state = client.state().clone();
    client.wait_for_disconnect().await?;

    println!("client: {}", state.protocol_version());
    println!("client: {}", state.firmware_version());
    println!(
        "client: light sensor = {:?}",
        state.analog_channel(LIGHT_SENSOR_CHANNEL)
    );

    Ok(())
}
