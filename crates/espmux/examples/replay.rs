//! Replay a canned AT session through the channel buffers.
//!
//! Run with:
//!   cargo run --example replay
//!
//! Two connections are open (mux ids 0 and 3); their responses arrive
//! interleaved with command echoes, as they would on the UART.

use std::io::Read;

use espmux::driver::{DriverConfig, EspLink};
use espmux::frame::StepClock;
use espmux::transport::MemoryPort;

const SESSION: &[u8] = b"AT+CIPSEND=0,18\r\n\r\nOK\r\n> \r\nSEND OK\r\n\
+IPD,0,17:HTTP/1.1 200 OK\r\n\
+IPD,3,11:pong from 3\r\n\
+IPD,0,7:\r\nhello\r\nCLOSED\r\n";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut link = EspLink::with_clock(
        MemoryPort::from_bytes(SESSION),
        StepClock::new(),
        DriverConfig::default(),
    );

    // Drops the command echo; packets found on the way are kept.
    let discard = link.rx_empty();
    eprintln!(
        "rx_empty: {} noise bytes, {} packets kept",
        discard.discarded, discard.packets
    );

    let mut pong = String::new();
    {
        let mut ch3 = link.channel(3)?;
        let mut buf = [0u8; 32];
        let n = ch3.recv(&mut buf, 200);
        pong.push_str(&String::from_utf8_lossy(&buf[..n]));
    }
    println!("channel 3: {pong:?}");

    let mut response = Vec::new();
    let mut ch0 = link.channel(0)?;
    let mut buf = [0u8; 8];
    while let Ok(n) = ch0.read(&mut buf) {
        response.extend_from_slice(&buf[..n]);
    }
    println!("channel 0: {:?}", String::from_utf8_lossy(&response));

    Ok(())
}
